use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::{
    component::Component,
    dispatch::{ActionHandler, Patch},
    error::{Error, Result},
    message::{Action, ErrorEnvelope, Frame, Message},
    model::DataModel,
    outbox::Outbox,
    path::DataPath,
    report::{self, ErrorCounter, ErrorStatus},
    tree::ComponentTree,
};

/// The most messages a handshake holds: `createSurface`, the data model
/// snapshot and the tree.
pub const HANDSHAKE_LEN: usize = 3;

/// Options announced in a surface's `createSurface` message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceOptions {
    /// Include an initial data model snapshot in the open handshake.
    pub send_data_model: bool,
    /// Renderer catalog id.
    pub catalog_id: Option<String>,
    /// Theme object forwarded to the renderer.
    pub theme: Option<Value>,
}

impl SurfaceOptions {
    /// Set `send_data_model`.
    pub fn send_data_model(mut self, send: bool) -> Self {
        self.send_data_model = send;
        self
    }

    /// Set the catalog id.
    pub fn catalog_id(mut self, id: impl Into<String>) -> Self {
        self.catalog_id = Some(id.into());
        self
    }

    /// Set the theme.
    pub fn theme(mut self, theme: Value) -> Self {
        self.theme = Some(theme);
        self
    }
}

/// Lifecycle of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Accepting updates.
    Open,
    /// Closed; all updates are refused.
    Closed,
}

/// One UI surface: a data model, a component tree and a lifecycle.
///
/// Every mutator returns the message describing the change, leaving delivery
/// to the caller.
#[derive(Debug)]
pub struct Surface {
    /// Surface id.
    id: String,
    /// Options from the open handshake.
    options: SurfaceOptions,
    /// Data model store.
    model: DataModel,
    /// Current component tree.
    tree: ComponentTree,
    /// Lifecycle state.
    lifecycle: Lifecycle,
    /// Error report counter.
    errors: ErrorCounter,
}

impl Surface {
    /// Open a fresh surface with an empty data model and tree.
    pub fn open(id: impl Into<String>, options: SurfaceOptions) -> Self {
        Self {
            id: id.into(),
            options,
            model: DataModel::default(),
            tree: ComponentTree::default(),
            lifecycle: Lifecycle::Open,
            errors: ErrorCounter::new(),
        }
    }

    /// Count errors on a shared counter instead of a private one.
    pub fn with_counter(mut self, counter: ErrorCounter) -> Self {
        self.errors = counter;
        self
    }

    /// Surface id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handshake options.
    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// True while the surface accepts updates.
    pub fn is_open(&self) -> bool {
        self.lifecycle == Lifecycle::Open
    }

    /// The full current data model value.
    pub fn snapshot(&self) -> &Value {
        self.model.snapshot()
    }

    /// The current component tree.
    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    /// Refuse work on a closed surface.
    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::SurfaceClosed(self.id.clone()))
        }
    }

    /// The `createSurface` message for this surface.
    pub fn create_message(&self) -> Message {
        Message::CreateSurface {
            surface_id: self.id.clone(),
            send_data_model: self.options.send_data_model,
            catalog_id: self.options.catalog_id.clone(),
            theme: self.options.theme.clone(),
        }
    }

    /// The messages that bring a new client up to the current state:
    /// `createSurface`, then the data model snapshot if enabled, then the tree
    /// if there is one.
    pub fn handshake(&self) -> Vec<Message> {
        let mut out = vec![self.create_message()];
        if self.options.send_data_model {
            out.push(Message::UpdateDataModel {
                surface_id: self.id.clone(),
                path: DataPath::root(),
                value: self.model.snapshot().clone(),
            });
        }
        if !self.tree.is_empty() {
            out.push(self.tree_message());
        }
        out
    }

    /// The `updateComponents` message for the current tree.
    fn tree_message(&self) -> Message {
        Message::UpdateComponents {
            surface_id: self.id.clone(),
            components: self.tree.nodes().to_vec(),
        }
    }

    /// Replace the value at `path`. Nothing changes on failure.
    pub fn patch(&mut self, path: &DataPath, value: Value) -> Result<Message> {
        self.ensure_open()?;
        self.model.set(path, value.clone())?;
        Ok(Message::UpdateDataModel {
            surface_id: self.id.clone(),
            path: path.clone(),
            value,
        })
    }

    /// Validate and replace the whole tree. The old tree is kept on failure.
    pub fn set_tree(&mut self, nodes: Vec<Component>) -> Result<Message> {
        self.ensure_open()?;
        self.tree = ComponentTree::new(nodes)?;
        Ok(self.tree_message())
    }

    /// The value at `path`, if it resolves.
    pub fn get(&self, path: &DataPath) -> Option<&Value> {
        self.model.get(path)
    }

    /// True if a patch at `path` would apply.
    pub fn can_patch(&self, path: &DataPath) -> bool {
        self.model.can_set(path)
    }

    /// Count one error report and return the new total.
    pub fn next_error(&self) -> u64 {
        self.errors.increment()
    }

    /// Errors counted so far.
    pub fn error_count(&self) -> u64 {
        self.errors.get()
    }

    /// Close the surface. Returns false if it was already closed.
    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.lifecycle = Lifecycle::Closed;
        was_open
    }
}

/// A shared handle on a surface, paired with the outbox its frames go to.
///
/// Clones share the surface. [`SurfaceHandle::with_outbox`] gives a view of
/// the same surface whose frames go elsewhere, which is how upstream requests
/// answer on their own short-lived channel.
#[derive(Debug, Clone)]
pub struct SurfaceHandle {
    /// Shared surface state.
    surface: Arc<Mutex<Surface>>,
    /// Frame destination.
    outbox: Outbox,
}

impl SurfaceHandle {
    /// Wrap a surface without emitting anything.
    pub fn new(surface: Surface, outbox: Outbox) -> Self {
        Self {
            surface: Arc::new(Mutex::new(surface)),
            outbox,
        }
    }

    /// Open a fresh surface and emit its `createSurface` message.
    pub fn open(id: impl Into<String>, options: SurfaceOptions, outbox: Outbox) -> Self {
        let handle = Self::new(Surface::open(id, options), outbox);
        let msg = handle.lock().create_message();
        handle.emit(msg);
        handle
    }

    /// The same surface, with frames routed to `outbox`.
    pub fn with_outbox(&self, outbox: Outbox) -> Self {
        Self {
            surface: self.surface.clone(),
            outbox,
        }
    }

    /// The outbox this handle emits to.
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Lock the surface. Locks are never held across an await, so a poisoned
    /// lock only means a panic mid-update; the state is still usable.
    fn lock(&self) -> MutexGuard<'_, Surface> {
        self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver a message.
    fn emit(&self, msg: Message) -> bool {
        tracing::debug!("emit {} for {}", msg.kind(), msg.surface_id());
        self.outbox.send(Frame::Message(msg))
    }

    /// Surface id.
    pub fn id(&self) -> String {
        self.lock().id().to_string()
    }

    /// True while the surface accepts updates.
    pub fn is_open(&self) -> bool {
        self.lock().is_open()
    }

    /// Run a closure against the locked surface.
    pub fn with<R>(&self, f: impl FnOnce(&mut Surface) -> R) -> R {
        let mut surface = self.lock();
        f(&mut surface)
    }

    /// A copy of the full data model.
    pub fn snapshot(&self) -> Value {
        self.lock().snapshot().clone()
    }

    /// Emit the handshake for the current state.
    pub fn emit_handshake(&self) {
        let msgs = self.lock().handshake();
        for m in msgs {
            self.emit(m);
        }
    }

    /// Replace the value at `path` and emit exactly one update frame. On
    /// failure nothing is written and nothing is emitted.
    pub fn patch(&self, path: &DataPath, value: Value) -> Result<()> {
        let msg = self.lock().patch(path, value)?;
        self.emit(msg);
        Ok(())
    }

    /// Replace the tree and emit it whole. A malformed tree is refused and
    /// the frame dropped.
    pub fn set_tree(&self, nodes: Vec<Component>) -> Result<()> {
        let msg = self.lock().set_tree(nodes)?;
        self.emit(msg);
        Ok(())
    }

    /// Apply patches to a locked surface, emitting one frame per applied
    /// patch. Failures are logged and skipped.
    fn apply_locked(&self, surface: &mut Surface, patches: Vec<Patch>) -> usize {
        let mut applied = 0;
        for p in patches {
            match surface.patch(&p.path, p.value) {
                Ok(msg) => {
                    self.emit(msg);
                    applied += 1;
                }
                Err(e) => tracing::warn!("{}: dropping patch: {}", surface.id(), e),
            }
        }
        applied
    }

    /// Apply patches in order, emitting one frame per applied patch. Patches
    /// that fail are logged and skipped. Returns the number applied.
    pub fn apply(&self, patches: Vec<Patch>) -> usize {
        let mut surface = self.lock();
        self.apply_locked(&mut surface, patches)
    }

    /// Run an action handler against the current data model and apply its
    /// patches. The surface stays locked for the whole exchange, so the
    /// patches of one action are never interleaved with another's.
    pub fn dispatch(&self, handler: &dyn ActionHandler, action: &Action) -> Result<usize> {
        let mut surface = self.lock();
        surface.ensure_open()?;
        let patches = handler.handle(surface.snapshot(), action);
        Ok(self.apply_locked(&mut surface, patches))
    }

    /// Count an error report and return the composed acknowledgement. With a
    /// status location the acknowledgement is also published there as one
    /// frame; without one it is only logged. If the status location does not
    /// resolve, the report fails and is not counted.
    pub fn report_error(
        &self,
        envelope: &ErrorEnvelope,
        status: Option<&ErrorStatus>,
    ) -> Result<String> {
        let mut surface = self.lock();
        surface.ensure_open()?;
        if let Some(status) = status
            && !surface.can_patch(&status.path)
        {
            return Err(Error::PathNotFound(status.path.to_string()));
        }
        let n = surface.next_error();
        let text = report::compose(n, envelope);
        tracing::info!("{}: {}", surface.id(), text);
        if let Some(status) = status {
            let p = status.patch(n, &text);
            let value = report::overlay(surface.get(&p.path), p.value);
            let msg = surface.patch(&p.path, value)?;
            self.emit(msg);
        }
        Ok(text)
    }

    /// Close the surface. Idempotent; returns false if already closed.
    pub fn close(&self) -> bool {
        let mut surface = self.lock();
        let closed = surface.close();
        if closed {
            tracing::info!("surface {} closed", surface.id());
        }
        closed
    }

    /// Close the surface and tell the client with a `deleteSurface` frame.
    /// Does nothing if already closed.
    pub fn delete(&self) -> bool {
        let mut surface = self.lock();
        if !surface.close() {
            return false;
        }
        tracing::info!("surface {} deleted", surface.id());
        self.emit(Message::DeleteSurface {
            surface_id: surface.id().to_string(),
        });
        true
    }
}
