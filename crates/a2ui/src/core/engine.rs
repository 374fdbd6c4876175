//! The engine: agent registry, session registry and request routing.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use serde_json::Value;
use slotmap::{SlotMap, new_key_type};
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::{self, JoinHandle},
};

use crate::{
    agent::{self, Agent},
    component::Component,
    config::{Config, SessionMode},
    error::{Error, Result},
    message::{Frame, Request},
    outbox::Outbox,
    path::DataPath,
    report::{CounterScope, ErrorCounter},
    session::{self, Downstream, Session, Upstream},
    surface::{HANDSHAKE_LEN, SurfaceHandle},
};

new_key_type! {
    /// Opaque identifier for a live downstream session.
    pub struct SessionKey;
}

/// A live downstream session.
#[derive(Debug)]
struct SessionEntry {
    /// Surface id the session was opened for.
    surface_id: String,
    /// The surface it shows.
    surface: SurfaceHandle,
    /// Cancellation signal for the serving task.
    cancel: watch::Sender<bool>,
}

/// A surface shared by every connection to its id.
#[derive(Debug)]
struct Shared {
    /// The surface, emitting into `feed`.
    surface: SurfaceHandle,
    /// Fan-out to attached sessions.
    feed: broadcast::Sender<Frame>,
    /// Driver task, if the agent has a driver.
    driver: Option<JoinHandle<()>>,
    /// Number of attached sessions.
    attached: usize,
}

/// Live sessions and shared surfaces.
#[derive(Debug, Default)]
struct Registry {
    /// Every live session.
    sessions: SlotMap<SessionKey, SessionEntry>,
    /// Sessions per surface id, oldest first.
    by_surface: HashMap<String, Vec<SessionKey>>,
    /// Shared surfaces, in shared mode.
    shared: HashMap<String, Shared>,
}

impl Registry {
    /// Record a session.
    fn insert(&mut self, entry: SessionEntry) -> SessionKey {
        let id = entry.surface_id.clone();
        let key = self.sessions.insert(entry);
        self.by_surface.entry(id).or_default().push(key);
        key
    }

    /// The surface a call addressed by id alone acts on: the shared surface,
    /// or the only live session. None if no session is live for `id`.
    fn resolve(&self, id: &str) -> Result<Option<SurfaceHandle>> {
        if let Some(shared) = self.shared.get(id) {
            return Ok(Some(shared.surface.clone()));
        }
        let mut live = self
            .by_surface
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|k| self.sessions.get(*k))
            .map(|e| &e.surface)
            .filter(|s| s.is_open());
        match (live.next(), live.next()) {
            (None, _) => Ok(None),
            (Some(s), None) => Ok(Some(s.clone())),
            (Some(_), Some(_)) => Err(Error::AmbiguousSurface(id.to_string())),
        }
    }

    /// The surface id and surface of one session.
    fn session(&self, key: SessionKey) -> Result<(String, SurfaceHandle)> {
        self.sessions
            .get(key)
            .map(|e| (e.surface_id.clone(), e.surface.clone()))
            .ok_or_else(|| Error::UnknownSession(format!("{key:?}")))
    }

    /// Forget a session, closing whatever it alone was showing.
    fn detach(&mut self, key: SessionKey) {
        let Some(entry) = self.sessions.remove(key) else {
            return;
        };
        if let Some(keys) = self.by_surface.get_mut(&entry.surface_id) {
            keys.retain(|k| *k != key);
            if keys.is_empty() {
                self.by_surface.remove(&entry.surface_id);
            }
        }
        let Some(shared) = self.shared.get_mut(&entry.surface_id) else {
            entry.surface.close();
            return;
        };
        shared.attached = shared.attached.saturating_sub(1);
        if shared.attached == 0
            && let Some(shared) = self.shared.remove(&entry.surface_id)
        {
            tracing::debug!("last connection to {} detached", entry.surface_id);
            if let Some(d) = shared.driver {
                d.abort();
            }
            shared.surface.close();
        }
    }
}

/// Engine state shared by handles and session guards.
struct Inner {
    /// Configuration.
    config: Config,
    /// Agents by surface id.
    agents: Mutex<HashMap<String, Arc<dyn Agent>>>,
    /// Live sessions.
    registry: Mutex<Registry>,
    /// Error counter used in process scope.
    errors: ErrorCounter,
    /// Per-agent error counters for requests answered without a session.
    transient_errors: Mutex<HashMap<String, ErrorCounter>>,
}

/// Take a lock, recovering from poisoning. No lock is held across an await.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What an upstream request or server-side call is addressed to.
#[derive(Debug, Clone)]
enum Target {
    /// A surface id alone.
    Surface(String),
    /// One session.
    Session(SessionKey),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface(id) => write!(f, "{id}"),
            Self::Session(key) => write!(f, "session {key:?}"),
        }
    }
}

/// Unregisters a session when its serving task ends.
struct SessionGuard {
    /// Engine state; gone if the engine was dropped first.
    inner: Weak<Inner>,
    /// The session.
    key: SessionKey,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            lock(&inner.registry).detach(self.key);
        }
    }
}

/// The surface protocol engine.
///
/// Cheap to clone; clones share agents and sessions. Opening sessions and
/// posting requests spawn tokio tasks, so both must run inside a runtime.
#[derive(Clone)]
pub struct Engine {
    /// Shared state.
    inner: Arc<Inner>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    /// Construct an engine with no agents.
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                agents: Mutex::new(HashMap::new()),
                registry: Mutex::new(Registry::default()),
                errors: ErrorCounter::new(),
                transient_errors: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register an agent, replacing any agent for the same surface id.
    pub fn register(&self, agent: impl Agent + 'static) {
        let id = agent.surface_id().to_string();
        tracing::info!("registered agent for {}", id);
        lock(&self.inner.agents).insert(id, Arc::new(agent));
    }

    /// Register an agent, builder style.
    pub fn with_agent(self, agent: impl Agent + 'static) -> Self {
        self.register(agent);
        self
    }

    /// Configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Registered surface ids, sorted.
    pub fn surface_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = lock(&self.inner.agents).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The agent for a surface id.
    fn agent(&self, id: &str) -> Result<Arc<dyn Agent>> {
        lock(&self.inner.agents)
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownSurface(id.to_string()))
    }

    /// The error counter a new surface uses.
    fn counter(&self) -> ErrorCounter {
        match self.inner.config.error_counter {
            CounterScope::Surface => ErrorCounter::new(),
            CounterScope::Process => self.inner.errors.clone(),
        }
    }

    /// The error counter for transient surfaces of one agent. Transient
    /// surfaces are rebuilt per request, so the count lives on the engine.
    fn transient_counter(&self, surface_id: &str) -> ErrorCounter {
        match self.inner.config.error_counter {
            CounterScope::Surface => lock(&self.inner.transient_errors)
                .entry(surface_id.to_string())
                .or_default()
                .clone(),
            CounterScope::Process => self.inner.errors.clone(),
        }
    }

    /// Open a downstream channel for a surface.
    ///
    /// The channel starts with the handshake (`createSurface`, the data model
    /// snapshot if the surface sends one, and the component tree), then
    /// carries driver patches and keepalives until it is dropped or the
    /// surface is closed.
    pub fn open(&self, surface_id: &str) -> Result<Downstream> {
        let agent = self.agent(surface_id)?;
        let config = &self.inner.config;
        // The handshake is queued before the transport reads anything.
        let (tx, rx) = mpsc::channel(config.outbox_capacity.max(HANDSHAKE_LEN));
        let (cancel_tx, cancel) = watch::channel(false);

        let (surface, driver, feed) = match config.session_mode {
            SessionMode::Independent => {
                let (surface, driver) = agent::build(agent.as_ref(), config, self.counter())?;
                let handle = SurfaceHandle::new(surface, Outbox::Channel(tx.clone()));
                handle.emit_handshake();
                (handle, driver, None)
            }
            SessionMode::Shared => {
                let (handle, feed) = self.attach_shared(agent.as_ref(), &tx)?;
                (handle, None, Some(feed))
            }
        };

        let key = lock(&self.inner.registry).insert(SessionEntry {
            surface_id: surface_id.to_string(),
            surface: surface.clone(),
            cancel: cancel_tx,
        });
        tracing::info!("opened session for {}", surface_id);

        let guard = SessionGuard {
            inner: Arc::downgrade(&self.inner),
            key,
        };
        let task = task::spawn(session::run(Session {
            surface: surface.clone(),
            tx,
            driver,
            feed,
            cancel,
            keepalive: config.keepalive(),
            guard,
        }));
        let view = surface.with_outbox(Outbox::Discard);
        Ok(Downstream::new(key, rx, task, view, config.framing))
    }

    /// Attach a connection to the shared surface for an agent, creating it
    /// if needed. The handshake for the current state goes to `tx`.
    fn attach_shared(
        &self,
        agent: &dyn Agent,
        tx: &mpsc::Sender<Frame>,
    ) -> Result<(SurfaceHandle, broadcast::Receiver<Frame>)> {
        let config = &self.inner.config;
        let id = agent.surface_id().to_string();
        let mut registry = lock(&self.inner.registry);
        if !registry.shared.contains_key(&id) {
            let (surface, driver) = agent::build(agent, config, self.counter())?;
            let (feed, _) = broadcast::channel(config.outbox_capacity.max(1));
            let handle = SurfaceHandle::new(surface, Outbox::Broadcast(feed.clone()));
            let driver = driver.map(|d| task::spawn(session::drive(handle.clone(), d)));
            tracing::info!("created shared surface {}", id);
            registry.shared.insert(
                id.clone(),
                Shared {
                    surface: handle,
                    feed,
                    driver,
                    attached: 0,
                },
            );
        }
        let shared = registry
            .shared
            .get_mut(&id)
            .ok_or_else(|| Error::Internal(format!("shared surface {id} missing")))?;
        shared.attached += 1;
        // Subscribe under the surface lock so the handshake and the feed
        // neither overlap nor leave a gap.
        let feed = &shared.feed;
        let (handshake, rx) = shared.surface.with(|s| (s.handshake(), feed.subscribe()));
        let out = Outbox::Channel(tx.clone());
        for m in handshake {
            out.send(Frame::Message(m));
        }
        Ok((shared.surface.clone(), rx))
    }

    /// Handle an upstream request body on its own short-lived task. The
    /// response stream ends once the request has been handled; a malformed
    /// body yields an empty stream.
    ///
    /// The request acts on the only live session for the id, or on the
    /// shared surface in shared mode. With no live session it is answered
    /// from a transient surface built from the agent. With several
    /// independent sessions it is ambiguous and yields an empty stream; use
    /// [`Engine::post_to`].
    pub fn post(&self, surface_id: &str, body: impl Into<Vec<u8>>) -> Upstream {
        self.spawn_respond(Target::Surface(surface_id.to_string()), body.into())
    }

    /// Handle an upstream request body for one session on its own
    /// short-lived task.
    pub fn post_to(&self, key: SessionKey, body: impl Into<Vec<u8>>) -> Upstream {
        self.spawn_respond(Target::Session(key), body.into())
    }

    /// Answer a request on a spawned task.
    fn spawn_respond(&self, target: Target, body: Vec<u8>) -> Upstream {
        let (outbox, rx) = Outbox::channel(self.inner.config.outbox_capacity);
        let engine = self.clone();
        task::spawn(async move {
            engine.respond(&target, &body, outbox);
        });
        Upstream::new(rx)
    }

    /// Handle an upstream request body synchronously and return its response
    /// frames. Routing is as for [`Engine::post`].
    pub fn handle_request(&self, surface_id: &str, body: &[u8]) -> Vec<Frame> {
        self.respond_now(&Target::Surface(surface_id.to_string()), body)
    }

    /// Handle an upstream request body for one session synchronously.
    pub fn handle_request_to(&self, key: SessionKey, body: &[u8]) -> Vec<Frame> {
        self.respond_now(&Target::Session(key), body)
    }

    /// Answer a request and collect the response frames.
    fn respond_now(&self, target: &Target, body: &[u8]) -> Vec<Frame> {
        let (outbox, mut rx) = Outbox::channel(self.inner.config.outbox_capacity);
        self.respond(target, body, outbox);
        let mut frames = vec![];
        while let Ok(f) = rx.try_recv() {
            frames.push(f);
        }
        frames
    }

    /// The agent and surface an upstream request acts on.
    fn target(&self, target: &Target) -> Result<(Arc<dyn Agent>, SurfaceHandle)> {
        match target {
            Target::Session(key) => {
                let (id, surface) = lock(&self.inner.registry).session(*key)?;
                Ok((self.agent(&id)?, surface))
            }
            Target::Surface(id) => {
                let agent = self.agent(id)?;
                if let Some(s) = lock(&self.inner.registry).resolve(id)? {
                    return Ok((agent, s));
                }
                tracing::debug!("no live session for {}, using a transient surface", id);
                let counter = self.transient_counter(id);
                let (surface, _) = agent::build(agent.as_ref(), &self.inner.config, counter)?;
                Ok((agent, SurfaceHandle::new(surface, Outbox::Discard)))
            }
        }
    }

    /// Parse, route and answer one upstream request onto `outbox`. On a
    /// shared surface the response is also broadcast to every attached
    /// connection.
    fn respond(&self, target: &Target, body: &[u8], outbox: Outbox) {
        let Some(request) = Request::parse(body) else {
            tracing::warn!("{}: ignoring malformed request", target);
            return;
        };
        let result = self.target(target).and_then(|(agent, surface)| {
            let outbox = match surface.outbox() {
                Outbox::Broadcast(_) => Outbox::Fanout(vec![outbox, surface.outbox().clone()]),
                _ => outbox,
            };
            let surface = surface.with_outbox(outbox);
            match request {
                Request::Action(action) => {
                    tracing::debug!("{}: action {:?}", target, action.name);
                    match agent.action_handler() {
                        Some(h) => surface.dispatch(h, &action).map(|_| ()),
                        None => {
                            tracing::debug!("{}: no action handler", target);
                            Ok(())
                        }
                    }
                }
                Request::Error(envelope) => surface
                    .report_error(&envelope, agent.error_status().as_ref())
                    .map(|_| ()),
            }
        });
        if let Err(e) = result {
            tracing::warn!("{}: request failed: {}", target, e);
        }
    }

    /// The live surface a server-side call acts on.
    fn live(&self, target: &Target) -> Result<SurfaceHandle> {
        let registry = lock(&self.inner.registry);
        match target {
            Target::Session(key) => registry.session(*key).map(|(_, s)| s),
            Target::Surface(id) => registry
                .resolve(id)?
                .ok_or_else(|| Error::UnknownSurface(id.clone())),
        }
    }

    /// The current data model of the only live session for an id, or of the
    /// shared surface.
    pub fn snapshot(&self, surface_id: &str) -> Result<Value> {
        Ok(self.live(&Target::Surface(surface_id.to_string()))?.snapshot())
    }

    /// The current data model of one session.
    pub fn snapshot_of(&self, key: SessionKey) -> Result<Value> {
        Ok(self.live(&Target::Session(key))?.snapshot())
    }

    /// Patch the only live session for an id, or the shared surface.
    pub fn patch(&self, surface_id: &str, path: &DataPath, value: Value) -> Result<()> {
        self.live(&Target::Surface(surface_id.to_string()))?
            .patch(path, value)
    }

    /// Patch one session.
    pub fn patch_session(&self, key: SessionKey, path: &DataPath, value: Value) -> Result<()> {
        self.live(&Target::Session(key))?.patch(path, value)
    }

    /// Replace the tree of the only live session for an id, or of the shared
    /// surface.
    pub fn set_tree(&self, surface_id: &str, nodes: Vec<Component>) -> Result<()> {
        self.live(&Target::Surface(surface_id.to_string()))?
            .set_tree(nodes)
    }

    /// Replace the tree of one session.
    pub fn set_session_tree(&self, key: SessionKey, nodes: Vec<Component>) -> Result<()> {
        self.live(&Target::Session(key))?.set_tree(nodes)
    }

    /// Number of live sessions for an id.
    pub fn open_sessions(&self, surface_id: &str) -> usize {
        lock(&self.inner.registry)
            .by_surface
            .get(surface_id)
            .map_or(0, Vec::len)
    }

    /// Every session entry for an id, paired with its surface.
    fn sessions_for(&self, surface_id: &str) -> Vec<(SurfaceHandle, watch::Sender<bool>)> {
        let registry = lock(&self.inner.registry);
        registry
            .by_surface
            .get(surface_id)
            .into_iter()
            .flatten()
            .filter_map(|k| registry.sessions.get(*k))
            .map(|e| (e.surface.clone(), e.cancel.clone()))
            .collect()
    }

    /// Close every live session for an id without telling the clients.
    /// Returns the number of sessions ended.
    pub fn close(&self, surface_id: &str) -> usize {
        let sessions = self.sessions_for(surface_id);
        for (surface, cancel) in &sessions {
            surface.close();
            cancel.send_replace(true);
        }
        sessions.len()
    }

    /// Close every live session for an id, sending each client a final
    /// `deleteSurface` frame. Returns the number of sessions ended.
    pub fn delete(&self, surface_id: &str) -> usize {
        let sessions = self.sessions_for(surface_id);
        for (surface, cancel) in &sessions {
            // A shared surface is deleted once; its broadcast reaches every
            // session, which ends after forwarding it.
            surface.delete();
            if !matches!(surface.outbox(), Outbox::Broadcast(_)) {
                cancel.send_replace(true);
            }
        }
        if !sessions.is_empty() {
            tracing::info!("deleted {} session(s) for {}", sessions.len(), surface_id);
        }
        sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::time;

    use super::*;
    use crate::{
        dispatch::{ActionHandler, SearchHandler},
        driver::PipelineDriver,
        message::Message,
        report::ErrorStatus,
        surface::SurfaceOptions,
        testing::{
            agent::TestAgent,
            frames::{drain, kinds, take},
        },
    };

    struct Echo {
        search: SearchHandler,
    }

    impl Echo {
        fn new() -> Self {
            Self {
                search: SearchHandler::new(
                    "search",
                    vec![json!({"name": "Ann"}), json!({"name": "Bob"})],
                    ["name"],
                ),
            }
        }
    }

    impl Agent for Echo {
        fn surface_id(&self) -> &str {
            "echo"
        }

        fn options(&self) -> SurfaceOptions {
            SurfaceOptions::default().send_data_model(true)
        }

        fn initial_model(&self) -> Value {
            json!({"query": "", "results": [], "lastErrorMessage": "", "errorCount": 0})
        }

        fn components(&self) -> Vec<Component> {
            vec![Component::new("root", "Text").text("echo")]
        }

        fn action_handler(&self) -> Option<&dyn ActionHandler> {
            Some(&self.search)
        }

        fn error_status(&self) -> Option<ErrorStatus> {
            Some(ErrorStatus::default())
        }
    }

    #[test]
    fn unknown_surface() {
        let engine = Engine::default();
        assert!(matches!(
            engine.snapshot("nope"),
            Err(Error::UnknownSurface(_))
        ));
        assert!(engine.handle_request("nope", br#"{"name":"x"}"#).is_empty());
    }

    #[test]
    fn transient_surface_answers_without_session() {
        let engine = Engine::default().with_agent(Echo::new());
        let frames = engine.handle_request(
            "echo",
            br#"{"action":{"event":{"name":"search","context":{"value":"bo"}}}}"#,
        );
        assert_eq!(frames.len(), 2);
        assert_eq!(engine.open_sessions("echo"), 0);
    }

    #[test]
    fn malformed_body_yields_nothing() {
        let engine = Engine::default().with_agent(Echo::new());
        assert!(engine.handle_request("echo", b"not json").is_empty());
        assert!(engine.handle_request("echo", b"[1,2]").is_empty());
        assert!(engine.handle_request("echo", b"{}").is_empty());
    }

    #[test]
    fn process_counter_is_shared() {
        let config = Config {
            error_counter: CounterScope::Process,
            ..Config::default()
        };
        let engine = Engine::new(config).with_agent(Echo::new());
        let body = br#"{"error":{"code":"E","message":"m"}}"#;
        engine.handle_request("echo", body);
        let frames = engine.handle_request("echo", body);
        let Some(Frame::Message(Message::UpdateDataModel { value, .. })) = frames.first()
        else {
            panic!("expected a data model update");
        };
        assert_eq!(value["errorCount"], json!(2));
    }

    #[test]
    fn transient_errors_keep_counting() {
        let engine = Engine::default().with_agent(Echo::new());
        let body = br#"{"error":{"code":"E","message":"m"}}"#;
        engine.handle_request("echo", body);
        let frames = engine.handle_request("echo", body);
        let Some(Frame::Message(Message::UpdateDataModel { value, .. })) = frames.first()
        else {
            panic!("expected a data model update");
        };
        assert_eq!(value["errorCount"], json!(2));
        assert_eq!(value["lastErrorMessage"], json!("Server received error #2: [E] m"));
        assert_eq!(value["query"], json!(""));
    }

    #[tokio::test(start_paused = true)]
    async fn id_alone_is_ambiguous_with_two_sessions() -> Result<()> {
        let engine = Engine::default().with_agent(Echo::new());
        let a = engine.open("echo")?;
        let _b = engine.open("echo")?;
        let body = br#"{"name":"search","context":{"value":"bo"}}"#;
        assert!(matches!(
            engine.snapshot("echo"),
            Err(Error::AmbiguousSurface(_))
        ));
        assert!(engine.handle_request("echo", body).is_empty());
        assert_eq!(engine.handle_request_to(a.key(), body).len(), 2);

        let key = a.key();
        drop(a);
        time::sleep(Duration::from_millis(1)).await;
        assert!(matches!(
            engine.snapshot_of(key),
            Err(Error::UnknownSession(_))
        ));
        assert_eq!(engine.snapshot("echo")?["query"], json!(""));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_initial_tree_still_opens() -> Result<()> {
        let agent = TestAgent::new("bad")
            .components(vec![Component::new("root", "Column").children(["gone"])]);
        let engine = Engine::default().with_agent(agent);
        let mut down = engine.open("bad")?;
        assert_eq!(
            kinds(&take(&mut down, 2).await),
            ["createSurface", "updateDataModel"]
        );
        assert!(down.try_recv().is_none());
        assert_eq!(engine.open_sessions("bad"), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn small_outbox_still_carries_handshake() -> Result<()> {
        let config = Config {
            outbox_capacity: 1,
            ..Config::default()
        };
        let engine = Engine::new(config).with_agent(Echo::new());
        let mut down = engine.open("echo")?;
        assert_eq!(
            kinds(&drain(&mut down)),
            ["createSurface", "updateDataModel", "updateComponents"]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn shared_mode_builds_one_driver() -> Result<()> {
        let config = Config {
            session_mode: SessionMode::Shared,
            ..Config::default()
        };
        let agent = TestAgent::new("live")
            .model(json!({"p": {}}))
            .driver(|c| {
                Box::new(
                    PipelineDriver::new("/p", "P", vec![]).timing(c.tick_interval(), c.cooldown()),
                )
            });
        let made = agent.drivers_made();
        let engine = Engine::new(config).with_agent(agent);
        let _a = engine.open("live")?;
        let _b = engine.open("live")?;
        assert_eq!(*made.lock().unwrap(), 1);
        assert_eq!(engine.open_sessions("live"), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn independent_mode_builds_a_driver_per_session() -> Result<()> {
        let agent = TestAgent::new("live")
            .model(json!({"p": {}}))
            .driver(|_| Box::new(PipelineDriver::new("/p", "P", vec![])));
        let made = agent.drivers_made();
        let engine = Engine::default().with_agent(agent);
        let _a = engine.open("live")?;
        let _b = engine.open("live")?;
        assert_eq!(*made.lock().unwrap(), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_downstream_unregisters() -> Result<()> {
        let engine = Engine::default().with_agent(Echo::new());
        let down = engine.open("echo")?;
        let surface = down.surface().clone();
        assert_eq!(engine.open_sessions("echo"), 1);
        drop(down);
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(engine.open_sessions("echo"), 0);
        assert!(!surface.is_open());
        Ok(())
    }
}
