//! Agents: the application side of a surface.
//!
//! An agent describes what a freshly opened surface looks like and how it
//! reacts. The engine calls it to build surfaces, answer actions and start
//! drivers; it never holds per-connection state itself.

use serde_json::{Value, json};

use crate::{
    component::Component,
    config::Config,
    dispatch::ActionHandler,
    driver::Driver,
    error::{Error, Result},
    path::DataPath,
    report::{self, ErrorCounter, ErrorStatus},
    surface::{Surface, SurfaceOptions},
};

/// The application behind one surface id.
pub trait Agent: Send + Sync {
    /// The surface id this agent serves.
    fn surface_id(&self) -> &str;

    /// Options announced in `createSurface`.
    fn options(&self) -> SurfaceOptions {
        SurfaceOptions::default().send_data_model(true)
    }

    /// The data model a fresh surface starts with.
    fn initial_model(&self) -> Value {
        json!({})
    }

    /// The component tree a fresh surface starts with.
    fn components(&self) -> Vec<Component>;

    /// The handler for upstream actions, if the surface takes any.
    fn action_handler(&self) -> Option<&dyn ActionHandler> {
        None
    }

    /// A fresh temporal driver, if the surface has one.
    fn driver(&self, _config: &Config) -> Option<Box<dyn Driver>> {
        None
    }

    /// Where error reports are published. Without one, reports are counted
    /// and logged only.
    fn error_status(&self) -> Option<ErrorStatus> {
        None
    }
}

/// Build the initial surface for an agent, with the driver that animates it.
///
/// The model is seeded from [`Agent::initial_model`], then the error status
/// and driver values are laid over it, then the tree is installed. A
/// malformed tree is logged and left out; the surface still opens with an
/// empty tree. Nothing is emitted; the caller sends the handshake.
pub fn build(
    agent: &dyn Agent,
    config: &Config,
    counter: ErrorCounter,
) -> Result<(Surface, Option<Box<dyn Driver>>)> {
    let mut surface = Surface::open(agent.surface_id(), agent.options()).with_counter(counter);
    surface.patch(&DataPath::root(), agent.initial_model())?;
    if let Some(status) = agent.error_status() {
        let value = report::overlay(surface.get(&status.path), status.initial());
        surface.patch(&status.path, value)?;
    }
    let driver = agent.driver(config);
    if let Some(d) = &driver {
        let p = d.initial();
        surface.patch(&p.path, p.value)?;
    }
    match surface.set_tree(agent.components()) {
        Ok(_) => {}
        Err(Error::MalformedTree(reason)) => {
            tracing::warn!("{}: dropping initial tree: {}", agent.surface_id(), reason);
        }
        Err(e) => return Err(e),
    }
    Ok((surface, driver))
}
