//! a2ui: a server-side surface protocol engine.
//!
//! The engine keeps one or more UI surfaces per client. Each surface pairs a
//! JSON data model with a tree of component descriptors. Clients open a
//! downstream channel and receive a handshake followed by incremental
//! updates; they answer on an upstream path with actions and error reports,
//! which the engine turns into data model patches.
//!
//! # Quick Start
//!
//! The main entry points are:
//! - [`Engine`] - Agent registry, sessions and request routing
//! - [`Agent`] - The trait implemented by applications
//! - [`SurfaceHandle`] - A live surface and its outbound channel
//!
//! # Module Organization
//!
//! - [`message`] - Downstream messages and upstream requests
//! - [`codec`] - SSE and JSONL framing
//! - [`dispatch`] - Action handlers, including search
//! - [`driver`] - Clock-paced data model producers

#![warn(missing_docs)]

// Internal core module - re-export specific items below
mod core;

#[cfg(any(test, feature = "testing"))]
pub use core::testing;
// Re-export core application types
pub use core::{
    ComponentTree, DataModel, Downstream, Engine, Lifecycle, Outbox, SessionKey, Surface,
    SurfaceHandle, SurfaceOptions, Upstream,
};
// Re-export public modules
pub use core::{
    agent, codec, component, config, dispatch, driver, error, message, outbox, path, report,
    session, surface,
};
// Internal modules, addressable as `crate::*`
use core::{model, schedule, tree};

pub use agent::Agent;
pub use component::Component;
pub use config::Config;
pub use dispatch::{ActionHandler, Patch};
pub use path::DataPath;
