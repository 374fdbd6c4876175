//! Core types for the surface protocol engine.

// Core modules - public
/// Application agents.
pub mod agent;
/// Wire framing.
pub mod codec;
/// Component descriptors and the standard catalog.
pub mod component;
/// Engine configuration.
pub mod config;
/// Action handlers and patches.
pub mod dispatch;
/// Temporal drivers.
pub mod driver;
/// Core error types.
pub mod error;
/// Protocol messages and upstream requests.
pub mod message;
/// Data model paths.
pub mod path;
/// Error envelope reporting.
pub mod report;
/// Testing utilities.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Core modules - internal
/// Engine and session registry.
pub mod engine;
/// Data model store.
pub mod model;
/// Outbound frame destinations.
pub mod outbox;
/// Session deadlines.
pub mod schedule;
/// Downstream session tasks.
pub mod session;
/// Surface state and handles.
pub mod surface;
/// Validated component trees.
pub mod tree;

// Public exports from internal modules
pub use engine::{Engine, SessionKey};
pub use model::DataModel;
pub use outbox::Outbox;
pub use session::{Downstream, Upstream};
pub use surface::{Lifecycle, Surface, SurfaceHandle, SurfaceOptions};
pub use tree::ComponentTree;
