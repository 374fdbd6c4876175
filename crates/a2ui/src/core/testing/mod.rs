/// Configurable agents for tests.
pub mod agent;
/// Frame inspection helpers.
pub mod frames;
