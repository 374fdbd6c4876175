//! Sample agents served by the a2ui engine.

use a2ui::{Config, Engine};

/// Contact directory with search.
pub mod contacts;
/// Error handling demo.
pub mod error_demo;
/// Component gallery.
pub mod gallery;
/// Live order pipeline.
pub mod pipeline;
/// Restaurant finder with search.
pub mod restaurant;

#[cfg(test)]
mod tests;

/// An engine serving every sample.
pub fn engine(config: Config) -> Engine {
    Engine::new(config)
        .with_agent(contacts::Contacts::new())
        .with_agent(restaurant::RestaurantFinder::new())
        .with_agent(pipeline::Pipeline)
        .with_agent(error_demo::ErrorDemo)
        .with_agent(gallery::Gallery)
}
