use a2ui::{
    Agent, Component, Config,
    driver::{Driver, PipelineDriver, Stage},
};
use serde_json::{Value, json};

/// Surface id.
pub const SURFACE_ID: &str = "state-machine";

/// Pipeline title.
pub const TITLE: &str = "Order Processing Pipeline";

/// The order pipeline stages, in order.
pub fn stages() -> Vec<Stage> {
    [
        ("received", "Received"),
        ("validating", "Validating"),
        ("processing", "Processing"),
        ("billing", "Billing"),
        ("shipping", "Shipping"),
        ("delivered", "Delivered"),
    ]
    .into_iter()
    .map(|(id, label)| Stage::new(id, label))
    .collect()
}

/// An order pipeline that advances on its own, forever.
#[derive(Debug, Default)]
pub struct Pipeline;

impl Agent for Pipeline {
    fn surface_id(&self) -> &str {
        SURFACE_ID
    }

    fn initial_model(&self) -> Value {
        json!({"pipeline": {}})
    }

    fn components(&self) -> Vec<Component> {
        vec![
            Component::new("root", "Column")
                .children(["header", "pipeline", "status-text"])
                .gap("12"),
            Component::new("header", "Text")
                .text("Live State Machine")
                .variant("h2"),
            Component::new("pipeline", "StateMachine")
                .set("data", "/pipeline")
                .set("title", "/pipeline/title"),
            Component::new("status-text", "Text")
                .text("/pipeline/statusMessage")
                .variant("caption"),
        ]
    }

    fn driver(&self, config: &Config) -> Option<Box<dyn Driver>> {
        Some(Box::new(
            PipelineDriver::new("/pipeline", TITLE, stages())
                .timing(config.tick_interval(), config.cooldown()),
        ))
    }
}
