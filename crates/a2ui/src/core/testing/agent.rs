use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use serde_json::{Value, json};

use crate::{
    agent::Agent,
    component::Component,
    config::Config,
    dispatch::ActionHandler,
    driver::Driver,
    report::ErrorStatus,
    surface::SurfaceOptions,
};

/// Makes a fresh driver for each surface.
type DriverFactory = Arc<dyn Fn(&Config) -> Box<dyn Driver> + Send + Sync>;

/// An agent assembled from parts.
pub struct TestAgent {
    /// Surface id.
    id: String,
    /// Handshake options.
    options: SurfaceOptions,
    /// Initial data model.
    model: Value,
    /// Initial tree.
    components: Vec<Component>,
    /// Action handler.
    handler: Option<Box<dyn ActionHandler>>,
    /// Driver factory.
    driver: Option<DriverFactory>,
    /// Error status location.
    status: Option<ErrorStatus>,
    /// Number of drivers handed out.
    drivers_made: Arc<Mutex<usize>>,
}

impl fmt::Debug for TestAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestAgent").field("id", &self.id).finish()
    }
}

impl TestAgent {
    /// An agent for `id` that sends its data model and shows one text node.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            options: SurfaceOptions::default().send_data_model(true),
            model: json!({}),
            components: vec![Component::new("root", "Text").text("test")],
            handler: None,
            driver: None,
            status: None,
            drivers_made: Arc::new(Mutex::new(0)),
        }
    }

    /// Set the handshake options.
    pub fn options(mut self, options: SurfaceOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the initial data model.
    pub fn model(mut self, model: Value) -> Self {
        self.model = model;
        self
    }

    /// Set the initial tree.
    pub fn components(mut self, components: Vec<Component>) -> Self {
        self.components = components;
        self
    }

    /// Set the action handler.
    pub fn handler(mut self, handler: impl ActionHandler + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Set the driver factory.
    pub fn driver(
        mut self,
        f: impl Fn(&Config) -> Box<dyn Driver> + Send + Sync + 'static,
    ) -> Self {
        self.driver = Some(Arc::new(f));
        self
    }

    /// Publish error reports at `status`.
    pub fn error_status(mut self, status: ErrorStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// A counter of drivers created so far, readable after the agent is
    /// registered.
    pub fn drivers_made(&self) -> Arc<Mutex<usize>> {
        self.drivers_made.clone()
    }
}

impl Agent for TestAgent {
    fn surface_id(&self) -> &str {
        &self.id
    }

    fn options(&self) -> SurfaceOptions {
        self.options.clone()
    }

    fn initial_model(&self) -> Value {
        self.model.clone()
    }

    fn components(&self) -> Vec<Component> {
        self.components.clone()
    }

    fn action_handler(&self) -> Option<&dyn ActionHandler> {
        self.handler.as_deref()
    }

    fn driver(&self, config: &Config) -> Option<Box<dyn Driver>> {
        let f = self.driver.as_ref()?;
        *self.drivers_made.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Some(f(config))
    }

    fn error_status(&self) -> Option<ErrorStatus> {
        self.status.clone()
    }
}
