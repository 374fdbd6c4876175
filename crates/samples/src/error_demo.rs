use a2ui::{Agent, Component, report::ErrorStatus};
use serde_json::Value;

/// Surface id.
pub const SURFACE_ID: &str = "error-demo";

/// Shows a component outside the standard catalog and acknowledges client
/// error reports. The status object is the whole data model.
#[derive(Debug, Default)]
pub struct ErrorDemo;

impl Agent for ErrorDemo {
    fn surface_id(&self) -> &str {
        SURFACE_ID
    }

    fn initial_model(&self) -> Value {
        ErrorStatus::default().initial()
    }

    fn components(&self) -> Vec<Component> {
        vec![
            Component::new("root", "Column")
                .children([
                    "header",
                    "description",
                    "divider1",
                    "unknown-section",
                    "divider2",
                    "report-section",
                ])
                .gap("16"),
            Component::new("header", "Text")
                .text("Error Handling Demo")
                .variant("h2"),
            Component::new("description", "Text")
                .text(
                    "Unknown components render a fallback, and errors can be reported \
                     back to the server.",
                )
                .variant("body"),
            Component::new("divider1", "Divider"),
            Component::new("unknown-section", "Card")
                .title("Unknown Component")
                .children(["unknown-col"]),
            Component::new("unknown-col", "Column")
                .children(["unknown-desc", "unknown-component"])
                .gap("8"),
            Component::new("unknown-desc", "Text")
                .text("The component below uses a type the standard catalog does not define:")
                .variant("body"),
            Component::new("unknown-component", "FancyWidget"),
            Component::new("divider2", "Divider"),
            Component::new("report-section", "Card")
                .title("Error Reporting")
                .children(["report-col"]),
            Component::new("report-col", "Column")
                .children(["report-desc", "report-btn", "error-status"])
                .gap("8"),
            Component::new("report-desc", "Text")
                .text("Send a VALIDATION_FAILED error report to the server.")
                .variant("body"),
            Component::new("report-btn", "Button")
                .label("Report Error to Server")
                .action("report-error"),
            Component::new("error-status", "Text")
                .text("/lastErrorMessage")
                .variant("caption"),
        ]
    }

    fn error_status(&self) -> Option<ErrorStatus> {
        Some(ErrorStatus::default())
    }
}
