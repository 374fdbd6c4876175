use a2ui::{ActionHandler, Agent, Component, dispatch::SearchHandler};
use serde_json::{Value, json};

/// Surface id.
pub const SURFACE_ID: &str = "contacts";

/// The full directory.
pub fn all_contacts() -> Vec<Value> {
    vec![
        json!({
            "name": "Alice Johnson",
            "email": "alice@example.com",
            "phone": "+1-555-0101",
            "department": "Engineering"
        }),
        json!({
            "name": "Bob Smith",
            "email": "bob@example.com",
            "phone": "+1-555-0102",
            "department": "Marketing"
        }),
        json!({
            "name": "Carol Williams",
            "email": "carol@example.com",
            "phone": "+1-555-0103",
            "department": "Engineering"
        }),
        json!({
            "name": "David Brown",
            "email": "david@example.com",
            "phone": "+1-555-0104",
            "department": "Sales"
        }),
        json!({
            "name": "Eve Davis",
            "email": "eve@example.com",
            "phone": "+1-555-0105",
            "department": "Engineering"
        }),
    ]
}

/// A searchable contact directory. Searches match name or department.
#[derive(Debug)]
pub struct Contacts {
    /// Search over the directory.
    search: SearchHandler,
}

impl Contacts {
    /// Construct the agent.
    pub fn new() -> Self {
        Self {
            search: SearchHandler::new("search", all_contacts(), ["name", "department"])
                .results_path("/contacts"),
        }
    }
}

impl Default for Contacts {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for Contacts {
    fn surface_id(&self) -> &str {
        SURFACE_ID
    }

    fn initial_model(&self) -> Value {
        json!({"query": "", "contacts": all_contacts()})
    }

    fn components(&self) -> Vec<Component> {
        vec![
            Component::new("root", "Column")
                .children(["header", "search-row", "divider", "contact-list"])
                .gap("12"),
            Component::new("header", "Text")
                .text("Contact Directory")
                .usage_hint("h2"),
            Component::new("search-row", "Row")
                .children(["search-input", "search-btn"])
                .gap("8")
                .alignment("end"),
            Component::new("search-input", "TextField")
                .placeholder("Search contacts...")
                .label("Search")
                .action("search"),
            Component::new("search-btn", "Button")
                .label("Search")
                .action("search"),
            Component::new("divider", "Divider"),
            Component::new("contact-list", "List").list("/contacts", "contact-row"),
            Component::new("contact-row", "Row")
                .children(["contact-name", "contact-email", "contact-dept"])
                .distribution("spaceBetween"),
            Component::new("contact-name", "Text")
                .text("name")
                .usage_hint("body"),
            Component::new("contact-email", "Text")
                .text("email")
                .usage_hint("caption"),
            Component::new("contact-dept", "Text")
                .text("department")
                .usage_hint("caption"),
        ]
    }

    fn action_handler(&self) -> Option<&dyn ActionHandler> {
        Some(&self.search)
    }
}
