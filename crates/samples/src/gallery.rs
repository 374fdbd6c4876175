use a2ui::{Agent, Component, SurfaceOptions};
use serde_json::json;

/// Surface id.
pub const SURFACE_ID: &str = "gallery";

/// Every standard component, presentation only.
#[derive(Debug, Default)]
pub struct Gallery;

impl Agent for Gallery {
    fn surface_id(&self) -> &str {
        SURFACE_ID
    }

    fn options(&self) -> SurfaceOptions {
        SurfaceOptions::default()
    }

    fn components(&self) -> Vec<Component> {
        let mut nodes = vec![
            Component::new("root", "Column")
                .children([
                    "title",
                    "subtitle",
                    "divider-top",
                    "display-section",
                    "divider1",
                    "input-section",
                    "divider2",
                    "layout-section",
                ])
                .gap("16"),
            Component::new("title", "Text")
                .text("A2UI Component Gallery")
                .variant("h1"),
            Component::new("subtitle", "Text")
                .text("All standard components")
                .variant("caption"),
            Component::new("divider-top", "Divider"),
            Component::new("divider1", "Divider"),
            Component::new("divider2", "Divider"),
        ];
        nodes.extend(display());
        nodes.extend(inputs());
        nodes.extend(layout());
        nodes
    }
}

/// Display components.
fn display() -> Vec<Component> {
    vec![
        Component::new("display-section", "Card")
            .title("Display Components")
            .children(["display-col"]),
        Component::new("display-col", "Column")
            .children([
                "text-h1",
                "text-h2",
                "text-body",
                "text-caption",
                "icon1",
                "divider-sample",
            ])
            .gap("8"),
        Component::new("text-h1", "Text").text("Heading 1").variant("h1"),
        Component::new("text-h2", "Text").text("Heading 2").variant("h2"),
        Component::new("text-body", "Text")
            .text("This is body text demonstrating the Text component.")
            .variant("body"),
        Component::new("text-caption", "Text")
            .text("This is a caption")
            .variant("caption"),
        Component::new("icon1", "Icon")
            .set("icon", "\u{2605}")
            .set("size", "32"),
        Component::new("divider-sample", "Divider"),
    ]
}

/// Input components.
fn inputs() -> Vec<Component> {
    vec![
        Component::new("input-section", "Card")
            .title("Input Components")
            .children(["input-col"]),
        Component::new("input-col", "Column")
            .children([
                "btn-row",
                "textfield1",
                "checkbox1",
                "choice1",
                "datetime1",
                "slider1",
            ])
            .gap("12"),
        Component::new("btn-row", "Row")
            .children(["btn-primary", "btn-secondary", "btn-disabled"])
            .gap("8"),
        Component::new("btn-primary", "Button")
            .label("Primary")
            .variant("primary")
            .action("click"),
        Component::new("btn-secondary", "Button")
            .label("Secondary")
            .variant("secondary")
            .action("click"),
        Component::new("btn-disabled", "Button")
            .label("Disabled")
            .set("disabled", true),
        Component::new("textfield1", "TextField")
            .label("Text Field")
            .placeholder("Enter text...")
            .action("input"),
        Component::new("checkbox1", "CheckBox")
            .label("Check me")
            .action("toggle"),
        Component::new("choice1", "ChoicePicker")
            .label("Pick a fruit")
            .set("options", json!(["Apple", "Banana", "Cherry", "Date"]))
            .action("select"),
        Component::new("datetime1", "DateTimeInput")
            .label("Select a date")
            .set("inputType", "date")
            .action("dateChange"),
        Component::new("slider1", "Slider")
            .label("Volume")
            .set("min", 0)
            .set("max", 100)
            .set("step", 1)
            .set("value", 50)
            .action("slide"),
    ]
}

/// Layout components.
fn layout() -> Vec<Component> {
    vec![
        Component::new("layout-section", "Card")
            .title("Layout Components")
            .children(["layout-col"]),
        Component::new("layout-col", "Column")
            .children(["row-demo", "tabs-demo"])
            .gap("12"),
        Component::new("row-demo", "Row")
            .children(["row-item1", "row-item2", "row-item3"])
            .set("justify", "spaceEvenly"),
        Component::new("row-item1", "Text").text("Row Item 1"),
        Component::new("row-item2", "Text").text("Row Item 2"),
        Component::new("row-item3", "Text").text("Row Item 3"),
        Component::new("tabs-demo", "Tabs").set(
            "tabs",
            json!([
                {"title": "Tab One", "child": "tab1-content"},
                {"title": "Tab Two", "child": "tab2-content"},
            ]),
        ),
        Component::new("tab1-content", "Text").text("Content of the first tab."),
        Component::new("tab2-content", "Text").text("Content of the second tab."),
    ]
}
