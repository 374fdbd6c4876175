use std::result::Result as StdResult;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::path::DataPath;

/// Component types the standard renderer catalog knows about. Anything else
/// is still transmitted unchanged; the renderer shows its own fallback.
pub const STANDARD_CATALOG: &[&str] = &[
    "Text",
    "Image",
    "Icon",
    "Divider",
    "Row",
    "Column",
    "Card",
    "List",
    "Tabs",
    "Button",
    "TextField",
    "CheckBox",
    "ChoicePicker",
    "DateTimeInput",
    "Slider",
    "Video",
    "AudioPlayer",
    "StateMachine",
];

/// Return true if the type tag is part of the standard catalog.
pub fn is_standard(component: &str) -> bool {
    STANDARD_CATALOG.contains(&component)
}

/// How a node composes other nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Children {
    /// A leaf node.
    #[default]
    None,
    /// An explicit, ordered list of child ids.
    List(Vec<String>),
    /// One template node repeated once per element of the array bound at
    /// `data`. Expansion happens in the renderer, never here.
    Template {
        /// Id of the template node.
        component_id: String,
        /// Data model path of the bound array.
        data: DataPath,
    },
}

impl Children {
    /// Ids this node refers to, in order.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Self::None => vec![],
            Self::List(ids) => ids.iter().map(String::as_str).collect(),
            Self::Template { component_id, .. } => vec![component_id.as_str()],
        }
    }
}

/// A single node descriptor in a component tree.
///
/// Attributes are kept as raw JSON. A data-model reference is written as an
/// absolute path string (see [`Component::bind`]); relative strings inside a
/// template are resolved by the renderer against the current array element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawComponent", into = "RawComponent")]
pub struct Component {
    /// Node id, unique within a surface.
    pub id: String,
    /// Component type tag.
    pub component: String,
    /// Composition of this node.
    pub children: Children,
    /// Remaining attributes.
    pub properties: Map<String, Value>,
}

/// Flat wire shape of a component.
#[derive(Serialize, Deserialize)]
struct RawComponent {
    /// Node id.
    id: String,
    /// Component type tag.
    component: String,
    /// Every other property, including `children`, `data` and `template`.
    #[serde(flatten)]
    properties: Map<String, Value>,
}

impl TryFrom<RawComponent> for Component {
    type Error = String;

    fn try_from(raw: RawComponent) -> StdResult<Self, String> {
        let mut properties = raw.properties;
        let children = if let Some(template) = properties.remove("template") {
            let component_id = template
                .get("componentId")
                .and_then(Value::as_str)
                .ok_or_else(|| format!("{}: template without componentId", raw.id))?
                .to_string();
            let data = properties
                .remove("data")
                .and_then(|d| d.as_str().map(DataPath::from))
                .ok_or_else(|| format!("{}: template without data binding", raw.id))?;
            Children::Template { component_id, data }
        } else if let Some(list) = properties.remove("children") {
            let ids = serde_json::from_value::<Vec<String>>(list)
                .map_err(|e| format!("{}: children: {e}", raw.id))?;
            Children::List(ids)
        } else {
            Children::None
        };
        Ok(Self {
            id: raw.id,
            component: raw.component,
            children,
            properties,
        })
    }
}

impl From<Component> for RawComponent {
    fn from(c: Component) -> Self {
        let mut properties = c.properties;
        match c.children {
            Children::None => {}
            Children::List(ids) => {
                properties.insert("children".into(), json!(ids));
            }
            Children::Template { component_id, data } => {
                properties.insert("data".into(), Value::String(data.to_string()));
                properties.insert("template".into(), json!({ "componentId": component_id }));
            }
        }
        Self {
            id: c.id,
            component: c.component,
            properties,
        }
    }
}

impl Component {
    /// Start describing a node with the given id and type tag.
    pub fn new(id: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component: component.into(),
            children: Children::None,
            properties: Map::new(),
        }
    }

    /// Set an arbitrary attribute.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Bind an attribute to an absolute data model path.
    pub fn bind(self, name: impl Into<String>, path: &DataPath) -> Self {
        self.set(name, path.to_string())
    }

    /// Set explicit children.
    pub fn children<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.children = Children::List(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Repeat `template` once per element of the array at `data`.
    pub fn list(mut self, data: impl Into<DataPath>, template: impl Into<String>) -> Self {
        self.children = Children::Template {
            component_id: template.into(),
            data: data.into(),
        };
        self
    }

    /// Attach a server action fired with the given event name.
    pub fn action(self, event: impl Into<String>) -> Self {
        let event: String = event.into();
        self.set("action", json!({ "event": { "name": event } }))
    }

    /// Set the `text` attribute.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.set("text", text.into())
    }

    /// Set the `label` attribute.
    pub fn label(self, label: impl Into<String>) -> Self {
        self.set("label", label.into())
    }

    /// Set the `title` attribute.
    pub fn title(self, title: impl Into<String>) -> Self {
        self.set("title", title.into())
    }

    /// Set the `variant` attribute.
    pub fn variant(self, variant: impl Into<String>) -> Self {
        self.set("variant", variant.into())
    }

    /// Set the `usageHint` attribute.
    pub fn usage_hint(self, hint: impl Into<String>) -> Self {
        self.set("usageHint", hint.into())
    }

    /// Set the `placeholder` attribute.
    pub fn placeholder(self, placeholder: impl Into<String>) -> Self {
        self.set("placeholder", placeholder.into())
    }

    /// Set the `gap` attribute.
    pub fn gap(self, gap: impl Into<String>) -> Self {
        self.set("gap", gap.into())
    }

    /// Set the `alignment` attribute.
    pub fn alignment(self, alignment: impl Into<String>) -> Self {
        self.set("alignment", alignment.into())
    }

    /// Set the `distribution` attribute.
    pub fn distribution(self, distribution: impl Into<String>) -> Self {
        self.set("distribution", distribution.into())
    }
}
