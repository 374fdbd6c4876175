use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{component::Component, path::DataPath};

/// A server-to-client protocol message. Each one is self-describing and is
/// carried in exactly one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Message {
    /// First message of every surface session.
    CreateSurface {
        /// Surface id.
        surface_id: String,
        /// Whether the client should echo its data model with actions.
        #[serde(default)]
        send_data_model: bool,
        /// Renderer catalog the surface was authored against.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        catalog_id: Option<String>,
        /// Opaque theme object forwarded to the renderer.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        theme: Option<Value>,
    },
    /// Whole-value replacement of the data model at `path`.
    UpdateDataModel {
        /// Surface id.
        surface_id: String,
        /// Target path.
        path: DataPath,
        /// New value at the path.
        #[serde(default)]
        value: Value,
    },
    /// Full component tree replacement.
    UpdateComponents {
        /// Surface id.
        surface_id: String,
        /// Every node of the tree.
        components: Vec<Component>,
    },
    /// The surface has been closed by the server.
    DeleteSurface {
        /// Surface id.
        surface_id: String,
    },
}

impl Message {
    /// The surface this message addresses.
    pub fn surface_id(&self) -> &str {
        match self {
            Self::CreateSurface { surface_id, .. }
            | Self::UpdateDataModel { surface_id, .. }
            | Self::UpdateComponents { surface_id, .. }
            | Self::DeleteSurface { surface_id } => surface_id,
        }
    }

    /// Short type name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateSurface { .. } => "createSurface",
            Self::UpdateDataModel { .. } => "updateDataModel",
            Self::UpdateComponents { .. } => "updateComponents",
            Self::DeleteSurface { .. } => "deleteSurface",
        }
    }
}

/// One unit on an outbound channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A protocol message.
    Message(Message),
    /// Payload-free frame that keeps idle connections open through
    /// intermediaries.
    Keepalive,
}

impl Frame {
    /// The protocol message, if this is not a keepalive.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) => Some(m),
            Self::Keepalive => None,
        }
    }
}

impl From<Message> for Frame {
    fn from(m: Message) -> Self {
        Self::Message(m)
    }
}

/// A client action.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Action {
    /// Event name. Empty when the client omitted it.
    pub name: String,
    /// Context values sent with the event.
    pub context: Map<String, Value>,
    /// Surface the client believes it is addressing, if sent.
    pub surface_id: Option<String>,
    /// Component that fired the action, if sent.
    pub source_component_id: Option<String>,
    /// Client timestamp, if sent.
    pub timestamp: Option<String>,
}

impl Action {
    /// Construct an action with a name and no context.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// The conventional `value` entry of the context.
    pub fn value(&self) -> Option<&Value> {
        self.context.get("value")
    }

    /// Read an action out of either the `{"event": {...}}` shape or the flat
    /// `{"name": ..., "context": ...}` shape.
    fn from_json(v: &Value) -> Self {
        let inner = v.get("event").unwrap_or(v);
        let text = |key: &str| {
            inner
                .get(key)
                .or_else(|| v.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let name = text("name").unwrap_or_else(|| {
            tracing::debug!("action without a name, using empty default");
            String::new()
        });
        let context = match inner.get("context") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                tracing::debug!("non-object action context wrapped as value");
                let mut map = Map::new();
                map.insert("value".into(), other.clone());
                map
            }
        };
        Self {
            name,
            context,
            surface_id: text("surfaceId"),
            source_component_id: text("sourceComponentId"),
            timestamp: text("timestamp"),
        }
    }
}

/// A structured client-reported fault.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorEnvelope {
    /// Error code, for example `VALIDATION_FAILED`. Empty if omitted.
    pub code: String,
    /// Human-readable message. Empty if omitted.
    pub message: String,
    /// Offending component or data model path.
    pub path: Option<String>,
}

impl ErrorEnvelope {
    /// Construct an envelope without a path.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
        }
    }

    /// Attach the offending path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Read an envelope, rendering missing fields as empty strings.
    fn from_json(v: &Value) -> Self {
        let text = |key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);
        let code = text("code");
        let message = text("message");
        if code.is_none() || message.is_none() {
            tracing::debug!("error envelope missing code or message, using empty defaults");
        }
        Self {
            code: code.unwrap_or_default(),
            message: message.unwrap_or_default(),
            path: text("path"),
        }
    }
}

/// A parsed upstream request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Dispatch to the surface's action handler.
    Action(Action),
    /// Dispatch to the error envelope handler.
    Error(ErrorEnvelope),
}

impl Request {
    /// Parse an upstream body.
    ///
    /// Returns None when the body is not a JSON object or carries neither an
    /// action nor an error. Missing fields inside an action or envelope are
    /// defaulted rather than rejected.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let v: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("unparseable request body: {}", e);
                return None;
            }
        };
        let obj = v.as_object()?;
        if let Some(action) = obj.get("action").filter(|a| a.is_object()) {
            return Some(Self::Action(Action::from_json(action)));
        }
        if let Some(error) = obj.get("error").filter(|e| e.is_object()) {
            return Some(Self::Error(ErrorEnvelope::from_json(error)));
        }
        if obj.get("name").is_some_and(Value::is_string) {
            return Some(Self::Action(Action::from_json(&v)));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn create_surface_wire_shape() {
        let m = Message::CreateSurface {
            surface_id: "contacts".into(),
            send_data_model: true,
            catalog_id: None,
            theme: None,
        };
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            json!({"type": "createSurface", "surfaceId": "contacts", "sendDataModel": true})
        );
    }

    #[test]
    fn update_data_model_wire_shape() {
        let m = Message::UpdateDataModel {
            surface_id: "contacts".into(),
            path: "/query".into(),
            value: json!("Alice"),
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(
            v,
            json!({"type": "updateDataModel", "surfaceId": "contacts", "path": "/query", "value": "Alice"})
        );
        let back: Message = serde_json::from_value(v).unwrap();
        assert_eq!(back, m);
        assert_eq!(back.kind(), "updateDataModel");
        assert_eq!(back.surface_id(), "contacts");
    }

    #[test]
    fn parse_event_action() {
        let body = br#"{"action":{"event":{"name":"search","context":{"value":"Alice"}}}}"#;
        let Some(Request::Action(a)) = Request::parse(body) else {
            panic!("expected action");
        };
        assert_eq!(a.name, "search");
        assert_eq!(a.value(), Some(&json!("Alice")));
    }

    #[test]
    fn parse_client_envelope_action() {
        let body = br#"{"version":"v0.9","action":{"name":"search","surfaceId":"contacts","sourceComponentId":"search-btn","context":{"value":"bob"}}}"#;
        let Some(Request::Action(a)) = Request::parse(body) else {
            panic!("expected action");
        };
        assert_eq!(a.name, "search");
        assert_eq!(a.surface_id.as_deref(), Some("contacts"));
        assert_eq!(a.source_component_id.as_deref(), Some("search-btn"));
        assert_eq!(a.value(), Some(&json!("bob")));
    }

    #[test]
    fn parse_flat_action() {
        let body = br#"{"name":"search","context":{"value":"x"}}"#;
        assert_eq!(
            Request::parse(body),
            Some(Request::Action(Action::new("search").with_context("value", "x")))
        );
    }

    #[test]
    fn parse_error_envelope() {
        let body = br#"{"error":{"code":"VALIDATION_FAILED","message":"bad","path":"/email"}}"#;
        assert_eq!(
            Request::parse(body),
            Some(Request::Error(
                ErrorEnvelope::new("VALIDATION_FAILED", "bad").with_path("/email")
            ))
        );
        assert_eq!(
            Request::parse(br#"{"error":{}}"#),
            Some(Request::Error(ErrorEnvelope::default()))
        );
    }

    #[test]
    fn malformed_bodies() {
        assert_eq!(Request::parse(b""), None);
        assert_eq!(Request::parse(b"not json"), None);
        assert_eq!(Request::parse(b"[1,2]"), None);
        assert_eq!(Request::parse(b"{}"), None);
        assert_eq!(Request::parse(br#"{"other":1}"#), None);
    }

    #[test]
    fn action_without_name_defaults() {
        let Some(Request::Action(a)) = Request::parse(br#"{"action":{"event":{}}}"#) else {
            panic!("expected action");
        };
        assert_eq!(a.name, "");
        assert!(a.context.is_empty());
    }
}
