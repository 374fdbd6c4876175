use serde_json::Value;

use crate::{message::Action, path::DataPath};

/// A whole-value replacement of the data model at a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Target path.
    pub path: DataPath,
    /// Replacement value.
    pub value: Value,
}

impl Patch {
    /// Construct a patch.
    pub fn new(path: impl Into<DataPath>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Server-side reaction to client actions on one surface.
///
/// Handlers are pure and must not block: they see the current data model and
/// the action, and return the patches to apply, in order.
pub trait ActionHandler: Send + Sync {
    /// Compute the patches for an action.
    fn handle(&self, model: &Value, action: &Action) -> Vec<Patch>;
}

impl<F> ActionHandler for F
where
    F: Fn(&Value, &Action) -> Vec<Patch> + Send + Sync,
{
    fn handle(&self, model: &Value, action: &Action) -> Vec<Patch> {
        self(model, action)
    }
}

/// Render a JSON scalar as searchable text.
fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Filter records by case-insensitive substring match.
///
/// A record matches if the lowercased query is contained in the lowercased
/// text of any of `fields`. A blank query matches everything. Order is
/// preserved.
pub fn filter_records<S: AsRef<str>>(records: &[Value], fields: &[S], query: &str) -> Vec<Value> {
    if query.trim().is_empty() {
        return records.to_vec();
    }
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|r| {
            fields.iter().any(|f| {
                r.get(f.as_ref())
                    .and_then(as_text)
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
        })
        .cloned()
        .collect()
}

/// Search over a fixed collection.
///
/// On its event, echoes the query into the data model and then publishes the
/// filtered collection, in that order.
#[derive(Debug, Clone)]
pub struct SearchHandler {
    /// Event name this handler answers.
    event: String,
    /// Where the query text is echoed.
    query_path: DataPath,
    /// Where the filtered records are published.
    results_path: DataPath,
    /// The full collection.
    records: Vec<Value>,
    /// Record fields searched.
    fields: Vec<String>,
}

impl SearchHandler {
    /// Construct a handler for `event` over `records`, searching `fields`.
    pub fn new<I>(event: impl Into<String>, records: Vec<Value>, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            event: event.into(),
            query_path: DataPath::from("/query"),
            results_path: DataPath::from("/results"),
            records,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the query echo path.
    pub fn query_path(mut self, path: impl Into<DataPath>) -> Self {
        self.query_path = path.into();
        self
    }

    /// Set the results path.
    pub fn results_path(mut self, path: impl Into<DataPath>) -> Self {
        self.results_path = path.into();
        self
    }

    /// The full, unfiltered collection.
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Run the search directly.
    pub fn search(&self, query: &str) -> Vec<Value> {
        filter_records(&self.records, &self.fields, query)
    }
}

impl ActionHandler for SearchHandler {
    fn handle(&self, _model: &Value, action: &Action) -> Vec<Patch> {
        if action.name != self.event {
            tracing::debug!("search handler ignoring action {:?}", action.name);
            return vec![];
        }
        let query = action.value().and_then(as_text).unwrap_or_default();
        let results = self.search(&query);
        tracing::debug!("search {:?} matched {} records", query, results.len());
        vec![
            Patch::new(self.query_path.clone(), query),
            Patch::new(self.results_path.clone(), Value::Array(results)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn people() -> Vec<Value> {
        vec![
            json!({"name": "Alice Johnson", "department": "Engineering"}),
            json!({"name": "Bob Smith", "department": "Marketing"}),
            json!({"name": "Carol Williams", "department": "Engineering"}),
            json!({"name": "David Brown", "department": "Sales"}),
            json!({"name": "Eve Davis", "department": "engineering"}),
        ]
    }

    #[test]
    fn engineering_subset() {
        let got = filter_records(&people(), &["name", "department"], "engineering");
        let names: Vec<_> = got.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["Alice Johnson", "Carol Williams", "Eve Davis"]);
    }

    #[test]
    fn blank_query_returns_everything_in_order() {
        assert_eq!(filter_records(&people(), &["name"], ""), people());
        assert_eq!(filter_records(&people(), &["name"], "   "), people());
    }

    #[test]
    fn only_listed_fields_are_searched() {
        assert!(filter_records(&people(), &["name"], "sales").is_empty());
        assert_eq!(filter_records(&people(), &["department"], "SALES").len(), 1);
    }

    #[test]
    fn handler_echoes_query_first() {
        let h = SearchHandler::new("search", people(), ["name", "department"])
            .results_path("/contacts");
        let action = Action::new("search").with_context("value", "alice");
        let patches = h.handle(&json!({}), &action);
        assert_eq!(
            patches,
            vec![
                Patch::new("/query", "alice"),
                Patch::new("/contacts", json!([people()[0].clone()])),
            ]
        );
    }

    #[test]
    fn handler_ignores_other_events() {
        let h = SearchHandler::new("search", people(), ["name"]);
        assert!(h.handle(&json!({}), &Action::new("refresh")).is_empty());
    }

    #[test]
    fn absent_query_is_empty() {
        let h = SearchHandler::new("search", people(), ["name"]);
        let patches = h.handle(&json!({}), &Action::new("search"));
        assert_eq!(patches[0], Patch::new("/query", ""));
        assert_eq!(patches[1].value, Value::Array(people()));
    }

    #[test]
    fn closures_are_handlers() {
        let h = |_: &Value, a: &Action| vec![Patch::new("/last", a.name.clone())];
        assert_eq!(
            h.handle(&json!({}), &Action::new("x")),
            vec![Patch::new("/last", "x")]
        );
    }
}
