use std::collections::HashSet;

use crate::{
    component::{self, Component},
    error::{Error, Result},
};

/// The full component tree of a surface.
///
/// Trees are always replaced and transmitted whole, so a tree value is
/// self-sufficient: no frame depends on an earlier one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentTree {
    /// Nodes in transmission order.
    nodes: Vec<Component>,
}

impl ComponentTree {
    /// Validate and build a tree.
    ///
    /// Fails with [`Error::MalformedTree`] on a duplicate id or on a child or
    /// template reference that names no node in the same set. Unknown
    /// component types are not an error.
    pub fn new(nodes: Vec<Component>) -> Result<Self> {
        let mut ids = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(Error::MalformedTree(format!("duplicate id {:?}", node.id)));
            }
        }
        for node in &nodes {
            if let Some(missing) = node
                .children
                .references()
                .into_iter()
                .find(|r| !ids.contains(r))
            {
                return Err(Error::MalformedTree(format!(
                    "{:?} refers to missing node {missing:?}",
                    node.id
                )));
            }
            if !component::is_standard(&node.component) {
                tracing::debug!(
                    "node {:?} has type {:?} outside the standard catalog",
                    node.id,
                    node.component
                );
            }
        }
        Ok(Self { nodes })
    }

    /// The nodes in transmission order.
    pub fn nodes(&self) -> &[Component] {
        &self.nodes
    }

    /// Look up a node by id.
    pub fn get(&self, id: &str) -> Option<&Component> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// True if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
