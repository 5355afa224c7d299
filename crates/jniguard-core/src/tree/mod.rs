//! Syntax tree model handed over by the tree-extraction service
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Two handles are the
//! same node exactly when their ids are equal, which is what call-site records
//! rely on to identify the enclosing function.

pub mod decl;

use id_arena::{Arena, Id};
use serde::Deserialize;
use std::collections::BTreeMap;

pub use decl::{
    FUNCTION_TAGS, NamePos, Parameter, class_name, function_declarations, function_parameters,
    has_specifier, name_pos,
};

pub type NodeId = Id<SyntaxNode>;

/// Attribute carrying the `line:column` start of a node.
pub const POSITION_ATTRIBUTE: &str = "pos:start";

#[derive(Debug)]
pub struct SyntaxNode {
    pub id: NodeId,
    pub tag: String,
    pub text: String,
    pub attributes: BTreeMap<String, String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Serialized node as emitted by the extraction service.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawNode {
    pub tag: String,
    pub text: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_position(self, position: &str) -> Self {
        self.with_attribute(POSITION_ATTRIBUTE, position)
    }

    pub fn with_child(mut self, child: RawNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = RawNode>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Debug)]
pub struct SyntaxTree {
    arena: Arena<SyntaxNode>,
    root: Option<NodeId>,
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn from_raw(raw: &RawNode) -> Self {
        let mut tree = Self::new();
        let mut pending: Vec<(&RawNode, Option<NodeId>)> = vec![(raw, None)];

        while let Some((node, parent)) = pending.pop() {
            let id = tree.add_node(parent, &node.tag, &node.text);
            tree.arena[id].attributes = node.attributes.clone();
            for child in node.children.iter().rev() {
                pending.push((child, Some(id)));
            }
        }

        tree
    }

    pub fn add_node(&mut self, parent: Option<NodeId>, tag: &str, text: &str) -> NodeId {
        let id = self.arena.alloc_with_id(|id| SyntaxNode {
            id,
            tag: tag.to_string(),
            text: text.to_string(),
            attributes: BTreeMap::new(),
            parent,
            children: Vec::new(),
        });

        if let Some(parent_id) = parent {
            self.arena[parent_id].children.push(id);
        }

        if self.root.is_none() {
            self.root = Some(id);
        }

        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &SyntaxNode {
        &self.arena[id]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.arena[id].tag
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.arena[id].attributes.get(name).map(String::as_str)
    }

    /// Concatenated text of the node and all of its descendants, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut content = String::new();
        let mut pending = vec![id];

        while let Some(current) = pending.pop() {
            let node = &self.arena[current];
            content.push_str(&node.text);
            pending.extend(node.children.iter().rev().copied());
        }

        content
    }

    /// Children tagged `tag`, or every such descendant (document order, excluding
    /// `id` itself) when `recursive` is set.
    pub fn find_by_tag(&self, id: NodeId, tag: &str, recursive: bool) -> Vec<NodeId> {
        if !recursive {
            return self.arena[id]
                .children
                .iter()
                .copied()
                .filter(|&child| self.arena[child].tag == tag)
                .collect();
        }

        let mut found = Vec::new();
        let mut pending: Vec<NodeId> = self.arena[id].children.iter().rev().copied().collect();

        while let Some(current) = pending.pop() {
            let node = &self.arena[current];
            if node.tag == tag {
                found.push(current);
            }
            pending.extend(node.children.iter().rev().copied());
        }

        found
    }

    pub fn first_by_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.arena[id]
            .children
            .iter()
            .copied()
            .find(|&child| self.arena[child].tag == tag)
    }

    pub fn node_at(list: &[NodeId], index: usize) -> Option<NodeId> {
        list.get(index).copied()
    }
}
