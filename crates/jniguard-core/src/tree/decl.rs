//! Declaration queries over srcML-shaped trees
//!
//! Function names, parameters, specifiers and class names are read from the
//! same element layout the extraction service emits for both C/C++ and Java.

use std::collections::HashSet;

use serde::Serialize;

use super::{NodeId, POSITION_ATTRIBUTE, SyntaxTree};

pub const FUNCTION_TAGS: &[&str] = &["function", "function_decl", "constructor", "destructor"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NamePos {
    pub name: String,
    pub type_name: String,
    pub position: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    pub position: String,
    pub optional: bool,
}

/// Name, type and position of a declaration-like node, read from its direct
/// `name` and `type` children.
pub fn name_pos(tree: &SyntaxTree, node: NodeId) -> NamePos {
    let name_node = tree.first_by_tag(node, "name");
    let name = name_node
        .map(|id| tree.text_content(id).trim().to_string())
        .unwrap_or_default();
    let position = name_node
        .and_then(|id| tree.attribute(id, POSITION_ATTRIBUTE))
        .unwrap_or_default()
        .to_string();
    let type_name = tree
        .first_by_tag(node, "type")
        .map(|id| tree.text_content(id).trim().to_string())
        .unwrap_or_default();

    NamePos {
        name,
        type_name,
        position,
    }
}

pub fn function_parameters(tree: &SyntaxTree, function: NodeId) -> Vec<Parameter> {
    let Some(list) = tree.first_by_tag(function, "parameter_list") else {
        return Vec::new();
    };

    tree.find_by_tag(list, "parameter", false)
        .into_iter()
        .map(|parameter| match tree.first_by_tag(parameter, "decl") {
            Some(decl) => {
                let declared = name_pos(tree, decl);
                Parameter {
                    name: declared.name,
                    type_name: declared.type_name,
                    position: declared.position,
                    optional: tree.first_by_tag(decl, "init").is_some(),
                }
            }
            None => Parameter {
                type_name: tree.text_content(parameter).trim().to_string(),
                ..Parameter::default()
            },
        })
        .collect()
}

/// Every function-like declaration below `unit`, grouped by tag in
/// [`FUNCTION_TAGS`] order. A repeated name/position keeps its first node.
pub fn function_declarations(tree: &SyntaxTree, unit: NodeId) -> Vec<(NamePos, NodeId)> {
    let mut seen = HashSet::new();
    let mut declarations = Vec::new();

    for tag in FUNCTION_TAGS {
        for node in tree.find_by_tag(unit, tag, true) {
            let key = name_pos(tree, node);
            if seen.insert(key.clone()) {
                declarations.push((key, node));
            }
        }
    }

    declarations
}

pub fn has_specifier(tree: &SyntaxTree, function: NodeId, modifier: &str) -> bool {
    tree.find_by_tag(function, "specifier", false)
        .into_iter()
        .any(|specifier| tree.text_content(specifier).trim() == modifier)
}

/// Simple name of the first class declared directly in `unit`.
pub fn class_name(tree: &SyntaxTree, unit: NodeId) -> Option<String> {
    let class = tree.first_by_tag(unit, "class")?;
    let name = tree.first_by_tag(class, "name")?;
    Some(tree.text_content(name).trim().to_string())
}
