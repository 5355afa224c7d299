//! Slice profiles produced by the external slice generator
//!
//! A slice profile records one variable occurrence inside one function: the
//! calls it is passed to, the variables it is derived from, and how it is
//! accessed. Profiles are addressed by [`SliceKey`], never by reference.

pub mod document;
pub mod store;

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::graph::EnclNamePosTuple;
use crate::tree::{NodeId, Parameter};

pub use document::{CallSiteDocument, FileDocument, ProfileDocument, StoreDocument};
pub use store::{FileProfiles, Language, ProfileStore, StoreError};

/// Enclosing-function name used for file-scope variables.
pub const GLOBAL_SCOPE: &str = "GLOBAL";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SliceKey {
    pub var_name: String,
    pub position: String,
    pub function_name: String,
    pub file_name: String,
}

impl SliceKey {
    pub fn new(var_name: &str, position: &str, function_name: &str, file_name: &str) -> Self {
        Self {
            var_name: var_name.to_string(),
            position: position.to_string(),
            function_name: function_name.to_string(),
            file_name: file_name.to_string(),
        }
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}%{}%{}%{}",
            self.var_name, self.position, self.function_name, self.file_name
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    BufferRead,
    BufferWrite,
    DataRead,
    DataWrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataAccess {
    pub kind: AccessKind,
    pub position: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct VariableAccess {
    pub write_positions: Vec<DataAccess>,
}

/// A variable this profile's value is derived from. `function_name` names the
/// scope the dependency was declared in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DependentVar {
    pub name: String,
    pub function_name: String,
    pub position: String,
}

/// One concrete call expression (or constructor invocation) receiving a
/// variable, or a callee declaration resolved for it.
#[derive(Debug, Clone)]
pub struct CFunction {
    pub name: String,
    pub position: String,
    /// 1-based position of the variable among the call's arguments.
    pub arg_pos_index: usize,
    pub enclosing_function_name: String,
    pub enclosing_function_node: Option<NodeId>,
    pub formal_params: Option<Vec<Parameter>>,
}

impl CFunction {
    pub fn call_site(
        name: &str,
        position: &str,
        arg_pos_index: usize,
        enclosing_function_name: &str,
        enclosing_function_node: Option<NodeId>,
    ) -> Self {
        Self {
            name: name.to_string(),
            position: position.to_string(),
            arg_pos_index,
            enclosing_function_name: enclosing_function_name.to_string(),
            enclosing_function_node,
            formal_params: None,
        }
    }

    pub fn with_formal_params(mut self, params: Vec<Parameter>) -> Self {
        self.formal_params = Some(params);
        self
    }

    /// The declared parameter receiving the tracked argument.
    pub fn receiving_param(&self) -> Option<&Parameter> {
        let index = self.arg_pos_index.checked_sub(1)?;
        self.formal_params.as_ref()?.get(index)
    }
}

impl PartialEq for CFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.position == other.position
            && self.arg_pos_index == other.arg_pos_index
            && self.enclosing_function_name == other.enclosing_function_name
            && self.enclosing_function_node == other.enclosing_function_node
    }
}

impl Eq for CFunction {}

impl Hash for CFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.position.hash(state);
        self.enclosing_function_name.hash(state);
    }
}

#[derive(Debug, Clone)]
pub struct SliceProfile {
    pub file_name: String,
    pub var_name: String,
    pub type_name: String,
    pub function_name: String,
    pub defined_position: String,
    pub function_node: Option<NodeId>,
    pub cfunctions: BTreeMap<String, CFunction>,
    pub dependent_vars: Vec<DependentVar>,
    pub used_positions: Vec<VariableAccess>,
}

impl SliceProfile {
    pub fn new(
        file_name: &str,
        var_name: &str,
        type_name: &str,
        function_name: &str,
        defined_position: &str,
    ) -> Self {
        Self {
            file_name: file_name.to_string(),
            var_name: var_name.to_string(),
            type_name: type_name.to_string(),
            function_name: function_name.to_string(),
            defined_position: defined_position.to_string(),
            function_node: None,
            cfunctions: BTreeMap::new(),
            dependent_vars: Vec::new(),
            used_positions: Vec::new(),
        }
    }

    pub fn key(&self) -> SliceKey {
        SliceKey::new(
            &self.var_name,
            &self.defined_position,
            &self.function_name,
            &self.file_name,
        )
    }

    pub fn vertex(&self) -> EnclNamePosTuple {
        EnclNamePosTuple::new(
            &self.var_name,
            &self.function_name,
            &self.file_name,
            &self.defined_position,
        )
    }

    pub fn is_global(&self) -> bool {
        self.function_name == GLOBAL_SCOPE
    }

    pub fn buffer_writes(&self) -> impl Iterator<Item = &DataAccess> {
        self.used_positions
            .iter()
            .flat_map(|access| access.write_positions.iter())
            .filter(|access| access.kind == AccessKind::BufferWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{RawNode, SyntaxTree};

    #[test]
    fn slice_key_renders_like_profile_table_keys() {
        let key = SliceKey::new("buf", "3:10", "main", "a.c");
        assert_eq!(key.to_string(), "buf%3:10%main%a.c");
    }

    #[test]
    fn profile_key_and_vertex_share_fields() {
        let profile = SliceProfile::new("a.c", "buf", "char *", "main", "3:10");

        let key = profile.key();
        let vertex = profile.vertex();
        assert_eq!(key.var_name, vertex.var_name);
        assert_eq!(key.position, vertex.defined_position);
        assert_eq!(key.function_name, vertex.function_name);
        assert_eq!(key.file_name, vertex.file_name);
    }

    #[test]
    fn call_site_equality_requires_same_enclosing_node() {
        let tree = SyntaxTree::from_raw(
            &RawNode::element("unit")
                .with_child(RawNode::element("function"))
                .with_child(RawNode::element("function")),
        );
        let functions = tree.find_by_tag(tree.root().unwrap(), "function", false);

        let first = CFunction::call_site("foo", "4:5", 1, "main", Some(functions[0]));
        let same = CFunction::call_site("foo", "4:5", 1, "main", Some(functions[0]));
        let other_node = CFunction::call_site("foo", "4:5", 1, "main", Some(functions[1]));

        assert_eq!(first, same);
        assert_ne!(first, other_node);
    }

    #[test]
    fn formal_params_do_not_affect_equality() {
        let bare = CFunction::call_site("foo", "4:5", 1, "main", None);
        let resolved = bare.clone().with_formal_params(vec![Parameter::default()]);
        assert_eq!(bare, resolved);
    }

    #[test]
    fn receiving_param_is_one_based() {
        let params = vec![
            Parameter {
                name: "dst".into(),
                ..Parameter::default()
            },
            Parameter {
                name: "src".into(),
                ..Parameter::default()
            },
        ];
        let resolved = CFunction::call_site("copy", "", 2, "main", None).with_formal_params(params);

        assert_eq!(resolved.receiving_param().map(|p| p.name.as_str()), Some("src"));
        assert!(
            CFunction::call_site("copy", "", 0, "main", None)
                .with_formal_params(vec![])
                .receiving_param()
                .is_none()
        );
    }

    #[test]
    fn buffer_writes_skip_other_access_kinds() {
        let mut profile = SliceProfile::new("a.c", "buf", "char *", "main", "3:10");
        profile.used_positions.push(VariableAccess {
            write_positions: vec![
                DataAccess {
                    kind: AccessKind::DataWrite,
                    position: "4:3".into(),
                },
                DataAccess {
                    kind: AccessKind::BufferWrite,
                    position: "5:3".into(),
                },
            ],
        });

        let positions: Vec<_> = profile.buffer_writes().map(|a| a.position.as_str()).collect();
        assert_eq!(positions, vec!["5:3"]);
    }

    #[test]
    fn global_sentinel_is_detected() {
        assert!(SliceProfile::new("a.c", "g", "int", GLOBAL_SCOPE, "1:5").is_global());
        assert!(!SliceProfile::new("a.c", "g", "int", "main", "1:5").is_global());
    }
}
