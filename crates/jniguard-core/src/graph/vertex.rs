use std::fmt;

use serde::Serialize;

/// Identity of one tracked variable occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EnclNamePosTuple {
    pub var_name: String,
    pub function_name: String,
    pub file_name: String,
    pub defined_position: String,
}

impl EnclNamePosTuple {
    pub fn new(var_name: &str, function_name: &str, file_name: &str, defined_position: &str) -> Self {
        Self {
            var_name: var_name.to_string(),
            function_name: function_name.to_string(),
            file_name: file_name.to_string(),
            defined_position: defined_position.to_string(),
        }
    }
}

impl fmt::Display for EnclNamePosTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}({}:{})",
            self.var_name, self.function_name, self.file_name, self.defined_position
        )
    }
}

/// A variable flowing into an unresolved unsafe library call. Shares the
/// enclosing function and file of the occurrence it was found on; `position`
/// is the call's position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnsafeUse {
    pub var_name: String,
    pub function_name: String,
    pub file_name: String,
    pub position: String,
    pub unsafe_function: String,
}

impl UnsafeUse {
    pub fn new(origin: &EnclNamePosTuple, unsafe_function: &str, position: &str) -> Self {
        Self {
            var_name: origin.var_name.clone(),
            function_name: origin.function_name.clone(),
            file_name: origin.file_name.clone(),
            position: position.to_string(),
            unsafe_function: unsafe_function.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Vertex {
    Occurrence(EnclNamePosTuple),
    Marker(UnsafeUse),
}

impl Vertex {
    pub fn is_marker(&self) -> bool {
        matches!(self, Vertex::Marker(_))
    }

    pub fn var_name(&self) -> &str {
        match self {
            Vertex::Occurrence(tuple) => &tuple.var_name,
            Vertex::Marker(marker) => &marker.var_name,
        }
    }

    pub fn function_name(&self) -> &str {
        match self {
            Vertex::Occurrence(tuple) => &tuple.function_name,
            Vertex::Marker(marker) => &marker.function_name,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Vertex::Occurrence(tuple) => &tuple.file_name,
            Vertex::Marker(marker) => &marker.file_name,
        }
    }

    pub fn position(&self) -> &str {
        match self {
            Vertex::Occurrence(tuple) => &tuple.defined_position,
            Vertex::Marker(marker) => &marker.position,
        }
    }
}

impl From<EnclNamePosTuple> for Vertex {
    fn from(tuple: EnclNamePosTuple) -> Self {
        Vertex::Occurrence(tuple)
    }
}

impl From<UnsafeUse> for Vertex {
    fn from(marker: UnsafeUse) -> Self {
        Vertex::Marker(marker)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vertex::Occurrence(tuple) => tuple.fmt(f),
            Vertex::Marker(marker) => write!(
                f,
                "{}#{}@{}({}:{})",
                marker.var_name,
                marker.unsafe_function,
                marker.function_name,
                marker.file_name,
                marker.position
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuples_compare_by_value() {
        let a = EnclNamePosTuple::new("buf", "main", "a.c", "3:10");
        let b = EnclNamePosTuple::new("buf", "main", "a.c", "3:10");
        let c = EnclNamePosTuple::new("buf", "main", "a.c", "3:11");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn marker_never_equals_occurrence_with_hash_in_name() {
        let origin = EnclNamePosTuple::new("buf", "main", "a.c", "3:10");
        let marker = Vertex::from(UnsafeUse::new(&origin, "strcpy", "5:3"));
        let lookalike = Vertex::from(EnclNamePosTuple::new("buf#strcpy", "main", "a.c", "5:3"));

        assert_eq!(marker.to_string(), lookalike.to_string());
        assert_ne!(marker, lookalike);
    }

    #[test]
    fn marker_keeps_origin_scope() {
        let origin = EnclNamePosTuple::new("buf", "main", "a.c", "3:10");
        let marker = Vertex::from(UnsafeUse::new(&origin, "memcpy", "7:1"));

        assert!(marker.is_marker());
        assert_eq!(marker.var_name(), "buf");
        assert_eq!(marker.function_name(), "main");
        assert_eq!(marker.file_name(), "a.c");
        assert_eq!(marker.position(), "7:1");
    }

    #[test]
    fn display_is_readable() {
        let vertex = Vertex::from(EnclNamePosTuple::new("x", "foo", "lib.c", "12:4"));
        assert_eq!(vertex.to_string(), "x@foo(lib.c:12:4)");
    }
}
