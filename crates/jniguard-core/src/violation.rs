//! Unsafe buffer operations found during analysis
//!
//! Violations are keyed by graph vertex. A direct buffer write is recorded on
//! the occurrence that performs it; a call into one of [`UNSAFE_FUNCTIONS`]
//! that resolves to no user declaration is recorded on a marker vertex.

use std::collections::BTreeMap;

use crate::graph::{UnsafeUse, Vertex};

/// C string and memory primitives whose unresolved use is reported.
pub const UNSAFE_FUNCTIONS: &[&str] = &[
    "strcat", "strdup", "strncat", "strcmp", "strncmp", "strcpy", "strncpy", "strlen", "strchr",
    "strrchr", "index", "rindex", "strpbrk", "strspn", "strcspn", "strstr", "strtok", "memccpy",
    "memchr", "memmove", "memcpy", "memcmp", "memset", "bcopy", "bzero", "bcmp",
];

pub fn is_unsafe_function(name: &str) -> bool {
    UNSAFE_FUNCTIONS.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    BufferWrite,
    UnsafeCall,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::BufferWrite => "buffer_write",
            ViolationKind::UnsafeCall => "unsafe_call",
        }
    }

    pub fn of(vertex: &Vertex) -> Self {
        if vertex.is_marker() {
            ViolationKind::UnsafeCall
        } else {
            ViolationKind::BufferWrite
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ViolationRegistry {
    entries: BTreeMap<Vertex, Vec<String>>,
}

impl ViolationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to whatever was already recorded for `vertex`.
    pub fn record_buffer_write(&mut self, vertex: &Vertex, position: &str) {
        self.entries
            .entry(vertex.clone())
            .or_default()
            .push(format!("Buffer write at {position}"));
    }

    /// The marker carries the call position, so a marker only ever holds the
    /// one description.
    pub fn record_unsafe_use(&mut self, marker: &UnsafeUse) {
        self.entries.insert(
            Vertex::Marker(marker.clone()),
            vec![format!("Use of {} at {}", marker.unsafe_function, marker.position)],
        );
    }

    pub fn get(&self, vertex: &Vertex) -> Option<&[String]> {
        self.entries.get(vertex).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vertex, &[String])> {
        self.entries
            .iter()
            .map(|(vertex, descriptions)| (vertex, descriptions.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn description_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
