//! Dependency tracing across the JNI boundary
//!
//! Loads per-variable slice profiles for Java and C/C++ sources, links them
//! into one dependency graph, and reports paths from origin variables to
//! unsafe buffer operations.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod graph;
pub mod profile;
pub mod report;
pub mod tree;
pub mod violation;

pub use analysis::{Analyzer, KeywordTrace, RunOutcome};
pub use config::{Config, ConfigError, ModeSettings, RunMode};
pub use engine::AnalysisContext;
pub use graph::{DependencyGraph, DotError, EnclNamePosTuple, UnsafeUse, Vertex};
pub use profile::{Language, ProfileStore, SliceKey, SliceProfile, StoreError};
pub use report::ViolationReport;
pub use violation::ViolationRegistry;
