//! Interprocedural dependency analysis over slice profiles
//!
//! Starting from one profile, the engine follows call arguments into callee
//! parameters, derivations into the variables they come from, and Java
//! `native` parameters into their JNI implementations, adding an edge for
//! every step. Unsafe library calls and buffer writes are recorded in the
//! [`ViolationRegistry`] as they are met.
//!
//! Traversal is depth-first on an explicit stack. A profile is only entered
//! once per context, and a step into another profile is only taken when its
//! edge is new.

pub mod callsite;
pub mod native;

use std::collections::HashSet;
use std::vec;

use tracing::{debug, trace};

use crate::graph::{DependencyGraph, UnsafeUse, Vertex};
use crate::profile::{Language, ProfileStore, SliceKey, SliceProfile};
use crate::tree::has_specifier;
use crate::violation::{ViolationRegistry, is_unsafe_function};

pub use callsite::{UsageSite, candidate_callees, resolve_call_site};
pub use native::{NATIVE_MODIFIER, bridge_targets, jni_search_token, native_short_name};

/// One unit of work queued while entering a profile.
#[derive(Debug)]
enum Step<'a> {
    Link {
        target: &'a SliceProfile,
        universe: Language,
    },
    Flag(UnsafeUse),
    Anchor,
    BufferWrite {
        position: String,
    },
}

struct Frame<'a> {
    vertex: Vertex,
    steps: vec::IntoIter<Step<'a>>,
}

/// Run-scoped analysis state: the graph, the registry and the visited set.
pub struct AnalysisContext<'a> {
    store: &'a ProfileStore,
    check_buffer: bool,
    graph: DependencyGraph,
    violations: ViolationRegistry,
    analyzed: HashSet<SliceKey>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(store: &'a ProfileStore, check_buffer: bool) -> Self {
        Self {
            store,
            check_buffer,
            graph: DependencyGraph::new(),
            violations: ViolationRegistry::new(),
            analyzed: HashSet::new(),
        }
    }

    pub fn is_analyzed(&self, profile: &SliceProfile) -> bool {
        self.analyzed.contains(&profile.key())
    }

    pub fn analyzed_count(&self) -> usize {
        self.analyzed.len()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn violations(&self) -> &ViolationRegistry {
        &self.violations
    }

    pub fn into_parts(self) -> (DependencyGraph, ViolationRegistry) {
        (self.graph, self.violations)
    }

    /// Analyzes `profile` and everything it reaches, resolving calls against
    /// the files of `universe`. A no-op for a profile already analyzed.
    pub fn analyze(&mut self, profile: &'a SliceProfile, universe: Language) {
        let Some(root) = self.enter(profile, universe) else {
            return;
        };
        let mut stack = vec![root];

        while let Some(frame) = stack.last_mut() {
            let Some(step) = frame.steps.next() else {
                stack.pop();
                continue;
            };
            let current = frame.vertex.clone();

            match step {
                Step::Link { target, universe } => {
                    let next = Vertex::from(target.vertex());
                    if !self.graph.ensure_edge(&current, &next) {
                        continue;
                    }
                    if let Some(child) = self.enter(target, universe) {
                        stack.push(child);
                    }
                }
                Step::Flag(marker) => {
                    self.graph
                        .ensure_edge(&current, &Vertex::Marker(marker.clone()));
                    debug!("Unsafe call {} reached by {}", marker.unsafe_function, current);
                    self.violations.record_unsafe_use(&marker);
                }
                Step::Anchor => {
                    self.graph.add_vertex(current);
                }
                Step::BufferWrite { position } => {
                    self.violations.record_buffer_write(&current, &position);
                }
            }
        }
    }

    fn enter(&mut self, profile: &'a SliceProfile, universe: Language) -> Option<Frame<'a>> {
        if !self.analyzed.insert(profile.key()) {
            return None;
        }
        trace!("Analyzing {}", profile.key());

        Some(Frame {
            vertex: Vertex::from(profile.vertex()),
            steps: self.plan(profile, universe).into_iter(),
        })
    }

    fn plan(&self, profile: &'a SliceProfile, universe: Language) -> Vec<Step<'a>> {
        let store = self.store;
        let mut steps = Vec::new();
        let Some(file) = store.file(&profile.file_name) else {
            debug!("Profile {} refers to unknown file", profile.key());
            return steps;
        };
        let current = profile.vertex();

        for (callee, site) in &profile.cfunctions {
            let targets = resolve_call_site(store, universe, file, site);
            if targets.is_empty() {
                if is_unsafe_function(callee) {
                    steps.push(Step::Flag(UnsafeUse::new(&current, callee, &site.position)));
                }
                continue;
            }
            steps.extend(targets.into_iter().map(|target| Step::Link { target, universe }));
        }

        steps.push(Step::Anchor);

        for dependency in &profile.dependent_vars {
            let key = SliceKey::new(
                &dependency.name,
                &dependency.position,
                &dependency.function_name,
                &profile.file_name,
            );
            // member assignments have no profile of their own
            if let Some(target) = file.profile(&key) {
                steps.push(Step::Link { target, universe });
            }
        }

        if self.bridges_to_native(profile) {
            steps.extend(
                bridge_targets(store, profile)
                    .into_iter()
                    .map(|target| Step::Link {
                        target,
                        universe: Language::Native,
                    }),
            );
        }

        if self.check_buffer && file.language != Language::Managed {
            steps.extend(profile.buffer_writes().map(|access| Step::BufferWrite {
                position: access.position.clone(),
            }));
        }

        steps
    }

    fn bridges_to_native(&self, profile: &SliceProfile) -> bool {
        if profile.is_global() || !profile.cfunctions.is_empty() {
            return false;
        }
        let (Some(file), Some(function)) = (self.store.file(&profile.file_name), profile.function_node)
        else {
            return false;
        };
        file.language == Language::Managed && has_specifier(&file.tree, function, NATIVE_MODIFIER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EnclNamePosTuple;
    use crate::profile::{AccessKind, DataAccess, DependentVar, FileProfiles, VariableAccess};
    use crate::tree::{RawNode, SyntaxTree};

    fn function(name: &str) -> RawNode {
        RawNode::element("function")
            .with_child(RawNode::element("name").with_text(name).with_position("1:1"))
    }

    fn store_with(path: &str, functions: &[&str], profiles: Vec<SliceProfile>) -> ProfileStore {
        let unit = RawNode::element("unit").with_children(functions.iter().map(|f| function(f)));
        let mut file = FileProfiles::new(path, SyntaxTree::from_raw(&unit));
        let nodes: Vec<_> = file.functions.clone();
        for mut profile in profiles {
            profile.function_node = nodes
                .iter()
                .find(|(key, _)| key.name == profile.function_name)
                .map(|(_, node)| *node);
            file.insert_profile(profile).unwrap();
        }
        let mut store = ProfileStore::new();
        store.insert_file(file).unwrap();
        store
    }

    fn profile_of<'s>(store: &'s ProfileStore, path: &str, var: &str) -> &'s SliceProfile {
        store
            .file(path)
            .unwrap()
            .profiles
            .values()
            .find(|p| p.var_name == var)
            .unwrap()
    }

    #[test]
    fn isolated_profile_becomes_a_vertex() {
        let store = store_with("a.c", &["main"], vec![SliceProfile::new("a.c", "n", "int", "main", "2:5")]);
        let mut context = AnalysisContext::new(&store, true);
        context.analyze(profile_of(&store, "a.c", "n"), Language::Native);

        assert_eq!(context.graph().vertex_count(), 1);
        assert_eq!(context.graph().edge_count(), 0);
        assert!(context.violations().is_empty());
    }

    #[test]
    fn dependent_variables_are_followed() {
        let mut buf = SliceProfile::new("a.c", "buf", "char *", "main", "2:5");
        buf.dependent_vars.push(DependentVar {
            name: "src".into(),
            function_name: "main".into(),
            position: "3:5".into(),
        });
        buf.dependent_vars.push(DependentVar {
            name: "field".into(),
            function_name: "main".into(),
            position: "4:5".into(),
        });
        let src = SliceProfile::new("a.c", "src", "char *", "main", "3:5");
        let store = store_with("a.c", &["main"], vec![buf, src]);

        let mut context = AnalysisContext::new(&store, true);
        context.analyze(profile_of(&store, "a.c", "buf"), Language::Native);

        let from = Vertex::from(EnclNamePosTuple::new("buf", "main", "a.c", "2:5"));
        let to = Vertex::from(EnclNamePosTuple::new("src", "main", "a.c", "3:5"));
        assert!(context.graph().contains_edge(&from, &to));
        assert_eq!(context.graph().edge_count(), 1);
        assert!(context.is_analyzed(profile_of(&store, "a.c", "src")));
    }

    #[test]
    fn buffer_writes_only_when_enabled() {
        let mut buf = SliceProfile::new("a.c", "buf", "char *", "main", "2:5");
        buf.used_positions.push(VariableAccess {
            write_positions: vec![DataAccess {
                kind: AccessKind::BufferWrite,
                position: "5:3".into(),
            }],
        });
        let store = store_with("a.c", &["main"], vec![buf]);
        let profile = profile_of(&store, "a.c", "buf");

        let mut checked = AnalysisContext::new(&store, true);
        checked.analyze(profile, Language::Native);
        assert_eq!(checked.violations().description_count(), 1);

        let mut unchecked = AnalysisContext::new(&store, false);
        unchecked.analyze(profile, Language::Native);
        assert!(unchecked.violations().is_empty());
    }

    #[test]
    fn managed_files_never_report_buffer_writes() {
        let mut buf = SliceProfile::new("A.java", "buf", "byte[]", "run", "2:5");
        buf.used_positions.push(VariableAccess {
            write_positions: vec![DataAccess {
                kind: AccessKind::BufferWrite,
                position: "5:3".into(),
            }],
        });
        let store = store_with("A.java", &["run"], vec![buf]);

        let mut context = AnalysisContext::new(&store, true);
        context.analyze(profile_of(&store, "A.java", "buf"), Language::Managed);
        assert!(context.violations().is_empty());
    }

    #[test]
    fn second_analysis_is_a_no_op() {
        let mut buf = SliceProfile::new("a.c", "buf", "char *", "main", "2:5");
        buf.used_positions.push(VariableAccess {
            write_positions: vec![DataAccess {
                kind: AccessKind::BufferWrite,
                position: "5:3".into(),
            }],
        });
        let store = store_with("a.c", &["main"], vec![buf]);
        let profile = profile_of(&store, "a.c", "buf");

        let mut context = AnalysisContext::new(&store, true);
        context.analyze(profile, Language::Native);
        let first = context.violations().clone();
        context.analyze(profile, Language::Native);

        assert_eq!(context.violations(), &first);
        assert_eq!(context.analyzed_count(), 1);
    }
}
