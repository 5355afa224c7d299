//! Resolution of a call-site record to the callee parameters it feeds

use tracing::debug;

use crate::profile::{CFunction, FileProfiles, Language, ProfileStore, SliceKey, SliceProfile};
use crate::tree::{NodeId, Parameter, SyntaxTree, function_parameters, name_pos};

/// How a callee name is used inside the caller's body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageSite {
    /// `callee(a, b)`
    Call { callee: String, arg_count: usize },
    /// `Type value(a, b);`
    Construction { type_name: String, arg_count: usize },
}

impl UsageSite {
    /// Calls first, then constructor-style declarations, each in document
    /// order. Calls without an argument list are ignored.
    pub fn collect(tree: &SyntaxTree, function: NodeId) -> Vec<UsageSite> {
        let mut sites = Vec::new();

        for call in tree.find_by_tag(function, "call", true) {
            let Some(arguments) = tree.first_by_tag(call, "argument_list") else {
                continue;
            };
            sites.push(UsageSite::Call {
                callee: name_pos(tree, call).name,
                arg_count: tree.find_by_tag(arguments, "argument", false).len(),
            });
        }

        for decl in tree.find_by_tag(function, "decl", true) {
            if tree.first_by_tag(decl, "init").is_some() {
                continue;
            }
            let Some(arguments) = tree.first_by_tag(decl, "argument_list") else {
                continue;
            };
            sites.push(UsageSite::Construction {
                type_name: name_pos(tree, decl).type_name,
                arg_count: tree.find_by_tag(arguments, "argument", false).len(),
            });
        }

        sites
    }

    /// Whether this usage could be an invocation of `name` declared with
    /// `params`. A call may omit defaulted parameters; a construction may not.
    pub fn matches(&self, name: &str, params: &[Parameter]) -> bool {
        match self {
            UsageSite::Call { callee, arg_count } => {
                let required = params.iter().filter(|p| !p.optional).count();
                callee == name && (*arg_count == params.len() || *arg_count == required)
            }
            UsageSite::Construction {
                type_name,
                arg_count,
            } => type_name == name && *arg_count == params.len(),
        }
    }
}

/// Declarations of `site.name` in `universe` whose parameter at the tracked
/// argument position is named and whose arity agrees with some usage in the
/// caller's body.
pub fn candidate_callees(
    store: &ProfileStore,
    universe: Language,
    caller: &FileProfiles,
    site: &CFunction,
) -> Vec<(String, CFunction)> {
    let Some(caller_function) = site.enclosing_function_node else {
        return Vec::new();
    };
    let usages = UsageSite::collect(&caller.tree, caller_function);
    let mut candidates = Vec::new();

    for file in store.files_in(universe) {
        for (declared, node) in file.functions_named(&site.name) {
            let params = function_parameters(&file.tree, *node);
            if params.is_empty() || site.arg_pos_index == 0 || site.arg_pos_index > params.len() {
                continue;
            }
            if params[site.arg_pos_index - 1].name.is_empty() {
                continue;
            }
            if !usages.iter().any(|usage| usage.matches(&site.name, &params)) {
                continue;
            }

            let resolved = CFunction::call_site(
                &declared.name,
                &declared.position,
                site.arg_pos_index,
                &site.enclosing_function_name,
                site.enclosing_function_node,
            )
            .with_formal_params(params);
            candidates.push((file.path.clone(), resolved));
        }
    }

    candidates
}

/// Slice profiles of the callee parameters receiving the tracked argument.
pub fn resolve_call_site<'a>(
    store: &'a ProfileStore,
    universe: Language,
    caller: &FileProfiles,
    site: &CFunction,
) -> Vec<&'a SliceProfile> {
    let mut targets = Vec::new();

    for (path, callee) in candidate_callees(store, universe, caller, site) {
        let Some(param) = callee.receiving_param() else {
            continue;
        };
        let key = SliceKey::new(&param.name, &param.position, &callee.name, &path);
        match store.profile_in(&key, universe) {
            Some(profile) => targets.push(profile),
            None => debug!("No slice profile for callee parameter {}", key),
        }
    }

    targets
}
