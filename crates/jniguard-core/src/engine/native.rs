//! JNI bridging from a Java `native` method parameter to the C/C++
//! implementation parameter that receives it

use tracing::debug;

use crate::profile::{Language, ProfileStore, SliceKey, SliceProfile};
use crate::tree::{class_name, function_parameters};

pub const NATIVE_MODIFIER: &str = "native";

/// `JNIEnv*` and `jobject`/`jclass` precede the declared arguments.
pub const JNI_IMPLICIT_PARAMS: usize = 2;

/// `nDraw` -> `Draw`; other names are returned as-is.
pub fn native_short_name(method: &str) -> &str {
    let mut chars = method.chars();
    let prefixed = chars.next() == Some('n')
        && chars.next().is_some_and(char::is_uppercase)
        && chars.next().is_some();
    if prefixed { &method[1..] } else { method }
}

pub fn jni_search_token(class: &str, method: &str) -> String {
    format!("{}_{}", class, native_short_name(method)).to_lowercase()
}

/// Profiles of native parameters that the Java parameter tracked by `profile`
/// is handed to. Every match is returned; nothing found yields an empty list.
pub fn bridge_targets<'a>(store: &'a ProfileStore, profile: &SliceProfile) -> Vec<&'a SliceProfile> {
    let mut targets = Vec::new();

    let Some(file) = store.file(&profile.file_name) else {
        return targets;
    };
    let Some(function) = profile.function_node else {
        return targets;
    };
    let Some(param_index) = function_parameters(&file.tree, function)
        .iter()
        .position(|param| param.name == profile.var_name)
    else {
        return targets;
    };
    let Some(class) = file.unit().and_then(|unit| class_name(&file.tree, unit)) else {
        return targets;
    };

    let arg_index = param_index + JNI_IMPLICIT_PARAMS;
    let token = jni_search_token(&class, &profile.function_name);
    debug!(
        "Bridging {} of native method {}: looking for *{} argument {}",
        profile.var_name, profile.function_name, token, arg_index
    );

    for native in store.files_in(Language::Native) {
        for (declared, node) in &native.functions {
            if !declared.name.to_lowercase().ends_with(&token) {
                continue;
            }
            let params = function_parameters(&native.tree, *node);
            let Some(arg) = params.get(arg_index) else {
                continue;
            };
            let key = SliceKey::new(&arg.name, &arg.position, &declared.name, &native.path);
            if let Some(target) = native.profile(&key) {
                targets.push(target);
            }
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_jni_wrapper_prefix() {
        assert_eq!(native_short_name("nDraw"), "Draw");
        assert_eq!(native_short_name("nativeDraw"), "nativeDraw");
        assert_eq!(native_short_name("nA"), "nA");
        assert_eq!(native_short_name("draw"), "draw");
        assert_eq!(native_short_name(""), "");
    }

    #[test]
    fn search_token_is_lowercase() {
        assert_eq!(jni_search_token("Canvas", "nDrawRect"), "canvas_drawrect");
        assert!(
            "Java_android_graphics_Canvas_DrawRect"
                .to_lowercase()
                .ends_with(&jni_search_token("Canvas", "nDrawRect"))
        );
    }
}
