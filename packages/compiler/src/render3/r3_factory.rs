//! Render3 Factory
//!
//! Factory functions that instantiate a directive, component or pipe with its
//! constructor dependencies injected.

use serde::{Deserialize, Serialize};

use super::r3_identifiers::Identifiers as R3;
use crate::output::output_ast as o;

/// A constructor parameter the runtime has to provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum R3DependencyMetadata {
    /// Another directive (or any token) looked up through the node injector.
    Token { token: String },
    TemplateRef,
    ViewContainerRef,
    ElementRef,
}

impl R3DependencyMetadata {
    pub fn token(token: impl Into<String>) -> Self {
        R3DependencyMetadata::Token {
            token: token.into(),
        }
    }
}

/// The expression that injects one dependency.
pub fn inject_dependency(dep: &R3DependencyMetadata) -> o::Expression {
    match dep {
        R3DependencyMetadata::Token { token } => {
            o::import_ref(R3::directive_inject()).call_fn(vec![o::variable(token.as_str())])
        }
        R3DependencyMetadata::TemplateRef => o::import_ref(R3::inject_template_ref()).call_fn(vec![]),
        R3DependencyMetadata::ViewContainerRef => {
            o::import_ref(R3::inject_view_container_ref()).call_fn(vec![])
        }
        R3DependencyMetadata::ElementRef => o::import_ref(R3::inject_element_ref()).call_fn(vec![]),
    }
}

/// Builds `function <Type>_Factory() { return new <Type>(deps...); }`.
///
/// When `extra_results` is not empty the factory returns an array holding the instance
/// followed by those values (content query handles are created this way).
pub fn compile_factory_function(
    type_name: &str,
    deps: &[R3DependencyMetadata],
    extra_results: Vec<o::Expression>,
) -> o::Expression {
    let instance = o::variable(type_name).instantiate(deps.iter().map(inject_dependency).collect());

    let result = if extra_results.is_empty() {
        instance
    } else {
        let mut entries = Vec::with_capacity(extra_results.len() + 1);
        entries.push(instance);
        entries.extend(extra_results);
        o::literal_arr(entries)
    };

    o::fn_expr(
        vec![],
        vec![o::return_stmt(result)],
        Some(format!("{}_Factory", type_name)),
    )
}
