//! Render3 Identifiers
//!
//! The runtime instruction and definition symbols referenced by generated code. All of
//! them live in the core module and print as `<alias>.<name>`.

use crate::config::DEFAULT_CORE_MODULE;
use crate::output::output_ast::ExternalReference;

/// Highest arity with a dedicated interpolation / pure function instruction.
pub const MAX_FIXED_ARITY: usize = 8;
/// Highest arity with a dedicated pipe binding instruction.
pub const MAX_PIPE_BIND_ARITY: usize = 4;

/// Runtime identifiers used in generated code
pub struct Identifiers;

impl Identifiers {
    pub const NEW_METHOD: &'static str = "n";
    pub const HOST_METHOD: &'static str = "h";

    fn make_ref(name: &str) -> ExternalReference {
        ExternalReference {
            module_name: Some(DEFAULT_CORE_MODULE.to_string()),
            name: Some(name.to_string()),
        }
    }

    /* Creation instructions */
    pub fn element_start() -> ExternalReference {
        Self::make_ref("ɵE")
    }

    pub fn element_end() -> ExternalReference {
        Self::make_ref("ɵe")
    }

    pub fn text() -> ExternalReference {
        Self::make_ref("ɵT")
    }

    pub fn container_create() -> ExternalReference {
        Self::make_ref("ɵC")
    }

    pub fn listener() -> ExternalReference {
        Self::make_ref("ɵL")
    }

    pub fn pipe() -> ExternalReference {
        Self::make_ref("ɵPp")
    }

    pub fn query() -> ExternalReference {
        Self::make_ref("ɵQ")
    }

    pub fn projection_def() -> ExternalReference {
        Self::make_ref("ɵpD")
    }

    pub fn projection() -> ExternalReference {
        Self::make_ref("ɵP")
    }

    /* Update instructions */
    pub fn text_create_bound() -> ExternalReference {
        Self::make_ref("ɵt")
    }

    pub fn element_property() -> ExternalReference {
        Self::make_ref("ɵp")
    }

    pub fn element_attribute() -> ExternalReference {
        Self::make_ref("ɵa")
    }

    pub fn element_class_named() -> ExternalReference {
        Self::make_ref("ɵk")
    }

    pub fn element_style_named() -> ExternalReference {
        Self::make_ref("ɵs")
    }

    pub fn bind() -> ExternalReference {
        Self::make_ref("ɵb")
    }

    pub fn load() -> ExternalReference {
        Self::make_ref("ɵld")
    }

    pub fn directive_refresh() -> ExternalReference {
        Self::make_ref("ɵr")
    }

    pub fn container_refresh_start() -> ExternalReference {
        Self::make_ref("ɵcR")
    }

    pub fn container_refresh_end() -> ExternalReference {
        Self::make_ref("ɵcr")
    }

    pub fn query_refresh() -> ExternalReference {
        Self::make_ref("ɵqR")
    }

    /// `ɵi1`..`ɵi8` for up to eight interpolated values, `ɵiV` above that.
    pub fn interpolation(value_count: usize) -> ExternalReference {
        if (1..=MAX_FIXED_ARITY).contains(&value_count) {
            Self::make_ref(&format!("ɵi{}", value_count))
        } else {
            Self::interpolation_v()
        }
    }

    pub fn interpolation_v() -> ExternalReference {
        Self::make_ref("ɵiV")
    }

    /// `ɵf0`..`ɵf8` for up to eight arguments, `ɵfV` above that.
    pub fn pure_function(arg_count: usize) -> ExternalReference {
        if arg_count <= MAX_FIXED_ARITY {
            Self::make_ref(&format!("ɵf{}", arg_count))
        } else {
            Self::pure_function_v()
        }
    }

    pub fn pure_function_v() -> ExternalReference {
        Self::make_ref("ɵfV")
    }

    /// `ɵpb1`..`ɵpb4` by the number of values passed (the piped value plus arguments).
    pub fn pipe_bind(value_count: usize) -> ExternalReference {
        if (1..=MAX_PIPE_BIND_ARITY).contains(&value_count) {
            Self::make_ref(&format!("ɵpb{}", value_count))
        } else {
            Self::pipe_bind_v()
        }
    }

    pub fn pipe_bind_v() -> ExternalReference {
        Self::make_ref("ɵpbV")
    }

    /* Definitions */
    pub fn define_component() -> ExternalReference {
        Self::make_ref("ɵdefineComponent")
    }

    pub fn define_directive() -> ExternalReference {
        Self::make_ref("ɵdefineDirective")
    }

    pub fn define_pipe() -> ExternalReference {
        Self::make_ref("ɵdefinePipe")
    }

    pub fn ng_on_changes_feature() -> ExternalReference {
        Self::make_ref("ɵNgOnChangesFeature")
    }

    /* Dependency injection */
    pub fn inject_template_ref() -> ExternalReference {
        Self::make_ref("ɵinjectTemplateRef")
    }

    pub fn inject_view_container_ref() -> ExternalReference {
        Self::make_ref("ɵinjectViewContainerRef")
    }

    pub fn inject_element_ref() -> ExternalReference {
        Self::make_ref("ɵinjectElementRef")
    }

    pub fn directive_inject() -> ExternalReference {
        Self::make_ref("ɵdirectiveInject")
    }
}
