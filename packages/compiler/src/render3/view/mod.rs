//! Render3 View Module
//!
//! Template functions, query and projection instructions, and the definition assembler.

pub mod api;
pub mod compiler;
pub mod expression_converter;
pub mod projection;
pub mod query_generation;
pub mod scope;
pub mod t2_binder;
pub mod template;
pub mod util;

// Re-exports
pub use api::*;
pub use compiler::{
    compile_component_from_metadata, compile_directive_from_metadata, compile_file,
    CompiledFile, R3CompiledComponent,
};
pub use t2_binder::{DirectiveRegistry, DirectiveRef, MatchedDirectives};
pub use template::{TemplateDefinitionBuilder, TemplateFunction};
