//! Render3 Module
//!
//! Template nodes, runtime identifiers and the definition compilers of the render3
//! instruction set.

pub mod r3_ast;
pub mod r3_factory;
pub mod r3_identifiers;
pub mod r3_pipe_compiler;
pub mod util;
pub mod view;

// Re-exports
pub use r3_factory::{compile_factory_function, R3DependencyMetadata};
pub use r3_identifiers::Identifiers;
pub use r3_pipe_compiler::compile_pipe_from_metadata;
pub use util::R3CompiledExpression;
