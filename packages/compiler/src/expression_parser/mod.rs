//! Expression AST
//!
//! Bound expressions arrive already parsed; this module only defines their shape.

pub mod ast;

pub use ast::*;
