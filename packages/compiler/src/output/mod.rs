//! Output Module
//!
//! Output AST and the JavaScript printer.

pub mod abstract_emitter;
pub mod abstract_js_emitter;
pub mod output_ast;
