#![deny(clippy::all)]

/**
 * Render3 Template Compiler
 *
 * Compiles parsed component templates into render3 template functions and
 * definition objects for components, directives and pipes.
 */

#[cfg(feature = "napi-bindings")]
use napi::bindgen_prelude::*;
#[cfg(feature = "napi-bindings")]
use napi_derive::napi;

// Core modules
pub mod config;
pub mod constant_pool;
pub mod directive_matching;
pub mod error;
pub mod parse_util;

// Input and output trees
pub mod expression_parser;
pub mod output;

// Compilation modules
pub mod render3;

// Re-exports
pub use config::CompilerConfig;
pub use error::{CompileError, Diagnostic, DiagnosticKind};
pub use render3::view::{compile_file, CompilationUnit, CompiledFile, Declaration};

/// Compiles a unit given as JSON and returns `{source, diagnostics}` as JSON.
#[cfg(feature = "napi-bindings")]
#[napi]
pub fn compile_unit_json(unit: String, config: Option<String>) -> Result<String> {
    let unit = CompilationUnit::from_json(&unit)
        .map_err(|err| Error::from_reason(format!("invalid compilation unit: {}", err)))?;
    let config = match config {
        Some(json) => CompilerConfig::from_json(&json)
            .map_err(|err| Error::from_reason(format!("invalid compiler config: {}", err)))?,
        None => CompilerConfig::default(),
    };

    let compiled = compile_file(&unit, &config);
    let diagnostics: Vec<serde_json::Value> = compiled
        .diagnostics
        .iter()
        .map(|diagnostic| {
            serde_json::json!({
                "kind": diagnostic.kind,
                "message": diagnostic.message,
                "line": diagnostic.span.as_ref().map(|span| span.start.line),
                "col": diagnostic.span.as_ref().map(|span| span.start.col),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "fileName": compiled.file_name,
        "source": compiled.source,
        "diagnostics": diagnostics,
    })
    .to_string())
}

/// Get compiler version
#[cfg(feature = "napi-bindings")]
#[napi]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
