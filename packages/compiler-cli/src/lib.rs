#![deny(clippy::all)]

/**
 * Render3 Compiler CLI
 *
 * Reads compilation units from JSON files, compiles them in parallel and writes one
 * JavaScript module per unit, or prints the modules to stdout.
 */
pub use r3_compiler as compiler;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use r3_compiler::{compile_file, CompilationUnit, CompiledFile, CompilerConfig, Diagnostic};

/// Extension of the emitted modules.
pub const OUTPUT_EXTENSION: &str = "js";

/// Suffix of compilation unit files, replaced by [`OUTPUT_EXTENSION`].
pub const UNIT_SUFFIX: &str = ".unit.json";

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid compilation unit {path}: {source}")]
    InvalidUnit {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid compiler config {path}: {source}")]
    InvalidConfig {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("{input} would overwrite {output}, already emitted for {first}")]
    OutputCollision {
        input: PathBuf,
        output: PathBuf,
        first: PathBuf,
    },
}

/// Options of one driver run.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub config: CompilerConfig,
    /// Directory for the emitted modules. Defaults to the directory of each input.
    pub out_dir: Option<PathBuf>,
    /// Print the modules to stdout instead of writing files.
    pub stdout: bool,
}

/// A compiled input file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub compiled: CompiledFile,
}

impl FileReport {
    pub fn has_errors(&self) -> bool {
        self.compiled.has_errors()
    }
}

/// Reads a [`CompilerConfig`] file. Missing keys keep their defaults.
pub fn load_config(path: &Path) -> Result<CompilerConfig, DriverError> {
    let json = fs::read_to_string(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    CompilerConfig::from_json(&json).map_err(|source| DriverError::InvalidConfig {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_unit(path: &Path) -> Result<CompilationUnit, DriverError> {
    let json = fs::read_to_string(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    CompilationUnit::from_json(&json).map_err(|source| DriverError::InvalidUnit {
        path: path.to_path_buf(),
        source,
    })
}

/// Where the module compiled from `input` is written: `app.unit.json` becomes `app.js`,
/// any other file loses its last extension.
pub fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match file_name.strip_suffix(UNIT_SUFFIX) {
        Some(stem) => stem.to_string(),
        None => input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let stem = if stem.is_empty() { "out".to_string() } else { stem };
    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    dir.join(format!("{}.{}", stem, OUTPUT_EXTENSION))
}

/// Compiles every input in parallel. Units are independent, each gets its own constant
/// pool. Results keep the order of `inputs`.
///
/// When writing files, an input whose output path was already taken by an earlier input
/// is reported as an [`DriverError::OutputCollision`].
pub fn compile_paths(
    inputs: &[PathBuf],
    options: &CompileOptions,
) -> Vec<Result<FileReport, DriverError>> {
    info!(files = inputs.len(), "compiling units");
    let results: Vec<Result<FileReport, DriverError>> = inputs
        .par_iter()
        .map(|input| {
            let unit = load_unit(input)?;
            debug!(input = %input.display(), declarations = unit.declarations.len(), "loaded unit");
            let compiled = compile_file(&unit, &options.config);
            Ok(FileReport {
                input: input.clone(),
                output: output_path(input, options.out_dir.as_deref()),
                compiled,
            })
        })
        .collect();
    if options.stdout {
        return results;
    }

    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    results
        .into_iter()
        .map(|result| {
            let report = result?;
            if let Some(first) = claimed.get(&report.output) {
                return Err(DriverError::OutputCollision {
                    input: report.input,
                    output: report.output,
                    first: first.clone(),
                });
            }
            claimed.insert(report.output.clone(), report.input.clone());
            Ok(report)
        })
        .collect()
}

pub fn write_report(report: &FileReport) -> Result<(), DriverError> {
    if let Some(parent) = report.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| DriverError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let mut source = report.compiled.source.clone();
    if !source.is_empty() {
        source.push('\n');
    }
    fs::write(&report.output, source).map_err(|source| DriverError::Write {
        path: report.output.clone(),
        source,
    })
}

/// `app.ts:3:14: resolution error: ...`, with line and column one based.
pub fn format_diagnostic(file_name: &str, diagnostic: &Diagnostic) -> String {
    match &diagnostic.span {
        Some(span) => format!(
            "{}:{}:{}: {} error: {}",
            file_name,
            span.start.line + 1,
            span.start.col + 1,
            diagnostic.kind,
            diagnostic.message
        ),
        None => format!("{}: {} error: {}", file_name, diagnostic.kind, diagnostic.message),
    }
}

/// `// <output>` followed by the module text.
fn print_report(out: &mut impl Write, report: &FileReport) -> io::Result<()> {
    writeln!(out, "// {}", report.output.display())?;
    if !report.compiled.source.is_empty() {
        writeln!(out, "{}", report.compiled.source)?;
    }
    Ok(())
}

/// Compiles and writes (or prints) every input, printing diagnostics to stderr.
///
/// Returns `false` when an input could not be read or written, or a declaration was
/// dropped.
pub fn run(inputs: &[PathBuf], options: &CompileOptions) -> bool {
    run_with_output(inputs, options, &mut io::stdout().lock())
}

/// [`run`] with the printed modules going to `out`.
pub fn run_with_output(inputs: &[PathBuf], options: &CompileOptions, out: &mut impl Write) -> bool {
    let mut success = true;
    for result in compile_paths(inputs, options) {
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                eprintln!("error: {}", err);
                success = false;
                continue;
            }
        };
        for diagnostic in &report.compiled.diagnostics {
            eprintln!("{}", format_diagnostic(&report.compiled.file_name, diagnostic));
        }
        if report.has_errors() {
            warn!(input = %report.input.display(), "unit compiled with errors");
            success = false;
        }
        if options.stdout {
            if let Err(err) = print_report(out, &report) {
                eprintln!("error: cannot print {}: {}", report.output.display(), err);
                success = false;
            }
            continue;
        }
        if let Err(err) = write_report(&report) {
            eprintln!("error: {}", err);
            success = false;
            continue;
        }
        info!(output = %report.output.display(), "wrote module");
    }
    success
}

/// CLI version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
