/**
 * Render3 Compiler CLI - r3c
 *
 * Compiles unit files (`*.unit.json`) into render3 JavaScript modules.
 */
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

use r3_compiler_cli::{load_config, run, version, CompileOptions};

/// Environment variable holding a tracing filter; overrides `--log-level`.
const LOG_ENV: &str = "R3C_LOG";

fn command() -> Command {
    Command::new("r3c")
        .version(version())
        .about("Render3 template compiler")
        .arg(
            Arg::new("files")
                .value_name("UNIT")
                .help("Compilation unit JSON files")
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Compiler config JSON file"),
        )
        .arg(
            Arg::new("out-dir")
                .short('o')
                .long("out-dir")
                .value_name("DIR")
                .help("Directory for the emitted modules"),
        )
        .arg(
            Arg::new("stdout")
                .long("stdout")
                .action(ArgAction::SetTrue)
                .conflicts_with("out-dir")
                .help("Print the emitted modules instead of writing them"),
        )
        .arg(
            Arg::new("core-alias")
                .long("core-alias")
                .value_name("NAME")
                .help("Identifier the runtime module is bound to"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("Treat expression syntax errors as fatal"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("warn")
                .help("trace, debug, info, warn or error"),
        )
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn options(matches: &clap::ArgMatches) -> anyhow::Result<CompileOptions> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => load_config(Path::new(path)).context("loading --config")?,
        None => Default::default(),
    };
    if let Some(alias) = matches.get_one::<String>("core-alias") {
        config.core_alias = alias.clone();
    }
    if matches.get_flag("strict") {
        config.strict = true;
    }
    Ok(CompileOptions {
        config,
        out_dir: matches.get_one::<String>("out-dir").map(PathBuf::from),
        stdout: matches.get_flag("stdout"),
    })
}

fn main() {
    let matches = command().get_matches();
    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("warn");
    init_logging(level);

    let options = match options(&matches) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {:#}", err);
            process::exit(2);
        }
    };
    let files: Vec<PathBuf> = matches
        .get_many::<String>("files")
        .into_iter()
        .flatten()
        .map(PathBuf::from)
        .collect();

    if !run(&files, &options) {
        process::exit(1);
    }
}
