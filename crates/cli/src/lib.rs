#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod generate;

pub use generate::GenerateArgs;

/// Crates whose logs are shown at the configured level.
const LOG_TARGETS: [&str; 2] = ["dblog_cli", "dblog_core"];

#[derive(Parser, Debug)]
#[command(
    name = "dblog",
    version,
    about = "Generate a wrapper type that instruments all calls to a Go interface."
)]
struct Cli {
    #[command(flatten)]
    generate: GenerateArgs,
}

/// Run the command line with `args`, including the program name, and return
/// the exit code.
pub fn run_cli(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => generate::run(&cli.generate),
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

/// Install the stderr log subscriber.
pub fn init_tracing() {
    // DBLOG_LOG controls log level: "trace", "debug", "info", "warn", "error"
    // or a full tracing filter spec like "dblog_core=debug"
    let filter = match std::env::var("DBLOG_LOG") {
        Ok(level) if is_plain_level(&level) => targets_at(&level),
        Ok(spec) => spec,
        Err(_) => targets_at("info"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn targets_at(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
