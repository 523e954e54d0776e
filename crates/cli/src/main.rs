#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod cli;
mod config;
mod output;

#[derive(Parser)]
#[command(
    name = "tsgen",
    version,
    about = "Generate JSON schemas and TypeScript stubs from .d.ts interface documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code for one document
    Gen(cli::generate::GenArgs),
    /// Generate code for every .d.ts document in a folder
    GenFolder(cli::generate_folder::GenFolderArgs),
}

fn main() {
    init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(run_cli_async(std::env::args()));
    std::process::exit(code);
}

async fn run_cli_async(args: impl IntoIterator<Item = String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Gen(args)) => cli::generate::run(args).await,
            Some(Commands::GenFolder(args)) => cli::generate_folder::run(args).await,
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

fn init_tracing() {
    // TSGEN_LOG controls log level: "trace", "debug", "info", "warn", "error"
    // or a full tracing filter spec like "tsgen_core=debug,reqwest=warn"
    let filter = match std::env::var("TSGEN_LOG") {
        Ok(level) if is_plain_level(&level) => format!("tsgen={level},tsgen_core={level}"),
        Ok(spec) => spec,
        Err(_) => "tsgen=info,tsgen_core=info".to_string(),
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

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
