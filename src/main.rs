//! linkspam CLI entry point

use clap::{Parser, Subcommand};
use linkspam::{
    commands::{cmd_run, cmd_show, cmd_status, print_report, print_status, RunOptions},
    config::Config,
    error::Result,
    progress::LogWriterFactory,
    store::ReportStore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code for `show` when the target has never been run
const EXIT_NO_RESULT: u8 = 2;

#[derive(Parser)]
#[command(name = "linkspam")]
#[command(version, about = "Global link usage reports for a wiki farm", long_about = None)]
#[command(args_conflicts_with_subcommands = true, arg_required_else_help = true)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "LINKSPAM_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Domain to report on, e.g. example.com (use `run` for domains that
    /// collide with a subcommand name)
    target: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Commands {
    /// Run a report for a target
    Run {
        /// Target domain
        target: String,
    },

    /// Show the lifecycle of configured targets
    Status {
        /// Only this target
        target: Option<String>,
    },

    /// Show the stored report for a target
    Show {
        /// Target domain
        target: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory))
        .with(filter)
        .init();

    let config = load_config(cli.config.as_deref())?;
    debug!("Using config {}", config.paths.config_file.display());
    let store = ReportStore::from_config(&config);

    match (cli.command, cli.target) {
        (Some(Commands::Status { target }), _) => {
            let rows = cmd_status(&store, target.as_deref())?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_status(&rows);
            }
        }

        (Some(Commands::Show { target }), _) => match cmd_show(&store, &target)? {
            Some(output) => {
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    print_report(&output);
                }
            }
            None => {
                eprintln!("No result for {}", target);
                return Ok(ExitCode::from(EXIT_NO_RESULT));
            }
        },

        (Some(Commands::Run { target }), _) | (None, Some(target)) => {
            let output = cmd_run(&config, &target, RunOptions::default()).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output.summary_table)?);
            } else {
                print_report(&output);
            }
        }

        // arg_required_else_help prints usage before we get here
        (None, None) => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_config_path);

    Config::load(&config_path)
}
