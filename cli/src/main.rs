//! pgroup CLI binary
//!
//! Runs a command tree in its own process group and tears the whole tree
//! down on Ctrl-C or after a deadline.

use clap::{Parser, Subcommand};
use cli::{resolve_spec, run_group, RunEnd, RunOptions};
use pgroup_core::process::ProcessCommand;
use schema::GroupSpec;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "pgroup")]
#[command(about = "Run a command tree in its own process group")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command until it exits, Ctrl-C is pressed, or the deadline passes
    Run {
        /// Seconds to wait after SIGTERM before sending SIGKILL
        #[arg(long)]
        patience: Option<u64>,
        /// Terminate the group after this many seconds
        #[arg(long)]
        deadline: Option<u64>,
        /// Path to a TOML file with group definitions
        #[arg(long, value_name = "FILE", requires = "id", conflicts_with = "command")]
        config: Option<PathBuf>,
        /// Group to run from --config
        #[arg(long)]
        id: Option<String>,
        /// Program and arguments
        #[arg(
            required_unless_present = "config",
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "COMMAND"
        )]
        command: Vec<String>,
    },
    /// Print the JSON schema of a group definition
    Schema,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = pgroup_core::utils::init_tracing(&cli.log_level) {
        eprintln!("{}", e);
    }

    let result = match cli.command {
        Commands::Run {
            patience,
            deadline,
            config,
            id,
            command,
        } => run(patience, deadline, config, id, command).await,
        Commands::Schema => print_schema(),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Command failed [{}]: {}", e.code(), e);
            std::process::exit(1);
        }
    }
}

async fn run(
    patience: Option<u64>,
    deadline: Option<u64>,
    config: Option<PathBuf>,
    id: Option<String>,
    command: Vec<String>,
) -> cli::Result<i32> {
    let spec = resolve_spec(config.as_deref(), id.as_deref(), &command, patience)?;
    let mut process = ProcessCommand::from(&spec);
    let options = RunOptions {
        patience: spec.patience(),
        deadline: deadline.map(Duration::from_secs),
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let end = run_group(&mut process, options, shutdown).await?;
    match &end {
        RunEnd::Exited(exit) => info!("Group '{}' finished: {}", spec.id, exit),
        RunEnd::Interrupted(exit) => info!("Group '{}' interrupted: {}", spec.id, exit),
        RunEnd::DeadlineReached(exit) => info!("Group '{}' hit its deadline: {}", spec.id, exit),
    }
    Ok(end.exit().shell_code())
}

fn print_schema() -> cli::Result<i32> {
    let schema = schemars::schema_for!(GroupSpec);
    let json = serde_json::to_string_pretty(&schema).map_err(pgroup_core::CoreError::from)?;
    println!("{}", json);
    Ok(0)
}
