//! Agentry CLI, the main entry point.
//!
//! Commands:
//! - `kinds`     List registered agent kinds
//! - `describe`  Show what a kind needs to be constructed
//! - `run`       Build an agent and answer one input, or chat interactively
//! - `config`    Print or validate the configuration

use clap::{Parser, Subcommand};

mod commands;
mod options;

#[derive(Parser)]
#[command(
    name = "agentry",
    about = "Agentry: build tool-using agents from a registered kind",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered agent kinds
    Kinds,

    /// Show the options an agent kind requires
    Describe {
        /// Agent kind, e.g. CSVAgent
        kind: String,
    },

    /// Build an agent and run it
    Run {
        /// A named agent from the config file, or a registered kind
        agent: String,

        /// Answer a single input instead of entering interactive mode
        #[arg(short, long)]
        input: Option<String>,

        /// Construction option as key=value; may be repeated
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,

        /// Print the intermediate steps as JSON
        #[arg(long)]
        steps: bool,

        /// Stream run events to stderr as JSON lines
        #[arg(long)]
        events: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print a default config file
    Init,
    /// Load and validate the current config
    Validate,
    /// Print the effective config (secrets redacted)
    Show,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Kinds => commands::kinds::list(),
        Commands::Describe { kind } => commands::kinds::describe(&kind)?,
        Commands::Run {
            agent,
            input,
            options,
            steps,
            events,
        } => {
            let request = commands::run::RunRequest {
                agent,
                input,
                options,
                show_steps: steps,
                stream_events: events,
            };
            commands::run::run(request).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Init => commands::config_cmd::init(),
            ConfigAction::Validate => commands::config_cmd::validate()?,
            ConfigAction::Show => commands::config_cmd::show()?,
        },
    }

    Ok(())
}
