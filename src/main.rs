use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use macrodash::cli::dashboard::OutputFormat;
use macrodash::core::AssetGroup;
use macrodash::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display trailing changes for configured instruments
    Dashboard {
        /// Only show instruments from this group
        #[arg(short, long, value_enum)]
        group: Option<AssetGroup>,

        /// Print the dashboard payload as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => macrodash::cli::setup::setup_at_path(path),
            None => macrodash::cli::setup::setup(),
        },
        Some(Commands::Dashboard { group, json }) => {
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Table
            };
            macrodash::run_command(
                macrodash::AppCommand::Dashboard { group, format },
                cli.config_path.as_deref(),
            )
            .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
