mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mcp-bridge")]
#[command(about = "Loopback JSON-RPC bridge for driving an interactive editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bridge and accept loopback connections
    Serve {
        /// Path to the persisted settings file
        #[arg(short, long, default_value = "mcp-bridge.yaml")]
        settings: String,

        /// Port to bind; falls back to the persisted or default port
        #[arg(short, long)]
        port: Option<u32>,

        /// Project root passed to the compile tool's result-file contract
        #[arg(long, default_value = ".")]
        project_root: String,
    },

    /// List the built-in tools and their descriptors
    Tools {
        /// Include tools marked development-only
        #[arg(long)]
        include_development_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            settings,
            port,
            project_root,
        } => {
            commands::serve::execute(&settings, port, &project_root).await?;
        }
        Commands::Tools {
            include_development_only,
        } => {
            commands::tools::execute(include_development_only)?;
        }
    }

    Ok(())
}
