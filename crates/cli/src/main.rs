use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod paths;
mod state;

use paths::NodePaths;

/// berth - app catalog manager for a home-server node
#[derive(Parser)]
#[command(name = "berth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Node root directory (contains apps/, app-data/, db/)
    #[arg(long, global = true, env = "BERTH_NODE_ROOT", default_value = ".")]
    node_root: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the registries and every app's compose file
    Update,

    /// Download app manifests from the catalog mirror
    Download {
        /// Single app to download (all valid apps if omitted)
        app: Option<String>,
    },

    /// Start every installed app
    Start,

    /// Stop every installed app
    Stop,

    /// Run a compose command in an app's directory
    Compose {
        app: String,

        /// Arguments passed through to `docker compose`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Mark an app as installed
    Install { app: String },

    /// Mark an app as removed and delete its data directory
    Uninstall { app: String },

    /// Reconstruct an app.yml from an existing docker-compose.yml
    Import { app: String },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let cli = Cli::parse();
    let paths = NodePaths::new(cli.node_root.clone());

    match cli.command {
        Commands::Update => cmd::cmd_update(&paths, cli.verbose),
        Commands::Download { app } => cmd::cmd_download(&paths, app.as_deref()),
        Commands::Start => cmd::cmd_start(&paths),
        Commands::Stop => cmd::cmd_stop(&paths),
        Commands::Compose { app, args } => cmd::cmd_compose(&paths, &app, &args),
        Commands::Install { app } => cmd::cmd_install(&paths, &app),
        Commands::Uninstall { app } => cmd::cmd_uninstall(&paths, &app),
        Commands::Import { app } => cmd::cmd_import(&paths, &app),
    }
}
