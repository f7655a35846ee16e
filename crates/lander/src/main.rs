//! Lander CLI - landing page editor with live preview and static publishing.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use config::ConfigFile;

#[derive(Parser)]
#[command(name = "lander")]
#[command(about = "Landing page editor with live preview and static publishing")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to lander.toml config file
    #[arg(short, long, default_value = config::CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create lander.toml and a default landing page document
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Start the editor with live preview
    Dev {
        /// Port to listen on (defaults to config or 7777)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,

        /// Landing page document to import on start
        #[arg(short, long)]
        landing: Option<PathBuf>,

        /// Re-import the landing page document when it changes
        #[arg(short, long, requires = "landing")]
        watch: bool,
    },

    /// Turn the site build into a relocatable bundle with a manifest
    Transform {
        /// Site build directory (defaults to config or "out")
        #[arg(short, long)]
        build: Option<PathBuf>,

        /// Bundle directory (defaults to config or "dist-offline/site")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Package the bundle and a landing page document into an archive
    Package {
        /// Bundle directory (defaults to config)
        #[arg(short, long, conflicts_with = "url")]
        bundle: Option<PathBuf>,

        /// Fetch the bundle from a running server instead
        #[arg(long)]
        url: Option<String>,

        /// Landing page document (defaults to config, then saved state)
        #[arg(short, long)]
        landing: Option<PathBuf>,

        /// Where to write the archive
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the bundle statically, as a host would after publishing
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve (defaults to the bundle directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Dev {
            port,
            no_open,
            landing,
            watch,
        } => {
            let file_config = ConfigFile::load(&cli.config)?;
            commands::dev::run(&file_config, port, !no_open, landing, watch).await?;
        }
        Commands::Transform { build, output } => {
            let file_config = ConfigFile::load(&cli.config)?;
            commands::transform::run(&file_config, build, output).await?;
        }
        Commands::Package {
            bundle,
            url,
            landing,
            output,
        } => {
            let file_config = ConfigFile::load(&cli.config)?;
            commands::package::run(&file_config, bundle, url, landing, output).await?;
        }
        Commands::Serve { port, dir, no_open } => {
            let file_config = ConfigFile::load(&cli.config)?;
            commands::serve::run(&file_config, port, dir, !no_open).await?;
        }
    }

    Ok(())
}
