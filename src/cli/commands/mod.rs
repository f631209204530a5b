//! CLI parser and dispatch to command modules.

mod config_cmd;
mod fetch;
mod inspect;
mod listen;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use clipfetch::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "clipfetch")]
#[command(about = "Resolve video share links and download the video")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "CLIPFETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one share link and download the video
    Fetch {
        /// Share link (scheme optional)
        url: String,
        /// Output file (default: a fresh file in the temp directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run login-wall detection and media resolution on saved page markup
    Inspect {
        /// HTML file to inspect
        file: PathBuf,
        /// URL the page was served from after redirects
        #[arg(long, default_value = "https://www.facebook.com/")]
        final_url: String,
    },

    /// Handle chat messages read from stdin as `sender<TAB>text` lines
    Listen {
        /// Directory delivered videos are copied to (default: <temp_dir>/outbox)
        #[arg(long)]
        outbox: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (settings, config) = load_settings(options).await;

    match cli.command {
        Commands::Fetch { url, output } => fetch::cmd_fetch(&settings, &url, output).await,
        Commands::Inspect { file, final_url } => inspect::cmd_inspect(&file, &final_url).await,
        Commands::Listen { outbox } => listen::cmd_listen(&settings, outbox).await,
        Commands::Config => config_cmd::cmd_config_show(&settings, &config),
    }
}
