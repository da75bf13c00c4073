mod config_cmd;
mod detect_cmd;
mod serve_cmd;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use roachwatch_config::{env::CONFIG_PATH, load_and_prepare, Settings};

#[derive(Parser)]
#[command(name = "roachwatch")]
#[command(about = "roachwatch — cockroach detection for uploaded photos")]
#[command(version)]
struct Cli {
    /// TOML settings file (defaults to $ROACHWATCH_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send an image to a running server and show the detected boxes
    Detect {
        /// Image file to analyze
        image: PathBuf,
        /// Server base URL (defaults to the configured public URL)
        #[arg(long)]
        url: Option<String>,
        /// Tag to draw
        #[arg(long, default_value = roachwatch_core::TARGET_TAG)]
        tag: String,
        /// Minimum probability (exclusive)
        #[arg(long, default_value_t = roachwatch_core::PROBABILITY_THRESHOLD)]
        threshold: f64,
        /// Write a copy of the image with the boxes drawn on it
        #[arg(long, value_name = "OUT")]
        annotate: Option<PathBuf>,
    },
    /// Query a running server's health endpoint
    Status {
        /// Server base URL (defaults to the configured public URL)
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the effective settings (secrets masked) and validation results
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var_os(CONFIG_PATH).map(PathBuf::from));
    let settings = load_and_prepare(config_path.as_deref()).await?;

    match cli.command {
        Commands::Serve { port } => {
            let settings = Settings {
                port: port.unwrap_or(settings.port),
                ..settings
            };
            logging::init_logger(&settings.log_dir, &settings.log_level);
            serve_cmd::run(settings).await?;
        }
        Commands::Detect {
            image,
            url,
            tag,
            threshold,
            annotate,
        } => {
            let base = url.unwrap_or_else(|| settings.public_url());
            let filter = roachwatch_core::OverlayFilter { tag, threshold };
            detect_cmd::run(&base, &image, &filter, annotate.as_deref()).await?;
        }
        Commands::Status { url } => {
            let base = url.unwrap_or_else(|| settings.public_url());
            status_cmd::run(&base).await?;
        }
        Commands::Config => config_cmd::run(&settings)?,
    }

    Ok(())
}
