//! Plenary CLI
//!
//! Browse the legislature's public polls and vote once per device.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use plenary_cli::favorites_cmd::{self, FavoritesAction};
use plenary_cli::poll_cmd::{self, PollAction};
use plenary_core::config::load_config;
use plenary_core::favorites::Favorites;
use plenary_core::poll::PollClientConfig;
use plenary_core::store::{FileStore, KeyValueStore, MemoryStore};
use plenary_core::tracing_init::init_tracing;
use plenary_core::{DeviceIdentity, PollClient};

#[derive(Parser, Debug)]
#[command(name = "plenary")]
#[command(version, about = "Public poll client for the municipal legislature", long_about = None)]
struct Cli {
    /// Legislature API base URL
    #[arg(long, env = "PLENARY_API_URL", global = true)]
    api_url: Option<String>,

    /// Directory for the device identity and favorites
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Browse and vote on public polls.
    Polls {
        #[command(subcommand)]
        action: PollAction,
    },
    /// Print this installation's device identity.
    Device,
    /// Manage favorite news items and bills.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }
    if cli.log_json {
        config.logging.json = true;
    }

    init_tracing(&config.log_filter(), config.logging.json);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting plenary CLI");

    let store: Arc<dyn KeyValueStore> = if let Some(dir) = config.data_dir() {
        Arc::new(FileStore::in_dir(&dir))
    } else {
        warn!("No data directory available, local state will not persist");
        Arc::new(MemoryStore::new())
    };

    let mut out = io::stdout();
    match cli.command {
        Commands::Polls { action } => {
            let client = PollClient::new(&PollClientConfig::from(&config.api))?;
            let device = DeviceIdentity::new(store);
            poll_cmd::run(&client, &device, action, &mut out).await?;
        }
        Commands::Device => {
            writeln!(out, "{}", DeviceIdentity::new(store).device_id())?;
        }
        Commands::Favorites { action } => {
            favorites_cmd::run(&Favorites::new(store), action, &mut out)?;
        }
    }

    Ok(())
}
