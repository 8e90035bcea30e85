//! # stage-cli
//!
//! Command-line client and key tool for stagebox.
//!
//! ## Commands
//!
//! - `genkeys`: Generate a shared key or a signing key pair
//! - `secretbox`: Seal or open a message with a hex key
//! - `copy`: Stage a message or file on the relay
//! - `move`: Take an entry off the relay
//! - `paste`: Read an entry, leaving it staged
//! - `list`: Show staged entry ids
//!
//! ## Example
//!
//! ```bash
//! # Generate keys for relay.toml and ~/.stagebox.toml
//! stage-cli genkeys --shared-key
//! stage-cli genkeys --keypair
//!
//! # Stage and fetch
//! stage-cli copy "Hello, stagebox!"
//! stage-cli paste
//! echo "from a pipe" | stage-cli copy
//! stage-cli move --id 0192a1b2c3d4e5f60718293a4b5c6d7e
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stage_client::{ClientConfig, StageClient};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{entries, keys, secretbox};

/// Command-line client and key tool for stagebox.
#[derive(Parser, Debug)]
#[command(name = "stage-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Client configuration file (default: ~/.stagebox.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate key material
    Genkeys {
        /// Generate a shared key
        #[arg(long, conflicts_with = "keypair")]
        shared_key: bool,

        /// Generate a signing key pair
        #[arg(long, conflicts_with = "shared_key")]
        keypair: bool,
    },

    /// Seal or open a message with a hex-encoded shared key
    Secretbox {
        /// Hex-encoded 32-byte key
        #[arg(long)]
        key: String,

        /// Message to seal
        #[arg(long, conflicts_with = "open")]
        seal: Option<String>,

        /// Hex-encoded sealed box to open
        #[arg(long, conflicts_with = "seal")]
        open: Option<String>,
    },

    /// Stage a message or file on the relay
    Copy {
        /// Message to stage (or use --file, or pipe data on stdin)
        message: Option<String>,

        /// File to stage
        #[arg(long, short, conflicts_with = "message")]
        file: Option<PathBuf>,
    },

    /// Take an entry off the relay
    Move {
        /// Entry id (default: oldest)
        #[arg(long)]
        id: Option<String>,
    },

    /// Read an entry, leaving it staged
    Paste {
        /// Entry id (default: oldest)
        #[arg(long)]
        id: Option<String>,
    },

    /// Show staged entry ids
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Genkeys {
            shared_key,
            keypair,
        } => {
            if shared_key {
                keys::shared_key(&mut out)?;
            } else if keypair {
                keys::keypair(&mut out)?;
            } else {
                anyhow::bail!("Must specify either --shared-key or --keypair");
            }
        }
        Commands::Secretbox { key, seal, open } => {
            if let Some(message) = seal {
                secretbox::seal(&mut out, &key, message.as_bytes())?;
            } else if let Some(sealed) = open {
                secretbox::open(&mut out, &key, &sealed)?;
            } else {
                anyhow::bail!("Must specify either --seal or --open");
            }
        }
        Commands::Copy { message, file } => {
            let data = if let Some(msg) = message {
                msg.into_bytes()
            } else if let Some(path) = file {
                tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?
            } else if !std::io::stdin().is_terminal() {
                entries::read_input(&mut std::io::stdin().lock())?
            } else {
                anyhow::bail!("Must specify message, --file, or pipe data on stdin");
            };
            let client = load_client(cli.config)?;
            entries::copy(&mut out, &client, &data).await?;
        }
        Commands::Move { id } => {
            let client = load_client(cli.config)?;
            entries::move_entry(&mut out, &client, id.as_deref()).await?;
        }
        Commands::Paste { id } => {
            let client = load_client(cli.config)?;
            entries::paste(&mut out, &client, id.as_deref()).await?;
        }
        Commands::List => {
            let client = load_client(cli.config)?;
            entries::list(&mut out, &client).await?;
        }
    }

    out.flush()?;
    Ok(())
}

fn load_client(path: Option<PathBuf>) -> Result<StageClient> {
    let path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = ClientConfig::from_file(&path)?;
    StageClient::from_config(&config).context("Invalid client configuration")
}

/// Get the default client configuration path (~/.stagebox.toml).
fn default_config_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().context("Could not determine home directory")?;
    Ok(dirs.home_dir().join(".stagebox.toml"))
}
