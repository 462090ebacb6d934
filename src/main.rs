//! drive_index CLI - Browse a Google Drive folder tree by path.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use drive_index::{DriveConfig, DriveIndex, Entry};

/// CLI tool for browsing a Google Drive folder tree by path.
#[derive(Parser)]
#[command(name = "drive_index")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file (client id, secret, refresh token).
    #[arg(long, env = "DRIVE_INDEX_CONFIG", default_value = "drive_index.json")]
    config: PathBuf,

    /// Root folder URL or ID, overriding the configuration file.
    #[arg(long, env = "DRIVE_INDEX_ROOT")]
    root: Option<String>,

    /// Enable debug logging.
    #[arg(long, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the children of a folder.
    Ls {
        /// Path relative to the root folder.
        #[arg(default_value = "")]
        path: String,
    },

    /// Print the metadata of a path as JSON.
    Stat {
        /// Path relative to the root folder.
        #[arg(default_value = "")]
        path: String,
    },

    /// Write the content of a file to stdout.
    Cat {
        /// Path relative to the root folder.
        path: String,

        /// HTTP byte range, e.g. `bytes=0-1023`.
        #[arg(long)]
        range: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "drive_index=debug"
    } else {
        "drive_index=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = DriveConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;
    if let Some(root) = cli.root {
        config.root = root;
    }

    let index = DriveIndex::from_config(&config).context("Invalid configuration")?;
    index.authorize().await.context("Failed to authorize")?;

    match cli.command {
        Commands::Ls { path } => {
            let entry = index
                .index(&path)
                .await
                .with_context(|| format!("Failed to resolve: /{}", path))?;

            match entry {
                Entry::Folder(folder) => {
                    let children = folder
                        .list()
                        .await
                        .with_context(|| format!("Failed to list folder: /{}", path))?;

                    if children.is_empty() {
                        println!("No files found.");
                    } else {
                        println!("{:<44} {:>10} {:<30} {}", "ID", "SIZE", "TYPE", "NAME");
                        println!("{}", "-".repeat(100));
                        for child in children {
                            println!("{}", child.object);
                        }
                    }
                }
                Entry::File(file) => println!("{}", file.node.object),
            }
        }

        Commands::Stat { path } => {
            let entry = index
                .index(&path)
                .await
                .with_context(|| format!("Failed to resolve: /{}", path))?;
            println!("{}", serde_json::to_string_pretty(entry.node())?);
        }

        Commands::Cat { path, range } => {
            let entry = index
                .index(&path)
                .await
                .with_context(|| format!("Failed to resolve: /{}", path))?;

            let Entry::File(file) = entry else {
                anyhow::bail!("Not a file: /{}", path);
            };

            let content = file
                .raw(range.as_deref())
                .await
                .with_context(|| format!("Failed to read: /{}", path))?;

            let mut reader = Box::pin(content.into_async_read());
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut reader, &mut stdout).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
