//! Cloud Storage CLI
//!
//! Command-line interface for syncing test fixtures with cloud storage.
//!
//! # Usage
//!
//! ```bash
//! # Fetch every stale fixture named on the command line
//! cloud-storage fetch data/*.wpr
//!
//! # Upload a fixture under its content hash
//! cloud-storage put public "$(cloud-storage hash foo.wpr)" foo.wpr --public
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use cloud_storage::{CloudStorage, StorageConfig};

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Application name
pub const APP_NAME: &str = "cloud-storage";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// CLI
// =============================================================================

/// Sync binary test fixtures with cloud storage
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(about = "Sync binary test fixtures with cloud storage")]
#[command(version)]
struct Cli {
    /// JSON config file (defaults apply to missing fields)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Bucket arguments also accept `public` and `internal`.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List object keys in a bucket
    Ls {
        /// Bucket name
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        bucket: String,
    },
    /// Check whether an object exists (exit status 1 if not)
    Exists {
        /// Bucket name
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        bucket: String,
        /// Object key
        path: String,
    },
    /// Delete an object
    Rm {
        /// Bucket name
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        bucket: String,
        /// Object key
        path: String,
    },
    /// Download an object
    Get {
        /// Bucket name
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        bucket: String,
        /// Object key
        path: String,
        /// Destination file
        local: PathBuf,
    },
    /// Upload a file
    Put {
        /// Bucket name
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        bucket: String,
        /// Object key
        path: String,
        /// Source file
        local: PathBuf,
        /// Make the object world-readable
        #[arg(long)]
        public: bool,
    },
    /// Download fixtures whose .sha1 sidecar names different content
    Fetch {
        /// Fixture files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Only try this bucket
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        bucket: Option<String>,
    },
    /// Print the SHA-1 of a file
    Hash {
        /// File to hash
        file: PathBuf,
    },
}

// =============================================================================
// Main
// =============================================================================

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("{} v{}", APP_NAME, APP_VERSION);

    let mut config = match &cli.config {
        Some(path) => StorageConfig::from_file(path)?,
        None => StorageConfig::default(),
    };
    config.apply_env(|k| std::env::var(k).ok());
    config.validate()?;

    let storage = CloudStorage::new(config);
    let bucket = |name: &str| storage.config().resolve_bucket(name).to_string();

    match cli.command {
        Commands::Ls { bucket: name } => {
            for key in storage.list(&bucket(&name))? {
                println!("{key}");
            }
        }
        Commands::Exists { bucket: name, path } => {
            let found = storage.exists(&bucket(&name), &path)?;
            println!("{found}");
            if !found {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Rm { bucket: name, path } => {
            storage.delete(&bucket(&name), &path)?;
        }
        Commands::Get {
            bucket: name,
            path,
            local,
        } => {
            storage.get(&bucket(&name), &path, &local)?;
        }
        Commands::Put {
            bucket: name,
            path,
            local,
            public,
        } => {
            storage.insert(&bucket(&name), &path, &local, public)?;
        }
        Commands::Fetch {
            files,
            bucket: name,
        } => {
            let only = name.as_deref().map(bucket);
            for file in files {
                let changed = storage.get_if_changed(&file, only.as_deref())?;
                let status = if changed { "changed" } else { "unchanged" };
                println!("{}: {status}", file.display());
            }
        }
        Commands::Hash { file } => {
            println!("{}", storage.get_hash(&file)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// Tests
// =============================================================================
