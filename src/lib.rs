//! Cloud Storage - Fixture Sync Client
//!
//! TigerStyle: A thin client over the `gsutil` command-line tool for keeping
//! large binary test fixtures out of the source tree.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               CloudStorage                   │
//! │  list · exists · delete · get · insert       │
//! │  get_if_changed · get_hash                   │
//! ├─────────────────────────────────────────────┤
//! │  CommandRunner        │ stderr → StorageError│
//! │  ExecutableResolver   │ vendored → bare → dl │
//! │  CommandExecutor      │ System / Sim         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::path::PathBuf;
//! use cloud_storage::{CloudStorage, StorageConfig};
//! use cloud_storage::sim::SimExecutor;
//!
//! let dir = std::env::temp_dir();
//! # let dir = dir.join(format!("cloud-storage-doc-{}", std::process::id()));
//! # std::fs::create_dir_all(&dir).unwrap();
//! std::fs::write(dir.join("gsutil"), b"").unwrap();
//!
//! let config = StorageConfig {
//!     search_path: Some(vec![dir.clone()]),
//!     ..StorageConfig::default()
//! };
//! let sim = SimExecutor::new().with_bucket("fixtures");
//! sim.put_object("fixtures", "a/b", b"data");
//!
//! let storage = CloudStorage::with_executor(config, sim);
//! assert_eq!(storage.list("fixtures").unwrap(), vec!["a/b".to_string()]);
//! assert!(storage.exists("fixtures", "a/b").unwrap());
//! # std::fs::remove_dir_all(&dir).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod hash;
pub mod resolver;
pub mod runner;
pub mod sim;

// Re-export common types
pub use client::CloudStorage;
pub use config::StorageConfig;
pub use constants::{INTERNAL_BUCKET, PUBLIC_BUCKET};
pub use error::{ErrorKind, StorageError, StorageResult};
pub use executor::{CommandExecutor, CommandOutput, SystemExecutor};
pub use hash::get_hash;
pub use resolver::{Bootstrap, ExecutableResolver, HttpTarballBootstrap, Resolution};
pub use runner::CommandRunner;
