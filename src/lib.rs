//! Ledger Migrate
//!
//! Idempotent, resumable deployment of named contracts onto a ledger.
//!
//! # Design
//!
//! The orchestrator keeps a small per-network cache recording, for each
//! logical name, the operation that deployed it and the address it
//! resolved to. Rerunning a migration script is always safe: finished
//! deployments are returned straight from the cache, and deployments that
//! were submitted by a run that died before confirmation are resumed
//! rather than resubmitted.
//!
//! The ledger client, contract factories, proxy deployer, and human
//! confirmation are traits you implement; see [`traits`].
//!
//! # Usage
//!
//! ```ignore
//! use ledger_migrate::{
//!     AutoConfirm, CacheDir, DeployOptions, DeployOutcome, Orchestrator, OrchestratorConfig,
//! };
//! use serde_json::json;
//!
//! let config = OrchestratorConfig::from_env()?;
//! let orchestrator = Orchestrator::new(
//!     my_ledger,
//!     CacheDir::from_config(&config),
//!     AutoConfirm::yes(),
//!     config,
//! );
//!
//! match orchestrator
//!     .deploy("token", &token_factory, &[json!("Name"), json!("SYM")], &DeployOptions::new())
//!     .await?
//! {
//!     DeployOutcome::Deployed { address, .. } => println!("token at {address}"),
//!     DeployOutcome::Declined => println!("skipped"),
//! }
//! ```

pub mod config;
pub mod error;
pub mod options;
pub mod orchestrator;
pub mod prompt;
pub mod record;
pub mod store;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::OrchestratorConfig;
pub use error::DeployError;
pub use options::{DeployOptions, ProxyOptions};
pub use orchestrator::{DeployOutcome, Orchestrator};
pub use prompt::AutoConfirm;
#[cfg(feature = "interactive")]
pub use prompt::TerminalConfirm;
pub use record::{DeploymentRecord, RecordState};
#[cfg(feature = "file-storage")]
pub use store::{CacheDir, FileStore};
pub use store::{KeyValueStore, MemoryCacheSet, MemoryStore};
pub use traits::{CacheLocation, Confirm, Deployable, Ledger, NoProxy, ProxyDeployer};
pub use types::*;
