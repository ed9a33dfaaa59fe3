//! # tenantgate-connectors
//!
//! The connector side of tenantgate: the [`SecureConnector`] contract every
//! resource connector implements, requester facades that build access
//! requests on behalf of a candidate, the [`ConnectorService`] registry, and
//! reference connectors for storage, cache, logs and accounts.
//!
//! ```rust,no_run
//! # async fn demo() -> tenantgate_connectors::Result<()> {
//! use tenantgate_connectors::{ConnectorService, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_str(
//!     "connectors:\n  storage:\n    name: LocalStorage\n    settings:\n      root: ./data\n",
//! )
//! .expect("valid config");
//! let mut builder = ConnectorService::builder();
//! builder.with_builtins();
//! let service = ConnectorService::from_config(&config, builder)?;
//!
//! let storage = service.get_storage_connector(None)?;
//! storage.user("alice").write("notes.md", "hello").await?;
//! assert!(storage.user("bob").read("notes.md").await.is_err());
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod builtin;
pub mod cache;
pub mod category;
pub mod config;
pub mod error;
pub mod log;
pub mod resource_uri;
pub mod secure;
pub mod service;
pub mod settings;
pub mod storage;

pub use account::{AccountConnector, StaticAccount};
pub use cache::{CacheConnector, RamCache};
pub use category::ConnectorCategory;
pub use config::{AclConfig, ConfigError, ConnectorSelection, LegacyAclPolicy, RuntimeConfig};
pub use error::{ConnectorError, Result};
pub use log::{ConsoleLog, LogConnector, LogEntry};
pub use resource_uri::ResourceUri;
pub use secure::{Requester, SecureConnector};
pub use service::{ConnectorContext, ConnectorService, ConnectorServiceBuilder};
pub use settings::ConnectorSettings;
pub use storage::{LocalStorage, StorageConnector, StorageMetadata};
