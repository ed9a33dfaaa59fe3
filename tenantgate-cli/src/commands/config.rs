//! Configuration validation.

use anyhow::{Context, Result};
use std::path::Path;
use tenantgate_connectors::{ConnectorCategory, ConnectorService, RuntimeConfig};
use tracing::debug;

/// Load the configuration, instantiate every selected connector and probe
/// the active storage backend.
pub async fn check_config(config_path: &Path) -> Result<()> {
    let config = RuntimeConfig::from_file(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let mut builder = ConnectorService::builder();
    builder.with_builtins();
    let service =
        ConnectorService::from_config(&config, builder).context("Failed to initialize connectors")?;

    if service.active_name(ConnectorCategory::Storage).is_some() {
        let storage = service.get_storage_connector(None)?;
        let present = storage
            .agent("tenantgate-cli")
            .exists(".tenantgate-probe")
            .await
            .context("Storage connector probe failed")?;
        debug!(present, "storage probe");
    }

    println!("Configuration OK: {}", config_path.display());
    println!("acl.hash_algorithm: {}", config.acl.hash_algorithm);
    for category in ConnectorCategory::all() {
        if let Some(name) = service.active_name(category) {
            println!("{:<16}{}", category.as_str(), name);
        }
    }
    Ok(())
}
