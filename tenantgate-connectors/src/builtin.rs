//! Reference connectors shipped with the crate

use crate::account::{AccountConnector, StaticAccount};
use crate::cache::{CacheConnector, RamCache};
use crate::category::ConnectorCategory;
use crate::log::{ConsoleLog, LogConnector};
use crate::service::ConnectorServiceBuilder;
use crate::storage::{LocalStorage, StorageConnector};
use std::sync::Arc;

pub const LOCAL_STORAGE: &str = "LocalStorage";
pub const RAM_CACHE: &str = "RAM";
pub const CONSOLE_LOG: &str = "Console";
pub const STATIC_ACCOUNT: &str = "Static";

pub fn register_builtins(builder: &mut ConnectorServiceBuilder) {
    builder
        .register::<dyn StorageConnector, _>(ConnectorCategory::Storage, LOCAL_STORAGE, |ctx| {
            let storage: Arc<dyn StorageConnector> = Arc::new(LocalStorage::from_context(ctx)?);
            Ok(storage)
        })
        .register::<dyn CacheConnector, _>(ConnectorCategory::Cache, RAM_CACHE, |ctx| {
            let cache: Arc<dyn CacheConnector> = Arc::new(RamCache::from_context(ctx)?);
            Ok(cache)
        })
        .register::<dyn LogConnector, _>(ConnectorCategory::Log, CONSOLE_LOG, |ctx| {
            let log: Arc<dyn LogConnector> = Arc::new(ConsoleLog::from_context(ctx)?);
            Ok(log)
        })
        .register::<dyn AccountConnector, _>(ConnectorCategory::Account, STATIC_ACCOUNT, |ctx| {
            let account: Arc<dyn AccountConnector> = Arc::new(StaticAccount::from_context(ctx)?);
            Ok(account)
        });
}
