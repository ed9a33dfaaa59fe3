//! Connector registry
//!
//! Connectors are registered per category under a name, together with a
//! factory. [`ConnectorServiceBuilder::init`] picks the active connector of a
//! category; [`ConnectorServiceBuilder::build`] freezes the table. The
//! resulting [`ConnectorService`] is read-only and meant to be shared behind
//! an `Arc`.
//!
//! ```
//! use tenantgate_connectors::{
//!     ConnectorCategory, ConnectorService, ConnectorSettings, SecureConnector,
//! };
//!
//! let mut builder = ConnectorService::builder();
//! builder
//!     .with_builtins()
//!     .init(ConnectorCategory::Cache, "RAM", ConnectorSettings::default())
//!     .unwrap();
//! let service = builder.build();
//!
//! let cache = service.get_cache_connector(None).unwrap();
//! assert_eq!(cache.name(), "RAM");
//! ```

use crate::account::AccountConnector;
use crate::builtin;
use crate::cache::CacheConnector;
use crate::category::ConnectorCategory;
use crate::config::{AclConfig, RuntimeConfig};
use crate::error::{ConnectorError, Result};
use crate::log::LogConnector;
use crate::settings::ConnectorSettings;
use crate::storage::StorageConnector;
use once_cell::sync::OnceCell;
use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

/// What a factory gets to build a connector from
pub struct ConnectorContext<'a> {
    /// Name the connector was registered under
    pub name: &'a str,
    pub settings: &'a ConnectorSettings,
    pub acl: &'a AclConfig,
}

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn(&ConnectorContext<'_>) -> Result<Instance> + Send + Sync>;

struct Registration {
    /// Interface the factory produces, for error messages
    interface: &'static str,
    factory: Factory,
    instance: OnceCell<Instance>,
}

impl Registration {
    fn instantiate(
        &self,
        name: &str,
        settings: &ConnectorSettings,
        acl: &AclConfig,
    ) -> Result<&Instance> {
        self.instance.get_or_try_init(|| {
            (self.factory)(&ConnectorContext {
                name,
                settings,
                acl,
            })
        })
    }
}

type Key = (ConnectorCategory, String);

#[derive(Default)]
pub struct ConnectorServiceBuilder {
    registrations: HashMap<Key, Registration>,
    active: BTreeMap<ConnectorCategory, String>,
    acl: AclConfig,
}

impl ConnectorServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory producing `Arc<C>`.
    ///
    /// `C` is normally a connector trait object such as
    /// `dyn StorageConnector`; lookups must ask for the same type.
    /// Registering the same category and name again replaces the factory,
    /// unless the existing one was already instantiated by `init`, in which
    /// case the new factory is ignored.
    pub fn register<C, F>(
        &mut self,
        category: ConnectorCategory,
        name: impl Into<String>,
        factory: F,
    ) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&ConnectorContext<'_>) -> Result<Arc<C>> + Send + Sync + 'static,
    {
        let name = name.into();
        let key = (category, name);
        if let Some(existing) = self.registrations.get(&key) {
            if existing.instance.get().is_some() {
                warn!(
                    %category,
                    name = %key.1,
                    "connector already initialized, registration ignored"
                );
                return self;
            }
            warn!(%category, name = %key.1, "connector registration replaced");
        }
        let registration = Registration {
            interface: type_name::<C>(),
            factory: Box::new(move |ctx: &ConnectorContext<'_>| -> Result<Instance> {
                let instance: Instance = Arc::new(factory(ctx)?);
                Ok(instance)
            }),
            instance: OnceCell::new(),
        };
        self.registrations.insert(key, registration);
        self
    }

    /// ACL policy handed to connectors. Set it before calling `init`.
    pub fn acl(&mut self, acl: AclConfig) -> &mut Self {
        self.acl = acl;
        self
    }

    pub fn acl_config(&self) -> &AclConfig {
        &self.acl
    }

    /// Instantiate `name` as the active connector of `category`.
    ///
    /// `name` must be registered. Only the first call per category takes
    /// effect; later calls keep the existing instance.
    pub fn init(
        &mut self,
        category: ConnectorCategory,
        name: &str,
        settings: ConnectorSettings,
    ) -> Result<&mut Self> {
        let registration = self
            .registrations
            .get(&(category, name.to_string()))
            .ok_or_else(|| ConnectorError::ConnectorNotRegistered {
                category,
                name: name.to_string(),
            })?;

        if let Some(active) = self.active.get(&category) {
            if active != name {
                warn!(
                    %category,
                    active = %active,
                    requested = name,
                    "category already initialized, keeping the active connector"
                );
            }
            return Ok(self);
        }

        registration.instantiate(name, &settings, &self.acl)?;
        self.active.insert(category, name.to_string());
        info!(%category, name, "connector initialized");
        Ok(self)
    }

    /// Register the reference connectors shipped with this crate.
    pub fn with_builtins(&mut self) -> &mut Self {
        builtin::register_builtins(self);
        self
    }

    pub fn build(self) -> ConnectorService {
        info!(
            registered = self.registrations.len(),
            active = self.active.len(),
            "connector service ready"
        );
        ConnectorService {
            registrations: self.registrations,
            active: self.active,
            acl: self.acl,
        }
    }
}

/// Frozen connector registry
pub struct ConnectorService {
    registrations: HashMap<Key, Registration>,
    active: BTreeMap<ConnectorCategory, String>,
    acl: AclConfig,
}

impl ConnectorService {
    pub fn builder() -> ConnectorServiceBuilder {
        ConnectorServiceBuilder::new()
    }

    /// Build a service with the builder's registrations and the connectors
    /// selected in `config`.
    pub fn from_config(
        config: &RuntimeConfig,
        mut builder: ConnectorServiceBuilder,
    ) -> Result<Self> {
        builder.acl(config.acl.clone());
        for (category, selection) in &config.connectors {
            builder.init(*category, &selection.name, selection.settings.clone())?;
        }
        Ok(builder.build())
    }

    /// Look up a connector of `category` as `Arc<C>`.
    ///
    /// Without a name the active connector is returned. A named connector
    /// that was registered but never initialized is created on first use
    /// with empty settings.
    pub fn get<C>(&self, category: ConnectorCategory, name: Option<&str>) -> Result<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let name = match name {
            Some(name) => name,
            None => self
                .active_name(category)
                .ok_or(ConnectorError::NoActiveConnector(category))?,
        };
        let registration = self
            .registrations
            .get(&(category, name.to_string()))
            .ok_or_else(|| ConnectorError::ConnectorNotRegistered {
                category,
                name: name.to_string(),
            })?;

        let instance = registration.instantiate(name, &ConnectorSettings::default(), &self.acl)?;
        (**instance)
            .downcast_ref::<Arc<C>>()
            .cloned()
            .ok_or_else(|| ConnectorError::ConnectorTypeMismatch {
                category,
                name: format!("{} ({})", name, registration.interface),
                expected: type_name::<C>(),
            })
    }

    pub fn get_storage_connector(&self, name: Option<&str>) -> Result<Arc<dyn StorageConnector>> {
        self.get(ConnectorCategory::Storage, name)
    }

    pub fn get_cache_connector(&self, name: Option<&str>) -> Result<Arc<dyn CacheConnector>> {
        self.get(ConnectorCategory::Cache, name)
    }

    pub fn get_log_connector(&self, name: Option<&str>) -> Result<Arc<dyn LogConnector>> {
        self.get(ConnectorCategory::Log, name)
    }

    pub fn get_account_connector(&self, name: Option<&str>) -> Result<Arc<dyn AccountConnector>> {
        self.get(ConnectorCategory::Account, name)
    }

    pub fn active_name(&self, category: ConnectorCategory) -> Option<&str> {
        self.active.get(&category).map(String::as_str)
    }

    /// Every registered `(category, name)`, sorted
    pub fn registered(&self) -> Vec<(ConnectorCategory, &str)> {
        let mut all: Vec<_> = self
            .registrations
            .keys()
            .map(|(category, name)| (*category, name.as_str()))
            .collect();
        all.sort();
        all
    }

    pub fn acl_config(&self) -> &AclConfig {
        &self.acl
    }
}
