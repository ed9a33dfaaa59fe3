//! Key/value cache connectors

pub mod ram;

pub use ram::{RamCache, RamCacheSettings};

use crate::error::Result;
use crate::secure::{Requester, SecureConnector};
use async_trait::async_trait;
use std::time::Duration;
use tenantgate_acl::{Acl, Granted};
use tenantgate_types::{AccessCandidate, AccessLevel};

#[async_trait]
pub trait CacheConnector: SecureConnector {
    async fn get(&self, grant: &Granted) -> Result<Option<String>>;

    /// Store `value`, expiring after `ttl` or the connector default.
    async fn set(&self, grant: &Granted, value: String, ttl: Option<Duration>) -> Result<()>;

    async fn delete(&self, grant: &Granted) -> Result<()>;

    async fn exists(&self, grant: &Granted) -> Result<bool>;

    /// Time left before the key expires; `None` for keys that never expire.
    async fn get_ttl(&self, grant: &Granted) -> Result<Option<Duration>>;

    async fn update_ttl(&self, grant: &Granted, ttl: Duration) -> Result<()>;

    async fn set_acl(&self, grant: &Granted, acl: Acl) -> Result<()>;
}

impl dyn CacheConnector {
    pub fn requester(&self, candidate: AccessCandidate) -> Requester<'_, dyn CacheConnector> {
        Requester::new(self, candidate)
    }

    pub fn user(&self, id: impl Into<String>) -> Requester<'_, dyn CacheConnector> {
        self.requester(AccessCandidate::user(id))
    }

    pub fn team(&self, id: impl Into<String>) -> Requester<'_, dyn CacheConnector> {
        self.requester(AccessCandidate::team(id))
    }

    pub fn agent(&self, id: impl Into<String>) -> Requester<'_, dyn CacheConnector> {
        self.requester(AccessCandidate::agent(id))
    }
}

impl Requester<'_, dyn CacheConnector> {
    async fn grant(&self, key: &str, level: AccessLevel) -> Result<Granted> {
        let request = self.request_for(key, &[level])?;
        self.connector.enforce(&request).await
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let grant = self.grant(key, AccessLevel::Read).await?;
        self.connector.get(&grant).await
    }

    pub async fn set(
        &self,
        key: &str,
        value: impl Into<String>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let grant = self.grant(key, AccessLevel::Write).await?;
        self.connector.set(&grant, value.into(), ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let grant = self.grant(key, AccessLevel::Write).await?;
        self.connector.delete(&grant).await
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let grant = self.grant(key, AccessLevel::Read).await?;
        self.connector.exists(&grant).await
    }

    pub async fn get_ttl(&self, key: &str) -> Result<Option<Duration>> {
        let grant = self.grant(key, AccessLevel::Read).await?;
        self.connector.get_ttl(&grant).await
    }

    pub async fn update_ttl(&self, key: &str, ttl: Duration) -> Result<()> {
        let grant = self.grant(key, AccessLevel::Write).await?;
        self.connector.update_ttl(&grant, ttl).await
    }

    pub async fn get_acl(&self, key: &str) -> Result<Acl> {
        let grant = self.grant(key, AccessLevel::Read).await?;
        Ok(grant.into_acl())
    }

    pub async fn set_acl(&self, key: &str, acl: Acl) -> Result<()> {
        let grant = self.grant(key, AccessLevel::Owner).await?;
        self.connector.set_acl(&grant, acl).await
    }
}
