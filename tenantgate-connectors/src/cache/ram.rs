//! In-process cache
//!
//! Entries carry their own ACL. Expired entries behave as if they were never
//! written, including for ACL resolution.

use super::CacheConnector;
use crate::builtin::RAM_CACHE;
use crate::config::AclConfig;
use crate::error::{ConnectorError, Result};
use crate::secure::SecureConnector;
use crate::service::ConnectorContext;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tenantgate_acl::{Acl, Granted};
use tenantgate_types::{AccessCandidate, AccessLevel};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RamCacheSettings {
    /// TTL applied when `set` is called without one; unset means no expiry
    #[serde(default)]
    pub default_ttl_secs: Option<u64>,
}

/// A cached value with the ACL guarding it
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    acl: Acl,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(now))
    }
}

/// Expiry instant for `ttl` from `now`. TTLs past the clock's range never
/// expire.
fn deadline(now: Instant, ttl: Duration) -> Option<Instant> {
    let at = now.checked_add(ttl);
    if at.is_none() {
        debug!(?ttl, "ttl out of range, entry will not expire");
    }
    at
}

pub struct RamCache {
    name: String,
    entries: DashMap<String, CacheEntry>,
    default_ttl: Option<Duration>,
    acl: AclConfig,
}

impl RamCache {
    pub fn new(acl: AclConfig) -> Self {
        Self {
            name: RAM_CACHE.to_string(),
            entries: DashMap::new(),
            default_ttl: None,
            acl,
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn from_context(ctx: &ConnectorContext<'_>) -> Result<Self> {
        let settings: RamCacheSettings = ctx.settings.parse(ctx.name)?;
        Ok(Self {
            name: ctx.name.to_string(),
            entries: DashMap::new(),
            default_ttl: settings.default_ttl_secs.map(Duration::from_secs),
            acl: ctx.acl.clone(),
        })
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "purged expired cache entries");
        }
        removed
    }

    /// Number of entries held, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live(&self, key: &str) -> Option<CacheEntry> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            drop(entry);
            self.entries.remove_if(key, |_, e| e.is_expired(now));
            return None;
        }
        Some(entry.value().clone())
    }
}

#[async_trait]
impl SecureConnector for RamCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_resource_acl(
        &self,
        resource_id: &str,
        candidate: &AccessCandidate,
    ) -> Result<Acl> {
        match self.live(resource_id) {
            Some(entry) => Ok(entry.acl),
            None => Ok(self.acl.creator_acl(candidate)?),
        }
    }
}

#[async_trait]
impl CacheConnector for RamCache {
    async fn get(&self, grant: &Granted) -> Result<Option<String>> {
        self.verify(grant, AccessLevel::Read).await?;
        Ok(self.live(grant.resource_id()).map(|e| e.value))
    }

    async fn set(&self, grant: &Granted, value: String, ttl: Option<Duration>) -> Result<()> {
        self.verify(grant, AccessLevel::Write).await?;
        let acl = match self.live(grant.resource_id()) {
            Some(existing) => existing.acl,
            None => {
                let request = grant.request();
                self.acl
                    .new_resource_acl(&request.candidate, request.resource_team_id.as_deref())?
            }
        };
        let now = Instant::now();
        let expires_at = ttl.or(self.default_ttl).and_then(|ttl| deadline(now, ttl));
        self.entries.insert(
            grant.resource_id().to_string(),
            CacheEntry {
                value,
                acl,
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, grant: &Granted) -> Result<()> {
        self.verify(grant, AccessLevel::Write).await?;
        self.entries.remove(grant.resource_id());
        Ok(())
    }

    async fn exists(&self, grant: &Granted) -> Result<bool> {
        self.verify(grant, AccessLevel::Read).await?;
        Ok(self.live(grant.resource_id()).is_some())
    }

    async fn get_ttl(&self, grant: &Granted) -> Result<Option<Duration>> {
        self.verify(grant, AccessLevel::Read).await?;
        let entry = self
            .live(grant.resource_id())
            .ok_or_else(|| ConnectorError::NotFound(grant.resource_id().to_string()))?;
        Ok(entry.remaining(Instant::now()))
    }

    async fn update_ttl(&self, grant: &Granted, ttl: Duration) -> Result<()> {
        self.verify(grant, AccessLevel::Write).await?;
        let now = Instant::now();
        match self.entries.get_mut(grant.resource_id()) {
            Some(mut entry) if !entry.is_expired(now) => {
                entry.expires_at = deadline(now, ttl);
                Ok(())
            }
            _ => Err(ConnectorError::NotFound(grant.resource_id().to_string())),
        }
    }

    async fn set_acl(&self, grant: &Granted, acl: Acl) -> Result<()> {
        self.verify(grant, AccessLevel::Owner).await?;
        let now = Instant::now();
        match self.entries.get_mut(grant.resource_id()) {
            Some(mut entry) if !entry.is_expired(now) => {
                entry.acl = acl;
                Ok(())
            }
            _ => Err(ConnectorError::NotFound(grant.resource_id().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = RamCache::new(AclConfig::default());
        let alice = AccessCandidate::user("alice");

        let grant = cache.enforce(&alice.write_request("k")).await.unwrap();
        cache
            .set(&grant, "v".into(), Some(Duration::from_secs(10)))
            .await
            .unwrap();

        let read = cache.enforce(&alice.read_request("k")).await.unwrap();
        assert_eq!(cache.get(&read).await.unwrap().as_deref(), Some("v"));
        assert_eq!(cache.get_ttl(&read).await.unwrap(), Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get(&read).await.unwrap(), None);
        assert!(!cache.exists(&read).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_and_purge() {
        let cache = RamCache::new(AclConfig::default()).with_default_ttl(Duration::from_secs(5));
        let bob = AccessCandidate::agent("bob");
        for key in ["a", "b"] {
            let grant = cache.enforce(&bob.write_request(key)).await.unwrap();
            cache.set(&grant, key.into(), None).await.unwrap();
        }
        assert_eq!(cache.len(), 2);

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.purge_expired(), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let cache = RamCache::new(AclConfig::default())
            .with_default_ttl(Duration::from_secs(u64::MAX));
        let alice = AccessCandidate::user("alice");

        let write = cache.enforce(&alice.write_request("k")).await.unwrap();
        cache.set(&write, "v".into(), None).await.unwrap();
        cache.set(&write, "v".into(), Some(Duration::MAX)).await.unwrap();
        cache.update_ttl(&write, Duration::MAX).await.unwrap();

        let read = cache.enforce(&alice.read_request("k")).await.unwrap();
        assert_eq!(cache.get_ttl(&read).await.unwrap(), None);
        assert_eq!(cache.get(&read).await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_grant_from_another_cache_is_refused() {
        let ours = RamCache::new(AclConfig::default());
        let theirs = RamCache::new(AclConfig::default());
        let alice = AccessCandidate::user("alice");
        let bob = AccessCandidate::user("bob");

        let write = ours.enforce(&alice.write_request("k")).await.unwrap();
        ours.set(&write, "alice".into(), None).await.unwrap();

        // bob owns "k" in the other cache, where it does not exist yet
        let foreign_read = theirs.enforce(&bob.read_request("k")).await.unwrap();
        assert!(ours.get(&foreign_read).await.unwrap_err().is_access_denied());
        let foreign_write = theirs.enforce(&bob.write_request("k")).await.unwrap();
        assert!(ours
            .set(&foreign_write, "bob".into(), None)
            .await
            .unwrap_err()
            .is_access_denied());
        let read = ours.enforce(&alice.read_request("k")).await.unwrap();
        assert_eq!(ours.get(&read).await.unwrap().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_update_ttl_on_missing_key() {
        let cache = RamCache::new(AclConfig::default());
        let grant = cache
            .enforce(&AccessCandidate::user("alice").write_request("nope"))
            .await
            .unwrap();
        let err = cache.update_ttl(&grant, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ConnectorError::NotFound(_)));
    }
}
