//! Object storage connectors

pub mod local;

pub use local::{LocalStorage, LocalStorageSettings};

use crate::error::Result;
use crate::secure::{Requester, SecureConnector};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tenantgate_acl::{Acl, Granted};
use tenantgate_types::{AccessCandidate, AccessLevel};

/// Free-form metadata stored next to an object
pub type StorageMetadata = BTreeMap<String, serde_json::Value>;

/// Backend operations. Each one acts on the resource named by the grant.
#[async_trait]
pub trait StorageConnector: SecureConnector {
    async fn read(&self, grant: &Granted) -> Result<Option<Vec<u8>>>;

    /// Store `data`. The first write of a resource also persists its ACL.
    async fn write(
        &self,
        grant: &Granted,
        data: Vec<u8>,
        metadata: Option<StorageMetadata>,
    ) -> Result<()>;

    async fn delete(&self, grant: &Granted) -> Result<()>;

    async fn exists(&self, grant: &Granted) -> Result<bool>;

    async fn get_metadata(&self, grant: &Granted) -> Result<Option<StorageMetadata>>;

    async fn set_metadata(&self, grant: &Granted, metadata: StorageMetadata) -> Result<()>;

    async fn set_acl(&self, grant: &Granted, acl: Acl) -> Result<()>;
}

impl dyn StorageConnector {
    pub fn requester(&self, candidate: AccessCandidate) -> Requester<'_, dyn StorageConnector> {
        Requester::new(self, candidate)
    }

    pub fn user(&self, id: impl Into<String>) -> Requester<'_, dyn StorageConnector> {
        self.requester(AccessCandidate::user(id))
    }

    pub fn team(&self, id: impl Into<String>) -> Requester<'_, dyn StorageConnector> {
        self.requester(AccessCandidate::team(id))
    }

    pub fn agent(&self, id: impl Into<String>) -> Requester<'_, dyn StorageConnector> {
        self.requester(AccessCandidate::agent(id))
    }
}

impl Requester<'_, dyn StorageConnector> {
    async fn grant(&self, resource: &str, level: AccessLevel) -> Result<Granted> {
        let request = self.request_for(resource, &[level])?;
        self.connector.enforce(&request).await
    }

    pub async fn read(&self, resource: &str) -> Result<Option<Vec<u8>>> {
        let grant = self.grant(resource, AccessLevel::Read).await?;
        self.connector.read(&grant).await
    }

    pub async fn write(&self, resource: &str, data: impl Into<Vec<u8>>) -> Result<()> {
        self.write_with_metadata(resource, data, None).await
    }

    pub async fn write_with_metadata(
        &self,
        resource: &str,
        data: impl Into<Vec<u8>>,
        metadata: Option<StorageMetadata>,
    ) -> Result<()> {
        let grant = self.grant(resource, AccessLevel::Write).await?;
        self.connector.write(&grant, data.into(), metadata).await
    }

    pub async fn delete(&self, resource: &str) -> Result<()> {
        let grant = self.grant(resource, AccessLevel::Write).await?;
        self.connector.delete(&grant).await
    }

    pub async fn exists(&self, resource: &str) -> Result<bool> {
        let grant = self.grant(resource, AccessLevel::Read).await?;
        self.connector.exists(&grant).await
    }

    pub async fn get_metadata(&self, resource: &str) -> Result<Option<StorageMetadata>> {
        let grant = self.grant(resource, AccessLevel::Read).await?;
        self.connector.get_metadata(&grant).await
    }

    pub async fn set_metadata(&self, resource: &str, metadata: StorageMetadata) -> Result<()> {
        let grant = self.grant(resource, AccessLevel::Write).await?;
        self.connector.set_metadata(&grant, metadata).await
    }

    pub async fn get_acl(&self, resource: &str) -> Result<Acl> {
        let grant = self.grant(resource, AccessLevel::Read).await?;
        Ok(grant.into_acl())
    }

    /// Replace the resource ACL. Only owners may do this.
    pub async fn set_acl(&self, resource: &str, acl: Acl) -> Result<()> {
        let grant = self.grant(resource, AccessLevel::Owner).await?;
        self.connector.set_acl(&grant, acl).await
    }
}
