//! Filesystem-backed storage
//!
//! ```text
//! <root>/data/<resource_id>        object bytes
//! <root>/meta/<resource_id>.json   sidecar: acl, metadata, legacy owner/team
//! ```
//!
//! A sidecar without an `acl` field, or data without a sidecar, was written
//! before ACLs existed. Its ACL is synthesized from the legacy policy and
//! persisted on the next write.

use super::{StorageConnector, StorageMetadata};
use crate::builtin::LOCAL_STORAGE;
use crate::config::AclConfig;
use crate::error::{ConnectorError, Result};
use crate::secure::SecureConnector;
use crate::service::ConnectorContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tenantgate_acl::{Acl, Granted};
use tenantgate_types::{AccessCandidate, AccessLevel};
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageSettings {
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from(".tenantgate/storage")
}

impl Default for LocalStorageSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Sidecar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    acl: Option<Acl>,

    #[serde(default)]
    metadata: StorageMetadata,

    /// Owner recorded by pre-ACL writers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<AccessCandidate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    team: Option<String>,
}

struct ResourcePaths {
    data: PathBuf,
    meta: PathBuf,
}

pub struct LocalStorage {
    name: String,
    root: PathBuf,
    acl: AclConfig,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, acl: AclConfig) -> Self {
        Self {
            name: LOCAL_STORAGE.to_string(),
            root: root.into(),
            acl,
        }
    }

    pub fn from_context(ctx: &ConnectorContext<'_>) -> Result<Self> {
        let settings: LocalStorageSettings = ctx.settings.parse(ctx.name)?;
        Ok(Self {
            name: ctx.name.to_string(),
            root: settings.root,
            acl: ctx.acl.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn paths(&self, resource_id: &str) -> Result<ResourcePaths> {
        let invalid = |reason: &str| ConnectorError::InvalidResourceId {
            id: resource_id.to_string(),
            reason: reason.to_string(),
        };
        if resource_id.is_empty() {
            return Err(invalid("empty"));
        }
        let relative = Path::new(resource_id);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(invalid("must be a relative path without '..'"));
        }

        let data = self.root.join("data").join(relative);
        let meta = self.root.join("meta").join(format!("{}.json", resource_id));
        Ok(ResourcePaths { data, meta })
    }

    async fn load_sidecar(&self, path: &Path) -> Result<Option<Sidecar>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_sidecar(&self, path: &Path, sidecar: &Sidecar) -> Result<()> {
        write_creating_parents(path, &serde_json::to_vec_pretty(sidecar)?).await
    }
}

async fn write_creating_parents(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, contents).await?;
    Ok(())
}

async fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl SecureConnector for LocalStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_resource_acl(
        &self,
        resource_id: &str,
        candidate: &AccessCandidate,
    ) -> Result<Acl> {
        let paths = self.paths(resource_id)?;
        match self.load_sidecar(&paths.meta).await? {
            Some(Sidecar { acl: Some(acl), .. }) => Ok(acl),
            Some(legacy) => {
                warn!(resource = resource_id, "sidecar has no ACL, applying legacy policy");
                Ok(self.acl.legacy_acl(legacy.owner.as_ref(), legacy.team.as_deref())?)
            }
            None if fs::try_exists(&paths.data).await? => {
                warn!(resource = resource_id, "object has no sidecar, applying legacy policy");
                Ok(self.acl.legacy_acl(None, None)?)
            }
            None => Ok(self.acl.creator_acl(candidate)?),
        }
    }
}

#[async_trait]
impl StorageConnector for LocalStorage {
    async fn read(&self, grant: &Granted) -> Result<Option<Vec<u8>>> {
        self.verify(grant, AccessLevel::Read).await?;
        let paths = self.paths(grant.resource_id())?;
        match fs::read(&paths.data).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(
        &self,
        grant: &Granted,
        data: Vec<u8>,
        metadata: Option<StorageMetadata>,
    ) -> Result<()> {
        self.verify(grant, AccessLevel::Write).await?;
        let paths = self.paths(grant.resource_id())?;
        let existing = self.load_sidecar(&paths.meta).await?;
        let is_new = existing.is_none() && !fs::try_exists(&paths.data).await?;
        let mut sidecar = existing.unwrap_or_default();

        if sidecar.acl.is_none() {
            let acl = if is_new {
                let request = grant.request();
                self.acl
                    .new_resource_acl(&request.candidate, request.resource_team_id.as_deref())?
            } else {
                grant.acl().clone()
            };
            sidecar.acl = Some(acl);
        }
        if let Some(metadata) = metadata {
            sidecar.metadata = metadata;
        }

        write_creating_parents(&paths.data, &data).await?;
        self.save_sidecar(&paths.meta, &sidecar).await?;
        debug!(
            resource = grant.resource_id(),
            bytes = data.len(),
            created = is_new,
            "stored object"
        );
        Ok(())
    }

    async fn delete(&self, grant: &Granted) -> Result<()> {
        self.verify(grant, AccessLevel::Write).await?;
        let paths = self.paths(grant.resource_id())?;
        remove_if_present(&paths.data).await?;
        remove_if_present(&paths.meta).await?;
        debug!(resource = grant.resource_id(), "deleted object");
        Ok(())
    }

    async fn exists(&self, grant: &Granted) -> Result<bool> {
        self.verify(grant, AccessLevel::Read).await?;
        let paths = self.paths(grant.resource_id())?;
        Ok(fs::try_exists(&paths.data).await?)
    }

    async fn get_metadata(&self, grant: &Granted) -> Result<Option<StorageMetadata>> {
        self.verify(grant, AccessLevel::Read).await?;
        let paths = self.paths(grant.resource_id())?;
        Ok(self.load_sidecar(&paths.meta).await?.map(|s| s.metadata))
    }

    async fn set_metadata(&self, grant: &Granted, metadata: StorageMetadata) -> Result<()> {
        self.verify(grant, AccessLevel::Write).await?;
        let mut sidecar = self.existing_sidecar(grant).await?;
        sidecar.metadata = metadata;
        self.save_sidecar(&self.paths(grant.resource_id())?.meta, &sidecar).await
    }

    async fn set_acl(&self, grant: &Granted, acl: Acl) -> Result<()> {
        self.verify(grant, AccessLevel::Owner).await?;
        let mut sidecar = self.existing_sidecar(grant).await?;
        sidecar.acl = Some(acl);
        self.save_sidecar(&self.paths(grant.resource_id())?.meta, &sidecar).await
    }
}

impl LocalStorage {
    /// Sidecar of a stored object, with the granted ACL filled in for legacy
    /// objects.
    async fn existing_sidecar(&self, grant: &Granted) -> Result<Sidecar> {
        let paths = self.paths(grant.resource_id())?;
        if !fs::try_exists(&paths.data).await? {
            return Err(ConnectorError::NotFound(grant.resource_id().to_string()));
        }
        let mut sidecar = self.load_sidecar(&paths.meta).await?.unwrap_or_default();
        if sidecar.acl.is_none() {
            sidecar.acl = Some(grant.acl().clone());
        }
        Ok(sidecar)
    }
}
