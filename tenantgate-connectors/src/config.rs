//! Runtime configuration: ACL policy and connector selection.

use crate::category::ConnectorCategory;
use crate::settings::ConnectorSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tenantgate_acl::{hash, Acl, AclError, DEFAULT_HASH_ALGORITHM};
use tenantgate_types::{AccessCandidate, AccessLevel, Role};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid ACL settings: {0}")]
    Acl(#[from] AclError),
}

/// Top-level configuration, usually loaded from `tenantgate.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub acl: AclConfig,

    /// Active connector per category
    #[serde(default)]
    pub connectors: BTreeMap<ConnectorCategory, ConnectorSelection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSelection {
    pub name: String,

    #[serde(default)]
    pub settings: ConnectorSettings,
}

impl RuntimeConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on settings that would only break at first resource access.
    pub fn validate(&self) -> Result<(), ConfigError> {
        hash::resolve(&self.acl.hash_algorithm)?;
        Ok(())
    }
}

/// How connectors build ACLs for new and legacy resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclConfig {
    /// Hash used for owner ids in newly created ACLs
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: String,

    /// Grant `Read` to the resource team when a resource is created
    #[serde(default = "default_true")]
    pub team_read: bool,

    #[serde(default)]
    pub legacy: LegacyAclPolicy,
}

/// Grants synthesized for resources written before ACLs existed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyAclPolicy {
    /// Levels given to the owner recorded in legacy metadata
    #[serde(default = "default_owner_levels")]
    pub owner_levels: Vec<AccessLevel>,

    /// Grant `Read` to the recorded team
    #[serde(default = "default_true")]
    pub team_read: bool,
}

fn default_hash_algorithm() -> String {
    DEFAULT_HASH_ALGORITHM.to_string()
}

fn default_true() -> bool {
    true
}

fn default_owner_levels() -> Vec<AccessLevel> {
    vec![AccessLevel::Read, AccessLevel::Write, AccessLevel::Owner]
}

/// Levels the creator of a resource receives.
pub const CREATOR_LEVELS: [AccessLevel; 3] =
    [AccessLevel::Owner, AccessLevel::Read, AccessLevel::Write];

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: default_hash_algorithm(),
            team_read: true,
            legacy: LegacyAclPolicy::default(),
        }
    }
}

impl Default for LegacyAclPolicy {
    fn default() -> Self {
        Self {
            owner_levels: default_owner_levels(),
            team_read: true,
        }
    }
}

impl AclConfig {
    pub fn empty_acl(&self) -> Result<Acl, AclError> {
        Acl::with_hash_algorithm(&self.hash_algorithm)
    }

    /// ACL used to decide the very first operation on a resource that does
    /// not exist yet: the candidate owns it.
    pub fn creator_acl(&self, candidate: &AccessCandidate) -> Result<Acl, AclError> {
        let mut acl = self.empty_acl()?;
        acl.add_access(candidate.role, &candidate.id, &CREATOR_LEVELS);
        Ok(acl)
    }

    /// ACL persisted when a resource is first written.
    pub fn new_resource_acl(
        &self,
        candidate: &AccessCandidate,
        team_id: Option<&str>,
    ) -> Result<Acl, AclError> {
        let mut acl = self.creator_acl(candidate)?;
        if let (true, Some(team)) = (self.team_read, team_id) {
            acl.add_access(Role::Team, team, &[AccessLevel::Read]);
        }
        Ok(acl)
    }

    /// ACL synthesized for a legacy resource, marked migrated.
    ///
    /// With neither a recorded owner nor a team the result grants nothing.
    pub fn legacy_acl(
        &self,
        owner: Option<&AccessCandidate>,
        team_id: Option<&str>,
    ) -> Result<Acl, AclError> {
        let mut acl = self.empty_acl()?;
        if let Some(owner) = owner {
            acl.add_access(owner.role, &owner.id, &self.legacy.owner_levels);
        }
        if let (true, Some(team)) = (self.legacy.team_read, team_id) {
            acl.add_access(Role::Team, team, &[AccessLevel::Read]);
        }
        acl.mark_migrated();
        Ok(acl)
    }
}
