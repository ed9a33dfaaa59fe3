//! Per-resource access control lists
//!
//! An [`Acl`] maps `role -> hashed owner id -> granted levels`. Checks are
//! exact: every requested level must be granted to the candidate's role and
//! id, and anything missing is a deny.

use crate::codec;
use crate::error::{AclError, Result};
use crate::hash::{self, HashFn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tenantgate_types::{AccessLevel, AccessRequest, Role};

/// Algorithm used when none is named.
pub const DEFAULT_HASH_ALGORITHM: &str = hash::XXH3;

/// Stored grants: role -> hashed owner id -> levels in insertion order.
pub type AclEntries = BTreeMap<Role, BTreeMap<String, Vec<AccessLevel>>>;

/// Access control list attached to a single resource.
#[derive(Clone)]
pub struct Acl {
    hash_algorithm: String,
    hasher: HashFn,
    entries: AclEntries,
    migrated: bool,
}

impl Acl {
    /// Empty ACL hashing owners with the default algorithm.
    pub fn new() -> Self {
        Self {
            hash_algorithm: DEFAULT_HASH_ALGORITHM.to_string(),
            hasher: hash::xxh3_hex,
            entries: BTreeMap::new(),
            migrated: false,
        }
    }

    /// Empty ACL hashing owners with `name`.
    pub fn with_hash_algorithm(name: &str) -> Result<Self> {
        Ok(Self {
            hash_algorithm: name.to_string(),
            hasher: hash::resolve(name)?,
            entries: BTreeMap::new(),
            migrated: false,
        })
    }

    /// Rebuild an ACL from already-hashed parts.
    pub(crate) fn from_parts(
        hash_algorithm: &str,
        entries: AclEntries,
        migrated: bool,
    ) -> Result<Self> {
        let mut acl = Self::with_hash_algorithm(hash_algorithm)?;
        acl.entries = entries;
        acl.migrated = migrated;
        Ok(acl)
    }

    /// Parse the compact `h:xxh3|t:<owner>/rw` form.
    pub fn from_serialized(serialized: &str) -> Result<Self> {
        codec::decode(serialized)
    }

    /// Render the compact form.
    pub fn serialized_acl(&self) -> String {
        codec::encode(self)
    }

    pub fn hash_algorithm(&self) -> &str {
        &self.hash_algorithm
    }

    pub fn entries(&self) -> &AclEntries {
        &self.entries
    }

    pub fn is_migrated(&self) -> bool {
        self.migrated
    }

    /// Flag this ACL as synthesized for a resource that predates ACLs.
    pub fn mark_migrated(&mut self) -> &mut Self {
        self.migrated = true;
        self
    }

    /// True when no `(role, owner)` pair has ever been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|owners| owners.is_empty())
    }

    /// Hash an owner id the way this ACL stores it.
    pub fn hash_owner(&self, owner_id: &str) -> String {
        (self.hasher)(owner_id)
    }

    /// Grant `levels` to `(role, owner_id)`, merging with existing grants.
    pub fn add_access(&mut self, role: Role, owner_id: &str, levels: &[AccessLevel]) -> &mut Self {
        let key = self.hash_owner(owner_id);
        let granted = self.entries.entry(role).or_default().entry(key).or_default();
        for level in levels {
            if !granted.contains(level) {
                granted.push(*level);
            }
        }
        self
    }

    /// Revoke `levels` from `(role, owner_id)`.
    ///
    /// The owner key stays in place with whatever levels remain, possibly
    /// none, so "known with zero levels" stays distinct from "never granted".
    pub fn remove_access(
        &mut self,
        role: Role,
        owner_id: &str,
        levels: &[AccessLevel],
    ) -> &mut Self {
        let key = self.hash_owner(owner_id);
        if let Some(granted) = self.entries.get_mut(&role).and_then(|owners| owners.get_mut(&key)) {
            granted.retain(|level| !levels.contains(level));
        }
        self
    }

    pub fn add_public_access(&mut self, levels: &[AccessLevel]) -> &mut Self {
        self.add_access(Role::Public, "", levels)
    }

    pub fn remove_public_access(&mut self, levels: &[AccessLevel]) -> &mut Self {
        self.remove_access(Role::Public, "", levels)
    }

    /// Levels stored for `(role, owner_id)`, if that pair was ever granted.
    pub fn levels_for(&self, role: Role, owner_id: &str) -> Option<&[AccessLevel]> {
        let key = self.hash_owner(owner_id);
        self.entries
            .get(&role)
            .and_then(|owners| owners.get(&key))
            .map(|levels| levels.as_slice())
    }

    /// Exact, fail-closed access check.
    ///
    /// Granted only when the candidate's role has an entry for the hashed
    /// candidate id and that entry holds every requested level. A request
    /// with no levels is denied.
    pub fn check_exact_access(&self, request: &AccessRequest) -> bool {
        if request.levels.is_empty() {
            return false;
        }
        let Some(owners) = self.entries.get(&request.candidate.role) else {
            return false;
        };
        let Some(granted) = owners.get(&self.hash_owner(&request.candidate.id)) else {
            return false;
        };
        request.levels.iter().all(|level| granted.contains(level))
    }

    /// Plain data form, owner keys already hashed.
    pub fn to_data(&self) -> AclData {
        AclData {
            hash_algorithm: self.hash_algorithm.clone(),
            entries: self.entries.clone(),
            migrated: self.migrated,
        }
    }

    /// Deep-copy an ACL from its data form. Levels are deduplicated.
    pub fn from_data(data: AclData) -> Result<Self> {
        let entries = data
            .entries
            .into_iter()
            .map(|(role, owners)| {
                let owners = owners
                    .into_iter()
                    .map(|(owner, levels)| (owner, dedup(levels)))
                    .collect();
                (role, owners)
            })
            .collect();
        Self::from_parts(&data.hash_algorithm, entries, data.migrated)
    }
}

fn dedup(levels: Vec<AccessLevel>) -> Vec<AccessLevel> {
    let mut unique = Vec::with_capacity(levels.len());
    for level in levels {
        if !unique.contains(&level) {
            unique.push(level);
        }
    }
    unique
}

impl Default for Acl {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Acl {
    fn eq(&self, other: &Self) -> bool {
        self.hash_algorithm == other.hash_algorithm
            && self.migrated == other.migrated
            && self.entries == other.entries
    }
}

impl Eq for Acl {}

impl fmt::Debug for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acl")
            .field("hash_algorithm", &self.hash_algorithm)
            .field("entries", &self.entries)
            .field("migrated", &self.migrated)
            .finish()
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized_acl())
    }
}

impl FromStr for Acl {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_serialized(s)
    }
}

impl TryFrom<AclData> for Acl {
    type Error = AclError;

    fn try_from(data: AclData) -> Result<Self> {
        Self::from_data(data)
    }
}

impl Serialize for Acl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.serialized_acl())
    }
}

impl<'de> Deserialize<'de> for Acl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let serialized = String::deserialize(deserializer)?;
        Acl::from_serialized(&serialized).map_err(serde::de::Error::custom)
    }
}

/// Structured form of an ACL, for callers that keep grants as JSON objects
/// rather than the compact string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclData {
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: String,
    #[serde(default)]
    pub entries: AclEntries,
    #[serde(default)]
    pub migrated: bool,
}

fn default_hash_algorithm() -> String {
    DEFAULT_HASH_ALGORITHM.to_string()
}
