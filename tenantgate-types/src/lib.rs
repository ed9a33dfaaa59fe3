//! Shared types for tenantgate
//!
//! This crate provides the identity and request values every connector
//! speaks: who is asking ([`AccessCandidate`]) and what they are asking
//! for ([`AccessRequest`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of principal making a request.
///
/// Roles are not ordered: a `Team` grant says nothing about `Agent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Public,
    User,
    Agent,
    Team,
}

impl Role {
    pub fn all() -> [Role; 4] {
        [Role::Public, Role::User, Role::Agent, Role::Team]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Public => "public",
            Role::User => "user",
            Role::Agent => "agent",
            Role::Team => "team",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Role::Public),
            "user" => Ok(Role::User),
            "agent" => Ok(Role::Agent),
            "team" => Ok(Role::Team),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Permission unit granted on a resource.
///
/// Levels are exact. Holding `Owner` does not imply `Read` or `Write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    Write,
    Owner,
}

impl AccessLevel {
    pub fn all() -> [AccessLevel; 3] {
        [AccessLevel::Read, AccessLevel::Write, AccessLevel::Owner]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
            AccessLevel::Owner => "owner",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            "owner" => Ok(AccessLevel::Owner),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Returned when parsing a role or level name fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// Identity attempting an operation: a role plus an opaque id.
///
/// The id is a user, team or agent id, and empty for `Public`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessCandidate {
    pub role: Role,
    pub id: String,
}

impl AccessCandidate {
    pub fn new(role: Role, id: impl Into<String>) -> Self {
        Self {
            role,
            id: id.into(),
        }
    }

    pub fn team(id: impl Into<String>) -> Self {
        Self::new(Role::Team, id)
    }

    pub fn agent(id: impl Into<String>) -> Self {
        Self::new(Role::Agent, id)
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new(Role::User, id)
    }

    pub fn public() -> Self {
        Self::new(Role::Public, "")
    }

    /// Same id, different role.
    pub fn as_role(&self, role: Role) -> Self {
        Self::new(role, self.id.clone())
    }

    /// A fresh request for this candidate with no resource and no levels.
    pub fn request(&self) -> AccessRequest {
        AccessRequest::new(self.clone())
    }

    pub fn read_request(&self, resource_id: impl Into<String>) -> AccessRequest {
        self.request().read(resource_id)
    }

    pub fn write_request(&self, resource_id: impl Into<String>) -> AccessRequest {
        self.request().write(resource_id)
    }

    pub fn owner_request(&self, resource_id: impl Into<String>) -> AccessRequest {
        self.request().owner(resource_id)
    }
}

impl fmt::Display for AccessCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}

/// A candidate's attempt to obtain specific levels on one resource.
///
/// Built fresh per operation and never persisted. A request with an empty
/// level set is never granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Correlation id for tracing a single operation
    pub id: String,
    pub resource_id: String,
    /// Team that nominally owns the resource, when known
    pub resource_team_id: Option<String>,
    pub levels: BTreeSet<AccessLevel>,
    pub candidate: AccessCandidate,
}

impl AccessRequest {
    pub fn new(candidate: AccessCandidate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            resource_id: String::new(),
            resource_team_id: None,
            levels: BTreeSet::new(),
            candidate,
        }
    }

    /// Target `resource_id` with exactly `level`.
    pub fn with_level(mut self, resource_id: impl Into<String>, level: AccessLevel) -> Self {
        self.resource_id = resource_id.into();
        self.levels.clear();
        self.levels.insert(level);
        self
    }

    /// Target `resource_id` and add `level` to the requested set.
    pub fn add_level(mut self, resource_id: impl Into<String>, level: AccessLevel) -> Self {
        self.resource_id = resource_id.into();
        self.levels.insert(level);
        self
    }

    pub fn read(self, resource_id: impl Into<String>) -> Self {
        self.with_level(resource_id, AccessLevel::Read)
    }

    pub fn write(self, resource_id: impl Into<String>) -> Self {
        self.with_level(resource_id, AccessLevel::Write)
    }

    pub fn owner(self, resource_id: impl Into<String>) -> Self {
        self.with_level(resource_id, AccessLevel::Owner)
    }

    pub fn add_read(self, resource_id: impl Into<String>) -> Self {
        self.add_level(resource_id, AccessLevel::Read)
    }

    pub fn add_write(self, resource_id: impl Into<String>) -> Self {
        self.add_level(resource_id, AccessLevel::Write)
    }

    pub fn add_owner(self, resource_id: impl Into<String>) -> Self {
        self.add_level(resource_id, AccessLevel::Owner)
    }

    /// Attach the team that owns the resource.
    pub fn res_team(mut self, team_id: impl Into<String>) -> Self {
        self.resource_team_id = Some(team_id.into());
        self
    }

    pub fn has_level(&self, level: AccessLevel) -> bool {
        self.levels.contains(&level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_factories() {
        assert_eq!(AccessCandidate::team("t1").role, Role::Team);
        assert_eq!(AccessCandidate::agent("a1").role, Role::Agent);
        assert_eq!(AccessCandidate::user("u1").id, "u1");

        let public = AccessCandidate::public();
        assert_eq!(public.role, Role::Public);
        assert!(public.id.is_empty());
    }

    #[test]
    fn test_role_switch_keeps_id() {
        let team = AccessCandidate::team("shared");
        let agent = team.as_role(Role::Agent);
        assert_eq!(agent.id, "shared");
        assert_ne!(agent, team);
    }

    #[test]
    fn test_request_builders() {
        let candidate = AccessCandidate::agent("a1");

        let read = candidate.read_request("doc.txt");
        assert_eq!(read.resource_id, "doc.txt");
        assert_eq!(read.levels.len(), 1);
        assert!(read.has_level(AccessLevel::Read));

        // read/write/owner replace, add_* accumulates
        let replaced = read.clone().write("doc.txt");
        assert_eq!(replaced.levels.len(), 1);
        assert!(replaced.has_level(AccessLevel::Write));

        let combined = candidate
            .request()
            .add_read("doc.txt")
            .add_write("doc.txt")
            .add_read("doc.txt");
        assert_eq!(combined.levels.len(), 2);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let candidate = AccessCandidate::user("u1");
        assert_ne!(candidate.request().id, candidate.request().id);
    }

    #[test]
    fn test_res_team() {
        let request = AccessCandidate::user("u1")
            .read_request("file")
            .res_team("t1");
        assert_eq!(request.resource_team_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Team".parse::<Role>(), Ok(Role::Team));
        assert_eq!("owner".parse::<AccessLevel>(), Ok(AccessLevel::Owner));
        assert!("admin".parse::<Role>().is_err());
    }
}
