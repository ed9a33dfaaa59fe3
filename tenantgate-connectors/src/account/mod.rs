//! Account connectors: who belongs to which team
//!
//! Account lookups are identity plumbing, not resources, so they are not
//! ACL-gated.

use crate::builtin::STATIC_ACCOUNT;
use crate::error::Result;
use crate::service::ConnectorContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tenantgate_types::{AccessCandidate, Role};

#[async_trait]
pub trait AccountConnector: Send + Sync {
    fn name(&self) -> &str;

    /// Team the candidate acts on behalf of, if any.
    async fn get_candidate_team(&self, candidate: &AccessCandidate) -> Result<Option<String>>;

    async fn is_team_member(&self, team_id: &str, candidate: &AccessCandidate) -> Result<bool>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMembers {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub agents: Vec<String>,
}

impl TeamMembers {
    fn contains(&self, candidate: &AccessCandidate) -> bool {
        match candidate.role {
            Role::User => self.users.contains(&candidate.id),
            Role::Agent => self.agents.contains(&candidate.id),
            Role::Team | Role::Public => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticAccountSettings {
    #[serde(default)]
    pub teams: BTreeMap<String, TeamMembers>,
}

/// Team membership read from configuration.
///
/// A candidate listed in several teams resolves to the first in id order.
pub struct StaticAccount {
    name: String,
    teams: BTreeMap<String, TeamMembers>,
}

impl StaticAccount {
    pub fn new(teams: BTreeMap<String, TeamMembers>) -> Self {
        Self {
            name: STATIC_ACCOUNT.to_string(),
            teams,
        }
    }

    pub fn from_context(ctx: &ConnectorContext<'_>) -> Result<Self> {
        let settings: StaticAccountSettings = ctx.settings.parse(ctx.name)?;
        Ok(Self {
            name: ctx.name.to_string(),
            teams: settings.teams,
        })
    }
}

#[async_trait]
impl AccountConnector for StaticAccount {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_candidate_team(&self, candidate: &AccessCandidate) -> Result<Option<String>> {
        if candidate.role == Role::Team {
            return Ok(Some(candidate.id.clone()));
        }
        Ok(self
            .teams
            .iter()
            .find(|(_, members)| members.contains(candidate))
            .map(|(team, _)| team.clone()))
    }

    async fn is_team_member(&self, team_id: &str, candidate: &AccessCandidate) -> Result<bool> {
        if candidate.role == Role::Team {
            return Ok(candidate.id == team_id);
        }
        Ok(self
            .teams
            .get(team_id)
            .is_some_and(|members| members.contains(candidate)))
    }
}
