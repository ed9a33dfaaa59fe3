//! Agent log connectors
//!
//! Each agent owns one log stream keyed by its id. Only agents may open a
//! requester on a log connector, and backends refuse grants held by anyone
//! else.

pub mod console;

pub use console::{ConsoleLog, ConsoleLogSettings};

use crate::error::{ConnectorError, Result};
use crate::secure::{Requester, SecureConnector};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenantgate_acl::Granted;
use tenantgate_types::{AccessCandidate, AccessLevel, Role};

pub const AGENTS_ONLY: &str = "Only agents can use Log connector";

/// Fails with [`ConnectorError::RoleNotAllowed`] unless `candidate` is an agent.
pub fn require_agent(candidate: &AccessCandidate) -> Result<()> {
    if candidate.role != Role::Agent {
        return Err(ConnectorError::RoleNotAllowed(AGENTS_ONLY.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    /// Component that produced the entry, e.g. a workflow step
    pub source: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl LogEntry {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[async_trait]
pub trait LogConnector: SecureConnector {
    async fn append(&self, grant: &Granted, entry: LogEntry) -> Result<()>;

    /// Most recent entries of the granted stream, oldest first.
    async fn entries(&self, grant: &Granted, limit: usize) -> Result<Vec<LogEntry>>;
}

impl dyn LogConnector {
    pub fn requester(&self, candidate: AccessCandidate) -> Result<Requester<'_, dyn LogConnector>> {
        require_agent(&candidate)?;
        Ok(Requester::new(self, candidate))
    }

    pub fn agent(&self, id: impl Into<String>) -> Requester<'_, dyn LogConnector> {
        Requester::new(self, AccessCandidate::agent(id))
    }
}

impl Requester<'_, dyn LogConnector> {
    async fn grant(&self, level: AccessLevel) -> Result<Granted> {
        require_agent(self.candidate())?;
        let stream = self.candidate().id.clone();
        let request = self.request_for(&stream, &[level])?;
        self.connector.enforce(&request).await
    }

    pub async fn log(&self, entry: LogEntry) -> Result<()> {
        let grant = self.grant(AccessLevel::Write).await?;
        self.connector.append(&grant, entry).await
    }

    pub async fn entries(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let grant = self.grant(AccessLevel::Read).await?;
        self.connector.entries(&grant, limit).await
    }
}
