//! Log connector that writes through `tracing` and keeps a bounded tail of
//! each stream in memory.

use super::{require_agent, LogConnector, LogEntry};
use crate::builtin::CONSOLE_LOG;
use crate::config::AclConfig;
use crate::error::Result;
use crate::secure::SecureConnector;
use crate::service::ConnectorContext;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tenantgate_acl::{Acl, Granted};
use tenantgate_types::{AccessCandidate, AccessLevel};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleLogSettings {
    /// Entries kept per stream
    #[serde(default = "default_retain")]
    pub retain: usize,
}

fn default_retain() -> usize {
    1000
}

impl Default for ConsoleLogSettings {
    fn default() -> Self {
        Self {
            retain: default_retain(),
        }
    }
}

struct LogStream {
    acl: Acl,
    entries: VecDeque<LogEntry>,
}

pub struct ConsoleLog {
    name: String,
    retain: usize,
    streams: RwLock<HashMap<String, LogStream>>,
    acl: AclConfig,
}

impl ConsoleLog {
    pub fn new(acl: AclConfig) -> Self {
        Self {
            name: CONSOLE_LOG.to_string(),
            retain: default_retain(),
            streams: RwLock::new(HashMap::new()),
            acl,
        }
    }

    pub fn with_retain(mut self, retain: usize) -> Self {
        self.retain = retain;
        self
    }

    pub fn from_context(ctx: &ConnectorContext<'_>) -> Result<Self> {
        let settings: ConsoleLogSettings = ctx.settings.parse(ctx.name)?;
        Ok(Self::new(ctx.acl.clone()).named(ctx.name).with_retain(settings.retain))
    }

    fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

#[async_trait]
impl SecureConnector for ConsoleLog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_resource_acl(
        &self,
        resource_id: &str,
        candidate: &AccessCandidate,
    ) -> Result<Acl> {
        if let Some(stream) = self.streams.read().get(resource_id) {
            return Ok(stream.acl.clone());
        }
        Ok(self.acl.creator_acl(candidate)?)
    }
}

#[async_trait]
impl LogConnector for ConsoleLog {
    async fn append(&self, grant: &Granted, entry: LogEntry) -> Result<()> {
        require_agent(grant.candidate())?;
        self.verify(grant, AccessLevel::Write).await?;
        let request = grant.request();
        let new_acl = self
            .acl
            .new_resource_acl(&request.candidate, request.resource_team_id.as_deref())?;

        info!(
            stream = grant.resource_id(),
            source = %entry.source,
            data = ?entry.data,
            "{}",
            entry.message
        );

        let mut streams = self.streams.write();
        let stream = streams
            .entry(grant.resource_id().to_string())
            .or_insert_with(|| LogStream {
                acl: new_acl,
                entries: VecDeque::new(),
            });
        stream.entries.push_back(entry);
        while stream.entries.len() > self.retain {
            stream.entries.pop_front();
        }
        Ok(())
    }

    async fn entries(&self, grant: &Granted, limit: usize) -> Result<Vec<LogEntry>> {
        require_agent(grant.candidate())?;
        self.verify(grant, AccessLevel::Read).await?;
        let streams = self.streams.read();
        let Some(stream) = streams.get(grant.resource_id()) else {
            return Ok(Vec::new());
        };
        let skip = stream.entries.len().saturating_sub(limit);
        Ok(stream.entries.iter().skip(skip).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectorError;

    #[tokio::test]
    async fn test_retains_tail() {
        let log = ConsoleLog::new(AclConfig::default()).with_retain(3);
        let agent = AccessCandidate::agent("a1");
        let write = log.enforce(&agent.write_request("a1")).await.unwrap();
        for i in 0..5 {
            log.append(&write, LogEntry::new("step", format!("m{}", i)))
                .await
                .unwrap();
        }

        let read = log.enforce(&agent.read_request("a1")).await.unwrap();
        let messages: Vec<String> = log
            .entries(&read, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["m2", "m3", "m4"]);
        assert_eq!(log.entries(&read, 1).await.unwrap()[0].message, "m4");
    }

    #[tokio::test]
    async fn test_streams_are_private() {
        let log = ConsoleLog::new(AclConfig::default());
        let write = log
            .enforce(&AccessCandidate::agent("a1").write_request("a1"))
            .await
            .unwrap();
        log.append(&write, LogEntry::new("s", "secret")).await.unwrap();

        let err = log
            .enforce(&AccessCandidate::agent("a2").read_request("a1"))
            .await
            .unwrap_err();
        assert!(err.is_access_denied());
    }

    #[tokio::test]
    async fn test_user_grants_are_refused() {
        let log = ConsoleLog::new(AclConfig::default());
        let user = AccessCandidate::user("u1");
        let write = log.enforce(&user.write_request("u1")).await.unwrap();
        let err = log
            .append(&write, LogEntry::new("s", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::RoleNotAllowed(_)));

        let read = log.enforce(&user.read_request("u1")).await.unwrap();
        assert!(log.entries(&read, 10).await.is_err());
    }
}
