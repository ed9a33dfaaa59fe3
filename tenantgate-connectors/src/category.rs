//! Logical service categories a connector can be registered under

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorCategory {
    Storage,
    Cache,
    Log,
    Component,
    #[serde(rename = "vector_db")]
    VectorDB,
    Account,
    AgentData,
    ModelsProvider,
    Vault,
    Router,
}

impl ConnectorCategory {
    pub fn all() -> [ConnectorCategory; 10] {
        [
            ConnectorCategory::Storage,
            ConnectorCategory::Cache,
            ConnectorCategory::Log,
            ConnectorCategory::Component,
            ConnectorCategory::VectorDB,
            ConnectorCategory::Account,
            ConnectorCategory::AgentData,
            ConnectorCategory::ModelsProvider,
            ConnectorCategory::Vault,
            ConnectorCategory::Router,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorCategory::Storage => "storage",
            ConnectorCategory::Cache => "cache",
            ConnectorCategory::Log => "log",
            ConnectorCategory::Component => "component",
            ConnectorCategory::VectorDB => "vector_db",
            ConnectorCategory::Account => "account",
            ConnectorCategory::AgentData => "agent_data",
            ConnectorCategory::ModelsProvider => "models_provider",
            ConnectorCategory::Vault => "vault",
            ConnectorCategory::Router => "router",
        }
    }
}

impl fmt::Display for ConnectorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        ConnectorCategory::all()
            .into_iter()
            .find(|c| c.as_str() == normalized || c.as_str().replace('_', "") == normalized)
            .ok_or_else(|| format!("unknown connector category: {}", s))
    }
}
