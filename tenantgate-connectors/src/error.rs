//! Error types for connectors and the connector registry

use crate::category::ConnectorCategory;
use tenantgate_acl::{AccessDenied, AclError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The resource ACL did not grant the request
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    /// ACL construction or parsing failed
    #[error(transparent)]
    Acl(#[from] AclError),

    /// Nothing was registered under this category/name
    #[error("connector '{name}' is not registered for category {category}")]
    ConnectorNotRegistered {
        category: ConnectorCategory,
        name: String,
    },

    /// No name given and no connector selected for the category
    #[error("no active connector for category {0}")]
    NoActiveConnector(ConnectorCategory),

    /// The registered connector does not implement the requested interface
    #[error("connector '{name}' in category {category} is not a {expected}")]
    ConnectorTypeMismatch {
        category: ConnectorCategory,
        name: String,
        expected: &'static str,
    },

    /// A role-restricted connector refused the candidate
    #[error("{0}")]
    RoleNotAllowed(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("invalid resource id '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("invalid settings for connector '{name}': {reason}")]
    InvalidSettings { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConnectorError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ConnectorError::AccessDenied(_))
    }
}

/// Result type using ConnectorError
pub type Result<T> = std::result::Result<T, ConnectorError>;
