//! Team-scoped resource URIs
//!
//! `scheme://<team>.team/<path>` names a resource owned by `<team>`. The
//! resolved resource id keeps the team as its first path segment so two
//! teams can use the same path without colliding.

use crate::error::{ConnectorError, Result};

const SCHEME_SEPARATOR: &str = "://";
const TEAM_SUFFIX: &str = ".team";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUri {
    pub scheme: String,
    pub team_id: String,
    pub path: String,
}

impl ResourceUri {
    pub fn is_uri(resource: &str) -> bool {
        resource.contains(SCHEME_SEPARATOR)
    }

    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = |reason: &str| ConnectorError::InvalidResourceId {
            id: uri.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = uri
            .split_once(SCHEME_SEPARATOR)
            .ok_or_else(|| invalid("missing scheme"))?;
        if scheme.is_empty() {
            return Err(invalid("empty scheme"));
        }
        let (authority, path) = rest
            .split_once('/')
            .ok_or_else(|| invalid("missing path"))?;
        let team_id = authority
            .strip_suffix(TEAM_SUFFIX)
            .ok_or_else(|| invalid("authority must be <team>.team"))?;
        if team_id.is_empty() {
            return Err(invalid("empty team id"));
        }
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(invalid("empty path"));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            team_id: team_id.to_string(),
            path: path.to_string(),
        })
    }

    /// Resource id the ACL is keyed on.
    pub fn resource_id(&self) -> String {
        format!("{}/{}", self.team_id, self.path)
    }
}

/// Resolve a plain resource id or a team URI into `(resource_id, team)`.
pub fn resolve(resource: &str) -> Result<(String, Option<String>)> {
    if ResourceUri::is_uri(resource) {
        let uri = ResourceUri::parse(resource)?;
        Ok((uri.resource_id(), Some(uri.team_id)))
    } else {
        Ok((resource.to_string(), None))
    }
}
