//! Error types for ACL construction and parsing

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AclError {
    /// The named hash function was never registered
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    /// A hash function with this name already exists
    #[error("hash algorithm already registered: {0}")]
    DuplicateHashAlgorithm(String),

    /// The name is empty or would not survive the `h:<algorithm>` segment
    #[error("invalid hash algorithm name: '{0}'")]
    InvalidHashAlgorithmName(String),

    /// A serialized ACL did not match the compact grammar
    #[error("malformed serialized ACL segment '{segment}': {reason}")]
    MalformedSerializedAcl { segment: String, reason: String },
}

impl AclError {
    pub(crate) fn malformed(segment: &str, reason: impl Into<String>) -> Self {
        AclError::MalformedSerializedAcl {
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type using AclError
pub type Result<T> = std::result::Result<T, AclError>;
