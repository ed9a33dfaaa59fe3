//! CLI command implementations.

pub mod acl;
pub mod config;

pub use acl::{check_access, decode_acl, hash_owner};
pub use config::check_config;
