//! Named owner-id hash functions
//!
//! ACLs never store raw owner ids (unless the algorithm is `none`). The
//! algorithm name travels with the serialized ACL, so every function here
//! must be pure and unsalted: a digest computed today is compared against
//! digests persisted by earlier processes.

use crate::codec::RESERVED;
use crate::error::{AclError, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Identity: keeps owner ids readable in persisted ACLs.
pub const NONE: &str = "none";
/// XXH3-64 as 16 lowercase hex digits. The default.
pub const XXH3: &str = "xxh3";
/// BLAKE3-256 as 64 lowercase hex digits.
pub const BLAKE3: &str = "blake3";

/// A named hash function.
pub type HashFn = fn(&str) -> String;

pub fn identity(input: &str) -> String {
    input.to_string()
}

pub fn xxh3_hex(input: &str) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(input.as_bytes()))
}

pub fn blake3_hex(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

/// Table of hash functions keyed by name.
#[derive(Debug, Clone)]
pub struct HashRegistry {
    functions: BTreeMap<String, HashFn>,
}

impl HashRegistry {
    /// An empty registry. Most callers want [`HashRegistry::with_builtins`].
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut functions: BTreeMap<String, HashFn> = BTreeMap::new();
        functions.insert(NONE.to_string(), identity);
        functions.insert(XXH3.to_string(), xxh3_hex);
        functions.insert(BLAKE3.to_string(), blake3_hex);
        Self { functions }
    }

    /// Add a named function. Existing names, built-ins included, cannot be
    /// replaced since ACLs already persisted under that name would stop
    /// matching. Names must be non-empty and free of ACL separators.
    pub fn register(&mut self, name: impl Into<String>, function: HashFn) -> Result<()> {
        let name = name.into();
        if name.is_empty() || name.contains(RESERVED) {
            return Err(AclError::InvalidHashAlgorithmName(name));
        }
        if self.functions.contains_key(&name) {
            return Err(AclError::DuplicateHashAlgorithm(name));
        }
        self.functions.insert(name, function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<HashFn> {
        self.functions
            .get(name)
            .copied()
            .ok_or_else(|| AclError::UnsupportedHashAlgorithm(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn hash(&self, name: &str, input: &str) -> Result<String> {
        Ok(self.get(name)?(input))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|k| k.as_str())
    }
}

impl Default for HashRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

static GLOBAL: Lazy<RwLock<HashRegistry>> =
    Lazy::new(|| RwLock::new(HashRegistry::with_builtins()));

/// Register a hash function process-wide. Call during startup, before any
/// ACL naming it is constructed or parsed.
pub fn register_hash(name: impl Into<String>, function: HashFn) -> Result<()> {
    GLOBAL.write().register(name, function)
}

/// Look up a function in the process-wide registry.
pub fn resolve(name: &str) -> Result<HashFn> {
    GLOBAL.read().get(name)
}

/// Hash `input` with the named process-wide function.
pub fn hash(name: &str, input: &str) -> Result<String> {
    Ok(resolve(name)?(input))
}

/// Names currently known to the process-wide registry.
pub fn registered_names() -> Vec<String> {
    GLOBAL.read().names().map(str::to_string).collect()
}
