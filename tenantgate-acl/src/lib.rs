//! tenantgate-acl - the access control kernel
//!
//! Every connector that persists data for users, teams or agents gates its
//! operations through this crate:
//!
//! ```text
//!   AccessCandidate ──► AccessRequest ──► authorize(request, acl) ──► Granted
//!                                              │                        │
//!                                         AccessDenied           backend I/O
//! ```
//!
//! - [`hash`]: named, unsalted owner-id hashes (`none`, `xxh3`, `blake3`)
//! - [`Acl`]: role -> hashed owner -> levels, exact and fail-closed checks
//! - [`codec`]: the compact `h:xxh3|t:<owner>/rw` string form
//! - [`enforce`]: [`authorize`] and the [`Granted`] proof
//!
//! # Example
//!
//! ```rust
//! use tenantgate_acl::{authorize, Acl};
//! use tenantgate_types::{AccessCandidate, AccessLevel, Role};
//!
//! let mut acl = Acl::new();
//! acl.add_access(Role::Team, "team1", &[AccessLevel::Read, AccessLevel::Write]);
//!
//! let team = AccessCandidate::team("team1");
//! assert!(acl.check_exact_access(&team.write_request("report.pdf")));
//! let agent = AccessCandidate::agent("team1");
//! assert!(authorize(&agent.write_request("report.pdf"), acl.clone()).is_err());
//!
//! let restored: Acl = acl.serialized_acl().parse().unwrap();
//! assert_eq!(restored, acl);
//! ```

pub mod acl;
pub mod codec;
pub mod enforce;
pub mod error;
pub mod hash;

pub use acl::{Acl, AclData, AclEntries, DEFAULT_HASH_ALGORITHM};
pub use enforce::{authorize, AccessDenied, Granted};
pub use error::{AclError, Result};
pub use hash::{HashFn, HashRegistry};
pub use tenantgate_types::{AccessCandidate, AccessLevel, AccessRequest, Role};
