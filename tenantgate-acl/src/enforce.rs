//! Turning an ACL decision into a proof the backend can require
//!
//! [`authorize`] is the only way to obtain a [`Granted`]. Connector methods
//! that touch a backing store take `&Granted`, so a backend call cannot be
//! written without a successful check in front of it.

use crate::acl::Acl;
use tenantgate_types::{AccessCandidate, AccessRequest};
use thiserror::Error;
use tracing::{debug, warn};

/// The single authorization failure surfaced to callers.
///
/// Carries no detail about which part of the check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Access Denied")]
pub struct AccessDenied;

/// Proof that `request` passed `acl.check_exact_access`.
#[derive(Debug, Clone)]
pub struct Granted {
    request: AccessRequest,
    acl: Acl,
}

impl Granted {
    pub fn request(&self) -> &AccessRequest {
        &self.request
    }

    pub fn candidate(&self) -> &AccessCandidate {
        &self.request.candidate
    }

    pub fn resource_id(&self) -> &str {
        &self.request.resource_id
    }

    /// The ACL the decision was made against.
    pub fn acl(&self) -> &Acl {
        &self.acl
    }

    pub fn into_acl(self) -> Acl {
        self.acl
    }
}

/// Check `request` against `acl`, consuming the ACL into the grant.
pub fn authorize(request: &AccessRequest, acl: Acl) -> Result<Granted, AccessDenied> {
    if acl.check_exact_access(request) {
        debug!(
            request_id = %request.id,
            candidate = %request.candidate,
            resource = %request.resource_id,
            levels = ?request.levels,
            "access granted"
        );
        Ok(Granted {
            request: request.clone(),
            acl,
        })
    } else {
        warn!(
            request_id = %request.id,
            candidate = %request.candidate,
            resource = %request.resource_id,
            levels = ?request.levels,
            "access denied"
        );
        Err(AccessDenied)
    }
}
