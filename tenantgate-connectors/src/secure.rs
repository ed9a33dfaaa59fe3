//! The enforcement contract every resource connector implements
//!
//! A connector supplies the ACL for a resource; [`SecureConnector::enforce`]
//! checks the request against it and hands back a [`Granted`] proof.
//! Protected operations take `&Granted` and [`SecureConnector::verify`] it
//! against their own ACL before touching the backend, so a grant decided
//! against any other ACL is refused.
//!
//! Callers never build requests themselves. They bind a candidate to a
//! connector and get a [`Requester`], whose methods pick the right levels:
//!
//! ```text
//! storage.user("u1").write("notes.md", data)
//!     └─► AccessRequest { write, "notes.md" } ─► enforce ─► write(&granted, data)
//! ```

use crate::error::Result;
use crate::resource_uri;
use async_trait::async_trait;
use tenantgate_acl::{authorize, AccessDenied, Acl, Granted};
use tenantgate_types::{AccessCandidate, AccessLevel, AccessRequest};
use tracing::warn;

#[async_trait]
pub trait SecureConnector: Send + Sync {
    /// Registered name of this implementation (e.g. "LocalStorage")
    fn name(&self) -> &str;

    /// Resolve the ACL guarding `resource_id`.
    ///
    /// Existing resources return their persisted ACL. Resources that do not
    /// exist yet return an ACL granting `candidate` ownership. Legacy
    /// resources return a synthesized ACL marked migrated.
    async fn get_resource_acl(
        &self,
        resource_id: &str,
        candidate: &AccessCandidate,
    ) -> Result<Acl>;

    /// Load the resource ACL and check `request` against it.
    async fn enforce(&self, request: &AccessRequest) -> Result<Granted> {
        let acl = self
            .get_resource_acl(&request.resource_id, &request.candidate)
            .await?;
        Ok(authorize(request, acl)?)
    }

    /// Confirm `grant` covers `level` and was decided against the ACL this
    /// connector currently holds for the granted resource.
    ///
    /// Every protected operation calls this before any backend I/O.
    async fn verify(&self, grant: &Granted, level: AccessLevel) -> Result<()> {
        require_level(grant, level)?;
        let current = self
            .get_resource_acl(grant.resource_id(), grant.candidate())
            .await?;
        if &current != grant.acl() {
            warn!(
                request_id = %grant.request().id,
                connector = self.name(),
                resource = grant.resource_id(),
                "grant does not match the resource ACL"
            );
            return Err(AccessDenied.into());
        }
        Ok(())
    }
}

/// Reject a grant issued for weaker levels than `level`.
///
/// Part of [`SecureConnector::verify`], so a read grant can never be
/// replayed as a write.
pub fn require_level(grant: &Granted, level: AccessLevel) -> Result<()> {
    if grant.request().has_level(level) {
        Ok(())
    } else {
        Err(AccessDenied.into())
    }
}

/// A connector bound to one candidate.
///
/// Category-specific operations live in `impl Requester<'_, dyn ...>` blocks
/// next to each connector trait.
pub struct Requester<'a, C: ?Sized> {
    pub(crate) connector: &'a C,
    candidate: AccessCandidate,
    team_id: Option<String>,
}

impl<'a, C: ?Sized> Requester<'a, C> {
    pub fn new(connector: &'a C, candidate: AccessCandidate) -> Self {
        Self {
            connector,
            candidate,
            team_id: None,
        }
    }

    /// Treat every resource touched through this requester as owned by
    /// `team_id`. Team URIs override this per call.
    pub fn in_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    pub fn candidate(&self) -> &AccessCandidate {
        &self.candidate
    }

    pub fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    /// Build the request for `levels` on `resource`, which may be a plain id
    /// or a `scheme://<team>.team/<path>` URI.
    pub fn request_for(&self, resource: &str, levels: &[AccessLevel]) -> Result<AccessRequest> {
        let (resource_id, uri_team) = resource_uri::resolve(resource)?;
        let mut request = self.candidate.request();
        for level in levels {
            request = request.add_level(resource_id.clone(), *level);
        }
        if let Some(team) = uri_team.or_else(|| self.team_id.clone()) {
            request = request.res_team(team);
        }
        Ok(request)
    }
}
