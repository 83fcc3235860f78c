use stocktake_auth::{ClaimSet, Identity};

/// Principal context for a request (authenticated identity + normalized
/// claims).
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    identity: Identity,
    claims: ClaimSet,
}

impl PrincipalContext {
    pub fn new(identity: Identity, claims: ClaimSet) -> Self {
        Self { identity, claims }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// ERP actor for writes made on behalf of this caller.
    pub fn username(&self) -> &str {
        &self.identity.username
    }

    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }
}
