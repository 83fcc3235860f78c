//! `stocktake-auth`: pure authentication/authorization boundary.
//!
//! No HTTP and no ERP transport: everything here operates on a normalized
//! [`ClaimSet`] and on narrow collaborator traits.

pub mod authorize;
pub mod claims;
pub mod lock;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod token;
pub mod warehouse;

pub use authorize::{AuthzError, RoleDecision, authorize, evaluate};
pub use claims::{ClaimSet, ClaimSetBuilder, RawClaims};
pub use lock::{
    JournalLockGuard, JournalLockSource, JournalLockState, LockConflict, LockDecision,
    LockSourceError, decide,
};
pub use policy::{DEFAULT_CLIENT_ID, Policy, PolicyContext, PolicyEngine, PolicyRule};
pub use principal::{DEFAULT_ERP_USER, Identity};
pub use roles::{Role, RoleRequirement};
pub use token::{JwtValidator, StaticKeyValidator, TokenError, TokenSettings};
pub use warehouse::{
    WarehouseAccessResolver, WarehouseSet, filter_locations, has_access, has_location_access,
};
