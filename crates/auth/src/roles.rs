use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::claims::fold;

/// Role identifier as issued by the identity provider.
///
/// Roles are opaque strings compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Full access, including warehouse-group administration.
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    /// Counting staff.
    pub const WAREHOUSE: Role = Role(Cow::Borrowed("warehouse"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &str) -> bool {
        fold(&self.0) == fold(other)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// "Any of these roles, for this client": the unit a policy is built from.
///
/// Acceptable roles are kept in registration order, deduplicated
/// case-insensitively. A requirement with no roles is representable but can
/// never be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequirement {
    client_id: String,
    acceptable_roles: Vec<Role>,
}

impl RoleRequirement {
    pub fn new<I>(client_id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = Role>,
    {
        let mut acceptable_roles: Vec<Role> = Vec::new();
        for role in roles {
            if role.as_str().trim().is_empty() {
                continue;
            }
            if !acceptable_roles.iter().any(|r| r.matches(role.as_str())) {
                acceptable_roles.push(role);
            }
        }

        Self {
            client_id: client_id.into(),
            acceptable_roles,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn acceptable_roles(&self) -> &[Role] {
        &self.acceptable_roles
    }

    pub fn is_satisfiable(&self) -> bool {
        !self.acceptable_roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirement_deduplicates_roles_in_order() {
        let req = RoleRequirement::new(
            "ims",
            [Role::WAREHOUSE, Role::new("Admin"), Role::ADMIN, Role::new(" ")],
        );
        let names: Vec<_> = req.acceptable_roles().iter().map(Role::as_str).collect();
        assert_eq!(names, vec!["warehouse", "Admin"]);
        assert!(req.is_satisfiable());
    }

    #[test]
    fn empty_requirement_is_not_satisfiable() {
        let req = RoleRequirement::new("ims", []);
        assert!(!req.is_satisfiable());
    }
}
