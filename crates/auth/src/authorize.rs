use thiserror::Error;

use crate::{ClaimSet, Policy, RoleRequirement};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The caller-facing message stays generic; the policy is for logs only.
    #[error("forbidden: policy '{0}' not satisfied")]
    Forbidden(Policy),

    #[error("unknown policy '{0}'")]
    UnknownPolicy(String),
}

/// Which claim source satisfied a [`RoleRequirement`], if any.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RoleDecision {
    /// Matched the realm-wide `roles` claim.
    FlatRole,
    /// Matched `resource_access[client].roles`.
    ClientRole,
    Denied,
}

impl RoleDecision {
    pub fn is_granted(self) -> bool {
        !matches!(self, RoleDecision::Denied)
    }
}

/// Evaluate a role requirement against normalized claims.
///
/// Ordered and short-circuiting: flat roles first, then the roles nested
/// under the requirement's client id. A miss is a normal outcome, not an
/// error.
///
/// - No IO
/// - No panics
pub fn evaluate(claims: &ClaimSet, requirement: &RoleRequirement) -> RoleDecision {
    let required = requirement.acceptable_roles();

    tracing::debug!(
        client_id = requirement.client_id(),
        required = ?required.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        flat_roles = ?claims.flat_roles().collect::<Vec<_>>(),
        "checking role requirement"
    );

    if required.is_empty() {
        tracing::warn!(
            client_id = requirement.client_id(),
            "role requirement has no acceptable roles; denying"
        );
        return RoleDecision::Denied;
    }

    if required.iter().any(|role| claims.has_flat_role(role.as_str())) {
        tracing::debug!("role requirement satisfied by flat roles");
        return RoleDecision::FlatRole;
    }

    if let Some(client_roles) = claims.client_roles(requirement.client_id()) {
        tracing::debug!(
            client_id = requirement.client_id(),
            client_roles = ?client_roles,
            "checking client roles"
        );
        if required
            .iter()
            .any(|role| claims.has_client_role(requirement.client_id(), role.as_str()))
        {
            tracing::debug!("role requirement satisfied by client roles");
            return RoleDecision::ClientRole;
        }
    }

    tracing::warn!(
        client_id = requirement.client_id(),
        "role requirement not satisfied"
    );
    RoleDecision::Denied
}

/// Boolean form of [`evaluate`].
pub fn authorize(claims: &ClaimSet, requirement: &RoleRequirement) -> bool {
    evaluate(claims, requirement).is_granted()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::{RawClaims, Role};

    const CLIENT: &str = "inventory_management_system";

    fn counting_requirement() -> RoleRequirement {
        RoleRequirement::new(CLIENT, [Role::ADMIN, Role::WAREHOUSE])
    }

    fn raw(value: serde_json::Value) -> RawClaims {
        value.as_object().cloned().unwrap_or_default()
    }

    /// Produce an arbitrary casing of `s`.
    fn casing_of(s: &'static str) -> impl Strategy<Value = String> {
        proptest::collection::vec(any::<bool>(), s.len()).prop_map(move |upper| {
            s.chars()
                .zip(upper)
                .map(|(c, u)| if u { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn flat_role_in_any_casing_grants_regardless_of_nested_content(
            role in prop_oneof![casing_of("admin"), casing_of("warehouse")],
            nested in proptest::option::of(proptest::collection::vec("[a-z-]{1,12}", 0..4)),
            other_client in "[a-z_]{1,12}",
            garbage_nested in any::<bool>(),
        ) {
            let resource_access = if garbage_nested {
                json!("{definitely not json")
            } else {
                match nested {
                    Some(roles) => json!({ other_client: { "roles": roles } }),
                    None => json!(null),
                }
            };
            let claims = ClaimSet::from_claims(&raw(json!({
                "roles": [role],
                "resource_access": resource_access,
            })));
            prop_assert_eq!(evaluate(&claims, &counting_requirement()), RoleDecision::FlatRole);
        }

        #[test]
        fn nested_role_only_counts_under_the_required_client(
            role in prop_oneof![casing_of("admin"), casing_of("warehouse")],
            other_client in "[a-z]{1,12}",
        ) {
            prop_assume!(other_client != CLIENT);

            let right = ClaimSet::from_claims(&raw(json!({
                "roles": ["offline_access"],
                "resource_access": { CLIENT: { "roles": [role.clone()] } },
            })));
            prop_assert_eq!(evaluate(&right, &counting_requirement()), RoleDecision::ClientRole);

            let wrong = ClaimSet::from_claims(&raw(json!({
                "roles": ["offline_access"],
                "resource_access": { other_client: { "roles": [role] } },
            })));
            prop_assert!(!authorize(&wrong, &counting_requirement()));
        }
    }

    #[test]
    fn malformed_nested_roles_degrade_to_flat_only() {
        let claims = ClaimSet::from_claims(&raw(json!({
            "roles": ["uma_authorization"],
            "resource_access": "{\"inventory_management_system\": {\"roles\": [\"admin\"",
        })));
        assert_eq!(evaluate(&claims, &counting_requirement()), RoleDecision::Denied);

        let claims = ClaimSet::from_claims(&raw(json!({
            "roles": ["warehouse"],
            "resource_access": 42,
        })));
        assert_eq!(evaluate(&claims, &counting_requirement()), RoleDecision::FlatRole);
    }

    #[test]
    fn empty_requirement_never_grants() {
        let claims = ClaimSet::builder()
            .flat_role("admin")
            .client_role(CLIENT, "admin")
            .build();
        assert!(!authorize(&claims, &RoleRequirement::new(CLIENT, [])));
    }

    #[test]
    fn admin_only_requirement_rejects_warehouse_staff() {
        let claims = ClaimSet::builder().flat_role("warehouse").build();
        let admin_only = RoleRequirement::new(CLIENT, [Role::ADMIN]);
        assert!(!authorize(&claims, &admin_only));
    }

    #[test]
    fn no_claims_at_all_is_denied() {
        assert_eq!(
            evaluate(&ClaimSet::default(), &counting_requirement()),
            RoleDecision::Denied
        );
    }
}
