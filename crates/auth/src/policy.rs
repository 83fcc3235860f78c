//! Named authorization policies and the engine that evaluates them.
//!
//! Every endpoint is tagged with one or more [`Policy`] values; the HTTP layer
//! asks [`PolicyEngine::evaluate_all`] before anything else runs for that
//! endpoint. The engine is pure configuration plus calls into
//! [`crate::authorize`] and the warehouse resolver.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::warehouse::has_access;
use crate::{AuthzError, ClaimSet, Role, RoleRequirement, WarehouseAccessResolver, authorize};

/// Default identity-provider client whose nested roles are consulted.
pub const DEFAULT_CLIENT_ID: &str = "inventory_management_system";

/// Closed set of policies endpoints can require.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Policy {
    ViewCountingJournals,
    CreateCountingJournals,
    ManageCountingJournals,
    ViewCountingJournalLines,
    CreateCountingJournalLines,
    EditCountingJournalLines,
    DeleteCountingJournalLines,
    LockUnlockJournals,
    ViewItems,
    ViewOnHand,
    ViewLocations,
    WarehouseAccess,
    RequireAdminRole,
}

impl Policy {
    pub const ALL: [Policy; 13] = [
        Policy::ViewCountingJournals,
        Policy::CreateCountingJournals,
        Policy::ManageCountingJournals,
        Policy::ViewCountingJournalLines,
        Policy::CreateCountingJournalLines,
        Policy::EditCountingJournalLines,
        Policy::DeleteCountingJournalLines,
        Policy::LockUnlockJournals,
        Policy::ViewItems,
        Policy::ViewOnHand,
        Policy::ViewLocations,
        Policy::WarehouseAccess,
        Policy::RequireAdminRole,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Policy::ViewCountingJournals => "ViewCountingJournals",
            Policy::CreateCountingJournals => "CreateCountingJournals",
            Policy::ManageCountingJournals => "ManageCountingJournals",
            Policy::ViewCountingJournalLines => "ViewCountingJournalLines",
            Policy::CreateCountingJournalLines => "CreateCountingJournalLines",
            Policy::EditCountingJournalLines => "EditCountingJournalLines",
            Policy::DeleteCountingJournalLines => "DeleteCountingJournalLines",
            Policy::LockUnlockJournals => "LockUnlockJournals",
            Policy::ViewItems => "ViewItems",
            Policy::ViewOnHand => "ViewOnHand",
            Policy::ViewLocations => "ViewLocations",
            Policy::WarehouseAccess => "WarehouseAccess",
            Policy::RequireAdminRole => "RequireAdminRole",
        }
    }

    /// The rule a policy maps to by default.
    ///
    /// Exhaustive: a new policy does not compile until it picks a rule.
    pub fn default_rule(self, client_id: &str) -> PolicyRule {
        let staff = || RoleRequirement::new(client_id, [Role::ADMIN, Role::WAREHOUSE]);
        match self {
            Policy::ViewCountingJournals
            | Policy::CreateCountingJournals
            | Policy::ManageCountingJournals
            | Policy::ViewCountingJournalLines
            | Policy::CreateCountingJournalLines
            | Policy::EditCountingJournalLines
            | Policy::DeleteCountingJournalLines
            | Policy::LockUnlockJournals
            | Policy::ViewItems
            | Policy::ViewOnHand
            | Policy::ViewLocations => PolicyRule::Roles(staff()),
            Policy::WarehouseAccess => PolicyRule::WarehouseAccess,
            Policy::RequireAdminRole => {
                PolicyRule::Roles(RoleRequirement::new(client_id, [Role::ADMIN]))
            }
        }
    }
}

impl core::fmt::Display for Policy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| AuthzError::UnknownPolicy(s.to_string()))
    }
}

/// What a policy checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRule {
    Roles(RoleRequirement),
    /// Target warehouse (if the request names one) must be granted.
    WarehouseAccess,
}

/// Per-request inputs to policy evaluation.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub claims: &'a ClaimSet,
    /// Warehouse named by the request (route or query), if any.
    pub target_warehouse: Option<&'a str>,
}

impl<'a> PolicyContext<'a> {
    pub fn new(claims: &'a ClaimSet) -> Self {
        Self {
            claims,
            target_warehouse: None,
        }
    }

    pub fn with_target_warehouse(mut self, warehouse_id: Option<&'a str>) -> Self {
        self.target_warehouse = warehouse_id.filter(|w| !w.trim().is_empty());
        self
    }
}

/// Static policy table, evaluated per endpoint.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    client_id: String,
    rules: BTreeMap<Policy, PolicyRule>,
    warehouses: WarehouseAccessResolver,
}

impl PolicyEngine {
    pub fn new(client_id: impl Into<String>, warehouses: WarehouseAccessResolver) -> Self {
        let client_id = client_id.into();
        let rules = Policy::ALL
            .into_iter()
            .map(|policy| (policy, policy.default_rule(&client_id)))
            .collect();

        Self {
            client_id,
            rules,
            warehouses,
        }
    }

    /// Replace the rule of one policy.
    pub fn with_rule(mut self, policy: Policy, rule: PolicyRule) -> Self {
        self.rules.insert(policy, rule);
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn warehouses(&self) -> &WarehouseAccessResolver {
        &self.warehouses
    }

    pub fn rule(&self, policy: Policy) -> Option<&PolicyRule> {
        self.rules.get(&policy)
    }

    /// Evaluate a single policy. Denial carries the policy for logging only.
    pub fn evaluate(&self, policy: Policy, ctx: &PolicyContext<'_>) -> Result<(), AuthzError> {
        let granted = match self.rules.get(&policy) {
            Some(PolicyRule::Roles(requirement)) => authorize(ctx.claims, requirement),
            Some(PolicyRule::WarehouseAccess) => match ctx.target_warehouse {
                // Nothing to scope: the endpoint deals with it.
                None => true,
                Some(warehouse_id) => {
                    has_access(&self.warehouses.resolve(ctx.claims), warehouse_id)
                }
            },
            None => false,
        };

        if granted {
            tracing::debug!(policy = %policy, "policy satisfied");
            Ok(())
        } else {
            tracing::warn!(
                policy = %policy,
                target_warehouse = ctx.target_warehouse,
                "policy denied"
            );
            Err(AuthzError::Forbidden(policy))
        }
    }

    /// Evaluate every policy in order; the first denial wins.
    pub fn evaluate_all(&self, policies: &[Policy], ctx: &PolicyContext<'_>) -> Result<(), AuthzError> {
        for &policy in policies {
            self.evaluate(policy, ctx)?;
        }
        Ok(())
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_ID, WarehouseAccessResolver::default())
    }
}
