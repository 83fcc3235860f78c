//! Per-endpoint policy gate.
//!
//! Each route carries the policies it requires. The gate runs after
//! authentication and before the journal lock guard, so callers that are not
//! allowed to see an endpoint never learn anything about journal locks.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::Request,
    middleware::{Next, from_fn_with_state},
    response::Response,
    routing::MethodRouter,
};

use stocktake_auth::{Policy, PolicyContext, PolicyEngine};

use crate::app::errors;
use crate::context::PrincipalContext;
use crate::journal_lock::{LockGuardState, journal_lock_middleware};

/// Parameters naming the warehouse a request targets, in lookup order.
pub const TARGET_WAREHOUSE_PARAMS: [&str; 2] = ["warehouseId", "inventLocationId"];

#[derive(Clone)]
pub struct PolicyGate {
    engine: Arc<PolicyEngine>,
    policies: Arc<[Policy]>,
}

impl PolicyGate {
    pub fn new(engine: Arc<PolicyEngine>, policies: &[Policy]) -> Self {
        Self {
            engine,
            policies: policies.into(),
        }
    }
}

/// Warehouse the request targets: route parameters first, then the query
/// string; `warehouseId` before `inventLocationId` within each.
pub fn target_warehouse<'a>(
    route: &'a HashMap<String, String>,
    query: &'a HashMap<String, String>,
) -> Option<&'a str> {
    [route, query]
        .into_iter()
        .flat_map(|source| {
            TARGET_WAREHOUSE_PARAMS
                .iter()
                .filter_map(move |name| source.get(*name))
        })
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

pub async fn policy_gate(
    State(gate): State<PolicyGate>,
    route: Option<Path<HashMap<String, String>>>,
    query: Option<Query<HashMap<String, String>>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(principal) = req.extensions().get::<PrincipalContext>() else {
        return errors::unauthorized();
    };

    let route = route.map(|Path(p)| p).unwrap_or_default();
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let ctx = PolicyContext::new(principal.claims())
        .with_target_warehouse(target_warehouse(&route, &query));

    if let Err(e) = gate.engine.evaluate_all(&gate.policies, &ctx) {
        tracing::warn!(user = principal.username(), error = %e, "request denied");
        return errors::forbidden();
    }

    next.run(req).await
}

/// Builds the guarded method routers used by the route modules.
#[derive(Clone)]
pub struct RouteGuards {
    engine: Arc<PolicyEngine>,
    lock: LockGuardState,
    location_enforcement: bool,
}

impl RouteGuards {
    pub fn new(engine: Arc<PolicyEngine>, lock: LockGuardState, location_enforcement: bool) -> Self {
        Self {
            engine,
            lock,
            location_enforcement,
        }
    }

    /// Require every policy in `policies`.
    pub fn policy(&self, route: MethodRouter, policies: &[Policy]) -> MethodRouter {
        route.route_layer(from_fn_with_state(
            PolicyGate::new(self.engine.clone(), policies),
            policy_gate,
        ))
    }

    /// Like [`policy`](Self::policy), then the journal lock guard.
    pub fn journal(&self, route: MethodRouter, policies: &[Policy]) -> MethodRouter {
        // Layers added last run first: policies, then the lock guard.
        let route = route.route_layer(from_fn_with_state(self.lock.clone(), journal_lock_middleware));
        self.policy(route, policies)
    }

    /// Adds `WarehouseAccess` when location enforcement is on.
    pub fn warehouse_scoped(&self, route: MethodRouter, policy: Policy) -> MethodRouter {
        if self.location_enforcement {
            self.policy(route, &[policy, Policy::WarehouseAccess])
        } else {
            self.policy(route, &[policy])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn target_warehouse_lookup_order() {
        let route = map(&[("inventLocationId", "WH002")]);
        let query = map(&[("warehouseId", "WH003"), ("inventLocationId", "WH004")]);
        assert_eq!(target_warehouse(&route, &query), Some("WH002"));

        let route = map(&[("warehouseId", "WH001"), ("inventLocationId", "WH002")]);
        assert_eq!(target_warehouse(&route, &query), Some("WH001"));

        assert_eq!(target_warehouse(&HashMap::new(), &query), Some("WH003"));
        assert_eq!(
            target_warehouse(&HashMap::new(), &map(&[("inventLocationId", "WH004")])),
            Some("WH004")
        );
    }

    #[test]
    fn blank_values_do_not_name_a_target() {
        let route = map(&[("warehouseId", " ")]);
        let query = map(&[("inventLocationId", "WH004")]);
        assert_eq!(target_warehouse(&route, &query), Some("WH004"));
        assert_eq!(target_warehouse(&HashMap::new(), &HashMap::new()), None);
    }
}
