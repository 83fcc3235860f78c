use std::sync::Arc;

use axum::response::Response;

use stocktake_auth::{PolicyEngine, WarehouseSet, filter_locations, has_location_access};
use stocktake_inventory::InventoryBackend;

use crate::app::errors;
use crate::context::PrincipalContext;

/// Shared handler dependencies.
pub struct AppServices {
    pub backend: Arc<dyn InventoryBackend>,
    pub policies: Arc<PolicyEngine>,
    /// Apply warehouse checks to handlers that receive an `inventLocationId`.
    pub location_enforcement: bool,
}

impl AppServices {
    pub fn new(
        backend: Arc<dyn InventoryBackend>,
        policies: Arc<PolicyEngine>,
        location_enforcement: bool,
    ) -> Self {
        Self {
            backend,
            policies,
            location_enforcement,
        }
    }

    pub fn warehouses(&self, principal: &PrincipalContext) -> WarehouseSet {
        self.policies.warehouses().resolve(principal.claims())
    }

    /// `Err(403)` when enforcement is on and the caller may not use
    /// `warehouse_id`. Blank ids and callers without warehouse groups pass.
    pub fn ensure_location_access(
        &self,
        principal: &PrincipalContext,
        warehouse_id: Option<&str>,
    ) -> Result<(), Response> {
        let Some(warehouse_id) = warehouse_id.map(str::trim).filter(|w| !w.is_empty()) else {
            return Ok(());
        };
        if !self.location_enforcement {
            return Ok(());
        }

        if has_location_access(&self.warehouses(principal), warehouse_id) {
            Ok(())
        } else {
            tracing::warn!(
                user = principal.username(),
                warehouse_id,
                "location access denied"
            );
            Err(errors::forbidden())
        }
    }

    /// Drop entries outside the caller's warehouses when enforcement is on.
    pub fn visible_locations<T, F>(&self, principal: &PrincipalContext, items: Vec<T>, warehouse_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &str,
    {
        if !self.location_enforcement {
            return items;
        }
        filter_locations(&self.warehouses(principal), items, warehouse_of)
    }
}
