//! Deterministic demo data for the dev server and tests.

use chrono::{DateTime, TimeZone, Utc};

use stocktake_core::{BatchId, InventTransId, ItemId, JournalId, WarehouseId, WmsLocationId};
use stocktake_inventory::{
    Batch, BackendResult, CountingJournal, InventLocation, Item, JournalLine, OnHand, WmsLocation,
};

use super::in_memory::{COUNTING_JOURNAL_NAME, InMemoryErp};

pub const DEMO_SITE: &str = "S1";
pub const DEMO_JOURNAL: &str = "J100";

const WAREHOUSES: [(&str, &str); 3] = [
    ("WH001", "Main warehouse"),
    ("WH002", "Overflow warehouse"),
    ("WH003", "Returns"),
];

const BINS: [&str; 3] = ["A-01", "A-02", "B-01"];

/// (item id, product name, unit, batch)
const ITEMS: [(&str, &str, &str, &str); 4] = [
    ("ITEM-1000", "Hex bolt M8", "pcs", "B-2024-01"),
    ("ITEM-1001", "Washer 8mm", "pcs", "B-2024-02"),
    ("ITEM-2000", "Hydraulic oil 5L", "can", "B-2023-11"),
    ("ITEM-3000", "Safety gloves", "pair", ""),
];

fn epoch_day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 8, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// A backend holding a small, consistent data set and journal `J100`
/// (unlocked, one pending line per on-hand row of `WH001`).
pub fn demo(session_id: i64) -> InMemoryErp {
    let erp = InMemoryErp::new(session_id);
    if let Err(e) = populate(&erp) {
        tracing::error!(error = %e, "failed to seed demo data");
    }
    erp
}

fn populate(erp: &InMemoryErp) -> BackendResult<()> {
    let invalid = |e: stocktake_core::DomainError| stocktake_inventory::BackendError::rejected(e.to_string());

    for (id, name) in WAREHOUSES {
        erp.insert_invent_location(InventLocation {
            invent_location_id: id.to_string(),
            invent_site_id: DEMO_SITE.to_string(),
            name: name.to_string(),
        })?;
        for (n, bin) in BINS.iter().enumerate() {
            erp.insert_wms_location(WmsLocation {
                wms_location_id: WmsLocationId::new(*bin).map_err(invalid)?,
                invent_location_id: WarehouseId::new(id).map_err(invalid)?,
                location_type: n as i32,
                max_pallet_count: 4,
                max_volume: 2.4,
                max_weight: 1000.0,
            })?;
        }
    }

    for (n, (item_id, name, unit, batch)) in ITEMS.into_iter().enumerate() {
        let id = ItemId::new(item_id).map_err(invalid)?;
        erp.insert_item(Item {
            item_id: id.clone(),
            description: name.to_string(),
            product_name: name.to_string(),
            search_name: name.to_uppercase(),
            image: String::new(),
            product_type: 1,
            production_type: 0,
            tracking_dimension_group_name: if batch.is_empty() { "None" } else { "Batch" }.to_string(),
        })?;
        if !batch.is_empty() {
            erp.insert_batch(Batch {
                item_id: id.clone(),
                invent_batch_id: BatchId::new(batch).map_err(invalid)?,
                prod_date: Some(epoch_day(1)),
                exp_date: Some(epoch_day(28)),
            })?;
        }

        for (w, (warehouse, _)) in WAREHOUSES.iter().enumerate().take(2) {
            let qty = (10 * (n + 1) + w) as f64;
            erp.insert_on_hand(OnHand {
                item_id: id.clone(),
                unit_id: unit.to_string(),
                product_name: name.to_string(),
                search_name: name.to_uppercase(),
                invent_site_id: DEMO_SITE.to_string(),
                invent_location_id: warehouse.to_string(),
                wms_location_id: BINS[n % BINS.len()].to_string(),
                invent_batch_id: batch.to_string(),
                invent_serial_id: String::new(),
                posted_qty: qty,
                registered: 0.0,
                picked: 0.0,
                deducted: 0.0,
                reserv_physical: 0.0,
                reserv_ordered: 0.0,
                avail_physical: qty,
                physical_invent: qty,
                ordered_sum: 0.0,
                storage_dimension_group_name: "SiteWHLoc".to_string(),
                tracking_dimension_group_name: if batch.is_empty() { "None" } else { "Batch" }.to_string(),
            })?;
        }
    }

    let journal_id = JournalId::new(DEMO_JOURNAL).map_err(invalid)?;
    erp.insert_journal(CountingJournal {
        journal_id: journal_id.clone(),
        journal_name_id: COUNTING_JOURNAL_NAME.to_string(),
        description: "Monthly count WH001".to_string(),
        invent_site_id: DEMO_SITE.to_string(),
        invent_location_id: "WH001".to_string(),
        wms_location_id: String::new(),
        num_of_lines: 0,
        posted: false,
        posted_user_id: String::new(),
        created_by: "axservices".to_string(),
        created_date_time: epoch_day(2),
        modified_by: "axservices".to_string(),
        modified_date_time: epoch_day(2),
        block_user_id: String::new(),
        journal_session_id: String::new(),
    })?;

    for (n, (item_id, name, unit, batch)) in ITEMS.into_iter().enumerate() {
        let on_hand = (10 * (n + 1)) as f64;
        erp.insert_line(JournalLine {
            invent_trans_id: InventTransId::new(format!("{DEMO_JOURNAL}_L{:03}", n + 1))
                .map_err(invalid)?,
            journal_id: journal_id.clone(),
            item_id: ItemId::new(item_id).map_err(invalid)?,
            item_name: name.to_string(),
            trans_date: epoch_day(2),
            invent_site_id: DEMO_SITE.to_string(),
            invent_location_id: "WH001".to_string(),
            wms_location_id: BINS[n % BINS.len()].to_string(),
            invent_batch_id: batch.to_string(),
            invent_on_hand: on_hand,
            counted: 0.0,
            qty: 0.0,
            unit_id: unit.to_string(),
            created_by: "axservices".to_string(),
            created_date_time: epoch_day(2),
            modified_by: String::new(),
            modified_date_time: None,
        })?;
    }

    Ok(())
}
