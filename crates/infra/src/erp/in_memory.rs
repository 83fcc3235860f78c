use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use stocktake_core::{
    BatchId, InventTransId, ItemId, JournalId, PageRequest, PagedList, SiteId, WarehouseId,
    WmsLocationId,
};
use stocktake_inventory::{
    BackendError, BackendResult, Batch, CountingBackend, CountingJournal, CreateCountingJournal,
    CreateJournalLine, InventLocation, Item, ItemBackend, JournalLine, JournalSummary,
    LineDimensions, LineFilter, LocationBackend, OnHand, OnHandDimensions, OnHandFilter,
    UpdateJournalLine, WmsLocation,
};

/// Journal name used for counting journals created through the gateway.
pub const COUNTING_JOURNAL_NAME: &str = "Count";

#[derive(Debug, Default)]
struct ErpState {
    journals: BTreeMap<JournalId, CountingJournal>,
    lines: Vec<JournalLine>,
    items: Vec<Item>,
    batches: Vec<Batch>,
    on_hand: Vec<OnHand>,
    invent_locations: Vec<InventLocation>,
    wms_locations: Vec<WmsLocation>,
    next_journal: u64,
    next_trans: u64,
}

/// In-memory stand-in for the ERP.
///
/// Intended for tests/dev. State sits behind a `std::sync::RwLock`; no guard
/// is ever held across an `.await`.
#[derive(Debug)]
pub struct InMemoryErp {
    state: RwLock<ErpState>,
    session_id: AtomicI64,
    available: AtomicBool,
}

impl Default for InMemoryErp {
    fn default() -> Self {
        Self::new(1)
    }
}

impl InMemoryErp {
    pub fn new(session_id: i64) -> Self {
        Self {
            state: RwLock::new(ErpState {
                next_journal: 1,
                next_trans: 1,
                ..ErpState::default()
            }),
            session_id: AtomicI64::new(session_id),
            available: AtomicBool::new(true),
        }
    }

    /// Change the session id reported for the gateway's connection.
    pub fn set_session_id(&self, session_id: i64) {
        self.session_id.store(session_id, Ordering::SeqCst);
    }

    /// Simulate an ERP outage: every call fails with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn insert_journal(&self, journal: CountingJournal) -> BackendResult<()> {
        self.write(|state| {
            state.journals.insert(journal.journal_id.clone(), journal);
            Ok(())
        })
    }

    pub fn insert_line(&self, line: JournalLine) -> BackendResult<()> {
        self.write(|state| {
            if let Some(journal) = state.journals.get_mut(&line.journal_id) {
                journal.num_of_lines += 1;
            }
            state.lines.push(line);
            Ok(())
        })
    }

    pub fn insert_item(&self, item: Item) -> BackendResult<()> {
        self.write(|state| {
            state.items.push(item);
            Ok(())
        })
    }

    pub fn insert_batch(&self, batch: Batch) -> BackendResult<()> {
        self.write(|state| {
            state.batches.push(batch);
            Ok(())
        })
    }

    pub fn insert_on_hand(&self, row: OnHand) -> BackendResult<()> {
        self.write(|state| {
            state.on_hand.push(row);
            Ok(())
        })
    }

    pub fn insert_invent_location(&self, location: InventLocation) -> BackendResult<()> {
        self.write(|state| {
            state.invent_locations.push(location);
            Ok(())
        })
    }

    pub fn insert_wms_location(&self, location: WmsLocation) -> BackendResult<()> {
        self.write(|state| {
            state.wms_locations.push(location);
            Ok(())
        })
    }

    /// Mark a journal as being edited by some ERP session.
    pub fn lock_journal_as(
        &self,
        journal_id: &JournalId,
        session_id: impl Into<String>,
        user: impl Into<String>,
    ) -> BackendResult<()> {
        let (session_id, user) = (session_id.into(), user.into());
        self.write(|state| {
            let journal = journal_mut(state, journal_id)?;
            journal.journal_session_id = session_id;
            journal.block_user_id = user;
            Ok(())
        })
    }

    fn ensure_available(&self) -> BackendResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::unavailable("No response from service"))
        }
    }

    fn read<T>(&self, f: impl FnOnce(&ErpState) -> BackendResult<T>) -> BackendResult<T> {
        self.ensure_available()?;
        let state = self
            .state
            .read()
            .map_err(|_| BackendError::unavailable("state lock poisoned"))?;
        f(&state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut ErpState) -> BackendResult<T>) -> BackendResult<T> {
        self.ensure_available()?;
        let mut state = self
            .state
            .write()
            .map_err(|_| BackendError::unavailable("state lock poisoned"))?;
        f(&mut state)
    }

    fn session(&self) -> i64 {
        self.session_id.load(Ordering::SeqCst)
    }
}

fn journal_mut<'a>(
    state: &'a mut ErpState,
    journal_id: &JournalId,
) -> BackendResult<&'a mut CountingJournal> {
    state
        .journals
        .get_mut(journal_id)
        .ok_or_else(|| BackendError::not_found(format!("journal {journal_id}")))
}

/// Writes need an unposted journal the current session may edit.
fn writable_journal<'a>(
    state: &'a mut ErpState,
    journal_id: &JournalId,
    session_id: i64,
) -> BackendResult<&'a mut CountingJournal> {
    let journal = journal_mut(state, journal_id)?;
    if journal.posted {
        return Err(BackendError::rejected(format!("Journal {journal_id} is already posted.")));
    }
    if journal.is_locked() && journal.journal_session_id.trim() != session_id.to_string() {
        return Err(BackendError::rejected(format!(
            "Journal {journal_id} is blocked by {}.",
            journal.block_user_id
        )));
    }
    Ok(journal)
}

fn on_hand_quantity(state: &ErpState, dims: &LineDimensions) -> f64 {
    state
        .on_hand
        .iter()
        .filter(|row| {
            row.item_id.matches(&dims.item_id)
                && row.invent_location_id.eq_ignore_ascii_case(&dims.invent_location_id)
                && row.wms_location_id.eq_ignore_ascii_case(&dims.wms_location_id)
                && row.invent_batch_id.eq_ignore_ascii_case(&dims.invent_batch_id)
        })
        .map(|row| row.physical_invent)
        .sum()
}

fn search_opt(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn next_trans_id(state: &mut ErpState, journal_id: &JournalId) -> BackendResult<InventTransId> {
    let n = state.next_trans;
    state.next_trans += 1;
    InventTransId::new(format!("{journal_id}_{n:04}"))
        .map_err(|e| BackendError::rejected(e.to_string()))
}

#[async_trait]
impl CountingBackend for InMemoryErp {
    async fn create_journal(
        &self,
        request: CreateCountingJournal,
        actor: &str,
    ) -> BackendResult<CountingJournal> {
        self.write(|state| {
            let n = state.next_journal;
            state.next_journal += 1;
            let journal_id = JournalId::new(format!("CJ{n:06}"))
                .map_err(|e| BackendError::rejected(e.to_string()))?;
            let now = Utc::now();

            // Pre-populate pending lines from on-hand at the counted location.
            let seeded: Vec<OnHand> = state
                .on_hand
                .iter()
                .filter(|row| {
                    row.invent_site_id.eq_ignore_ascii_case(&request.invent_site_id)
                        && row.invent_location_id.eq_ignore_ascii_case(&request.invent_location_id)
                        && (request.wms_location_id.trim().is_empty()
                            || row.wms_location_id.eq_ignore_ascii_case(&request.wms_location_id))
                })
                .cloned()
                .collect();

            let mut lines = Vec::with_capacity(seeded.len());
            for row in seeded {
                lines.push(JournalLine {
                    invent_trans_id: next_trans_id(state, &journal_id)?,
                    journal_id: journal_id.clone(),
                    item_id: row.item_id,
                    item_name: row.product_name,
                    trans_date: now,
                    invent_site_id: row.invent_site_id,
                    invent_location_id: row.invent_location_id,
                    wms_location_id: row.wms_location_id,
                    invent_batch_id: row.invent_batch_id,
                    invent_on_hand: row.physical_invent,
                    counted: 0.0,
                    qty: 0.0,
                    unit_id: row.unit_id,
                    created_by: actor.to_string(),
                    created_date_time: now,
                    modified_by: String::new(),
                    modified_date_time: None,
                });
            }

            let journal = CountingJournal {
                journal_id: journal_id.clone(),
                journal_name_id: COUNTING_JOURNAL_NAME.to_string(),
                description: request.description,
                invent_site_id: request.invent_site_id,
                invent_location_id: request.invent_location_id,
                wms_location_id: request.wms_location_id,
                num_of_lines: lines.len() as u32,
                posted: false,
                posted_user_id: String::new(),
                created_by: actor.to_string(),
                created_date_time: now,
                modified_by: actor.to_string(),
                modified_date_time: now,
                block_user_id: String::new(),
                journal_session_id: String::new(),
            };

            state.lines.extend(lines);
            state.journals.insert(journal_id, journal.clone());
            tracing::info!(journal_id = %journal.journal_id, lines = journal.num_of_lines, "counting journal created");
            Ok(journal)
        })
    }

    async fn list_journals(&self, page: PageRequest) -> BackendResult<PagedList<CountingJournal>> {
        self.read(|state| {
            let all: Vec<_> = state.journals.values().cloned().collect();
            Ok(PagedList::from_slice(&all, page))
        })
    }

    async fn get_journal(&self, journal_id: &JournalId) -> BackendResult<CountingJournal> {
        self.read(|state| {
            state
                .journals
                .get(journal_id)
                .cloned()
                .ok_or_else(|| BackendError::not_found(format!("journal {journal_id}")))
        })
    }

    async fn journal_summary(&self, journal_id: &JournalId) -> BackendResult<JournalSummary> {
        self.read(|state| {
            if !state.journals.contains_key(journal_id) {
                return Err(BackendError::not_found(format!("journal {journal_id}")));
            }
            Ok(JournalSummary::from_lines(
                state.lines.iter().filter(|l| &l.journal_id == journal_id),
            ))
        })
    }

    async fn list_lines(
        &self,
        journal_id: &JournalId,
        filter: &LineFilter,
        page: PageRequest,
    ) -> BackendResult<PagedList<JournalLine>> {
        self.read(|state| {
            if !state.journals.contains_key(journal_id) {
                return Err(BackendError::not_found(format!("journal {journal_id}")));
            }
            let lines: Vec<_> = state
                .lines
                .iter()
                .filter(|l| &l.journal_id == journal_id && filter.matches(l))
                .cloned()
                .collect();
            Ok(PagedList::from_slice(&lines, page))
        })
    }

    async fn get_line(
        &self,
        journal_id: &JournalId,
        invent_trans_id: &InventTransId,
    ) -> BackendResult<JournalLine> {
        self.read(|state| {
            state
                .lines
                .iter()
                .find(|l| &l.journal_id == journal_id && &l.invent_trans_id == invent_trans_id)
                .cloned()
                .ok_or_else(|| BackendError::not_found(format!("line {invent_trans_id}")))
        })
    }

    async fn get_line_by_dimensions(
        &self,
        journal_id: &JournalId,
        dimensions: &LineDimensions,
    ) -> BackendResult<JournalLine> {
        self.read(|state| {
            state
                .lines
                .iter()
                .find(|l| &l.journal_id == journal_id && l.dimensions().matches(dimensions))
                .cloned()
                .ok_or_else(|| BackendError::not_found("line for the given batch dimensions"))
        })
    }

    async fn create_line(
        &self,
        journal_id: &JournalId,
        request: CreateJournalLine,
        actor: &str,
    ) -> BackendResult<JournalLine> {
        let session_id = self.session();
        self.write(|state| {
            writable_journal(state, journal_id, session_id)?;

            let item_id =
                ItemId::new(request.item_id).map_err(|e| BackendError::rejected(e.to_string()))?;
            let item_name = state
                .items
                .iter()
                .find(|i| i.item_id.matches(item_id.as_str()))
                .map(|i| i.product_name.clone())
                .ok_or_else(|| BackendError::rejected(format!("Item {item_id} does not exist.")))?;

            let dimensions = LineDimensions {
                item_id: item_id.as_str().to_string(),
                invent_site_id: request.invent_site_id.clone(),
                invent_location_id: request.invent_location_id.clone(),
                wms_location_id: request.wms_location_id.clone(),
                invent_batch_id: request.invent_batch_id.clone(),
            };
            if state
                .lines
                .iter()
                .any(|l| &l.journal_id == journal_id && l.dimensions().matches(&dimensions))
            {
                return Err(BackendError::rejected(
                    "A line with the same dimensions already exists in this journal.",
                ));
            }

            let on_hand = on_hand_quantity(state, &dimensions);
            let unit_id = state
                .on_hand
                .iter()
                .find(|row| row.item_id.matches(item_id.as_str()))
                .map(|row| row.unit_id.clone())
                .unwrap_or_default();
            let now = Utc::now();

            let line = JournalLine {
                invent_trans_id: next_trans_id(state, journal_id)?,
                journal_id: journal_id.clone(),
                item_id,
                item_name,
                trans_date: request.trans_date.unwrap_or(now),
                invent_site_id: request.invent_site_id,
                invent_location_id: request.invent_location_id,
                wms_location_id: request.wms_location_id,
                invent_batch_id: request.invent_batch_id,
                invent_on_hand: on_hand,
                counted: request.counted,
                qty: request.counted - on_hand,
                unit_id,
                created_by: actor.to_string(),
                created_date_time: now,
                modified_by: actor.to_string(),
                modified_date_time: Some(now),
            };

            let journal = journal_mut(state, journal_id)?;
            journal.num_of_lines += 1;
            journal.modified_by = actor.to_string();
            journal.modified_date_time = now;
            state.lines.push(line.clone());
            Ok(line)
        })
    }

    async fn update_line(
        &self,
        journal_id: &JournalId,
        update: UpdateJournalLine,
        actor: &str,
    ) -> BackendResult<JournalLine> {
        let session_id = self.session();
        self.write(|state| {
            writable_journal(state, journal_id, session_id)?;
            let now = Utc::now();

            let line = state
                .lines
                .iter_mut()
                .find(|l| &l.journal_id == journal_id && l.invent_trans_id.as_str() == update.invent_trans_id)
                .ok_or_else(|| BackendError::not_found(format!("line {}", update.invent_trans_id)))?;
            line.counted = update.counted;
            line.qty = update.counted - line.invent_on_hand;
            line.modified_by = actor.to_string();
            line.modified_date_time = Some(now);
            Ok(line.clone())
        })
    }

    async fn delete_line(
        &self,
        journal_id: &JournalId,
        invent_trans_id: &InventTransId,
    ) -> BackendResult<()> {
        let session_id = self.session();
        self.write(|state| {
            writable_journal(state, journal_id, session_id)?;
            let before = state.lines.len();
            state
                .lines
                .retain(|l| !(&l.journal_id == journal_id && &l.invent_trans_id == invent_trans_id));
            if state.lines.len() == before {
                return Err(BackendError::not_found(format!("line {invent_trans_id}")));
            }
            let journal = journal_mut(state, journal_id)?;
            journal.num_of_lines = journal.num_of_lines.saturating_sub(1);
            Ok(())
        })
    }

    async fn set_journal_lock(
        &self,
        journal_id: &JournalId,
        locked: bool,
        actor: &str,
    ) -> BackendResult<CountingJournal> {
        let session_id = self.session();
        self.write(|state| {
            let journal = writable_journal(state, journal_id, session_id)?;
            if locked {
                journal.journal_session_id = session_id.to_string();
                journal.block_user_id = actor.to_string();
            } else {
                journal.journal_session_id = String::new();
                journal.block_user_id = String::new();
            }
            tracing::info!(journal_id = %journal_id, locked, session_id, actor, "journal lock updated");
            Ok(journal.clone())
        })
    }

    async fn current_session_id(&self) -> BackendResult<i64> {
        self.ensure_available()?;
        Ok(self.session())
    }
}

#[async_trait]
impl ItemBackend for InMemoryErp {
    async fn get_item(&self, item_id: &ItemId) -> BackendResult<Item> {
        self.read(|state| {
            state
                .items
                .iter()
                .find(|i| i.item_id.matches(item_id.as_str()))
                .cloned()
                .ok_or_else(|| BackendError::not_found(format!("item {item_id}")))
        })
    }

    async fn list_items(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<Item>> {
        let search = search_opt(search);
        self.read(|state| {
            let items: Vec<_> = state
                .items
                .iter()
                .filter(|i| search.as_deref().is_none_or(|term| i.matches_search(term)))
                .cloned()
                .collect();
            Ok(PagedList::from_slice(&items, page))
        })
    }

    async fn get_batch(&self, item_id: &ItemId, batch_id: &BatchId) -> BackendResult<Batch> {
        self.read(|state| {
            state
                .batches
                .iter()
                .find(|b| {
                    b.item_id.matches(item_id.as_str())
                        && b.invent_batch_id.matches(batch_id.as_str())
                })
                .cloned()
                .ok_or_else(|| BackendError::not_found(format!("batch {batch_id} of item {item_id}")))
        })
    }

    async fn list_batches(
        &self,
        item_id: &ItemId,
        search: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<Batch>> {
        let search = search_opt(search);
        self.read(|state| {
            let batches: Vec<_> = state
                .batches
                .iter()
                .filter(|b| b.item_id.matches(item_id.as_str()))
                .filter(|b| {
                    search
                        .as_deref()
                        .is_none_or(|term| b.invent_batch_id.as_str().to_lowercase().contains(term))
                })
                .cloned()
                .collect();
            Ok(PagedList::from_slice(&batches, page))
        })
    }

    async fn on_hand(
        &self,
        item_id: &ItemId,
        dimensions: &OnHandDimensions,
    ) -> BackendResult<Vec<OnHand>> {
        self.read(|state| {
            let rows: Vec<_> = state
                .on_hand
                .iter()
                .filter(|row| row.item_id.matches(item_id.as_str()) && dimensions.matches(row))
                .cloned()
                .collect();
            if rows.is_empty() {
                return Err(BackendError::not_found(format!("on-hand for item {item_id}")));
            }
            Ok(rows)
        })
    }

    async fn list_on_hand(
        &self,
        filter: &OnHandFilter,
        page: PageRequest,
    ) -> BackendResult<PagedList<OnHand>> {
        self.read(|state| {
            let rows: Vec<_> = state
                .on_hand
                .iter()
                .filter(|row| filter.matches(row))
                .cloned()
                .collect();
            Ok(PagedList::from_slice(&rows, page))
        })
    }

    async fn on_hand_invent_locations(
        &self,
        site_id: &SiteId,
        search: Option<&str>,
    ) -> BackendResult<Vec<InventLocation>> {
        let search = search_opt(search);
        self.read(|state| {
            Ok(state
                .invent_locations
                .iter()
                .filter(|loc| site_id.matches(&loc.invent_site_id))
                .filter(|loc| {
                    state.on_hand.iter().any(|row| {
                        row.invent_location_id.eq_ignore_ascii_case(&loc.invent_location_id)
                            && row.physical_invent != 0.0
                    })
                })
                .filter(|loc| {
                    search.as_deref().is_none_or(|term| {
                        loc.invent_location_id.to_lowercase().contains(term)
                            || loc.name.to_lowercase().contains(term)
                    })
                })
                .cloned()
                .collect())
        })
    }

    async fn on_hand_wms_locations(
        &self,
        warehouse_id: &WarehouseId,
        search: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<WmsLocation>> {
        let search = search_opt(search);
        self.read(|state| {
            let locations: Vec<_> = state
                .wms_locations
                .iter()
                .filter(|loc| loc.invent_location_id.matches(warehouse_id.as_str()))
                .filter(|loc| {
                    state.on_hand.iter().any(|row| {
                        loc.invent_location_id.matches(&row.invent_location_id)
                            && loc.wms_location_id.matches(&row.wms_location_id)
                            && row.physical_invent != 0.0
                    })
                })
                .filter(|loc| {
                    search
                        .as_deref()
                        .is_none_or(|term| loc.wms_location_id.as_str().to_lowercase().contains(term))
                })
                .cloned()
                .collect();
            Ok(PagedList::from_slice(&locations, page))
        })
    }
}

#[async_trait]
impl LocationBackend for InMemoryErp {
    async fn invent_locations(&self, site_id: &SiteId) -> BackendResult<Vec<InventLocation>> {
        self.read(|state| {
            Ok(state
                .invent_locations
                .iter()
                .filter(|loc| site_id.matches(&loc.invent_site_id))
                .cloned()
                .collect())
        })
    }

    async fn wms_location(
        &self,
        warehouse_id: &WarehouseId,
        wms_location_id: &WmsLocationId,
    ) -> BackendResult<WmsLocation> {
        self.read(|state| {
            state
                .wms_locations
                .iter()
                .find(|loc| {
                    loc.invent_location_id.matches(warehouse_id.as_str())
                        && loc.wms_location_id.matches(wms_location_id.as_str())
                })
                .cloned()
                .ok_or_else(|| {
                    BackendError::not_found(format!("WMS location {wms_location_id} in {warehouse_id}"))
                })
        })
    }

    async fn wms_locations(
        &self,
        warehouse_id: &WarehouseId,
        wms_location_filter: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<WmsLocation>> {
        let filter = search_opt(wms_location_filter);
        self.read(|state| {
            let locations: Vec<_> = state
                .wms_locations
                .iter()
                .filter(|loc| loc.invent_location_id.matches(warehouse_id.as_str()))
                .filter(|loc| {
                    filter
                        .as_deref()
                        .is_none_or(|term| loc.wms_location_id.as_str().to_lowercase().contains(term))
                })
                .cloned()
                .collect();
            Ok(PagedList::from_slice(&locations, page))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erp::seed;

    fn jid(id: &str) -> JournalId {
        JournalId::new(id).unwrap()
    }

    #[tokio::test]
    async fn created_journal_is_populated_from_on_hand() {
        let erp = seed::demo(1);
        let journal = erp
            .create_journal(
                CreateCountingJournal {
                    invent_site_id: "S1".into(),
                    invent_location_id: "WH001".into(),
                    ..Default::default()
                },
                "jdoe",
            )
            .await
            .unwrap();

        assert!(journal.num_of_lines > 0);
        assert_eq!(journal.created_by, "jdoe");
        let summary = erp.journal_summary(&journal.journal_id).await.unwrap();
        assert_eq!(summary.total_lines, journal.num_of_lines);
        assert_eq!(summary.pending_lines, summary.total_lines);
    }

    #[tokio::test]
    async fn counting_a_line_records_variance() {
        let erp = seed::demo(1);
        let journal = jid(seed::DEMO_JOURNAL);
        let lines = erp
            .list_lines(&journal, &LineFilter::default(), PageRequest::default())
            .await
            .unwrap();
        let first = &lines.items[0];

        let updated = erp
            .update_line(
                &journal,
                UpdateJournalLine {
                    invent_trans_id: first.invent_trans_id.to_string(),
                    counted: first.invent_on_hand + 2.0,
                },
                "jdoe",
            )
            .await
            .unwrap();
        assert_eq!(updated.qty, 2.0);
        assert!(updated.is_counted());

        let summary = erp.journal_summary(&journal).await.unwrap();
        assert_eq!(summary.counted_lines, 1);
        assert_eq!(summary.variance_qty, 2.0);
    }

    #[tokio::test]
    async fn lines_of_other_journals_are_not_found() {
        let erp = seed::demo(1);
        let lines = erp
            .list_lines(&jid(seed::DEMO_JOURNAL), &LineFilter::default(), PageRequest::default())
            .await
            .unwrap();
        let err = erp
            .get_line(&jid("J999"), &lines.items[0].invent_trans_id)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn foreign_lock_rejects_writes_and_own_lock_allows_them() {
        let erp = seed::demo(7);
        let journal = jid(seed::DEMO_JOURNAL);

        erp.lock_journal_as(&journal, "42", "alice").unwrap();
        let err = erp.set_journal_lock(&journal, true, "bob").await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));

        erp.lock_journal_as(&journal, "", "").unwrap();
        let locked = erp.set_journal_lock(&journal, true, "bob").await.unwrap();
        assert_eq!(locked.journal_session_id, "7");
        assert_eq!(locked.block_user_id, "bob");

        let unlocked = erp.set_journal_lock(&journal, false, "bob").await.unwrap();
        assert!(!unlocked.is_locked());
    }

    #[tokio::test]
    async fn duplicate_dimensions_are_rejected() {
        let erp = seed::demo(1);
        let journal = jid(seed::DEMO_JOURNAL);
        let lines = erp
            .list_lines(&journal, &LineFilter::default(), PageRequest::default())
            .await
            .unwrap();
        let dims = lines.items[0].dimensions();

        let err = erp
            .create_line(
                &journal,
                CreateJournalLine {
                    journal_id: journal.to_string(),
                    item_id: dims.item_id,
                    invent_site_id: dims.invent_site_id,
                    invent_location_id: dims.invent_location_id,
                    wms_location_id: dims.wms_location_id,
                    invent_batch_id: dims.invent_batch_id,
                    counted: 1.0,
                    ..Default::default()
                },
                "jdoe",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));
    }

    #[tokio::test]
    async fn outage_makes_every_call_unavailable() {
        let erp = seed::demo(1);
        erp.set_available(false);
        assert!(matches!(
            erp.get_journal(&jid(seed::DEMO_JOURNAL)).await,
            Err(BackendError::Unavailable(_))
        ));
        assert!(matches!(erp.current_session_id().await, Err(BackendError::Unavailable(_))));
    }

    #[tokio::test]
    async fn wms_locations_are_scoped_to_their_warehouse() {
        let erp = seed::demo(1);
        let wh = WarehouseId::new("WH001").unwrap();
        let page = erp.wms_locations(&wh, None, PageRequest::default()).await.unwrap();
        assert!(!page.items.is_empty());
        assert!(page.items.iter().all(|l| l.invent_location_id.matches("wh001")));
    }
}
