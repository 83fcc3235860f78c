//! Ports to the ERP.
//!
//! The gateway never talks to the ERP directly; handlers go through these
//! traits. Implementations live in `stocktake-infra` (in-memory, for dev and
//! tests) or in a transport adapter outside this workspace.
//!
//! ## Error mapping
//!
//! Every operation reports failures as a [`BackendError`]:
//!
//! - `NotFound`: the addressed record does not exist
//! - `Rejected`: the ERP refused the request; the message is shown to the caller
//! - `Unavailable`: no usable response (timeout, transport failure)

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stocktake_core::{
    BatchId, InventTransId, ItemId, JournalId, PageRequest, PagedList, SiteId, WarehouseId,
    WmsLocationId,
};

use crate::counting::{
    CountingJournal, CreateCountingJournal, CreateJournalLine, JournalLine, JournalSummary,
    LineDimensions, LineFilter, UpdateJournalLine,
};
use crate::item::{Batch, InventLocation, Item, OnHand, OnHandDimensions, OnHandFilter};
use crate::location::WmsLocation;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("rejected by ERP: {0}")]
    Rejected(String),

    #[error("ERP unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Counting journals, their lines and the journal edit lock.
///
/// `actor` is the ERP user a write is attributed to.
#[async_trait]
pub trait CountingBackend: Send + Sync {
    async fn create_journal(
        &self,
        journal: CreateCountingJournal,
        actor: &str,
    ) -> BackendResult<CountingJournal>;

    async fn list_journals(&self, page: PageRequest) -> BackendResult<PagedList<CountingJournal>>;

    async fn get_journal(&self, journal_id: &JournalId) -> BackendResult<CountingJournal>;

    async fn journal_summary(&self, journal_id: &JournalId) -> BackendResult<JournalSummary>;

    async fn list_lines(
        &self,
        journal_id: &JournalId,
        filter: &LineFilter,
        page: PageRequest,
    ) -> BackendResult<PagedList<JournalLine>>;

    /// A line of `journal_id`; lines of other journals are `NotFound`.
    async fn get_line(
        &self,
        journal_id: &JournalId,
        invent_trans_id: &InventTransId,
    ) -> BackendResult<JournalLine>;

    async fn get_line_by_dimensions(
        &self,
        journal_id: &JournalId,
        dimensions: &LineDimensions,
    ) -> BackendResult<JournalLine>;

    async fn create_line(
        &self,
        journal_id: &JournalId,
        line: CreateJournalLine,
        actor: &str,
    ) -> BackendResult<JournalLine>;

    async fn update_line(
        &self,
        journal_id: &JournalId,
        update: UpdateJournalLine,
        actor: &str,
    ) -> BackendResult<JournalLine>;

    async fn delete_line(
        &self,
        journal_id: &JournalId,
        invent_trans_id: &InventTransId,
    ) -> BackendResult<()>;

    /// Take (`locked = true`) or release the journal edit lock for the
    /// current session.
    async fn set_journal_lock(
        &self,
        journal_id: &JournalId,
        locked: bool,
        actor: &str,
    ) -> BackendResult<CountingJournal>;

    /// Session id of the gateway's current ERP connection.
    async fn current_session_id(&self) -> BackendResult<i64>;
}

/// Item master data, batches and on-hand stock.
#[async_trait]
pub trait ItemBackend: Send + Sync {
    async fn get_item(&self, item_id: &ItemId) -> BackendResult<Item>;

    async fn list_items(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<Item>>;

    async fn get_batch(&self, item_id: &ItemId, batch_id: &BatchId) -> BackendResult<Batch>;

    async fn list_batches(
        &self,
        item_id: &ItemId,
        search: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<Batch>>;

    /// On-hand rows of `item_id` matching `dimensions`.
    async fn on_hand(
        &self,
        item_id: &ItemId,
        dimensions: &OnHandDimensions,
    ) -> BackendResult<Vec<OnHand>>;

    async fn list_on_hand(
        &self,
        filter: &OnHandFilter,
        page: PageRequest,
    ) -> BackendResult<PagedList<OnHand>>;

    /// Warehouses of a site that hold stock.
    async fn on_hand_invent_locations(
        &self,
        site_id: &SiteId,
        search: Option<&str>,
    ) -> BackendResult<Vec<InventLocation>>;

    /// Bin locations of a warehouse that hold stock.
    async fn on_hand_wms_locations(
        &self,
        warehouse_id: &WarehouseId,
        search: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<WmsLocation>>;
}

/// Warehouse and bin location master data.
#[async_trait]
pub trait LocationBackend: Send + Sync {
    async fn invent_locations(&self, site_id: &SiteId) -> BackendResult<Vec<InventLocation>>;

    async fn wms_location(
        &self,
        warehouse_id: &WarehouseId,
        wms_location_id: &WmsLocationId,
    ) -> BackendResult<WmsLocation>;

    async fn wms_locations(
        &self,
        warehouse_id: &WarehouseId,
        wms_location_filter: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<WmsLocation>>;
}

/// Everything the gateway needs from the ERP.
pub trait InventoryBackend: CountingBackend + ItemBackend + LocationBackend {}

impl<T> InventoryBackend for T where T: CountingBackend + ItemBackend + LocationBackend {}

#[async_trait]
impl<T> CountingBackend for Arc<T>
where
    T: CountingBackend + ?Sized,
{
    async fn create_journal(
        &self,
        journal: CreateCountingJournal,
        actor: &str,
    ) -> BackendResult<CountingJournal> {
        (**self).create_journal(journal, actor).await
    }

    async fn list_journals(&self, page: PageRequest) -> BackendResult<PagedList<CountingJournal>> {
        (**self).list_journals(page).await
    }

    async fn get_journal(&self, journal_id: &JournalId) -> BackendResult<CountingJournal> {
        (**self).get_journal(journal_id).await
    }

    async fn journal_summary(&self, journal_id: &JournalId) -> BackendResult<JournalSummary> {
        (**self).journal_summary(journal_id).await
    }

    async fn list_lines(
        &self,
        journal_id: &JournalId,
        filter: &LineFilter,
        page: PageRequest,
    ) -> BackendResult<PagedList<JournalLine>> {
        (**self).list_lines(journal_id, filter, page).await
    }

    async fn get_line(
        &self,
        journal_id: &JournalId,
        invent_trans_id: &InventTransId,
    ) -> BackendResult<JournalLine> {
        (**self).get_line(journal_id, invent_trans_id).await
    }

    async fn get_line_by_dimensions(
        &self,
        journal_id: &JournalId,
        dimensions: &LineDimensions,
    ) -> BackendResult<JournalLine> {
        (**self).get_line_by_dimensions(journal_id, dimensions).await
    }

    async fn create_line(
        &self,
        journal_id: &JournalId,
        line: CreateJournalLine,
        actor: &str,
    ) -> BackendResult<JournalLine> {
        (**self).create_line(journal_id, line, actor).await
    }

    async fn update_line(
        &self,
        journal_id: &JournalId,
        update: UpdateJournalLine,
        actor: &str,
    ) -> BackendResult<JournalLine> {
        (**self).update_line(journal_id, update, actor).await
    }

    async fn delete_line(
        &self,
        journal_id: &JournalId,
        invent_trans_id: &InventTransId,
    ) -> BackendResult<()> {
        (**self).delete_line(journal_id, invent_trans_id).await
    }

    async fn set_journal_lock(
        &self,
        journal_id: &JournalId,
        locked: bool,
        actor: &str,
    ) -> BackendResult<CountingJournal> {
        (**self).set_journal_lock(journal_id, locked, actor).await
    }

    async fn current_session_id(&self) -> BackendResult<i64> {
        (**self).current_session_id().await
    }
}

#[async_trait]
impl<T> ItemBackend for Arc<T>
where
    T: ItemBackend + ?Sized,
{
    async fn get_item(&self, item_id: &ItemId) -> BackendResult<Item> {
        (**self).get_item(item_id).await
    }

    async fn list_items(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<Item>> {
        (**self).list_items(search, page).await
    }

    async fn get_batch(&self, item_id: &ItemId, batch_id: &BatchId) -> BackendResult<Batch> {
        (**self).get_batch(item_id, batch_id).await
    }

    async fn list_batches(
        &self,
        item_id: &ItemId,
        search: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<Batch>> {
        (**self).list_batches(item_id, search, page).await
    }

    async fn on_hand(
        &self,
        item_id: &ItemId,
        dimensions: &OnHandDimensions,
    ) -> BackendResult<Vec<OnHand>> {
        (**self).on_hand(item_id, dimensions).await
    }

    async fn list_on_hand(
        &self,
        filter: &OnHandFilter,
        page: PageRequest,
    ) -> BackendResult<PagedList<OnHand>> {
        (**self).list_on_hand(filter, page).await
    }

    async fn on_hand_invent_locations(
        &self,
        site_id: &SiteId,
        search: Option<&str>,
    ) -> BackendResult<Vec<InventLocation>> {
        (**self).on_hand_invent_locations(site_id, search).await
    }

    async fn on_hand_wms_locations(
        &self,
        warehouse_id: &WarehouseId,
        search: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<WmsLocation>> {
        (**self).on_hand_wms_locations(warehouse_id, search, page).await
    }
}

#[async_trait]
impl<T> LocationBackend for Arc<T>
where
    T: LocationBackend + ?Sized,
{
    async fn invent_locations(&self, site_id: &SiteId) -> BackendResult<Vec<InventLocation>> {
        (**self).invent_locations(site_id).await
    }

    async fn wms_location(
        &self,
        warehouse_id: &WarehouseId,
        wms_location_id: &WmsLocationId,
    ) -> BackendResult<WmsLocation> {
        (**self).wms_location(warehouse_id, wms_location_id).await
    }

    async fn wms_locations(
        &self,
        warehouse_id: &WarehouseId,
        wms_location_filter: Option<&str>,
        page: PageRequest,
    ) -> BackendResult<PagedList<WmsLocation>> {
        (**self).wms_locations(warehouse_id, wms_location_filter, page).await
    }
}
