//! HTTP side of the journal lock guard.
//!
//! The decision lives in `stocktake_auth::lock`; this module feeds it the
//! journal named by the request and maps a conflict to `423 Locked`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use stocktake_auth::{
    JournalLockGuard, JournalLockSource, JournalLockState, LockDecision, LockSourceError,
};
use stocktake_core::JournalId;
use stocktake_inventory::{BackendError, CountingBackend};

use crate::app::errors;

pub const JOURNAL_ID_PARAM: &str = "journalId";

/// Reads lock state through the counting backend.
#[derive(Debug, Clone)]
pub struct BackendLockSource<B> {
    backend: B,
}

impl<B> BackendLockSource<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B> JournalLockSource for BackendLockSource<B>
where
    B: CountingBackend,
{
    async fn fetch_journal_lock(
        &self,
        journal_id: &JournalId,
    ) -> Result<Option<JournalLockState>, LockSourceError> {
        match self.backend.get_journal(journal_id).await {
            Ok(journal) => Ok(Some(JournalLockState {
                journal_id: journal.journal_id,
                locking_session_id: journal.journal_session_id,
                blocking_user_id: journal.block_user_id,
            })),
            Err(BackendError::NotFound(_)) => Ok(None),
            Err(e) => Err(LockSourceError::Unavailable(e.to_string())),
        }
    }

    async fn fetch_current_session_id(&self) -> Result<i64, LockSourceError> {
        self.backend
            .current_session_id()
            .await
            .map_err(|e| LockSourceError::Unavailable(e.to_string()))
    }
}

#[derive(Clone)]
pub struct LockGuardState {
    guard: Arc<JournalLockGuard<Arc<dyn JournalLockSource>>>,
}

impl LockGuardState {
    pub fn new(source: Arc<dyn JournalLockSource>) -> Self {
        Self {
            guard: Arc::new(JournalLockGuard::new(source)),
        }
    }
}

/// Journal id of the request: route parameter first, then query string.
pub fn journal_id<'a>(
    route: &'a HashMap<String, String>,
    query: &'a HashMap<String, String>,
) -> Option<&'a str> {
    route
        .get(JOURNAL_ID_PARAM)
        .or_else(|| query.get(JOURNAL_ID_PARAM))
        .map(String::as_str)
}

pub async fn journal_lock_middleware(
    State(state): State<LockGuardState>,
    route: Option<Path<HashMap<String, String>>>,
    query: Option<Query<HashMap<String, String>>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let route = route.map(|Path(p)| p).unwrap_or_default();
    let query = query.map(|Query(q)| q).unwrap_or_default();

    match state.guard.check(journal_id(&route, &query)).await {
        LockDecision::LockedByOther(conflict) => errors::lock_conflict(&conflict),
        _ => next.run(req).await,
    }
}
