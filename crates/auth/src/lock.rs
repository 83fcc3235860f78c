//! Session-based journal lock guard.
//!
//! The ERP marks a counting journal as being edited by writing the editing
//! session id onto it. Requests touching a journal locked by *another* session
//! are rejected before any handler runs; everything else passes.
//!
//! The guard itself is transport-agnostic: it consumes a narrow
//! [`JournalLockSource`] and returns a [`LockDecision`]. The HTTP layer maps
//! [`LockDecision::LockedByOther`] to `423 Locked`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stocktake_core::JournalId;
use thiserror::Error;

/// Lock fields of a journal as reported by the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLockState {
    pub journal_id: JournalId,
    pub locking_session_id: String,
    pub blocking_user_id: String,
}

impl JournalLockState {
    pub fn unlocked(journal_id: JournalId) -> Self {
        Self {
            journal_id,
            locking_session_id: String::new(),
            blocking_user_id: String::new(),
        }
    }

    /// Empty, whitespace or the literal `"0"`.
    pub fn is_unlocked(&self) -> bool {
        let session = self.locking_session_id.trim();
        session.is_empty() || session == "0"
    }

    /// True when the lock session parses as an integer equal to `session_id`.
    pub fn held_by(&self, session_id: i64) -> bool {
        self.locking_session_id
            .trim()
            .parse::<i64>()
            .is_ok_and(|locking| locking == session_id)
    }
}

/// Details of a lock held by another session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConflict {
    pub journal_id: JournalId,
    pub session_id: String,
    pub blocked_by: String,
}

impl LockConflict {
    pub const MESSAGE: &'static str =
        "This journal is currently being edited by another user session.";

    /// Detail lines of the 423 response.
    pub fn errors(&self) -> Vec<String> {
        vec![
            format!("Journal Session ID: {}", self.session_id),
            format!("Blocked By: {}", self.blocked_by),
        ]
    }
}

/// Outcome of a lock check. Only `LockedByOther` blocks the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockDecision {
    NoJournalIdPresent,
    /// The handler reports the 404.
    JournalNotFound,
    Unlocked,
    LockedBySelf,
    /// Collaborator absent or a lookup failed; passes (fail-open).
    BackendUnavailable,
    LockedByOther(LockConflict),
}

impl LockDecision {
    pub fn allows(&self) -> bool {
        !matches!(self, LockDecision::LockedByOther(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockSourceError {
    #[error("lock source unavailable: {0}")]
    Unavailable(String),
}

/// Read-only port the guard needs from the ERP.
#[async_trait]
pub trait JournalLockSource: Send + Sync {
    /// `Ok(None)` when the journal does not exist.
    async fn fetch_journal_lock(
        &self,
        journal_id: &JournalId,
    ) -> Result<Option<JournalLockState>, LockSourceError>;

    /// The ERP session id of the gateway's current connection.
    async fn fetch_current_session_id(&self) -> Result<i64, LockSourceError>;
}

#[async_trait]
impl<T> JournalLockSource for Arc<T>
where
    T: JournalLockSource + ?Sized,
{
    async fn fetch_journal_lock(
        &self,
        journal_id: &JournalId,
    ) -> Result<Option<JournalLockState>, LockSourceError> {
        (**self).fetch_journal_lock(journal_id).await
    }

    async fn fetch_current_session_id(&self) -> Result<i64, LockSourceError> {
        (**self).fetch_current_session_id().await
    }
}

/// Compare a locked journal against the current session.
///
/// Pure. A lock session id that is not an integer never matches, so it is
/// treated as held by another session.
pub fn decide(state: &JournalLockState, current_session_id: i64) -> LockDecision {
    if state.is_unlocked() {
        return LockDecision::Unlocked;
    }
    if state.held_by(current_session_id) {
        return LockDecision::LockedBySelf;
    }
    LockDecision::LockedByOther(LockConflict {
        journal_id: state.journal_id.clone(),
        session_id: state.locking_session_id.trim().to_string(),
        blocked_by: state.blocking_user_id.clone(),
    })
}

/// Evaluates journal ownership for one request.
#[derive(Debug, Clone)]
pub struct JournalLockGuard<S> {
    source: Option<S>,
}

impl<S> JournalLockGuard<S>
where
    S: JournalLockSource,
{
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// A guard with no collaborator passes every request.
    pub fn without_source() -> Self {
        Self { source: None }
    }

    /// Check the journal named by the request, if any.
    ///
    /// Sequential reads: the journal first, then the current session id only
    /// when the journal turns out to be locked.
    pub async fn check(&self, journal_id: Option<&str>) -> LockDecision {
        let Some(journal_id) = journal_id.and_then(|raw| JournalId::new(raw).ok()) else {
            tracing::debug!("no journal id in request; lock guard not applicable");
            return LockDecision::NoJournalIdPresent;
        };

        let Some(source) = &self.source else {
            tracing::warn!(journal_id = %journal_id, "no lock source configured; passing request");
            return LockDecision::BackendUnavailable;
        };

        let state = match source.fetch_journal_lock(&journal_id).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::debug!(journal_id = %journal_id, "journal not found; deferring to handler");
                return LockDecision::JournalNotFound;
            }
            Err(e) => {
                tracing::warn!(journal_id = %journal_id, error = %e, "journal lookup failed; passing request");
                return LockDecision::BackendUnavailable;
            }
        };

        if state.is_unlocked() {
            tracing::debug!(journal_id = %journal_id, "journal unlocked");
            return LockDecision::Unlocked;
        }

        let current_session_id = match source.fetch_current_session_id().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(journal_id = %journal_id, error = %e, "session lookup failed; passing request");
                return LockDecision::BackendUnavailable;
            }
        };

        let decision = decide(&state, current_session_id);
        match &decision {
            LockDecision::LockedByOther(conflict) => tracing::info!(
                journal_id = %journal_id,
                locking_session_id = %conflict.session_id,
                blocked_by = %conflict.blocked_by,
                current_session_id,
                "journal locked by another session"
            ),
            _ => tracing::debug!(journal_id = %journal_id, current_session_id, "journal locked by current session"),
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn state(session: &str, user: &str) -> JournalLockState {
        JournalLockState {
            journal_id: JournalId::new("J100").unwrap(),
            locking_session_id: session.to_string(),
            blocking_user_id: user.to_string(),
        }
    }

    struct StubSource {
        journal: Result<Option<JournalLockState>, LockSourceError>,
        session: Result<i64, LockSourceError>,
        session_reads: AtomicUsize,
    }

    impl StubSource {
        fn new(journal: Option<JournalLockState>, session: i64) -> Self {
            Self {
                journal: Ok(journal),
                session: Ok(session),
                session_reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl JournalLockSource for StubSource {
        async fn fetch_journal_lock(
            &self,
            _journal_id: &JournalId,
        ) -> Result<Option<JournalLockState>, LockSourceError> {
            self.journal.clone()
        }

        async fn fetch_current_session_id(&self) -> Result<i64, LockSourceError> {
            self.session_reads.fetch_add(1, Ordering::SeqCst);
            self.session.clone()
        }
    }

    #[test]
    fn unlocked_markers() {
        for session in ["", "   ", "0", " 0 "] {
            assert!(state(session, "").is_unlocked(), "{session:?}");
        }
        assert!(!state("42", "bob").is_unlocked());
    }

    #[test]
    fn decide_matches_integer_sessions() {
        assert_eq!(decide(&state("42", "bob"), 42), LockDecision::LockedBySelf);

        let LockDecision::LockedByOther(conflict) = decide(&state("42", "bob"), 7) else {
            panic!("expected conflict");
        };
        assert_eq!(
            conflict.errors(),
            vec!["Journal Session ID: 42".to_string(), "Blocked By: bob".to_string()]
        );
    }

    #[test]
    fn non_integer_lock_session_is_someone_else() {
        assert!(matches!(
            decide(&state("abc", "bob"), 42),
            LockDecision::LockedByOther(_)
        ));
    }

    #[tokio::test]
    async fn missing_or_blank_journal_id_is_not_applicable() {
        let guard = JournalLockGuard::new(StubSource::new(Some(state("42", "bob")), 7));
        assert_eq!(guard.check(None).await, LockDecision::NoJournalIdPresent);
        assert_eq!(guard.check(Some("  ")).await, LockDecision::NoJournalIdPresent);
    }

    #[tokio::test]
    async fn unknown_journal_passes_to_handler() {
        let guard = JournalLockGuard::new(StubSource::new(None, 7));
        let decision = guard.check(Some("J404")).await;
        assert_eq!(decision, LockDecision::JournalNotFound);
        assert!(decision.allows());
    }

    #[tokio::test]
    async fn unlocked_journal_skips_session_lookup() {
        let source = Arc::new(StubSource::new(Some(state("0", "")), 7));
        let guard = JournalLockGuard::new(source.clone());
        assert_eq!(guard.check(Some("J100")).await, LockDecision::Unlocked);
        assert_eq!(source.session_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn own_lock_passes_and_foreign_lock_blocks() {
        let guard = JournalLockGuard::new(StubSource::new(Some(state("55", "alice")), 55));
        assert_eq!(guard.check(Some("J100")).await, LockDecision::LockedBySelf);

        let guard = JournalLockGuard::new(StubSource::new(Some(state("55", "alice")), 99));
        let decision = guard.check(Some("J100")).await;
        assert!(!decision.allows());
        let LockDecision::LockedByOther(conflict) = decision else {
            panic!("expected conflict");
        };
        assert_eq!(conflict.session_id, "55");
        assert_eq!(conflict.blocked_by, "alice");
    }

    #[tokio::test]
    async fn backend_failures_fail_open() {
        let guard = JournalLockGuard::new(StubSource {
            journal: Err(LockSourceError::Unavailable("timeout".into())),
            session: Ok(1),
            session_reads: AtomicUsize::new(0),
        });
        assert_eq!(guard.check(Some("J100")).await, LockDecision::BackendUnavailable);

        let guard = JournalLockGuard::new(StubSource {
            journal: Ok(Some(state("55", "alice"))),
            session: Err(LockSourceError::Unavailable("timeout".into())),
            session_reads: AtomicUsize::new(0),
        });
        assert_eq!(guard.check(Some("J100")).await, LockDecision::BackendUnavailable);

        let guard = JournalLockGuard::<StubSource>::without_source();
        assert!(guard.check(Some("J100")).await.allows());
    }
}
