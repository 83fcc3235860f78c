//! Counting journal lines and the journal edit lock.
//!
//! Every route here is journal-scoped and runs behind the lock guard.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post, put},
    Json, Router,
};

use stocktake_auth::Policy;
use stocktake_core::{InventTransId, JournalId};
use stocktake_inventory::{CountingBackend, CreateJournalLine, LineDimensions, UpdateJournalLine};

use crate::app::dto::LinesQuery;
use crate::app::errors;
use crate::app::routes::common::{parse_id, respond, respond_created};
use crate::app::services::AppServices;
use crate::authz::RouteGuards;
use crate::context::PrincipalContext;

pub const JOURNAL_ID_MISMATCH: &str = "JournalId in the URL does not match the DTO.";
pub const INVENT_TRANS_ID_MISMATCH: &str = "InventTransId in the URL does not match the DTO.";

pub fn router(guards: &RouteGuards) -> Router {
    Router::new()
        .route(
            "/:journalId/lines",
            guards
                .journal(get(list_lines), &[Policy::ViewCountingJournalLines])
                .merge(guards.journal(post(create_line), &[Policy::CreateCountingJournalLines])),
        )
        .route(
            "/:journalId/lines/batch",
            guards.journal(get(get_line_by_batch), &[Policy::ViewCountingJournalLines]),
        )
        .route(
            "/:journalId/lines/lock",
            guards
                .journal(post(lock_journal), &[Policy::LockUnlockJournals])
                .merge(guards.journal(delete(unlock_journal), &[Policy::LockUnlockJournals])),
        )
        .route(
            "/:journalId/lines/:inventTransId",
            guards
                .journal(get(get_line), &[Policy::ViewCountingJournalLines])
                .merge(guards.journal(put(update_line), &[Policy::EditCountingJournalLines]))
                .merge(guards.journal(delete(delete_line), &[Policy::DeleteCountingJournalLines])),
        )
}

pub async fn list_lines(
    Extension(services): Extension<Arc<AppServices>>,
    Path(journal_id): Path<String>,
    Query(query): Query<LinesQuery>,
) -> Response {
    let journal_id = match parse_id(journal_id, JournalId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    respond(
        services
            .backend
            .list_lines(&journal_id, &query.filter(), query.page())
            .await,
        "Counting journal transactions retrieved successfully.",
    )
}

pub async fn get_line_by_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Path(journal_id): Path<String>,
    Query(dimensions): Query<LineDimensions>,
) -> Response {
    let journal_id = match parse_id(journal_id, JournalId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    respond(
        services
            .backend
            .get_line_by_dimensions(&journal_id, &dimensions)
            .await,
        "Counting journal transaction retrieved successfully.",
    )
}

pub async fn get_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path((journal_id, invent_trans_id)): Path<(String, String)>,
) -> Response {
    let (journal_id, invent_trans_id) = match line_key(journal_id, invent_trans_id) {
        Ok(key) => key,
        Err(resp) => return resp,
    };

    respond(
        services.backend.get_line(&journal_id, &invent_trans_id).await,
        "Counting journal transaction retrieved successfully.",
    )
}

pub async fn create_line(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(journal_id): Path<String>,
    Json(body): Json<CreateJournalLine>,
) -> Response {
    if body.journal_id != journal_id {
        return errors::json_error(StatusCode::BAD_REQUEST, JOURNAL_ID_MISMATCH);
    }
    let journal_id = match parse_id(journal_id, JournalId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }
    if let Err(denied) = services.ensure_location_access(&principal, Some(&body.invent_location_id)) {
        return denied;
    }

    let result = services
        .backend
        .create_line(&journal_id, body, principal.username())
        .await;
    if let Ok(line) = &result {
        tracing::info!(
            journal_id = %journal_id,
            invent_trans_id = %line.invent_trans_id,
            item_id = %line.item_id,
            user = principal.username(),
            "counting journal line created"
        );
    }
    respond_created(result, "Counting journal line created successfully.")
}

pub async fn update_line(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((journal_id, invent_trans_id)): Path<(String, String)>,
    Json(body): Json<UpdateJournalLine>,
) -> Response {
    if body.invent_trans_id != invent_trans_id {
        return errors::json_error(StatusCode::BAD_REQUEST, INVENT_TRANS_ID_MISMATCH);
    }
    let journal_id = match parse_id(journal_id, JournalId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    respond(
        services
            .backend
            .update_line(&journal_id, body, principal.username())
            .await,
        "Counting journal line updated successfully.",
    )
}

pub async fn delete_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path((journal_id, invent_trans_id)): Path<(String, String)>,
) -> Response {
    let (journal_id, invent_trans_id) = match line_key(journal_id, invent_trans_id) {
        Ok(key) => key,
        Err(resp) => return resp,
    };

    respond(
        services
            .backend
            .delete_line(&journal_id, &invent_trans_id)
            .await,
        "Counting journal line deleted successfully.",
    )
}

pub async fn lock_journal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(journal_id): Path<String>,
) -> Response {
    set_lock(&services, &principal, journal_id, true).await
}

pub async fn unlock_journal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(journal_id): Path<String>,
) -> Response {
    set_lock(&services, &principal, journal_id, false).await
}

async fn set_lock(
    services: &AppServices,
    principal: &PrincipalContext,
    journal_id: String,
    locked: bool,
) -> Response {
    let journal_id = match parse_id(journal_id, JournalId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    respond(
        services
            .backend
            .set_journal_lock(&journal_id, locked, principal.username())
            .await,
        "Journal block status updated successfully.",
    )
}

fn line_key(journal_id: String, invent_trans_id: String) -> Result<(JournalId, InventTransId), Response> {
    Ok((
        parse_id(journal_id, JournalId::new)?,
        parse_id(invent_trans_id, InventTransId::new)?,
    ))
}
