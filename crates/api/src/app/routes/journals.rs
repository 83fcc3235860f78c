use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    routing::{get, post},
    Json, Router,
};

use stocktake_auth::Policy;
use stocktake_core::JournalId;
use stocktake_inventory::{CountingBackend, CreateCountingJournal};

use crate::app::dto::PageQuery;
use crate::app::errors;
use crate::app::routes::common::{parse_id, respond, respond_created};
use crate::app::services::AppServices;
use crate::authz::RouteGuards;
use crate::context::PrincipalContext;

pub fn router(guards: &RouteGuards) -> Router {
    Router::new()
        .route(
            "/",
            guards
                .policy(get(list_journals), &[Policy::ViewCountingJournals])
                .merge(guards.policy(post(create_journal), &[Policy::CreateCountingJournals])),
        )
        .route(
            "/:journalId",
            guards.journal(get(get_journal), &[Policy::ViewCountingJournals]),
        )
        .route(
            "/:journalId/summary",
            guards.policy(get(journal_summary), &[Policy::ViewCountingJournals]),
        )
}

pub async fn list_journals(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<PageQuery>,
) -> Response {
    respond(
        services.backend.list_journals(query.page()).await,
        "Counting journals retrieved successfully.",
    )
}

pub async fn create_journal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateCountingJournal>,
) -> Response {
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }
    if let Err(denied) = services.ensure_location_access(&principal, Some(&body.invent_location_id)) {
        return denied;
    }

    let result = services
        .backend
        .create_journal(body, principal.username())
        .await;
    if let Ok(journal) = &result {
        tracing::info!(
            journal_id = %journal.journal_id,
            invent_location_id = %journal.invent_location_id,
            user = principal.username(),
            "counting journal created"
        );
    }
    respond_created(result, "Counting journal created successfully.")
}

pub async fn get_journal(
    Extension(services): Extension<Arc<AppServices>>,
    Path(journal_id): Path<String>,
) -> Response {
    let journal_id = match parse_id(journal_id, JournalId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    respond(
        services.backend.get_journal(&journal_id).await,
        "Counting journal retrieved successfully.",
    )
}

pub async fn journal_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Path(journal_id): Path<String>,
) -> Response {
    let journal_id = match parse_id(journal_id, JournalId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    respond(
        services.backend.journal_summary(&journal_id).await,
        "Counting journal summary retrieved successfully.",
    )
}
