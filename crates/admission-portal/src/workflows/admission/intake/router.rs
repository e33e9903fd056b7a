use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use tracing::warn;

use super::super::domain::{ApplicationDocument, ApplicationId, DraftId, OfficeUseFields};
use super::super::remote::wire::{
    DraftBody, DraftList, DraftSaved, SubmissionReceipt, APPLICATIONS_PATH, DRAFTS_PATH,
    MAX_DOCUMENT_BYTES, USER_DRAFTS_PATH,
};
use super::repository::{ApplicationRepository, DraftRepository, RepositoryError};
use super::service::{AdmissionIntakeService, IntakeError};

type SharedService<D, A> = Arc<AdmissionIntakeService<D, A>>;

/// Router exposing draft checkpoints, submission and the office-use endpoints.
pub fn admission_router<D, A>(service: SharedService<D, A>) -> Router
where
    D: DraftRepository + 'static,
    A: ApplicationRepository + 'static,
{
    Router::new()
        .route(DRAFTS_PATH, post(create_draft_handler::<D, A>))
        .route(
            &format!("{DRAFTS_PATH}/:draft_id"),
            put(update_draft_handler::<D, A>)
                .get(get_draft_handler::<D, A>)
                .delete(delete_draft_handler::<D, A>),
        )
        .route(USER_DRAFTS_PATH, get(list_drafts_handler::<D, A>))
        .route(APPLICATIONS_PATH, post(submit_handler::<D, A>))
        .route(
            &format!("{APPLICATIONS_PATH}/:application_id/summary"),
            get(summary_handler::<D, A>),
        )
        .route(
            &format!("{APPLICATIONS_PATH}/:application_id/office-use"),
            put(office_use_handler::<D, A>),
        )
        .layer(DefaultBodyLimit::max(MAX_DOCUMENT_BYTES))
        .with_state(service)
}

/// The bearer credential doubles as the owning principal.
pub(crate) fn bearer_principal(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn unauthorized() -> Response {
    let payload = json!({
        "error": "missing bearer credential",
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

fn error_response(error: IntakeError) -> Response {
    let status = match &error {
        IntakeError::NotFound(_) => StatusCode::NOT_FOUND,
        IntakeError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IntakeError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        IntakeError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        IntakeError::Repository(RepositoryError::Unavailable(_)) => {
            warn!(error = %error, "admission repository unavailable");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn create_draft_handler<D, A>(
    State(service): State<SharedService<D, A>>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<DraftBody>,
) -> Response
where
    D: DraftRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(owner) = bearer_principal(&headers) else {
        return unauthorized();
    };
    match service.create_draft(&owner, body.data, body.status) {
        Ok(draft) => {
            let saved = DraftSaved {
                draft_id: draft.draft_id,
            };
            (StatusCode::CREATED, axum::Json(saved)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_draft_handler<D, A>(
    State(service): State<SharedService<D, A>>,
    headers: HeaderMap,
    Path(draft_id): Path<String>,
    axum::Json(body): axum::Json<DraftBody>,
) -> Response
where
    D: DraftRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(owner) = bearer_principal(&headers) else {
        return unauthorized();
    };
    let id = DraftId(draft_id);
    match service.update_draft(&owner, &id, body.data, body.status) {
        Ok(draft) => {
            let saved = DraftSaved {
                draft_id: draft.draft_id,
            };
            (StatusCode::OK, axum::Json(saved)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_drafts_handler<D, A>(
    State(service): State<SharedService<D, A>>,
    headers: HeaderMap,
) -> Response
where
    D: DraftRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(owner) = bearer_principal(&headers) else {
        return unauthorized();
    };
    match service.list_drafts(&owner) {
        Ok(drafts) => {
            let list = DraftList {
                drafts: drafts.iter().map(|draft| draft.to_draft()).collect(),
            };
            (StatusCode::OK, axum::Json(list)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_draft_handler<D, A>(
    State(service): State<SharedService<D, A>>,
    headers: HeaderMap,
    Path(draft_id): Path<String>,
) -> Response
where
    D: DraftRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(owner) = bearer_principal(&headers) else {
        return unauthorized();
    };
    match service.get_draft(&owner, &DraftId(draft_id)) {
        Ok(draft) => (StatusCode::OK, axum::Json(draft.to_draft())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_draft_handler<D, A>(
    State(service): State<SharedService<D, A>>,
    headers: HeaderMap,
    Path(draft_id): Path<String>,
) -> Response
where
    D: DraftRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(owner) = bearer_principal(&headers) else {
        return unauthorized();
    };
    match service.delete_draft(&owner, &DraftId(draft_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<D, A>(
    State(service): State<SharedService<D, A>>,
    headers: HeaderMap,
    axum::Json(document): axum::Json<ApplicationDocument>,
) -> Response
where
    D: DraftRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(owner) = bearer_principal(&headers) else {
        return unauthorized();
    };
    match service.submit(&owner, document) {
        Ok(record) => {
            let receipt = SubmissionReceipt {
                application_id: record.application_id,
                success: true,
            };
            (StatusCode::CREATED, axum::Json(receipt)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_handler<D, A>(
    State(service): State<SharedService<D, A>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    D: DraftRepository + 'static,
    A: ApplicationRepository + 'static,
{
    if bearer_principal(&headers).is_none() {
        return unauthorized();
    }
    match service.get_application(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.summary())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn office_use_handler<D, A>(
    State(service): State<SharedService<D, A>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    axum::Json(fields): axum::Json<OfficeUseFields>,
) -> Response
where
    D: DraftRepository + 'static,
    A: ApplicationRepository + 'static,
{
    if bearer_principal(&headers).is_none() {
        return unauthorized();
    }
    match service.save_office_use(&ApplicationId(application_id), fields) {
        Ok(record) => (StatusCode::OK, axum::Json(record.summary())).into_response(),
        Err(error) => error_response(error),
    }
}
