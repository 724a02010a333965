use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::DraftError;
use crate::logic::{AbandonOutcome, CleanupTrigger, SessionManager};
use crate::model::{
    normalize_category, AssetUpload, ContentRecord, EditorContext, Identifier, NavigationDecision, NavigationIntent,
    NavigationOutcome, SessionSummary,
};
use crate::store::traits::ContentStore;

pub type AppState<S> = Arc<SessionManager<S>>;

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

fn error_status(err: &DraftError) -> StatusCode {
    match err {
        DraftError::Allocation { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DraftError::Upload { .. } | DraftError::Save { .. } => StatusCode::BAD_GATEWAY,
        DraftError::EmptyUpload { .. } => StatusCode::BAD_REQUEST,
        DraftError::Cleanup { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        DraftError::NavigationPending { .. }
        | DraftError::NoPendingNavigation
        | DraftError::SaveInProgress { .. }
        | DraftError::InvalidPhase { .. }
        | DraftError::AlreadyCommitted { .. } => StatusCode::CONFLICT,
        DraftError::SessionNotFound(_) | DraftError::UnknownTab(_) => StatusCode::NOT_FOUND,
    }
}

fn to_response(err: DraftError) -> (StatusCode, Json<ErrorResponse>) {
    (error_status(&err), Json(ErrorResponse::new(&err.to_string())))
}

#[derive(Debug, Deserialize)]
pub struct BeginSessionRequest {
    pub category: String,
    /// Initial form value, typically the empty form with its defaults
    #[serde(default)]
    pub form: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub pending_assets: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FormUpdateRequest {
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    pub has_unsaved_changes: bool,
    pub pending_navigation: Option<NavigationIntent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommitRequest {
    /// Content to commit; the current form value when omitted
    pub content: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct AbandonRequest {
    pub trigger: CleanupTrigger,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveNavigationRequest {
    pub decision: NavigationDecision,
}

pub async fn begin_session<S: ContentStore + 'static>(
    State(manager): State<AppState<S>>,
    editor: EditorContext,
    RequestJson(request): RequestJson<BeginSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionSummary>)> {
    let form = request
        .form
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

    let session = manager
        .begin_session(&request.category, editor, form)
        .await
        .map_err(to_response)?;

    Ok((StatusCode::CREATED, Json(session.summary().await)))
}

pub async fn get_session<S: ContentStore + 'static>(
    State(manager): State<AppState<S>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionSummary>> {
    let session = manager.get(&session_id).map_err(to_response)?;
    Ok(Json(session.summary().await))
}

pub async fn upload_asset<S: ContentStore + 'static>(
    State(manager): State<AppState<S>>,
    Path(session_id): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let session = manager.get(&session_id).map_err(to_response)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let upload = AssetUpload::new(query.file_name, content_type, body.to_vec());

    let url = session.upload(upload).await.map_err(to_response)?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            pending_assets: session.pending_assets(),
        }),
    ))
}

pub async fn update_form<S: ContentStore + 'static>(
    State(manager): State<AppState<S>>,
    Path(session_id): Path<String>,
    RequestJson(request): RequestJson<FormUpdateRequest>,
) -> ApiResult<Json<ChangesResponse>> {
    let session = manager.get(&session_id).map_err(to_response)?;
    session.update_form(request.value).await;

    Ok(Json(ChangesResponse {
        has_unsaved_changes: session.has_unsaved_changes().await,
        pending_navigation: session.pending_navigation().await,
    }))
}

pub async fn get_changes<S: ContentStore + 'static>(
    State(manager): State<AppState<S>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<ChangesResponse>> {
    let session = manager.get(&session_id).map_err(to_response)?;

    Ok(Json(ChangesResponse {
        has_unsaved_changes: session.has_unsaved_changes().await,
        pending_navigation: session.pending_navigation().await,
    }))
}

pub async fn commit_session<S: ContentStore + 'static>(
    State(manager): State<AppState<S>>,
    Path(session_id): Path<String>,
    body: Option<RequestJson<CommitRequest>>,
) -> ApiResult<(StatusCode, Json<ContentRecord>)> {
    let request = body.map(|RequestJson(request)| request).unwrap_or_default();

    let record = manager
        .commit_session(&session_id, request.content)
        .await
        .map_err(to_response)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn abandon_session<S: ContentStore + 'static>(
    State(manager): State<AppState<S>>,
    Path(session_id): Path<String>,
    RequestJson(request): RequestJson<AbandonRequest>,
) -> ApiResult<(StatusCode, Json<AbandonOutcome>)> {
    let outcome = manager
        .abandon_session(&session_id, request.trigger)
        .await
        .map_err(to_response)?;

    let status = match outcome {
        AbandonOutcome::Dispatched | AbandonOutcome::Deferred => StatusCode::ACCEPTED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}

pub async fn request_navigate<S: ContentStore + 'static>(
    State(manager): State<AppState<S>>,
    Path(session_id): Path<String>,
    RequestJson(request): RequestJson<NavigateRequest>,
) -> ApiResult<Json<NavigationOutcome>> {
    let session = manager.get(&session_id).map_err(to_response)?;
    let outcome = session
        .request_navigate(&request.target)
        .await
        .map_err(to_response)?;
    Ok(Json(outcome))
}

pub async fn resolve_navigation<S: ContentStore + 'static>(
    State(manager): State<AppState<S>>,
    Path(session_id): Path<String>,
    RequestJson(request): RequestJson<ResolveNavigationRequest>,
) -> ApiResult<Json<NavigationOutcome>> {
    let outcome = manager
        .resolve_navigation(&session_id, request.decision)
        .await
        .map_err(to_response)?;
    Ok(Json(outcome))
}

pub async fn get_record<S: ContentStore + 'static>(
    State(manager): State<AppState<S>>,
    Path((category, id)): Path<(String, Identifier)>,
) -> ApiResult<Json<ContentRecord>> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!(
                "Record {}/{} not found",
                category, id
            ))),
        )
    };
    let normalized = normalize_category(&category).ok_or_else(not_found)?;

    match manager.store().get_record(&normalized, id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(not_found()),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(&e.to_string())),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&DraftError::SessionNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&DraftError::NoPendingNavigation),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_status(&DraftError::Allocation {
                category: "news".to_string(),
                message: "down".to_string()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_status(&DraftError::EmptyUpload {
                file_name: "a.png".to_string()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&DraftError::SaveInProgress {
                target: "/admin".to_string()
            }),
            StatusCode::CONFLICT
        );
    }
}
