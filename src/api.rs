// 🌐 REST API - Wizard session and application store over HTTP
// One wizard per server, behind a mutex: every request is a single dispatch.

use crate::documents::UploadedDocument;
use crate::registration::{ApplicationStatus, PaymentMethod};
use crate::step::Step;
use crate::store::{ApplicationStore, LocalStorageStore};
use crate::submission::{export_file_name, Application};
use crate::wizard::{Outcome, RegistrationWizard, WizardEvent, WizardState};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub wizard: Arc<Mutex<RegistrationWizard<LocalStorageStore>>>,
}

impl AppState {
    pub fn new(wizard: RegistrationWizard<LocalStorageStore>) -> Self {
        AppState {
            wizard: Arc::new(Mutex::new(wizard)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistrationWizard<LocalStorageStore>> {
        // Commits are single assignments: a poisoned lock still holds a consistent wizard
        self.wizard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn failure(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
        .into_response()
}

/// Application list entry (registration payload omitted)
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationSummary {
    application_reference: String,
    applicant_name: String,
    status: ApplicationStatus,
    submitted_at: DateTime<Utc>,
    payment_method: Option<PaymentMethod>,
}

impl From<Application> for ApplicationSummary {
    fn from(app: Application) -> Self {
        Self {
            payment_method: app.payment_method(),
            application_reference: app.application_reference,
            applicant_name: app.applicant_name,
            status: app.status,
            submitted_at: app.submitted_at,
        }
    }
}

/// Wizard state plus the derived display values
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WizardResponse {
    state: WizardState,
    path: Vec<Step>,
    step_number: Option<usize>,
    total_steps: usize,
    progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<Outcome>,
}

impl WizardResponse {
    fn new(state: &WizardState, outcome: Option<Outcome>) -> Self {
        Self {
            state: state.clone(),
            path: state.path(),
            step_number: state.step_number(),
            total_steps: state.total_steps(),
            progress_percent: state.progress_percent(),
            outcome,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptRequest {
    file_name: String,
    size_bytes: u64,
    #[serde(default)]
    sha256: Option<String>,
}

fn decode_reference(reference: String) -> String {
    urlencoding::decode(&reference)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(reference)
}

fn store_failure(reference: &str, e: crate::error::StoreError) -> Response {
    match e {
        crate::error::StoreError::NotFound(_) => {
            failure(StatusCode::NOT_FOUND, format!("Application not found: {}", reference))
        }
        other => {
            error!(reference, error = %other, "store operation failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/applications - All stored applications
async fn list_applications(State(state): State<AppState>) -> Response {
    let wizard = state.lock();
    let summaries: Vec<ApplicationSummary> = wizard
        .store()
        .list()
        .into_iter()
        .map(ApplicationSummary::from)
        .collect();
    ApiResponse::ok(summaries)
}

/// GET /api/applications/:reference - One application in full
async fn get_application(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Response {
    let reference = decode_reference(reference);
    match state.lock().store().find(&reference) {
        Some(app) => ApiResponse::ok(app),
        None => failure(StatusCode::NOT_FOUND, format!("Application not found: {}", reference)),
    }
}

/// DELETE /api/applications/:reference
async fn delete_application(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Response {
    let reference = decode_reference(reference);
    match state.lock().store_mut().remove(&reference) {
        Ok(app) => ApiResponse::ok(ApplicationSummary::from(app)),
        Err(e) => store_failure(&reference, e),
    }
}

/// POST /api/applications/:reference/receipt - Attach an offline-payment receipt
async fn attach_receipt(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(request): Json<ReceiptRequest>,
) -> Response {
    let reference = decode_reference(reference);
    let mut receipt = UploadedDocument::new(Step::Review, "receipt", &request.file_name, request.size_bytes);
    receipt.sha256 = request.sha256;

    match state.lock().store_mut().attach_receipt(&reference, receipt) {
        Ok(app) => ApiResponse::ok(ApplicationSummary::from(app)),
        Err(e) => store_failure(&reference, e),
    }
}

/// GET /api/applications/:reference/export - Download as JSON
async fn export_application(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Response {
    let reference = decode_reference(reference);
    let Some(app) = state.lock().store().find(&reference) else {
        return failure(StatusCode::NOT_FOUND, format!("Application not found: {}", reference));
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(Some(&app.application_reference))
    );
    (
        StatusCode::OK,
        [(header::CONTENT_DISPOSITION, disposition)],
        Json(app.registration),
    )
        .into_response()
}

/// GET /api/wizard - Current wizard session
async fn get_wizard(State(state): State<AppState>) -> Response {
    let wizard = state.lock();
    ApiResponse::ok(WizardResponse::new(wizard.state(), None))
}

/// POST /api/wizard/events - Dispatch one wizard event
async fn post_event(State(state): State<AppState>, Json(event): Json<WizardEvent>) -> Response {
    let mut wizard = state.lock();
    let outcome = wizard.dispatch(event);

    let status = match outcome {
        Outcome::Rejected(_) => StatusCode::CONFLICT,
        _ => StatusCode::OK,
    };
    let body = WizardResponse::new(wizard.state(), Some(outcome));
    (
        status,
        Json(ApiResponse {
            success: status == StatusCode::OK,
            data: Some(body),
            error: None,
        }),
    )
        .into_response()
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/applications", get(list_applications))
        .route(
            "/applications/:reference",
            get(get_application).delete(delete_application),
        )
        .route("/applications/:reference/receipt", post(attach_receipt))
        .route("/applications/:reference/export", get(export_application))
        .route("/wizard", get(get_wizard))
        .route("/wizard/events", post(post_event))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let store = LocalStorageStore::in_memory().unwrap();
        router(AppState::new(RegistrationWizard::new(store)))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_list_seed_applications() {
        let (status, body) = send(&app(), "GET", "/api/applications", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"][0]["applicationReference"], "LRA/GST/2025/000001");
    }

    #[tokio::test]
    async fn test_encoded_reference_lookup_and_delete() {
        let app = app();
        let uri = "/api/applications/LRA%2FGST%2F2025%2F000002";

        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["applicantName"], "Musu Johnson");

        let (status, _) = send(&app, "DELETE", uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_attach_receipt() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/applications/LRA%2FGST%2F2025%2F000003/receipt",
            Some(json!({ "fileName": "slip.pdf", "sizeBytes": 1024 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "under-review");
    }

    #[tokio::test]
    async fn test_export_sets_download_name() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/applications/LRA%2FGST%2F2025%2F000001/export")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"GST_Application_LRA-GST-2025-000001.json\""
        );
    }

    #[tokio::test]
    async fn test_wizard_events() {
        let app = app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/wizard/events",
            Some(json!({
                "type": "complete",
                "payload": { "payload": { "step": "entry", "data": { "entryPoint": "individual" } } }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["state"]["currentStep"], "individual");
        assert_eq!(body["data"]["outcome"]["outcome"], "moved");

        let (status, body) = send(
            &app,
            "POST",
            "/api/wizard/events",
            Some(json!({ "type": "go-to", "payload": "review" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["data"]["outcome"]["reason"], "step-not-completed");

        let (_, body) = send(&app, "GET", "/api/wizard", None).await;
        assert_eq!(body["data"]["state"]["view"], "individual");
    }
}
