//! Web server module.
//!
//! Serves the server-rendered patient pages and health probes. Every data
//! access goes through the injected [`PatientStore`].

use std::sync::Arc;

use askama::Template;
use axum::{
    Form, Json, Router,
    extract::{FromRequest, Path, Request, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::storage::{NewPatient, PatientId, PatientRow, PatientStore, SearchFilter, StorageError};

/// Format of the `visit_date` search field.
const VISIT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: PatientStore,
    /// Directory of static assets served for unmatched paths.
    pub static_dir: String,
}

impl AppState {
    pub fn new(store: PatientStore) -> Self {
        Self {
            store,
            static_dir: "public".to_string(),
        }
    }

    pub fn with_static_dir(mut self, dir: impl Into<String>) -> Self {
        self.static_dir = dir.into();
        self
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<String>,
}

/// Body of `POST /add`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddPatientForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_number: Option<String>,
    pub medical_history: Option<String>,
    pub treatment_notes: Option<String>,
}

impl AddPatientForm {
    /// Convert into an insert stamped with the visit time.
    fn into_new_patient(self) -> NewPatient {
        NewPatient {
            first_name: self.first_name,
            last_name: self.last_name,
            contact_number: self.contact_number,
            medical_history: self.medical_history,
            treatment_notes: self.treatment_notes,
            last_visit_date: Some(crate::storage::now()),
        }
    }
}

/// Body of `POST /search`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub search_term: Option<String>,
    pub visit_date: Option<String>,
}

impl SearchForm {
    fn into_filter(self) -> Result<SearchFilter, AppError> {
        let visit_date = match self.visit_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, VISIT_DATE_FORMAT)
                    .map_err(|_| AppError::BadRequest(format!("invalid visit_date '{}'", raw)))?,
            ),
        };
        Ok(SearchFilter::new(self.search_term, visit_date))
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Home page: patient list and add form.
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    patients: Vec<PatientRow>,
}

/// Full records page.
#[derive(Template)]
#[template(path = "records.html")]
struct RecordsTemplate {
    patients: Vec<PatientRow>,
}

/// Search form.
#[derive(Template)]
#[template(path = "search.html")]
struct SearchTemplate;

/// Search results.
#[derive(Template)]
#[template(path = "results.html")]
struct ResultsTemplate {
    patients: Vec<PatientRow>,
}

/// Wrapper to render Askama templates as Axum responses.
struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(rendered) => Html(rendered).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Template render failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

// =============================================================================
// Errors & extractors
// =============================================================================

/// Route-level failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage failed; the client only sees `context`.
    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    fn storage(context: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Storage { context, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Storage { context, source } => {
                tracing::error!(error = %source, "{}", context);
                (StatusCode::INTERNAL_SERVER_ERROR, context).into_response()
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
        }
    }
}

/// Accepts either a JSON or a form-encoded body.
pub struct FormOrJson<T>(pub T);

impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    let app_state = Arc::new(state);

    Router::new()
        .route("/", get(index_handler))
        .route("/add", post(add_handler))
        .route("/delete/{id}", post(delete_handler))
        .route("/search", get(search_form_handler).post(search_handler))
        .route("/records", get(records_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .fallback_service(static_files)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(app_state)
}

/// Home page with all patients.
async fn index_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let patients = state
        .store
        .list_all()
        .await
        .map_err(AppError::storage("Error fetching patients"))?;
    Ok(HtmlTemplate(IndexTemplate { patients }))
}

/// Insert a patient, stamping the visit with the current time.
async fn add_handler(
    State(state): State<Arc<AppState>>,
    FormOrJson(form): FormOrJson<AddPatientForm>,
) -> Result<Redirect, AppError> {
    let row = state
        .store
        .insert(form.into_new_patient())
        .await
        .map_err(AppError::storage("Error adding patient"))?;
    tracing::info!(id = row.id, "Patient added");
    Ok(Redirect::to("/"))
}

/// Delete a patient. Ids that are not numbers match nothing.
async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    match id.trim().parse::<PatientId>() {
        Ok(id) => {
            state
                .store
                .delete(id)
                .await
                .map_err(AppError::storage("Error deleting patient"))?;
            tracing::info!(id, "Patient deleted");
        }
        Err(_) => tracing::debug!(id = %id, "Ignoring delete of non-numeric id"),
    }
    Ok(Redirect::to("/"))
}

/// Search form page.
async fn search_form_handler() -> impl IntoResponse {
    HtmlTemplate(SearchTemplate)
}

/// Run a filtered search.
async fn search_handler(
    State(state): State<Arc<AppState>>,
    FormOrJson(form): FormOrJson<SearchForm>,
) -> Result<impl IntoResponse, AppError> {
    let filter = form.into_filter()?;
    let patients = state
        .store
        .search(filter)
        .await
        .map_err(AppError::storage("Error searching patients"))?;
    Ok(HtmlTemplate(ResultsTemplate { patients }))
}

/// Full records page.
async fn records_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let patients = state
        .store
        .list_all()
        .await
        .map_err(AppError::storage("Error fetching patients"))?;
    Ok(HtmlTemplate(RecordsTemplate { patients }))
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: None,
        db: None,
    })
}

/// Readiness probe that checks the storage backend.
async fn readyz_handler(State(state): State<Arc<AppState>>) -> Response {
    let backend = Some(state.store.kind().to_string());

    match state.store.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "ok".to_string(),
            backend,
            db: Some("ready".to_string()),
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "not_ready".to_string(),
                    backend,
                    db: Some(err.to_string()),
                }),
            )
                .into_response()
        }
    }
}
