use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    DocumentKind, ExportFormat, ImportSection, LedgerField, LedgerRow, LessonPlanner,
    PlannerError, PlannerSettings, ScheduleSlot, SlotField, SlotId, Status, SubjectCatalog,
    dates, import,
};

#[derive(Clone)]
pub struct AppState {
    planner: Arc<RwLock<LessonPlanner>>,
}

impl AppState {
    pub fn new(planner: LessonPlanner) -> Self {
        Self {
            planner: Arc::new(RwLock::new(planner)),
        }
    }

    pub fn with_shared(planner: Arc<RwLock<LessonPlanner>>) -> Self {
        Self { planner }
    }

    fn planner(&self) -> Arc<RwLock<LessonPlanner>> {
        self.planner.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PlannerError> for ApiError {
    fn from(value: PlannerError) -> Self {
        let message = value.status().message;
        match value {
            PlannerError::NothingToSynchronize => ApiError::Conflict(message),
            PlannerError::ContentNotFound(_) => ApiError::NotFound(message),
            PlannerError::NoFileSelected
            | PlannerError::InvalidData(_)
            | PlannerError::UnsupportedFormat(_)
            | PlannerError::Zip(_)
            | PlannerError::Xml(_)
            | PlannerError::Csv(_) => ApiError::Invalid(message),
            _ => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                let body = Json(ErrorBody {
                    error: "not_found",
                    message,
                });
                (StatusCode::NOT_FOUND, body).into_response()
            }
            ApiError::Conflict(message) => {
                let body = Json(ErrorBody {
                    error: "conflict",
                    message,
                });
                (StatusCode::CONFLICT, body).into_response()
            }
            ApiError::Invalid(message) => {
                let body = Json(ErrorBody {
                    error: "invalid_request",
                    message,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal(message) => {
                let body = Json(ErrorBody {
                    error: "internal_error",
                    message,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct FieldUpdate {
    field: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct NamePayload {
    name: String,
}

#[derive(Debug, Serialize)]
struct SyncResponse {
    status: Status,
    rows: Vec<LedgerRow>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/grid", get(list_slots))
        .route("/grid/slots/:id", put(update_slot))
        .route("/grid/days/:day/sessions", post(append_session))
        .route("/lesson-plan/save", post(save_lesson_plan))
        .route("/sync", post(synchronize))
        .route("/ledger", get(list_ledger))
        .route("/ledger/:index", put(update_ledger))
        .route("/subjects", get(get_subjects))
        .route(
            "/subjects/:group/:subject",
            post(add_subject).delete(delete_subject),
        )
        .route(
            "/subjects/:group/:subject/sub_subjects",
            post(add_sub_subject),
        )
        .route(
            "/subjects/:group/:subject/sub_subjects/:index",
            axum::routing::delete(delete_sub_subject),
        )
        .route("/import/:section/:format", post(import_records))
        .route("/templates/:section", get(download_template))
        .route("/export/:kind/:format", get(export_document))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, planner: LessonPlanner) -> std::io::Result<()> {
    let state = AppState::new(planner);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_settings(State(state): State<AppState>) -> Json<PlannerSettings> {
    let planner = state.planner();
    let settings = planner.read().settings().clone();
    Json(settings)
}

async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<PlannerSettings>,
) -> Json<PlannerSettings> {
    let planner = state.planner();
    planner.write().set_settings(settings.clone());
    Json(settings)
}

async fn list_slots(State(state): State<AppState>) -> Json<Vec<ScheduleSlot>> {
    let planner = state.planner();
    let slots = planner.read().grid().slots().to_vec();
    Json(slots)
}

async fn update_slot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<FieldUpdate>,
) -> Result<Json<ScheduleSlot>, ApiError> {
    let id: SlotId = id.parse().map_err(ApiError::invalid)?;
    let field: SlotField = payload.field.parse().map_err(ApiError::invalid)?;
    let planner = state.planner();
    let mut guard = planner.write();
    if !guard.update_slot(id, field, payload.value) {
        return Err(ApiError::not_found(format!("slot {id} not found")));
    }
    let slot = guard
        .grid()
        .get(id)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("slot {id} not found")))?;
    Ok(Json(slot))
}

async fn append_session(
    State(state): State<AppState>,
    Path(day): Path<u8>,
) -> Result<(StatusCode, Json<SlotId>), ApiError> {
    let planner = state.planner();
    let id = planner
        .write()
        .append_session(day)
        .ok_or_else(|| ApiError::invalid(format!("day index {day} is outside the week")))?;
    Ok((StatusCode::CREATED, Json(id)))
}

async fn save_lesson_plan(State(state): State<AppState>) -> Json<Status> {
    let planner = state.planner();
    let status = planner.write().save_lesson_plan();
    Json(status)
}

async fn synchronize(State(state): State<AppState>) -> Result<Json<SyncResponse>, ApiError> {
    let planner = state.planner();
    let mut guard = planner.write();
    let status = guard.synchronize();
    if !status.is_success() {
        return Err(ApiError::Conflict(status.message));
    }
    Ok(Json(SyncResponse {
        status,
        rows: guard.ledger().rows().to_vec(),
    }))
}

async fn list_ledger(State(state): State<AppState>) -> Json<Vec<LedgerRow>> {
    let planner = state.planner();
    let rows = planner.read().ledger().rows().to_vec();
    Json(rows)
}

async fn update_ledger(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(payload): Json<FieldUpdate>,
) -> Result<Json<LedgerRow>, ApiError> {
    let field: LedgerField = payload.field.parse().map_err(ApiError::invalid)?;
    let planner = state.planner();
    let mut guard = planner.write();
    if !guard.update_ledger(index, field, payload.value) {
        return Err(ApiError::not_found(format!("ledger row {index} not found")));
    }
    let row = guard.ledger().rows()[index].clone();
    Ok(Json(row))
}

async fn get_subjects(State(state): State<AppState>) -> Json<SubjectCatalog> {
    let planner = state.planner();
    let catalog = planner.read().catalog().clone();
    Json(catalog)
}

async fn add_subject(
    State(state): State<AppState>,
    Path((group, subject)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let planner = state.planner();
    if planner.write().catalog_mut().add_subject(&group, &subject) {
        Ok(StatusCode::CREATED)
    } else {
        Err(ApiError::invalid("subject name must not be blank"))
    }
}

async fn delete_subject(
    State(state): State<AppState>,
    Path((group, subject)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let planner = state.planner();
    if planner.write().catalog_mut().delete_subject(&group, &subject) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("subject {subject} not found")))
    }
}

async fn add_sub_subject(
    State(state): State<AppState>,
    Path((group, subject)): Path<(String, String)>,
    Json(payload): Json<NamePayload>,
) -> Result<StatusCode, ApiError> {
    let planner = state.planner();
    if planner
        .write()
        .catalog_mut()
        .add_sub_subject(&group, &subject, &payload.name)
    {
        Ok(StatusCode::CREATED)
    } else {
        Err(ApiError::invalid(format!(
            "cannot add '{}' to subject {subject}",
            payload.name
        )))
    }
}

async fn delete_sub_subject(
    State(state): State<AppState>,
    Path((group, subject, index)): Path<(String, String, usize)>,
) -> Result<StatusCode, ApiError> {
    let planner = state.planner();
    if planner
        .write()
        .catalog_mut()
        .delete_sub_subject(&group, &subject, index)
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!(
            "sub-subject {index} of {subject} not found"
        )))
    }
}

async fn import_records(
    State(state): State<AppState>,
    Path((section, format)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Status>, ApiError> {
    let section: ImportSection = section.parse().map_err(ApiError::invalid)?;
    if body.is_empty() {
        return Err(PlannerError::NoFileSelected.into());
    }
    let table = match format.as_str() {
        "xlsx" => import::read_xlsx(&body)?,
        "csv" => import::read_csv(body.as_ref())?,
        other => return Err(PlannerError::UnsupportedFormat(other.to_string()).into()),
    };
    let planner = state.planner();
    let status = planner.write().accept_import(section, table);
    Ok(Json(status))
}

fn attachment(filename: &str, content_type: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn download_template(Path(section): Path<String>) -> Result<Response, ApiError> {
    let section: ImportSection = section.parse().map_err(ApiError::invalid)?;
    let template = section.template();
    let bytes = template.to_xlsx()?;
    Ok(attachment(
        template.filename,
        ExportFormat::Spreadsheet.content_type(),
        bytes,
    ))
}

async fn export_document(
    State(state): State<AppState>,
    Path((kind, format)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let kind: DocumentKind = kind.parse().map_err(ApiError::invalid)?;
    let format: ExportFormat = format.parse().map_err(ApiError::invalid)?;
    let planner = state.planner();
    let file = planner.read().export_document(kind, format, dates::today())?;
    Ok(attachment(&file.filename, file.content_type, file.bytes))
}
