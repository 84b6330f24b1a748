use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::XLSX_CONTENT_TYPE;
use super::form::ComputeForm;
use super::service::{ComputeOutcome, ReviewError, ReviewService};
use super::solver::{AssignmentSolver, SolveMode, TEMPLATE_FILE_NAME};
use super::sorter::SortKey;
use crate::error::AppError;

/// Router exposing the review session over HTTP. Input uploads may be up to
/// `max_upload_bytes` long; other bodies keep axum's default limit.
pub fn review_router<S>(service: Arc<ReviewService<S>>, max_upload_bytes: usize) -> Router
where
    S: AssignmentSolver + 'static,
{
    Router::new()
        .route("/api/v1/review", get(view_handler::<S>))
        .route(
            "/api/v1/review/input",
            put(input_handler::<S>).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/v1/review/form", put(form_handler::<S>))
        .route("/api/v1/review/compute/:mode", post(compute_handler::<S>))
        .route("/api/v1/review/sort", post(sort_handler::<S>))
        .route("/api/v1/review/result", get(result_handler::<S>))
        .route("/api/v1/review/rows.csv", get(csv_handler::<S>))
        .route("/api/v1/review/template", get(template_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct InputQuery {
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SortRequest {
    key: SortKey,
}

pub(crate) async fn view_handler<S>(State(service): State<Arc<ReviewService<S>>>) -> Response
where
    S: AssignmentSolver + 'static,
{
    (StatusCode::OK, axum::Json(service.view())).into_response()
}

pub(crate) async fn input_handler<S>(
    State(service): State<Arc<ReviewService<S>>>,
    Query(query): Query<InputQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: AssignmentSolver + 'static,
{
    if !is_workbook_body(&headers) {
        let payload = json!({
            "error": "upload the workbook as the raw request body",
        });
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, axum::Json(payload)).into_response();
    }

    match service.select_input(&query.name, body.to_vec()) {
        Ok(heavy_keys) => {
            let payload = json!({
                "input_name": query.name,
                "heavy_keys": heavy_keys,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn form_handler<S>(
    State(service): State<Arc<ReviewService<S>>>,
    axum::Json(form): axum::Json<ComputeForm>,
) -> Response
where
    S: AssignmentSolver + 'static,
{
    service.update_form(form.clone());
    (StatusCode::OK, axum::Json(form)).into_response()
}

pub(crate) async fn compute_handler<S>(
    State(service): State<Arc<ReviewService<S>>>,
    Path(mode): Path<String>,
) -> Response
where
    S: AssignmentSolver + 'static,
{
    let mode = match mode.parse::<SolveMode>() {
        Ok(mode) => mode,
        Err(message) => {
            let payload = json!({ "error": message });
            return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
        }
    };

    match service.compute(mode).await {
        Ok(ComputeOutcome::Applied {
            generation,
            rows,
            heavy_rows,
            decode_error,
        }) => {
            let payload = json!({
                "status": "applied",
                "generation": generation,
                "rows": rows,
                "heavy_rows": heavy_rows,
                "decode_error": decode_error,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(ComputeOutcome::Discarded) => {
            let payload = json!({
                "status": "discarded",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn sort_handler<S>(
    State(service): State<Arc<ReviewService<S>>>,
    axum::Json(request): axum::Json<SortRequest>,
) -> Response
where
    S: AssignmentSolver + 'static,
{
    let state = service.sort_by(request.key);
    (StatusCode::OK, axum::Json(state)).into_response()
}

pub(crate) async fn result_handler<S>(State(service): State<Arc<ReviewService<S>>>) -> Response
where
    S: AssignmentSolver + 'static,
{
    match service.download() {
        Some(download) => attachment(&download.file_name, download.bytes),
        None => error_response(ReviewError::NoResult),
    }
}

pub(crate) async fn csv_handler<S>(State(service): State<Arc<ReviewService<S>>>) -> Response
where
    S: AssignmentSolver + 'static,
{
    let mut buffer = Vec::new();
    match service.export_csv(&mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string())],
            buffer,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn template_handler<S>(State(service): State<Arc<ReviewService<S>>>) -> Response
where
    S: AssignmentSolver + 'static,
{
    match service.template().await {
        Ok(bytes) => attachment(TEMPLATE_FILE_NAME, bytes),
        Err(error) => error_response(error),
    }
}

fn attachment(file_name: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{file_name}\"");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// Uploads must carry the workbook itself, not a form or a JSON envelope.
fn is_workbook_body(headers: &HeaderMap) -> bool {
    let Some(raw) = headers.get(header::CONTENT_TYPE) else {
        return true;
    };
    let Ok(content_type) = raw.to_str().unwrap_or_default().parse::<mime::Mime>() else {
        return false;
    };

    content_type.type_() != mime::TEXT
        && content_type.type_() != mime::MULTIPART
        && content_type.essence_str() != mime::APPLICATION_JSON.essence_str()
}

fn error_response(error: ReviewError) -> Response {
    AppError::from(error).into_response()
}
