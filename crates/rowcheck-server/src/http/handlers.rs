// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::RequestTrace;
use crate::http::response_contract::ApiFailure;
use crate::AppState;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use rowcheck_core::{sha256_hex, validate_upload, CsvFileName, Error, REPORT_FILE_NAME};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub(crate) const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateParams {
    filename: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DownloadParams {
    filename: Option<String>,
}

pub(crate) async fn home_handler() -> impl IntoResponse {
    Json(json!({"message": "API working"}))
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match receive_upload(&state, multipart).await {
        Ok(name) => {
            info!(filename = %name, "file uploaded");
            Json(json!({"message": "File uploaded", "filename": name.as_str()})).into_response()
        }
        Err(failure) => failure.into_response_for(&trace.request_id),
    }
}

async fn receive_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<CsvFileName, ApiFailure> {
    let mut multipart = multipart.map_err(|rejection| {
        ApiFailure::unprocessable(
            "request body must be multipart/form-data",
            json!({"reason": rejection.body_text()}),
        )
    })?;
    let limit = state.config.max_upload_bytes;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_failure(&e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let raw_name = field.file_name().map(ToString::to_string).ok_or_else(|| {
            ApiFailure::unprocessable(
                "multipart field `file` carries no filename",
                json!({"field": UPLOAD_FIELD}),
            )
        })?;
        let name = CsvFileName::parse(&raw_name)?;
        let content = field
            .bytes()
            .await
            .map_err(|e| multipart_failure(&e, limit))?;
        let storage = Arc::clone(&state.storage);
        let stored = name.clone();
        run_blocking(move || storage.save_upload(&stored, &content).map(|_| ())).await?;
        return Ok(name);
    }
    Err(ApiFailure::unprocessable(
        "missing multipart field `file`",
        json!({"field": UPLOAD_FIELD}),
    ))
}

fn multipart_failure(err: &MultipartError, limit: usize) -> ApiFailure {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return Error::PayloadTooLarge { limit }.into();
    }
    Error::InvalidInput(format!("malformed multipart body: {}", err.body_text())).into()
}

pub(crate) async fn validate_handler(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
    params: Result<Query<ValidateParams>, QueryRejection>,
) -> Response {
    match run_validation(&state, params).await {
        Ok(total_errors) => Json(json!({"total_errors": total_errors})).into_response(),
        Err(failure) => failure.into_response_for(&trace.request_id),
    }
}

async fn run_validation(
    state: &AppState,
    params: Result<Query<ValidateParams>, QueryRejection>,
) -> Result<usize, ApiFailure> {
    let Query(params) = params.map_err(|rejection| {
        ApiFailure::unprocessable(
            "query parameter `filename` is required",
            json!({"reason": rejection.body_text()}),
        )
    })?;
    let name = stored_name(&params.filename)?;
    let storage = Arc::clone(&state.storage);
    let policy = Arc::clone(&state.scan_policy);
    let _slot = state.report_slot.lock().await;
    let summary = run_blocking(move || validate_upload(&storage, &name, &policy)).await?;
    Ok(summary.total_errors)
}

pub(crate) async fn download_handler(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> Response {
    match fetch_report(&state, params).await {
        Ok(bytes) => report_response(bytes),
        Err(failure) => failure.into_response_for(&trace.request_id),
    }
}

async fn fetch_report(
    state: &AppState,
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> Result<Vec<u8>, ApiFailure> {
    let Query(params) = params.map_err(|rejection| {
        ApiFailure::unprocessable(
            "invalid download query",
            json!({"reason": rejection.body_text()}),
        )
    })?;
    let name = params.filename.as_deref().map(stored_name).transpose()?;
    let storage = Arc::clone(&state.storage);
    let _slot = state.report_slot.lock().await;
    run_blocking(move || storage.read_report(name.as_ref())).await
}

fn report_response(bytes: Vec<u8>) -> Response {
    let etag = format!("\"{}\"", sha256_hex(&bytes));
    let mut resp = (StatusCode::OK, bytes).into_response();
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    if let Ok(value) =
        HeaderValue::from_str(&format!("attachment; filename=\"{REPORT_FILE_NAME}\""))
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, value);
    }
    resp
}

/// Resolves a client-supplied name that refers to an existing upload. A name
/// outside the upload policy can never have been stored, so it is reported
/// as absent rather than malformed.
fn stored_name(raw: &str) -> Result<CsvFileName, ApiFailure> {
    CsvFileName::parse(raw)
        .map_err(|_| Error::NotFound(format!("file {raw:?} has not been uploaded")).into())
}

async fn run_blocking<T, F>(work: F) -> Result<T, ApiFailure>
where
    F: FnOnce() -> rowcheck_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| {
            ApiFailure::internal("storage task failed", json!({"message": e.to_string()}))
        })?
        .map_err(ApiFailure::from)
}
