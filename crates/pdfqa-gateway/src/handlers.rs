use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pdfqa_core::IngestError;
use pdfqa_memory::DocumentSummary;

use super::error::ApiError;
use super::server::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(serde::Serialize)]
struct UploadResponse {
    message: &'static str,
    id: String,
}

#[derive(serde::Serialize)]
struct ListResponse {
    pdfs: Vec<DocumentSummary>,
}

#[derive(serde::Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
}

struct UploadedFile {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

fn missing_file() -> ApiError {
    ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Missing file field")
}

fn multipart_error(e: &MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "File too large");
    }
    tracing::debug!("malformed multipart body: {e}");
    missing_file()
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        return Ok(UploadedFile {
            filename,
            content_type,
            bytes,
        });
    }
    Err(missing_file())
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let multipart = multipart.map_err(|e| {
        tracing::debug!("rejected upload request: {e}");
        missing_file()
    })?;
    let file = read_upload(multipart).await?;

    let id = state
        .ingestor
        .ingest(
            file.filename.as_deref(),
            file.content_type.as_deref(),
            &file.bytes,
        )
        .await
        .map_err(|e| {
            let status = match e {
                IngestError::InvalidType => StatusCode::BAD_REQUEST,
                IngestError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
                IngestError::Io(ref inner) => {
                    tracing::error!("failed to write upload: {inner}");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                IngestError::Storage(ref inner) => {
                    tracing::error!("failed to store document: {inner}");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            ApiError::new(status, e.to_string())
        })?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully",
        id: id.to_string(),
    }))
}

pub(crate) async fn list_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let pdfs = state.store.list_documents().await.map_err(|e| {
        tracing::error!("failed to list documents: {e}");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error retrieving PDFs: {e}"),
        )
    })?;

    if pdfs.is_empty() {
        return Ok(Json(MessageResponse {
            message: "No PDFs found in the database.",
        })
        .into_response());
    }
    Ok(Json(ListResponse { pdfs }).into_response())
}

pub(crate) async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let json = serde_json::to_string(&HealthResponse { status: "ok" }).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);
    }

    #[test]
    fn upload_response_shape() {
        let resp = UploadResponse {
            message: "File uploaded successfully",
            id: "abc".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "File uploaded successfully", "id": "abc"})
        );
    }
}
