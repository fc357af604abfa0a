//! Upload Route
//!
//! - POST /api/upload-pdf - OCR extraction of a statement PDF
//!
//! Always answers with an [`ExtractionResponse`]; failures carry
//! `success: false` plus `error` and `message`.

use axum::{extract::Multipart, http::StatusCode, Json};

use crate::models::ExtractionResponse;
use crate::sandbox::extraction;

type UploadReply = (StatusCode, Json<ExtractionResponse>);

fn reject(error: &str, message: impl Into<String>) -> UploadReply {
    (
        StatusCode::BAD_REQUEST,
        Json(ExtractionResponse::failure(error, message)),
    )
}

/// POST /api/upload-pdf
pub async fn upload_pdf(mut multipart: Multipart) -> UploadReply {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return reject("No file provided", "Expected a multipart field named 'file'"),
            Err(e) => return reject("Invalid upload", e.to_string()),
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return reject("Invalid upload", e.to_string()),
        };

        if !extraction::is_pdf(&bytes) {
            return reject("Invalid file type", "Only PDF files are supported");
        }

        let response = extraction::extract(&bytes);
        tracing::info!(
            %file_name,
            size = bytes.len(),
            success = response.success,
            "Processed upload"
        );

        let status = if response.success {
            StatusCode::OK
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        return (status, Json(response));
    }
}
