//! PDF upload tester
//!
//! Picks one statement file, checks it is a PDF, posts it to the chosen
//! extraction deployment and keeps the structured answer for rendering.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::client::ExtractionService;
use crate::models::ExtractionResponse;

pub const PDF_MIME: &str = "application/pdf";

/// Errors raised before anything is sent
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Please upload a PDF file ({name} is {mime})")]
    NotPdf { name: String, mime: String },

    #[error("{name} does not look like a PDF (missing %PDF- header)")]
    NotPdfContent { name: String },

    #[error("Please select a PDF file")]
    NoFile,

    #[error("Failed to read {path:?}: {error}")]
    Read { path: PathBuf, error: String },
}

/// Which extraction deployment to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadTarget {
    Local,
    #[default]
    Hosted,
}

impl std::str::FromStr for UploadTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(UploadTarget::Local),
            "hosted" | "azure" | "production" => Ok(UploadTarget::Hosted),
            other => Err(format!("Unknown upload target: {} (use local or hosted)", other)),
        }
    }
}

impl std::fmt::Display for UploadTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadTarget::Local => write!(f, "local"),
            UploadTarget::Hosted => write!(f, "hosted"),
        }
    }
}

/// The two extraction deployments
#[derive(Debug, Clone, PartialEq)]
pub struct UploadEndpoints {
    pub local: String,
    pub hosted: String,
}

impl Default for UploadEndpoints {
    fn default() -> Self {
        Self {
            local: "http://127.0.0.1:5001/api/upload-pdf".to_string(),
            hosted: "https://ocr-backend-app.azurewebsites.net/api/upload-pdf".to_string(),
        }
    }
}

impl UploadEndpoints {
    pub fn url(&self, target: UploadTarget) -> &str {
        match target {
            UploadTarget::Local => &self.local,
            UploadTarget::Hosted => &self.hosted,
        }
    }
}

/// MIME type as a file picker would report it, from the extension
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("pdf") => PDF_MIME,
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// A file that passed the PDF check
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFile {
    name: String,
    bytes: Vec<u8>,
}

impl PdfFile {
    /// Accept `bytes` only when both the declared MIME type and the header say PDF
    pub fn new(name: impl Into<String>, mime: &str, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let name = name.into();
        if mime != PDF_MIME {
            return Err(UploadError::NotPdf {
                name,
                mime: mime.to_string(),
            });
        }
        if !bytes.starts_with(b"%PDF-") {
            return Err(UploadError::NotPdfContent { name });
        }
        Ok(Self { name, bytes })
    }

    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.pdf".to_string());
        let mime = mime_for(path);

        // Reject on the extension before touching the disk
        if mime != PDF_MIME {
            return Err(UploadError::NotPdf {
                name,
                mime: mime.to_string(),
            });
        }

        let bytes = std::fs::read(path).map_err(|e| UploadError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::new(name, mime, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Upload tester controller
pub struct UploadTester<S> {
    service: S,
    endpoints: UploadEndpoints,
    target: UploadTarget,
    file: Option<PdfFile>,
    response: Option<ExtractionResponse>,
}

impl<S: ExtractionService> UploadTester<S> {
    pub fn new(service: S, endpoints: UploadEndpoints, target: UploadTarget) -> Self {
        Self {
            service,
            endpoints,
            target,
            file: None,
            response: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn target(&self) -> UploadTarget {
        self.target
    }

    pub fn set_target(&mut self, target: UploadTarget) {
        self.target = target;
    }

    /// URL the next upload goes to
    pub fn endpoint(&self) -> &str {
        self.endpoints.url(self.target)
    }

    pub fn file(&self) -> Option<&PdfFile> {
        self.file.as_ref()
    }

    pub fn response(&self) -> Option<&ExtractionResponse> {
        self.response.as_ref()
    }

    /// Pick a file from disk; a rejected file leaves the selection empty
    pub fn select_path(&mut self, path: &Path) -> Result<&PdfFile, UploadError> {
        self.file = None;
        let file = PdfFile::from_path(path)?;
        Ok(self.file.insert(file))
    }

    /// Pick an already-validated file
    pub fn select(&mut self, file: PdfFile) {
        self.file = Some(file);
    }

    pub fn clear_file(&mut self) {
        self.file = None;
    }

    /// Send the selected file and keep the answer
    ///
    /// Transport failures become a `success: false` response with
    /// `error: "Network error"`.
    pub async fn submit(&mut self) -> Result<&ExtractionResponse, UploadError> {
        let file = self.file.as_ref().ok_or(UploadError::NoFile)?;
        self.response = None;

        let endpoint = self.endpoints.url(self.target).to_string();
        tracing::info!(file = %file.name, %endpoint, "Uploading statement");

        let response = match self
            .service
            .upload_pdf(&endpoint, &file.name, file.bytes.clone())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Upload failed: {}", e);
                ExtractionResponse::failure("Network error", e.to_string())
            }
        };

        Ok(self.response.insert(response))
    }
}
