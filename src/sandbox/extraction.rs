//! Statement amount extraction
//!
//! Reads labelled amounts (`Rent: $1,200.00`) out of the text layer of a PDF.
//! Only uncompressed content streams are visible; scanned statements yield
//! nothing and are reported as a failed extraction.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::models::{ExtractedFields, ExtractionResponse};

/// Method name reported to clients
pub const METHOD: &str = "text-layer";

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(rent|management\s+fees?|repairs?|deposit|misc(?:ellaneous)?|total)\b\s*[:\-]?\s*(\$)?\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)",
        )
        .expect("label pattern is valid")
    })
}

fn field_for(label: &str) -> Option<&'static str> {
    let label = label.to_lowercase();
    let field = if label == "rent" {
        "rent"
    } else if label.starts_with("management") {
        "management_fee"
    } else if label.starts_with("repair") {
        "repair"
    } else if label == "deposit" {
        "deposit"
    } else if label.starts_with("misc") {
        "misc"
    } else if label == "total" {
        "total"
    } else {
        return None;
    };
    Some(field)
}

/// Whether the bytes carry the PDF header
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

pub fn extract(bytes: &[u8]) -> ExtractionResponse {
    let text = String::from_utf8_lossy(bytes);
    let mut data = ExtractedFields::default();
    let mut confidences = BTreeMap::new();

    for caps in label_pattern().captures_iter(&text) {
        let Some(field) = field_for(&caps[1]) else {
            continue;
        };
        // First occurrence wins
        if confidences.contains_key(field) {
            continue;
        }
        let Ok(value) = caps[3].replace(',', "").parse::<f64>() else {
            continue;
        };

        let has_currency = caps.get(2).is_some();
        let has_cents = caps[3].contains('.');
        let confidence = match (has_currency, has_cents) {
            (true, true) => 0.95,
            (true, false) | (false, true) => 0.8,
            (false, false) => 0.6,
        };

        data.set(field, value);
        confidences.insert(field.to_string(), confidence);
    }

    if confidences.is_empty() {
        return ExtractionResponse::failure(
            "No fields found",
            "No labelled amounts were found in the document text",
        );
    }

    let overall = confidences.values().sum::<f64>() / confidences.len() as f64;

    ExtractionResponse {
        success: true,
        data: Some(data),
        confidence: Some((overall * 100.0).round() / 100.0),
        method: Some(METHOD.to_string()),
        field_confidences: Some(confidences),
        error: None,
        message: None,
    }
}
