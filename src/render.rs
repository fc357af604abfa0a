//! Terminal rendering
//!
//! Turns portfolios, anomalies and extraction results into tables, CSV or
//! JSON text. Functions return strings so the CLI decides where they go.

use chrono::{DateTime, NaiveDateTime};

use crate::models::{Anomaly, DetectionSummary, ExtractedFields, ExtractionResponse, Portfolio};

/// Output format (table, json, csv)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// 50000000 -> "50,000,000"
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Whole-dollar amount with separators: `$50,000,000`
pub fn format_currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let whole = format!("{:.0}", value.abs());
    format!("{}${}", sign, group_thousands(&whole))
}

/// Dollars and cents, `-` when absent
pub fn format_amount(value: Option<f64>) -> String {
    match value {
        Some(v) => {
            let sign = if v < 0.0 { "-" } else { "" };
            let fixed = format!("{:.2}", v.abs());
            let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
            format!("{}${}.{}", sign, group_thousands(whole), cents)
        }
        None => "-".to_string(),
    }
}

/// Date part of an API timestamp, or the raw text if it won't parse
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "-".to_string();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

/// `management_fee` -> `Management fee`
pub fn field_label(field: &str) -> String {
    let spaced = field.replacen('_', " ", 1);
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Confidence bucket: high (>= 0.8), medium (>= 0.6), low
pub fn confidence_badge(confidence: f64) -> &'static str {
    if confidence >= 0.8 {
        "high"
    } else if confidence >= 0.6 {
        "medium"
    } else {
        "low"
    }
}

fn percent(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// One-line chart of scores, oldest first
pub fn sparkline(values: &[f64]) -> String {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return String::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    finite
        .iter()
        .map(|v| {
            if span == 0.0 {
                SPARK_BARS[SPARK_BARS.len() / 2]
            } else {
                let idx = ((v - min) / span * (SPARK_BARS.len() - 1) as f64).round() as usize;
                SPARK_BARS[idx.min(SPARK_BARS.len() - 1)]
            }
        })
        .collect()
}

pub fn portfolio_table(portfolios: &[Portfolio]) -> String {
    if portfolios.is_empty() {
        return "No portfolios available.\n".to_string();
    }

    let mut out = format!(
        "{:<6} {:<28} {:<24} {:>16}\n",
        "ID", "Name", "Manager", "Total Assets"
    );
    out.push_str(&"-".repeat(77));
    out.push('\n');
    for p in portfolios {
        out.push_str(&format!(
            "{:<6} {:<28} {:<24} {:>16}\n",
            p.id,
            p.name,
            p.manager,
            format_currency(p.total_assets)
        ));
    }
    out
}

/// Header block for the selected portfolio
pub fn portfolio_header(portfolio: &Portfolio) -> String {
    format!(
        "{}\nManager: {}\nTotal Assets: {}\n",
        portfolio.name,
        portfolio.manager,
        format_currency(portfolio.total_assets)
    )
}

pub fn anomaly_table(anomalies: &[Anomaly]) -> String {
    if anomalies.is_empty() {
        return "No anomalies detected.\n".to_string();
    }

    let mut out = format!("Detected Anomalies ({})\n", anomalies.len());
    out.push_str(&format!(
        "{:<6} {:<8} {:>8} {:<12} {:>14} {:<12}\n",
        "ID", "Fee", "Score", "Detected", "Fee Amount", "Fee Date"
    ));
    out.push_str(&"-".repeat(65));
    out.push('\n');

    for a in anomalies {
        let fee = a
            .fee_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<6} {:<8} {:>8.3} {:<12} {:>14} {:<12}\n",
            a.id,
            fee,
            a.anomaly_score,
            format_date(a.detected_at.as_deref()),
            format_amount(a.fee_amount),
            format_date(a.fee_date.as_deref()),
        ));
    }

    let scores: Vec<f64> = anomalies.iter().map(|a| a.anomaly_score).collect();
    out.push_str(&format!("\nAnomaly Score  {}\n", sparkline(&scores)));
    out
}

pub fn anomalies_csv(anomalies: &[Anomaly]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "fee_id",
        "anomaly_score",
        "detected_at",
        "fee_amount",
        "fee_date",
    ])?;

    for a in anomalies {
        writer.write_record([
            a.id.to_string(),
            a.fee_id.map(|v| v.to_string()).unwrap_or_default(),
            a.anomaly_score.to_string(),
            a.detected_at.clone().unwrap_or_default(),
            a.fee_amount.map(|v| format!("{:.2}", v)).unwrap_or_default(),
            a.fee_date.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn portfolios_csv(portfolios: &[Portfolio]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["id", "name", "manager", "total_assets"])?;
    for p in portfolios {
        writer.write_record([
            p.id.to_string(),
            p.name.clone(),
            p.manager.clone(),
            format!("{:.2}", p.total_assets),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn detection_summary(summary: &DetectionSummary) -> String {
    format!(
        "{}\n  Fees processed: {}\n  Sensitivity: {}\n",
        summary.message, summary.total_processed, summary.detection_sensitivity
    )
}

/// Result card of the upload tester
pub fn extraction_report(response: &ExtractionResponse) -> String {
    if !response.success {
        let error = response.error.as_deref().unwrap_or("Processing failed");
        return match response.message.as_deref() {
            Some(message) => format!("Error: {}\n  {}\n", error, message),
            None => format!("Error: {}\n", error),
        };
    }

    let overall = response.confidence.unwrap_or(0.0);
    let mut out = String::from("PDF processed successfully!\n\n");
    out.push_str(&format!(
        "Overall Confidence: {} ({})\n",
        percent(overall),
        confidence_badge(overall)
    ));
    out.push_str(&format!(
        "Method: {}\n\n",
        response.method.as_deref().unwrap_or("-")
    ));

    out.push_str(&format!("{:<18} {:>14} {:>14}\n", "Field", "Value", "Confidence"));
    out.push_str(&"-".repeat(48));
    out.push('\n');

    let data = response.data.clone().unwrap_or_default();
    for field in ExtractedFields::FIELDS {
        let confidence = response
            .field_confidences
            .as_ref()
            .and_then(|c| c.get(field))
            .map(|c| format!("{} {}", percent(*c), confidence_badge(*c)))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<18} {:>14} {:>14}\n",
            field_label(field),
            format_amount(data.get(field)),
            confidence
        ));
    }
    out
}
