use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::i18n::Language;

pub mod about;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod departments;
pub mod finance;
pub mod health;
pub mod members;
pub mod metrics;
pub mod navigation;
pub mod reports;
pub mod settings;

/// `?lang=am` on any read that renders labels or dates.
#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    #[serde(default)]
    pub lang: Language,
}

pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Accepts `YYYY-MM-DD` (or an RFC 3339 timestamp) and normalizes it.
pub fn normalize_date(field: &str, input: &str) -> AppResult<String> {
    crate::calendar::parse_date(input)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .ok_or_else(|| AppError::Validation(format!("{} must be a date (YYYY-MM-DD)", field)))
}

pub fn csv_attachment(filename: &str, headers: &[&str], rows: Vec<Vec<String>>) -> AppResult<Response> {
    let body = crate::sheet::write_csv(headers, rows).map_err(AppError::Internal)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
        .into_response())
}

pub fn non_empty(field: &str, value: &str) -> AppResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(v.to_string())
}
