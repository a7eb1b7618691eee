use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use crate::api::middleware::auth::AuthUser;
use crate::api::AppState;
use crate::calendar::format_ethiopian_str;
use crate::db::models::transaction::{summarize, Transaction, TransactionKind};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::i18n::Language;
use super::{csv_attachment, non_empty, normalize_date, today};

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub lang: Language,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub date: Option<String>,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub receipt_number: String,
}

/// Inclusive date window. `to` falls back to `from`; no bounds means everything.
fn range(q: &RangeQuery) -> AppResult<(Option<String>, Option<String>)> {
    let from = q.from.as_deref().map(|d| normalize_date("from", d)).transpose()?;
    let to = match q.to.as_deref() {
        Some(d) => Some(normalize_date("to", d)?),
        None => from.clone(),
    };
    if let (Some(f), Some(t)) = (&from, &to) {
        if f > t {
            return Err(AppError::Validation("from must not be after to".to_string()));
        }
    }
    Ok((from, to))
}

async fn transactions_in(db: &DbPool, q: &RangeQuery) -> AppResult<Vec<Transaction>> {
    let (from, to) = range(q)?;
    Ok(sqlx::query_as::<_, Transaction>(
        "SELECT id, date, description, amount, kind, receipt_number FROM transactions
         WHERE (? IS NULL OR date >= ?) AND (? IS NULL OR date <= ?)
         ORDER BY date DESC, id DESC"
    )
    .bind(&from)
    .bind(&from)
    .bind(&to)
    .bind(&to)
    .fetch_all(db)
    .await?)
}

fn transaction_json(t: &Transaction, lang: Language) -> Value {
    json!({
        "id": t.id,
        "date": t.date,
        "ethiopian_date": format_ethiopian_str(&t.date, lang),
        "description": t.description,
        "amount": t.amount,
        "type": t.kind,
        "receipt_number": t.receipt_number,
    })
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(q): Query<RangeQuery>,
) -> AppResult<Json<Value>> {
    let data: Vec<Value> = transactions_in(&state.db, &q)
        .await?
        .iter()
        .map(|t| transaction_json(t, q.lang))
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<CreateTransactionRequest>,
) -> AppResult<Json<Value>> {
    let description = non_empty("description", &body.description)?;
    let receipt_number = non_empty("receipt_number", &body.receipt_number)?;
    if !body.amount.is_finite() || body.amount <= 0.0 {
        return Err(AppError::Validation("amount must be greater than 0".to_string()));
    }
    let date = match body.date.as_deref() {
        Some(d) => normalize_date("date", d)?,
        None => today(),
    };

    let id = sqlx::query(
        "INSERT INTO transactions (date, description, amount, kind, receipt_number, created_at)
         VALUES (?, ?, ?, ?, ?, ?)"
    )
    .bind(&date)
    .bind(&description)
    .bind(body.amount)
    .bind(body.kind.as_str())
    .bind(&receipt_number)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    tracing::info!("Transaction {} ({}) recorded by user {}", id, body.kind.as_str(), principal.user.id);

    let t = Transaction {
        id,
        date,
        description,
        amount: body.amount,
        kind: body.kind.as_str().to_string(),
        receipt_number,
    };
    Ok(Json(transaction_json(&t, Language::default())))
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(q): Query<RangeQuery>,
) -> AppResult<Json<Value>> {
    let txs = transactions_in(&state.db, &q).await?;
    Ok(Json(serde_json::to_value(summarize(&txs))?))
}

pub const EXPORT_HEADERS: [&str; 6] = ["ID", "Date", "Description", "Amount", "Type", "ReceiptNumber"];

pub async fn export(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(q): Query<RangeQuery>,
) -> AppResult<Response> {
    let rows: Vec<Vec<String>> = transactions_in(&state.db, &q)
        .await?
        .into_iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.date,
                t.description,
                format!("{:.2}", t.amount),
                t.kind,
                t.receipt_number,
            ]
        })
        .collect();
    csv_attachment("transactions.csv", &EXPORT_HEADERS, rows)
}
