use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use crate::api::middleware::auth::{AuthUser, Principal};
use crate::api::validators::{PhoneValidator, Validator};
use crate::api::AppState;
use crate::db::models::class::Class;
use crate::db::models::member::{Member, MemberStatus};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::sheet;
use super::{csv_attachment, non_empty, normalize_date, today, LangQuery};

#[derive(Debug, Default, Deserialize)]
pub struct MemberQuery {
    pub q: Option<String>,
    pub grade: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub lang: crate::i18n::Language,
}

#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub student_code: Option<String>,
    pub name: String,
    pub age: i64,
    pub grade: String,
    pub status: Option<String>,
    pub parent_phone: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub place_of_birth: Option<String>,
    pub registration_date: Option<String>,
    pub address: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_relationship: Option<String>,
    pub guardian_phone2: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub member_ids: Vec<i64>,
    pub to_class: String,
}

/// A member request that passed validation.
struct ValidMember {
    name: String,
    age: i64,
    grade: String,
    status: MemberStatus,
    parent_phone: String,
    date_of_birth: Option<String>,
    registration_date: Option<String>,
    guardian_phone2: Option<String>,
}

fn blank_to_none(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

async fn validate_member(
    db: &DbPool,
    principal: &Principal,
    req: &MemberRequest,
) -> AppResult<ValidMember> {
    let name = non_empty("name", &req.name)?;
    if req.age <= 0 {
        return Err(AppError::Validation("age must be greater than 0".to_string()));
    }

    let grade = req.grade.trim().to_string();
    if Class::find(db, &grade).await?.is_none() {
        return Err(AppError::Validation(format!("Unknown class: {}", grade)));
    }
    if !principal.scope.admits(&grade) {
        return Err(AppError::Unauthorized(format!("Class {} is outside your assignment", grade)));
    }

    let status = match req.status.as_deref() {
        Some(s) => s.parse::<MemberStatus>().map_err(AppError::Validation)?,
        None => MemberStatus::Active,
    };

    PhoneValidator::new("parent_phone").validate(&req.parent_phone)?;
    let guardian_phone2 = blank_to_none(&req.guardian_phone2);
    if let Some(p) = &guardian_phone2 {
        PhoneValidator::new("guardian_phone2").validate(p)?;
    }

    let date_of_birth = match blank_to_none(&req.date_of_birth) {
        Some(d) => Some(normalize_date("date_of_birth", &d)?),
        None => None,
    };
    let registration_date = match blank_to_none(&req.registration_date) {
        Some(d) => Some(normalize_date("registration_date", &d)?),
        None => None,
    };

    Ok(ValidMember {
        name,
        age: req.age,
        grade,
        status,
        parent_phone: req.parent_phone.trim().to_string(),
        date_of_birth,
        registration_date,
        guardian_phone2,
    })
}

/// Loads a member the caller may see; anything outside the scope is 404.
async fn find_visible(db: &DbPool, principal: &Principal, id: i64) -> AppResult<Member> {
    Member::find(db, id)
        .await?
        .filter(|m| principal.scope.admits(&m.grade))
        .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))
}

fn matches(member: &Member, q: &MemberQuery) -> bool {
    if let Some(term) = q.q.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let term = term.to_lowercase();
        if !member.name.to_lowercase().contains(&term)
            && !member.student_code.to_lowercase().contains(&term)
        {
            return false;
        }
    }
    if let Some(grade) = q.grade.as_deref().filter(|g| *g != "all") {
        if member.grade != grade {
            return false;
        }
    }
    if let Some(status) = q.status.as_deref().filter(|s| *s != "all") {
        if member.status != status {
            return false;
        }
    }
    true
}

async fn visible_members(db: &DbPool, principal: &Principal, q: &MemberQuery) -> AppResult<Vec<Member>> {
    Ok(Member::list_all(db)
        .await?
        .into_iter()
        .filter(|m| principal.scope.admits(&m.grade) && matches(m, q))
        .collect())
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Query(q): Query<MemberQuery>,
) -> AppResult<Json<Value>> {
    let data: Vec<Value> = visible_members(&state.db, &principal, &q)
        .await?
        .iter()
        .map(|m| m.to_json(q.lang))
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    let member = find_visible(&state.db, &principal, id).await?;
    Ok(Json(member.to_json(q.lang)))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<MemberRequest>,
) -> AppResult<Json<Value>> {
    let valid = validate_member(&state.db, &principal, &body).await?;

    let code = match blank_to_none(&body.student_code) {
        Some(code) => {
            let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM members WHERE student_code = ?")
                .bind(&code)
                .fetch_optional(&state.db)
                .await?;
            if taken.is_some() {
                return Err(AppError::Conflict(format!("Student code {} already exists", code)));
            }
            code
        }
        None => Member::next_code(&state.db).await?,
    };

    let now = Utc::now().to_rfc3339();
    let id = sqlx::query(
        "INSERT INTO members (student_code, name, age, grade, status, parent_phone, gender,
            date_of_birth, place_of_birth, registration_date, address, guardian_name,
            guardian_relationship, guardian_phone2, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&code)
    .bind(&valid.name)
    .bind(valid.age)
    .bind(&valid.grade)
    .bind(valid.status.as_str())
    .bind(&valid.parent_phone)
    .bind(blank_to_none(&body.gender))
    .bind(&valid.date_of_birth)
    .bind(blank_to_none(&body.place_of_birth))
    .bind(valid.registration_date.clone().unwrap_or_else(today))
    .bind(blank_to_none(&body.address))
    .bind(blank_to_none(&body.guardian_name))
    .bind(blank_to_none(&body.guardian_relationship))
    .bind(&valid.guardian_phone2)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    tracing::info!("Member {} registered as {} by user {}", id, code, principal.user.id);

    let member = Member::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::Internal("Registered member vanished".to_string()))?;
    Ok(Json(member.to_json(Default::default())))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<MemberRequest>,
) -> AppResult<Json<Value>> {
    let existing = find_visible(&state.db, &principal, id).await?;
    let valid = validate_member(&state.db, &principal, &body).await?;

    sqlx::query(
        "UPDATE members SET name = ?, age = ?, grade = ?, status = ?, parent_phone = ?, gender = ?,
            date_of_birth = ?, place_of_birth = ?, registration_date = ?, address = ?,
            guardian_name = ?, guardian_relationship = ?, guardian_phone2 = ?, updated_at = ?
         WHERE id = ?"
    )
    .bind(&valid.name)
    .bind(valid.age)
    .bind(&valid.grade)
    .bind(valid.status.as_str())
    .bind(&valid.parent_phone)
    .bind(blank_to_none(&body.gender))
    .bind(&valid.date_of_birth)
    .bind(blank_to_none(&body.place_of_birth))
    .bind(valid.registration_date.or(existing.registration_date))
    .bind(blank_to_none(&body.address))
    .bind(blank_to_none(&body.guardian_name))
    .bind(blank_to_none(&body.guardian_relationship))
    .bind(&valid.guardian_phone2)
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(&state.db)
    .await?;

    let member = Member::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))?;
    Ok(Json(member.to_json(Default::default())))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    find_visible(&state.db, &principal, id).await?;

    sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!("Member {} deleted by user {}", id, principal.user.id);
    Ok(Json(json!({"success": true})))
}

/// Moves members to another class and records one transfer per move.
/// Members already in the target class are left alone, and a member listed
/// twice moves once.
pub async fn transfer_members(
    db: &DbPool,
    principal: &Principal,
    member_ids: &[i64],
    to_class: &str,
) -> AppResult<Vec<Value>> {
    if member_ids.is_empty() {
        return Err(AppError::Validation("Select at least one member".to_string()));
    }
    if Class::find(db, to_class).await?.is_none() {
        return Err(AppError::Validation(format!("Unknown class: {}", to_class)));
    }

    let ids: BTreeSet<i64> = member_ids.iter().copied().collect();
    let mut members = Vec::with_capacity(ids.len());
    for id in ids {
        members.push(find_visible(db, principal, id).await?);
    }

    let date = today();
    let now = Utc::now().to_rfc3339();
    let mut moved = Vec::new();
    for m in members.into_iter().filter(|m| m.grade != to_class) {
        sqlx::query("UPDATE members SET grade = ?, updated_at = ? WHERE id = ?")
            .bind(to_class)
            .bind(&now)
            .bind(m.id)
            .execute(db)
            .await?;
        sqlx::query(
            "INSERT INTO member_transfers (member_id, member_name, from_class, to_class, date)
             VALUES (?, ?, ?, ?, ?)"
        )
        .bind(m.id)
        .bind(&m.name)
        .bind(&m.grade)
        .bind(to_class)
        .bind(&date)
        .execute(db)
        .await?;
        moved.push(json!({
            "member_id": m.id,
            "member_name": m.name,
            "from_class": m.grade,
            "to_class": to_class,
            "date": date,
        }));
    }

    tracing::info!("User {} transferred {} members to {}", principal.user.id, moved.len(), to_class);
    Ok(moved)
}

pub async fn transfer(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<TransferRequest>,
) -> AppResult<Json<Value>> {
    let moved = transfer_members(&state.db, &principal, &body.member_ids, body.to_class.trim()).await?;
    let count = moved.len();
    Ok(Json(json!({ "data": moved, "total": count })))
}

pub async fn transfers(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    let rows: Vec<(i64, Option<i64>, String, String, String, String)> = sqlx::query_as(
        "SELECT id, member_id, member_name, from_class, to_class, date
         FROM member_transfers ORDER BY date DESC, id DESC"
    )
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Value> = rows
        .into_iter()
        .filter(|(_, _, _, from, to, _)| principal.scope.admits(from) || principal.scope.admits(to))
        .map(|(id, member_id, member_name, from_class, to_class, date)| {
            json!({
                "id": id,
                "member_id": member_id,
                "member_name": member_name,
                "from_class": from_class,
                "to_class": to_class,
                "date": date,
                "ethiopian_date": crate::calendar::format_ethiopian_str(&date, q.lang),
            })
        })
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

/// Best-effort CSV import. Rows without a name, a positive age or a known
/// class in the caller's scope are skipped and counted.
pub async fn import(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let sheet = sheet::read_rows(body.as_ref()).map_err(AppError::Validation)?;
    let classes = Class::ids(&state.db).await?;
    let now = Utc::now().to_rfc3339();

    let mut imported = 0usize;
    let mut skipped = sheet.skipped;
    for row in &sheet.rows {
        let name = row.get("name").cloned().unwrap_or_default();
        let age: i64 = row.get("age").and_then(|a| a.parse().ok()).unwrap_or(0);
        let grade = row.get("grade").cloned().unwrap_or_default();
        if name.is_empty() || age <= 0 || !classes.contains(&grade) || !principal.scope.admits(&grade) {
            skipped += 1;
            continue;
        }

        let code = match row.get("studentId") {
            Some(code) => {
                let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM members WHERE student_code = ?")
                    .bind(code)
                    .fetch_optional(&state.db)
                    .await?;
                if taken.is_some() {
                    skipped += 1;
                    continue;
                }
                code.clone()
            }
            None => Member::next_code(&state.db).await?,
        };

        sqlx::query(
            "INSERT INTO members (student_code, name, age, grade, status, parent_phone, gender,
                date_of_birth, place_of_birth, registration_date, address, guardian_name,
                guardian_relationship, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'Active', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&code)
        .bind(&name)
        .bind(age)
        .bind(&grade)
        .bind(row.get("parentPhone").cloned().unwrap_or_default())
        .bind(row.get("gender"))
        .bind(row.get("dateOfBirth"))
        .bind(row.get("placeOfBirth"))
        .bind(today())
        .bind(row.get("address"))
        .bind(row.get("guardianName"))
        .bind(row.get("guardianRelationship"))
        .bind(&now)
        .bind(&now)
        .execute(&state.db)
        .await?;
        imported += 1;
    }

    tracing::info!("User {} imported {} members ({} skipped)", principal.user.id, imported, skipped);
    Ok(Json(json!({ "imported": imported, "skipped": skipped })))
}

pub const EXPORT_HEADERS: [&str; 12] = [
    "StudentID", "Name", "Age", "Class", "Status", "ParentPhone", "Gender",
    "DateOfBirth", "PlaceOfBirth", "RegistrationDate", "GuardianName", "Address",
];

pub async fn export(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Query(q): Query<MemberQuery>,
) -> AppResult<Response> {
    let rows: Vec<Vec<String>> = visible_members(&state.db, &principal, &q)
        .await?
        .into_iter()
        .map(|m| {
            vec![
                m.student_code,
                m.name,
                m.age.to_string(),
                m.grade,
                m.status,
                m.parent_phone,
                m.gender.unwrap_or_default(),
                m.date_of_birth.unwrap_or_default(),
                m.place_of_birth.unwrap_or_default(),
                m.registration_date.unwrap_or_default(),
                m.guardian_name.unwrap_or_default(),
                m.address.unwrap_or_default(),
            ]
        })
        .collect();
    csv_attachment("members.csv", &EXPORT_HEADERS, rows)
}

