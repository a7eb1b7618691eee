use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::db::DbPool;
use crate::i18n::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    Active,
    Transferred,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "Active",
            MemberStatus::Transferred => "Transferred",
        }
    }
}

impl std::str::FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(MemberStatus::Active),
            "Transferred" => Ok(MemberStatus::Transferred),
            _ => Err(format!("{:?} is not a valid member status", s)),
        }
    }
}

/// Registry entry for a student/member. Not related to login users.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub student_code: String,
    pub name: String,
    pub age: i64,
    pub grade: String,
    pub status: String,
    pub parent_phone: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub place_of_birth: Option<String>,
    pub registration_date: Option<String>,
    pub address: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_relationship: Option<String>,
    pub guardian_phone2: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub const MEMBER_COLUMNS: &str = "id, student_code, name, age, grade, status, parent_phone, gender, \
     date_of_birth, place_of_birth, registration_date, address, guardian_name, \
     guardian_relationship, guardian_phone2, created_at, updated_at";

impl Member {
    pub fn to_json(&self, lang: Language) -> serde_json::Value {
        let mut v = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = v.as_object_mut() {
            obj.insert(
                "registration_date_ethiopian".to_string(),
                self.registration_date
                    .as_deref()
                    .map(|d| calendar::format_ethiopian_str(d, lang))
                    .into(),
            );
        }
        v
    }

    pub async fn find(pool: &DbPool, id: i64) -> Result<Option<Member>, sqlx::Error> {
        sqlx::query_as::<_, Member>(&format!("SELECT {} FROM members WHERE id = ?", MEMBER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_grade(pool: &DbPool, grade: &str) -> Result<Vec<Member>, sqlx::Error> {
        sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM members WHERE grade = ? ORDER BY name ASC",
            MEMBER_COLUMNS
        ))
        .bind(grade)
        .fetch_all(pool)
        .await
    }

    pub async fn list_all(pool: &DbPool) -> Result<Vec<Member>, sqlx::Error> {
        sqlx::query_as::<_, Member>(&format!("SELECT {} FROM members ORDER BY id DESC", MEMBER_COLUMNS))
            .fetch_all(pool)
            .await
    }

    /// Next free `H###` code.
    pub async fn next_code(pool: &DbPool) -> Result<String, sqlx::Error> {
        let (max_id,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) FROM members")
            .fetch_one(pool)
            .await?;
        let mut n = max_id + 1;
        loop {
            let code = format!("H{:03}", n);
            let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM members WHERE student_code = ?")
                .bind(&code)
                .fetch_optional(pool)
                .await?;
            if taken.is_none() {
                return Ok(code);
            }
            n += 1;
        }
    }
}
