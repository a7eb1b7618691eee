use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    /// JSON array of class ids.
    #[serde(skip)]
    pub assigned_classes: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub is_first_login: bool,
    pub created_at: String,
    pub updated_at: String,
}

const USER_COLUMNS: &str =
    "id, name, email, phone, role, assigned_classes, password, is_first_login, created_at, updated_at";

impl User {
    pub fn assigned_classes(&self) -> Vec<String> {
        serde_json::from_str(&self.assigned_classes).unwrap_or_default()
    }

    /// Public view, without the password hash.
    pub fn to_public(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
            "role": self.role,
            "assigned_classes": self.assigned_classes(),
            "is_first_login": self.is_first_login,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        })
    }

    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_phone(pool: &DbPool, phone: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE phone = ?", USER_COLUMNS))
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DbPool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY id ASC", USER_COLUMNS))
            .fetch_all(pool)
            .await
    }
}
