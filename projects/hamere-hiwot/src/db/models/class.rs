use serde::Serialize;

use crate::db::DbPool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Class {
    pub id: String,
    pub name: String,
    pub teacher: String,
}

impl Class {
    pub async fn find(pool: &DbPool, id: &str) -> Result<Option<Class>, sqlx::Error> {
        sqlx::query_as::<_, Class>("SELECT id, name, teacher FROM classes WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DbPool) -> Result<Vec<Class>, sqlx::Error> {
        sqlx::query_as::<_, Class>("SELECT id, name, teacher FROM classes ORDER BY rowid ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn ids(pool: &DbPool) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM classes ORDER BY rowid ASC")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
