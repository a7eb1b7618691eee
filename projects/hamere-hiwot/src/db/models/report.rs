use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClassReport {
    pub id: i64,
    pub class_id: String,
    pub date: String,
    pub submitted_by: String,
    pub content: String,
}
