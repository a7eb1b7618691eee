use serde::Serialize;

use crate::db::DbPool;

/// The department that reads every inter-department report and never submits.
pub const SECRETARIAT: &str = "secretariat";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Department {
    pub id: String,
    pub name: String,
}

impl Department {
    pub async fn find(pool: &DbPool, id: &str) -> Result<Option<Department>, sqlx::Error> {
        sqlx::query_as::<_, Department>("SELECT id, name FROM departments WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DbPool) -> Result<Vec<Department>, sqlx::Error> {
        sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY created_at ASC, rowid ASC")
            .fetch_all(pool)
            .await
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DepartmentReportRow {
    pub id: i64,
    pub department_id: String,
    pub date: String,
    pub submitted_by: String,
    pub content: Option<String>,
    pub attachment_name: Option<String>,
    pub recipients: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentReport {
    pub id: i64,
    pub department_id: String,
    pub date: String,
    pub submitted_by: String,
    pub content: Option<String>,
    pub attachment_name: Option<String>,
    pub recipient_department_ids: Vec<String>,
}

impl From<DepartmentReportRow> for DepartmentReport {
    fn from(row: DepartmentReportRow) -> Self {
        DepartmentReport {
            id: row.id,
            department_id: row.department_id,
            date: row.date,
            submitted_by: row.submitted_by,
            content: row.content,
            attachment_name: row.attachment_name,
            recipient_department_ids: serde_json::from_str(&row.recipients).unwrap_or_default(),
        }
    }
}

impl DepartmentReport {
    /// Authored by or addressed to `department_id`; the secretariat sees all.
    pub fn visible_to(&self, department_id: &str) -> bool {
        department_id == SECRETARIAT
            || self.department_id == department_id
            || self.recipient_department_ids.iter().any(|r| r == department_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(from: &str, to: &[&str]) -> DepartmentReport {
        DepartmentReport {
            id: 1,
            department_id: from.to_string(),
            date: "2024-05-20".to_string(),
            submitted_by: "Ato Daniel".to_string(),
            content: Some("Guest speaker confirmed".to_string()),
            attachment_name: None,
            recipient_department_ids: to.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_author_and_recipients_see_report() {
        let r = report("education", &["choir"]);
        assert!(r.visible_to("education"));
        assert!(r.visible_to("choir"));
        assert!(!r.visible_to("art"));
    }

    #[test]
    fn test_secretariat_sees_everything() {
        assert!(report("children", &[]).visible_to(SECRETARIAT));
    }
}
