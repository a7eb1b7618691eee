use serde::Serialize;

use crate::auth::rbac::PermissionSet;
use crate::db::DbPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoleRow {
    pub id: String,
    pub name: String,
    pub permissions: String,
    pub class_scoped: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub permissions: PermissionSet,
    pub class_scoped: bool,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        let tags: Vec<String> = serde_json::from_str(&row.permissions).unwrap_or_default();
        // Stored tags were validated on write; anything unreadable grants nothing.
        let permissions = PermissionSet::parse(&tags).unwrap_or_else(|e| {
            tracing::warn!("role {} has unreadable permissions: {}", row.id, e);
            PermissionSet::empty()
        });
        Role {
            id: row.id,
            name: row.name,
            permissions,
            class_scoped: row.class_scoped,
        }
    }
}

/// `Admin Role` → `admin-role`.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

impl Role {
    pub async fn find_by_name(pool: &DbPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, permissions, class_scoped, created_at FROM roles WHERE name = ?"
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(Role::from))
    }

    pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<Role>, sqlx::Error> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, permissions, class_scoped, created_at FROM roles WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(Role::from))
    }

    pub async fn list(pool: &DbPool) -> Result<Vec<Role>, sqlx::Error> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, permissions, class_scoped, created_at FROM roles ORDER BY created_at ASC, id ASC"
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    /// Permissions granted to a role name; unknown roles grant nothing.
    pub async fn permissions_for(pool: &DbPool, role_name: &str) -> Result<(PermissionSet, bool), sqlx::Error> {
        Ok(Role::find_by_name(pool, role_name)
            .await?
            .map(|r| (r.permissions, r.class_scoped))
            .unwrap_or_else(|| (PermissionSet::empty(), false)))
    }
}
