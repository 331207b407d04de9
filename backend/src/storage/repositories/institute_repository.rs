use sqlx::Row;

use crate::storage::db::DbConnection;
use shared::Institute;

/// Repository for institutes
#[derive(Clone)]
pub struct InstituteRepository {
    db: DbConnection,
}

impl InstituteRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create_institute(
        &self,
        name: &str,
        code: &str,
        description: Option<&str>,
        created_at: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO institutes (name, code, description, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(code)
        .bind(description)
        .bind(created_at)
        .execute(self.db.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_institute(&self, institute_id: i64) -> Result<Option<Institute>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, code, description, created_at, updated_at
            FROM institutes
            WHERE id = ?
            "#,
        )
        .bind(institute_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| Self::to_institute(&r)))
    }

    pub async fn list_institutes(&self, limit: i64, offset: i64) -> Result<Vec<Institute>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, code, description, created_at, updated_at
            FROM institutes
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(Self::to_institute).collect())
    }

    fn to_institute(r: &sqlx::sqlite::SqliteRow) -> Institute {
        Institute {
            id: r.get("id"),
            name: r.get("name"),
            code: r.get("code"),
            description: r.get("description"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }
}
