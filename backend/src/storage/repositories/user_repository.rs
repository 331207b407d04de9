use sqlx::Row;

use crate::storage::db::DbConnection;
use shared::User;

/// Repository for users, roles, and the user-role relation
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a user row and return its generated id
    pub async fn create_user(
        &self,
        email: &str,
        full_name: Option<&str>,
        is_active: bool,
        created_at: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, full_name, is_active, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(email)
        .bind(full_name)
        .bind(is_active)
        .bind(created_at)
        .execute(self.db.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by id, with roles attached
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, email, full_name, is_active, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => {
                let roles = self.roles_of(user_id).await?;
                Ok(Some(User {
                    id: r.get("id"),
                    email: r.get("email"),
                    full_name: r.get("full_name"),
                    is_active: r.get("is_active"),
                    roles,
                    created_at: r.get("created_at"),
                    updated_at: r.get("updated_at"),
                }))
            }
            None => Ok(None),
        }
    }

    /// Look up a user id by email
    pub async fn find_user_id_by_email(&self, email: &str) -> Result<Option<i64>, sqlx::Error> {
        let row = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(|r| r.get("id")))
    }

    /// List users ordered by id
    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, full_name, is_active, created_at, updated_at
            FROM users
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for r in rows {
            let id: i64 = r.get("id");
            let roles = self.roles_of(id).await?;
            users.push(User {
                id,
                email: r.get("email"),
                full_name: r.get("full_name"),
                is_active: r.get("is_active"),
                roles,
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
            });
        }
        Ok(users)
    }

    /// Update the mutable user columns
    pub async fn update_user(
        &self,
        user_id: i64,
        email: &str,
        full_name: Option<&str>,
        is_active: bool,
        updated_at: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = ?, full_name = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(email)
        .bind(full_name)
        .bind(is_active)
        .bind(updated_at)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Role names attached to a user
    pub async fn roles_of(&self, user_id: i64) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.iter().map(|r| r.get("name")).collect())
    }

    /// Get the id of a role by name, creating the role row if it is new
    pub async fn ensure_role(&self, name: &str) -> Result<i64, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO roles (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(format!("{} role", name))
            .execute(self.db.pool())
            .await?;

        let row = sqlx::query("SELECT id FROM roles WHERE name = ?")
            .bind(name)
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.get("id"))
    }

    /// Replace a user's role set with the given role names
    pub async fn set_roles(&self, user_id: i64, role_names: &[String]) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        for name in role_names {
            let role_id = self.ensure_role(name).await?;
            sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(role_id)
                .execute(self.db.pool())
                .await?;
        }
        Ok(())
    }
}
