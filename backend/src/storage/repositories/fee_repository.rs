use sqlx::Row;

use crate::storage::db::DbConnection;
use shared::{StandardFee, StudentFee};

/// Repository for standard fees and student fee obligations
#[derive(Clone)]
pub struct FeeRepository {
    db: DbConnection,
}

impl FeeRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a standard fee row.
    ///
    /// The UNIQUE(course_id, semester_id) constraint makes this the
    /// race-free arbiter for the one-fee-per-pair invariant; a losing
    /// concurrent insert surfaces as a unique violation.
    pub async fn create_standard_fee(
        &self,
        course_id: i64,
        semester_id: i64,
        name: &str,
        amount: f64,
        description: Option<&str>,
        created_at: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO standard_fees (course_id, semester_id, name, amount, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(course_id)
        .bind(semester_id)
        .bind(name)
        .bind(amount)
        .bind(description)
        .bind(created_at)
        .execute(self.db.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_standard_fee(&self, standard_fee_id: i64) -> Result<Option<StandardFee>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, course_id, semester_id, name, amount, description, created_at, updated_at
            FROM standard_fees
            WHERE id = ?
            "#,
        )
        .bind(standard_fee_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.map(|r| Self::to_standard_fee(&r)))
    }

    /// The unique standard fee for a (course, semester) pair, if any
    pub async fn find_standard_fee_for_pair(
        &self,
        course_id: i64,
        semester_id: i64,
    ) -> Result<Option<StandardFee>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, course_id, semester_id, name, amount, description, created_at, updated_at
            FROM standard_fees
            WHERE course_id = ? AND semester_id = ?
            "#,
        )
        .bind(course_id)
        .bind(semester_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.map(|r| Self::to_standard_fee(&r)))
    }

    /// Whether another standard fee already occupies the pair.
    ///
    /// `exclude_id` lets an update skip the record being updated.
    pub async fn pair_taken(
        &self,
        course_id: i64,
        semester_id: i64,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT 1 FROM standard_fees
            WHERE course_id = ? AND semester_id = ? AND id != ?
            "#,
        )
        .bind(course_id)
        .bind(semester_id)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.is_some())
    }

    pub async fn update_standard_fee(
        &self,
        standard_fee_id: i64,
        course_id: i64,
        semester_id: i64,
        name: &str,
        amount: f64,
        description: Option<&str>,
        updated_at: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE standard_fees
            SET course_id = ?, semester_id = ?, name = ?, amount = ?, description = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(course_id)
        .bind(semester_id)
        .bind(name)
        .bind(amount)
        .bind(description)
        .bind(updated_at)
        .bind(standard_fee_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn delete_standard_fee(&self, standard_fee_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM standard_fees WHERE id = ?")
            .bind(standard_fee_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn list_standard_fees(
        &self,
        course_id: Option<i64>,
        semester_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StandardFee>, sqlx::Error> {
        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT id, course_id, semester_id, name, amount, description, created_at, updated_at FROM standard_fees WHERE 1=1",
        );
        if let Some(course_id) = course_id {
            query.push(" AND course_id = ").push_bind(course_id);
        }
        if let Some(semester_id) = semester_id {
            query.push(" AND semester_id = ").push_bind(semester_id);
        }
        query.push(" ORDER BY id ASC LIMIT ").push_bind(limit);
        query.push(" OFFSET ").push_bind(offset);

        let rows = query.build().fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(Self::to_standard_fee).collect())
    }

    pub async fn create_student_fee(
        &self,
        student_id: i64,
        course_id: i64,
        semester_id: i64,
        amount: f64,
        description: Option<&str>,
        created_at: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO student_fees (student_id, course_id, semester_id, amount, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(semester_id)
        .bind(amount)
        .bind(description)
        .bind(created_at)
        .execute(self.db.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_student_fee(&self, student_fee_id: i64) -> Result<Option<StudentFee>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, student_id, course_id, semester_id, amount, description, created_at, updated_at
            FROM student_fees
            WHERE id = ?
            "#,
        )
        .bind(student_fee_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.map(|r| Self::to_student_fee(&r)))
    }

    /// List student fees with optional student/semester filters.
    ///
    /// A negative `limit` means no limit (SQLite convention); the summary
    /// scan uses that to aggregate over the full filtered set.
    pub async fn list_student_fees(
        &self,
        student_id: Option<i64>,
        semester_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StudentFee>, sqlx::Error> {
        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT id, student_id, course_id, semester_id, amount, description, created_at, updated_at FROM student_fees WHERE 1=1",
        );
        if let Some(student_id) = student_id {
            query.push(" AND student_id = ").push_bind(student_id);
        }
        if let Some(semester_id) = semester_id {
            query.push(" AND semester_id = ").push_bind(semester_id);
        }
        query.push(" ORDER BY id ASC LIMIT ").push_bind(limit);
        query.push(" OFFSET ").push_bind(offset);

        let rows = query.build().fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(Self::to_student_fee).collect())
    }

    fn to_standard_fee(r: &sqlx::sqlite::SqliteRow) -> StandardFee {
        StandardFee {
            id: r.get("id"),
            course_id: r.get("course_id"),
            semester_id: r.get("semester_id"),
            name: r.get("name"),
            amount: r.get("amount"),
            description: r.get("description"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }

    fn to_student_fee(r: &sqlx::sqlite::SqliteRow) -> StudentFee {
        StudentFee {
            id: r.get("id"),
            student_id: r.get("student_id"),
            course_id: r.get("course_id"),
            semester_id: r.get("semester_id"),
            amount: r.get("amount"),
            description: r.get("description"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }
}
