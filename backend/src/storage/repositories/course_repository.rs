use sqlx::Row;

use crate::storage::db::DbConnection;
use shared::Course;

/// Repository for courses and the student enrollment relation
#[derive(Clone)]
pub struct CourseRepository {
    db: DbConnection,
}

impl CourseRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create_course(
        &self,
        institute_id: i64,
        name: &str,
        code: &str,
        duration_years: i64,
        description: Option<&str>,
        is_active: bool,
        created_at: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO courses (institute_id, name, code, duration_years, description, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(institute_id)
        .bind(name)
        .bind(code)
        .bind(duration_years)
        .bind(description)
        .bind(is_active)
        .bind(created_at)
        .execute(self.db.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_course(&self, course_id: i64) -> Result<Option<Course>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, institute_id, name, code, duration_years, description, is_active, created_at, updated_at
            FROM courses
            WHERE id = ?
            "#,
        )
        .bind(course_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| Self::to_course(&r)))
    }

    /// List courses, optionally restricted to one institute
    pub async fn list_courses(
        &self,
        institute_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Course>, sqlx::Error> {
        let rows = match institute_id {
            Some(institute_id) => {
                sqlx::query(
                    r#"
                    SELECT id, institute_id, name, code, duration_years, description, is_active, created_at, updated_at
                    FROM courses
                    WHERE institute_id = ?
                    ORDER BY id ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(institute_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, institute_id, name, code, duration_years, description, is_active, created_at, updated_at
                    FROM courses
                    ORDER BY id ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.iter().map(Self::to_course).collect())
    }

    /// Whether the student is enrolled in the course
    pub async fn is_enrolled(&self, student_id: i64, course_id: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            "SELECT 1 FROM enrollments WHERE student_id = ? AND course_id = ?",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.is_some())
    }

    /// Record an enrollment; the composite primary key rejects duplicates
    pub async fn enroll(
        &self,
        student_id: i64,
        course_id: i64,
        enrolled_at: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO enrollments (student_id, course_id, enrolled_at) VALUES (?, ?, ?)",
        )
        .bind(student_id)
        .bind(course_id)
        .bind(enrolled_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    fn to_course(r: &sqlx::sqlite::SqliteRow) -> Course {
        Course {
            id: r.get("id"),
            institute_id: r.get("institute_id"),
            name: r.get("name"),
            code: r.get("code"),
            duration_years: r.get("duration_years"),
            description: r.get("description"),
            is_active: r.get("is_active"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }
}
