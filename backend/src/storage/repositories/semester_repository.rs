use sqlx::Row;

use crate::storage::db::DbConnection;
use shared::{Semester, SemesterKind};

/// Repository for semesters
#[derive(Clone)]
pub struct SemesterRepository {
    db: DbConnection,
}

impl SemesterRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create_semester(
        &self,
        course_id: i64,
        name: &str,
        kind: SemesterKind,
        position: i64,
        start_date: &str,
        end_date: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO semesters (course_id, name, kind, position, start_date, end_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(course_id)
        .bind(name)
        .bind(kind.as_str())
        .bind(position)
        .bind(start_date)
        .bind(end_date)
        .execute(self.db.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_semester(&self, semester_id: i64) -> Result<Option<Semester>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, course_id, name, kind, position, start_date, end_date
            FROM semesters
            WHERE id = ?
            "#,
        )
        .bind(semester_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|r| Self::to_semester(&r)).transpose()
    }

    /// List semesters, optionally restricted to one course, in course order
    pub async fn list_semesters(
        &self,
        course_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Semester>, sqlx::Error> {
        let rows = match course_id {
            Some(course_id) => {
                sqlx::query(
                    r#"
                    SELECT id, course_id, name, kind, position, start_date, end_date
                    FROM semesters
                    WHERE course_id = ?
                    ORDER BY position ASC, id ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(course_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, course_id, name, kind, position, start_date, end_date
                    FROM semesters
                    ORDER BY course_id ASC, position ASC, id ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        rows.iter().map(Self::to_semester).collect()
    }

    fn to_semester(r: &sqlx::sqlite::SqliteRow) -> Result<Semester, sqlx::Error> {
        Ok(Semester {
            id: r.get("id"),
            course_id: r.get("course_id"),
            name: r.get("name"),
            kind: Self::parse_kind(&r.get::<String, _>("kind"))?,
            position: r.get("position"),
            start_date: r.get("start_date"),
            end_date: r.get("end_date"),
        })
    }

    fn parse_kind(kind: &str) -> Result<SemesterKind, sqlx::Error> {
        match kind {
            "semester" => Ok(SemesterKind::Semester),
            "year" => Ok(SemesterKind::Year),
            other => Err(sqlx::Error::Decode(
                format!("unknown semester kind: {}", other).into(),
            )),
        }
    }
}
