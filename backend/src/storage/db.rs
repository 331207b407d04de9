use anyhow::Result;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

/// DbConnection manages the SQLite pool shared by all repositories
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

/// Schema statements, executed in order on startup. `IF NOT EXISTS` keeps
/// restarts idempotent. The UNIQUE(course_id, semester_id) constraint on
/// standard_fees is load-bearing: it closes the check-then-insert race that
/// the application-level duplicate pre-check alone cannot.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        full_name TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_roles (
        user_id INTEGER NOT NULL REFERENCES users(id),
        role_id INTEGER NOT NULL REFERENCES roles(id),
        PRIMARY KEY (user_id, role_id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS institutes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        code TEXT NOT NULL UNIQUE,
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS courses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        institute_id INTEGER NOT NULL REFERENCES institutes(id),
        name TEXT NOT NULL,
        code TEXT NOT NULL UNIQUE,
        duration_years INTEGER NOT NULL,
        description TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS semesters (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        course_id INTEGER NOT NULL REFERENCES courses(id),
        name TEXT NOT NULL,
        kind TEXT NOT NULL,
        position INTEGER NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS enrollments (
        student_id INTEGER NOT NULL REFERENCES users(id),
        course_id INTEGER NOT NULL REFERENCES courses(id),
        enrolled_at TEXT NOT NULL,
        PRIMARY KEY (student_id, course_id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS standard_fees (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        course_id INTEGER NOT NULL REFERENCES courses(id),
        semester_id INTEGER NOT NULL REFERENCES semesters(id),
        name TEXT NOT NULL,
        amount REAL NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT,
        UNIQUE (course_id, semester_id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS student_fees (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES users(id),
        course_id INTEGER NOT NULL REFERENCES courses(id),
        semester_id INTEGER NOT NULL REFERENCES semesters(id),
        amount REAL NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES users(id),
        student_fee_id INTEGER NOT NULL REFERENCES student_fees(id),
        amount REAL NOT NULL,
        payment_method TEXT NOT NULL,
        transaction_id TEXT UNIQUE,
        notes TEXT,
        payment_date TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS receipts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        payment_id INTEGER NOT NULL UNIQUE REFERENCES payments(id),
        receipt_number TEXT NOT NULL UNIQUE,
        generated_at TEXT NOT NULL,
        document_path TEXT
    );
    "#,
];

impl DbConnection {
    /// Open (creating if necessary) the database at `url` and set up the
    /// schema.
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Shared-cache in-memory database so every pool connection sees the
        // same data
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    /// Get the underlying SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_setup_is_idempotent() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        // Re-running the schema must not fail on an initialized database
        DbConnection::setup_schema(db.pool())
            .await
            .expect("Schema setup should be idempotent");
    }

    #[tokio::test]
    async fn test_standard_fee_pair_unique_at_store_level() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");

        // Minimal referenced rows so the foreign keys hold
        sqlx::query(
            "INSERT INTO institutes (id, name, code, created_at) VALUES (1, 'Engineering', 'ENG', '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .expect("Failed to insert institute");
        sqlx::query(
            "INSERT INTO courses (id, institute_id, name, code, duration_years, created_at) VALUES (1, 1, 'CS', 'BSC-CS', 3, '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .expect("Failed to insert course");
        sqlx::query(
            "INSERT INTO semesters (id, course_id, name, kind, position, start_date, end_date) VALUES (1, 1, 'Fall 2026', 'semester', 1, '2026-09-01T00:00:00Z', '2026-12-20T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .expect("Failed to insert semester");

        sqlx::query(
            "INSERT INTO standard_fees (course_id, semester_id, name, amount, created_at) VALUES (1, 1, 'Tuition', 1000.0, '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .expect("First insert should succeed");

        let duplicate = sqlx::query(
            "INSERT INTO standard_fees (course_id, semester_id, name, amount, created_at) VALUES (1, 1, 'Tuition again', 900.0, '2026-01-02T00:00:00Z')",
        )
        .execute(db.pool())
        .await;

        assert!(duplicate.is_err(), "Duplicate (course, semester) pair must be rejected by the store");
    }
}
