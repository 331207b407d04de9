use sqlx::Row;

use crate::storage::db::DbConnection;
use shared::{Payment, PaymentWithReceipt, Receipt};

/// Repository for payments and their receipts
#[derive(Clone)]
pub struct PaymentRepository {
    db: DbConnection,
}

impl PaymentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a payment and its receipt in one transaction.
    ///
    /// The receipt number depends on the payment's generated id, so the
    /// caller passes a derivation closure that runs between the two inserts.
    /// If the receipt insert fails the payment insert rolls back with it: a
    /// payment is never visible without its receipt.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_payment_with_receipt(
        &self,
        student_id: i64,
        student_fee_id: i64,
        amount: f64,
        payment_method: &str,
        transaction_id: Option<&str>,
        notes: Option<&str>,
        payment_date: &str,
        make_receipt_number: impl FnOnce(i64) -> String,
    ) -> Result<PaymentWithReceipt, sqlx::Error> {
        let mut tx = self.db.pool().begin().await?;

        let payment_result = sqlx::query(
            r#"
            INSERT INTO payments (student_id, student_fee_id, amount, payment_method, transaction_id, notes, payment_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(student_id)
        .bind(student_fee_id)
        .bind(amount)
        .bind(payment_method)
        .bind(transaction_id)
        .bind(notes)
        .bind(payment_date)
        .execute(&mut *tx)
        .await?;
        let payment_id = payment_result.last_insert_rowid();

        let receipt_number = make_receipt_number(payment_id);

        let receipt_result = sqlx::query(
            r#"
            INSERT INTO receipts (payment_id, receipt_number, generated_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(payment_id)
        .bind(&receipt_number)
        .bind(payment_date)
        .execute(&mut *tx)
        .await?;
        let receipt_id = receipt_result.last_insert_rowid();

        tx.commit().await?;

        Ok(PaymentWithReceipt {
            payment: Payment {
                id: payment_id,
                student_id,
                student_fee_id,
                amount,
                payment_method: payment_method.to_string(),
                transaction_id: transaction_id.map(str::to_string),
                notes: notes.map(str::to_string),
                payment_date: payment_date.to_string(),
            },
            receipt: Receipt {
                id: receipt_id,
                payment_id,
                receipt_number,
                generated_at: payment_date.to_string(),
                document_path: None,
            },
        })
    }

    pub async fn get_payment(&self, payment_id: i64) -> Result<Option<Payment>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, student_id, student_fee_id, amount, payment_method, transaction_id, notes, payment_date
            FROM payments
            WHERE id = ?
            "#,
        )
        .bind(payment_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.map(|r| Self::to_payment(&r)))
    }

    pub async fn get_receipt(&self, receipt_id: i64) -> Result<Option<Receipt>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, payment_id, receipt_number, generated_at, document_path
            FROM receipts
            WHERE id = ?
            "#,
        )
        .bind(receipt_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.map(|r| Self::to_receipt(&r)))
    }

    /// Receipt ids for every payment made by a student
    pub async fn receipt_ids_for_student(&self, student_id: i64) -> Result<Vec<i64>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT r.id
            FROM receipts r
            JOIN payments p ON p.id = r.payment_id
            WHERE p.student_id = ?
            ORDER BY r.id ASC
            "#,
        )
        .bind(student_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.iter().map(|r| r.get("id")).collect())
    }

    /// List payments with their receipts, newest first.
    ///
    /// Date bounds compare RFC 3339 strings, which order chronologically.
    /// A negative `limit` means no limit.
    pub async fn list_payments(
        &self,
        student_id: Option<i64>,
        student_fee_id: Option<i64>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentWithReceipt>, sqlx::Error> {
        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            r#"
            SELECT p.id, p.student_id, p.student_fee_id, p.amount, p.payment_method,
                   p.transaction_id, p.notes, p.payment_date,
                   r.id AS receipt_id, r.payment_id AS receipt_payment_id,
                   r.receipt_number, r.generated_at, r.document_path
            FROM payments p
            JOIN receipts r ON r.payment_id = p.id
            WHERE 1=1
            "#,
        );
        if let Some(student_id) = student_id {
            query.push(" AND p.student_id = ").push_bind(student_id);
        }
        if let Some(student_fee_id) = student_fee_id {
            query.push(" AND p.student_fee_id = ").push_bind(student_fee_id);
        }
        if let Some(start_date) = start_date {
            query.push(" AND p.payment_date >= ").push_bind(start_date.to_string());
        }
        if let Some(end_date) = end_date {
            query.push(" AND p.payment_date <= ").push_bind(end_date.to_string());
        }
        query.push(" ORDER BY p.payment_date DESC, p.id DESC LIMIT ").push_bind(limit);
        query.push(" OFFSET ").push_bind(offset);

        let rows = query.build().fetch_all(self.db.pool()).await?;

        Ok(rows
            .iter()
            .map(|r| PaymentWithReceipt {
                payment: Self::to_payment(r),
                receipt: Receipt {
                    id: r.get("receipt_id"),
                    payment_id: r.get("receipt_payment_id"),
                    receipt_number: r.get("receipt_number"),
                    generated_at: r.get("generated_at"),
                    document_path: r.get("document_path"),
                },
            })
            .collect())
    }

    fn to_payment(r: &sqlx::sqlite::SqliteRow) -> Payment {
        Payment {
            id: r.get("id"),
            student_id: r.get("student_id"),
            student_fee_id: r.get("student_fee_id"),
            amount: r.get("amount"),
            payment_method: r.get("payment_method"),
            transaction_id: r.get("transaction_id"),
            notes: r.get("notes"),
            payment_date: r.get("payment_date"),
        }
    }

    fn to_receipt(r: &sqlx::sqlite::SqliteRow) -> Receipt {
        Receipt {
            id: r.get("id"),
            payment_id: r.get("payment_id"),
            receipt_number: r.get("receipt_number"),
            generated_at: r.get("generated_at"),
            document_path: r.get("document_path"),
        }
    }
}
