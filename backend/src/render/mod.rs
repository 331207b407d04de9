//! Receipt document renderer.
//!
//! Renders a fixed embedded template by placeholder substitution into a
//! self-contained HTML document, suitable for download or external
//! HTML-to-PDF conversion. Rendering is deterministic: the same receipt,
//! payment, student, and fee data always produce identical content.

use anyhow::Result;
use chrono::DateTime;

use shared::{Payment, Receipt, StudentFee, User};

/// Embedded receipt template
const RECEIPT_TEMPLATE: &str = include_str!("templates/receipt.html");

/// Everything the template needs, gathered by the caller
pub struct ReceiptContext<'a> {
    pub receipt: &'a Receipt,
    pub payment: &'a Payment,
    pub student: &'a User,
    pub student_fee: &'a StudentFee,
    pub semester_name: &'a str,
}

/// A rendered document ready to stream to the caller
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    /// Download filename, derived from the receipt number
    pub file_name: String,
}

#[derive(Clone, Default)]
pub struct ReceiptRenderer;

impl ReceiptRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render the receipt document for the given context
    pub fn render(&self, ctx: &ReceiptContext<'_>) -> Result<RenderedDocument> {
        // RFC 3339 in the store, day-first to the second on the document
        let payment_date = DateTime::parse_from_rfc3339(&ctx.payment.payment_date)
            .map(|date| date.format("%d-%m-%Y %H:%M:%S").to_string())
            .unwrap_or_else(|_| ctx.payment.payment_date.clone());

        let student_name = ctx.student.full_name.as_deref().unwrap_or("N/A");
        let transaction_id = ctx.payment.transaction_id.as_deref().unwrap_or("N/A");
        let fee_description = ctx.student_fee.description.as_deref().unwrap_or("Tuition Fee");

        let output = RECEIPT_TEMPLATE
            .replace("{{receipt_number}}", &escape(&ctx.receipt.receipt_number))
            .replace("{{payment_date}}", &escape(&payment_date))
            .replace("{{student_name}}", &escape(student_name))
            .replace("{{student_email}}", &escape(&ctx.student.email))
            .replace("{{student_id}}", &ctx.student.id.to_string())
            .replace("{{payment_id}}", &ctx.payment.id.to_string())
            .replace("{{payment_method}}", &escape(&ctx.payment.payment_method))
            .replace("{{transaction_id}}", &escape(transaction_id))
            .replace("{{semester_name}}", &escape(ctx.semester_name))
            .replace("{{fee_description}}", &escape(fee_description))
            .replace("{{amount_paid}}", &format!("${:.2}", ctx.payment.amount));

        Ok(RenderedDocument {
            bytes: output.into_bytes(),
            content_type: "text/html; charset=utf-8",
            file_name: format!("{}.html", ctx.receipt.receipt_number),
        })
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
