use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Payment, PaymentMethod, PaymentStatus},
    error::{AppError, Result},
    repository::PaymentRepository,
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    booking_id: String,
    amount_cents: i64,
    method: String,
    status: String,
    transaction_id: String,
    notes: String,
    paid_at: NaiveDateTime,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            booking_id: Uuid::parse_str(&row.booking_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            amount_cents: row.amount_cents,
            method: Self::parse_method(&row.method)?,
            status: Self::parse_status(&row.status)?,
            transaction_id: row.transaction_id,
            notes: row.notes,
            paid_at: DateTime::from_naive_utc_and_offset(row.paid_at, Utc),
        })
    }

    fn parse_method(s: &str) -> Result<PaymentMethod> {
        PaymentMethod::parse(s)
            .ok_or_else(|| AppError::Database(format!("Invalid payment method: {}", s)))
    }

    fn method_to_str(method: PaymentMethod) -> &'static str {
        match method {
            PaymentMethod::Card => "Card",
            PaymentMethod::Eft => "Eft",
            PaymentMethod::Cash => "Cash",
        }
    }

    fn parse_status(s: &str) -> Result<PaymentStatus> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Completed" => Ok(PaymentStatus::Completed),
            "Failed" => Ok(PaymentStatus::Failed),
            "Refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(AppError::Database(format!("Invalid payment status: {}", s))),
        }
    }

    fn status_to_str(status: PaymentStatus) -> &'static str {
        match status {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }

    const COLUMNS: &'static str =
        "id, booking_id, amount_cents, method, status, transaction_id, notes, paid_at";
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment> {
        let id_str = payment.id.to_string();

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, booking_id, amount_cents, method, status, transaction_id, notes, paid_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(payment.booking_id.to_string())
        .bind(payment.amount_cents)
        .bind(Self::method_to_str(payment.method))
        .bind(Self::status_to_str(payment.status))
        .bind(&payment.transaction_id)
        .bind(&payment.notes)
        .bind(payment.paid_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(payment.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created payment".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = ?",
            Self::COLUMNS
        ))
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>> {
        let booking_id_str = booking_id.to_string();
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE booking_id = ? ORDER BY paid_at DESC",
            Self::COLUMNS
        ))
        .bind(booking_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn completed_revenue_cents(&self) -> Result<i64> {
        let row: (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(amount_cents) FROM payments WHERE status = 'Completed'"
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.0.unwrap_or(0))
    }
}
