use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub notes: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum PaymentMethod {
    Card,
    Eft,
    Cash,
}

impl PaymentMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Card" => Some(PaymentMethod::Card),
            "Eft" => Some(PaymentMethod::Eft),
            "Cash" => Some(PaymentMethod::Cash),
            _ => None,
        }
    }
}
