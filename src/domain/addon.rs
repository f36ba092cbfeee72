use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An add-on sold alongside an event booking (decor, AV, security, ...).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdditionalService {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub price_type: PriceType,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum PriceType {
    Fixed,
    PerPerson,
    PerHour,
}
