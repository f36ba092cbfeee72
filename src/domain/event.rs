use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable offering: a venue slot sold per person. Booking logic treats
/// this as read-only; only the back office edits it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventOffering {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub venue: String,
    pub max_capacity: i32,
    pub price_per_person_cents: i64,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
