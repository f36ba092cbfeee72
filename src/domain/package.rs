use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A curated bundle: one event offering plus a set of menus/services at a
/// bundle price. Marketing catalog only; the cart flow is the booking path.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Package {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub event_id: Uuid,
    pub total_price_cents: i64,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// References exactly one of a menu or a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageItem {
    pub id: Uuid,
    pub package_id: Uuid,
    pub menu_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
}
