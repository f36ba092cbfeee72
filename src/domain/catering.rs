use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CateringMenu {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub menu_type: MenuType,
    pub price_per_person_cents: i64,
    pub included_items: Option<String>,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub has_gluten_free: bool,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum MenuType {
    Standard,
    Premium,
    Deluxe,
    Vegan,
    Vegetarian,
    Kids,
    Corporate,
    Wedding,
}
