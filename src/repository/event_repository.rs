use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::EventOffering,
    error::{AppError, Result},
    repository::EventOfferingRepository,
};

#[derive(FromRow)]
struct EventRow {
    id: String,
    name: String,
    description: String,
    venue: String,
    max_capacity: i32,
    price_per_person_cents: i64,
    image_url: Option<String>,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteEventOfferingRepository {
    pool: SqlitePool,
}

impl SqliteEventOfferingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_event(row: EventRow) -> Result<EventOffering> {
        Ok(EventOffering {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            description: row.description,
            venue: row.venue,
            max_capacity: row.max_capacity,
            price_per_person_cents: row.price_per_person_cents,
            image_url: row.image_url,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    const COLUMNS: &'static str = "id, name, description, venue, max_capacity, \
         price_per_person_cents, image_url, is_active, created_at, updated_at";
}

#[async_trait]
impl EventOfferingRepository for SqliteEventOfferingRepository {
    async fn create(&self, event: EventOffering) -> Result<EventOffering> {
        let id_str = event.id.to_string();
        let is_active_int = if event.is_active { 1i32 } else { 0i32 };
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO events (
                id, name, description, venue, max_capacity,
                price_per_person_cents, image_url, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(event.max_capacity)
        .bind(event.price_per_person_cents)
        .bind(&event.image_url)
        .bind(is_active_int)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(event.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created event".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EventOffering>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = ?",
            Self::COLUMNS
        ))
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_event(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<EventOffering>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events ORDER BY created_at DESC LIMIT ? OFFSET ?",
            Self::COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn list_active(&self) -> Result<Vec<EventOffering>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE is_active = 1 ORDER BY name ASC",
            Self::COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn update(&self, id: Uuid, event: EventOffering) -> Result<EventOffering> {
        let id_str = id.to_string();
        let is_active_int = if event.is_active { 1i32 } else { 0i32 };
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE events
            SET name = ?, description = ?, venue = ?, max_capacity = ?,
                price_per_person_cents = ?, image_url = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(event.max_capacity)
        .bind(event.price_per_person_cents)
        .bind(&event.image_url)
        .bind(is_active_int)
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated event".to_string())
        })
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        let id_str = id.to_string();
        let active_int = if active { 1i32 } else { 0i32 };
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE events SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active_int)
            .bind(now)
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn count_active(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.0)
    }
}
