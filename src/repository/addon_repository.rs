use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{AdditionalService, PriceType},
    error::{AppError, Result},
    repository::AdditionalServiceRepository,
};

#[derive(FromRow)]
struct ServiceRow {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    price_type: String,
    image_url: Option<String>,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteAdditionalServiceRepository {
    pool: SqlitePool,
}

impl SqliteAdditionalServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_service(row: ServiceRow) -> Result<AdditionalService> {
        Ok(AdditionalService {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            price_type: parse_price_type(&row.price_type)?,
            image_url: row.image_url,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    const COLUMNS: &'static str = "id, name, description, price_cents, price_type, \
         image_url, is_active, created_at, updated_at";
}

pub fn parse_price_type(s: &str) -> Result<PriceType> {
    match s {
        "Fixed" => Ok(PriceType::Fixed),
        "PerPerson" => Ok(PriceType::PerPerson),
        "PerHour" => Ok(PriceType::PerHour),
        _ => Err(AppError::Database(format!("Invalid price type: {}", s))),
    }
}

pub fn price_type_to_str(price_type: PriceType) -> &'static str {
    match price_type {
        PriceType::Fixed => "Fixed",
        PriceType::PerPerson => "PerPerson",
        PriceType::PerHour => "PerHour",
    }
}

#[async_trait]
impl AdditionalServiceRepository for SqliteAdditionalServiceRepository {
    async fn create(&self, service: AdditionalService) -> Result<AdditionalService> {
        let id_str = service.id.to_string();
        let price_type_str = price_type_to_str(service.price_type);
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO additional_services (
                id, name, description, price_cents, price_type, image_url,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_cents)
        .bind(price_type_str)
        .bind(&service.image_url)
        .bind(service.is_active as i32)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(service.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created service".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdditionalService>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {} FROM additional_services WHERE id = ?",
            Self::COLUMNS
        ))
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_service(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<AdditionalService>> {
        let rows = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {} FROM additional_services ORDER BY name ASC LIMIT ? OFFSET ?",
            Self::COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_service).collect()
    }

    async fn list_active(&self) -> Result<Vec<AdditionalService>> {
        let rows = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {} FROM additional_services WHERE is_active = 1 ORDER BY name ASC",
            Self::COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_service).collect()
    }

    async fn update(&self, id: Uuid, service: AdditionalService) -> Result<AdditionalService> {
        let id_str = id.to_string();
        let price_type_str = price_type_to_str(service.price_type);
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE additional_services
            SET name = ?, description = ?, price_cents = ?, price_type = ?,
                image_url = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_cents)
        .bind(price_type_str)
        .bind(&service.image_url)
        .bind(service.is_active as i32)
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated service".to_string())
        })
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE additional_services SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active as i32)
            .bind(now)
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
