use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Package, PackageItem},
    error::{AppError, Result},
    repository::PackageRepository,
};

#[derive(FromRow)]
struct PackageRow {
    id: String,
    name: String,
    description: String,
    event_id: String,
    total_price_cents: i64,
    image_url: Option<String>,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct PackageItemRow {
    id: String,
    package_id: String,
    menu_id: Option<String>,
    service_id: Option<String>,
}

pub struct SqlitePackageRepository {
    pool: SqlitePool,
}

impl SqlitePackageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_package(row: PackageRow) -> Result<Package> {
        Ok(Package {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            description: row.description,
            event_id: Uuid::parse_str(&row.event_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            total_price_cents: row.total_price_cents,
            image_url: row.image_url,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_item(row: PackageItemRow) -> Result<PackageItem> {
        let parse = |s: &str| Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()));
        Ok(PackageItem {
            id: parse(&row.id)?,
            package_id: parse(&row.package_id)?,
            menu_id: row.menu_id.as_deref().map(parse).transpose()?,
            service_id: row.service_id.as_deref().map(parse).transpose()?,
        })
    }

    const COLUMNS: &'static str = "id, name, description, event_id, total_price_cents, \
         image_url, is_active, created_at, updated_at";
}

#[async_trait]
impl PackageRepository for SqlitePackageRepository {
    async fn create(&self, package: Package, items: Vec<PackageItem>) -> Result<Package> {
        let id_str = package.id.to_string();
        let event_id_str = package.event_id.to_string();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO packages (
                id, name, description, event_id, total_price_cents, image_url,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&package.name)
        .bind(&package.description)
        .bind(&event_id_str)
        .bind(package.total_price_cents)
        .bind(&package.image_url)
        .bind(package.is_active as i32)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        for item in &items {
            sqlx::query(
                "INSERT INTO package_items (id, package_id, menu_id, service_id) VALUES (?, ?, ?, ?)"
            )
            .bind(item.id.to_string())
            .bind(&id_str)
            .bind(item.menu_id.map(|id| id.to_string()))
            .bind(item.service_id.map(|id| id.to_string()))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(package.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created package".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Package>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, PackageRow>(&format!(
            "SELECT {} FROM packages WHERE id = ?",
            Self::COLUMNS
        ))
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_package(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Package>> {
        let rows = sqlx::query_as::<_, PackageRow>(&format!(
            "SELECT {} FROM packages ORDER BY created_at DESC LIMIT ? OFFSET ?",
            Self::COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_package).collect()
    }

    async fn list_active(&self) -> Result<Vec<Package>> {
        let rows = sqlx::query_as::<_, PackageRow>(&format!(
            "SELECT {} FROM packages WHERE is_active = 1 ORDER BY name ASC",
            Self::COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_package).collect()
    }

    async fn items_for(&self, package_id: Uuid) -> Result<Vec<PackageItem>> {
        let package_id_str = package_id.to_string();
        let rows = sqlx::query_as::<_, PackageItemRow>(
            "SELECT id, package_id, menu_id, service_id FROM package_items WHERE package_id = ?"
        )
        .bind(package_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn update(&self, id: Uuid, package: Package) -> Result<Package> {
        let id_str = id.to_string();
        let event_id_str = package.event_id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE packages
            SET name = ?, description = ?, event_id = ?, total_price_cents = ?,
                image_url = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&package.name)
        .bind(&package.description)
        .bind(&event_id_str)
        .bind(package.total_price_cents)
        .bind(&package.image_url)
        .bind(package.is_active as i32)
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated package".to_string())
        })
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE packages SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active as i32)
            .bind(now)
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
