use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CateringMenu, MenuType},
    error::{AppError, Result},
    repository::CateringMenuRepository,
};

#[derive(FromRow)]
struct MenuRow {
    id: String,
    name: String,
    description: String,
    menu_type: String,
    price_per_person_cents: i64,
    included_items: Option<String>,
    is_vegetarian: i32,
    is_vegan: i32,
    has_gluten_free: i32,
    image_url: Option<String>,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteCateringMenuRepository {
    pool: SqlitePool,
}

impl SqliteCateringMenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_menu(row: MenuRow) -> Result<CateringMenu> {
        Ok(CateringMenu {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            description: row.description,
            menu_type: Self::parse_menu_type(&row.menu_type)?,
            price_per_person_cents: row.price_per_person_cents,
            included_items: row.included_items,
            is_vegetarian: row.is_vegetarian != 0,
            is_vegan: row.is_vegan != 0,
            has_gluten_free: row.has_gluten_free != 0,
            image_url: row.image_url,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_menu_type(s: &str) -> Result<MenuType> {
        match s {
            "Standard" => Ok(MenuType::Standard),
            "Premium" => Ok(MenuType::Premium),
            "Deluxe" => Ok(MenuType::Deluxe),
            "Vegan" => Ok(MenuType::Vegan),
            "Vegetarian" => Ok(MenuType::Vegetarian),
            "Kids" => Ok(MenuType::Kids),
            "Corporate" => Ok(MenuType::Corporate),
            "Wedding" => Ok(MenuType::Wedding),
            _ => Err(AppError::Database(format!("Invalid menu type: {}", s))),
        }
    }

    pub fn menu_type_to_str(menu_type: MenuType) -> &'static str {
        match menu_type {
            MenuType::Standard => "Standard",
            MenuType::Premium => "Premium",
            MenuType::Deluxe => "Deluxe",
            MenuType::Vegan => "Vegan",
            MenuType::Vegetarian => "Vegetarian",
            MenuType::Kids => "Kids",
            MenuType::Corporate => "Corporate",
            MenuType::Wedding => "Wedding",
        }
    }

    const COLUMNS: &'static str = "id, name, description, menu_type, price_per_person_cents, \
         included_items, is_vegetarian, is_vegan, has_gluten_free, image_url, is_active, \
         created_at, updated_at";
}

#[async_trait]
impl CateringMenuRepository for SqliteCateringMenuRepository {
    async fn create(&self, menu: CateringMenu) -> Result<CateringMenu> {
        let id_str = menu.id.to_string();
        let menu_type_str = Self::menu_type_to_str(menu.menu_type);
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO catering_menus (
                id, name, description, menu_type, price_per_person_cents, included_items,
                is_vegetarian, is_vegan, has_gluten_free, image_url, is_active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&menu.name)
        .bind(&menu.description)
        .bind(menu_type_str)
        .bind(menu.price_per_person_cents)
        .bind(&menu.included_items)
        .bind(menu.is_vegetarian as i32)
        .bind(menu.is_vegan as i32)
        .bind(menu.has_gluten_free as i32)
        .bind(&menu.image_url)
        .bind(menu.is_active as i32)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(menu.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created menu".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CateringMenu>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, MenuRow>(&format!(
            "SELECT {} FROM catering_menus WHERE id = ?",
            Self::COLUMNS
        ))
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_menu(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<CateringMenu>> {
        let rows = sqlx::query_as::<_, MenuRow>(&format!(
            "SELECT {} FROM catering_menus ORDER BY name ASC LIMIT ? OFFSET ?",
            Self::COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_menu).collect()
    }

    async fn list_active(&self) -> Result<Vec<CateringMenu>> {
        let rows = sqlx::query_as::<_, MenuRow>(&format!(
            "SELECT {} FROM catering_menus WHERE is_active = 1 ORDER BY name ASC",
            Self::COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_menu).collect()
    }

    async fn update(&self, id: Uuid, menu: CateringMenu) -> Result<CateringMenu> {
        let id_str = id.to_string();
        let menu_type_str = Self::menu_type_to_str(menu.menu_type);
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE catering_menus
            SET name = ?, description = ?, menu_type = ?, price_per_person_cents = ?,
                included_items = ?, is_vegetarian = ?, is_vegan = ?, has_gluten_free = ?,
                image_url = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&menu.name)
        .bind(&menu.description)
        .bind(menu_type_str)
        .bind(menu.price_per_person_cents)
        .bind(&menu.included_items)
        .bind(menu.is_vegetarian as i32)
        .bind(menu.is_vegan as i32)
        .bind(menu.has_gluten_free as i32)
        .bind(&menu.image_url)
        .bind(menu.is_active as i32)
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated menu".to_string())
        })
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE catering_menus SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active as i32)
            .bind(now)
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
