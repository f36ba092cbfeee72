use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    domain::Cart,
    error::{AppError, Result},
    repository::CartRepository,
};

/// Session-keyed cart blobs. The cart travels as JSON; an unreadable or
/// missing blob comes back as an empty cart rather than an error, matching
/// session-expiry semantics (stale state is simply gone).
pub struct SqliteCartRepository {
    pool: SqlitePool,
}

impl SqliteCartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for SqliteCartRepository {
    async fn load(&self, session_id: &str) -> Result<Cart> {
        let payload: Option<String> = sqlx::query_scalar(
            "SELECT payload FROM session_carts WHERE session_id = ?"
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match payload {
            Some(json) => Ok(serde_json::from_str(&json).unwrap_or_default()),
            None => Ok(Cart::default()),
        }
    }

    async fn save(&self, session_id: &str, cart: &Cart) -> Result<()> {
        let payload = serde_json::to_string(cart)
            .map_err(|e| AppError::Internal(format!("Failed to serialize cart: {}", e)))?;
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO session_carts (session_id, payload, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#
        )
        .bind(session_id)
        .bind(&payload)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM session_carts WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
