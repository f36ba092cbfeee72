use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Booking, BookingCateringLine, BookingServiceLine, BookingStatus},
    error::{AppError, Result},
    repository::BookingRepository,
};

use super::addon_repository::{parse_price_type, price_type_to_str};

#[derive(FromRow)]
struct BookingRow {
    id: String,
    user_id: String,
    event_id: String,
    people_count: i32,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    base_amount_cents: i64,
    total_amount_cents: i64,
    status: String,
    booked_at: NaiveDateTime,
    approved_at: Option<NaiveDateTime>,
    paid_at: Option<NaiveDateTime>,
}

#[derive(FromRow)]
struct CateringLineRow {
    id: String,
    booking_id: String,
    menu_id: String,
    quantity: i32,
    unit_price_cents: i64,
    total_price_cents: i64,
    special_instructions: String,
}

#[derive(FromRow)]
struct ServiceLineRow {
    id: String,
    booking_id: String,
    service_id: String,
    quantity: i32,
    unit_price_cents: i64,
    total_price_cents: i64,
    price_type: String,
}

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        Ok(Booking {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            event_id: Uuid::parse_str(&row.event_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            people_count: row.people_count,
            start_time: DateTime::from_naive_utc_and_offset(row.start_time, Utc),
            end_time: DateTime::from_naive_utc_and_offset(row.end_time, Utc),
            base_amount_cents: row.base_amount_cents,
            total_amount_cents: row.total_amount_cents,
            status: Self::parse_status(&row.status)?,
            booked_at: DateTime::from_naive_utc_and_offset(row.booked_at, Utc),
            approved_at: row.approved_at.map(|t| DateTime::from_naive_utc_and_offset(t, Utc)),
            paid_at: row.paid_at.map(|t| DateTime::from_naive_utc_and_offset(t, Utc)),
        })
    }

    fn row_to_catering_line(row: CateringLineRow) -> Result<BookingCateringLine> {
        let parse = |s: &str| Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()));
        Ok(BookingCateringLine {
            id: parse(&row.id)?,
            booking_id: parse(&row.booking_id)?,
            menu_id: parse(&row.menu_id)?,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            total_price_cents: row.total_price_cents,
            special_instructions: row.special_instructions,
        })
    }

    fn row_to_service_line(row: ServiceLineRow) -> Result<BookingServiceLine> {
        let parse = |s: &str| Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()));
        Ok(BookingServiceLine {
            id: parse(&row.id)?,
            booking_id: parse(&row.booking_id)?,
            service_id: parse(&row.service_id)?,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            total_price_cents: row.total_price_cents,
            price_type: parse_price_type(&row.price_type)?,
        })
    }

    fn parse_status(s: &str) -> Result<BookingStatus> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Approved" => Ok(BookingStatus::Approved),
            "Rejected" => Ok(BookingStatus::Rejected),
            "Paid" => Ok(BookingStatus::Paid),
            "Completed" => Ok(BookingStatus::Completed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(AppError::Database(format!("Invalid booking status: {}", s))),
        }
    }

    fn status_to_str(status: BookingStatus) -> &'static str {
        match status {
            BookingStatus::Pending => "Pending",
            BookingStatus::Approved => "Approved",
            BookingStatus::Rejected => "Rejected",
            BookingStatus::Paid => "Paid",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    const COLUMNS: &'static str = "id, user_id, event_id, people_count, start_time, end_time, \
         base_amount_cents, total_amount_cents, status, booked_at, approved_at, paid_at";

    // The check and the insert must see the same snapshot; the caller holds
    // a write transaction.
    async fn insert_guarded(
        conn: &mut SqliteConnection,
        booking: &Booking,
        catering: &[BookingCateringLine],
        services: &[BookingServiceLine],
    ) -> Result<bool> {
        let event_id_str = booking.event_id.to_string();
        let start_naive = booking.start_time.naive_utc();
        let end_naive = booking.end_time.naive_utc();

        let clashes: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE event_id = ? AND status != 'Cancelled'
              AND start_time < ? AND end_time > ?
            "#
        )
        .bind(&event_id_str)
        .bind(end_naive)
        .bind(start_naive)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if clashes > 0 {
            return Ok(false);
        }

        let booking_id_str = booking.id.to_string();

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, event_id, people_count, start_time, end_time,
                base_amount_cents, total_amount_cents, status, booked_at,
                approved_at, paid_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&booking_id_str)
        .bind(booking.user_id.to_string())
        .bind(&event_id_str)
        .bind(booking.people_count)
        .bind(start_naive)
        .bind(end_naive)
        .bind(booking.base_amount_cents)
        .bind(booking.total_amount_cents)
        .bind(Self::status_to_str(booking.status))
        .bind(booking.booked_at.naive_utc())
        .bind(booking.approved_at.map(|t| t.naive_utc()))
        .bind(booking.paid_at.map(|t| t.naive_utc()))
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        for line in catering {
            sqlx::query(
                r#"
                INSERT INTO booking_catering (
                    id, booking_id, menu_id, quantity, unit_price_cents,
                    total_price_cents, special_instructions
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#
            )
            .bind(line.id.to_string())
            .bind(&booking_id_str)
            .bind(line.menu_id.to_string())
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.total_price_cents)
            .bind(&line.special_instructions)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        for line in services {
            sqlx::query(
                r#"
                INSERT INTO booking_services (
                    id, booking_id, service_id, quantity, unit_price_cents,
                    total_price_cents, price_type
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#
            )
            .bind(line.id.to_string())
            .bind(&booking_id_str)
            .bind(line.service_id.to_string())
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.total_price_cents)
            .bind(price_type_to_str(line.price_type))
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        Ok(true)
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn has_overlap(
        &self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool> {
        let event_id_str = event_id.to_string();

        // Half-open test: an existing row clashes when it starts before the
        // proposal ends and ends after the proposal starts. Touching
        // endpoints fail both strict comparisons, so adjacency passes.
        let clashes: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE event_id = ? AND status != 'Cancelled'
              AND start_time < ? AND end_time > ?
            "#
        )
        .bind(&event_id_str)
        .bind(end.naive_utc())
        .bind(start.naive_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(clashes > 0)
    }

    async fn create_if_slot_free(
        &self,
        booking: Booking,
        catering: Vec<BookingCateringLine>,
        services: Vec<BookingServiceLine>,
    ) -> Result<Option<Booking>> {
        let mut conn = self.pool.acquire().await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // BEGIN IMMEDIATE takes the write lock up front, so two concurrent
        // confirmations for the same slot serialize instead of both passing
        // the read check.
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let outcome = Self::insert_guarded(&mut conn, &booking, &catering, &services).await;

        match outcome {
            Ok(true) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                drop(conn);
                self.find_by_id(booking.id).await
            }
            Ok(false) => {
                sqlx::query("ROLLBACK")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(None)
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = ?",
            Self::COLUMNS
        ))
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        let user_id_str = user_id.to_string();
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = ? ORDER BY booked_at DESC",
            Self::COLUMNS
        ))
        .bind(user_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn list_pending(&self) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE status = 'Pending' ORDER BY booked_at ASC",
            Self::COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings ORDER BY booked_at DESC LIMIT ? OFFSET ?",
            Self::COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let id_str = id.to_string();
        let status_str = Self::status_to_str(status);
        let now = Utc::now().naive_utc();

        // Approval and payment timestamps are stamped once, on the
        // transition that earns them.
        match status {
            BookingStatus::Approved => {
                sqlx::query("UPDATE bookings SET status = ?, approved_at = ? WHERE id = ?")
                    .bind(status_str)
                    .bind(now)
                    .bind(&id_str)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            BookingStatus::Paid => {
                sqlx::query("UPDATE bookings SET status = ?, paid_at = ? WHERE id = ?")
                    .bind(status_str)
                    .bind(now)
                    .bind(&id_str)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            _ => {
                sqlx::query("UPDATE bookings SET status = ? WHERE id = ?")
                    .bind(status_str)
                    .bind(&id_str)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Booking not found".to_string())
        })
    }

    async fn catering_for(&self, booking_id: Uuid) -> Result<Vec<BookingCateringLine>> {
        let booking_id_str = booking_id.to_string();
        let rows = sqlx::query_as::<_, CateringLineRow>(
            r#"
            SELECT id, booking_id, menu_id, quantity, unit_price_cents,
                   total_price_cents, special_instructions
            FROM booking_catering
            WHERE booking_id = ?
            "#
        )
        .bind(booking_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_catering_line).collect()
    }

    async fn services_for(&self, booking_id: Uuid) -> Result<Vec<BookingServiceLine>> {
        let booking_id_str = booking_id.to_string();
        let rows = sqlx::query_as::<_, ServiceLineRow>(
            r#"
            SELECT id, booking_id, service_id, quantity, unit_price_cents,
                   total_price_cents, price_type
            FROM booking_services
            WHERE booking_id = ?
            "#
        )
        .bind(booking_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_service_line).collect()
    }

    async fn count_all(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.0)
    }

    async fn count_by_status(&self, status: BookingStatus) -> Result<i64> {
        let status_str = Self::status_to_str(status);
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE status = ?")
            .bind(status_str)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.0)
    }
}
