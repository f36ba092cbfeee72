use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use soiree::{
    domain::{
        Booking, BookingCateringLine, BookingServiceLine, BookingStatus, CateringMenu,
        CreateUserRequest, EventOffering, MenuType, UserRole,
    },
    repository::{
        BookingRepository, CateringMenuRepository, EventOfferingRepository,
        SqliteBookingRepository, SqliteCateringMenuRepository, SqliteEventOfferingRepository,
        SqliteUserRepository, UserRepository,
    },
};

async fn setup() -> anyhow::Result<(SqlitePool, Uuid, Uuid)> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let users = SqliteUserRepository::new(pool.clone());
    let user = users
        .create(CreateUserRequest {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            full_name: "Alice Test".to_string(),
            phone: "0820000000".to_string(),
            password: "password123".to_string(),
            role: UserRole::User,
        })
        .await?;

    let events = SqliteEventOfferingRepository::new(pool.clone());
    let now = Utc::now();
    let event = events
        .create(EventOffering {
            id: Uuid::new_v4(),
            name: "Gala".to_string(),
            description: "A lovely venue".to_string(),
            venue: "Gala Hall".to_string(),
            max_capacity: 100,
            price_per_person_cents: 50_00,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    Ok((pool, user.id, event.id))
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, hour, 0, 0).unwrap()
}

fn booking(user_id: Uuid, event_id: Uuid, start: u32, end: u32) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        user_id,
        event_id,
        people_count: 10,
        start_time: at(start),
        end_time: at(end),
        base_amount_cents: 500_00,
        total_amount_cents: 500_00,
        status: BookingStatus::Pending,
        booked_at: Utc::now(),
        approved_at: None,
        paid_at: None,
    }
}

#[tokio::test]
async fn overlap_query_uses_half_open_intervals() -> anyhow::Result<()> {
    let (pool, user_id, event_id) = setup().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    repo.create_if_slot_free(booking(user_id, event_id, 10, 12), vec![], vec![])
        .await?
        .expect("empty table accepts anything");

    // Intersections in every direction.
    assert!(repo.has_overlap(event_id, at(11), at(13)).await?);
    assert!(repo.has_overlap(event_id, at(9), at(11)).await?);
    assert!(repo.has_overlap(event_id, at(10), at(12)).await?);
    assert!(repo.has_overlap(event_id, at(9), at(14)).await?);
    assert!(repo.has_overlap(event_id, at(11), at(12)).await?);

    // Touching endpoints do not conflict.
    assert!(!repo.has_overlap(event_id, at(12), at(13)).await?);
    assert!(!repo.has_overlap(event_id, at(8), at(10)).await?);

    // A different event is free.
    assert!(!repo.has_overlap(Uuid::new_v4(), at(11), at(13)).await?);

    Ok(())
}

#[tokio::test]
async fn cancelled_bookings_release_the_slot() -> anyhow::Result<()> {
    let (pool, user_id, event_id) = setup().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    let created = repo
        .create_if_slot_free(booking(user_id, event_id, 10, 12), vec![], vec![])
        .await?
        .expect("created");
    assert!(repo.has_overlap(event_id, at(11), at(13)).await?);

    repo.update_status(created.id, BookingStatus::Cancelled).await?;
    assert!(!repo.has_overlap(event_id, at(11), at(13)).await?);

    Ok(())
}

#[tokio::test]
async fn guarded_insert_refuses_a_taken_slot() -> anyhow::Result<()> {
    let (pool, user_id, event_id) = setup().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    repo.create_if_slot_free(booking(user_id, event_id, 10, 12), vec![], vec![])
        .await?
        .expect("first insert succeeds");

    // Same check-and-insert against an intersecting window comes back None
    // and writes nothing.
    let refused = repo
        .create_if_slot_free(booking(user_id, event_id, 11, 13), vec![], vec![])
        .await?;
    assert!(refused.is_none());
    assert_eq!(repo.count_all().await?, 1);

    // Adjacent window goes through.
    repo.create_if_slot_free(booking(user_id, event_id, 12, 13), vec![], vec![])
        .await?
        .expect("adjacent insert succeeds");
    assert_eq!(repo.count_all().await?, 2);

    Ok(())
}

#[tokio::test]
async fn guarded_insert_writes_children_atomically() -> anyhow::Result<()> {
    let (pool, user_id, event_id) = setup().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    let menus = SqliteCateringMenuRepository::new(pool.clone());
    let now = Utc::now();
    let menu = menus
        .create(CateringMenu {
            id: Uuid::new_v4(),
            name: "Buffet".to_string(),
            description: "Tasty".to_string(),
            menu_type: MenuType::Standard,
            price_per_person_cents: 20_00,
            included_items: None,
            is_vegetarian: false,
            is_vegan: false,
            has_gluten_free: false,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let b = booking(user_id, event_id, 10, 12);
    let booking_id = b.id;

    let catering = vec![BookingCateringLine {
        id: Uuid::new_v4(),
        booking_id,
        menu_id: menu.id,
        quantity: 10,
        unit_price_cents: 20_00,
        total_price_cents: 200_00,
        special_instructions: String::new(),
    }];
    let services: Vec<BookingServiceLine> = vec![];

    repo.create_if_slot_free(b, catering, services)
        .await?
        .expect("insert succeeds");

    let lines = repo.catering_for(booking_id).await?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].total_price_cents, 200_00);
    assert_eq!(lines[0].menu_id, menu.id);

    Ok(())
}

#[tokio::test]
async fn listing_orders_and_status_stamps() -> anyhow::Result<()> {
    let (pool, user_id, event_id) = setup().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    let first = repo
        .create_if_slot_free(booking(user_id, event_id, 8, 9), vec![], vec![])
        .await?
        .expect("created");
    let second = repo
        .create_if_slot_free(booking(user_id, event_id, 10, 11), vec![], vec![])
        .await?
        .expect("created");

    let mine = repo.list_by_user(user_id).await?;
    assert_eq!(mine.len(), 2);

    assert_eq!(repo.list_pending().await?.len(), 2);
    assert_eq!(repo.count_by_status(BookingStatus::Pending).await?, 2);

    let approved = repo.update_status(first.id, BookingStatus::Approved).await?;
    assert_eq!(approved.status, BookingStatus::Approved);
    assert!(approved.approved_at.is_some());
    assert!(approved.paid_at.is_none());

    let paid = repo.update_status(first.id, BookingStatus::Paid).await?;
    assert!(paid.paid_at.is_some());

    assert_eq!(repo.list_pending().await?.len(), 1);
    assert_eq!(repo.list_pending().await?[0].id, second.id);

    Ok(())
}
