use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use soiree::{
    domain::{
        AdditionalService, BookingDenial, BookingStatus, CateringMenu, CreateUserRequest,
        EventOffering, MenuType, PaymentMethod, PaymentStatus, PriceType, User, UserRole,
    },
    mail::RecordingNotifier,
    repository::{
        AdditionalServiceRepository, BookingRepository, CartRepository, CateringMenuRepository,
        EventOfferingRepository, PaymentRepository, SqliteAdditionalServiceRepository,
        SqliteBookingRepository, SqliteCartRepository, SqliteCateringMenuRepository,
        SqliteEventOfferingRepository, SqlitePaymentRepository, SqliteUserRepository,
        UserRepository,
    },
    service::booking_service::{AddEventRequest, BookingService},
};

struct TestApp {
    service: BookingService,
    user_repo: Arc<dyn UserRepository>,
    event_repo: Arc<dyn EventOfferingRepository>,
    catering_repo: Arc<dyn CateringMenuRepository>,
    addon_repo: Arc<dyn AdditionalServiceRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    cart_repo: Arc<dyn CartRepository>,
    mailer: Arc<RecordingNotifier>,
}

async fn setup() -> anyhow::Result<TestApp> {
    // One connection: an in-memory SQLite database exists per connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(pool.clone()));
    let event_repo: Arc<dyn EventOfferingRepository> =
        Arc::new(SqliteEventOfferingRepository::new(pool.clone()));
    let catering_repo: Arc<dyn CateringMenuRepository> =
        Arc::new(SqliteCateringMenuRepository::new(pool.clone()));
    let addon_repo: Arc<dyn AdditionalServiceRepository> =
        Arc::new(SqliteAdditionalServiceRepository::new(pool.clone()));
    let booking_repo: Arc<dyn BookingRepository> =
        Arc::new(SqliteBookingRepository::new(pool.clone()));
    let payment_repo: Arc<dyn PaymentRepository> =
        Arc::new(SqlitePaymentRepository::new(pool.clone()));
    let cart_repo: Arc<dyn CartRepository> = Arc::new(SqliteCartRepository::new(pool.clone()));
    let mailer = Arc::new(RecordingNotifier::new());

    let service = BookingService::new(
        event_repo.clone(),
        catering_repo.clone(),
        addon_repo.clone(),
        booking_repo.clone(),
        payment_repo.clone(),
        cart_repo.clone(),
        user_repo.clone(),
        mailer.clone(),
    );

    Ok(TestApp {
        service,
        user_repo,
        event_repo,
        catering_repo,
        addon_repo,
        booking_repo,
        payment_repo,
        cart_repo,
        mailer,
    })
}

impl TestApp {
    async fn make_user(&self, username: &str, role: UserRole) -> anyhow::Result<User> {
        Ok(self
            .user_repo
            .create(CreateUserRequest {
                email: format!("{}@example.com", username),
                username: username.to_string(),
                full_name: format!("{} Test", username),
                phone: "0820000000".to_string(),
                password: "password123".to_string(),
                role,
            })
            .await?)
    }

    async fn make_event(&self, name: &str, capacity: i32, price_cents: i64) -> anyhow::Result<EventOffering> {
        let now = Utc::now();
        Ok(self
            .event_repo
            .create(EventOffering {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: "A lovely venue".to_string(),
                venue: format!("{} Hall", name),
                max_capacity: capacity,
                price_per_person_cents: price_cents,
                image_url: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?)
    }

    async fn make_menu(&self, name: &str, price_cents: i64) -> anyhow::Result<CateringMenu> {
        let now = Utc::now();
        Ok(self
            .catering_repo
            .create(CateringMenu {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: "Tasty".to_string(),
                menu_type: MenuType::Standard,
                price_per_person_cents: price_cents,
                included_items: None,
                is_vegetarian: false,
                is_vegan: false,
                has_gluten_free: false,
                image_url: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?)
    }

    async fn make_addon(&self, name: &str, price_cents: i64) -> anyhow::Result<AdditionalService> {
        let now = Utc::now();
        Ok(self
            .addon_repo
            .create(AdditionalService {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: "Helpful".to_string(),
                price_cents,
                price_type: PriceType::Fixed,
                image_url: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?)
    }
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, hour, 0, 0).unwrap()
}

fn add_request(event_id: Uuid, people: i32, start: u32, end: u32) -> AddEventRequest {
    AddEventRequest {
        event_id,
        people_count: people,
        start_time: at(start),
        end_time: at(end),
    }
}

#[tokio::test]
async fn add_to_cart_computes_total_from_price_per_person() -> anyhow::Result<()> {
    let app = setup().await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    let cart = app
        .service
        .add_event_to_cart("s1", add_request(event.id, 10, 10, 12))
        .await?
        .expect("should be accepted");

    assert_eq!(cart.events.len(), 1);
    assert_eq!(cart.events[0].total_amount_cents, 500_00);
    assert_eq!(cart.events[0].base_amount_cents, 500_00);

    // Nothing persisted yet; the booking table is untouched.
    assert_eq!(app.booking_repo.count_all().await?, 0);

    Ok(())
}

#[tokio::test]
async fn add_to_cart_input_rejections() -> anyhow::Result<()> {
    let app = setup().await?;
    let event = app.make_event("Gala", 50, 50_00).await?;

    // End not after start.
    let denial = app
        .service
        .add_event_to_cart("s1", add_request(event.id, 10, 12, 12))
        .await?
        .expect_err("equal start/end must be rejected");
    assert_eq!(denial, BookingDenial::EndNotAfterStart);

    // Unknown event.
    let denial = app
        .service
        .add_event_to_cart("s1", add_request(Uuid::new_v4(), 10, 10, 12))
        .await?
        .expect_err("unknown event must be rejected");
    assert_eq!(denial, BookingDenial::EventNotFound);

    // People count outside 1..=1000.
    let denial = app
        .service
        .add_event_to_cart("s1", add_request(event.id, 0, 10, 12))
        .await?
        .expect_err("zero people must be rejected");
    assert_eq!(denial, BookingDenial::InvalidPeopleCount { given: 0 });

    // Over venue capacity.
    let denial = app
        .service
        .add_event_to_cart("s1", add_request(event.id, 60, 10, 12))
        .await?
        .expect_err("over capacity must be rejected");
    assert_eq!(
        denial,
        BookingDenial::OverCapacity {
            requested: 60,
            capacity: 50
        }
    );

    // Inactive event.
    app.event_repo.set_active(event.id, false).await?;
    let denial = app
        .service
        .add_event_to_cart("s1", add_request(event.id, 10, 10, 12))
        .await?
        .expect_err("inactive event must be rejected");
    assert_eq!(denial, BookingDenial::EventInactive);

    Ok(())
}

#[tokio::test]
async fn add_to_cart_rejects_overlap_with_persisted_booking() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.make_user("alice", UserRole::User).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    app.service
        .add_event_to_cart("alice", add_request(event.id, 10, 10, 12))
        .await?
        .expect("first proposal fits");
    app.service
        .confirm_cart("alice", &user)
        .await?
        .expect("confirmation succeeds");

    // 11:00-13:00 intersects 10:00-12:00.
    let denial = app
        .service
        .add_event_to_cart("bob", add_request(event.id, 10, 11, 13))
        .await?
        .expect_err("overlap must be rejected");
    assert!(matches!(denial, BookingDenial::SlotTaken { .. }));

    // 12:00-13:00 is back-to-back and allowed.
    app.service
        .add_event_to_cart("bob", add_request(event.id, 10, 12, 13))
        .await?
        .expect("adjacent slot is allowed");

    Ok(())
}

#[tokio::test]
async fn add_to_cart_rejects_overlap_within_cart() -> anyhow::Result<()> {
    let app = setup().await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    app.service
        .add_event_to_cart("s1", add_request(event.id, 5, 10, 12))
        .await?
        .expect("first line fits");

    let denial = app
        .service
        .add_event_to_cart("s1", add_request(event.id, 5, 11, 13))
        .await?
        .expect_err("cart overlap must be rejected");
    assert_eq!(denial, BookingDenial::SlotTakenInCart);

    // A different session's cart does not interfere.
    app.service
        .add_event_to_cart("s2", add_request(event.id, 5, 11, 13))
        .await?
        .expect("other sessions only clash through the booking table");

    Ok(())
}

#[tokio::test]
async fn confirming_empty_cart_is_rejected_without_persistence() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.make_user("alice", UserRole::User).await?;
    let menu = app.make_menu("Buffet", 20_00).await?;

    // Catering alone is not confirmable.
    app.service
        .add_catering_to_cart("s1", menu.id, 4, String::new())
        .await?
        .expect("catering line is accepted");

    let denial = app
        .service
        .confirm_cart("s1", &user)
        .await?
        .expect_err("no event lines means no confirmation");
    assert_eq!(denial, BookingDenial::EmptyCart);
    assert_eq!(app.booking_repo.count_all().await?, 0);

    // The cart is left as it was.
    let cart = app.cart_repo.load("s1").await?;
    assert_eq!(cart.catering.len(), 1);

    Ok(())
}

#[tokio::test]
async fn confirmation_persists_children_and_clears_all_carts() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.make_user("alice", UserRole::User).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;
    let menu = app.make_menu("Buffet", 20_00).await?;
    let addon = app.make_addon("Flowers", 150_00).await?;

    app.service
        .add_event_to_cart("s1", add_request(event.id, 10, 10, 12))
        .await?
        .expect("event line fits");
    app.service
        .add_catering_to_cart("s1", menu.id, 10, "No nuts".to_string())
        .await?
        .expect("catering accepted");
    app.service
        .add_service_to_cart("s1", addon.id, 1)
        .await?
        .expect("service accepted");

    let confirmation = app
        .service
        .confirm_cart("s1", &user)
        .await?
        .expect("confirmation succeeds");
    assert_eq!(confirmation.booking_ids.len(), 1);

    let booking = app
        .booking_repo
        .find_by_id(confirmation.booking_ids[0])
        .await?
        .expect("booking persisted");
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.user_id, user.id);
    assert_eq!(booking.total_amount_cents, 500_00);

    let catering = app.booking_repo.catering_for(booking.id).await?;
    assert_eq!(catering.len(), 1);
    assert_eq!(catering[0].quantity, 10);
    assert_eq!(catering[0].unit_price_cents, 20_00);
    assert_eq!(catering[0].total_price_cents, 200_00);
    assert_eq!(catering[0].special_instructions, "No nuts");

    let services = app.booking_repo.services_for(booking.id).await?;
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].total_price_cents, 150_00);

    // All three collections cleared, not just the confirmed event line.
    let cart = app.cart_repo.load("s1").await?;
    assert!(cart.is_empty());

    // One confirmation email went out.
    let subjects = app.mailer.sent_subjects();
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].contains("Booking Confirmation"));

    Ok(())
}

#[tokio::test]
async fn price_snapshot_survives_catalog_edits() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.make_user("alice", UserRole::User).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;
    let menu = app.make_menu("Buffet", 20_00).await?;

    app.service
        .add_event_to_cart("s1", add_request(event.id, 10, 10, 12))
        .await?
        .expect("event line fits");
    app.service
        .add_catering_to_cart("s1", menu.id, 5, String::new())
        .await?
        .expect("catering accepted");
    let confirmation = app.service.confirm_cart("s1", &user).await?.expect("confirmed");

    // Reprice the menu after confirmation.
    let mut repriced = app.catering_repo.find_by_id(menu.id).await?.unwrap();
    repriced.price_per_person_cents = 99_00;
    app.catering_repo.update(menu.id, repriced).await?;

    let lines = app
        .booking_repo
        .catering_for(confirmation.booking_ids[0])
        .await?;
    assert_eq!(lines[0].unit_price_cents, 20_00);
    assert_eq!(lines[0].total_price_cents, 100_00);

    Ok(())
}

#[tokio::test]
async fn confirmation_rechecks_the_booking_table() -> anyhow::Result<()> {
    let app = setup().await?;
    let alice = app.make_user("alice", UserRole::User).await?;
    let bob = app.make_user("bob", UserRole::User).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    // Both sessions pass the add-to-cart check for the same slot.
    app.service
        .add_event_to_cart("alice", add_request(event.id, 10, 10, 12))
        .await?
        .expect("alice's proposal fits");
    app.service
        .add_event_to_cart("bob", add_request(event.id, 10, 11, 13))
        .await?
        .expect("bob's proposal fits while nothing is persisted");

    // Alice confirms first and takes the slot.
    app.service
        .confirm_cart("alice", &alice)
        .await?
        .expect("alice wins the slot");

    // Bob's confirmation re-checks against the live table and loses.
    let denial = app
        .service
        .confirm_cart("bob", &bob)
        .await?
        .expect_err("stale cart line must be rejected at confirmation");
    assert!(matches!(denial, BookingDenial::SlotTaken { .. }));

    // Bob's cart is left intact for him to adjust.
    let cart = app.cart_repo.load("bob").await?;
    assert_eq!(cart.events.len(), 1);
    assert_eq!(app.booking_repo.count_all().await?, 1);

    Ok(())
}

#[tokio::test]
async fn confirmation_commits_lines_before_a_conflict() -> anyhow::Result<()> {
    let app = setup().await?;
    let alice = app.make_user("alice", UserRole::User).await?;
    let bob = app.make_user("bob", UserRole::User).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    // Bob carts two lines: morning and afternoon.
    app.service
        .add_event_to_cart("bob", add_request(event.id, 10, 9, 11))
        .await?
        .expect("morning line fits");
    app.service
        .add_event_to_cart("bob", add_request(event.id, 10, 14, 16))
        .await?
        .expect("afternoon line fits");

    // Alice grabs the afternoon before bob confirms.
    app.service
        .add_event_to_cart("alice", add_request(event.id, 10, 15, 17))
        .await?
        .expect("alice's proposal fits");
    app.service
        .confirm_cart("alice", &alice)
        .await?
        .expect("alice confirms");

    // Bob's pass commits the morning line, then aborts on the afternoon.
    let denial = app
        .service
        .confirm_cart("bob", &bob)
        .await?
        .expect_err("second line conflicts");
    assert!(matches!(denial, BookingDenial::SlotTaken { .. }));

    let bobs = app.booking_repo.list_by_user(bob.id).await?;
    assert_eq!(bobs.len(), 1, "earlier lines in the pass stay committed");
    assert_eq!(bobs[0].start_time, at(9));

    Ok(())
}

#[tokio::test]
async fn notification_failure_does_not_fail_confirmation() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.make_user("alice", UserRole::User).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    app.mailer.fail.store(true, std::sync::atomic::Ordering::SeqCst);

    app.service
        .add_event_to_cart("s1", add_request(event.id, 10, 10, 12))
        .await?
        .expect("proposal fits");
    app.service
        .confirm_cart("s1", &user)
        .await?
        .expect("booking succeeds even when mail delivery fails");

    assert_eq!(app.booking_repo.count_all().await?, 1);

    Ok(())
}

#[tokio::test]
async fn catering_quantity_merges_per_menu() -> anyhow::Result<()> {
    let app = setup().await?;
    let menu = app.make_menu("Buffet", 20_00).await?;

    app.service
        .add_catering_to_cart("s1", menu.id, 3, String::new())
        .await?
        .expect("first add");
    let cart = app
        .service
        .add_catering_to_cart("s1", menu.id, 2, String::new())
        .await?
        .expect("second add merges");

    assert_eq!(cart.catering.len(), 1);
    assert_eq!(cart.catering[0].quantity, 5);
    assert_eq!(cart.catering[0].total_price_cents, 100_00);

    Ok(())
}

#[tokio::test]
async fn cart_removal_checks_indices() -> anyhow::Result<()> {
    let app = setup().await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    app.service
        .add_event_to_cart("s1", add_request(event.id, 5, 10, 12))
        .await?
        .expect("line fits");

    let denial = app
        .service
        .remove_event_from_cart("s1", 7)
        .await?
        .expect_err("bad index is a structured failure");
    assert_eq!(denial, BookingDenial::InvalidCartIndex);

    let cart = app
        .service
        .remove_event_from_cart("s1", 0)
        .await?
        .expect("valid index removes");
    assert!(cart.events.is_empty());

    Ok(())
}

#[tokio::test]
async fn cancel_is_owner_or_admin_only() -> anyhow::Result<()> {
    let app = setup().await?;
    let alice = app.make_user("alice", UserRole::User).await?;
    let mallory = app.make_user("mallory", UserRole::User).await?;
    let admin = app.make_user("root", UserRole::Admin).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    app.service
        .add_event_to_cart("alice", add_request(event.id, 10, 10, 12))
        .await?
        .expect("fits");
    let confirmation = app.service.confirm_cart("alice", &alice).await?.expect("confirmed");
    let booking_id = confirmation.booking_ids[0];

    let denial = app
        .service
        .cancel_booking(&mallory, booking_id)
        .await?
        .expect_err("strangers cannot cancel");
    assert_eq!(denial, BookingDenial::NotOwner);

    let cancelled = app
        .service
        .cancel_booking(&admin, booking_id)
        .await?
        .expect("admins may cancel any booking");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    // The freed slot becomes bookable again.
    app.service
        .add_event_to_cart("bob", add_request(event.id, 10, 10, 12))
        .await?
        .expect("cancelled bookings do not block the slot");

    Ok(())
}

#[tokio::test]
async fn paid_bookings_cannot_be_cancelled() -> anyhow::Result<()> {
    let app = setup().await?;
    let alice = app.make_user("alice", UserRole::User).await?;
    let admin = app.make_user("root", UserRole::Admin).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    app.service
        .add_event_to_cart("alice", add_request(event.id, 10, 10, 12))
        .await?
        .expect("fits");
    let confirmation = app.service.confirm_cart("alice", &alice).await?.expect("confirmed");
    let booking_id = confirmation.booking_ids[0];

    app.service
        .approve_booking(&admin, booking_id)
        .await?
        .expect("approval from pending");
    app.service
        .pay_booking(&alice, booking_id, PaymentMethod::Card)
        .await?
        .expect("approved booking is payable");

    let denial = app
        .service
        .cancel_booking(&alice, booking_id)
        .await?
        .expect_err("paid bookings are not cancellable");
    assert!(matches!(denial, BookingDenial::InvalidTransition { .. }));

    Ok(())
}

#[tokio::test]
async fn payment_requires_approved_status_and_stamps_dates() -> anyhow::Result<()> {
    let app = setup().await?;
    let alice = app.make_user("alice", UserRole::User).await?;
    let admin = app.make_user("root", UserRole::Admin).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;
    let menu = app.make_menu("Buffet", 20_00).await?;

    app.service
        .add_event_to_cart("alice", add_request(event.id, 10, 10, 12))
        .await?
        .expect("fits");
    app.service
        .add_catering_to_cart("alice", menu.id, 10, String::new())
        .await?
        .expect("catering accepted");
    let confirmation = app.service.confirm_cart("alice", &alice).await?.expect("confirmed");
    let booking_id = confirmation.booking_ids[0];

    // Pending bookings cannot be paid.
    let denial = app
        .service
        .pay_booking(&alice, booking_id, PaymentMethod::Card)
        .await?
        .expect_err("pending is not payable");
    assert_eq!(
        denial,
        BookingDenial::NotPayable {
            status: BookingStatus::Pending
        }
    );

    let approved = app
        .service
        .approve_booking(&admin, booking_id)
        .await?
        .expect("approved");
    assert!(approved.approved_at.is_some());

    let payment = app
        .service
        .pay_booking(&alice, booking_id, PaymentMethod::Card)
        .await?
        .expect("payment captured");
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert!(payment.transaction_id.starts_with("TXN"));
    // Event total 500.00 plus catering 200.00.
    assert_eq!(payment.amount_cents, 700_00);

    let booking = app.booking_repo.find_by_id(booking_id).await?.unwrap();
    assert_eq!(booking.status, BookingStatus::Paid);
    assert!(booking.paid_at.is_some());

    let recorded = app.payment_repo.list_by_booking(booking_id).await?;
    assert_eq!(recorded.len(), 1);

    // Paying again is rejected.
    let denial = app
        .service
        .pay_booking(&alice, booking_id, PaymentMethod::Card)
        .await?
        .expect_err("paid is not payable again");
    assert!(matches!(denial, BookingDenial::NotPayable { .. }));

    Ok(())
}

#[tokio::test]
async fn payment_is_owner_only() -> anyhow::Result<()> {
    let app = setup().await?;
    let alice = app.make_user("alice", UserRole::User).await?;
    let mallory = app.make_user("mallory", UserRole::User).await?;
    let admin = app.make_user("root", UserRole::Admin).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    app.service
        .add_event_to_cart("alice", add_request(event.id, 10, 10, 12))
        .await?
        .expect("fits");
    let confirmation = app.service.confirm_cart("alice", &alice).await?.expect("confirmed");
    let booking_id = confirmation.booking_ids[0];
    app.service.approve_booking(&admin, booking_id).await?.expect("approved");

    let denial = app
        .service
        .pay_booking(&mallory, booking_id, PaymentMethod::Card)
        .await?
        .expect_err("only the owner pays");
    assert_eq!(denial, BookingDenial::NotOwner);

    Ok(())
}

#[tokio::test]
async fn booking_decisions_are_admin_only_and_transition_checked() -> anyhow::Result<()> {
    let app = setup().await?;
    let alice = app.make_user("alice", UserRole::User).await?;
    let staff = app.make_user("clerk", UserRole::Staff).await?;
    let admin = app.make_user("root", UserRole::Admin).await?;
    let event = app.make_event("Gala", 100, 50_00).await?;

    app.service
        .add_event_to_cart("alice", add_request(event.id, 10, 10, 12))
        .await?
        .expect("fits");
    let confirmation = app.service.confirm_cart("alice", &alice).await?.expect("confirmed");
    let booking_id = confirmation.booking_ids[0];

    // Staff are not approvers.
    assert!(app.service.approve_booking(&staff, booking_id).await.is_err());

    app.service.approve_booking(&admin, booking_id).await?.expect("approved");

    // Approved bookings cannot then be rejected.
    let denial = app
        .service
        .reject_booking(&admin, booking_id)
        .await?
        .expect_err("reject only from pending");
    assert!(matches!(denial, BookingDenial::InvalidTransition { .. }));

    // Complete requires Paid.
    let denial = app
        .service
        .complete_booking(&admin, booking_id)
        .await?
        .expect_err("complete only from paid");
    assert!(matches!(denial, BookingDenial::InvalidTransition { .. }));

    app.service
        .pay_booking(&alice, booking_id, PaymentMethod::Eft)
        .await?
        .expect("paid");
    let completed = app
        .service
        .complete_booking(&admin, booking_id)
        .await?
        .expect("completed");
    assert_eq!(completed.status, BookingStatus::Completed);

    Ok(())
}

#[tokio::test]
async fn spec_example_scenario() -> anyhow::Result<()> {
    let app = setup().await?;
    let alice = app.make_user("alice", UserRole::User).await?;
    // Capacity 100, price 50 per person, no existing bookings.
    let event = app.make_event("Gala", 100, 50_00).await?;

    // 10:00-12:00 for 10 people: expected total 500.
    let cart = app
        .service
        .add_event_to_cart("alice", add_request(event.id, 10, 10, 12))
        .await?
        .expect("accepted");
    assert_eq!(cart.events[0].total_amount_cents, 500_00);

    let confirmation = app.service.confirm_cart("alice", &alice).await?.expect("confirmed");
    let booking = app
        .booking_repo
        .find_by_id(confirmation.booking_ids[0])
        .await?
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.total_amount_cents, 500_00);

    // A second user: 11:00-13:00 rejected with an overlap message.
    let denial = app
        .service
        .add_event_to_cart("bob", add_request(event.id, 10, 11, 13))
        .await?
        .expect_err("overlap rejected");
    assert!(denial.to_string().contains("overlaps"));

    // 12:00-13:00 accepted.
    app.service
        .add_event_to_cart("bob", add_request(event.id, 10, 12, 13))
        .await?
        .expect("adjacent accepted");

    Ok(())
}
