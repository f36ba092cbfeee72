use chrono::{TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use soiree::{
    bootstrap,
    config::BootstrapConfig,
    domain::{Cart, CartEventLine, CreateUserRequest, UserRole},
    repository::{
        CartRepository, SqliteCartRepository, SqliteUserRepository, UserRepository,
    },
};

async fn setup() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[tokio::test]
async fn user_crud_and_role_change() -> anyhow::Result<()> {
    let pool = setup().await?;
    let repo = SqliteUserRepository::new(pool.clone());

    let user = repo
        .create(CreateUserRequest {
            email: "test@example.com".to_string(),
            username: "testuser".to_string(),
            full_name: "Test User".to_string(),
            phone: "0820000000".to_string(),
            password: "secure_password123".to_string(),
            role: UserRole::User,
        })
        .await?;
    assert_eq!(user.email, "test@example.com");
    assert_eq!(user.role, UserRole::User);
    assert!(!user.is_staff());

    let found = repo.find_by_id(user.id).await?;
    assert!(found.is_some());

    let by_email = repo.find_by_email("test@example.com").await?;
    assert_eq!(by_email.unwrap().id, user.id);

    let by_username = repo.find_by_username("testuser").await?;
    assert_eq!(by_username.unwrap().id, user.id);

    let promoted = repo.set_role(user.id, UserRole::Staff).await?;
    assert_eq!(promoted.role, UserRole::Staff);
    assert!(promoted.is_staff());
    assert!(!promoted.is_admin());

    let users = repo.list(10, 0).await?;
    assert_eq!(users.len(), 1);

    Ok(())
}

#[tokio::test]
async fn login_verifies_against_stored_hash() -> anyhow::Result<()> {
    let pool = setup().await?;
    let repo = SqliteUserRepository::new(pool.clone());

    repo.create(CreateUserRequest {
        email: "test@example.com".to_string(),
        username: "testuser".to_string(),
        full_name: "Test User".to_string(),
        phone: String::new(),
        password: "my_secure_password".to_string(),
        role: UserRole::User,
    })
    .await?;

    let hash = soiree::repository::user_repository::get_password_hash(&pool, "test@example.com")
        .await?
        .expect("hash stored");
    assert_ne!(hash, "my_secure_password");
    assert!(soiree::auth::verify_password("my_secure_password", &hash)?);
    assert!(!soiree::auth::verify_password("wrong_password", &hash)?);

    Ok(())
}

#[tokio::test]
async fn bootstrap_admin_is_idempotent() -> anyhow::Result<()> {
    let pool = setup().await?;
    let repo = SqliteUserRepository::new(pool.clone());
    let config = BootstrapConfig::default();

    bootstrap::ensure_admin(&repo, &config).await?;
    bootstrap::ensure_admin(&repo, &config).await?;

    let admin = repo
        .find_by_email(&config.admin_email)
        .await?
        .expect("admin created once");
    assert_eq!(admin.role, UserRole::Admin);
    assert!(admin.is_admin());

    assert_eq!(repo.list(10, 0).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn cart_store_round_trips_per_session() -> anyhow::Result<()> {
    let pool = setup().await?;
    let store = SqliteCartRepository::new(pool.clone());

    // Unknown session comes back as an empty cart.
    let cart = store.load("nobody").await?;
    assert!(cart.is_empty());

    let mut cart = Cart::default();
    cart.events.push(CartEventLine {
        line_id: Uuid::new_v4(),
        event_id: Uuid::new_v4(),
        event_name: "Gala".to_string(),
        venue: "Gala Hall".to_string(),
        people_count: 10,
        start_time: Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap(),
        end_time: Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap(),
        base_amount_cents: 500_00,
        total_amount_cents: 500_00,
    });

    store.save("s1", &cart).await?;

    let loaded = store.load("s1").await?;
    assert_eq!(loaded.events.len(), 1);
    assert_eq!(loaded.events[0].event_name, "Gala");
    assert_eq!(loaded.item_count(), 1);

    // Sessions are isolated.
    assert!(store.load("s2").await?.is_empty());

    // Saving again replaces the blob.
    store.save("s1", &Cart::default()).await?;
    assert!(store.load("s1").await?.is_empty());

    store.save("s2", &cart).await?;
    store.clear("s2").await?;
    assert!(store.load("s2").await?.is_empty());

    Ok(())
}
