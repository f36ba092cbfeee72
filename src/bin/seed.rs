use clap::Parser;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use soiree::{
    domain::{
        AdditionalService, CateringMenu, CreateUserRequest, EventOffering, MenuType, Package,
        PackageItem, PriceType, UserRole,
    },
    repository::{
        AdditionalServiceRepository, CateringMenuRepository, EventOfferingRepository,
        PackageRepository, SqliteAdditionalServiceRepository, SqliteCateringMenuRepository,
        SqliteEventOfferingRepository, SqlitePackageRepository, SqliteUserRepository,
        UserRepository,
    },
};

/// Seed the database with demo catalog data and test accounts.
#[derive(Parser)]
struct Args {
    /// Database URL (defaults to DATABASE_URL or sqlite:soiree.db)
    #[arg(long)]
    database_url: Option<String>,

    /// How many demo customer accounts to create
    #[arg(long, default_value_t = 3)]
    customers: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:soiree.db?mode=rwc".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let event_repo = SqliteEventOfferingRepository::new(db_pool.clone());
    let catering_repo = SqliteCateringMenuRepository::new(db_pool.clone());
    let service_repo = SqliteAdditionalServiceRepository::new(db_pool.clone());
    let package_repo = SqlitePackageRepository::new(db_pool.clone());

    println!("👥 Creating accounts...");

    if user_repo.find_by_email("admin@soiree.local").await?.is_none() {
        user_repo
            .create(CreateUserRequest {
                email: "admin@soiree.local".to_string(),
                username: "admin".to_string(),
                full_name: "System Admin".to_string(),
                phone: "0123456789".to_string(),
                password: "Admin123!".to_string(),
                role: UserRole::Admin,
            })
            .await?;
        println!("  ✅ Created admin account (admin@soiree.local / Admin123!)");
    }

    if user_repo.find_by_email("staff@soiree.local").await?.is_none() {
        user_repo
            .create(CreateUserRequest {
                email: "staff@soiree.local".to_string(),
                username: "staff".to_string(),
                full_name: "Front Desk".to_string(),
                phone: "0123456780".to_string(),
                password: "Staff123!".to_string(),
                role: UserRole::Staff,
            })
            .await?;
        println!("  ✅ Created staff account (staff@soiree.local / Staff123!)");
    }

    for i in 0..args.customers {
        let email = format!("customer{}@example.com", i + 1);
        if user_repo.find_by_email(&email).await?.is_none() {
            let full_name: String = Name().fake();
            let phone: String = PhoneNumber().fake();
            user_repo
                .create(CreateUserRequest {
                    email: email.clone(),
                    username: format!("customer{}", i + 1),
                    full_name,
                    phone,
                    password: "Password123!".to_string(),
                    role: UserRole::User,
                })
                .await?;
        }
    }
    println!("  ✅ Created {} customer accounts (password Password123!)", args.customers);

    println!("🏛️  Creating event offerings...");

    let venues = [
        ("Grand Ballroom Gala", "Grand Ballroom", 300, 650_00i64),
        ("Garden Pavilion Reception", "Garden Pavilion", 150, 480_00),
        ("Riverside Conference", "Riverside Hall", 200, 350_00),
        ("Rooftop Sundowner", "Skyline Rooftop", 80, 520_00),
    ];

    let mut event_ids = Vec::new();
    for (name, venue, capacity, price) in venues {
        let description: String = Sentence(8..16).fake();
        let now = chrono::Utc::now();
        let event = event_repo
            .create(EventOffering {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description,
                venue: venue.to_string(),
                max_capacity: capacity,
                price_per_person_cents: price,
                image_url: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        event_ids.push(event.id);
    }
    println!("  ✅ Created {} event offerings", event_ids.len());

    println!("🍽️  Creating catering menus...");

    let menus = [
        ("Standard Buffet", MenuType::Standard, 180_00i64, false, false),
        ("Premium Plated Dinner", MenuType::Premium, 320_00, false, false),
        ("Garden Vegetarian Feast", MenuType::Vegetarian, 240_00, true, false),
        ("Plant-Based Banquet", MenuType::Vegan, 260_00, true, true),
        ("Kids Party Platter", MenuType::Kids, 95_00, false, false),
    ];

    let mut menu_ids = Vec::new();
    for (name, menu_type, price, vegetarian, vegan) in menus {
        let description: String = Sentence(6..12).fake();
        let now = chrono::Utc::now();
        let menu = catering_repo
            .create(CateringMenu {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description,
                menu_type,
                price_per_person_cents: price,
                included_items: Some("Starter, main course, dessert, soft drinks".to_string()),
                is_vegetarian: vegetarian,
                is_vegan: vegan,
                has_gluten_free: true,
                image_url: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        menu_ids.push(menu.id);
    }
    println!("  ✅ Created {} catering menus", menu_ids.len());

    println!("🎈 Creating additional services...");

    let services = [
        ("Floral Decor", 3500_00i64, PriceType::Fixed),
        ("Sound & Lighting", 450_00, PriceType::PerHour),
        ("Security Detail", 120_00, PriceType::PerHour),
        ("Photography", 5500_00, PriceType::Fixed),
        ("Valet Parking", 45_00, PriceType::PerPerson),
    ];

    let mut service_ids = Vec::new();
    for (name, price, price_type) in services {
        let description: String = Sentence(6..12).fake();
        let now = chrono::Utc::now();
        let service = service_repo
            .create(AdditionalService {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description,
                price_cents: price,
                price_type,
                image_url: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        service_ids.push(service.id);
    }
    println!("  ✅ Created {} additional services", service_ids.len());

    println!("🎁 Creating packages...");

    let package_id = Uuid::new_v4();
    let now = chrono::Utc::now();
    package_repo
        .create(
            Package {
                id: package_id,
                name: "Wedding Classic".to_string(),
                description: "Ballroom venue with premium dinner, flowers and photography."
                    .to_string(),
                event_id: event_ids[0],
                total_price_cents: 85_000_00,
                image_url: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            vec![
                PackageItem {
                    id: Uuid::new_v4(),
                    package_id,
                    menu_id: Some(menu_ids[1]),
                    service_id: None,
                },
                PackageItem {
                    id: Uuid::new_v4(),
                    package_id,
                    menu_id: None,
                    service_id: Some(service_ids[0]),
                },
                PackageItem {
                    id: Uuid::new_v4(),
                    package_id,
                    menu_id: None,
                    service_id: Some(service_ids[3]),
                },
            ],
        )
        .await?;
    println!("  ✅ Created 1 package");

    println!("🎉 Seeding complete!");
    Ok(())
}
