use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soiree::{
    api,
    bootstrap,
    config::Settings,
    mail::{NoopNotifier, Notifier, SmtpNotifier},
    service::ServiceContext,
    web,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soiree=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!(
        "Starting Soiree server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Outbound mail: SMTP when configured, otherwise a logging noop.
    let notifier: Arc<dyn Notifier> = match SmtpNotifier::from_config(&settings.smtp) {
        Some(smtp) => {
            tracing::info!("SMTP notifications enabled");
            Arc::new(smtp)
        }
        None => {
            tracing::info!("SMTP notifications disabled");
            Arc::new(NoopNotifier)
        }
    };

    // Create service context
    let service_context = Arc::new(ServiceContext::new(db_pool.clone(), notifier));

    // Make sure the admin account exists before taking traffic.
    bootstrap::ensure_admin(service_context.user_repo.as_ref(), &settings.bootstrap).await?;

    // Startup housekeeping: drop expired sessions and the CSRF tokens
    // orphaned by them.
    let removed = service_context.auth_service.cleanup_expired_sessions().await?;
    let orphaned = service_context.csrf_service.cleanup_orphaned().await?;
    if removed > 0 || orphaned > 0 {
        tracing::info!("Cleaned up {} expired sessions, {} orphaned CSRF tokens", removed, orphaned);
    }

    let settings = Arc::new(settings);

    // Create API app
    let app_state = api::state::AppState::new(service_context, settings.clone());
    let api_app = api::create_app(app_state.clone());
    let web_app = web::create_web_routes(app_state);

    // Combine API and web routes
    let app = api_app.merge(web_app);

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;

    tracing::info!(
        "Server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
