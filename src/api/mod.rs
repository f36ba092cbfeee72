pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root::health_check,
        handlers::root::api_info,
        handlers::public::list_events,
        handlers::public::list_packages,
    ),
    components(schemas(
        handlers::public::EventSummary,
        handlers::public::PackageSummary,
    ))
)]
struct ApiDoc;

pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::root::health_check))
        .route("/api", get(handlers::root::api_info))
        .route("/api/public/events", get(handlers::public::list_events))
        .route("/api/public/packages", get(handlers::public::list_packages))
        .with_state(app_state)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}
