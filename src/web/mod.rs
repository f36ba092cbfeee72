pub mod portal;
pub mod templates;
pub mod uploads;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::api::{middleware::auth, state::AppState};

pub fn create_web_routes(state: AppState) -> Router {
    // Catalog browsing is public; a logged-in visitor still gets their nav
    // and cart badge.
    let public = Router::new()
        .route("/", get(portal::browse::events_page))
        .route("/events", get(portal::browse::events_page))
        .route("/catering", get(portal::browse::catering_page))
        .route("/services", get(portal::browse::services_page))
        .route("/packages", get(portal::browse::packages_page))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::optional_auth,
        ));

    Router::new()
        .merge(public)
        // Auth pages (web interface)
        .route("/login", get(templates::auth::login_page))
        .route("/login", post(templates::auth::login_handler))
        .route("/register", get(templates::auth::register_page))
        .route("/register", post(templates::auth::register_handler))
        .route("/logout", post(templates::auth::logout_handler))
        // Cart, bookings, payments (member area)
        .merge(portal::create_portal_routes(state.clone()))
        // Back office
        .merge(portal::admin::create_admin_routes(state.clone()))
        // Uploaded catalog photos
        .nest_service("/uploads", ServeDir::new(&state.settings.server.uploads_dir))
        .with_state(state)
}
