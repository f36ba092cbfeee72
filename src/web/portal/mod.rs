pub mod admin;
pub mod bookings;
pub mod browse;
pub mod cart;
pub mod payments;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::{
    middleware::auth::{self, SessionInfo},
    state::AppState,
};

pub fn create_portal_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Cart
        .route("/bookings/new/:event_id", get(cart::new_booking_page))
        .route("/cart", get(cart::cart_page))
        .route("/cart/events", post(cart::add_event_to_cart))
        .route("/cart/catering", post(cart::add_catering_to_cart))
        .route("/cart/services", post(cart::add_service_to_cart))
        .route("/cart/events/remove", post(cart::remove_event_from_cart))
        .route("/cart/catering/remove", post(cart::remove_catering_from_cart))
        .route("/cart/services/remove", post(cart::remove_service_from_cart))
        .route("/cart/confirm", post(cart::confirm_cart))
        // Bookings
        .route("/bookings", get(bookings::my_bookings_page))
        .route("/bookings/:id", get(bookings::booking_detail_page))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        // Payments
        .route("/payments/new/:booking_id", get(payments::payment_page))
        .route("/payments/new/:booking_id", post(payments::process_payment))
        .route("/payments/:id/receipt", get(payments::receipt_page))
        // Require authentication; anonymous visitors land on the login page
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_auth_redirect,
        ))
}

/// Cart badge for the nav; anonymous visitors simply see zero.
pub async fn cart_badge(state: &AppState, session: Option<&SessionInfo>) -> usize {
    match session {
        Some(si) => state
            .service_context
            .cart_repo
            .load(&si.session_id)
            .await
            .map(|c| c.item_count())
            .unwrap_or(0),
        None => 0,
    }
}

/// State-changing form posts carry a per-session token; a miss means the
/// form did not come from a page we rendered.
pub async fn csrf_ok(state: &AppState, session: &SessionInfo, token: &str) -> bool {
    state
        .service_context
        .csrf_service
        .validate_token(&session.session_id, token)
        .await
        .unwrap_or(false)
}

pub async fn fresh_csrf(state: &AppState, session: &SessionInfo) -> String {
    state
        .service_context
        .csrf_service
        .generate_token(&session.session_id)
        .await
        .unwrap_or_else(|_| "error".to_string())
}
