pub mod events;
pub mod menus;
pub mod packages;
pub mod services;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        middleware::auth::{self, CurrentUser, SessionInfo},
        state::AppState,
    },
    domain::{format_cents, BookingStatus},
    web::templates::{
        nav_context, redirect_with_err, redirect_with_msg, FlashParams, HtmlTemplate, UserInfo,
    },
};

use super::{cart_badge, csrf_ok, fresh_csrf};

pub fn create_admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard_page))
        .route("/admin/bookings", get(all_bookings_page))
        .route("/admin/approvals", get(approvals_page))
        .route("/admin/bookings/:id/approve", post(approve_booking))
        .route("/admin/bookings/:id/reject", post(reject_booking))
        .route("/admin/bookings/:id/complete", post(complete_booking))
        // Catalog management
        .route("/admin/events", get(events::admin_events_page))
        .route("/admin/events/new", get(events::admin_new_event_page))
        .route("/admin/events/new", post(events::admin_create_event))
        .route("/admin/events/:id", get(events::admin_edit_event_page))
        .route("/admin/events/:id/update", post(events::admin_update_event))
        .route("/admin/events/:id/delete", post(events::admin_delete_event))
        .route("/admin/menus", get(menus::admin_menus_page))
        .route("/admin/menus/new", get(menus::admin_new_menu_page))
        .route("/admin/menus/new", post(menus::admin_create_menu))
        .route("/admin/menus/:id", get(menus::admin_edit_menu_page))
        .route("/admin/menus/:id/update", post(menus::admin_update_menu))
        .route("/admin/menus/:id/delete", post(menus::admin_delete_menu))
        .route("/admin/services", get(services::admin_services_page))
        .route("/admin/services/new", get(services::admin_new_service_page))
        .route("/admin/services/new", post(services::admin_create_service))
        .route("/admin/services/:id", get(services::admin_edit_service_page))
        .route("/admin/services/:id/update", post(services::admin_update_service))
        .route("/admin/services/:id/delete", post(services::admin_delete_service))
        .route("/admin/packages", get(packages::admin_packages_page))
        .route("/admin/packages/new", get(packages::admin_new_package_page))
        .route("/admin/packages/new", post(packages::admin_create_package))
        .route("/admin/packages/:id", get(packages::admin_edit_package_page))
        .route("/admin/packages/:id/update", post(packages::admin_update_package))
        .route("/admin/packages/:id/delete", post(packages::admin_delete_package))
        // Staff and admins only
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_staff_redirect,
        ))
}

/// Catalog prices arrive as "50.00"; stored as integer cents.
pub fn parse_price_cents(s: &str) -> Option<i64> {
    let value: f64 = s.trim().parse().ok()?;
    if !(0.0..=100_000_000.0).contains(&value) {
        return None;
    }
    Some((value * 100.0).round() as i64)
}

pub fn cents_to_input(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents.abs() % 100)
}

// ---------------- Dashboard ----------------

pub struct RecentBookingRow {
    pub id: String,
    pub event_name: String,
    pub user_name: String,
    pub status: String,
    pub total: String,
    pub booked_at: String,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub total_events: i64,
    pub total_bookings: i64,
    pub pending_approvals: i64,
    pub total_revenue: String,
    pub recent_bookings: Vec<RecentBookingRow>,
}

async fn booking_row(state: &AppState, booking: &crate::domain::Booking) -> RecentBookingRow {
    let event_name = state
        .service_context
        .event_repo
        .find_by_id(booking.event_id)
        .await
        .ok()
        .flatten()
        .map(|e| e.name)
        .unwrap_or_else(|| "Unknown event".to_string());

    let user_name = state
        .service_context
        .user_repo
        .find_by_id(booking.user_id)
        .await
        .ok()
        .flatten()
        .map(|u| u.full_name)
        .unwrap_or_else(|| "Unknown user".to_string());

    RecentBookingRow {
        id: booking.id.to_string(),
        event_name,
        user_name,
        status: format!("{:?}", booking.status),
        total: format_cents(booking.total_amount_cents),
        booked_at: booking.booked_at.format("%b %d, %Y %H:%M").to_string(),
    }
}

pub async fn dashboard_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
) -> impl IntoResponse {
    let ctx = &state.service_context;

    let total_events = ctx.event_repo.count_active().await.unwrap_or(0);
    let total_bookings = ctx.booking_repo.count_all().await.unwrap_or(0);
    let pending_approvals = ctx
        .booking_repo
        .count_by_status(BookingStatus::Pending)
        .await
        .unwrap_or(0);
    let revenue_cents = ctx.payment_repo.completed_revenue_cents().await.unwrap_or(0);

    let mut recent_bookings = Vec::new();
    for b in ctx.booking_repo.list_all(10, 0).await.unwrap_or_default() {
        recent_bookings.push(booking_row(&state, &b).await);
    }

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);

    HtmlTemplate(DashboardTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        total_events,
        total_bookings,
        pending_approvals,
        total_revenue: format_cents(revenue_cents),
        recent_bookings,
    })
}

// ---------------- Booking queues ----------------

pub struct AdminBookingRow {
    pub id: String,
    pub event_name: String,
    pub user_name: String,
    pub people_count: i32,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub total: String,
    pub booked_at: String,
    pub can_approve: bool,
    pub can_complete: bool,
    pub can_cancel: bool,
}

#[derive(Template)]
#[template(path = "admin/bookings.html")]
pub struct AdminBookingsTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub heading: String,
    pub bookings: Vec<AdminBookingRow>,
    pub msg: String,
    pub err: String,
}

async fn admin_booking_row(state: &AppState, booking: &crate::domain::Booking) -> AdminBookingRow {
    let base = booking_row(state, booking).await;
    AdminBookingRow {
        id: base.id,
        event_name: base.event_name,
        user_name: base.user_name,
        people_count: booking.people_count,
        start_time: booking.start_time.format("%b %d, %Y %H:%M").to_string(),
        end_time: booking.end_time.format("%b %d, %Y %H:%M").to_string(),
        status: base.status,
        total: base.total,
        booked_at: base.booked_at,
        can_approve: booking.status == BookingStatus::Pending,
        can_complete: booking.status == BookingStatus::Paid,
        can_cancel: booking.status.can_transition_to(BookingStatus::Cancelled),
    }
}

pub async fn all_bookings_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let mut rows = Vec::new();
    for b in state
        .service_context
        .booking_repo
        .list_all(500, 0)
        .await
        .unwrap_or_default()
    {
        rows.push(admin_booking_row(&state, &b).await);
    }

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(AdminBookingsTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        heading: "All Bookings".to_string(),
        bookings: rows,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

pub async fn approvals_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let mut rows = Vec::new();
    for b in state
        .service_context
        .booking_repo
        .list_pending()
        .await
        .unwrap_or_default()
    {
        rows.push(admin_booking_row(&state, &b).await);
    }

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(AdminBookingsTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        heading: "Pending Approvals".to_string(),
        bookings: rows,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

#[derive(Debug, Deserialize)]
pub struct DecisionForm {
    pub csrf_token: String,
}

pub async fn approve_booking(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Form(form): Form<DecisionForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/admin/approvals", "Invalid request token.").into_response();
    }

    match state
        .service_context
        .booking_service
        .approve_booking(&current_user.user, id)
        .await
    {
        Ok(Ok(_)) => {
            redirect_with_msg("/admin/approvals", "Booking approved successfully.").into_response()
        }
        Ok(Err(denial)) => {
            redirect_with_err("/admin/approvals", &denial.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("Approve booking failed: {}", e);
            e.into_response()
        }
    }
}

pub async fn reject_booking(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Form(form): Form<DecisionForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/admin/approvals", "Invalid request token.").into_response();
    }

    match state
        .service_context
        .booking_service
        .reject_booking(&current_user.user, id)
        .await
    {
        Ok(Ok(_)) => redirect_with_msg("/admin/approvals", "Booking rejected.").into_response(),
        Ok(Err(denial)) => {
            redirect_with_err("/admin/approvals", &denial.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("Reject booking failed: {}", e);
            e.into_response()
        }
    }
}

pub async fn complete_booking(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Form(form): Form<DecisionForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/admin/bookings", "Invalid request token.").into_response();
    }

    match state
        .service_context
        .booking_service
        .complete_booking(&current_user.user, id)
        .await
    {
        Ok(Ok(_)) => {
            redirect_with_msg("/admin/bookings", "Booking marked as completed.").into_response()
        }
        Ok(Err(denial)) => {
            redirect_with_err("/admin/bookings", &denial.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("Complete booking failed: {}", e);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{cents_to_input, parse_price_cents};

    #[test]
    fn price_parsing_round_trips() {
        assert_eq!(parse_price_cents("50.00"), Some(5000));
        assert_eq!(parse_price_cents("0.05"), Some(5));
        assert_eq!(parse_price_cents(" 125.5 "), Some(12550));
        assert_eq!(parse_price_cents("not a price"), None);
        assert_eq!(parse_price_cents("-4"), None);
        assert_eq!(cents_to_input(5000), "50.00");
        assert_eq!(cents_to_input(12550), "125.50");
    }
}
