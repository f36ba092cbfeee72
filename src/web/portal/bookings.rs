use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Form,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        middleware::auth::{CurrentUser, SessionInfo},
        state::AppState,
    },
    domain::{format_cents, Booking, BookingStatus},
    web::templates::{
        nav_context, redirect_with_err, redirect_with_msg, FlashParams, HtmlTemplate, UserInfo,
    },
};

use super::{cart_badge, csrf_ok, fresh_csrf};

pub struct BookingRow {
    pub id: String,
    pub event_name: String,
    pub people_count: i32,
    pub start_time: String,
    pub end_time: String,
    pub total: String,
    pub status: String,
    pub booked_at: String,
    pub can_cancel: bool,
    pub can_pay: bool,
}

#[derive(Template)]
#[template(path = "bookings/index.html")]
pub struct MyBookingsTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub bookings: Vec<BookingRow>,
    pub msg: String,
    pub err: String,
}

async fn event_name_for(state: &AppState, booking: &Booking) -> String {
    state
        .service_context
        .event_repo
        .find_by_id(booking.event_id)
        .await
        .ok()
        .flatten()
        .map(|e| e.name)
        .unwrap_or_else(|| "Unknown event".to_string())
}

pub async fn my_bookings_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    let bookings = state
        .service_context
        .booking_repo
        .list_by_user(current_user.user.id)
        .await
        .unwrap_or_default();

    let mut rows = Vec::with_capacity(bookings.len());
    for b in bookings {
        let event_name = event_name_for(&state, &b).await;
        rows.push(BookingRow {
            id: b.id.to_string(),
            event_name,
            people_count: b.people_count,
            start_time: b.start_time.format("%b %d, %Y %H:%M").to_string(),
            end_time: b.end_time.format("%b %d, %Y %H:%M").to_string(),
            total: format_cents(b.total_amount_cents),
            status: format!("{:?}", b.status),
            booked_at: b.booked_at.format("%b %d, %Y").to_string(),
            can_cancel: b.status.can_transition_to(BookingStatus::Cancelled),
            can_pay: b.status == BookingStatus::Approved,
        });
    }

    HtmlTemplate(MyBookingsTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        bookings: rows,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

pub struct LineRow {
    pub name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub total: String,
}

pub struct PaymentRow {
    pub transaction_id: String,
    pub method: String,
    pub status: String,
    pub amount: String,
    pub paid_at: String,
}

#[derive(Template)]
#[template(path = "bookings/detail.html")]
pub struct BookingDetailTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub booking_id: String,
    pub event_name: String,
    pub venue: String,
    pub people_count: i32,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub base_amount: String,
    pub amount_due: String,
    pub contact_person: String,
    pub contact_phone: String,
    pub catering: Vec<LineRow>,
    pub services: Vec<LineRow>,
    pub payments: Vec<PaymentRow>,
    pub can_cancel: bool,
    pub can_pay: bool,
    pub msg: String,
    pub err: String,
}

pub async fn booking_detail_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Query(flash): Query<FlashParams>,
) -> Response {
    let booking = match state.service_context.booking_repo.find_by_id(id).await {
        Ok(Some(booking)) => booking,
        _ => return redirect_with_err("/bookings", "Booking not found.").into_response(),
    };

    // Owners see their own bookings; admins see everything.
    if booking.user_id != current_user.user.id && !current_user.user.is_admin() {
        return redirect_with_err("/bookings", "Booking not found.").into_response();
    }

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    let (event_name, venue) = match state
        .service_context
        .event_repo
        .find_by_id(booking.event_id)
        .await
    {
        Ok(Some(e)) => (e.name, e.venue),
        _ => ("Unknown event".to_string(), String::new()),
    };

    let mut catering = Vec::new();
    for line in state
        .service_context
        .booking_repo
        .catering_for(booking.id)
        .await
        .unwrap_or_default()
    {
        let name = state
            .service_context
            .catering_repo
            .find_by_id(line.menu_id)
            .await
            .ok()
            .flatten()
            .map(|m| m.name)
            .unwrap_or_else(|| "Unknown menu".to_string());
        catering.push(LineRow {
            name,
            quantity: line.quantity,
            unit_price: format_cents(line.unit_price_cents),
            total: format_cents(line.total_price_cents),
        });
    }

    let mut services = Vec::new();
    for line in state
        .service_context
        .booking_repo
        .services_for(booking.id)
        .await
        .unwrap_or_default()
    {
        let name = state
            .service_context
            .service_repo
            .find_by_id(line.service_id)
            .await
            .ok()
            .flatten()
            .map(|s| s.name)
            .unwrap_or_else(|| "Service".to_string());
        services.push(LineRow {
            name,
            quantity: line.quantity,
            unit_price: format_cents(line.unit_price_cents),
            total: format_cents(line.total_price_cents),
        });
    }

    let payments = state
        .service_context
        .payment_repo
        .list_by_booking(booking.id)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|p| PaymentRow {
            transaction_id: p.transaction_id,
            method: format!("{:?}", p.method),
            status: format!("{:?}", p.status),
            amount: format_cents(p.amount_cents),
            paid_at: p.paid_at.format("%b %d, %Y %H:%M").to_string(),
        })
        .collect();

    let amount_due = state
        .service_context
        .booking_service
        .amount_due_cents(&booking)
        .await
        .unwrap_or(booking.total_amount_cents);

    HtmlTemplate(BookingDetailTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        booking_id: booking.id.to_string(),
        event_name,
        venue,
        people_count: booking.people_count,
        start_time: booking.start_time.format("%b %d, %Y %H:%M").to_string(),
        end_time: booking.end_time.format("%b %d, %Y %H:%M").to_string(),
        status: format!("{:?}", booking.status),
        base_amount: format_cents(booking.base_amount_cents),
        amount_due: format_cents(amount_due),
        contact_person: current_user.user.full_name.clone(),
        contact_phone: current_user.user.phone.clone(),
        catering,
        services,
        payments,
        can_cancel: booking.status.can_transition_to(BookingStatus::Cancelled),
        can_pay: booking.status == BookingStatus::Approved
            && booking.user_id == current_user.user.id,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct CancelForm {
    pub csrf_token: String,
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Form(form): Form<CancelForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/bookings", "Invalid request token.").into_response();
    }

    let decision = state
        .service_context
        .booking_service
        .cancel_booking(&current_user.user, id)
        .await;

    match decision {
        Ok(Ok(_)) => redirect_with_msg("/bookings", "Booking cancelled successfully.").into_response(),
        Ok(Err(denial)) => redirect_with_err("/bookings", &denial.to_string()).into_response(),
        Err(e) => {
            tracing::error!("Cancel booking failed: {}", e);
            redirect_with_err("/bookings", "Something went wrong. Please try again.").into_response()
        }
    }
}
