use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{
        middleware::auth::{CurrentUser, SessionInfo},
        state::AppState,
    },
    domain::format_cents,
    service::booking_service::AddEventRequest,
    web::templates::{
        nav_context, redirect_with_err, redirect_with_msg, FlashParams, HtmlTemplate, UserInfo,
    },
};

use super::{cart_badge, csrf_ok, fresh_csrf};

const DATETIME_LOCAL: &str = "%Y-%m-%dT%H:%M";

fn parse_datetime_local(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, DATETIME_LOCAL)
        .ok()
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

// ---------------- Booking form ----------------

#[derive(Template)]
#[template(path = "bookings/new.html")]
pub struct NewBookingTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub event_id: String,
    pub event_name: String,
    pub venue: String,
    pub capacity: i32,
    pub price: String,
    pub contact_person: String,
    pub contact_phone: String,
    pub default_start: String,
    pub default_end: String,
    pub err: String,
}

pub async fn new_booking_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(event_id): Path<Uuid>,
    Query(flash): Query<FlashParams>,
) -> Response {
    let event = match state.service_context.event_repo.find_by_id(event_id).await {
        Ok(Some(event)) if event.is_active => event,
        _ => return redirect_with_err("/events", "Event not found.").into_response(),
    };

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    let now = Utc::now();

    HtmlTemplate(NewBookingTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        event_id: event.id.to_string(),
        event_name: event.name,
        venue: event.venue,
        capacity: event.max_capacity,
        price: format_cents(event.price_per_person_cents),
        contact_person: current_user.user.full_name.clone(),
        contact_phone: current_user.user.phone.clone(),
        default_start: (now + Duration::hours(1)).format(DATETIME_LOCAL).to_string(),
        default_end: (now + Duration::hours(4)).format(DATETIME_LOCAL).to_string(),
        err: flash.err_or_empty(),
    })
    .into_response()
}

// ---------------- Add to cart ----------------

#[derive(Debug, Deserialize, Validate)]
pub struct AddEventForm {
    pub csrf_token: String,
    pub event_id: Uuid,
    #[validate(range(min = 1, max = 1000, message = "Number of people must be 1-1000"))]
    pub people_count: i32,
    pub start_time: String,
    pub end_time: String,
}

pub async fn add_event_to_cart(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Form(form): Form<AddEventForm>,
) -> Response {
    let back = format!("/bookings/new/{}", form.event_id);

    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err(&back, "Invalid request token.").into_response();
    }
    if let Err(errors) = form.validate() {
        return redirect_with_err(&back, &errors.to_string()).into_response();
    }

    let (start_time, end_time) = match (
        parse_datetime_local(&form.start_time),
        parse_datetime_local(&form.end_time),
    ) {
        (Some(start), Some(end)) => (start, end),
        _ => return redirect_with_err(&back, "Please fill all required fields.").into_response(),
    };

    let decision = state
        .service_context
        .booking_service
        .add_event_to_cart(
            &session_info.session_id,
            AddEventRequest {
                event_id: form.event_id,
                people_count: form.people_count,
                start_time,
                end_time,
            },
        )
        .await;

    match decision {
        Ok(Ok(_cart)) => redirect_with_msg("/cart", "Event added to cart.").into_response(),
        Ok(Err(denial)) => redirect_with_err(&back, &denial.to_string()).into_response(),
        Err(e) => {
            tracing::error!("Add to cart failed: {}", e);
            redirect_with_err(&back, "Something went wrong. Please try again.").into_response()
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCateringForm {
    pub csrf_token: String,
    pub menu_id: Uuid,
    #[validate(range(min = 1, max = 1000, message = "Quantity must be 1-1000"))]
    pub quantity: i32,
    #[serde(default)]
    pub special_instructions: String,
}

pub async fn add_catering_to_cart(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Form(form): Form<AddCateringForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/catering", "Invalid request token.").into_response();
    }
    if let Err(errors) = form.validate() {
        return redirect_with_err("/catering", &errors.to_string()).into_response();
    }

    let decision = state
        .service_context
        .booking_service
        .add_catering_to_cart(
            &session_info.session_id,
            form.menu_id,
            form.quantity,
            form.special_instructions,
        )
        .await;

    match decision {
        Ok(Ok(_)) => redirect_with_msg("/catering", "Menu added to cart.").into_response(),
        Ok(Err(denial)) => redirect_with_err("/catering", &denial.to_string()).into_response(),
        Err(e) => {
            tracing::error!("Add catering failed: {}", e);
            redirect_with_err("/catering", "Something went wrong. Please try again.").into_response()
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddServiceForm {
    pub csrf_token: String,
    pub service_id: Uuid,
    #[validate(range(min = 1, max = 1000, message = "Quantity must be 1-1000"))]
    pub quantity: i32,
}

pub async fn add_service_to_cart(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Form(form): Form<AddServiceForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/services", "Invalid request token.").into_response();
    }
    if let Err(errors) = form.validate() {
        return redirect_with_err("/services", &errors.to_string()).into_response();
    }

    let decision = state
        .service_context
        .booking_service
        .add_service_to_cart(&session_info.session_id, form.service_id, form.quantity)
        .await;

    match decision {
        Ok(Ok(_)) => redirect_with_msg("/services", "Service added to cart.").into_response(),
        Ok(Err(denial)) => redirect_with_err("/services", &denial.to_string()).into_response(),
        Err(e) => {
            tracing::error!("Add service failed: {}", e);
            redirect_with_err("/services", "Something went wrong. Please try again.").into_response()
        }
    }
}

// ---------------- Cart page ----------------

pub struct CartEventRow {
    pub event_name: String,
    pub venue: String,
    pub people_count: i32,
    pub start_time: String,
    pub end_time: String,
    pub total: String,
}

pub struct CartItemRow {
    pub name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub total: String,
}

#[derive(Template)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub events: Vec<CartEventRow>,
    pub catering: Vec<CartItemRow>,
    pub services: Vec<CartItemRow>,
    pub grand_total: String,
    pub msg: String,
    pub err: String,
}

pub async fn cart_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let cart = state
        .service_context
        .booking_service
        .load_cart(&session_info.session_id)
        .await
        .unwrap_or_default();

    let (user_info, is_admin, cart_count) =
        nav_context(Some(&current_user), cart.item_count());
    let csrf_token = fresh_csrf(&state, &session_info).await;

    let grand_total_cents: i64 = cart.events.iter().map(|e| e.total_amount_cents).sum::<i64>()
        + cart.catering.iter().map(|c| c.total_price_cents).sum::<i64>()
        + cart.services.iter().map(|s| s.total_price_cents).sum::<i64>();

    let events = cart
        .events
        .iter()
        .map(|l| CartEventRow {
            event_name: l.event_name.clone(),
            venue: l.venue.clone(),
            people_count: l.people_count,
            start_time: l.start_time.format("%b %d, %Y %H:%M").to_string(),
            end_time: l.end_time.format("%b %d, %Y %H:%M").to_string(),
            total: format_cents(l.total_amount_cents),
        })
        .collect();

    let catering = cart
        .catering
        .iter()
        .map(|c| CartItemRow {
            name: c.menu_name.clone(),
            quantity: c.quantity,
            unit_price: format_cents(c.unit_price_cents),
            total: format_cents(c.total_price_cents),
        })
        .collect();

    let services = cart
        .services
        .iter()
        .map(|s| CartItemRow {
            name: s.service_name.clone(),
            quantity: s.quantity,
            unit_price: format_cents(s.unit_price_cents),
            total: format_cents(s.total_price_cents),
        })
        .collect();

    HtmlTemplate(CartTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        events,
        catering,
        services,
        grand_total: format_cents(grand_total_cents),
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

// ---------------- Remove / confirm ----------------

#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub csrf_token: String,
    pub index: usize,
}

pub async fn remove_event_from_cart(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Form(form): Form<RemoveForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/cart", "Invalid request token.").into_response();
    }

    let decision = state
        .service_context
        .booking_service
        .remove_event_from_cart(&session_info.session_id, form.index)
        .await;

    match decision {
        Ok(Ok(_)) => redirect_with_msg("/cart", "Event removed from cart.").into_response(),
        Ok(Err(denial)) => redirect_with_err("/cart", &denial.to_string()).into_response(),
        Err(e) => {
            tracing::error!("Cart removal failed: {}", e);
            redirect_with_err("/cart", "Something went wrong. Please try again.").into_response()
        }
    }
}

pub async fn remove_catering_from_cart(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Form(form): Form<RemoveForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/cart", "Invalid request token.").into_response();
    }

    let decision = state
        .service_context
        .booking_service
        .remove_catering_from_cart(&session_info.session_id, form.index)
        .await;

    match decision {
        Ok(Ok(_)) => redirect_with_msg("/cart", "Catering item removed from cart.").into_response(),
        Ok(Err(denial)) => redirect_with_err("/cart", &denial.to_string()).into_response(),
        Err(e) => {
            tracing::error!("Cart removal failed: {}", e);
            redirect_with_err("/cart", "Something went wrong. Please try again.").into_response()
        }
    }
}

pub async fn remove_service_from_cart(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Form(form): Form<RemoveForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/cart", "Invalid request token.").into_response();
    }

    let decision = state
        .service_context
        .booking_service
        .remove_service_from_cart(&session_info.session_id, form.index)
        .await;

    match decision {
        Ok(Ok(_)) => redirect_with_msg("/cart", "Service removed from cart.").into_response(),
        Ok(Err(denial)) => redirect_with_err("/cart", &denial.to_string()).into_response(),
        Err(e) => {
            tracing::error!("Cart removal failed: {}", e);
            redirect_with_err("/cart", "Something went wrong. Please try again.").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    pub csrf_token: String,
}

pub async fn confirm_cart(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Form(form): Form<ConfirmForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/cart", "Invalid request token.").into_response();
    }

    let decision = state
        .service_context
        .booking_service
        .confirm_cart(&session_info.session_id, &current_user.user)
        .await;

    match decision {
        Ok(Ok(confirmation)) => {
            redirect_with_msg("/bookings", &confirmation.message).into_response()
        }
        Ok(Err(denial)) => redirect_with_err("/cart", &denial.to_string()).into_response(),
        Err(e) => {
            tracing::error!("Cart confirmation failed: {}", e);
            Redirect::to("/cart?err=Something%20went%20wrong.%20Please%20try%20again.")
                .into_response()
        }
    }
}
