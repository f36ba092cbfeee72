use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Form,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{
        middleware::auth::{CurrentUser, SessionInfo},
        state::AppState,
    },
    domain::{format_cents, BookingStatus, PaymentMethod},
    web::templates::{
        nav_context, redirect_with_err, FlashParams, HtmlTemplate, UserInfo,
    },
};

use super::{cart_badge, csrf_ok, fresh_csrf};

#[derive(Template)]
#[template(path = "payments/new.html")]
pub struct PaymentTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub booking_id: String,
    pub event_name: String,
    pub customer_name: String,
    pub amount_due: String,
    pub err: String,
}

pub async fn payment_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(booking_id): Path<Uuid>,
    Query(flash): Query<FlashParams>,
) -> Response {
    let booking = match state.service_context.booking_repo.find_by_id(booking_id).await {
        Ok(Some(booking)) => booking,
        _ => return redirect_with_err("/bookings", "Booking not found.").into_response(),
    };

    if booking.user_id != current_user.user.id || booking.status != BookingStatus::Approved {
        return redirect_with_err("/bookings", "Booking not found or not approved for payment.")
            .into_response();
    }

    let event_name = state
        .service_context
        .event_repo
        .find_by_id(booking.event_id)
        .await
        .ok()
        .flatten()
        .map(|e| e.name)
        .unwrap_or_else(|| "Unknown event".to_string());

    let amount_due = state
        .service_context
        .booking_service
        .amount_due_cents(&booking)
        .await
        .unwrap_or(booking.total_amount_cents);

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(PaymentTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        booking_id: booking.id.to_string(),
        event_name,
        customer_name: current_user.user.full_name.clone(),
        amount_due: format_cents(amount_due),
        err: flash.err_or_empty(),
    })
    .into_response()
}

/// Simulated card capture: the number is format-checked, never charged or
/// stored.
#[derive(Debug, Deserialize, Validate)]
pub struct PaymentForm {
    pub csrf_token: String,
    pub method: String,
    #[validate(length(min = 1, max = 100, message = "Card holder name is required"))]
    pub card_holder: String,
    #[validate(length(equal = 16, message = "Card number must be 16 digits"))]
    pub card_number: String,
    #[validate(length(min = 4, max = 5, message = "Expiry must be MM/YY"))]
    pub expiry: String,
    #[validate(length(equal = 3, message = "CVV must be 3 digits"))]
    pub cvv: String,
}

pub async fn process_payment(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(booking_id): Path<Uuid>,
    Form(form): Form<PaymentForm>,
) -> Response {
    let back = format!("/payments/new/{}", booking_id);

    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err(&back, "Invalid request token.").into_response();
    }
    if let Err(errors) = form.validate() {
        return redirect_with_err(&back, &errors.to_string()).into_response();
    }

    let method = match PaymentMethod::parse(&form.method) {
        Some(method) => method,
        None => return redirect_with_err(&back, "Please select a payment type.").into_response(),
    };

    let decision = state
        .service_context
        .booking_service
        .pay_booking(&current_user.user, booking_id, method)
        .await;

    match decision {
        Ok(Ok(payment)) => {
            axum::response::Redirect::to(&format!("/payments/{}/receipt", payment.id))
                .into_response()
        }
        Ok(Err(denial)) => redirect_with_err("/bookings", &denial.to_string()).into_response(),
        Err(e) => {
            tracing::error!("Payment failed: {}", e);
            redirect_with_err(&back, "Something went wrong. Please try again.").into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "payments/receipt.html")]
pub struct ReceiptTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub transaction_id: String,
    pub event_name: String,
    pub customer_name: String,
    pub amount: String,
    pub method: String,
    pub status: String,
    pub paid_at: String,
    pub booking_id: String,
}

pub async fn receipt_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
) -> Response {
    let payment = match state.service_context.payment_repo.find_by_id(id).await {
        Ok(Some(payment)) => payment,
        _ => return redirect_with_err("/bookings", "Payment not found.").into_response(),
    };

    let booking = match state
        .service_context
        .booking_repo
        .find_by_id(payment.booking_id)
        .await
    {
        Ok(Some(booking)) => booking,
        _ => return redirect_with_err("/bookings", "Booking not found.").into_response(),
    };

    if booking.user_id != current_user.user.id && !current_user.user.is_admin() {
        return redirect_with_err("/bookings", "Payment not found.").into_response();
    }

    let event_name = state
        .service_context
        .event_repo
        .find_by_id(booking.event_id)
        .await
        .ok()
        .flatten()
        .map(|e| e.name)
        .unwrap_or_else(|| "Unknown event".to_string());

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);

    HtmlTemplate(ReceiptTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        transaction_id: payment.transaction_id,
        event_name,
        customer_name: current_user.user.full_name.clone(),
        amount: format_cents(payment.amount_cents),
        method: format!("{:?}", payment.method),
        status: format!("{:?}", payment.status),
        paid_at: payment.paid_at.format("%b %d, %Y %H:%M").to_string(),
        booking_id: booking.id.to_string(),
    })
    .into_response()
}
