use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        middleware::auth::{CurrentUser, SessionInfo},
        state::AppState,
    },
    domain::{format_cents, EventOffering},
    web::templates::{
        nav_context, redirect_with_err, redirect_with_msg, FlashParams, HtmlTemplate, UserInfo,
    },
    web::uploads::{delete_uploaded_file, save_uploaded_file},
};

use super::super::{cart_badge, csrf_ok, fresh_csrf};
use super::{cents_to_input, parse_price_cents};

pub struct AdminEventRow {
    pub id: String,
    pub name: String,
    pub venue: String,
    pub capacity: i32,
    pub price: String,
    pub is_active: bool,
}

#[derive(Template)]
#[template(path = "admin/events.html")]
pub struct AdminEventsTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub events: Vec<AdminEventRow>,
    pub msg: String,
    pub err: String,
}

pub async fn admin_events_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let events = state
        .service_context
        .event_repo
        .list(1000, 0)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|e| AdminEventRow {
            id: e.id.to_string(),
            name: e.name,
            venue: e.venue,
            capacity: e.max_capacity,
            price: format_cents(e.price_per_person_cents),
            is_active: e.is_active,
        })
        .collect();

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(AdminEventsTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        events,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

#[derive(Template)]
#[template(path = "admin/event_form.html")]
pub struct EventFormTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub heading: String,
    pub form_action: String,
    pub name: String,
    pub description: String,
    pub venue: String,
    pub max_capacity: i32,
    pub price: String,
    pub image_url: String,
    pub err: String,
}

pub async fn admin_new_event_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(EventFormTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        heading: "New Event".to_string(),
        form_action: "/admin/events/new".to_string(),
        name: String::new(),
        description: String::new(),
        venue: String::new(),
        max_capacity: 100,
        price: "0.00".to_string(),
        image_url: String::new(),
        err: flash.err_or_empty(),
    })
}

pub async fn admin_edit_event_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Query(flash): Query<FlashParams>,
) -> Response {
    let event = match state.service_context.event_repo.find_by_id(id).await {
        Ok(Some(event)) => event,
        _ => return redirect_with_err("/admin/events", "Event not found.").into_response(),
    };

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(EventFormTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        heading: "Edit Event".to_string(),
        form_action: format!("/admin/events/{}/update", event.id),
        name: event.name,
        description: event.description,
        venue: event.venue,
        max_capacity: event.max_capacity,
        price: cents_to_input(event.price_per_person_cents),
        image_url: event.image_url.unwrap_or_default(),
        err: flash.err_or_empty(),
    })
    .into_response()
}

/// Text fields plus an optional photo, pulled out of the multipart form.
struct EventFormData {
    csrf_token: String,
    name: String,
    description: String,
    venue: String,
    max_capacity: i32,
    price_cents: Option<i64>,
    image_url: Option<String>,
}

async fn parse_event_form(state: &AppState, multipart: &mut Multipart) -> EventFormData {
    let mut data = EventFormData {
        csrf_token: String::new(),
        name: String::new(),
        description: String::new(),
        venue: String::new(),
        max_capacity: 0,
        price_cents: None,
        image_url: None,
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "csrf_token" => data.csrf_token = field.text().await.unwrap_or_default(),
            "name" => data.name = field.text().await.unwrap_or_default(),
            "description" => data.description = field.text().await.unwrap_or_default(),
            "venue" => data.venue = field.text().await.unwrap_or_default(),
            "max_capacity" => {
                data.max_capacity = field
                    .text()
                    .await
                    .unwrap_or_default()
                    .trim()
                    .parse()
                    .unwrap_or(0)
            }
            "price" => {
                data.price_cents = parse_price_cents(&field.text().await.unwrap_or_default())
            }
            "image" => {
                let filename = field.file_name().unwrap_or("").to_string();
                if !filename.is_empty() {
                    if let Ok(bytes) = field.bytes().await {
                        if !bytes.is_empty() {
                            match save_uploaded_file(
                                &state.settings.server.uploads_dir,
                                "events",
                                &filename,
                                &bytes,
                            )
                            .await
                            {
                                Ok(path) => data.image_url = Some(path),
                                Err(e) => tracing::warn!("Event image upload failed: {}", e),
                            }
                        }
                    }
                }
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    data
}

fn validate_event_form(data: &EventFormData) -> Option<&'static str> {
    if data.name.is_empty() || data.venue.is_empty() {
        return Some("Name and venue are required.");
    }
    if !(1..=1000).contains(&data.max_capacity) {
        return Some("Capacity must be between 1 and 1000.");
    }
    if data.price_cents.is_none() {
        return Some("Price must be a valid amount.");
    }
    None
}

pub async fn admin_create_event(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    mut multipart: Multipart,
) -> Response {
    let data = parse_event_form(&state, &mut multipart).await;

    if !csrf_ok(&state, &session_info, &data.csrf_token).await {
        return redirect_with_err("/admin/events/new", "Invalid request token.").into_response();
    }
    if let Some(problem) = validate_event_form(&data) {
        return redirect_with_err("/admin/events/new", problem).into_response();
    }

    let now = chrono::Utc::now();
    let event = EventOffering {
        id: Uuid::new_v4(),
        name: data.name,
        description: data.description,
        venue: data.venue,
        max_capacity: data.max_capacity,
        price_per_person_cents: data.price_cents.unwrap_or(0),
        image_url: data.image_url,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    match state.service_context.event_repo.create(event).await {
        Ok(_) => redirect_with_msg("/admin/events", "Event created successfully!").into_response(),
        Err(e) => {
            tracing::error!("Failed to create event: {}", e);
            redirect_with_err("/admin/events/new", "Failed to create event.").into_response()
        }
    }
}

pub async fn admin_update_event(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    let existing = match state.service_context.event_repo.find_by_id(id).await {
        Ok(Some(event)) => event,
        _ => return redirect_with_err("/admin/events", "Event not found.").into_response(),
    };

    let back = format!("/admin/events/{}", id);
    let data = parse_event_form(&state, &mut multipart).await;

    if !csrf_ok(&state, &session_info, &data.csrf_token).await {
        return redirect_with_err(&back, "Invalid request token.").into_response();
    }
    if let Some(problem) = validate_event_form(&data) {
        return redirect_with_err(&back, problem).into_response();
    }

    // A fresh upload replaces the photo; remove the file it displaces.
    if data.image_url.is_some() {
        if let Some(old) = &existing.image_url {
            if let Err(e) = delete_uploaded_file(old).await {
                tracing::warn!("Failed to delete replaced image {}: {}", old, e);
            }
        }
    }

    let updated = EventOffering {
        id,
        name: data.name,
        description: data.description,
        venue: data.venue,
        max_capacity: data.max_capacity,
        price_per_person_cents: data.price_cents.unwrap_or(0),
        image_url: data.image_url.or(existing.image_url),
        is_active: existing.is_active,
        created_at: existing.created_at,
        updated_at: chrono::Utc::now(),
    };

    match state.service_context.event_repo.update(id, updated).await {
        Ok(_) => redirect_with_msg("/admin/events", "Event updated successfully!").into_response(),
        Err(e) => {
            tracing::error!("Failed to update event: {}", e);
            redirect_with_err(&back, "Failed to update event.").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub csrf_token: String,
}

// Soft delete: bookings keep their event reference, the offering just
// stops being bookable.
pub async fn admin_delete_event(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/admin/events", "Invalid request token.").into_response();
    }

    match state.service_context.event_repo.set_active(id, false).await {
        Ok(()) => redirect_with_msg("/admin/events", "Event deleted successfully!").into_response(),
        Err(e) => {
            tracing::error!("Failed to delete event: {}", e);
            Redirect::to("/admin/events?err=Failed%20to%20delete%20event.").into_response()
        }
    }
}
