use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
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
    domain::{format_cents, AdditionalService, PriceType},
    web::templates::{
        nav_context, redirect_with_err, redirect_with_msg, FlashParams, HtmlTemplate, UserInfo,
    },
    web::uploads::{delete_uploaded_file, save_uploaded_file},
};

use super::super::{cart_badge, csrf_ok, fresh_csrf};
use super::{cents_to_input, parse_price_cents};

pub const PRICE_TYPES: &[&str] = &["Fixed", "PerPerson", "PerHour"];

fn price_type_from_str(s: &str) -> PriceType {
    match s {
        "PerPerson" => PriceType::PerPerson,
        "PerHour" => PriceType::PerHour,
        _ => PriceType::Fixed,
    }
}

pub struct AdminServiceRow {
    pub id: String,
    pub name: String,
    pub price: String,
    pub price_type: String,
    pub is_active: bool,
}

#[derive(Template)]
#[template(path = "admin/services.html")]
pub struct AdminServicesTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub services: Vec<AdminServiceRow>,
    pub msg: String,
    pub err: String,
}

pub async fn admin_services_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let services = state
        .service_context
        .service_repo
        .list(1000, 0)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|s| AdminServiceRow {
            id: s.id.to_string(),
            name: s.name,
            price: format_cents(s.price_cents),
            price_type: format!("{:?}", s.price_type),
            is_active: s.is_active,
        })
        .collect();

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(AdminServicesTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        services,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

#[derive(Template)]
#[template(path = "admin/service_form.html")]
pub struct ServiceFormTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub heading: String,
    pub form_action: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub price_type: String,
    pub price_types: Vec<String>,
    pub err: String,
}

pub async fn admin_new_service_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(ServiceFormTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        heading: "New Additional Service".to_string(),
        form_action: "/admin/services/new".to_string(),
        name: String::new(),
        description: String::new(),
        price: "0.00".to_string(),
        price_type: "Fixed".to_string(),
        price_types: PRICE_TYPES.iter().map(|s| s.to_string()).collect(),
        err: flash.err_or_empty(),
    })
}

pub async fn admin_edit_service_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Query(flash): Query<FlashParams>,
) -> Response {
    let service = match state.service_context.service_repo.find_by_id(id).await {
        Ok(Some(service)) => service,
        _ => return redirect_with_err("/admin/services", "Service not found.").into_response(),
    };

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(ServiceFormTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        heading: "Edit Additional Service".to_string(),
        form_action: format!("/admin/services/{}/update", service.id),
        name: service.name,
        description: service.description,
        price: cents_to_input(service.price_cents),
        price_type: format!("{:?}", service.price_type),
        price_types: PRICE_TYPES.iter().map(|s| s.to_string()).collect(),
        err: flash.err_or_empty(),
    })
    .into_response()
}

struct ServiceFormData {
    csrf_token: String,
    name: String,
    description: String,
    price_cents: Option<i64>,
    price_type: String,
    image_url: Option<String>,
}

async fn parse_service_form(state: &AppState, multipart: &mut Multipart) -> ServiceFormData {
    let mut data = ServiceFormData {
        csrf_token: String::new(),
        name: String::new(),
        description: String::new(),
        price_cents: None,
        price_type: "Fixed".to_string(),
        image_url: None,
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "csrf_token" => data.csrf_token = field.text().await.unwrap_or_default(),
            "name" => data.name = field.text().await.unwrap_or_default(),
            "description" => data.description = field.text().await.unwrap_or_default(),
            "price" => {
                data.price_cents = parse_price_cents(&field.text().await.unwrap_or_default())
            }
            "price_type" => data.price_type = field.text().await.unwrap_or_default(),
            "image" => {
                let filename = field.file_name().unwrap_or("").to_string();
                if !filename.is_empty() {
                    if let Ok(bytes) = field.bytes().await {
                        if !bytes.is_empty() {
                            match save_uploaded_file(
                                &state.settings.server.uploads_dir,
                                "services",
                                &filename,
                                &bytes,
                            )
                            .await
                            {
                                Ok(path) => data.image_url = Some(path),
                                Err(e) => tracing::warn!("Service image upload failed: {}", e),
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

pub async fn admin_create_service(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    mut multipart: Multipart,
) -> Response {
    let data = parse_service_form(&state, &mut multipart).await;

    if !csrf_ok(&state, &session_info, &data.csrf_token).await {
        return redirect_with_err("/admin/services/new", "Invalid request token.").into_response();
    }
    if data.name.is_empty() || data.price_cents.is_none() {
        return redirect_with_err("/admin/services/new", "Name and a valid price are required.")
            .into_response();
    }

    let now = chrono::Utc::now();
    let service = AdditionalService {
        id: Uuid::new_v4(),
        name: data.name,
        description: data.description,
        price_cents: data.price_cents.unwrap_or(0),
        price_type: price_type_from_str(&data.price_type),
        image_url: data.image_url,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    match state.service_context.service_repo.create(service).await {
        Ok(_) => {
            redirect_with_msg("/admin/services", "Service created successfully!").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create service: {}", e);
            redirect_with_err("/admin/services/new", "Failed to create service.").into_response()
        }
    }
}

pub async fn admin_update_service(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    let existing = match state.service_context.service_repo.find_by_id(id).await {
        Ok(Some(service)) => service,
        _ => return redirect_with_err("/admin/services", "Service not found.").into_response(),
    };

    let back = format!("/admin/services/{}", id);
    let data = parse_service_form(&state, &mut multipart).await;

    if !csrf_ok(&state, &session_info, &data.csrf_token).await {
        return redirect_with_err(&back, "Invalid request token.").into_response();
    }
    if data.name.is_empty() || data.price_cents.is_none() {
        return redirect_with_err(&back, "Name and a valid price are required.").into_response();
    }

    if data.image_url.is_some() {
        if let Some(old) = &existing.image_url {
            if let Err(e) = delete_uploaded_file(old).await {
                tracing::warn!("Failed to delete replaced image {}: {}", old, e);
            }
        }
    }

    let updated = AdditionalService {
        id,
        name: data.name,
        description: data.description,
        price_cents: data.price_cents.unwrap_or(0),
        price_type: price_type_from_str(&data.price_type),
        image_url: data.image_url.or(existing.image_url),
        is_active: existing.is_active,
        created_at: existing.created_at,
        updated_at: chrono::Utc::now(),
    };

    match state.service_context.service_repo.update(id, updated).await {
        Ok(_) => {
            redirect_with_msg("/admin/services", "Service updated successfully!").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to update service: {}", e);
            redirect_with_err(&back, "Failed to update service.").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub csrf_token: String,
}

pub async fn admin_delete_service(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/admin/services", "Invalid request token.").into_response();
    }

    match state.service_context.service_repo.set_active(id, false).await {
        Ok(()) => {
            redirect_with_msg("/admin/services", "Service deleted successfully!").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to delete service: {}", e);
            redirect_with_err("/admin/services", "Failed to delete service.").into_response()
        }
    }
}
