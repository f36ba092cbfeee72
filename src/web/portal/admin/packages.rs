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
    domain::{format_cents, Package, PackageItem},
    web::templates::{
        nav_context, redirect_with_err, redirect_with_msg, FlashParams, HtmlTemplate, UserInfo,
    },
    web::uploads::{delete_uploaded_file, save_uploaded_file},
};

use super::super::{cart_badge, csrf_ok, fresh_csrf};
use super::{cents_to_input, parse_price_cents};

pub struct AdminPackageRow {
    pub id: String,
    pub name: String,
    pub event_name: String,
    pub price: String,
    pub is_active: bool,
}

#[derive(Template)]
#[template(path = "admin/packages.html")]
pub struct AdminPackagesTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub packages: Vec<AdminPackageRow>,
    pub msg: String,
    pub err: String,
}

pub async fn admin_packages_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let mut rows = Vec::new();
    for p in state
        .service_context
        .package_repo
        .list(1000, 0)
        .await
        .unwrap_or_default()
    {
        let event_name = state
            .service_context
            .event_repo
            .find_by_id(p.event_id)
            .await
            .ok()
            .flatten()
            .map(|e| e.name)
            .unwrap_or_default();
        rows.push(AdminPackageRow {
            id: p.id.to_string(),
            name: p.name,
            event_name,
            price: format_cents(p.total_price_cents),
            is_active: p.is_active,
        });
    }

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(AdminPackagesTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        packages: rows,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

pub struct SelectOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "admin/package_form.html")]
pub struct PackageFormTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub heading: String,
    pub form_action: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub events: Vec<SelectOption>,
    pub menus: Vec<SelectOption>,
    pub services: Vec<SelectOption>,
    pub items_editable: bool,
    pub err: String,
}

async fn catalog_options(
    state: &AppState,
    selected_event: Option<Uuid>,
) -> (Vec<SelectOption>, Vec<SelectOption>, Vec<SelectOption>) {
    let events = state
        .service_context
        .event_repo
        .list_active()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|e| SelectOption {
            id: e.id.to_string(),
            name: e.name,
            selected: selected_event == Some(e.id),
        })
        .collect();

    let menus = state
        .service_context
        .catering_repo
        .list_active()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|m| SelectOption {
            id: m.id.to_string(),
            name: m.name,
            selected: false,
        })
        .collect();

    let services = state
        .service_context
        .service_repo
        .list_active()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|s| SelectOption {
            id: s.id.to_string(),
            name: s.name,
            selected: false,
        })
        .collect();

    (events, menus, services)
}

pub async fn admin_new_package_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let (events, menus, services) = catalog_options(&state, None).await;

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(PackageFormTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        heading: "New Package".to_string(),
        form_action: "/admin/packages/new".to_string(),
        name: String::new(),
        description: String::new(),
        price: "0.00".to_string(),
        events,
        menus,
        services,
        items_editable: true,
        err: flash.err_or_empty(),
    })
}

pub async fn admin_edit_package_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Query(flash): Query<FlashParams>,
) -> Response {
    let package = match state.service_context.package_repo.find_by_id(id).await {
        Ok(Some(package)) => package,
        _ => return redirect_with_err("/admin/packages", "Package not found.").into_response(),
    };

    let (events, menus, services) = catalog_options(&state, Some(package.event_id)).await;

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(PackageFormTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        heading: "Edit Package".to_string(),
        form_action: format!("/admin/packages/{}/update", package.id),
        name: package.name,
        description: package.description,
        price: cents_to_input(package.total_price_cents),
        events,
        menus,
        services,
        // Bundle contents are fixed at creation; only the base fields move.
        items_editable: false,
        err: flash.err_or_empty(),
    })
    .into_response()
}

struct PackageFormData {
    csrf_token: String,
    name: String,
    description: String,
    event_id: Option<Uuid>,
    price_cents: Option<i64>,
    menu_ids: Vec<Uuid>,
    service_ids: Vec<Uuid>,
    image_url: Option<String>,
}

async fn parse_package_form(state: &AppState, multipart: &mut Multipart) -> PackageFormData {
    let mut data = PackageFormData {
        csrf_token: String::new(),
        name: String::new(),
        description: String::new(),
        event_id: None,
        price_cents: None,
        menu_ids: Vec::new(),
        service_ids: Vec::new(),
        image_url: None,
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "csrf_token" => data.csrf_token = field.text().await.unwrap_or_default(),
            "name" => data.name = field.text().await.unwrap_or_default(),
            "description" => data.description = field.text().await.unwrap_or_default(),
            "event_id" => {
                data.event_id = field
                    .text()
                    .await
                    .ok()
                    .and_then(|s| Uuid::parse_str(&s).ok())
            }
            "price" => {
                data.price_cents = parse_price_cents(&field.text().await.unwrap_or_default())
            }
            // Checkbox groups repeat the field name once per ticked box.
            "menu_ids" => {
                if let Ok(Some(id)) = field.text().await.map(|s| Uuid::parse_str(&s).ok()) {
                    data.menu_ids.push(id);
                }
            }
            "service_ids" => {
                if let Ok(Some(id)) = field.text().await.map(|s| Uuid::parse_str(&s).ok()) {
                    data.service_ids.push(id);
                }
            }
            "image" => {
                let filename = field.file_name().unwrap_or("").to_string();
                if !filename.is_empty() {
                    if let Ok(bytes) = field.bytes().await {
                        if !bytes.is_empty() {
                            match save_uploaded_file(
                                &state.settings.server.uploads_dir,
                                "packages",
                                &filename,
                                &bytes,
                            )
                            .await
                            {
                                Ok(path) => data.image_url = Some(path),
                                Err(e) => tracing::warn!("Package image upload failed: {}", e),
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

pub async fn admin_create_package(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    mut multipart: Multipart,
) -> Response {
    let data = parse_package_form(&state, &mut multipart).await;

    if !csrf_ok(&state, &session_info, &data.csrf_token).await {
        return redirect_with_err("/admin/packages/new", "Invalid request token.").into_response();
    }
    let event_id = match data.event_id {
        Some(id) if data.price_cents.is_some() && !data.name.is_empty() => id,
        _ => {
            return redirect_with_err(
                "/admin/packages/new",
                "Name, event and a valid price are required.",
            )
            .into_response()
        }
    };

    let package_id = Uuid::new_v4();
    let now = chrono::Utc::now();

    let items = data
        .menu_ids
        .iter()
        .map(|menu_id| PackageItem {
            id: Uuid::new_v4(),
            package_id,
            menu_id: Some(*menu_id),
            service_id: None,
        })
        .chain(data.service_ids.iter().map(|service_id| PackageItem {
            id: Uuid::new_v4(),
            package_id,
            menu_id: None,
            service_id: Some(*service_id),
        }))
        .collect();

    let package = Package {
        id: package_id,
        name: data.name,
        description: data.description,
        event_id,
        total_price_cents: data.price_cents.unwrap_or(0),
        image_url: data.image_url,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    match state.service_context.package_repo.create(package, items).await {
        Ok(_) => {
            redirect_with_msg("/admin/packages", "Package created successfully!").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create package: {}", e);
            redirect_with_err("/admin/packages/new", "Failed to create package.").into_response()
        }
    }
}

pub async fn admin_update_package(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    let existing = match state.service_context.package_repo.find_by_id(id).await {
        Ok(Some(package)) => package,
        _ => return redirect_with_err("/admin/packages", "Package not found.").into_response(),
    };

    let back = format!("/admin/packages/{}", id);
    let data = parse_package_form(&state, &mut multipart).await;

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

    let updated = Package {
        id,
        name: data.name,
        description: data.description,
        event_id: data.event_id.unwrap_or(existing.event_id),
        total_price_cents: data.price_cents.unwrap_or(0),
        image_url: data.image_url.or(existing.image_url),
        is_active: existing.is_active,
        created_at: existing.created_at,
        updated_at: chrono::Utc::now(),
    };

    match state.service_context.package_repo.update(id, updated).await {
        Ok(_) => {
            redirect_with_msg("/admin/packages", "Package updated successfully!").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to update package: {}", e);
            redirect_with_err(&back, "Failed to update package.").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub csrf_token: String,
}

pub async fn admin_delete_package(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/admin/packages", "Invalid request token.").into_response();
    }

    match state.service_context.package_repo.set_active(id, false).await {
        Ok(()) => {
            redirect_with_msg("/admin/packages", "Package deleted successfully!").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to delete package: {}", e);
            redirect_with_err("/admin/packages", "Failed to delete package.").into_response()
        }
    }
}
