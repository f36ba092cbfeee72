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
    domain::{format_cents, CateringMenu, MenuType},
    web::templates::{
        nav_context, redirect_with_err, redirect_with_msg, FlashParams, HtmlTemplate, UserInfo,
    },
    web::uploads::{delete_uploaded_file, save_uploaded_file},
};

use super::super::{cart_badge, csrf_ok, fresh_csrf};
use super::{cents_to_input, parse_price_cents};

pub const MENU_TYPES: &[&str] = &[
    "Standard", "Premium", "Deluxe", "Vegan", "Vegetarian", "Kids", "Corporate", "Wedding",
];

fn menu_type_from_str(s: &str) -> MenuType {
    match s {
        "Premium" => MenuType::Premium,
        "Deluxe" => MenuType::Deluxe,
        "Vegan" => MenuType::Vegan,
        "Vegetarian" => MenuType::Vegetarian,
        "Kids" => MenuType::Kids,
        "Corporate" => MenuType::Corporate,
        "Wedding" => MenuType::Wedding,
        _ => MenuType::Standard,
    }
}

pub struct AdminMenuRow {
    pub id: String,
    pub name: String,
    pub menu_type: String,
    pub price: String,
    pub is_active: bool,
}

#[derive(Template)]
#[template(path = "admin/menus.html")]
pub struct AdminMenusTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub menus: Vec<AdminMenuRow>,
    pub msg: String,
    pub err: String,
}

pub async fn admin_menus_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let menus = state
        .service_context
        .catering_repo
        .list(1000, 0)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|m| AdminMenuRow {
            id: m.id.to_string(),
            name: m.name,
            menu_type: format!("{:?}", m.menu_type),
            price: format_cents(m.price_per_person_cents),
            is_active: m.is_active,
        })
        .collect();

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(AdminMenusTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        menus,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

#[derive(Template)]
#[template(path = "admin/menu_form.html")]
pub struct MenuFormTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub heading: String,
    pub form_action: String,
    pub name: String,
    pub description: String,
    pub menu_type: String,
    pub menu_types: Vec<String>,
    pub price: String,
    pub included_items: String,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub has_gluten_free: bool,
    pub err: String,
}

pub async fn admin_new_menu_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(MenuFormTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        heading: "New Catering Menu".to_string(),
        form_action: "/admin/menus/new".to_string(),
        name: String::new(),
        description: String::new(),
        menu_type: "Standard".to_string(),
        menu_types: MENU_TYPES.iter().map(|s| s.to_string()).collect(),
        price: "0.00".to_string(),
        included_items: String::new(),
        is_vegetarian: false,
        is_vegan: false,
        has_gluten_free: false,
        err: flash.err_or_empty(),
    })
}

pub async fn admin_edit_menu_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Query(flash): Query<FlashParams>,
) -> Response {
    let menu = match state.service_context.catering_repo.find_by_id(id).await {
        Ok(Some(menu)) => menu,
        _ => return redirect_with_err("/admin/menus", "Menu not found.").into_response(),
    };

    let cart_count = cart_badge(&state, Some(&session_info)).await;
    let (user_info, is_admin, cart_count) = nav_context(Some(&current_user), cart_count);
    let csrf_token = fresh_csrf(&state, &session_info).await;

    HtmlTemplate(MenuFormTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        heading: "Edit Catering Menu".to_string(),
        form_action: format!("/admin/menus/{}/update", menu.id),
        name: menu.name,
        description: menu.description,
        menu_type: format!("{:?}", menu.menu_type),
        menu_types: MENU_TYPES.iter().map(|s| s.to_string()).collect(),
        price: cents_to_input(menu.price_per_person_cents),
        included_items: menu.included_items.unwrap_or_default(),
        is_vegetarian: menu.is_vegetarian,
        is_vegan: menu.is_vegan,
        has_gluten_free: menu.has_gluten_free,
        err: flash.err_or_empty(),
    })
    .into_response()
}

struct MenuFormData {
    csrf_token: String,
    name: String,
    description: String,
    menu_type: String,
    price_cents: Option<i64>,
    included_items: String,
    is_vegetarian: bool,
    is_vegan: bool,
    has_gluten_free: bool,
    image_url: Option<String>,
}

async fn parse_menu_form(state: &AppState, multipart: &mut Multipart) -> MenuFormData {
    let mut data = MenuFormData {
        csrf_token: String::new(),
        name: String::new(),
        description: String::new(),
        menu_type: "Standard".to_string(),
        price_cents: None,
        included_items: String::new(),
        is_vegetarian: false,
        is_vegan: false,
        has_gluten_free: false,
        image_url: None,
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "csrf_token" => data.csrf_token = field.text().await.unwrap_or_default(),
            "name" => data.name = field.text().await.unwrap_or_default(),
            "description" => data.description = field.text().await.unwrap_or_default(),
            "menu_type" => data.menu_type = field.text().await.unwrap_or_default(),
            "price" => {
                data.price_cents = parse_price_cents(&field.text().await.unwrap_or_default())
            }
            "included_items" => data.included_items = field.text().await.unwrap_or_default(),
            "is_vegetarian" => {
                data.is_vegetarian = true;
                let _ = field.text().await;
            }
            "is_vegan" => {
                data.is_vegan = true;
                let _ = field.text().await;
            }
            "has_gluten_free" => {
                data.has_gluten_free = true;
                let _ = field.text().await;
            }
            "image" => {
                let filename = field.file_name().unwrap_or("").to_string();
                if !filename.is_empty() {
                    if let Ok(bytes) = field.bytes().await {
                        if !bytes.is_empty() {
                            match save_uploaded_file(
                                &state.settings.server.uploads_dir,
                                "menus",
                                &filename,
                                &bytes,
                            )
                            .await
                            {
                                Ok(path) => data.image_url = Some(path),
                                Err(e) => tracing::warn!("Menu image upload failed: {}", e),
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

pub async fn admin_create_menu(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    mut multipart: Multipart,
) -> Response {
    let data = parse_menu_form(&state, &mut multipart).await;

    if !csrf_ok(&state, &session_info, &data.csrf_token).await {
        return redirect_with_err("/admin/menus/new", "Invalid request token.").into_response();
    }
    if data.name.is_empty() || data.price_cents.is_none() {
        return redirect_with_err("/admin/menus/new", "Name and a valid price are required.")
            .into_response();
    }

    let now = chrono::Utc::now();
    let menu = CateringMenu {
        id: Uuid::new_v4(),
        name: data.name,
        description: data.description,
        menu_type: menu_type_from_str(&data.menu_type),
        price_per_person_cents: data.price_cents.unwrap_or(0),
        included_items: if data.included_items.is_empty() {
            None
        } else {
            Some(data.included_items)
        },
        is_vegetarian: data.is_vegetarian,
        is_vegan: data.is_vegan,
        has_gluten_free: data.has_gluten_free,
        image_url: data.image_url,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    match state.service_context.catering_repo.create(menu).await {
        Ok(_) => redirect_with_msg("/admin/menus", "Menu created successfully!").into_response(),
        Err(e) => {
            tracing::error!("Failed to create menu: {}", e);
            redirect_with_err("/admin/menus/new", "Failed to create menu.").into_response()
        }
    }
}

pub async fn admin_update_menu(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    let existing = match state.service_context.catering_repo.find_by_id(id).await {
        Ok(Some(menu)) => menu,
        _ => return redirect_with_err("/admin/menus", "Menu not found.").into_response(),
    };

    let back = format!("/admin/menus/{}", id);
    let data = parse_menu_form(&state, &mut multipart).await;

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

    let updated = CateringMenu {
        id,
        name: data.name,
        description: data.description,
        menu_type: menu_type_from_str(&data.menu_type),
        price_per_person_cents: data.price_cents.unwrap_or(0),
        included_items: if data.included_items.is_empty() {
            None
        } else {
            Some(data.included_items)
        },
        is_vegetarian: data.is_vegetarian,
        is_vegan: data.is_vegan,
        has_gluten_free: data.has_gluten_free,
        image_url: data.image_url.or(existing.image_url),
        is_active: existing.is_active,
        created_at: existing.created_at,
        updated_at: chrono::Utc::now(),
    };

    match state.service_context.catering_repo.update(id, updated).await {
        Ok(_) => redirect_with_msg("/admin/menus", "Menu updated successfully!").into_response(),
        Err(e) => {
            tracing::error!("Failed to update menu: {}", e);
            redirect_with_err(&back, "Failed to update menu.").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub csrf_token: String,
}

pub async fn admin_delete_menu(
    State(state): State<AppState>,
    Extension(_current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(id): Path<Uuid>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if !csrf_ok(&state, &session_info, &form.csrf_token).await {
        return redirect_with_err("/admin/menus", "Invalid request token.").into_response();
    }

    match state.service_context.catering_repo.set_active(id, false).await {
        Ok(()) => redirect_with_msg("/admin/menus", "Menu deleted successfully!").into_response(),
        Err(e) => {
            tracing::error!("Failed to delete menu: {}", e);
            redirect_with_err("/admin/menus", "Failed to delete menu.").into_response()
        }
    }
}
