use askama::Template;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension,
};

use crate::{
    api::{
        middleware::auth::{CurrentUser, SessionInfo},
        state::AppState,
    },
    domain::format_cents,
    web::templates::{nav_context, FlashParams, HtmlTemplate, UserInfo},
};

use super::{cart_badge, fresh_csrf};

pub struct EventCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub venue: String,
    pub capacity: i32,
    pub price: String,
    pub image_url: String,
}

#[derive(Template)]
#[template(path = "events.html")]
pub struct EventsTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub events: Vec<EventCard>,
    pub msg: String,
    pub err: String,
}

pub async fn events_page(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    session_info: Option<Extension<SessionInfo>>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let cart_count = cart_badge(&state, session_info.as_deref()).await;
    let (user_info, is_admin, cart_count) = nav_context(current_user.as_deref(), cart_count);

    let events = state
        .service_context
        .event_repo
        .list_active()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|e| EventCard {
            id: e.id.to_string(),
            name: e.name,
            description: e.description,
            venue: e.venue,
            capacity: e.max_capacity,
            price: format_cents(e.price_per_person_cents),
            image_url: e.image_url.unwrap_or_default(),
        })
        .collect();

    HtmlTemplate(EventsTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        events,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

pub struct MenuCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub menu_type: String,
    pub price: String,
    pub dietary: String,
    pub included: String,
    pub image_url: String,
}

#[derive(Template)]
#[template(path = "catering.html")]
pub struct CateringTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub menus: Vec<MenuCard>,
    pub msg: String,
    pub err: String,
}

pub async fn catering_page(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    session_info: Option<Extension<SessionInfo>>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let cart_count = cart_badge(&state, session_info.as_deref()).await;
    let (user_info, is_admin, cart_count) = nav_context(current_user.as_deref(), cart_count);
    let csrf_token = match session_info.as_deref() {
        Some(si) => fresh_csrf(&state, si).await,
        None => String::new(),
    };

    let menus = state
        .service_context
        .catering_repo
        .list_active()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|m| {
            let mut dietary = Vec::new();
            if m.is_vegan {
                dietary.push("Vegan");
            } else if m.is_vegetarian {
                dietary.push("Vegetarian");
            }
            if m.has_gluten_free {
                dietary.push("Gluten-free options");
            }
            MenuCard {
                id: m.id.to_string(),
                name: m.name,
                description: m.description,
                menu_type: format!("{:?}", m.menu_type),
                price: format_cents(m.price_per_person_cents),
                dietary: dietary.join(" · "),
                included: m.included_items.unwrap_or_default(),
                image_url: m.image_url.unwrap_or_default(),
            }
        })
        .collect();

    HtmlTemplate(CateringTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        menus,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

pub struct ServiceCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub price_type: String,
    pub image_url: String,
}

#[derive(Template)]
#[template(path = "services.html")]
pub struct ServicesTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub csrf_token: String,
    pub services: Vec<ServiceCard>,
    pub msg: String,
    pub err: String,
}

pub async fn services_page(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    session_info: Option<Extension<SessionInfo>>,
    Query(flash): Query<FlashParams>,
) -> impl IntoResponse {
    let cart_count = cart_badge(&state, session_info.as_deref()).await;
    let (user_info, is_admin, cart_count) = nav_context(current_user.as_deref(), cart_count);
    let csrf_token = match session_info.as_deref() {
        Some(si) => fresh_csrf(&state, si).await,
        None => String::new(),
    };

    let services = state
        .service_context
        .service_repo
        .list_active()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|s| ServiceCard {
            id: s.id.to_string(),
            name: s.name,
            description: s.description,
            price: format_cents(s.price_cents),
            price_type: format!("{:?}", s.price_type),
            image_url: s.image_url.unwrap_or_default(),
        })
        .collect();

    HtmlTemplate(ServicesTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        csrf_token,
        services,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

pub struct PackageCard {
    pub name: String,
    pub description: String,
    pub event_name: String,
    pub price: String,
    pub items: Vec<String>,
    pub image_url: String,
}

#[derive(Template)]
#[template(path = "packages.html")]
pub struct PackagesTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub packages: Vec<PackageCard>,
}

pub async fn packages_page(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    session_info: Option<Extension<SessionInfo>>,
) -> impl IntoResponse {
    let cart_count = cart_badge(&state, session_info.as_deref()).await;
    let (user_info, is_admin, cart_count) = nav_context(current_user.as_deref(), cart_count);

    let mut cards = Vec::new();
    for p in state
        .service_context
        .package_repo
        .list_active()
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

        let mut items = Vec::new();
        for item in state
            .service_context
            .package_repo
            .items_for(p.id)
            .await
            .unwrap_or_default()
        {
            if let Some(menu_id) = item.menu_id {
                if let Ok(Some(menu)) = state.service_context.catering_repo.find_by_id(menu_id).await {
                    items.push(format!("Catering: {}", menu.name));
                }
            }
            if let Some(service_id) = item.service_id {
                if let Ok(Some(service)) =
                    state.service_context.service_repo.find_by_id(service_id).await
                {
                    items.push(format!("Service: {}", service.name));
                }
            }
        }

        cards.push(PackageCard {
            name: p.name,
            description: p.description,
            event_name,
            price: format_cents(p.total_price_cents),
            items,
            image_url: p.image_url.unwrap_or_default(),
        });
    }

    HtmlTemplate(PackagesTemplate {
        current_user: user_info,
        is_admin,
        cart_count,
        packages: cards,
    })
}
