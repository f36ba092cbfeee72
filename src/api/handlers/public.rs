use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{api::state::AppState, domain::format_cents, error::Result};

/// Active offering as exposed to the public website.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub venue: String,
    pub max_capacity: i32,
    pub price_per_person: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackageSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub total_price: String,
    pub image_url: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/public/events",
    responses((status = 200, description = "Active event offerings", body = [EventSummary]))
)]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventSummary>>> {
    let events = state.service_context.event_repo.list_active().await?;

    Ok(Json(
        events
            .into_iter()
            .map(|e| EventSummary {
                id: e.id,
                name: e.name,
                description: e.description,
                venue: e.venue,
                max_capacity: e.max_capacity,
                price_per_person: format_cents(e.price_per_person_cents),
                image_url: e.image_url,
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/public/packages",
    responses((status = 200, description = "Active packages", body = [PackageSummary]))
)]
pub async fn list_packages(State(state): State<AppState>) -> Result<Json<Vec<PackageSummary>>> {
    let packages = state.service_context.package_repo.list_active().await?;

    Ok(Json(
        packages
            .into_iter()
            .map(|p| PackageSummary {
                id: p.id,
                name: p.name,
                description: p.description,
                total_price: format_cents(p.total_price_cents),
                image_url: p.image_url,
            })
            .collect(),
    ))
}
