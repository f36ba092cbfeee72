use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{api::state::AppState, domain::User, error::AppError};

#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
}

#[derive(Clone)]
pub struct SessionInfo {
    pub session_id: String,
}

async fn authenticate(state: &AppState, jar: &CookieJar) -> Option<(User, String)> {
    let token = jar.get("session")?.value().to_string();

    let session = state
        .service_context
        .auth_service
        .validate_session(&token)
        .await
        .ok()
        .flatten()?;

    let user = state
        .service_context
        .user_repo
        .find_by_id(session.user_id)
        .await
        .ok()
        .flatten()?;

    Some((user, session.id))
}

/// Web surface: unauthenticated requests get sent to the login page.
pub async fn require_auth_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, &jar).await {
        Some((user, session_id)) => {
            request.extensions_mut().insert(CurrentUser { user });
            request.extensions_mut().insert(SessionInfo { session_id });
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// Back office: authenticated staff or admin only. Finer checks (only
/// admins decide bookings) live in the handlers.
pub async fn require_staff_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, &jar).await {
        Some((user, session_id)) if user.is_staff() => {
            request.extensions_mut().insert(CurrentUser { user });
            request.extensions_mut().insert(SessionInfo { session_id });
            next.run(request).await
        }
        Some(_) => AppError::Forbidden.into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

/// Public pages still want to greet a logged-in visitor.
pub async fn optional_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some((user, session_id)) = authenticate(&state, &jar).await {
        request.extensions_mut().insert(CurrentUser { user });
        request.extensions_mut().insert(SessionInfo { session_id });
    }

    next.run(request).await
}
