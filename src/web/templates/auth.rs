use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use validator::Validate;

use crate::{
    api::state::AppState,
    auth::AuthService,
    domain::{CreateUserRequest, UserRole},
    repository::user_repository::get_password_hash,
    web::templates::{redirect_with_msg, FlashParams, HtmlTemplate, UserInfo},
};

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub msg: String,
    pub err: String,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub current_user: Option<UserInfo>,
    pub is_admin: bool,
    pub cart_count: usize,
    pub err: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(max = 20, message = "Phone number is too long"))]
    pub phone: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub confirm_password: String,
}

// GET /login
pub async fn login_page(Query(flash): Query<FlashParams>) -> impl IntoResponse {
    HtmlTemplate(LoginTemplate {
        current_user: None,
        is_admin: false,
        cart_count: 0,
        msg: flash.msg_or_empty(),
        err: flash.err_or_empty(),
    })
}

// POST /login
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    // Accept either username or email in the one field.
    let user = match state
        .service_context
        .user_repo
        .find_by_username(&form.username)
        .await
        .ok()
        .flatten()
    {
        Some(user) => Some(user),
        None => state
            .service_context
            .user_repo
            .find_by_email(&form.username)
            .await
            .ok()
            .flatten(),
    };

    if let Some(user) = user {
        let password_hash = get_password_hash(&state.service_context.db_pool, &user.email)
            .await
            .ok()
            .flatten();

        let password_valid = password_hash
            .map(|hash| crate::auth::verify_password(&form.password, &hash).unwrap_or(false))
            .unwrap_or(false);

        if password_valid {
            let duration_hours = state.settings.auth.session_duration_hours;
            match state
                .service_context
                .auth_service
                .create_session(user.id, duration_hours)
                .await
            {
                Ok((_session, token)) => {
                    let cookie = AuthService::create_session_cookie(&token, duration_hours, false);
                    return (jar.add(cookie), Redirect::to("/")).into_response();
                }
                Err(e) => {
                    tracing::error!("Failed to create session: {}", e);
                }
            }
        }
    }

    Redirect::to("/login?err=Invalid%20username%20or%20password").into_response()
}

// GET /register
pub async fn register_page(Query(flash): Query<FlashParams>) -> impl IntoResponse {
    HtmlTemplate(RegisterTemplate {
        current_user: None,
        is_admin: false,
        cart_count: 0,
        err: flash.err_or_empty(),
    })
}

// POST /register
pub async fn register_handler(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        let first = errors
            .field_errors()
            .values()
            .flat_map(|v| v.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .next()
            .unwrap_or_else(|| "Please fill all required fields".to_string());
        return Redirect::to(&format!("/register?err={}", urlencoding::encode(&first)))
            .into_response();
    }

    if form.password != form.confirm_password {
        return Redirect::to("/register?err=Passwords%20do%20not%20match").into_response();
    }

    let users = &state.service_context.user_repo;
    if matches!(users.find_by_email(&form.email).await, Ok(Some(_))) {
        return Redirect::to("/register?err=Email%20is%20already%20registered").into_response();
    }
    if matches!(users.find_by_username(&form.username).await, Ok(Some(_))) {
        return Redirect::to("/register?err=Username%20is%20taken").into_response();
    }

    match users
        .create(CreateUserRequest {
            email: form.email,
            username: form.username,
            full_name: form.full_name,
            phone: form.phone,
            password: form.password,
            role: UserRole::User,
        })
        .await
    {
        Ok(_) => redirect_with_msg("/login", "Account created. Please log in.").into_response(),
        Err(e) => {
            tracing::error!("Failed to register user: {}", e);
            Redirect::to("/register?err=Registration%20failed").into_response()
        }
    }
}

// POST /logout
pub async fn logout_handler(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get("session") {
        let token = cookie.value().to_string();

        // Drop the per-session CSRF token and cart blob along with the
        // session itself.
        if let Ok(Some(session)) = state.service_context.auth_service.validate_session(&token).await
        {
            if let Err(e) = state.service_context.csrf_service.delete_token(&session.id).await {
                tracing::warn!("Failed to delete CSRF token: {}", e);
            }
            if let Err(e) = state.service_context.cart_repo.clear(&session.id).await {
                tracing::warn!("Failed to clear session cart: {}", e);
            }
        }

        if let Err(e) = state.service_context.auth_service.invalidate_session(&token).await {
            tracing::warn!("Failed to invalidate session: {}", e);
        }
    }

    (jar.add(AuthService::create_logout_cookie()), Redirect::to("/login")).into_response()
}
