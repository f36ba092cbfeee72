pub mod auth;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::api::middleware::auth::CurrentUser;
use crate::domain::User;

#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl UserInfo {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Nav context shared by every page: who is logged in, whether they see the
/// back office link, and the cart badge.
pub fn nav_context(current_user: Option<&CurrentUser>, cart_count: usize) -> (Option<UserInfo>, bool, usize) {
    match current_user {
        Some(cu) => (
            Some(UserInfo::from_user(&cu.user)),
            cu.user.is_staff(),
            cart_count,
        ),
        None => (None, false, 0),
    }
}

// Make askama templates work with axum
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

/// Redirect carrying a flash message in the query string.
pub fn redirect_with_msg(path: &str, msg: &str) -> axum::response::Redirect {
    axum::response::Redirect::to(&format!("{}?msg={}", path, urlencoding::encode(msg)))
}

pub fn redirect_with_err(path: &str, err: &str) -> axum::response::Redirect {
    axum::response::Redirect::to(&format!("{}?err={}", path, urlencoding::encode(err)))
}

#[derive(Debug, serde::Deserialize, Default)]
pub struct FlashParams {
    pub msg: Option<String>,
    pub err: Option<String>,
}

impl FlashParams {
    pub fn msg_or_empty(&self) -> String {
        self.msg.clone().unwrap_or_default()
    }

    pub fn err_or_empty(&self) -> String {
        self.err.clone().unwrap_or_default()
    }
}
