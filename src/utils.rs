use axum::http::{header::InvalidHeaderValue, HeaderValue};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn cookie(name: &str, value: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = if secure { " Secure;" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}={value}; HttpOnly; Max-Age=604800;{secure} Path=/; SameSite=Strict"
    ))
}

pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = if secure { " Secure;" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}=; HttpOnly; Max-Age=0;{secure} Path=/; SameSite=Strict"
    ))
}

const AVATAR_SERVICE: &str = "https://ui-avatars.com/api/";

/// Initials avatar for a new account, derived from the username.
pub fn avatar_url(username: &str) -> String {
    match reqwest::Url::parse_with_params(
        AVATAR_SERVICE,
        &[("name", username), ("background", "random")],
    ) {
        Ok(url) => url.to_string(),
        Err(_) => AVATAR_SERVICE.to_string(),
    }
}
