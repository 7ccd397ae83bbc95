use {
    axum::{
        extract::FromRequestParts,
        http::{header, request::Parts},
    },
    axum_extra::extract::CookieJar,
};

use parley_auth::Claims;

use crate::{error::AppError, state::AppState};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Extractor for authenticated REST routes. The access token is read
/// from the `accessToken` cookie first, then from a bearer header.
pub struct AuthedUser(pub Claims);

impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts);
        let claims = state.authenticator.authenticate(token.as_deref())?;
        Ok(Self(claims))
    }
}

pub fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Some(cookie.value().to_string());
    }
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}
