//! Account routes under `/api/v1/users`.
//!
//! Login and refresh set the token pair as http-only cookies in
//! addition to returning it in the body, so both browser and
//! programmatic clients work.

use {
    axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        routing::{get, post},
    },
    axum_extra::extract::{
        CookieJar,
        cookie::{Cookie, SameSite},
    },
    serde::{Deserialize, Serialize},
};

use {
    parley_auth::{CurrentUser, TokenPair},
    parley_common::ApiResponse,
};

use crate::{
    error::AppResult,
    extract::{ACCESS_COOKIE, AuthedUser, REFRESH_COOKIE},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/verify-email/{token}", get(verify_email))
        .route("/resend-email-verification", post(resend_email_verification))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/{token}", post(reset_password))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
}

// ── Request/response bodies ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: CurrentUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

// ── Handlers ────────────────────────────────────────────────────────────────

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CurrentUser>>)> {
    let user = state
        .auth
        .register(&body.username, &body.email, &body.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(
            "user registered successfully and verification email has been sent",
            user,
        )),
    ))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<LoginData>>)> {
    let (user, pair) = state.auth.login(&body.username, &body.password).await?;
    let jar = set_token_cookies(jar, &pair);
    Ok((
        jar,
        Json(ApiResponse::ok(
            "user logged in successfully",
            LoginData {
                user,
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
        )),
    ))
}

async fn logout(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<ApiResponse<serde_json::Value>>)> {
    state.auth.logout(&claims.sub).await?;
    let jar = clear_token_cookies(jar);
    Ok((jar, Json(ApiResponse::message_only("user logged out"))))
}

async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieJar, Json<ApiResponse<TokenPair>>)> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| body.and_then(|Json(body)| body.refresh_token));
    let presented = presented.unwrap_or_default();

    let (_, pair) = state.auth.refresh(&presented).await?;
    let jar = set_token_cookies(jar, &pair);
    Ok((jar, Json(ApiResponse::ok("access token refreshed", pair))))
}

async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ApiResponse<CurrentUser>>> {
    let user = state.auth.verify_email(&token).await?;
    Ok(Json(ApiResponse::ok("email is verified", user)))
}

async fn resend_email_verification(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state.auth.resend_email_verification(&claims.sub).await?;
    Ok(Json(ApiResponse::message_only(
        "verification email has been sent to your email",
    )))
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state.auth.forgot_password(&body.email).await?;
    Ok(Json(ApiResponse::message_only(
        "password reset mail has been sent to your email",
    )))
}

async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state.auth.reset_password(&token, &body.new_password).await?;
    Ok(Json(ApiResponse::message_only("password reset successfully")))
}

async fn change_password(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state
        .auth
        .change_password(&claims.sub, &body.old_password, &body.new_password)
        .await?;
    Ok(Json(ApiResponse::message_only("password changed successfully")))
}

async fn current_user(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
) -> AppResult<Json<ApiResponse<CurrentUser>>> {
    let user = state.auth.current_user(&claims.sub).await?;
    Ok(Json(ApiResponse::ok("current user fetched", user)))
}

// ── Cookie helpers ──────────────────────────────────────────────────────────

fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn set_token_cookies(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    jar.add(token_cookie(ACCESS_COOKIE, pair.access_token.clone()))
        .add(token_cookie(REFRESH_COOKIE, pair.refresh_token.clone()))
}

fn clear_token_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(token_cookie(ACCESS_COOKIE, String::new()))
        .remove(token_cookie(REFRESH_COOKIE, String::new()))
}
