use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header::LOCATION;
use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::auth::jwt::STATE_TTL_SECS;
use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::models::{AuthResponse, LoginRequest, OAuthCallbackQuery, RegisterRequest, User};
use crate::routes::AppState;

/// Configure authentication routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/register", web::post().to(register))
        .route("/auth/login", web::post().to(login))
        .route("/auth/me", web::get().to(me))
        .route("/auth/google", web::get().to(google_start))
        .route("/auth/google/callback", web::get().to(google_callback));
}

/// Cookie holding the nonce of the pending Google sign-in
pub const OAUTH_NONCE_COOKIE: &str = "filmmatch_oauth_nonce";
const OAUTH_COOKIE_PATH: &str = "/api/auth/google";

fn nonce_cookie(state: &AppState, nonce: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build(OAUTH_NONCE_COOKIE, nonce)
        .path(OAUTH_COOKIE_PATH)
        .http_only(true)
        .secure(state.frontend_url.starts_with("https://"))
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .finish()
}

fn auth_response(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let token = state.jwt.issue(user.id, &user.email)?;
    Ok(AuthResponse { token, user })
}

/// Create a password account
///
/// POST /api/auth/register
///
/// Request body:
/// ```json
/// { "email": "string", "password": "string", "displayName": "string" }
/// ```
async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    req.validate()?;

    let password_hash = hash_password(&req.password, state.bcrypt_cost).await?;
    let user = state
        .postgres
        .create_user(&req.email, &password_hash, req.display_name.trim())
        .await?;

    tracing::info!("Registered user {}", user.id);

    Ok(HttpResponse::Created().json(auth_response(&state, user)?))
}

/// Log in with email and password
///
/// POST /api/auth/login
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .postgres
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    // Accounts created through Google have no password
    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !verify_password(&req.password, hash).await? {
        tracing::info!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    Ok(HttpResponse::Ok().json(auth_response(&state, user)?))
}

/// Current user
///
/// GET /api/auth/me
async fn me(state: web::Data<AppState>, auth: AuthUser) -> ApiResult<HttpResponse> {
    let user = state
        .postgres
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User no longer exists".to_string()))?;

    Ok(HttpResponse::Ok().json(user))
}

/// Redirect to the Google consent screen
///
/// GET /api/auth/google
async fn google_start(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Google sign-in is not configured".to_string()))?;

    let (oauth_state, nonce) = state.jwt.issue_state()?;

    Ok(HttpResponse::Found()
        .cookie(nonce_cookie(&state, nonce, Duration::seconds(STATE_TTL_SECS)))
        .insert_header((LOCATION, google.authorize_url(&oauth_state)))
        .finish())
}

/// Finish Google sign-in and hand the token to the frontend
///
/// GET /api/auth/google/callback?code={code}&state={state}
///
/// The `state` must verify and its nonce must match the cookie set by
/// `/auth/google` in the same browser.
async fn google_callback(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<OAuthCallbackQuery>,
) -> ApiResult<HttpResponse> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Google sign-in is not configured".to_string()))?;

    let nonce = state.jwt.verify_state(&query.state)?;
    match req.cookie(OAUTH_NONCE_COOKIE) {
        Some(cookie) if cookie.value() == nonce => {}
        _ => {
            tracing::info!("Google callback state not issued to this browser");
            return Err(ApiError::Unauthorized(
                "Sign-in was not started from this browser".to_string(),
            ));
        }
    }

    if let Some(error) = &query.error {
        return Err(ApiError::Unauthorized(format!("Google sign-in was cancelled: {}", error)));
    }
    let code = query
        .code
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    let access_token = google.exchange_code(code).await?;
    let profile = google.fetch_profile(&access_token).await?;

    let email = match (&profile.email, profile.email_verified) {
        (Some(email), true) => email.clone(),
        _ => {
            return Err(ApiError::Unauthorized(
                "Google account has no verified email".to_string(),
            ))
        }
    };
    let display_name = profile
        .name
        .clone()
        .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

    let user = state
        .postgres
        .upsert_google_user(&profile.sub, &email, &display_name, profile.picture.as_deref())
        .await?;
    let token = state.jwt.issue(user.id, &user.email)?;

    tracing::info!("Google sign-in for user {}", user.id);

    let location = format!(
        "{}/oauth/callback?token={}",
        state.frontend_url.trim_end_matches('/'),
        urlencoding::encode(&token)
    );

    Ok(HttpResponse::Found()
        .cookie(nonce_cookie(&state, String::new(), Duration::ZERO))
        .insert_header((LOCATION, location))
        .finish())
}
