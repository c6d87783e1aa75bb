// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User account routes: registration, sessions, profile, bookmarks.

use crate::error::{AppError, Result};
use crate::middleware::auth::{issue_token, AuthUser};
use crate::models::{RecipeResponse, Role, SafeUser, User};
use crate::services::catalog;
use crate::services::password;
use crate::services::Page;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use super::recipes::{default_limit, default_page, effective_page_params, resolve_owners};

/// User routes that need no authentication.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/login", post(login))
        .route("/users/{id}", get(get_user_by_id))
}

/// User routes behind the auth middleware (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(get_me).patch(update_me))
        .route("/users/me/bookmarks", get(list_bookmarks))
        .route("/users/logout", post(logout))
        .route("/users/logoutAll", post(logout_all))
}

// ─── Registration & Login ────────────────────────────────────

#[derive(Deserialize, Validate)]
struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(email(message = "Email is invalid"))]
    email: String,
    #[validate(length(min = 7, message = "Password must be at least 7 characters"))]
    password: String,
}

impl RegisterRequest {
    /// Trim all fields and lowercase the email before validating.
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password.trim().to_string(),
        }
    }
}

#[derive(Serialize)]
struct RegisterResponse {
    user: SafeUser,
    token: String,
}

/// Register a new account. Every account starts with role `user`; the role
/// is never client-settable.
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    // Deserialize by hand so a missing field is a 400 like any other
    // validation failure, not a framework-level 422.
    let payload: RegisterRequest =
        serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let payload = payload.normalized();
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if state.db.get_user_by_email(&payload.email).await?.is_some() {
        return Err(AppError::BadRequest(
            "Email is already registered".to_string(),
        ));
    }

    let id = Uuid::new_v4();
    let token = issue_token(id, &state.config.jwt_signing_key)?;

    // The first session token is persisted together with the account: one
    // write, and the registration response is already authenticated.
    let user = User {
        id,
        name: payload.name,
        email: payload.email,
        role: Role::User,
        password_hash: password::hash_password(&payload.password)?,
        tokens: vec![token.clone()],
        bookmarks: Vec::new(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.safe(),
            token,
        }),
    ))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    user: SafeUser,
    auth_token: String,
}

/// Log in with email and password, starting a new session.
///
/// Unknown email and wrong password produce the identical response; the
/// distinction would let callers enumerate accounts.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<LoginResponse>> {
    let payload: LoginRequest =
        serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let email = payload.email.trim().to_lowercase();

    let mut user = state
        .db
        .get_user_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !password::verify_password(payload.password.trim(), &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    // New token per login; existing sessions on other devices stay valid.
    let token = issue_token(user.id, &state.config.jwt_signing_key)?;
    user.tokens.push(token.clone());
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, sessions = user.tokens.len(), "User logged in");

    Ok(Json(LoginResponse {
        user: user.safe(),
        auth_token: token,
    }))
}

// ─── Sessions ────────────────────────────────────────────────

/// End the current session: remove exactly the presented token.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode> {
    let mut user = auth.user;
    user.tokens.retain(|t| t != &auth.token);
    state.db.upsert_user(&user).await?;

    Ok(StatusCode::OK)
}

/// End every session for this account.
async fn logout_all(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode> {
    let mut user = auth.user;
    user.tokens.clear();
    state.db.upsert_user(&user).await?;

    Ok(StatusCode::OK)
}

// ─── Profile ─────────────────────────────────────────────────

/// Get the authenticated user's profile.
async fn get_me(Extension(auth): Extension<AuthUser>) -> Json<SafeUser> {
    Json(auth.user.safe())
}

/// List all users as public-safe projections.
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<SafeUser>>> {
    let users = state.db.list_users().await?;
    Ok(Json(users.iter().map(User::safe).collect()))
}

/// Get one user by ID as a public-safe projection.
async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SafeUser>> {
    // A malformed ID can never name an account; report it as not-found.
    let user_id: Uuid = id
        .parse()
        .map_err(|_| AppError::NotFound("User not found".to_string()))?;

    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    Ok(Json(user.safe()))
}

const ALLOWED_USER_UPDATES: &[&str] = &["name", "email", "password", "bookmarks", "currentPassword"];

/// Fields whose change requires proving knowledge of the current password.
const CREDENTIAL_GATED: &[&str] = &["name", "email", "password"];

fn validate_update_keys(updates: &serde_json::Map<String, Value>) -> Result<()> {
    // All-or-nothing: one disallowed key rejects the whole patch.
    if !updates
        .keys()
        .all(|key| ALLOWED_USER_UPDATES.contains(&key.as_str()))
    {
        return Err(AppError::BadRequest("Invalid updates".to_string()));
    }
    Ok(())
}

fn needs_current_password(updates: &serde_json::Map<String, Value>) -> bool {
    updates
        .keys()
        .any(|key| CREDENTIAL_GATED.contains(&key.as_str()))
}

/// Wholesale bookmark replacement keeps the no-duplicates invariant even for
/// a duplicated input list: first occurrence wins.
fn dedup_bookmarks(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Update the authenticated user's profile.
///
/// Accepts only {name, email, password, bookmarks, currentPassword}; changes
/// to the first three require the current password. Nothing is persisted
/// unless the whole patch is acceptable.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<Json<SafeUser>> {
    let updates = body
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Invalid updates".to_string()))?;

    validate_update_keys(updates)?;

    let mut user = auth.user;

    if needs_current_password(updates) {
        let current = updates
            .get("currentPassword")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::BadRequest("Current password is required".to_string()))?;

        if !password::verify_password(current, &user.password_hash)? {
            return Err(AppError::BadRequest(
                "Incorrect current password".to_string(),
            ));
        }
    }

    if let Some(value) = updates.get("name") {
        let name = value
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::BadRequest("Name is required".to_string()))?;
        user.name = name.to_string();
    }

    if let Some(value) = updates.get("email") {
        let email = value
            .as_str()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| s.validate_email())
            .ok_or_else(|| AppError::BadRequest("Email is invalid".to_string()))?;

        if let Some(existing) = state.db.get_user_by_email(&email).await? {
            if existing.id != user.id {
                return Err(AppError::BadRequest(
                    "Email is already registered".to_string(),
                ));
            }
        }
        user.email = email;
    }

    if let Some(value) = updates.get("password") {
        let new_password = value
            .as_str()
            .map(str::trim)
            .filter(|s| s.chars().count() >= 7)
            .ok_or_else(|| {
                AppError::BadRequest("Password must be at least 7 characters".to_string())
            })?;
        user.password_hash = password::hash_password(new_password)?;
    }

    if let Some(value) = updates.get("bookmarks") {
        let ids: Vec<Uuid> = serde_json::from_value(value.clone()).map_err(|_| {
            AppError::BadRequest("Bookmarks must be a list of recipe ids".to_string())
        })?;
        user.bookmarks = dedup_bookmarks(ids);
    }

    state.db.upsert_user(&user).await?;

    Ok(Json(user.safe()))
}

// ─── Bookmarks ───────────────────────────────────────────────

#[derive(Deserialize)]
struct BookmarksQuery {
    #[serde(default)]
    q: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

/// List the authenticated user's bookmarked recipes, with the same
/// role-aware visibility, search, and pagination as the recipe listing.
async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<BookmarksQuery>,
) -> Result<Json<Page<RecipeResponse>>> {
    let limit = effective_page_params(params.page, params.limit)?;

    let recipes: Vec<_> = state
        .db
        .get_recipes_by_ids(&auth.user.bookmarks)
        .await?
        .into_iter()
        .filter(|r| catalog::matches_search(r, &params.q))
        .collect();
    let owners = resolve_owners(&state, &recipes).await?;
    let visible = catalog::project_visible(recipes, &owners, auth.user.role);

    Ok(Json(catalog::paginate(visible, params.page, limit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_keys_whitelist() {
        let ok = serde_json::json!({ "name": "new", "bookmarks": [] });
        assert!(validate_update_keys(ok.as_object().unwrap()).is_ok());

        let bad = serde_json::json!({ "name": "new", "role": "admin" });
        let err = validate_update_keys(bad.as_object().unwrap());
        assert!(matches!(err, Err(AppError::BadRequest(_))));

        // An empty patch is allowed and is a no-op.
        let empty = serde_json::json!({});
        assert!(validate_update_keys(empty.as_object().unwrap()).is_ok());
    }

    #[test]
    fn test_tokens_are_not_patchable() {
        let bad = serde_json::json!({ "tokens": [] });
        assert!(validate_update_keys(bad.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_current_password_gating() {
        let gated = serde_json::json!({ "password": "newpassword" });
        assert!(needs_current_password(gated.as_object().unwrap()));

        let gated = serde_json::json!({ "email": "new@test.com" });
        assert!(needs_current_password(gated.as_object().unwrap()));

        // Bookmark-only patches need no password proof.
        let ungated = serde_json::json!({ "bookmarks": [] });
        assert!(!needs_current_password(ungated.as_object().unwrap()));
    }

    #[test]
    fn test_dedup_bookmarks_keeps_first_occurrence() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_bookmarks(vec![a, b, a, a, b]), vec![a, b]);
    }

    #[test]
    fn test_register_request_normalization() {
        let req = RegisterRequest {
            name: "  test  ".to_string(),
            email: " Test@Test.COM ".to_string(),
            password: " test1234 ".to_string(),
        }
        .normalized();

        assert_eq!(req.name, "test");
        assert_eq!(req.email, "test@test.com");
        assert_eq!(req.password, "test1234");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_short_password() {
        let req = RegisterRequest {
            name: "test".to_string(),
            email: "test@test.com".to_string(),
            password: "short1".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_request_rejects_bad_email() {
        let req = RegisterRequest {
            name: "test".to_string(),
            email: "test@".to_string(),
            password: "test1234".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
