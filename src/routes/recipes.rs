// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe routes: create, role-filtered listing and search, fetch, update.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Recipe, RecipeResponse, User};
use crate::services::catalog;
use crate::services::Page;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Recipe routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recipes", post(create_recipe).get(list_recipes))
        .route("/recipes/search", get(search_recipes))
        .route("/recipes/{id}", get(get_recipe).patch(update_recipe))
}

pub(crate) fn default_page() -> u32 {
    1
}
pub(crate) fn default_limit() -> u32 {
    10
}

pub(crate) const MAX_LIMIT: u32 = 100;

/// Validate pagination parameters and cap the page size.
pub(crate) fn effective_page_params(page: u32, limit: u32) -> Result<u32> {
    if page < 1 {
        return Err(AppError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }
    if limit < 1 {
        return Err(AppError::BadRequest(
            "Limit must be greater than 0".to_string(),
        ));
    }
    Ok(limit.min(MAX_LIMIT))
}

/// Resolve the owner documents for a batch of recipes, keyed by ID.
pub(crate) async fn resolve_owners(
    state: &AppState,
    recipes: &[Recipe],
) -> Result<HashMap<Uuid, User>> {
    let owner_ids: Vec<Uuid> = recipes.iter().map(|r| r.owner).collect();
    let owners = state.db.get_users_by_ids(&owner_ids).await?;
    Ok(owners.into_iter().map(|u| (u.id, u)).collect())
}

// ─── Create ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateRecipeRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    title: String,
    #[validate(length(min = 1, message = "At least one ingredient is required"))]
    ingredients: Vec<String>,
    #[serde(default)]
    ingredients_set_two: Option<Vec<String>>,
    #[validate(length(min = 1, message = "Instructions are required"))]
    instructions: String,
    #[validate(length(min = 1, message = "Category is required"))]
    category: String,
    #[serde(default)]
    notes: Option<String>,
}

/// Create a recipe owned by the authenticated user.
async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Recipe>)> {
    // Deserialize by hand so a missing field is a 400 like any other
    // validation failure, not a framework-level 422.
    let payload: CreateRecipeRequest =
        serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let recipe = Recipe {
        id: Uuid::new_v4(),
        title: payload.title,
        ingredients: payload.ingredients,
        ingredients_set_two: payload.ingredients_set_two,
        instructions: payload.instructions,
        category: payload.category,
        notes: payload.notes,
        owner: auth.user.id,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state.db.upsert_recipe(&recipe).await?;

    tracing::info!(recipe_id = %recipe.id, owner = %recipe.owner, "Recipe created");

    Ok((StatusCode::CREATED, Json(recipe)))
}

// ─── List & Search ───────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

/// List recipes visible to the requester, newest first, paginated.
async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Page<RecipeResponse>>> {
    let limit = effective_page_params(params.page, params.limit)?;

    let recipes = state.db.list_recipes().await?;
    let owners = resolve_owners(&state, &recipes).await?;
    let visible = catalog::project_visible(recipes, &owners, auth.user.role);

    Ok(Json(catalog::paginate(visible, params.page, limit)))
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

/// Search recipes by case-insensitive substring over title, either
/// ingredient list, and category; same visibility rule as listing.
async fn search_recipes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Page<RecipeResponse>>> {
    let limit = effective_page_params(params.page, params.limit)?;

    tracing::debug!(q = %params.q, page = params.page, "Searching recipes");

    let recipes: Vec<Recipe> = state
        .db
        .list_recipes()
        .await?
        .into_iter()
        .filter(|r| catalog::matches_search(r, &params.q))
        .collect();
    let owners = resolve_owners(&state, &recipes).await?;
    let visible = catalog::project_visible(recipes, &owners, auth.user.role);

    Ok(Json(catalog::paginate(visible, params.page, limit)))
}

// ─── Fetch & Update ──────────────────────────────────────────

/// Get one recipe with its owner projection.
///
/// A malformed ID can never name a document, so it is reported as not-found
/// rather than surfacing the store's cast failure.
async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RecipeResponse>> {
    let recipe_id: Uuid = id
        .parse()
        .map_err(|_| AppError::NotFound("Recipe not found".to_string()))?;

    let recipe = state
        .db
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", recipe_id)))?;

    // Users are never deleted, so a missing owner means a half-written
    // document; without the owner there is nothing to project.
    let owner = state
        .db
        .get_user(recipe.owner)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", recipe_id)))?;

    Ok(Json(RecipeResponse::new(recipe, &owner)))
}

const ALLOWED_RECIPE_UPDATES: &[&str] = &[
    "title",
    "ingredients",
    "ingredientsSetTwo",
    "instructions",
    "category",
    "notes",
];

/// Update a recipe.
///
/// Only admins may update recipes at all, and the recipe must additionally
/// belong to the caller — the lookup is owner-scoped, so an admin patching
/// someone else's recipe sees 404, not 403.
async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Recipe>> {
    if !auth.user.role.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can update recipes.".to_string(),
        ));
    }

    let updates = body
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Invalid updates".to_string()))?;

    // All-or-nothing: one disallowed key rejects the whole patch.
    if !updates
        .keys()
        .all(|key| ALLOWED_RECIPE_UPDATES.contains(&key.as_str()))
    {
        return Err(AppError::BadRequest("Invalid updates".to_string()));
    }

    let recipe_id: Uuid = id
        .parse()
        .map_err(|_| AppError::NotFound("Recipe not found".to_string()))?;

    let mut recipe = state
        .db
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", recipe_id)))?;

    if recipe.owner != auth.user.id {
        return Err(AppError::NotFound(format!(
            "Recipe {} not found",
            recipe_id
        )));
    }

    apply_recipe_updates(&mut recipe, updates)?;

    state.db.upsert_recipe(&recipe).await?;

    tracing::info!(recipe_id = %recipe.id, "Recipe updated");

    Ok(Json(recipe))
}

/// Apply a whitelisted patch to a recipe, revalidating required fields.
fn apply_recipe_updates(
    recipe: &mut Recipe,
    updates: &serde_json::Map<String, Value>,
) -> Result<()> {
    if let Some(value) = updates.get("title") {
        recipe.title = required_string(value, "Title is required")?;
    }
    if let Some(value) = updates.get("ingredients") {
        let ingredients: Vec<String> = serde_json::from_value(value.clone())
            .map_err(|_| AppError::BadRequest("Ingredients must be a list".to_string()))?;
        if ingredients.is_empty() {
            return Err(AppError::BadRequest(
                "At least one ingredient is required".to_string(),
            ));
        }
        recipe.ingredients = ingredients;
    }
    if let Some(value) = updates.get("ingredientsSetTwo") {
        recipe.ingredients_set_two = serde_json::from_value(value.clone())
            .map_err(|_| AppError::BadRequest("Ingredients must be a list".to_string()))?;
    }
    if let Some(value) = updates.get("instructions") {
        recipe.instructions = required_string(value, "Instructions are required")?;
    }
    if let Some(value) = updates.get("category") {
        recipe.category = required_string(value, "Category is required")?;
    }
    if let Some(value) = updates.get("notes") {
        recipe.notes = serde_json::from_value(value.clone())
            .map_err(|_| AppError::BadRequest("Notes must be a string".to_string()))?;
    }
    Ok(())
}

fn required_string(value: &Value, message: &str) -> Result<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}
