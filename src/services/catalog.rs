// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-aware recipe visibility, search matching, and pagination.
//!
//! Listing, search, and the bookmark listing all share these rules:
//! - an `admin` requester sees every recipe;
//! - a `user` requester never sees a recipe owned by an admin account,
//!   but sees recipes from every ordinary user;
//! - a search query matches on a case-insensitive substring of the title,
//!   any ingredient in either list, or the category.
//!
//! Everything here is pure: the handlers fetch recipes and owner documents
//! from the store, then filter and page in memory. Per-user result sets are
//! modest, and the store has no substring operator, so the in-memory pass is
//! both the simple and the only workable arrangement.

use crate::models::{Recipe, RecipeResponse, Role, User};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Whether a requester with `requester` role may see a recipe whose owner
/// has `owner` role.
pub fn visible_to(requester: Role, owner: Role) -> bool {
    requester.is_admin() || !owner.is_admin()
}

/// Case-insensitive substring match over the searchable recipe fields.
///
/// An empty query matches everything, making search-with-no-query identical
/// to a plain listing.
pub fn matches_search(recipe: &Recipe, query: &str) -> bool {
    let query = query.to_lowercase();
    if query.is_empty() {
        return true;
    }

    let contains = |field: &str| field.to_lowercase().contains(&query);

    contains(&recipe.title)
        || recipe.ingredients.iter().any(|i| contains(i))
        || recipe
            .ingredients_set_two
            .iter()
            .flatten()
            .any(|i| contains(i))
        || contains(&recipe.category)
}

/// Join recipes to their owners, drop what the requester may not see, and
/// project the survivors for the wire.
///
/// A recipe whose owner document is missing is dropped: without the owner
/// there is no role to authorize against and no projection to attach.
pub fn project_visible(
    recipes: Vec<Recipe>,
    owners: &HashMap<Uuid, User>,
    requester: Role,
) -> Vec<RecipeResponse> {
    recipes
        .into_iter()
        .filter_map(|recipe| {
            let owner = owners.get(&recipe.owner)?;
            visible_to(requester, owner.role).then(|| RecipeResponse::new(recipe, owner))
        })
        .collect()
}

/// One page of results plus the pagination envelope fields.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub total: u32,
    pub page: u32,
    pub pages: u32,
    pub data: Vec<T>,
}

/// Slice out one page: skip = (page - 1) * limit, `pages = ceil(total / limit)`.
///
/// Callers validate `page >= 1` and `limit >= 1` before getting here. A page
/// past the end yields an empty `data` with the envelope fields intact.
pub fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> Page<T> {
    let total = items.len() as u32;
    let pages = total.div_ceil(limit);

    let start = (page as usize).saturating_sub(1).saturating_mul(limit as usize);
    let data = if start < items.len() {
        let end = start.saturating_add(limit as usize).min(items.len());
        items.into_iter().take(end).skip(start).collect()
    } else {
        Vec::new()
    };

    Page {
        total,
        page,
        pages,
        data,
    }
}
