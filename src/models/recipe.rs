// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Recipe model for storage and API.

use crate::models::user::{Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored recipe record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Recipe ID (also used as document ID)
    pub id: Uuid,
    /// Recipe title
    pub title: String,
    /// Ingredient list (required, non-empty)
    pub ingredients: Vec<String>,
    /// Optional second ingredient list (e.g. for a sauce or side)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients_set_two: Option<Vec<String>>,
    /// Preparation instructions
    pub instructions: String,
    /// Free-text category, used for search
    pub category: String,
    /// Optional notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Owning user's ID; set at creation, never changed
    pub owner: Uuid,
    /// When the recipe was created (RFC 3339)
    pub created_at: String,
}

/// Minimal owner projection attached to listed recipes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub name: String,
    pub role: Role,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Recipe representation sent over the wire, with the owner reference
/// replaced by its minimal projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients_set_two: Option<Vec<String>>,
    pub instructions: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub owner: OwnerSummary,
    pub created_at: String,
}

impl RecipeResponse {
    pub fn new(recipe: Recipe, owner: &User) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            ingredients: recipe.ingredients,
            ingredients_set_two: recipe.ingredients_set_two,
            instructions: recipe.instructions,
            category: recipe.category,
            notes: recipe.notes,
            owner: OwnerSummary::from(owner),
            created_at: recipe.created_at,
        }
    }
}
