// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod recipe;
pub mod user;

pub use recipe::{OwnerSummary, Recipe, RecipeResponse};
pub use user::{Role, SafeUser, User};
