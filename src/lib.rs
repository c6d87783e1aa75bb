// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Recipebook: a recipe-sharing backend.
//!
//! This crate provides the API for registering users, creating and searching
//! recipes, and bookmarking recipes from other users. What a requester can
//! see is gated by their role.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
}
