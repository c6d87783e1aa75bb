// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, session tokens, bookmarks)
//! - Recipes (owned documents, listed/searched role-aware by the caller)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Recipe, User};
use futures_util::{stream, StreamExt};
use std::collections::HashSet;
use uuid::Uuid;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by email (stored lowercase, so callers must normalize).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    /// List all users, oldest account first.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([(
                "createdAt",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch users for a set of IDs (duplicates collapsed).
    ///
    /// Uses concurrent reads with a limit to avoid overloading Firestore.
    /// Missing IDs are silently skipped.
    pub async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let client = self.get_client()?;
        let unique: HashSet<Uuid> = ids.iter().copied().collect();

        let users = stream::iter(unique)
            .map(|id| async move {
                client
                    .fluent()
                    .select()
                    .by_id_in(collections::USERS)
                    .obj::<User>()
                    .one(&id.to_string())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<User>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<User>>, AppError>>()?;

        Ok(users.into_iter().flatten().collect())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Recipe Operations ───────────────────────────────────────

    /// Get a recipe by ID.
    pub async fn get_recipe(&self, recipe_id: Uuid) -> Result<Option<Recipe>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RECIPES)
            .obj()
            .one(&recipe_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all recipes, newest first.
    ///
    /// Role-based visibility filtering, search matching, and pagination all
    /// need the owner documents joined in, so they happen in memory above
    /// this layer (Firestore has no substring operator and no cross-document
    /// join).
    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::RECIPES)
            .order_by([(
                "createdAt",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch recipes for a set of IDs, newest first.
    ///
    /// Missing IDs are silently skipped (a bookmark can outlive nothing —
    /// recipes are never deleted — but a dangling ID must not fail the list).
    pub async fn get_recipes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Recipe>, AppError> {
        let client = self.get_client()?;
        let unique: HashSet<Uuid> = ids.iter().copied().collect();

        let recipes = stream::iter(unique)
            .map(|id| async move {
                client
                    .fluent()
                    .select()
                    .by_id_in(collections::RECIPES)
                    .obj::<Recipe>()
                    .one(&id.to_string())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Recipe>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<Recipe>>, AppError>>()?;

        let mut recipes: Vec<Recipe> = recipes.into_iter().flatten().collect();
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    /// Create or update a recipe.
    pub async fn upsert_recipe(&self, recipe: &Recipe) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::RECIPES)
            .document_id(recipe.id.to_string())
            .object(recipe)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── Test Housekeeping ─────────────────────────────────────────

    /// Delete every user document.
    ///
    /// Not reachable from any route; integration tests use this to reset
    /// collections between scenarios. Returns the number of documents deleted.
    pub async fn delete_all_users(&self) -> Result<usize, AppError> {
        let users = self.list_users().await?;
        let count = users.len();
        self.batch_delete(&users, collections::USERS, |user: &User| {
            user.id.to_string()
        })
        .await?;

        tracing::debug!(count, "Deleted all users");
        Ok(count)
    }

    /// Delete every recipe document. Test housekeeping, like
    /// [`FirestoreDb::delete_all_users`].
    pub async fn delete_all_recipes(&self) -> Result<usize, AppError> {
        let recipes = self.list_recipes().await?;
        let count = recipes.len();
        self.batch_delete(&recipes, collections::RECIPES, |recipe: &Recipe| {
            recipe.id.to_string()
        })
        .await?;

        tracing::debug!(count, "Deleted all recipes");
        Ok(count)
    }
}
