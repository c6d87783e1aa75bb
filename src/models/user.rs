// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access tier controlling recipe visibility and update authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

/// User account stored in Firestore.
///
/// The document ID is the UUID's string form. This struct holds the
/// credential material; it must never be serialized into a response body
/// directly — use [`User::safe`] for anything that leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Account ID (also used as document ID)
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Email address, stored lowercase; unique across accounts
    pub email: String,
    /// Access tier; never settable by clients
    #[serde(default)]
    pub role: Role,
    /// Argon2 PHC-string hash of the password
    pub password_hash: String,
    /// Currently-valid session tokens (one per device/session)
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Saved recipe IDs; never contains duplicates
    #[serde(default)]
    pub bookmarks: Vec<Uuid>,
    /// When the account was created (RFC 3339)
    pub created_at: String,
}

impl User {
    /// Public-safe projection: everything except the credential material.
    pub fn safe(&self) -> SafeUser {
        SafeUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            bookmarks: self.bookmarks.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// User representation sent over the wire: no password hash, no tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub bookmarks: Vec<Uuid>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            email: "test@test.com".to_string(),
            role: Role::User,
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$hash".to_string(),
            tokens: vec!["token-one".to_string()],
            bookmarks: vec![],
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_safe_projection_strips_credentials() {
        let user = sample_user();
        let json = serde_json::to_value(user.safe()).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("tokens").is_none());
        assert_eq!(json["name"], "test");
        assert_eq!(json["email"], "test@test.com");
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");

        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert!(role.is_admin());
    }

    #[test]
    fn test_role_defaults_to_user() {
        // A stored document without a role field deserializes as `user`.
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "name": "n",
            "email": "n@test.com",
            "passwordHash": "x",
            "createdAt": "2026-01-01T00:00:00Z",
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user.role, Role::User);
        assert!(user.tokens.is_empty());
        assert!(user.bookmarks.is_empty());
    }
}
