// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token compatibility tests.
//!
//! These tests verify that tokens issued at login/registration can be
//! decoded by the auth middleware, catching compatibility issues early.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use recipebook::middleware::auth::{issue_token, Claims};
use uuid::Uuid;

/// Validation settings mirroring the middleware: signature only, no expiry
/// claim. If the middleware's settings drift from this, these tests fail.
fn token_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims = Default::default();
    validation
}

#[test]
fn test_token_roundtrip() {
    let signing_key = b"test_signing_key_32_bytes_long!!";
    let user_id = Uuid::new_v4();

    let token = issue_token(user_id, signing_key).unwrap();

    let key = DecodingKey::from_secret(signing_key);
    let token_data = decode::<Claims>(&token, &key, &token_validation())
        .expect("Failed to decode token - check Claims struct compatibility");

    assert_eq!(token_data.claims.sub, user_id.to_string());
    assert!(token_data.claims.iat > 0);
}

#[test]
fn test_token_sub_parses_as_uuid() {
    let signing_key = b"test_signing_key_32_bytes_long!!";
    let user_id = Uuid::new_v4();

    let token = issue_token(user_id, signing_key).unwrap();

    let key = DecodingKey::from_secret(signing_key);
    let token_data = decode::<Claims>(&token, &key, &token_validation()).unwrap();

    let parsed: Uuid = token_data
        .claims
        .sub
        .parse()
        .expect("sub claim should be parseable as a UUID");

    assert_eq!(parsed, user_id);
}

#[test]
fn test_token_has_no_expiry_claim() {
    // Tokens are revoked through the user's token list, never by time.
    // A decoder that demands `exp` must still accept them with expiry
    // validation disabled, and the raw claims must not contain one.
    let signing_key = b"test_signing_key_32_bytes_long!!";
    let token = issue_token(Uuid::new_v4(), signing_key).unwrap();

    let key = DecodingKey::from_secret(signing_key);
    let token_data =
        decode::<serde_json::Value>(&token, &key, &token_validation()).unwrap();

    assert!(token_data.claims.get("exp").is_none());
}

#[test]
fn test_token_rejected_with_wrong_key() {
    let token = issue_token(Uuid::new_v4(), b"test_signing_key_32_bytes_long!!").unwrap();

    let key = DecodingKey::from_secret(b"a_different_signing_key_entirely");
    assert!(decode::<Claims>(&token, &key, &token_validation()).is_err());
}
