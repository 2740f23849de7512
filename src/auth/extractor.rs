// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! Axum extractors for authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::{AuthError, AuthenticatedUser, IdentityClaim};
use crate::state::{AppState, AuthConfig};
use crate::storage::DbError;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Extractor for authenticated callers.
///
/// Verifies the bearer token, enforces the institutional email domain, and
/// resolves the claim to an internal account (creating it on first sight).
///
/// ## Authentication Modes
///
/// - **Production mode** (`AUTH_SECRET` set): HS256 signature verification
/// - **Development mode** (no secret): structure validation only
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        // Extract Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let claim = verify_token(token, &state.auth)?;

        // Resolve the claim to an account; this is where the domain
        // allow-list is enforced and new accounts are created.
        let account = state
            .db
            .resolve_identity(
                &claim.email,
                &claim.name,
                claim.picture.as_deref(),
                &state.auth.allowed_domain,
            )
            .map_err(|e| match e {
                DbError::DomainRejected(email) => AuthError::DomainRejected(email),
                other => AuthError::InternalError(other.to_string()),
            })?;

        let role = state
            .db
            .role_for_admission(&account.admission_no)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        Ok(Auth(AuthenticatedUser {
            account_id: account.id,
            admission_no: account.admission_no,
            email: account.email,
            role,
        }))
    }
}

/// Extractor that requires the admin role.
///
/// The role is re-read from the role table here, on every privileged call,
/// so a revoked admin loses access on their next request.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(mut user) = Auth::from_request_parts(parts, state).await?;

        user.role = state
            .db
            .role_for_admission(&user.admission_no)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

/// Verify the bearer token and extract the identity claim.
fn verify_token(token: &str, auth: &AuthConfig) -> Result<IdentityClaim, AuthError> {
    if let Some(ref secret) = auth.secret {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        let token_data = decode::<IdentityClaim>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::MalformedToken,
        })?;

        Ok(token_data.claims)
    } else {
        verify_token_development(token)
    }
}

/// Development token verification (no signature check).
///
/// WARNING: This should only be used in development environments.
fn verify_token_development(token: &str) -> Result<IdentityClaim, AuthError> {
    // Use the dangerous decode API to skip signature verification
    let token_data = jsonwebtoken::dangerous::insecure_decode::<IdentityClaim>(token)
        .map_err(|_e| AuthError::MalformedToken)?;

    let claims = token_data.claims;

    // Check expiration manually
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    if claims.exp > 0 && claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}
