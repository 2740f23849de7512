// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! Identity claims and the authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims carried by the bearer token issued after identity-provider sign-in.
///
/// Only the identity claim itself is consumed here: email, display name, and
/// avatar URL. Account creation and role derivation happen server-side in
/// the storage layer; nothing in the token is trusted for authorization.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaim {
    /// Subject (provider-side user identifier, unused for authorization)
    #[serde(default)]
    #[allow(dead_code)]
    pub sub: String,

    /// Institutional email address
    pub email: String,

    /// Display name; may embed a pipe-delimited admission number
    /// (`"Full Name | AP23110010483"`)
    #[serde(default)]
    pub name: String,

    /// Avatar URL from the identity provider
    #[serde(default)]
    pub picture: Option<String>,

    /// Issued at timestamp
    #[serde(default)]
    #[allow(dead_code)]
    pub iat: i64,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: i64,

    /// Issuer
    #[serde(default)]
    #[allow(dead_code)]
    pub iss: String,
}

/// Authenticated caller after identity resolution.
///
/// The role is looked up from the role table for every request; holding an
/// `AuthenticatedUser` means the lookup already happened for this call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Internal account identifier.
    pub account_id: String,
    /// Admission number the role table is keyed by.
    pub admission_no: String,
    /// Institutional email.
    pub email: String,
    /// Role resolved for this request.
    pub role: Role,
}

impl AuthenticatedUser {
    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Check if the user has the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }
}
