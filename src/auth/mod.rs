// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! # Authentication Module
//!
//! Identity resolution and authorization for the Washline API.
//!
//! ## Flow
//!
//! 1. The frontend authenticates the member with the institutional identity
//!    provider and sends `Authorization: Bearer <token>`.
//! 2. The token carries the identity claim: email, display name, avatar URL.
//! 3. The [`Auth`] extractor verifies the token, enforces the institutional
//!    email domain, and resolves (or creates) the internal account.
//! 4. The caller's role is looked up in the role table on every request,
//!    never cached in the session, so role changes take effect immediately.
//!
//! [`AdminOnly`] wraps [`Auth`] and additionally requires the admin role.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod roles;

pub use claims::{AuthenticatedUser, IdentityClaim};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use roles::Role;
