// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! Shared application state.

use std::sync::Arc;

use crate::config::DEFAULT_ALLOWED_DOMAIN;
use crate::storage::WashDatabase;

/// Authentication configuration.
///
/// With a secret configured, bearer tokens are verified with HS256. Without
/// one the server runs in development mode and only checks token structure.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 verification secret (`AUTH_SECRET`). `None` means dev mode.
    pub secret: Option<String>,
    /// Institutional email suffix accepted at sign-in.
    pub allowed_domain: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            allowed_domain: DEFAULT_ALLOWED_DOMAIN.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<WashDatabase>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(db: WashDatabase) -> Self {
        Self {
            db: Arc::new(db),
            auth: AuthConfig::default(),
        }
    }

    pub fn with_auth_config(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }
}
