// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

use axum::{extract::State, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::ProfileResponse,
    state::AppState,
};

/// The caller's own profile.
///
/// Authentication already resolved the identity claim to an account, so a
/// first-time caller sees their freshly created account here.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Accounts",
    responses(
        (status = 200, body = ProfileResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Email outside the allowed domain")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = state.db.get_account(&user.account_id)?;
    Ok(Json(ProfileResponse {
        account,
        role: user.role,
    }))
}

/// Toggle the caller's subscription flag.
#[utoipa::path(
    post,
    path = "/v1/me/subscription",
    tag = "Accounts",
    responses(
        (status = 200, body = ProfileResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn toggle_subscription(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = state.db.toggle_subscription(&user.account_id)?;
    Ok(Json(ProfileResponse {
        account,
        role: user.role,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::storage::WashDatabase;
    use tempfile::TempDir;

    fn create_test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = WashDatabase::open(&temp_dir.path().join("test.redb"))
            .expect("Failed to open database");
        (AppState::new(db), temp_dir)
    }

    fn authed_user(state: &AppState, email: &str, name: &str) -> AuthenticatedUser {
        let account = state
            .db
            .resolve_identity(email, name, None, "@srmap.edu.in")
            .unwrap();
        AuthenticatedUser {
            account_id: account.id,
            admission_no: account.admission_no,
            email: account.email,
            role: Role::Member,
        }
    }

    #[tokio::test]
    async fn get_me_returns_account_and_role() {
        let (state, _temp_dir) = create_test_state();
        let user = authed_user(&state, "ravi@srmap.edu.in", "Ravi | AP1");

        let Json(profile) = get_me(State(state), Auth(user)).await.unwrap();
        assert_eq!(profile.account.admission_no, "AP1");
        assert_eq!(profile.account.wash_balance, 40);
        assert_eq!(profile.role, Role::Member);
    }

    #[tokio::test]
    async fn toggle_subscription_flips_flag() {
        let (state, _temp_dir) = create_test_state();
        let user = authed_user(&state, "ravi@srmap.edu.in", "Ravi | AP1");

        let Json(profile) = toggle_subscription(State(state.clone()), Auth(user.clone()))
            .await
            .unwrap();
        assert!(profile.account.subscribed);

        let Json(profile) = toggle_subscription(State(state), Auth(user)).await.unwrap();
        assert!(!profile.account.subscribed);
    }
}
