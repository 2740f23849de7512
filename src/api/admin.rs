// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! Operator endpoints. Every handler here takes [`AdminOnly`], which
//! re-reads the role table, so revocations bite on the next request.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::AdminOnly,
    error::ApiError,
    models::{
        AccountListResponse, AdjustQuotaRequest, BulkQuotaRequest, BulkQuotaResponse,
        OrdersByStatus, ResetQuotaRequest, SetRoleRequest, StatsResponse,
    },
    state::AppState,
    storage::{Account, OrderStatus},
};

use crate::config::INITIAL_WASH_BALANCE;

/// Every account in the system.
#[utoipa::path(
    get,
    path = "/v1/admin/accounts",
    tag = "Admin",
    responses(
        (status = 200, body = AccountListResponse),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    AdminOnly(_user): AdminOnly,
) -> Result<Json<AccountListResponse>, ApiError> {
    let accounts = state.db.list_accounts()?;
    Ok(Json(AccountListResponse { accounts }))
}

/// Adjust a single account's wash-unit balance by a signed delta.
///
/// A debit that would take the balance below zero is rejected and leaves the
/// balance untouched.
#[utoipa::path(
    post,
    path = "/v1/admin/accounts/{account_id}/quota",
    params(
        ("account_id" = String, Path, description = "Identifier of the account")
    ),
    request_body = AdjustQuotaRequest,
    tag = "Admin",
    responses(
        (status = 200, body = Account),
        (status = 404, description = "No such account"),
        (status = 422, description = "Debit exceeds current balance")
    )
)]
pub async fn adjust_quota(
    Path(account_id): Path<String>,
    State(state): State<AppState>,
    AdminOnly(user): AdminOnly,
    Json(request): Json<AdjustQuotaRequest>,
) -> Result<Json<Account>, ApiError> {
    let magnitude = u32::try_from(request.delta.unsigned_abs())
        .map_err(|_| ApiError::bad_request("quota delta out of range"))?;

    let account = if request.delta >= 0 {
        state.db.credit_quota(&account_id, magnitude)?
    } else {
        state.db.debit_quota(&account_id, magnitude)?
    };

    tracing::info!(
        admin = %user.admission_no,
        account_id = %account_id,
        delta = request.delta,
        balance = account.wash_balance,
        "quota adjusted"
    );
    Ok(Json(account))
}

/// Credit every account's balance by a fixed amount.
///
/// Applied account by account; a failure on one account is logged and
/// skipped rather than rolling back the rest.
#[utoipa::path(
    post,
    path = "/v1/admin/quotas/credit-all",
    request_body = BulkQuotaRequest,
    tag = "Admin",
    responses(
        (status = 200, body = BulkQuotaResponse),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn credit_all(
    State(state): State<AppState>,
    AdminOnly(user): AdminOnly,
    Json(request): Json<BulkQuotaRequest>,
) -> Result<Json<BulkQuotaResponse>, ApiError> {
    let updated = state.db.credit_all_quotas(request.amount)?;
    tracing::info!(
        admin = %user.admission_no,
        amount = request.amount,
        updated,
        "bulk quota credit"
    );
    Ok(Json(BulkQuotaResponse { updated }))
}

/// Reset every account's balance to an absolute value (the semester
/// allowance unless the request says otherwise).
#[utoipa::path(
    post,
    path = "/v1/admin/quotas/reset-all",
    request_body = ResetQuotaRequest,
    tag = "Admin",
    responses(
        (status = 200, body = BulkQuotaResponse),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn reset_all(
    State(state): State<AppState>,
    AdminOnly(user): AdminOnly,
    Json(request): Json<ResetQuotaRequest>,
) -> Result<Json<BulkQuotaResponse>, ApiError> {
    let value = request.value.unwrap_or(INITIAL_WASH_BALANCE);
    let updated = state.db.reset_all_quotas(value)?;
    tracing::info!(
        admin = %user.admission_no,
        value,
        updated,
        "bulk quota reset"
    );
    Ok(Json(BulkQuotaResponse { updated }))
}

/// Assign a role to an admission number.
///
/// Keyed by admission number rather than account id so a role can be staged
/// before the person's first sign-in.
#[utoipa::path(
    put,
    path = "/v1/admin/accounts/{admission_no}/role",
    params(
        ("admission_no" = String, Path, description = "Admission number the role table is keyed by")
    ),
    request_body = SetRoleRequest,
    tag = "Admin",
    responses(
        (status = 204),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn set_role(
    Path(admission_no): Path<String>,
    State(state): State<AppState>,
    AdminOnly(user): AdminOnly,
    Json(request): Json<SetRoleRequest>,
) -> Result<StatusCode, ApiError> {
    state.db.assign_role(&admission_no, request.role)?;
    tracing::info!(
        admin = %user.admission_no,
        admission_no = %admission_no,
        role = %request.role,
        "role assigned"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Aggregate counters for the operator dashboard.
#[utoipa::path(
    get,
    path = "/v1/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, body = StatsResponse),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    AdminOnly(_user): AdminOnly,
) -> Result<Json<StatsResponse>, ApiError> {
    let accounts = state.db.list_accounts()?;
    let orders = state.db.list_all_orders()?;

    let mut by_status = OrdersByStatus::default();
    let mut total_weight_kg = 0.0;
    let mut wash_units_spent: u64 = 0;
    for order in &orders {
        match order.status {
            OrderStatus::NotInitiated => by_status.not_initiated += 1,
            OrderStatus::Placed => by_status.placed += 1,
            OrderStatus::Processing => by_status.processing += 1,
            OrderStatus::Ready => by_status.ready += 1,
            OrderStatus::Delivered => by_status.delivered += 1,
        }
        total_weight_kg += order.total_weight_kg;
        wash_units_spent += u64::from(order.cost);
    }

    Ok(Json(StatsResponse {
        accounts: accounts.len(),
        orders: orders.len(),
        orders_by_status: by_status,
        total_weight_kg,
        wash_units_spent,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::storage::{DropOffLocation, ItemCategory, WashDatabase};
    use tempfile::TempDir;

    fn create_test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = WashDatabase::open(&temp_dir.path().join("test.redb"))
            .expect("Failed to open database");
        (AppState::new(db), temp_dir)
    }

    fn authed_user(state: &AppState, email: &str, name: &str, role: Role) -> AuthenticatedUser {
        let account = state
            .db
            .resolve_identity(email, name, None, "@srmap.edu.in")
            .unwrap();
        AuthenticatedUser {
            account_id: account.id,
            admission_no: account.admission_no,
            email: account.email,
            role,
        }
    }

    #[tokio::test]
    async fn adjust_quota_credits_and_debits() {
        let (state, _temp_dir) = create_test_state();
        let admin = authed_user(&state, "op@srmap.edu.in", "Op | AP9", Role::Admin);
        let member = authed_user(&state, "ravi@srmap.edu.in", "Ravi | AP1", Role::Member);

        let Json(account) = adjust_quota(
            Path(member.account_id.clone()),
            State(state.clone()),
            AdminOnly(admin.clone()),
            Json(AdjustQuotaRequest { delta: 5 }),
        )
        .await
        .unwrap();
        assert_eq!(account.wash_balance, 45);

        let Json(account) = adjust_quota(
            Path(member.account_id.clone()),
            State(state.clone()),
            AdminOnly(admin.clone()),
            Json(AdjustQuotaRequest { delta: -45 }),
        )
        .await
        .unwrap();
        assert_eq!(account.wash_balance, 0);

        // Going below zero is rejected
        let err = adjust_quota(
            Path(member.account_id),
            State(state),
            AdminOnly(admin),
            Json(AdjustQuotaRequest { delta: -1 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn bulk_operations_touch_every_account() {
        let (state, _temp_dir) = create_test_state();
        let admin = authed_user(&state, "op@srmap.edu.in", "Op | AP9", Role::Admin);
        authed_user(&state, "a@srmap.edu.in", "A | AP1", Role::Member);
        authed_user(&state, "b@srmap.edu.in", "B | AP2", Role::Member);

        let Json(response) = credit_all(
            State(state.clone()),
            AdminOnly(admin.clone()),
            Json(BulkQuotaRequest { amount: 3 }),
        )
        .await
        .unwrap();
        assert_eq!(response.updated, 3); // admin included

        let Json(response) = reset_all(
            State(state.clone()),
            AdminOnly(admin),
            Json(ResetQuotaRequest { value: None }),
        )
        .await
        .unwrap();
        assert_eq!(response.updated, 3);

        for account in state.db.list_accounts().unwrap() {
            assert_eq!(account.wash_balance, INITIAL_WASH_BALANCE);
        }
    }

    #[tokio::test]
    async fn set_role_updates_role_table() {
        let (state, _temp_dir) = create_test_state();
        let admin = authed_user(&state, "op@srmap.edu.in", "Op | AP9", Role::Admin);

        let status = set_role(
            Path("AP42".to_string()),
            State(state.clone()),
            AdminOnly(admin),
            Json(SetRoleRequest { role: Role::Admin }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.db.role_for_admission("AP42").unwrap(), Role::Admin);
    }

    #[tokio::test]
    async fn stats_aggregate_orders() {
        let (state, _temp_dir) = create_test_state();
        let admin = authed_user(&state, "op@srmap.edu.in", "Op | AP9", Role::Admin);
        let member = authed_user(&state, "ravi@srmap.edu.in", "Ravi | AP1", Role::Member);

        let item = state
            .db
            .add_item(&member.account_id, ItemCategory::BedSheet, 1.1, 2)
            .unwrap();
        state
            .db
            .settle_order(
                &member.account_id,
                &item.basket_id,
                DropOffLocation::KrishnaTowerBasement,
            )
            .unwrap();

        let Json(stats) = stats(State(state), AdminOnly(admin)).await.unwrap();
        assert_eq!(stats.accounts, 2);
        assert_eq!(stats.orders, 1);
        assert_eq!(stats.orders_by_status.placed, 1);
        assert_eq!(stats.wash_units_spent, 3); // ceil(2.2)
        assert!((stats.total_weight_kg - 2.2).abs() < 1e-9);
    }
}
