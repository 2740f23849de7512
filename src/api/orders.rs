// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    models::{OrderListResponse, SetOrderStatusRequest, SettleOrderRequest},
    state::AppState,
    storage::Order,
};

/// Settle the caller's basket into an order.
///
/// This is the only multi-step mutation in the service: it supersedes any
/// prior order on the basket, empties the basket into an order snapshot,
/// hands the caller a fresh basket, and debits the wash-unit ledger, all in
/// one transaction.
#[utoipa::path(
    post,
    path = "/v1/orders",
    request_body = SettleOrderRequest,
    tag = "Orders",
    responses(
        (status = 201, body = Order),
        (status = 403, description = "Basket belongs to another account"),
        (status = 422, description = "Basket empty, already settled, or quota insufficient")
    )
)]
pub async fn settle_order(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<SettleOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .db
        .settle_order(&user.account_id, &request.basket_id, request.location)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List orders, newest first.
///
/// Members see their own orders; admins see every order in the system.
#[utoipa::path(
    get,
    path = "/v1/orders",
    tag = "Orders",
    responses(
        (status = 200, body = OrderListResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<OrderListResponse>, ApiError> {
    let orders = if user.is_admin() {
        state.db.list_all_orders()?
    } else {
        state.db.list_orders_for_account(&user.account_id)?
    };
    Ok(Json(OrderListResponse { orders }))
}

/// Move an order to a new status. Operator-only; any transition is allowed,
/// including backwards ones, so a mis-click can be undone.
#[utoipa::path(
    put,
    path = "/v1/orders/{order_id}/status",
    params(
        ("order_id" = String, Path, description = "Identifier of the order")
    ),
    request_body = SetOrderStatusRequest,
    tag = "Orders",
    responses(
        (status = 200, body = Order),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No such order")
    )
)]
pub async fn set_order_status(
    Path(order_id): Path<String>,
    State(state): State<AppState>,
    AdminOnly(_user): AdminOnly,
    Json(request): Json<SetOrderStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state.db.set_order_status(&order_id, request.status)?;
    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::storage::{DropOffLocation, ItemCategory, OrderStatus, WashDatabase};
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

    fn fill_basket(state: &AppState, user: &AuthenticatedUser) -> String {
        state
            .db
            .add_item(&user.account_id, ItemCategory::Jeans, 0.7, 2)
            .unwrap()
            .basket_id
    }

    #[tokio::test]
    async fn settle_order_debits_and_returns_order() {
        let (state, _temp_dir) = create_test_state();
        let user = authed_user(&state, "ravi@srmap.edu.in", "Ravi | AP1", Role::Member);
        let basket_id = fill_basket(&state, &user);

        let (status, Json(order)) = settle_order(
            State(state.clone()),
            Auth(user.clone()),
            Json(SettleOrderRequest {
                basket_id,
                location: DropOffLocation::KrishnaTowerBasement,
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.cost, 2); // ceil(1.4)

        let account = state.db.get_account(&user.account_id).unwrap();
        assert_eq!(account.wash_balance, 38);
    }

    #[tokio::test]
    async fn settling_an_empty_basket_is_rejected() {
        let (state, _temp_dir) = create_test_state();
        let user = authed_user(&state, "ravi@srmap.edu.in", "Ravi | AP1", Role::Member);
        let basket = state.db.basket_for_account(&user.account_id).unwrap();

        let err = settle_order(
            State(state),
            Auth(user),
            Json(SettleOrderRequest {
                basket_id: basket.id,
                location: DropOffLocation::VedhavathiTowerBasement,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn members_see_only_their_orders() {
        let (state, _temp_dir) = create_test_state();
        let alice = authed_user(&state, "alice@srmap.edu.in", "Alice | AP1", Role::Member);
        let bob = authed_user(&state, "bob@srmap.edu.in", "Bob | AP2", Role::Member);

        for user in [&alice, &bob] {
            let basket_id = fill_basket(&state, user);
            state
                .db
                .settle_order(
                    &user.account_id,
                    &basket_id,
                    DropOffLocation::KrishnaTowerBasement,
                )
                .unwrap();
        }

        let Json(response) = list_orders(State(state.clone()), Auth(alice.clone()))
            .await
            .unwrap();
        assert_eq!(response.orders.len(), 1);
        assert_eq!(response.orders[0].account_id, alice.account_id);

        // An admin sees both
        let admin = authed_user(&state, "op@srmap.edu.in", "Op | AP9", Role::Admin);
        let Json(response) = list_orders(State(state), Auth(admin)).await.unwrap();
        assert_eq!(response.orders.len(), 2);
    }

    #[tokio::test]
    async fn status_updates_round_trip() {
        let (state, _temp_dir) = create_test_state();
        let user = authed_user(&state, "ravi@srmap.edu.in", "Ravi | AP1", Role::Member);
        let admin = authed_user(&state, "op@srmap.edu.in", "Op | AP9", Role::Admin);
        let basket_id = fill_basket(&state, &user);
        let order = state
            .db
            .settle_order(
                &user.account_id,
                &basket_id,
                DropOffLocation::KrishnaTowerBasement,
            )
            .unwrap();

        let Json(updated) = set_order_status(
            Path(order.id.clone()),
            State(state.clone()),
            AdminOnly(admin.clone()),
            Json(SetOrderStatusRequest {
                status: OrderStatus::Ready,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, OrderStatus::Ready);

        // Backwards transitions are allowed
        let Json(updated) = set_order_status(
            Path(order.id),
            State(state),
            AdminOnly(admin),
            Json(SetOrderStatusRequest {
                status: OrderStatus::Processing,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn unknown_order_is_404() {
        let (state, _temp_dir) = create_test_state();
        let admin = authed_user(&state, "op@srmap.edu.in", "Op | AP9", Role::Admin);

        let err = set_order_status(
            Path("no-such-order".to_string()),
            State(state),
            AdminOnly(admin),
            Json(SetOrderStatusRequest {
                status: OrderStatus::Delivered,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
