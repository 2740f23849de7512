// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{AddItemRequest, BasketResponse, UpdateQuantityRequest},
    state::AppState,
    storage::BasketItem,
};

/// The caller's open basket, created on first access.
#[utoipa::path(
    get,
    path = "/v1/basket",
    tag = "Baskets",
    responses(
        (status = 200, body = BasketResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_basket(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<BasketResponse>, ApiError> {
    let basket = state.db.basket_for_account(&user.account_id)?;
    Ok(Json(basket.into()))
}

/// Add a line item to the caller's basket.
#[utoipa::path(
    post,
    path = "/v1/basket/items",
    request_body = AddItemRequest,
    tag = "Baskets",
    responses(
        (status = 201, body = BasketItem),
        (status = 400, description = "Non-finite weight or zero quantity")
    )
)]
pub async fn add_item(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<BasketItem>), ApiError> {
    let item = state.db.add_item(
        &user.account_id,
        request.category,
        request.weight_kg,
        request.quantity,
    )?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Change the quantity of a line item in the caller's basket.
#[utoipa::path(
    put,
    path = "/v1/basket/items/{item_id}",
    params(
        ("item_id" = String, Path, description = "Identifier of the line item")
    ),
    request_body = UpdateQuantityRequest,
    tag = "Baskets",
    responses(
        (status = 200, body = BasketItem),
        (status = 403, description = "Item belongs to another account"),
        (status = 404, description = "No such item")
    )
)]
pub async fn update_item(
    Path(item_id): Path<String>,
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<BasketItem>, ApiError> {
    let item = state
        .db
        .update_item_quantity(&user.account_id, &item_id, request.quantity)?;
    Ok(Json(item))
}

/// Remove a single line item from the caller's basket.
#[utoipa::path(
    delete,
    path = "/v1/basket/items/{item_id}",
    params(
        ("item_id" = String, Path, description = "Identifier of the line item")
    ),
    tag = "Baskets",
    responses(
        (status = 204),
        (status = 403, description = "Item belongs to another account"),
        (status = 404, description = "No such item")
    )
)]
pub async fn remove_item(
    Path(item_id): Path<String>,
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<StatusCode, ApiError> {
    state.db.remove_item(&user.account_id, &item_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Empty the caller's basket without placing an order.
#[utoipa::path(
    delete,
    path = "/v1/basket/items",
    tag = "Baskets",
    responses(
        (status = 204),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn clear_basket(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<StatusCode, ApiError> {
    let basket = state.db.basket_for_account(&user.account_id)?;
    state.db.clear_basket(&user.account_id, &basket.id)?;
    Ok(StatusCode::NO_CONTENT)
}
