// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! Request and response bodies for the HTTP API.
//!
//! Domain types (`Account`, `Basket`, `Order`) serialize directly; the types
//! here exist where the wire shape differs from storage, or where a request
//! body needs its own schema.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::storage::{
    wash_units_for_weight, Account, Basket, BasketItem, DropOffLocation, ItemCategory, Order,
    OrderStatus,
};

// ============================================================
// Profile
// ============================================================

/// The caller's account together with their resolved role.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub account: Account,
    pub role: Role,
}

// ============================================================
// Baskets
// ============================================================

/// Body for `POST /v1/basket/items`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub category: ItemCategory,
    /// Per-unit weight in kilograms. Must be finite and positive.
    pub weight_kg: f64,
    /// Number of units; defaults to 1.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Body for `PUT /v1/basket/items/{item_id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// A basket with the derived totals the client renders.
#[derive(Debug, Serialize, ToSchema)]
pub struct BasketResponse {
    pub basket_id: String,
    pub items: Vec<BasketItem>,
    pub total_weight_kg: f64,
    /// Wash units this basket would cost if settled now.
    pub estimated_cost: u32,
}

impl From<Basket> for BasketResponse {
    fn from(basket: Basket) -> Self {
        let total_weight_kg = basket.total_weight_kg();
        Self {
            basket_id: basket.id,
            items: basket.items,
            total_weight_kg,
            estimated_cost: wash_units_for_weight(total_weight_kg),
        }
    }
}

// ============================================================
// Orders
// ============================================================

/// Body for `POST /v1/orders`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SettleOrderRequest {
    /// The basket being settled. Must be the caller's current basket.
    pub basket_id: String,
    pub location: DropOffLocation,
}

/// Body for `PUT /v1/orders/{order_id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
}

// ============================================================
// Admin
// ============================================================

/// Body for `POST /v1/admin/accounts/{account_id}/quota`.
///
/// Positive deltas credit, negative deltas debit. A debit below zero is
/// rejected by the storage layer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustQuotaRequest {
    pub delta: i64,
}

/// Body for `POST /v1/admin/quotas/credit-all`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkQuotaRequest {
    pub amount: u32,
}

/// Body for `POST /v1/admin/quotas/reset-all`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetQuotaRequest {
    /// Balance every account is reset to; defaults to the standard
    /// semester allowance.
    pub value: Option<u32>,
}

/// Body for `PUT /v1/admin/accounts/{admission_no}/role`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountListResponse {
    pub accounts: Vec<Account>,
}

/// Number of accounts a bulk quota operation touched.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkQuotaResponse {
    pub updated: usize,
}

/// Aggregate service counters for the admin dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub accounts: usize,
    pub orders: usize,
    pub orders_by_status: OrdersByStatus,
    pub total_weight_kg: f64,
    pub wash_units_spent: u64,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct OrdersByStatus {
    pub not_initiated: usize,
    pub placed: usize,
    pub processing: usize,
    pub ready: usize,
    pub delivered: usize,
}
