// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! Order settlement and lifecycle.
//!
//! Settlement converts a basket into an order while debiting the wash-unit
//! ledger, all inside a single write transaction. The settled basket is
//! destroyed and replaced by a fresh empty one rather than cleared in place,
//! so a stale basket reference can never be reused after settlement.
//!
//! redb allows one writer at a time, which serializes concurrent settlement
//! attempts: the loser re-reads state and finds the basket already replaced.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::baskets::{collect_items, ItemCategory};
use super::database::{
    Account, DbError, DbResult, WashDatabase, ACCOUNTS, ACCOUNT_BASKETS, BASKETS, BASKET_ITEMS,
    ORDERS, ORDER_BASKET_INDEX, ORDER_TIME_INDEX,
};

// =============================================================================
// Types
// =============================================================================

/// Order status lifecycle.
///
/// Orders are created in `Placed`. `Processing` and `Ready` are reserved
/// in-process states: no current transition produces them, but administrators
/// may set them. The transition graph is deliberately unrestricted for
/// privileged callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    NotInitiated,
    Placed,
    Processing,
    Ready,
    Delivered,
}

/// Fixed set of drop-off points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DropOffLocation {
    KrishnaTowerBasement,
    VedhavathiTowerBasement,
}

/// Immutable snapshot of one settled line item.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct OrderLine {
    pub category: ItemCategory,
    pub weight_kg: f64,
    pub quantity: u32,
}

/// A confirmed service order.
///
/// `basket_id` points at the fresh basket slot created by the settlement
/// that produced this order; `items` captures what was actually ordered.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Order {
    /// Unique order identifier (UUID).
    pub id: String,
    /// Owning account.
    pub account_id: String,
    /// The basket slot this order references.
    pub basket_id: String,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Chosen drop-off point.
    pub location: DropOffLocation,
    /// Snapshot of the settled line items.
    pub items: Vec<OrderLine>,
    /// Total settled weight in kilograms.
    pub total_weight_kg: f64,
    /// Wash units debited for this order.
    pub cost: u32,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last modified (status changes).
    pub updated_at: DateTime<Utc>,
}

/// Wash units required for a given total weight: fractional kilograms round
/// up, so a partial kilogram still consumes a full unit.
pub fn wash_units_for_weight(total_weight_kg: f64) -> u32 {
    total_weight_kg.ceil() as u32
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Composite key for the order time index: `!timestamp_be | order_id`.
///
/// The inverted timestamp ensures newest-first ordering on forward scans.
fn make_order_key(timestamp: i64, order_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 1 + order_id.len());
    key.extend_from_slice(&(!timestamp as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(order_id.as_bytes());
    key
}

// =============================================================================
// Settlement
// =============================================================================

impl WashDatabase {
    /// Settle a basket into an order, debiting the quota ledger.
    ///
    /// Runs as a single all-or-nothing write transaction:
    /// 1. fails with [`DbError::EmptyBasket`] when the basket has no items
    ///    (or was already replaced by a concurrent settlement);
    /// 2. computes `cost = ceil(total weight)`;
    /// 3. fails with [`DbError::InsufficientQuota`] when the balance cannot
    ///    cover the cost, leaving basket and balance untouched;
    /// 4. supersedes any prior order still pointing at this basket, deletes
    ///    the basket and its items, creates a fresh empty basket, creates
    ///    the order in `Placed`, and debits the ledger by `cost`.
    ///
    /// Any failure aborts the whole transaction; no partial state is visible.
    pub fn settle_order(
        &self,
        account_id: &str,
        basket_id: &str,
        location: DropOffLocation,
    ) -> DbResult<Order> {
        let write_txn = self.db.begin_write()?;
        match settle_in_txn(&write_txn, account_id, basket_id, location) {
            Ok(order) => {
                write_txn.commit()?;
                tracing::info!(
                    order_id = %order.id,
                    account_id = %order.account_id,
                    cost = order.cost,
                    "order settled"
                );
                Ok(order)
            }
            Err(e) => {
                let _ = write_txn.abort();
                Err(e)
            }
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Look up a single order by id.
    pub fn get_order(&self, order_id: &str) -> DbResult<Order> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS)?;
        match table.get(order_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(DbError::NotFound(format!("Order {order_id}"))),
        }
    }

    /// Set an order's status. Privileged callers only (enforced at the API
    /// layer); any status may be set to any other, including backward.
    pub fn set_order_status(&self, order_id: &str, status: OrderStatus) -> DbResult<Order> {
        let write_txn = self.db.begin_write()?;
        let order = {
            let mut table = write_txn.open_table(ORDERS)?;

            let existing_bytes = {
                let existing = table
                    .get(order_id)?
                    .ok_or_else(|| DbError::NotFound(format!("Order {order_id}")))?;
                existing.value().to_vec()
            };

            let mut order: Order = serde_json::from_slice(&existing_bytes)?;
            order.status = status;
            order.updated_at = Utc::now();

            let json = serde_json::to_vec(&order)?;
            table.insert(order_id, json.as_slice())?;
            order
        };
        write_txn.commit()?;
        Ok(order)
    }

    /// All orders across all accounts, newest first. Admin view.
    pub fn list_all_orders(&self) -> DbResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDER_TIME_INDEX)?;
        let orders_table = read_txn.open_table(ORDERS)?;

        let mut orders = Vec::new();
        for entry in index.iter()? {
            let (_, order_id) = entry?;
            if let Some(value) = orders_table.get(order_id.value())? {
                orders.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(orders)
    }

    /// Orders owned by one account, newest first.
    pub fn list_orders_for_account(&self, account_id: &str) -> DbResult<Vec<Order>> {
        let all = self.list_all_orders()?;
        Ok(all
            .into_iter()
            .filter(|order| order.account_id == account_id)
            .collect())
    }
}

/// The settlement body, executed against an open write transaction.
///
/// The caller commits on `Ok` and aborts on `Err`; nothing here is visible
/// until the commit succeeds.
fn settle_in_txn(
    txn: &WriteTransaction,
    account_id: &str,
    basket_id: &str,
    location: DropOffLocation,
) -> DbResult<Order> {
    let mut baskets = txn.open_table(BASKETS)?;

    // A missing basket row means the basket was already replaced (the most
    // recent settlement won) or never existed; either way there is nothing
    // to settle.
    let owner = match baskets.get(basket_id)? {
        Some(guard) => guard.value().to_string(),
        None => return Err(DbError::EmptyBasket),
    };
    if owner != account_id {
        return Err(DbError::NotOwner(format!("Basket {basket_id}")));
    }

    let mut items_table = txn.open_table(BASKET_ITEMS)?;
    let items = collect_items(&items_table, basket_id)?;
    if items.is_empty() {
        return Err(DbError::EmptyBasket);
    }

    let mut accounts = txn.open_table(ACCOUNTS)?;
    let account_bytes = {
        let existing = accounts
            .get(account_id)?
            .ok_or_else(|| DbError::AccountNotFound(account_id.to_string()))?;
        existing.value().to_vec()
    };
    let mut account: Account = serde_json::from_slice(&account_bytes)?;

    let total_weight_kg: f64 = items
        .iter()
        .map(|item| item.weight_kg * item.quantity as f64)
        .sum();
    let cost = wash_units_for_weight(total_weight_kg);

    if cost > account.wash_balance {
        return Err(DbError::InsufficientQuota {
            required: cost,
            available: account.wash_balance,
        });
    }

    let mut orders_table = txn.open_table(ORDERS)?;
    let mut time_index = txn.open_table(ORDER_TIME_INDEX)?;
    let mut basket_index = txn.open_table(ORDER_BASKET_INDEX)?;

    // Supersede any prior order still pointing at this basket. This handles
    // the retried-settlement edge case where a stale order/basket pairing
    // was left behind.
    let superseded = basket_index.get(basket_id)?.map(|g| g.value().to_string());
    if let Some(prev_order_id) = superseded {
        let prev_bytes = orders_table
            .get(prev_order_id.as_str())?
            .map(|g| g.value().to_vec());
        if let Some(bytes) = prev_bytes {
            let prev: Order = serde_json::from_slice(&bytes)?;
            let key = make_order_key(prev.created_at.timestamp(), &prev.id);
            time_index.remove(key.as_slice())?;
            orders_table.remove(prev_order_id.as_str())?;
        }
        basket_index.remove(basket_id)?;
        tracing::warn!(
            order_id = %prev_order_id,
            basket_id = %basket_id,
            "superseded stale order during settlement"
        );
    }

    // Destroy the settled basket and its items, then hand the account a
    // fresh empty basket for the next order.
    for item in &items {
        items_table.remove(item.id.as_str())?;
    }
    baskets.remove(basket_id)?;

    let new_basket_id = uuid::Uuid::new_v4().to_string();
    baskets.insert(new_basket_id.as_str(), account_id)?;
    let mut account_baskets = txn.open_table(ACCOUNT_BASKETS)?;
    account_baskets.insert(account_id, new_basket_id.as_str())?;

    let now = Utc::now();
    let order = Order {
        id: uuid::Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        basket_id: new_basket_id,
        status: OrderStatus::Placed,
        location,
        items: items
            .iter()
            .map(|item| OrderLine {
                category: item.category,
                weight_kg: item.weight_kg,
                quantity: item.quantity,
            })
            .collect(),
        total_weight_kg,
        cost,
        created_at: now,
        updated_at: now,
    };

    let json = serde_json::to_vec(&order)?;
    orders_table.insert(order.id.as_str(), json.as_slice())?;
    let key = make_order_key(now.timestamp(), &order.id);
    time_index.insert(key.as_slice(), order.id.as_str())?;
    basket_index.insert(order.basket_id.as_str(), order.id.as_str())?;

    // The debit: exactly the computed cost, exactly once per basket.
    account.wash_balance -= cost;
    let account_json = serde_json::to_vec(&account)?;
    accounts.insert(account_id, account_json.as_slice())?;

    Ok(order)
}

// =============================================================================
// Tests
// =============================================================================
