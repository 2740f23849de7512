// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! # Storage Module
//!
//! Embedded ACID database backed by redb (pure Rust). All domain state lives
//! here: accounts with their wash-unit balances, open baskets with line
//! items, orders, and the role table consulted on privileged calls.
//!
//! ## Table Layout
//!
//! ```text
//! accounts            account_id → Account (JSON)
//! account_emails      email → account_id
//! roles               admission_no → role name
//! account_baskets     account_id → open basket_id (one open basket per account)
//! baskets             basket_id → owning account_id
//! basket_items        item_id → BasketItem (JSON, carries basket_id)
//! orders              order_id → Order (JSON)
//! order_time_index    (!timestamp_be | order_id) → order_id (newest-first scans)
//! order_basket_index  basket_id → order_id (settlement retry supersession)
//! ```
//!
//! The order settlement in [`settlement`] is the only multi-table mutation;
//! it runs as a single write transaction. redb serializes writers, so
//! concurrent settlements of the same basket cannot interleave.

pub mod baskets;
pub mod database;
pub mod settlement;

pub use baskets::{Basket, BasketItem, ItemCategory};
pub use database::{Account, DbError, DbResult, WashDatabase};
pub use settlement::{wash_units_for_weight, DropOffLocation, Order, OrderLine, OrderStatus};
