// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! Washline - Quota-Backed Laundry Order Service
//!
//! Members of a closed campus community assemble baskets of laundry items and
//! settle them into orders, paying out of a fixed per-period quota of wash
//! units. A small set of administrators tracks orders and adjusts quotas.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Identity claims, roles, and authorization extractors
//! - `storage` - Embedded ACID database (redb) for accounts, baskets, and orders

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
