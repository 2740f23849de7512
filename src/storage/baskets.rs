// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! Basket store: the mutable pre-order collection of line items.
//!
//! Each account has at most one open basket, created lazily on first access.
//! Every mutating operation verifies that the target basket or item belongs
//! to the calling account; basket and item identifiers are not secrets.

use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::database::{
    DbError, DbResult, WashDatabase, ACCOUNTS, ACCOUNT_BASKETS, BASKETS, BASKET_ITEMS,
};

// =============================================================================
// Types
// =============================================================================

/// Fixed set of laundry item categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ItemCategory {
    Jeans,
    Shirt,
    Tshirt,
    TrackPants,
    BedSheet,
    Towel,
    Other,
}

/// A single line item in an open basket.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BasketItem {
    /// Unique item identifier (UUID).
    pub id: String,
    /// The basket this item belongs to.
    pub basket_id: String,
    /// Laundry item category.
    pub category: ItemCategory,
    /// Weight per piece in kilograms (positive).
    pub weight_kg: f64,
    /// Number of pieces (positive).
    pub quantity: u32,
}

/// An account's open basket with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Basket {
    /// Unique basket identifier (UUID).
    pub id: String,
    /// Owning account.
    pub account_id: String,
    /// Current line items.
    pub items: Vec<BasketItem>,
}

impl Basket {
    /// Total weight of the basket in kilograms.
    pub fn total_weight_kg(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.weight_kg * item.quantity as f64)
            .sum()
    }
}

fn validate_line(weight_kg: f64, quantity: u32) -> DbResult<()> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(DbError::InvalidItem(format!(
            "weight must be a positive number of kilograms, got {weight_kg}"
        )));
    }
    if quantity == 0 {
        return Err(DbError::InvalidItem("quantity must be at least 1".into()));
    }
    Ok(())
}

/// Collect all items belonging to a basket.
pub(crate) fn collect_items(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    basket_id: &str,
) -> DbResult<Vec<BasketItem>> {
    let mut items = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        let item: BasketItem = serde_json::from_slice(value.value())?;
        if item.basket_id == basket_id {
            items.push(item);
        }
    }
    Ok(items)
}

// =============================================================================
// Basket operations
// =============================================================================

impl WashDatabase {
    /// Return the account's open basket, creating an empty one if none exists.
    pub fn basket_for_account(&self, account_id: &str) -> DbResult<Basket> {
        {
            let read_txn = self.db.begin_read()?;
            let account_baskets = read_txn.open_table(ACCOUNT_BASKETS)?;
            let basket_id = account_baskets.get(account_id)?.map(|g| g.value().to_string());
            if let Some(basket_id) = basket_id {
                let items_table = read_txn.open_table(BASKET_ITEMS)?;
                let items = collect_items(&items_table, &basket_id)?;
                return Ok(Basket {
                    id: basket_id,
                    account_id: account_id.to_string(),
                    items,
                });
            }
        }

        self.create_basket(account_id)
    }

    /// Create a fresh empty basket for the account.
    ///
    /// If another request created one between our read and this write
    /// transaction, that basket wins and is returned instead.
    fn create_basket(&self, account_id: &str) -> DbResult<Basket> {
        let write_txn = self.db.begin_write()?;
        let basket = {
            let accounts = write_txn.open_table(ACCOUNTS)?;
            if accounts.get(account_id)?.is_none() {
                return Err(DbError::AccountNotFound(account_id.to_string()));
            }
            drop(accounts);

            let mut account_baskets = write_txn.open_table(ACCOUNT_BASKETS)?;
            let existing = account_baskets.get(account_id)?.map(|g| g.value().to_string());
            if let Some(basket_id) = existing {
                let items_table = write_txn.open_table(BASKET_ITEMS)?;
                let items = collect_items(&items_table, &basket_id)?;
                Basket {
                    id: basket_id,
                    account_id: account_id.to_string(),
                    items,
                }
            } else {
                let basket_id = uuid::Uuid::new_v4().to_string();
                let mut baskets = write_txn.open_table(BASKETS)?;
                baskets.insert(basket_id.as_str(), account_id)?;
                account_baskets.insert(account_id, basket_id.as_str())?;
                Basket {
                    id: basket_id,
                    account_id: account_id.to_string(),
                    items: Vec::new(),
                }
            }
        };
        write_txn.commit()?;
        Ok(basket)
    }

    /// Add a line item to the calling account's open basket, creating the
    /// basket first when none exists.
    pub fn add_item(
        &self,
        account_id: &str,
        category: ItemCategory,
        weight_kg: f64,
        quantity: u32,
    ) -> DbResult<BasketItem> {
        validate_line(weight_kg, quantity)?;

        let basket = self.basket_for_account(account_id)?;

        let item = BasketItem {
            id: uuid::Uuid::new_v4().to_string(),
            basket_id: basket.id,
            category,
            weight_kg,
            quantity,
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut items_table = write_txn.open_table(BASKET_ITEMS)?;
            let json = serde_json::to_vec(&item)?;
            items_table.insert(item.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(item)
    }

    /// Remove a line item. Fails with [`DbError::NotOwner`] when the item's
    /// basket does not belong to the calling account.
    pub fn remove_item(&self, account_id: &str, item_id: &str) -> DbResult<BasketItem> {
        let write_txn = self.db.begin_write()?;
        let item = {
            let mut items_table = write_txn.open_table(BASKET_ITEMS)?;
            let bytes = {
                let existing = items_table
                    .get(item_id)?
                    .ok_or_else(|| DbError::NotFound(format!("Item {item_id}")))?;
                existing.value().to_vec()
            };
            let item: BasketItem = serde_json::from_slice(&bytes)?;

            let baskets = write_txn.open_table(BASKETS)?;
            verify_basket_owner(&baskets, &item.basket_id, account_id)?;
            drop(baskets);

            items_table.remove(item_id)?;
            item
        };
        write_txn.commit()?;
        Ok(item)
    }

    /// Change the quantity of a line item, scoped by basket ownership.
    pub fn update_item_quantity(
        &self,
        account_id: &str,
        item_id: &str,
        quantity: u32,
    ) -> DbResult<BasketItem> {
        if quantity == 0 {
            return Err(DbError::InvalidItem("quantity must be at least 1".into()));
        }

        let write_txn = self.db.begin_write()?;
        let item = {
            let mut items_table = write_txn.open_table(BASKET_ITEMS)?;
            let bytes = {
                let existing = items_table
                    .get(item_id)?
                    .ok_or_else(|| DbError::NotFound(format!("Item {item_id}")))?;
                existing.value().to_vec()
            };
            let mut item: BasketItem = serde_json::from_slice(&bytes)?;

            let baskets = write_txn.open_table(BASKETS)?;
            verify_basket_owner(&baskets, &item.basket_id, account_id)?;
            drop(baskets);

            item.quantity = quantity;
            let json = serde_json::to_vec(&item)?;
            items_table.insert(item_id, json.as_slice())?;
            item
        };
        write_txn.commit()?;
        Ok(item)
    }

    /// Remove every line item from a basket, leaving the basket itself open.
    pub fn clear_basket(&self, account_id: &str, basket_id: &str) -> DbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let baskets = write_txn.open_table(BASKETS)?;
            verify_basket_owner(&baskets, basket_id, account_id)?;
            drop(baskets);

            let mut items_table = write_txn.open_table(BASKET_ITEMS)?;
            let item_ids: Vec<String> = collect_items(&items_table, basket_id)?
                .into_iter()
                .map(|item| item.id)
                .collect();
            for id in &item_ids {
                items_table.remove(id.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Ownership check shared by all basket mutations.
fn verify_basket_owner(
    baskets: &impl ReadableTable<&'static str, &'static str>,
    basket_id: &str,
    account_id: &str,
) -> DbResult<()> {
    match baskets.get(basket_id)? {
        Some(owner) if owner.value() == account_id => Ok(()),
        Some(_) => Err(DbError::NotOwner(format!("Basket {basket_id}"))),
        None => Err(DbError::NotFound(format!("Basket {basket_id}"))),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Account;

    fn temp_db() -> (WashDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = WashDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn account(db: &WashDatabase, email: &str) -> Account {
        db.resolve_identity(email, "Test | AP1", None, "@srmap.edu.in")
            .unwrap()
    }

    #[test]
    fn basket_is_created_lazily_and_reused() {
        let (db, _dir) = temp_db();
        let acc = account(&db, "a@srmap.edu.in");

        let first = db.basket_for_account(&acc.id).unwrap();
        assert!(first.items.is_empty());

        let second = db.basket_for_account(&acc.id).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn basket_requires_existing_account() {
        let (db, _dir) = temp_db();
        assert!(matches!(
            db.basket_for_account("ghost"),
            Err(DbError::AccountNotFound(_))
        ));
    }

    #[test]
    fn add_item_lands_in_open_basket() {
        let (db, _dir) = temp_db();
        let acc = account(&db, "a@srmap.edu.in");

        let item = db.add_item(&acc.id, ItemCategory::Shirt, 0.5, 3).unwrap();
        assert_eq!(item.quantity, 3);

        let basket = db.basket_for_account(&acc.id).unwrap();
        assert_eq!(basket.id, item.basket_id);
        assert_eq!(basket.items.len(), 1);
        assert!((basket.total_weight_kg() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn add_item_rejects_invalid_lines() {
        let (db, _dir) = temp_db();
        let acc = account(&db, "a@srmap.edu.in");

        assert!(matches!(
            db.add_item(&acc.id, ItemCategory::Jeans, 0.0, 1),
            Err(DbError::InvalidItem(_))
        ));
        assert!(matches!(
            db.add_item(&acc.id, ItemCategory::Jeans, -1.2, 1),
            Err(DbError::InvalidItem(_))
        ));
        assert!(matches!(
            db.add_item(&acc.id, ItemCategory::Jeans, 1.2, 0),
            Err(DbError::InvalidItem(_))
        ));
    }

    #[test]
    fn remove_and_update_are_scoped_to_owner() {
        let (db, _dir) = temp_db();
        let alice = account(&db, "alice@srmap.edu.in");
        let bob = db
            .resolve_identity("bob@srmap.edu.in", "Bob | AP2", None, "@srmap.edu.in")
            .unwrap();

        let item = db.add_item(&alice.id, ItemCategory::Towel, 0.8, 4).unwrap();

        // Bob may not touch Alice's items
        assert!(matches!(
            db.remove_item(&bob.id, &item.id),
            Err(DbError::NotOwner(_))
        ));
        assert!(matches!(
            db.update_item_quantity(&bob.id, &item.id, 1),
            Err(DbError::NotOwner(_))
        ));

        let updated = db.update_item_quantity(&alice.id, &item.id, 2).unwrap();
        assert_eq!(updated.quantity, 2);

        let removed = db.remove_item(&alice.id, &item.id).unwrap();
        assert_eq!(removed.id, item.id);
        assert!(db.basket_for_account(&alice.id).unwrap().items.is_empty());
    }

    #[test]
    fn missing_item_is_not_found() {
        let (db, _dir) = temp_db();
        let acc = account(&db, "a@srmap.edu.in");
        assert!(matches!(
            db.remove_item(&acc.id, "nope"),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn clear_basket_removes_all_items() {
        let (db, _dir) = temp_db();
        let acc = account(&db, "a@srmap.edu.in");
        db.add_item(&acc.id, ItemCategory::Shirt, 0.5, 3).unwrap();
        db.add_item(&acc.id, ItemCategory::Jeans, 1.2, 2).unwrap();

        let basket = db.basket_for_account(&acc.id).unwrap();
        db.clear_basket(&acc.id, &basket.id).unwrap();

        let after = db.basket_for_account(&acc.id).unwrap();
        assert_eq!(after.id, basket.id);
        assert!(after.items.is_empty());
    }

    #[test]
    fn clear_basket_checks_ownership() {
        let (db, _dir) = temp_db();
        let alice = account(&db, "alice@srmap.edu.in");
        let bob = db
            .resolve_identity("bob@srmap.edu.in", "Bob | AP2", None, "@srmap.edu.in")
            .unwrap();
        let basket = db.basket_for_account(&alice.id).unwrap();

        assert!(matches!(
            db.clear_basket(&bob.id, &basket.id),
            Err(DbError::NotOwner(_))
        ));
    }
}
