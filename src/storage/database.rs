// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! Embedded database: open/table layout, accounts, quota ledger, role table.
//!
//! Accounts are stored as JSON values keyed by their UUID, with a secondary
//! email index for sign-in resolution. The quota ledger operations here are
//! the only writers of `wash_balance` outside the settlement transaction.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::config::INITIAL_WASH_BALANCE;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: account_id → serialized Account (JSON bytes).
pub(crate) const ACCOUNTS: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

/// Index: email → account_id.
pub(crate) const ACCOUNT_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("account_emails");

/// Role table: admission_no → role name ("admin"|"member").
///
/// Consulted on every privileged call; absence means member.
pub(crate) const ROLES: TableDefinition<&str, &str> = TableDefinition::new("roles");

/// Map: account_id → open basket_id. One open basket per account.
pub(crate) const ACCOUNT_BASKETS: TableDefinition<&str, &str> =
    TableDefinition::new("account_baskets");

/// Basket rows: basket_id → owning account_id.
pub(crate) const BASKETS: TableDefinition<&str, &str> = TableDefinition::new("baskets");

/// Line items: item_id → serialized BasketItem (JSON bytes).
pub(crate) const BASKET_ITEMS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("basket_items");

/// Orders: order_id → serialized Order (JSON bytes).
pub(crate) const ORDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Index: composite key (!timestamp_be | order_id) → order_id.
/// The inverted timestamp yields newest-first ordering on forward scans.
pub(crate) const ORDER_TIME_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("order_time_index");

/// Index: basket_id → order_id of the order referencing that basket slot.
/// Used to supersede a stale order when its basket is settled again.
pub(crate) const ORDER_BASKET_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("order_basket_index");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("email domain not allowed: {0}")]
    DomainRejected(String),

    #[error("basket has no items")]
    EmptyBasket,

    #[error("insufficient wash units: need {required}, have {available}")]
    InsufficientQuota { required: u32, available: u32 },

    #[error("resource does not belong to the calling account: {0}")]
    NotOwner(String),

    #[error("invalid line item: {0}")]
    InvalidItem(String),
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Account
// =============================================================================

/// A member account, created on first successful sign-in.
///
/// `wash_balance` is the remaining wash-unit quota for the current period.
/// Accounts are never deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Account {
    /// Unique account identifier (UUID).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Institutional email address.
    pub email: String,
    /// External admission identifier, used for role lookup.
    pub admission_no: String,
    /// Remaining wash-unit quota.
    pub wash_balance: u32,
    /// Informational subscription flag.
    pub subscribed: bool,
    /// Avatar URL from the identity provider, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Split a display name of the form `"Full Name | AP23110010483"` into name
/// and admission number. Falls back to the email local part when the name
/// carries no pipe-delimited second field.
fn parse_admission(display_name: &str, email: &str) -> (String, String) {
    let parts: Vec<&str> = display_name.split('|').map(str::trim).collect();
    if parts.len() > 1 && !parts[1].is_empty() {
        (parts[0].to_string(), parts[1].to_string())
    } else {
        let local = email.split('@').next().unwrap_or_default();
        (display_name.trim().to_string(), local.to_string())
    }
}

// =============================================================================
// WashDatabase
// =============================================================================

/// Embedded ACID database holding all Washline state.
pub struct WashDatabase {
    pub(crate) db: Database,
}

impl WashDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS)?;
            let _ = write_txn.open_table(ACCOUNT_EMAILS)?;
            let _ = write_txn.open_table(ROLES)?;
            let _ = write_txn.open_table(ACCOUNT_BASKETS)?;
            let _ = write_txn.open_table(BASKETS)?;
            let _ = write_txn.open_table(BASKET_ITEMS)?;
            let _ = write_txn.open_table(ORDERS)?;
            let _ = write_txn.open_table(ORDER_TIME_INDEX)?;
            let _ = write_txn.open_table(ORDER_BASKET_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Cheap readiness check: can the store open a read transaction.
    pub fn ping(&self) -> DbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(ACCOUNTS)?;
        Ok(())
    }

    // =========================================================================
    // Identity resolution
    // =========================================================================

    /// Resolve an external identity claim to an account, creating the account
    /// on first sight of a qualifying email.
    ///
    /// The email must end with `allowed_domain`; anything else fails with
    /// [`DbError::DomainRejected`] and no account is created. New accounts
    /// start with [`INITIAL_WASH_BALANCE`] wash units.
    pub fn resolve_identity(
        &self,
        email: &str,
        display_name: &str,
        avatar_url: Option<&str>,
        allowed_domain: &str,
    ) -> DbResult<Account> {
        if !email.ends_with(allowed_domain) {
            return Err(DbError::DomainRejected(email.to_string()));
        }

        if let Some(existing) = self.get_account_by_email(email)? {
            return Ok(existing);
        }

        let (name, admission_no) = parse_admission(display_name, email);
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email: email.to_string(),
            admission_no,
            wash_balance: INITIAL_WASH_BALANCE,
            subscribed: false,
            avatar_url: avatar_url.map(str::to_string),
            created_at: Utc::now(),
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut emails = write_txn.open_table(ACCOUNT_EMAILS)?;

            // Another request may have created the account between our read
            // and this write transaction; the email index is authoritative.
            let existing_id = emails.get(email)?.map(|g| g.value().to_string());
            if let Some(id) = existing_id {
                let accounts = write_txn.open_table(ACCOUNTS)?;
                let bytes = accounts
                    .get(id.as_str())?
                    .ok_or_else(|| DbError::AccountNotFound(id.clone()))?
                    .value()
                    .to_vec();
                drop(accounts);
                drop(emails);
                write_txn.commit()?;
                return Ok(serde_json::from_slice(&bytes)?);
            }

            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let json = serde_json::to_vec(&account)?;
            accounts.insert(account.id.as_str(), json.as_slice())?;
            emails.insert(email, account.id.as_str())?;
        }
        write_txn.commit()?;

        tracing::info!(
            account_id = %account.id,
            admission_no = %account.admission_no,
            "created account on first sign-in"
        );
        Ok(account)
    }

    // =========================================================================
    // Account reads
    // =========================================================================

    /// Look up a single account by id.
    pub fn get_account(&self, account_id: &str) -> DbResult<Account> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS)?;
        match table.get(account_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(DbError::AccountNotFound(account_id.to_string())),
        }
    }

    /// Look up an account by email, if it exists.
    pub fn get_account_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(ACCOUNT_EMAILS)?;
        let account_id = match emails.get(email)? {
            Some(v) => v.value().to_string(),
            None => return Ok(None),
        };
        let accounts = read_txn.open_table(ACCOUNTS)?;
        match accounts.get(account_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List all accounts, ordered by id.
    pub fn list_accounts(&self) -> DbResult<Vec<Account>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS)?;
        let mut accounts = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            accounts.push(serde_json::from_slice(value.value())?);
        }
        Ok(accounts)
    }

    // =========================================================================
    // Quota ledger
    // =========================================================================

    /// Atomically decrement an account's wash balance.
    ///
    /// Fails with [`DbError::InsufficientQuota`] when `amount` exceeds the
    /// current balance; no partial debit occurs.
    pub fn debit_quota(&self, account_id: &str, amount: u32) -> DbResult<Account> {
        self.mutate_account(account_id, |account| {
            if amount > account.wash_balance {
                return Err(DbError::InsufficientQuota {
                    required: amount,
                    available: account.wash_balance,
                });
            }
            account.wash_balance -= amount;
            Ok(())
        })
    }

    /// Atomically increment an account's wash balance.
    ///
    /// No upper bound is enforced; administrators may exceed the nominal
    /// per-period quota intentionally.
    pub fn credit_quota(&self, account_id: &str, delta: u32) -> DbResult<Account> {
        self.mutate_account(account_id, |account| {
            account.wash_balance = account.wash_balance.saturating_add(delta);
            Ok(())
        })
    }

    /// Credit every account by `delta`.
    ///
    /// Each account's update is an independent transaction; a failure part
    /// way through leaves earlier accounts updated. Returns the number of
    /// accounts updated.
    pub fn credit_all_quotas(&self, delta: u32) -> DbResult<usize> {
        let mut updated = 0;
        for account in self.list_accounts()? {
            match self.credit_quota(&account.id, delta) {
                Ok(_) => updated += 1,
                Err(e) => {
                    tracing::warn!(account_id = %account.id, error = %e, "credit skipped");
                }
            }
        }
        Ok(updated)
    }

    /// Set every account's wash balance to exactly `value`.
    ///
    /// Absolute-set semantics: a debit racing the reset may be overwritten,
    /// which is accepted at period boundaries. Returns the number of
    /// accounts updated.
    pub fn reset_all_quotas(&self, value: u32) -> DbResult<usize> {
        let mut updated = 0;
        for account in self.list_accounts()? {
            let result = self.mutate_account(&account.id, |acc| {
                acc.wash_balance = value;
                Ok(())
            });
            match result {
                Ok(_) => updated += 1,
                Err(e) => {
                    tracing::warn!(account_id = %account.id, error = %e, "reset skipped");
                }
            }
        }
        Ok(updated)
    }

    /// Toggle the informational subscription flag.
    pub fn toggle_subscription(&self, account_id: &str) -> DbResult<Account> {
        self.mutate_account(account_id, |account| {
            account.subscribed = !account.subscribed;
            Ok(())
        })
    }

    /// Read-modify-write a single account in one write transaction.
    fn mutate_account<F>(&self, account_id: &str, mutate: F) -> DbResult<Account>
    where
        F: FnOnce(&mut Account) -> DbResult<()>,
    {
        let write_txn = self.db.begin_write()?;
        let account = {
            let mut table = write_txn.open_table(ACCOUNTS)?;

            let existing_bytes = {
                let existing = table
                    .get(account_id)?
                    .ok_or_else(|| DbError::AccountNotFound(account_id.to_string()))?;
                existing.value().to_vec()
            };

            let mut account: Account = serde_json::from_slice(&existing_bytes)?;
            mutate(&mut account)?;

            let json = serde_json::to_vec(&account)?;
            table.insert(account_id, json.as_slice())?;
            account
        };
        write_txn.commit()?;
        Ok(account)
    }

    // =========================================================================
    // Role table
    // =========================================================================

    /// Role for an admission number; absent entries are members.
    ///
    /// Looked up on every privileged call rather than cached in the session,
    /// so role changes take effect immediately.
    pub fn role_for_admission(&self, admission_no: &str) -> DbResult<Role> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ROLES)?;
        match table.get(admission_no)? {
            Some(v) => Ok(Role::from_str(v.value()).unwrap_or(Role::Member)),
            None => Ok(Role::Member),
        }
    }

    /// Assign a role to an admission number.
    pub fn assign_role(&self, admission_no: &str, role: Role) -> DbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ROLES)?;
            table.insert(admission_no, role.to_string().as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (WashDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = WashDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn resolve_test_account(db: &WashDatabase, email: &str, name: &str) -> Account {
        db.resolve_identity(email, name, None, "@srmap.edu.in")
            .unwrap()
    }

    #[test]
    fn resolve_creates_account_with_initial_balance() {
        let (db, _dir) = temp_db();
        let account = resolve_test_account(&db, "ravi@srmap.edu.in", "Ravi Kumar | AP23110010001");

        assert_eq!(account.wash_balance, INITIAL_WASH_BALANCE);
        assert_eq!(account.name, "Ravi Kumar");
        assert_eq!(account.admission_no, "AP23110010001");
        assert!(!account.subscribed);
    }

    #[test]
    fn resolve_rejects_foreign_domain() {
        let (db, _dir) = temp_db();
        let result = db.resolve_identity("mallory@gmail.com", "Mallory", None, "@srmap.edu.in");
        assert!(matches!(result, Err(DbError::DomainRejected(_))));

        // No account was created
        assert!(db.get_account_by_email("mallory@gmail.com").unwrap().is_none());
    }

    #[test]
    fn resolve_falls_back_to_email_local_part() {
        let (db, _dir) = temp_db();
        let account = resolve_test_account(&db, "ap23110010002@srmap.edu.in", "Priya S");
        assert_eq!(account.admission_no, "ap23110010002");
        assert_eq!(account.name, "Priya S");
    }

    #[test]
    fn resolve_is_idempotent_for_known_email() {
        let (db, _dir) = temp_db();
        let first = resolve_test_account(&db, "ravi@srmap.edu.in", "Ravi | AP1");
        let second = resolve_test_account(&db, "ravi@srmap.edu.in", "Ravi Renamed | AP9");

        assert_eq!(first.id, second.id);
        assert_eq!(second.admission_no, "AP1");
        assert_eq!(db.list_accounts().unwrap().len(), 1);
    }

    #[test]
    fn debit_and_credit_adjust_balance() {
        let (db, _dir) = temp_db();
        let account = resolve_test_account(&db, "a@srmap.edu.in", "A | AP1");

        let after_debit = db.debit_quota(&account.id, 15).unwrap();
        assert_eq!(after_debit.wash_balance, 25);

        let after_credit = db.credit_quota(&account.id, 5).unwrap();
        assert_eq!(after_credit.wash_balance, 30);
    }

    #[test]
    fn debit_beyond_balance_fails_without_change() {
        let (db, _dir) = temp_db();
        let account = resolve_test_account(&db, "a@srmap.edu.in", "A | AP1");

        let result = db.debit_quota(&account.id, INITIAL_WASH_BALANCE + 1);
        assert!(matches!(
            result,
            Err(DbError::InsufficientQuota { required: 41, available: 40 })
        ));
        assert_eq!(
            db.get_account(&account.id).unwrap().wash_balance,
            INITIAL_WASH_BALANCE
        );
    }

    #[test]
    fn debit_to_exactly_zero_succeeds() {
        let (db, _dir) = temp_db();
        let account = resolve_test_account(&db, "a@srmap.edu.in", "A | AP1");
        let after = db.debit_quota(&account.id, INITIAL_WASH_BALANCE).unwrap();
        assert_eq!(after.wash_balance, 0);
    }

    #[test]
    fn credit_all_adds_to_every_account() {
        let (db, _dir) = temp_db();
        let a = resolve_test_account(&db, "a@srmap.edu.in", "A | AP1");
        let b = resolve_test_account(&db, "b@srmap.edu.in", "B | AP2");
        db.debit_quota(&b.id, 10).unwrap();

        let updated = db.credit_all_quotas(10).unwrap();
        assert_eq!(updated, 2);
        assert_eq!(db.get_account(&a.id).unwrap().wash_balance, 50);
        assert_eq!(db.get_account(&b.id).unwrap().wash_balance, 40);
    }

    #[test]
    fn reset_all_sets_absolute_value() {
        let (db, _dir) = temp_db();
        let a = resolve_test_account(&db, "a@srmap.edu.in", "A | AP1");
        let b = resolve_test_account(&db, "b@srmap.edu.in", "B | AP2");
        db.debit_quota(&a.id, 33).unwrap();
        db.credit_quota(&b.id, 60).unwrap();

        let updated = db.reset_all_quotas(40).unwrap();
        assert_eq!(updated, 2);
        assert_eq!(db.get_account(&a.id).unwrap().wash_balance, 40);
        assert_eq!(db.get_account(&b.id).unwrap().wash_balance, 40);
    }

    #[test]
    fn toggle_subscription_flips_flag() {
        let (db, _dir) = temp_db();
        let account = resolve_test_account(&db, "a@srmap.edu.in", "A | AP1");

        let on = db.toggle_subscription(&account.id).unwrap();
        assert!(on.subscribed);
        let off = db.toggle_subscription(&account.id).unwrap();
        assert!(!off.subscribed);
    }

    #[test]
    fn role_defaults_to_member_and_is_assignable() {
        let (db, _dir) = temp_db();
        assert_eq!(db.role_for_admission("AP1").unwrap(), Role::Member);

        db.assign_role("AP1", Role::Admin).unwrap();
        assert_eq!(db.role_for_admission("AP1").unwrap(), Role::Admin);

        db.assign_role("AP1", Role::Member).unwrap();
        assert_eq!(db.role_for_admission("AP1").unwrap(), Role::Member);
    }

    #[test]
    fn parse_admission_handles_pipe_and_fallback() {
        let (name, adm) = parse_admission("Ravi Kumar | AP23110010483", "r@srmap.edu.in");
        assert_eq!(name, "Ravi Kumar");
        assert_eq!(adm, "AP23110010483");

        let (name, adm) = parse_admission("Priya", "priya.x@srmap.edu.in");
        assert_eq!(name, "Priya");
        assert_eq!(adm, "priya.x");
    }

    #[test]
    fn unknown_account_is_not_found() {
        let (db, _dir) = temp_db();
        assert!(matches!(
            db.get_account("missing"),
            Err(DbError::AccountNotFound(_))
        ));
        assert!(matches!(
            db.credit_quota("missing", 1),
            Err(DbError::AccountNotFound(_))
        ));
    }
}
