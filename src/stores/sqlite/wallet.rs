//! Implements a SQLite backed wallet store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{DatabaseID, Wallet, WalletBuilder, WalletPatch},
    stores::WalletStore,
};

/// Stores wallets in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteWalletStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteWalletStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl WalletStore for SQLiteWalletStore {
    /// Create a new wallet in the database.
    ///
    /// New wallets always start with a zero balance and zero totals.
    ///
    /// # Errors
    /// Returns an [Error::Storage] if there is an SQL error.
    fn create(&mut self, builder: WalletBuilder) -> Result<Wallet, Error> {
        let wallet = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "INSERT INTO wallet (name, amount, total_income, total_expenses, image_url, created, user_id)
                 VALUES (?1, 0, 0, 0, ?2, ?3, ?4)
                 RETURNING id, name, amount, total_income, total_expenses, image_url, created, user_id",
            )?
            .query_row(
                (
                    &builder.name,
                    &builder.image_url,
                    builder.created,
                    builder.user_id.as_i64(),
                ),
                Self::map_row,
            )?;

        Ok(wallet)
    }

    /// Retrieve a wallet in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::WalletNotFound] if `id` does not refer to a valid wallet,
    /// - or [Error::Storage] if there is some other SQL error.
    fn get(&self, id: DatabaseID) -> Result<Wallet, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, name, amount, total_income, total_expenses, image_url, created, user_id
                 FROM wallet WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::WalletNotFound,
                error => error.into(),
            })
    }

    /// Overlay `patch` onto the stored wallet.
    ///
    /// Only the columns present in the patch are written; unspecified
    /// columns keep their stored value.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::WalletNotFound] if `id` does not refer to a valid wallet,
    /// - or [Error::Storage] if there is some other SQL error.
    fn patch(&mut self, id: DatabaseID, patch: WalletPatch) -> Result<(), Error> {
        if patch.is_empty() {
            // Still surface a missing wallet on an empty patch.
            self.get(id)?;
            return Ok(());
        }

        let mut set_clauses = vec![];
        let mut query_parameters = vec![];

        if let Some(name) = patch.name {
            query_parameters.push(Value::Text(name));
            set_clauses.push(format!("name = ?{}", query_parameters.len()));
        }

        if let Some(image_url) = patch.image_url {
            query_parameters.push(Value::Text(image_url));
            set_clauses.push(format!("image_url = ?{}", query_parameters.len()));
        }

        if let Some(amount) = patch.amount {
            query_parameters.push(Value::Real(amount));
            set_clauses.push(format!("amount = ?{}", query_parameters.len()));
        }

        if let Some(total_income) = patch.total_income {
            query_parameters.push(Value::Real(total_income));
            set_clauses.push(format!("total_income = ?{}", query_parameters.len()));
        }

        if let Some(total_expenses) = patch.total_expenses {
            query_parameters.push(Value::Real(total_expenses));
            set_clauses.push(format!("total_expenses = ?{}", query_parameters.len()));
        }

        query_parameters.push(Value::Integer(id));
        let query_string = format!(
            "UPDATE wallet SET {} WHERE id = ?{}",
            set_clauses.join(", "),
            query_parameters.len()
        );

        let rows_updated = self
            .connection
            .lock()
            .unwrap()
            .execute(&query_string, params_from_iter(query_parameters.iter()))?;

        if rows_updated == 0 {
            return Err(Error::WalletNotFound);
        }

        Ok(())
    }

    /// Delete a wallet in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::WalletNotFound] if `id` does not refer to a valid wallet,
    /// - or [Error::Storage] if there is some other SQL error.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error> {
        let rows_deleted = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM wallet WHERE id = ?1", [id])?;

        if rows_deleted == 0 {
            return Err(Error::WalletNotFound);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteWalletStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS wallet (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    amount REAL NOT NULL,
                    total_income REAL NOT NULL,
                    total_expenses REAL NOT NULL,
                    image_url TEXT,
                    created TEXT NOT NULL,
                    user_id INTEGER NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteWalletStore {
    type ReturnType = Wallet;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Wallet {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            amount: row.get(offset + 2)?,
            total_income: row.get(offset + 3)?,
            total_expenses: row.get(offset + 4)?,
            image_url: row.get(offset + 5)?,
            created: row.get(offset + 6)?,
            user_id: crate::models::UserId::new(row.get(offset + 7)?),
        })
    }
}

#[cfg(test)]
mod sqlite_wallet_store_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        models::{TransactionKind, UserId, Wallet, WalletPatch},
        stores::{WalletStore, sqlite::create_stores},
    };

    use super::SQLiteWalletStore;

    fn get_store() -> SQLiteWalletStore {
        let conn = Connection::open_in_memory().unwrap();
        let (wallet_store, _) = create_stores(conn).unwrap();
        wallet_store
    }

    #[test]
    fn create_starts_with_zeroed_totals() {
        let mut store = get_store();

        let wallet = store
            .create(Wallet::build("Savings", UserId::new(1)))
            .unwrap();

        assert!(wallet.id > 0);
        assert_eq!(wallet.name, "Savings");
        assert_eq!(wallet.amount, 0.0);
        assert_eq!(wallet.total_income, 0.0);
        assert_eq!(wallet.total_expenses, 0.0);
        assert_eq!(wallet.user_id, UserId::new(1));
    }

    #[test]
    fn get_returns_created_wallet() {
        let mut store = get_store();
        let wallet = store
            .create(Wallet::build("Cash", UserId::new(1)).image_url(Some("https://example.com/icon.png".to_string())))
            .unwrap();

        let selected_wallet = store.get(wallet.id).unwrap();

        assert_eq!(wallet, selected_wallet);
    }

    #[test]
    fn get_fails_on_invalid_id() {
        let mut store = get_store();
        let wallet = store.create(Wallet::build("Cash", UserId::new(1))).unwrap();

        let maybe_wallet = store.get(wallet.id + 321);

        assert_eq!(maybe_wallet, Err(Error::WalletNotFound));
    }

    #[test]
    fn patch_overlays_only_supplied_fields() {
        let mut store = get_store();
        let wallet = store.create(Wallet::build("Cash", UserId::new(1))).unwrap();

        store
            .patch(
                wallet.id,
                WalletPatch::totals(70.0, TransactionKind::Income, 70.0),
            )
            .unwrap();

        let updated = store.get(wallet.id).unwrap();
        assert_eq!(updated.amount, 70.0);
        assert_eq!(updated.total_income, 70.0);
        // Untouched columns keep their stored values.
        assert_eq!(updated.total_expenses, 0.0);
        assert_eq!(updated.name, "Cash");
        assert_eq!(updated.created, wallet.created);
    }

    #[test]
    fn patch_name_leaves_totals_alone() {
        let mut store = get_store();
        let wallet = store.create(Wallet::build("Cash", UserId::new(1))).unwrap();
        store
            .patch(
                wallet.id,
                WalletPatch::totals(50.0, TransactionKind::Income, 50.0),
            )
            .unwrap();

        store
            .patch(
                wallet.id,
                WalletPatch {
                    name: Some("Pocket money".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let updated = store.get(wallet.id).unwrap();
        assert_eq!(updated.name, "Pocket money");
        assert_eq!(updated.amount, 50.0);
        assert_eq!(updated.total_income, 50.0);
    }

    #[test]
    fn patch_fails_on_invalid_id() {
        let mut store = get_store();

        let result = store.patch(
            999,
            WalletPatch::totals(1.0, TransactionKind::Income, 1.0),
        );

        assert_eq!(result, Err(Error::WalletNotFound));
    }

    #[test]
    fn delete_removes_wallet() {
        let mut store = get_store();
        let wallet = store.create(Wallet::build("Cash", UserId::new(1))).unwrap();

        store.delete(wallet.id).unwrap();

        assert_eq!(store.get(wallet.id), Err(Error::WalletNotFound));
    }

    #[test]
    fn delete_fails_on_invalid_id() {
        let mut store = get_store();

        assert_eq!(store.delete(999), Err(Error::WalletNotFound));
    }
}
