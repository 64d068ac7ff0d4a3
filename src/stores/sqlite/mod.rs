//! SQLite backed implementations of the store traits.

mod transaction;
mod wallet;

pub use transaction::SQLiteTransactionStore;
pub use wallet::SQLiteWalletStore;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize};

/// Creates the wallet and transaction stores over one shared SQLite
/// connection.
///
/// This function will modify the database by adding the tables for the
/// domain models.
pub fn create_stores(
    db_connection: Connection,
) -> Result<(SQLiteWalletStore, SQLiteTransactionStore), Error> {
    initialize(&db_connection)?;

    let connection = Arc::new(Mutex::new(db_connection));

    Ok((
        SQLiteWalletStore::new(connection.clone()),
        SQLiteTransactionStore::new(connection),
    ))
}
