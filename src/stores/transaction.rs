//! Defines the transaction store trait.

use std::ops::RangeInclusive;

use time::Date;

use crate::{
    Error,
    models::{DatabaseID, Transaction, TransactionBuilder, UserId},
};

/// Handles the creation, retrieval and removal of transactions.
pub trait TransactionStore {
    /// Create a new transaction in the store.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve a transaction from the store.
    ///
    /// # Errors
    /// Returns [Error::TransactionNotFound] if `id` does not refer to a
    /// stored transaction.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error>;

    /// Overwrite the stored record with `transaction` (matched by its
    /// `id`).
    ///
    /// # Errors
    /// Returns [Error::TransactionNotFound] if the transaction's `id`
    /// does not refer to a stored transaction.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error>;

    /// Delete a transaction from the store.
    ///
    /// # Errors
    /// Returns [Error::TransactionNotFound] if `id` does not refer to a
    /// stored transaction.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error>;

    /// Retrieve transactions from the store in the way defined by
    /// `query`, returned eagerly as one finite batch.
    fn get_query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error>;
}

/// Defines how transactions should be fetched from
/// [TransactionStore::get_query].
#[derive(Debug, Default, Clone)]
pub struct TransactionQuery {
    /// Include only transactions owned by this user.
    pub user_id: Option<UserId>,
    /// Include only transactions referencing this wallet.
    pub wallet_id: Option<DatabaseID>,
    /// Include transactions within `date_range` (inclusive).
    pub date_range: Option<RangeInclusive<Date>>,
    /// Selects up to the first N (`limit`) transactions.
    pub limit: Option<u64>,
    /// Orders transactions by date in the order `sort_date`. None returns
    /// transactions in the order they are stored.
    pub sort_date: Option<SortOrder>,
}

/// The order to sort transactions in a [TransactionQuery].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}
