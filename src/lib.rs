//! Walleteur is the wallet and transaction core of a personal expense
//! tracker.
//!
//! The crate keeps a running balance and income/expense totals per wallet
//! as transactions are created, edited and deleted. The interesting part
//! lives in [reconciler]: the backing store offers per-record atomic
//! reads and writes but no multi-record transaction, so wallet totals are
//! maintained through ordered read-modify-write sequences with explicit
//! balance checks. [stats] derives weekly/monthly/yearly income-vs-expense
//! series for charting, and [services] provides the entry points a UI
//! layer calls directly.
//!
//! There is no HTTP surface and no CLI here; authentication and the media
//! host are external collaborators reached through the traits in
//! [stores] and [upload].

#![warn(missing_docs)]

pub mod db;
pub mod models;
pub mod reconciler;
pub mod services;
pub mod stats;
pub mod stores;
pub mod upload;

/// The errors that may occur in the wallet and transaction core.
///
/// Every public operation returns this type; internal store errors are
/// converted at the store boundary so callers never see a raw
/// `rusqlite::Error`.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The caller supplied invalid data (e.g. a non-positive amount or an
    /// expense without a category). Raised before any store access.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The wallet ID does not refer to a stored wallet.
    #[error("wallet not found")]
    WalletNotFound,

    /// The transaction ID does not refer to a stored transaction.
    #[error("transaction not found")]
    TransactionNotFound,

    /// The wallet does not hold enough money to cover the expense.
    #[error("not enough balance in wallet")]
    InsufficientBalance,

    /// Deleting this income record would drive the wallet balance below
    /// zero.
    #[error("deleting this transaction would make the wallet balance negative")]
    IllegalDeletion,

    /// An unexpected error from the underlying store.
    ///
    /// The original error message is preserved for diagnostics.
    #[error("an unexpected storage error occurred: {0}")]
    Storage(String),

    /// The media host rejected or failed an image upload.
    #[error("failed to upload image: {0}")]
    Upload(String),
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {error}");
        Error::Storage(error.to_string())
    }
}
