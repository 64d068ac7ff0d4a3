//! Contains traits and implementations for objects that store the domain
//! [models](crate::models).

mod transaction;
mod wallet;

pub mod sqlite;

pub use transaction::{SortOrder, TransactionQuery, TransactionStore};
pub use wallet::WalletStore;
