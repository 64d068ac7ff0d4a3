//! Defines the domain models for the wallet and transaction core.

mod transaction;
mod user;
mod wallet;

pub use transaction::{Transaction, TransactionBuilder, TransactionKind};
pub use user::UserId;
pub use wallet::{Wallet, WalletBuilder, WalletPatch};

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
