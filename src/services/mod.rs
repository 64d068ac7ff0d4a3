//! The operations a UI layer calls directly.
//!
//! Each service validates its input, uploads any attached image, then
//! drives the [reconciler](crate::reconciler) and the stores in the
//! order that keeps wallet balances consistent.

mod transaction;
mod wallet;

pub use transaction::{TransactionDraft, delete_transaction, submit_transaction};
pub use wallet::{WalletDraft, delete_wallet, upsert_wallet};
