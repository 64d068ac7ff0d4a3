//! User identity attached to wallets and transactions.

use serde::{Deserialize, Serialize};

/// The ID of the user that owns a wallet or transaction.
///
/// Authentication happens outside this crate; the core only tags records
/// with their owner so queries and reports can be scoped per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Create a user ID from a raw integer.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The underlying integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}
