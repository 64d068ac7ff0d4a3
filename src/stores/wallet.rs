//! Defines the wallet store trait.

use crate::{
    Error,
    models::{DatabaseID, Wallet, WalletBuilder, WalletPatch},
};

/// Handles the creation, retrieval and mutation of wallets.
///
/// The backing store is assumed to provide per-record atomic reads and
/// writes and nothing more; multi-record consistency is the
/// [reconciler](crate::reconciler)'s problem.
pub trait WalletStore {
    /// Create a new wallet in the store with zeroed totals.
    fn create(&mut self, builder: WalletBuilder) -> Result<Wallet, Error>;

    /// Retrieve a wallet from the store.
    ///
    /// # Errors
    /// Returns [Error::WalletNotFound] if `id` does not refer to a stored
    /// wallet.
    fn get(&self, id: DatabaseID) -> Result<Wallet, Error>;

    /// Overlay `patch` onto the stored wallet, leaving fields not present
    /// in the patch untouched (merge semantics).
    ///
    /// # Errors
    /// Returns [Error::WalletNotFound] if `id` does not refer to a stored
    /// wallet. A vanished wallet mid-reconciliation must surface rather
    /// than be recreated from a partial record.
    fn patch(&mut self, id: DatabaseID, patch: WalletPatch) -> Result<(), Error>;

    /// Delete a wallet from the store.
    ///
    /// Transactions referencing the wallet are untouched; use
    /// [cascade_delete_wallet](crate::reconciler::cascade_delete_wallet)
    /// to remove them too.
    ///
    /// # Errors
    /// Returns [Error::WalletNotFound] if `id` does not refer to a stored
    /// wallet.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error>;
}
