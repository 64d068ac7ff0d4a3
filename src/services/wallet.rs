//! Create, rename and delete wallets on behalf of the UI.

use std::path::PathBuf;

use crate::{
    Error,
    models::{DatabaseID, UserId, Wallet, WalletPatch},
    reconciler::cascade_delete_wallet,
    stores::{TransactionStore, WalletStore},
    upload::{MediaFolder, MediaUploader},
};

/// The user-supplied form data for creating or renaming a wallet.
///
/// `id` is `None` for a new wallet and `Some` to edit an existing one.
/// Balances and totals are never part of a draft; only the
/// [reconciler](crate::reconciler) writes those.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletDraft {
    /// The wallet to edit, or `None` to create a new one.
    pub id: Option<DatabaseID>,
    /// The display name of the wallet.
    pub name: String,
    /// A wallet icon to upload, if one was attached.
    pub image: Option<PathBuf>,
    /// The ID of the user submitting the draft.
    pub user_id: UserId,
}

/// Create a wallet or update an existing wallet's name and icon.
///
/// The attached icon, if any, is uploaded before the first store write.
/// Editing never touches the balance or the totals.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the name is empty,
/// - [Error::Upload] if the icon fails to upload,
/// - [Error::WalletNotFound] if the draft edits a wallet that does not
///   exist,
/// - or the underlying store error.
pub fn upsert_wallet(
    wallets: &mut impl WalletStore,
    uploader: &impl MediaUploader,
    draft: WalletDraft,
) -> Result<Wallet, Error> {
    if draft.name.trim().is_empty() {
        return Err(Error::Validation("wallet name must not be empty".to_string()));
    }

    let image_url = match &draft.image {
        Some(file) => Some(uploader.upload(file, MediaFolder::Wallets)?),
        None => None,
    };

    match draft.id {
        Some(id) => {
            wallets.patch(
                id,
                WalletPatch {
                    name: Some(draft.name),
                    image_url,
                    ..Default::default()
                },
            )?;

            wallets.get(id)
        }
        None => wallets.create(Wallet::build(&draft.name, draft.user_id).image_url(image_url)),
    }
}

/// Delete a wallet and purge every transaction referencing it.
///
/// Returns the number of transactions purged.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if `id` does not refer to a stored wallet,
/// - or the underlying store error.
pub fn delete_wallet(
    wallets: &mut impl WalletStore,
    transactions: &mut impl TransactionStore,
    id: DatabaseID,
) -> Result<usize, Error> {
    cascade_delete_wallet(wallets, transactions, id)
}
