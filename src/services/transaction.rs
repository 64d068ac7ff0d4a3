//! Create, edit and delete transactions on behalf of the UI.

use std::path::PathBuf;

use time::Date;

use crate::{
    Error,
    models::{DatabaseID, Transaction, TransactionKind, UserId},
    reconciler::{
        apply_new_transaction, needs_reconciliation, reconcile_deleted_transaction,
        reconcile_edited_transaction,
    },
    stores::{TransactionStore, WalletStore},
    upload::{MediaFolder, MediaUploader},
};

/// The user-supplied form data for creating or editing a transaction.
///
/// `id` is `None` for a new transaction and `Some` to edit an existing
/// one.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    /// The transaction to edit, or `None` to create a new one.
    pub id: Option<DatabaseID>,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The amount of money spent or earned. Must be strictly positive.
    pub amount: f64,
    /// The wallet the transaction belongs to.
    pub wallet_id: DatabaseID,
    /// When the transaction happened.
    pub date: Date,
    /// A user-defined spending category. Required for expenses.
    pub category: Option<String>,
    /// A text description of what the transaction was for.
    pub description: String,
    /// A receipt image to upload, if one was attached.
    pub image: Option<PathBuf>,
    /// The ID of the user submitting the draft.
    pub user_id: UserId,
}

fn validate(draft: &TransactionDraft) -> Result<(), Error> {
    if !draft.amount.is_finite() || draft.amount <= 0.0 {
        return Err(Error::Validation(
            "transaction amount must be a positive number".to_string(),
        ));
    }

    if draft.kind == TransactionKind::Expense
        && draft.category.as_ref().is_none_or(|category| category.is_empty())
    {
        return Err(Error::Validation(
            "expense transactions require a category".to_string(),
        ));
    }

    Ok(())
}

/// Create or edit a transaction and reconcile its wallet(s).
///
/// The attached receipt image, if any, is uploaded before the first store
/// write so a failed upload aborts the whole submission. Edits that only
/// change text fields skip wallet reconciliation entirely.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the amount is not strictly positive or an
///   expense has no category,
/// - [Error::Upload] if the receipt image fails to upload,
/// - [Error::TransactionNotFound] if the draft edits a transaction that
///   does not exist,
/// - [Error::WalletNotFound] or [Error::InsufficientBalance] from
///   reconciliation,
/// - or the underlying store error.
pub fn submit_transaction(
    wallets: &mut impl WalletStore,
    transactions: &mut impl TransactionStore,
    uploader: &impl MediaUploader,
    draft: TransactionDraft,
) -> Result<Transaction, Error> {
    validate(&draft)?;

    let image_url = match &draft.image {
        Some(file) => Some(uploader.upload(file, MediaFolder::Transactions)?),
        None => None,
    };

    match draft.id {
        Some(id) => {
            let old = transactions.get(id)?;

            if needs_reconciliation(&old, draft.amount, draft.kind, draft.wallet_id) {
                reconcile_edited_transaction(
                    wallets,
                    &old,
                    draft.amount,
                    draft.kind,
                    draft.wallet_id,
                )?;
            }

            let updated = Transaction {
                id,
                kind: draft.kind,
                amount: draft.amount,
                wallet_id: draft.wallet_id,
                date: draft.date,
                category: draft.category,
                description: draft.description,
                // A replaced image wins, otherwise the old one stays.
                image_url: image_url.or(old.image_url),
                user_id: old.user_id,
            };
            transactions.update(&updated)?;

            Ok(updated)
        }
        None => {
            apply_new_transaction(wallets, draft.wallet_id, draft.amount, draft.kind)?;

            transactions.create(
                Transaction::build(draft.kind, draft.amount, draft.wallet_id, draft.user_id)
                    .date(draft.date)
                    .category(draft.category)
                    .description(&draft.description)
                    .image_url(image_url),
            )
        }
    }
}

/// Delete a transaction and revert its effect from its wallet.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a stored
///   transaction,
/// - [Error::WalletNotFound] or [Error::IllegalDeletion] from
///   reconciliation,
/// - or the underlying store error.
pub fn delete_transaction(
    wallets: &mut impl WalletStore,
    transactions: &mut impl TransactionStore,
    id: DatabaseID,
) -> Result<(), Error> {
    let transaction = transactions.get(id)?;

    reconcile_deleted_transaction(wallets, transactions, &transaction)
}
