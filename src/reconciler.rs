//! Keeps wallet balances and running totals consistent with the
//! transactions recorded against them.
//!
//! The backing store only guarantees per-record atomic writes, so every
//! operation here orders its reads, checks and writes to keep wallets
//! valid at each step: all balance checks happen before the first write,
//! and a failure after a write is logged with enough context to repair
//! the record by hand.

use tracing::{debug, error};

use crate::{
    Error,
    models::{DatabaseID, Transaction, TransactionKind, WalletPatch},
    stores::{TransactionStore, TransactionQuery, WalletStore},
};

/// How many transactions [cascade_delete_wallet] fetches and deletes per
/// round trip.
const DELETE_BATCH_SIZE: u64 = 25;

/// Apply a brand-new transaction's effect to its wallet.
///
/// Income raises the balance and `total_income`; expenses lower the
/// balance and raise `total_expenses`. The untouched total is not
/// written.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if `wallet_id` does not refer to a stored
///   wallet,
/// - [Error::InsufficientBalance] if an expense would drive the balance
///   negative (the wallet is left untouched),
/// - or the underlying store error.
pub fn apply_new_transaction(
    wallets: &mut impl WalletStore,
    wallet_id: DatabaseID,
    amount: f64,
    kind: TransactionKind,
) -> Result<(), Error> {
    let wallet = wallets.get(wallet_id)?;

    if kind == TransactionKind::Expense && wallet.amount - amount < 0.0 {
        return Err(Error::InsufficientBalance);
    }

    wallets.patch(
        wallet_id,
        WalletPatch::totals(
            wallet.amount + kind.signed(amount),
            kind,
            wallet.total_for(kind) + amount,
        ),
    )
}

/// Whether editing `old` to the given kind, amount and wallet changes
/// anything the wallet balances depend on.
///
/// Edits to description, category, date or receipt image never touch a
/// wallet.
pub fn needs_reconciliation(
    old: &Transaction,
    new_amount: f64,
    new_kind: TransactionKind,
    new_wallet_id: DatabaseID,
) -> bool {
    old.kind != new_kind || old.wallet_id != new_wallet_id || old.amount != new_amount
}

/// Move the balance effect of `old` to its edited kind, amount and
/// wallet.
///
/// The original wallet has `old`'s effect reverted, then the destination
/// wallet (which may be the same wallet) has the new effect applied. Both
/// balance checks run against read values before the first write, so a
/// rejected edit leaves every wallet exactly as it was.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if either wallet is missing,
/// - [Error::InsufficientBalance] if the edited expense exceeds what the
///   paying wallet would hold after the revert,
/// - or the underlying store error.
pub fn reconcile_edited_transaction(
    wallets: &mut impl WalletStore,
    old: &Transaction,
    new_amount: f64,
    new_kind: TransactionKind,
    new_wallet_id: DatabaseID,
) -> Result<(), Error> {
    let original = wallets.get(old.wallet_id)?;
    let reverted_amount = original.amount - old.kind.signed(old.amount);
    let reverted_total = original.total_for(old.kind) - old.amount;

    // All checks run before the first write.
    if new_kind == TransactionKind::Expense {
        if new_wallet_id == old.wallet_id {
            if reverted_amount - new_amount < 0.0 {
                return Err(Error::InsufficientBalance);
            }
        } else if wallets.get(new_wallet_id)?.amount - new_amount < 0.0 {
            return Err(Error::InsufficientBalance);
        }
    } else if new_wallet_id != old.wallet_id {
        // Surface a missing destination before the revert is committed.
        wallets.get(new_wallet_id)?;
    }

    wallets.patch(
        old.wallet_id,
        WalletPatch::totals(reverted_amount, old.kind, reverted_total),
    )?;

    // Re-read the destination: when it is the original wallet the revert
    // just changed it.
    let destination = wallets.get(new_wallet_id)?;
    let apply = WalletPatch::totals(
        destination.amount + new_kind.signed(new_amount),
        new_kind,
        destination.total_for(new_kind) + new_amount,
    );

    if let Err(apply_error) = wallets.patch(new_wallet_id, apply) {
        error!(
            "transaction {} was reverted from wallet {} but applying the edit to wallet {} failed: {apply_error}",
            old.id, old.wallet_id, new_wallet_id
        );
        return Err(apply_error);
    }

    Ok(())
}

/// Revert a transaction's effect from its wallet and delete its record.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if the transaction's wallet is missing,
/// - [Error::IllegalDeletion] if removing an income would drive the
///   balance negative (the wallet and the record are left untouched),
/// - or the underlying store error.
pub fn reconcile_deleted_transaction(
    wallets: &mut impl WalletStore,
    transactions: &mut impl TransactionStore,
    transaction: &Transaction,
) -> Result<(), Error> {
    let wallet = wallets.get(transaction.wallet_id)?;
    let new_amount = wallet.amount - transaction.kind.signed(transaction.amount);
    let new_total = wallet.total_for(transaction.kind) - transaction.amount;

    if transaction.kind == TransactionKind::Income && new_amount < 0.0 {
        return Err(Error::IllegalDeletion);
    }

    wallets.patch(
        transaction.wallet_id,
        WalletPatch::totals(new_amount, transaction.kind, new_total),
    )?;

    if let Err(delete_error) = transactions.delete(transaction.id) {
        error!(
            "wallet {} had transaction {} reverted but deleting the record failed: {delete_error}",
            transaction.wallet_id, transaction.id
        );
        return Err(delete_error);
    }

    Ok(())
}

/// The stage a [cascade_delete_wallet] call has reached, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CascadePhase {
    /// The wallet record has been deleted, its transactions have not.
    MarkedForDeletion,
    /// Transactions are being deleted batch by batch.
    PurgingTransactions,
    /// Every transaction referencing the wallet is gone.
    Purged,
}

/// Delete a wallet and every transaction referencing it.
///
/// The wallet record goes first so that a crash mid-purge leaves orphaned
/// transactions (invisible without their wallet) rather than a wallet
/// whose totals disagree with its transactions. The purge then loops in
/// batches until a query for the wallet's transactions comes back empty.
///
/// Returns the number of transactions purged.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if `wallet_id` does not refer to a stored
///   wallet,
/// - or the underlying store error. Errors mid-purge are logged with the
///   phase and running count before being returned.
pub fn cascade_delete_wallet(
    wallets: &mut impl WalletStore,
    transactions: &mut impl TransactionStore,
    wallet_id: DatabaseID,
) -> Result<usize, Error> {
    wallets.delete(wallet_id)?;
    let mut phase = CascadePhase::MarkedForDeletion;
    debug!("wallet {wallet_id}: {phase:?}");

    let mut purged = 0;

    loop {
        let batch_result = transactions.get_query(TransactionQuery {
            wallet_id: Some(wallet_id),
            limit: Some(DELETE_BATCH_SIZE),
            ..Default::default()
        });
        let batch = match batch_result {
            Ok(batch) => batch,
            Err(query_error) => {
                error!(
                    "wallet {wallet_id}: purge failed in phase {phase:?} after {purged} transactions: {query_error}"
                );
                return Err(query_error);
            }
        };

        if batch.is_empty() {
            break;
        }

        phase = CascadePhase::PurgingTransactions;
        for transaction in batch {
            if let Err(delete_error) = transactions.delete(transaction.id) {
                error!(
                    "wallet {wallet_id}: purge failed in phase {phase:?} after {purged} transactions: {delete_error}"
                );
                return Err(delete_error);
            }
            purged += 1;
        }
    }

    phase = CascadePhase::Purged;
    debug!("wallet {wallet_id}: {phase:?}, {purged} transactions removed");

    Ok(purged)
}

#[cfg(test)]
mod reconciler_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        models::{Transaction, TransactionKind, UserId, Wallet},
        stores::{
            TransactionStore, TransactionQuery, WalletStore,
            sqlite::{SQLiteTransactionStore, SQLiteWalletStore, create_stores},
        },
    };

    use super::{
        apply_new_transaction, cascade_delete_wallet, needs_reconciliation,
        reconcile_deleted_transaction, reconcile_edited_transaction,
    };

    fn get_stores() -> (SQLiteWalletStore, SQLiteTransactionStore) {
        create_stores(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn wallet_with_balance(store: &mut SQLiteWalletStore, amount: f64) -> Wallet {
        let wallet = store
            .create(Wallet::build("Cash", UserId::new(1)))
            .unwrap();
        apply_new_transaction(store, wallet.id, amount, TransactionKind::Income).unwrap();
        store.get(wallet.id).unwrap()
    }

    #[test]
    fn income_raises_balance_and_income_total() {
        let (mut wallets, _) = get_stores();
        let wallet = wallets.create(Wallet::build("Cash", UserId::new(1))).unwrap();

        apply_new_transaction(&mut wallets, wallet.id, 100.0, TransactionKind::Income).unwrap();

        let updated = wallets.get(wallet.id).unwrap();
        assert_eq!(updated.amount, 100.0);
        assert_eq!(updated.total_income, 100.0);
        assert_eq!(updated.total_expenses, 0.0);
    }

    #[test]
    fn expense_lowers_balance_and_raises_expense_total() {
        let (mut wallets, _) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 100.0);

        apply_new_transaction(&mut wallets, wallet.id, 30.0, TransactionKind::Expense).unwrap();

        let updated = wallets.get(wallet.id).unwrap();
        assert_eq!(updated.amount, 70.0);
        assert_eq!(updated.total_income, 100.0);
        assert_eq!(updated.total_expenses, 30.0);
    }

    #[test]
    fn balance_equals_income_minus_expenses_after_a_sequence() {
        let (mut wallets, _) = get_stores();
        let wallet = wallets.create(Wallet::build("Cash", UserId::new(1))).unwrap();

        for (amount, kind) in [
            (200.0, TransactionKind::Income),
            (45.5, TransactionKind::Expense),
            (10.0, TransactionKind::Income),
            (4.5, TransactionKind::Expense),
        ] {
            apply_new_transaction(&mut wallets, wallet.id, amount, kind).unwrap();
        }

        let updated = wallets.get(wallet.id).unwrap();
        assert_eq!(updated.amount, updated.total_income - updated.total_expenses);
        assert_eq!(updated.amount, 160.0);
    }

    #[test]
    fn overdrawing_expense_is_rejected_without_writes() {
        let (mut wallets, _) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 50.0);

        let result =
            apply_new_transaction(&mut wallets, wallet.id, 100.0, TransactionKind::Expense);

        assert_eq!(result, Err(Error::InsufficientBalance));
        assert_eq!(wallets.get(wallet.id).unwrap(), wallet);
    }

    #[test]
    fn expense_spending_the_exact_balance_is_allowed() {
        let (mut wallets, _) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 50.0);

        apply_new_transaction(&mut wallets, wallet.id, 50.0, TransactionKind::Expense).unwrap();

        assert_eq!(wallets.get(wallet.id).unwrap().amount, 0.0);
    }

    #[test]
    fn apply_fails_on_missing_wallet() {
        let (mut wallets, _) = get_stores();

        let result = apply_new_transaction(&mut wallets, 999, 10.0, TransactionKind::Income);

        assert_eq!(result, Err(Error::WalletNotFound));
    }

    #[test]
    fn money_edits_need_reconciliation_text_edits_do_not() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 100.0);
        let transaction = transactions
            .create(Transaction::build(
                TransactionKind::Expense,
                20.0,
                wallet.id,
                UserId::new(1),
            ))
            .unwrap();

        assert!(!needs_reconciliation(
            &transaction,
            20.0,
            TransactionKind::Expense,
            wallet.id
        ));
        assert!(needs_reconciliation(
            &transaction,
            25.0,
            TransactionKind::Expense,
            wallet.id
        ));
        assert!(needs_reconciliation(
            &transaction,
            20.0,
            TransactionKind::Income,
            wallet.id
        ));
        assert!(needs_reconciliation(
            &transaction,
            20.0,
            TransactionKind::Expense,
            wallet.id + 1
        ));
    }

    #[test]
    fn amount_edit_on_same_wallet_moves_the_difference() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 100.0);
        apply_new_transaction(&mut wallets, wallet.id, 30.0, TransactionKind::Expense).unwrap();
        let transaction = transactions
            .create(Transaction::build(
                TransactionKind::Expense,
                30.0,
                wallet.id,
                UserId::new(1),
            ))
            .unwrap();

        reconcile_edited_transaction(
            &mut wallets,
            &transaction,
            45.0,
            TransactionKind::Expense,
            wallet.id,
        )
        .unwrap();

        let updated = wallets.get(wallet.id).unwrap();
        assert_eq!(updated.amount, 55.0);
        assert_eq!(updated.total_expenses, 45.0);
        assert_eq!(updated.total_income, 100.0);
    }

    #[test]
    fn kind_edit_moves_effect_between_totals() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 100.0);
        apply_new_transaction(&mut wallets, wallet.id, 20.0, TransactionKind::Expense).unwrap();
        let transaction = transactions
            .create(Transaction::build(
                TransactionKind::Expense,
                20.0,
                wallet.id,
                UserId::new(1),
            ))
            .unwrap();

        // The expense becomes income of the same amount.
        reconcile_edited_transaction(
            &mut wallets,
            &transaction,
            20.0,
            TransactionKind::Income,
            wallet.id,
        )
        .unwrap();

        let updated = wallets.get(wallet.id).unwrap();
        assert_eq!(updated.amount, 120.0);
        assert_eq!(updated.total_income, 120.0);
        assert_eq!(updated.total_expenses, 0.0);
    }

    #[test]
    fn expense_moved_between_wallets_updates_both() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet_a = wallet_with_balance(&mut wallets, 100.0);
        let wallet_b = wallet_with_balance(&mut wallets, 80.0);
        apply_new_transaction(&mut wallets, wallet_a.id, 30.0, TransactionKind::Expense).unwrap();
        let transaction = transactions
            .create(Transaction::build(
                TransactionKind::Expense,
                30.0,
                wallet_a.id,
                UserId::new(1),
            ))
            .unwrap();

        reconcile_edited_transaction(
            &mut wallets,
            &transaction,
            30.0,
            TransactionKind::Expense,
            wallet_b.id,
        )
        .unwrap();

        let updated_a = wallets.get(wallet_a.id).unwrap();
        let updated_b = wallets.get(wallet_b.id).unwrap();
        assert_eq!(updated_a.amount, 100.0);
        assert_eq!(updated_a.total_expenses, 0.0);
        assert_eq!(updated_b.amount, 50.0);
        assert_eq!(updated_b.total_expenses, 30.0);
    }

    #[test]
    fn rejected_cross_wallet_move_leaves_both_wallets_untouched() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet_a = wallet_with_balance(&mut wallets, 70.0);
        let wallet_b = wallet_with_balance(&mut wallets, 10.0);
        apply_new_transaction(&mut wallets, wallet_a.id, 30.0, TransactionKind::Expense).unwrap();
        let wallet_a = wallets.get(wallet_a.id).unwrap();
        let transaction = transactions
            .create(Transaction::build(
                TransactionKind::Expense,
                30.0,
                wallet_a.id,
                UserId::new(1),
            ))
            .unwrap();

        // Wallet B only holds 10, the 30 expense cannot move there.
        let result = reconcile_edited_transaction(
            &mut wallets,
            &transaction,
            30.0,
            TransactionKind::Expense,
            wallet_b.id,
        );

        assert_eq!(result, Err(Error::InsufficientBalance));
        assert_eq!(wallets.get(wallet_a.id).unwrap(), wallet_a);
        assert_eq!(wallets.get(wallet_b.id).unwrap(), wallet_b);
    }

    #[test]
    fn same_wallet_edit_checks_the_reverted_balance() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 50.0);
        apply_new_transaction(&mut wallets, wallet.id, 40.0, TransactionKind::Expense).unwrap();
        let transaction = transactions
            .create(Transaction::build(
                TransactionKind::Expense,
                40.0,
                wallet.id,
                UserId::new(1),
            ))
            .unwrap();

        // After reverting the 40 the wallet holds 50, so raising the
        // expense to 50 works even though the live balance is only 10.
        reconcile_edited_transaction(
            &mut wallets,
            &transaction,
            50.0,
            TransactionKind::Expense,
            wallet.id,
        )
        .unwrap();
        assert_eq!(wallets.get(wallet.id).unwrap().amount, 0.0);
    }

    #[test]
    fn same_wallet_edit_rejects_more_than_the_reverted_balance() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 50.0);
        apply_new_transaction(&mut wallets, wallet.id, 40.0, TransactionKind::Expense).unwrap();
        let snapshot = wallets.get(wallet.id).unwrap();
        let transaction = transactions
            .create(Transaction::build(
                TransactionKind::Expense,
                40.0,
                wallet.id,
                UserId::new(1),
            ))
            .unwrap();

        let result = reconcile_edited_transaction(
            &mut wallets,
            &transaction,
            60.0,
            TransactionKind::Expense,
            wallet.id,
        );

        assert_eq!(result, Err(Error::InsufficientBalance));
        assert_eq!(wallets.get(wallet.id).unwrap(), snapshot);
    }

    #[test]
    fn deleting_an_expense_restores_the_balance() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 100.0);
        apply_new_transaction(&mut wallets, wallet.id, 25.0, TransactionKind::Expense).unwrap();
        let transaction = transactions
            .create(Transaction::build(
                TransactionKind::Expense,
                25.0,
                wallet.id,
                UserId::new(1),
            ))
            .unwrap();

        reconcile_deleted_transaction(&mut wallets, &mut transactions, &transaction).unwrap();

        let updated = wallets.get(wallet.id).unwrap();
        assert_eq!(updated.amount, 100.0);
        assert_eq!(updated.total_expenses, 0.0);
        assert_eq!(
            transactions.get(transaction.id),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn deleting_income_returns_wallet_to_its_prior_state() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 100.0);
        let snapshot = wallets.get(wallet.id).unwrap();
        apply_new_transaction(&mut wallets, wallet.id, 60.0, TransactionKind::Income).unwrap();
        let transaction = transactions
            .create(Transaction::build(
                TransactionKind::Income,
                60.0,
                wallet.id,
                UserId::new(1),
            ))
            .unwrap();

        reconcile_deleted_transaction(&mut wallets, &mut transactions, &transaction).unwrap();

        assert_eq!(wallets.get(wallet.id).unwrap(), snapshot);
    }

    #[test]
    fn deleting_spent_income_is_illegal() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet = wallet_with_balance(&mut wallets, 50.0);
        // 20 of the 50 income is already spent, balance is 30.
        apply_new_transaction(&mut wallets, wallet.id, 20.0, TransactionKind::Expense).unwrap();
        let snapshot = wallets.get(wallet.id).unwrap();
        let transaction = transactions
            .create(Transaction::build(
                TransactionKind::Income,
                50.0,
                wallet.id,
                UserId::new(1),
            ))
            .unwrap();

        let result =
            reconcile_deleted_transaction(&mut wallets, &mut transactions, &transaction);

        assert_eq!(result, Err(Error::IllegalDeletion));
        assert_eq!(wallets.get(wallet.id).unwrap(), snapshot);
        assert!(transactions.get(transaction.id).is_ok());
    }

    #[test]
    fn cascade_delete_removes_wallet_with_no_transactions() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet = wallets.create(Wallet::build("Cash", UserId::new(1))).unwrap();

        let purged = cascade_delete_wallet(&mut wallets, &mut transactions, wallet.id).unwrap();

        assert_eq!(purged, 0);
        assert_eq!(wallets.get(wallet.id), Err(Error::WalletNotFound));
    }

    #[test]
    fn cascade_delete_purges_more_transactions_than_one_batch() {
        let (mut wallets, mut transactions) = get_stores();
        let wallet = wallets.create(Wallet::build("Cash", UserId::new(1))).unwrap();
        let other_wallet = wallets.create(Wallet::build("Bank", UserId::new(1))).unwrap();
        for _ in 0..60 {
            transactions
                .create(Transaction::build(
                    TransactionKind::Income,
                    1.0,
                    wallet.id,
                    UserId::new(1),
                ))
                .unwrap();
        }
        let kept = transactions
            .create(Transaction::build(
                TransactionKind::Income,
                5.0,
                other_wallet.id,
                UserId::new(1),
            ))
            .unwrap();

        let purged = cascade_delete_wallet(&mut wallets, &mut transactions, wallet.id).unwrap();

        assert_eq!(purged, 60);
        let remaining = transactions
            .get_query(TransactionQuery::default())
            .unwrap();
        assert_eq!(remaining, vec![kept]);
    }

    #[test]
    fn cascade_delete_fails_on_missing_wallet() {
        let (mut wallets, mut transactions) = get_stores();

        let result = cascade_delete_wallet(&mut wallets, &mut transactions, 999);

        assert_eq!(result, Err(Error::WalletNotFound));
    }
}
