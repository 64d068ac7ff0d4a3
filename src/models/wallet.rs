//! This file defines the type `Wallet`, the record that the balance
//! reconciler maintains, and the partial-update type used to write it.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::{DatabaseID, TransactionKind, UserId};

/// An account-like record holding a running balance and income/expense
/// totals.
///
/// Invariant: `amount == total_income - total_expenses` whenever no
/// reconciliation is in flight. The totals are mutated exclusively by the
/// [reconciler](crate::reconciler); the UI-facing services only ever touch
/// `name` and `image_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// The ID of the wallet, assigned by the store on creation.
    pub id: DatabaseID,
    /// The display name of the wallet.
    pub name: String,
    /// The current balance.
    pub amount: f64,
    /// The sum of all income recorded against this wallet.
    pub total_income: f64,
    /// The sum of all expenses recorded against this wallet.
    pub total_expenses: f64,
    /// URL of the wallet icon on the media host, if one was uploaded.
    pub image_url: Option<String>,
    /// When the wallet was created. Set once, never mutated.
    pub created: OffsetDateTime,
    /// The ID of the user that owns this wallet.
    pub user_id: UserId,
}

impl Wallet {
    /// Create a new wallet.
    ///
    /// Shortcut for [WalletBuilder::new] for discoverability.
    pub fn build(name: &str, user_id: UserId) -> WalletBuilder {
        WalletBuilder::new(name, user_id)
    }

    /// The running total matching `kind`: `total_income` for income,
    /// `total_expenses` for expenses.
    pub fn total_for(&self, kind: TransactionKind) -> f64 {
        match kind {
            TransactionKind::Income => self.total_income,
            TransactionKind::Expense => self.total_expenses,
        }
    }
}

/// Builder for creating a new [Wallet].
///
/// New wallets always start with a zero balance and zero totals; the
/// builder is finalized by
/// [WalletStore::create](crate::stores::WalletStore::create), which
/// assigns the ID.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletBuilder {
    /// The display name of the wallet.
    pub name: String,
    /// URL of the wallet icon on the media host.
    pub image_url: Option<String>,
    /// When the wallet was created.
    pub created: OffsetDateTime,
    /// The ID of the user that owns the wallet.
    pub user_id: UserId,
}

impl WalletBuilder {
    /// Create a builder with the creation timestamp set to now (UTC).
    pub fn new(name: &str, user_id: UserId) -> Self {
        Self {
            name: name.to_owned(),
            image_url: None,
            created: OffsetDateTime::now_utc(),
            user_id,
        }
    }

    /// Set the wallet icon URL.
    pub fn image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    /// Turn the builder into a [Wallet] with the store-assigned `id` and
    /// zeroed totals.
    pub fn finalise(self, id: DatabaseID) -> Wallet {
        Wallet {
            id,
            name: self.name,
            amount: 0.0,
            total_income: 0.0,
            total_expenses: 0.0,
            image_url: self.image_url,
            created: self.created,
            user_id: self.user_id,
        }
    }
}

/// A partial update applied over an existing wallet record.
///
/// This is the merge-semantics write of a document store rendered in
/// Rust: only the fields that are `Some` are written, every other column
/// keeps its stored value. The reconciler uses it to write `amount` plus
/// exactly one of the two totals; the wallet service uses it for `name`
/// and `image_url` and nothing else.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WalletPatch {
    /// New display name.
    pub name: Option<String>,
    /// New wallet icon URL.
    pub image_url: Option<String>,
    /// New balance.
    pub amount: Option<f64>,
    /// New income total.
    pub total_income: Option<f64>,
    /// New expense total.
    pub total_expenses: Option<f64>,
}

impl WalletPatch {
    /// A patch that sets the balance and the total selected by `kind`,
    /// leaving the other total untouched.
    pub fn totals(amount: f64, kind: TransactionKind, total: f64) -> Self {
        Self {
            amount: Some(amount),
            ..Default::default()
        }
        .with_total(kind, total)
    }

    /// Set the total selected by `kind`.
    pub fn with_total(mut self, kind: TransactionKind, total: f64) -> Self {
        match kind {
            TransactionKind::Income => self.total_income = Some(total),
            TransactionKind::Expense => self.total_expenses = Some(total),
        }
        self
    }

    /// Whether the patch writes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
