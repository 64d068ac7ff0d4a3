//! This file defines the type `Transaction`, a single income or expense
//! event, and the `TransactionKind` tag that drives the balance maths.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::models::{DatabaseID, UserId};

/// Whether a transaction brings money into or takes money out of a
/// wallet.
///
/// The kind selects both the sign of the balance delta ([signed](Self::signed))
/// and which wallet total a reconciliation touches (see
/// [Wallet::total_for](crate::models::Wallet::total_for)), so the
/// income/expense distinction is a single tagged choice rather than being
/// scattered through the reconciliation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned into the wallet.
    Income,
    /// Money spent out of the wallet.
    Expense,
}

impl TransactionKind {
    /// The balance delta that a transaction of this kind and `amount`
    /// applies to its wallet: positive for income, negative for expenses.
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }

    /// The canonical text form stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction kind {other:?}").into(),
            )),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or
/// earned from one wallet.
///
/// To create a new `Transaction`, use [Transaction::build] and pass the
/// builder to a [TransactionStore](crate::stores::TransactionStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseID,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The amount of money spent or earned. Always strictly positive; the
    /// sign comes from `kind`.
    pub amount: f64,
    /// The wallet the transaction belongs to. A transaction references
    /// exactly one wallet at any instant.
    pub wallet_id: DatabaseID,
    /// When the transaction happened. Used for aggregation bucketing.
    pub date: Date,
    /// A user-defined spending category. Required for expenses, unused
    /// for income.
    pub category: Option<String>,
    /// A text description of what the transaction was for.
    pub description: String,
    /// URL of the receipt image on the media host, if one was attached.
    pub image_url: Option<String>,
    /// The ID of the user that created this transaction.
    pub user_id: UserId,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder::new] for discoverability.
    pub fn build(
        kind: TransactionKind,
        amount: f64,
        wallet_id: DatabaseID,
        user_id: UserId,
    ) -> TransactionBuilder {
        TransactionBuilder::new(kind, amount, wallet_id, user_id)
    }
}

/// Builder for creating a new [Transaction].
///
/// The builder is finalized by
/// [TransactionStore::create](crate::stores::TransactionStore::create),
/// which assigns the ID.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// The wallet the transaction belongs to.
    pub wallet_id: DatabaseID,
    /// When the transaction happened. Defaults to today (UTC).
    pub date: Date,
    /// A user-defined spending category.
    pub category: Option<String>,
    /// A text description of what the transaction was for.
    pub description: String,
    /// URL of the receipt image on the media host.
    pub image_url: Option<String>,
    /// The ID of the user that created this transaction.
    pub user_id: UserId,
}

impl TransactionBuilder {
    /// Create a builder with today's date, no category, and an empty
    /// description.
    pub fn new(
        kind: TransactionKind,
        amount: f64,
        wallet_id: DatabaseID,
        user_id: UserId,
    ) -> Self {
        Self {
            kind,
            amount,
            wallet_id,
            date: OffsetDateTime::now_utc().date(),
            category: None,
            description: String::new(),
            image_url: None,
            user_id,
        }
    }

    /// Set the date for the transaction.
    pub fn date(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    /// Set the category for the transaction.
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the receipt image URL for the transaction.
    pub fn image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    /// Turn the builder into a [Transaction] with the store-assigned `id`.
    pub fn finalise(self, id: DatabaseID) -> Transaction {
        Transaction {
            id,
            kind: self.kind,
            amount: self.amount,
            wallet_id: self.wallet_id,
            date: self.date,
            category: self.category,
            description: self.description,
            image_url: self.image_url,
            user_id: self.user_id,
        }
    }
}
