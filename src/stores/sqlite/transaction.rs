//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{DatabaseID, Transaction, TransactionBuilder, UserId},
    stores::{
        TransactionStore,
        transaction::{SortOrder, TransactionQuery},
    },
};

/// Stores transactions in a SQLite database.
///
/// A transaction's `wallet_id` is a plain reference, not a foreign key:
/// the backing store is modelled as a document database with no
/// referential integrity, so a wallet can be deleted while transactions
/// still point at it (see
/// [cascade_delete_wallet](crate::reconciler::cascade_delete_wallet)).
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// Returns an [Error::Storage] if there is an SQL error.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "INSERT INTO \"transaction\" (kind, amount, wallet_id, date, category, description, image_url, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 RETURNING id, kind, amount, wallet_id, date, category, description, image_url, user_id",
            )?
            .query_row(
                (
                    builder.kind,
                    builder.amount,
                    builder.wallet_id,
                    builder.date,
                    &builder.category,
                    &builder.description,
                    &builder.image_url,
                    builder.user_id.as_i64(),
                ),
                Self::map_row,
            )?;

        Ok(transaction)
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::TransactionNotFound] if `id` does not refer to a valid
    ///   transaction,
    /// - or [Error::Storage] if there is some other SQL error.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, kind, amount, wallet_id, date, category, description, image_url, user_id
                 FROM \"transaction\" WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
                error => error.into(),
            })
    }

    /// Overwrite the stored record with `transaction`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::TransactionNotFound] if the transaction's `id` does not
    ///   refer to a valid transaction,
    /// - or [Error::Storage] if there is some other SQL error.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error> {
        let rows_updated = self.connection.lock().unwrap().execute(
            "UPDATE \"transaction\"
             SET kind = ?1, amount = ?2, wallet_id = ?3, date = ?4, category = ?5, description = ?6, image_url = ?7
             WHERE id = ?8",
            (
                transaction.kind,
                transaction.amount,
                transaction.wallet_id,
                transaction.date,
                &transaction.category,
                &transaction.description,
                &transaction.image_url,
                transaction.id,
            ),
        )?;

        if rows_updated == 0 {
            return Err(Error::TransactionNotFound);
        }

        Ok(())
    }

    /// Delete a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::TransactionNotFound] if `id` does not refer to a valid
    ///   transaction,
    /// - or [Error::Storage] if there is some other SQL error.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error> {
        let rows_deleted = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

        if rows_deleted == 0 {
            return Err(Error::TransactionNotFound);
        }

        Ok(())
    }

    /// Query for transactions in the database.
    ///
    /// # Errors
    /// This function will return an [Error::Storage] if there is an SQL
    /// error.
    fn get_query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error> {
        let mut query_string_parts = vec![
            "SELECT id, kind, amount, wallet_id, date, category, description, image_url, user_id FROM \"transaction\""
                .to_string(),
        ];
        let mut where_clause_parts = vec![];
        let mut query_parameters = vec![];

        if let Some(user_id) = query.user_id {
            query_parameters.push(Value::Integer(user_id.as_i64()));
            where_clause_parts.push(format!("user_id = ?{}", query_parameters.len()));
        }

        if let Some(wallet_id) = query.wallet_id {
            query_parameters.push(Value::Integer(wallet_id));
            where_clause_parts.push(format!("wallet_id = ?{}", query_parameters.len()));
        }

        if let Some(date_range) = query.date_range {
            where_clause_parts.push(format!(
                "date BETWEEN ?{} AND ?{}",
                query_parameters.len() + 1,
                query_parameters.len() + 2,
            ));
            query_parameters.push(Value::Text(date_range.start().to_string()));
            query_parameters.push(Value::Text(date_range.end().to_string()));
        }

        if !where_clause_parts.is_empty() {
            query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));
        }

        match query.sort_date {
            Some(SortOrder::Ascending) => query_string_parts.push("ORDER BY date ASC".to_string()),
            Some(SortOrder::Descending) => {
                query_string_parts.push("ORDER BY date DESC".to_string())
            }
            None => {}
        }

        if let Some(limit) = query.limit {
            query_string_parts.push(format!("LIMIT {limit}"));
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_map(params, Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
            .collect()
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    kind TEXT NOT NULL,
                    amount REAL NOT NULL,
                    wallet_id INTEGER NOT NULL,
                    date TEXT NOT NULL,
                    category TEXT,
                    description TEXT NOT NULL,
                    image_url TEXT,
                    user_id INTEGER NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Transaction {
            id: row.get(offset)?,
            kind: row.get(offset + 1)?,
            amount: row.get(offset + 2)?,
            wallet_id: row.get(offset + 3)?,
            date: row.get(offset + 4)?,
            category: row.get(offset + 5)?,
            description: row.get(offset + 6)?,
            image_url: row.get(offset + 7)?,
            user_id: UserId::new(row.get(offset + 8)?),
        })
    }
}
