//! Transactions move money in or out of an account.
//!
//! Only confirmed transactions count towards an account's current balance.
//! There is no HTTP API for transactions, they are created by the seeding
//! tool and by tests.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, account::AccountId};

/// The database ID of a transaction.
pub type TransactionId = i64;

/// Where a transaction is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// The transaction has not cleared yet.
    Pending,
    /// The transaction has cleared and counts towards the balance.
    Confirmed,
    /// The transaction was cancelled.
    Cancelled,
}

impl TransactionStatus {
    /// The lowercase name used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "confirmed" => Ok(TransactionStatus::Confirmed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            other => Err(format!("unknown transaction status \"{other}\"")),
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|message: String| FromSqlError::Other(message.into()))
    }
}

/// A stored transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// Positive for money in, negative for money out.
    pub amount: f64,
    /// Whether the transaction has cleared.
    pub status: TransactionStatus,
    /// What the transaction was for.
    pub description: Option<String>,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The fields for a new transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// Positive for money in, negative for money out.
    pub amount: f64,
    /// Whether the transaction has cleared.
    pub status: TransactionStatus,
    /// What the transaction was for.
    pub description: Option<String>,
}

/// Create the transaction table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL REFERENCES accounts(id),
            amount REAL NOT NULL,
            status TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_account_status \
        ON transactions(account_id, status)",
        (),
    )?;

    Ok(())
}

/// Insert a new transaction.
///
/// # Errors
///
/// Returns [Error::SqlError] if the insert fails, e.g. if the account does not exist.
pub fn create_transaction(
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO transactions (account_id, amount, status, description, created_at) \
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            transaction.account_id,
            transaction.amount,
            transaction.status,
            &transaction.description,
            created_at,
        ),
    )?;

    Ok(Transaction {
        id: connection.last_insert_rowid(),
        account_id: transaction.account_id,
        amount: transaction.amount,
        status: transaction.status,
        description: transaction.description.clone(),
        created_at,
    })
}

/// Get the transactions of an account, oldest first.
///
/// # Errors
///
/// Returns [Error::SqlError] if the query fails.
pub fn get_account_transactions(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, amount, status, description, created_at \
            FROM transactions WHERE account_id = ?1 ORDER BY id ASC",
        )?
        .query_map([account_id], map_row_to_transaction)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

fn map_row_to_transaction(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        amount: row.get(2)?,
        status: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
    })
}
