//! The account model and the SQL queries for storing and fetching accounts.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::UserID, transaction::TransactionStatus};

/// The database ID of an account.
pub type AccountId = i64;

type RowsAffected = usize;

/// The kind of financial account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// An everyday transaction account.
    Checking,
    /// A savings account.
    Savings,
    /// A credit card or line of credit.
    Credit,
    /// A term deposit.
    Deposit,
    /// A brokerage or investment account.
    Investment,
    /// Physical cash.
    Cash,
}

impl AccountType {
    /// All account types in the order they are shown to users.
    pub const ALL: [AccountType; 6] = [
        AccountType::Checking,
        AccountType::Savings,
        AccountType::Credit,
        AccountType::Deposit,
        AccountType::Investment,
        AccountType::Cash,
    ];

    /// The lowercase name used in the database and in JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Credit => "credit",
            AccountType::Deposit => "deposit",
            AccountType::Investment => "investment",
            AccountType::Cash => "cash",
        }
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountType::ALL
            .into_iter()
            .find(|account_type| account_type.as_str() == s)
            .ok_or_else(|| Error::InvalidAccountType(s.to_owned()))
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for AccountType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        text.parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A financial account owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user that owns the account.
    #[serde(skip_serializing)]
    pub user_id: UserID,
    /// The display name of the account.
    pub name: String,
    /// The kind of account.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// The currency code, e.g. "KZT".
    pub currency: String,
    /// The ID of the bank that holds the account, if any.
    pub bank_id: Option<String>,
    /// The balance when the account was added.
    pub initial_balance: f64,
    /// The initial balance plus all confirmed transactions.
    pub current_balance: f64,
    /// Whether the account has been archived (soft deleted).
    pub archived: bool,
    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The validated fields for a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The display name of the account.
    pub name: String,
    /// The kind of account.
    pub account_type: AccountType,
    /// A currency code from the currency reference list.
    pub currency: String,
    /// A bank ID from the bank reference list.
    pub bank_id: Option<String>,
    /// The balance when the account was added.
    pub initial_balance: f64,
}

/// The validated fields to change on an existing account.
///
/// Fields set to `None` are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountUpdate {
    /// The new display name.
    pub name: Option<String>,
    /// The new account type.
    pub account_type: Option<AccountType>,
    /// The new currency code.
    pub currency: Option<String>,
    /// The new bank ID.
    pub bank_id: Option<String>,
}

/// Create the account table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id),
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            currency TEXT NOT NULL,
            bank_id TEXT,
            initial_balance REAL NOT NULL DEFAULT 0,
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_accounts_user_id ON accounts(user_id)",
        (),
    )?;

    Ok(())
}

const SELECT_ACCOUNT_COLUMNS: &str = "SELECT id, user_id, name, type, currency, bank_id, \
    initial_balance, archived, created_at FROM accounts";

/// Map a row selected with [SELECT_ACCOUNT_COLUMNS] to an account.
///
/// The current balance is set to the initial balance, see [with_current_balance].
fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let initial_balance = row.get(6)?;

    Ok(Account {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        account_type: row.get(3)?,
        currency: row.get(4)?,
        bank_id: row.get(5)?,
        initial_balance,
        current_balance: initial_balance,
        archived: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// The sum of the confirmed transactions for an account.
///
/// # Errors
///
/// Returns [Error::SqlError] if the query fails.
pub fn get_confirmed_transaction_total(
    account_id: AccountId,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions \
            WHERE account_id = ?1 AND status = ?2",
            (account_id, TransactionStatus::Confirmed),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

fn with_current_balance(mut account: Account, connection: &Connection) -> Result<Account, Error> {
    account.current_balance =
        account.initial_balance + get_confirmed_transaction_total(account.id, connection)?;

    Ok(account)
}

/// Insert a new account owned by `user_id` and return its ID.
///
/// # Errors
///
/// Returns [Error::SqlError] if the insert fails, e.g. if the user does not exist.
pub fn create_account(
    user_id: UserID,
    account: &NewAccount,
    connection: &Connection,
) -> Result<AccountId, Error> {
    connection.execute(
        "INSERT INTO accounts (user_id, name, type, currency, bank_id, initial_balance, archived, created_at) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        (
            user_id.as_i64(),
            &account.name,
            account.account_type,
            &account.currency,
            &account.bank_id,
            account.initial_balance,
            OffsetDateTime::now_utc(),
        ),
    )?;

    Ok(connection.last_insert_rowid())
}

/// Get the account with `account_id` if it is owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the account does not exist or is owned by
/// another user, or [Error::SqlError] if a query fails.
pub fn get_account(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = connection.query_row(
        &format!("{SELECT_ACCOUNT_COLUMNS} WHERE id = ?1 AND user_id = ?2"),
        (account_id, user_id.as_i64()),
        map_row_to_account,
    )?;

    with_current_balance(account, connection)
}

/// Get the accounts owned by `user_id`, newest first.
///
/// Archived accounts are only included if `include_archived` is true.
///
/// # Errors
///
/// Returns [Error::SqlError] if a query fails.
pub fn list_accounts(
    user_id: UserID,
    include_archived: bool,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    let mut statement = connection.prepare(&format!(
        "{SELECT_ACCOUNT_COLUMNS} WHERE user_id = ?1 AND (?2 OR archived = 0) \
        ORDER BY created_at DESC, id DESC"
    ))?;

    statement
        .query_map((user_id.as_i64(), include_archived), map_row_to_account)?
        .map(|maybe_account| {
            maybe_account
                .map_err(Error::from)
                .and_then(|account| with_current_balance(account, connection))
        })
        .collect()
}

/// Whether an account with `account_id` exists and is owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::SqlError] if the query fails.
pub fn account_exists(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?1 AND user_id = ?2)",
            (account_id, user_id.as_i64()),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Apply the fields set in `update` to the account in a single statement.
///
/// Returns the number of rows changed, which is zero if the account does not
/// exist or is owned by another user.
///
/// # Errors
///
/// Returns [Error::NoFieldsToUpdate] if `update` is empty, or
/// [Error::SqlError] if the update fails.
pub fn update_account(
    account_id: AccountId,
    user_id: UserID,
    update: &AccountUpdate,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let user_id = user_id.as_i64();
    let mut assignments = Vec::new();
    let mut params: Vec<(&str, &dyn ToSql)> = Vec::new();

    if let Some(name) = &update.name {
        assignments.push("name = :name");
        params.push((":name", name as &dyn ToSql));
    }
    if let Some(account_type) = &update.account_type {
        assignments.push("type = :type");
        params.push((":type", account_type as &dyn ToSql));
    }
    if let Some(currency) = &update.currency {
        assignments.push("currency = :currency");
        params.push((":currency", currency as &dyn ToSql));
    }
    if let Some(bank_id) = &update.bank_id {
        assignments.push("bank_id = :bank_id");
        params.push((":bank_id", bank_id as &dyn ToSql));
    }

    if assignments.is_empty() {
        return Err(Error::NoFieldsToUpdate);
    }

    params.push((":id", &account_id as &dyn ToSql));
    params.push((":user_id", &user_id as &dyn ToSql));

    connection
        .execute(
            &format!(
                "UPDATE accounts SET {} WHERE id = :id AND user_id = :user_id",
                assignments.join(", ")
            ),
            params.as_slice(),
        )
        .map_err(Error::from)
}

/// Set the archived flag of an account owned by `user_id`.
///
/// Returns the number of rows changed, which is zero if the account does not
/// exist or is owned by another user. Archiving an archived account, or
/// restoring an active one, still counts as a change.
///
/// # Errors
///
/// Returns [Error::SqlError] if the update fails.
pub fn set_archived(
    account_id: AccountId,
    user_id: UserID,
    archived: bool,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE accounts SET archived = ?1 WHERE id = ?2 AND user_id = ?3",
            (archived, account_id, user_id.as_i64()),
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod account_type_tests {
    use crate::Error;

    use super::AccountType;

    #[test]
    fn parses_all_types() {
        for account_type in AccountType::ALL {
            assert_eq!(account_type.as_str().parse(), Ok(account_type));
        }
    }

    #[test]
    fn rejects_unknown_type() {
        assert_eq!(
            "piggybank".parse::<AccountType>(),
            Err(Error::InvalidAccountType("piggybank".to_owned()))
        );
    }

    #[test]
    fn serializes_as_lowercase() {
        assert_eq!(
            serde_json::to_string(&AccountType::Investment).unwrap(),
            "\"investment\""
        );
    }
}
