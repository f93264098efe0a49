//! Financial accounts owned by users, their balances and the account API.

mod archive_endpoint;
mod core;
mod create_endpoint;
mod edit_endpoint;
mod form;
mod get_endpoint;

pub use archive_endpoint::{archive_account_endpoint, restore_account_endpoint};
pub use core::{
    Account, AccountId, AccountType, AccountUpdate, NewAccount, account_exists, create_account,
    create_account_table, get_account, list_accounts, set_archived, update_account,
};
pub use create_endpoint::create_account_endpoint;
pub use edit_endpoint::edit_account_endpoint;
pub use get_endpoint::{get_account_endpoint, list_accounts_endpoint};
