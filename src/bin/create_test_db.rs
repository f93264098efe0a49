use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use finance_tracker::{
    AccountType, Email, NewAccount, NewTransaction, PasswordHash, ReferenceData,
    TransactionStatus, ValidatedPassword, create_account, create_transaction, create_user,
    initialize_db,
};

/// A utility for creating a test database for the finance tracker server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// Directory containing `currencies.json`, used to pick the currency of the test accounts.
    #[arg(long, default_value = "static/data")]
    data_dir: PathBuf,
}

const TEST_EMAIL: &str = "test@example.com";
const TEST_PASSWORD: &str = "password123";

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    let currency = ReferenceData::new(&args.data_dir)
        .load_currencies()
        .default_currency()
        .map(|currency| currency.code.clone())
        .unwrap_or_else(|| {
            eprintln!(
                "No currencies found in {:#?}, falling back to KZT.",
                args.data_dir
            );
            "KZT".to_owned()
        });

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {TEST_EMAIL} with password {TEST_PASSWORD}...");
    let password_hash = PasswordHash::new(
        ValidatedPassword::new(TEST_PASSWORD)?,
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(Email::new(TEST_EMAIL)?, password_hash, &conn)?;

    println!("Creating test accounts...");
    let accounts = [
        ("Everyday", AccountType::Checking, Some("kaspi"), 150_000.0),
        ("Rainy day fund", AccountType::Savings, Some("halyk"), 1_000_000.0),
        ("Wallet", AccountType::Cash, None, 20_000.0),
    ];

    for (name, account_type, bank_id, initial_balance) in accounts {
        let account_id = create_account(
            user.id,
            &NewAccount {
                name: name.to_owned(),
                account_type,
                currency: currency.clone(),
                bank_id: bank_id.map(str::to_owned),
                initial_balance,
            },
            &conn,
        )?;

        let transactions = [
            (-4_500.0, TransactionStatus::Confirmed, "Groceries"),
            (25_000.0, TransactionStatus::Confirmed, "Salary"),
            (-12_000.0, TransactionStatus::Pending, "Online order"),
            (-3_000.0, TransactionStatus::Cancelled, "Refunded taxi"),
        ];

        for (amount, status, description) in transactions {
            create_transaction(
                &NewTransaction {
                    account_id,
                    amount,
                    status,
                    description: Some(description.to_owned()),
                },
                &conn,
            )?;
        }
    }

    println!("Success!");

    Ok(())
}
