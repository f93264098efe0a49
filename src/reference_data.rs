//! Loads the bank and currency lists used to validate accounts.
//!
//! The lists are read from `banks.json` and `currencies.json` on every call so
//! that edits to the documents are picked up without restarting the server.

use std::{
    fs,
    path::{Path, PathBuf},
};

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

/// The file name of the bank list in the reference data directory.
pub const BANKS_FILE_NAME: &str = "banks.json";
/// The file name of the currency list in the reference data directory.
pub const CURRENCIES_FILE_NAME: &str = "currencies.json";

/// A bank that accounts can be linked to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    /// The short ID stored on accounts, e.g. "kaspi".
    pub id: String,
    /// The display name.
    pub name: String,
    /// A CSS color for the bank's badge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A currency that accounts can be held in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// The ISO 4217 code, e.g. "KZT".
    pub code: String,
    /// The display name.
    pub name: String,
    /// The currency sign, e.g. "₸".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Whether this is the currency suggested for new accounts.
    #[serde(default)]
    pub default: bool,
}

/// The contents of `banks.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankList {
    /// The supported banks.
    pub banks: Vec<Bank>,
}

/// The contents of `currencies.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyList {
    /// The supported currencies.
    pub currencies: Vec<Currency>,
}

impl CurrencyList {
    /// The first currency flagged as default, or the first currency if none are.
    pub fn default_currency(&self) -> Option<&Currency> {
        self.currencies
            .iter()
            .find(|currency| currency.default)
            .or_else(|| self.currencies.first())
    }

    /// Whether `code` is one of the listed currency codes.
    pub fn contains(&self, code: &str) -> bool {
        self.currencies.iter().any(|currency| currency.code == code)
    }
}

impl BankList {
    /// Whether `id` is one of the listed bank IDs.
    pub fn contains(&self, id: &str) -> bool {
        self.banks.iter().any(|bank| bank.id == id)
    }
}

/// The location of the reference documents.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceData {
    dir: PathBuf,
}

impl ReferenceData {
    /// Read reference documents from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory the documents are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the bank list.
    ///
    /// A missing or invalid document is logged and gives an empty list.
    pub fn load_banks(&self) -> BankList {
        load_or_default(&self.dir.join(BANKS_FILE_NAME))
    }

    /// Load the currency list.
    ///
    /// A missing or invalid document is logged and gives an empty list.
    pub fn load_currencies(&self) -> CurrencyList {
        load_or_default(&self.dir.join(CURRENCIES_FILE_NAME))
    }

    /// Whether `code` is a supported currency.
    pub fn is_known_currency(&self, code: &str) -> bool {
        self.load_currencies().contains(code)
    }

    /// Whether `id` is a supported bank.
    pub fn is_known_bank(&self, id: &str) -> bool {
        self.load_banks().contains(id)
    }
}

fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!("Could not read {}: {error}", path.display());
            return T::default();
        }
    };

    serde_json::from_str(&text).unwrap_or_else(|error| {
        tracing::warn!("Could not parse {}: {error}", path.display());
        T::default()
    })
}

/// A route handler for the list of supported banks.
pub async fn get_banks_endpoint(State(reference_data): State<ReferenceData>) -> Response {
    let BankList { banks } = reference_data.load_banks();

    Json(json!({ "success": true, "banks": banks })).into_response()
}

/// A route handler for the list of supported currencies.
pub async fn get_currencies_endpoint(State(reference_data): State<ReferenceData>) -> Response {
    let CurrencyList { currencies } = reference_data.load_currencies();

    Json(json!({ "success": true, "currencies": currencies })).into_response()
}
