//! The JSON bodies for creating and editing accounts and how they are validated.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    Error,
    account::{AccountType, AccountUpdate, NewAccount},
    reference_data::ReferenceData,
};

/// The request body for creating an account.
#[derive(Debug, Default, Deserialize)]
pub struct CreateAccountForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub bank_id: Option<String>,
    /// Either a JSON number or a numeric string.
    #[serde(default)]
    pub initial_balance: Option<Value>,
}

/// The request body for editing an account.
///
/// Only the fields that are present are changed.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAccountForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub bank_id: Option<String>,
}

/// Trim `value` and treat empty strings as missing.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_initial_balance(value: Option<&Value>) -> Result<f64, Error> {
    let balance = match value {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    balance
        .filter(|balance| balance.is_finite())
        .ok_or(Error::InvalidInitialBalance)
}

fn check_currency(currency: &str, reference_data: &ReferenceData) -> Result<(), Error> {
    if reference_data.is_known_currency(currency) {
        Ok(())
    } else {
        Err(Error::UnknownCurrency(currency.to_owned()))
    }
}

fn check_bank(bank_id: &str, reference_data: &ReferenceData) -> Result<(), Error> {
    if reference_data.is_known_bank(bank_id) {
        Ok(())
    } else {
        Err(Error::UnknownBank(bank_id.to_owned()))
    }
}

/// Check a new account against the reference data.
///
/// The checks run in a fixed order and the first failure is returned: the
/// name, then that a type and currency were given, the currency, the bank,
/// the initial balance and finally the account type.
///
/// # Errors
///
/// Returns the [Error] for the first failed check.
pub fn validate_new_account(
    form: &CreateAccountForm,
    reference_data: &ReferenceData,
) -> Result<NewAccount, Error> {
    let name = non_empty(form.name.as_deref()).ok_or(Error::EmptyAccountName)?;
    let raw_account_type =
        non_empty(form.account_type.as_deref()).ok_or(Error::MissingAccountType)?;
    let currency = non_empty(form.currency.as_deref()).ok_or(Error::MissingCurrency)?;
    check_currency(currency, reference_data)?;

    let bank_id = non_empty(form.bank_id.as_deref());
    if let Some(bank_id) = bank_id {
        check_bank(bank_id, reference_data)?;
    }

    let initial_balance = parse_initial_balance(form.initial_balance.as_ref())?;
    let account_type = raw_account_type.parse()?;

    Ok(NewAccount {
        name: name.to_owned(),
        account_type,
        currency: currency.to_owned(),
        bank_id: bank_id.map(str::to_owned),
        initial_balance,
    })
}

/// Check the supplied fields of an account edit against the reference data.
///
/// Empty or null values for the type, currency and bank count as not
/// supplied. A supplied name must not be blank.
///
/// # Errors
///
/// Returns [Error::NoFieldsToUpdate] if no field was supplied, otherwise the
/// [Error] for the first supplied field that fails validation.
pub fn validate_account_update(
    form: &UpdateAccountForm,
    reference_data: &ReferenceData,
) -> Result<AccountUpdate, Error> {
    let name = form.name.as_deref().map(str::trim);
    let account_type = non_empty(form.account_type.as_deref());
    let currency = non_empty(form.currency.as_deref());
    let bank_id = non_empty(form.bank_id.as_deref());

    if name.is_none() && account_type.is_none() && currency.is_none() && bank_id.is_none() {
        return Err(Error::NoFieldsToUpdate);
    }

    if name.is_some_and(str::is_empty) {
        return Err(Error::EmptyAccountName);
    }

    let account_type = account_type
        .map(str::parse::<AccountType>)
        .transpose()?;

    if let Some(currency) = currency {
        check_currency(currency, reference_data)?;
    }

    if let Some(bank_id) = bank_id {
        check_bank(bank_id, reference_data)?;
    }

    Ok(AccountUpdate {
        name: name.map(str::to_owned),
        account_type,
        currency: currency.map(str::to_owned),
        bank_id: bank_id.map(str::to_owned),
    })
}

#[cfg(test)]
mod validate_new_account_tests {
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use crate::{
        Error,
        account::AccountType,
        reference_data::ReferenceData,
        test_utils::write_reference_data,
    };

    use super::{CreateAccountForm, validate_new_account};

    fn reference_data() -> (TempDir, ReferenceData) {
        let dir = tempfile::tempdir().unwrap();
        write_reference_data(dir.path());
        let reference_data = ReferenceData::new(dir.path());

        (dir, reference_data)
    }

    fn form(body: Value) -> CreateAccountForm {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn valid_form_is_trimmed() {
        let (_dir, reference_data) = reference_data();

        let account = validate_new_account(
            &form(json!({
                "name": "  Kaspi Gold ",
                "type": "checking",
                "currency": " KZT ",
                "bank_id": "kaspi",
                "initial_balance": 100000
            })),
            &reference_data,
        )
        .unwrap();

        assert_eq!(account.name, "Kaspi Gold");
        assert_eq!(account.account_type, AccountType::Checking);
        assert_eq!(account.currency, "KZT");
        assert_eq!(account.bank_id.as_deref(), Some("kaspi"));
        assert_eq!(account.initial_balance, 100000.0);
    }

    #[test]
    fn initial_balance_defaults_to_zero_and_accepts_strings() {
        let (_dir, reference_data) = reference_data();

        for (balance, want) in [
            (Value::Null, 0.0),
            (json!(""), 0.0),
            (json!("12.5"), 12.5),
            (json!(-3), -3.0),
        ] {
            let account = validate_new_account(
                &form(json!({
                    "name": "Cash",
                    "type": "cash",
                    "currency": "USD",
                    "initial_balance": balance
                })),
                &reference_data,
            )
            .unwrap();

            assert_eq!(account.initial_balance, want);
            assert_eq!(account.bank_id, None);
        }
    }

    #[test]
    fn bad_initial_balance_is_rejected() {
        let (_dir, reference_data) = reference_data();

        for balance in [json!("abc"), json!("inf"), json!("NaN"), json!(true), json!([1])] {
            let result = validate_new_account(
                &form(json!({
                    "name": "Cash",
                    "type": "cash",
                    "currency": "USD",
                    "initial_balance": balance
                })),
                &reference_data,
            );

            assert_eq!(result, Err(Error::InvalidInitialBalance), "{balance}");
        }
    }

    #[test]
    fn empty_bank_id_counts_as_missing() {
        let (_dir, reference_data) = reference_data();

        let account = validate_new_account(
            &form(json!({ "name": "Cash", "type": "cash", "currency": "USD", "bank_id": "" })),
            &reference_data,
        )
        .unwrap();

        assert_eq!(account.bank_id, None);
    }

    #[test]
    fn checks_run_in_order() {
        let (_dir, reference_data) = reference_data();

        let cases = [
            (json!({}), Error::EmptyAccountName),
            (json!({ "name": "  " }), Error::EmptyAccountName),
            (json!({ "name": "A" }), Error::MissingAccountType),
            (json!({ "name": "A", "type": "bogus" }), Error::MissingCurrency),
            (
                json!({ "name": "A", "type": "bogus", "currency": "XYZ" }),
                Error::UnknownCurrency("XYZ".to_owned()),
            ),
            (
                json!({ "name": "A", "type": "bogus", "currency": "KZT", "bank_id": "nobank" }),
                Error::UnknownBank("nobank".to_owned()),
            ),
            (
                json!({ "name": "A", "type": "bogus", "currency": "KZT", "initial_balance": "x" }),
                Error::InvalidInitialBalance,
            ),
            (
                json!({ "name": "A", "type": "bogus", "currency": "KZT" }),
                Error::InvalidAccountType("bogus".to_owned()),
            ),
        ];

        for (body, want) in cases {
            assert_eq!(
                validate_new_account(&form(body.clone()), &reference_data),
                Err(want),
                "{body}"
            );
        }
    }

    #[test]
    fn every_currency_fails_without_reference_data() {
        let dir = tempfile::tempdir().unwrap();
        let reference_data = ReferenceData::new(dir.path());

        let result = validate_new_account(
            &form(json!({ "name": "A", "type": "cash", "currency": "KZT" })),
            &reference_data,
        );

        assert_eq!(result, Err(Error::UnknownCurrency("KZT".to_owned())));
    }
}
