//! Assertions shared by the scenarios.

use rust_decimal::Decimal;
use std::fmt::{Debug, Display};
use wallet_e2e_clients::ClientError;
use wallet_e2e_core::aggregate::{DepositStatus, WalletAggregate};
use wallet_e2e_core::error::ErrorCode;
use wallet_e2e_core::model::{ModelRejection, WalletCommand, WalletModel};

/// Differences between a cached aggregate and the model.
///
/// Compares balances, blockers, turnover limits, wagering of each
/// successful deposit, total held amount and the cached transaction window.
/// An empty result means they agree.
#[must_use]
pub fn aggregate_discrepancies(aggregate: &WalletAggregate, model: &WalletModel) -> Vec<String> {
    let mut found = Vec::new();

    compare(&mut found, "Balance", aggregate.balance, model.balance());
    compare(
        &mut found,
        "AvailableWithdrawalBalance",
        aggregate.available_withdrawal_balance,
        model.available_withdrawal_balance(),
    );
    compare(
        &mut found,
        "IsGamblingActive",
        aggregate.is_gambling_active,
        model.is_gambling_active(),
    );
    compare(
        &mut found,
        "IsBettingActive",
        aggregate.is_betting_active,
        model.is_betting_active(),
    );

    for limit in model.turnover_limits() {
        if let Some(cached) = aggregate.turnover_limit(limit.interval) {
            compare(&mut found, &format!("{} limit Spent", limit.interval), cached.spent, limit.spent);
            compare(&mut found, &format!("{} limit Rest", limit.interval), cached.rest, limit.rest);
        } else {
            found.push(format!("{} turnover limit missing from aggregate", limit.interval));
        }
    }

    for deposit in aggregate
        .deposits
        .iter()
        .filter(|d| d.status == DepositStatus::Success)
    {
        match model.deposit(deposit.uuid) {
            Some(expected) => compare(
                &mut found,
                &format!("deposit {} WageringAmount", deposit.uuid),
                deposit.wagering_amount,
                expected.wagering,
            ),
            None => found.push(format!("deposit {} unknown to the model", deposit.uuid)),
        }
    }
    for expected in model.deposits() {
        if aggregate.deposit(expected.uuid).is_none() {
            found.push(format!("deposit {} missing from aggregate", expected.uuid));
        }
    }

    let held: Decimal = model.holds().iter().map(|h| h.amount).sum();
    compare(&mut found, "BlockedAmounts", aggregate.total_blocked(), held);

    let mut cached: Vec<&str> = aggregate.gambling.keys().map(String::as_str).collect();
    let mut expected: Vec<&str> = model.cached_transactions().collect();
    cached.sort_unstable();
    expected.sort_unstable();
    if cached != expected {
        found.push(format!(
            "Gambling: aggregate caches {cached:?}, model expects {expected:?}"
        ));
    }

    found
}

fn compare<T: PartialEq + Display>(found: &mut Vec<String>, what: &str, cached: T, expected: T) {
    if cached != expected {
        found.push(format!("{what}: aggregate has {cached}, model expects {expected}"));
    }
}

/// Assert the aggregate agrees with the model.
///
/// # Panics
///
/// Panics listing every discrepancy.
#[allow(clippy::panic)] // Test assertion
pub fn assert_aggregate_matches(aggregate: &WalletAggregate, model: &WalletModel) {
    let found = aggregate_discrepancies(aggregate, model);
    assert!(
        found.is_empty(),
        "Aggregate of wallet {} disagrees with the model:\n  {}",
        aggregate.wallet_uuid,
        found.join("\n  ")
    );
}

/// Assert an API call was rejected with `400` and `code`, returning the error.
///
/// # Panics
///
/// Panics if the call succeeded or failed differently.
#[allow(clippy::panic)] // Test assertion
pub fn assert_api_error<'r, T: Debug>(
    result: &'r Result<T, ClientError>,
    code: &ErrorCode,
) -> &'r ClientError {
    match result {
        Ok(value) => panic!("Expected 400 {code}, but the call succeeded with {value:?}"),
        Err(error) => {
            assert!(
                error.is_bad_request_with(code),
                "Expected 400 {code}, got {error}"
            );
            error
        }
    }
}

/// Assert the model rejects `command` and the platform rejected it the same
/// way, returning the model's rejection.
///
/// # Panics
///
/// Panics if the model accepts the command or the API error does not carry
/// the predicted code.
#[allow(clippy::panic)] // Test assertion
pub fn assert_rejected_as_predicted<T: Debug>(
    model: &WalletModel,
    command: &WalletCommand,
    result: &Result<T, ClientError>,
) -> ModelRejection {
    let rejection = match model.predict(command) {
        Ok(outcome) => panic!("Model accepts {command:?} with {outcome:?}; expected a rejection"),
        Err(rejection) => rejection,
    };
    assert_api_error(result, &rejection.code);
    rejection
}
