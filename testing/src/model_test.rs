//! Given-When-Then tests for the wallet model.
//!
//! Runs without any backend and pins down the predictions the live scenarios
//! rely on.

#![allow(clippy::module_name_repetitions)]

use wallet_e2e_core::error::ErrorCode;
use wallet_e2e_core::model::{ModelRejection, Outcome, WalletCommand, WalletModel};

type ModelAssertion = Box<dyn FnOnce(&WalletModel)>;

type ResultAssertion = Box<dyn FnOnce(&Result<Outcome, ModelRejection>)>;

/// Fluent Given-When-Then test of a [`WalletModel`].
///
/// # Example
///
/// ```ignore
/// ModelTest::new()
///     .given_model(WalletModel::new("EUR", dec!(100)))
///     .given(bet("tx-1", dec!(10)))
///     .given(rollback("rb-1", "tx-1"))
///     .when(rollback("rb-2", "tx-1"))
///     .then_rejected_with(ErrorCode::RollbackNotAllowed)
///     .then_model(|m| assert_eq!(m.balance(), dec!(100)))
///     .run();
/// ```
#[must_use = "a model test does nothing until run"]
pub struct ModelTest {
    model: Option<WalletModel>,
    history: Vec<WalletCommand>,
    command: Option<WalletCommand>,
    model_assertions: Vec<ModelAssertion>,
    result_assertions: Vec<ResultAssertion>,
}

impl ModelTest {
    /// An empty test.
    pub const fn new() -> Self {
        Self {
            model: None,
            history: Vec::new(),
            command: None,
            model_assertions: Vec::new(),
            result_assertions: Vec::new(),
        }
    }

    /// Starting state (Given).
    pub fn given_model(mut self, model: WalletModel) -> Self {
        self.model = Some(model);
        self
    }

    /// A command already accepted before the one under test (Given).
    pub fn given(mut self, command: WalletCommand) -> Self {
        self.history.push(command);
        self
    }

    /// Several accepted commands, in order (Given).
    pub fn given_all(mut self, commands: impl IntoIterator<Item = WalletCommand>) -> Self {
        self.history.extend(commands);
        self
    }

    /// The command under test (When).
    pub fn when(mut self, command: WalletCommand) -> Self {
        self.command = Some(command);
        self
    }

    /// Assert on the model after the command (Then).
    pub fn then_model<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&WalletModel) + 'static,
    {
        self.model_assertions.push(Box::new(assertion));
        self
    }

    /// Assert the command was accepted, then on its outcome (Then).
    #[allow(clippy::panic)] // Test assertion
    pub fn then_outcome<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Outcome) + 'static,
    {
        self.result_assertions.push(Box::new(move |result| match result {
            Ok(outcome) => assertion(outcome),
            Err(rejection) => panic!("Expected the command to be accepted, got {rejection}"),
        }));
        self
    }

    /// Assert the command was rejected with `code` (Then).
    #[allow(clippy::panic)] // Test assertion
    pub fn then_rejected_with(mut self, code: ErrorCode) -> Self {
        self.result_assertions.push(Box::new(move |result| match result {
            Ok(outcome) => panic!("Expected {code}, but the command was accepted: {outcome:?}"),
            Err(rejection) => assert_eq!(rejection.code, code, "{rejection}"),
        }));
        self
    }

    /// Run the test.
    ///
    /// # Panics
    ///
    /// Panics if the starting model or command is missing, a given command is
    /// rejected, or any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut model = self
            .model
            .expect("Starting model must be set with given_model()");
        let command = self.command.expect("Command must be set with when()");

        for (index, given) in self.history.iter().enumerate() {
            if let Err(rejection) = model.execute(given) {
                panic!("Given command #{index} {given:?} was rejected: {rejection}");
            }
        }

        let result = model.execute(&command);

        for assertion in self.result_assertions {
            assertion(&result);
        }
        for assertion in self.model_assertions {
            assertion(&model);
        }
    }
}

impl Default for ModelTest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wallet_e2e_core::transaction::GamblingBetType;

    fn bet(id: &str, amount: rust_decimal::Decimal) -> WalletCommand {
        WalletCommand::Bet {
            transaction_id: id.to_string(),
            amount,
            bet_type: GamblingBetType::Bet,
        }
    }

    #[test]
    fn accepted_command_runs_both_assertion_kinds() {
        ModelTest::new()
            .given_model(WalletModel::new("EUR", dec!(100)))
            .when(bet("tx-1", dec!(30)))
            .then_outcome(|outcome| assert_eq!(outcome.balance, dec!(70)))
            .then_model(|model| assert!(model.is_cached("tx-1")))
            .run();
    }

    #[test]
    fn rejection_leaves_model_untouched() {
        ModelTest::new()
            .given_model(WalletModel::new("EUR", dec!(5)))
            .when(bet("tx-1", dec!(30)))
            .then_rejected_with(ErrorCode::InsufficientBalance)
            .then_model(|model| assert_eq!(model.balance(), dec!(5)))
            .run();
    }

    #[test]
    #[should_panic(expected = "was rejected")]
    fn rejected_given_command_fails_the_test() {
        ModelTest::new()
            .given_model(WalletModel::new("EUR", dec!(0)))
            .given(bet("tx-1", dec!(1)))
            .when(bet("tx-2", dec!(1)))
            .run();
    }
}
