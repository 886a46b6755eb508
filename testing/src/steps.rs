//! Reusable scenario steps.
//!
//! Every step that moves money follows the same shape: call the API, wait for
//! the wallet event on NATS, apply the command to the player's
//! [`WalletModel`], then wait for the Redis aggregate to reach the event's
//! sequence. Scenarios then compare whatever they care about.

use crate::context::TestContext;
use crate::error::{HarnessError, Result};
use crate::fixtures;
use crate::player::RegisteredPlayer;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use uuid::Uuid;
use wallet_e2e_clients::dto::cap::{BalanceAdjustmentRequest, UpdateBlockersRequest};
use wallet_e2e_clients::dto::manager::{
    BetRequest, MakePaymentRequest, RefundRequest, RollbackRequest, TournamentRequest,
    TransactionResponse, WinRequest,
};
use wallet_e2e_clients::dto::public::{
    DepositRequest, FastRegistrationRequest, LaunchGameRequest, LoginRequest, PaymentResponse,
    TurnoverLimitRequest, WithdrawalRequest,
};
use wallet_e2e_core::aggregate::WalletAggregate;
use wallet_e2e_core::event::{
    BalanceAdjusted, BettingPayment, BlockAmountStarted, BlockersChanged, DepositedMoney,
    LimitChanged, WalletEvent, WalletEventType,
};
use wallet_e2e_core::expectation::Expectation;
use wallet_e2e_core::limit::{IntervalType, TurnoverLimit};
use wallet_e2e_core::model::{Outcome, WalletCommand, WalletModel};
use wallet_e2e_core::projection::ProjectionMessage;

/// Filter applied to wallet events.
pub type EventFilter = Box<dyn Fn(&WalletEvent) -> bool + Send + Sync>;

/// A command the platform accepted and every store caught up with.
#[derive(Debug, Clone)]
pub struct Confirmed {
    /// Event published for the command
    pub event: WalletEvent,
    /// `limit_changed_v2` that followed a wager, if any
    pub limit_event: Option<WalletEvent>,
    /// What the model predicted
    pub outcome: Outcome,
    /// Aggregate once it applied the event
    pub aggregate: WalletAggregate,
}

/// Steps shared by the scenarios, bound to one [`TestContext`].
#[derive(Debug, Clone, Copy)]
pub struct DefaultTestSteps<'a> {
    ctx: &'a TestContext,
}

impl<'a> DefaultTestSteps<'a> {
    /// Bind the steps to a context.
    #[must_use]
    pub const fn new(ctx: &'a TestContext) -> Self {
        Self { ctx }
    }

    /// Register a fresh player, fund their wallet and seed its model.
    ///
    /// The wallet is looked up by the configured currency. A positive
    /// `initial_balance` is credited with a CAP balance adjustment.
    ///
    /// # Errors
    ///
    /// Fails if any API call fails, the wallet is missing, or an event or
    /// aggregate update does not arrive in time.
    pub async fn register_player(&self, initial_balance: Decimal) -> Result<RegisteredPlayer> {
        let config = &self.ctx.config;
        let registration = self
            .ctx
            .public
            .fast_registration(&FastRegistrationRequest {
                country: config.player.country.clone(),
                currency: config.player.currency.clone(),
            })
            .await?;
        let username = registration.username.clone();
        let token = self
            .ctx
            .public
            .login(&LoginRequest::from(registration))
            .await?
            .token;

        let public = self.ctx.public.with_token(token.clone());
        let profile = public.profile().await?;
        let wallet = public
            .wallets()
            .await?
            .into_iter()
            .find(|w| w.currency == config.player.currency)
            .ok_or_else(|| {
                HarnessError::Setup(format!(
                    "player {} has no {} wallet",
                    profile.player_uuid, config.player.currency
                ))
            })?;

        let mut player = RegisteredPlayer {
            player_uuid: profile.player_uuid,
            wallet_uuid: wallet.wallet_uuid,
            username,
            token,
            public,
            session_token: None,
            subject: self.ctx.wallet_subject(profile.player_uuid, wallet.wallet_uuid),
            model: WalletModel::new(wallet.currency, Decimal::ZERO),
            last_sequence: 0,
        };

        let created = self
            .expect_wallet_event(&player, WalletEventType::WalletCreated, |_| true)
            .await?;
        player.observe(created.sequence);
        let aggregate = self.sync_aggregate(&player).await?;
        player.model = WalletModel::from_aggregate(&aggregate);

        if initial_balance > Decimal::ZERO {
            self.adjust_balance(&mut player, initial_balance).await?;
        }

        tracing::info!(
            player_uuid = %player.player_uuid,
            wallet_uuid = %player.wallet_uuid,
            balance = %player.expected_balance(),
            "Registered player"
        );
        Ok(player)
    }

    /// Credit (positive) or debit (negative) the wallet through CAP.
    ///
    /// # Errors
    ///
    /// Fails if the adjustment is rejected or never observed.
    pub async fn adjust_balance(
        &self,
        player: &mut RegisteredPlayer,
        amount: Decimal,
    ) -> Result<Confirmed> {
        let request = if amount.is_sign_negative() {
            BalanceAdjustmentRequest::debit(player.currency(), amount.abs())
        } else {
            BalanceAdjustmentRequest::credit(player.currency(), amount)
        };
        self.ctx
            .cap
            .create_balance_adjustment(player.player_uuid, &request)
            .await?;
        self.confirm(player, &WalletCommand::AdjustBalance { amount })
            .await
    }

    /// Launch the configured game and keep its session token.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Setup`] if `GAME_UUID` is not a UUID, or the
    /// client error if the launch is rejected.
    pub async fn launch_game(&self, player: &mut RegisteredPlayer) -> Result<String> {
        let raw = &self.ctx.config.player.game_uuid;
        let game_uuid = Uuid::parse_str(raw)
            .map_err(|e| HarnessError::Setup(format!("GAME_UUID '{raw}' is not a UUID: {e}")))?;

        let launched = player
            .public
            .launch_game(&LaunchGameRequest::real(game_uuid))
            .await?;
        player.session_token = Some(launched.session_token.clone());
        Ok(launched.session_token)
    }

    /// Place a regular bet of `amount` in a fresh round.
    ///
    /// # Errors
    ///
    /// See [`DefaultTestSteps::bet`].
    pub async fn place_bet(
        &self,
        player: &mut RegisteredPlayer,
        amount: Decimal,
    ) -> Result<(BetRequest, Confirmed)> {
        let request = BetRequest::new(player.try_session()?, amount);
        let confirmed = self.bet(player, &request).await?;
        Ok((request, confirmed))
    }

    /// Send `/bet` and confirm it.
    ///
    /// # Errors
    ///
    /// Fails if the bet is rejected or its event never arrives.
    pub async fn bet(&self, player: &mut RegisteredPlayer, request: &BetRequest) -> Result<Confirmed> {
        let response = self.ctx.manager.bet(request).await?;
        let command = fixtures::bet_command(request);
        self.confirm_transaction(player, &command, &response).await
    }

    /// Send `/win` and confirm it.
    ///
    /// # Errors
    ///
    /// Fails if the win is rejected or its event never arrives.
    pub async fn win(&self, player: &mut RegisteredPlayer, request: &WinRequest) -> Result<Confirmed> {
        let response = self.ctx.manager.win(request).await?;
        let command = fixtures::win_command(request);
        self.confirm_transaction(player, &command, &response).await
    }

    /// Send `/refund` and confirm it.
    ///
    /// # Errors
    ///
    /// Fails if the refund is rejected or its event never arrives.
    pub async fn refund(
        &self,
        player: &mut RegisteredPlayer,
        request: &RefundRequest,
    ) -> Result<Confirmed> {
        let response = self.ctx.manager.refund(request).await?;
        let command = fixtures::refund_command(request);
        self.confirm_transaction(player, &command, &response).await
    }

    /// Send `/rollback` and confirm it.
    ///
    /// # Errors
    ///
    /// Fails if the rollback is rejected or its event never arrives.
    pub async fn rollback(
        &self,
        player: &mut RegisteredPlayer,
        request: &RollbackRequest,
    ) -> Result<Confirmed> {
        let response = self.ctx.manager.rollback(request).await?;
        let command = fixtures::rollback_command(request);
        self.confirm_transaction(player, &command, &response).await
    }

    /// Send `/tournament` and confirm it.
    ///
    /// # Errors
    ///
    /// Fails if the award is rejected or its event never arrives.
    pub async fn tournament(
        &self,
        player: &mut RegisteredPlayer,
        request: &TournamentRequest,
    ) -> Result<Confirmed> {
        let response = self.ctx.manager.tournament(request).await?;
        let command = fixtures::tournament_command(request);
        self.confirm_transaction(player, &command, &response).await
    }

    /// Send `/make-payment` and confirm it.
    ///
    /// # Errors
    ///
    /// Fails if the payment is rejected or its event never arrives.
    pub async fn make_payment(
        &self,
        player: &mut RegisteredPlayer,
        request: &MakePaymentRequest,
    ) -> Result<Confirmed> {
        let response = self.ctx.manager.make_payment(request).await?;
        let command = fixtures::payment_command(request);
        self.confirm_transaction(player, &command, &response).await
    }

    /// Deposit `amount` and confirm the credit.
    ///
    /// # Errors
    ///
    /// Fails if the deposit is rejected or `deposited_money` never arrives.
    pub async fn deposit(
        &self,
        player: &mut RegisteredPlayer,
        amount: Decimal,
    ) -> Result<(PaymentResponse, Confirmed)> {
        let response = player
            .public
            .deposit(&DepositRequest::new(amount, player.currency()))
            .await?;
        let command = WalletCommand::Deposit {
            deposit_uuid: response.transaction_uuid,
            amount,
        };
        let confirmed = self.confirm(player, &command).await?;
        Ok((response, confirmed))
    }

    /// Request a withdrawal of `amount` and confirm the hold.
    ///
    /// # Errors
    ///
    /// Fails if the withdrawal is rejected or `block_amount_started` never
    /// arrives.
    pub async fn withdraw(
        &self,
        player: &mut RegisteredPlayer,
        amount: Decimal,
    ) -> Result<(PaymentResponse, Confirmed)> {
        let response = player
            .public
            .withdrawal(&WithdrawalRequest::new(amount, player.currency()))
            .await?;
        let command = WalletCommand::Withdrawal {
            withdrawal_uuid: response.transaction_uuid,
            amount,
        };
        let confirmed = self.confirm(player, &command).await?;
        Ok((response, confirmed))
    }

    /// Create a turnover limit starting now and wait until it is in force.
    ///
    /// # Errors
    ///
    /// Fails if the limit is rejected or `limit_changed_v2` never arrives.
    pub async fn create_turnover_limit(
        &self,
        player: &mut RegisteredPlayer,
        interval: IntervalType,
        amount: Decimal,
    ) -> Result<WalletEvent> {
        let currency = player.currency().to_string();
        player
            .public
            .create_turnover_limit(&TurnoverLimitRequest::starting_now(
                currency.clone(),
                interval,
                amount,
            ))
            .await?;

        let event = self
            .expect_wallet_event(player, WalletEventType::LimitChangedV2, move |e| {
                e.decode::<LimitChanged>().is_ok_and(|change| {
                    change
                        .turnover(interval)
                        .is_some_and(|limit| limit.amount == amount)
                })
            })
            .await?;
        player.observe(event.sequence);
        player
            .model
            .set_turnover_limit(TurnoverLimit::new(amount, interval, currency));
        self.sync_aggregate(player).await?;
        Ok(event)
    }

    /// Enable or disable gambling and betting through CAP.
    ///
    /// # Errors
    ///
    /// Fails if the update is rejected or never observed.
    pub async fn update_blockers(
        &self,
        player: &mut RegisteredPlayer,
        gambling_enabled: bool,
        betting_enabled: bool,
    ) -> Result<WalletEvent> {
        self.ctx
            .cap
            .update_blockers(
                player.player_uuid,
                &UpdateBlockersRequest {
                    gambling_enabled,
                    betting_enabled,
                },
            )
            .await?;

        let event = self
            .expect_wallet_event(player, WalletEventType::SettingPreventGambleSetted, move |e| {
                e.decode::<BlockersChanged>().is_ok_and(|b| {
                    b.is_gambling_active == gambling_enabled && b.is_betting_active == betting_enabled
                })
            })
            .await?;
        player.observe(event.sequence);
        player.model.set_blockers(gambling_enabled, betting_enabled);
        self.sync_aggregate(player).await?;
        Ok(event)
    }

    /// Wait for the next event of `event_type` on the player's wallet that
    /// satisfies `predicate`.
    ///
    /// Only events newer than the last one the player observed are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Bus`] on timeout or subscription failure.
    pub async fn expect_wallet_event<F>(
        &self,
        player: &RegisteredPlayer,
        event_type: WalletEventType,
        predicate: F,
    ) -> Result<WalletEvent>
    where
        F: Fn(&WalletEvent) -> bool + Send + Sync + 'static,
    {
        let stream = self.ctx.nats.subscribe(&player.subject).await?;
        let event = Expectation::new(stream)
            .of_type(event_type.as_str())
            .after_sequence(player.last_sequence + 1)
            .matching(predicate)
            .within(self.ctx.config.event_timeout())
            .describe(format!("{event_type} on {}", player.subject))
            .fetch()
            .await?;

        tracing::debug!(event_type = %event.event_type, sequence = event.sequence, "Observed wallet event");
        Ok(event)
    }

    /// Check that no event of `event_type` newer than the last observed one
    /// shows up within the event timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Bus`] if such an event arrives.
    pub async fn expect_no_wallet_event(
        &self,
        player: &RegisteredPlayer,
        event_type: WalletEventType,
    ) -> Result<()> {
        let stream = self.ctx.nats.subscribe(&player.subject).await?;
        Expectation::new(stream)
            .of_type(event_type.as_str())
            .after_sequence(player.last_sequence + 1)
            .within(self.ctx.config.event_timeout())
            .assert_none()
            .await?;
        Ok(())
    }

    /// Find the Kafka projection of `event` and check it mirrors the event.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Bus`] if no projection arrives in time and
    /// [`HarnessError::Mismatch`] if it differs from the event.
    pub async fn assert_projection_mirrors(
        &self,
        player: &RegisteredPlayer,
        event: &WalletEvent,
    ) -> Result<ProjectionMessage> {
        let wallet_uuid = player.wallet_uuid;
        let sequence = event.sequence;
        let since = published_at(event, self.ctx.config.event_timeout());
        let stream = self
            .ctx
            .kafka
            .subscribe_since(&self.ctx.config.kafka.projection_topic, since)
            .await?;
        let projection = Expectation::new(stream)
            .of_type(event.event_type.as_str())
            .matching(move |m: &ProjectionMessage| {
                m.wallet_uuid == wallet_uuid && m.seq_number == sequence
            })
            .within(self.ctx.config.event_timeout())
            .describe(format!("projection of {} #{sequence}", event.event_type))
            .fetch()
            .await?;

        if projection.mirrors(event) {
            Ok(projection)
        } else {
            Err(HarnessError::Mismatch(format!(
                "projection #{sequence} differs from NATS event: {} vs {}",
                projection.payload, event.payload
            )))
        }
    }

    /// Wait until the Redis aggregate has applied the last observed event.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Cache`] if it does not catch up in time.
    pub async fn sync_aggregate(&self, player: &RegisteredPlayer) -> Result<WalletAggregate> {
        Ok(self
            .ctx
            .redis
            .wait_for_sequence(
                player.wallet_uuid,
                player.last_sequence,
                &self.ctx.config.poll_policy(),
            )
            .await?)
    }

    /// Observe the event of an accepted `command`, apply it to the model and
    /// wait for the aggregate.
    ///
    /// When the model expects a `limit_changed_v2` to follow, that event is
    /// awaited too.
    ///
    /// # Errors
    ///
    /// Fails if an event or the aggregate does not arrive in time, or if the
    /// model rejects a command the platform accepted.
    pub async fn confirm(
        &self,
        player: &mut RegisteredPlayer,
        command: &WalletCommand,
    ) -> Result<Confirmed> {
        let event = self
            .expect_wallet_event(player, command.expected_event(), event_filter(command))
            .await?;
        player.observe(event.sequence);

        let outcome = player.model.execute(command).map_err(|rejection| {
            HarnessError::Mismatch(format!(
                "platform accepted {} but the model expected {rejection}",
                command.kind()
            ))
        })?;

        let limit_event = if outcome.limit_changed {
            let limit = self
                .expect_wallet_event(player, WalletEventType::LimitChangedV2, |_| true)
                .await?;
            player.observe(limit.sequence);
            Some(limit)
        } else {
            None
        };

        let aggregate = self.sync_aggregate(player).await?;
        Ok(Confirmed {
            event,
            limit_event,
            outcome,
            aggregate,
        })
    }

    async fn confirm_transaction(
        &self,
        player: &mut RegisteredPlayer,
        command: &WalletCommand,
        response: &TransactionResponse,
    ) -> Result<Confirmed> {
        let confirmed = self.confirm(player, command).await?;
        if response.balance != confirmed.outcome.balance {
            return Err(HarnessError::Mismatch(format!(
                "{} reported balance {} but the model expected {}",
                command.kind(),
                response.balance,
                confirmed.outcome.balance
            )));
        }
        Ok(confirmed)
    }
}

/// When `event` was published, or the earliest it can have been if NATS did
/// not say.
fn published_at(event: &WalletEvent, window: Duration) -> DateTime<Utc> {
    event.timestamp.unwrap_or_else(|| {
        let window =
            chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::zero());
        Utc::now() - window
    })
}

/// Filter recognising the event a command produces.
#[must_use]
pub fn event_filter(command: &WalletCommand) -> EventFilter {
    match command.clone() {
        WalletCommand::Bet { transaction_id, .. }
        | WalletCommand::Win { transaction_id, .. }
        | WalletCommand::Tournament { transaction_id, .. }
        | WalletCommand::Refund { transaction_id, .. }
        | WalletCommand::Rollback { transaction_id, .. } => {
            Box::new(move |e: &WalletEvent| e.concerns_transaction(&transaction_id))
        }
        WalletCommand::BettingPayment {
            bet_id,
            payment_type,
            ..
        } => Box::new(move |e: &WalletEvent| {
            e.decode::<BettingPayment>()
                .is_ok_and(|p| p.bet_id == bet_id && p.payment_type == payment_type)
        }),
        WalletCommand::Deposit { deposit_uuid, .. } => {
            Box::new(move |e: &WalletEvent| e.decode::<DepositedMoney>().is_ok_and(|d| d.uuid == deposit_uuid))
        }
        WalletCommand::Withdrawal {
            withdrawal_uuid,
            amount,
        } => Box::new(move |e: &WalletEvent| {
            e.decode::<BlockAmountStarted>().is_ok_and(|b| {
                b.reason_uuid.map_or(b.amount == amount, |r| r == withdrawal_uuid)
            })
        }),
        WalletCommand::AdjustBalance { amount } => Box::new(move |e: &WalletEvent| {
            e.decode::<BalanceAdjusted>()
                .is_ok_and(|a| a.amount.abs() == amount.abs())
        }),
    }
}
