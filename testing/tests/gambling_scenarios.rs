//! Casino scenarios: bets, wins, refunds, rollbacks and tournament awards.
//!
//! Run against a deployed stack with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use rust_decimal_macros::dec;
use wallet_e2e_clients::dto::manager::{
    BetRequest, RefundRequest, RollbackRequest, TournamentRequest, WinRequest,
};
use wallet_e2e_core::error::ErrorCode;
use wallet_e2e_core::event::{
    BettedFromGamble, RefundedFromGamble, RollbackedFromGamble, TournamentWonFromGamble,
    WonFromGamble,
};
use wallet_e2e_core::transaction::{GamblingBetType, GamblingWinType};
use wallet_e2e_testing::assertions::{assert_aggregate_matches, assert_rejected_as_predicted};
use wallet_e2e_testing::fixtures::{INITIAL_BALANCE, PAYOUT, STAKE, rollback_command};

#[tokio::test]
#[ignore = "requires deployed wallet stack"]
async fn every_bet_type_debits_and_is_projected() -> anyhow::Result<()> {
    let ctx = common::context().await?;
    let steps = ctx.steps();
    let mut player = common::player_in_game(&ctx, INITIAL_BALANCE).await?;

    for bet_type in [
        GamblingBetType::Bet,
        GamblingBetType::Tips,
        GamblingBetType::Freespin,
    ] {
        let request = BetRequest::new(player.try_session()?, STAKE).with_type(bet_type);
        let confirmed = steps.bet(&mut player, &request).await?;

        let betted: BettedFromGamble = confirmed.event.decode()?;
        assert_eq!(betted.bet_type, bet_type);
        assert_eq!(betted.amount, STAKE);
        assert_eq!(betted.transaction_id, request.transaction_id);
        assert_eq!(betted.currency, player.currency());

        assert_aggregate_matches(&confirmed.aggregate, &player.model);
        steps.assert_projection_mirrors(&player, &confirmed.event).await?;

        let row = ctx
            .db
            .wait_for_gambling_transaction(&request.transaction_id, &ctx.config.poll_policy())
            .await?;
        assert_eq!(row.amount, STAKE);
        assert_eq!(row.wallet_uuid, player.wallet_uuid);
    }

    assert_eq!(player.expected_balance(), dec!(70));
    Ok(())
}

#[tokio::test]
#[ignore = "requires deployed wallet stack"]
async fn every_win_type_credits_the_round() -> anyhow::Result<()> {
    let ctx = common::context().await?;
    let steps = ctx.steps();
    let mut player = common::player_in_game(&ctx, INITIAL_BALANCE).await?;

    for win_type in [
        GamblingWinType::Win,
        GamblingWinType::Jackpot,
        GamblingWinType::Freespin,
    ] {
        let (bet, _) = steps.place_bet(&mut player, STAKE).await?;
        let request = WinRequest::new(player.try_session()?, PAYOUT)
            .with_type(win_type)
            .for_round(&bet.round_id);
        let confirmed = steps.win(&mut player, &request).await?;

        let won: WonFromGamble = confirmed.event.decode()?;
        assert_eq!(won.win_type, win_type);
        assert_eq!(won.amount, PAYOUT);
        assert_eq!(won.round_id, bet.round_id);

        assert_aggregate_matches(&confirmed.aggregate, &player.model);
        steps.assert_projection_mirrors(&player, &confirmed.event).await?;
    }

    // Three rounds of -10 / +25.
    assert_eq!(player.expected_balance(), dec!(145));
    Ok(())
}

#[tokio::test]
#[ignore = "requires deployed wallet stack"]
async fn refund_returns_the_stake_once() -> anyhow::Result<()> {
    let ctx = common::context().await?;
    let steps = ctx.steps();
    let mut player = common::player_in_game(&ctx, INITIAL_BALANCE).await?;

    let (bet, _) = steps.place_bet(&mut player, STAKE).await?;
    let refund = RefundRequest::of(&bet);
    let confirmed = steps.refund(&mut player, &refund).await?;

    let refunded: RefundedFromGamble = confirmed.event.decode()?;
    assert_eq!(refunded.bet_transaction_id, bet.transaction_id);
    assert_eq!(refunded.amount, STAKE);
    assert_eq!(confirmed.aggregate.balance, INITIAL_BALANCE);
    steps.assert_projection_mirrors(&player, &confirmed.event).await?;

    let rollback = RollbackRequest::of(&bet);
    let result = ctx.manager.rollback(&rollback).await;
    assert_rejected_as_predicted(&player.model, &rollback_command(&rollback), &result);
    Ok(())
}

#[tokio::test]
#[ignore = "requires deployed wallet stack"]
async fn second_rollback_of_a_bet_is_rejected() -> anyhow::Result<()> {
    let ctx = common::context().await?;
    let steps = ctx.steps();
    let mut player = common::player_in_game(&ctx, INITIAL_BALANCE).await?;

    let (bet, _) = steps.place_bet(&mut player, STAKE).await?;
    let confirmed = steps.rollback(&mut player, &RollbackRequest::of(&bet)).await?;

    let rolled_back: RollbackedFromGamble = confirmed.event.decode()?;
    assert_eq!(rolled_back.rollback_transaction_id, bet.transaction_id);
    assert_eq!(confirmed.aggregate.balance, INITIAL_BALANCE);

    let again = RollbackRequest::of(&bet);
    let result = ctx.manager.rollback(&again).await;
    let rejection = assert_rejected_as_predicted(&player.model, &rollback_command(&again), &result);
    assert_eq!(rejection.code, ErrorCode::RollbackNotAllowed);

    let aggregate = steps.sync_aggregate(&player).await?;
    assert_eq!(aggregate.balance, INITIAL_BALANCE);
    Ok(())
}

#[tokio::test]
#[ignore = "requires deployed wallet stack"]
async fn win_class_transactions_cannot_be_rolled_back() -> anyhow::Result<()> {
    let ctx = common::context().await?;
    let steps = ctx.steps();
    let mut player = common::player_in_game(&ctx, INITIAL_BALANCE).await?;

    for win_type in [
        GamblingWinType::Win,
        GamblingWinType::Jackpot,
        GamblingWinType::Freespin,
    ] {
        let win = WinRequest::new(player.try_session()?, PAYOUT).with_type(win_type);
        steps.win(&mut player, &win).await?;

        let rollback = RollbackRequest::targeting(
            player.try_session()?,
            &win.transaction_id,
            &win.round_id,
            win.amount,
        );
        let result = ctx.manager.rollback(&rollback).await;
        let rejection =
            assert_rejected_as_predicted(&player.model, &rollback_command(&rollback), &result);
        assert_eq!(rejection.code, ErrorCode::RollbackNotAllowed);
    }

    let tournament = TournamentRequest::new(player.try_session()?, PAYOUT);
    steps.tournament(&mut player, &tournament).await?;
    let rollback = RollbackRequest::targeting(
        player.try_session()?,
        &tournament.transaction_id,
        &tournament.round_id,
        tournament.amount,
    );
    let result = ctx.manager.rollback(&rollback).await;
    assert_rejected_as_predicted(&player.model, &rollback_command(&rollback), &result);

    let aggregate = steps.sync_aggregate(&player).await?;
    assert_aggregate_matches(&aggregate, &player.model);
    Ok(())
}

#[tokio::test]
#[ignore = "requires deployed wallet stack"]
async fn tournament_award_credits_balance() -> anyhow::Result<()> {
    let ctx = common::context().await?;
    let steps = ctx.steps();
    let mut player = common::player_in_game(&ctx, INITIAL_BALANCE).await?;

    let request = TournamentRequest::new(player.try_session()?, PAYOUT);
    let confirmed = steps.tournament(&mut player, &request).await?;

    let won: TournamentWonFromGamble = confirmed.event.decode()?;
    assert_eq!(won.tournament_id, request.tournament_id);
    assert_eq!(won.amount, PAYOUT);
    assert_eq!(confirmed.aggregate.balance, dec!(125));
    assert_eq!(
        confirmed.aggregate.available_withdrawal_balance,
        player.model.available_withdrawal_balance()
    );
    steps.assert_projection_mirrors(&player, &confirmed.event).await?;
    Ok(())
}
