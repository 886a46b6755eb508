//! Setup shared by the live scenarios.
//!
//! Every scenario builds its own context and registers its own player, so
//! scenarios can run in parallel against the same deployment.

#![allow(dead_code)]

use rust_decimal::Decimal;
use wallet_e2e_testing::{RegisteredPlayer, TestContext};

/// Connect to the stack described by the environment.
pub async fn context() -> anyhow::Result<TestContext> {
    Ok(TestContext::from_env().await?)
}

/// A player holding `balance` with a launched game session.
pub async fn player_in_game(
    ctx: &TestContext,
    balance: Decimal,
) -> anyhow::Result<RegisteredPlayer> {
    let steps = ctx.steps();
    let mut player = steps.register_player(balance).await?;
    steps.launch_game(&mut player).await?;
    Ok(player)
}
