//! Public API (FAPI) request and response bodies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wallet_e2e_core::limit::IntervalType;

/// Body of `POST /registration/fast`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastRegistrationRequest {
    /// ISO country code
    pub country: String,
    /// Wallet currency
    pub currency: String,
}

/// Response of `POST /registration/fast`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastRegistrationResponse {
    /// Generated login
    pub username: String,
    /// Generated password
    pub password: String,
}

/// Body of `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login
    pub username: String,
    /// Password
    pub password: String,
}

impl From<FastRegistrationResponse> for LoginRequest {
    fn from(registration: FastRegistrationResponse) -> Self {
        Self {
            username: registration.username,
            password: registration.password,
        }
    }
}

/// Response of `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Bearer token
    pub token: String,
    /// Refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// One entry of `GET /wallets`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    /// Wallet id
    #[serde(rename = "id")]
    pub wallet_uuid: Uuid,
    /// Wallet currency
    pub currency: String,
    /// Current balance
    pub balance: Decimal,
    /// Whether this is the player's default wallet
    #[serde(default)]
    pub is_default: bool,
}

/// Response of `GET /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    /// Player id
    #[serde(rename = "playerUUID")]
    pub player_uuid: Uuid,
    /// Node (brand) id
    #[serde(rename = "nodeUUID", default)]
    pub node_uuid: Option<Uuid>,
    /// Login
    #[serde(default)]
    pub username: String,
    /// Country
    #[serde(default)]
    pub country: String,
}

/// Body of `POST /games/launch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchGameRequest {
    /// Game to launch
    pub game_uuid: Uuid,
    /// Real-money or demo mode
    pub mode: String,
    /// Client language
    pub language: String,
}

impl LaunchGameRequest {
    /// Real-money launch in English.
    #[must_use]
    pub fn real(game_uuid: Uuid) -> Self {
        Self {
            game_uuid,
            mode: "real".to_string(),
            language: "en".to_string(),
        }
    }
}

/// Response of `POST /games/launch`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchGameResponse {
    /// Game session token used by the Manager API
    pub session_token: String,
    /// Game URL
    #[serde(default)]
    pub url: String,
}

/// Body of `POST /profile/limit/turnover`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnoverLimitRequest {
    /// Limit currency
    pub currency: String,
    /// Period
    #[serde(rename = "type")]
    pub interval: IntervalType,
    /// Cap
    pub amount: Decimal,
    /// Start of the first period, Unix seconds
    pub start_at: i64,
}

impl TurnoverLimitRequest {
    /// A limit starting now.
    #[must_use]
    pub fn starting_now(currency: impl Into<String>, interval: IntervalType, amount: Decimal) -> Self {
        Self {
            currency: currency.into(),
            interval,
            amount,
            start_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Body of `POST /payment/deposit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    /// Amount
    pub amount: Decimal,
    /// Currency
    pub currency: String,
    /// Payment method
    pub payment_method_key: String,
    /// Bonus to attach
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_id: Option<String>,
}

impl DepositRequest {
    /// A card deposit without bonus.
    #[must_use]
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            payment_method_key: "card".to_string(),
            bonus_id: None,
        }
    }
}

/// Body of `POST /payment/withdrawal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    /// Amount
    pub amount: Decimal,
    /// Currency
    pub currency: String,
    /// Payment method
    pub payment_method_key: String,
}

impl WithdrawalRequest {
    /// A card withdrawal.
    #[must_use]
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            payment_method_key: "card".to_string(),
        }
    }
}

/// Response of the payment endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    /// Payment (deposit or withdrawal) id
    #[serde(rename = "transactionUUID")]
    pub transaction_uuid: Uuid,
    /// Payment state
    #[serde(default)]
    pub status: String,
}
