//! Public API (FAPI) client: the player-facing API.

use crate::dto::public::{
    DepositRequest, FastRegistrationRequest, FastRegistrationResponse, LaunchGameRequest,
    LaunchGameResponse, LoginRequest, PaymentResponse, PlayerProfile, TokenResponse,
    TurnoverLimitRequest, WalletView, WithdrawalRequest,
};
use crate::error::ClientError;
use crate::http;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Public API client
///
/// Registration and login are anonymous; every other call sends the player's
/// bearer token. A client without a token still sends those calls, so tests
/// can check `MISSING_TOKEN` rejections.
#[derive(Debug, Clone)]
pub struct PublicClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl PublicClient {
    /// Create an anonymous client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.into(),
            token: None,
        })
    }

    /// A copy of this client acting as the player owning `token`.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    /// A copy of this client without credentials.
    #[must_use]
    pub fn anonymous(&self) -> Self {
        Self {
            token: None,
            ..self.clone()
        }
    }

    /// Register a player with generated credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when registration is rejected.
    pub async fn fast_registration(
        &self,
        request: &FastRegistrationRequest,
    ) -> Result<FastRegistrationResponse, ClientError> {
        tracing::info!(currency = %request.currency, country = %request.country, "Registering player");
        let endpoint = "/registration/fast";
        http::send_json(endpoint, self.client.post(self.url(endpoint)).json(request)).await
    }

    /// Log in and obtain a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the credentials are rejected.
    pub async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, ClientError> {
        tracing::debug!(username = %request.username, "Logging in");
        let endpoint = "/login";
        http::send_json(endpoint, self.client.post(self.url(endpoint)).json(request)).await
    }

    /// Wallets of the player.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the call is rejected.
    pub async fn wallets(&self) -> Result<Vec<WalletView>, ClientError> {
        let endpoint = "/wallets";
        http::send_json(endpoint, self.authorized(self.client.get(self.url(endpoint)))).await
    }

    /// Profile of the player.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the call is rejected.
    pub async fn profile(&self) -> Result<PlayerProfile, ClientError> {
        let endpoint = "/profile";
        http::send_json(endpoint, self.authorized(self.client.get(self.url(endpoint)))).await
    }

    /// Launch a game and obtain a game session token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the launch is rejected.
    pub async fn launch_game(
        &self,
        request: &LaunchGameRequest,
    ) -> Result<LaunchGameResponse, ClientError> {
        tracing::info!(game_uuid = %request.game_uuid, "Launching game");
        let endpoint = "/games/launch";
        http::send_json(
            endpoint,
            self.authorized(self.client.post(self.url(endpoint)).json(request)),
        )
        .await
    }

    /// Create a turnover limit.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the limit is rejected.
    pub async fn create_turnover_limit(
        &self,
        request: &TurnoverLimitRequest,
    ) -> Result<(), ClientError> {
        tracing::info!(interval = %request.interval, amount = %request.amount, "Creating turnover limit");
        let endpoint = "/profile/limit/turnover";
        http::send_empty(
            endpoint,
            self.authorized(self.client.post(self.url(endpoint)).json(request)),
        )
        .await
    }

    /// Deposit money.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the deposit is rejected.
    pub async fn deposit(&self, request: &DepositRequest) -> Result<PaymentResponse, ClientError> {
        tracing::info!(amount = %request.amount, currency = %request.currency, "Depositing");
        let endpoint = "/payment/deposit";
        http::send_json(
            endpoint,
            self.authorized(self.client.post(self.url(endpoint)).json(request)),
        )
        .await
    }

    /// Request a withdrawal.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the withdrawal is rejected.
    pub async fn withdrawal(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<PaymentResponse, ClientError> {
        tracing::info!(amount = %request.amount, currency = %request.currency, "Requesting withdrawal");
        let endpoint = "/payment/withdrawal";
        http::send_json(
            endpoint,
            self.authorized(self.client.post(self.url(endpoint)).json(request)),
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        http::join(&self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}
