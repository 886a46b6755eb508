//! Manager API client: the casino and sportsbook transaction gateway.

use crate::dto::manager::{
    BetRequest, MakePaymentRequest, RefundRequest, RollbackRequest, TournamentRequest,
    TransactionResponse, WinRequest,
};
use crate::error::ClientError;
use crate::http;
use crate::signing::{RequestSigner, SIGNATURE_HEADER};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::time::Duration;

/// Header identifying the calling casino.
pub const CASINO_ID_HEADER: &str = "X-Casino-Id";

/// Manager API client
///
/// Every request body is serialized once, signed with the casino secret and
/// sent byte for byte.
#[derive(Debug, Clone)]
pub struct ManagerClient {
    client: Client,
    base_url: String,
    casino_id: String,
    signer: RequestSigner,
}

impl ManagerClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the secret is empty or the
    /// HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        casino_id: impl Into<String>,
        secret: impl Into<Vec<u8>>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.into(),
            casino_id: casino_id.into(),
            signer: RequestSigner::new(secret)?,
        })
    }

    /// Place a casino bet.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the platform rejects the bet.
    pub async fn bet(&self, request: &BetRequest) -> Result<TransactionResponse, ClientError> {
        tracing::info!(
            transaction_id = %request.transaction_id,
            amount = %request.amount,
            bet_type = ?request.bet_type,
            "Placing bet"
        );
        self.post_signed("/bet", request).await
    }

    /// Settle a casino round with a win.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the platform rejects the win.
    pub async fn win(&self, request: &WinRequest) -> Result<TransactionResponse, ClientError> {
        tracing::info!(
            transaction_id = %request.transaction_id,
            amount = %request.amount,
            win_type = ?request.win_type,
            "Sending win"
        );
        self.post_signed("/win", request).await
    }

    /// Refund a casino bet.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the platform rejects the refund.
    pub async fn refund(&self, request: &RefundRequest) -> Result<TransactionResponse, ClientError> {
        tracing::info!(
            transaction_id = %request.transaction_id,
            bet_transaction_id = %request.bet_transaction_id,
            "Refunding bet"
        );
        self.post_signed("/refund", request).await
    }

    /// Roll back a casino transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the platform rejects the rollback.
    pub async fn rollback(
        &self,
        request: &RollbackRequest,
    ) -> Result<TransactionResponse, ClientError> {
        tracing::info!(
            transaction_id = %request.transaction_id,
            rollback_transaction_id = %request.rollback_transaction_id,
            "Rolling back transaction"
        );
        self.post_signed("/rollback", request).await
    }

    /// Award a tournament prize.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the platform rejects the award.
    pub async fn tournament(
        &self,
        request: &TournamentRequest,
    ) -> Result<TransactionResponse, ClientError> {
        tracing::info!(
            transaction_id = %request.transaction_id,
            tournament_id = %request.tournament_id,
            amount = %request.amount,
            "Awarding tournament prize"
        );
        self.post_signed("/tournament", request).await
    }

    /// Send a sportsbook payment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the platform rejects the payment.
    pub async fn make_payment(
        &self,
        request: &MakePaymentRequest,
    ) -> Result<TransactionResponse, ClientError> {
        tracing::info!(
            bet_id = request.bet_id,
            amount = %request.amount,
            payment_type = ?request.payment_type,
            "Sending sportsbook payment"
        );
        self.post_signed("/make-payment", request).await
    }

    /// Send a pre-serialized body with an explicit signature.
    ///
    /// Used to check that the platform rejects tampered or unsigned requests.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the platform rejects the request.
    pub async fn post_raw(
        &self,
        path: &str,
        body: Vec<u8>,
        signature: Option<&str>,
    ) -> Result<TransactionResponse, ClientError> {
        let mut request = self
            .client
            .post(http::join(&self.base_url, path))
            .header(CONTENT_TYPE, "application/json")
            .header(CASINO_ID_HEADER, &self.casino_id);
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        http::send_json(path, request.body(body)).await
    }

    async fn post_signed<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<TransactionResponse, ClientError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| ClientError::Configuration(format!("cannot serialize {path} body: {e}")))?;
        let signature = self.signer.sign(&bytes)?;
        self.post_raw(path, bytes, Some(&signature)).await
    }
}
