//! CAP admin API client: back-office operations.

use crate::dto::cap::{BalanceAdjustmentRequest, PlayerLimitsResponse, UpdateBlockersRequest};
use crate::error::ClientError;
use crate::http;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use uuid::Uuid;

/// Header selecting the node (brand) an admin call applies to.
pub const NODE_ID_HEADER: &str = "Platform-NodeID";

/// CAP admin API client
#[derive(Debug, Clone)]
pub struct CapAdminClient {
    client: Client,
    base_url: String,
    token: String,
    node_id: String,
}

impl CapAdminClient {
    /// Create a client with an admin token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the token is empty or the
    /// HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        node_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ClientError::Configuration("CAP admin token is empty".to_string()));
        }
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.into(),
            token,
            node_id: node_id.into(),
        })
    }

    /// Enable or disable gambling and betting for a player.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the update is rejected.
    pub async fn update_blockers(
        &self,
        player_uuid: Uuid,
        request: &UpdateBlockersRequest,
    ) -> Result<(), ClientError> {
        tracing::info!(
            %player_uuid,
            gambling_enabled = request.gambling_enabled,
            betting_enabled = request.betting_enabled,
            "Updating blockers"
        );
        let endpoint = format!("/players/{player_uuid}/blockers");
        let request = self.admin(self.client.patch(self.url(&endpoint))).json(request);
        http::send_empty(&endpoint, request).await
    }

    /// Limits of a player.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the call is rejected.
    pub async fn get_player_limits(
        &self,
        player_uuid: Uuid,
    ) -> Result<PlayerLimitsResponse, ClientError> {
        let endpoint = format!("/player/{player_uuid}/limits");
        let request = self.admin(self.client.get(self.url(&endpoint)));
        http::send_json(&endpoint, request).await
    }

    /// Adjust a player's balance.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the adjustment is rejected.
    pub async fn create_balance_adjustment(
        &self,
        player_uuid: Uuid,
        request: &BalanceAdjustmentRequest,
    ) -> Result<(), ClientError> {
        tracing::info!(
            %player_uuid,
            amount = %request.signed_amount(),
            currency = %request.currency,
            "Creating balance adjustment"
        );
        let endpoint = format!("/wallet/{player_uuid}/create-balance-adjustment");
        let request = self.admin(self.client.post(self.url(&endpoint))).json(request);
        http::send_empty(&endpoint, request).await
    }

    fn url(&self, path: &str) -> String {
        http::join(&self.base_url, path)
    }

    fn admin(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(NODE_ID_HEADER, &self.node_id)
    }
}
