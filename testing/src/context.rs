//! Shared test fixture owning every client of the stack.

use crate::config::Config;
use crate::error::Result;
use crate::steps::DefaultTestSteps;
use std::sync::Arc;
use uuid::Uuid;
use wallet_e2e_clients::{CapAdminClient, ManagerClient, PublicClient};
use wallet_e2e_core::event::{WalletEvent, wallet_subject};
use wallet_e2e_core::event_bus::MessageSource;
use wallet_e2e_core::projection::ProjectionMessage;
use wallet_e2e_nats::NatsEventSource;
use wallet_e2e_postgres::WalletDatabaseClient;
use wallet_e2e_redis::RedisWalletClient;
use wallet_e2e_redpanda::KafkaProjectionSource;

/// Source of NATS wallet events.
pub type EventSource = Arc<dyn MessageSource<Message = WalletEvent>>;

/// Source of Kafka projection records.
pub type ProjectionSource = Arc<dyn MessageSource<Message = ProjectionMessage>>;

/// Connected clients for one test.
///
/// Cheap to build per test; every scenario registers its own player, so
/// contexts never share state beyond the connections.
pub struct TestContext {
    /// Configuration the context was built from
    pub config: Config,
    /// Manager API
    pub manager: ManagerClient,
    /// Public API, anonymous
    pub public: PublicClient,
    /// CAP admin API
    pub cap: CapAdminClient,
    /// NATS wallet events
    pub nats: EventSource,
    /// Kafka projections
    pub kafka: ProjectionSource,
    /// Redis aggregate cache
    pub redis: RedisWalletClient,
    /// Transaction history
    pub db: WalletDatabaseClient,
}

impl std::fmt::Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("manager", &self.manager)
            .field("public", &self.public)
            .field("redis", &self.redis)
            .finish_non_exhaustive()
    }
}

impl TestContext {
    /// Initialise tracing, load [`Config::from_env`] and connect.
    ///
    /// # Errors
    ///
    /// Fails if any client cannot be built or any backend is unreachable.
    pub async fn from_env() -> Result<Self> {
        crate::logging::init_tracing();
        Self::from_config(Config::from_env()).await
    }

    /// Connect every client described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if any client cannot be built or any backend is unreachable.
    pub async fn from_config(config: Config) -> Result<Self> {
        let timeout = config.request_timeout();

        let manager = ManagerClient::new(
            &config.manager.base_url,
            &config.manager.casino_id,
            config.manager.secret.as_bytes(),
            timeout,
        )?;
        let public = PublicClient::new(&config.public_api.base_url, timeout)?;
        let cap = CapAdminClient::new(
            &config.cap.base_url,
            &config.cap.token,
            &config.cap.node_id,
            timeout,
        )?;

        let nats = NatsEventSource::connect(&config.nats.url, &config.nats.stream).await?;
        let kafka = KafkaProjectionSource::builder()
            .brokers(&config.kafka.brokers)
            .consumer_group_prefix(&config.kafka.group_prefix)
            .build()?;
        let redis = RedisWalletClient::new(&config.redis.url, &config.redis.key_prefix).await?;
        let db =
            WalletDatabaseClient::new(&config.database.url, config.database.max_connections).await?;

        tracing::info!(
            manager = %config.manager.base_url,
            public_api = %config.public_api.base_url,
            cap = %config.cap.base_url,
            "Test context ready"
        );

        Ok(Self {
            config,
            manager,
            public,
            cap,
            nats: Arc::new(nats),
            kafka: Arc::new(kafka),
            redis,
            db,
        })
    }

    /// NATS subject of a wallet.
    #[must_use]
    pub fn wallet_subject(&self, player_uuid: Uuid, wallet_uuid: Uuid) -> String {
        wallet_subject(&self.config.nats.subject_prefix, player_uuid, wallet_uuid)
    }

    /// The default steps bound to this context.
    #[must_use]
    pub const fn steps(&self) -> DefaultTestSteps<'_> {
        DefaultTestSteps::new(self)
    }
}
