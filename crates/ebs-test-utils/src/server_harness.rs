//! Test server harness for E2E testing.
//!
//! Provides `TestEbsServer` for spawning real service instances in tests,
//! with the remote configuration store pointed at a caller-supplied base URL
//! (typically a wiremock server).

use ebs_service::auth::TokenCodec;
use ebs_service::config::Config;
use ebs_service::routes::{self, AppState};
use ebs_service::services::{ConfigStoreClient, FactsService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::token::TEST_SECRET_B64;

/// Client id every harness-spawned server runs under.
pub const TEST_CLIENT_ID: &str = "test-client-id";

/// Owner user id embedded in outbound tokens from harness-spawned servers.
pub const TEST_OWNER_ID: &str = "100000001";

/// Global metrics handle: the Prometheus recorder can only be installed once
/// per process, so all test servers share it.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            routes::init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// Test harness for spawning the extension backend in E2E tests.
pub struct TestEbsServer {
    addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl TestEbsServer {
    /// Spawn a new test server instance.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Sign and verify tokens with [`TEST_SECRET_B64`]
    /// - Talk to the configuration store at `store_base_url`
    ///
    /// # Arguments
    /// * `store_base_url` - Base URL of the (mock) configuration store
    ///
    /// # Returns
    /// * `Ok(TestEbsServer)` - Running server instance
    /// * `Err(anyhow::Error)` - If server spawn fails
    pub async fn spawn(store_base_url: &str) -> Result<Self, anyhow::Error> {
        // Build configuration for the test environment
        let vars = HashMap::from([
            ("EXT_CLIENT_ID".to_string(), TEST_CLIENT_ID.to_string()),
            ("EXT_SECRET".to_string(), TEST_SECRET_B64.to_string()),
            ("EXT_OWNER_ID".to_string(), TEST_OWNER_ID.to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("EXT_API_BASE_URL".to_string(), store_base_url.to_string()),
            ("RATE_LIMIT_MAX_RETRIES".to_string(), "1".to_string()),
            ("RATE_LIMIT_MAX_WAIT_SECONDS".to_string(), "5".to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let codec = Arc::new(
            TokenCodec::from_base64_secret(&config.secret, config.owner_user_id.clone())
                .map_err(|e| anyhow::anyhow!("Failed to build token codec: {}", e))?,
        );

        let config_store = ConfigStoreClient::new(
            config.config_api_base_url.clone(),
            config.client_id.clone(),
            Arc::clone(&codec),
            config.rate_limit_max_retries,
            Duration::from_secs(config.rate_limit_max_wait_seconds),
        )
        .map_err(|e| anyhow::anyhow!("Failed to build config store client: {}", e))?;

        // Create application state
        let state = Arc::new(AppState {
            config,
            codec,
            config_store,
            facts: FactsService::new(),
        });

        // Build routes using the service's real route builder
        let app = routes::build_routes(state, test_metrics_handle());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            _handle: handle,
        })
    }

    /// Address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the running server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}
