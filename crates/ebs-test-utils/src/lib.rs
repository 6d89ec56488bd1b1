//! # EBS Test Utilities
//!
//! Shared test utilities for the extension backend service.
//!
//! This crate provides:
//! - Server test harness (`TestEbsServer` for E2E tests)
//! - Token-signing helpers for crafting inbound test tokens
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ebs_test_utils::{broadcaster_claims, TestEbsServer, TokenSigner};
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let store = wiremock::MockServer::start().await;
//!     let server = TestEbsServer::spawn(&store.uri()).await?;
//!
//!     let token = TokenSigner::new().sign(&broadcaster_claims("42"));
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/api/randomfact", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token;

// Re-export commonly used items
pub use server_harness::TestEbsServer;
pub use token::{broadcaster_claims, claims_with_role, TokenSigner, TEST_SECRET_B64};
