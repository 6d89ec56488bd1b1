//! End-to-end tests for the random fact flow.
//!
//! A spawned server handles real inbound requests while wiremock plays the
//! remote configuration store, so every hop (middleware, handler, store
//! client, transport) runs for real.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use chrono::Utc;
use ebs_test_utils::{broadcaster_claims, TestEbsServer, TokenSigner, TEST_SECRET_B64};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHANNEL: &str = "999999999";
const CONFIGURATIONS_PATH: &str = "/extensions/test-client-id/configurations/";

fn channel_path(channel: &str) -> String {
    format!("/extensions/test-client-id/configurations/channels/{channel}")
}

fn segments_body(kind: &str) -> String {
    json!({
        format!("broadcaster:{CHANNEL}"): {
            "segment": {"segment_type": "broadcaster", "channel_id": CHANNEL},
            "record": {"content": kind}
        }
    })
    .to_string()
}

async fn send_randomfact(server: &TestEbsServer) -> Result<reqwest::Response> {
    let token = TokenSigner::new().sign(&broadcaster_claims(CHANNEL));
    let response = reqwest::Client::new()
        .get(format!("{}/api/randomfact", server.url()))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await?;
    Ok(response)
}

#[tokio::test]
async fn publishes_fact_to_developer_segment_of_verified_channel() -> Result<()> {
    let store = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(channel_path(CHANNEL)))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(segments_body("cat"), "application/json"),
        )
        .expect(1)
        .mount(&store)
        .await;

    // The verified channel id must flow into the developer-segment write.
    Mock::given(method("PUT"))
        .and(path(CONFIGURATIONS_PATH))
        .and(header("Client-Id", "test-client-id"))
        .and(body_partial_json(json!({
            "segment": "developer",
            "channel_id": CHANNEL,
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&store)
        .await;

    let server = TestEbsServer::spawn(&store.uri()).await?;
    let response = send_randomfact(&server).await?;

    assert_eq!(response.status(), 200);
    store.verify().await;
    Ok(())
}

#[tokio::test]
async fn outbound_requests_carry_freshly_issued_service_tokens() -> Result<()> {
    let store = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(channel_path(CHANNEL)))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(segments_body("dog"), "application/json"),
        )
        .mount(&store)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONFIGURATIONS_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&store)
        .await;

    let server = TestEbsServer::spawn(&store.uri()).await?;
    let response = send_randomfact(&server).await?;
    assert_eq!(response.status(), 200);

    // Every outbound request must present a token this service issued:
    // HS256 under the shared secret, role external, publish-only grant,
    // scoped to the channel, expiring within the three-minute window.
    let requests = store.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let key = base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        TEST_SECRET_B64,
    )
    .unwrap();

    for request in &requests {
        let auth = request
            .headers
            .get("authorization")
            .expect("outbound request must be signed")
            .to_str()?;
        let token = auth.strip_prefix("Bearer ").expect("Bearer scheme");

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let claims = decode::<serde_json::Value>(
            token,
            &DecodingKey::from_secret(&key),
            &validation,
        )
        .expect("outbound token must verify under the shared secret")
        .claims;

        assert_eq!(claims["role"], "external");
        assert_eq!(claims["channel_id"], CHANNEL);
        assert_eq!(claims["user_id"], "100000001");
        assert_eq!(claims["pubsub_perms"]["send"], json!(["broadcast"]));

        let exp = claims["exp"].as_i64().unwrap();
        let now = Utc::now().timestamp();
        assert!(exp > now);
        assert!(exp <= now + 180);

        assert_eq!(
            request.headers.get("client-id").unwrap().to_str()?,
            "test-client-id"
        );
    }
    Ok(())
}

#[tokio::test]
async fn unconfigured_channel_gets_the_default_fact() -> Result<()> {
    let store = MockServer::start().await;

    // No segments stored at all for this channel.
    Mock::given(method("GET"))
        .and(path(channel_path(CHANNEL)))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&store)
        .await;

    Mock::given(method("PUT"))
        .and(path(CONFIGURATIONS_PATH))
        .and(body_partial_json(json!({
            "segment": "developer",
            "channel_id": CHANNEL,
            "content": "Animals are our friends.",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&store)
        .await;

    let server = TestEbsServer::spawn(&store.uri()).await?;
    let response = send_randomfact(&server).await?;

    assert_eq!(response.status(), 200);
    store.verify().await;
    Ok(())
}

#[tokio::test]
async fn unknown_animal_kind_falls_back_to_the_default_fact() -> Result<()> {
    let store = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(channel_path(CHANNEL)))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(segments_body("axolotl"), "application/json"),
        )
        .mount(&store)
        .await;

    Mock::given(method("PUT"))
        .and(path(CONFIGURATIONS_PATH))
        .and(body_partial_json(json!({
            "content": "Animals are our friends.",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&store)
        .await;

    let server = TestEbsServer::spawn(&store.uri()).await?;
    let response = send_randomfact(&server).await?;

    assert_eq!(response.status(), 200);
    store.verify().await;
    Ok(())
}

#[tokio::test]
async fn rate_limited_store_delays_but_completes_the_request() -> Result<()> {
    let store = MockServer::start().await;

    let reset = Utc::now().timestamp() + 2;
    Mock::given(method("GET"))
        .and(path(channel_path(CHANNEL)))
        .respond_with(
            ResponseTemplate::new(429).insert_header("Ratelimit-Reset", reset.to_string().as_str()),
        )
        .up_to_n_times(1)
        .mount(&store)
        .await;

    Mock::given(method("GET"))
        .and(path(channel_path(CHANNEL)))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(segments_body("cat"), "application/json"),
        )
        .mount(&store)
        .await;

    Mock::given(method("PUT"))
        .and(path(CONFIGURATIONS_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&store)
        .await;

    let server = TestEbsServer::spawn(&store.uri()).await?;

    let started = Instant::now();
    let response = send_randomfact(&server).await?;

    assert_eq!(response.status(), 200);
    // The advertised reset was ~2s away; the inbound request must have
    // blocked for it (only slack for second-boundary truncation).
    assert!(started.elapsed() >= Duration::from_secs(1));
    Ok(())
}

#[tokio::test]
async fn store_server_error_propagates_as_bad_gateway() -> Result<()> {
    let store = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(channel_path(CHANNEL)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&store)
        .await;

    let server = TestEbsServer::spawn(&store.uri()).await?;
    let response = send_randomfact(&server).await?;

    // Not a misleading 200: the failure is surfaced to the caller.
    assert_eq!(response.status(), 502);
    assert_eq!(response.text().await?, "Bad Gateway");
    Ok(())
}

#[tokio::test]
async fn undecodable_store_response_propagates_as_bad_gateway() -> Result<()> {
    let store = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(channel_path(CHANNEL)))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
        .mount(&store)
        .await;

    let server = TestEbsServer::spawn(&store.uri()).await?;
    let response = send_randomfact(&server).await?;

    assert_eq!(response.status(), 502);
    Ok(())
}

#[tokio::test]
async fn failed_developer_segment_write_propagates() -> Result<()> {
    let store = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(channel_path(CHANNEL)))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(segments_body("cat"), "application/json"),
        )
        .mount(&store)
        .await;

    Mock::given(method("PUT"))
        .and(path(CONFIGURATIONS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&store)
        .await;

    let server = TestEbsServer::spawn(&store.uri()).await?;
    let response = send_randomfact(&server).await?;

    assert_eq!(response.status(), 502);
    Ok(())
}
