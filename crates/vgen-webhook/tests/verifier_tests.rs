//! Integration tests for WebhookVerifier using wiremock

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use sha2::{Digest, Sha256};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vgen_webhook::{FixedClock, WebhookConfig, WebhookError, WebhookVerifier};

const NOW: i64 = 1_700_000_000;
const BODY: &[u8] = br#"{"request_id":"req-1","status":"COMPLETED"}"#;

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

fn jwk(key: &SigningKey, kid: &str) -> serde_json::Value {
    json!({
        "kty": "OKP",
        "crv": "Ed25519",
        "kid": kid,
        "x": URL_SAFE_NO_PAD.encode(key.verifying_key().as_bytes())
    })
}

fn sign(key: &SigningKey, request_id: &str, user_id: &str, timestamp: i64, body: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(body));
    let message = format!("{}\n{}\n{}\n{}", request_id, user_id, timestamp, digest);
    hex::encode(key.sign(message.as_bytes()).to_bytes())
}

fn headers(request_id: &str, user_id: &str, timestamp: i64, signature: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-fal-webhook-request-id", HeaderValue::from_str(request_id).unwrap());
    headers.insert("x-fal-webhook-user-id", HeaderValue::from_str(user_id).unwrap());
    headers.insert(
        "x-fal-webhook-timestamp",
        HeaderValue::from_str(&timestamp.to_string()).unwrap(),
    );
    headers.insert("x-fal-webhook-signature", HeaderValue::from_str(signature).unwrap());
    headers
}

async fn mount_keys(mock_server: &MockServer, keys: Vec<serde_json::Value>, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
        .expect(expected_fetches)
        .mount(mock_server)
        .await;
}

fn create_verifier(mock_server: &MockServer, clock: Arc<FixedClock>) -> WebhookVerifier {
    let config = WebhookConfig {
        jwks_url: format!("{}/.well-known/jwks.json", mock_server.uri()),
        key_ttl: Duration::from_secs(86_400),
        tolerance_secs: 300,
        fetch_timeout: Duration::from_secs(5),
    };
    WebhookVerifier::with_clock(config, clock).unwrap()
}

#[tokio::test]
async fn test_valid_signature_and_cached_keys() {
    let mock_server = MockServer::start().await;
    let key = signing_key();
    mount_keys(&mock_server, vec![jwk(&key, "k1")], 1).await;

    let verifier = create_verifier(&mock_server, Arc::new(FixedClock::new(NOW)));
    let signature = sign(&key, "req-1", "user-1", NOW, BODY);
    let headers = headers("req-1", "user-1", NOW, &signature);

    assert!(verifier.verify(&headers, BODY).await.unwrap());
    // Second verification is served from the cache
    assert!(verifier.verify(&headers, BODY).await.unwrap());
}

#[tokio::test]
async fn test_tampered_body_rejected() {
    let mock_server = MockServer::start().await;
    let key = signing_key();
    mount_keys(&mock_server, vec![jwk(&key, "k1")], 1).await;

    let verifier = create_verifier(&mock_server, Arc::new(FixedClock::new(NOW)));
    let signature = sign(&key, "req-1", "user-1", NOW, BODY);

    let mut tampered = BODY.to_vec();
    tampered[2] ^= 0x01;

    let result = verifier
        .verify(&headers("req-1", "user-1", NOW, &signature), &tampered)
        .await
        .unwrap();
    assert!(!result);
}

#[tokio::test]
async fn test_tampered_request_id_rejected() {
    let mock_server = MockServer::start().await;
    let key = signing_key();
    mount_keys(&mock_server, vec![jwk(&key, "k1")], 1).await;

    let verifier = create_verifier(&mock_server, Arc::new(FixedClock::new(NOW)));
    let signature = sign(&key, "req-1", "user-1", NOW, BODY);

    let result = verifier
        .verify(&headers("req-2", "user-1", NOW, &signature), BODY)
        .await
        .unwrap();
    assert!(!result);
}

#[tokio::test]
async fn test_timestamp_tolerance_boundary() {
    let mock_server = MockServer::start().await;
    let key = signing_key();
    mount_keys(&mock_server, vec![jwk(&key, "k1")], 1).await;

    let verifier = create_verifier(&mock_server, Arc::new(FixedClock::new(NOW)));

    let inside = NOW - 299;
    let signature = sign(&key, "req-1", "user-1", inside, BODY);
    assert!(verifier
        .verify(&headers("req-1", "user-1", inside, &signature), BODY)
        .await
        .unwrap());

    let outside = NOW - 301;
    let signature = sign(&key, "req-1", "user-1", outside, BODY);
    assert!(!verifier
        .verify(&headers("req-1", "user-1", outside, &signature), BODY)
        .await
        .unwrap());

    let future = NOW + 301;
    let signature = sign(&key, "req-1", "user-1", future, BODY);
    assert!(!verifier
        .verify(&headers("req-1", "user-1", future, &signature), BODY)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_extreme_timestamps_rejected_without_fetch() {
    let mock_server = MockServer::start().await;
    let key = signing_key();
    mount_keys(&mock_server, vec![jwk(&key, "k1")], 0).await;

    let verifier = create_verifier(&mock_server, Arc::new(FixedClock::new(NOW)));

    for timestamp in [i64::MIN, i64::MAX] {
        let signature = sign(&key, "req-1", "user-1", timestamp, BODY);
        assert!(!verifier
            .verify(&headers("req-1", "user-1", timestamp, &signature), BODY)
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn test_missing_header_rejected_without_fetch() {
    let mock_server = MockServer::start().await;
    mount_keys(&mock_server, vec![jwk(&signing_key(), "k1")], 0).await;

    let verifier = create_verifier(&mock_server, Arc::new(FixedClock::new(NOW)));
    let mut headers = headers("req-1", "user-1", NOW, "00");
    headers.remove("x-fal-webhook-user-id");

    assert!(!verifier.verify(&headers, BODY).await.unwrap());
}

#[tokio::test]
async fn test_malformed_key_skipped_and_other_key_accepted() {
    let mock_server = MockServer::start().await;
    let unrelated = SigningKey::from_bytes(&[9u8; 32]);
    let key = signing_key();
    let malformed = json!({
        "kty": "OKP",
        "crv": "Ed25519",
        "kid": "short",
        "x": URL_SAFE_NO_PAD.encode([1u8; 31])
    });
    mount_keys(
        &mock_server,
        vec![malformed, jwk(&unrelated, "old"), jwk(&key, "current")],
        1,
    )
    .await;

    let verifier = create_verifier(&mock_server, Arc::new(FixedClock::new(NOW)));
    let signature = sign(&key, "req-1", "user-1", NOW, BODY);
    assert!(verifier
        .verify(&headers("req-1", "user-1", NOW, &signature), BODY)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_unknown_signer_rejected() {
    let mock_server = MockServer::start().await;
    mount_keys(&mock_server, vec![jwk(&signing_key(), "k1")], 1).await;

    let verifier = create_verifier(&mock_server, Arc::new(FixedClock::new(NOW)));
    let stranger = SigningKey::from_bytes(&[3u8; 32]);
    let signature = sign(&stranger, "req-1", "user-1", NOW, BODY);
    assert!(!verifier
        .verify(&headers("req-1", "user-1", NOW, &signature), BODY)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_keys_refetched_after_ttl() {
    let mock_server = MockServer::start().await;
    let key = signing_key();
    mount_keys(&mock_server, vec![jwk(&key, "k1")], 2).await;

    let clock = Arc::new(FixedClock::new(NOW));
    let verifier = create_verifier(&mock_server, Arc::clone(&clock));

    let signature = sign(&key, "req-1", "user-1", NOW, BODY);
    assert!(verifier
        .verify(&headers("req-1", "user-1", NOW, &signature), BODY)
        .await
        .unwrap());

    clock.advance(86_400);
    let later = NOW + 86_400;
    let signature = sign(&key, "req-1", "user-1", later, BODY);
    assert!(verifier
        .verify(&headers("req-1", "user-1", later, &signature), BODY)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_key_fetch_failure_is_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;

    let verifier = create_verifier(&mock_server, Arc::new(FixedClock::new(NOW)));
    let signature = sign(&signing_key(), "req-1", "user-1", NOW, BODY);
    let err = verifier
        .verify(&headers("req-1", "user-1", NOW, &signature), BODY)
        .await
        .unwrap_err();

    assert!(matches!(err, WebhookError::KeyFetch { status: 503, .. }));
}

#[tokio::test]
async fn test_previous_keys_used_when_refresh_fails() {
    let mock_server = MockServer::start().await;
    let key = signing_key();

    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": [jwk(&key, "k1")] })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let clock = Arc::new(FixedClock::new(NOW));
    let verifier = create_verifier(&mock_server, Arc::clone(&clock));

    let signature = sign(&key, "req-1", "user-1", NOW, BODY);
    assert!(verifier
        .verify(&headers("req-1", "user-1", NOW, &signature), BODY)
        .await
        .unwrap());

    clock.advance(90_000);
    let later = NOW + 90_000;
    let signature = sign(&key, "req-1", "user-1", later, BODY);
    assert!(verifier
        .verify(&headers("req-1", "user-1", later, &signature), BODY)
        .await
        .unwrap());
}
