mod common;

use arbitro::config::InferenceSettings;
use arbitro::inference::{HfInferenceClient, InferenceClient, InferenceError, RetryPolicy};
use common::StubServer;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const MODEL_PATH: &str = "/models/mistralai/Mistral-7B-Instruct-v0.1";

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(20),
        multiplier: 2.0,
    }
}

fn client(stub: &StubServer, retries: u32) -> HfInferenceClient {
    client_with_timeout(stub, retries, 5)
}

fn client_with_timeout(stub: &StubServer, retries: u32, timeout_seconds: u64) -> HfInferenceClient {
    let settings = InferenceSettings {
        base_url: stub.base_url.clone(),
        timeout_seconds,
        ..Default::default()
    };
    HfInferenceClient::new(&settings, "hf_secret")
        .unwrap()
        .with_retry(fast_retry(retries))
}

#[tokio::test]
async fn test_array_response_and_request_shape() {
    let stub = StubServer::start().await;
    stub.respond(MODEL_PATH, 200, r#"[{"generated_text": "R"}]"#);

    let text = assert_ok!(client(&stub, 0).infer("Pregunta: ¿Qué es pasos?").await);
    assert_eq!(text, "R");

    let requests = stub.requests_to(MODEL_PATH);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer hf_secret"));
    assert_eq!(requests[0].body["inputs"], "Pregunta: ¿Qué es pasos?");
}

#[tokio::test]
async fn test_mapping_without_generated_text_uses_fallback() {
    let stub = StubServer::start().await;
    stub.respond(MODEL_PATH, 200, r#"{"warnings": ["input truncated"]}"#);

    let text = assert_ok!(client(&stub, 0).infer("p").await);
    assert_eq!(text, "Sin respuesta.");
}

#[tokio::test]
async fn test_server_error_is_reported_with_status() {
    let stub = StubServer::start().await;
    stub.respond_always(MODEL_PATH, 500, r#"{"error": "internal"}"#);

    let err = assert_err!(client(&stub, 0).infer("p").await);
    assert!(matches!(err, InferenceError::Status { code: 500, .. }));
    assert_eq!(stub.requests_to(MODEL_PATH).len(), 1);
}

#[tokio::test]
async fn test_unavailable_then_ok_is_retried_once() {
    let stub = StubServer::start().await;
    stub.respond(MODEL_PATH, 503, r#"{"error": "Model is currently loading"}"#);
    stub.respond(MODEL_PATH, 200, r#"[{"generated_text": "R"}]"#);

    let text = assert_ok!(client(&stub, 2).infer("p").await);
    assert_eq!(text, "R");
    assert_eq!(stub.requests_to(MODEL_PATH).len(), 2);
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    let stub = StubServer::start().await;
    stub.respond_always(MODEL_PATH, 400, r#"{"error": "Input validation error"}"#);

    let err = assert_err!(client(&stub, 3).infer("p").await);
    assert_eq!(
        err,
        InferenceError::Status {
            code: 400,
            body: r#"{"error": "Input validation error"}"#.to_string(),
        }
    );
    assert_eq!(stub.requests_to(MODEL_PATH).len(), 1);
}

#[tokio::test]
async fn test_retry_budget_is_bounded() {
    let stub = StubServer::start().await;
    stub.respond_always(MODEL_PATH, 502, "bad gateway");

    let err = assert_err!(client(&stub, 2).infer("p").await);
    assert!(matches!(err, InferenceError::Status { code: 502, .. }));
    assert_eq!(stub.requests_to(MODEL_PATH).len(), 3);
}

#[tokio::test]
async fn test_non_json_body_is_shape_error() {
    let stub = StubServer::start().await;
    stub.respond(MODEL_PATH, 200, "<html>oops</html>");

    let err = assert_err!(client(&stub, 2).infer("p").await);
    assert!(matches!(err, InferenceError::UnexpectedResponseShape(_)));
    assert_eq!(stub.requests_to(MODEL_PATH).len(), 1);
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let stub = StubServer::start().await;
    stub.delay_always(MODEL_PATH, Duration::from_secs(3));
    stub.respond_always(MODEL_PATH, 200, r#"[{"generated_text": "tarde"}]"#);

    let started = std::time::Instant::now();
    let err = assert_err!(client_with_timeout(&stub, 0, 1).infer("p").await);
    assert_eq!(err, InferenceError::Timeout);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(stub.requests_to(MODEL_PATH).len(), 1);
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let stub = StubServer::start().await;
    stub.delay(MODEL_PATH, Duration::from_secs(3));
    // The delayed request consumes the first reply before the client gives up on it.
    stub.respond(MODEL_PATH, 200, r#"[{"generated_text": "tarde"}]"#);
    stub.respond(MODEL_PATH, 200, r#"[{"generated_text": "R"}]"#);

    let text = assert_ok!(client_with_timeout(&stub, 1, 1).infer("p").await);
    assert_eq!(text, "R");
    assert_eq!(stub.requests_to(MODEL_PATH).len(), 2);
}
