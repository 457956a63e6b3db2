/// Integration tests for the Gemini oracle client
///
/// Test coverage:
/// - Request shape (endpoint, API key header, JSON body)
/// - Unpacking of single-test and scenario responses
/// - Retry on transient errors, no retry on permanent ones
/// - Prompt rendering from the prompt library
use mockito::{Matcher, Server};

use testforge::domain::models::{
    placeholders, OracleConfig, OracleRequest, PromptContext, PromptKind, PromptLibrary,
    PromptTemplate,
};
use testforge::infrastructure::oracle::GeminiOracleClient;
use testforge::{CodeGenerationOracle, DomainError};

const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

fn config(base_url: String, max_retries: u32) -> OracleConfig {
    OracleConfig {
        api_key: Some("test-api-key".to_string()),
        base_url,
        model: "gemini-test".to_string(),
        timeout_secs: 10,
        rate_limit_rps: 100.0,
        max_retries,
        initial_backoff_ms: 10,
        max_backoff_ms: 50,
    }
}

fn body_with_text(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn single_test_request() -> OracleRequest {
    OracleRequest::new(
        PromptKind::SingleTest,
        PromptContext::new()
            .with(placeholders::INPUT_CLASS, "class Invoice {}")
            .with(placeholders::TEST_CLASS_NAME, "InvoiceTmpTest0"),
    )
}

#[tokio::test]
async fn test_single_test_response_is_unpacked() {
    let mut server = Server::new_async().await;
    let payload = serde_json::json!({
        "outputTestClass": "class InvoiceTmpTest0 {}",
        "outputRequiredClassContextPaths": ["com.acme.Money"]
    })
    .to_string();
    let mock = server
        .mock("POST", ENDPOINT)
        .match_header("x-goog-api-key", "test-api-key")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body_with_text(&payload))
        .create_async()
        .await;

    let client = GeminiOracleClient::new(&config(server.url(), 0), PromptLibrary::default())
        .expect("Failed to create client");
    let response = client.generate(single_test_request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.text, "class InvoiceTmpTest0 {}");
    assert_eq!(response.context_paths, vec!["com.acme.Money".to_string()]);
}

#[tokio::test]
async fn test_scenario_text_is_passed_through() {
    let mut server = Server::new_async().await;
    let scenarios = r#"{"testScenarios":[{"methodname":"total"}]}"#;
    server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_body(body_with_text(scenarios))
        .create_async()
        .await;

    let client =
        GeminiOracleClient::new(&config(server.url(), 0), PromptLibrary::default()).unwrap();
    let response = client
        .generate(OracleRequest::new(PromptKind::Scenarios, PromptContext::new()))
        .await
        .unwrap();

    assert_eq!(response.text, scenarios);
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("POST", ENDPOINT)
        .with_status(429)
        .with_body("slow down")
        .expect(1)
        .create_async()
        .await;
    let ok = server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_body(body_with_text("class InvoiceTmpTest0 {}"))
        .expect(1)
        .create_async()
        .await;

    let client =
        GeminiOracleClient::new(&config(server.url(), 2), PromptLibrary::default()).unwrap();
    let response = client.generate(single_test_request()).await.unwrap();

    limited.assert_async().await;
    ok.assert_async().await;
    assert_eq!(response.text, "class InvoiceTmpTest0 {}");
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", ENDPOINT)
        .with_status(400)
        .with_body(r#"{"error":{"message":"bad schema"}}"#)
        .expect(1)
        .create_async()
        .await;

    let client =
        GeminiOracleClient::new(&config(server.url(), 3), PromptLibrary::default()).unwrap();
    let err = client.generate(single_test_request()).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, DomainError::OracleFailed(_)));
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", ENDPOINT)
        .with_status(503)
        .with_body("unavailable")
        .expect(3)
        .create_async()
        .await;

    let client =
        GeminiOracleClient::new(&config(server.url(), 2), PromptLibrary::default()).unwrap();
    let err = client.generate(single_test_request()).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, DomainError::OracleFailed(_)));
}

#[tokio::test]
async fn test_empty_candidates_are_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_body(r#"{"candidates":[]}"#)
        .create_async()
        .await;

    let client =
        GeminiOracleClient::new(&config(server.url(), 0), PromptLibrary::default()).unwrap();
    assert!(client.generate(single_test_request()).await.is_err());
}

#[tokio::test]
async fn test_prompt_is_rendered_from_library() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", ENDPOINT)
        .match_body(Matcher::Regex("Write InvoiceTmpTest0 now".to_string()))
        .with_status(200)
        .with_body(body_with_text("class InvoiceTmpTest0 {}"))
        .create_async()
        .await;

    let library = PromptLibrary::default().with_template(
        PromptKind::SingleTest,
        PromptTemplate::new("Write {{testclassname}} now"),
    );
    let client = GeminiOracleClient::new(&config(server.url(), 0), library).unwrap();
    client.generate(single_test_request()).await.unwrap();

    mock.assert_async().await;
}
