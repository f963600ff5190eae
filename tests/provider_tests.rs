//! Integration tests for the LLM providers against a fake model server

mod common;

use common::{FakeLlmServer, FakeReply};
use rimas_generator::config::{ProviderKind, ProviderSettings};
use rimas_generator::llm::{
    create_provider, CompletionOptions, LlmError, LlmProvider, Message, OllamaProvider,
    OpenAIProvider,
};
use std::time::Duration;

fn messages() -> Vec<Message> {
    vec![
        Message::system("Você é um MC."),
        Message::user("Escreva quatro versos."),
    ]
}

// =============================================================================
// OpenAI-compatible
// =============================================================================

#[tokio::test]
async fn test_openai_completion() {
    let server = FakeLlmServer::spawn(vec![FakeReply::content("Verso pronto")]).await;
    let provider = OpenAIProvider::new(&server.openai_url, "fake-model", Some("sk-test".to_string()));

    let options = CompletionOptions {
        temperature: 0.9,
        max_tokens: Some(200),
        presence_penalty: Some(0.3),
        frequency_penalty: Some(0.5),
        ..Default::default()
    };
    let response = provider.complete(&messages(), &options).await.unwrap();
    assert_eq!(response.message.content, "Verso pronto");
    let usage = response.usage.unwrap();
    assert_eq!((usage.prompt_tokens, usage.completion_tokens), (800, 60));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "fake-model");
    assert_eq!(requests[0]["max_tokens"], 200);
    assert_eq!(requests[0]["messages"].as_array().unwrap().len(), 2);
    assert!(requests[0].get("response_format").is_none());
}

#[tokio::test]
async fn test_openai_json_mode() {
    let server = FakeLlmServer::spawn(vec![FakeReply::content("{}")]).await;
    let provider = OpenAIProvider::new(&server.openai_url, "fake-model", Some("sk-test".to_string()));

    let options = CompletionOptions {
        json_response: true,
        ..Default::default()
    };
    provider.complete(&messages(), &options).await.unwrap();
    assert_eq!(server.requests()[0]["response_format"]["type"], "json_object");
}

#[tokio::test]
async fn test_openai_error_statuses() {
    let server = FakeLlmServer::spawn(vec![FakeReply::Status(500), FakeReply::Status(429)]).await;
    let provider = OpenAIProvider::new(&server.openai_url, "fake-model", Some("sk-test".to_string()));
    let options = CompletionOptions::default();

    let err = provider.complete(&messages(), &options).await.unwrap_err();
    assert!(matches!(err, LlmError::Api { status: 500, .. }), "{:?}", err);

    let err = provider.complete(&messages(), &options).await.unwrap_err();
    assert!(matches!(err, LlmError::RateLimited), "{:?}", err);
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn test_openai_health_check() {
    let server = FakeLlmServer::spawn(vec![]).await;
    let provider = OpenAIProvider::new(&server.openai_url, "fake-model", Some("sk-test".to_string()));
    provider.health_check().await.unwrap();
    assert_eq!(server.calls(), 0);
}

// =============================================================================
// Ollama
// =============================================================================

#[tokio::test]
async fn test_ollama_completion_in_json_mode() {
    let server = FakeLlmServer::spawn(vec![FakeReply::content(
        r#"{"coerencia": 8, "originalidade": 7}"#,
    )])
    .await;
    let provider = OllamaProvider::new(&server.ollama_url, "fake:latest");

    let options = CompletionOptions {
        temperature: 0.3,
        max_tokens: Some(150),
        json_response: true,
        ..Default::default()
    };
    let response = provider.complete(&messages(), &options).await.unwrap();
    assert!(response.message.content.contains("coerencia"));
    let usage = response.usage.unwrap();
    assert_eq!((usage.prompt_tokens, usage.completion_tokens), (300, 40));

    let request = &server.requests()[0];
    assert_eq!(request["stream"], false);
    assert_eq!(request["format"], "json");
    assert_eq!(request["options"]["num_predict"], 150);
}

#[tokio::test]
async fn test_ollama_error_and_health() {
    let server = FakeLlmServer::spawn(vec![FakeReply::Status(500)]).await;
    let provider = OllamaProvider::new(&server.ollama_url, "fake:latest");

    let err = provider
        .complete(&messages(), &CompletionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    provider.health_check().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_server_is_a_connection_error() {
    let provider = OllamaProvider::new("http://127.0.0.1:9", "fake:latest");
    let options = CompletionOptions {
        timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let err = provider.complete(&messages(), &options).await.unwrap_err();
    assert!(
        matches!(err, LlmError::Connection(_) | LlmError::Timeout),
        "{:?}",
        err
    );
    assert!(provider.health_check().await.is_err());
}

// =============================================================================
// Factory
// =============================================================================

#[tokio::test]
async fn test_factory_builds_working_providers() {
    let server = FakeLlmServer::spawn(vec![FakeReply::content("a"), FakeReply::content("b")]).await;

    let openai = create_provider(&ProviderSettings {
        kind: ProviderKind::Openai,
        base_url: server.openai_url.clone(),
        model: "fake-model".to_string(),
        api_key: Some("sk-test".to_string()),
        api_key_command: None,
    })
    .unwrap()
    .unwrap();
    let ollama = create_provider(&ProviderSettings {
        kind: ProviderKind::Ollama,
        base_url: server.ollama_url.clone(),
        model: "fake:latest".to_string(),
        api_key: None,
        api_key_command: None,
    })
    .unwrap()
    .unwrap();

    let options = CompletionOptions::default();
    assert_eq!(openai.complete(&messages(), &options).await.unwrap().message.content, "a");
    assert_eq!(ollama.complete(&messages(), &options).await.unwrap().message.content, "b");
    assert_eq!(openai.name(), "openai");
    assert_eq!(ollama.name(), "ollama");
}
