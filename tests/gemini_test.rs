//! Integration tests for the Gemini client
//!
//! Tests HTTP client behavior using wiremock for request/response mocking.

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use campaign_lab::config::{GeminiConfig, ModelConfig, RequestConfig};
use campaign_lab::error::ProviderError;
use campaign_lab::gemini::GeminiClient;
use campaign_lab::providers::{
    AspectRatio, ImageProvider, ImageRequest, InlineImage, PromptPart, SpeechProvider,
    TextProvider, TextRequest,
};

fn create_test_client(base_url: &str) -> GeminiClient {
    let config = GeminiConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
    };
    let models = ModelConfig {
        text: "text-model".to_string(),
        image: "image-model".to_string(),
        speech: "tts-model".to_string(),
    };
    let request_config = RequestConfig {
        timeout_ms: 5000,
        max_retries: 0, // No retries for testing
        retry_delay_ms: 10,
    };

    GeminiClient::new(&config, models, request_config).expect("Failed to create client")
}

fn text_response(text: &str, input: u64, output: u64) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": input, "candidatesTokenCount": output }
    })
}

fn inline_response(data: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": data } }
                ]
            }
        }],
        "usageMetadata": { "promptTokenCount": 12 }
    })
}

mod text_tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_text_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/text-model:generateContent"))
            .and(header("x-goog-api-key", "test-api-key"))
            .and(body_partial_json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Write a hook" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(
                "Stop scrolling.",
                120,
                8,
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let result = client
            .generate_text(TextRequest::new("Write a hook"))
            .await
            .unwrap();

        assert_eq!(result.value, "Stop scrolling.");
        assert_eq!(result.input_tokens, 120);
        assert_eq!(result.output_tokens, 8);
    }

    #[tokio::test]
    async fn test_generate_text_sends_schema() {
        let mock_server = MockServer::start().await;
        let schema = json!({ "type": "ARRAY", "items": { "type": "OBJECT" } });

        Mock::given(method("POST"))
            .and(path("/v1beta/models/text-model:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": schema.clone()
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("[]", 1, 1)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let result = client
            .generate_text(TextRequest::new("List personas").with_schema(schema))
            .await;

        assert!(result.is_ok(), "schema request should match: {:?}", result.err());
    }

    #[tokio::test]
    async fn test_generate_text_inline_image_part() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "contents": [{ "parts": [
                    { "inlineData": { "mimeType": "image/jpeg", "data": "SU1H" } },
                    { "text": "What is this?" }
                ] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("{}", 1, 1)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let request = TextRequest {
            parts: vec![
                PromptPart::Image(InlineImage::from_base64(
                    "image/jpeg",
                    "data:image/jpeg;base64,SU1H",
                )),
                PromptPart::Text("What is this?".to_string()),
            ],
            response_schema: None,
        };

        assert!(client.generate_text(request).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_usage_counts_as_zero() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let result = client.generate_text(TextRequest::new("x")).await.unwrap();
        assert_eq!((result.input_tokens, result.output_tokens), (0, 0));
    }
}

mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let result = client.generate_text(TextRequest::new("x")).await;

        match result {
            Err(ProviderError::Unavailable { message, .. }) => {
                assert!(message.contains("500"), "message: {}", message);
            }
            other => panic!("expected Unavailable, got {:?}", other.map(|g| g.value)),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let result = client.generate_text(TextRequest::new("x")).await;
        assert!(matches!(result, Err(ProviderError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("ok", 1, 1)))
            .mount(&mock_server)
            .await;

        let config = GeminiConfig {
            api_key: "k".to_string(),
            base_url: mock_server.uri(),
        };
        let client = GeminiClient::new(
            &config,
            ModelConfig::default(),
            RequestConfig {
                timeout_ms: 5000,
                max_retries: 2,
                retry_delay_ms: 1,
            },
        )
        .unwrap();

        let result = client.generate_text(TextRequest::new("x")).await.unwrap();
        assert_eq!(result.value, "ok");
    }
}

mod media_tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_image_returns_data_url() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/image-model:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": { "imageConfig": { "aspectRatio": "9:16" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(inline_response("aW1n")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let request = ImageRequest {
            parts: vec![PromptPart::Text("A mug on a desk".to_string())],
            aspect_ratio: AspectRatio::Portrait,
        };
        let result = client.generate_image(request).await.unwrap();

        assert_eq!(result.value.as_deref(), Some("data:image/png;base64,aW1n"));
        assert_eq!(result.input_tokens, 12);
    }

    #[tokio::test]
    async fn test_generate_image_without_inline_data() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(text_response("I can't draw that", 3, 4)),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let request = ImageRequest {
            parts: vec![PromptPart::Text("x".to_string())],
            aspect_ratio: AspectRatio::Square,
        };
        let result = client.generate_image(request).await.unwrap();
        assert!(result.value.is_none());
    }

    #[tokio::test]
    async fn test_synthesize_uses_voice() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/tts-model:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                    "speechConfig": { "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Kore" } } }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(inline_response("UENN")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let audio = client.synthesize("Hello there", "Kore").await.unwrap();
        assert_eq!(audio, "UENN");
    }

    #[tokio::test]
    async fn test_synthesize_empty_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let result = client.synthesize("Hello", "Zephyr").await;
        assert!(matches!(result, Err(ProviderError::EmptyResponse { .. })));
    }
}
