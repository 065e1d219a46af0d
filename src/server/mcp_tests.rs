//! Unit tests for the MCP transport.
//!
//! Covers JSON-RPC envelopes, the tool catalogue and request dispatch
//! against an in-memory [`AppState`](crate::server::AppState).

use super::*;
use crate::config::{
    Config, GeminiConfig, LogFormat, LoggingConfig, ModelConfig, PipelineConfig, PricingConfig,
    RequestConfig, ScrapeConfig, SimulationConfig,
};
use crate::pipeline::Providers;
use crate::project::ProjectContext;
use crate::providers::{MockImageProvider, MockPageScraper, MockSpeechProvider, MockTextProvider};
use crate::server::AppState;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

fn test_server() -> McpServer {
    let config = Config {
        gemini: GeminiConfig {
            api_key: "test-key".to_string(),
            base_url: "http://localhost".to_string(),
        },
        models: ModelConfig::default(),
        scrape: ScrapeConfig {
            api_key: None,
            base_url: "http://localhost".to_string(),
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        },
        request: RequestConfig::default(),
        pricing: PricingConfig::default(),
        pipeline: PipelineConfig::default(),
        simulation: SimulationConfig {
            seed: Some(1),
            busy_ms: 0,
        },
    };
    let providers = Providers {
        text: Arc::new(MockTextProvider::new()),
        image: Arc::new(MockImageProvider::new()),
        speech: Arc::new(MockSpeechProvider::new()),
        scraper: Arc::new(MockPageScraper::new()),
    };
    McpServer::new(Arc::new(AppState::new(
        config,
        providers,
        ProjectContext::default(),
    )))
}

fn request(id: Option<Value>, method: &str, params: Option<Value>) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id,
        method: method.to_string(),
        params,
    }
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> (Value, bool) {
    let response = server
        .handle_request(request(
            Some(json!(1)),
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        ))
        .await
        .unwrap();
    let result = response.result.unwrap();
    let is_error = result["isError"].as_bool().unwrap_or(false);
    let text = result["content"][0]["text"].as_str().unwrap().to_string();
    if is_error {
        (Value::String(text), true)
    } else {
        (serde_json::from_str(&text).unwrap(), false)
    }
}

// ============================================================================
// JsonRpcResponse tests
// ============================================================================

#[test]
fn test_jsonrpc_response_success() {
    let response = JsonRpcResponse::success(Some(json!("req-7")), json!({"ok": true}));
    assert_eq!(response.jsonrpc, "2.0");
    assert_eq!(response.id, json!("req-7"));
    assert!(response.error.is_none());

    let serialized = serde_json::to_string(&response).unwrap();
    assert!(serialized.contains("\"result\""));
    assert!(!serialized.contains("\"error\""));
}

#[test]
fn test_jsonrpc_response_error_without_id() {
    let response = JsonRpcResponse::error(None, codes::PARSE_ERROR, "Parse error");
    assert_eq!(response.id, Value::Null);
    assert!(response.result.is_none());

    let serialized = serde_json::to_value(&response).unwrap();
    assert_eq!(serialized["error"]["code"], -32700);
    assert!(serialized["error"].get("data").is_none());
}

#[test]
fn test_tool_call_result_error_flag() {
    let ok = serde_json::to_value(ToolCallResult::text("{}".into(), false)).unwrap();
    assert!(ok.get("isError").is_none());
    assert_eq!(ok["content"][0]["type"], "text");

    let failed = serde_json::to_value(ToolCallResult::text("Error: x".into(), true)).unwrap();
    assert_eq!(failed["isError"], true);
}

// ============================================================================
// Tool catalogue
// ============================================================================

#[test]
fn test_tool_names_are_unique_and_prefixed() {
    let tools = all_tools();
    assert_eq!(tools.len(), 18);

    let names: HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names.len(), tools.len());
    assert!(names.iter().all(|n| n.starts_with("campaign_")));
}

#[test]
fn test_tool_schemas_are_objects() {
    for tool in all_tools() {
        assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
        assert!(!tool.description.is_empty());
    }
}

#[test]
fn test_generate_creatives_schema_lists_every_format() {
    let tool = get_generate_creatives_tool();
    let formats = tool.input_schema["properties"]["formats"]["items"]["enum"]
        .as_array()
        .unwrap();
    assert_eq!(formats.len(), CreativeFormat::ALL.len());
    assert!(formats.contains(&json!("CAROUSEL_REAL_STORY")));
}

#[test]
fn test_tool_serializes_input_schema_camel_case() {
    let value = serde_json::to_value(get_promote_tool()).unwrap();
    assert!(value.get("inputSchema").is_some());
    assert!(value.get("input_schema").is_none());
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_initialize_reports_server_info() {
    let server = test_server();
    let response = server
        .handle_request(request(Some(json!(1)), "initialize", Some(json!({}))))
        .await
        .unwrap();
    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(result["serverInfo"]["name"], "campaign-lab");
    assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
}

#[tokio::test]
async fn test_notifications_get_no_response() {
    let server = test_server();
    assert!(server
        .handle_request(request(None, "initialized", None))
        .await
        .is_none());
    assert!(server
        .handle_request(request(None, "notifications/cancelled", None))
        .await
        .is_none());
    assert!(server
        .handle_request(request(None, "something/else", None))
        .await
        .is_none());
}

#[tokio::test]
async fn test_unknown_method_with_id() {
    let server = test_server();
    let response = server
        .handle_request(request(Some(json!(9)), "resources/list", None))
        .await
        .unwrap();
    let error = response.error.unwrap();
    assert_eq!(error.code, codes::METHOD_NOT_FOUND);
    assert!(error.message.contains("resources/list"));
}

#[tokio::test]
async fn test_handle_line_parse_error_and_blank() {
    let server = test_server();
    assert!(server.handle_line("   \n").await.is_none());

    let response = server.handle_line("{not json").await.unwrap();
    assert_eq!(response.id, Value::Null);
    assert_eq!(response.error.unwrap().code, codes::PARSE_ERROR);

    let pong = server
        .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#)
        .await
        .unwrap();
    assert_eq!(pong.result.unwrap(), json!({}));
}

#[tokio::test]
async fn test_tools_call_missing_params() {
    let server = test_server();
    let response = server
        .handle_request(request(Some(json!(1)), "tools/call", None))
        .await
        .unwrap();
    let error = response.error.unwrap();
    assert_eq!(error.code, codes::INVALID_PARAMS);
    assert_eq!(error.message, "Invalid request: missing params");
}

#[tokio::test]
async fn test_tools_call_params_without_name() {
    let server = test_server();
    let response = server
        .handle_request(request(
            Some(json!(2)),
            "tools/call",
            Some(json!({ "arguments": {} })),
        ))
        .await
        .unwrap();
    assert_eq!(response.id, json!(2));
    let error = response.error.unwrap();
    assert_eq!(error.code, codes::INVALID_PARAMS);
    assert!(error.message.starts_with("Invalid request: bad tools/call params"));
}

#[tokio::test]
async fn test_unknown_tool_is_error_result() {
    let server = test_server();
    let (text, is_error) = call_tool(&server, "reasoning_linear", json!({})).await;
    assert!(is_error);
    assert!(text.as_str().unwrap().starts_with("Error: "));
}

#[tokio::test]
async fn test_project_tools_round_trip() {
    let server = test_server();

    let (project, _) = call_tool(&server, "campaign_project_get", json!({})).await;
    assert_eq!(project["product_name"], "Zenith Focus Gummies");

    let (updated, is_error) = call_tool(
        &server,
        "campaign_project_set_awareness",
        json!({"market_awareness": "MOST_AWARE"}),
    )
    .await;
    assert!(!is_error);
    assert_eq!(updated["market_awareness"], "MOST_AWARE");
    assert_eq!(updated["funnel_stage"], "BOF");

    let (_, is_error) = call_tool(
        &server,
        "campaign_project_set_awareness",
        json!({"market_awareness": "VERY_AWARE"}),
    )
    .await;
    assert!(is_error);

    let (updated, _) = call_tool(
        &server,
        "campaign_project_update",
        json!({"target_country": "Indonesia"}),
    )
    .await;
    assert_eq!(updated["target_country"], "Indonesia");
    assert_eq!(updated["funnel_stage"], "BOF");
}

#[tokio::test]
async fn test_graph_tools() {
    let server = test_server();

    let (view, _) = call_tool(&server, "campaign_view", json!({})).await;
    assert_eq!(view["view"], "lab");
    assert_eq!(view["nodes"].as_array().unwrap().len(), 1);

    let (moved, is_error) = call_tool(
        &server,
        "campaign_move_node",
        json!({"node_id": "root", "x": 40.0, "y": -10.0}),
    )
    .await;
    assert!(!is_error);
    assert_eq!(moved["position"]["x"], 40.0);

    let (node, _) = call_tool(&server, "campaign_get_node", json!({"node_id": "root"})).await;
    assert_eq!(node["position"]["y"], -10.0);

    let (missing, is_error) =
        call_tool(&server, "campaign_get_node", json!({"node_id": "nope"})).await;
    assert!(is_error);
    assert!(missing.as_str().unwrap().contains("nope"));

    let (vault, _) = call_tool(&server, "campaign_view", json!({"view": "vault"})).await;
    assert!(vault["nodes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_simulate_and_stage_tools() {
    let server = test_server();

    let (report, is_error) = call_tool(&server, "campaign_simulate", json!({"ticks": 2})).await;
    assert!(!is_error);
    assert_eq!(report["ticks"].as_array().unwrap().len(), 2);

    let (_, is_error) = call_tool(&server, "campaign_simulate", json!({"ticks": 0})).await;
    assert!(is_error);

    let (err, is_error) = call_tool(&server, "campaign_promote", json!({"node_id": "root"})).await;
    assert!(is_error);
    assert!(err.as_str().unwrap().contains("root"));
}

#[tokio::test]
async fn test_list_formats_groups() {
    let server = test_server();
    let (groups, _) = call_tool(&server, "campaign_list_formats", json!({})).await;
    let total: usize = groups
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["formats"].as_array().unwrap().len())
        .sum();
    assert_eq!(total, CreativeFormat::ALL.len());
}

#[tokio::test]
async fn test_generate_creatives_rejects_unknown_format() {
    let server = test_server();
    let (err, is_error) = call_tool(
        &server,
        "campaign_generate_creatives",
        json!({"node_id": "root", "formats": ["NOT_A_FORMAT"]}),
    )
    .await;
    assert!(is_error);
    assert!(err.as_str().unwrap().contains("NOT_A_FORMAT"));
}
