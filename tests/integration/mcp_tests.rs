/// JSON-RPC round trips through the MCP server
use std::sync::Arc;

use recovery_tracker_mcp::mcp::protocol::error_codes;
use recovery_tracker_mcp::mcp::McpServer;
use recovery_tracker_mcp::{ManualClock, RecoveryTrackerServer, SqliteStorage, TrackerConfig};
use chrono::Duration;
use serde_json::{json, Value};

use crate::common::start_time;

#[cfg(test)]
mod mcp_integration_tests {
    use super::*;

    fn request(id: u64, method: &str, params: Value) -> String {
        json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string()
    }

    async fn send(server: &mut McpServer, line: &str) -> Value {
        let response = server.process_line(line).await.expect("expected a response");
        serde_json::to_value(&response).unwrap()
    }

    async fn call(server: &mut McpServer, id: u64, tool: &str, arguments: Value) -> Value {
        let line = request(id, "tools/call", json!({ "name": tool, "arguments": arguments }));
        send(server, &line).await["result"].clone()
    }

    /// The structured half of a successful tool result
    fn data(result: &Value) -> Value {
        let text = result["content"][1]["text"].as_str().expect("data content");
        serde_json::from_str(text).unwrap()
    }

    fn server() -> McpServer {
        server_with_clock().0
    }

    fn server_with_clock() -> (McpServer, Arc<ManualClock>) {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let clock = Arc::new(ManualClock::new(start_time()));
        let tracker = RecoveryTrackerServer::with_clock(storage, TrackerConfig::default(), clock.clone()).unwrap();
        (McpServer::new(tracker), clock)
    }

    fn text(result: &Value) -> &str {
        result["content"][0]["text"].as_str().expect("text content")
    }

    fn prompt_step(result: &Value) -> u64 {
        data(result)["prompt"]["step"].as_u64().expect("open prompt")
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let mut server = server();

        let response = send(
            &mut server,
            &request(1, "initialize", json!({ "protocolVersion": "2024-11-05", "clientInfo": { "name": "test" } })),
        )
        .await;
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "Recovery Tracker MCP");
        assert_eq!(response["result"]["capabilities"]["tools"]["listChanged"], false);

        let notification = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string();
        assert!(server.process_line(&notification).await.is_none());
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let mut server = server();
        let response = send(&mut server, &request(2, "tools/list", json!({}))).await;

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 14);
        for tool in tools {
            assert!(tool["inputSchema"].is_object(), "{} has no schema", tool["name"]);
        }
        let names: Vec<_> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
        assert!(names.contains(&"conversation_answer"));
        assert!(names.contains(&"history_export"));
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let mut server = server();

        let response = send(&mut server, "{not json").await;
        assert_eq!(response["error"]["code"], error_codes::PARSE_ERROR);

        let response = send(&mut server, &request(3, "resources/list", json!({}))).await;
        assert_eq!(response["error"]["code"], error_codes::METHOD_NOT_FOUND);

        // user_id is required
        let line = request(4, "tools/call", json!({ "name": "journey_new", "arguments": {} }));
        let response = send(&mut server, &line).await;
        assert_eq!(response["error"]["code"], error_codes::INVALID_PARAMS);

        let result = call(&mut server, 5, "make_coffee", json!({})).await;
        assert_eq!(result["isError"], true);

        assert!(server.process_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn test_journey_conversation_over_mcp() {
        let mut server = server();

        let result = call(&mut server, 1, "user_register", json!({ "user_id": 21, "username": "@kai" })).await;
        assert_eq!(result["isError"], false);

        let result = call(&mut server, 2, "journey_new", json!({ "user_id": 21 })).await;
        assert_eq!(result["isError"], false);
        let step = data(&result)["prompt"]["step"].as_u64().unwrap();

        let result = call(
            &mut server,
            3,
            "conversation_answer",
            json!({ "user_id": 21, "answer": "4", "step": step }),
        )
        .await;
        let reply = data(&result);
        assert_eq!(reply["event"]["event"], "journey_started");
        let next_step = reply["prompt"]["step"].as_u64().unwrap();
        assert!(next_step > step);

        // answering the old step again is refused without ending the flow
        let result = call(
            &mut server,
            4,
            "conversation_answer",
            json!({ "user_id": 21, "answer": "4", "step": step }),
        )
        .await;
        assert_eq!(result["isError"], true);

        let result = call(
            &mut server,
            5,
            "conversation_answer",
            json!({ "user_id": 21, "answer": "Memes", "step": next_step }),
        )
        .await;
        let reply = data(&result);
        assert_eq!(reply["event"]["event"], "rank_assigned");
        assert!(reply.get("prompt").is_none());

        let result = call(&mut server, 6, "journey_new", json!({ "user_id": 21 })).await;
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"].as_str().unwrap().starts_with("Error: "));

        let result = call(&mut server, 7, "account_view", json!({ "user_id": 21 })).await;
        assert_eq!(result["isError"], false);
        let profile = data(&result);
        assert_eq!(profile["username"], "kai");
        assert_eq!(profile["days"], 4);
        assert_eq!(profile["rank_system"], "Memes");
        assert_eq!(profile["entries"]["scope"], "all");
    }

    #[tokio::test]
    async fn test_tasks_and_stats_over_mcp() {
        let mut server = server();

        let result = call(&mut server, 1, "task_complete", json!({ "user_id": 30 })).await;
        assert_eq!(result["isError"], true);

        let result = call(&mut server, 2, "task_request", json!({ "user_id": 30, "message_ref": 12 })).await;
        assert_eq!(data(&result)["status"], "assigned");

        let result = call(&mut server, 3, "task_request", json!({ "user_id": 30 })).await;
        assert_eq!(data(&result)["status"], "unfinished");

        let result = call(&mut server, 4, "ranks_list", json!({})).await;
        assert_eq!(data(&result).as_array().unwrap().len(), 3);

        let result = call(&mut server, 5, "tracker_stats", json!({})).await;
        let stats = data(&result);
        assert_eq!(stats["users"], 0);
        assert_eq!(stats["requests_handled"], 4);
        assert_eq!(server.stats().requests_handled, 5);
    }

    #[tokio::test]
    async fn test_late_answer_reports_timeout_over_mcp() {
        let (mut server, clock) = server_with_clock();

        let result = call(&mut server, 1, "journey_new", json!({ "user_id": 40 })).await;
        let step = prompt_step(&result);
        let result = call(
            &mut server,
            2,
            "conversation_answer",
            json!({ "user_id": 40, "answer": "3", "step": step }),
        )
        .await;
        let step = prompt_step(&result);
        call(
            &mut server,
            3,
            "conversation_answer",
            json!({ "user_id": 40, "answer": "Belts", "step": step }),
        )
        .await;

        let result = call(&mut server, 4, "checkin_start", json!({ "user_id": 40 })).await;
        let step = prompt_step(&result);
        clock.advance(Duration::seconds(301));

        let result = call(
            &mut server,
            5,
            "conversation_answer",
            json!({ "user_id": 40, "answer": "survived", "step": step }),
        )
        .await;
        assert_eq!(result["isError"], true);
        assert_eq!(text(&result), "Error: No answer received");

        call(&mut server, 6, "checkin_start", json!({ "user_id": 40 })).await;
        clock.advance(Duration::seconds(301));
        let result = call(&mut server, 7, "conversation_cancel", json!({ "user_id": 40 })).await;
        assert_eq!(text(&result), "Error: No answer received");
        assert!(server.tracker().conversations().is_empty());
    }

    #[tokio::test]
    async fn test_other_users_expired_prompts_are_swept() {
        let (mut server, clock) = server_with_clock();

        call(&mut server, 1, "journey_new", json!({ "user_id": 41 })).await;
        clock.advance(Duration::seconds(301));

        call(&mut server, 2, "task_request", json!({ "user_id": 42 })).await;
        assert!(server.tracker().conversations().is_empty());

        let result = call(&mut server, 3, "conversation_answer", json!({ "user_id": 41, "answer": "3" })).await;
        assert!(text(&result).starts_with("Error: Not found"));
    }

    #[tokio::test]
    async fn test_free_text_without_step_is_refused_over_mcp() {
        let mut server = server();

        let result = call(&mut server, 1, "journey_new", json!({ "user_id": 43 })).await;
        let step = prompt_step(&result);

        let result = call(&mut server, 2, "conversation_answer", json!({ "user_id": 43, "answer": "3" })).await;
        assert_eq!(result["isError"], true);
        assert!(text(&result).starts_with("Error: Invalid input"));

        // the question is still open
        let result = call(
            &mut server,
            3,
            "conversation_answer",
            json!({ "user_id": 43, "answer": "3", "step": step }),
        )
        .await;
        assert_eq!(data(&result)["event"]["event"], "journey_started");
    }
}
