//! Integration tests for the tool trait and the HTTP server.
//!
//! These prove that custom tools registered through [`ToolRegistry`] are
//! served next to the built-ins and share the same practice.

use anyhow::Result;
use async_trait::async_trait;
use brieflens::config::{parse_config, Config};
use brieflens::ingest::load_practice;
use brieflens::server::serve_practice;
use brieflens::traits::{SearchOptions, Tool, ToolContext, ToolRegistry};
use serde_json::{json, Value};

// ─── Test Tool ──────────────────────────────────────────────────────

/// Counts search hits for a query, via the tool context.
struct HitCountTool;

#[async_trait]
impl Tool for HitCountTool {
    fn name(&self) -> &str {
        "hit_count"
    }

    fn description(&self) -> &str {
        "Count search results for a query"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = params["query"].as_str().unwrap_or("");
        let results = ctx
            .search(
                query,
                SearchOptions {
                    limit: Some(100),
                    ..Default::default()
                },
            )
            .await?;
        let documents = ctx.documents(None).await;

        Ok(json!({
            "query": query,
            "count": results.len(),
            "documents": documents.len(),
        }))
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn test_config(port: u16) -> Config {
    parse_config(&format!(
        r#"
[server]
bind = "127.0.0.1:{}"
"#,
        port
    ))
    .unwrap()
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn start_server(extra: ToolRegistry) -> u16 {
    let port = find_free_port();
    let cfg = test_config(port);
    let practice = load_practice(&cfg).unwrap();
    tokio::spawn(async move {
        let _ = serve_practice(&cfg, practice, extra).await;
    });
    wait_for_server(port).await;
    port
}

async fn call(port: u16, tool: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/tools/{}", port, tool))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_reports_documents() {
    let port = start_server(ToolRegistry::new()).await;
    let v: Value = reqwest::get(format!("http://127.0.0.1:{}/health", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(v["status"], "ok");
    assert_eq!(v["documents"], 4);
}

#[tokio::test]
async fn test_tools_list_includes_builtins_and_custom() {
    let mut extra = ToolRegistry::new();
    extra.register(Box::new(HitCountTool));
    let port = start_server(extra).await;

    let v: Value = reqwest::get(format!("http://127.0.0.1:{}/tools/list", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tools = v["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["ask", "search", "documents", "add_document", "hit_count"]);
    assert_eq!(tools[0]["builtin"], true);
    assert_eq!(tools[4]["builtin"], false);
    assert_eq!(tools[4]["parameters"]["required"][0], "query");
}

#[tokio::test]
async fn test_ask_scenarios_over_http() {
    let port = start_server(ToolRegistry::new()).await;

    let (status, v) = call(port, "ask", json!({ "query": "How many clients?" })).await;
    assert_eq!(status, 200);
    assert_eq!(v["result"]["answer"], "3");
    assert_eq!(v["result"]["sources"][0]["document"], "Internal registry");

    let (_, v) = call(port, "ask", json!({ "query": "What did Johnson Corporation file?" })).await;
    assert!(v["result"]["answer"].as_str().unwrap().contains("complaint"));
    assert_eq!(v["result"]["sources"][0]["document"], "Johnson_Complaint.txt");

    let (_, v) = call(port, "ask", json!({ "query": "quantum physics equations" })).await;
    assert_eq!(v["result"]["answer"], "Not specified");
    assert_eq!(v["result"]["sources"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_add_document_is_searchable() {
    let mut extra = ToolRegistry::new();
    extra.register(Box::new(HitCountTool));
    let port = start_server(extra).await;

    let (status, _) = call(
        port,
        "add_document",
        json!({
            "name": "Mediation_Notice.txt",
            "client": "Riverside Holdings LLC",
            "content_text": "Mediation with Harbor Point Cafe is scheduled for September 9."
        }),
    )
    .await;
    assert_eq!(status, 200);

    let (_, v) = call(port, "hit_count", json!({ "query": "mediation" })).await;
    assert_eq!(v["result"]["count"], 1);
    assert_eq!(v["result"]["documents"], 5);

    let (_, v) = call(port, "ask", json!({ "query": "When is the mediation scheduled?" })).await;
    assert!(v["result"]["answer"].as_str().unwrap().contains("September 9"));
}

#[tokio::test]
async fn test_error_contract() {
    let port = start_server(ToolRegistry::new()).await;

    let (status, v) = call(port, "nope", json!({})).await;
    assert_eq!(status, 404);
    assert_eq!(v["error"]["code"], "not_found");

    let (status, v) = call(port, "ask", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(v["error"]["code"], "bad_request");
    assert!(v["error"]["message"].as_str().unwrap().contains("query"));

    let (status, v) = call(port, "ask", json!({ "query": "   " })).await;
    assert_eq!(status, 400);
    assert!(v["error"]["message"]
        .as_str()
        .unwrap()
        .contains("must not be empty"));

    let (status, _) = call(port, "search", json!({ "query": "rent", "limit": "ten" })).await;
    assert_eq!(status, 400);

    let (status, v) = call(port, "add_document", json!({ "name": "Empty" })).await;
    assert_eq!(status, 400);
    assert_eq!(v["error"]["code"], "bad_request");
}
