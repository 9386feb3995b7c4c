//! Tool extension trait and registry for the HTTP tool server.
//!
//! Every operation the server exposes is a [`Tool`]: the built-ins (`ask`,
//! `search`, `documents`, `add_document`) and any custom tools a binary
//! registers. Tools reach the practice through a [`ToolContext`].
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  ┌──────────────────┐ ┌───────────────┐  │
//! │  │ Built-in         │ │ Custom (Rust) │  │
//! │  │ ask / search     │ │ Tools         │  │
//! │  │ documents / add  │ │               │  │
//! │  └──────────────────┘ └───────────────┘  │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!          run_server() → POST /tools/{name}
//! ```
//!
//! # Usage
//!
//! ```rust
//! use brieflens::traits::ToolRegistry;
//!
//! let mut tools = ToolRegistry::with_builtins();
//! // tools.register(Box::new(MyTool::new()));
//! assert_eq!(tools.len(), 4);
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::ask::{ask_question, search_chunks, AskResponse};
use crate::config::Config;
use crate::ingest::{Practice, RawRecord};
use crate::models::{Document, SourceCitation};

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that clients can discover and call over HTTP.
///
/// Tools are registered at server startup and exposed via
/// `GET /tools/list` for discovery and `POST /tools/{name}` for
/// invocation.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use brieflens::traits::{Tool, ToolContext};
///
/// pub struct ClientCountTool;
///
/// #[async_trait]
/// impl Tool for ClientCountTool {
///     fn name(&self) -> &str { "client_count" }
///     fn description(&self) -> &str { "Number of clients on file" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {}, "required": [] })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         let answer = ctx.ask("how many clients").await?;
///         Ok(json!({ "clients": answer.answer }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route name (`POST /tools/{name}`); lowercase with underscores.
    fn name(&self) -> &str;

    /// One-line description for discovery.
    fn description(&self) -> &str;

    /// Whether this tool ships with brieflens. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema for the parameters (`type: "object"`, `properties`,
    /// optional `required`).
    fn parameters_schema(&self) -> Value;

    /// Execute with parameters already checked by [`validate_params`].
    ///
    /// The returned value is wrapped in `{ "result": ... }`.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Serializable tool info for the `/tools/list` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub parameters: Value,
}

impl ToolInfo {
    pub fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            builtin: tool.is_builtin(),
            parameters: tool.parameters_schema(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter validation
// ═══════════════════════════════════════════════════════════════════════

/// Check `params` against a tool's schema and fill in defaults.
///
/// Enforces required fields, JSON types and `enum` values. Properties
/// missing from `params` take the schema's `default`, if any.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let params_obj = match params {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => bail!("parameters must be a JSON object, got {}", json_type_name(other)),
    };

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    for req in &required {
        if !params_obj.contains_key(*req) {
            bail!("missing required parameter: {}", req);
        }
    }

    let mut result = params_obj.clone();

    for (prop_name, prop_schema) in &properties {
        let Some(value) = params_obj.get(prop_name) else {
            if let Some(default) = prop_schema.get("default") {
                result.insert(prop_name.clone(), default.clone());
            }
            continue;
        };

        if let Some(expected) = prop_schema.get("type").and_then(|t| t.as_str()) {
            let type_ok = match expected {
                "string" => value.is_string(),
                "integer" => value.is_i64() || value.is_u64(),
                "number" => value.is_number(),
                "boolean" => value.is_boolean(),
                "array" => value.is_array(),
                "object" => value.is_object(),
                _ => true,
            };
            if !type_ok {
                bail!(
                    "parameter '{}' must be of type '{}', got {}",
                    prop_name,
                    expected,
                    json_type_name(value)
                );
            }
        }

        if let Some(allowed) = prop_schema.get("enum").and_then(|e| e.as_array()) {
            if !allowed.contains(value) {
                let names: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                bail!(
                    "parameter '{}' must be one of [{}], got {}",
                    prop_name,
                    names.join(", "),
                    value
                );
            }
        }
    }

    Ok(Value::Object(result))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Options for [`ToolContext::search`].
#[derive(Debug, Default)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    /// Only chunks whose client, matter or document name contains this.
    pub client: Option<String>,
}

/// Document metadata returned by the `documents` tool.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
    pub client: Option<String>,
    pub matter: Option<String>,
    pub words: usize,
}

impl From<&Document> for DocumentSummary {
    fn from(d: &Document) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            client: d.client.clone(),
            matter: d.matter.clone(),
            words: d.text.split_whitespace().count(),
        }
    }
}

/// Bridge from tools to the shared practice.
///
/// The practice sits behind an async mutex: questions mutate the session
/// (index rebuilds) and `add_document` mutates the registry.
#[derive(Clone)]
pub struct ToolContext {
    config: Arc<Config>,
    practice: Arc<Mutex<Practice>>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, practice: Arc<Mutex<Practice>>) -> Self {
        Self { config, practice }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Answer a question. Equivalent to `POST /tools/ask` or `brief ask`.
    pub async fn ask(&self, query: &str) -> Result<AskResponse> {
        let mut practice = self.practice.lock().await;
        ask_question(&self.config, &mut practice, query).await
    }

    /// Ranked chunks. Equivalent to `POST /tools/search` or `brief search`.
    pub async fn search(&self, query: &str, opts: SearchOptions) -> Result<Vec<SourceCitation>> {
        let mut practice = self.practice.lock().await;
        let limit = opts.limit.unwrap_or(self.config.retrieval.top_k);
        search_chunks(&mut practice, query, limit, opts.client.as_deref())
    }

    /// Loaded documents, optionally only one client's.
    pub async fn documents(&self, client: Option<&str>) -> Vec<DocumentSummary> {
        let practice = self.practice.lock().await;
        practice
            .registry
            .documents()
            .iter()
            .filter(|d| match client {
                Some(c) => d
                    .client
                    .as_deref()
                    .is_some_and(|dc| dc.eq_ignore_ascii_case(c)),
                None => true,
            })
            .map(DocumentSummary::from)
            .collect()
    }

    /// Add a document. The next question rebuilds the index.
    pub async fn add_document(&self, record: RawRecord) -> Result<DocumentSummary> {
        let mut practice = self.practice.lock().await;
        let fallback = format!("api-{}", uuid::Uuid::new_v4());
        let item = record.into_source_item(&fallback)?;
        let doc = practice.add_item(item)?;
        tracing::info!(document = %doc.id, "document added");
        Ok(DocumentSummary::from(doc))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    let value = params[key].as_str().unwrap_or("");
    if value.trim().is_empty() {
        bail!("{} must not be empty", key);
    }
    Ok(value)
}

/// Built-in question answering tool.
pub struct AskTool;

#[async_trait]
impl Tool for AskTool {
    fn name(&self) -> &str {
        "ask"
    }

    fn description(&self) -> &str {
        "Answer a question about the practice with cited sources"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Question in plain English" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let response = ctx.ask(query).await?;
        Ok(serde_json::to_value(&response)?)
    }
}

/// Built-in chunk search tool.
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Rank document chunks by similarity to a query"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "limit": { "type": "integer", "description": "Max results", "default": 5 },
                "client": { "type": "string", "description": "Only this client's documents" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let limit = params["limit"].as_u64().map(|l| l as usize);
        if limit == Some(0) {
            bail!("limit must be >= 1 (invalid limit)");
        }
        let client = params["client"].as_str().map(str::to_string);

        let results = ctx.search(query, SearchOptions { limit, client }).await?;
        Ok(json!({ "results": results }))
    }
}

/// Built-in document listing tool.
pub struct DocumentsTool;

#[async_trait]
impl Tool for DocumentsTool {
    fn name(&self) -> &str {
        "documents"
    }

    fn description(&self) -> &str {
        "List loaded documents with their client and matter"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "client": { "type": "string", "description": "Only this client's documents" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let documents = ctx.documents(params["client"].as_str()).await;
        Ok(json!({ "documents": documents }))
    }
}

/// Built-in document upload tool.
pub struct AddDocumentTool;

#[async_trait]
impl Tool for AddDocumentTool {
    fn name(&self) -> &str {
        "add_document"
    }

    fn description(&self) -> &str {
        "Add a document to the practice"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "name": { "type": "string", "description": "Display name" },
                "client": { "type": "string" },
                "matter": { "type": "string" },
                "content_text": { "type": "string" },
                "content": { "type": "string" },
                "summary": { "type": "string" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let record: RawRecord = serde_json::from_value(params)
            .map_err(|e| anyhow::anyhow!("invalid document record: {}", e))?;
        if record.text().is_none() {
            bail!("content_text, content or summary must not be empty");
        }
        let doc = ctx.add_document(record).await?;
        Ok(json!({ "document": doc }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry for tools (built-in and custom).
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// A registry pre-loaded with `ask`, `search`, `documents` and
    /// `add_document`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(AskTool));
        registry.register(Box::new(SearchTool));
        registry.register(Box::new(DocumentsTool));
        registry.register(Box::new(AddDocumentTool));
        registry
    }

    /// Register a tool. A later tool with an existing name is ignored.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        if self.find(tool.name()).is_some() {
            tracing::warn!(tool = tool.name(), "duplicate tool name ignored");
            return;
        }
        self.tools.push(tool);
    }

    /// Move every tool from `other` into this registry.
    pub fn extend(&mut self, other: ToolRegistry) {
        for tool in other.tools {
            self.register(tool);
        }
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::load_practice;

    fn ctx() -> ToolContext {
        let config = Config::minimal();
        let practice = load_practice(&config).unwrap();
        ToolContext::new(Arc::new(config), Arc::new(Mutex::new(practice)))
    }

    #[test]
    fn test_validate_required_and_defaults() {
        let schema = SearchTool.parameters_schema();
        assert!(validate_params(&schema, &json!({})).is_err());
        let v = validate_params(&schema, &json!({ "query": "rent" })).unwrap();
        assert_eq!(v["limit"], 5);
    }

    #[test]
    fn test_validate_types_and_enums() {
        let schema = json!({
            "type": "object",
            "properties": {
                "mode": { "type": "string", "enum": ["a", "b"] },
                "n": { "type": "integer" }
            }
        });
        assert!(validate_params(&schema, &json!({ "n": "x" })).is_err());
        assert!(validate_params(&schema, &json!({ "mode": "c" })).is_err());
        assert!(validate_params(&schema, &json!({ "mode": "a", "n": 2 })).is_ok());
        assert!(validate_params(&schema, &json!([1, 2])).is_err());
        assert!(validate_params(&schema, &Value::Null).is_ok());
    }

    #[test]
    fn test_registry_builtins_and_duplicates() {
        let mut reg = ToolRegistry::with_builtins();
        assert_eq!(reg.len(), 4);
        reg.register(Box::new(AskTool));
        assert_eq!(reg.len(), 4);
        assert!(reg.find("add_document").unwrap().is_builtin());
        assert!(reg.find("nope").is_none());
    }

    #[tokio::test]
    async fn test_ask_tool() {
        let result = AskTool
            .execute(json!({ "query": "how many clients" }), &ctx())
            .await
            .unwrap();
        assert_eq!(result["answer"], "3");
        assert_eq!(result["mode"], "tool");
        assert_eq!(result["route"]["state"], "tool_matched");
    }

    #[tokio::test]
    async fn test_add_document_then_ask() {
        let ctx = ctx();
        AddDocumentTool
            .execute(
                json!({
                    "name": "Settlement.txt",
                    "client": "Johnson Corporation",
                    "content": "The parties agreed to a settlement of $90,000 payable in June."
                }),
                &ctx,
            )
            .await
            .unwrap();

        let docs = ctx.documents(Some("johnson corporation")).await;
        assert_eq!(docs.len(), 2);

        let resp = ctx.ask("What settlement did the parties agree?").await.unwrap();
        assert!(resp.answer.contains("$90,000"), "{}", resp.answer);
        assert_eq!(resp.sources[0].document, "Settlement.txt");
    }

    #[tokio::test]
    async fn test_add_document_requires_text() {
        let err = AddDocumentTool
            .execute(json!({ "name": "Empty" }), &ctx())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_search_tool_rejects_zero_limit() {
        let err = SearchTool
            .execute(json!({ "query": "rent", "limit": 0 }), &ctx())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid"));
    }
}
