// src/services/tools.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::backend::BackendClient;
use super::gemini::FunctionDeclaration;

/// Log text handed to the model is capped at this many characters.
pub const MAX_LOG_CHARS: usize = 1000;

pub const NO_LOGS: &str = "No logs found";
pub const RESTARTED: &str = "Bot restarted successfully.";

/// Fetches the list of bots owned by the user.
pub async fn get_my_bots(backend: &BackendClient, user_id: &str) -> String {
    match backend.list_bots(user_id).await {
        Ok(body) => body.to_string(),
        Err(e) => format!("Error fetching bots: {}", e),
    }
}

/// Fetches the console logs for a specific bot to diagnose errors.
pub async fn get_bot_logs(backend: &BackendClient, deployment_id: &str) -> String {
    match backend.logs(deployment_id).await {
        Ok(Value::Object(body)) => match body.get("logs").and_then(Value::as_str) {
            Some(logs) => tail_chars(logs, MAX_LOG_CHARS).to_string(),
            None => NO_LOGS.to_string(),
        },
        Ok(other) => format!("Error getting logs: unexpected response {}", other),
        Err(e) => format!("Error getting logs: {}", e),
    }
}

/// Restarts a bot container: stop, then start, whatever stop returned.
pub async fn restart_bot(backend: &BackendClient, deployment_id: &str) -> String {
    let stopped = backend.stop(deployment_id).await;
    let started = backend.start(deployment_id).await;
    match stopped.and(started) {
        Ok(()) => RESTARTED.to_string(),
        Err(e) => format!("Error restarting bot: {}", e),
    }
}

/// Last `max` characters of `s`, never splitting a code point.
pub fn tail_chars(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    match s.char_indices().nth(count - max) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// A function the agent may call on its own.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Failures come back as `Error ...` text, never as `Err`.
    async fn call(&self, args: &Value) -> String;
}

fn string_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Error: missing required string argument `{}`", key))
}

fn single_string_schema(key: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            key: { "type": "string", "description": description }
        },
        "required": [key]
    })
}

pub struct GetMyBots {
    backend: BackendClient,
}

impl GetMyBots {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetMyBots {
    fn name(&self) -> &str {
        "get_my_bots"
    }

    fn description(&self) -> &str {
        "Fetches the list of bots owned by the user."
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("user_id", "The id of the user whose bots to list.")
    }

    async fn call(&self, args: &Value) -> String {
        match string_arg(args, "user_id") {
            Ok(user_id) => get_my_bots(&self.backend, user_id).await,
            Err(e) => e,
        }
    }
}

pub struct GetBotLogs {
    backend: BackendClient,
}

impl GetBotLogs {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetBotLogs {
    fn name(&self) -> &str {
        "get_bot_logs"
    }

    fn description(&self) -> &str {
        "Fetches the console logs for a specific bot to diagnose errors."
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("deployment_id", "The deployment id of the bot.")
    }

    async fn call(&self, args: &Value) -> String {
        match string_arg(args, "deployment_id") {
            Ok(id) => get_bot_logs(&self.backend, id).await,
            Err(e) => e,
        }
    }
}

pub struct RestartBot {
    backend: BackendClient,
}

impl RestartBot {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for RestartBot {
    fn name(&self) -> &str {
        "restart_bot"
    }

    fn description(&self) -> &str {
        "Restarts a specific bot container."
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("deployment_id", "The deployment id of the bot to restart.")
    }

    async fn call(&self, args: &Value) -> String {
        match string_arg(args, "deployment_id") {
            Ok(id) => restart_bot(&self.backend, id).await,
            Err(e) => e,
        }
    }
}

/// Tools exposed to the agent, in declaration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three backend tools, bound to one backend client.
    pub fn backend_tools(backend: BackendClient) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GetMyBots::new(backend.clone())));
        registry.register(Arc::new(GetBotLogs::new(backend.clone())));
        registry.register(Arc::new(RestartBot::new(backend)));
        registry
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        debug!("Registered tool: {}", name);
        match self.by_name.get(&name) {
            Some(&idx) => self.tools[idx] = tool,
            None => {
                self.by_name.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    pub async fn execute(&self, name: &str, args: &Value) -> String {
        match self.by_name.get(name) {
            Some(&idx) => {
                info!(tool = name, "executing tool");
                self.tools[idx].call(args).await
            }
            None => format!("Error: unknown tool `{}`", name),
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
