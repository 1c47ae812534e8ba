// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::agent::{AgentDefinition, Runner};
use crate::services::backend::BackendClient;
use crate::services::gemini::{GeminiClient, Model};
use crate::services::session_manager::SessionManager;
use crate::services::tools::ToolRegistry;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub sessions: SessionManager,
    pub runner: Runner,
}

impl AppState {
    /// State wired to the real Gemini API.
    pub fn new(config: &Config) -> Self {
        let model = Arc::new(GeminiClient::new(&config.model));
        Self::with_model(config, model)
    }

    /// State with any model implementation behind the runner.
    pub fn with_model(config: &Config, model: Arc<dyn Model>) -> Self {
        let sessions = SessionManager::new();
        let tools = ToolRegistry::backend_tools(BackendClient::new(config.backend_url.clone()));
        let runner = Runner::new(
            AgentDefinition::devops(config.model.name.clone()),
            model,
            Arc::new(tools),
            sessions.clone(),
            config.max_tool_iterations,
        );
        Self { sessions, runner }
    }
}
