// src/services/agent.rs
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::gemini::{Content, GenerateContentRequest, Model, Part, ToolDeclarations};
use super::session_manager::SessionManager;
use super::tools::ToolRegistry;
use crate::error::AgentError;

pub const APP_NAME: &str = "bothost";
pub const AGENT_NAME: &str = "BotHost_SRE";
pub const AGENT_DESCRIPTION: &str = "An autonomous DevOps engineer that manages user deployments.";

pub const SRE_INSTRUCTION: &str = "\
You are the AI Site Reliability Engineer (SRE) for BotHost.
Your goal is to help users manage their deployed applications.

YOUR WORKFLOW:
1. If a user says \"my bot is broken\", ALWAYS list their bots first to identify the ID.
2. Once you have the ID, use `get_bot_logs` to analyze the error.
3. Explain the error in simple terms to the user.
4. If the error looks transient (like a timeout), offer to `restart_bot`.

Do not hallucinate. Only use the tools provided.
";

/// Static description of an LLM agent: who it is, which model it runs on,
/// and the instruction it is given.
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    pub name: String,
    pub description: String,
    pub model: String,
    pub instruction: String,
}

impl AgentDefinition {
    pub fn devops(model: impl Into<String>) -> Self {
        Self {
            name: AGENT_NAME.to_string(),
            description: AGENT_DESCRIPTION.to_string(),
            model: model.into(),
            instruction: SRE_INSTRUCTION.to_string(),
        }
    }
}

/// One recorded step of a run.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub invocation_id: String,
    pub author: String,
    pub content: Option<Content>,
    pub is_final: bool,
}

impl Event {
    fn new(invocation_id: &str, author: &str, content: Content, is_final: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            invocation_id: invocation_id.to_string(),
            author: author.to_string(),
            content: Some(content),
            is_final,
        }
    }

    pub fn is_final_response(&self) -> bool {
        self.is_final
    }
}

/// First text of the first final event that carries content.
pub fn final_reply(events: &[Event]) -> Option<&str> {
    events
        .iter()
        .filter(|e| e.is_final_response())
        .filter_map(|e| e.content.as_ref())
        .find(|c| !c.parts.is_empty())
        .and_then(|c| c.first_text())
}

/// Wrap a user message with the id the tools should be called with.
pub fn context_prompt(user_id: &str, message: &str) -> String {
    format!(
        "SYSTEM CONTEXT: The current user's ID is '{id}'. \
         If you need to call tools like `get_my_bots`, use this ID: '{id}'. \
         Do NOT ask the user for their ID.\n\n\
         USER MESSAGE: {message}",
        id = user_id,
        message = message,
    )
}

/// Drives the model/tool loop for one agent over a session store.
pub struct Runner {
    agent: AgentDefinition,
    model: Arc<dyn Model>,
    tools: Arc<ToolRegistry>,
    sessions: SessionManager,
    max_iterations: usize,
}

impl Runner {
    pub fn new(
        agent: AgentDefinition,
        model: Arc<dyn Model>,
        tools: Arc<ToolRegistry>,
        sessions: SessionManager,
        max_iterations: usize,
    ) -> Self {
        Self {
            agent,
            model,
            tools,
            sessions,
            max_iterations,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Run one user turn. Every content produced is appended to the session,
    /// even when the run fails part way.
    pub async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        new_message: Content,
    ) -> Result<Vec<Event>, AgentError> {
        let mut history = self
            .sessions
            .get_history(session_id)
            .await
            .ok_or_else(|| AgentError::SessionNotFound(session_id.to_string()))?;
        let start = history.len();

        let invocation_id = Uuid::new_v4().to_string();
        info!(user_id, session_id, %invocation_id, agent = %self.agent.name, "agent run started");

        history.push(new_message.clone());
        let mut events = vec![Event::new(&invocation_id, "user", new_message, false)];

        let outcome = self.drive(&invocation_id, &mut history, &mut events).await;

        self.sessions
            .append_history(session_id, history.drain(start..))
            .await;

        outcome.map(|()| events)
    }

    async fn drive(
        &self,
        invocation_id: &str,
        history: &mut Vec<Content>,
        events: &mut Vec<Event>,
    ) -> Result<(), AgentError> {
        let system_instruction = Content {
            role: None,
            parts: vec![Part::text(self.agent.instruction.clone())],
        };
        let declarations = self.tools.declarations();
        let tools = if declarations.is_empty() {
            Vec::new()
        } else {
            vec![ToolDeclarations {
                function_declarations: declarations,
            }]
        };

        for iteration in 1..=self.max_iterations {
            debug!(iteration, "agent loop iteration");

            let request = GenerateContentRequest {
                contents: history.clone(),
                system_instruction: Some(system_instruction.clone()),
                tools: tools.clone(),
            };
            let content = self
                .model
                .generate(&self.agent.model, &request)
                .await?
                .first_content()
                .ok_or(AgentError::EmptyResponse)?;
            // Gemini rejects contents without parts, so they never enter history.
            if content.parts.is_empty() {
                warn!(iteration, "model returned a turn with no parts");
            } else {
                history.push(content.clone());
            }

            let calls: Vec<_> = content.function_calls().into_iter().cloned().collect();
            if calls.is_empty() {
                events.push(Event::new(invocation_id, &self.agent.name, content, true));
                return Ok(());
            }
            events.push(Event::new(invocation_id, &self.agent.name, content, false));

            let mut responses = Vec::with_capacity(calls.len());
            for call in &calls {
                let result = self.tools.execute(&call.name, &call.args).await;
                responses.push(Part::function_response(&call.name, result));
            }
            let tool_content = Content::function_responses(responses);
            history.push(tool_content.clone());
            events.push(Event::new(invocation_id, &self.agent.name, tool_content, false));
        }

        warn!(max = self.max_iterations, "agent hit max tool iterations");
        Err(AgentError::TooManyIterations(self.max_iterations))
    }
}
