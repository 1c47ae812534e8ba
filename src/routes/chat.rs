use axum::{Json, extract::State};
use tracing::{debug, error};

use crate::{
    message::{ChatRequest, ChatResponse},
    services::{
        agent::{APP_NAME, context_prompt, final_reply},
        gemini::Content,
        session_manager::session_key,
    },
    state::SharedState,
};

pub const PENDING_REPLY: &str = "I'm thinking...";
pub const FALLBACK_REPLY: &str = "I encountered an error processing your request.";

pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let session_id = session_key(&payload.user_id);

    if let Err(e) = state
        .sessions
        .create_session(APP_NAME, &payload.user_id, &session_id)
        .await
    {
        debug!("reusing session: {}", e);
    }

    let prompt = context_prompt(&payload.user_id, &payload.message);

    let reply = match state
        .runner
        .run(&payload.user_id, &session_id, Content::user_text(prompt))
        .await
    {
        Ok(events) => final_reply(&events).unwrap_or(PENDING_REPLY).to_string(),
        Err(e) => {
            error!(user_id = %payload.user_id, "Error running agent: {}", e);
            FALLBACK_REPLY.to_string()
        }
    };

    Json(ChatResponse { reply })
}
