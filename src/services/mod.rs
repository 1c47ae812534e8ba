pub mod agent;
pub mod backend;
pub mod gemini;
pub mod session_manager;
pub mod tools;
