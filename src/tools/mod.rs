/// MCP tools for the recovery tracker
///
/// This module contains all the MCP tools that external clients can call.
/// Each tool has a parameter struct (deserialized from the call arguments,
/// with a JSON schema for `tools/list`) and a function that runs it
/// against the tracker and shapes the response.

pub mod conversation;
pub mod history;
pub mod profile;
pub mod ranks;
pub mod stats;
pub mod task;
pub mod user;

// Re-export tool functions for easy access
pub use conversation::*;
pub use history::*;
pub use profile::*;
pub use ranks::*;
pub use stats::*;
pub use task::*;
pub use user::*;

use serde::Serialize;

/// What every tool hands back: a line for the user plus the structured data
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse<T: Serialize> {
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ToolResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self { message: message.into(), data }
    }
}
