/// Tool for registering users
///
/// This module implements the user_register MCP tool.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domain::{User, UserId};
use crate::services::TrackerError;
use crate::tools::ToolResponse;
use crate::RecoveryTrackerServer;

/// Parameters for registering (or renaming) a user
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UserRegisterParams {
    /// Numeric id of the chat user
    pub user_id: i64,
    /// Display name, with or without a leading @
    pub username: String,
}

pub fn user_register(
    tracker: &RecoveryTrackerServer,
    params: UserRegisterParams,
) -> Result<ToolResponse<User>, TrackerError> {
    let user = tracker.register_user(UserId(params.user_id), &params.username)?;
    Ok(ToolResponse::new(
        format!("Welcome, {}! Use journey_new to start counting your streak.", user.username),
        user,
    ))
}
