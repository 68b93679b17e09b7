/// Tool for service statistics
///
/// This module implements the tracker_stats MCP tool.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::mcp::ServerStats;
use crate::services::TrackerError;
use crate::tools::ToolResponse;
use crate::RecoveryTrackerServer;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerStats {
    /// Users owning at least one journey
    pub users: u64,
    pub requests_handled: u64,
    pub average_response_ms: f64,
    pub started_at: DateTime<Utc>,
}

pub fn tracker_stats(
    tracker: &RecoveryTrackerServer,
    stats: &ServerStats,
) -> Result<ToolResponse<TrackerStats>, TrackerError> {
    let report = TrackerStats {
        users: tracker.journey_user_count()?,
        requests_handled: stats.requests_handled,
        average_response_ms: stats.average_response_time().as_secs_f64() * 1000.0,
        started_at: stats.started_at,
    };

    let message = format!(
        "{} users on a journey. {} requests handled, {:.2} ms average response. Up since {}.",
        report.users,
        report.requests_handled,
        report.average_response_ms,
        report.started_at.format("%d %b %y %H:%M")
    );

    Ok(ToolResponse::new(message, report))
}
