/// Process-scoped request counters
///
/// Owned by the MCP server and handed to the tools that report on it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ServerStats {
    pub started_at: DateTime<Utc>,
    pub requests_handled: u64,
    #[serde(skip)]
    total_response_time: Duration,
}

impl ServerStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            requests_handled: 0,
            total_response_time: Duration::ZERO,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.requests_handled += 1;
        self.total_response_time += elapsed;
    }

    /// Mean handling time, zero before the first request
    pub fn average_response_time(&self) -> Duration {
        match u32::try_from(self.requests_handled) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total_response_time / count,
            Err(_) => Duration::from_secs_f64(
                self.total_response_time.as_secs_f64() / self.requests_handled as f64,
            ),
        }
    }
}
