/// Public library interface for the Recovery Tracker MCP server
///
/// This module exports the main server implementation and public types
/// that can be used by other applications or tests.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

pub mod clock;
pub mod config;
pub mod domain;
pub mod flows;
pub mod mcp;
pub mod scoring;
pub mod services;
pub mod storage;
pub mod tools;

// Re-export public modules and types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, Limits, TrackerConfig};
pub use domain::*;
pub use flows::{ConversationManager, FlowContext, FlowEvent, FlowReply, FlowState, Prompt};
pub use scoring::{ScoreScope, ScoringEngine};
pub use services::{EntryPage, HistoryExport, ProfileSummary, TaskAssignment, TaskCompletion, TrackerError};
pub use storage::{SqliteStorage, StorageError, TrackerStorage};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The accountability engine behind the MCP server
///
/// Owns the database, the read-only configuration (rank ladders, task
/// catalog, limits), the clock and the table of pending conversations.
/// Every MCP tool ends up in one of the methods below.
pub struct RecoveryTrackerServer {
    storage: SqliteStorage,
    config: TrackerConfig,
    ranks: RankTable,
    scoring: ScoringEngine,
    conversations: ConversationManager,
    clock: Arc<dyn Clock>,
    rng: StdRng,
}

impl RecoveryTrackerServer {
    /// Create a new tracker server with the specified database path
    ///
    /// This will initialize the SQLite database with the required schema
    /// if it doesn't already exist.
    pub async fn new(db_path: PathBuf, config: TrackerConfig) -> Result<Self, ServerError> {
        tracing::info!("Initializing Recovery Tracker server with database: {:?}", db_path);

        let storage = SqliteStorage::new(db_path)?;
        let clock = config.system_clock()?;

        Self::with_clock(storage, config, clock)
    }

    /// Assemble a server from parts; tests pass a [`ManualClock`] here
    pub fn with_clock(
        storage: SqliteStorage,
        config: TrackerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServerError> {
        config.validate()?;

        let ranks = config.rank_table()?;
        let scoring = ScoringEngine::new(config.task_catalog());
        let conversations = ConversationManager::from_limits(&config.limits);

        Ok(Self {
            storage,
            config,
            ranks,
            scoring,
            conversations,
            clock,
            rng: StdRng::from_entropy(),
        })
    }

    /// Make task assignment reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method will block until the server is shut down or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting MCP server...");

        // Test database connectivity
        let users = self.storage.count_journey_users()?;
        tracing::info!("Server started successfully, {} users have journeys", users);

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn ranks(&self) -> &RankTable {
        &self.ranks
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    pub fn conversations(&self) -> &ConversationManager {
        &self.conversations
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Split borrows: read access for a flow step next to the mutable table
    fn flows(&mut self) -> (FlowContext<'_, SqliteStorage>, &mut ConversationManager) {
        let ctx = FlowContext {
            storage: &self.storage,
            ranks: &self.ranks,
            limits: &self.config.limits,
            clock: self.clock.as_ref(),
        };
        (ctx, &mut self.conversations)
    }

    pub fn register_user(&self, user_id: UserId, username: &str) -> Result<User, TrackerError> {
        services::register_user(&self.storage, user_id, username, self.now())
    }

    pub fn start_new_journey(&mut self, user_id: UserId) -> Result<FlowReply, TrackerError> {
        let (ctx, conversations) = self.flows();
        conversations.start_new_journey(&ctx, user_id)
    }

    pub fn start_check_in(&mut self, user_id: UserId) -> Result<FlowReply, TrackerError> {
        let (ctx, conversations) = self.flows();
        conversations.start_check_in(&ctx, user_id)
    }

    pub fn answer(&mut self, user_id: UserId, answer: &str, step: Option<u64>) -> Result<FlowReply, TrackerError> {
        let (ctx, conversations) = self.flows();
        conversations.answer(&ctx, user_id, answer, step)
    }

    pub fn cancel(&mut self, user_id: UserId) -> Result<FlowReply, TrackerError> {
        let now = self.now();
        self.conversations.cancel(user_id, now)
    }

    /// Drop every conversation whose answer deadline has passed
    pub fn sweep_expired(&mut self) -> Vec<UserId> {
        let now = self.now();
        self.conversations.sweep_expired(now)
    }

    pub fn request_task(&mut self, user_id: UserId, message_ref: Option<i64>) -> Result<TaskAssignment, TrackerError> {
        services::request_task(
            &self.storage,
            self.scoring.catalog(),
            self.config.limits.daily_tasks,
            self.clock.as_ref(),
            &mut self.rng,
            user_id,
            message_ref,
        )
    }

    pub fn complete_task(&self, user_id: UserId) -> Result<TaskCompletion, TrackerError> {
        services::complete_task(&self.storage, self.scoring.catalog(), self.clock.as_ref(), user_id)
    }

    pub fn score(&self, user_id: UserId, scope: ScoreScope) -> Result<i64, TrackerError> {
        Ok(self.scoring.score(&self.storage, user_id, scope, self.now())?)
    }

    pub fn profile(&self, user_id: UserId) -> Result<ProfileSummary, TrackerError> {
        services::profile_summary(&self.storage, &self.scoring, &self.ranks, user_id, self.now())
    }

    /// Profile of the most recently registered user with this name
    pub fn profile_by_username(&self, username: &str) -> Result<ProfileSummary, TrackerError> {
        let user = services::find_user_by_name(&self.storage, username)?;
        self.profile(user.id)
    }

    pub fn entries(&self, user_id: UserId, scope: EntryScope, page: usize) -> Result<EntryPage, TrackerError> {
        services::list_entries(&self.storage, user_id, scope, page, self.config.limits.page_size)
    }

    pub fn activity(&self, user_id: UserId) -> Result<Vec<Activity>, TrackerError> {
        services::build_activity_stream(&self.storage, user_id)
    }

    pub fn export_history(&self, user_id: UserId) -> Result<HistoryExport, TrackerError> {
        services::export_history(&self.storage, user_id, self.now())
    }

    /// Distinct users owning at least one journey
    pub fn journey_user_count(&self) -> Result<u64, TrackerError> {
        Ok(self.storage.count_journey_users()?)
    }
}
