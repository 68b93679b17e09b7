/// MCP protocol implementation
///
/// This module handles the Model Context Protocol communication,
/// including JSON-RPC parsing and tool routing.

pub mod protocol;
pub mod server;
pub mod stats;

// Re-export main types
pub use server::McpServer;
pub use stats::ServerStats;
