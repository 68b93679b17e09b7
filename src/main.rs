/// Main entry point for the Recovery Tracker MCP server
///
/// This file sets up logging, parses command line arguments, loads the
/// configuration and starts the MCP server. The server listens for
/// JSON-RPC requests over stdin/stdout following the MCP protocol.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use recovery_tracker_mcp::{RecoveryTrackerServer, TrackerConfig};

/// Get the default database path with robust fallback strategy
fn get_default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    // Try various locations in order of preference
    let potential_paths = [
        dirs::home_dir().map(|mut p| {
            p.push(".recovery_tracker");
            p
        }),
        dirs::data_dir().map(|mut p| {
            p.push("recovery_tracker");
            p
        }),
        dirs::config_dir().map(|mut p| {
            p.push("recovery_tracker");
            p
        }),
        std::env::current_dir().ok().map(|mut p| {
            p.push(".recovery_tracker");
            p
        }),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if let Ok(()) = std::fs::create_dir_all(potential_path) {
            // Only accept directories we can actually write to
            let test_file = potential_path.join(".test_write");
            if std::fs::write(&test_file, "test").is_ok() {
                let _ = std::fs::remove_file(&test_file);
                return Ok(potential_path.join("recovery.db"));
            }
        }
    }

    let mut temp_path = std::env::temp_dir();
    temp_path.push("recovery_tracker");
    std::fs::create_dir_all(&temp_path)?;
    temp_path.push("recovery.db");

    tracing::warn!("Using temporary directory for database: {}", temp_path.display());
    Ok(temp_path)
}

/// Command line arguments for the Recovery Tracker MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// Path to a JSON config file (rank ladders, tasks, limits, timezone)
    /// If not provided, the built-in defaults are used
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("recovery_tracker_mcp={}", log_level))
        .with_writer(std::io::stderr) // stdout carries the JSON-RPC stream
        .init();

    info!("Starting Recovery Tracker MCP server");

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            TrackerConfig::load(path)?
        }
        None => TrackerConfig::default(),
    };

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => get_default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let server = RecoveryTrackerServer::new(db_path, config).await?;
    server.run().await?;

    info!("Recovery Tracker MCP server shutdown complete");
    Ok(())
}
