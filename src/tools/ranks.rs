/// Tool for listing rank ladders
///
/// This module implements the ranks_list MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{RankLevel, RankTable};
use crate::services::TrackerError;
use crate::tools::ToolResponse;

/// How many rungs the overview shows per ladder
pub const PREVIEW_LEVELS: usize = 3;

/// Parameters for listing ranks
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RanksListParams {
    /// Show this ladder in full (case-insensitive); omit for an overview
    #[serde(default)]
    pub name: Option<String>,
}

/// One ladder as listed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankListing {
    pub name: String,
    pub levels: Vec<RankLevel>,
    /// More rungs exist than are listed
    pub truncated: bool,
}

pub fn ranks_list(ranks: &RankTable, params: RanksListParams) -> Result<ToolResponse<Vec<RankListing>>, TrackerError> {
    let listings: Vec<RankListing> = match params.name.as_deref() {
        Some(name) => {
            let system = ranks
                .get(name)
                .ok_or_else(|| TrackerError::NotFound(format!("rank system '{}'", name.trim())))?;
            vec![RankListing {
                name: system.name.clone(),
                levels: system.levels.clone(),
                truncated: false,
            }]
        }
        None => ranks
            .systems()
            .iter()
            .map(|system| RankListing {
                name: system.name.clone(),
                levels: system.levels.iter().take(PREVIEW_LEVELS).cloned().collect(),
                truncated: system.levels.len() > PREVIEW_LEVELS,
            })
            .collect(),
    };

    let message = listings
        .iter()
        .map(|listing| {
            let mut block = listing.name.clone();
            for level in &listing.levels {
                block.push_str(&format!("\n{}: {}", level.days, level.label));
            }
            if listing.truncated {
                block.push_str("\n...");
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ToolResponse::new(message, listings))
}
