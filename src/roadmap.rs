//! Plain-text roadmap export.

#[cfg(test)]
#[path = "roadmap_test.rs"]
mod roadmap_test;

use serde::Deserialize;

/// One roadmap step as read from a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoadmapEntry {
    pub title: String,
    pub timeframe: String,
    #[serde(default)]
    pub description: String,
}

/// Parse a JSON array of `{title, timeframe, description}` records.
///
/// # Errors
///
/// Returns the `serde_json` error for malformed input.
pub fn parse_entries(input: &str) -> Result<Vec<RoadmapEntry>, serde_json::Error> {
    serde_json::from_str(input)
}

/// Render `Step <n>: <title> (<timeframe>)` followed by the description line,
/// numbering from 1.
#[must_use]
pub fn format_roadmap(entries: &[RoadmapEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("Step {}: {} ({})\n{}\n", i + 1, entry.title, entry.timeframe, entry.description))
        .collect()
}
