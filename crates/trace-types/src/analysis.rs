use serde::{Deserialize, Serialize};

/// Narrative summary over the user's recent entries
///
/// Held only in screen-local state; re-fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub entry_count: u32,
    pub analysis_period_days: u32,
    /// Generation time exactly as the backend formatted it
    pub timestamp: String,
    pub insights: String,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0 || self.insights.trim().is_empty()
    }
}
