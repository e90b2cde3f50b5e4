use crate::types::ScoreVector;
use anyhow::Result;

/// A pluggable per-candidate heuristic built over one history snapshot.
pub trait ScoringEngine: Send + Sync {
    /// Stable identifier used as the weight-table key
    fn id(&self) -> &str;

    /// Score for every candidate, conventionally with a maximum of 1.0
    fn scores(&self) -> Result<ScoreVector>;

    /// The engine's own best `k` candidates, ascending
    fn predict(&self, k: usize) -> Result<Vec<u8>> {
        Ok(self.scores()?.top(k))
    }
}
