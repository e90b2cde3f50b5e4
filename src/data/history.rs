use crate::error::{EnsembleError, Result};
use crate::types::HistoricalDraw;
use std::sync::Arc;

/// Chronologically ordered, append-only draw record.
///
/// Clones and prefixes share the same storage, so truncating the history for a
/// backtest round is O(1).
#[derive(Debug, Clone)]
pub struct DrawHistory {
    draws: Arc<Vec<HistoricalDraw>>,
    len: usize,
}

impl DrawHistory {
    pub fn new(draws: Vec<HistoricalDraw>) -> Result<Self> {
        Self::check_order(&draws)?;
        let len = draws.len();
        Ok(Self {
            draws: Arc::new(draws),
            len,
        })
    }

    /// Build from raw `(round, numbers)` rows.
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, [u8; 6])>,
    {
        let draws = rows
            .into_iter()
            .map(|(round, numbers)| HistoricalDraw::new(round, &numbers))
            .collect::<Result<Vec<_>>>()?;
        Self::new(draws)
    }

    fn check_order(draws: &[HistoricalDraw]) -> Result<()> {
        for pair in draws.windows(2) {
            if pair[1].round <= pair[0].round {
                return Err(EnsembleError::InvalidDraw(format!(
                    "round {} follows round {}; rounds must strictly increase",
                    pair[1].round, pair[0].round
                )));
            }
        }
        Ok(())
    }

    /// A new history with `later` appended. Existing views are unaffected.
    pub fn extended(&self, later: &[HistoricalDraw]) -> Result<Self> {
        let mut draws = Vec::with_capacity(self.len + later.len());
        draws.extend_from_slice(self.draws());
        draws.extend_from_slice(later);
        Self::new(draws)
    }

    /// The first `len` draws (everything strictly before index `len`).
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            draws: Arc::clone(&self.draws),
            len: len.min(self.len),
        }
    }

    pub fn draws(&self) -> &[HistoricalDraw] {
        &self.draws[..self.len]
    }

    pub fn get(&self, index: usize) -> Option<&HistoricalDraw> {
        self.draws().get(index)
    }

    pub fn last(&self) -> Option<&HistoricalDraw> {
        self.draws().last()
    }

    /// The most recent `n` draws, oldest first.
    pub fn tail(&self, n: usize) -> &[HistoricalDraw] {
        let draws = self.draws();
        &draws[draws.len().saturating_sub(n)..]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoricalDraw> {
        self.draws().iter()
    }

    pub fn require(&self, required: usize) -> Result<()> {
        if self.len < required {
            return Err(EnsembleError::InsufficientHistory {
                required,
                available: self.len,
            });
        }
        Ok(())
    }

    /// Mean and population standard deviation of draw sums.
    pub fn sum_statistics(&self) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let sums: Vec<f64> = self.iter().map(|d| d.numbers.sum() as f64).collect();
        let n = sums.len() as f64;
        let mean = sums.iter().sum::<f64>() / n;
        let variance = sums.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Some((mean, variance.sqrt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DrawHistory {
        DrawHistory::from_rows(vec![
            (1, [1, 2, 3, 4, 5, 6]),
            (2, [7, 8, 9, 10, 11, 12]),
            (3, [13, 14, 15, 16, 17, 18]),
        ])
        .unwrap()
    }

    #[test]
    fn test_prefix_shares_storage() {
        let history = sample();
        let prefix = history.prefix(2);
        assert_eq!(prefix.len(), 2);
        assert_eq!(prefix.last().unwrap().round, 2);
        assert!(Arc::ptr_eq(&history.draws, &prefix.draws));
        assert_eq!(history.prefix(10).len(), 3);
    }

    #[test]
    fn test_rounds_must_increase() {
        let result =
            DrawHistory::from_rows(vec![(2, [1, 2, 3, 4, 5, 6]), (2, [7, 8, 9, 10, 11, 12])]);
        assert!(result.is_err());

        let history = sample();
        let stale = HistoricalDraw::new(3, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert!(history.extended(&[stale]).is_err());
        let next = HistoricalDraw::new(4, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(history.extended(&[next]).unwrap().len(), 4);
    }

    #[test]
    fn test_require_reports_shortfall() {
        match sample().require(5) {
            Err(EnsembleError::InsufficientHistory { required, available }) => {
                assert_eq!(required, 5);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
