use super::{appearances, mean, NEUTRAL_SCORE};
use crate::data::DrawHistory;
use crate::engines::scoring::ScoringEngine;
use crate::types::ScoreVector;

const SHORT_WINDOW: usize = 10;
const LONG_WINDOW: usize = 30;
const TREND_RECENT: usize = 10;
const TREND_THRESHOLD: f64 = 0.02;
const DEFAULT_PERIOD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Rising,
    Stable,
    Falling,
}

impl Trend {
    fn score(self) -> f64 {
        match self {
            Trend::Rising => 1.0,
            Trend::Stable => 0.5,
            Trend::Falling => 0.2,
        }
    }
}

/// Per-candidate appearance series: moving-average trend, momentum, and how
/// far each candidate is into its usual period.
pub struct TimeSeriesEngine {
    scores: ScoreVector,
}

impl TimeSeriesEngine {
    pub const ID: &'static str = "timeseries";

    pub fn new(history: &DrawHistory) -> Self {
        let n = history.len();
        if n < LONG_WINDOW {
            return Self {
                scores: ScoreVector::uniform(NEUTRAL_SCORE),
            };
        }

        let series: Vec<Vec<f64>> = (1..=45u8)
            .map(|c| {
                history
                    .iter()
                    .map(|d| if d.numbers.contains(c) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect();

        let momentum: Vec<f64> = series.iter().map(|s| momentum(s)).collect();
        let max_momentum = momentum.iter().fold(0.0f64, |acc, m| acc.max(m.abs()));
        let max_momentum = if max_momentum > 0.0 { max_momentum } else { 1.0 };

        let scores = ScoreVector::from_fn(|c| {
            let idx = (c - 1) as usize;
            let seen = appearances(history.draws(), c);
            let (period, overdue) = if seen.len() < 3 {
                (None, n as f64)
            } else {
                let gaps: Vec<f64> = seen.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
                (mean(&gaps), (n - 1 - seen[seen.len() - 1]) as f64)
            };
            let period_score = (overdue / period.unwrap_or(DEFAULT_PERIOD)).min(2.0) / 2.0;
            let momentum_score = (momentum[idx] / max_momentum + 1.0) / 2.0;
            trend(&series[idx]).score() * 0.3 + period_score * 0.4 + momentum_score * 0.3
        });

        Self { scores }
    }
}

/// Trailing means over every full window.
fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || series.len() < window {
        return Vec::new();
    }
    series
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

fn trend(series: &[f64]) -> Trend {
    let ma = moving_average(series, LONG_WINDOW);
    if ma.len() < 2 {
        return Trend::Stable;
    }
    let split = ma.len().saturating_sub(TREND_RECENT);
    let recent = mean(&ma[split..]);
    let past = if ma.len() >= LONG_WINDOW {
        mean(&ma[ma.len() - LONG_WINDOW..split])
    } else {
        mean(&ma[..split])
    };
    match (recent, past) {
        (Some(recent), Some(past)) if recent - past > TREND_THRESHOLD => Trend::Rising,
        (Some(recent), Some(past)) if recent - past < -TREND_THRESHOLD => Trend::Falling,
        _ => Trend::Stable,
    }
}

fn momentum(series: &[f64]) -> f64 {
    match (
        moving_average(series, SHORT_WINDOW).last(),
        moving_average(series, LONG_WINDOW).last(),
    ) {
        (Some(short), Some(long)) => short - long,
        _ => 0.0,
    }
}

impl ScoringEngine for TimeSeriesEngine {
    fn id(&self) -> &str {
        Self::ID
    }

    fn scores(&self) -> anyhow::Result<ScoreVector> {
        Ok(self.scores.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::scoring::heuristics::fixtures::{assert_unit_range, random_history};

    #[test]
    fn test_moving_average() {
        let ma = moving_average(&[1.0, 0.0, 1.0, 1.0], 2);
        assert_eq!(ma, vec![0.5, 0.5, 1.0]);
        assert!(moving_average(&[1.0], 2).is_empty());
    }

    #[test]
    fn test_rising_trend() {
        let mut series = vec![0.0; 60];
        series.extend(vec![1.0; 20]);
        assert_eq!(trend(&series), Trend::Rising);
        assert_eq!(trend(&vec![1.0; 80]), Trend::Stable);
        assert!(momentum(&series) > 0.0);
    }

    #[test]
    fn test_short_history_is_neutral() {
        let history = random_history(20, 1);
        let scores = TimeSeriesEngine::new(&history).scores().unwrap();
        assert_eq!(scores, ScoreVector::uniform(NEUTRAL_SCORE));

        let history = random_history(150, 1);
        assert_unit_range(&TimeSeriesEngine::new(&history).scores().unwrap());
    }
}
