use super::NEUTRAL_SCORE;
use crate::data::DrawHistory;
use crate::engines::scoring::ScoringEngine;
use crate::types::{ScoreVector, PICK_COUNT};

const SECTIONS: usize = 5;
const SECTION_WIDTH: u8 = 10;

fn section_of(candidate: u8) -> usize {
    ((candidate - 1) / SECTION_WIDTH) as usize
}

/// Structural profile of past draws: ending digits, section occupancy, and
/// the dominant odd/even split.
pub struct PatternEngine {
    scores: ScoreVector,
    /// Mean number of picks falling in each 10-wide section
    section_means: [f64; SECTIONS],
}

impl PatternEngine {
    pub const ID: &'static str = "pattern";

    pub fn new(history: &DrawHistory) -> Self {
        if history.is_empty() {
            return Self {
                scores: ScoreVector::uniform(NEUTRAL_SCORE),
                section_means: [PICK_COUNT as f64 / SECTIONS as f64; SECTIONS],
            };
        }

        let mut endings = [0usize; 10];
        let mut sections = [0usize; SECTIONS];
        let mut odd_splits = [0usize; PICK_COUNT + 1];
        for draw in history.iter() {
            let numbers = draw.numbers.numbers();
            for n in numbers {
                endings[(n % 10) as usize] += 1;
                sections[section_of(*n)] += 1;
            }
            odd_splits[numbers.iter().filter(|n| *n % 2 == 1).count()] += 1;
        }

        let draws = history.len() as f64;
        let picks = draws * PICK_COUNT as f64;
        let section_means = sections.map(|count| count as f64 / draws);
        // Most common odd count; ties go to the smaller count.
        let dominant_odd = (0..=PICK_COUNT)
            .max_by(|a, b| odd_splits[*a].cmp(&odd_splits[*b]).then(b.cmp(a)))
            .unwrap_or(PICK_COUNT / 2);

        let scores = ScoreVector::from_fn(|c| {
            let ending = endings[(c % 10) as usize] as f64 / picks * 0.3;
            let section = section_means[section_of(c)] / PICK_COUNT as f64 * 0.4;
            let parity = match (dominant_odd >= 3, c % 2 == 1) {
                (true, true) | (false, false) => 0.3,
                _ => 0.15,
            };
            ending + section + parity
        })
        .normalized_by_max();

        Self {
            scores,
            section_means,
        }
    }
}

impl ScoringEngine for PatternEngine {
    fn id(&self) -> &str {
        Self::ID
    }

    fn scores(&self) -> anyhow::Result<ScoreVector> {
        Ok(self.scores.clone())
    }

    /// Fill each section with its rounded historical share, then top up by score.
    fn predict(&self, k: usize) -> anyhow::Result<Vec<u8>> {
        let mut selected = Vec::with_capacity(k);
        for (section, mean) in self.section_means.iter().enumerate() {
            let quota = mean.round() as usize;
            let mut members: Vec<(u8, f64)> = self
                .scores
                .iter()
                .filter(|(c, _)| section_of(*c) == section)
                .collect();
            members.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            selected.extend(members.iter().take(quota).map(|(c, _)| *c));
        }

        if selected.len() < k {
            let extra: Vec<u8> = self
                .scores
                .ranked()
                .into_iter()
                .map(|(c, _)| c)
                .filter(|c| !selected.contains(c))
                .take(k - selected.len())
                .collect();
            selected.extend(extra);
        }
        selected.truncate(k);
        selected.sort_unstable();
        Ok(selected)
    }
}
