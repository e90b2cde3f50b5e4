use crate::error::{EnsembleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Size of the candidate universe {1..=45}.
pub const CANDIDATE_COUNT: usize = 45;
/// Number of candidates revealed per draw.
pub const PICK_COUNT: usize = 6;
pub const MIN_CANDIDATE: u8 = 1;
pub const MAX_CANDIDATE: u8 = CANDIDATE_COUNT as u8;

/// Base weight assumed for an engine the weight table does not mention.
pub const DEFAULT_ENGINE_WEIGHT: f64 = 0.05;

pub type EngineId = String;

pub fn is_candidate(value: u8) -> bool {
    (MIN_CANDIDATE..=MAX_CANDIDATE).contains(&value)
}

/// Exactly six distinct candidates, kept in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct CandidateSubset([u8; PICK_COUNT]);

impl CandidateSubset {
    pub fn new(values: &[u8]) -> Result<Self> {
        if values.len() != PICK_COUNT {
            return Err(EnsembleError::InvalidCombination(format!(
                "expected {} candidates, got {}",
                PICK_COUNT,
                values.len()
            )));
        }
        let mut numbers = [0u8; PICK_COUNT];
        numbers.copy_from_slice(values);
        numbers.sort_unstable();

        if let Some(out_of_range) = numbers.iter().find(|n| !is_candidate(**n)) {
            return Err(EnsembleError::InvalidCombination(format!(
                "candidate {} outside {}..={}",
                out_of_range, MIN_CANDIDATE, MAX_CANDIDATE
            )));
        }
        if numbers.windows(2).any(|w| w[0] == w[1]) {
            return Err(EnsembleError::InvalidCombination(format!(
                "duplicate candidates in {:?}",
                numbers
            )));
        }
        Ok(Self(numbers))
    }

    /// Caller guarantees six distinct values in range.
    pub(crate) fn from_distinct(mut numbers: [u8; PICK_COUNT]) -> Self {
        debug_assert!(numbers.iter().all(|n| is_candidate(*n)));
        numbers.sort_unstable();
        Self(numbers)
    }

    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn contains(&self, candidate: u8) -> bool {
        self.0.binary_search(&candidate).is_ok()
    }

    /// Number of candidates shared with `other`.
    pub fn hits(&self, other: &CandidateSubset) -> usize {
        self.0.iter().filter(|n| other.contains(**n)).count()
    }

    pub fn sum(&self) -> u32 {
        self.0.iter().map(|n| *n as u32).sum()
    }
}

impl TryFrom<Vec<u8>> for CandidateSubset {
    type Error = EnsembleError;

    fn try_from(values: Vec<u8>) -> Result<Self> {
        Self::new(&values)
    }
}

impl From<CandidateSubset> for Vec<u8> {
    fn from(subset: CandidateSubset) -> Self {
        subset.0.to_vec()
    }
}

impl fmt::Display for CandidateSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|n| format!("{:2}", n)).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// One recorded round. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalDraw {
    pub round: u32,
    pub numbers: CandidateSubset,
}

impl HistoricalDraw {
    pub fn new(round: u32, numbers: &[u8]) -> Result<Self> {
        let numbers = CandidateSubset::new(numbers)
            .map_err(|e| EnsembleError::InvalidDraw(format!("round {}: {}", round, e)))?;
        Ok(Self { round, numbers })
    }
}

/// Per-candidate score, indexed by candidate value 1..=45.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ScoreVector(Vec<f64>);

impl ScoreVector {
    pub fn zeros() -> Self {
        Self(vec![0.0; CANDIDATE_COUNT])
    }

    pub fn uniform(value: f64) -> Self {
        Self(vec![value; CANDIDATE_COUNT])
    }

    pub fn from_fn<F: FnMut(u8) -> f64>(mut f: F) -> Self {
        Self((MIN_CANDIDATE..=MAX_CANDIDATE).map(|c| f(c)).collect())
    }

    pub fn get(&self, candidate: u8) -> f64 {
        self.0[(candidate - MIN_CANDIDATE) as usize]
    }

    pub fn set(&mut self, candidate: u8, value: f64) {
        self.0[(candidate - MIN_CANDIDATE) as usize] = value;
    }

    pub fn add(&mut self, candidate: u8, value: f64) {
        self.0[(candidate - MIN_CANDIDATE) as usize] += value;
    }

    /// Raw values, position 0 holds candidate 1.
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u8 + MIN_CANDIDATE, *v))
    }

    pub fn max(&self) -> f64 {
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.0.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Divide by the maximum entry; left unchanged when the maximum is not positive.
    pub fn normalized_by_max(mut self) -> Self {
        let max = self.max();
        if max > 0.0 && max.is_finite() {
            for v in self.0.iter_mut() {
                *v /= max;
            }
        }
        self
    }

    /// Candidates by descending score. Equal scores rank the lower candidate first.
    pub fn ranked(&self) -> Vec<(u8, f64)> {
        let mut ranked: Vec<(u8, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    /// Top `k` candidates, returned in ascending candidate order.
    pub fn top(&self, k: usize) -> Vec<u8> {
        let mut top: Vec<u8> = self.ranked().into_iter().take(k).map(|(c, _)| c).collect();
        top.sort_unstable();
        top
    }
}

impl TryFrom<Vec<f64>> for ScoreVector {
    type Error = EnsembleError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        if values.len() != CANDIDATE_COUNT {
            return Err(EnsembleError::InvalidDraw(format!(
                "score vector needs {} entries, got {}",
                CANDIDATE_COUNT,
                values.len()
            )));
        }
        Ok(Self(values))
    }
}

impl From<ScoreVector> for Vec<f64> {
    fn from(scores: ScoreVector) -> Self {
        scores.0
    }
}

/// Engine id to non-negative weight. A value type: clone it, never share it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(BTreeMap<EngineId, f64>);

impl WeightVector {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<EngineId>,
    {
        let mut weights = Self::new();
        for (id, weight) in pairs {
            weights.set(id, weight);
        }
        weights
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.0.get(id).copied()
    }

    pub fn weight_or_default(&self, id: &str) -> f64 {
        self.get(id).unwrap_or(DEFAULT_ENGINE_WEIGHT)
    }

    /// Negative and non-finite weights are stored as zero.
    pub fn set<K: Into<EngineId>>(&mut self, id: K, weight: f64) {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        self.0.insert(id.into(), weight);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Rescale so the weights sum to 1. An all-zero vector becomes uniform.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if self.0.is_empty() {
            return Self::new();
        }
        if total > 0.0 {
            Self(self.0.iter().map(|(k, v)| (k.clone(), v / total)).collect())
        } else {
            let uniform = 1.0 / self.0.len() as f64;
            Self(self.0.keys().map(|k| (k.clone(), uniform)).collect())
        }
    }

    /// Keep only `ids`, filling engines missing from the table with the default weight.
    pub fn restricted_to<'a, I>(&self, ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self(
            ids.into_iter()
                .map(|id| (id.to_string(), self.weight_or_default(id)))
                .collect(),
        )
    }

    pub fn as_map(&self) -> &BTreeMap<EngineId, f64> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<EngineId, f64> {
        self.0
    }
}

impl<K: Into<EngineId>> FromIterator<(K, f64)> for WeightVector {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

/// Count of rounds by number of hits (0..=6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitHistogram([usize; PICK_COUNT + 1]);

impl HitHistogram {
    pub fn record(&mut self, hits: usize) {
        self.0[hits.min(PICK_COUNT)] += 1;
    }

    pub fn count(&self, hits: usize) -> usize {
        self.0.get(hits).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[usize; PICK_COUNT + 1] {
        &self.0
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let hits: usize = self.0.iter().enumerate().map(|(h, c)| h * c).sum();
        hits as f64 / total as f64
    }
}
