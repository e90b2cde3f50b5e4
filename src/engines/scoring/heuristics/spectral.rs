use super::NEUTRAL_SCORE;
use crate::data::DrawHistory;
use crate::engines::scoring::ScoringEngine;
use crate::types::{ScoreVector, MAX_CANDIDATE, MIN_CANDIDATE};
use std::f64::consts::PI;

const MIN_SIGNAL: usize = 32;
const MAX_SIGNAL: usize = 128;
const HARMONICS: usize = 8;

/// Treats each candidate's recent presence (+1) / absence (-1) as a signal,
/// keeps its strongest harmonics, and reads the next value off the periodic
/// continuation.
pub struct SpectralEngine {
    scores: ScoreVector,
}

impl SpectralEngine {
    pub const ID: &'static str = "spectral";

    pub fn new(history: &DrawHistory) -> Self {
        if history.len() < MIN_SIGNAL {
            return Self {
                scores: ScoreVector::uniform(NEUTRAL_SCORE),
            };
        }

        let window = history.tail(MAX_SIGNAL);
        let raw: Vec<f64> = (MIN_CANDIDATE..=MAX_CANDIDATE)
            .map(|c| {
                let signal: Vec<f64> = window
                    .iter()
                    .map(|d| if d.numbers.contains(c) { 1.0 } else { -1.0 })
                    .collect();
                ((extrapolate(&signal) + 1.0) / 2.0).clamp(0.0, 1.0)
            })
            .collect();

        let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
        let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let scores = ScoreVector::from_fn(|c| {
            let value = raw[(c - 1) as usize];
            if max > min {
                (value - min) / (max - min)
            } else {
                value
            }
        });

        Self { scores }
    }
}

/// Value at index `len` of the signal rebuilt from its mean and strongest
/// `HARMONICS` frequency components.
fn extrapolate(signal: &[f64]) -> f64 {
    let n = signal.len();
    if n == 0 {
        return 0.0;
    }
    let len = n as f64;

    let mut spectrum: Vec<(usize, f64, f64)> = (1..=n / 2)
        .map(|k| {
            let (re, im) = signal.iter().enumerate().fold((0.0, 0.0), |(re, im), (t, x)| {
                let angle = -2.0 * PI * k as f64 * t as f64 / len;
                (re + x * angle.cos(), im + x * angle.sin())
            });
            (k, re, im)
        })
        .collect();
    spectrum.sort_by(|a, b| {
        (b.1.hypot(b.2))
            .total_cmp(&a.1.hypot(a.2))
            .then(a.0.cmp(&b.0))
    });

    let dc: f64 = signal.iter().sum();
    let mut value = dc;
    // At t = len every harmonic has completed whole cycles, so only the real
    // part survives. The Nyquist bin has no mirrored partner.
    for (k, re, _) in spectrum.into_iter().take(HARMONICS) {
        let mirrored = if 2 * k == n { 1.0 } else { 2.0 };
        value += mirrored * re;
    }
    value / len
}

impl ScoringEngine for SpectralEngine {
    fn id(&self) -> &str {
        Self::ID
    }

    fn scores(&self) -> anyhow::Result<ScoreVector> {
        Ok(self.scores.clone())
    }
}
