use super::cache::{CachedEvaluation, Evaluation};
use super::cancel::CancellationToken;
use super::progress::{ProgressCallback, ProgressTick};
use crate::error::{EnsembleError, Result};
use crate::types::WeightVector;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};

/// One evaluated population member, in population order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    pub index: usize,
    pub weights: WeightVector,
    pub evaluation: Evaluation,
}

impl ScoredMember {
    pub fn fitness(&self) -> f64 {
        self.evaluation.mean_hits
    }
}

enum WorkerReport {
    Completed { index: usize, evaluation: Evaluation },
    Skipped { index: usize },
    Failed { index: usize, reason: String },
}

/// Fixed-size worker pool evaluating population members against a shared,
/// read-only evaluation cache.
pub struct FitnessPool {
    pool: ThreadPool,
    workers: usize,
    /// Best fitness seen so far; display only
    display_best: Mutex<f64>,
}

impl FitnessPool {
    /// `workers` defaults to the available parallelism minus one, at least one.
    pub fn new(workers: Option<usize>) -> Result<Self> {
        let workers = workers.unwrap_or_else(default_workers).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("fitness-{}", i))
            .build()
            .map_err(|e| EnsembleError::WorkerFailure(format!("failed to start pool: {}", e)))?;
        log::debug!("Fitness pool started with {} workers", workers);
        Ok(Self {
            pool,
            workers,
            display_best: Mutex::new(f64::NEG_INFINITY),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn display_best(&self) -> f64 {
        *self.display_best.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate every member and wait for all of them.
    ///
    /// Reports arrive in completion order; the returned members are in
    /// population order. Each task sends exactly one report, so the gather
    /// ends only when no task is outstanding. Cancellation makes unstarted
    /// tasks skip their work and the call return `Cancelled`.
    pub fn evaluate_population(
        &self,
        cache: &Arc<CachedEvaluation>,
        population: &[WeightVector],
        generation: usize,
        cancel: &CancellationToken,
        callback: &mut dyn ProgressCallback,
    ) -> Result<Vec<ScoredMember>> {
        cancel.check()?;
        let (sender, receiver) = mpsc::channel();

        for (index, weights) in population.iter().enumerate() {
            let sender = sender.clone();
            let cache = Arc::clone(cache);
            let weights = weights.clone();
            let cancel = cancel.clone();
            self.pool.spawn(move || {
                let report = if cancel.is_cancelled() {
                    WorkerReport::Skipped { index }
                } else {
                    match catch_unwind(AssertUnwindSafe(|| cache.evaluate(&weights))) {
                        Ok(evaluation) => WorkerReport::Completed { index, evaluation },
                        Err(panic) => WorkerReport::Failed {
                            index,
                            reason: panic_message(panic.as_ref()),
                        },
                    }
                };
                let _ = sender.send(report);
            });
        }
        drop(sender);

        let mut evaluations: Vec<Option<Evaluation>> = vec![None; population.len()];
        let mut skipped = 0usize;
        let mut failures = Vec::new();
        let mut completed = 0usize;

        for report in receiver {
            match report {
                WorkerReport::Completed { index, evaluation } => {
                    completed += 1;
                    let best = {
                        let mut best =
                            self.display_best.lock().unwrap_or_else(PoisonError::into_inner);
                        if evaluation.mean_hits > *best {
                            *best = evaluation.mean_hits;
                        }
                        *best
                    };
                    evaluations[index] = Some(evaluation);
                    callback.on_member_evaluated(ProgressTick {
                        generation,
                        completed,
                        population_size: population.len(),
                        best_fitness: best,
                    });
                }
                WorkerReport::Skipped { index } => {
                    log::debug!("Member {} skipped after cancellation", index);
                    skipped += 1;
                }
                WorkerReport::Failed { index, reason } => {
                    log::warn!("Member {} failed: {}", index, reason);
                    failures.push(format!("member {}: {}", index, reason));
                }
            }
        }

        if skipped > 0 || cancel.is_cancelled() {
            return Err(EnsembleError::Cancelled);
        }
        if !failures.is_empty() {
            return Err(EnsembleError::WorkerFailure(failures.join("; ")));
        }

        population
            .iter()
            .zip(evaluations)
            .enumerate()
            .map(|(index, (weights, evaluation))| {
                evaluation
                    .map(|evaluation| ScoredMember {
                        index,
                        weights: weights.clone(),
                        evaluation,
                    })
                    .ok_or_else(|| {
                        EnsembleError::WorkerFailure(format!("member {} never reported", index))
                    })
            })
            .collect()
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::tuning::progress::NoopProgress;
    use crate::types::CANDIDATE_COUNT;
    use ndarray::{Array2, Array3};

    fn cache() -> Arc<CachedEvaluation> {
        let mut scores = Array3::<f64>::zeros((1, 2, CANDIDATE_COUNT));
        let mut actual = Array2::<u8>::zeros((1, CANDIDATE_COUNT));
        for c in 0..6 {
            scores[[0, 0, c]] = 1.0;
            actual[[0, c]] = 1;
            scores[[0, 1, 44 - c]] = 1.0;
        }
        Arc::new(
            CachedEvaluation::from_parts(
                vec!["a".to_string(), "b".to_string()],
                vec![1],
                scores,
                actual,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_results_in_population_order() {
        let pool = FitnessPool::new(Some(2)).unwrap();
        let population = vec![
            WeightVector::from_pairs([("a", 0.0), ("b", 1.0)]),
            WeightVector::from_pairs([("a", 1.0), ("b", 0.0)]),
            WeightVector::from_pairs([("a", 0.7), ("b", 0.3)]),
        ];
        let scored = pool
            .evaluate_population(
                &cache(),
                &population,
                0,
                &CancellationToken::new(),
                &mut NoopProgress,
            )
            .unwrap();
        let fitness: Vec<f64> = scored.iter().map(|m| m.fitness()).collect();
        assert_eq!(fitness, vec![0.0, 6.0, 6.0]);
        assert_eq!(scored[2].weights, population[2]);
        assert_eq!(pool.display_best(), 6.0);
    }

    #[test]
    fn test_cancelled_generation_is_rejected() {
        let pool = FitnessPool::new(Some(1)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let population = vec![WeightVector::from_pairs([("a", 1.0)])];
        let result = pool.evaluate_population(&cache(), &population, 0, &cancel, &mut NoopProgress);
        assert!(matches!(result, Err(EnsembleError::Cancelled)));
    }
}
