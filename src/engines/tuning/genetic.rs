use super::cache::CachedEvaluation;
use super::cancel::CancellationToken;
use super::operators::{refill_population, seed_population};
use super::parallel::{FitnessPool, ScoredMember};
use super::progress::ProgressCallback;
use crate::config::OptimizerConfig;
use crate::data::{DrawHistory, TunedWeights, WeightStore};
use crate::engines::scoring::EngineRegistry;
use crate::error::{EnsembleError, Result};
use crate::types::WeightVector;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerState {
    Idle,
    CacheBuilding,
    Evaluating(usize),
    Selecting(usize),
    Mutating(usize),
    Done,
}

#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    /// Best-ever result across all completed generations
    pub best: TunedWeights,
    /// Fitness of the unmodified seed vector
    pub seed_fitness: f64,
    pub generations_completed: usize,
    /// Last evaluated generation, best first
    pub final_population: Vec<(f64, WeightVector)>,
}

/// Genetic search over engine weight vectors.
///
/// Fitness is the mean hits per round over the cached backtest window. Each
/// generation keeps the top half and refills by mutating survivors.
pub struct WeightOptimizer {
    config: OptimizerConfig,
    state: OptimizerState,
    rng: StdRng,
}

impl WeightOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            state: OptimizerState::Idle,
            rng,
        }
    }

    pub fn state(&self) -> OptimizerState {
        self.state
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Build the evaluation cache, then run the generation loop.
    ///
    /// With `prior`, its weights seed the population and their fitness,
    /// re-measured on the new cache, is the record to beat.
    #[allow(clippy::too_many_arguments)]
    pub fn optimize(
        &mut self,
        registry: &EngineRegistry,
        history: &DrawHistory,
        base: &WeightVector,
        prior: Option<&TunedWeights>,
        cancel: &CancellationToken,
        callback: &mut dyn ProgressCallback,
        store: &mut dyn WeightStore,
    ) -> Result<OptimizationOutcome> {
        self.state = OptimizerState::CacheBuilding;
        let cache = cancel
            .check()
            .and_then(|_| {
                CachedEvaluation::precompute(
                    registry,
                    history,
                    self.config.test_window,
                    self.config.min_training_rounds,
                )
            })
            .and_then(|cache| cancel.check().map(|_| Arc::new(cache)));
        let cache = match cache {
            Ok(cache) => cache,
            Err(e) => {
                self.state = OptimizerState::Done;
                return Err(e);
            }
        };

        let pool = FitnessPool::new(self.config.workers)?;
        self.run_with_cache(cache, base, prior, &pool, cancel, callback, store)
    }

    /// The generation loop over an existing cache.
    #[allow(clippy::too_many_arguments)]
    pub fn run_with_cache(
        &mut self,
        cache: Arc<CachedEvaluation>,
        base: &WeightVector,
        prior: Option<&TunedWeights>,
        pool: &FitnessPool,
        cancel: &CancellationToken,
        callback: &mut dyn ProgressCallback,
        store: &mut dyn WeightStore,
    ) -> Result<OptimizationOutcome> {
        let result = self.generation_loop(cache, base, prior, pool, cancel, callback, store);
        self.state = OptimizerState::Done;
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn generation_loop(
        &mut self,
        cache: Arc<CachedEvaluation>,
        base: &WeightVector,
        prior: Option<&TunedWeights>,
        pool: &FitnessPool,
        cancel: &CancellationToken,
        callback: &mut dyn ProgressCallback,
        store: &mut dyn WeightStore,
    ) -> Result<OptimizationOutcome> {
        let seed = prior.map(|p| &p.weights).unwrap_or(base);
        let seed = seed
            .restricted_to(cache.engine_names().iter().map(String::as_str))
            .normalized();
        let size = self.config.population_size;
        let mut population =
            seed_population(&seed, size, self.config.seed_mutation_rate, &mut self.rng);

        // A stored record only counts at the fitness it reaches on this window.
        let mut best: Option<TunedWeights> = prior.map(|p| {
            let measured = cache.evaluate(&seed);
            if measured.mean_hits != p.best_fitness {
                log::info!(
                    "Stored fitness {:.4} re-measured as {:.4} on the current window",
                    p.best_fitness,
                    measured.mean_hits
                );
            }
            TunedWeights {
                weights: seed.clone(),
                best_fitness: measured.mean_hits,
                hit_histogram: Some(measured.histogram),
                ..p.clone()
            }
        });
        let mut seed_fitness = None;
        let mut final_population = Vec::new();
        let mut generations_completed = 0;

        log::info!(
            "Optimizing {} engine weights: population {}, {} generations, {} workers",
            cache.engine_names().len(),
            size,
            self.config.generations,
            pool.workers()
        );

        for generation in 0..self.config.generations {
            self.state = OptimizerState::Evaluating(generation);
            callback.on_generation_start(generation, population.len());
            let mut scored =
                pool.evaluate_population(&cache, &population, generation, cancel, callback)?;

            self.state = OptimizerState::Selecting(generation);
            if generation == 0 {
                seed_fitness = scored.first().map(ScoredMember::fitness);
            }
            // Stable: equal fitness keeps population order.
            scored.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));

            let leader = scored.first().ok_or_else(|| {
                EnsembleError::WorkerFailure("empty generation".to_string())
            })?;
            let improved = best
                .as_ref()
                .map_or(true, |b| leader.fitness() > b.best_fitness);
            if improved {
                let tuned = TunedWeights {
                    weights: leader.weights.clone(),
                    best_fitness: leader.fitness(),
                    hit_histogram: Some(leader.evaluation.histogram),
                    generations: generation + 1,
                    trained_at: Utc::now(),
                };
                log::info!(
                    "New best fitness {:.4} in generation {}",
                    tuned.best_fitness,
                    generation + 1
                );
                if let Err(e) = store.store(&tuned) {
                    log::warn!("Failed to persist tuned weights: {}", e);
                }
                best = Some(tuned);
            }
            generations_completed = generation + 1;
            let best_ever = best.as_ref().map_or(leader.fitness(), |b| b.best_fitness);
            callback.on_generation_complete(generation, leader.fitness(), best_ever);

            final_population = scored
                .iter()
                .map(|m| (m.fitness(), m.weights.clone()))
                .collect();

            if generation + 1 == self.config.generations {
                break;
            }
            cancel.check()?;

            self.state = OptimizerState::Mutating(generation);
            let survivors: Vec<WeightVector> = scored
                .into_iter()
                .take((size / 2).max(1))
                .map(|m| m.weights)
                .collect();
            let rate = self.config.refill_mutation_rate;
            population = refill_population(&survivors, size, rate, &mut self.rng);
        }

        let best = best.ok_or_else(|| {
            EnsembleError::Configuration("optimizer ran no generations".to_string())
        })?;
        Ok(OptimizationOutcome {
            seed_fitness: seed_fitness.unwrap_or(0.0),
            best,
            generations_completed,
            final_population,
        })
    }
}
