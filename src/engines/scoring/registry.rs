use super::heuristics::{
    FrequencyEngine, GapEngine, GraphEngine, NumerologyEngine, PatternEngine, PoissonEngine,
    SequenceEngine, SpectralEngine, TimeSeriesEngine, TransitionEngine,
};
use super::traits::ScoringEngine;
use crate::data::DrawHistory;
use crate::types::EngineId;
use std::sync::Arc;

pub type EngineConstructor =
    Arc<dyn Fn(&DrawHistory) -> anyhow::Result<Box<dyn ScoringEngine>> + Send + Sync>;

/// Explicit, ordered list of engine constructors.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    entries: Vec<(EngineId, EngineConstructor)>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in heuristic.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(FrequencyEngine::ID, |h| Ok(Box::new(FrequencyEngine::new(h))));
        registry.register(PoissonEngine::ID, |h| Ok(Box::new(PoissonEngine::new(h))));
        registry.register(GapEngine::ID, |h| Ok(Box::new(GapEngine::new(h))));
        registry.register(GraphEngine::ID, |h| Ok(Box::new(GraphEngine::new(h))));
        registry.register(PatternEngine::ID, |h| Ok(Box::new(PatternEngine::new(h))));
        registry.register(TransitionEngine::ID, |h| Ok(Box::new(TransitionEngine::new(h))));
        registry.register(SequenceEngine::ID, |h| Ok(Box::new(SequenceEngine::new(h))));
        registry.register(TimeSeriesEngine::ID, |h| Ok(Box::new(TimeSeriesEngine::new(h))));
        registry.register(SpectralEngine::ID, |h| Ok(Box::new(SpectralEngine::new(h))));
        registry.register(NumerologyEngine::ID, |h| Ok(Box::new(NumerologyEngine::new(h))));
        registry
    }

    /// Add a constructor, replacing any existing entry with the same id.
    pub fn register<F>(&mut self, id: impl Into<EngineId>, constructor: F)
    where
        F: Fn(&DrawHistory) -> anyhow::Result<Box<dyn ScoringEngine>> + Send + Sync + 'static,
    {
        let id = id.into();
        let constructor: EngineConstructor = Arc::new(constructor);
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = constructor,
            None => self.entries.push((id, constructor)),
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the named engines, preserving registration order.
    pub fn filtered(&self, ids: &[String]) -> Self {
        for id in ids {
            if !self.contains(id) {
                log::warn!("Unknown engine '{}' ignored", id);
            }
        }
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(id, _)| ids.contains(id))
                .cloned()
                .collect(),
        }
    }

    pub fn instantiate_one(
        &self,
        id: &str,
        history: &DrawHistory,
    ) -> Option<anyhow::Result<Box<dyn ScoringEngine>>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, constructor)| constructor(history))
    }

    /// Build every engine on `history`. Failures are returned, not dropped.
    pub fn instantiate(
        &self,
        history: &DrawHistory,
    ) -> Vec<(EngineId, anyhow::Result<Box<dyn ScoringEngine>>)> {
        self.entries
            .iter()
            .map(|(id, constructor)| (id.clone(), constructor(history)))
            .collect()
    }
}
