//! Evaluator registry: an open set of evaluators keyed by id.
//!
//! The runner only ever talks to the registry, so adding an evaluator never means
//! touching the runner. Iteration order is the id order (`BTreeMap`), which keeps
//! runs deterministic.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::indicators::Indicator;

use super::factory::{create_evaluator, EvaluatorSpec, FactoryError};
use super::SignalEvaluator;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("duplicate evaluator id '{0}'")]
    DuplicateId(String),
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

#[derive(Default)]
pub struct EvaluatorRegistry {
    evaluators: BTreeMap<String, Box<dyn SignalEvaluator>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every spec and register it.
    pub fn from_specs(specs: &[EvaluatorSpec]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(create_evaluator(spec)?)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, evaluator: Box<dyn SignalEvaluator>) -> Result<(), RegistryError> {
        let id = evaluator.id().to_string();
        if self.evaluators.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        self.evaluators.insert(id, evaluator);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&dyn SignalEvaluator> {
        self.evaluators.get(id).map(|e| e.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.evaluators.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.evaluators.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SignalEvaluator> {
        self.evaluators.values().map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// Indicators needed by any registered evaluator, deduplicated by name.
    pub fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        let mut seen = HashSet::new();
        let mut indicators: Vec<Box<dyn Indicator>> = Vec::new();
        for evaluator in self.evaluators.values() {
            for indicator in evaluator.required_indicators() {
                if seen.insert(indicator.name().to_string()) {
                    indicators.push(indicator);
                }
            }
        }
        indicators
    }

    /// Longest evaluator warm-up.
    pub fn max_warmup(&self) -> usize {
        self.iter().map(|e| e.warmup_bars()).max().unwrap_or(0)
    }
}

impl std::fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.evaluators.keys()).finish()
    }
}
