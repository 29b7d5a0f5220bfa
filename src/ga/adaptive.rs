//! Adaptive crossover and mutation rates.
//!
//! A [`RateAdaptation`] maps the fitness statistics of the current
//! generation to the rates used to breed the next one.
//!
//! # Reference
//! Srinivas & Patnaik (1994), "Adaptive probabilities of crossover and
//! mutation in genetic algorithms"

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fitness statistics of one generation (lower fitness is better).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number (0 = initial population).
    pub generation: usize,
    /// Best fitness.
    pub best: f64,
    /// Mean fitness.
    pub mean: f64,
    /// Worst fitness.
    pub worst: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl GenerationStats {
    /// Computes statistics over a set of fitness values.
    pub fn from_fitness(generation: usize, fitness: &[f64]) -> Self {
        if fitness.is_empty() {
            return Self {
                generation,
                best: f64::INFINITY,
                mean: 0.0,
                worst: f64::INFINITY,
                std_dev: 0.0,
            };
        }
        let n = fitness.len() as f64;
        let mean = fitness.iter().sum::<f64>() / n;
        let var = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;
        Self {
            generation,
            best: fitness.iter().copied().fold(f64::INFINITY, f64::min),
            mean,
            worst: fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_dev: var.sqrt(),
        }
    }

    /// Coefficient of variation (std / |mean|).
    ///
    /// Zero when the population has no spread at all.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.std_dev <= f64::EPSILON {
            0.0
        } else if self.mean.abs() <= f64::EPSILON {
            f64::INFINITY
        } else {
            self.std_dev / self.mean.abs()
        }
    }
}

/// Crossover and mutation probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    /// Crossover probability.
    pub crossover: f64,
    /// Mutation probability.
    pub mutation: f64,
}

impl Rates {
    /// Creates a rate pair, clamped to [0, 1].
    pub fn new(crossover: f64, mutation: f64) -> Self {
        Self {
            crossover: crossover.clamp(0.0, 1.0),
            mutation: mutation.clamp(0.0, 1.0),
        }
    }
}

/// Strategy deciding the rates of the next generation.
pub trait RateAdaptation: Send + Sync + fmt::Debug {
    /// Rates to use given the base rates and the current statistics.
    fn rates(&self, base: Rates, stats: &GenerationStats) -> Rates;
}

/// Always the base rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedRates;

impl RateAdaptation for FixedRates {
    fn rates(&self, base: Rates, _stats: &GenerationStats) -> Rates {
        base
    }
}

/// Adapts rates to the fitness spread of the population.
///
/// A narrow spread (converging population) raises both rates to push
/// exploration; a wide spread lowers them to let selection exploit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadAdaptive {
    /// CV below which the population counts as converged.
    pub narrow_cv: f64,
    /// CV above which the population counts as dispersed.
    pub wide_cv: f64,
    /// Added to (narrow) or removed from (wide) the crossover rate.
    pub crossover_step: f64,
    /// Multiplies (narrow) or divides (wide) the mutation rate.
    pub mutation_factor: f64,
}

impl Default for SpreadAdaptive {
    fn default() -> Self {
        Self {
            narrow_cv: 0.05,
            wide_cv: 0.5,
            crossover_step: 0.1,
            mutation_factor: 2.0,
        }
    }
}

impl RateAdaptation for SpreadAdaptive {
    fn rates(&self, base: Rates, stats: &GenerationStats) -> Rates {
        let cv = stats.coefficient_of_variation();
        let factor = self.mutation_factor.max(1.0);
        if cv < self.narrow_cv {
            Rates::new(base.crossover + self.crossover_step, base.mutation * factor)
        } else if cv > self.wide_cv {
            Rates::new(base.crossover - self.crossover_step, base.mutation / factor)
        } else {
            base
        }
    }
}
