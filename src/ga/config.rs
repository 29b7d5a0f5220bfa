//! Run configuration for the GA and NSGA-II engines.
//!
//! Both configs deserialize with defaults for missing fields:
//!
//! ```
//! use ffs_schedule::ga::{GaConfig, Selection};
//!
//! let config: GaConfig = serde_json::from_str(r#"{"population_size": 40, "seed": 7}"#).unwrap();
//! assert_eq!(config.population_size, 40);
//! assert_eq!(config.max_generations, 500);
//! assert_eq!(config.selection, Selection::Tournament);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use super::adaptive::Rates;
use super::objectives::ObjectiveSet;
use super::operators::{GeneticOperators, MsMutation};
use super::selection::Selection;
use crate::error::{Result, ScheduleError};

/// Single-objective GA configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Generation limit.
    pub max_generations: usize,
    /// Base crossover probability.
    pub crossover_rate: f64,
    /// Base mutation probability.
    pub mutation_rate: f64,
    /// RNG seed; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Evaluation threads (`None` = global rayon pool).
    pub workers: Option<usize>,
    /// Stop after this many generations without improvement.
    pub stall_generations: Option<usize>,
    /// Wall-clock limit in milliseconds.
    pub time_limit_ms: Option<u64>,
    /// Parent selection.
    pub selection: Selection,
    /// Tournament size.
    pub tournament_size: usize,
    /// Best individuals copied into each generation.
    pub elite_count: usize,
    /// Crossover and mutation strategies.
    pub operators: GeneticOperators,
    /// Share of the initial population seeded from dispatching rules.
    pub heuristic_seed_ratio: f64,
    /// Share of the initial population with load-balanced MS.
    pub balanced_init_ratio: f64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            seed: None,
            workers: None,
            stall_generations: None,
            time_limit_ms: None,
            selection: Selection::Tournament,
            tournament_size: 3,
            elite_count: 2,
            operators: GeneticOperators::default(),
            heuristic_seed_ratio: 0.1,
            balanced_init_ratio: 0.2,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the generation limit.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the base crossover and mutation rates.
    pub fn with_rates(mut self, crossover: f64, mutation: f64) -> Self {
        self.crossover_rate = crossover;
        self.mutation_rate = mutation;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the evaluation thread count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Stops after `generations` without improvement.
    pub fn with_stall_generations(mut self, generations: usize) -> Self {
        self.stall_generations = Some(generations);
        self
    }

    /// Sets the wall-clock limit.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the parent selection.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size;
        self
    }

    /// Sets the elite count.
    pub fn with_elite_count(mut self, count: usize) -> Self {
        self.elite_count = count;
        self
    }

    /// Sets the genetic operators.
    pub fn with_operators(mut self, operators: GeneticOperators) -> Self {
        self.operators = operators;
        self
    }

    /// Sets the initial population shares.
    pub fn with_seeding(mut self, heuristic_ratio: f64, balanced_ratio: f64) -> Self {
        self.heuristic_seed_ratio = heuristic_ratio;
        self.balanced_init_ratio = balanced_ratio;
        self
    }

    /// Base rates as a pair.
    pub fn base_rates(&self) -> Rates {
        Rates::new(self.crossover_rate, self.mutation_rate)
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<()> {
        check_common(&CommonParams {
            population_size: self.population_size,
            crossover_rate: self.crossover_rate,
            mutation_rate: self.mutation_rate,
            workers: self.workers,
            operators: &self.operators,
            heuristic_seed_ratio: self.heuristic_seed_ratio,
            balanced_init_ratio: self.balanced_init_ratio,
        })?;
        if self.elite_count == 0 {
            return Err(invalid("elite_count must be at least 1"));
        }
        if self.elite_count >= self.population_size {
            return Err(invalid(format!(
                "elite_count ({}) must be less than population_size ({})",
                self.elite_count, self.population_size
            )));
        }
        if self.tournament_size == 0 {
            return Err(invalid("tournament_size must be at least 1"));
        }
        if self.stall_generations == Some(0) {
            return Err(invalid("stall_generations must be at least 1"));
        }
        Ok(())
    }
}

/// Multi-objective NSGA-II configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nsga2Config {
    /// Individuals per generation (μ = λ).
    pub population_size: usize,
    /// Generation limit.
    pub max_generations: usize,
    /// Crossover probability.
    pub crossover_rate: f64,
    /// Mutation probability.
    pub mutation_rate: f64,
    /// RNG seed; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Evaluation threads (`None` = global rayon pool).
    pub workers: Option<usize>,
    /// Wall-clock limit in milliseconds.
    pub time_limit_ms: Option<u64>,
    /// Minimized objectives.
    pub objectives: ObjectiveSet,
    /// Crossover and mutation strategies.
    pub operators: GeneticOperators,
    /// Share of the initial population seeded from dispatching rules.
    pub heuristic_seed_ratio: f64,
    /// Share of the initial population with load-balanced MS.
    pub balanced_init_ratio: f64,
}

impl Default for Nsga2Config {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            seed: None,
            workers: None,
            time_limit_ms: None,
            objectives: ObjectiveSet::default(),
            operators: GeneticOperators::default(),
            heuristic_seed_ratio: 0.1,
            balanced_init_ratio: 0.2,
        }
    }
}

impl Nsga2Config {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the generation limit.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the crossover and mutation rates.
    pub fn with_rates(mut self, crossover: f64, mutation: f64) -> Self {
        self.crossover_rate = crossover;
        self.mutation_rate = mutation;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the evaluation thread count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Sets the wall-clock limit.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the objective set.
    pub fn with_objectives(mut self, objectives: ObjectiveSet) -> Self {
        self.objectives = objectives;
        self
    }

    /// Sets the genetic operators.
    pub fn with_operators(mut self, operators: GeneticOperators) -> Self {
        self.operators = operators;
        self
    }

    /// Sets the initial population shares.
    pub fn with_seeding(mut self, heuristic_ratio: f64, balanced_ratio: f64) -> Self {
        self.heuristic_seed_ratio = heuristic_ratio;
        self.balanced_init_ratio = balanced_ratio;
        self
    }

    /// Rates as a pair.
    pub fn rates(&self) -> Rates {
        Rates::new(self.crossover_rate, self.mutation_rate)
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<()> {
        check_common(&CommonParams {
            population_size: self.population_size,
            crossover_rate: self.crossover_rate,
            mutation_rate: self.mutation_rate,
            workers: self.workers,
            operators: &self.operators,
            heuristic_seed_ratio: self.heuristic_seed_ratio,
            balanced_init_ratio: self.balanced_init_ratio,
        })?;
        if self.objectives.is_empty() {
            return Err(invalid("objective set must not be empty"));
        }
        if self.objectives.has_duplicates() {
            return Err(invalid("objective set contains duplicates"));
        }
        Ok(())
    }
}

struct CommonParams<'a> {
    population_size: usize,
    crossover_rate: f64,
    mutation_rate: f64,
    workers: Option<usize>,
    operators: &'a GeneticOperators,
    heuristic_seed_ratio: f64,
    balanced_init_ratio: f64,
}

fn check_common(p: &CommonParams<'_>) -> Result<()> {
    if p.population_size < 2 {
        return Err(invalid(format!(
            "population_size must be at least 2, got {}",
            p.population_size
        )));
    }
    check_probability("crossover_rate", p.crossover_rate)?;
    check_probability("mutation_rate", p.mutation_rate)?;
    check_probability("heuristic_seed_ratio", p.heuristic_seed_ratio)?;
    check_probability("balanced_init_ratio", p.balanced_init_ratio)?;
    if p.heuristic_seed_ratio + p.balanced_init_ratio > 1.0 {
        return Err(invalid(
            "heuristic_seed_ratio + balanced_init_ratio must not exceed 1",
        ));
    }
    if let MsMutation::Mixed {
        balanced_probability,
    } = p.operators.ms_mutation
    {
        check_probability("balanced_probability", balanced_probability)?;
    }
    if p.workers == Some(0) {
        return Err(invalid("workers must be at least 1"));
    }
    Ok(())
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be in [0, 1], got {value}")))
    }
}

fn invalid(message: impl Into<String>) -> ScheduleError {
    ScheduleError::InvalidConfig(message.into())
}
