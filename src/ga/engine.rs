//! Single-objective GA minimizing total weighted tardiness.
//!
//! # Usage
//!
//! ```
//! use ffs_schedule::ga::{GaConfig, GaEngine};
//! use ffs_schedule::models::{Machine, Order, ProcessPlan, ProcessTime};
//! use ffs_schedule::ProblemModel;
//!
//! let orders = vec![
//!     Order::new("A", "P", 4, 10.0),
//!     Order::new("B", "P", 2, 10.0),
//! ];
//! let plan = ProcessPlan::new().with_entry(ProcessTime::new("COG", "BOND", 3600.0));
//! let machines = vec![Machine::new("M1", "BOND"), Machine::new("M2", "BOND")];
//! let model = ProblemModel::new(orders, plan, machines).unwrap();
//!
//! let config = GaConfig::default()
//!     .with_population_size(10)
//!     .with_max_generations(5)
//!     .with_seed(42);
//! let report = GaEngine::new(&model, config).run().unwrap();
//! assert_eq!(report.best_fitness, 0.0);
//! assert_eq!(report.result.schedule.len(), 2);
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::adaptive::{GenerationStats, RateAdaptation, Rates, SpreadAdaptive};
use super::chromosome::Chromosome;
use super::config::GaConfig;
use super::control::{CancelToken, RunControl, Termination};
use super::operators::GeneticOperators;
use super::population::{initial_population, Evaluator, FitnessMode, Individual, Population};
use super::selection::{roulette, tournament, Selection};
use crate::error::{Result, ScheduleError};
use crate::problem::ProblemModel;
use crate::scheduler::{LeastLoaded, MachineChooser, ScheduleResult};

/// Outcome of a GA run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaReport {
    /// Best schedule found, with KPIs.
    pub result: ScheduleResult,
    /// Chromosome of the best schedule.
    pub best_chromosome: Chromosome,
    /// Total weighted tardiness of the best schedule (days).
    pub best_fitness: f64,
    /// Best-so-far fitness: initial population first, then one entry per
    /// generation. Non-increasing.
    pub history: Vec<f64>,
    /// Completed generations.
    pub generations: usize,
    /// Why the run stopped.
    pub termination: Termination,
    /// Whether the run was cut short by deadline or cancellation.
    pub partial: bool,
    /// Seed that reproduces this run.
    pub seed: u64,
}

/// Genetic algorithm over OS/MS chromosomes.
#[derive(Debug)]
pub struct GaEngine<'a> {
    model: &'a ProblemModel,
    config: GaConfig,
    adaptation: Box<dyn RateAdaptation>,
    chooser: Box<dyn MachineChooser>,
    cancel: Option<CancelToken>,
}

impl<'a> GaEngine<'a> {
    /// Creates an engine with [`SpreadAdaptive`] rates and the
    /// [`LeastLoaded`] machine chooser.
    pub fn new(model: &'a ProblemModel, config: GaConfig) -> Self {
        Self {
            model,
            config,
            adaptation: Box::new(SpreadAdaptive::default()),
            chooser: Box::new(LeastLoaded::default()),
            cancel: None,
        }
    }

    /// Replaces the rate adaptation strategy.
    pub fn with_rate_adaptation(mut self, adaptation: impl RateAdaptation + 'static) -> Self {
        self.adaptation = Box::new(adaptation);
        self
    }

    /// Replaces the load-balancing machine chooser.
    pub fn with_machine_chooser(mut self, chooser: impl MachineChooser + 'static) -> Self {
        self.chooser = Box::new(chooser);
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Runs the search to termination.
    pub fn run(&self) -> Result<GaReport> {
        let config = &self.config;
        config.validate()?;

        let seed = resolve_seed(config.seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let control = RunControl::start(config.time_limit_ms, self.cancel.clone());
        let evaluator = Evaluator::new(self.model, FitnessMode::WeightedTardiness, config.workers)?;
        let breeder = Breeder::new(self.model, &config.operators, self.chooser.as_ref());

        info!(
            orders = self.model.order_count(),
            operations = self.model.operation_count(),
            population = config.population_size,
            max_generations = config.max_generations,
            seed,
            "GA run started"
        );

        let mut current = initial_population(
            self.model,
            config.population_size,
            config.heuristic_seed_ratio,
            config.balanced_init_ratio,
            self.chooser.as_ref(),
            &mut rng,
        );
        evaluator.evaluate(&mut current);
        let mut next = Population::with_capacity(config.population_size);

        let mut best = current.best().cloned().ok_or_else(|| ScheduleError::EngineFailure {
            generation: 0,
            message: "initial population is empty".into(),
        })?;
        let mut history = vec![best.fitness];
        let mut stats = GenerationStats::from_fitness(0, &current.fitness_values());
        let mut generation = 0;
        let mut stall = 0;

        let termination = loop {
            if generation >= config.max_generations {
                break Termination::GenerationLimit;
            }
            if config.stall_generations.is_some_and(|limit| stall >= limit) {
                break Termination::Stalled;
            }
            if let Some(reason) = control.check() {
                break reason;
            }

            let rates = self.adaptation.rates(config.base_rates(), &stats);
            self.breed(&current, &mut next, &breeder, rates, &mut rng);
            evaluator.evaluate(&mut next);
            std::mem::swap(&mut current, &mut next);
            generation += 1;

            stats = GenerationStats::from_fitness(generation, &current.fitness_values());
            match current.best() {
                Some(gen_best) if gen_best.fitness < best.fitness => {
                    best = gen_best.clone();
                    stall = 0;
                }
                _ => stall += 1,
            }
            history.push(best.fitness);
            debug!(
                generation,
                best = best.fitness,
                mean = stats.mean,
                std_dev = stats.std_dev,
                crossover = rates.crossover,
                mutation = rates.mutation,
                "generation complete"
            );
        };

        let result = finalize(&best.chromosome, self.model, generation)?;
        info!(
            generations = generation,
            best = best.fitness,
            termination = ?termination,
            elapsed_ms = control.elapsed_ms() as u64,
            "GA run finished"
        );

        Ok(GaReport {
            result,
            best_chromosome: best.chromosome,
            best_fitness: best.fitness,
            history,
            generations: generation,
            termination,
            partial: termination.is_partial(),
            seed,
        })
    }

    /// Fills `next` with elites of `current` followed by offspring.
    fn breed(
        &self,
        current: &Population,
        next: &mut Population,
        breeder: &Breeder<'_>,
        rates: Rates,
        rng: &mut ChaCha8Rng,
    ) {
        let size = self.config.population_size;
        next.clear();
        for i in current.elite_indices(self.config.elite_count) {
            next.push(current.individuals[i].clone());
        }
        while next.len() < size {
            let p1 = self.select(current, rng);
            let p2 = self.select(current, rng);
            let (c1, c2) = breeder.offspring(
                &current.individuals[p1].chromosome,
                &current.individuals[p2].chromosome,
                rates,
                rng,
            );
            next.push(Individual::new(c1));
            if next.len() < size {
                next.push(Individual::new(c2));
            }
        }
    }

    fn select(&self, population: &Population, rng: &mut ChaCha8Rng) -> usize {
        match self.config.selection {
            Selection::Tournament => {
                tournament(&population.individuals, self.config.tournament_size, rng)
            }
            Selection::Roulette => roulette(&population.individuals, rng),
        }
    }
}

/// Crossover plus mutation shared by both engines.
pub(crate) struct Breeder<'a> {
    model: &'a ProblemModel,
    operators: &'a GeneticOperators,
    chooser: &'a dyn MachineChooser,
}

impl<'a> Breeder<'a> {
    pub(crate) fn new(
        model: &'a ProblemModel,
        operators: &'a GeneticOperators,
        chooser: &'a dyn MachineChooser,
    ) -> Self {
        Self {
            model,
            operators,
            chooser,
        }
    }

    /// Two children of `p1` and `p2`.
    pub(crate) fn offspring<R: Rng>(
        &self,
        p1: &Chromosome,
        p2: &Chromosome,
        rates: Rates,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        let (mut c1, mut c2) = if rng.random_bool(rates.crossover) {
            self.operators.crossover(p1, p2, self.model, rng)
        } else {
            (p1.clone(), p2.clone())
        };
        self.mutate(&mut c1, rates.mutation, rng);
        self.mutate(&mut c2, rates.mutation, rng);
        (c1, c2)
    }

    fn mutate<R: Rng>(&self, chromosome: &mut Chromosome, rate: f64, rng: &mut R) {
        if rng.random_bool(rate) {
            self.operators.mutate_os(chromosome, rng);
        }
        if rng.random_bool(rate) {
            self.operators
                .mutate_ms(chromosome, self.model, self.chooser, rng);
        }
    }
}

/// The configured seed, or a fresh one drawn from the OS.
pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => {
            let seed = rand::rng().random::<u64>();
            info!(seed, "no seed configured, drew one");
            seed
        }
    }
}

/// Decodes a chromosome into a checked [`ScheduleResult`].
pub(crate) fn finalize(
    chromosome: &Chromosome,
    model: &ProblemModel,
    generation: usize,
) -> Result<ScheduleResult> {
    let schedule = chromosome.decode(model);
    let violations = schedule.violations(model);
    if let Some(first) = violations.first() {
        return Err(ScheduleError::EngineFailure {
            generation,
            message: format!(
                "decoded schedule has {} violation(s), first: {}",
                violations.len(),
                first.message
            ),
        });
    }
    Ok(ScheduleResult::build(&schedule, model))
}
