//! Individuals, populations, initialization and parallel evaluation.

use rand::Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::chromosome::{swap_mutation, Chromosome};
use super::objectives::ObjectiveSet;
use crate::dispatching::{rule_sequence, seed_engines};
use crate::error::{Result, ScheduleError};
use crate::problem::ProblemModel;
use crate::scheduler::{total_weighted_tardiness, MachineChooser, ScheduleKpi};

/// A chromosome with its cached evaluation.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Genotype.
    pub chromosome: Chromosome,
    /// Scalar fitness (lower is better).
    pub fitness: f64,
    /// Objective vector (multi-objective runs only).
    pub objectives: Vec<f64>,
    /// Non-domination rank (0 = first front).
    pub rank: usize,
    /// Crowding distance within its front.
    pub crowding_distance: f64,
    evaluated: bool,
}

impl Individual {
    /// Wraps an unevaluated chromosome.
    pub fn new(chromosome: Chromosome) -> Self {
        Self {
            chromosome,
            fitness: f64::INFINITY,
            objectives: Vec::new(),
            rank: usize::MAX,
            crowding_distance: 0.0,
            evaluated: false,
        }
    }

    /// Whether fitness has been computed.
    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }
}

/// A generation of individuals.
#[derive(Debug, Clone, Default)]
pub struct Population {
    /// Members in insertion order.
    pub individuals: Vec<Individual>,
}

impl Population {
    /// Empty population with reserved space.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            individuals: Vec::with_capacity(capacity),
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Whether there are no members.
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Adds a member.
    pub fn push(&mut self, individual: Individual) {
        self.individuals.push(individual);
    }

    /// Removes all members, keeping the allocation.
    pub fn clear(&mut self) {
        self.individuals.clear();
    }

    /// Member with the lowest fitness; the earliest one on ties.
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .reduce(|best, ind| if ind.fitness < best.fitness { ind } else { best })
    }

    /// Fitness values in member order.
    pub fn fitness_values(&self) -> Vec<f64> {
        self.individuals.iter().map(|i| i.fitness).collect()
    }

    /// Indices of the `count` fittest members, ties by position.
    pub fn elite_indices(&self, count: usize) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.len()).collect();
        idx.sort_by(|&a, &b| {
            self.individuals[a]
                .fitness
                .total_cmp(&self.individuals[b].fitness)
                .then(a.cmp(&b))
        });
        idx.truncate(count);
        idx
    }
}

/// Builds the initial population.
///
/// A `heuristic_ratio` share comes from dispatching rule sequences (repeats
/// beyond the available rules get a swap perturbation), a `balanced_ratio`
/// share gets random OS with load-balanced MS, and the rest is random.
pub(crate) fn initial_population<R: Rng>(
    model: &ProblemModel,
    size: usize,
    heuristic_ratio: f64,
    balanced_ratio: f64,
    chooser: &dyn MachineChooser,
    rng: &mut R,
) -> Population {
    let heuristic = ((size as f64 * heuristic_ratio).round() as usize).min(size);
    let balanced = ((size as f64 * balanced_ratio).round() as usize).min(size - heuristic);
    let mut population = Population::with_capacity(size);

    let sequences: Vec<Vec<usize>> = seed_engines()
        .iter()
        .map(|engine| rule_sequence(engine, model))
        .collect();
    for i in 0..heuristic {
        let mut os = sequences[i % sequences.len()].clone();
        if i >= sequences.len() {
            swap_mutation(&mut os, rng);
        }
        population.push(Individual::new(Chromosome::from_sequence(os, model, chooser)));
    }
    for _ in 0..balanced {
        population.push(Individual::new(Chromosome::with_load_balancing(
            model, chooser, rng,
        )));
    }
    while population.len() < size {
        population.push(Individual::new(Chromosome::random(model, rng)));
    }
    population
}

/// What an evaluation computes.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FitnessMode<'a> {
    /// Total weighted tardiness only.
    WeightedTardiness,
    /// Full objective vector; fitness is its first component.
    Objectives(&'a ObjectiveSet),
}

/// Evaluates populations, in parallel when configured.
///
/// Evaluation reads only the shared model and writes only into each
/// individual, so results do not depend on the worker count.
pub(crate) struct Evaluator<'a> {
    model: &'a ProblemModel,
    mode: FitnessMode<'a>,
    pool: Option<ThreadPool>,
    sequential: bool,
}

impl<'a> Evaluator<'a> {
    /// `workers`: `None` uses the global rayon pool, `Some(1)` runs on the
    /// calling thread, `Some(n)` builds a dedicated pool.
    pub(crate) fn new(
        model: &'a ProblemModel,
        mode: FitnessMode<'a>,
        workers: Option<usize>,
    ) -> Result<Self> {
        let (pool, sequential) = match workers {
            Some(1) => (None, true),
            Some(n) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ScheduleError::EngineFailure {
                        generation: 0,
                        message: format!("failed to build worker pool: {e}"),
                    })?;
                (Some(pool), false)
            }
            None => (None, false),
        };
        Ok(Self {
            model,
            mode,
            pool,
            sequential,
        })
    }

    /// Evaluates every member not yet evaluated. Returns how many were.
    pub(crate) fn evaluate(&self, population: &mut Population) -> usize {
        let pending = population
            .individuals
            .iter()
            .filter(|i| !i.evaluated)
            .count();
        if pending == 0 {
            return 0;
        }
        if self.sequential {
            population.individuals.iter_mut().for_each(|ind| self.evaluate_one(ind));
        } else if let Some(pool) = &self.pool {
            pool.install(|| {
                population
                    .individuals
                    .par_iter_mut()
                    .for_each(|ind| self.evaluate_one(ind));
            });
        } else {
            population
                .individuals
                .par_iter_mut()
                .for_each(|ind| self.evaluate_one(ind));
        }
        pending
    }

    fn evaluate_one(&self, ind: &mut Individual) {
        if ind.evaluated {
            return;
        }
        let schedule = ind.chromosome.decode(self.model);
        match self.mode {
            FitnessMode::WeightedTardiness => {
                ind.fitness = total_weighted_tardiness(&schedule, self.model);
            }
            FitnessMode::Objectives(set) => {
                let kpi = ScheduleKpi::calculate(&schedule, self.model);
                ind.objectives = set.evaluate(&kpi);
                ind.fitness = ind.objectives.first().copied().unwrap_or(f64::INFINITY);
            }
        }
        ind.evaluated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Machine, Order, ProcessPlan, ProcessTime};
    use crate::scheduler::LeastLoaded;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn model() -> ProblemModel {
        let orders = (0..6)
            .map(|i| Order::new(format!("O{i}"), "P", 10 + i as u32, 1.0 + i as f64 * 0.5))
            .collect();
        let plan = ProcessPlan::new()
            .with_entry(ProcessTime::new("COG", "BOND", 600.0))
            .with_entry(ProcessTime::new("Assembly", "BLU", 900.0));
        let machines = vec![
            Machine::new("B1", "BOND"),
            Machine::new("B2", "BOND"),
            Machine::new("A1", "BLU"),
        ];
        ProblemModel::new(orders, plan, machines).unwrap()
    }

    #[test]
    fn test_initial_population_shares() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(7);
        let pop = initial_population(&m, 20, 0.1, 0.2, &LeastLoaded::default(), &mut rng);
        assert_eq!(pop.len(), 20);
        assert!(pop.individuals.iter().all(|i| i.chromosome.is_valid(&m)));
        assert!(pop.individuals.iter().all(|i| !i.is_evaluated()));

        // First heuristic seed is the EDD+WSPT rule sequence.
        let first = &pop.individuals[0].chromosome.os;
        let edd = rule_sequence(&seed_engines()[0], &m);
        assert_eq!(first, &edd);
    }

    #[test]
    fn test_initial_population_ratios_capped() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(1);
        let pop = initial_population(&m, 4, 1.0, 1.0, &LeastLoaded::default(), &mut rng);
        assert_eq!(pop.len(), 4);
    }

    #[test]
    fn test_evaluation_independent_of_workers() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(11);
        let base = initial_population(&m, 16, 0.1, 0.2, &LeastLoaded::default(), &mut rng);

        let mut seq = base.clone();
        let mut par = base.clone();
        let mut global = base;
        Evaluator::new(&m, FitnessMode::WeightedTardiness, Some(1))
            .unwrap()
            .evaluate(&mut seq);
        Evaluator::new(&m, FitnessMode::WeightedTardiness, Some(3))
            .unwrap()
            .evaluate(&mut par);
        Evaluator::new(&m, FitnessMode::WeightedTardiness, None)
            .unwrap()
            .evaluate(&mut global);

        assert_eq!(seq.fitness_values(), par.fitness_values());
        assert_eq!(seq.fitness_values(), global.fitness_values());
    }

    #[test]
    fn test_evaluate_skips_evaluated() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut pop = initial_population(&m, 5, 0.0, 0.0, &LeastLoaded::default(), &mut rng);
        let eval = Evaluator::new(&m, FitnessMode::WeightedTardiness, Some(1)).unwrap();
        assert_eq!(eval.evaluate(&mut pop), 5);
        assert_eq!(eval.evaluate(&mut pop), 0);
        pop.push(Individual::new(Chromosome::random(&m, &mut rng)));
        assert_eq!(eval.evaluate(&mut pop), 1);
    }

    #[test]
    fn test_objective_mode_sets_vector() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut pop = initial_population(&m, 3, 0.0, 0.0, &LeastLoaded::default(), &mut rng);
        let set = ObjectiveSet::default();
        Evaluator::new(&m, FitnessMode::Objectives(&set), Some(1))
            .unwrap()
            .evaluate(&mut pop);
        for ind in &pop.individuals {
            assert_eq!(ind.objectives.len(), 4);
            assert_eq!(ind.fitness, ind.objectives[0]);
        }
    }

    #[test]
    fn test_elites_and_best() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut pop = initial_population(&m, 4, 0.0, 0.0, &LeastLoaded::default(), &mut rng);
        for (ind, f) in pop.individuals.iter_mut().zip([3.0, 1.0, 1.0, 0.5]) {
            ind.fitness = f;
        }
        assert_eq!(pop.elite_indices(3), vec![3, 1, 2]);
        assert_eq!(pop.best().map(|b| b.fitness), Some(0.5));
    }
}
