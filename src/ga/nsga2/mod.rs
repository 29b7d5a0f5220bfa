//! NSGA-II multi-objective optimization.
//!
//! Shares chromosomes, initialization and operators with the single-objective
//! GA. Mating uses the crowded binary tournament; survivors are picked from
//! parents plus offspring front by front, the last admitted front truncated
//! by descending crowding distance.
//!
//! # Usage
//!
//! ```
//! use ffs_schedule::ga::{Nsga2Config, Nsga2Engine};
//! use ffs_schedule::models::{Machine, Order, ProcessPlan, ProcessTime};
//! use ffs_schedule::ProblemModel;
//!
//! let orders = vec![
//!     Order::new("A", "P", 4, 0.1),
//!     Order::new("B", "P", 8, 0.2),
//!     Order::new("C", "P", 2, 0.1),
//! ];
//! let plan = ProcessPlan::new().with_entry(ProcessTime::new("COG", "BOND", 3600.0));
//! let machines = vec![Machine::new("M1", "BOND"), Machine::new("M2", "BOND")];
//! let model = ProblemModel::new(orders, plan, machines).unwrap();
//!
//! let config = Nsga2Config::default()
//!     .with_population_size(12)
//!     .with_max_generations(5)
//!     .with_seed(1);
//! let pareto = Nsga2Engine::new(&model, config).run().unwrap();
//! assert!(!pareto.solutions.is_empty());
//! assert!(pareto.representatives().is_some());
//! ```

mod sorting;

pub use sorting::{crowding_distance, dominates, fast_non_dominated_sort};

use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::chromosome::Chromosome;
use super::config::Nsga2Config;
use super::control::{CancelToken, RunControl, Termination};
use super::engine::{finalize, resolve_seed, Breeder};
use super::objectives::{Objective, ObjectiveSet};
use super::population::{initial_population, Evaluator, FitnessMode, Individual, Population};
use super::selection::crowded_tournament;
use crate::error::Result;
use crate::problem::ProblemModel;
use crate::scheduler::{LeastLoaded, MachineChooser, ScheduleResult};

/// One non-dominated schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoSolution {
    /// Genotype.
    pub chromosome: Chromosome,
    /// Minimized objective vector, in [`ParetoResult::objectives`] order.
    pub objectives: Vec<f64>,
    /// Decoded schedule with KPIs.
    pub result: ScheduleResult,
}

/// Outcome of an NSGA-II run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoResult {
    /// Rank-0 members of the final population, duplicates collapsed.
    pub solutions: Vec<ParetoSolution>,
    /// Objectives the vectors refer to.
    pub objectives: ObjectiveSet,
    /// Completed generations.
    pub generations: usize,
    /// Why the run stopped.
    pub termination: Termination,
    /// Whether the run was cut short by deadline or cancellation.
    pub partial: bool,
    /// Seed that reproduces this run.
    pub seed: u64,
}

/// Named picks from a Pareto set.
#[derive(Debug, Clone, Copy)]
pub struct Representatives<'a> {
    /// Lowest total weighted tardiness.
    pub min_tardiness: &'a ParetoSolution,
    /// Highest average utilization.
    pub max_utilization: &'a ParetoSolution,
    /// Shortest makespan.
    pub min_makespan: &'a ParetoSolution,
    /// Lowest sum of min-max normalized objectives.
    pub balanced: &'a ParetoSolution,
}

impl ParetoResult {
    /// Number of solutions.
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Picks the extreme and balanced solutions; `None` when empty.
    ///
    /// Ties go to the earliest solution.
    pub fn representatives(&self) -> Option<Representatives<'_>> {
        let kpi_pick = |key: fn(&ParetoSolution) -> f64| {
            self.solutions
                .iter()
                .reduce(|best, s| if key(s) < key(best) { s } else { best })
        };
        let min_tardiness = kpi_pick(|s| s.result.kpis.total_weighted_tardiness)?;
        let max_utilization = kpi_pick(|s| -s.result.kpis.avg_utilization)?;
        let min_makespan = kpi_pick(|s| s.result.kpis.makespan_days)?;
        let balanced = self.balanced()?;
        Some(Representatives {
            min_tardiness,
            max_utilization,
            min_makespan,
            balanced,
        })
    }

    /// Solution with the lowest sum of min-max normalized objectives.
    fn balanced(&self) -> Option<&ParetoSolution> {
        let dims = self.objectives.len();
        let mut lo = vec![f64::INFINITY; dims];
        let mut hi = vec![f64::NEG_INFINITY; dims];
        for s in &self.solutions {
            for (m, &v) in s.objectives.iter().enumerate().take(dims) {
                lo[m] = lo[m].min(v);
                hi[m] = hi[m].max(v);
            }
        }
        let score = |s: &ParetoSolution| -> f64 {
            s.objectives
                .iter()
                .enumerate()
                .take(dims)
                .map(|(m, &v)| {
                    let range = hi[m] - lo[m];
                    if range > 0.0 {
                        (v - lo[m]) / range
                    } else {
                        0.0
                    }
                })
                .sum()
        };
        self.solutions
            .iter()
            .map(|s| (s, score(s)))
            .reduce(|best, cur| if cur.1 < best.1 { cur } else { best })
            .map(|(s, _)| s)
    }

    /// Objective values of `objective` across the set, if it was optimized.
    pub fn values_of(&self, objective: Objective) -> Option<Vec<f64>> {
        let m = self.objectives.position(objective)?;
        Some(self.solutions.iter().map(|s| s.objectives[m]).collect())
    }
}

/// NSGA-II over OS/MS chromosomes.
#[derive(Debug)]
pub struct Nsga2Engine<'a> {
    model: &'a ProblemModel,
    config: Nsga2Config,
    chooser: Box<dyn MachineChooser>,
    cancel: Option<CancelToken>,
}

impl<'a> Nsga2Engine<'a> {
    /// Creates an engine with the [`LeastLoaded`] machine chooser.
    pub fn new(model: &'a ProblemModel, config: Nsga2Config) -> Self {
        Self {
            model,
            config,
            chooser: Box::new(LeastLoaded::default()),
            cancel: None,
        }
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
    pub fn config(&self) -> &Nsga2Config {
        &self.config
    }

    /// Runs the search to termination.
    pub fn run(&self) -> Result<ParetoResult> {
        let config = &self.config;
        config.validate()?;

        let seed = resolve_seed(config.seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let control = RunControl::start(config.time_limit_ms, self.cancel.clone());
        let evaluator = Evaluator::new(
            self.model,
            FitnessMode::Objectives(&config.objectives),
            config.workers,
        )?;
        let breeder = Breeder::new(self.model, &config.operators, self.chooser.as_ref());
        let rates = config.rates();

        info!(
            orders = self.model.order_count(),
            operations = self.model.operation_count(),
            population = config.population_size,
            objectives = config.objectives.len(),
            seed,
            "NSGA-II run started"
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
        survive(&mut current, config.population_size);
        let mut offspring = Population::with_capacity(config.population_size);
        let mut generation = 0;

        let termination = loop {
            if generation >= config.max_generations {
                break Termination::GenerationLimit;
            }
            if let Some(reason) = control.check() {
                break reason;
            }

            offspring.clear();
            while offspring.len() < config.population_size {
                let p1 = crowded_tournament(&current.individuals, &mut rng);
                let p2 = crowded_tournament(&current.individuals, &mut rng);
                let (c1, c2) = breeder.offspring(
                    &current.individuals[p1].chromosome,
                    &current.individuals[p2].chromosome,
                    rates,
                    &mut rng,
                );
                offspring.push(Individual::new(c1));
                if offspring.len() < config.population_size {
                    offspring.push(Individual::new(c2));
                }
            }
            evaluator.evaluate(&mut offspring);

            current.individuals.append(&mut offspring.individuals);
            survive(&mut current, config.population_size);
            generation += 1;

            debug!(
                generation,
                first_front = current.individuals.iter().filter(|i| i.rank == 0).count(),
                "generation complete"
            );
        };

        let solutions = self.pareto_front(&current, generation)?;
        info!(
            generations = generation,
            solutions = solutions.len(),
            termination = ?termination,
            elapsed_ms = control.elapsed_ms() as u64,
            "NSGA-II run finished"
        );

        Ok(ParetoResult {
            solutions,
            objectives: config.objectives.clone(),
            generations: generation,
            termination,
            partial: termination.is_partial(),
            seed,
        })
    }

    /// Rank-0 members, duplicate chromosomes collapsed, each decoded.
    fn pareto_front(&self, population: &Population, generation: usize) -> Result<Vec<ParetoSolution>> {
        let mut seen = HashSet::new();
        let mut solutions = Vec::new();
        for ind in population.individuals.iter().filter(|i| i.rank == 0) {
            if !seen.insert(&ind.chromosome) {
                continue;
            }
            solutions.push(ParetoSolution {
                chromosome: ind.chromosome.clone(),
                objectives: ind.objectives.clone(),
                result: finalize(&ind.chromosome, self.model, generation)?,
            });
        }
        Ok(solutions)
    }
}

/// Ranks the population and keeps the best `size` members.
///
/// Whole fronts are admitted while they fit; the first front that does not
/// fit is cut by descending crowding distance. Survivors keep their
/// population order.
fn survive(population: &mut Population, size: usize) {
    let objectives: Vec<Vec<f64>> = population
        .individuals
        .iter()
        .map(|i| i.objectives.clone())
        .collect();
    let fronts = fast_non_dominated_sort(&objectives);
    let mut keep = vec![false; population.len()];
    let mut admitted = 0;

    for (rank, front) in fronts.iter().enumerate() {
        if admitted >= size {
            break;
        }
        let distance = crowding_distance(&objectives, front);
        for (&i, &d) in front.iter().zip(&distance) {
            population.individuals[i].rank = rank;
            population.individuals[i].crowding_distance = d;
        }
        if admitted + front.len() <= size {
            for &i in front {
                keep[i] = true;
            }
            admitted += front.len();
        } else {
            let mut by_crowding: Vec<usize> = (0..front.len()).collect();
            by_crowding.sort_by(|&a, &b| distance[b].total_cmp(&distance[a]).then(a.cmp(&b)));
            for &k in by_crowding.iter().take(size - admitted) {
                keep[front[k]] = true;
            }
            admitted = size;
        }
    }

    let individuals = std::mem::take(&mut population.individuals);
    population.individuals = individuals
        .into_iter()
        .zip(keep)
        .filter_map(|(ind, kept)| kept.then_some(ind))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::chromosome::Chromosome;
    use crate::models::{Machine, Order, Priority, ProcessPlan, ProcessTime};

    fn model() -> ProblemModel {
        let orders = (0..6)
            .map(|i| {
                let order = Order::new(format!("O{i}"), "P", 6 + 2 * i as u32, 0.3 + 0.2 * i as f64);
                if i == 2 {
                    order.with_priority(Priority::P1)
                } else {
                    order
                }
            })
            .collect();
        let plan = ProcessPlan::new()
            .with_entry(ProcessTime::new("COG", "BOND", 3600.0))
            .with_entry(ProcessTime::new("Assembly", "BLU", 2400.0))
            .with_entry(ProcessTime::new("Assembly", "BLU2", 3000.0));
        let machines = vec![
            Machine::new("B1", "BOND"),
            Machine::new("B2", "BOND"),
            Machine::new("A1", "BLU"),
            Machine::new("A2", "BLU2").with_daily_available_minutes(1200),
        ];
        ProblemModel::new(orders, plan, machines).unwrap()
    }

    fn config() -> Nsga2Config {
        Nsga2Config::default()
            .with_population_size(16)
            .with_max_generations(15)
            .with_seed(7)
            .with_workers(1)
    }

    #[test]
    fn test_front_is_mutually_non_dominated() {
        let m = model();
        let result = Nsga2Engine::new(&m, config()).run().unwrap();
        assert!(!result.is_empty());
        assert_eq!(result.generations, 15);
        for a in &result.solutions {
            assert_eq!(a.objectives.len(), 4);
            for b in &result.solutions {
                assert!(!dominates(&a.objectives, &b.objectives));
            }
        }
    }

    #[test]
    fn test_solutions_unique_and_consistent() {
        let m = model();
        let result = Nsga2Engine::new(&m, config()).run().unwrap();
        let unique: HashSet<_> = result.solutions.iter().map(|s| &s.chromosome).collect();
        assert_eq!(unique.len(), result.len());
        for s in &result.solutions {
            assert!((s.objectives[0] - s.result.kpis.total_weighted_tardiness).abs() < 1e-12);
            assert!((s.objectives[1] - s.result.kpis.makespan_days).abs() < 1e-12);
        }
    }

    #[test]
    fn test_deterministic_across_workers() {
        let m = model();
        let a = Nsga2Engine::new(&m, config()).run().unwrap();
        let b = Nsga2Engine::new(&m, config().with_workers(4)).run().unwrap();
        let chromosomes = |r: &ParetoResult| -> Vec<Chromosome> {
            r.solutions.iter().map(|s| s.chromosome.clone()).collect()
        };
        assert_eq!(chromosomes(&a), chromosomes(&b));
    }

    #[test]
    fn test_survive_keeps_size_and_first_front() {
        let m = model();
        let mut pop = Population::default();
        let objs = [[1.0, 5.0], [2.0, 2.0], [5.0, 1.0], [3.0, 3.0], [6.0, 6.0], [4.0, 4.0]];
        for o in objs {
            let mut ind = Individual::new(Chromosome::new(
                (0..m.operation_count()).collect(),
                vec![0; m.operation_count()],
            ));
            ind.objectives = o.to_vec();
            pop.push(ind);
        }
        survive(&mut pop, 4);
        assert_eq!(pop.len(), 4);
        let kept: Vec<Vec<f64>> = pop.individuals.iter().map(|i| i.objectives.clone()).collect();
        assert_eq!(
            kept,
            vec![vec![1.0, 5.0], vec![2.0, 2.0], vec![5.0, 1.0], vec![3.0, 3.0]]
        );
        assert!(pop.individuals[..3].iter().all(|i| i.rank == 0));
        assert_eq!(pop.individuals[3].rank, 1);
    }

    #[test]
    fn test_representatives() {
        let m = model();
        let result = Nsga2Engine::new(&m, config()).run().unwrap();
        let reps = result.representatives().unwrap();
        let min_twt = result
            .solutions
            .iter()
            .map(|s| s.result.kpis.total_weighted_tardiness)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(reps.min_tardiness.result.kpis.total_weighted_tardiness, min_twt);
        let max_util = result
            .solutions
            .iter()
            .map(|s| s.result.kpis.avg_utilization)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(reps.max_utilization.result.kpis.avg_utilization, max_util);
        assert!(result.solutions.contains(reps.balanced));
        assert_eq!(result.values_of(Objective::Makespan).map(|v| v.len()), Some(result.len()));
        assert_eq!(result.values_of(Objective::LoadBalance), None);
    }

    #[test]
    fn test_empty_result_has_no_representatives() {
        let result = ParetoResult {
            solutions: vec![],
            objectives: ObjectiveSet::default(),
            generations: 0,
            termination: Termination::Cancelled,
            partial: true,
            seed: 0,
        };
        assert!(result.representatives().is_none());
    }

    #[test]
    fn test_cancelled_returns_initial_front() {
        let m = model();
        let token = CancelToken::new();
        token.cancel();
        let result = Nsga2Engine::new(&m, config())
            .with_cancel_token(token)
            .run()
            .unwrap();
        assert_eq!(result.termination, Termination::Cancelled);
        assert!(result.partial);
        assert_eq!(result.generations, 0);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_custom_objectives() {
        let m = model();
        let objectives = ObjectiveSet::new(vec![Objective::WeightedTardiness, Objective::LoadBalance]);
        let result = Nsga2Engine::new(&m, config().with_objectives(objectives))
            .run()
            .unwrap();
        assert!(result.solutions.iter().all(|s| s.objectives.len() == 2));
    }
}
