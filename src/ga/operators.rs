//! Configurable genetic operators for flow shop chromosomes.
//!
//! Provides runtime-selectable crossover and mutation strategies
//! via [`GeneticOperators`].
//!
//! # Usage
//!
//! ```
//! use ffs_schedule::ga::operators::{GeneticOperators, MsMutation, OsCrossover, OsMutation};
//!
//! let ops = GeneticOperators::default();
//! assert_eq!(ops.os_crossover, OsCrossover::Pox);
//! assert_eq!(ops.os_mutation, OsMutation::Swap);
//! assert_eq!(ops.ms_mutation, MsMutation::Mixed { balanced_probability: 0.25 });
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::chromosome::{
    insert_mutation, invert_mutation, ms_balanced_mutation, ms_redraw_mutation,
    one_point_ms_crossover, ox_crossover, pox_crossover, swap_mutation, uniform_ms_crossover,
    Chromosome,
};
use crate::problem::ProblemModel;
use crate::scheduler::MachineChooser;

/// Crossover strategy for the operation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsCrossover {
    /// Precedence Operation Crossover (Bierwirth et al., 1996).
    Pox,
    /// Order Crossover (Davis, 1985).
    Ox,
}

/// Crossover strategy for the machine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsCrossover {
    /// Each gene from either parent.
    Uniform,
    /// Prefix from one parent, suffix from the other.
    OnePoint,
}

/// Mutation strategy for the operation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsMutation {
    /// Swap two random positions.
    Swap,
    /// Remove and reinsert at a random position.
    Insert,
    /// Reverse a random segment.
    Invert,
}

/// Mutation strategy for the machine selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MsMutation {
    /// Move one operation to a different random eligible machine.
    Redraw,
    /// Move one operation to the machine chosen by the load-balancing heuristic.
    LoadBalanced,
    /// Load-balanced with the given probability, redraw otherwise.
    Mixed {
        /// Probability of the load-balanced variant.
        balanced_probability: f64,
    },
}

/// Runtime-selectable genetic operators.
///
/// Shared by the GA and NSGA-II engines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticOperators {
    /// OS crossover strategy.
    pub os_crossover: OsCrossover,
    /// MS crossover strategy.
    pub ms_crossover: MsCrossover,
    /// OS mutation strategy.
    pub os_mutation: OsMutation,
    /// MS mutation strategy.
    pub ms_mutation: MsMutation,
}

impl Default for GeneticOperators {
    fn default() -> Self {
        Self {
            os_crossover: OsCrossover::Pox,
            ms_crossover: MsCrossover::Uniform,
            os_mutation: OsMutation::Swap,
            ms_mutation: MsMutation::Mixed {
                balanced_probability: 0.25,
            },
        }
    }
}

impl GeneticOperators {
    /// Performs crossover on both vectors using the configured strategies.
    pub fn crossover<R: Rng>(
        &self,
        p1: &Chromosome,
        p2: &Chromosome,
        model: &ProblemModel,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        let (os1, os2) = match self.os_crossover {
            OsCrossover::Pox => pox_crossover(&p1.os, &p2.os, model, rng),
            OsCrossover::Ox => ox_crossover(&p1.os, &p2.os, rng),
        };
        let (ms1, ms2) = match self.ms_crossover {
            MsCrossover::Uniform => uniform_ms_crossover(&p1.ms, &p2.ms, rng),
            MsCrossover::OnePoint => one_point_ms_crossover(&p1.ms, &p2.ms, rng),
        };
        (Chromosome::new(os1, ms1), Chromosome::new(os2, ms2))
    }

    /// Mutates the operation sequence.
    pub fn mutate_os<R: Rng>(&self, chromosome: &mut Chromosome, rng: &mut R) {
        match self.os_mutation {
            OsMutation::Swap => swap_mutation(&mut chromosome.os, rng),
            OsMutation::Insert => insert_mutation(&mut chromosome.os, rng),
            OsMutation::Invert => invert_mutation(&mut chromosome.os, rng),
        }
    }

    /// Mutates the machine selection.
    pub fn mutate_ms<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        model: &ProblemModel,
        chooser: &dyn MachineChooser,
        rng: &mut R,
    ) {
        let balanced = match self.ms_mutation {
            MsMutation::Redraw => false,
            MsMutation::LoadBalanced => true,
            MsMutation::Mixed {
                balanced_probability,
            } => rng.random_bool(balanced_probability.clamp(0.0, 1.0)),
        };
        if balanced {
            ms_balanced_mutation(chromosome, model, chooser, rng);
        } else {
            ms_redraw_mutation(&mut chromosome.ms, model, rng);
        }
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
        let orders = (0..5)
            .map(|i| Order::new(format!("O{i}"), "P", 2, 1.0))
            .collect();
        let plan = ProcessPlan::new()
            .with_entry(ProcessTime::new("COG", "BOND", 300.0))
            .with_entry(ProcessTime::new("Assembly", "BLU", 500.0));
        let machines = vec![
            Machine::new("B1", "BOND"),
            Machine::new("B2", "BOND"),
            Machine::new("A1", "BLU"),
            Machine::new("A2", "BLU"),
        ];
        ProblemModel::new(orders, plan, machines).unwrap()
    }

    #[test]
    fn test_all_combinations_keep_validity() {
        let m = model();
        let chooser = LeastLoaded::default();
        let mut rng = SmallRng::seed_from_u64(42);

        for os_crossover in [OsCrossover::Pox, OsCrossover::Ox] {
            for ms_crossover in [MsCrossover::Uniform, MsCrossover::OnePoint] {
                for os_mutation in [OsMutation::Swap, OsMutation::Insert, OsMutation::Invert] {
                    for ms_mutation in [MsMutation::Redraw, MsMutation::LoadBalanced] {
                        let ops = GeneticOperators {
                            os_crossover,
                            ms_crossover,
                            os_mutation,
                            ms_mutation,
                        };
                        let p1 = Chromosome::random(&m, &mut rng);
                        let p2 = Chromosome::random(&m, &mut rng);
                        let (mut c1, mut c2) = ops.crossover(&p1, &p2, &m, &mut rng);
                        ops.mutate_os(&mut c1, &mut rng);
                        ops.mutate_ms(&mut c1, &m, &chooser, &mut rng);
                        ops.mutate_os(&mut c2, &mut rng);
                        ops.mutate_ms(&mut c2, &m, &chooser, &mut rng);
                        assert!(c1.is_valid(&m), "{ops:?}");
                        assert!(c2.is_valid(&m), "{ops:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_operators_deserialize_with_defaults() {
        let ops: GeneticOperators = serde_json::from_str(r#"{"os_crossover":"Ox"}"#).unwrap();
        assert_eq!(ops.os_crossover, OsCrossover::Ox);
        assert_eq!(ops.ms_crossover, MsCrossover::Uniform);
    }
}
