//! GA-based schedule optimization.
//!
//! Chromosomes use the OS/MS dual-vector encoding and decode through
//! [`crate::scheduler::decode`], so every individual is a feasible
//! schedule. Two engines share the encoding and operators:
//!
//! - [`GaEngine`]: single objective, total weighted tardiness, elitist with
//!   adaptive crossover/mutation rates.
//! - [`Nsga2Engine`]: Pareto front over a configurable [`ObjectiveSet`].
//!
//! # Encoding
//!
//! - **OS** (Operation Sequence): permutation of operation indices. The
//!   k-th gene belonging to order *i* schedules stage *k* of *i*.
//! - **MS** (Machine Selection): per operation, a position in its eligible
//!   machine list.
//!
//! # Submodules
//!
//! - [`operators`]: runtime-selectable crossover and mutation strategies
//! - [`nsga2`]: dominance sorting, crowding distance and the NSGA-II engine
//!
//! # Reference
//! - Cheng et al. (1996), "A Tutorial Survey of JSSP using GA"
//! - Bierwirth (1995), "A generalized permutation approach to JSSP"

mod adaptive;
mod chromosome;
mod config;
mod control;
mod engine;
pub mod nsga2;
mod objectives;
pub mod operators;
mod population;
mod selection;

pub use adaptive::{FixedRates, GenerationStats, RateAdaptation, Rates, SpreadAdaptive};
pub use chromosome::{
    insert_mutation, invert_mutation, ms_balanced_mutation, ms_redraw_mutation,
    one_point_ms_crossover, ox_crossover, pox_crossover, swap_mutation, uniform_ms_crossover,
    Chromosome,
};
pub use config::{GaConfig, Nsga2Config};
pub use control::{CancelToken, Termination};
pub use engine::{GaEngine, GaReport};
pub use nsga2::{Nsga2Engine, ParetoResult, ParetoSolution, Representatives};
pub use objectives::{Objective, ObjectiveSet};
pub use population::{Individual, Population};
pub use selection::{crowded_tournament, roulette, tournament, Selection};
