//! Flexible flow shop scheduling.
//!
//! Builds a validated problem model from orders, a process plan and a
//! machine calendar, decodes candidate solutions into calendar-aware
//! schedules, and searches for good schedules with a single-objective GA
//! (total weighted tardiness) or NSGA-II (Pareto front over tardiness,
//! makespan, on-time rate and utilization).
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Order`, `ProcessPlan`, `Machine`,
//!   `DailyCalendar`, `Schedule`, `Assignment`
//! - **`validation`**: Input integrity checks (duplicate IDs, quantities,
//!   yields, unknown machine types, stages without machines)
//! - **`problem`**: `ProblemModel`, the immutable indexed view every engine
//!   reads
//! - **`scheduler`**: Decoder, KPIs and `ScheduleResult`
//! - **`dispatching`**: Priority rules (EDD, SPT, WSPT, ATC, ...) used to seed
//!   the search
//! - **`ga`**: Chromosome encoding, operators, `GaEngine` and `Nsga2Engine`
//!
//! # Example
//!
//! ```
//! use ffs_schedule::ga::{GaConfig, GaEngine};
//! use ffs_schedule::models::{Machine, Order, ProcessPlan, ProcessTime};
//! use ffs_schedule::ProblemModel;
//!
//! let orders = vec![Order::new("O1", "P", 10, 1.0), Order::new("O2", "P", 5, 0.5)];
//! let plan = ProcessPlan::new()
//!     .with_entry(ProcessTime::new("COG", "BOND", 120.0))
//!     .with_entry(ProcessTime::new("Assembly", "BLU", 300.0).with_yield(0.95));
//! let machines = vec![
//!     Machine::new("B1", "BOND"),
//!     Machine::new("A1", "BLU").with_daily_available_minutes(1320),
//! ];
//! let model = ProblemModel::new(orders, plan, machines).unwrap();
//!
//! let report = GaEngine::new(&model, GaConfig::default().with_seed(1).with_max_generations(10))
//!     .run()
//!     .unwrap();
//! assert_eq!(report.result.schedule.len(), 4);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Ruiz & Vázquez-Rodríguez (2010), "The hybrid flow shop scheduling problem"
//! - Deb et al. (2002), "A fast and elitist multiobjective genetic algorithm: NSGA-II"

pub mod dispatching;
pub mod error;
pub mod ga;
pub mod models;
pub mod problem;
pub mod scheduler;
pub mod validation;

pub use error::{Result, ScheduleError};
pub use problem::{Operation, ProblemModel};
