//! Decoding and schedule evaluation.
//!
//! Turns encoded solutions into timed schedules and measures them.
//!
//! # Decoder
//!
//! `decode` maps an (OS, MS) chromosome to a feasible semi-active
//! schedule, repairing stage precedence and respecting each machine's
//! daily maintenance window. `decode_balanced` and `candidates_at` expose the
//! same pass for load-balanced machine selection.
//!
//! # KPI
//!
//! `ScheduleKpi` computes weighted tardiness, on-time rate, makespan,
//! utilization and load balance; `ScheduleResult` packages them with the
//! identifier-resolved schedule.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Ruiz & Vázquez-Rodríguez (2010), "The hybrid flow shop scheduling problem"

mod decoder;
mod kpi;
mod result;

pub use decoder::{
    decode, decode_balanced, candidates_at, EarliestFinish, LeastLoaded, MachineCandidate, MachineChooser,
};
pub use kpi::{order_outcomes, total_weighted_tardiness, MachineWorkload, OrderOutcome, ScheduleKpi};
pub use result::{ScheduleResult, ScheduleRow};
