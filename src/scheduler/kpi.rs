//! Schedule quality metrics (KPIs).
//!
//! Computes delivery and machine-usage indicators from a decoded schedule
//! and its problem model.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total Weighted Tardiness | Σ weight × max(0, completion − due) (days) |
//! | On-Time Rate | Fraction of orders with zero tardiness |
//! | Avg Tardiness | Mean unweighted tardiness (days) |
//! | Makespan | Latest completion (days) |
//! | Avg Utilization | Mean busy / available time over [0, makespan) |
//! | Load Balance | Population std of machine utilization |
//! | Bottleneck Utilization | Highest machine utilization |
//!
//! Available time follows each machine's calendar, so maintenance windows
//! do not count against utilization. Machines that no stage can use are
//! excluded.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Schedule, SECONDS_PER_DAY};
use crate::problem::ProblemModel;

/// Schedule performance indicators.
///
/// Completion, tardiness and makespan are in days; utilizations in 0.0..1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Sum of priority-weighted tardiness (days).
    pub total_weighted_tardiness: f64,
    /// Fraction of orders completing on time (0.0..1.0).
    pub on_time_delivery_rate: f64,
    /// Mean unweighted tardiness (days).
    pub avg_tardiness: f64,
    /// Latest completion (days).
    pub makespan_days: f64,
    /// Mean machine utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Population standard deviation of machine utilization.
    pub load_balance_std: f64,
    /// Highest machine utilization.
    pub bottleneck_utilization: f64,
    /// Per-machine utilization, keyed by machine ID.
    pub utilization_by_machine: BTreeMap<String, f64>,
    /// Per-machine workload, keyed by machine ID.
    pub workload_by_machine: BTreeMap<String, MachineWorkload>,
}

/// Work committed to one machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineWorkload {
    /// Working seconds.
    pub busy_secs: i64,
    /// Number of operations.
    pub operations: usize,
}

/// Delivery outcome of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutcome {
    /// Order ID.
    pub order_id: String,
    /// Completion of the last stage (days).
    pub completion_days: f64,
    /// Due date (days).
    pub due_date: f64,
    /// max(0, completion − due) (days).
    pub tardiness: f64,
    /// Priority weight × tardiness.
    pub weighted_tardiness: f64,
    /// Whether tardiness is zero.
    pub on_time: bool,
}

/// Per-order delivery outcomes, in model order.
pub fn order_outcomes(schedule: &Schedule, model: &ProblemModel) -> Vec<OrderOutcome> {
    let completions = schedule.order_completions(model.order_count());
    model
        .orders()
        .iter()
        .zip(completions)
        .map(|(order, completion)| {
            let completion_days = completion as f64 / SECONDS_PER_DAY as f64;
            let tardiness = (completion_days - order.due_date).max(0.0);
            OrderOutcome {
                order_id: order.order_id.clone(),
                completion_days,
                due_date: order.due_date,
                tardiness,
                weighted_tardiness: order.weight() * tardiness,
                on_time: tardiness <= 0.0,
            }
        })
        .collect()
}

/// Total weighted tardiness (days) without building the full KPI set.
///
/// Used as the single-objective fitness.
pub fn total_weighted_tardiness(schedule: &Schedule, model: &ProblemModel) -> f64 {
    let completions = schedule.order_completions(model.order_count());
    model
        .orders()
        .iter()
        .zip(completions)
        .map(|(order, completion)| {
            let days = completion as f64 / SECONDS_PER_DAY as f64;
            order.weight() * (days - order.due_date).max(0.0)
        })
        .sum()
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its problem model.
    pub fn calculate(schedule: &Schedule, model: &ProblemModel) -> Self {
        let outcomes = order_outcomes(schedule, model);
        Self::from_outcomes(schedule, model, &outcomes)
    }

    /// Computes KPIs reusing already computed order outcomes.
    pub fn from_outcomes(schedule: &Schedule, model: &ProblemModel, outcomes: &[OrderOutcome]) -> Self {
        let n = outcomes.len();
        let total_weighted_tardiness = outcomes.iter().map(|o| o.weighted_tardiness).sum();
        let on_time_delivery_rate = if n == 0 {
            1.0
        } else {
            outcomes.iter().filter(|o| o.on_time).count() as f64 / n as f64
        };
        let avg_tardiness = if n == 0 {
            0.0
        } else {
            outcomes.iter().map(|o| o.tardiness).sum::<f64>() / n as f64
        };

        let makespan = schedule.makespan();
        let busy = schedule.busy_by_machine(model.machine_count());
        let mut operations = vec![0usize; model.machine_count()];
        for a in &schedule.assignments {
            if let Some(count) = operations.get_mut(a.machine) {
                *count += 1;
            }
        }

        let mut utilization_by_machine = BTreeMap::new();
        let mut workload_by_machine = BTreeMap::new();
        for m in model.schedulable_machines() {
            let id = model.machines()[m].machine_id.clone();
            let available = model.calendar(m).available_time_in_range(0, makespan);
            if available > 0 {
                utilization_by_machine.insert(id.clone(), busy[m] as f64 / available as f64);
            }
            workload_by_machine.insert(
                id,
                MachineWorkload {
                    busy_secs: busy[m],
                    operations: operations[m],
                },
            );
        }

        let (avg_utilization, load_balance_std, bottleneck_utilization) =
            utilization_summary(utilization_by_machine.values().copied());

        Self {
            total_weighted_tardiness,
            on_time_delivery_rate,
            avg_tardiness,
            makespan_days: makespan as f64 / SECONDS_PER_DAY as f64,
            avg_utilization,
            load_balance_std,
            bottleneck_utilization,
            utilization_by_machine,
            workload_by_machine,
        }
    }
}

/// Mean, population std and max of a set of utilizations.
fn utilization_summary(values: impl Iterator<Item = f64>) -> (f64, f64, f64) {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|u| (u - mean).powi(2)).sum::<f64>() / n;
    let max = values.iter().copied().fold(0.0, f64::max);
    (mean, var.sqrt(), max)
}
