//! Indexed flow shop problem.
//!
//! [`ProblemModel`] turns the three input tables into dense index-based
//! lookups used on the hot path of decoding: stage routing, eligible
//! machines per stage and precomputed effective durations per
//! (operation, eligible machine).
//!
//! # Operation Indexing
//! Every order visits every stage, so operations are addressed by
//! `op = order * stage_count + stage`.
//!
//! # Example
//! ```
//! use ffs_schedule::models::{Machine, Order, ProcessPlan, ProcessTime};
//! use ffs_schedule::problem::ProblemModel;
//!
//! let orders = vec![Order::new("O1", "LCM", 10, 2.0)];
//! let plan = ProcessPlan::new()
//!     .with_entry(ProcessTime::new("Dispensing", "DISP", 30.0))
//!     .with_entry(ProcessTime::new("Assembly", "BLU", 60.0));
//! let machines = vec![Machine::new("D1", "DISP"), Machine::new("B1", "BLU")];
//!
//! let model = ProblemModel::new(orders, plan, machines).unwrap();
//! assert_eq!(model.operation_count(), 2);
//! assert_eq!(model.duration(1, 1), Some(600));
//! ```

use std::collections::HashMap;

use tracing::warn;

use crate::error::{Result, ScheduleError};
use crate::models::{DailyCalendar, Machine, Order, ProcessPlan, ProcessTime, SECONDS_PER_DAY};
use crate::validation::validate_input;

/// An (order, stage) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation {
    /// Order index.
    pub order: usize,
    /// Stage index.
    pub stage: usize,
}

/// Immutable, validated flow shop problem instance.
#[derive(Debug, Clone)]
pub struct ProblemModel {
    orders: Vec<Order>,
    stages: Vec<String>,
    machines: Vec<Machine>,
    calendars: Vec<DailyCalendar>,
    /// Machine indices per stage, in calendar order.
    eligible: Vec<Vec<usize>>,
    /// Process entry per (stage, machine), `None` if the machine cannot serve it.
    process: Vec<Vec<Option<ProcessTime>>>,
    /// Effective duration per operation, aligned with `eligible[stage]`.
    durations: Vec<Vec<i64>>,
    order_lookup: HashMap<String, usize>,
    machine_lookup: HashMap<String, usize>,
    planning_horizon_days: Option<f64>,
}

impl ProblemModel {
    /// Builds a validated problem from orders, process plan and machines.
    ///
    /// # Errors
    /// - [`ScheduleError::InvalidInput`] with the first validation finding;
    ///   any further findings are logged.
    /// - [`ScheduleError::InfeasibleProblem`] if every eligible machine of a
    ///   stage has zero daily capacity.
    pub fn new(orders: Vec<Order>, plan: ProcessPlan, machines: Vec<Machine>) -> Result<Self> {
        if let Err(errors) = validate_input(&orders, &plan, &machines) {
            let mut errors = errors.into_iter();
            if let Some(first) = errors.next() {
                for extra in errors {
                    warn!(kind = ?extra.kind, record = %extra.record, "{}", extra.message);
                }
                return Err(ScheduleError::InvalidInput(first));
            }
        }

        let stages = plan.stages();
        let calendars: Vec<DailyCalendar> = machines.iter().map(Machine::calendar).collect();

        let mut process = vec![vec![None; machines.len()]; stages.len()];
        let mut eligible = vec![Vec::new(); stages.len()];
        for (s, stage) in stages.iter().enumerate() {
            let mut has_type_match = false;
            for (m, machine) in machines.iter().enumerate() {
                if let Some(entry) = plan.get(stage, &machine.machine_type) {
                    has_type_match = true;
                    process[s][m] = Some(entry.clone());
                    if calendars[m].has_capacity() {
                        eligible[s].push(m);
                    }
                }
            }
            if has_type_match && eligible[s].is_empty() {
                return Err(ScheduleError::InfeasibleProblem {
                    stage: stage.clone(),
                    reason: "every eligible machine has zero daily capacity".into(),
                });
            }
        }

        let mut durations = Vec::with_capacity(orders.len() * stages.len());
        for order in &orders {
            for (s, machines_for_stage) in eligible.iter().enumerate() {
                let row = machines_for_stage
                    .iter()
                    .map(|&m| {
                        process[s][m]
                            .as_ref()
                            .map_or(0, |pt| pt.effective_secs(order.quantity))
                    })
                    .collect();
                durations.push(row);
            }
        }

        let order_lookup = orders
            .iter()
            .enumerate()
            .map(|(i, o)| (o.order_id.clone(), i))
            .collect();
        let machine_lookup = machines
            .iter()
            .enumerate()
            .map(|(i, m)| (m.machine_id.clone(), i))
            .collect();

        Ok(Self {
            orders,
            stages,
            machines,
            calendars,
            eligible,
            process,
            durations,
            order_lookup,
            machine_lookup,
            planning_horizon_days: None,
        })
    }

    /// Sets a planning horizon and checks that each stage's minimum demand
    /// fits the machines' available time within it.
    ///
    /// # Errors
    /// [`ScheduleError::InfeasibleProblem`] naming the first overloaded stage.
    pub fn with_planning_horizon_days(mut self, days: f64) -> Result<Self> {
        if !days.is_finite() || days <= 0.0 {
            return Err(ScheduleError::InvalidConfig(format!(
                "planning horizon must be positive, got {days}"
            )));
        }
        let horizon = (days * SECONDS_PER_DAY as f64).floor() as i64;
        for (s, stage) in self.stages.iter().enumerate() {
            let capacity: i64 = self.eligible[s]
                .iter()
                .map(|&m| self.calendars[m].available_time_in_range(0, horizon))
                .sum();
            let demand: i64 = (0..self.orders.len())
                .map(|o| self.min_duration(self.op_index(o, s)))
                .sum();
            if demand > capacity {
                return Err(ScheduleError::InfeasibleProblem {
                    stage: stage.clone(),
                    reason: format!(
                        "minimum demand {demand} s exceeds {capacity} s available within {days} days"
                    ),
                });
            }
        }
        self.planning_horizon_days = Some(days);
        Ok(self)
    }

    /// Configured planning horizon (days), if any.
    pub fn planning_horizon_days(&self) -> Option<f64> {
        self.planning_horizon_days
    }

    /// Orders, in input order.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Stage names, in routing order.
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// Machines, in input order.
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Number of orders.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of stages.
    #[inline]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Number of machines.
    #[inline]
    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    /// Total number of operations.
    #[inline]
    pub fn operation_count(&self) -> usize {
        self.orders.len() * self.stages.len()
    }

    /// Global index of (order, stage).
    #[inline]
    pub fn op_index(&self, order: usize, stage: usize) -> usize {
        order * self.stages.len() + stage
    }

    /// Order and stage of an operation.
    #[inline]
    pub fn operation(&self, op: usize) -> Operation {
        let stages = self.stages.len().max(1);
        Operation {
            order: op / stages,
            stage: op % stages,
        }
    }

    /// Machines that can process a stage (positive capacity only).
    pub fn eligible_machines(&self, stage: usize) -> &[usize] {
        self.eligible.get(stage).map_or(&[], Vec::as_slice)
    }

    /// Eligible machines of a stage restricted to one machine type.
    pub fn eligible_machines_for(&self, stage: usize, machine_type: &str) -> Vec<usize> {
        self.eligible_machines(stage)
            .iter()
            .copied()
            .filter(|&m| self.machines[m].machine_type == machine_type)
            .collect()
    }

    /// Machines eligible for at least one stage.
    pub fn schedulable_machines(&self) -> Vec<usize> {
        (0..self.machines.len())
            .filter(|m| self.eligible.iter().any(|e| e.contains(m)))
            .collect()
    }

    /// Process entry for a stage on a machine.
    pub fn process_time(&self, stage: usize, machine: usize) -> Option<&ProcessTime> {
        self.process.get(stage)?.get(machine)?.as_ref()
    }

    /// Effective duration (s) of an operation on a machine.
    ///
    /// `None` if the machine is not eligible for the operation's stage.
    pub fn duration(&self, op: usize, machine: usize) -> Option<i64> {
        let stage = self.operation(op).stage;
        let k = self.eligible_machines(stage).iter().position(|&m| m == machine)?;
        self.durations.get(op)?.get(k).copied()
    }

    /// Effective duration (s) of an operation on its `k`-th eligible machine.
    ///
    /// `k` must be below the stage's eligible count; the decoder reduces
    /// MS genes modulo that count first.
    #[inline]
    pub(crate) fn duration_at(&self, op: usize, k: usize) -> i64 {
        self.durations[op][k]
    }

    /// Shortest effective duration of an operation over its eligible machines.
    pub fn min_duration(&self, op: usize) -> i64 {
        self.durations
            .get(op)
            .and_then(|row| row.iter().copied().min())
            .unwrap_or(0)
    }

    /// Sum of the shortest durations of all stages of an order.
    pub fn min_total_secs(&self, order: usize) -> i64 {
        (0..self.stages.len())
            .map(|s| self.min_duration(self.op_index(order, s)))
            .sum()
    }

    /// Availability calendar of a machine.
    #[inline]
    pub fn calendar(&self, machine: usize) -> DailyCalendar {
        self.calendars[machine]
    }

    /// Index of an order by ID.
    pub fn order_index(&self, order_id: &str) -> Option<usize> {
        self.order_lookup.get(order_id).copied()
    }

    /// Index of a machine by ID.
    pub fn machine_index(&self, machine_id: &str) -> Option<usize> {
        self.machine_lookup.get(machine_id).copied()
    }

    /// Index of a stage by name.
    pub fn stage_index(&self, stage: &str) -> Option<usize> {
        self.stages.iter().position(|s| s == stage)
    }
}
