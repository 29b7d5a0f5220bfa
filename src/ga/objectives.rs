//! Optimization objectives.
//!
//! Every objective is expressed so that lower is better; maximized KPIs
//! are negated.

use serde::{Deserialize, Serialize};

use crate::scheduler::ScheduleKpi;

/// A single minimized objective derived from [`ScheduleKpi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Objective {
    /// Total weighted tardiness (days).
    WeightedTardiness,
    /// Makespan (days).
    Makespan,
    /// Negated on-time delivery rate.
    OnTimeRate,
    /// Negated average machine utilization.
    Utilization,
    /// Standard deviation of machine utilization.
    LoadBalance,
}

impl Objective {
    /// Minimized value of this objective.
    pub fn value(self, kpi: &ScheduleKpi) -> f64 {
        match self {
            Objective::WeightedTardiness => kpi.total_weighted_tardiness,
            Objective::Makespan => kpi.makespan_days,
            Objective::OnTimeRate => -kpi.on_time_delivery_rate,
            Objective::Utilization => -kpi.avg_utilization,
            Objective::LoadBalance => kpi.load_balance_std,
        }
    }

    /// Short name.
    pub fn name(self) -> &'static str {
        match self {
            Objective::WeightedTardiness => "weighted_tardiness",
            Objective::Makespan => "makespan",
            Objective::OnTimeRate => "on_time_rate",
            Objective::Utilization => "utilization",
            Objective::LoadBalance => "load_balance",
        }
    }
}

/// Ordered set of objectives forming the objective vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectiveSet(Vec<Objective>);

impl Default for ObjectiveSet {
    fn default() -> Self {
        Self(vec![
            Objective::WeightedTardiness,
            Objective::Makespan,
            Objective::OnTimeRate,
            Objective::Utilization,
        ])
    }
}

impl ObjectiveSet {
    /// Creates a set from a list of objectives.
    pub fn new(objectives: Vec<Objective>) -> Self {
        Self(objectives)
    }

    /// Appends an objective if not already present.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        if !self.0.contains(&objective) {
            self.0.push(objective);
        }
        self
    }

    /// Objective vector of a KPI set.
    pub fn evaluate(&self, kpi: &ScheduleKpi) -> Vec<f64> {
        self.0.iter().map(|o| o.value(kpi)).collect()
    }

    /// Position of an objective in the vector.
    pub fn position(&self, objective: Objective) -> Option<usize> {
        self.0.iter().position(|&o| o == objective)
    }

    /// Objectives in vector order.
    pub fn as_slice(&self) -> &[Objective] {
        &self.0
    }

    /// Number of objectives.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether an objective appears more than once.
    pub fn has_duplicates(&self) -> bool {
        self.0
            .iter()
            .enumerate()
            .any(|(i, o)| self.0[..i].contains(o))
    }
}
