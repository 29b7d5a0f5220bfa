//! Built-in dispatching rules.
//!
//! - **Time-based**: SPT, WSPT
//! - **Due-date**: EDD, ATC
//! - **Priority**: PRIORITY
//!
//! Processing time of an order is the sum over its stages of the fastest
//! eligible machine's effective duration. All rules return lower scores for
//! orders that should go first.
//!
//! # References
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Vepsalainen & Morton (1987), "Priority Rules for Job Shops with
//!   Weighted Tardiness Costs"

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::models::SECONDS_PER_DAY;
use crate::problem::ProblemModel;

/// Shortest Processing Time.
#[derive(Debug, Clone, Copy)]
pub struct Spt;

impl DispatchingRule for Spt {
    fn name(&self) -> &'static str {
        "SPT"
    }

    fn evaluate(&self, order: usize, model: &ProblemModel, _context: &SchedulingContext) -> RuleScore {
        model.min_total_secs(order) as f64
    }
}

/// Weighted Shortest Processing Time: highest weight per second of work
/// first.
#[derive(Debug, Clone, Copy)]
pub struct Wspt;

impl DispatchingRule for Wspt {
    fn name(&self) -> &'static str {
        "WSPT"
    }

    fn evaluate(&self, order: usize, model: &ProblemModel, _context: &SchedulingContext) -> RuleScore {
        let work = model.min_total_secs(order).max(1) as f64;
        -(model.orders()[order].weight() / work)
    }
}

/// Earliest Due Date.
#[derive(Debug, Clone, Copy)]
pub struct Edd;

impl DispatchingRule for Edd {
    fn name(&self) -> &'static str {
        "EDD"
    }

    fn evaluate(&self, order: usize, model: &ProblemModel, _context: &SchedulingContext) -> RuleScore {
        model.orders()[order].due_date
    }
}

/// Apparent Tardiness Cost.
///
/// WSPT discounted by `exp(-slack / (k * p_avg))`, where slack is the time
/// left at t=0 after the order's own work. Orders with no slack keep their
/// full WSPT index. Larger `k` behaves more like WSPT, smaller `k` more
/// like EDD.
#[derive(Debug, Clone, Copy)]
pub struct Atc {
    /// Lookahead parameter (default: 2.0).
    pub k: f64,
}

impl Default for Atc {
    fn default() -> Self {
        Self { k: 2.0 }
    }
}

impl Atc {
    /// Creates an ATC rule with a custom lookahead.
    pub fn with_k(k: f64) -> Self {
        Self { k }
    }
}

impl DispatchingRule for Atc {
    fn name(&self) -> &'static str {
        "ATC"
    }

    fn evaluate(&self, order: usize, model: &ProblemModel, context: &SchedulingContext) -> RuleScore {
        let work = model.min_total_secs(order).max(1) as f64;
        let due = model.orders()[order].due_date * SECONDS_PER_DAY as f64;
        let slack = (due - work).max(0.0);
        let urgency = (-slack / (self.k * context.average_processing_secs)).exp();
        -(model.orders()[order].weight() / work * urgency)
    }
}

/// Priority class: heavier tardiness weight first.
#[derive(Debug, Clone, Copy)]
pub struct PriorityClass;

impl DispatchingRule for PriorityClass {
    fn name(&self) -> &'static str {
        "PRIORITY"
    }

    fn evaluate(&self, order: usize, model: &ProblemModel, _context: &SchedulingContext) -> RuleScore {
        -model.orders()[order].weight()
    }
}
