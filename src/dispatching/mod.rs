//! Dispatching rules and rule engine for order prioritization.
//!
//! Provides priority-based dispatching rules (SPT, EDD, WSPT, ATC and
//! priority class) and a lexicographic rule engine. The GA engines use them to seed part of
//! the initial population with good operation sequences.
//!
//! # Usage
//!
//! ```
//! use ffs_schedule::dispatching::{rule_sequence, rules, RuleEngine};
//! use ffs_schedule::models::{Machine, Order, ProcessPlan, ProcessTime};
//! use ffs_schedule::problem::ProblemModel;
//!
//! let orders = vec![Order::new("O1", "P", 1, 3.0), Order::new("O2", "P", 1, 1.0)];
//! let plan = ProcessPlan::new().with_entry(ProcessTime::new("Assembly", "BLU", 60.0));
//! let model = ProblemModel::new(orders, plan, vec![Machine::new("M1", "BLU")]).unwrap();
//!
//! let engine = RuleEngine::new().with_rule(rules::Edd);
//! assert_eq!(rule_sequence(&engine, &model), vec![1, 0]);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::SchedulingContext;
pub use engine::{RuleEngine, TieBreaker};

use std::fmt::Debug;

use crate::problem::ProblemModel;

/// Score returned by a dispatching rule.
///
/// Lower scores = higher priority (dispatched first).
pub type RuleScore = f64;

/// A dispatching rule that evaluates order priority.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules should return smaller values
/// for orders that should be dispatched first.
///
/// # Reference
/// Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "SPT", "EDD").
    fn name(&self) -> &'static str;

    /// Evaluates the priority of an order given the current context.
    ///
    /// Returns a score where lower = higher priority.
    fn evaluate(&self, order: usize, model: &ProblemModel, context: &SchedulingContext) -> RuleScore;
}

/// Operation sequence (OS) that dispatches orders in the engine's priority
/// order, stage by stage.
///
/// Every stage lists all orders in the same ranking, so the decoder
/// behaves like a permutation flow shop dispatcher.
pub fn rule_sequence(engine: &RuleEngine, model: &ProblemModel) -> Vec<usize> {
    let ranking = engine.rank(model, &SchedulingContext::for_model(model));
    let mut os = Vec::with_capacity(model.operation_count());
    for stage in 0..model.stage_count() {
        os.extend(ranking.iter().map(|&order| model.op_index(order, stage)));
    }
    os
}

/// Rule engines used to seed the initial population: EDD, WSPT, SPT,
/// priority class and ATC, each with order ID as the last tie-breaker.
pub fn seed_engines() -> Vec<RuleEngine> {
    vec![
        RuleEngine::new()
            .with_rule(rules::Edd)
            .with_rule(rules::Wspt)
            .with_final_tie_breaker(TieBreaker::ById),
        RuleEngine::new()
            .with_rule(rules::Wspt)
            .with_final_tie_breaker(TieBreaker::ById),
        RuleEngine::new()
            .with_rule(rules::Spt)
            .with_final_tie_breaker(TieBreaker::ById),
        RuleEngine::new()
            .with_rule(rules::PriorityClass)
            .with_rule(rules::Edd)
            .with_final_tie_breaker(TieBreaker::ById),
        RuleEngine::new()
            .with_rule(rules::Atc::default())
            .with_final_tie_breaker(TieBreaker::ById),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Machine, Order, ProcessPlan, ProcessTime};

    #[test]
    fn test_rule_sequence_is_stage_major_permutation() {
        let orders = vec![
            Order::new("O1", "P", 1, 3.0),
            Order::new("O2", "P", 1, 1.0),
            Order::new("O3", "P", 1, 2.0),
        ];
        let plan = ProcessPlan::new()
            .with_entry(ProcessTime::new("Dispensing", "DISP", 60.0))
            .with_entry(ProcessTime::new("Assembly", "BLU", 60.0));
        let machines = vec![Machine::new("D1", "DISP"), Machine::new("B1", "BLU")];
        let model = ProblemModel::new(orders, plan, machines).unwrap();

        let engine = RuleEngine::new().with_rule(rules::Edd);
        let os = rule_sequence(&engine, &model);
        assert_eq!(os, vec![2, 4, 0, 3, 5, 1]);

        let mut sorted = os.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_seed_engines_named() {
        let names: Vec<&str> = seed_engines().iter().map(|e| e.rule_names()[0]).collect();
        assert_eq!(names, vec!["EDD", "WSPT", "SPT", "PRIORITY", "ATC"]);
    }
}
