//! Lexicographic ranking of orders by a chain of dispatching rules.
//!
//! The first rule decides; each later rule only separates orders the
//! earlier ones scored equal (within `1e-9`). A final [`TieBreaker`]
//! settles what is left.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::{DispatchingRule, SchedulingContext};
use crate::problem::ProblemModel;

const SCORE_EPSILON: f64 = 1e-9;

/// How orders still tied after every rule are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreaker {
    /// Keep model order (stable sort).
    #[default]
    InputOrder,
    /// Lexicographic order ID.
    ById,
}

/// Ranks orders with a chain of rules.
///
/// # Example
/// ```
/// use ffs_schedule::dispatching::{rules, RuleEngine, TieBreaker};
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::Edd)
///     .with_rule(rules::Wspt)
///     .with_final_tie_breaker(TieBreaker::ById);
/// assert_eq!(engine.rule_names(), vec!["EDD", "WSPT"]);
/// ```
#[derive(Clone, Default)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn DispatchingRule>>,
    tie_breaker: TieBreaker,
}

impl RuleEngine {
    /// Creates an engine without rules (ranking = tie-breaker only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule; it only decides among orders tied so far.
    pub fn with_rule<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Sets what happens to orders tied on every rule.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Order indices, highest priority first.
    ///
    /// Every rule scores every order once; sorting compares the cached
    /// score rows.
    pub fn rank(&self, model: &ProblemModel, context: &SchedulingContext) -> Vec<usize> {
        let scores: Vec<Vec<f64>> = (0..model.order_count())
            .map(|order| {
                self.rules
                    .iter()
                    .map(|rule| rule.evaluate(order, model, context))
                    .collect()
            })
            .collect();

        let mut ranking: Vec<usize> = (0..model.order_count()).collect();
        ranking.sort_by(|&a, &b| {
            compare_scores(&scores[a], &scores[b]).then_with(|| match self.tie_breaker {
                TieBreaker::InputOrder => Ordering::Equal,
                TieBreaker::ById => model.orders()[a]
                    .order_id
                    .cmp(&model.orders()[b].order_id),
            })
        });
        ranking
    }
}

/// First rule whose scores differ decides.
fn compare_scores(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .find(|(x, y)| (*x - *y).abs() > SCORE_EPSILON)
        .map_or(Ordering::Equal, |(x, y)| x.total_cmp(y))
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_names())
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::rules;
    use crate::models::{Machine, Order, ProcessPlan, ProcessTime};

    /// (id, quantity, due days); one stage at 1000 s/unit.
    fn model(orders: &[(&str, u32, f64)]) -> ProblemModel {
        let orders = orders
            .iter()
            .map(|&(id, q, due)| Order::new(id, "P", q, due))
            .collect();
        let plan = ProcessPlan::new().with_entry(ProcessTime::new("S", "T", 1_000.0));
        ProblemModel::new(orders, plan, vec![Machine::new("M1", "T")]).unwrap()
    }

    fn ranked_ids(engine: &RuleEngine, model: &ProblemModel) -> Vec<String> {
        engine
            .rank(model, &SchedulingContext::for_model(model))
            .into_iter()
            .map(|i| model.orders()[i].order_id.clone())
            .collect()
    }

    #[test]
    fn test_single_rule() {
        let m = model(&[("long", 5, 1.0), ("short", 1, 1.0), ("medium", 3, 1.0)]);
        let spt = RuleEngine::new().with_rule(rules::Spt);
        assert_eq!(ranked_ids(&spt, &m), vec!["short", "medium", "long"]);

        let m = model(&[("late", 1, 5.0), ("early", 1, 1.0), ("mid", 1, 3.0)]);
        let edd = RuleEngine::new().with_rule(rules::Edd);
        assert_eq!(ranked_ids(&edd, &m), vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_second_rule_only_breaks_ties() {
        // EDD ties B and A; SPT puts the shorter A first. C is due first
        // although it is the longest.
        let m = model(&[("B", 2, 1.0), ("A", 1, 1.0), ("C", 9, 0.5)]);
        let engine = RuleEngine::new().with_rule(rules::Edd).with_rule(rules::Spt);
        assert_eq!(ranked_ids(&engine, &m), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_final_tie_breakers() {
        let m = model(&[("B", 1, 1.0), ("A", 1, 1.0)]);
        let stable = RuleEngine::new().with_rule(rules::Spt);
        assert_eq!(ranked_ids(&stable, &m), vec!["B", "A"]);
        let by_id = stable.clone().with_final_tie_breaker(TieBreaker::ById);
        assert_eq!(ranked_ids(&by_id, &m), vec!["A", "B"]);
    }

    #[test]
    fn test_scores_within_epsilon_tie() {
        assert_eq!(compare_scores(&[1.0, 2.0], &[1.0 + 1e-12, 3.0]), Ordering::Less);
        assert_eq!(compare_scores(&[1.0], &[1.0]), Ordering::Equal);
    }
}
