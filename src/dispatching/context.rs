//! Shop-wide figures shared by dispatching rules.

use crate::problem::ProblemModel;

/// Aggregates of the whole order set, computed once per ranking.
///
/// Rankings are taken at the scheduling epoch (t=0), so slack is measured
/// from there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulingContext {
    /// Mean minimum processing time per order (s), at least 1.
    pub average_processing_secs: f64,
}

impl SchedulingContext {
    /// Computes the aggregates of a model.
    pub fn for_model(model: &ProblemModel) -> Self {
        let n = model.order_count();
        let total: i64 = (0..n).map(|o| model.min_total_secs(o)).sum();
        let average = if n == 0 { 0.0 } else { total as f64 / n as f64 };
        Self {
            average_processing_secs: average.max(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Machine, Order, ProcessPlan, ProcessTime};

    #[test]
    fn test_average_over_orders() {
        let orders = vec![Order::new("A", "P", 2, 1.0), Order::new("B", "P", 4, 1.0)];
        let plan = ProcessPlan::new().with_entry(ProcessTime::new("S", "T", 100.0));
        let model = ProblemModel::new(orders, plan, vec![Machine::new("M", "T")]).unwrap();
        assert_eq!(SchedulingContext::for_model(&model).average_processing_secs, 300.0);
    }
}
