//! Caller-facing schedule result.
//!
//! [`ScheduleResult`] resolves the index-based [`Schedule`] into
//! identifier-based rows and bundles it with KPIs and per-order outcomes.

use serde::{Deserialize, Serialize};

use super::kpi::{order_outcomes, OrderOutcome, ScheduleKpi};
use crate::models::{Schedule, TimeWindow};
use crate::problem::ProblemModel;

/// One scheduled operation, resolved to identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// Order ID.
    pub order_id: String,
    /// Stage name.
    pub stage: String,
    /// Machine ID.
    pub machine_id: String,
    /// Start time (s from epoch).
    pub start: i64,
    /// Finish time (s from epoch).
    pub finish: i64,
    /// Working intervals between `start` and `finish`; more than one when
    /// the operation pauses over maintenance.
    pub segments: Vec<TimeWindow>,
}

impl ScheduleRow {
    /// Start time in hours.
    pub fn start_hours(&self) -> f64 {
        self.start as f64 / 3_600.0
    }

    /// Finish time in hours.
    pub fn finish_hours(&self) -> f64 {
        self.finish as f64 / 3_600.0
    }

    /// Seconds spent paused over maintenance.
    pub fn paused_secs(&self) -> i64 {
        let working: i64 = self.segments.iter().map(TimeWindow::duration).sum();
        self.finish - self.start - working
    }
}

/// A finished schedule with its metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// Aggregate KPIs.
    pub kpis: ScheduleKpi,
    /// Per-order delivery outcomes.
    pub orders: Vec<OrderOutcome>,
    /// Schedule rows, sorted by order then stage.
    pub schedule: Vec<ScheduleRow>,
}

impl ScheduleResult {
    /// Builds the result for a decoded schedule.
    pub fn build(schedule: &Schedule, model: &ProblemModel) -> Self {
        let orders = order_outcomes(schedule, model);
        let kpis = ScheduleKpi::from_outcomes(schedule, model, &orders);

        let mut assignments: Vec<_> = schedule.assignments.iter().collect();
        assignments.sort_by_key(|a| (a.order, a.stage));
        let rows = assignments
            .into_iter()
            .map(|a| ScheduleRow {
                order_id: model.orders()[a.order].order_id.clone(),
                stage: model.stages()[a.stage].clone(),
                machine_id: model.machines()[a.machine].machine_id.clone(),
                start: a.start,
                finish: a.finish,
                segments: a.segments.clone(),
            })
            .collect();

        Self {
            kpis,
            orders,
            schedule: rows,
        }
    }

    /// Rows of one order, in stage order.
    pub fn rows_for_order<'a>(&'a self, order_id: &'a str) -> impl Iterator<Item = &'a ScheduleRow> {
        self.schedule.iter().filter(move |r| r.order_id == order_id)
    }

    /// Rows on one machine, by start time.
    pub fn rows_for_machine(&self, machine_id: &str) -> Vec<&ScheduleRow> {
        let mut rows: Vec<_> = self
            .schedule
            .iter()
            .filter(|r| r.machine_id == machine_id)
            .collect();
        rows.sort_by_key(|r| r.start);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Machine, Order, ProcessPlan, ProcessTime};
    use crate::scheduler::decode;

    fn model() -> ProblemModel {
        let orders = vec![Order::new("O1", "P", 1, 1.0), Order::new("O2", "P", 2, 1.0)];
        let plan = ProcessPlan::new()
            .with_entry(ProcessTime::new("Dispensing", "DISP", 1_800.0))
            .with_entry(ProcessTime::new("Assembly", "BLU", 3_600.0));
        let machines = vec![Machine::new("D1", "DISP"), Machine::new("B1", "BLU")];
        ProblemModel::new(orders, plan, machines).unwrap()
    }

    #[test]
    fn test_build_resolves_ids_and_sorts() {
        let m = model();
        let s = decode(&[2, 0, 3, 1], &[0; 4], &m);
        let r = ScheduleResult::build(&s, &m);

        let keys: Vec<(&str, &str)> = r
            .schedule
            .iter()
            .map(|row| (row.order_id.as_str(), row.stage.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("O1", "Dispensing"),
                ("O1", "Assembly"),
                ("O2", "Dispensing"),
                ("O2", "Assembly"),
            ]
        );
        // O2 dispensed first (1 h), then O1 (0.5 h)
        let o1 = r.rows_for_order("O1").next().unwrap();
        assert_eq!((o1.start, o1.finish), (3_600, 5_400));
        assert!((o1.finish_hours() - 1.5).abs() < 1e-12);
        assert_eq!(r.rows_for_machine("B1").len(), 2);
        assert_eq!(r.orders.len(), 2);
        assert!(r.orders.iter().all(|o| o.on_time));
    }

    #[test]
    fn test_rows_carry_maintenance_pauses() {
        // 20 h of assembly starting at 20 h on a 22 h machine
        let orders = vec![Order::new("J1", "P", 1, 5.0), Order::new("J2", "P", 1, 5.0)];
        let plan = ProcessPlan::new().with_entry(ProcessTime::new("Assembly", "BLU", 72_000.0));
        let m = ProblemModel::new(orders, plan, vec![Machine::new("M1", "BLU")]).unwrap();
        let r = ScheduleResult::build(&decode(&[0, 1], &[0, 0], &m), &m);

        let first = &r.schedule[0];
        assert_eq!(first.segments, vec![TimeWindow::new(0, 72_000)]);
        assert_eq!(first.paused_secs(), 0);

        let second = &r.schedule[1];
        assert_eq!(
            second.segments,
            vec![TimeWindow::new(72_000, 79_200), TimeWindow::new(86_400, 151_200)]
        );
        assert_eq!(second.paused_secs(), 7_200);
        assert!((second.finish_hours() - 42.0).abs() < 1e-12);
    }

    #[test]
    fn test_result_serializes() {
        let m = model();
        let r = ScheduleResult::build(&decode(&[0, 1, 2, 3], &[0; 4], &m), &m);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"total_weighted_tardiness\""));
        let back: ScheduleResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.schedule, r.schedule);
        assert_eq!(back.kpis.workload_by_machine, r.kpis.workload_by_machine);
    }
}
