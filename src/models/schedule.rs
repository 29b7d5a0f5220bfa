//! Schedule (solution) model.
//!
//! A schedule places every operation on one machine for one time span.
//! Assignments refer to orders, stages and machines by index into the
//! [`ProblemModel`]; identifiers are resolved when a
//! [`ScheduleResult`](crate::scheduler::ScheduleResult) is built.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};

use super::TimeWindow;
use crate::problem::ProblemModel;

/// A complete schedule (decoded chromosome).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Operation assignments, in decoding order.
    pub assignments: Vec<Assignment>,
}

/// One operation placed on one machine.
///
/// `start`/`finish` bound the whole span; `segments` are the intervals in
/// which the machine actually works (the span minus maintenance pauses).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Global operation index (`order * stages + stage`).
    pub op: usize,
    /// Order index.
    pub order: usize,
    /// Stage index.
    pub stage: usize,
    /// Machine index.
    pub machine: usize,
    /// Start time (s).
    pub start: i64,
    /// Finish time (s).
    pub finish: i64,
    /// Working intervals; never overlap a maintenance window.
    pub segments: Vec<TimeWindow>,
}

/// A broken schedule invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Global operation index concerned.
    pub op: usize,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule invariant violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Stage k+1 started before stage k finished.
    PrecedenceViolation,
    /// Two operations overlap on one machine.
    MachineOverlap,
    /// Work scheduled inside a maintenance window.
    MaintenanceOverlap,
    /// Machine not eligible for the operation's stage.
    IneligibleMachine,
    /// Operation missing or scheduled twice.
    CoverageViolation,
}

impl Assignment {
    /// Span (finish - start) in seconds, maintenance pauses included.
    #[inline]
    pub fn span(&self) -> i64 {
        self.finish - self.start
    }

    /// Working seconds (span minus pauses).
    pub fn busy_secs(&self) -> i64 {
        self.segments.iter().map(TimeWindow::duration).sum()
    }
}

impl Violation {
    fn new(violation_type: ViolationType, op: usize, message: impl Into<String>) -> Self {
        Self {
            violation_type,
            op,
            message: message.into(),
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty schedule with room for `n` assignments.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            assignments: Vec::with_capacity(n),
        }
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Makespan: latest finish across all assignments (s).
    pub fn makespan(&self) -> i64 {
        self.assignments.iter().map(|a| a.finish).max().unwrap_or(0)
    }

    /// Finds the assignment of an operation.
    pub fn assignment_for_op(&self, op: usize) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.op == op)
    }

    /// Returns all assignments of an order.
    pub fn assignments_for_order(&self, order: usize) -> Vec<&Assignment> {
        self.assignments.iter().filter(|a| a.order == order).collect()
    }

    /// Returns all assignments on a machine.
    pub fn assignments_for_machine(&self, machine: usize) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.machine == machine)
            .collect()
    }

    /// Completion time of every order (finish of its last operation), indexed by order.
    pub fn order_completions(&self, order_count: usize) -> Vec<i64> {
        let mut completion = vec![0i64; order_count];
        for a in &self.assignments {
            if let Some(c) = completion.get_mut(a.order) {
                *c = (*c).max(a.finish);
            }
        }
        completion
    }

    /// Working seconds per machine, indexed by machine.
    pub fn busy_by_machine(&self, machine_count: usize) -> Vec<i64> {
        let mut busy = vec![0i64; machine_count];
        for a in &self.assignments {
            if let Some(b) = busy.get_mut(a.machine) {
                *b += a.busy_secs();
            }
        }
        busy
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Checks every schedule invariant against the model.
    ///
    /// Returns an empty vector for a valid schedule: each operation exactly
    /// once on an eligible machine, stage precedence per order, no overlap
    /// per machine, and no work inside a maintenance window.
    pub fn violations(&self, model: &ProblemModel) -> Vec<Violation> {
        let mut violations = Vec::new();
        let n = model.operation_count();
        let mut by_op: Vec<Option<&Assignment>> = vec![None; n];

        for a in &self.assignments {
            match by_op.get_mut(a.op) {
                Some(slot) if slot.is_none() => *slot = Some(a),
                Some(_) => violations.push(Violation::new(
                    ViolationType::CoverageViolation,
                    a.op,
                    format!("operation {} scheduled twice", a.op),
                )),
                None => violations.push(Violation::new(
                    ViolationType::CoverageViolation,
                    a.op,
                    format!("operation {} out of range", a.op),
                )),
            }

            if !model.eligible_machines(a.stage).contains(&a.machine) {
                violations.push(Violation::new(
                    ViolationType::IneligibleMachine,
                    a.op,
                    format!("machine {} not eligible for stage {}", a.machine, a.stage),
                ));
            }

            if a.machine >= model.machine_count() {
                continue;
            }
            let calendar = model.calendar(a.machine);
            let in_maintenance = (!calendar.is_working_time(a.start) && a.busy_secs() > 0)
                || a.segments.iter().any(|s| {
                    s.duration() > 0
                        && (!calendar.is_working_time(s.start)
                            || calendar.available_time_in_range(s.start, s.end) != s.duration())
                });
            if in_maintenance {
                violations.push(Violation::new(
                    ViolationType::MaintenanceOverlap,
                    a.op,
                    format!("operation {} works during maintenance", a.op),
                ));
            }
        }

        for (op, slot) in by_op.iter().enumerate() {
            if slot.is_none() {
                violations.push(Violation::new(
                    ViolationType::CoverageViolation,
                    op,
                    format!("operation {op} not scheduled"),
                ));
            }
        }

        let stages = model.stage_count();
        for order in 0..model.order_count() {
            for stage in 1..stages {
                let prev = by_op[order * stages + stage - 1];
                let next = by_op[order * stages + stage];
                if let (Some(p), Some(q)) = (prev, next) {
                    if q.start < p.finish {
                        violations.push(Violation::new(
                            ViolationType::PrecedenceViolation,
                            q.op,
                            format!(
                                "stage {} of order {} starts at {} before stage {} finishes at {}",
                                stage,
                                order,
                                q.start,
                                stage - 1,
                                p.finish
                            ),
                        ));
                    }
                }
            }
        }

        for machine in 0..model.machine_count() {
            let mut spans: Vec<&Assignment> = self.assignments_for_machine(machine);
            spans.sort_by_key(|a| (a.start, a.finish));
            for pair in spans.windows(2) {
                if pair[1].start < pair[0].finish {
                    violations.push(Violation::new(
                        ViolationType::MachineOverlap,
                        pair[1].op,
                        format!(
                            "operations {} and {} overlap on machine {}",
                            pair[0].op, pair[1].op, machine
                        ),
                    ));
                }
            }
        }

        violations
    }
}
