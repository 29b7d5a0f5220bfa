//! Chromosome decoder.
//!
//! Turns an (OS, MS) pair into a feasible timed [`Schedule`].
//!
//! # Algorithm
//!
//! 1. **Precedence repair**: OS is read left to right and only the order of
//!    each entry matters. The k-th entry belonging to order *i* denotes
//!    stage *k* of order *i*, so every permutation is precedence-feasible.
//! 2. **Machine**: `MS[op]` indexes the operation's eligible machine list
//!    (taken modulo its length).
//! 3. **Timing**: start = max(order ready, machine cursor), moved past
//!    maintenance; work is laid out over the machine calendar, pausing at
//!    each maintenance window.
//!
//! The result is a semi-active schedule: operations are appended to the
//! machine cursor, never inserted into earlier idle gaps.
//!
//! # Reference
//! Bierwirth (1995), "A generalized permutation approach to JSSP";
//! Zhang et al. (2011), "An effective GA for the flexible JSSP"

use std::fmt;

use crate::models::{Assignment, Schedule};
use crate::problem::ProblemModel;

/// One eligible machine evaluated for the next operation.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineCandidate<'a> {
    /// Position in the stage's eligible list (the MS gene value).
    pub eligible_index: usize,
    /// Machine index.
    pub machine: usize,
    /// Machine ID (tie-breaker).
    pub machine_id: &'a str,
    /// Earliest feasible start on this machine (s).
    pub earliest_start: i64,
    /// Effective duration on this machine (s).
    pub duration: i64,
    /// Working seconds already committed to this machine (s).
    pub running_load: i64,
}

/// Picks a machine among the candidates of one operation.
///
/// Returns the position in `candidates` (always non-empty).
pub trait MachineChooser: Send + Sync + fmt::Debug {
    /// Chooses one candidate.
    fn choose(&self, candidates: &[MachineCandidate<'_>]) -> usize;
}

/// Least running load among machines that can start soon.
///
/// Machines whose earliest start is within `tolerance_secs` of the best
/// earliest start compete on running load; ties go to the smaller
/// machine ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeastLoaded {
    /// Start-time tolerance (s).
    pub tolerance_secs: i64,
}

impl Default for LeastLoaded {
    fn default() -> Self {
        Self {
            tolerance_secs: 1_800,
        }
    }
}

impl MachineChooser for LeastLoaded {
    fn choose(&self, candidates: &[MachineCandidate<'_>]) -> usize {
        let best_start = candidates
            .iter()
            .map(|c| c.earliest_start)
            .min()
            .unwrap_or(0);
        candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.earliest_start - best_start <= self.tolerance_secs)
            .min_by(|(_, a), (_, b)| {
                a.running_load
                    .cmp(&b.running_load)
                    .then_with(|| a.machine_id.cmp(b.machine_id))
            })
            .map_or(0, |(i, _)| i)
    }
}

/// Earliest finish, ties by machine ID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EarliestFinish;

impl MachineChooser for EarliestFinish {
    fn choose(&self, candidates: &[MachineCandidate<'_>]) -> usize {
        candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.earliest_start + a.duration)
                    .cmp(&(b.earliest_start + b.duration))
                    .then_with(|| a.machine_id.cmp(b.machine_id))
            })
            .map_or(0, |(i, _)| i)
    }
}

/// Running state of one decode pass.
struct DecodeState {
    machine_cursor: Vec<i64>,
    machine_load: Vec<i64>,
    order_ready: Vec<i64>,
    next_stage: Vec<usize>,
}

impl DecodeState {
    fn new(model: &ProblemModel) -> Self {
        Self {
            machine_cursor: vec![0; model.machine_count()],
            machine_load: vec![0; model.machine_count()],
            order_ready: vec![0; model.order_count()],
            next_stage: vec![0; model.order_count()],
        }
    }

    /// Maps an OS gene to the operation it denotes, advancing the order's
    /// stage counter. `None` once the order has used all its stages.
    fn repair(&mut self, gene: usize, model: &ProblemModel) -> Option<usize> {
        let order = gene / model.stage_count().max(1);
        let stage = *self.next_stage.get(order)?;
        if stage >= model.stage_count() {
            return None;
        }
        self.next_stage[order] += 1;
        Some(model.op_index(order, stage))
    }

    fn candidates<'m>(&self, op: usize, model: &'m ProblemModel) -> Vec<MachineCandidate<'m>> {
        let operation = model.operation(op);
        let ready = self.order_ready[operation.order];
        model
            .eligible_machines(operation.stage)
            .iter()
            .enumerate()
            .map(|(k, &m)| {
                let from = ready.max(self.machine_cursor[m]);
                MachineCandidate {
                    eligible_index: k,
                    machine: m,
                    machine_id: model.machines()[m].machine_id.as_str(),
                    earliest_start: model.calendar(m).next_available_time(from).unwrap_or(from),
                    duration: model.duration_at(op, k),
                    running_load: self.machine_load[m],
                }
            })
            .collect()
    }

    fn place(&mut self, op: usize, k: usize, model: &ProblemModel) -> Option<Assignment> {
        let operation = model.operation(op);
        let machine = *model.eligible_machines(operation.stage).get(k)?;
        let from = self.order_ready[operation.order].max(self.machine_cursor[machine]);
        let segments = model
            .calendar(machine)
            .lay_out(from, model.duration_at(op, k))?;
        let start = segments.first()?.start;
        let finish = segments.last()?.end;

        let assignment = Assignment {
            op,
            order: operation.order,
            stage: operation.stage,
            machine,
            start,
            finish,
            segments,
        };
        self.machine_cursor[machine] = finish;
        self.machine_load[machine] += assignment.busy_secs();
        self.order_ready[operation.order] = finish;
        Some(assignment)
    }
}

/// Eligible position selected by an MS gene.
#[inline]
fn ms_gene(ms: &[usize], op: usize, eligible: usize) -> usize {
    ms.get(op).copied().unwrap_or(0) % eligible.max(1)
}

/// Decodes a chromosome into a feasible schedule.
///
/// Deterministic and side-effect free. OS entries beyond an order's stage
/// count are ignored; MS genes are taken modulo the eligible count.
pub fn decode(os: &[usize], ms: &[usize], model: &ProblemModel) -> Schedule {
    let mut state = DecodeState::new(model);
    let mut schedule = Schedule::with_capacity(os.len());

    for &gene in os {
        let Some(op) = state.repair(gene, model) else {
            continue;
        };
        let stage = model.operation(op).stage;
        let k = ms_gene(ms, op, model.eligible_machines(stage).len());
        if let Some(assignment) = state.place(op, k, model) {
            schedule.add_assignment(assignment);
        }
    }
    schedule
}

/// Builds an MS vector for `os` by letting `chooser` pick each
/// operation's machine during decoding.
pub fn decode_balanced(os: &[usize], model: &ProblemModel, chooser: &dyn MachineChooser) -> Vec<usize> {
    let mut state = DecodeState::new(model);
    let mut ms = vec![0; model.operation_count()];

    for &gene in os {
        let Some(op) = state.repair(gene, model) else {
            continue;
        };
        let candidates = state.candidates(op, model);
        if candidates.is_empty() {
            continue;
        }
        let choice = chooser.choose(&candidates).min(candidates.len() - 1);
        let k = candidates[choice].eligible_index;
        ms[op] = k;
        state.place(op, k, model);
    }
    ms
}

/// Replays the decode up to `target` and reports every eligible machine
/// for it (earliest start and running load at that point).
///
/// Empty if `target` never comes up in `os`.
pub fn candidates_at<'m>(
    os: &[usize],
    ms: &[usize],
    model: &'m ProblemModel,
    target: usize,
) -> Vec<MachineCandidate<'m>> {
    let mut state = DecodeState::new(model);

    for &gene in os {
        let Some(op) = state.repair(gene, model) else {
            continue;
        };
        if op == target {
            return state.candidates(op, model);
        }
        let stage = model.operation(op).stage;
        let k = ms_gene(ms, op, model.eligible_machines(stage).len());
        state.place(op, k, model);
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Machine, Order, ProcessPlan, ProcessTime, TimeWindow, SECONDS_PER_DAY};

    const HOUR: i64 = 3_600;

    /// One stage, two machines, 1 h per unit.
    fn single_stage() -> ProblemModel {
        let orders = vec![
            Order::new("A", "P", 4, 10.0),
            Order::new("B", "P", 2, 10.0),
            Order::new("C", "P", 6, 10.0),
        ];
        let plan = ProcessPlan::new().with_entry(ProcessTime::new("Assembly", "BLU", 3_600.0));
        let machines = vec![Machine::new("M1", "BLU"), Machine::new("M2", "BLU")];
        ProblemModel::new(orders, plan, machines).unwrap()
    }

    /// Two stages, two machines each.
    fn two_stage() -> ProblemModel {
        let orders = vec![
            Order::new("O1", "P", 1, 1.0),
            Order::new("O2", "P", 2, 1.0),
        ];
        let plan = ProcessPlan::new()
            .with_entry(ProcessTime::new("Dispensing", "DISP", 600.0))
            .with_entry(ProcessTime::new("Assembly", "BLU", 1_200.0));
        let machines = vec![
            Machine::new("D1", "DISP"),
            Machine::new("D2", "DISP"),
            Machine::new("B1", "BLU"),
            Machine::new("B2", "BLU"),
        ];
        ProblemModel::new(orders, plan, machines).unwrap()
    }

    #[test]
    fn test_short_job_first_when_encoded_first() {
        let model = single_stage();
        // B first on M1, then A on M2, then C on M1
        let s = decode(&[1, 0, 2], &[1, 0, 0], &model);
        assert!(s.violations(&model).is_empty());

        let b = s.assignment_for_op(1).unwrap();
        assert_eq!((b.machine, b.start, b.finish), (0, 0, 2 * HOUR));
        let a = s.assignment_for_op(0).unwrap();
        assert_eq!((a.machine, a.start, a.finish), (1, 0, 4 * HOUR));
        let c = s.assignment_for_op(2).unwrap();
        assert_eq!((c.machine, c.start, c.finish), (0, 2 * HOUR, 8 * HOUR));
    }

    #[test]
    fn test_precedence_repair_any_permutation() {
        let model = two_stage();
        // op 1 (O1/Assembly) listed before op 0: treated as O1's first stage
        let s = decode(&[1, 3, 0, 2], &[0, 0, 1, 1], &model);
        assert!(s.violations(&model).is_empty());
        assert_eq!(s.assignment_count(), 4);

        let first = &s.assignments[0];
        assert_eq!((first.order, first.stage), (0, 0));
        let o1_asm = s.assignment_for_op(1).unwrap();
        let o1_disp = s.assignment_for_op(0).unwrap();
        assert!(o1_asm.start >= o1_disp.finish);
    }

    #[test]
    fn test_ms_gene_wraps() {
        let model = single_stage();
        let s = decode(&[0, 1, 2], &[2, 3, 4], &model);
        let machines: Vec<usize> = s.assignments.iter().map(|a| a.machine).collect();
        assert_eq!(machines, vec![0, 1, 0]);
        assert!(s.violations(&model).is_empty());
    }

    #[test]
    fn test_yield_extension_crosses_maintenance() {
        let orders = vec![Order::new("J1", "P", 1, 5.0), Order::new("J2", "P", 1, 5.0)];
        let plan = ProcessPlan::new()
            .with_entry(ProcessTime::new("Assembly", "BLU", 36_000.0).with_yield(0.5));
        let machines = vec![Machine::new("M1", "BLU")];
        let model = ProblemModel::new(orders, plan, machines).unwrap();

        let s = decode(&[0, 1], &[0, 0], &model);
        let first = s.assignment_for_op(0).unwrap();
        assert_eq!((first.start, first.finish), (0, 20 * HOUR));

        let second = s.assignment_for_op(1).unwrap();
        assert_eq!(second.start, 20 * HOUR);
        assert_eq!(second.finish, 42 * HOUR);
        assert_eq!(
            second.segments,
            vec![
                TimeWindow::new(20 * HOUR, 22 * HOUR),
                TimeWindow::new(SECONDS_PER_DAY, 42 * HOUR),
            ]
        );
        assert_eq!(second.busy_secs(), 20 * HOUR);
        assert!(s.violations(&model).is_empty());
    }

    #[test]
    fn test_random_chromosomes_decode_feasibly() {
        use crate::ga::Chromosome;
        use rand::rngs::SmallRng;
        use rand::SeedableRng;

        let orders = (0..6)
            .map(|i| Order::new(format!("O{i}"), "P", 3 + i * 4, 1.0 + f64::from(i) * 0.5))
            .collect();
        let plan = ProcessPlan::new()
            .with_entry(ProcessTime::new("COG", "BOND", 2_400.0))
            .with_entry(ProcessTime::new("COG", "BOND2", 1_800.0).with_yield(0.9))
            .with_entry(ProcessTime::new("Dispensing", "DISP", 3_000.0))
            .with_entry(ProcessTime::new("Assembly", "BLU", 4_500.0).with_yield(0.95));
        let machines = vec![
            Machine::new("B1", "BOND").with_daily_available_minutes(480),
            Machine::new("B2", "BOND2"),
            Machine::new("D1", "DISP").with_daily_available_minutes(1_440),
            Machine::new("D2", "DISP").with_daily_available_minutes(600),
            Machine::new("A1", "BLU").with_daily_available_minutes(1_000),
        ];
        let model = ProblemModel::new(orders, plan, machines).unwrap();

        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            let c = Chromosome::random(&model, &mut rng);
            let s = decode(&c.os, &c.ms, &model);
            assert_eq!(s.assignment_count(), model.operation_count());
            let violations = s.violations(&model);
            assert!(violations.is_empty(), "{violations:?}");
        }
    }

    #[test]
    fn test_decode_is_deterministic() {
        let model = two_stage();
        let os = [2, 0, 3, 1];
        let ms = [1, 0, 0, 1];
        assert_eq!(decode(&os, &ms, &model), decode(&os, &ms, &model));
    }

    #[test]
    fn test_least_loaded_chooser() {
        let c = |k: usize, id: &'static str, start: i64, load: i64| MachineCandidate {
            eligible_index: k,
            machine: k,
            machine_id: id,
            earliest_start: start,
            duration: 100,
            running_load: load,
        };
        let chooser = LeastLoaded { tolerance_secs: 60 };
        // M2 starts within tolerance and carries less load
        assert_eq!(chooser.choose(&[c(0, "M1", 0, 500), c(1, "M2", 50, 100)]), 1);
        // M2 too late
        assert_eq!(chooser.choose(&[c(0, "M1", 0, 500), c(1, "M2", 61, 100)]), 0);
        // tie on load goes to the smaller ID
        assert_eq!(chooser.choose(&[c(0, "M9", 0, 100), c(1, "M2", 0, 100)]), 1);
    }

    #[test]
    fn test_decode_balanced_spreads_load() {
        let model = single_stage();
        let ms = decode_balanced(&[0, 1, 2], &model, &LeastLoaded::default());
        assert_eq!(ms, vec![0, 1, 1]);
        let s = decode(&[0, 1, 2], &ms, &model);
        assert!(s.violations(&model).is_empty());
        assert_eq!(s.makespan(), 8 * HOUR);
    }

    #[test]
    fn test_candidates_at_reports_state_before_target() {
        let model = single_stage();
        let candidates = candidates_at(&[0, 1, 2], &[0, 0, 0], &model, 2);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].earliest_start, 6 * HOUR);
        assert_eq!(candidates[0].running_load, 6 * HOUR);
        assert_eq!(candidates[1].earliest_start, 0);
        assert_eq!(candidates[1].running_load, 0);
        assert!(candidates_at(&[0, 1], &[0, 0], &model, 2).is_empty());
    }
}
