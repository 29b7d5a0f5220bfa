//! Input validation for flow shop problems.
//!
//! Checks structural integrity of orders, the process plan and the
//! machine calendar before a [`ProblemModel`](crate::problem::ProblemModel)
//! is built. Detects:
//! - Duplicate IDs and duplicate plan entries
//! - Empty input tables
//! - Out-of-range quantities, due dates, standard times and yields
//! - Plan entries naming machine types no machine has
//! - Stages no machine can serve
//! - Operations that would run longer than [`MAX_OPERATION_SPAN_DAYS`]
//!
//! Every issue is collected; callers decide how many to report.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Machine, Order, ProcessPlan, MINUTES_PER_DAY};

/// Longest calendar span (days) a single operation may occupy on any
/// eligible machine. Decoded operations keep one working segment per day.
pub const MAX_OPERATION_SPAN_DAYS: f64 = 3_650.0;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Identifier of the offending record (order id, machine id, or
    /// `stage/machine_type` for plan entries).
    pub record: String,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two records share the same key.
    DuplicateId,
    /// An input table is empty.
    EmptyInput,
    /// Order quantity is zero.
    InvalidQuantity,
    /// Due date is negative or not finite.
    InvalidDueDate,
    /// Priority label is not P1, P3 or P4.
    InvalidPriority,
    /// Standard time is not a positive finite number.
    InvalidProcessTime,
    /// Yield outside (0, 1].
    InvalidYield,
    /// Daily availability exceeds one day.
    InvalidCapacity,
    /// Plan entry names a machine type no machine has.
    UnknownMachineType,
    /// A stage has no machine that can serve it.
    NoEligibleMachine,
    /// An operation would span more than [`MAX_OPERATION_SPAN_DAYS`].
    DurationTooLong,
}

impl ValidationError {
    /// Creates a validation error for a record.
    pub fn new(
        kind: ValidationErrorKind,
        record: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            record: record.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at '{}': {}", self.kind, self.record, self.message)
    }
}

/// Validates the input tables of a flow shop problem.
///
/// Checks:
/// 1. Order, machine and plan tables are non-empty
/// 2. No duplicate order IDs, machine IDs or (stage, machine type) entries
/// 3. Quantities ≥ 1 and due dates finite and ≥ 0
/// 4. Standard times finite and > 0, yields in (0, 1]
/// 5. Daily availability ≤ 1440 minutes
/// 6. Every plan machine type exists in the machine calendar
/// 7. Every stage has at least one machine
/// 8. No operation needs more than [`MAX_OPERATION_SPAN_DAYS`] of working
///    days on any machine that could run it
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    orders: &[Order],
    plan: &ProcessPlan,
    machines: &[Machine],
) -> ValidationResult {
    let mut errors = Vec::new();

    if orders.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyInput,
            "orders",
            "Order set is empty",
        ));
    }
    if plan.entries.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyInput,
            "process_plan",
            "Process plan is empty",
        ));
    }
    if machines.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyInput,
            "machines",
            "Machine calendar is empty",
        ));
    }

    // Orders
    let mut order_ids = HashSet::new();
    for order in orders {
        if !order_ids.insert(order.order_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                &order.order_id,
                format!("Duplicate order ID: {}", order.order_id),
            ));
        }
        if order.quantity == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidQuantity,
                &order.order_id,
                format!("Order '{}' has zero quantity", order.order_id),
            ));
        }
        if !order.due_date.is_finite() || order.due_date < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDueDate,
                &order.order_id,
                format!(
                    "Order '{}' has invalid due date {}",
                    order.order_id, order.due_date
                ),
            ));
        }
    }

    // Machines
    let mut machine_ids = HashSet::new();
    let mut machine_types = HashSet::new();
    for m in machines {
        if !machine_ids.insert(m.machine_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                &m.machine_id,
                format!("Duplicate machine ID: {}", m.machine_id),
            ));
        }
        if m.daily_available_minutes > MINUTES_PER_DAY {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCapacity,
                &m.machine_id,
                format!(
                    "Machine '{}' is available {} min/day (max {})",
                    m.machine_id, m.daily_available_minutes, MINUTES_PER_DAY
                ),
            ));
        }
        machine_types.insert(m.machine_type.as_str());
    }

    // Process plan
    let mut entry_keys = HashSet::new();
    for entry in &plan.entries {
        let record = format!("{}/{}", entry.stage, entry.machine_type);
        if !entry_keys.insert((entry.stage.as_str(), entry.machine_type.as_str())) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                &record,
                format!("Duplicate process plan entry: {record}"),
            ));
        }
        if !entry.seconds_per_unit.is_finite() || entry.seconds_per_unit <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidProcessTime,
                &record,
                format!("Standard time {} s/unit is not positive", entry.seconds_per_unit),
            ));
        }
        if !(entry.yield_fraction > 0.0 && entry.yield_fraction <= 1.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidYield,
                &record,
                format!("Yield {} outside (0, 1]", entry.yield_fraction),
            ));
        }
        if !machine_types.contains(entry.machine_type.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownMachineType,
                &record,
                format!("No machine of type '{}'", entry.machine_type),
            ));
        }
    }

    // Stage coverage
    for stage in plan.stages() {
        let served = plan
            .machine_types_for(&stage)
            .any(|t| machine_types.contains(t));
        if !served {
            errors.push(ValidationError::new(
                ValidationErrorKind::NoEligibleMachine,
                &stage,
                format!("Stage '{stage}' has no eligible machine"),
            ));
        }
    }

    // Operation span
    for order in orders {
        if let Some(message) = overlong_operation(order, plan, machines) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DurationTooLong,
                &order.order_id,
                message,
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// First (stage, machine) on which `order` would exceed the span limit.
///
/// Computed in floating point so huge inputs cannot overflow. Entries with
/// invalid times or yields are reported by their own checks.
fn overlong_operation(order: &Order, plan: &ProcessPlan, machines: &[Machine]) -> Option<String> {
    for entry in &plan.entries {
        let valid = entry.seconds_per_unit.is_finite()
            && entry.seconds_per_unit > 0.0
            && entry.yield_fraction > 0.0
            && entry.yield_fraction <= 1.0;
        if !valid {
            continue;
        }
        let work = entry.seconds_per_unit * f64::from(order.quantity) / entry.yield_fraction;
        for m in machines.iter().filter(|m| m.machine_type == entry.machine_type) {
            let per_day = f64::from(m.daily_available_minutes.min(MINUTES_PER_DAY)) * 60.0;
            if per_day <= 0.0 {
                continue;
            }
            let days = work / per_day;
            if days > MAX_OPERATION_SPAN_DAYS {
                return Some(format!(
                    "Order '{}' needs {days:.0} working days at stage '{}' on '{}' (max {MAX_OPERATION_SPAN_DAYS})",
                    order.order_id, entry.stage, m.machine_id
                ));
            }
        }
    }
    None
}
