//! Process plan: standard times and yields per (stage, machine type).
//!
//! The order in which stages first appear in the plan is the routing
//! order every order follows.

use serde::{Deserialize, Serialize};

/// Standard time and yield of one stage on one machine type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessTime {
    /// Stage name.
    pub stage: String,
    /// Eligible machine type for this stage.
    pub machine_type: String,
    /// Standard processing time per unit (s).
    pub seconds_per_unit: f64,
    /// Fraction of good units, in (0, 1].
    pub yield_fraction: f64,
}

impl ProcessTime {
    /// Creates an entry with yield 1.0.
    pub fn new(
        stage: impl Into<String>,
        machine_type: impl Into<String>,
        seconds_per_unit: f64,
    ) -> Self {
        Self {
            stage: stage.into(),
            machine_type: machine_type.into(),
            seconds_per_unit,
            yield_fraction: 1.0,
        }
    }

    /// Sets the yield fraction.
    pub fn with_yield(mut self, yield_fraction: f64) -> Self {
        self.yield_fraction = yield_fraction;
        self
    }

    /// Effective processing time for `quantity` units (s).
    ///
    /// Yield losses are reworked, so the nominal time is divided by the
    /// yield. Rounded up to whole seconds.
    pub fn effective_secs(&self, quantity: u32) -> i64 {
        let nominal = self.seconds_per_unit * f64::from(quantity);
        (nominal / self.yield_fraction).ceil() as i64
    }
}

/// Mapping (stage, machine type) → [`ProcessTime`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessPlan {
    /// Plan entries, in routing order of first stage appearance.
    pub entries: Vec<ProcessTime>,
}

impl ProcessPlan {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn with_entry(mut self, entry: ProcessTime) -> Self {
        self.entries.push(entry);
        self
    }

    /// Stage names in routing order.
    pub fn stages(&self) -> Vec<String> {
        let mut stages: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !stages.contains(&entry.stage) {
                stages.push(entry.stage.clone());
            }
        }
        stages
    }

    /// Looks up the entry for a (stage, machine type) pair.
    pub fn get(&self, stage: &str, machine_type: &str) -> Option<&ProcessTime> {
        self.entries
            .iter()
            .find(|e| e.stage == stage && e.machine_type == machine_type)
    }

    /// Machine types eligible for a stage.
    pub fn machine_types_for<'a>(&'a self, stage: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.stage == stage)
            .map(|e| e.machine_type.as_str())
    }
}
