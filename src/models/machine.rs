//! Machine model.
//!
//! A machine has a type (which decides the stages it may serve) and a
//! daily availability from which its [`DailyCalendar`] is derived.

use serde::{Deserialize, Serialize};

use super::calendar::{DailyCalendar, DEFAULT_DAILY_AVAILABLE_MINUTES};

/// A machine on the shop floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// Unique machine identifier.
    pub machine_id: String,
    /// Machine type, matched against process plan entries.
    pub machine_type: String,
    /// Working minutes per day; the rest of the day is maintenance.
    #[serde(default = "default_daily_minutes")]
    pub daily_available_minutes: u32,
}

/// The machines available to the shop.
pub type MachineCalendar = Vec<Machine>;

fn default_daily_minutes() -> u32 {
    DEFAULT_DAILY_AVAILABLE_MINUTES
}

impl Machine {
    /// Creates a machine with the default 22 h daily availability.
    pub fn new(machine_id: impl Into<String>, machine_type: impl Into<String>) -> Self {
        Self {
            machine_id: machine_id.into(),
            machine_type: machine_type.into(),
            daily_available_minutes: DEFAULT_DAILY_AVAILABLE_MINUTES,
        }
    }

    /// Sets the daily availability.
    pub fn with_daily_available_minutes(mut self, minutes: u32) -> Self {
        self.daily_available_minutes = minutes;
        self
    }

    /// Availability calendar of this machine.
    pub fn calendar(&self) -> DailyCalendar {
        DailyCalendar::new(self.daily_available_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_defaults() {
        let m = Machine::new("EQ-01", "DISP");
        assert_eq!(m.daily_available_minutes, 1320);
        assert_eq!(m.calendar().maintenance_secs_per_day(), 7200);
    }

    #[test]
    fn test_machine_deserialize_default_minutes() {
        let m: Machine =
            serde_json::from_str(r#"{"machine_id":"EQ-02","machine_type":"BLU"}"#).unwrap();
        assert_eq!(m.daily_available_minutes, 1320);
    }
}
