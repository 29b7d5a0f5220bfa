//! Flow shop domain models.
//!
//! Provides the core data types for representing the scheduling problem
//! (orders, process plan, machines and their calendars) and its solution.
//!
//! # Domain Mappings
//!
//! | ffs-schedule | Shop floor | Scheduling theory |
//! |--------------|------------|-------------------|
//! | Order | Production order / lot | Job |
//! | ProcessPlan stage | Process step | Stage |
//! | Machine | Equipment | Parallel machine |
//! | Assignment | Dispatched lot | Operation |
//! | Schedule | Production plan | Schedule |

mod calendar;
mod machine;
mod order;
mod process;
mod schedule;

pub use calendar::{
    DailyCalendar, TimeWindow, DEFAULT_DAILY_AVAILABLE_MINUTES, MINUTES_PER_DAY, SECONDS_PER_DAY,
};
pub use machine::{Machine, MachineCalendar};
pub use order::{Order, OrderSet, Priority};
pub use process::{ProcessPlan, ProcessTime};
pub use schedule::{Assignment, Schedule, Violation, ViolationType};
