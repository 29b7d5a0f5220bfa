//! Production order model.
//!
//! An order is a quantity of one product type that must pass every stage
//! of the flow shop before its due date.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, ValidationErrorKind};

/// Order priority class.
///
/// Each class carries a fixed tardiness weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Urgent (weight 1.2).
    P1,
    /// Normal (weight 1.0).
    P3,
    /// Low (weight 0.8).
    P4,
}

impl Priority {
    /// Tardiness weight of this class.
    pub fn weight(self) -> f64 {
        match self {
            Priority::P1 => 1.2,
            Priority::P3 => 1.0,
            Priority::P4 => 0.8,
        }
    }

    /// Canonical label.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::P1 => "P1",
            Priority::P3 => "P3",
            Priority::P4 => "P4",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Priority::P1),
            "P3" => Ok(Priority::P3),
            "P4" => Ok(Priority::P4),
            other => Err(format!("unrecognized priority class '{other}'")),
        }
    }
}

/// A production order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub order_id: String,
    /// Product type (informational).
    pub product_type: String,
    /// Number of units to produce.
    pub quantity: u32,
    /// Due date in days after the scheduling epoch.
    pub due_date: f64,
    /// Priority class.
    pub priority: Priority,
}

/// The set of orders to schedule.
pub type OrderSet = Vec<Order>;

impl Order {
    /// Creates an order with normal (P3) priority.
    pub fn new(
        order_id: impl Into<String>,
        product_type: impl Into<String>,
        quantity: u32,
        due_date: f64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            product_type: product_type.into(),
            quantity,
            due_date,
            priority: Priority::P3,
        }
    }

    /// Builds an order from a raw tabular record.
    ///
    /// Fails with [`ValidationErrorKind::InvalidPriority`] naming the order
    /// when the priority label is not P1, P3 or P4.
    pub fn from_record(
        order_id: impl Into<String>,
        product_type: impl Into<String>,
        quantity: u32,
        due_date: f64,
        priority: &str,
    ) -> Result<Self, ValidationError> {
        let order_id = order_id.into();
        let priority = priority.parse::<Priority>().map_err(|msg| {
            ValidationError::new(ValidationErrorKind::InvalidPriority, order_id.clone(), msg)
        })?;
        Ok(Self::new(order_id, product_type, quantity, due_date).with_priority(priority))
    }

    /// Sets the priority class.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Tardiness weight derived from the priority class.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.priority.weight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_weights() {
        assert!((Priority::P1.weight() - 1.2).abs() < 1e-12);
        assert!((Priority::P3.weight() - 1.0).abs() < 1e-12);
        assert!((Priority::P4.weight() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("p1".parse::<Priority>(), Ok(Priority::P1));
        assert_eq!(" P4 ".parse::<Priority>(), Ok(Priority::P4));
        assert!("P2".parse::<Priority>().is_err());
    }

    #[test]
    fn test_order_builder() {
        let order = Order::new("ORD-1", "LCM-7", 500, 3.0).with_priority(Priority::P1);
        assert_eq!(order.order_id, "ORD-1");
        assert_eq!(order.quantity, 500);
        assert!((order.weight() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_from_record_rejects_unknown_priority() {
        let err = Order::from_record("ORD-9", "LCM-7", 10, 1.0, "P2").unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidPriority);
        assert_eq!(err.record, "ORD-9");
    }

    #[test]
    fn test_order_serde() {
        let order = Order::new("ORD-1", "LCM-7", 5, 2.5).with_priority(Priority::P4);
        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"P4\""));
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
    }
}
