//! Timeline event types consumed by the cost-base calculations.
//!
//! Field names follow the client timeline wire format (`costBases`,
//! `definitionId`), so saved timelines deserialize without remapping.

use serde::{Deserialize, Serialize};

/// Kind of timeline event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Property acquired
    Purchase,

    /// Capital improvement made
    Improvement,

    /// Property disposed of
    Sale,

    /// Owner moved in (main residence starts)
    MoveIn,

    /// Owner moved out
    MoveOut,

    /// Property first rented
    RentStart,

    /// Rental period ended
    RentEnd,

    /// Loan refinanced
    Refinance,

    /// Usage status changed without a transaction
    StatusChange,

    /// Owner started living in a rental they don't own
    LivingInRentalStart,

    /// Owner stopped living in that rental
    LivingInRentalEnd,

    /// Any unmodeled event kind (ignored by the cost-base math)
    #[serde(other)]
    Other,
}

/// A single line item attached to an event's cost base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBaseEntry {
    /// Stable identifier (e.g. "purchase_price", "stamp_duty")
    #[serde(rename = "definitionId")]
    pub definition_id: String,

    /// Amount in dollars
    pub amount: f64,

    /// Optional display label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One event on a property's timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Event identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Kind of event
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Event date (upstream-formatted string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Contract date when it differs from the event date
    #[serde(rename = "contractDate", skip_serializing_if = "Option::is_none")]
    pub contract_date: Option<String>,

    /// Scalar transaction amount. Upstream may record the price here or
    /// itemized in `cost_bases`; never both counted together.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    /// Itemized cost-base lines
    #[serde(rename = "costBases", default)]
    pub cost_bases: Vec<CostBaseEntry>,

    /// Division 43 (capital works) deductions claimed, sale events only
    #[serde(rename = "division43Deductions", skip_serializing_if = "Option::is_none")]
    pub division43_deductions: Option<f64>,
}

impl TimelineEvent {
    /// Create a bare event of the given kind
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: None,
            kind,
            date: None,
            contract_date: None,
            amount: None,
            cost_bases: Vec::new(),
            division43_deductions: None,
        }
    }

    /// Set the scalar amount
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Add an itemized cost-base line
    pub fn with_cost_base(mut self, definition_id: &str, amount: f64) -> Self {
        self.cost_bases.push(CostBaseEntry {
            definition_id: definition_id.to_string(),
            amount,
            description: None,
        });
        self
    }
}
