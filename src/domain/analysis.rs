//! Canonical analysis model extracted from upstream API responses.
//!
//! Every sub-list on [`PropertyAnalysis`] is independently optional:
//! an absent list means "section not shown", never an error.

use serde::{Deserialize, Serialize};

use crate::normalize::LlmProvider;

/// The canonical analysis extracted from any JSON-capable response shape.
///
/// Invariant: `properties` is non-empty whenever this was extracted from a
/// JSON shape; the shape predicates require at least one property to match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisData {
    /// Per-property analyses
    #[serde(default)]
    pub properties: Vec<PropertyAnalysis>,

    /// Free-text description of the analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Notes that apply to the whole portfolio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_notes: Option<String>,

    /// Number of properties analyzed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_properties: Option<u32>,

    /// When the analysis was produced (upstream-formatted date string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<String>,
}

/// One property's full analysis.
///
/// The legacy success shape uses `address` where newer shapes use
/// `property_address`; the alias folds both onto one canonical field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyAnalysis {
    /// Street address of the property
    #[serde(default, alias = "address", skip_serializing_if = "Option::is_none")]
    pub property_address: Option<String>,

    /// Acquisition facts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase: Option<TransactionFacts>,

    /// Disposal facts (absent while the property is still held)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale: Option<TransactionFacts>,

    /// Ownership-period breakdown (main residence, rental, vacant)
    #[serde(default)]
    pub ownership_periods: Vec<OwnershipPeriod>,

    /// Itemized cost-base lines
    #[serde(default)]
    pub cost_base_items: Vec<CostBaseItem>,

    /// Step-by-step calculation trace
    #[serde(default)]
    pub calculation_steps: Vec<CalculationStep>,

    /// Tax rules applied to this property
    #[serde(default)]
    pub applicable_rules: Vec<ApplicableRule>,

    /// Alternative scenarios the analysis considered
    #[serde(default)]
    pub what_if_scenarios: Vec<WhatIfScenario>,

    /// Warnings surfaced for this property
    #[serde(default)]
    pub warnings: Vec<String>,

    /// Additional notes
    #[serde(default)]
    pub notes: Vec<String>,

    /// Verification outcome for this property ("passed" / "failed")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<String>,

    /// One-line summary shown in status lists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_summary: Option<String>,
}

/// Purchase or sale facts for a property
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFacts {
    /// Settlement date (upstream-formatted string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Contract date, when it differs from settlement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_date: Option<String>,

    /// Transaction amount in dollars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// A contiguous period of ownership with one usage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnershipPeriod {
    /// Usage during this period (e.g. "main_residence", "rental", "vacant")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_type: Option<String>,

    /// Period start date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    /// Period end date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    /// Length in days as reported upstream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,

    /// Whether the main residence exemption applies to this period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_residence: Option<bool>,

    /// Exempt fraction of this period as a percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exemption_percentage: Option<f64>,

    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One line in the cost-base breakdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostBaseItem {
    /// Stable identifier (e.g. "stamp_duty", "legal_fees")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,

    /// Display label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Amount in dollars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    /// Cost-base element this item belongs to (1-5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<u8>,
}

/// A single step in the calculation trace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculationStep {
    /// Step label (e.g. "Cost base", "Discount applied")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Formula or working shown for this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Resulting amount in dollars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    /// Explanation of the step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A tax rule the analysis applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicableRule {
    /// Rule name (e.g. "Main residence exemption", "Six-year rule")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,

    /// Legislative reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// How the rule affected the calculation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

/// An alternative scenario considered by the analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhatIfScenario {
    /// Scenario name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,

    /// What changes under this scenario
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Estimated capital gain under this scenario
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_gain: Option<f64>,
}

/// Legislative and documentary sources backing the analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Citations {
    /// Individual source references
    #[serde(default)]
    pub references: Vec<SourceReference>,

    /// Summary of the rules the sources establish
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_summary: Option<String>,
}

/// One cited source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceReference {
    /// Document title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Source document identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,

    /// Page within the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Link to the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Session metadata used to enable the follow-up chat.
///
/// Absence of any field is not an error; a missing session id simply
/// disables follow-up questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Upstream session identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// The query that produced this analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_query: Option<String>,

    /// Canonical provider key for follow-up requests
    pub llm_provider: LlmProvider,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            session_id: None,
            initial_query: None,
            llm_provider: LlmProvider::default(),
        }
    }
}

impl SessionContext {
    /// Follow-up chat is only available when a session id is present
    pub fn follow_up_available(&self) -> bool {
        self.session_id.is_some()
    }
}

/// A clarification question about an unexplained timeline period
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GapQuestion {
    /// The question text
    pub question: String,

    /// Question category as reported upstream
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,

    /// The unexplained period
    #[serde(default)]
    pub period: GapPeriod,

    /// Addresses of the properties the gap affects
    #[serde(default)]
    pub properties_involved: Vec<String>,

    /// Suggested answers to choose from
    #[serde(default)]
    pub possible_answers: Vec<String>,
}

/// The date range of a timeline gap
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GapPeriod {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub days: i64,
}

/// A user's answer to a gap question, sent back with the re-analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapAnswer {
    pub question: String,
    pub answer: String,
    pub period: GapPeriod,
    pub properties_involved: Vec<String>,
}

/// Per-portfolio verification counts shown with clarification requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioSummary {
    #[serde(default)]
    pub total_properties: u32,
    #[serde(default)]
    pub properties_passed: u32,
    #[serde(default)]
    pub properties_failed: u32,
}
