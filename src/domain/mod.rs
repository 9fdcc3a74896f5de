//! Data structures for the CGT analysis model.
//!
//! All entities are immutable value objects deserialized from upstream
//! payloads. They are constructed fresh on each normalization pass; there
//! is no mutation or caching.

pub mod analysis;
pub mod timeline;

pub use analysis::{
    AnalysisData, ApplicableRule, CalculationStep, Citations, CostBaseItem, GapAnswer,
    GapPeriod, GapQuestion, OwnershipPeriod, PortfolioSummary, PropertyAnalysis,
    SessionContext, SourceReference, TransactionFacts, WhatIfScenario,
};
pub use timeline::{CostBaseEntry, EventKind, TimelineEvent};
