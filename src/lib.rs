//! cgtbrain - Capital-gains-tax analysis engine
//!
//! The processing core of a CGT reporting tool: it takes the raw,
//! loosely-shaped responses returned by the upstream analysis API and
//! turns them into a canonical model that reports and downstream tools
//! can rely on.
//!
//! # Architecture
//!
//! The upstream API returns one of several structural variants (wrapped
//! JSON, markdown, verification failures, legacy shapes). Normalization
//! classifies each payload exactly once, then projects it into
//! [`NormalizedResponse`]:
//! - Shape detection is a priority-ordered predicate list
//! - Clarification requests take precedence over every display shape
//! - Extraction never fails; missing fields degrade to `None`/empty
//!
//! # Modules
//!
//! - `normalize`: Shape detection and canonical extraction
//! - `domain`: Data structures (AnalysisData, PropertyAnalysis, Citations)
//! - `calc`: Pure cost-base, ownership-day, and currency helpers
//! - `client`: Upstream API, follow-up, share, and email endpoints
//! - `report`: Markdown report rendering
//! - `store`: Local report catalog
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Analyze a timeline
//! cgtbrain analyze -i timeline.json
//!
//! # Inspect a saved API response
//! cgtbrain normalize -i response.json
//!
//! # Render a report
//! cgtbrain report -i response.json -o report.md
//! ```

pub mod calc;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod normalize;
pub mod report;
pub mod state;
pub mod store;

// Re-export main types at crate root for convenience
pub use domain::{AnalysisData, Citations, GapQuestion, PropertyAnalysis, SessionContext};
pub use normalize::{normalize, DisplayMode, LlmProvider, NormalizedResponse, ResponseShape};

// Follow-up chat plumbing
pub use client::{AnalysisBackend, FollowUpReply, HttpBackend};
