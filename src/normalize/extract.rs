//! Canonical extraction from a classified response.
//!
//! Every field is pulled through an ordered list of candidate paths with
//! first-defined-wins semantics. The redundant lookup is deliberate: the
//! upstream shape is not guaranteed consistent between fields within one
//! response (a double-wrapped payload may still carry `sources` at the
//! top level).

use serde_json::Value;
use tracing::debug;

use crate::domain::{
    AnalysisData, Citations, GapQuestion, PortfolioSummary, SessionContext, SourceReference,
};
use crate::normalize::provider::LlmProvider;
use crate::normalize::shape::{self, at, ResponseShape};

/// How downstream renderers should present the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Structured per-property sections from the canonical model
    JsonSections,

    /// Markdown body (also the fallback for unrecognized payloads)
    Markdown,
}

/// The canonical projection of one raw API response.
///
/// Constructed fresh per response; exists only for the lifetime of one
/// display pass.
#[derive(Debug, Clone)]
pub struct NormalizedResponse {
    /// Detected structural variant
    pub shape: ResponseShape,

    /// Selected display mode
    pub mode: DisplayMode,

    /// Canonical analysis, when a JSON-capable shape carried one
    pub analysis: Option<AnalysisData>,

    /// Source citations, wherever they were found
    pub citations: Option<Citations>,

    /// Session metadata for the follow-up chat
    pub session: SessionContext,

    /// Clarification questions (verification-failed path only)
    pub gap_questions: Vec<GapQuestion>,

    /// Portfolio verification counts, when reported
    pub portfolio: Option<PortfolioSummary>,

    /// Markdown body for the markdown shapes
    pub markdown: Option<String>,

    /// The original payload, kept for raw display of unknown shapes
    pub raw: Value,
}

impl NormalizedResponse {
    /// True when there was no response at all (null payload). Renderers
    /// show a distinct "no data" display instead of extracting.
    pub fn is_missing(&self) -> bool {
        self.raw.is_null()
    }

    /// Number of properties in the canonical analysis
    pub fn property_count(&self) -> usize {
        self.analysis
            .as_ref()
            .map(|a| a.properties.len())
            .unwrap_or(0)
    }

    /// Whether the response is asking for clarification
    pub fn needs_clarification(&self) -> bool {
        self.shape == ResponseShape::VerificationFailed
    }
}

/// Candidate locations for the structured analysis object, deepest first
/// per shape.
fn analysis_value<'a>(response: &'a Value, shape: ResponseShape) -> Option<&'a Value> {
    match shape {
        ResponseShape::DoubleWrappedJson => at(response, &["data", "data"]),
        ResponseShape::WrappedJson => at(response, &["data"]),
        ResponseShape::DirectJson | ResponseShape::LegacySuccess => Some(response),
        ResponseShape::VerificationFailed => {
            // Clarification payloads may nest the property list one level
            // down or carry it at the root
            let inner = at(response, &["data"]).filter(|v| v.get("properties").is_some());
            inner.or(Some(response))
        }
        ResponseShape::NewMarkdown | ResponseShape::LegacyMarkdown | ResponseShape::Unknown => {
            None
        }
    }
}

/// First defined value for `key` across the standard lookup chain:
/// `response.key`, `response.data.key`, `response.data.data.key`, then
/// the analysis object itself.
fn first_defined<'a>(
    response: &'a Value,
    analysis: Option<&'a Value>,
    key: &str,
) -> Option<&'a Value> {
    let candidates = [
        at(response, &[key]),
        at(response, &["data", key]),
        at(response, &["data", "data", key]),
        analysis.and_then(|a| a.get(key)),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.is_null())
}

/// First defined string for `key` across the lookup chain
fn first_string(response: &Value, analysis: Option<&Value>, key: &str) -> Option<String> {
    first_defined(response, analysis, key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Parse a citations value, tolerating either the `{ references, ... }`
/// object form or a bare array of references.
fn parse_citations(value: &Value) -> Option<Citations> {
    match value {
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        Value::Array(_) => {
            let references: Vec<SourceReference> =
                serde_json::from_value(value.clone()).ok()?;
            Some(Citations {
                references,
                rules_summary: None,
            })
        }
        _ => None,
    }
}

/// Citations can live at any of five locations depending on shape;
/// first non-null wins.
fn extract_citations(response: &Value, analysis: Option<&Value>) -> Option<Citations> {
    let candidates = [
        at(response, &["sources"]),
        at(response, &["data", "sources"]),
        at(response, &["citations"]),
        at(response, &["data", "citations"]),
        analysis.and_then(|a| a.get("sources")),
        analysis.and_then(|a| a.get("citations")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter(|v| !v.is_null())
        .find_map(parse_citations)
}

/// Clarification questions can arrive under `verification` or at the
/// top level, at either nesting depth.
fn extract_gap_questions(response: &Value) -> Vec<GapQuestion> {
    let candidates = [
        at(response, &["verification", "clarification_questions"]),
        at(response, &["data", "verification", "clarification_questions"]),
        at(response, &["clarification_questions"]),
        at(response, &["data", "clarification_questions"]),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|v| v.is_array())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

fn extract_portfolio(response: &Value) -> Option<PortfolioSummary> {
    let candidates = [at(response, &["summary"]), at(response, &["data", "summary"])];

    candidates
        .into_iter()
        .flatten()
        .filter(|v| v.is_object())
        .find_map(|v| serde_json::from_value(v.clone()).ok())
}

fn extract_markdown(response: &Value) -> Option<String> {
    at(response, &["answer"])
        .or_else(|| at(response, &["analysis"]))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn display_mode(shape: ResponseShape) -> DisplayMode {
    if shape.is_json() {
        DisplayMode::JsonSections
    } else {
        // Markdown is also the default fallback; the renderer handles
        // empty content gracefully rather than erroring
        DisplayMode::Markdown
    }
}

/// Project a raw API response into the canonical model.
///
/// Never fails: missing fields degrade to `None`/empty, and an
/// unrecognized payload comes back as [`ResponseShape::Unknown`] with the
/// raw value preserved for display.
pub fn normalize(response: &Value) -> NormalizedResponse {
    let shape = shape::detect(response);
    let analysis_obj = analysis_value(response, shape);

    let analysis: Option<AnalysisData> = analysis_obj
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .filter(|a: &AnalysisData| !a.properties.is_empty());

    let citations = extract_citations(response, analysis_obj);

    let session_id = first_string(response, analysis_obj, "session_id");
    let initial_query = first_string(response, analysis_obj, "query");
    let llm_used = first_string(response, analysis_obj, "llm_used");
    let llm_provider = llm_used
        .as_deref()
        .map(LlmProvider::from_display_name)
        .unwrap_or_default();

    debug!(
        ?shape,
        properties = analysis.as_ref().map(|a| a.properties.len()).unwrap_or(0),
        has_session = session_id.is_some(),
        "normalized response"
    );

    NormalizedResponse {
        shape,
        mode: display_mode(shape),
        analysis,
        citations,
        session: SessionContext {
            session_id,
            initial_query,
            llm_provider,
        },
        gap_questions: extract_gap_questions(response),
        portfolio: extract_portfolio(response),
        markdown: extract_markdown(response),
        raw: response.clone(),
    }
}
