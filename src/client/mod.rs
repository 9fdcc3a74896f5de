//! Clients for the upstream analysis service and its side endpoints.
//!
//! The analysis and follow-up calls sit behind the [`AnalysisBackend`]
//! trait so the CLI and tests can inject doubles; share and email are
//! plain methods on the HTTP client. All calls are one-shot: no retry
//! policy, no idempotency keys. Failures surface to the caller.

pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::domain::Citations;
use crate::normalize::{is_displayable, LlmProvider};

pub use http::HttpBackend;

/// Response mode requested from the analysis API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Json,
    Markdown,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
        }
    }
}

/// Answer to a follow-up question
#[derive(Debug, Clone, Deserialize)]
pub struct FollowUpReply {
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Citations>,
}

/// One message in a follow-up conversation transcript
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Citations>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatMessage {
    pub fn user(content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::User,
            content,
            sources: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(reply: FollowUpReply) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::Assistant,
            content: reply.answer,
            sources: reply.sources,
            timestamp: Utc::now(),
        }
    }
}

/// Seam over the upstream analysis service
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Submit a timeline for analysis, returning the raw response payload
    async fn analyze(
        &self,
        timeline: &Value,
        mode: ResponseMode,
        provider: LlmProvider,
    ) -> Result<Value>;

    /// Ask a follow-up question within an analysis session
    async fn follow_up(
        &self,
        session_id: &str,
        question: &str,
        provider: LlmProvider,
    ) -> Result<FollowUpReply>;
}

/// Analyze with the automatic markdown fallback.
///
/// When a JSON-mode response comes back in no recognizable shape, the
/// request is retried once in markdown mode. That is the whole recovery
/// protocol: a second unrecognized payload is returned as-is for raw
/// display.
pub async fn analyze_with_fallback(
    backend: &dyn AnalysisBackend,
    timeline: &Value,
    mode: ResponseMode,
    provider: LlmProvider,
) -> Result<Value> {
    let response = backend.analyze(timeline, mode, provider).await?;

    if mode == ResponseMode::Json && !is_displayable(&response) {
        warn!("unrecognized response shape in json mode, retrying in markdown mode");
        return backend.analyze(timeline, ResponseMode::Markdown, provider).await;
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend double that returns canned responses per mode
    struct CannedBackend {
        json_response: Value,
        markdown_response: Value,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AnalysisBackend for CannedBackend {
        async fn analyze(
            &self,
            _timeline: &Value,
            mode: ResponseMode,
            _provider: LlmProvider,
        ) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(match mode {
                ResponseMode::Json => self.json_response.clone(),
                ResponseMode::Markdown => self.markdown_response.clone(),
            })
        }

        async fn follow_up(
            &self,
            _session_id: &str,
            _question: &str,
            _provider: LlmProvider,
        ) -> Result<FollowUpReply> {
            unimplemented!("not exercised")
        }
    }

    #[tokio::test]
    async fn test_fallback_retries_unrecognized_json() {
        let backend = CannedBackend {
            json_response: json!({"unrecognized": true}),
            markdown_response: json!({"answer": "## Analysis"}),
            calls: AtomicUsize::new(0),
        };

        let response = analyze_with_fallback(
            &backend,
            &json!({"properties": [], "events": []}),
            ResponseMode::Json,
            LlmProvider::Deepseek,
        )
        .await
        .unwrap();

        assert_eq!(response["answer"], "## Analysis");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_fallback_for_recognized_shape() {
        let backend = CannedBackend {
            json_response: json!({
                "success": true,
                "data": {"properties": [{"property_address": "1 Smith St"}]}
            }),
            markdown_response: json!({"answer": "should not be reached"}),
            calls: AtomicUsize::new(0),
        };

        let response = analyze_with_fallback(
            &backend,
            &json!({"properties": [], "events": []}),
            ResponseMode::Json,
            LlmProvider::Deepseek,
        )
        .await
        .unwrap();

        assert!(response["success"].as_bool().unwrap());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_fallback_in_markdown_mode() {
        let backend = CannedBackend {
            json_response: json!({}),
            markdown_response: json!({"weird": true}),
            calls: AtomicUsize::new(0),
        };

        let response = analyze_with_fallback(
            &backend,
            &json!({}),
            ResponseMode::Markdown,
            LlmProvider::Claude,
        )
        .await
        .unwrap();

        assert_eq!(response["weird"], true);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
