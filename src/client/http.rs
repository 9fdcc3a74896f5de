//! HTTP implementation of the upstream endpoints.
//!
//! Analysis and follow-up speak JSON with a `{ success, data, error }`
//! envelope. Share posts a serialized timeline and gets back a short id;
//! email is a multipart form upload of a rendered report.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use super::{AnalysisBackend, FollowUpReply, ResponseMode};
use crate::config::{self, Endpoints};
use crate::normalize::LlmProvider;

/// Problems with an outgoing payload, caught before anything is sent
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Timeline payload missing 'properties'")]
    MissingProperties,

    #[error("Timeline payload missing 'events'")]
    MissingEvents,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// Standard response envelope used by the analysis endpoints
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShareReceipt {
    #[serde(rename = "shareId")]
    share_id: String,
}

#[derive(Debug, Deserialize)]
struct EmailReceipt {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the upstream analysis service
pub struct HttpBackend {
    endpoints: Endpoints,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a client with explicit endpoints
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { endpoints, client })
    }

    /// Create a client from the resolved configuration
    pub fn from_config() -> Result<Self> {
        let config = config::config()?;
        Self::new(
            config.endpoints.clone(),
            Duration::from_secs(config.analysis.timeout_seconds),
        )
    }

    /// Unwrap the `{ success, data, error }` envelope
    fn unwrap_envelope(envelope: ApiEnvelope, what: &str) -> Result<Value> {
        if !envelope.success {
            let message = envelope.error.unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("{} failed: {}", what, message);
        }
        Ok(envelope.data)
    }

    /// Save a timeline for sharing, returning the share id
    pub async fn share_timeline(&self, timeline: &Value) -> Result<String> {
        if timeline.get("properties").is_none() {
            return Err(PayloadError::MissingProperties.into());
        }
        if timeline.get("events").is_none() {
            return Err(PayloadError::MissingEvents.into());
        }

        let response = self
            .client
            .post(&self.endpoints.share_url)
            .json(timeline)
            .send()
            .await
            .context("Failed to reach share endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Share endpoint error ({}): {}", status, text);
        }

        let receipt: ShareReceipt = response
            .json()
            .await
            .context("Share endpoint returned an unexpected body")?;

        info!(share_id = %receipt.share_id, "timeline saved for sharing");
        Ok(receipt.share_id)
    }

    /// Build the public link for a share id
    pub fn share_link(&self, share_id: &str) -> String {
        format!("{}?share={}", self.endpoints.share_origin, share_id)
    }

    /// Email a rendered report as an attachment
    pub async fn send_report_email(
        &self,
        email: &str,
        report: Vec<u8>,
        filename: &str,
    ) -> Result<()> {
        if !is_plausible_email(email) {
            return Err(PayloadError::InvalidEmail(email.to_string()).into());
        }

        let part = reqwest::multipart::Part::bytes(report)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .context("Failed to build attachment part")?;

        let form = reqwest::multipart::Form::new()
            .text("email", email.to_string())
            .text("filename", filename.to_string())
            .part("pdf", part);

        let response = self
            .client
            .post(&self.endpoints.email_url)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach email endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Email endpoint error ({}): {}", status, text);
        }

        let receipt: EmailReceipt = response
            .json()
            .await
            .context("Email endpoint returned an unexpected body")?;

        if !receipt.success {
            let message = receipt.error.unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("Email send failed: {}", message);
        }

        info!(%email, %filename, "report emailed");
        Ok(())
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn analyze(
        &self,
        timeline: &Value,
        mode: ResponseMode,
        provider: LlmProvider,
    ) -> Result<Value> {
        // Merge the request flags into the timeline payload
        let mut body = timeline.clone();
        if let Some(object) = body.as_object_mut() {
            object.insert("responseMode".to_string(), json!(mode.as_str()));
            object.insert("llmProvider".to_string(), json!(provider.as_key()));
        }

        info!(mode = mode.as_str(), provider = provider.as_key(), "requesting analysis");

        let response = self
            .client
            .post(&self.endpoints.analyze_url)
            .json(&body)
            .send()
            .await
            .context("Failed to reach analysis endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Analysis endpoint error ({}): {}", status, text);
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .context("Analysis endpoint returned an unexpected body")?;

        Self::unwrap_envelope(envelope, "Analysis")
    }

    async fn follow_up(
        &self,
        session_id: &str,
        question: &str,
        provider: LlmProvider,
    ) -> Result<FollowUpReply> {
        let body = json!({
            "session_id": session_id,
            "question": question,
            "llm_provider": provider.as_key(),
        });

        let response = self
            .client
            .post(&self.endpoints.follow_up_url)
            .json(&body)
            .send()
            .await
            .context("Failed to reach follow-up endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Follow-up endpoint error ({}): {}", status, text);
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .context("Follow-up endpoint returned an unexpected body")?;

        let data = Self::unwrap_envelope(envelope, "Follow-up")?;
        serde_json::from_value(data).context("Follow-up reply missing 'answer'")
    }
}

/// Same acceptance as the original client-side check: something@something.tld,
/// no whitespace
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_plausible_email("user@example.com"));
        assert!(is_plausible_email("first.last@sub.example.com.au"));

        assert!(!is_plausible_email("userexample.com"));
        assert!(!is_plausible_email("user@example"));
        assert!(!is_plausible_email("user name@example.com"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("user@@example.com"));
        assert!(!is_plausible_email("user@.com"));
    }

    #[test]
    fn test_share_link_format() {
        let backend = HttpBackend::new(Endpoints::default(), Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.share_link("abc123xyz0"),
            "https://cgtbrain.com.au?share=abc123xyz0"
        );
    }

    #[test]
    fn test_envelope_unwrap() {
        let ok = ApiEnvelope {
            success: true,
            data: json!({"answer": "hi"}),
            error: None,
        };
        assert_eq!(
            HttpBackend::unwrap_envelope(ok, "Test").unwrap()["answer"],
            "hi"
        );

        let failed = ApiEnvelope {
            success: false,
            data: Value::Null,
            error: Some("rate limited".to_string()),
        };
        let err = HttpBackend::unwrap_envelope(failed, "Test").unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }
}
