//! Local archive of analysis responses.
//!
//! A JSON catalog (`reports.json`) indexes saved analyses; raw response
//! payloads live next to it under `reports/<id>.json`. Ids are derived
//! from the payload content, so saving the same response twice is a
//! no-op update rather than a duplicate.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::config;
use crate::normalize::{NormalizedResponse, ResponseShape};

/// Report lookup failures callers branch on
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No saved report with id '{0}'")]
    NotFound(String),
}

/// Identifier for a saved report: SHA256(payload)[0:12] as hex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportId(String);

impl ReportId {
    /// Derive the id from a raw response payload
    pub fn from_payload(raw: &serde_json::Value) -> Self {
        let canonical = raw.to_string();
        let digest = Sha256::digest(canonical.as_bytes());
        Self(hex::encode(digest)[..12].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ReportId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Catalog of saved reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCatalog {
    /// Catalog format version
    pub version: u32,

    /// All saved report entries
    pub entries: Vec<ReportEntry>,
}

impl Default for ReportCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportCatalog {
    pub fn new() -> Self {
        Self {
            version: 1,
            entries: Vec::new(),
        }
    }

    /// Add or update an entry, keyed by id
    pub fn add(&mut self, entry: ReportEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.id == entry.id) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    pub fn get(&self, id: &ReportId) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn remove(&mut self, id: &ReportId) -> Option<ReportEntry> {
        self.entries
            .iter()
            .position(|e| &e.id == id)
            .map(|pos| self.entries.remove(pos))
    }

    /// All entries sorted by save time, most recent first
    pub fn list(&self) -> Vec<&ReportEntry> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single saved report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Content-derived identifier
    pub id: ReportId,

    /// When the report was saved locally
    pub saved_at: DateTime<Utc>,

    /// Query the analysis was for, when the response carried one
    pub query: Option<String>,

    /// Detected response shape at save time
    pub shape: String,

    /// Number of properties in the analysis
    pub property_count: usize,
}

/// File-backed report store rooted at a directory
pub struct ReportStore {
    catalog_path: PathBuf,
    reports_dir: PathBuf,
}

impl ReportStore {
    /// Store rooted at an explicit directory
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            catalog_path: home.join("reports.json"),
            reports_dir: home.join("reports"),
        }
    }

    /// Store rooted at the configured home directory
    pub fn open() -> Result<Self> {
        Ok(Self::new(config::cgtbrain_home()?))
    }

    async fn load_catalog(&self) -> Result<ReportCatalog> {
        if !self.catalog_path.exists() {
            return Ok(ReportCatalog::new());
        }

        let content = fs::read_to_string(&self.catalog_path)
            .await
            .with_context(|| {
                format!("Failed to read report catalog: {}", self.catalog_path.display())
            })?;

        serde_json::from_str(&content).context("Failed to parse report catalog JSON")
    }

    async fn save_catalog(&self, catalog: &ReportCatalog) -> Result<()> {
        if let Some(parent) = self.catalog_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(catalog)?;
        fs::write(&self.catalog_path, content)
            .await
            .with_context(|| {
                format!("Failed to write report catalog: {}", self.catalog_path.display())
            })?;

        Ok(())
    }

    fn payload_path(&self, id: &ReportId) -> PathBuf {
        self.reports_dir.join(format!("{}.json", id))
    }

    /// Archive a normalized response, returning its id.
    ///
    /// Saving the same payload again refreshes the catalog entry in
    /// place; the id never changes for a given payload.
    pub async fn save(&self, normalized: &NormalizedResponse) -> Result<ReportId> {
        let id = ReportId::from_payload(&normalized.raw);

        fs::create_dir_all(&self.reports_dir).await?;
        let payload = serde_json::to_string_pretty(&normalized.raw)?;
        fs::write(self.payload_path(&id), payload)
            .await
            .with_context(|| format!("Failed to archive response payload for {}", id))?;

        let entry = ReportEntry {
            id: id.clone(),
            saved_at: Utc::now(),
            query: normalized.session.initial_query.clone(),
            shape: shape_name(normalized.shape).to_string(),
            property_count: normalized.property_count(),
        };

        let mut catalog = self.load_catalog().await?;
        catalog.add(entry);
        self.save_catalog(&catalog).await?;

        debug!(%id, "report saved");
        Ok(id)
    }

    /// List saved reports, most recent first
    pub async fn list(&self) -> Result<Vec<ReportEntry>> {
        let catalog = self.load_catalog().await?;
        Ok(catalog.list().into_iter().cloned().collect())
    }

    /// Load the raw payload of a saved report
    pub async fn get(&self, id: &ReportId) -> Result<serde_json::Value> {
        let catalog = self.load_catalog().await?;
        if catalog.get(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()).into());
        }

        let content = fs::read_to_string(self.payload_path(id))
            .await
            .with_context(|| format!("Failed to read archived payload for {}", id))?;

        serde_json::from_str(&content).context("Archived payload is not valid JSON")
    }

    /// Remove a saved report and its archived payload
    pub async fn remove(&self, id: &ReportId) -> Result<()> {
        let mut catalog = self.load_catalog().await?;
        if catalog.remove(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()).into());
        }
        self.save_catalog(&catalog).await?;

        let path = self.payload_path(id);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .with_context(|| format!("Failed to remove archived payload for {}", id))?;
        }

        Ok(())
    }
}

fn shape_name(shape: ResponseShape) -> &'static str {
    match shape {
        ResponseShape::DoubleWrappedJson => "double_wrapped",
        ResponseShape::WrappedJson => "wrapped",
        ResponseShape::DirectJson => "direct",
        ResponseShape::NewMarkdown => "markdown",
        ResponseShape::LegacyMarkdown => "legacy_markdown",
        ResponseShape::VerificationFailed => "verification_failed",
        ResponseShape::LegacySuccess => "legacy_success",
        ResponseShape::Unknown => "unknown",
    }
}
