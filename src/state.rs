//! Persistent one-way flags.
//!
//! Small facts that survive across runs, like whether the feedback
//! prompt has already been shown. Backed by a JSON map in the app home;
//! the [`FlagStore`] trait lets tests inject an in-memory double.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

use crate::config;

/// Set once after the feedback prompt has been displayed
pub const FEEDBACK_SHOWN: &str = "feedback_shown";

/// Store for named persistent flags
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Whether the flag has ever been set
    async fn is_set(&self, flag: &str) -> Result<bool>;

    /// Set the flag. Setting an already-set flag is a no-op.
    async fn set(&self, flag: &str) -> Result<()>;
}

/// Flags persisted to a JSON file
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured flags path
    pub fn open() -> Result<Self> {
        Ok(Self::new(config::flags_path()?))
    }

    async fn load(&self) -> Result<BTreeMap<String, bool>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read flags file: {}", self.path.display()))?;

        serde_json::from_str(&content).context("Failed to parse flags JSON")
    }

    async fn store(&self, flags: &BTreeMap<String, bool>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(flags)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write flags file: {}", self.path.display()))?;

        Ok(())
    }
}

#[async_trait]
impl FlagStore for FileFlagStore {
    async fn is_set(&self, flag: &str) -> Result<bool> {
        let flags = self.load().await?;
        Ok(flags.get(flag).copied().unwrap_or(false))
    }

    async fn set(&self, flag: &str) -> Result<()> {
        let mut flags = self.load().await?;
        if flags.insert(flag.to_string(), true) != Some(true) {
            self.store(&flags).await?;
        }
        Ok(())
    }
}
