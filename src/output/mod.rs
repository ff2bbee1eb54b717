//! Result files: one JSON document per completed search

use crate::analysis::AnalysisReport;
use crate::config::OutputSettings;
use crate::search::ResultSet;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// On-disk layout of a result file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    pub phone_number: String,
    pub search_results: ResultSet,
    pub analysis: AnalysisReport,
    pub metadata: ResultMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub timestamp: DateTime<Utc>,
    pub result_count: usize,
}

/// Writes result documents into a directory
#[derive(Debug, Clone)]
pub struct ResultStore {
    directory: PathBuf,
}

impl ResultStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn from_settings(settings: &OutputSettings) -> Self {
        Self::new(settings.directory.clone())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Save results and analysis as `results_<phone>_<YYYYmmdd_HHMMSS>.json`
    pub async fn save(
        &self,
        phone_number: &str,
        results: &ResultSet,
        analysis: &AnalysisReport,
    ) -> Result<PathBuf> {
        let now = Utc::now();
        let document = ResultDocument {
            phone_number: phone_number.to_string(),
            search_results: results.clone(),
            analysis: analysis.clone(),
            metadata: ResultMetadata {
                timestamp: now,
                result_count: results.len(),
            },
        };

        tokio::fs::create_dir_all(&self.directory)
            .await
            .with_context(|| format!("failed to create {}", self.directory.display()))?;

        let path = self.directory.join(format!(
            "results_{}_{}.json",
            file_safe(phone_number),
            now.format("%Y%m%d_%H%M%S")
        ));
        let json = serde_json::to_vec_pretty(&document)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        info!("Results saved to {}", path.display());
        Ok(path)
    }

    /// Read a previously saved document
    pub async fn load(path: impl AsRef<Path>) -> Result<ResultDocument> {
        let path = path.as_ref();
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(serde_json::from_slice(&content)?)
    }
}

/// Keep characters that are safe in a file name on every platform
fn file_safe(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
