//! Plain-text audience report written after an analysis run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::analytics::AnalyticsSummary;
use crate::error::PersistenceError;

const RULE: &str = "========================================";

/// Renders [`AnalyticsSummary`] values and keeps the latest one on disk.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Report text for `summary`. Sections list values by count, highest first.
    pub fn render(summary: &AnalyticsSummary) -> String {
        let mut out = format!("{RULE}\nWORKSHOP AUDIENCE REPORT\n{RULE}\n\n");
        out.push_str(&format!("TOTAL PARTICIPANTS: {}\n", summary.total_participants));

        let sections = [
            ("AI EXPERIENCE", &summary.experience_breakdown),
            ("PROGRAMMING CONFIDENCE", &summary.confidence_breakdown),
            ("TOP DOMAINS", &summary.top_domains),
            ("INTEREST CLUSTERS", &summary.interest_clusters),
        ];
        for (title, counts) in sections {
            out.push_str(&format!("\n{title}\n{}\n", "-".repeat(title.len())));
            if counts.is_empty() {
                out.push_str("  (no data)\n");
                continue;
            }
            for (value, count) in by_count(counts) {
                out.push_str(&format!("  {value}: {count}\n"));
            }
        }
        out
    }

    /// Render `summary`, write it to the report path and return the text.
    pub async fn write_report(&self, summary: &AnalyticsSummary) -> Result<String, PersistenceError> {
        let text = Self::render(summary);
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err(e))?;
        }
        tokio::fs::write(&self.path, &text)
            .await
            .map_err(|e| self.io_err(e))?;
        tracing::info!(path = %self.path.display(), "Wrote audience report");
        Ok(text)
    }

    /// Last written report, or `None` if there is none.
    pub async fn read(&self) -> Result<Option<String>, PersistenceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    /// Delete the report file. A missing file is not an error.
    pub async fn remove(&self) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

fn by_count(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = counts.iter().map(|(v, n)| (v.as_str(), *n)).collect();
    // Stable sort keeps ties in key order.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}
