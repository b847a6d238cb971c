//! Aggregate audience summary used by the report writer.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::dataset::count_values;
use crate::error::Error;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::store::{ResponseStore, Table};

const EXPERIENCE_COLUMN: &str = "AI_Experience";
const CONFIDENCE_COLUMN: &str = "Programming_Confidence";
const DOMAIN_COLUMN: &str = "Domain";
const PROJECT_COLUMN: &str = "Project_Idea";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("valid code fence regex")
});

/// Headline numbers for the workshop audience.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_participants: usize,
    pub experience_breakdown: BTreeMap<String, usize>,
    pub confidence_breakdown: BTreeMap<String, usize>,
    pub top_domains: BTreeMap<String, usize>,
    /// Theme → number of project ideas in that theme.
    pub interest_clusters: BTreeMap<String, usize>,
}

/// Builds [`AnalyticsSummary`] values from the response store.
///
/// Breakdowns are plain counts. Interest clusters are grouped by the model
/// when one is configured, and fall back to raw project-idea counts.
pub struct SummaryBuilder {
    store: Arc<dyn ResponseStore>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl SummaryBuilder {
    pub fn new(store: Arc<dyn ResponseStore>, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { store, llm }
    }

    pub async fn build(&self) -> Result<AnalyticsSummary, Error> {
        let Some(table) = self.store.load().await? else {
            return Ok(AnalyticsSummary::default());
        };

        let mut summary = AnalyticsSummary {
            total_participants: table.len(),
            experience_breakdown: breakdown(&table, EXPERIENCE_COLUMN),
            confidence_breakdown: breakdown(&table, CONFIDENCE_COLUMN),
            top_domains: breakdown(&table, DOMAIN_COLUMN),
            interest_clusters: breakdown(&table, PROJECT_COLUMN),
        };

        if let Some(ref llm) = self.llm
            && let Some(ideas) = table.column(PROJECT_COLUMN)
            && ideas.iter().any(|i| !i.trim().is_empty())
        {
            match cluster_ideas(llm.as_ref(), &ideas).await {
                Ok(clusters) => summary.interest_clusters = clusters,
                Err(e) => {
                    tracing::warn!(error = %e, "Interest clustering failed, using raw idea counts");
                }
            }
        }

        tracing::info!(
            participants = summary.total_participants,
            clusters = summary.interest_clusters.len(),
            "Built audience summary"
        );
        Ok(summary)
    }
}

fn breakdown(table: &Table, column: &str) -> BTreeMap<String, usize> {
    count_values(table, column)
        .map(|counts| counts.to_map())
        .unwrap_or_default()
}

async fn cluster_ideas(
    llm: &dyn LlmProvider,
    ideas: &[&str],
) -> Result<BTreeMap<String, usize>, Error> {
    let listing: String = ideas
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(|i| format!("- {i}\n"))
        .collect();

    let prompt = format!(
        "Group these workshop project ideas into a few short themes.\n\
         Return ONLY a JSON object mapping each theme name to the number of ideas in it.\n\n\
         {listing}"
    );
    let request = CompletionRequest::new(vec![
        ChatMessage::system("You are a data extraction assistant. Output only valid JSON."),
        ChatMessage::user(prompt),
    ])
    .with_max_tokens(1024)
    .with_temperature(0.0);

    let response = llm.complete(request).await?;
    let json = strip_code_fence(&response.content);
    let clusters: BTreeMap<String, usize> = serde_json::from_str(json).map_err(crate::error::LlmError::from)?;
    Ok(clusters)
}

/// Remove a surrounding ```json fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}
