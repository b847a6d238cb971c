//! Fill the response store with simulated attendees for dashboard demos.

use std::sync::Arc;

use anyhow::Context;
use rand::Rng;
use rand::seq::SliceRandom;

use warmup_intake::config::AppConfig;
use warmup_intake::intake::{Identity, InMemorySessionStore, IntakeFlow, IntakeRequest, ReplyOutcome};
use warmup_intake::store::{CsvResponseStore, ResponseStore};

const ATTENDEES: usize = 20;

const NAMES: &[&str] = &[
    "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Heidi", "Ivan", "Judy", "Kevin",
    "Laura", "Mike", "Nina", "Oscar", "Pam", "Quinn", "Rachel", "Steve", "Tina",
];
const DOMAINS: &[&str] = &[
    "Finance",
    "Healthcare",
    "Education",
    "Retail",
    "Tech",
    "Marketing",
    "Logistics",
    "Entertainment",
    "Real Estate",
    "Automotive",
];
const PROJECTS: &[&str] = &[
    "Trading Bot",
    "Diagnosis Helper",
    "Tutor Bot",
    "Shopper Assistant",
    "Code Generator",
    "Ad Optimizer",
    "Route Planner",
    "Game NPC",
    "Price Predictor",
    "Car OS",
];
const CONFIDENCE: &[&str] = &["Low", "Medium", "High"];
const EXPERIENCE: &[&str] = &["Beginner", "Intermediate", "Advanced"];
// The learning-style question wants at least two words.
const STYLES: &[&str] = &["Hands-on labs", "Conceptual explanations", "A mix of both"];

fn pick<R: Rng>(rng: &mut R, pool: &[&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or(pool[0])
}

fn random_identity<R: Rng>(rng: &mut R, index: usize) -> Identity {
    let name = NAMES[index % NAMES.len()];
    Identity::new(
        format!("{name} {}", rng.gen_range(1..=100)),
        format!("{}{}@example.com", name.to_lowercase(), rng.gen_range(1..=100)),
    )
}

fn random_answers<R: Rng>(rng: &mut R) -> Vec<String> {
    vec![
        "I want to learn about AI agents.".to_string(),
        pick(rng, DOMAINS).to_string(),
        format!("I want to build a {}", pick(rng, PROJECTS)),
        pick(rng, CONFIDENCE).to_string(),
        pick(rng, EXPERIENCE).to_string(),
        pick(rng, STYLES).to_string(),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let store = Arc::new(CsvResponseStore::new(config.responses_file.clone()));
    let initial = store
        .load()
        .await
        .context("could not read existing responses")?
        .map(|t| t.len())
        .unwrap_or(0);

    eprintln!("🚀 Simulating {ATTENDEES} attendees into {}", store.path().display());
    eprintln!("   Existing records: {initial}");

    let flow = IntakeFlow::new(Arc::new(InMemorySessionStore::new()), store.clone());
    let run_id = chrono::Utc::now().timestamp();
    let mut rng = rand::thread_rng();
    let mut completed = 0usize;

    for i in 0..ATTENDEES {
        let identity = random_identity(&mut rng, i);
        let user_id = format!("sim_user_{i}_{run_id}");
        let display = identity.display_name().to_string();

        flow.respond(&user_id, IntakeRequest::StartSession, Some(identity))
            .await
            .with_context(|| format!("start failed for {user_id}"))?;

        let mut last = None;
        for answer in random_answers(&mut rng) {
            let reply = flow
                .respond(&user_id, IntakeRequest::Answer(answer), None)
                .await
                .with_context(|| format!("answer failed for {user_id}"))?;
            last = Some(reply.outcome);
        }

        match last {
            Some(ReplyOutcome::Completed { record_id }) => {
                completed += 1;
                eprintln!("   [{}/{ATTENDEES}] ✅ {display} ({record_id})", i + 1);
            }
            other => {
                eprintln!(
                    "   [{}/{ATTENDEES}] ⚠️  {display} did not finish: {other:?}",
                    i + 1
                );
            }
        }
    }

    let total = store
        .load()
        .await
        .context("could not re-read responses")?
        .map(|t| t.len())
        .unwrap_or(0);
    eprintln!(
        "\n✅ Done: {completed} completed, {} new records, {total} total",
        total.saturating_sub(initial)
    );
    Ok(())
}
