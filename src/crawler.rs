use std::fmt;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::CrawlConfig;
use crate::fetch::Fetch;
use crate::progress::Progress;
use crate::store;

/// Crawl stats returned after completion.
pub struct CrawlStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Why a slug produced no record. Logged with the slug, never raised past
/// the crawl loop.
#[derive(Debug)]
pub enum SkipReason {
    Transport(String),
    EmptyBody,
    InvalidJson(String),
    Api(String),
    MissingPayload,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Transport(e) => write!(f, "request failed: {e}"),
            SkipReason::EmptyBody => write!(f, "empty response body"),
            SkipReason::InvalidJson(e) => write!(f, "invalid JSON: {e}"),
            SkipReason::Api(msg) => write!(f, "API error: {msg}"),
            SkipReason::MissingPayload => write!(f, "no data.data payload in envelope"),
        }
    }
}

/// Extract the record from an API response body. Success requires
/// `status == "success"`; the record sits at the doubly-nested `data.data`
/// (upstream envelope wraps the API's own `{statusCode, data}` response).
pub fn extract_payload(body: &str) -> Result<Value, SkipReason> {
    if body.trim().is_empty() {
        return Err(SkipReason::EmptyBody);
    }

    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| SkipReason::InvalidJson(e.to_string()))?;

    if envelope.status != "success" {
        return Err(SkipReason::Api(
            envelope.message.unwrap_or(envelope.status),
        ));
    }

    envelope
        .data
        .as_ref()
        .and_then(|data| data.get("data"))
        .cloned()
        .ok_or(SkipReason::MissingPayload)
}

/// Fetch every slug in order, one at a time, writing each success to its own
/// file immediately and the consolidated aggregate once at the end. Per-item
/// failures are logged and skipped; only persistence errors abort the run.
pub async fn crawl<F: Fetch>(
    config: &CrawlConfig,
    fetcher: &F,
    slugs: &[String],
    progress: &mut dyn Progress,
) -> Result<CrawlStats> {
    store::ensure_output_dir(&config.output_dir)?;

    let total = slugs.len();
    progress.begin(total);

    let mut collected: Vec<Value> = Vec::new();
    let mut errors = 0usize;

    for slug in slugs {
        match fetch_one(fetcher, slug).await {
            Ok(payload) => {
                store::write_scheme(&config.output_dir, slug, &payload)?;
                collected.push(payload);
                progress.item_done(slug, true);
            }
            Err(reason) => {
                warn!("Skipping {}: {}", slug, reason);
                errors += 1;
                progress.item_done(slug, false);
            }
        }

        // Fixed pacing after every attempt, failures included.
        tokio::time::sleep(config.request_delay).await;
    }

    progress.finish();

    store::write_aggregate(&config.output_dir, &collected)?;

    let ok = collected.len();
    info!("Fetched {} of {} schemes ({} skipped)", ok, total, errors);

    Ok(CrawlStats { total, ok, errors })
}

async fn fetch_one<F: Fetch>(fetcher: &F, slug: &str) -> Result<Value, SkipReason> {
    let body = fetcher
        .fetch_scheme(slug)
        .await
        .map_err(|e| SkipReason::Transport(format!("{e:#}")))?;
    extract_payload(&body)
}

// ── Tests ──
