use std::collections::HashSet;
use std::fs;
use std::sync::LazyLock;

use anyhow::Result;
use encoding_rs::Encoding;
use regex::Regex;
use tracing::{info, warn};

use crate::config::CrawlConfig;
use crate::fetch::Fetch;
use crate::store;

// Tag-level text match, not a structural XML parse: <loc> values must still
// come out of malformed sitemaps.
static LOC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<loc>([^<]+)</loc>").unwrap());

static SCHEME_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^/]+/schemes/([^/?#]+)/?$").unwrap());

/// Resolve the slug list: local slug file first, then sitemap (local cache,
/// then remote). First source that yields anything wins; an empty result
/// means "nothing to crawl", never an error.
pub async fn resolve<F: Fetch>(config: &CrawlConfig, fetcher: &F) -> Result<Vec<String>> {
    if config.local_slug_path.exists() {
        info!("Reading slugs from {}", config.local_slug_path.display());
        match fs::read_to_string(&config.local_slug_path) {
            Ok(content) => {
                let slugs = parse_slug_lines(&content);
                if !slugs.is_empty() {
                    info!(
                        "Found {} slugs in {}",
                        slugs.len(),
                        config.local_slug_path.display()
                    );
                    return Ok(slugs);
                }
            }
            Err(e) => warn!(
                "Failed to read {}: {}",
                config.local_slug_path.display(),
                e
            ),
        }
    }

    let Some(xml) = sitemap_content(config, fetcher).await else {
        return Ok(Vec::new());
    };
    from_sitemap(config, &xml)
}

/// One slug per line, trimmed, blanks skipped, deduplicated in file order.
pub fn parse_slug_lines(content: &str) -> Vec<String> {
    dedupe(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string),
    )
}

async fn sitemap_content<F: Fetch>(config: &CrawlConfig, fetcher: &F) -> Option<String> {
    if config.local_sitemap_path.exists() {
        info!(
            "Reading sitemap from {}",
            config.local_sitemap_path.display()
        );
        return match fs::read(&config.local_sitemap_path) {
            Ok(bytes) => {
                let decoded = decode_with_fallback(&bytes, &config.encodings);
                if decoded.is_none() {
                    warn!(
                        "Could not decode {} with any configured encoding",
                        config.local_sitemap_path.display()
                    );
                }
                decoded
            }
            Err(e) => {
                warn!(
                    "Failed to read {}: {}",
                    config.local_sitemap_path.display(),
                    e
                );
                None
            }
        };
    }

    info!("Fetching sitemap from {}", config.sitemap_url);
    match fetcher.fetch_url(&config.sitemap_url).await {
        Ok(body) if !body.trim().is_empty() => Some(body),
        Ok(_) => {
            warn!("Sitemap fetch returned an empty body");
            None
        }
        Err(e) => {
            warn!("Failed to fetch sitemap: {e:#}");
            None
        }
    }
}

fn from_sitemap(config: &CrawlConfig, xml: &str) -> Result<Vec<String>> {
    let urls = extract_loc_urls(xml);
    info!("Total <loc> entries in sitemap: {}", urls.len());

    store::write_url_list(&config.discovered_urls_path, &urls)?;

    let slugs = slugs_from_urls(&urls);
    info!("Scheme pages after filtering: {}", slugs.len());
    Ok(slugs)
}

/// Pull every `<loc>` value out of sitemap text, malformed XML or not.
pub fn extract_loc_urls(xml: &str) -> Vec<String> {
    LOC_RE
        .captures_iter(xml)
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Keep only `/schemes/<slug>` URLs (any host) and capture the slug,
/// deduplicated preserving first-seen order.
pub fn slugs_from_urls(urls: &[String]) -> Vec<String> {
    dedupe(
        urls.iter()
            .filter_map(|url| Some(SCHEME_URL_RE.captures(url)?[1].to_string())),
    )
}

/// Decode bytes with the first configured encoding that round-trips cleanly.
/// BOM-aware: a UTF-16 BOM wins regardless of the attempted encoding.
pub fn decode_with_fallback(
    bytes: &[u8],
    encodings: &[&'static Encoding],
) -> Option<String> {
    for encoding in encodings {
        let (text, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return Some(text.into_owned());
        }
    }
    None
}

fn dedupe(iter: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    iter.into_iter().filter(|s| seen.insert(s.clone())).collect()
}

// ── Tests ──
