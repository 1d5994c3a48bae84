use std::path::PathBuf;
use std::time::Duration;

use encoding_rs::{Encoding, UTF_16LE, UTF_8};

pub const DEFAULT_REQUEST_DELAY_MS: u64 = 500;

/// All knobs for one crawl, passed explicitly to each component.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub sitemap_url: String,
    pub api_base: String,
    pub request_headers: Vec<(String, String)>,
    /// Line-delimited slug list consulted before any sitemap source.
    pub local_slug_path: PathBuf,
    /// Cached sitemap consulted before the remote fetch.
    pub local_sitemap_path: PathBuf,
    /// Every raw sitemap URL is dumped here whenever sitemap parsing runs.
    pub discovered_urls_path: PathBuf,
    pub output_dir: PathBuf,
    /// Fixed pause after every fetch attempt, success or failure.
    pub request_delay: Duration,
    /// Encodings attempted, in order, when reading the local sitemap.
    pub encodings: Vec<&'static Encoding>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            sitemap_url: "https://www.myscheme.gov.in/sitemap-0.xml".into(),
            api_base: "https://api.myscheme.gov.in/schemes/v6/public/schemes".into(),
            request_headers: vec![
                // Client-side key the site serves to every browser.
                (
                    "x-api-key".into(),
                    "tYTy5eEhlu9rFjyxuCr7ra7ACp4dv1RH8gWuHTDc".into(),
                ),
                (
                    "User-Agent".into(),
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                        .into(),
                ),
                ("Origin".into(), "https://www.myscheme.gov.in".into()),
                ("Referer".into(), "https://www.myscheme.gov.in/".into()),
                ("Content-Type".into(), "application/json".into()),
            ],
            local_slug_path: "slugs.txt".into(),
            local_sitemap_path: "sitemap.xml".into(),
            discovered_urls_path: "found_urls.txt".into(),
            output_dir: "results".into(),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            encodings: vec![UTF_8, UTF_16LE],
        }
    }
}
