//! Sequential crawler for the myscheme.gov.in scheme catalogue: resolve slugs
//! (local list, else sitemap), fetch each scheme's JSON record, persist one
//! file per scheme plus a consolidated array.

pub mod config;
pub mod crawler;
pub mod fetch;
pub mod progress;
pub mod slugs;
pub mod store;
