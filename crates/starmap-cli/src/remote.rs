//! Auto-load of named system sets from a fixed remote sub-location.
//!
//! Only bare `<name>.csv` file names are accepted; anything with path
//! separators, encodings or other extensions is rejected before any URL is
//! built, so a hostile set name cannot fetch arbitrary resources.

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub const STARMAP_SET_BASE_URL_ENV: &str = "STARMAP_SET_BASE_URL";

/// Sets live under this sub-location of the base URL.
const SET_SUBDIR: &str = "system-sets/";

fn set_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[\w\-.]+\.csv$").unwrap())
}

pub fn is_valid_set_name(name: &str) -> bool {
    set_name_re().is_match(name)
}

/// Join `<base>/system-sets/<set>`; the base gains a trailing slash so the
/// last path segment is never replaced.
pub fn set_url(base: &str, set: &str) -> Result<Url> {
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = Url::parse(&base).with_context(|| format!("invalid base url: {base}"))?;
    let url = base
        .join(SET_SUBDIR)
        .and_then(|u| u.join(set))
        .with_context(|| format!("cannot build set url for {set:?}"))?;
    Ok(url)
}

/// Validate the set name, fetch it from the configured base and return the
/// CSV text.
pub async fn fetch_set(set: &str) -> Result<String> {
    if !is_valid_set_name(set) {
        bail!("invalid set name {set:?} (expected a bare <name>.csv)");
    }
    let base = std::env::var(STARMAP_SET_BASE_URL_ENV)
        .map_err(|_| anyhow!("set {STARMAP_SET_BASE_URL_ENV} to the system-set location"))?;
    let url = set_url(&base, set)?;

    let response = reqwest::get(url.clone())
        .await
        .with_context(|| format!("failed to fetch {url}"))?;
    if !response.status().is_success() {
        bail!("failed to fetch {set} ({})", response.status());
    }
    response
        .text()
        .await
        .with_context(|| format!("failed to read {url}"))
}
