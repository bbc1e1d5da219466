//! Batched coordinate resolution against the external lookup service.
//!
//! The service resolves system names to galactic coordinates, but caps
//! request size and rate-limits callers. `resolve_batch` therefore:
//!
//! - splits the name list into fixed-size groups (100 per request),
//! - issues one call per group, strictly sequentially, with a fixed pause
//!   after each call,
//! - reports progress before each group and a summary after the last,
//! - fails the whole resolution on the first non-success response. Partial
//!   results are discarded; the catalog merge downstream is atomic, so a
//!   half-resolved batch would be worse than a clean retry.
//!
//! The transport sits behind the `SystemLookup` trait so tests can script
//! responses without a network; `HttpSystemLookup` is the real client.

pub mod http;
pub mod mock;

pub use http::HttpSystemLookup;
pub use mock::MockLookup;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use starmap_catalog::{Coords, ResolvedSystem};
use std::time::Duration;

// ============================================================================
// Wire types
// ============================================================================

/// Coordinates as the service reports them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCoords {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One record from the service. Absent `coords` means the name is known but
/// unresolved; it is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSystem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub coords: Option<RawCoords>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("coordinate service request failed ({status}): {body}")]
    Service { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

// ============================================================================
// Transport seam
// ============================================================================

/// One grouped request against the lookup service.
#[async_trait]
pub trait SystemLookup: Send + Sync {
    async fn fetch_group(&self, names: &[String]) -> Result<Vec<RawSystem>, ResolveError>;
}

/// Request-size and pacing limits of the external service.
///
/// Kept as an explicit value object so tests can shrink the group size and
/// pause instead of faking 100-name batches against a real clock.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub group_size: usize,
    pub pause: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            group_size: 100,
            pause: Duration::from_millis(200),
        }
    }
}

// ============================================================================
// Batched resolution
// ============================================================================

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

/// Resolve `names` in sequential, rate-limited groups.
///
/// `on_progress` receives a message before each group call and a summary
/// after the last. Any group failure aborts the whole resolution; results
/// from earlier groups are discarded.
pub async fn resolve_batch(
    lookup: &dyn SystemLookup,
    names: &[String],
    limit: &RateLimit,
    on_progress: &mut dyn FnMut(&str),
) -> Result<Vec<RawSystem>, ResolveError> {
    let groups: Vec<&[String]> = names.chunks(limit.group_size.max(1)).collect();
    let mut results = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        on_progress(&format!(
            "Fetching {}/{} ({} {})…",
            i + 1,
            groups.len(),
            group.len(),
            plural(group.len(), "name", "names"),
        ));
        let batch = lookup.fetch_group(group).await?;
        results.extend(batch);
        tokio::time::sleep(limit.pause).await;
    }
    on_progress(&format!(
        "Fetched {} {}.",
        results.len(),
        plural(results.len(), "record", "records"),
    ));
    Ok(results)
}

// ============================================================================
// Normalization into the catalog's fill shape
// ============================================================================

const INARA_BASE: &str = "https://inara.cz/elite/starsystem/?search=";
const SPANSH_SEARCH_BASE: &str = "https://spansh.co.uk/search/";
const RAVEN_COLONIAL_BASE: &str = "https://ravencolonial.com/#sys=";

fn link_button(href: &str, label: &str) -> String {
    format!(
        "<a href=\"{href}\" target=\"_blank\" rel=\"noopener\" \
         style=\"display:inline-block;margin:6px 6px 0 0;padding:6px 10px;\
         border-radius:8px;background:#1e2a38;color:#e6eef7;border:1px solid #355;\
         text-decoration:none;font-size:12px;line-height:1.1;\">{label}</a>"
    )
}

/// The opaque annotation attached to every resolved system: outbound links
/// to the external lookup, market search and colonization tracker, each with
/// the system name percent-encoded into a fixed URL template. Downstream
/// components pass this through untouched.
pub fn link_markup(name: &str) -> String {
    let encoded = urlencoding::encode(name);
    format!(
        "<div class=\"links\">{}{}{}</div>",
        link_button(&format!("{INARA_BASE}{encoded}"), "Inara"),
        link_button(&format!("{SPANSH_SEARCH_BASE}{encoded}"), "Spansh"),
        link_button(&format!("{RAVEN_COLONIAL_BASE}{encoded}"), "Raven Colonial"),
    )
}

/// Normalize raw service records into the catalog's fill shape.
///
/// Entries lacking coordinates or a name are dropped; survivors get the
/// outbound-link annotation. Matching back to catalog placeholders is
/// case-insensitive on `name` and happens in `Catalog::fill_coordinates`.
pub fn normalize(raw: &[RawSystem]) -> Vec<ResolvedSystem> {
    raw.iter()
        .filter(|s| !s.name.is_empty())
        .filter_map(|s| {
            let c = s.coords?;
            Some(ResolvedSystem {
                name: s.name.clone(),
                coords: Coords::new(c.x, c.y, c.z),
                infos: link_markup(&s.name),
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
