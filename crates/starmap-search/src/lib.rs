//! Resolve a user-typed query to a single system and a camera focus.
//!
//! Priority order:
//! 1. in-memory, over catalog order: case-insensitive exact match, else
//!    prefix match, else substring match, first hit per stage wins
//! 2. external: a singleton lookup of the raw query against the coordinate
//!    service; a successful hit is inserted under the "Searched" category
//!    (unless a record already carries that name)
//!
//! A record counts as a memory hit only with finite coordinates; an
//! unresolved match falls through to the external step. `NotFound` is a
//! reportable status, not an error. One invocation performs at most one
//! external call; overlapping invocations are not queued or cancelled, the
//! last to complete simply applies last.

use starmap_catalog::{Catalog, Coords, SystemRecord, SEARCHED_CATEGORY};
use starmap_resolve::{normalize, resolve_batch, RateLimit, ResolveError, SystemLookup};

/// Where the winning record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Memory,
    External,
}

/// Outcome of one search. `coords` doubles as the center-camera focus.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found {
        name: String,
        coords: Coords,
        source: MatchSource,
    },
    NotFound,
}

fn memory_hit<'a>(catalog: &'a Catalog, query: &str) -> Option<&'a SystemRecord> {
    let q = query.to_lowercase();
    let records = catalog.records();
    records
        .iter()
        .find(|r| r.name.to_lowercase() == q)
        .or_else(|| records.iter().find(|r| r.name.to_lowercase().starts_with(&q)))
        .or_else(|| records.iter().find(|r| r.name.to_lowercase().contains(&q)))
}

/// Resolve `query` against the catalog, falling back to the external
/// service.
///
/// `on_progress` receives the same status messages an import resolution
/// would, plus the not-in-memory notice before the external call.
pub async fn resolve(
    catalog: &mut Catalog,
    lookup: &dyn SystemLookup,
    limit: &RateLimit,
    query: &str,
    on_progress: &mut dyn FnMut(&str),
) -> Result<SearchOutcome, ResolveError> {
    if let Some(hit) = memory_hit(catalog, query) {
        if let Some(coords) = hit.coords.filter(Coords::is_finite) {
            return Ok(SearchOutcome::Found {
                name: hit.name.clone(),
                coords,
                source: MatchSource::Memory,
            });
        }
        tracing::debug!(name = %hit.name, "memory match lacks coordinates, trying external");
    }

    on_progress(&format!(
        "Not in memory. Querying coordinate service for \"{query}\"…"
    ));
    let raw = resolve_batch(lookup, &[query.to_string()], limit, on_progress).await?;
    let Some(hit) = normalize(&raw)
        .into_iter()
        .find(|h| h.coords.is_finite())
    else {
        return Ok(SearchOutcome::NotFound);
    };

    if catalog.get(&hit.name).is_none() {
        catalog.merge([SystemRecord {
            name: hit.name.clone(),
            coords: Some(hit.coords),
            categories: vec![SEARCHED_CATEGORY],
            category_label: Some("Searched".to_string()),
            infos: hit.infos.clone(),
        }]);
    }

    Ok(SearchOutcome::Found {
        name: hit.name,
        coords: hit.coords,
        source: MatchSource::External,
    })
}
