//! The deduplicated in-memory star-system catalog.
//!
//! A `Catalog` owns the mutable set of named systems assembled from imports
//! and searches, and is the only component allowed to create or mutate
//! records:
//!
//! - `merge` inserts new records (first writer wins per name)
//! - `fill_coordinates` resolves placeholders in place, never overwriting
//! - `ensure_anchor` enforces the always-present "Sol" reference system
//! - `build_payload` projects the catalog into the renderer wire shape
//!
//! Identity is the lowercased system name. Category ids 3 ("Sol" anchor)
//! and 4 ("Searched") are reserved; every other id is a source category
//! minted per import batch.

pub mod import;
pub mod snapshot;

pub use import::{import_batch, ImportBatch};
pub use snapshot::{CatalogSnapshot, CategoryEntry, SnapshotSystem};

use serde::{Deserialize, Serialize};

// ============================================================================
// Core types
// ============================================================================

/// A 3-D position in the galactic frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coords {
    pub const ORIGIN: Coords = Coords {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Coords {
    fn from(v: [f64; 3]) -> Self {
        Coords::new(v[0], v[1], v[2])
    }
}

/// The anchor ("Sol") category id.
pub const ANCHOR_CATEGORY: u32 = 3;
/// The search-result category id.
pub const SEARCHED_CATEGORY: u32 = 4;
/// First id handed out for source categories.
pub const FIRST_SOURCE_CATEGORY: u32 = 10;

/// Fixed name of the anchor system.
pub const ANCHOR_NAME: &str = "Sol";

/// One catalog entry.
///
/// A record is "resolved" iff `coords` holds three finite numbers. `infos`
/// is an opaque markup annotation produced at resolution time and passed
/// through to the renderer untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemRecord {
    pub name: String,
    pub coords: Option<Coords>,
    pub categories: Vec<u32>,
    pub category_label: Option<String>,
    pub infos: String,
}

impl SystemRecord {
    /// A placeholder awaiting external resolution.
    pub fn unresolved(name: impl Into<String>, category: u32, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coords: None,
            categories: vec![category],
            category_label: Some(label.into()),
            infos: String::new(),
        }
    }

    /// A record with known coordinates.
    pub fn resolved(
        name: impl Into<String>,
        coords: Coords,
        category: u32,
        label: impl Into<String>,
    ) -> Self {
        Self {
            coords: Some(coords),
            ..Self::unresolved(name, category, label)
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.coords.map(|c| c.is_finite()).unwrap_or(false)
    }

    /// The category id the snapshot reduces this record to.
    pub fn primary_category(&self) -> Option<u32> {
        self.categories.first().copied()
    }

    fn identity(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Hands out fresh source-category ids.
///
/// Deliberately a value object owned by the caller rather than an ambient
/// counter, so batches stay reproducible under test.
#[derive(Debug, Clone)]
pub struct CategoryMinter {
    next: u32,
}

impl CategoryMinter {
    pub fn new() -> Self {
        Self {
            next: FIRST_SOURCE_CATEGORY,
        }
    }

    pub fn mint(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for CategoryMinter {
    fn default() -> Self {
        Self::new()
    }
}

/// A resolution hit in the catalog's fill shape: name, finite coordinates
/// and the opaque annotation to carry along.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSystem {
    pub name: String,
    pub coords: Coords,
    pub infos: String,
}

// ============================================================================
// Catalog
// ============================================================================

/// The deduplicated, mutable collection of system records.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<SystemRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in catalog order.
    pub fn records(&self) -> &[SystemRecord] {
        &self.records
    }

    /// Number of records with finite coordinates.
    pub fn resolved_len(&self) -> usize {
        self.records.iter().filter(|r| r.is_resolved()).count()
    }

    /// Names of records still lacking finite coordinates, catalog order.
    pub fn unresolved_names(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.is_resolved())
            .map(|r| r.name.clone())
            .collect()
    }

    /// Case-insensitive exact lookup.
    pub fn get(&self, name: &str) -> Option<&SystemRecord> {
        let key = name.to_lowercase();
        self.records.iter().find(|r| r.identity() == key)
    }

    /// Insert records that are not already present.
    ///
    /// Identity is the lowercased name; existing entries are never
    /// overwritten, so the first writer wins per name. Records with empty
    /// names are dropped. Unresolved placeholders are inserted as-is and
    /// may remain in the catalog. Returns the number of records inserted.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = SystemRecord>) -> usize {
        let mut present: std::collections::HashSet<String> =
            self.records.iter().map(|r| r.identity()).collect();
        let mut added = 0;
        for record in incoming {
            if record.name.is_empty() {
                continue;
            }
            let key = record.identity();
            if present.contains(&key) {
                tracing::debug!(name = %record.name, "merge: duplicate name skipped");
                continue;
            }
            present.insert(key);
            self.records.push(record);
            added += 1;
        }
        added
    }

    /// Assign coordinates to unresolved placeholders.
    ///
    /// For each hit, the first record lacking coordinates whose name
    /// matches case-insensitively receives the hit's coordinates and
    /// annotation. Hits with no matching placeholder are ignored; only
    /// `merge` creates records. Returns how many records were filled.
    pub fn fill_coordinates(&mut self, hits: &[ResolvedSystem]) -> usize {
        fill_records(&mut self.records, hits)
    }

    /// Guarantee the anchor system is present and well-formed.
    ///
    /// Idempotent. "Sol" sits at the origin under category 3; if a record
    /// with that name exists under a different category its coordinates,
    /// category and label are reset. The renderer treats single-system
    /// catalogs as degenerate, so the anchor also guarantees at least two
    /// entries once anything is imported.
    pub fn ensure_anchor(&mut self) {
        let key = ANCHOR_NAME.to_lowercase();
        match self.records.iter_mut().find(|r| r.identity() == key) {
            Some(record) => {
                if record.primary_category() != Some(ANCHOR_CATEGORY) {
                    record.coords = Some(Coords::ORIGIN);
                    record.categories = vec![ANCHOR_CATEGORY];
                    record.category_label = Some(ANCHOR_NAME.to_string());
                }
            }
            None => {
                self.records.push(SystemRecord::resolved(
                    ANCHOR_NAME,
                    Coords::ORIGIN,
                    ANCHOR_CATEGORY,
                    ANCHOR_NAME,
                ));
            }
        }
    }

    /// Mean position of resolved records outside the anchor category.
    ///
    /// `None` when no such record exists.
    pub fn centroid(&self) -> Option<Coords> {
        let mut sum = Coords::ORIGIN;
        let mut n = 0usize;
        for record in &self.records {
            let Some(coords) = record.coords.filter(Coords::is_finite) else {
                continue;
            };
            if record.primary_category() == Some(ANCHOR_CATEGORY) {
                continue;
            }
            sum.x += coords.x;
            sum.y += coords.y;
            sum.z += coords.z;
            n += 1;
        }
        if n == 0 {
            None
        } else {
            let n = n as f64;
            Some(Coords::new(sum.x / n, sum.y / n, sum.z / n))
        }
    }

    /// Empty the catalog. The anchor is re-created by the next
    /// `build_payload`.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Fill unresolved records in a batch that has not been merged yet.
///
/// Same matching rule as `Catalog::fill_coordinates`: first coordless
/// record with a case-insensitive name match wins; hits without a matching
/// placeholder are ignored. The import pipeline resolves a batch before
/// merging it, so a failed resolution leaves the catalog untouched.
pub fn fill_records(records: &mut [SystemRecord], hits: &[ResolvedSystem]) -> usize {
    let mut filled = 0;
    for hit in hits {
        let key = hit.name.to_lowercase();
        let slot = records
            .iter_mut()
            .find(|r| r.coords.is_none() && r.identity() == key);
        match slot {
            Some(record) => {
                record.coords = Some(hit.coords);
                record.infos = hit.infos.clone();
                filled += 1;
            }
            None => {
                tracing::debug!(name = %hit.name, "fill: no unresolved placeholder for hit");
            }
        }
    }
    filled
}

// ============================================================================
// Tests
// ============================================================================
