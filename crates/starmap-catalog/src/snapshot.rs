//! Renderer-facing projection of the catalog.
//!
//! The snapshot is the only shape that crosses into the render bridge:
//! resolved systems in catalog order plus a category legend table. Colors
//! for source categories are keyed by order of first appearance in the
//! catalog (`palette[ordinal % palette.len()]`); the reserved anchor and
//! searched entries carry fixed colors.

use crate::{
    Catalog, Coords, ANCHOR_CATEGORY, ANCHOR_NAME, SEARCHED_CATEGORY,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Legend colors for source categories, in assignment order.
pub const PALETTE: [&str; 10] = [
    "4FC3F7", "A1887F", "81C784", "CE93D8", "FFB74D", "64B5F6", "E57373", "9575CD", "4DB6AC",
    "F06292",
];

/// Fixed legend color of the anchor category.
pub const ANCHOR_COLOR: &str = "BBBBBB";
/// Fixed legend color of the searched category.
pub const SEARCHED_COLOR: &str = "F7A14F";

/// One system as the renderer sees it. The category list is reduced to the
/// record's first id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSystem {
    pub name: String,
    pub coords: Coords,
    pub cat: Vec<u32>,
    pub infos: String,
}

/// One legend entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub color: String,
}

/// Legend table, keyed by category id rendered as a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Categories {
    #[serde(rename = "Sources")]
    pub sources: BTreeMap<String, CategoryEntry>,
}

/// The renderer payload body: resolved systems plus the legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub systems: Vec<SnapshotSystem>,
    pub categories: Categories,
}

impl Catalog {
    /// Project the catalog into a renderer snapshot.
    ///
    /// Enforces the anchor invariant first, then filters to resolved
    /// records deduplicated by lowercase name in catalog order. The legend
    /// is built by scanning every record's first category id: id 3 is
    /// skipped (injected with its fixed entry afterwards), id 4 only flags
    /// the "Searched" entry, and each first-seen source id takes the
    /// first-seen label and the next palette color.
    pub fn build_payload(&mut self) -> CatalogSnapshot {
        self.ensure_anchor();

        let mut sources = BTreeMap::new();
        let mut has_searched = false;
        // (id, label) in order of first appearance.
        let mut first_seen: Vec<(u32, String)> = Vec::new();
        for record in self.records() {
            let Some(id) = record.primary_category() else {
                continue;
            };
            if id == ANCHOR_CATEGORY {
                continue;
            }
            if id == SEARCHED_CATEGORY {
                has_searched = true;
                continue;
            }
            if first_seen.iter().all(|(seen, _)| *seen != id) {
                let label = record
                    .category_label
                    .clone()
                    .unwrap_or_else(|| format!("Category {id}"));
                first_seen.push((id, label));
            }
        }
        for (ordinal, (id, label)) in first_seen.into_iter().enumerate() {
            sources.insert(
                id.to_string(),
                CategoryEntry {
                    name: label,
                    color: PALETTE[ordinal % PALETTE.len()].to_string(),
                },
            );
        }

        sources.insert(
            ANCHOR_CATEGORY.to_string(),
            CategoryEntry {
                name: ANCHOR_NAME.to_string(),
                color: ANCHOR_COLOR.to_string(),
            },
        );
        if has_searched {
            sources.insert(
                SEARCHED_CATEGORY.to_string(),
                CategoryEntry {
                    name: "Searched".to_string(),
                    color: SEARCHED_COLOR.to_string(),
                },
            );
        }

        let mut seen = std::collections::HashSet::new();
        let systems = self
            .records()
            .iter()
            .filter_map(|r| {
                let coords = r.coords.filter(Coords::is_finite)?;
                if !seen.insert(r.name.to_lowercase()) {
                    return None;
                }
                Some(SnapshotSystem {
                    name: r.name.clone(),
                    coords,
                    cat: r.primary_category().into_iter().collect(),
                    infos: r.infos.clone(),
                })
            })
            .collect();

        CatalogSnapshot {
            systems,
            categories: Categories { sources },
        }
    }
}
