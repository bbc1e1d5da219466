//! Per-batch composition of parsed CSV rows into catalog records.
//!
//! Every import batch carries a base label (the file or set name) and a
//! base category id minted for the batch. Rows with their own category
//! label compose it with the base as `"<label> (<base>)"` and mint one
//! fresh id per distinct composed label within the batch; rows without a
//! label fall back to the base id and base label.

use crate::{CategoryMinter, SystemRecord};
use starmap_ingest::CsvRow;
use std::collections::HashMap;

/// Outcome of composing one import batch.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    /// Records ready for `Catalog::merge`, batch order.
    pub records: Vec<SystemRecord>,
    /// Names still lacking coordinates, needing external resolution.
    pub pending: Vec<String>,
}

/// Compose parsed rows into records under a batch's base label and id.
pub fn import_batch(
    rows: &[CsvRow],
    base_label: &str,
    base_id: u32,
    minter: &mut CategoryMinter,
) -> ImportBatch {
    let mut label_ids: HashMap<String, u32> = HashMap::new();
    let mut records = Vec::with_capacity(rows.len());
    let mut pending = Vec::new();

    for row in rows {
        let (category, label) = match &row.category {
            Some(raw) => {
                let composed = format!("{raw} ({base_label})");
                let id = *label_ids
                    .entry(composed.clone())
                    .or_insert_with(|| minter.mint());
                (id, composed)
            }
            None => (base_id, base_label.to_string()),
        };

        let record = match row.coords {
            Some(xyz) => SystemRecord::resolved(row.name.clone(), xyz.into(), category, label),
            None => {
                pending.push(row.name.clone());
                SystemRecord::unresolved(row.name.clone(), category, label)
            }
        };
        records.push(record);
    }

    ImportBatch { records, pending }
}
