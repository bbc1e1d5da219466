//! One shell session: the shared catalog plus the import, search, clear
//! and render flows that mutate it.
//!
//! Every flow ends by rebuilding the payload and handing it to the render
//! bridge, then reporting the acknowledgement as status text. Flows catch
//! nothing themselves; the dispatch layer above turns failures into
//! `Error: …` lines so the session survives them.

use crate::status::{detail, plural, status};
use anyhow::{anyhow, Context, Result};
use starmap_catalog::{
    fill_records, import_batch, Catalog, CategoryMinter, Coords, SystemRecord,
};
use starmap_ingest::{parse_csv, parse_names};
use starmap_render::{RenderAck, RenderBridge};
use starmap_resolve::{normalize, resolve_batch, RateLimit, SystemLookup};
use starmap_search::SearchOutcome;
use std::path::Path;

pub struct Session {
    pub catalog: Catalog,
    minter: CategoryMinter,
    limit: RateLimit,
    lookup: Box<dyn SystemLookup>,
    bridge: RenderBridge,
}

impl Session {
    pub fn new(lookup: Box<dyn SystemLookup>, bridge: RenderBridge) -> Self {
        Self {
            catalog: Catalog::new(),
            minter: CategoryMinter::new(),
            limit: RateLimit::default(),
            lookup,
            bridge,
        }
    }

    /// Read and import one file as one batch. The base label is the file
    /// name; the format is picked by extension.
    pub async fn import_file(&mut self, path: &Path) -> Result<()> {
        let base_label = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("not a file path: {}", path.display()))?
            .to_string();
        status(&format!("Reading {base_label}…"));
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let is_csv = base_label.to_lowercase().ends_with(".csv");
        self.import_text(&base_label, is_csv, &text).await
    }

    /// Import raw content as one batch under `base_label`.
    ///
    /// Rows without inline coordinates are resolved against the external
    /// service before anything is merged, so a resolution failure leaves
    /// the catalog exactly as it was.
    pub async fn import_text(&mut self, base_label: &str, is_csv: bool, text: &str) -> Result<()> {
        let base_id = self.minter.mint();
        let (mut records, pending) = if is_csv {
            let rows = parse_csv(text);
            let batch = import_batch(&rows, base_label, base_id, &mut self.minter);
            (batch.records, batch.pending)
        } else {
            let names = parse_names(text);
            let records: Vec<SystemRecord> = names
                .iter()
                .map(|n| SystemRecord::unresolved(n.clone(), base_id, base_label))
                .collect();
            (records, names)
        };

        if records.is_empty() {
            status(&format!("No systems found in {base_label}."));
            return Ok(());
        }

        if !pending.is_empty() {
            status(&format!(
                "Querying coordinate service for {} {}…",
                pending.len(),
                plural(pending.len(), "system", "systems"),
            ));
            let raw = resolve_batch(self.lookup.as_ref(), &pending, &self.limit, &mut |m| {
                status(m)
            })
            .await?;
            let hits = normalize(&raw);
            fill_records(&mut records, &hits);
        }

        let added = self.catalog.merge(records);
        tracing::debug!(added, batch = base_label, "batch merged");

        let focus = self.catalog.centroid();
        self.render_current(None, focus).await?;
        Ok(())
    }

    /// Resolve a query to a system and center the camera on it.
    pub async fn search(&mut self, query: &str) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            status("Type a system name to search.");
            return Ok(());
        }

        let outcome = starmap_search::resolve(
            &mut self.catalog,
            self.lookup.as_ref(),
            &self.limit,
            query,
            &mut |m| status(m),
        )
        .await?;

        match outcome {
            SearchOutcome::Found { name, coords, .. } => {
                status(&format!("Centering via focus: {name} …"));
                self.render_current(Some(&name), Some(coords)).await?;
            }
            SearchOutcome::NotFound => {
                status(&format!(
                    "System \"{query}\" not found or has no coordinates."
                ));
            }
        }
        Ok(())
    }

    /// Empty the catalog and render the bare anchor.
    pub async fn clear(&mut self) -> Result<()> {
        self.catalog.clear();
        status("Cleared.");
        let focus = self.catalog.centroid();
        self.render_current(None, focus).await?;
        Ok(())
    }

    /// Re-render the current catalog, centered on its centroid.
    pub async fn render(&mut self) -> Result<()> {
        let focus = self.catalog.centroid();
        self.render_current(None, focus).await?;
        Ok(())
    }

    /// Print catalog counts without touching anything.
    pub fn summary(&self) {
        let total = self.catalog.len();
        let resolved = self.catalog.resolved_len();
        status(&format!(
            "{total} {} in catalog, {resolved} resolved.",
            plural(total, "system", "systems"),
        ));
        let missing = self.catalog.unresolved_names();
        if !missing.is_empty() {
            detail(&missing.join(", "));
        }
    }

    async fn render_current(
        &mut self,
        focus_label: Option<&str>,
        focus: Option<Coords>,
    ) -> Result<RenderAck> {
        let snapshot = self.catalog.build_payload();
        let focus_triple = focus.map(|c| [c.x, c.y, c.z]);
        let ack = self.bridge.render(snapshot, focus_triple).await?;

        let mut msg = match focus_label {
            Some(label) if ack.centered => format!(
                "Centered on {label}. Rendered {} {}.",
                ack.rendered_systems,
                plural(ack.rendered_systems, "system", "systems"),
            ),
            _ => format!(
                "Rendered {} {}.",
                ack.rendered_systems,
                plural(ack.rendered_systems, "system", "systems"),
            ),
        };
        let missing = self.catalog.unresolved_names();
        if !missing.is_empty() {
            msg.push_str(&format!(
                " Could not find coordinates for {} {}.",
                missing.len(),
                plural(missing.len(), "system", "systems"),
            ));
        }
        status(&msg);
        if !missing.is_empty() {
            detail(&missing.join(", "));
        }
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starmap_catalog::{ANCHOR_CATEGORY, SEARCHED_CATEGORY};
    use starmap_render::mock::RecordingFactory;
    use starmap_resolve::{MockLookup, RawCoords, RawSystem};

    fn session_with(lookup: MockLookup) -> (Session, std::sync::Arc<std::sync::Mutex<Vec<(u64, starmap_render::RenderPayload)>>>) {
        let factory = RecordingFactory::new();
        let log = factory.handle();
        let bridge = RenderBridge::new(Box::new(factory));
        (Session::new(Box::new(lookup), bridge), log)
    }

    #[tokio::test(start_paused = true)]
    async fn csv_import_with_inline_coordinates_skips_the_network() {
        let lookup = MockLookup::with_responses(vec![]);
        let (mut session, log) = session_with(lookup);
        session
            .import_text("file1.csv", true, "Wolf 359,,-7.78,7.76,-3.25\n")
            .await
            .unwrap();

        let record = session.catalog.get("Wolf 359").unwrap();
        assert!(record.is_resolved());

        let deliveries = log.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
        // Wolf 359 plus the anchor.
        assert_eq!(deliveries[0].1.snapshot.systems.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn plain_text_import_resolves_names_externally() {
        let (mut session, _log) = session_with(MockLookup::echoing());
        session
            .import_text("names.txt", false, "Achenar\nAltair\n")
            .await
            .unwrap();
        assert_eq!(session.catalog.resolved_len(), 2);
        assert!(session.catalog.get("Altair").unwrap().infos.contains("spansh"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_resolution_leaves_the_catalog_untouched() {
        let (mut session, log) = session_with(MockLookup::failing_on_call(1, 500, "down"));
        let err = session
            .import_text("names.txt", false, "Achenar\n")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(session.catalog.is_empty());
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unresolvable_names_stay_as_placeholders() {
        let lookup = MockLookup::with_responses(vec![vec![RawSystem {
            name: "Achenar".to_string(),
            coords: Some(RawCoords {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            }),
        }]]);
        let (mut session, _log) = session_with(lookup);
        session
            .import_text("names.txt", false, "Achenar\nImaginary Place\n")
            .await
            .unwrap();
        assert_eq!(session.catalog.len(), 3); // two imports plus the anchor
        assert_eq!(
            session.catalog.unresolved_names(),
            vec!["Imaginary Place".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn search_inserts_and_centers_on_an_external_hit() {
        let lookup = MockLookup::with_responses(vec![vec![RawSystem {
            name: "Achenar".to_string(),
            coords: Some(RawCoords {
                x: 67.5,
                y: -119.47,
                z: 24.84,
            }),
        }]]);
        let (mut session, log) = session_with(lookup);
        session.search("achenar").await.unwrap();

        let record = session.catalog.get("Achenar").unwrap();
        assert_eq!(record.categories, vec![SEARCHED_CATEGORY]);

        let deliveries = log.lock().unwrap();
        assert_eq!(deliveries[0].1.focus, Some([67.5, -119.47, 24.84]));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_renders_the_bare_anchor() {
        let (mut session, log) = session_with(MockLookup::echoing());
        session
            .import_text("names.txt", false, "Achenar\n")
            .await
            .unwrap();
        session.clear().await.unwrap();

        let deliveries = log.lock().unwrap();
        let last = &deliveries.last().unwrap().1;
        assert_eq!(last.snapshot.systems.len(), 1);
        assert_eq!(last.snapshot.systems[0].name, "Sol");
        assert_eq!(last.snapshot.systems[0].cat, vec![ANCHOR_CATEGORY]);
        assert_eq!(last.focus, None);
    }

    #[tokio::test(start_paused = true)]
    async fn second_import_never_overwrites_resolved_records() {
        let (mut session, _log) = session_with(MockLookup::with_responses(vec![]));
        session
            .import_text("a.csv", true, "Alpha,,1,2,3\n")
            .await
            .unwrap();
        session
            .import_text("b.csv", true, "Alpha,,4,5,6\n")
            .await
            .unwrap();
        let record = session.catalog.get("alpha").unwrap();
        assert_eq!(record.coords, Some(Coords::new(1.0, 2.0, 3.0)));
    }
}
