//! Integration tests for the complete starmap pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - CSV/text extraction → batch composition → resolution → merge
//! - Catalog → snapshot → render bridge → acknowledgement
//! - Search → external fallback → catalog insertion
//!
//! Run with: cargo test --test integration_tests

use starmap_catalog::{
    fill_records, import_batch, Catalog, CategoryMinter, Coords, ANCHOR_CATEGORY,
    SEARCHED_CATEGORY,
};
use starmap_ingest::{extract_names, parse_csv};
use starmap_render::mock::RecordingFactory;
use starmap_render::{JsonFileSurface, RenderBridge, RenderSurface};
use starmap_resolve::{normalize, resolve_batch, MockLookup, RateLimit, RawCoords, RawSystem};
use starmap_search::{MatchSource, SearchOutcome};

fn raw(name: &str, x: f64, y: f64, z: f64) -> RawSystem {
    RawSystem {
        name: name.to_string(),
        coords: Some(RawCoords { x, y, z }),
    }
}

// ============================================================================
// Import → resolve → merge → render
// ============================================================================

#[tokio::test(start_paused = true)]
async fn csv_import_resolves_merges_and_renders() {
    let text = "Name,Category\nSol,Core\nAlpha Centauri,Core\nWolf 359,,-7.78,7.76,-3.25\n";
    let rows = parse_csv(text);
    assert_eq!(rows.len(), 3);

    let mut minter = CategoryMinter::new();
    let base_id = minter.mint();
    let mut batch = import_batch(&rows, "file1.csv", base_id, &mut minter);

    // Only the rows without inline coordinates go out to the service.
    assert_eq!(batch.pending, vec!["Sol", "Alpha Centauri"]);

    let lookup = MockLookup::with_responses(vec![vec![
        raw("Sol", 0.0, 0.0, 0.0),
        raw("Alpha Centauri", 3.03, -0.09, 3.16),
    ]]);
    let raw_hits = resolve_batch(&lookup, &batch.pending, &RateLimit::default(), &mut |_| {})
        .await
        .unwrap();
    let filled = fill_records(&mut batch.records, &normalize(&raw_hits));
    assert_eq!(filled, 2);

    let mut catalog = Catalog::new();
    catalog.merge(batch.records);
    assert_eq!(catalog.resolved_len(), 3);

    // Both labeled rows share one composed category.
    let a = catalog.get("Sol").unwrap();
    let b = catalog.get("Alpha Centauri").unwrap();
    assert_eq!(a.category_label.as_deref(), Some("Core (file1.csv)"));
    assert_eq!(a.categories, b.categories);

    let factory = RecordingFactory::new();
    let log = factory.handle();
    let mut bridge = RenderBridge::new(Box::new(factory));
    let focus = catalog.centroid().map(|c| [c.x, c.y, c.z]);
    let ack = bridge.render(catalog.build_payload(), focus).await.unwrap();

    assert_eq!(ack.rendered_systems, 3);
    assert!(ack.centered);
    let deliveries = log.lock().unwrap();
    assert_eq!(deliveries.len(), 1);
    let payload = &deliveries[0].1;
    assert!(payload
        .snapshot
        .categories
        .sources
        .contains_key(&ANCHOR_CATEGORY.to_string()));
}

#[tokio::test(start_paused = true)]
async fn failed_group_discards_the_whole_import() {
    let names: Vec<String> = (0..250).map(|i| format!("System {i}")).collect();
    let lookup = MockLookup::failing_on_call(2, 503, "unavailable");

    let err = resolve_batch(&lookup, &names, &RateLimit::default(), &mut |_| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"));

    // Nothing was merged, so the catalog still renders only the anchor.
    let mut catalog = Catalog::new();
    let snapshot = catalog.build_payload();
    assert_eq!(snapshot.systems.len(), 1);
    assert_eq!(snapshot.systems[0].name, "Sol");
}

#[tokio::test(start_paused = true)]
async fn reimporting_the_same_set_changes_nothing() {
    let text = "Duamta\nLuyten 674-15\n";
    let names = extract_names("fleet.txt", text);

    let mut catalog = Catalog::new();
    let mut minter = CategoryMinter::new();
    for _round in 0..2 {
        let base_id = minter.mint();
        let rows: Vec<starmap_ingest::CsvRow> = names
            .iter()
            .map(|n| starmap_ingest::CsvRow {
                name: n.clone(),
                category: None,
                coords: None,
            })
            .collect();
        let mut batch = import_batch(&rows, "fleet.txt", base_id, &mut minter);
        let lookup = MockLookup::echoing();
        let hits = resolve_batch(&lookup, &batch.pending, &RateLimit::default(), &mut |_| {})
            .await
            .unwrap();
        fill_records(&mut batch.records, &normalize(&hits));
        catalog.merge(batch.records);
    }

    assert_eq!(catalog.len(), 2);
    // The first batch's category survives; the second import was a no-op.
    assert_eq!(
        catalog.get("Duamta").unwrap().categories,
        vec![starmap_catalog::FIRST_SOURCE_CATEGORY]
    );
}

// ============================================================================
// Search → catalog → render
// ============================================================================

#[tokio::test(start_paused = true)]
async fn search_prefers_memory_and_falls_back_to_the_service() {
    let mut catalog = Catalog::new();
    catalog.merge([
        starmap_catalog::SystemRecord::resolved(
            "Alpha Centauri",
            Coords::new(3.03, -0.09, 3.16),
            10,
            "file1",
        ),
        starmap_catalog::SystemRecord::resolved(
            "Alphard",
            Coords::new(139.9, 84.3, 40.6),
            10,
            "file1",
        ),
    ]);

    let lookup = MockLookup::with_responses(vec![vec![raw("Achenar", 67.5, -119.47, 24.84)]]);
    let limit = RateLimit::default();

    let outcome = starmap_search::resolve(&mut catalog, &lookup, &limit, "alpha", &mut |_| {})
        .await
        .unwrap();
    match outcome {
        SearchOutcome::Found { name, source, .. } => {
            assert_eq!(name, "Alpha Centauri");
            assert_eq!(source, MatchSource::Memory);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(lookup.calls().is_empty());

    let outcome = starmap_search::resolve(&mut catalog, &lookup, &limit, "Achenar", &mut |_| {})
        .await
        .unwrap();
    match outcome {
        SearchOutcome::Found { name, source, coords } => {
            assert_eq!(name, "Achenar");
            assert_eq!(source, MatchSource::External);

            // The searched system lands in the catalog and its snapshot
            // legend gains the Searched entry.
            let snapshot = catalog.build_payload();
            let searched = &snapshot.categories.sources[&SEARCHED_CATEGORY.to_string()];
            assert_eq!(searched.name, "Searched");

            let factory = RecordingFactory::new();
            let log = factory.handle();
            let mut bridge = RenderBridge::new(Box::new(factory));
            let ack = bridge
                .render(snapshot, Some([coords.x, coords.y, coords.z]))
                .await
                .unwrap();
            assert!(ack.centered);
            assert_eq!(log.lock().unwrap()[0].0, 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn json_surface_writes_a_readable_payload_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("payload.json");

    let mut catalog = Catalog::new();
    catalog.merge([starmap_catalog::SystemRecord::resolved(
        "Alpha Centauri",
        Coords::new(3.03, -0.09, 3.16),
        10,
        "file1",
    )]);

    let surface_path = path.clone();
    let factory = move |_session: u64| {
        Box::new(JsonFileSurface::new(surface_path.clone())) as Box<dyn RenderSurface>
    };
    let mut bridge = RenderBridge::new(Box::new(factory));
    let ack = bridge.render(catalog.build_payload(), None).await.unwrap();
    assert_eq!(ack.rendered_systems, 2);
    assert!(!ack.centered);

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["systems"][0]["name"], "Alpha Centauri");
    assert_eq!(value["categories"]["Sources"]["10"]["name"], "file1");
    assert_eq!(value["categories"]["Sources"]["10"]["color"], "4FC3F7");
    assert_eq!(value["categories"]["Sources"]["3"]["color"], "BBBBBB");
    assert_eq!(value["focus"], serde_json::Value::Null);
}

#[tokio::test(start_paused = true)]
async fn case_variant_names_stay_one_catalog_entry() {
    let mut catalog = Catalog::new();
    let mut minter = CategoryMinter::new();
    let base_id = minter.mint();

    let rows = parse_csv("Sol,,0,0,0\nsol,,1,1,1\n");
    let batch = import_batch(&rows, "dupes.csv", base_id, &mut minter);
    catalog.merge(batch.records);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get("SOL").unwrap().coords, Some(Coords::ORIGIN));

    // The anchor invariant then renormalizes the surviving record.
    let snapshot = catalog.build_payload();
    assert_eq!(snapshot.systems.len(), 1);
    assert_eq!(snapshot.systems[0].cat, vec![ANCHOR_CATEGORY]);
}
