use proptest::prelude::*;
use starmap_catalog::{Catalog, Coords, ResolvedSystem, SystemRecord, ANCHOR_CATEGORY};

fn arb_name() -> impl Strategy<Value = String> {
    // Short alphanumeric names plus a few fixed ones so case collisions and
    // the anchor name actually occur.
    prop_oneof![
        "[A-Za-z][A-Za-z0-9 ]{0,8}",
        Just("Sol".to_string()),
        Just("sol".to_string()),
        Just("Wolf 359".to_string()),
    ]
}

fn arb_record() -> impl Strategy<Value = SystemRecord> {
    // Category 3 is reserved for the anchor; imports and searches can only
    // produce ids 4 and up, so the generator stays inside that contract.
    (
        arb_name(),
        proptest::option::of((-1e4f64..1e4, -1e4f64..1e4, -1e4f64..1e4)),
        4u32..40,
    )
        .prop_map(|(name, coords, cat)| SystemRecord {
            name,
            coords: coords.map(|(x, y, z)| Coords::new(x, y, z)),
            categories: vec![cat],
            category_label: None,
            infos: String::new(),
        })
}

proptest! {
    #[test]
    fn no_two_records_share_an_identity(batches in proptest::collection::vec(
        proptest::collection::vec(arb_record(), 0..8), 0..4)) {
        let mut catalog = Catalog::new();
        for batch in batches {
            catalog.merge(batch);
        }
        let mut seen = std::collections::HashSet::new();
        for record in catalog.records() {
            prop_assert!(seen.insert(record.name.to_lowercase()));
        }
    }

    #[test]
    fn merging_twice_adds_nothing(batch in proptest::collection::vec(arb_record(), 0..8)) {
        let mut catalog = Catalog::new();
        catalog.merge(batch.clone());
        let len = catalog.len();
        let added = catalog.merge(batch);
        prop_assert_eq!(added, 0);
        prop_assert_eq!(catalog.len(), len);
    }

    #[test]
    fn payload_upholds_the_anchor_invariant(
        batch in proptest::collection::vec(arb_record(), 0..8),
        hits in proptest::collection::vec(
            (arb_name(), -1e4f64..1e4, -1e4f64..1e4, -1e4f64..1e4), 0..4),
    ) {
        let mut catalog = Catalog::new();
        catalog.merge(batch);
        let hits: Vec<ResolvedSystem> = hits
            .into_iter()
            .map(|(name, x, y, z)| ResolvedSystem {
                name,
                coords: Coords::new(x, y, z),
                infos: String::new(),
            })
            .collect();
        catalog.fill_coordinates(&hits);

        let snapshot = catalog.build_payload();
        let anchors: Vec<_> = snapshot
            .systems
            .iter()
            .filter(|s| s.name.to_lowercase() == "sol")
            .collect();
        prop_assert_eq!(anchors.len(), 1);
        prop_assert_eq!(&anchors[0].cat, &vec![ANCHOR_CATEGORY]);
        prop_assert_eq!(anchors[0].coords, Coords::ORIGIN);
    }

    #[test]
    fn fill_never_changes_resolved_coordinates(
        batch in proptest::collection::vec(arb_record(), 0..8),
        hits in proptest::collection::vec(
            (arb_name(), -1e4f64..1e4, -1e4f64..1e4, -1e4f64..1e4), 0..4),
    ) {
        let mut catalog = Catalog::new();
        catalog.merge(batch);
        let before: Vec<Option<Coords>> = catalog
            .records()
            .iter()
            .map(|r| r.coords)
            .collect();
        let hits: Vec<ResolvedSystem> = hits
            .into_iter()
            .map(|(name, x, y, z)| ResolvedSystem {
                name,
                coords: Coords::new(x, y, z),
                infos: String::new(),
            })
            .collect();
        catalog.fill_coordinates(&hits);
        for (record, old) in catalog.records().iter().zip(before) {
            if old.is_some() {
                prop_assert_eq!(record.coords, old);
            }
        }
    }
}
