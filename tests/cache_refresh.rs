//! End-to-end behaviour of building, caching, refreshing, and bulk-evicting
//! map sets through a `MapSetStore`.

mod helpers;

use chrono::TimeDelta;
use helpers::{address, fixture, map_set_list, rec, scalar_list};
use mapset::{Element, MapSetDefinition};
use std::sync::Arc;

#[test]
fn variant_follows_source_content() {
    let f = fixture();
    let def = Arc::new(MapSetDefinition::fixed("forms", "mixed"));

    let scalar = f
        .store
        .create_from_dom(&scalar_list(&[("A", "1"), ("B", "2")]), Arc::clone(&def), "s")
        .unwrap();
    assert!(scalar.value().is_scalar());

    let mut recs: Vec<Element> = (0..9)
        .map(|i| rec(&format!("K{i}"), Element::leaf("data", i.to_string())))
        .collect();
    recs.push(rec("Home", address("1 Main St", "Leeds")));
    let mixed = f
        .store
        .create_from_dom(&map_set_list(recs), def, "m")
        .unwrap();
    assert!(!mixed.value().is_scalar());
    assert_eq!(mixed.entries().len(), 10);
    assert_eq!(mixed.field_options().len(), 10);
    let keys: Vec<&str> = mixed.entries().iter().map(|e| e.key()).collect();
    assert_eq!(keys[0], "K0");
    assert_eq!(keys[9], "Home");
}

#[test]
fn rendered_tree_round_trips_records() {
    let f = fixture();
    let def = Arc::new(MapSetDefinition::fixed("forms", "letters"));
    let source = scalar_list(&[("A", "1"), ("B", "2")]);
    let map_set = f.store.create_from_dom(&source, def, "letters").unwrap();

    let rendered = map_set.to_dom();
    assert_eq!(rendered, source);
    assert_eq!(
        rendered.to_xml_string(),
        "<map-set-list><map-set>\
         <rec><key>A</key><data>1</data></rec>\
         <rec><key>B</key><data>2</data></rec>\
         </map-set></map-set-list>"
    );
}

#[test]
fn structured_lookup_by_superset() {
    let f = fixture();
    let def = Arc::new(MapSetDefinition::fixed("forms", "offices"));
    let source = map_set_list([
        rec("HQ", address("1 Main St", "Leeds").with_child(Element::leaf("floor", "3"))),
        rec("Depot", address("9 Dock Rd", "Hull")),
    ]);
    let map_set = f.store.create_from_dom(&source, def, "offices").unwrap();

    let probe = address("1 Main St", "Leeds").renamed("OFFICE");
    assert_eq!(map_set.index_of(&probe), Some(0));
    assert_eq!(map_set.key_for(&probe), "HQ");

    let disjoint = Element::new("OFFICE").with_child(Element::leaf("postcode", "HU1"));
    assert_eq!(map_set.index_of(&disjoint), None);
    assert_eq!(map_set.key_for(&disjoint), "");

    for raw in ["HQ", "Leeds", "", "0"] {
        assert_eq!(map_set.key_for_data_string(raw), None);
    }
}

#[test]
fn refresh_policy_follows_definition() {
    let f = fixture();
    let build = |def: MapSetDefinition| {
        f.store
            .create_from_dom(&scalar_list(&[("A", "1")]), Arc::new(def), "k")
            .unwrap()
    };
    let fixed = build(MapSetDefinition::fixed("forms", "fixed"));
    let always = build(MapSetDefinition::dynamic("forms", "always", 0));
    let timed = build(MapSetDefinition::dynamic("forms", "timed", 5));

    assert!(!f.store.is_refresh_required(&fixed));
    assert!(f.store.is_refresh_required(&always));
    assert!(!f.store.is_refresh_required(&timed));

    f.clock.advance(TimeDelta::minutes(4));
    assert!(!f.store.is_refresh_required(&timed));

    f.clock.advance(TimeDelta::minutes(2));
    assert!(f.store.is_refresh_required(&timed));
    assert!(f.store.is_refresh_required(&always));

    f.clock.advance(TimeDelta::days(365));
    assert!(!f.store.is_refresh_required(&fixed));
}

#[test]
fn added_instance_is_served_from_cache() {
    let f = fixture();
    let def = Arc::new(MapSetDefinition::fixed("forms", "letters"));
    let built = f
        .store
        .create_from_dom(&scalar_list(&[("A", "1"), ("B", "2")]), def, "letters/en")
        .unwrap();
    let expected = built.value().clone();

    let added = f.store.add_to_cache(built).unwrap();
    let cached = f.store.get_from_cache("letters/en").unwrap();
    assert!(Arc::ptr_eq(&added, &cached));
    assert_eq!(cached.value(), &expected);
    assert!(f.store.get_from_cache("letters/fr").is_none());
}

#[test]
fn bulk_refresh_evicts_only_the_given_definition() {
    let f = fixture();
    let d = Arc::new(MapSetDefinition::dynamic("forms", "D", 10));
    let e = Arc::new(MapSetDefinition::dynamic("forms", "E", 10));
    for (def, key) in [(&d, "k1"), (&d, "k2"), (&d, "k3"), (&e, "k4")] {
        let map_set = f
            .store
            .create_from_dom(&scalar_list(&[(key, "v")]), Arc::clone(def), key)
            .unwrap();
        f.store.add_to_cache(map_set).unwrap();
    }

    assert_eq!(f.store.refresh_map_sets(&d), 3);
    for key in ["k1", "k2", "k3"] {
        assert!(f.store.get_from_cache(key).is_none(), "{key} still cached");
    }
    assert!(f.store.get_from_cache("k4").is_some());
    assert_eq!(f.store.tracker().tracked_keys(&e.id), ["k4"]);

    let fresh = f
        .store
        .create_from_dom(&scalar_list(&[("k5", "v")]), Arc::clone(&d), "k5")
        .unwrap();
    f.store.add_to_cache(fresh).unwrap();
    assert_eq!(f.store.tracker().tracked_keys(&d.id), ["k5"]);
    assert_eq!(f.store.refresh_map_sets(&d), 1);
}

#[test]
fn get_or_build_rebuilds_after_bulk_refresh() {
    let f = fixture();
    let def = Arc::new(MapSetDefinition::fixed("forms", "letters"));
    let mut version = 0;
    let mut next = || -> anyhow::Result<Element> {
        version += 1;
        let data = version.to_string();
        Ok(scalar_list(&[("A", data.as_str())]))
    };

    let first = f.store.get_or_build(&def, "letters", &mut next).unwrap();
    let again = f.store.get_or_build(&def, "letters", &mut next).unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    f.store.refresh_map_sets(&def);
    let rebuilt = f.store.get_or_build(&def, "letters", &mut next).unwrap();
    assert_eq!(rebuilt.key_for_data_string("2"), Some("A"));
    assert!(f.cache.contains_key("letters"));
}
