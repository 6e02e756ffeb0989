//! End-to-end behaviour of the graph model, layout, gestures and persistence,
//! driven only through the public API.

#![allow(unused_crate_dependencies)]

use std::f64::consts::{PI, TAU};

use rand::SeedableRng;
use rand::rngs::StdRng;
use relationship_web::graph::{Attitude, AttitudeView, EntityId, GraphStore, Point};
use relationship_web::interaction::{Interaction, Mode};
use relationship_web::layout::{CanvasConfig, grid_position, polygon_layout};
use relationship_web::persist::{Autosaver, MemoryStore, Snapshot, load_store};
use relationship_web::presentation::float_position;

fn rng() -> StdRng {
	StdRng::seed_from_u64(2024)
}

fn store_with(names: &[&str]) -> (GraphStore, Vec<EntityId>) {
	let mut rng = rng();
	let mut store = GraphStore::new();
	let ids = names
		.iter()
		.map(|name| store.add_entity_with_rng(name, "30", None, &mut rng).unwrap())
		.collect();
	(store, ids)
}

#[test]
fn polygon_is_regular_and_starts_at_twelve() {
	let center = Point::new(500.0, 400.0);
	for n in 2..=9u64 {
		let ids: Vec<EntityId> = (1..=n).map(EntityId).collect();
		let layout = polygon_layout(&ids, 1000.0, 800.0, 80.0);
		assert_eq!(layout.len(), n as usize);

		let radius = 320.0;
		for (i, p) in layout.values().enumerate() {
			// Rounded to whole pixels.
			assert!((p.distance(center) - radius).abs() <= 1.0, "n={n} i={i}");
			let angle = (p.y - center.y).atan2(p.x - center.x);
			let expected = -PI / 2.0 + i as f64 * TAU / n as f64;
			let diff = (angle - expected).rem_euclid(TAU);
			assert!(diff.min(TAU - diff) < 0.01, "n={n} i={i}");
		}
		assert_eq!(layout[&EntityId(1)], Point::new(500.0, 80.0));
	}
}

#[test]
fn polygon_of_one_and_none() {
	assert_eq!(
		polygon_layout(&[EntityId(7)], 1000.0, 800.0, 80.0)[&EntityId(7)],
		Point::new(500.0, 400.0)
	);
	assert!(polygon_layout(&[], 1000.0, 800.0, 80.0).is_empty());
}

#[test]
fn mutual_enemies_see_each_other_the_same_way() {
	let (mut store, ids) = store_with(&["A", "B"]);
	let (a, b) = (ids[0], ids[1]);
	store.set_attitude(a, b, Attitude::Enemy, 0.8, true).unwrap();

	let expected = AttitudeView {
		mine: Attitude::Enemy,
		theirs: Attitude::Enemy,
		intensity: 0.8,
	};
	assert_eq!(store.attitude(a, b), Some(expected));
	assert_eq!(store.attitude(b, a), Some(expected));
}

#[test]
fn one_sided_attitudes_stay_independent() {
	let (mut store, ids) = store_with(&["A", "B"]);
	let (a, b) = (ids[0], ids[1]);

	store.set_attitude(a, b, Attitude::Ally, 0.5, false).unwrap();
	assert_eq!(store.attitude(a, b).map(|v| (v.mine, v.theirs)), Some((Attitude::Ally, Attitude::Neutral)));
	assert_eq!(store.attitude(b, a).map(|v| (v.mine, v.theirs)), Some((Attitude::Neutral, Attitude::Ally)));

	store.set_attitude(b, a, Attitude::Enemy, 0.3, false).unwrap();
	assert_eq!(store.attitude(a, b).map(|v| v.mine), Some(Attitude::Ally));
	assert_eq!(store.attitude(b, a).map(|v| v.mine), Some(Attitude::Enemy));
	assert_eq!(store.relationship_count(), 1);
}

#[test]
fn removing_a_character_removes_its_relationships() {
	let (mut store, ids) = store_with(&["A", "B", "C"]);
	store.set_attitude(ids[0], ids[1], Attitude::Ally, 0.5, true).unwrap();
	store.set_attitude(ids[2], ids[0], Attitude::Enemy, 0.5, false).unwrap();
	store.set_attitude(ids[1], ids[2], Attitude::Neutral, 0.5, true).unwrap();

	store.remove_entity(ids[0]).unwrap();
	assert!(store.relationships().all(|r| !r.touches(ids[0])));
	assert_eq!(store.relationship_count(), 1);
}

#[test]
fn export_then_import_is_lossless() {
	let (mut store, ids) = store_with(&["A", "B", "C"]);
	store.set_attitude(ids[0], ids[1], Attitude::Ally, 0.35, false).unwrap();
	store.set_attitude(ids[2], ids[1], Attitude::Enemy, 0.9, true).unwrap();
	store.move_entity(ids[2], Point::new(123.25, 456.5)).unwrap();

	let json = Snapshot::from_store(&store)
		.stamped_export("2026-10-18T00:00:00.000Z")
		.to_json()
		.unwrap();
	let mut restored = GraphStore::new();
	assert_eq!(restored.import_str(&json).unwrap(), 3);

	assert_eq!(
		restored.entities().cloned().collect::<Vec<_>>(),
		store.entities().cloned().collect::<Vec<_>>()
	);
	assert_eq!(
		restored.relationships().cloned().collect::<Vec<_>>(),
		store.relationships().cloned().collect::<Vec<_>>()
	);
}

#[test]
fn legacy_import_uses_the_grid_and_drops_relationships() {
	let mut store = GraphStore::demo();
	let count = store
		.import_str(r#"{"characters":[{"name":"A"},{"name":"B"}]}"#)
		.unwrap();
	assert_eq!(count, 2);
	assert_eq!(store.relationship_count(), 0);
	let positions: Vec<Point> = store.entities().map(|e| e.position()).collect();
	assert_eq!(positions, vec![grid_position(0), grid_position(1)]);
}

#[test]
fn drag_follows_pointer_within_bounds_until_release() {
	let (mut store, ids) = store_with(&["A"]);
	let a = ids[0];
	let canvas = CanvasConfig::default();
	let mut ui = Interaction::new();

	let drawn = float_position(store.entity(a).unwrap(), 1.5);
	let grab = Point::new(drawn.x + 12.0, drawn.y - 7.0);
	assert!(ui.pointer_down(a, grab, drawn));

	ui.pointer_move(Point::new(412.0, 293.0), &mut store, &canvas).unwrap();
	assert_eq!(store.entity(a).unwrap().position(), Point::new(400.0, 300.0));

	ui.pointer_move(Point::new(5000.0, -5000.0), &mut store, &canvas).unwrap();
	assert_eq!(store.entity(a).unwrap().position(), Point::new(950.0, 50.0));

	ui.pointer_up();
	assert_eq!(ui.mode(), Mode::Idle);
	ui.pointer_move(Point::new(300.0, 300.0), &mut store, &canvas).unwrap();
	assert_eq!(store.entity(a).unwrap().position(), Point::new(950.0, 50.0));
}

#[test]
fn isolation_toggle_twice_restores_none() {
	let mut ui = Interaction::new();
	ui.double_click(EntityId(3));
	ui.double_click(EntityId(3));
	assert_eq!(ui.isolated(), None);
}

#[test]
fn autosave_round_trips_through_the_backend() {
	let backend = MemoryStore::new();
	let mut store = GraphStore::demo();
	let mut autosaver = Autosaver::new(&store);
	assert!(!autosaver.maybe_save(&store, &backend, "t0").unwrap());

	store.add_entity("Mira", "27", None).unwrap();
	assert!(autosaver.maybe_save(&store, &backend, "t1").unwrap());

	let loaded = load_store(&backend).unwrap().unwrap();
	assert_eq!(loaded.len(), 3);
	assert_eq!(loaded.relationship_count(), 1);
}

#[test]
fn failed_import_leaves_graph_untouched() {
	let mut store = GraphStore::demo();
	let revision = store.revision();
	assert!(
		store
			.import_str(r#"{"type":"character-relationship-web","characters":[{"id":1,"name":"A","age":1,"x":0,"y":0}],"relationships":[{"from":1,"to":9,"fromType":"Ally","toType":"Ally","intensity":0.5}]}"#)
			.is_err()
	);
	assert!(store.import_str("[]").is_err());
	assert_eq!(store.len(), 2);
	assert_eq!(store.revision(), revision);
}
