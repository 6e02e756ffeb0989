//! Render-time values derived from the graph. Nothing here feeds back into it.

use crate::graph::{Entity, EntityId, GraphStore, Point, Relationship};

/// Floating amplitude in logical pixels.
pub const FLOAT_AMPLITUDE: f64 = 8.0;
/// Floating speed in radians per second.
pub const FLOAT_SPEED: f64 = 0.6;

/// Opacity of characters unrelated to the isolated one.
pub const FADED_NODE_OPACITY: f64 = 0.3;
/// Edge opacity multiplier for edges not touching the isolated character.
pub const FADED_EDGE_FACTOR: f64 = 0.15;
/// Scale of the isolated character's node.
pub const ISOLATED_SCALE: f64 = 1.8;

/// Where `entity` is drawn at `time` seconds.
pub fn float_position(entity: &Entity, time: f64) -> Point {
	let t = time * FLOAT_SPEED + entity.float_phase;
	Point::new(
		entity.x + t.sin() * FLOAT_AMPLITUDE,
		entity.y + (t * 0.8).cos() * FLOAT_AMPLITUDE,
	)
}

/// Target opacity of a node under the current isolation.
pub fn node_opacity(store: &GraphStore, isolated: Option<EntityId>, id: EntityId) -> f64 {
	match isolated {
		None => 1.0,
		Some(focus) if focus == id || store.relationship(focus, id).is_some() => 1.0,
		Some(_) => FADED_NODE_OPACITY,
	}
}

/// Target scale for a node: enlarged while it is the isolated one.
pub fn node_scale(isolated: Option<EntityId>, id: EntityId) -> f64 {
	if isolated == Some(id) {
		ISOLATED_SCALE
	} else {
		1.0
	}
}

/// Stroke width grows with intensity.
pub fn edge_width(rel: &Relationship) -> f64 {
	2.0 + rel.intensity * 3.0
}

/// Edge opacity: stronger relationships are more opaque; edges away from the
/// isolated character are faded.
pub fn edge_opacity(rel: &Relationship, isolated: Option<EntityId>) -> f64 {
	let base = 0.4 + rel.intensity * 0.6;
	match isolated {
		Some(focus) if !rel.touches(focus) => base * FADED_EDGE_FACTOR,
		_ => base,
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;
	use crate::graph::Attitude;

	#[test]
	fn float_offset_is_bounded_and_leaves_entity_alone() {
		let store = GraphStore::demo_with_rng(&mut StdRng::seed_from_u64(9));
		let zara = store.entity(EntityId(1)).unwrap();
		for step in 0..100 {
			let p = float_position(zara, step as f64 * 0.37);
			assert!((p.x - zara.x).abs() <= FLOAT_AMPLITUDE + 1e-9);
			assert!((p.y - zara.y).abs() <= FLOAT_AMPLITUDE + 1e-9);
		}
		assert_eq!(zara.position(), Point::new(300.0, 200.0));
	}

	#[test]
	fn isolation_fades_unrelated_nodes_and_edges() {
		let mut rng = StdRng::seed_from_u64(9);
		let mut store = GraphStore::demo_with_rng(&mut rng);
		let c = store.add_entity_with_rng("Cy", "1", None, &mut rng).unwrap();
		let d = store.add_entity_with_rng("Dee", "1", None, &mut rng).unwrap();
		store.set_attitude(c, d, Attitude::Ally, 1.0, true).unwrap();

		let focus = Some(EntityId(1));
		assert_eq!(node_opacity(&store, focus, EntityId(1)), 1.0);
		assert_eq!(node_opacity(&store, focus, EntityId(2)), 1.0);
		assert_eq!(node_opacity(&store, focus, c), FADED_NODE_OPACITY);
		assert_eq!(node_opacity(&store, None, c), 1.0);

		assert_eq!(node_scale(focus, EntityId(1)), ISOLATED_SCALE);
		assert_eq!(node_scale(focus, c), 1.0);

		let near = store.relationship(EntityId(1), EntityId(2)).unwrap();
		let far = store.relationship(c, d).unwrap();
		assert!((edge_opacity(near, focus) - 0.88).abs() < 1e-9);
		assert!((edge_opacity(far, focus) - 0.15).abs() < 1e-9);
		assert!((edge_opacity(far, None) - 1.0).abs() < 1e-9);
		assert_eq!(edge_width(far), 5.0);
	}
}
