//! Finding, creating and updating the single relationship between two characters.

use indexmap::map::Entry;

use super::error::GraphError;
use super::store::GraphStore;
use super::types::{
	Attitude, AttitudeView, EntityId, PairKey, Relationship, RelationshipChoice, clamp_intensity,
};

impl GraphStore {
	/// Set how `a` regards `b`.
	///
	/// A new record gets `b → a` filled in as [`Attitude::Neutral`] unless
	/// `mutual` is set. On an existing record only the `a → b` side is
	/// overwritten (both sides when `mutual`). Intensity is shared and always
	/// overwritten.
	pub fn set_attitude(
		&mut self,
		a: EntityId,
		b: EntityId,
		attitude: Attitude,
		intensity: f64,
		mutual: bool,
	) -> Result<(), GraphError> {
		self.check_pair(a, b)?;
		self.write_attitude(a, b, attitude, intensity, mutual);
		self.bump();
		Ok(())
	}

	/// Set both directions explicitly, as the relationship editor does.
	pub fn set_pair(
		&mut self,
		a: EntityId,
		b: EntityId,
		a_to_b: Attitude,
		b_to_a: Attitude,
		intensity: f64,
	) -> Result<(), GraphError> {
		self.check_pair(a, b)?;
		let intensity = clamp_intensity(intensity);
		match self.relationships.entry(PairKey::new(a, b)) {
			Entry::Occupied(mut entry) => {
				let rel = entry.get_mut();
				if rel.from == a {
					rel.from_type = a_to_b;
					rel.to_type = b_to_a;
				} else {
					rel.from_type = b_to_a;
					rel.to_type = a_to_b;
				}
				rel.intensity = intensity;
			}
			Entry::Vacant(entry) => {
				entry.insert(Relationship {
					from: a,
					to: b,
					from_type: a_to_b,
					to_type: b_to_a,
					intensity,
				});
			}
		}
		self.bump();
		Ok(())
	}

	/// The relationship between `id` and `other`, seen from `id`.
	pub fn attitude(&self, id: EntityId, other: EntityId) -> Option<AttitudeView> {
		let rel = self.relationship(id, other)?;
		Some(AttitudeView {
			mine: rel.attitude_of(id)?,
			theirs: rel.attitude_of(other)?,
			intensity: rel.intensity,
		})
	}

	/// Delete the record between `a` and `b`. Returns whether one existed.
	pub fn remove_relationship(&mut self, a: EntityId, b: EntityId) -> bool {
		let removed = self
			.relationships
			.shift_remove(&PairKey::new(a, b))
			.is_some();
		if removed {
			self.bump();
		}
		removed
	}

	/// Every relationship of `id`, seen from `id`, in listing order.
	pub fn relationships_of(&self, id: EntityId) -> Vec<(EntityId, AttitudeView)> {
		self.relationships
			.values()
			.filter_map(|rel| {
				let other = rel.other(id)?;
				Some((other, self.attitude(id, other)?))
			})
			.collect()
	}

	/// Characters that share a relationship with `id`.
	pub fn neighbors(&self, id: EntityId) -> Vec<EntityId> {
		self.relationships
			.values()
			.filter_map(|rel| rel.other(id))
			.collect()
	}

	/// Apply the relationship rows of an add/edit form for `id`.
	///
	/// Rows with an attitude go through the [`GraphStore::set_attitude`] rules;
	/// rows without one remove the pair. All rows are checked first, so an
	/// invalid row leaves every relationship as it was.
	pub fn apply_choices(
		&mut self,
		id: EntityId,
		choices: &[RelationshipChoice],
	) -> Result<(), GraphError> {
		if !self.contains(id) {
			return Err(GraphError::NotFound(id));
		}
		for choice in choices {
			self.check_pair(id, choice.other)?;
		}
		for choice in choices {
			match choice.attitude {
				Some(attitude) => {
					self.write_attitude(id, choice.other, attitude, choice.intensity, choice.mutual)
				}
				None => {
					self.relationships
						.shift_remove(&PairKey::new(id, choice.other));
				}
			}
		}
		self.bump();
		Ok(())
	}

	fn check_pair(&self, a: EntityId, b: EntityId) -> Result<(), GraphError> {
		if a == b {
			return Err(GraphError::InvalidPair(a));
		}
		for id in [a, b] {
			if !self.contains(id) {
				return Err(GraphError::NotFound(id));
			}
		}
		Ok(())
	}

	fn write_attitude(
		&mut self,
		a: EntityId,
		b: EntityId,
		attitude: Attitude,
		intensity: f64,
		mutual: bool,
	) {
		let intensity = clamp_intensity(intensity);
		match self.relationships.entry(PairKey::new(a, b)) {
			Entry::Occupied(mut entry) => {
				let rel = entry.get_mut();
				if mutual {
					rel.from_type = attitude;
					rel.to_type = attitude;
				} else if let Some(side) = rel.attitude_of_mut(a) {
					*side = attitude;
				}
				rel.intensity = intensity;
			}
			Entry::Vacant(entry) => {
				entry.insert(Relationship {
					from: a,
					to: b,
					from_type: attitude,
					to_type: if mutual { attitude } else { Attitude::Neutral },
					intensity,
				});
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;

	const A: EntityId = EntityId(1);
	const B: EntityId = EntityId(2);

	/// Two characters, no relationship.
	fn pair() -> GraphStore {
		let mut store = GraphStore::demo_with_rng(&mut StdRng::seed_from_u64(1));
		store.remove_relationship(A, B);
		store
	}

	#[test]
	fn mutual_sets_both_sides() {
		let mut store = pair();
		store.set_attitude(A, B, Attitude::Enemy, 0.8, true).unwrap();

		let expected = AttitudeView {
			mine: Attitude::Enemy,
			theirs: Attitude::Enemy,
			intensity: 0.8,
		};
		assert_eq!(store.attitude(A, B), Some(expected));
		assert_eq!(store.attitude(B, A), Some(expected));
	}

	#[test]
	fn one_sided_creation_fills_reverse_with_neutral() {
		let mut store = pair();
		store.set_attitude(A, B, Attitude::Ally, 0.5, false).unwrap();

		let ab = store.attitude(A, B).unwrap();
		assert_eq!((ab.mine, ab.theirs), (Attitude::Ally, Attitude::Neutral));
		let ba = store.attitude(B, A).unwrap();
		assert_eq!((ba.mine, ba.theirs), (Attitude::Neutral, Attitude::Ally));
	}

	#[test]
	fn reverse_update_preserves_forward_direction() {
		let mut store = pair();
		store.set_attitude(A, B, Attitude::Ally, 0.5, false).unwrap();
		store.set_attitude(B, A, Attitude::Enemy, 0.9, false).unwrap();

		let ab = store.attitude(A, B).unwrap();
		assert_eq!(ab.mine, Attitude::Ally);
		assert_eq!(ab.theirs, Attitude::Enemy);
		assert_eq!(ab.intensity, 0.9);
		assert_eq!(store.relationship_count(), 1);
	}

	#[test]
	fn mutual_update_overwrites_both_sides() {
		let mut store = pair();
		store.set_attitude(A, B, Attitude::Ally, 0.5, false).unwrap();
		store.set_attitude(B, A, Attitude::Neutral, 0.2, true).unwrap();
		let view = store.attitude(A, B).unwrap();
		assert_eq!((view.mine, view.theirs), (Attitude::Neutral, Attitude::Neutral));
	}

	#[test]
	fn self_pair_is_rejected() {
		let mut store = pair();
		assert_eq!(
			store.set_attitude(A, A, Attitude::Ally, 0.5, true),
			Err(GraphError::InvalidPair(A))
		);
		assert_eq!(store.relationship_count(), 0);
	}

	#[test]
	fn unknown_endpoint_is_rejected() {
		let mut store = pair();
		let before = store.revision();
		assert_eq!(
			store.set_attitude(A, EntityId(5), Attitude::Ally, 0.5, true),
			Err(GraphError::NotFound(EntityId(5)))
		);
		assert_eq!(store.revision(), before);
	}

	#[test]
	fn intensity_is_clamped() {
		let mut store = pair();
		store.set_attitude(A, B, Attitude::Ally, 3.0, true).unwrap();
		assert_eq!(store.attitude(A, B).unwrap().intensity, 1.0);
	}

	#[test]
	fn set_pair_respects_storage_order() {
		let mut store = pair();
		store.set_attitude(B, A, Attitude::Neutral, 0.5, true).unwrap();
		store
			.set_pair(A, B, Attitude::Ally, Attitude::Enemy, 0.6)
			.unwrap();

		let rel = store.relationship(A, B).unwrap();
		assert_eq!(rel.from, B);
		let view = store.attitude(A, B).unwrap();
		assert_eq!((view.mine, view.theirs), (Attitude::Ally, Attitude::Enemy));
	}

	#[test]
	fn remove_is_noop_when_absent() {
		let mut store = pair();
		let before = store.revision();
		assert!(!store.remove_relationship(A, B));
		assert_eq!(store.revision(), before);

		store.set_attitude(A, B, Attitude::Ally, 0.5, true).unwrap();
		assert!(store.remove_relationship(B, A));
		assert_eq!(store.attitude(A, B), None);
	}

	#[test]
	fn choices_set_and_remove() {
		let mut store = GraphStore::demo_with_rng(&mut StdRng::seed_from_u64(2));
		let c = store
			.add_entity_with_rng("Cy", "20", None, &mut StdRng::seed_from_u64(3))
			.unwrap();

		store
			.apply_choices(
				A,
				&[
					RelationshipChoice {
						other: B,
						attitude: None,
						intensity: 0.5,
						mutual: false,
					},
					RelationshipChoice {
						other: c,
						attitude: Some(Attitude::Ally),
						intensity: 0.7,
						mutual: false,
					},
				],
			)
			.unwrap();

		assert_eq!(store.attitude(A, B), None);
		let view = store.attitude(c, A).unwrap();
		assert_eq!((view.mine, view.theirs), (Attitude::Neutral, Attitude::Ally));
		assert_eq!(store.neighbors(A), vec![c]);
	}

	#[test]
	fn invalid_choice_rejects_whole_batch() {
		let mut store = GraphStore::demo_with_rng(&mut StdRng::seed_from_u64(2));
		let err = store
			.apply_choices(
				A,
				&[
					RelationshipChoice {
						other: B,
						attitude: None,
						intensity: 0.5,
						mutual: false,
					},
					RelationshipChoice {
						other: A,
						attitude: Some(Attitude::Ally),
						intensity: 0.5,
						mutual: true,
					},
				],
			)
			.unwrap_err();
		assert_eq!(err, GraphError::InvalidPair(A));
		assert!(store.attitude(A, B).is_some());
	}

	#[test]
	fn relationships_of_uses_viewer_perspective() {
		let store = GraphStore::demo_with_rng(&mut StdRng::seed_from_u64(2));
		let rows = store.relationships_of(B);
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].0, A);
		assert_eq!(rows[0].1.mine, Attitude::Enemy);
	}
}
