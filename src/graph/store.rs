//! Canonical owner of characters and relationships.

use indexmap::IndexMap;
use rand::Rng;

use super::error::GraphError;
use super::types::{
	Attitude, Entity, EntityId, EntityPatch, PairKey, PhotoRef, Point, Relationship, parse_age,
};
use crate::layout::{jitter_position, random_phase};

/// The relationship web: characters plus at most one relationship per pair.
///
/// Listing order is insertion order, so repeated snapshots of an unchanged
/// store always enumerate identically. Every mutating method either succeeds
/// completely or returns an error with the store untouched.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
	pub(super) entities: IndexMap<EntityId, Entity>,
	pub(super) relationships: IndexMap<PairKey, Relationship>,
	/// Lower bound for the next fresh id.
	next_id: u64,
	/// Bumped on every successful mutation.
	revision: u64,
}

impl GraphStore {
	/// Empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// The two-character seed shown before anything has been saved.
	pub fn demo() -> Self {
		Self::demo_with_rng(&mut rand::thread_rng())
	}

	/// [`GraphStore::demo`] with an explicit phase source.
	pub fn demo_with_rng<R: Rng>(rng: &mut R) -> Self {
		let mut store = Self::new();
		store.insert_entity(Entity {
			id: EntityId(1),
			name: "Dr. Zara Vex".into(),
			age: 34,
			x: 300.0,
			y: 200.0,
			photo: None,
			float_phase: random_phase(rng),
		});
		store.insert_entity(Entity {
			id: EntityId(2),
			name: "Commander Kael Thorne".into(),
			age: 52,
			x: 500.0,
			y: 300.0,
			photo: None,
			float_phase: random_phase(rng),
		});
		store.insert_relationship(Relationship {
			from: EntityId(1),
			to: EntityId(2),
			from_type: Attitude::Enemy,
			to_type: Attitude::Enemy,
			intensity: 0.8,
		});
		store
	}

	/// Monotonic change counter. Unchanged after a failed operation.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub(super) fn bump(&mut self) {
		self.revision += 1;
	}

	pub(crate) fn set_revision(&mut self, revision: u64) {
		self.revision = revision;
	}

	/// Number of characters.
	pub fn len(&self) -> usize {
		self.entities.len()
	}

	/// Whether there are no characters.
	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	/// Number of relationship records.
	pub fn relationship_count(&self) -> usize {
		self.relationships.len()
	}

	/// Whether `id` names a character.
	pub fn contains(&self, id: EntityId) -> bool {
		self.entities.contains_key(&id)
	}

	/// Look up a character.
	pub fn entity(&self, id: EntityId) -> Option<&Entity> {
		self.entities.get(&id)
	}

	/// Characters in stable listing order.
	pub fn entities(&self) -> impl ExactSizeIterator<Item = &Entity> + '_ {
		self.entities.values()
	}

	/// Ids in stable listing order.
	pub fn ids(&self) -> Vec<EntityId> {
		self.entities.keys().copied().collect()
	}

	/// Relationships in stable listing order.
	pub fn relationships(&self) -> impl ExactSizeIterator<Item = &Relationship> + '_ {
		self.relationships.values()
	}

	/// The record between `a` and `b`, in either direction.
	pub fn relationship(&self, a: EntityId, b: EntityId) -> Option<&Relationship> {
		self.relationships.get(&PairKey::new(a, b))
	}

	/// Add a character with a random starting position and float phase.
	pub fn add_entity(
		&mut self,
		name: &str,
		age: &str,
		photo: Option<PhotoRef>,
	) -> Result<EntityId, GraphError> {
		self.add_entity_with_rng(name, age, photo, &mut rand::thread_rng())
	}

	/// Add a character. `age` is raw form input; unparsable input becomes 0.
	pub fn add_entity_with_rng<R: Rng>(
		&mut self,
		name: &str,
		age: &str,
		photo: Option<PhotoRef>,
		rng: &mut R,
	) -> Result<EntityId, GraphError> {
		let name = validate_name(name)?;
		let id = self.fresh_id();
		let pos = jitter_position(rng);
		self.insert_entity(Entity {
			id,
			name,
			age: parse_age(age),
			x: pos.x,
			y: pos.y,
			photo,
			float_phase: random_phase(rng),
		});
		self.bump();
		Ok(id)
	}

	/// Apply a partial edit. The name, if given, is trimmed and must not be blank.
	pub fn update_entity(&mut self, id: EntityId, patch: EntityPatch) -> Result<(), GraphError> {
		let name = patch.name.as_deref().map(validate_name).transpose()?;
		let entity = self.entities.get_mut(&id).ok_or(GraphError::NotFound(id))?;
		if let Some(name) = name {
			entity.name = name;
		}
		if let Some(age) = patch.age {
			entity.age = age;
		}
		if let Some(photo) = patch.photo {
			entity.photo = photo;
		}
		self.bump();
		Ok(())
	}

	/// Overwrite the authoritative position of a character.
	pub fn move_entity(&mut self, id: EntityId, to: Point) -> Result<(), GraphError> {
		let entity = self.entities.get_mut(&id).ok_or(GraphError::NotFound(id))?;
		entity.x = to.x;
		entity.y = to.y;
		self.bump();
		Ok(())
	}

	/// Write a layout result. Ids the store does not know are skipped.
	pub fn apply_layout(&mut self, positions: &IndexMap<EntityId, Point>) {
		for (id, pos) in positions {
			if let Some(entity) = self.entities.get_mut(id) {
				entity.x = pos.x;
				entity.y = pos.y;
			}
		}
		self.bump();
	}

	/// Delete a character together with every relationship touching it.
	///
	/// Unknown ids are rejected with [`GraphError::NotFound`].
	pub fn remove_entity(&mut self, id: EntityId) -> Result<Entity, GraphError> {
		let entity = self
			.entities
			.shift_remove(&id)
			.ok_or(GraphError::NotFound(id))?;
		self.relationships.retain(|key, _| !key.contains(id));
		self.bump();
		Ok(entity)
	}

	/// Run `f` against a copy of the store and keep the result only if it succeeds.
	pub fn transaction<T, E>(
		&mut self,
		f: impl FnOnce(&mut GraphStore) -> Result<T, E>,
	) -> Result<T, E> {
		let mut draft = self.clone();
		let out = f(&mut draft)?;
		*self = draft;
		Ok(out)
	}

	/// Next unused id. Once the counter is pinned at `u64::MAX` (an imported
	/// character took that id) the lowest free id is handed out instead.
	fn fresh_id(&mut self) -> EntityId {
		let next = EntityId(self.next_id.max(1));
		if !self.entities.contains_key(&next) {
			self.next_id = next.0.saturating_add(1);
			return next;
		}
		(1..=u64::MAX)
			.map(EntityId)
			.find(|id| !self.entities.contains_key(id))
			.unwrap_or(next)
	}

	/// Insert without validation; callers guarantee a unique id.
	pub(crate) fn insert_entity(&mut self, entity: Entity) {
		self.next_id = self.next_id.max(entity.id.0.saturating_add(1));
		self.entities.insert(entity.id, entity);
	}

	/// Insert without validation; callers guarantee both endpoints exist.
	pub(crate) fn insert_relationship(&mut self, relationship: Relationship) {
		self.relationships.insert(relationship.key(), relationship);
	}
}

fn validate_name(name: &str) -> Result<String, GraphError> {
	let trimmed = name.trim();
	if trimmed.is_empty() {
		return Err(GraphError::EmptyName);
	}
	Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;

	fn rng() -> StdRng {
		StdRng::seed_from_u64(42)
	}

	#[test]
	fn add_assigns_fresh_ids_and_parses_age() {
		let mut store = GraphStore::new();
		let a = store
			.add_entity_with_rng("  Ada  ", "36", None, &mut rng())
			.unwrap();
		let b = store
			.add_entity_with_rng("Brin", "unknown", None, &mut rng())
			.unwrap();

		assert_ne!(a, b);
		assert_eq!(store.entity(a).unwrap().name, "Ada");
		assert_eq!(store.entity(a).unwrap().age, 36);
		assert_eq!(store.entity(b).unwrap().age, 0);
		assert_eq!(store.ids(), vec![a, b]);
	}

	#[test]
	fn add_rejects_blank_name_without_mutating() {
		let mut store = GraphStore::new();
		let err = store
			.add_entity_with_rng("   ", "3", None, &mut rng())
			.unwrap_err();
		assert_eq!(err, GraphError::EmptyName);
		assert!(store.is_empty());
		assert_eq!(store.revision(), 0);
	}

	#[test]
	fn fresh_ids_never_collide_with_inserted_ones() {
		let mut store = GraphStore::demo_with_rng(&mut rng());
		let id = store.add_entity_with_rng("Cy", "", None, &mut rng()).unwrap();
		assert_eq!(id, EntityId(3));
	}

	#[test]
	fn largest_possible_id_does_not_exhaust_fresh_ids() {
		let mut rng = rng();
		let mut store = GraphStore::new();
		store.insert_entity(Entity {
			id: EntityId(u64::MAX),
			name: "Last".into(),
			age: 0,
			x: 0.0,
			y: 0.0,
			photo: None,
			float_phase: 0.0,
		});

		let a = store.add_entity_with_rng("A", "", None, &mut rng).unwrap();
		let b = store.add_entity_with_rng("B", "", None, &mut rng).unwrap();
		assert_eq!((a, b), (EntityId(1), EntityId(2)));
		assert_eq!(store.len(), 3);
		assert_eq!(store.entity(EntityId(u64::MAX)).unwrap().name, "Last");
	}

	#[test]
	fn update_applies_partial_patch() {
		let mut store = GraphStore::demo_with_rng(&mut rng());
		store
			.update_entity(
				EntityId(1),
				EntityPatch {
					age: Some(35),
					photo: Some(Some(PhotoRef("data:image/png;base64,AA".into()))),
					..Default::default()
				},
			)
			.unwrap();
		let zara = store.entity(EntityId(1)).unwrap();
		assert_eq!(zara.name, "Dr. Zara Vex");
		assert_eq!(zara.age, 35);
		assert!(zara.photo.is_some());
	}

	#[test]
	fn update_validates_before_writing() {
		let mut store = GraphStore::demo_with_rng(&mut rng());
		let before = store.revision();

		let blank = EntityPatch {
			name: Some(" ".into()),
			age: Some(99),
			..Default::default()
		};
		assert_eq!(
			store.update_entity(EntityId(1), blank),
			Err(GraphError::EmptyName)
		);
		assert_eq!(store.entity(EntityId(1)).unwrap().age, 34);

		assert_eq!(
			store.update_entity(EntityId(77), EntityPatch::default()),
			Err(GraphError::NotFound(EntityId(77)))
		);
		assert_eq!(store.revision(), before);
	}

	#[test]
	fn remove_cascades_to_relationships() {
		let mut store = GraphStore::demo_with_rng(&mut rng());
		let c = store.add_entity_with_rng("Cy", "", None, &mut rng()).unwrap();
		store
			.set_attitude(c, EntityId(2), Attitude::Ally, 0.4, false)
			.unwrap();
		assert_eq!(store.relationship_count(), 2);

		let removed = store.remove_entity(EntityId(2)).unwrap();
		assert_eq!(removed.name, "Commander Kael Thorne");
		assert_eq!(store.relationship_count(), 0);
		assert!(store.relationships().all(|r| !r.touches(EntityId(2))));
		assert_eq!(store.ids(), vec![EntityId(1), c]);
	}

	#[test]
	fn remove_unknown_is_not_found() {
		let mut store = GraphStore::demo_with_rng(&mut rng());
		assert_eq!(
			store.remove_entity(EntityId(9)),
			Err(GraphError::NotFound(EntityId(9)))
		);
		assert_eq!(store.len(), 2);
	}

	#[test]
	fn transaction_discards_failed_drafts() {
		let mut store = GraphStore::demo_with_rng(&mut rng());
		let result: Result<(), GraphError> = store.transaction(|draft| {
			draft.move_entity(EntityId(1), Point::new(1.0, 1.0))?;
			draft.remove_entity(EntityId(42))?;
			Ok(())
		});
		assert!(result.is_err());
		assert_eq!(store.entity(EntityId(1)).unwrap().position(), Point::new(300.0, 200.0));
	}

	#[test]
	fn apply_layout_skips_unknown_ids() {
		let mut store = GraphStore::demo_with_rng(&mut rng());
		let positions = IndexMap::from([
			(EntityId(1), Point::new(10.0, 20.0)),
			(EntityId(99), Point::new(0.0, 0.0)),
		]);
		store.apply_layout(&positions);
		assert_eq!(store.entity(EntityId(1)).unwrap().position(), Point::new(10.0, 20.0));
		assert_eq!(store.len(), 2);
	}
}
