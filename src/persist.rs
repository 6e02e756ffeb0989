//! Snapshot export/import and durable storage of the relationship web.
//!
//! The interchange format is a single JSON document:
//!
//! ```json
//! {
//!   "type": "character-relationship-web",
//!   "version": "1.0",
//!   "characters": [{ "id": 1, "name": "…", "age": 34, "x": 300, "y": 200, "photo": null, "floatOffset": 1.2 }],
//!   "relationships": [{ "from": 1, "to": 2, "fromType": "Enemy", "toType": "Enemy", "intensity": 0.8 }]
//! }
//! ```
//!
//! Older exports carry only a `characters` list without `type`. Those are
//! still accepted: characters are re-gridded and relationships dropped.

use std::cell::RefCell;
use std::collections::HashSet;

use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::{
	Attitude, Entity, EntityId, GraphStore, ImportError, PersistenceError, PhotoRef, Relationship,
	clamp_intensity, parse_age,
};
use crate::layout::{grid_position, random_phase};

/// Value of the `type` field in current snapshots.
pub const SNAPSHOT_TYPE: &str = "character-relationship-web";
/// The only snapshot version this crate reads and writes.
pub const SNAPSHOT_VERSION: &str = "1.0";
/// `localStorage` key used for autosave.
pub const STORAGE_KEY: &str = "character-relationship-web-data";

/// Placeholder name for legacy characters without one.
const LEGACY_NAME: &str = "Unknown";

/// One character as stored in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
	/// Character id, unique within the snapshot.
	pub id: EntityId,
	/// Display name.
	pub name: String,
	/// Age in years; missing means 0.
	#[serde(default)]
	pub age: u32,
	/// Logical x position.
	pub x: f64,
	/// Logical y position.
	pub y: f64,
	/// Optional picture.
	#[serde(default)]
	pub photo: Option<PhotoRef>,
	/// Missing offsets get a fresh random phase on import.
	#[serde(default)]
	pub float_offset: Option<f64>,
}

/// One relationship as stored in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRecord {
	/// Creating side.
	pub from: EntityId,
	/// Other side.
	pub to: EntityId,
	/// Attitude of `from` toward `to`.
	pub from_type: Attitude,
	/// Attitude of `to` toward `from`.
	pub to_type: Attitude,
	/// Shared strength in `[0, 1]`.
	pub intensity: f64,
}

/// Full, lossless snapshot of a [`GraphStore`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
	/// Always `character-relationship-web`.
	#[serde(rename = "type")]
	pub kind: String,
	/// Format version, `1.0` when written by this app.
	#[serde(default = "default_version")]
	pub version: String,
	/// Every character.
	pub characters: Vec<CharacterRecord>,
	/// Every relationship; missing means none.
	#[serde(default)]
	pub relationships: Vec<RelationshipRecord>,
	/// Set by autosave.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_saved: Option<String>,
	/// Set when exported by hand.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub export_date: Option<String>,
}

fn default_version() -> String {
	SNAPSHOT_VERSION.to_string()
}

impl Snapshot {
	/// Capture every character and relationship of `store`.
	pub fn from_store(store: &GraphStore) -> Self {
		Self {
			kind: SNAPSHOT_TYPE.to_string(),
			version: SNAPSHOT_VERSION.to_string(),
			characters: store
				.entities()
				.map(|e| CharacterRecord {
					id: e.id,
					name: e.name.clone(),
					age: e.age,
					x: e.x,
					y: e.y,
					photo: e.photo.clone(),
					float_offset: Some(e.float_phase),
				})
				.collect(),
			relationships: store
				.relationships()
				.map(|r| RelationshipRecord {
					from: r.from,
					to: r.to,
					from_type: r.from_type,
					to_type: r.to_type,
					intensity: r.intensity,
				})
				.collect(),
			last_saved: None,
			export_date: None,
		}
	}

	/// Mark as a user export made at `date`.
	pub fn stamped_export(mut self, date: impl Into<String>) -> Self {
		self.export_date = Some(date.into());
		self
	}

	/// Mark as an autosave made at `date`.
	pub fn stamped_save(mut self, date: impl Into<String>) -> Self {
		self.last_saved = Some(date.into());
		self
	}

	/// Pretty-printed JSON, as offered for copying or download.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string_pretty(self)
	}
}

/// A legacy export: just a `characters` list.
///
/// Entries are kept as raw JSON since old exports are loosely typed; an entry
/// that is not even an object still becomes an "Unknown" character.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LegacySnapshot {
	/// Raw character entries, in file order.
	pub characters: Vec<Value>,
}

/// A parsed import, before it is applied.
#[derive(Clone, Debug)]
pub enum Payload {
	/// A snapshot in the current format.
	Current(Snapshot),
	/// An older export without `type`.
	Legacy(LegacySnapshot),
}

impl Payload {
	/// Parse and classify raw input. Nothing is applied yet.
	///
	/// A current-format payload with an unknown `version` is still read as
	/// current when its fields fit, and as legacy otherwise.
	pub fn parse(input: &str) -> Result<Self, ImportError> {
		let value: Value = serde_json::from_str(input)?;
		let Some(object) = value.as_object() else {
			return Err(ImportError::MissingCharacters);
		};
		if !matches!(object.get("characters"), Some(Value::Array(_))) {
			return Err(ImportError::MissingCharacters);
		}
		if object.get("type").and_then(Value::as_str) != Some(SNAPSHOT_TYPE) {
			return Ok(Payload::Legacy(serde_json::from_value(value)?));
		}

		let version = match object.get("version") {
			None => SNAPSHOT_VERSION.to_string(),
			Some(Value::String(v)) => v.clone(),
			Some(other) => other.to_string(),
		};
		if version == SNAPSHOT_VERSION {
			return Ok(Payload::Current(serde_json::from_value(value)?));
		}
		warn!("relationship-web: reading snapshot version {version} as {SNAPSHOT_VERSION}");
		match serde_json::from_value(value.clone()) {
			Ok(snapshot) => Ok(Payload::Current(snapshot)),
			Err(err) => {
				warn!("relationship-web: version {version} snapshot imported as legacy: {err}");
				Ok(Payload::Legacy(serde_json::from_value(value)?))
			}
		}
	}
}

impl GraphStore {
	/// Replace the whole graph with an imported payload.
	///
	/// The new graph is built separately and swapped in only once it is known
	/// to be consistent. Returns the number of imported characters.
	pub fn import_payload<R: Rng>(
		&mut self,
		payload: Payload,
		rng: &mut R,
	) -> Result<usize, ImportError> {
		let mut imported = match payload {
			Payload::Current(snapshot) => build_current(snapshot, rng)?,
			Payload::Legacy(legacy) => build_legacy(legacy, rng),
		};
		imported.set_revision(self.revision() + 1);
		let count = imported.len();
		info!(
			"relationship-web: imported {} characters, {} relationships",
			count,
			imported.relationship_count()
		);
		*self = imported;
		Ok(count)
	}

	/// Parse and import in one step.
	pub fn import_str(&mut self, input: &str) -> Result<usize, ImportError> {
		let payload = Payload::parse(input)?;
		self.import_payload(payload, &mut rand::thread_rng())
	}
}

fn build_current<R: Rng>(snapshot: Snapshot, rng: &mut R) -> Result<GraphStore, ImportError> {
	let mut store = GraphStore::new();
	for record in snapshot.characters {
		if store.contains(record.id) {
			return Err(ImportError::Invalid(format!(
				"duplicate character id {}",
				record.id
			)));
		}
		let name = record.name.trim();
		if name.is_empty() {
			return Err(ImportError::Invalid(format!(
				"character {} has an empty name",
				record.id
			)));
		}
		store.insert_entity(Entity {
			id: record.id,
			name: name.to_string(),
			age: record.age,
			x: record.x,
			y: record.y,
			photo: record.photo,
			float_phase: record.float_offset.unwrap_or_else(|| random_phase(rng)),
		});
	}

	for record in snapshot.relationships {
		if record.from == record.to {
			return Err(ImportError::Invalid(format!(
				"relationship of {} with itself",
				record.from
			)));
		}
		for id in [record.from, record.to] {
			if !store.contains(id) {
				return Err(ImportError::Invalid(format!(
					"relationship references unknown character {id}"
				)));
			}
		}
		if store.relationship(record.from, record.to).is_some() {
			return Err(ImportError::Invalid(format!(
				"more than one relationship between {} and {}",
				record.from, record.to
			)));
		}
		store.insert_relationship(Relationship {
			from: record.from,
			to: record.to,
			from_type: record.from_type,
			to_type: record.to_type,
			intensity: clamp_intensity(record.intensity),
		});
	}
	Ok(store)
}

fn build_legacy<R: Rng>(legacy: LegacySnapshot, rng: &mut R) -> GraphStore {
	// Numeric ids survive when unique; the rest are renumbered past the largest kept one.
	let mut taken = HashSet::new();
	let kept: Vec<Option<EntityId>> = legacy
		.characters
		.iter()
		.map(|c| {
			c.get("id")
				.and_then(Value::as_u64)
				.filter(|&id| id > 0 && taken.insert(id))
				.map(EntityId)
		})
		.collect();
	let mut next = taken.iter().copied().max().unwrap_or(0).checked_add(1);

	let mut store = GraphStore::new();
	for (index, (character, id)) in legacy.characters.iter().zip(kept).enumerate() {
		let id = id.unwrap_or_else(|| next_legacy_id(&mut next, &mut taken));
		let name = character
			.get("name")
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|n| !n.is_empty())
			.unwrap_or(LEGACY_NAME)
			.to_string();
		let pos = grid_position(index);
		store.insert_entity(Entity {
			id,
			name,
			age: character.get("age").map_or(0, legacy_age),
			x: pos.x,
			y: pos.y,
			photo: character
				.get("photo")
				.and_then(Value::as_str)
				.map(|p| PhotoRef(p.to_string())),
			float_phase: random_phase(rng),
		});
	}
	store
}

/// Hand out `next` and advance it. Once it has run past `u64::MAX`, fall back
/// to the lowest id nobody holds.
fn next_legacy_id(next: &mut Option<u64>, taken: &mut HashSet<u64>) -> EntityId {
	let id = match *next {
		Some(id) => {
			*next = id.checked_add(1);
			id
		}
		None => (1..=u64::MAX)
			.find(|id| !taken.contains(id))
			.unwrap_or(u64::MAX),
	};
	taken.insert(id);
	EntityId(id)
}

fn legacy_age(value: &Value) -> u32 {
	match value {
		Value::Number(n) => n
			.as_u64()
			.or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
			.map_or(0, |age| age.min(u32::MAX as u64) as u32),
		Value::String(s) => parse_age(s),
		_ => 0,
	}
}

/// Durable home of the autosaved snapshot.
pub trait SnapshotStore {
	/// The saved document, if any.
	fn load(&self) -> Result<Option<String>, PersistenceError>;
	/// Replace the saved document.
	fn save(&self, document: &str) -> Result<(), PersistenceError>;
	/// Forget the saved document.
	fn clear(&self) -> Result<(), PersistenceError>;
}

/// Browser `localStorage` under [`STORAGE_KEY`].
#[derive(Clone, Debug)]
pub struct LocalStorageStore {
	key: String,
}

impl Default for LocalStorageStore {
	fn default() -> Self {
		Self {
			key: STORAGE_KEY.to_string(),
		}
	}
}

impl LocalStorageStore {
	fn storage(&self) -> Result<web_sys::Storage, PersistenceError> {
		web_sys::window()
			.ok_or_else(|| PersistenceError::Unavailable("no window".into()))?
			.local_storage()
			.map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))?
			.ok_or_else(|| PersistenceError::Unavailable("localStorage is disabled".into()))
	}
}

impl SnapshotStore for LocalStorageStore {
	fn load(&self) -> Result<Option<String>, PersistenceError> {
		self.storage()?
			.get_item(&self.key)
			.map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))
	}

	fn save(&self, document: &str) -> Result<(), PersistenceError> {
		self.storage()?
			.set_item(&self.key, document)
			.map_err(|e| PersistenceError::Write(format!("{e:?}")))
	}

	fn clear(&self) -> Result<(), PersistenceError> {
		self.storage()?
			.remove_item(&self.key)
			.map_err(|e| PersistenceError::Write(format!("{e:?}")))
	}
}

/// In-process store, used by tests and as a fallback when `localStorage` is missing.
#[derive(Debug, Default)]
pub struct MemoryStore {
	document: RefCell<Option<String>>,
	/// Simulates a full or read-only backend.
	pub reject_writes: bool,
}

impl MemoryStore {
	/// Empty backend.
	pub fn new() -> Self {
		Self::default()
	}

	/// Backend that already holds `document`.
	pub fn with_document(document: impl Into<String>) -> Self {
		Self {
			document: RefCell::new(Some(document.into())),
			reject_writes: false,
		}
	}

	/// Current contents, if any.
	pub fn document(&self) -> Option<String> {
		self.document.borrow().clone()
	}
}

impl SnapshotStore for MemoryStore {
	fn load(&self) -> Result<Option<String>, PersistenceError> {
		Ok(self.document())
	}

	fn save(&self, document: &str) -> Result<(), PersistenceError> {
		if self.reject_writes {
			return Err(PersistenceError::Write("quota exceeded".into()));
		}
		*self.document.borrow_mut() = Some(document.to_string());
		Ok(())
	}

	fn clear(&self) -> Result<(), PersistenceError> {
		if self.reject_writes {
			return Err(PersistenceError::Write("quota exceeded".into()));
		}
		*self.document.borrow_mut() = None;
		Ok(())
	}
}

/// Read the autosaved graph.
///
/// `Ok(None)` means there is nothing worth loading (no document, or one
/// without characters) and the caller should start from the demo graph.
pub fn load_store(backend: &dyn SnapshotStore) -> Result<Option<GraphStore>, PersistenceError> {
	let Some(document) = backend.load()? else {
		return Ok(None);
	};
	let payload = Payload::parse(&document)?;
	let empty = match &payload {
		Payload::Current(s) => s.characters.is_empty(),
		Payload::Legacy(l) => l.characters.is_empty(),
	};
	if empty {
		return Ok(None);
	}
	let mut store = GraphStore::new();
	let count = store.import_payload(payload, &mut rand::thread_rng())?;
	info!("relationship-web: loaded {count} characters from storage");
	Ok(Some(store))
}

/// Forget the saved graph and start over from the demo graph.
pub fn reset(backend: &dyn SnapshotStore) -> Result<GraphStore, PersistenceError> {
	backend.clear()?;
	Ok(GraphStore::demo())
}

/// Change-driven autosave.
///
/// Remembers the store revision that was last written (or loaded) and only
/// writes again when the store has changed since. A graph nobody has touched
/// yet, such as the demo seed, is therefore never saved.
#[derive(Clone, Debug)]
pub struct Autosaver {
	saved_revision: u64,
}

impl Autosaver {
	/// Treat the current state of `store` as already saved.
	pub fn new(store: &GraphStore) -> Self {
		Self {
			saved_revision: store.revision(),
		}
	}

	/// Whether `store` has changed since the last save.
	pub fn is_dirty(&self, store: &GraphStore) -> bool {
		store.revision() != self.saved_revision
	}

	/// Record that `store` has just been written.
	pub fn mark_saved(&mut self, store: &GraphStore) {
		self.saved_revision = store.revision();
	}

	/// Save if there are unsaved changes. Returns whether a write happened.
	pub fn maybe_save(
		&mut self,
		store: &GraphStore,
		backend: &dyn SnapshotStore,
		now: impl Into<String>,
	) -> Result<bool, PersistenceError> {
		if !self.is_dirty(store) {
			return Ok(false);
		}
		self.save_now(store, backend, now)?;
		Ok(true)
	}

	/// Save unconditionally.
	pub fn save_now(
		&mut self,
		store: &GraphStore,
		backend: &dyn SnapshotStore,
		now: impl Into<String>,
	) -> Result<(), PersistenceError> {
		let document = serde_json::to_string(&Snapshot::from_store(store).stamped_save(now))
			.map_err(|e| PersistenceError::Write(e.to_string()))?;
		if let Err(err) = backend.save(&document) {
			warn!("relationship-web: autosave failed: {err}");
			return Err(err);
		}
		self.mark_saved(store);
		Ok(())
	}
}
