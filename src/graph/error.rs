//! Error types for graph mutations, imports and storage.

use thiserror::Error;

use super::types::EntityId;

/// Rejected graph mutation. The store is untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
	/// A character name was blank after trimming.
	#[error("name must not be empty")]
	EmptyName,

	/// The id does not name a character in the graph.
	#[error("no character with id {0}")]
	NotFound(EntityId),

	/// Both ends of a relationship are the same character.
	#[error("character {0} cannot have a relationship with itself")]
	InvalidPair(EntityId),
}

/// Rejected snapshot import. Nothing from the payload is applied.
#[derive(Debug, Error)]
pub enum ImportError {
	/// The input does not parse, or a field has the wrong shape.
	#[error("not valid JSON: {0}")]
	Malformed(#[from] serde_json::Error),

	/// The payload is not an object with a `characters` array.
	#[error("payload has no characters list")]
	MissingCharacters,

	/// Dangling or self-referencing relationships, duplicate ids or pairs, blank names.
	#[error("inconsistent snapshot: {0}")]
	Invalid(String),
}

/// Failure of the durable snapshot store. Graph state is never affected.
#[derive(Debug, Error)]
pub enum PersistenceError {
	/// The backend cannot be reached, e.g. `localStorage` is disabled.
	#[error("storage unavailable: {0}")]
	Unavailable(String),

	/// The backend refused the write.
	#[error("could not write snapshot: {0}")]
	Write(String),

	/// The stored document could not be imported.
	#[error("saved data is unreadable: {0}")]
	Import(#[from] ImportError),
}
