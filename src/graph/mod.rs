//! The relationship graph: characters, directional attitudes and the store that owns them.

mod error;
mod resolver;
mod store;
mod types;

pub use error::{GraphError, ImportError, PersistenceError};
pub use store::GraphStore;
pub use types::{
	Attitude, AttitudeView, Entity, EntityId, EntityPatch, PairKey, PhotoRef, Point,
	Relationship, RelationshipChoice, clamp_intensity, parse_age,
};
