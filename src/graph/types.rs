//! Core data structures for characters and the relationships between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, immutable identifier of a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Opaque reference to a character photo (typically a data URL).
/// The graph only carries it around; it never inspects the contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

/// A point in logical canvas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

impl std::ops::Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

/// A character in the relationship web.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
	/// Stable identifier.
	pub id: EntityId,
	/// Display name, never blank.
	pub name: String,
	/// Age in years.
	pub age: u32,
	/// Authoritative (non-animated) horizontal position.
	pub x: f64,
	/// Authoritative vertical position.
	pub y: f64,
	/// Optional picture.
	pub photo: Option<PhotoRef>,
	/// Render-only seed for the floating animation, in `[0, 2π)`.
	pub float_phase: f64,
}

impl Entity {
	/// `(x, y)` as a point.
	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// How one character regards another.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attitude {
	/// Friendly toward the other character.
	Ally,
	/// Hostile toward the other character.
	Enemy,
	/// Also the attitude filled in for a side nobody has set.
	#[default]
	Neutral,
}

impl Attitude {
	/// All attitudes, in editor order.
	pub const ALL: [Attitude; 3] = [Attitude::Ally, Attitude::Enemy, Attitude::Neutral];

	/// Label used in the editor and in snapshots.
	pub fn name(self) -> &'static str {
		match self {
			Attitude::Ally => "Ally",
			Attitude::Enemy => "Enemy",
			Attitude::Neutral => "Neutral",
		}
	}

	/// Inverse of [`Attitude::name`].
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|a| a.name() == name)
	}
}

impl fmt::Display for Attitude {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Canonical key of an unordered pair of distinct characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PairKey(EntityId, EntityId);

impl PairKey {
	/// Key for the pair, whichever order `a` and `b` come in.
	pub fn new(a: EntityId, b: EntityId) -> Self {
		if a <= b { Self(a, b) } else { Self(b, a) }
	}

	/// Whether `id` is one of the two.
	pub fn contains(&self, id: EntityId) -> bool {
		self.0 == id || self.1 == id
	}
}

/// The single record between two characters.
///
/// `from`/`to` is the order the record was created in; it carries no meaning
/// beyond telling which attitude field belongs to which side. Use
/// [`Relationship::attitude_of`] to read a directional attitude.
#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
	/// Character that created the record.
	pub from: EntityId,
	/// The other participant.
	pub to: EntityId,
	/// `from`'s attitude toward `to`.
	pub from_type: Attitude,
	/// `to`'s attitude toward `from`.
	pub to_type: Attitude,
	/// Shared strength of the relationship in `[0, 1]`.
	pub intensity: f64,
}

impl Relationship {
	/// Canonical pair key of the record.
	pub fn key(&self) -> PairKey {
		PairKey::new(self.from, self.to)
	}

	/// Whether `id` is either participant.
	pub fn touches(&self, id: EntityId) -> bool {
		self.from == id || self.to == id
	}

	/// The endpoint opposite `id`, if `id` is an endpoint.
	pub fn other(&self, id: EntityId) -> Option<EntityId> {
		if self.from == id {
			Some(self.to)
		} else if self.to == id {
			Some(self.from)
		} else {
			None
		}
	}

	/// Attitude `id` holds toward the other endpoint.
	pub fn attitude_of(&self, id: EntityId) -> Option<Attitude> {
		if self.from == id {
			Some(self.from_type)
		} else if self.to == id {
			Some(self.to_type)
		} else {
			None
		}
	}

	pub(crate) fn attitude_of_mut(&mut self, id: EntityId) -> Option<&mut Attitude> {
		if self.from == id {
			Some(&mut self.from_type)
		} else if self.to == id {
			Some(&mut self.to_type)
		} else {
			None
		}
	}

	/// Both sides hold the same attitude.
	pub fn is_mutual(&self) -> bool {
		self.from_type == self.to_type
	}
}

/// A relationship seen from one participant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttitudeView {
	/// Attitude held by the viewing character.
	pub mine: Attitude,
	/// Attitude held toward the viewing character.
	pub theirs: Attitude,
	/// Shared strength in `[0, 1]`.
	pub intensity: f64,
}

/// Partial update applied by the edit form.
#[derive(Clone, Debug, Default)]
pub struct EntityPatch {
	/// New name; blank names are rejected.
	pub name: Option<String>,
	/// New age.
	pub age: Option<u32>,
	/// `Some(None)` removes the photo.
	pub photo: Option<Option<PhotoRef>>,
}

/// One row of the add/edit form's relationship section.
#[derive(Clone, Debug, PartialEq)]
pub struct RelationshipChoice {
	/// Character on the other end of the row.
	pub other: EntityId,
	/// `None` means "no relationship": any existing record is removed.
	pub attitude: Option<Attitude>,
	/// Shared strength in `[0, 1]`.
	pub intensity: f64,
	/// Write `attitude` for both sides.
	pub mutual: bool,
}

/// Parse free-form age input the way a lenient number field does:
/// leading digits win, anything else is zero. Ages too large for `u32`
/// saturate at `u32::MAX`.
pub fn parse_age(input: &str) -> u32 {
	let digits = input
		.trim()
		.chars()
		.take_while(|c| c.is_ascii_digit());
	digits.fold(0u32, |age, d| {
		age.saturating_mul(10)
			.saturating_add(d.to_digit(10).unwrap_or(0))
	})
}

/// Clamp an intensity into `[0, 1]`. NaN falls back to the editor default.
pub fn clamp_intensity(intensity: f64) -> f64 {
	if intensity.is_nan() {
		0.5
	} else {
		intensity.clamp(0.0, 1.0)
	}
}
