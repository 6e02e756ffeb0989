//! Pointer gesture handling: dragging, connect mode, isolation and open forms.
//!
//! The machine owns only transient selection state. Positions are written
//! straight to the [`GraphStore`]; nothing here is ever persisted.

use log::debug;

use crate::graph::{EntityId, GraphError, GraphStore, Point};
use crate::layout::CanvasConfig;

/// Mutually exclusive gesture mode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Mode {
	/// No gesture in progress.
	#[default]
	Idle,
	/// A character follows the pointer. `offset` is pointer minus the
	/// character's rendered position at grab time.
	Dragging {
		/// Character being dragged.
		id: EntityId,
		/// Grab offset, kept constant for the whole drag.
		offset: Point,
	},
	/// Connect mode is on; `first` is the pending first pick.
	Connecting {
		/// First character picked, if any.
		first: Option<EntityId>,
	},
}

/// Form or editor currently open over the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Form {
	/// New character form.
	AddCharacter,
	/// Edit form for one character.
	EditCharacter(EntityId),
	/// Relationship editor for a pair.
	EditRelationship(EntityId, EntityId),
}

/// What a plain click on a character resulted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
	/// Click had no effect.
	Ignored,
	/// First character of a pair picked in connect mode.
	FirstSelected(EntityId),
	/// Second, different character picked; the relationship editor is open.
	PairSelected(EntityId, EntityId),
}

/// Minimum number of characters for connect mode to make sense.
pub const MIN_CONNECT_ENTITIES: usize = 2;

/// Pointer gesture state machine.
#[derive(Clone, Debug, Default)]
pub struct Interaction {
	mode: Mode,
	isolated: Option<EntityId>,
	form: Option<Form>,
}

impl Interaction {
	/// Idle, with nothing isolated and no form open.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current gesture mode.
	pub fn mode(&self) -> Mode {
		self.mode
	}

	/// Character whose neighbourhood is isolated, if any.
	pub fn isolated(&self) -> Option<EntityId> {
		self.isolated
	}

	/// Form currently open, if any.
	pub fn form(&self) -> Option<Form> {
		self.form
	}

	/// Whether connect mode is on.
	pub fn is_connecting(&self) -> bool {
		matches!(self.mode, Mode::Connecting { .. })
	}

	/// The first pick while in connect mode, for highlighting.
	pub fn pending_pick(&self) -> Option<EntityId> {
		match self.mode {
			Mode::Connecting { first } => first,
			_ => None,
		}
	}

	/// Character being dragged, if any.
	pub fn dragged(&self) -> Option<EntityId> {
		match self.mode {
			Mode::Dragging { id, .. } => Some(id),
			_ => None,
		}
	}

	/// Turn connect mode on or off.
	///
	/// Turning it on needs at least [`MIN_CONNECT_ENTITIES`] characters and ends
	/// any drag in progress. Returns whether connect mode is on afterwards.
	pub fn set_connect_mode(&mut self, enabled: bool, entity_count: usize) -> bool {
		match (enabled, self.mode) {
			(true, Mode::Connecting { .. }) => true,
			(true, _) if entity_count < MIN_CONNECT_ENTITIES => false,
			(true, _) => {
				self.mode = Mode::Connecting { first: None };
				true
			}
			(false, Mode::Connecting { .. }) => {
				self.mode = Mode::Idle;
				false
			}
			(false, _) => false,
		}
	}

	/// Pointer pressed on a character. Starts a drag only from `Idle`.
	///
	/// `rendered` is where the character is currently drawn (including the
	/// floating offset), so it stays put under the cursor.
	pub fn pointer_down(&mut self, id: EntityId, pointer: Point, rendered: Point) -> bool {
		if self.mode != Mode::Idle {
			return false;
		}
		self.mode = Mode::Dragging {
			id,
			offset: pointer - rendered,
		};
		debug!("relationship-web: drag start {id}");
		true
	}

	/// Pointer moved. While dragging, writes the clamped position to the store.
	///
	/// Returns `Ok(false)` when nothing is being dragged. If the dragged
	/// character no longer exists the drag ends and the error is returned.
	pub fn pointer_move(
		&mut self,
		pointer: Point,
		store: &mut GraphStore,
		canvas: &CanvasConfig,
	) -> Result<bool, GraphError> {
		let Mode::Dragging { id, offset } = self.mode else {
			return Ok(false);
		};
		let target = canvas.clamp_drag(pointer - offset);
		if let Err(err) = store.move_entity(id, target) {
			self.mode = Mode::Idle;
			return Err(err);
		}
		Ok(true)
	}

	/// Pointer released. Ends any drag.
	pub fn pointer_up(&mut self) {
		if let Mode::Dragging { id, .. } = self.mode {
			debug!("relationship-web: drag end {id}");
			self.mode = Mode::Idle;
		}
	}

	/// Pointer tracking lost (left the canvas, window blur). Same as release.
	pub fn pointer_lost(&mut self) {
		self.pointer_up();
	}

	/// Plain click on a character. Only meaningful in connect mode.
	pub fn click(&mut self, id: EntityId) -> ClickOutcome {
		let Mode::Connecting { first } = self.mode else {
			return ClickOutcome::Ignored;
		};
		match first {
			None => {
				self.mode = Mode::Connecting { first: Some(id) };
				ClickOutcome::FirstSelected(id)
			}
			Some(first) if first == id => ClickOutcome::Ignored,
			Some(first) => {
				self.mode = Mode::Connecting { first: None };
				self.form = Some(Form::EditRelationship(first, id));
				ClickOutcome::PairSelected(first, id)
			}
		}
	}

	/// Double click: isolate `id`, or clear isolation if `id` is already isolated.
	pub fn double_click(&mut self, id: EntityId) {
		self.isolated = if self.isolated == Some(id) {
			None
		} else {
			Some(id)
		};
	}

	/// Show the whole graph again.
	pub fn clear_isolation(&mut self) {
		self.isolated = None;
	}

	/// Click on a character's name: open its edit form.
	pub fn name_click(&mut self, id: EntityId) {
		self.form = Some(Form::EditCharacter(id));
	}

	/// Open the new character form.
	pub fn open_add_form(&mut self) {
		self.form = Some(Form::AddCharacter);
	}

	/// Close whatever form is open.
	pub fn close_form(&mut self) {
		self.form = None;
	}

	/// Drop every reference to a character that no longer exists.
	pub fn forget_entity(&mut self, id: EntityId) {
		match self.mode {
			Mode::Dragging { id: dragged, .. } if dragged == id => self.mode = Mode::Idle,
			Mode::Connecting { first: Some(first) } if first == id => {
				self.mode = Mode::Connecting { first: None }
			}
			_ => {}
		}
		if self.isolated == Some(id) {
			self.isolated = None;
		}
		let stale = match self.form {
			Some(Form::EditCharacter(e)) => e == id,
			Some(Form::EditRelationship(a, b)) => a == id || b == id,
			_ => false,
		};
		if stale {
			self.form = None;
		}
	}

	/// Clear all transient state, e.g. after the whole graph was replaced.
	pub fn reset(&mut self) {
		*self = Self::default();
	}
}
