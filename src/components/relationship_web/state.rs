//! Editor state behind the canvas component.
//!
//! Wraps the [`GraphStore`] with the interaction machine, the fit-to-canvas
//! view transform and the smoothed isolation fade. Every gesture and toolbar
//! action lands here; the component only translates DOM events and renders.

use std::collections::HashMap;

use log::{info, warn};

use crate::graph::{
	Attitude, EntityId, EntityPatch, GraphError, GraphStore, PairKey, PhotoRef, Point,
	RelationshipChoice,
};
use crate::interaction::{ClickOutcome, Form, Interaction};
use crate::layout::{CanvasConfig, polygon_layout_in};
use crate::persist::{Autosaver, Snapshot, SnapshotStore, load_store, reset};
use crate::presentation::{edge_opacity, float_position, node_opacity, node_scale};

/// Maps the fixed logical canvas onto the real canvas, preserving aspect ratio.
#[derive(Clone, Debug)]
pub struct ViewTransform {
	/// Horizontal offset in screen pixels.
	pub x: f64,
	/// Vertical offset in screen pixels.
	pub y: f64,
	/// Uniform scale from logical to screen pixels.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Largest scale at which `canvas` fits in `width × height`, centered.
	pub fn fit(canvas: &CanvasConfig, width: f64, height: f64) -> Self {
		let k = (width / canvas.width).min(height / canvas.height);
		let k = if k.is_finite() && k > 0.0 { k } else { 1.0 };
		Self {
			x: (width - canvas.width * k) / 2.0,
			y: (height - canvas.height * k) / 2.0,
			k,
		}
	}

	/// Convert a canvas-relative screen point to logical coordinates.
	pub fn screen_to_world(&self, sx: f64, sy: f64) -> Point {
		Point::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

/// Smoothly animated isolation opacities and scales.
///
/// Each node and edge eases toward the target given by the current isolation
/// using exponential smoothing, so toggling isolation fades instead of
/// snapping. Values not in the maps are at rest (opacity 1, scale 1).
#[derive(Clone, Debug, Default)]
pub struct IsolationFade {
	node_alpha: HashMap<EntityId, f64>,
	node_scale: HashMap<EntityId, f64>,
	edge_alpha: HashMap<PairKey, f64>,
}

impl IsolationFade {
	/// Speed of the exponential approach; ~95% of the way in 0.3s.
	const SPEED: f64 = 10.0;

	/// Advance every fade by `dt` seconds toward the targets for `isolated`.
	pub fn tick(&mut self, dt: f64, store: &GraphStore, isolated: Option<EntityId>) {
		let factor = 1.0 - (-Self::SPEED * dt).exp();
		let ease = |value: &mut f64, target: f64| *value += (target - *value) * factor;

		let mut node_alpha = HashMap::with_capacity(store.len());
		let mut scales = HashMap::with_capacity(store.len());
		for entity in store.entities() {
			let mut alpha = self.node_alpha.get(&entity.id).copied().unwrap_or(1.0);
			ease(&mut alpha, node_opacity(store, isolated, entity.id));
			node_alpha.insert(entity.id, alpha);

			let mut scale = self.node_scale.get(&entity.id).copied().unwrap_or(1.0);
			ease(&mut scale, node_scale(isolated, entity.id));
			scales.insert(entity.id, scale);
		}

		let mut edge_alpha = HashMap::with_capacity(store.relationship_count());
		for rel in store.relationships() {
			let target = edge_opacity(rel, isolated);
			let mut alpha = self
				.edge_alpha
				.get(&rel.key())
				.copied()
				.unwrap_or_else(|| edge_opacity(rel, None));
			ease(&mut alpha, target);
			edge_alpha.insert(rel.key(), alpha);
		}

		self.node_alpha = node_alpha;
		self.node_scale = scales;
		self.edge_alpha = edge_alpha;
	}

	/// Smoothed node opacity.
	pub fn node_alpha(&self, id: EntityId) -> f64 {
		self.node_alpha.get(&id).copied().unwrap_or(1.0)
	}

	/// Smoothed node scale.
	pub fn node_scale(&self, id: EntityId) -> f64 {
		self.node_scale.get(&id).copied().unwrap_or(1.0)
	}

	/// Smoothed edge opacity, or `fallback` for an edge not seen yet.
	pub fn edge_alpha(&self, key: PairKey, fallback: f64) -> f64 {
		self.edge_alpha.get(&key).copied().unwrap_or(fallback)
	}
}

/// One relationship row of the add/edit character form.
#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceRow {
	/// The other character in this row.
	pub other: EntityId,
	/// Display name of `other`.
	pub other_name: String,
	/// Attitude of the edited character toward `other`, if any.
	pub attitude: Option<Attitude>,
	/// Attitude of `other` toward the edited character, shown read-only.
	pub theirs: Option<Attitude>,
	/// Shared strength in `[0, 1]`.
	pub intensity: f64,
	/// Write the same attitude in both directions.
	pub mutual: bool,
}

/// Plain-data contents of the open form, detached from the store.
#[derive(Clone, Debug, PartialEq)]
pub enum FormView {
	/// Add or edit a character.
	Character {
		/// `None` when adding a new character.
		id: Option<EntityId>,
		/// Name as typed.
		name: String,
		/// Age as typed; parsed leniently on save.
		age: String,
		/// Photo reference as typed, empty when there is none.
		photo: String,
		/// One row per other character.
		rows: Vec<ChoiceRow>,
	},
	/// Edit the relationship between `a` and `b`.
	Relationship {
		/// First picked character.
		a: EntityId,
		/// Second picked character.
		b: EntityId,
		/// Display name of `a`.
		a_name: String,
		/// Display name of `b`.
		b_name: String,
		/// How `a` regards `b`.
		a_to_b: Attitude,
		/// How `b` regards `a`.
		b_to_a: Attitude,
		/// Shared strength in `[0, 1]`.
		intensity: f64,
		/// Whether a record already exists, which enables removal.
		exists: bool,
	},
}

/// Relationship choices for the rows the user actually changed.
///
/// Untouched rows are left out so saving a form never rewrites relationships
/// the user did not edit.
pub fn changed_choices(initial: &[ChoiceRow], edited: &[ChoiceRow]) -> Vec<RelationshipChoice> {
	initial
		.iter()
		.zip(edited)
		.filter(|(before, after)| before != after)
		.map(|(_, row)| RelationshipChoice {
			other: row.other,
			attitude: row.attitude,
			intensity: row.intensity,
			mutual: row.mutual,
		})
		.collect()
}

/// Intensity preselected for relationships that do not exist yet.
pub const DEFAULT_INTENSITY: f64 = 0.5;

/// Everything the editor needs between frames.
pub struct WebState {
	/// The graph being edited.
	pub store: GraphStore,
	/// Gesture and form state.
	pub ui: Interaction,
	/// Logical canvas geometry.
	pub canvas: CanvasConfig,
	/// Logical to screen mapping.
	pub view: ViewTransform,
	/// Animated isolation effect.
	pub fade: IsolationFade,
	/// Canvas size in screen pixels.
	pub width: f64,
	/// Canvas height in screen pixels.
	pub height: f64,
	/// Seconds since start; drives the floating animation.
	pub time: f64,
	/// Tracks which revision was last written to storage.
	pub autosaver: Autosaver,
	/// Latest user-facing message.
	pub status: Option<String>,
}

impl WebState {
	/// Editor over `store` on a `width × height` canvas.
	pub fn new(store: GraphStore, width: f64, height: f64) -> Self {
		let canvas = CanvasConfig::default();
		let view = ViewTransform::fit(&canvas, width, height);
		Self {
			autosaver: Autosaver::new(&store),
			store,
			ui: Interaction::new(),
			canvas,
			view,
			fade: IsolationFade::default(),
			width,
			height,
			time: 0.0,
			status: None,
		}
	}

	/// Start from the autosaved graph, or the demo graph if there is none.
	pub fn load(backend: &dyn SnapshotStore, width: f64, height: f64) -> Self {
		let (store, status) = match load_store(backend) {
			Ok(Some(store)) => (store, None),
			Ok(None) => (GraphStore::demo(), None),
			Err(err) => {
				warn!("relationship-web: could not load saved data: {err}");
				(
					GraphStore::demo(),
					Some(format!("Could not load saved data: {err}")),
				)
			}
		};
		let mut state = Self::new(store, width, height);
		state.status = status;
		state
	}

	/// Refit the logical canvas to a new screen size.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.view = ViewTransform::fit(&self.canvas, width, height);
	}

	/// Advance the animation clock and the isolation fades.
	pub fn tick(&mut self, dt: f64) {
		self.time += dt;
		self.fade.tick(dt, &self.store, self.ui.isolated());
	}

	/// Where `id` is currently drawn, in logical coordinates.
	pub fn rendered_position(&self, id: EntityId) -> Option<Point> {
		self.store
			.entity(id)
			.map(|e| float_position(e, self.time))
	}

	/// Drawn radius of `id`, including the isolation scale.
	pub fn node_radius(&self, id: EntityId) -> f64 {
		self.canvas.node_radius * self.fade.node_scale(id)
	}

	/// Topmost character whose node covers the logical point `p`.
	pub fn entity_at(&self, p: Point) -> Option<EntityId> {
		self.store
			.entities()
			.filter(|e| float_position(e, self.time).distance(p) <= self.node_radius(e.id))
			.last()
			.map(|e| e.id)
	}

	/// Character whose name label (drawn under the node) covers `p`.
	pub fn name_at(&self, p: Point) -> Option<EntityId> {
		self.store
			.entities()
			.filter(|e| {
				let pos = float_position(e, self.time);
				let top = pos.y + self.node_radius(e.id) + 4.0;
				let half_width = e.name.chars().count() as f64 * 4.0 + 6.0;
				(p.x - pos.x).abs() <= half_width && (top..=top + 20.0).contains(&p.y)
			})
			.last()
			.map(|e| e.id)
	}

	/// Start dragging the character under `p`, if any.
	pub fn mouse_down(&mut self, p: Point) {
		if let Some(id) = self.entity_at(p) {
			if let Some(rendered) = self.rendered_position(id) {
				self.ui.pointer_down(id, p, rendered);
			}
		}
	}

	/// Move the dragged character, if any.
	pub fn mouse_move(&mut self, p: Point) {
		if let Err(err) = self.ui.pointer_move(p, &mut self.store, &self.canvas) {
			warn!("relationship-web: drag ended: {err}");
		}
	}

	/// End any drag.
	pub fn mouse_up(&mut self) {
		self.ui.pointer_up();
	}

	/// Pointer left the canvas; ends any drag.
	pub fn mouse_leave(&mut self) {
		self.ui.pointer_lost();
	}

	/// Click: names open the editor, nodes feed connect mode.
	pub fn click(&mut self, p: Point) {
		if let Some(id) = self.name_at(p) {
			self.ui.name_click(id);
			return;
		}
		if let Some(id) = self.entity_at(p) {
			match self.ui.click(id) {
				ClickOutcome::FirstSelected(_) => {
					self.status = Some("Now click a second character".into());
				}
				ClickOutcome::PairSelected(..) => self.status = None,
				ClickOutcome::Ignored => {}
			}
		}
	}

	/// Toggle isolation of the character under `p`.
	pub fn double_click(&mut self, p: Point) {
		if let Some(id) = self.entity_at(p) {
			self.ui.double_click(id);
		}
	}

	/// Toggle connect mode. Returns whether it is on afterwards.
	pub fn toggle_connect(&mut self) -> bool {
		let enable = !self.ui.is_connecting();
		let on = self.ui.set_connect_mode(enable, self.store.len());
		if enable && !on {
			self.status = Some("Add at least two characters to connect them".into());
		}
		on
	}

	/// Arrange all characters on a regular polygon.
	pub fn arrange(&mut self) {
		let positions = polygon_layout_in(&self.store.ids(), &self.canvas);
		self.store.apply_layout(&positions);
	}

	/// Add a character together with its relationship rows.
	pub fn add_character(
		&mut self,
		name: &str,
		age: &str,
		photo: Option<PhotoRef>,
		choices: &[RelationshipChoice],
	) -> bool {
		let result: Result<EntityId, GraphError> = self.store.transaction(|draft| {
			let id = draft.add_entity(name, age, photo)?;
			draft.apply_choices(id, choices)?;
			Ok(id)
		});
		match result {
			Ok(id) => {
				info!("relationship-web: added {id}");
				self.ui.close_form();
				self.status = None;
				true
			}
			Err(err) => self.report("add character", err),
		}
	}

	/// Apply the edit form for `id`.
	pub fn edit_character(
		&mut self,
		id: EntityId,
		patch: EntityPatch,
		choices: &[RelationshipChoice],
	) -> bool {
		let result = self.store.transaction(|draft| {
			draft.update_entity(id, patch)?;
			draft.apply_choices(id, choices)
		});
		match result {
			Ok(()) => {
				self.ui.close_form();
				self.status = None;
				true
			}
			Err(err) => self.report("save character", err),
		}
	}

	/// Delete `id` and every relationship it takes part in.
	pub fn delete_character(&mut self, id: EntityId) -> bool {
		match self.store.remove_entity(id) {
			Ok(entity) => {
				info!("relationship-web: deleted {} ({id})", entity.name);
				self.ui.forget_entity(id);
				if self.store.len() < crate::interaction::MIN_CONNECT_ENTITIES {
					self.ui.set_connect_mode(false, self.store.len());
				}
				true
			}
			Err(err) => self.report("delete character", err),
		}
	}

	/// Save the relationship editor: both directions set explicitly.
	pub fn save_relationship(
		&mut self,
		a: EntityId,
		b: EntityId,
		a_to_b: Attitude,
		b_to_a: Attitude,
		intensity: f64,
	) -> bool {
		match self.store.set_pair(a, b, a_to_b, b_to_a, intensity) {
			Ok(()) => {
				self.ui.close_form();
				true
			}
			Err(err) => self.report("save relationship", err),
		}
	}

	/// Delete the relationship between `a` and `b` and close the editor.
	pub fn remove_relationship(&mut self, a: EntityId, b: EntityId) {
		self.store.remove_relationship(a, b);
		self.ui.close_form();
	}

	/// Replace the graph with pasted or uploaded JSON.
	pub fn import_text(&mut self, input: &str) -> bool {
		match self.store.import_str(input) {
			Ok(count) => {
				self.ui.reset();
				self.status = Some(format!(
					"Imported {count} characters with {} relationships",
					self.store.relationship_count()
				));
				true
			}
			Err(err) => self.report("import", err),
		}
	}

	/// The current graph as pretty JSON, stamped with `date`.
	pub fn export_json(&mut self, date: &str) -> Option<String> {
		match Snapshot::from_store(&self.store)
			.stamped_export(date)
			.to_json()
		{
			Ok(json) => Some(json),
			Err(err) => {
				self.report("export", err);
				None
			}
		}
	}

	/// Save if anything changed since the last save. Failures are reported, not fatal.
	pub fn autosave(&mut self, backend: &dyn SnapshotStore, now: &str) {
		if let Err(err) = self.autosaver.maybe_save(&self.store, backend, now) {
			self.report("save", err);
		}
	}

	/// Explicit save, regardless of pending changes.
	pub fn save_now(&mut self, backend: &dyn SnapshotStore, now: &str) {
		match self.autosaver.save_now(&self.store, backend, now) {
			Ok(()) => self.status = Some("Saved".into()),
			Err(err) => {
				self.report("save", err);
			}
		}
	}

	/// Forget saved data and go back to the demo graph.
	pub fn reset(&mut self, backend: &dyn SnapshotStore) {
		match reset(backend) {
			Ok(store) => {
				self.autosaver = Autosaver::new(&store);
				self.store = store;
				self.ui.reset();
				self.fade = IsolationFade::default();
				self.status = Some("Reset to demo data".into());
			}
			Err(err) => {
				self.report("reset", err);
			}
		}
	}

	/// Detached contents for the open form, if any.
	pub fn form_view(&self) -> Option<FormView> {
		let name_of = |id: EntityId| self.store.entity(id).map(|e| e.name.clone());
		match self.ui.form()? {
			Form::AddCharacter => Some(FormView::Character {
				id: None,
				name: String::new(),
				age: String::new(),
				photo: String::new(),
				rows: self
					.store
					.entities()
					.map(|e| ChoiceRow {
						other: e.id,
						other_name: e.name.clone(),
						attitude: None,
						theirs: None,
						intensity: DEFAULT_INTENSITY,
						mutual: false,
					})
					.collect(),
			}),
			Form::EditCharacter(id) => {
				let entity = self.store.entity(id)?;
				let rows = self
					.store
					.entities()
					.filter(|e| e.id != id)
					.map(|e| {
						let view = self.store.attitude(id, e.id);
						ChoiceRow {
							other: e.id,
							other_name: e.name.clone(),
							attitude: view.map(|v| v.mine),
							theirs: view.map(|v| v.theirs),
							intensity: view.map_or(DEFAULT_INTENSITY, |v| v.intensity),
							mutual: false,
						}
					})
					.collect();
				Some(FormView::Character {
					id: Some(id),
					name: entity.name.clone(),
					age: entity.age.to_string(),
					photo: entity.photo.as_ref().map(|p| p.0.clone()).unwrap_or_default(),
					rows,
				})
			}
			Form::EditRelationship(a, b) => {
				let view = self.store.attitude(a, b);
				Some(FormView::Relationship {
					a,
					b,
					a_name: name_of(a)?,
					b_name: name_of(b)?,
					a_to_b: view.map_or(Attitude::Neutral, |v| v.mine),
					b_to_a: view.map_or(Attitude::Neutral, |v| v.theirs),
					intensity: view.map_or(DEFAULT_INTENSITY, |v| v.intensity),
					exists: view.is_some(),
				})
			}
		}
	}

	fn report(&mut self, action: &str, err: impl std::fmt::Display) -> bool {
		warn!("relationship-web: {action} failed: {err}");
		self.status = Some(format!("Could not {action}: {err}"));
		false
	}
}
