//! Placement policies for characters.
//!
//! Three independent policies exist, each used in exactly one situation:
//!
//! - [`polygon_layout`]: the explicit "arrange" action. Every character is placed
//!   on a regular polygon around the canvas center, ignoring prior positions.
//! - [`jitter_position`]: where a newly added character first appears.
//! - [`grid_position`]: where characters from a legacy import are placed.

use std::f64::consts::{PI, TAU};

use indexmap::IndexMap;
use rand::Rng;

use crate::graph::{EntityId, Point};

/// Logical canvas geometry shared by layout, dragging and rendering.
#[derive(Clone, Debug)]
pub struct CanvasConfig {
	/// Logical width.
	pub width: f64,
	/// Logical height.
	pub height: f64,
	/// Margin kept free around the polygon layout (node size plus labels).
	pub layout_margin: f64,
	/// Distance from each edge that dragged characters are clamped to.
	pub drag_inset: f64,
	/// Base node radius in logical pixels.
	pub node_radius: f64,
}

impl Default for CanvasConfig {
	fn default() -> Self {
		Self {
			width: 1000.0,
			height: 800.0,
			layout_margin: 80.0,
			drag_inset: 50.0,
			node_radius: 28.0,
		}
	}
}

impl CanvasConfig {
	/// Centre of the logical canvas.
	pub fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	/// Clamp a point so it stays `drag_inset` away from every edge.
	/// Each axis is clamped on its own.
	pub fn clamp_drag(&self, p: Point) -> Point {
		let inset = self.drag_inset;
		Point::new(
			p.x.clamp(inset, (self.width - inset).max(inset)),
			p.y.clamp(inset, (self.height - inset).max(inset)),
		)
	}
}

/// Arrange `ids` on a regular polygon, first one at 12 o'clock, then clockwise.
///
/// The result depends only on how many ids there are and on the canvas bounds.
/// A single character sits exactly on the center; positions of larger sets are
/// rounded to whole pixels so re-renders are stable.
pub fn polygon_layout(
	ids: &[EntityId],
	width: f64,
	height: f64,
	margin: f64,
) -> IndexMap<EntityId, Point> {
	let center = Point::new(width / 2.0, height / 2.0);
	match ids {
		[] => IndexMap::new(),
		[only] => IndexMap::from([(*only, center)]),
		_ => {
			let radius = ((width - 2.0 * margin) / 2.0).min((height - 2.0 * margin) / 2.0);
			let step = TAU / ids.len() as f64;
			ids.iter()
				.enumerate()
				.map(|(i, &id)| {
					let angle = -PI / 2.0 + i as f64 * step;
					let x = (center.x + radius * angle.cos()).round();
					let y = (center.y + radius * angle.sin()).round();
					(id, Point::new(x, y))
				})
				.collect()
		}
	}
}

/// [`polygon_layout`] over the configured canvas.
pub fn polygon_layout_in(ids: &[EntityId], canvas: &CanvasConfig) -> IndexMap<EntityId, Point> {
	polygon_layout(ids, canvas.width, canvas.height, canvas.layout_margin)
}

/// Anchor around which new characters are scattered.
pub const JITTER_ORIGIN: Point = Point::new(300.0, 300.0);
/// Half-width of the square new characters are scattered over.
pub const JITTER_SPREAD: f64 = 100.0;

/// Starting position for a newly added character: uniform within
/// `JITTER_SPREAD` of `JITTER_ORIGIN` on both axes.
pub fn jitter_position<R: Rng>(rng: &mut R) -> Point {
	Point::new(
		JITTER_ORIGIN.x + rng.gen_range(-JITTER_SPREAD..JITTER_SPREAD),
		JITTER_ORIGIN.y + rng.gen_range(-JITTER_SPREAD..JITTER_SPREAD),
	)
}

/// Columns of the legacy import grid.
pub const GRID_COLUMNS: usize = 5;
/// Distance between neighbouring grid cells, both axes.
pub const GRID_PITCH: f64 = 120.0;
/// Top-left cell of the legacy import grid.
pub const GRID_ORIGIN: Point = Point::new(200.0, 200.0);

/// Position of the `index`-th legacy character, row-major.
pub fn grid_position(index: usize) -> Point {
	let (col, row) = (index % GRID_COLUMNS, index / GRID_COLUMNS);
	Point::new(
		GRID_ORIGIN.x + col as f64 * GRID_PITCH,
		GRID_ORIGIN.y + row as f64 * GRID_PITCH,
	)
}

/// A fresh floating-animation phase in `[0, 2π)`.
pub fn random_phase<R: Rng>(rng: &mut R) -> f64 {
	rng.gen_range(0.0..TAU)
}
