//! Colours for the relationship web.

use crate::graph::Attitude;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Opacity in `[0, 1]`.
	pub a: f64,
}

impl Color {
	/// Opaque colour.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Colour with an explicit opacity.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same colour with a different opacity.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	/// CSS colour string: hex when opaque, `rgba()` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Per-attitude edge colours.
#[derive(Clone, Debug)]
pub struct AttitudePalette {
	/// Ally edges.
	pub ally: Color,
	/// Enemy edges.
	pub enemy: Color,
	/// Neutral edges.
	pub neutral: Color,
}

impl AttitudePalette {
	/// Colour for one attitude.
	pub fn get(&self, attitude: Attitude) -> Color {
		match attitude {
			Attitude::Ally => self.ally,
			Attitude::Enemy => self.enemy,
			Attitude::Neutral => self.neutral,
		}
	}
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Inner colour of the background's radial gradient.
	pub background: Color,
	/// Outer colour of the background's radial gradient.
	pub background_edge: Color,
	/// Edge colours.
	pub attitudes: AttitudePalette,
	/// Fill of a character node without a photo.
	pub node: Color,
	/// Ring around the first pick in connect mode.
	pub pending_ring: Color,
	/// Name labels and node initials.
	pub label: Color,
	/// Age labels.
	pub label_muted: Color,
	/// Font for names and initials.
	pub label_font: &'static str,
	/// Font for ages.
	pub age_font: &'static str,
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Color::rgb(30, 27, 75),
			background_edge: Color::rgb(15, 23, 42),
			attitudes: AttitudePalette {
				ally: Color::rgb(16, 185, 129),
				enemy: Color::rgb(239, 68, 68),
				neutral: Color::rgb(107, 114, 128),
			},
			node: Color::rgb(99, 102, 241),
			pending_ring: Color::rgb(250, 204, 21),
			label: Color::rgb(241, 245, 249),
			label_muted: Color::rgba(203, 213, 225, 0.8),
			label_font: "600 13px sans-serif",
			age_font: "11px sans-serif",
		}
	}
}
