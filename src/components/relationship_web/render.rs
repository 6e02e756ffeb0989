//! Canvas rendering for the relationship web.
//!
//! Draws in passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Edge glows, then gradient edge lines (logical space)
//! 3. Nodes, the dragged one last so it stays on top
//! 4. Name and age labels

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::WebState;
use super::theme::Theme;
use crate::graph::{Entity, Relationship};
use crate::presentation::{edge_opacity, edge_width, float_position};

/// Where a non-mutual edge switches from the `from` colour to the `to` colour.
const SPLIT: (f64, f64) = (0.4, 0.6);

/// Renders the complete web to the canvas.
pub fn render(state: &WebState, ctx: &CanvasRenderingContext2d, theme: &Theme) -> Result<(), JsValue> {
	draw_background(state, ctx, theme)?;

	ctx.save();
	ctx.translate(state.view.x, state.view.y)?;
	ctx.scale(state.view.k, state.view.k)?;

	for rel in state.store.relationships() {
		draw_edge(state, ctx, theme, rel)?;
	}

	let dragged = state.ui.dragged();
	for entity in state.store.entities().filter(|e| Some(e.id) != dragged) {
		draw_node(state, ctx, theme, entity)?;
	}
	if let Some(entity) = dragged.and_then(|id| state.store.entity(id)) {
		draw_node(state, ctx, theme, entity)?;
	}

	ctx.restore();
	Ok(())
}

fn draw_background(state: &WebState, ctx: &CanvasRenderingContext2d, theme: &Theme) -> Result<(), JsValue> {
	let (cx, cy) = (state.width / 2.0, state.height / 2.0);
	let gradient =
		ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, state.width.max(state.height) * 0.8)?;
	gradient.add_color_stop(0.0, &theme.background.to_css())?;
	gradient.add_color_stop(1.0, &theme.background_edge.to_css())?;

	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	Ok(())
}

fn draw_edge(
	state: &WebState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	rel: &Relationship,
) -> Result<(), JsValue> {
	let (Some(from), Some(to)) = (state.store.entity(rel.from), state.store.entity(rel.to)) else {
		return Ok(());
	};
	let (a, b) = (float_position(from, state.time), float_position(to, state.time));
	if a.distance(b) < 0.001 {
		return Ok(());
	}

	let alpha = state
		.fade
		.edge_alpha(rel.key(), edge_opacity(rel, state.ui.isolated()));
	let width = edge_width(rel);
	let from_color = theme.attitudes.get(rel.from_type);
	let to_color = theme.attitudes.get(rel.to_type);

	// Glow
	ctx.set_global_alpha(alpha * 0.25);
	ctx.set_line_cap("round");
	ctx.set_stroke_style_str(&from_color.lighten(0.3).to_css());
	ctx.set_line_width(width * 3.0);
	ctx.begin_path();
	ctx.move_to(a.x, a.y);
	ctx.line_to(b.x, b.y);
	ctx.stroke();

	ctx.set_global_alpha(alpha);
	ctx.set_line_width(width);
	if rel.is_mutual() {
		ctx.set_stroke_style_str(&from_color.to_css());
	} else {
		let gradient = ctx.create_linear_gradient(a.x, a.y, b.x, b.y);
		gradient.add_color_stop(0.0, &from_color.to_css())?;
		gradient.add_color_stop(SPLIT.0 as f32, &from_color.to_css())?;
		gradient.add_color_stop(SPLIT.1 as f32, &to_color.to_css())?;
		gradient.add_color_stop(1.0, &to_color.to_css())?;
		#[allow(deprecated)]
		ctx.set_stroke_style(&gradient);
	}
	ctx.begin_path();
	ctx.move_to(a.x, a.y);
	ctx.line_to(b.x, b.y);
	ctx.stroke();

	ctx.set_global_alpha(1.0);
	Ok(())
}

fn draw_node(
	state: &WebState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	entity: &Entity,
) -> Result<(), JsValue> {
	let p = float_position(entity, state.time);
	let radius = state.node_radius(entity.id);
	let alpha = state.fade.node_alpha(entity.id);

	ctx.set_global_alpha(alpha);

	// Soft outer glow
	let glow = ctx.create_radial_gradient(p.x, p.y, radius * 0.8, p.x, p.y, radius * 1.6)?;
	glow.add_color_stop(0.0, &theme.node.with_alpha(0.35).to_css())?;
	glow.add_color_stop(1.0, &theme.node.with_alpha(0.0).to_css())?;
	ctx.begin_path();
	ctx.arc(p.x, p.y, radius * 1.6, 0.0, 2.0 * PI)?;
	#[allow(deprecated)]
	ctx.set_fill_style(&glow);
	ctx.fill();

	// Body with an inner highlight toward the top left
	let body = ctx.create_radial_gradient(
		p.x - radius * 0.3,
		p.y - radius * 0.3,
		0.0,
		p.x,
		p.y,
		radius,
	)?;
	body.add_color_stop(0.0, &theme.node.lighten(0.4).to_css())?;
	body.add_color_stop(0.7, &theme.node.to_css())?;
	body.add_color_stop(1.0, &theme.node.darken(0.2).to_css())?;
	ctx.begin_path();
	ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI)?;
	#[allow(deprecated)]
	ctx.set_fill_style(&body);
	ctx.fill();

	if entity.photo.is_some() {
		ctx.set_stroke_style_str(&theme.label.to_css());
		ctx.set_line_width(2.0);
		ctx.stroke();
	}

	if let Some(initial) = entity.name.chars().next() {
		ctx.set_fill_style_str(&theme.label.to_css());
		ctx.set_font(theme.label_font);
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		ctx.fill_text(&initial.to_uppercase().to_string(), p.x, p.y)?;
	}

	if state.ui.pending_pick() == Some(entity.id) {
		ctx.begin_path();
		ctx.arc(p.x, p.y, radius + 6.0, 0.0, 2.0 * PI)?;
		ctx.set_stroke_style_str(&theme.pending_ring.to_css());
		ctx.set_line_width(3.0);
		ctx.stroke();
	}

	// Labels; the name line is also the click target for editing
	let top = p.y + radius + 4.0;
	ctx.set_text_align("center");
	ctx.set_text_baseline("top");
	ctx.set_fill_style_str(&theme.label.to_css());
	ctx.set_font(theme.label_font);
	ctx.fill_text(&entity.name, p.x, top + 2.0)?;
	ctx.set_fill_style_str(&theme.label_muted.to_css());
	ctx.set_font(theme.age_font);
	ctx.fill_text(&format!("Age {}", entity.age), p.x, top + 20.0)?;

	ctx.set_global_alpha(1.0);
	Ok(())
}
