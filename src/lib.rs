//! relationship-web: interactive character relationship web.
//!
//! Characters are connected by directional, typed and weighted relationships.
//! The crate holds the graph model, the deterministic layout, the interaction
//! state machine and snapshot persistence, plus a WASM canvas editor built on
//! Leptos.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};

// Linked for its `js` feature, which lets `rand` seed itself on wasm.
use getrandom as _;

pub mod components;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod persist;
pub mod presentation;

pub use components::relationship_web::{RelationshipWeb, Theme, WebState};
pub use graph::{Attitude, Entity, EntityId, GraphStore, Relationship};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("relationship-web: logging initialized");
}

/// Main application component.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Character Relationship Web" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-web">
			<RelationshipWeb />
			<div class="web-overlay">
				<h1>"Character Relationship Web"</h1>
				<p class="subtitle">
					"Drag characters to move them. Double-click to focus. Click a name to edit."
				</p>
			</div>
		</div>
	}
}
