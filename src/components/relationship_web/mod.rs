//! Canvas editor for the relationship web.
//!
//! Renders characters and their relationships on an HTML canvas with:
//! - Floating nodes and attitude-coloured gradient edges
//! - Dragging, connect mode and double-click isolation
//! - Add/edit character forms and a two-sided relationship editor
//! - Autosave to `localStorage`, JSON export and import
//!
//! # Example
//!
//! ```ignore
//! use relationship_web::RelationshipWeb;
//!
//! view! { <RelationshipWeb /> }
//! ```

mod component;
mod render;
mod state;
pub mod theme;

pub use component::RelationshipWeb;
pub use state::{ChoiceRow, DEFAULT_INTENSITY, FormView, IsolationFade, ViewTransform, WebState, changed_choices};
pub use theme::Theme;
