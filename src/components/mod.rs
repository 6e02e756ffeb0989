//! Leptos components.

pub mod relationship_web;
