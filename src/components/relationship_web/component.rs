//! Leptos component wrapping the relationship web canvas.
//!
//! The canvas gets mouse handlers for dragging, connecting, isolating and
//! opening the edit forms. An animation loop runs via `requestAnimationFrame`,
//! advancing the presentation clock and redrawing every frame. Toolbar, forms
//! and the status line are ordinary Leptos views fed from signals that are
//! refreshed after each action.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::html::Canvas;
use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Event, HtmlCanvasElement, MouseEvent, Window};

use super::render;
use super::state::{ChoiceRow, FormView, WebState, changed_choices};
use super::theme::Theme;
use crate::graph::{Attitude, EntityId, EntityPatch, PhotoRef, Point, parse_age};
use crate::persist::LocalStorageStore;

type Shared = Rc<RefCell<Option<WebState>>>;

/// Fixed animation step, in seconds.
const FRAME_DT: f64 = 0.016;

/// Copyable handle to the editor state plus the signals the views read.
#[derive(Clone, Copy)]
struct Editor {
	state: StoredValue<Shared, LocalStorage>,
	form: RwSignal<Option<FormView>>,
	status: RwSignal<Option<String>>,
	connecting: RwSignal<bool>,
}

impl Editor {
	/// Run `f` against the editor state, autosave, then publish what changed.
	fn update<T>(self, f: impl FnOnce(&mut WebState) -> T) -> Option<T> {
		let (out, form, status, connecting) = self.state.with_value(|shared| {
			let mut guard = shared.borrow_mut();
			let state = guard.as_mut()?;
			let out = f(state);
			// Positions settle on release; no need to write every mousemove.
			if state.ui.dragged().is_none() {
				state.autosave(&LocalStorageStore::default(), &now());
			}
			Some((
				out,
				state.form_view(),
				state.status.clone(),
				state.ui.is_connecting(),
			))
		})?;
		if self.form.get_untracked() != form {
			self.form.set(form);
		}
		if self.status.get_untracked() != status {
			self.status.set(status);
		}
		if self.connecting.get_untracked() != connecting {
			self.connecting.set(connecting);
		}
		Some(out)
	}

	/// Canvas-relative pointer position mapped to logical coordinates.
	fn pointer(self, canvas_ref: NodeRef<Canvas>, ev: &MouseEvent) -> Option<Point> {
		let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);
		self.state.with_value(|shared| {
			shared
				.borrow()
				.as_ref()
				.map(|s| s.view.screen_to_world(x, y))
		})
	}
}

fn now() -> String {
	String::from(js_sys::Date::new_0().to_iso_string())
}

fn viewport(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>, fallback: f64| v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback);
	(dim(window.inner_width(), 1000.0), dim(window.inner_height(), 800.0))
}

/// Interactive character relationship web filling the viewport.
///
/// Loads the autosaved graph from `localStorage` (or the demo graph), and
/// resizes automatically with the window.
#[component]
pub fn RelationshipWeb() -> impl IntoView {
	let canvas_ref = NodeRef::<Canvas>::new();
	let shared: Shared = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	let editor = Editor {
		state: StoredValue::new_local(shared.clone()),
		form: RwSignal::new(None),
		status: RwSignal::new(None),
		connecting: RwSignal::new(false),
	};

	let (shared_init, animate_init, resize_cb_init) = (shared.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = viewport(&window);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into().ok())
		{
			Some(ctx) => ctx,
			None => {
				warn!("relationship-web: canvas 2d context unavailable");
				return;
			}
		};

		let state = WebState::load(&LocalStorageStore::default(), w, h);
		info!(
			"relationship-web: {} characters, {} relationships",
			state.store.len(),
			state.store.relationship_count()
		);
		*shared_init.borrow_mut() = Some(state);
		editor.update(|_| ());

		let (shared_resize, canvas_resize) = (shared_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = viewport(&win);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *shared_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (shared_anim, animate_inner) = (shared_init.clone(), animate_init.clone());
		let theme = Theme::default();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *shared_anim.borrow_mut() {
				s.tick(FRAME_DT);
				if let Err(err) = render::render(s, &ctx, &theme) {
					warn!("relationship-web: render failed: {err:?}");
				}
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let on_mousedown = move |ev: MouseEvent| {
		if let Some(p) = editor.pointer(canvas_ref, &ev) {
			editor.update(|s| s.mouse_down(p));
		}
	};
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(p) = editor.pointer(canvas_ref, &ev) {
			editor.update(|s| s.mouse_move(p));
		}
	};
	let on_mouseup = move |_: MouseEvent| {
		editor.update(|s| s.mouse_up());
	};
	let on_mouseleave = move |_: MouseEvent| {
		editor.update(|s| s.mouse_leave());
	};
	let on_click = move |ev: MouseEvent| {
		if let Some(p) = editor.pointer(canvas_ref, &ev) {
			editor.update(|s| s.click(p));
		}
	};
	let on_dblclick = move |ev: MouseEvent| {
		if let Some(p) = editor.pointer(canvas_ref, &ev) {
			editor.update(|s| s.double_click(p));
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="relationship-web-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:click=on_click
			on:dblclick=on_dblclick
			style="display: block; cursor: pointer;"
		/>
		<Toolbar editor=editor />
		<p class="status" role="status">{move || editor.status.get()}</p>
		{move || {
			editor
				.form
				.get()
				.map(|current| match current {
					FormView::Character { id, name, age, photo, rows } => {
						view! { <CharacterForm editor=editor id=id name=name age=age photo=photo rows=rows /> }
							.into_any()
					}
					FormView::Relationship { a, b, a_name, b_name, a_to_b, b_to_a, intensity, exists } => {
						view! {
							<RelationshipEditor
								editor=editor
								a=a
								b=b
								a_name=a_name
								b_name=b_name
								a_to_b=a_to_b
								b_to_a=b_to_a
								intensity=intensity
								exists=exists
							/>
						}
							.into_any()
					}
				})
		}}
	}
}

#[component]
fn Toolbar(editor: Editor) -> impl IntoView {
	let transfer = RwSignal::new(String::new());

	let export = move |_: MouseEvent| {
		if let Some(Some(json)) = editor.update(|s| s.export_json(&now())) {
			transfer.set(json);
		}
	};
	let import = move |_: MouseEvent| {
		let text = transfer.get_untracked();
		if editor.update(|s| s.import_text(&text)) == Some(true) {
			transfer.set(String::new());
		}
	};

	view! {
		<div class="toolbar">
			<button on:click=move |_| {
				editor.update(|s| s.ui.open_add_form());
			}>"Add Character"</button>
			<button on:click=move |_| {
				editor.update(|s| s.arrange());
			}>"Arrange"</button>
			<button
				class:active=move || editor.connecting.get()
				on:click=move |_| {
					editor.update(|s| s.toggle_connect());
				}
			>
				{move || if editor.connecting.get() { "Connecting…" } else { "Connect" }}
			</button>
			<button on:click=move |_| {
				editor.update(|s| s.ui.clear_isolation());
			}>"Show All"</button>
			<button on:click=move |_| {
				editor.update(|s| s.save_now(&LocalStorageStore::default(), &now()));
			}>"Save"</button>
			<button on:click=export>"Export"</button>
			<button on:click=import>"Import"</button>
			<button on:click=move |_| {
				editor.update(|s| s.reset(&LocalStorageStore::default()));
			}>"Reset"</button>
			<textarea
				class="transfer"
				placeholder="Exported JSON appears here; paste JSON and press Import"
				prop:value=move || transfer.get()
				on:input=move |ev| transfer.set(event_target_value(&ev))
			/>
		</div>
	}
}

/// Select options for an attitude; the empty value means "no relationship".
///
/// `current` is marked `selected` up front since the select's value is set
/// before its options exist.
fn attitude_options(with_none: bool, current: Option<Attitude>) -> impl IntoView {
	let none = with_none
		.then(|| view! { <option value="" selected={current.is_none()}>"No relationship"</option> });
	view! {
		{none}
		{Attitude::ALL
			.into_iter()
			.map(|a| view! { <option value=a.name() selected={current == Some(a)}>{a.name()}</option> })
			.collect_view()}
	}
}

#[component]
fn ChoiceRowView(row: RwSignal<ChoiceRow>) -> impl IntoView {
	let (other_name, theirs, current) =
		row.with_untracked(|r| (r.other_name.clone(), r.theirs, r.attitude));
	view! {
		<div class="choice-row">
			<span class="other">{other_name}</span>
			<select
				prop:value=move || row.with(|r| r.attitude.map_or("", Attitude::name))
				on:change=move |ev| {
					let value = event_target_value(&ev);
					row.update(|r| r.attitude = Attitude::from_name(&value));
				}
			>
				{attitude_options(true, current)}
			</select>
			<input
				type="range"
				min="0"
				max="1"
				step="0.05"
				prop:value=move || row.with(|r| r.intensity.to_string())
				on:input=move |ev| {
					if let Ok(v) = event_target_value(&ev).parse::<f64>() {
						row.update(|r| r.intensity = v);
					}
				}
			/>
			<label>
				<input
					type="checkbox"
					prop:checked=move || row.with(|r| r.mutual)
					on:change=move |ev| row.update(|r| r.mutual = event_target_checked(&ev))
				/>
				"Mutual"
			</label>
			{theirs.map(|t| view! { <span class="theirs">"They see them as " {t.name()}</span> })}
		</div>
	}
}

#[component]
fn CharacterForm(
	editor: Editor,
	id: Option<EntityId>,
	name: String,
	age: String,
	photo: String,
	rows: Vec<ChoiceRow>,
) -> impl IntoView {
	let name = RwSignal::new(name);
	let age = RwSignal::new(age);
	let photo = RwSignal::new(photo);
	let row_signals: Vec<RwSignal<ChoiceRow>> = rows.iter().cloned().map(RwSignal::new).collect();
	let initial = StoredValue::new(rows);
	let edited = StoredValue::new(row_signals.clone());

	let save = move |_: MouseEvent| {
		let rows: Vec<ChoiceRow> = edited.with_value(|rs| rs.iter().map(|r| r.get_untracked()).collect());
		let choices = initial.with_value(|before| changed_choices(before, &rows));
		let (name, age, photo) = (name.get_untracked(), age.get_untracked(), photo.get_untracked());
		let photo = (!photo.trim().is_empty()).then(|| PhotoRef(photo.trim().to_string()));
		editor.update(|s| match id {
			None => s.add_character(&name, &age, photo, &choices),
			Some(id) => {
				let patch = EntityPatch {
					name: Some(name),
					age: Some(parse_age(&age)),
					photo: Some(photo),
				};
				s.edit_character(id, patch, &choices)
			}
		});
	};
	let delete = move |_: MouseEvent| {
		if let Some(id) = id {
			editor.update(|s| s.delete_character(id));
		}
	};

	view! {
		<div class="form-panel">
			<h2>{if id.is_some() { "Edit Character" } else { "Add Character" }}</h2>
			<label>
				"Name"
				<input type="text" prop:value=move || name.get() on:input=move |ev| name.set(event_target_value(&ev)) />
			</label>
			<label>
				"Age"
				<input type="text" prop:value=move || age.get() on:input=move |ev| age.set(event_target_value(&ev)) />
			</label>
			<label>
				"Photo"
				<input type="text" prop:value=move || photo.get() on:input=move |ev| photo.set(event_target_value(&ev)) />
			</label>
			<div class="choices">
				{row_signals.into_iter().map(|row| view! { <ChoiceRowView row=row /> }).collect_view()}
			</div>
			<div class="actions">
				<button on:click=save>"Save"</button>
				<Show when=move || id.is_some()>
					<button class="danger" on:click=delete>"Delete"</button>
				</Show>
				<button on:click=move |_| {
					editor.update(|s| s.ui.close_form());
				}>"Cancel"</button>
			</div>
		</div>
	}
}

#[component]
fn RelationshipEditor(
	editor: Editor,
	a: EntityId,
	b: EntityId,
	a_name: String,
	b_name: String,
	a_to_b: Attitude,
	b_to_a: Attitude,
	intensity: f64,
	exists: bool,
) -> impl IntoView {
	let a_to_b = RwSignal::new(a_to_b);
	let b_to_a = RwSignal::new(b_to_a);
	let intensity = RwSignal::new(intensity);

	let save = move |_: MouseEvent| {
		let (ab, ba, i) = (a_to_b.get_untracked(), b_to_a.get_untracked(), intensity.get_untracked());
		editor.update(|s| s.save_relationship(a, b, ab, ba, i));
	};
	let pick = move |signal: RwSignal<Attitude>| {
		move |ev: Event| {
			if let Some(attitude) = Attitude::from_name(&event_target_value(&ev)) {
				signal.set(attitude);
			}
		}
	};

	view! {
		<div class="form-panel">
			<h2>{format!("{a_name} & {b_name}")}</h2>
			<label>
				{format!("{a_name} sees {b_name} as")}
				<select prop:value=move || a_to_b.get().name() on:change=pick(a_to_b)>
					{attitude_options(false, Some(a_to_b.get_untracked()))}
				</select>
			</label>
			<label>
				{format!("{b_name} sees {a_name} as")}
				<select prop:value=move || b_to_a.get().name() on:change=pick(b_to_a)>
					{attitude_options(false, Some(b_to_a.get_untracked()))}
				</select>
			</label>
			<label>
				"Intensity"
				<input
					type="range"
					min="0"
					max="1"
					step="0.05"
					prop:value=move || intensity.get().to_string()
					on:input=move |ev| {
						if let Ok(v) = event_target_value(&ev).parse::<f64>() {
							intensity.set(v);
						}
					}
				/>
			</label>
			<div class="actions">
				<button on:click=save>"Save"</button>
				<Show when=move || exists>
					<button
						class="danger"
						on:click=move |_| {
							editor.update(|s| s.remove_relationship(a, b));
						}
					>
						"Remove"
					</button>
				</Show>
				<button on:click=move |_| {
					editor.update(|s| s.ui.close_form());
				}>"Cancel"</button>
			</div>
		</div>
	}
}
