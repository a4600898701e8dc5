use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, info};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent, WheelEvent};

use super::input::{PanGesture, wheel_factor};
use super::state::{GraphCanvas, RenderOptions};
use super::web::{
	DragListeners, FrameLoop, Subscription, WebCanvas, WebImageLoader, listen_window,
	pointer_position,
};
use crate::error::CanvasResult;
use crate::graph::{Graph, TypeRegistry};

type SharedCanvas = Rc<RefCell<Option<GraphCanvas<WebCanvas>>>>;

fn build_canvas(
	element: HtmlCanvasElement,
	(w, h): (f64, f64),
	graph: Graph,
	options: RenderOptions,
) -> CanvasResult<GraphCanvas<WebCanvas>> {
	element.set_width(w as u32);
	element.set_height(h as u32);
	element.set_tab_index(1);
	let front = WebCanvas::new(element)?;
	let back = WebCanvas::offscreen(w, h)?;
	GraphCanvas::new(front, back, graph, WebImageLoader, options)
}

/// Pannable, zoomable canvas showing the graph built by `scene`.
///
/// Drag to pan, scroll to zoom about the pointer, double-click to reset.
#[component]
pub fn GraphCanvasView(
	/// Builds the graph once the canvas is mounted.
	scene: fn(&TypeRegistry) -> Graph,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional)] options: Option<RenderOptions>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedCanvas = Rc::new(RefCell::new(None));
	let frame_loop: Rc<RefCell<Option<FrameLoop>>> = Rc::new(RefCell::new(None));
	let drag: Rc<RefCell<Option<DragListeners>>> = Rc::new(RefCell::new(None));
	let gesture = Rc::new(RefCell::new(PanGesture::default()));
	let resize: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
	let (state_init, loop_init, drag_init, gesture_init, resize_init) = (
		state.clone(),
		frame_loop.clone(),
		drag.clone(),
		gesture.clone(),
		resize.clone(),
	);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		// a rerun replaces every listener it registered last time
		resize_init.borrow_mut().take();
		if let Some(previous) = drag_init.borrow_mut().take() {
			previous.unbind();
		}

		let Some(window) = web_sys::window() else {
			error!("no window, graph canvas not started");
			return;
		};

		let size = if fullscreen {
			(
				window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
				window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
			)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};

		let registry = TypeRegistry::new();
		let graph = scene(&registry);
		let node_count = graph.len();
		match build_canvas(canvas, size, graph, options.clone().unwrap_or_default()) {
			Ok(graph_canvas) => *state_init.borrow_mut() = Some(graph_canvas),
			Err(err) => {
				error!("graph canvas setup failed: {err}");
				return;
			}
		}
		info!(
			"graph canvas ready: {}x{}, {} nodes",
			size.0, size.1, node_count
		);

		if fullscreen {
			let state_resize = state_init.clone();
			let on_resize = Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = (
					win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
					win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
				);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			});
			*resize_init.borrow_mut() = listen_window("resize", on_resize);
		}

		let (state_move, gesture_move) = (state_init.clone(), gesture_init.clone());
		let (gesture_up, drag_up) = (gesture_init.clone(), Rc::downgrade(&drag_init));
		*drag_init.borrow_mut() = Some(DragListeners::new(
			move |ev: MouseEvent| {
				let delta = gesture_move
					.borrow_mut()
					.move_to(ev.client_x() as f64, ev.client_y() as f64);
				if let (Some((dx, dy)), Some(s)) = (delta, state_move.borrow_mut().as_mut()) {
					s.pan(dx, dy);
				}
			},
			move |_: MouseEvent| {
				gesture_up.borrow_mut().release();
				if let Some(slot) = drag_up.upgrade() {
					if let Some(ref listeners) = *slot.borrow() {
						listeners.unbind();
					}
				}
			},
		));

		let control = match *state_init.borrow() {
			Some(ref s) => s.loop_control().clone(),
			None => return,
		};
		if let Some(previous) = loop_init.replace(Some(FrameLoop::start(state_init.clone(), control))) {
			previous.stop();
		}
	});

	let cleanup = StoredValue::new_local((frame_loop, drag.clone(), resize));
	on_cleanup(move || {
		cleanup.try_with_value(|(frame_loop, drag, resize)| {
			resize.borrow_mut().take();
			if let Some(frame_loop) = frame_loop.borrow_mut().take() {
				frame_loop.stop();
			}
			if let Some(listeners) = drag.borrow_mut().take() {
				listeners.unbind();
			}
		});
	});

	let (gesture_md, drag_md) = (gesture.clone(), drag.clone());
	let on_mousedown = move |ev: MouseEvent| {
		gesture_md
			.borrow_mut()
			.press(ev.client_x() as f64, ev.client_y() as f64);
		if let Some(ref listeners) = *drag_md.borrow() {
			listeners.bind();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let anchor = pointer_position(&canvas, &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom_by(wheel_factor(ev.delta_y()), Some(anchor));
		}
	};

	let state_dbl = state.clone();
	let on_dblclick = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_dbl.borrow_mut() {
			s.reset_view();
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="graph-canvas"
			on:mousedown=on_mousedown
			on:wheel=on_wheel
			on:dblclick=on_dblclick
			style="display: block; cursor: grab;"
		/>
	}
}
