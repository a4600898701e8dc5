//! Browser backend: 2d canvas contexts, image decoding and frame scheduling.

use std::cell::RefCell;
use std::rc::Rc;

use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasPattern, CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement,
	MouseEvent,
};

use super::state::{GraphCanvas, LoopControl};
use super::surface::{CornerRadii, DrawingContext, ImageLoader, RasterImage, Shadow};
use crate::error::{CanvasError, CanvasResult};
use crate::graph::TextMeasure;

fn document() -> CanvasResult<Document> {
	web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| CanvasError::ElementNotFound("document".into()))
}

/// Milliseconds from the high-resolution clock, wall clock as fallback.
pub fn now_ms() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map(|p| p.now())
		.unwrap_or_else(js_sys::Date::now)
}

/// Pointer position relative to the canvas' top-left corner.
pub fn pointer_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// A `<canvas>` element and its 2d context.
pub struct WebCanvas {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl WebCanvas {
	/// Wraps an existing canvas element.
	pub fn new(canvas: HtmlCanvasElement) -> CanvasResult<Self> {
		let ctx = canvas
			.get_context("2d")
			.map_err(|e| CanvasError::ContextUnavailable(format!("{e:?}")))?
			.ok_or_else(|| CanvasError::ContextUnavailable("getContext(\"2d\") returned null".into()))?
			.dyn_into::<CanvasRenderingContext2d>()
			.map_err(|_| CanvasError::ContextUnavailable("unexpected context type".into()))?;
		Ok(Self { canvas, ctx })
	}

	/// Looks up a canvas element by id and makes it focusable.
	pub fn from_element_id(id: &str) -> CanvasResult<Self> {
		let canvas = document()?
			.get_element_by_id(id)
			.ok_or_else(|| CanvasError::ElementNotFound(id.into()))?
			.dyn_into::<HtmlCanvasElement>()
			.map_err(|_| CanvasError::ElementNotFound(format!("{id} (not a canvas)")))?;
		canvas.set_tab_index(1);
		Self::new(canvas)
	}

	/// A detached canvas, used as the cached background layer.
	pub fn offscreen(width: f64, height: f64) -> CanvasResult<Self> {
		let canvas = document()?
			.create_element("canvas")
			.map_err(|e| CanvasError::surface(format!("cannot create canvas: {e:?}")))?
			.dyn_into::<HtmlCanvasElement>()
			.map_err(|_| CanvasError::surface("created element is not a canvas"))?;
		canvas.set_width(width as u32);
		canvas.set_height(height as u32);
		Self::new(canvas)
	}

	/// The underlying element.
	pub fn element(&self) -> &HtmlCanvasElement {
		&self.canvas
	}
}

impl TextMeasure for WebCanvas {
	fn measure_text(&self, text: &str) -> f64 {
		self.ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
	}
}

impl DrawingContext for WebCanvas {
	type Image = WebImage;
	type Pattern = CanvasPattern;

	fn width(&self) -> f64 {
		self.canvas.width() as f64
	}

	fn height(&self) -> f64 {
		self.canvas.height() as f64
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.canvas.set_width(width as u32);
		self.canvas.set_height(height as u32);
	}

	fn save(&mut self) {
		self.ctx.save();
	}

	fn restore(&mut self) {
		self.ctx.restore();
	}

	fn scale(&mut self, sx: f64, sy: f64) {
		let _ = self.ctx.scale(sx, sy);
	}

	fn translate(&mut self, x: f64, y: f64) {
		let _ = self.ctx.translate(x, y);
	}

	fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
		self.ctx.clear_rect(x, y, w, h);
	}

	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
		self.ctx.fill_rect(x, y, w, h);
	}

	fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
		self.ctx.stroke_rect(x, y, w, h);
	}

	fn set_fill_color(&mut self, color: &str) {
		self.ctx.set_fill_style_str(color);
	}

	fn set_fill_pattern(&mut self, pattern: &CanvasPattern) {
		#[allow(deprecated)]
		self.ctx.set_fill_style(pattern);
	}

	fn set_stroke_color(&mut self, color: &str) {
		self.ctx.set_stroke_style_str(color);
	}

	fn set_line_width(&mut self, width: f64) {
		self.ctx.set_line_width(width);
	}

	fn set_image_smoothing(&mut self, enabled: bool) {
		self.ctx.set_image_smoothing_enabled(enabled);
	}

	fn set_shadow(&mut self, shadow: Option<&Shadow>) {
		match shadow {
			Some(s) => {
				self.ctx.set_shadow_color(&s.color);
				self.ctx.set_shadow_blur(s.blur);
				self.ctx.set_shadow_offset_x(s.offset_x);
				self.ctx.set_shadow_offset_y(s.offset_y);
			}
			None => {
				self.ctx.set_shadow_color("transparent");
				self.ctx.set_shadow_blur(0.0);
				self.ctx.set_shadow_offset_x(0.0);
				self.ctx.set_shadow_offset_y(0.0);
			}
		}
	}

	fn set_font(&mut self, font: &str) {
		self.ctx.set_font(font);
	}

	fn begin_path(&mut self) {
		self.ctx.begin_path();
	}

	fn round_rect(&mut self, x: f64, y: f64, w: f64, h: f64, r: CornerRadii) {
		let ctx = &self.ctx;
		ctx.move_to(x + r.top_left, y);
		ctx.line_to(x + w - r.top_right, y);
		let _ = ctx.arc_to(x + w, y, x + w, y + r.top_right, r.top_right);
		ctx.line_to(x + w, y + h - r.bottom_right);
		let _ = ctx.arc_to(x + w, y + h, x + w - r.bottom_right, y + h, r.bottom_right);
		ctx.line_to(x + r.bottom_left, y + h);
		let _ = ctx.arc_to(x, y + h, x, y + h - r.bottom_left, r.bottom_left);
		ctx.line_to(x, y + r.top_left);
		let _ = ctx.arc_to(x, y, x + r.top_left, y, r.top_left);
		ctx.close_path();
	}

	fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
		let _ = self.ctx.arc(x, y, radius, start, end);
	}

	fn fill(&mut self) {
		self.ctx.fill();
	}

	fn stroke(&mut self) {
		self.ctx.stroke();
	}

	fn fill_text(&mut self, text: &str, x: f64, y: f64) {
		let _ = self.ctx.fill_text(text, x, y);
	}

	fn create_pattern(&mut self, image: &WebImage) -> CanvasResult<CanvasPattern> {
		if image.width() == 0 || image.height() == 0 {
			return Err(CanvasError::pattern("image has no pixels"));
		}
		self.ctx
			.create_pattern_with_html_image_element(&image.0, "repeat")
			.map_err(|e| CanvasError::pattern(format!("{e:?}")))?
			.ok_or_else(|| CanvasError::pattern("createPattern returned null"))
	}

	fn draw_layer(&mut self, layer: &Self, x: f64, y: f64) {
		let _ = self.ctx.draw_image_with_html_canvas_element(&layer.canvas, x, y);
	}
}

/// An `<img>` element, decoded once its natural size is non-zero.
pub struct WebImage(HtmlImageElement);

impl RasterImage for WebImage {
	fn width(&self) -> u32 {
		self.0.natural_width()
	}

	fn height(&self) -> u32 {
		self.0.natural_height()
	}
}

/// Decodes images through `HtmlImageElement`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebImageLoader;

impl ImageLoader<WebImage> for WebImageLoader {
	fn load(&mut self, src: &str, on_load: Box<dyn FnOnce()>) -> CanvasResult<WebImage> {
		let image = HtmlImageElement::new()
			.map_err(|e| CanvasError::surface(format!("cannot create image: {e:?}")))?;
		let callback = Closure::once_into_js(move || on_load());
		image.set_onload(Some(callback.unchecked_ref()));
		image.set_src(src);
		Ok(WebImage(image))
	}
}

fn request_frame(cb: &Closure<dyn FnMut()>) -> Option<i32> {
	web_sys::window()?
		.request_animation_frame(cb.as_ref().unchecked_ref())
		.ok()
}

/// A running `requestAnimationFrame` loop.
pub struct FrameLoop {
	control: LoopControl,
	animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl FrameLoop {
	/// Ticks `state` on every animation frame until stopped. A failed frame
	/// stops the loop.
	pub fn start(state: Rc<RefCell<Option<GraphCanvas<WebCanvas>>>>, control: LoopControl) -> Self {
		control.start();
		let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
		let (animate_inner, control_inner) = (animate.clone(), control.clone());

		*animate.borrow_mut() = Some(Closure::new(move || {
			if !control_inner.is_running() {
				return;
			}
			if let Some(ref mut s) = *state.borrow_mut() {
				if let Err(err) = s.frame(now_ms()) {
					error!("frame failed, stopping render loop: {err}");
					control_inner.stop();
					return;
				}
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				control_inner.set_pending(request_frame(cb));
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			control.set_pending(request_frame(cb));
		}

		Self { control, animate }
	}

	/// Cancels the pending frame and releases the loop closure.
	pub fn stop(&self) {
		if let (Some(id), Some(window)) = (self.control.stop(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		self.animate.borrow_mut().take();
	}
}

/// Registration that is undone when dropped.
pub struct Subscription {
	teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
	/// Runs `teardown` exactly once, on drop.
	pub fn new(teardown: impl FnOnce() + 'static) -> Self {
		Self {
			teardown: Some(Box::new(teardown)),
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(teardown) = self.teardown.take() {
			teardown();
		}
	}
}

/// Registers `callback` for a window event. Dropping the subscription removes
/// the listener before the closure is released. `None` when there is no
/// window or the host refused the listener.
pub fn listen_window(event: &'static str, callback: Closure<dyn FnMut()>) -> Option<Subscription> {
	let window = web_sys::window()?;
	window
		.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
		.ok()?;
	Some(Subscription::new(move || {
		if let Some(window) = web_sys::window() {
			let _ = window
				.remove_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
		}
		drop(callback);
	}))
}

/// Document-level mousemove/mouseup pair, bound only while a drag is held.
pub struct DragListeners {
	on_move: Closure<dyn FnMut(MouseEvent)>,
	on_up: Closure<dyn FnMut(MouseEvent)>,
}

impl DragListeners {
	/// Wraps the two handlers; nothing is bound yet.
	pub fn new(on_move: impl FnMut(MouseEvent) + 'static, on_up: impl FnMut(MouseEvent) + 'static) -> Self {
		Self {
			on_move: Closure::new(on_move),
			on_up: Closure::new(on_up),
		}
	}

	/// Starts tracking moves on the document.
	pub fn bind(&self) {
		let Ok(document) = document() else {
			return;
		};
		let _ = document
			.add_event_listener_with_callback("mousemove", self.on_move.as_ref().unchecked_ref());
		let _ = document
			.add_event_listener_with_callback("mouseup", self.on_up.as_ref().unchecked_ref());
	}

	/// Stops tracking moves.
	pub fn unbind(&self) {
		let Ok(document) = document() else {
			return;
		};
		let _ = document.remove_event_listener_with_callback(
			"mousemove",
			self.on_move.as_ref().unchecked_ref(),
		);
		let _ = document
			.remove_event_listener_with_callback("mouseup", self.on_up.as_ref().unchecked_ref());
	}
}
