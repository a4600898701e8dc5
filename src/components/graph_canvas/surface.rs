//! The drawing surface and image decoder the renderer talks to.
//!
//! [`super::web`] implements both on top of the browser's 2d canvas. Tests
//! implement them with recorders.

use crate::error::CanvasResult;
use crate::graph::TextMeasure;

/// Drop shadow parameters, in the units of the current transform.
#[derive(Clone, Debug, PartialEq)]
pub struct Shadow {
	/// CSS colour.
	pub color: String,
	/// Blur radius.
	pub blur: f64,
	/// Horizontal offset.
	pub offset_x: f64,
	/// Vertical offset.
	pub offset_y: f64,
}

/// Per-corner radii, clockwise from top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerRadii {
	/// Top-left.
	pub top_left: f64,
	/// Top-right.
	pub top_right: f64,
	/// Bottom-right.
	pub bottom_right: f64,
	/// Bottom-left.
	pub bottom_left: f64,
}

impl CornerRadii {
	/// Same radius on every corner.
	pub fn all(r: f64) -> Self {
		Self {
			top_left: r,
			top_right: r,
			bottom_right: r,
			bottom_left: r,
		}
	}

	/// Rounded top, square bottom.
	pub fn top(r: f64) -> Self {
		Self {
			top_left: r,
			top_right: r,
			bottom_right: 0.0,
			bottom_left: 0.0,
		}
	}
}

/// A decoded (or still decoding) raster image.
pub trait RasterImage {
	/// Width in pixels; 0 while decoding.
	fn width(&self) -> u32;
	/// Height in pixels; 0 while decoding.
	fn height(&self) -> u32;
}

/// Immediate-mode 2d drawing target.
///
/// Mirrors the subset of a browser 2d context the renderer needs. Calls
/// outside a `save`/`restore` pair leak state into later draws.
pub trait DrawingContext: TextMeasure {
	/// Decoded image type accepted by [`DrawingContext::create_pattern`].
	type Image: RasterImage;
	/// Compiled repeating fill.
	type Pattern;

	/// Device width in pixels.
	fn width(&self) -> f64;
	/// Device height in pixels.
	fn height(&self) -> f64;
	/// Resizes the backing store; contents are discarded.
	fn resize(&mut self, width: f64, height: f64);

	/// Pushes the drawing state.
	fn save(&mut self);
	/// Pops the drawing state.
	fn restore(&mut self);
	/// Post-multiplies a scale onto the current transform.
	fn scale(&mut self, sx: f64, sy: f64);
	/// Post-multiplies a translation onto the current transform.
	fn translate(&mut self, x: f64, y: f64);

	/// Clears a rectangle to transparent.
	fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
	/// Fills a rectangle with the current fill style.
	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
	/// Outlines a rectangle with the current stroke style.
	fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

	/// Solid fill colour.
	fn set_fill_color(&mut self, color: &str);
	/// Repeating fill.
	fn set_fill_pattern(&mut self, pattern: &Self::Pattern);
	/// Solid stroke colour.
	fn set_stroke_color(&mut self, color: &str);
	/// Stroke width.
	fn set_line_width(&mut self, width: f64);
	/// Toggles smoothing of scaled images and patterns.
	fn set_image_smoothing(&mut self, enabled: bool);
	/// Drop shadow for subsequent fills, `None` to disable.
	fn set_shadow(&mut self, shadow: Option<&Shadow>);
	/// CSS font shorthand.
	fn set_font(&mut self, font: &str);

	/// Starts a new path.
	fn begin_path(&mut self);
	/// Adds a rounded rectangle to the path.
	fn round_rect(&mut self, x: f64, y: f64, w: f64, h: f64, radii: CornerRadii);
	/// Adds an arc to the path.
	fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
	/// Fills the path.
	fn fill(&mut self);
	/// Strokes the path.
	fn stroke(&mut self);

	/// Draws text at a baseline position.
	fn fill_text(&mut self, text: &str, x: f64, y: f64);

	/// Builds a repeating pattern from a decoded image.
	fn create_pattern(&mut self, image: &Self::Image) -> CanvasResult<Self::Pattern>;
	/// Copies another target of the same backend onto this one at `(x, y)`.
	fn draw_layer(&mut self, layer: &Self, x: f64, y: f64);
}

/// Asynchronous image decoder.
pub trait ImageLoader<I> {
	/// Starts decoding `src` and returns the pending image. `on_load` runs
	/// once, when decoding finishes; it may never run. Errors only when the
	/// request itself cannot be issued.
	fn load(&mut self, src: &str, on_load: Box<dyn FnOnce()>) -> CanvasResult<I>;
}
