use std::cell::Cell;
use std::rc::Rc;

use log::debug;

use super::render;
use super::surface::{DrawingContext, ImageLoader};
use super::viewport::Viewport;
use crate::error::{CanvasError, CanvasResult};
use crate::graph::{Graph, Invalidate};

/// Repeating 100x100 tile drawn behind the graph.
pub const BACKGROUND_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAGQAAABkCAIAAAD/gAIDAAAAGXRFWHRTb2Z0d2FyZQBBZG9iZSBJbWFnZVJlYWR5ccllPAAAAQBJREFUeNrs1rEKwjAUhlETUkj3vP9rdmr1Ysammk2w5wdxuLgcMHyptfawuZX4pJSWZTnfnu/lnIe/jNNxHHGNn//HNbbv+4dr6V+11uF527arU7+u63qfa/bnmh8sWLBgwYJlqRf8MEptXPBXJXa37BSl3ixYsGDBMliwFLyCV/DeLIMFCxYsWLBMwSt4Be/NggXLYMGCBUvBK3iNruC9WbBgwYJlsGApeAWv4L1ZBgsWLFiwYJmCV/AK3psFC5bBggULloJX8BpdwXuzYMGCBctgwVLwCl7Be7MMFixYsGDBsu8FH1FaSmExVfAxBa/gvVmwYMGCZbBg/W4vAQYA5tRF9QYlv/QAAAAASUVORK5CYII=";

/// Colours, thresholds and assets used by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
	/// Fill behind everything.
	pub clear_color: String,
	/// Outline around the device rectangle.
	pub border_color: String,
	/// Overlay and title font size, in pixels.
	pub text_size: f64,
	/// Source of the background tile.
	pub background_image: String,
	/// The tile is only drawn above this zoom.
	pub pattern_min_scale: f64,
	/// Below this zoom ornamental effects are skipped.
	pub low_quality_scale: f64,
	/// Node outline colour when neither instance nor kind sets one.
	pub node_color: String,
	/// Node body colour when neither instance nor kind sets one.
	pub node_bg_color: String,
	/// Colour of the title bar dot.
	pub node_dot_color: String,
	/// Title text colour.
	pub title_text_color: String,
	/// Drop shadow colour.
	pub shadow_color: String,
	/// Colour of the fps overlay.
	pub overlay_color: String,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self {
			clear_color: "#222".into(),
			border_color: "#235".into(),
			text_size: 14.0,
			background_image: BACKGROUND_IMAGE.into(),
			pattern_min_scale: 0.5,
			low_quality_scale: 0.6,
			node_color: "#333".into(),
			node_bg_color: "#353535".into(),
			node_dot_color: "#666".into(),
			title_text_color: "#999".into(),
			shadow_color: "rgba(0, 0, 0, 0.5)".into(),
			overlay_color: "#8c8".into(),
		}
	}
}

impl RenderOptions {
	/// CSS font used for titles and the overlay.
	pub fn font(&self) -> String {
		format!("{}px Arial", self.text_size)
	}
}

/// Dirty flags of the two render layers.
#[derive(Debug)]
pub struct LayerFlags {
	background: Cell<bool>,
	foreground: Cell<bool>,
}

impl Default for LayerFlags {
	fn default() -> Self {
		Self {
			background: Cell::new(true),
			foreground: Cell::new(true),
		}
	}
}

impl LayerFlags {
	/// Whether the background layer needs a redraw.
	pub fn background(&self) -> bool {
		self.background.get()
	}

	/// Whether the foreground layer needs a redraw.
	pub fn foreground(&self) -> bool {
		self.foreground.get()
	}

	pub(super) fn take_background(&self) -> bool {
		self.background.replace(false)
	}

	pub(super) fn take_foreground(&self) -> bool {
		self.foreground.replace(false)
	}
}

impl Invalidate for LayerFlags {
	fn set_dirty(&self, background: bool, foreground: bool) {
		if background {
			self.background.set(true);
		}
		if foreground {
			self.foreground.set(true);
		}
	}
}

/// Frame counter and inter-frame timing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameProfiler {
	/// Milliseconds between the last two ticks.
	pub elapsed: f64,
	/// Timestamp of the last tick.
	pub last_tick: f64,
	/// Ticks so far.
	pub frame: u64,
}

impl FrameProfiler {
	/// Records a tick at `now` milliseconds.
	pub fn tick(&mut self, now: f64) {
		self.elapsed = if self.frame == 0 { 0.0 } else { now - self.last_tick };
		self.last_tick = now;
		self.frame += 1;
	}

	/// Frames per second implied by the last interval.
	pub fn fps(&self) -> f64 {
		if self.elapsed > 0.0 {
			1000.0 / self.elapsed
		} else {
			0.0
		}
	}
}

/// Start/stop switch shared with whatever schedules frames.
#[derive(Clone, Debug, Default)]
pub struct LoopControl {
	running: Rc<Cell<bool>>,
	pending: Rc<Cell<Option<i32>>>,
}

impl LoopControl {
	/// Lets the scheduler keep requesting frames.
	pub fn start(&self) {
		if !self.running.replace(true) {
			debug!("render loop started");
		}
	}

	/// Stops rescheduling. Returns the pending frame request, if any, so the
	/// scheduler can cancel it.
	pub fn stop(&self) -> Option<i32> {
		if self.running.replace(false) {
			debug!("render loop stopped");
		}
		self.pending.take()
	}

	/// Whether frames should keep being requested.
	pub fn is_running(&self) -> bool {
		self.running.get()
	}

	/// Remembers the scheduler's handle for the next frame.
	pub fn set_pending(&self, request: Option<i32>) {
		self.pending.set(request);
	}
}

pub(super) enum PatternState<I, P> {
	Unrequested,
	Loading(I),
	Ready(P),
}

/// The renderer: a graph, a viewport and two cached layers.
///
/// The background layer holds the clear colour, the tile and the border.
/// The foreground layer composites the background with the nodes and the
/// fps overlay. Each is redrawn only while its flag is set, and drawing a
/// layer clears its flag.
pub struct GraphCanvas<C: DrawingContext> {
	pub(super) front: C,
	pub(super) back: C,
	pub(super) viewport: Viewport,
	pub(super) graph: Graph,
	pub(super) flags: Rc<LayerFlags>,
	pub(super) pattern: PatternState<C::Image, C::Pattern>,
	pub(super) loader: Box<dyn ImageLoader<C::Image>>,
	pub(super) profiler: FrameProfiler,
	pub(super) options: RenderOptions,
	control: LoopControl,
}

impl<C: DrawingContext> GraphCanvas<C> {
	/// Binds `graph` to a new renderer drawing onto `front`, with `back` as
	/// the cached background layer.
	pub fn new(
		front: C,
		back: C,
		mut graph: Graph,
		loader: impl ImageLoader<C::Image> + 'static,
		options: RenderOptions,
	) -> CanvasResult<Self> {
		let (width, height) = (front.width(), front.height());
		if width <= 0.0 || height <= 0.0 {
			return Err(CanvasError::surface(format!(
				"canvas has no area ({width}x{height})"
			)));
		}
		if back.width() != width || back.height() != height {
			return Err(CanvasError::surface(format!(
				"background layer is {}x{}, expected {width}x{height}",
				back.width(),
				back.height()
			)));
		}

		let flags = Rc::new(LayerFlags::default());
		graph.attach_renderer(flags.clone());

		Ok(Self {
			front,
			back,
			viewport: Viewport::new(width, height),
			graph,
			flags,
			pattern: PatternState::Unrequested,
			loader: Box::new(loader),
			profiler: FrameProfiler::default(),
			options,
			control: LoopControl::default(),
		})
	}

	/// One animation tick: advance the profiler, then redraw dirty layers.
	pub fn frame(&mut self, now: f64) -> CanvasResult<()> {
		self.profiler.tick(now);
		self.draw()
	}

	/// Redraws each layer whose flag is set and clears that flag. A failed
	/// background draw leaves the background flag set.
	pub fn draw(&mut self) -> CanvasResult<()> {
		if self.flags.take_background() {
			if let Err(err) = render::draw_background(self) {
				self.flags.set_dirty(true, false);
				return Err(err);
			}
			// the foreground composites the background
			self.flags.set_dirty(false, true);
		}
		if self.flags.take_foreground() {
			render::draw_foreground(self);
		}
		Ok(())
	}

	/// ORs the given flags into the layer state.
	pub fn set_dirty(&self, background: bool, foreground: bool) {
		self.flags.set_dirty(background, foreground);
	}

	/// Current dirty flags.
	pub fn flags(&self) -> &LayerFlags {
		&self.flags
	}

	/// Handle the graph (or anything else) can use to invalidate layers.
	pub fn invalidator(&self) -> Rc<dyn Invalidate> {
		self.flags.clone()
	}

	/// Pans by a device-pixel delta.
	pub fn pan(&mut self, dx: f64, dy: f64) {
		self.viewport.pan(dx, dy);
		self.graph.mark_dirty(true);
	}

	/// Zooms to an absolute scale about `anchor` (default: centre).
	pub fn zoom_to(&mut self, scale: f64, anchor: Option<(f64, f64)>) {
		self.viewport.zoom_to(scale, anchor);
		self.graph.mark_dirty(true);
	}

	/// Zooms relative to the current scale.
	pub fn zoom_by(&mut self, factor: f64, anchor: Option<(f64, f64)>) {
		let scale = self.viewport.scale * factor;
		self.zoom_to(scale, anchor);
	}

	/// Neutral view.
	pub fn reset_view(&mut self) {
		self.viewport.reset();
		self.graph.mark_dirty(true);
	}

	/// Resizes both layers and the viewport.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.front.resize(width, height);
		self.back.resize(width, height);
		self.viewport.resize(width, height);
		self.set_dirty(true, true);
	}

	/// The transform engine.
	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	/// The rendered graph.
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// Mutable access to the graph; mutations invalidate through the graph.
	pub fn graph_mut(&mut self) -> &mut Graph {
		&mut self.graph
	}

	/// Frame timing.
	pub fn profiler(&self) -> &FrameProfiler {
		&self.profiler
	}

	/// Renderer options.
	pub fn options(&self) -> &RenderOptions {
		&self.options
	}

	/// Start/stop switch for the frame scheduler.
	pub fn loop_control(&self) -> &LoopControl {
		&self.control
	}

	/// Whether the background tile has been compiled.
	pub fn pattern_ready(&self) -> bool {
		matches!(self.pattern, PatternState::Ready(_))
	}

	/// Visible layer.
	pub fn front(&self) -> &C {
		&self.front
	}

	/// Mutable visible layer.
	pub fn front_mut(&mut self) -> &mut C {
		&mut self.front
	}

	/// Cached background layer.
	pub fn back(&self) -> &C {
		&self.back
	}

	/// Mutable background layer.
	pub fn back_mut(&mut self) -> &mut C {
		&mut self.back
	}
}
