//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use node_graph_canvas::components::graph_canvas::{
	CornerRadii, DrawingContext, GraphCanvas, ImageLoader, RasterImage, RenderOptions, Shadow,
};
use node_graph_canvas::graph::{Graph, Node, NodeDescriptor, NodeKind, TextMeasure, TypeRegistry};
use node_graph_canvas::{CanvasError, CanvasResult};

/// One recorded drawing call.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
	Save,
	Restore,
	Scale(f64, f64),
	Translate(f64, f64),
	ClearRect(f64, f64, f64, f64),
	FillRect(f64, f64, f64, f64),
	StrokeRect(f64, f64, f64, f64),
	FillColor(String),
	FillPattern(u32),
	StrokeColor(String),
	LineWidth(f64),
	ImageSmoothing(bool),
	Shadow(Option<Shadow>),
	Font(String),
	BeginPath,
	RoundRect(f64, f64, f64, f64, CornerRadii),
	Arc(f64, f64, f64),
	Fill,
	Stroke,
	FillText(String, f64, f64),
	CreatePattern(u32, u32),
	DrawLayer(f64, f64),
}

/// Drawing surface that records every call.
#[derive(Debug)]
pub struct RecordingContext {
	pub width: f64,
	pub height: f64,
	pub ops: Vec<Op>,
	/// Every character measures this wide.
	pub char_width: f64,
	pub fail_patterns: bool,
	patterns: u32,
}

impl RecordingContext {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			ops: Vec::new(),
			char_width: 10.0,
			fail_patterns: false,
			patterns: 0,
		}
	}

	pub fn take(&mut self) -> Vec<Op> {
		std::mem::take(&mut self.ops)
	}

	pub fn texts(&self) -> Vec<String> {
		self.ops
			.iter()
			.filter_map(|op| match op {
				Op::FillText(text, _, _) => Some(text.clone()),
				_ => None,
			})
			.collect()
	}

	pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
		self.ops.iter().filter(|op| pred(op)).count()
	}
}

impl TextMeasure for RecordingContext {
	fn measure_text(&self, text: &str) -> f64 {
		text.chars().count() as f64 * self.char_width
	}
}

impl DrawingContext for RecordingContext {
	type Image = TestImage;
	type Pattern = u32;

	fn width(&self) -> f64 {
		self.width
	}

	fn height(&self) -> f64 {
		self.height
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn save(&mut self) {
		self.ops.push(Op::Save);
	}

	fn restore(&mut self) {
		self.ops.push(Op::Restore);
	}

	fn scale(&mut self, sx: f64, sy: f64) {
		self.ops.push(Op::Scale(sx, sy));
	}

	fn translate(&mut self, x: f64, y: f64) {
		self.ops.push(Op::Translate(x, y));
	}

	fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
		self.ops.push(Op::ClearRect(x, y, w, h));
	}

	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
		self.ops.push(Op::FillRect(x, y, w, h));
	}

	fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
		self.ops.push(Op::StrokeRect(x, y, w, h));
	}

	fn set_fill_color(&mut self, color: &str) {
		self.ops.push(Op::FillColor(color.into()));
	}

	fn set_fill_pattern(&mut self, pattern: &u32) {
		self.ops.push(Op::FillPattern(*pattern));
	}

	fn set_stroke_color(&mut self, color: &str) {
		self.ops.push(Op::StrokeColor(color.into()));
	}

	fn set_line_width(&mut self, width: f64) {
		self.ops.push(Op::LineWidth(width));
	}

	fn set_image_smoothing(&mut self, enabled: bool) {
		self.ops.push(Op::ImageSmoothing(enabled));
	}

	fn set_shadow(&mut self, shadow: Option<&Shadow>) {
		self.ops.push(Op::Shadow(shadow.cloned()));
	}

	fn set_font(&mut self, font: &str) {
		self.ops.push(Op::Font(font.into()));
	}

	fn begin_path(&mut self) {
		self.ops.push(Op::BeginPath);
	}

	fn round_rect(&mut self, x: f64, y: f64, w: f64, h: f64, radii: CornerRadii) {
		self.ops.push(Op::RoundRect(x, y, w, h, radii));
	}

	fn arc(&mut self, x: f64, y: f64, radius: f64, _start: f64, _end: f64) {
		self.ops.push(Op::Arc(x, y, radius));
	}

	fn fill(&mut self) {
		self.ops.push(Op::Fill);
	}

	fn stroke(&mut self) {
		self.ops.push(Op::Stroke);
	}

	fn fill_text(&mut self, text: &str, x: f64, y: f64) {
		self.ops.push(Op::FillText(text.into(), x, y));
	}

	fn create_pattern(&mut self, image: &TestImage) -> CanvasResult<u32> {
		self.ops.push(Op::CreatePattern(image.width(), image.height()));
		if self.fail_patterns {
			return Err(CanvasError::pattern("refused"));
		}
		self.patterns += 1;
		Ok(self.patterns)
	}

	fn draw_layer(&mut self, _layer: &Self, x: f64, y: f64) {
		self.ops.push(Op::DrawLayer(x, y));
	}
}

/// Image whose size the test decides.
#[derive(Clone, Debug, Default)]
pub struct TestImage(Rc<Cell<(u32, u32)>>);

impl RasterImage for TestImage {
	fn width(&self) -> u32 {
		self.0.get().0
	}

	fn height(&self) -> u32 {
		self.0.get().1
	}
}

#[derive(Default)]
struct LoaderState {
	requests: Vec<String>,
	pending: Vec<(TestImage, Box<dyn FnOnce()>)>,
}

/// Image loader completed by hand.
#[derive(Clone, Default)]
pub struct ManualLoader(Rc<RefCell<LoaderState>>);

impl ManualLoader {
	pub fn requests(&self) -> usize {
		self.0.borrow().requests.len()
	}

	/// Finishes every pending load with the given size.
	pub fn complete(&self, width: u32, height: u32) {
		let pending = std::mem::take(&mut self.0.borrow_mut().pending);
		for (image, on_load) in pending {
			image.0.set((width, height));
			on_load();
		}
	}
}

impl ImageLoader<TestImage> for ManualLoader {
	fn load(&mut self, src: &str, on_load: Box<dyn FnOnce()>) -> CanvasResult<TestImage> {
		let image = TestImage::default();
		let mut state = self.0.borrow_mut();
		state.requests.push(src.to_owned());
		state.pending.push((image.clone(), on_load));
		Ok(image)
	}
}

/// Node kind with a configurable slot count.
pub struct TestKind {
	descriptor: NodeDescriptor,
	inputs: usize,
}

impl TestKind {
	pub fn new(type_name: &str, title: Option<&str>, inputs: usize) -> Self {
		let mut descriptor = NodeDescriptor::new(type_name);
		if let Some(title) = title {
			descriptor = descriptor.with_title(title);
		}
		Self { descriptor, inputs }
	}
}

impl NodeKind for TestKind {
	fn descriptor(&self) -> &NodeDescriptor {
		&self.descriptor
	}

	fn init(&self, node: &mut Node) {
		for i in 0..self.inputs {
			node.add_input(format!("in{i}"), "number", None);
		}
	}
}

pub const WIDTH: f64 = 800.0;
pub const HEIGHT: f64 = 600.0;

/// Registry with `test/sum` (titled "Sum", two inputs) and `test/empty`.
pub fn registry() -> TypeRegistry {
	let registry = TypeRegistry::new();
	registry.register_node_type(TestKind::new("test/sum", Some("Sum"), 2));
	registry.register_node_type(TestKind::new("test/empty", None, 0));
	registry
}

/// A renderer over `graph` with recording layers.
pub fn canvas_with(graph: Graph) -> (GraphCanvas<RecordingContext>, ManualLoader) {
	let loader = ManualLoader::default();
	let canvas = GraphCanvas::new(
		RecordingContext::new(WIDTH, HEIGHT),
		RecordingContext::new(WIDTH, HEIGHT),
		graph,
		loader.clone(),
		RenderOptions::default(),
	)
	.unwrap();
	(canvas, loader)
}

/// Runs the first frame and clears both recordings.
pub fn settle(canvas: &mut GraphCanvas<RecordingContext>, now: f64) {
	canvas.frame(now).unwrap();
	canvas.front_mut().take();
	canvas.back_mut().take();
}
