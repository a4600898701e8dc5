use std::f64::consts::TAU;
use std::rc::Rc;

use log::info;

use super::state::{GraphCanvas, LayerFlags, PatternState, RenderOptions};
use super::surface::{CornerRadii, DrawingContext, ImageLoader, RasterImage, Shadow};
use crate::error::CanvasResult;
use crate::graph::{Invalidate, NODE_TITLE_HEIGHT, Node};

const NODE_CORNER_RADIUS: f64 = 8.0;
const NODE_DOT_RADIUS: f64 = 5.0;
const SHADOW_OFFSET: f64 = 3.0;
const SHADOW_BLUR: f64 = 6.0;

pub fn draw_background<C: DrawingContext>(canvas: &mut GraphCanvas<C>) -> CanvasResult<()> {
	let GraphCanvas {
		back,
		viewport,
		flags,
		pattern,
		loader,
		options,
		..
	} = canvas;
	let (x, y, w, h) = viewport.compute_viewport();

	back.save();
	viewport.apply_to(back);
	back.set_fill_color(&options.clear_color);
	back.fill_rect(x, y, w, h);
	if viewport.scale > options.pattern_min_scale {
		if let Some(pattern) =
			ensure_pattern(pattern, loader.as_mut(), back, flags, &options.background_image)?
		{
			back.set_image_smoothing(false);
			back.set_fill_pattern(pattern);
			back.fill_rect(x, y, w, h);
		}
	}
	back.restore();

	// device space
	back.save();
	back.set_stroke_color(&options.border_color);
	let (width, height) = (back.width(), back.height());
	back.stroke_rect(0.0, 0.0, width, height);
	back.restore();

	Ok(())
}

/// Requests the tile once, then compiles it once it has pixels.
fn ensure_pattern<'a, C: DrawingContext>(
	state: &'a mut PatternState<C::Image, C::Pattern>,
	loader: &mut dyn ImageLoader<C::Image>,
	ctx: &mut C,
	flags: &Rc<LayerFlags>,
	src: &str,
) -> CanvasResult<Option<&'a C::Pattern>> {
	if matches!(state, PatternState::Unrequested) {
		info!("requesting background texture");
		let flags = flags.clone();
		let image = loader.load(
			src,
			Box::new(move || {
				info!("background texture loaded");
				flags.set_dirty(true, false);
			}),
		)?;
		*state = PatternState::Loading(image);
	}

	if let PatternState::Loading(image) = &*state {
		if image.width() > 0 && image.height() > 0 {
			let compiled = ctx.create_pattern(image)?;
			*state = PatternState::Ready(compiled);
		}
	}

	Ok(match &*state {
		PatternState::Ready(pattern) => Some(pattern),
		_ => None,
	})
}

pub fn draw_foreground<C: DrawingContext>(canvas: &mut GraphCanvas<C>) {
	let GraphCanvas {
		front,
		back,
		viewport,
		graph,
		profiler,
		options,
		..
	} = canvas;
	let (width, height) = (front.width(), front.height());

	front.save();
	front.clear_rect(0.0, 0.0, width, height);
	front.draw_layer(back, 0.0, 0.0);
	front.set_font(&options.font());
	front.set_fill_color(&options.overlay_color);
	front.fill_text(
		&format!("{:.0} fps  frame {}", profiler.fps(), profiler.frame),
		8.0,
		8.0 + options.text_size,
	);
	front.restore();

	front.save();
	viewport.apply_to(front);
	let low_quality = viewport.scale < options.low_quality_scale;
	for node in graph.iter() {
		draw_node(front, node, viewport.scale, low_quality, options);
	}
	front.restore();
}

/// Draws one node with its origin at the node position. The title bar sits
/// above the origin and the slot rows below it.
pub fn draw_node<C: DrawingContext>(
	ctx: &mut C,
	node: &Node,
	scale: f64,
	low_quality: bool,
	options: &RenderOptions,
) {
	ctx.save();
	ctx.translate(node.position.0, node.position.1);

	let color = node.resolve_color(&options.node_color);
	let bg_color = node.resolve_bg_color(&options.node_bg_color);
	let collapsed = node.flags.collapsed();

	if low_quality {
		ctx.set_shadow(None);
	} else {
		ctx.set_shadow(Some(&Shadow {
			color: options.shadow_color.clone(),
			blur: SHADOW_BLUR * scale,
			offset_x: SHADOW_OFFSET * scale,
			offset_y: SHADOW_OFFSET * scale,
		}));
	}

	ctx.set_font(&options.font());
	let width = node.compute_width(&*ctx);
	let body_height = if collapsed {
		NODE_TITLE_HEIGHT
	} else {
		node.content_height() + NODE_TITLE_HEIGHT
	};

	ctx.set_fill_color(bg_color);
	ctx.set_stroke_color(color);
	ctx.begin_path();
	ctx.round_rect(
		0.0,
		-NODE_TITLE_HEIGHT,
		width,
		body_height,
		CornerRadii::all(NODE_CORNER_RADIUS),
	);
	ctx.fill();
	ctx.set_shadow(None);
	ctx.stroke();

	if !collapsed {
		ctx.set_fill_color("rgba(0, 0, 0, 0.2)");
		ctx.fill_rect(0.0, -1.0, width, 2.0);
	}

	let radii = if collapsed {
		CornerRadii::all(NODE_CORNER_RADIUS)
	} else {
		CornerRadii::top(NODE_CORNER_RADIUS)
	};
	ctx.set_fill_color(node.title_color().unwrap_or(color));
	ctx.begin_path();
	ctx.round_rect(0.0, -NODE_TITLE_HEIGHT, width, NODE_TITLE_HEIGHT, radii);
	ctx.fill();

	let half = NODE_TITLE_HEIGHT * 0.5;
	ctx.set_fill_color(&options.node_dot_color);
	ctx.begin_path();
	ctx.arc(half, -half, NODE_DOT_RADIUS, 0.0, TAU);
	ctx.fill();

	ctx.set_fill_color(&options.title_text_color);
	ctx.fill_text(
		node.display_title(),
		NODE_TITLE_HEIGHT,
		-half + options.text_size * 0.35,
	);

	ctx.restore();
}
