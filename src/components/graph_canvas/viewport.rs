//! Pan/zoom transform between device pixels and graph space.
//!
//! The drawing surface is scaled first and translated second, so a graph
//! point `p` lands on the device at `(p + offset) * scale`.

use super::surface::DrawingContext;

/// Smallest allowed zoom.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed zoom.
pub const MAX_SCALE: f64 = 10.0;
/// Zoom levels this close to 1 snap to exactly 1.
pub const SCALE_SNAP: f64 = 0.05;

/// Scale and offset of the visible area, plus the device size it maps onto.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
	/// Zoom factor, 1 is neutral.
	pub scale: f64,
	/// Graph-space translation applied after scaling.
	pub offset: (f64, f64),
	/// Device width in pixels.
	pub width: f64,
	/// Device height in pixels.
	pub height: f64,
}

impl Viewport {
	/// Neutral viewport over a `width` x `height` surface.
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			scale: 1.0,
			offset: (0.0, 0.0),
			width,
			height,
		}
	}

	/// Applies the view transform to a point. Inverse of [`Viewport::to_local`].
	pub fn to_world(&self, x: f64, y: f64) -> (f64, f64) {
		(
			(x + self.offset.0) * self.scale,
			(y + self.offset.1) * self.scale,
		)
	}

	/// Maps a device point back into graph space.
	pub fn to_local(&self, x: f64, y: f64) -> (f64, f64) {
		let inv = 1.0 / self.scale;
		(x * inv - self.offset.0, y * inv - self.offset.1)
	}

	/// Moves the view by a device-pixel delta. The delta is divided by the
	/// scale so a drag covers the same on-screen distance at any zoom.
	pub fn pan(&mut self, dx: f64, dy: f64) {
		let inv = 1.0 / self.scale;
		self.offset.0 += dx * inv;
		self.offset.1 += dy * inv;
	}

	/// Zooms to `scale`, keeping the graph point under `anchor` in place.
	/// Without an anchor the surface centre is used. A NaN scale or a
	/// non-finite anchor leaves the view unchanged.
	pub fn zoom_to(&mut self, scale: f64, anchor: Option<(f64, f64)>) {
		if scale.is_nan() {
			return;
		}
		let scale = clamp_scale(scale);
		let (ax, ay) = anchor.unwrap_or((self.width / 2.0, self.height / 2.0));
		if !ax.is_finite() || !ay.is_finite() {
			return;
		}

		let before = self.to_local(ax, ay);
		self.scale = scale;
		let after = self.to_local(ax, ay);

		self.offset.0 += after.0 - before.0;
		self.offset.1 += after.1 - before.1;
	}

	/// Back to scale 1 and no offset.
	pub fn reset(&mut self) {
		self.scale = 1.0;
		self.offset = (0.0, 0.0);
	}

	/// Updates the device size used for the default anchor and
	/// [`Viewport::compute_viewport`].
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Visible graph-space rectangle as `(x, y, width, height)`.
	pub fn compute_viewport(&self) -> (f64, f64, f64, f64) {
		let top_left = self.to_local(0.0, 0.0);
		let bottom_right = self.to_local(self.width, self.height);
		(
			top_left.0,
			top_left.1,
			bottom_right.0 - top_left.0,
			bottom_right.1 - top_left.1,
		)
	}

	/// Installs the transform on `ctx`: scale, then translate.
	pub fn apply_to<C: DrawingContext + ?Sized>(&self, ctx: &mut C) {
		ctx.scale(self.scale, self.scale);
		ctx.translate(self.offset.0, self.offset.1);
	}
}

/// Clamps into `[MIN_SCALE, MAX_SCALE]` and snaps near-neutral zoom to 1.
/// NaN maps to 1.
pub fn clamp_scale(scale: f64) -> f64 {
	if scale.is_nan() {
		return 1.0;
	}
	let scale = scale.clamp(MIN_SCALE, MAX_SCALE);
	// inclusive at both ends of the snap band
	if (scale - 1.0).abs() <= SCALE_SNAP + f64::EPSILON {
		1.0
	} else {
		scale
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const EPS: f64 = 1e-9;

	fn close(a: (f64, f64), b: (f64, f64)) -> bool {
		(a.0 - b.0).abs() < EPS && (a.1 - b.1).abs() < EPS
	}

	// ========================================================================
	// Clamping
	// ========================================================================

	#[test]
	fn zoom_clamps_to_bounds() {
		let mut vp = Viewport::new(800.0, 600.0);
		vp.zoom_to(50.0, None);
		assert_eq!(vp.scale, MAX_SCALE);
		vp.zoom_to(0.01, None);
		assert_eq!(vp.scale, MIN_SCALE);
	}

	#[test]
	fn zoom_snaps_near_one() {
		for s in [0.95, 0.97, 1.0, 1.03, 1.05] {
			assert_eq!(clamp_scale(s), 1.0, "scale {s}");
		}
		assert_eq!(clamp_scale(0.9), 0.9);
		assert_eq!(clamp_scale(1.1), 1.1);
	}

	#[test]
	fn clamp_holds_for_wide_range() {
		let mut s = 1e-4;
		while s < 1e4 {
			let c = clamp_scale(s);
			assert!((MIN_SCALE..=MAX_SCALE).contains(&c));
			s *= 1.37;
		}
	}

	#[test]
	fn non_numeric_zoom_leaves_view_intact() {
		assert_eq!(clamp_scale(f64::NAN), 1.0);
		assert_eq!(clamp_scale(f64::INFINITY), MAX_SCALE);
		assert_eq!(clamp_scale(f64::NEG_INFINITY), MIN_SCALE);

		let mut vp = Viewport::new(800.0, 600.0);
		vp.zoom_to(2.0, Some((100.0, 100.0)));
		let before = vp.clone();

		vp.zoom_to(f64::NAN, None);
		vp.zoom_to(f64::NAN, Some((10.0, 10.0)));
		vp.zoom_to(3.0, Some((f64::NAN, 0.0)));
		vp.zoom_to(3.0, Some((0.0, f64::INFINITY)));
		assert_eq!(vp, before);

		vp.zoom_to(f64::INFINITY, None);
		assert_eq!(vp.scale, MAX_SCALE);
		assert!(vp.offset.0.is_finite() && vp.offset.1.is_finite());
	}

	// ========================================================================
	// Mapping
	// ========================================================================

	#[test]
	fn to_local_inverts_to_world() {
		let vp = Viewport {
			scale: 2.5,
			offset: (-40.0, 17.5),
			width: 800.0,
			height: 600.0,
		};
		for p in [(0.0, 0.0), (123.0, -45.0), (799.0, 599.0)] {
			let (wx, wy) = vp.to_world(p.0, p.1);
			assert!(close(vp.to_local(wx, wy), p));
		}
	}

	#[test]
	fn anchor_stays_fixed_across_zoom() {
		let mut vp = Viewport::new(800.0, 600.0);
		vp.pan(33.0, -12.0);
		for (anchor, scale) in [((100.0, 50.0), 3.0), ((700.0, 20.0), 0.3), ((0.0, 0.0), 7.5)] {
			let before = vp.to_local(anchor.0, anchor.1);
			vp.zoom_to(scale, Some(anchor));
			let after = vp.to_local(anchor.0, anchor.1);
			assert!(close(before, after));
			assert!(close(vp.to_world(after.0, after.1), anchor));
		}
	}

	#[test]
	fn default_anchor_is_centre() {
		let mut vp = Viewport::new(800.0, 600.0);
		let centre = vp.to_local(400.0, 300.0);
		vp.zoom_to(4.0, None);
		assert!(close(vp.to_local(400.0, 300.0), centre));
	}

	// ========================================================================
	// Pan / reset
	// ========================================================================

	#[test]
	fn pan_is_scale_compensated() {
		let mut vp = Viewport::new(800.0, 600.0);
		vp.pan(10.0, -6.0);
		assert_eq!(vp.offset, (10.0, -6.0));

		let mut vp = Viewport::new(800.0, 600.0);
		vp.scale = 2.0;
		vp.pan(10.0, -6.0);
		assert_eq!(vp.offset, (5.0, -3.0));
	}

	#[test]
	fn reset_restores_neutral_view() {
		let mut vp = Viewport::new(800.0, 600.0);
		vp.pan(120.0, 80.0);
		vp.zoom_to(3.3, Some((10.0, 10.0)));
		vp.pan(-7.0, 2.0);
		vp.reset();
		assert_eq!(vp.scale, 1.0);
		assert_eq!(vp.offset, (0.0, 0.0));
	}

	#[test]
	fn visible_rect_tracks_pan_and_zoom() {
		let mut vp = Viewport::new(800.0, 600.0);
		assert_eq!(vp.compute_viewport(), (0.0, 0.0, 800.0, 600.0));

		vp.scale = 2.0;
		vp.offset = (-100.0, -50.0);
		assert_eq!(vp.compute_viewport(), (100.0, 50.0, 400.0, 300.0));
	}
}
