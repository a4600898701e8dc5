//! Pointer gesture bookkeeping, independent of the event source.

/// Wheel step: one notch zooms in or out by this factor.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Press-move-release drag that reports incremental deltas.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanGesture {
	last: Option<(f64, f64)>,
}

impl PanGesture {
	/// Starts a drag at a screen position.
	pub fn press(&mut self, x: f64, y: f64) {
		self.last = Some((x, y));
	}

	/// Delta since the previous position, or `None` outside a drag.
	pub fn move_to(&mut self, x: f64, y: f64) -> Option<(f64, f64)> {
		let (lx, ly) = self.last.replace((x, y))?;
		Some((x - lx, y - ly))
	}

	/// Ends the drag.
	pub fn release(&mut self) {
		self.last = None;
	}

	/// Whether a drag is in progress.
	pub fn is_active(&self) -> bool {
		self.last.is_some()
	}
}

/// Zoom factor for a wheel event with vertical delta `delta_y`.
pub fn wheel_factor(delta_y: f64) -> f64 {
	if delta_y > 0.0 {
		1.0 / WHEEL_ZOOM_STEP
	} else {
		WHEEL_ZOOM_STEP
	}
}
