//! Error type shared by the canvas and graph modules.

/// Result alias used throughout the crate.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Failures surfaced while setting up a canvas or building nodes.
///
/// Everything here is a setup failure: nothing is retried and nothing is
/// raised per frame. Out-of-range zoom input is clamped, never reported.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
	/// No element with the given id exists in the host document.
	#[error("canvas element `{0}` not found")]
	ElementNotFound(String),

	/// The host refused to hand out a 2d drawing context.
	#[error("2d drawing context unavailable: {0}")]
	ContextUnavailable(String),

	/// The render targets are unusable (zero area, mismatched layers).
	#[error("surface error: {0}")]
	Surface(String),

	/// A repeating pattern could not be built from a decoded image.
	#[error("pattern error: {0}")]
	Pattern(String),

	/// `create_node` was asked for a type name nobody registered.
	#[error("unknown node type `{0}`")]
	UnknownNodeType(String),

	/// Every node id has been handed out.
	#[error("graph has run out of node ids")]
	IdsExhausted,
}

impl CanvasError {
	/// Shorthand for [`CanvasError::Surface`].
	pub fn surface(msg: impl Into<String>) -> Self {
		Self::Surface(msg.into())
	}

	/// Shorthand for [`CanvasError::Pattern`].
	pub fn pattern(msg: impl Into<String>) -> Self {
		Self::Pattern(msg.into())
	}
}
