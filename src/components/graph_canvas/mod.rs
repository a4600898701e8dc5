mod component;
pub mod input;
mod render;
mod state;
pub mod surface;
pub mod viewport;
pub mod web;

pub use component::GraphCanvasView;
pub use state::{BACKGROUND_IMAGE, FrameProfiler, GraphCanvas, LayerFlags, LoopControl, RenderOptions};
pub use surface::{CornerRadii, DrawingContext, ImageLoader, RasterImage, Shadow};
pub use viewport::{MAX_SCALE, MIN_SCALE, Viewport};
