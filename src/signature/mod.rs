mod draw;
mod raster;
pub mod store;

pub use draw::{MAX_CANVAS_SIDE, StrokeCanvas, rasterize_strokes};
pub use raster::{Rgb, SignatureImage};
pub use store::{SavedSignature, SignatureStore};
