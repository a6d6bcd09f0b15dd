mod compositor;
mod page;
mod xobject;

pub use compositor::{Compositor, OverlayRequest, SignedPdf, page_sizes};
