mod hayro;
mod traits;

pub use hayro::PdfDoc;
pub use traits::{PagePreview, PdfBackend, RgbaFrame};
