use std::io::Cursor;
use std::path::Path;

use fast_image_resize as fr;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::{AppError, AppResult};
use crate::placement::ImageSize;

const RESIZE_FILTER: fr::FilterType = fr::FilterType::CatmullRom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const DEFAULT_INK: Self = Self(0x1A, 0x23, 0x7E);

    /// Parses `#RRGGBB` or `RRGGBB`.
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// An RGBA signature raster with non-zero dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImage {
    image: RgbaImage,
}

impl SignatureImage {
    pub fn from_rgba(image: RgbaImage) -> AppResult<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AppError::invalid_argument(
                "signature image must not be empty",
            ));
        }
        Ok(Self { image })
    }

    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| {
            AppError::io_with_context(
                source,
                format!("failed to read signature image: {}", path.display()),
            )
        })?;
        Self::from_bytes(&bytes)
    }

    /// Decodes a PNG or JPEG, converting any color mode to RGBA.
    pub fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        let format = image::guess_format(bytes)
            .map_err(|source| AppError::image(source, "unrecognized signature image format"))?;
        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
            return Err(AppError::unsupported(format!(
                "signature image must be PNG or JPEG, got {format:?}"
            )));
        }
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|source| AppError::image(source, "failed to decode signature image"))?;
        Self::from_rgba(decoded.to_rgba8())
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.image.width(), self.image.height())
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    /// Crops to the bounding box of pixels with non-zero alpha; `None` when fully transparent.
    pub fn crop_to_content(&self) -> Option<Self> {
        let (x0, y0, x1, y1) = content_bounds(&self.image)?;
        let cropped =
            image::imageops::crop_imm(&self.image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image();
        Some(Self { image: cropped })
    }

    pub fn encode_png(&self) -> AppResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|source| AppError::image(source, "failed to encode signature as PNG"))?;
        Ok(out.into_inner())
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes).map_err(|source| {
            AppError::io_with_context(
                source,
                format!("failed to write signature: {}", path.display()),
            )
        })
    }

    /// Resamples to the given pixel size with premultiplied alpha.
    pub fn resized(&self, width: u32, height: u32) -> AppResult<RgbaImage> {
        let (width, height) = (width.max(1), height.max(1));
        if self.image.width() == width && self.image.height() == height {
            return Ok(self.image.clone());
        }

        let src = fr::images::Image::from_vec_u8(
            self.image.width(),
            self.image.height(),
            self.image.as_raw().clone(),
            fr::PixelType::U8x4,
        )
        .map_err(|_| {
            AppError::invalid_argument("signature pixels length does not match dimensions")
        })?;

        let mut dst = fr::images::Image::new(width, height, fr::PixelType::U8x4);
        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(RESIZE_FILTER));
        resizer
            .resize(&src, &mut dst, &options)
            .map_err(|_| AppError::unsupported("failed to resize signature image"))?;

        RgbaImage::from_raw(width, height, dst.into_vec()).ok_or(AppError::invalid_argument(
            "resized signature buffer does not match dimensions",
        ))
    }
}

fn content_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}
