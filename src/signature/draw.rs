use std::path::Path;

use image::{Rgba, RgbaImage};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

use super::raster::{Rgb, SignatureImage};

/// Largest canvas side accepted for rasterizing, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 4096;

/// Freehand strokes captured on a fixed-size canvas, in canvas pixels.
///
/// A missing `width` or `height` stays 0 until [`StrokeCanvas::or_size`] fills it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StrokeCanvas {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub strokes: Vec<Vec<[f32; 2]>>,
}

impl StrokeCanvas {
    pub fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw)
            .map_err(|source| AppError::invalid_argument(format!("invalid strokes JSON: {source}")))
    }

    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| {
            AppError::io_with_context(source, format!("failed to read strokes: {}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Fills in whichever canvas dimension the strokes file left out.
    pub fn or_size(mut self, width: u32, height: u32) -> Self {
        if self.width == 0 {
            self.width = width;
        }
        if self.height == 0 {
            self.height = height;
        }
        self
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Draws the strokes with round caps onto a transparent canvas and crops to the ink.
///
/// Returns `None` when nothing visible was drawn.
pub fn rasterize_strokes(
    canvas: &StrokeCanvas,
    color: Rgb,
    stroke_width: f32,
) -> AppResult<Option<SignatureImage>> {
    if canvas.width == 0 || canvas.height == 0 {
        return Err(AppError::invalid_argument("canvas size must be non-zero"));
    }
    if canvas.width > MAX_CANVAS_SIDE || canvas.height > MAX_CANVAS_SIDE {
        return Err(AppError::invalid_argument(format!(
            "canvas {}x{} exceeds {MAX_CANVAS_SIDE}x{MAX_CANVAS_SIDE}",
            canvas.width, canvas.height
        )));
    }
    if !stroke_width.is_finite() || stroke_width <= 0.0 {
        return Err(AppError::invalid_argument(
            "stroke width must be a positive finite value",
        ));
    }

    let mut coverage = vec![0.0_f32; canvas.width as usize * canvas.height as usize];
    let radius = stroke_width / 2.0;
    for stroke in &canvas.strokes {
        match stroke.as_slice() {
            [] => {}
            [point] => stamp_segment(&mut coverage, canvas, *point, *point, radius),
            points => {
                for pair in points.windows(2) {
                    stamp_segment(&mut coverage, canvas, pair[0], pair[1], radius);
                }
            }
        }
    }

    let Rgb(r, g, b) = color;
    let image = RgbaImage::from_fn(canvas.width, canvas.height, |x, y| {
        let alpha = coverage[canvas.index(x, y)];
        Rgba([r, g, b, (alpha * 255.0).round() as u8])
    });
    Ok(SignatureImage::from_rgba(image)?.crop_to_content())
}

fn stamp_segment(
    coverage: &mut [f32],
    canvas: &StrokeCanvas,
    from: [f32; 2],
    to: [f32; 2],
    radius: f32,
) {
    let reach = radius + 1.0;
    let min_x = (from[0].min(to[0]) - reach).floor().max(0.0) as u32;
    let min_y = (from[1].min(to[1]) - reach).floor().max(0.0) as u32;
    let max_x = ((from[0].max(to[0]) + reach).ceil().max(0.0) as u32).min(canvas.width - 1);
    let max_y = ((from[1].max(to[1]) + reach).ceil().max(0.0) as u32).min(canvas.height - 1);
    if min_x > max_x || min_y > max_y {
        return;
    }

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let center = [x as f32 + 0.5, y as f32 + 0.5];
            let distance = distance_to_segment(center, from, to);
            let alpha = (radius + 0.5 - distance).clamp(0.0, 1.0);
            let slot = &mut coverage[canvas.index(x, y)];
            *slot = slot.max(alpha);
        }
    }
}

fn distance_to_segment(point: [f32; 2], from: [f32; 2], to: [f32; 2]) -> f32 {
    let (dx, dy) = (to[0] - from[0], to[1] - from[1]);
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq <= f32::EPSILON {
        0.0
    } else {
        (((point[0] - from[0]) * dx + (point[1] - from[1]) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let (px, py) = (from[0] + t * dx, from[1] + t * dy);
    ((point[0] - px).powi(2) + (point[1] - py).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;

    use super::{MAX_CANVAS_SIDE, Rgb, StrokeCanvas, rasterize_strokes};

    #[test]
    fn horizontal_stroke_is_cropped_to_ink() {
        let canvas = StrokeCanvas::from_json(
            r#"{"width":350,"height":150,"strokes":[[[50,75],[250,75]]]}"#,
        )
        .expect("strokes should parse");

        let signature = rasterize_strokes(&canvas, Rgb::DEFAULT_INK, 3.0)
            .expect("rasterize should succeed")
            .expect("stroke should leave ink");

        let size = signature.size();
        assert!((200..=206).contains(&size.width), "width {}", size.width);
        assert!((3..=6).contains(&size.height), "height {}", size.height);
        let inked = signature
            .as_rgba()
            .pixels()
            .find(|pixel| pixel[3] == 255)
            .expect("stroke core should be opaque");
        assert_eq!([inked[0], inked[1], inked[2]], [0x1A, 0x23, 0x7E]);
    }

    #[test]
    fn single_point_stroke_draws_a_dot() {
        let canvas = StrokeCanvas {
            width: 20,
            height: 20,
            strokes: vec![vec![[10.0, 10.0]]],
        };
        let signature = rasterize_strokes(&canvas, Rgb(0, 0, 0), 4.0)
            .expect("rasterize should succeed")
            .expect("dot should leave ink");
        assert!(signature.size().width <= 6);
        assert!(signature.size().height <= 6);
    }

    #[test]
    fn empty_canvas_yields_no_signature() {
        let canvas = StrokeCanvas {
            width: 350,
            height: 150,
            strokes: vec![vec![]],
        };
        let signature = rasterize_strokes(&canvas, Rgb(0, 0, 0), 3.0).expect("should succeed");
        assert!(signature.is_none());
    }

    #[test]
    fn strokes_outside_canvas_are_ignored() {
        let canvas = StrokeCanvas {
            width: 50,
            height: 50,
            strokes: vec![vec![[500.0, 500.0], [600.0, 600.0]]],
        };
        let signature = rasterize_strokes(&canvas, Rgb(0, 0, 0), 3.0).expect("should succeed");
        assert!(signature.is_none());
    }

    #[test]
    fn oversized_canvas_is_rejected_before_allocating() {
        let canvas = StrokeCanvas::from_json(
            r#"{"width":70000,"height":70000,"strokes":[[[1,1],[2,2]]]}"#,
        )
        .expect("strokes should parse");

        let err = rasterize_strokes(&canvas, Rgb(0, 0, 0), 3.0).expect_err("canvas is too big");
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let tall = StrokeCanvas {
            width: 10,
            height: MAX_CANVAS_SIDE + 1,
            strokes: vec![vec![[5.0, 5.0]]],
        };
        assert!(rasterize_strokes(&tall, Rgb(0, 0, 0), 3.0).is_err());
    }

    #[test]
    fn missing_canvas_size_takes_the_configured_default() {
        let canvas = StrokeCanvas::from_json(r#"{"strokes":[[[10,10],[40,10]]]}"#)
            .expect("strokes should parse")
            .or_size(350, 150);
        assert_eq!((canvas.width, canvas.height), (350, 150));

        let explicit = StrokeCanvas::from_json(r#"{"width":80,"strokes":[]}"#)
            .expect("strokes should parse")
            .or_size(350, 150);
        assert_eq!((explicit.width, explicit.height), (80, 150));

        assert!(
            rasterize_strokes(&canvas, Rgb(0, 0, 0), 3.0)
                .expect("rasterize should succeed")
                .is_some()
        );
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(StrokeCanvas::from_json(r#"{"width":10}"#).is_err());
    }
}
