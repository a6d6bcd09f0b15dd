use image::{Rgba, RgbaImage, imageops};
use kurbo::Rect as PageRect;
use ratatui::Frame;

use crate::backend::PagePreview;
use crate::command::ActionId;
use crate::error::AppResult;
use crate::placement::{PageSize, Placement, Position, rect_to_preview, signature_rect};
use crate::signature::SignatureImage;
use crate::ui::{StatusView, draw_chrome, draw_name_prompt, draw_notice_overlay, split_layout};

use super::core::App;
use super::state::{Mode, ViewerGeometry};
use super::terminal_session::TerminalSurface;

/// Opacity applied to the signature while it is only previewed.
const GHOST_OPACITY: f32 = 0.65;
const OUTLINE_COLOR: Rgba<u8> = Rgba([229, 57, 53, 255]);

impl App {
    /// Re-composes the preview with the signature ghost and hands it to the presenter.
    pub(crate) fn refresh_preview(&mut self) {
        let composed = self
            .previews
            .current(&self.session, self.config.preview.zoom)
            .and_then(|preview| {
                compose_ghost(preview, self.session.signature(), self.session.placement())
            });

        match composed {
            Ok(image) => {
                self.state.preview_size_px = Some(image.dimensions());
                if let Err(err) = self.presenter.prepare(image) {
                    self.state.status.last_action_id = Some(ActionId::RenderPreview);
                    self.state.status.error(err.to_string());
                }
            }
            Err(err) => {
                tracing::warn!(page = self.session.page(), error = %err, "preview failed");
                self.state.preview_size_px = None;
                self.state.status.last_action_id = Some(ActionId::RenderPreview);
                self.state.status.error(format!("preview failed: {err}"));
            }
        }
    }

    pub(crate) fn draw(&mut self, surface: &mut impl TerminalSurface) -> AppResult<()> {
        surface.draw(|frame| self.render_frame(frame))?;
        Ok(())
    }

    fn render_frame(&mut self, frame: &mut Frame<'_>) {
        let layout = split_layout(frame.area());

        let drawn = match self.presenter.render(frame, layout.viewer) {
            Ok(drawn) => drawn,
            Err(err) => {
                self.state.status.last_action_id = Some(ActionId::RenderPreview);
                self.state.status.error(err.to_string());
                None
            }
        };
        self.state.viewer = match (drawn, self.state.preview_size_px) {
            (Some(image_area), Some((preview_width_px, preview_height_px))) => {
                Some(ViewerGeometry {
                    image_area,
                    preview_width_px,
                    preview_height_px,
                })
            }
            _ => None,
        };
        if self.state.viewer.is_none() {
            draw_notice_overlay(frame, layout.viewer, "Preview", "no preview available");
        }

        let file_name = self
            .session
            .pdf_path()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "-".to_string());
        let view = StatusView {
            file_name: &file_name,
            page: self.session.page(),
            page_count: self.session.page_count(),
            width_pt: self.session.width(),
            position: self.session.position().map(Position::to_percent),
            stage: self.session.stage(),
            status: &self.state.status,
        };
        draw_chrome(frame, layout, &view);

        if self.state.mode == Mode::Prompt {
            draw_name_prompt(
                frame,
                layout.viewer,
                self.state.prompt.value(),
                self.state.prompt.visual_cursor(),
            );
        }
    }

    /// Maps a terminal cell inside the drawn preview to a click position.
    pub(crate) fn position_at_cell(&self, column: u16, row: u16) -> Option<Position> {
        let viewer = self.state.viewer?;
        let area = viewer.image_area;
        if area.width == 0
            || area.height == 0
            || column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }

        let fx = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
        let fy = (f64::from(row - area.y) + 0.5) / f64::from(area.height);
        Some(Position::Click {
            x_px: fx * f64::from(viewer.preview_width_px),
            y_px: fy * f64::from(viewer.preview_height_px),
            preview_width_px: viewer.preview_width_px,
            preview_height_px: viewer.preview_height_px,
        })
    }
}

/// The page preview with the signature drawn translucently at its placement.
pub(crate) fn compose_ghost(
    preview: &PagePreview,
    signature: Option<&SignatureImage>,
    placement: Option<Placement>,
) -> AppResult<RgbaImage> {
    let mut canvas = preview.frame.to_rgba_image()?;
    let (Some(signature), Some(placement)) = (signature, placement) else {
        return Ok(canvas);
    };

    let page = PageSize::new(
        f64::from(preview.page_width_pt),
        f64::from(preview.page_height_pt),
    );
    let rect = signature_rect(page, signature.size(), placement)?;
    let on_preview = rect_to_preview(rect, page, canvas.width(), canvas.height())?;

    let width = (on_preview.width().round() as u32).max(1);
    let height = (on_preview.height().round() as u32).max(1);
    let mut ghost = signature.resized(width, height)?;
    for pixel in ghost.pixels_mut() {
        pixel[3] = (f32::from(pixel[3]) * GHOST_OPACITY).round() as u8;
    }

    let x = on_preview.x0.round() as i64;
    let y = on_preview.y0.round() as i64;
    imageops::overlay(&mut canvas, &ghost, x, y);
    draw_outline(&mut canvas, on_preview);
    Ok(canvas)
}

fn draw_outline(canvas: &mut RgbaImage, rect: PageRect) {
    let (canvas_width, canvas_height) = canvas.dimensions();
    if canvas_width == 0 || canvas_height == 0 {
        return;
    }
    let clamp_x = |value: f64| (value.round().max(0.0) as u32).min(canvas_width - 1);
    let clamp_y = |value: f64| (value.round().max(0.0) as u32).min(canvas_height - 1);
    let (x0, x1) = (clamp_x(rect.x0), clamp_x(rect.x1 - 1.0));
    let (y0, y1) = (clamp_y(rect.y0), clamp_y(rect.y1 - 1.0));

    for x in x0..=x1 {
        canvas.put_pixel(x, y0, OUTLINE_COLOR);
        canvas.put_pixel(x, y1, OUTLINE_COLOR);
    }
    for y in y0..=y1 {
        canvas.put_pixel(x0, y, OUTLINE_COLOR);
        canvas.put_pixel(x1, y, OUTLINE_COLOR);
    }
}
