use image::{DynamicImage, RgbaImage};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::Clear;
use ratatui_image::picker::{Picker, ProtocolType};
use ratatui_image::protocol::StatefulProtocol;
use ratatui_image::{FilterType, Resize, StatefulImage};

use crate::error::{AppError, AppResult};

use super::traits::ImagePresenter;

pub(crate) const ENCODE_FAILURE_MESSAGE: &str = "failed to encode terminal image";
const RESIZE_FILTER: FilterType = FilterType::Nearest;

pub struct RatatuiImagePresenter {
    picker: Picker,
    protocol_label: &'static str,
    terminal_initialized: bool,
    protocol: Option<StatefulProtocol>,
}

impl Default for RatatuiImagePresenter {
    fn default() -> Self {
        Self {
            picker: Picker::halfblocks(),
            protocol_label: protocol_type_label(ProtocolType::Halfblocks),
            terminal_initialized: false,
            protocol: None,
        }
    }
}

impl RatatuiImagePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn draw_protocol(
        frame: &mut Frame<'_>,
        area: Rect,
        protocol: &mut StatefulProtocol,
    ) -> AppResult<()> {
        frame.render_widget(Clear, area);
        frame.render_stateful_widget(
            StatefulImage::<StatefulProtocol>::default().resize(Resize::Fit(Some(RESIZE_FILTER))),
            area,
            protocol,
        );

        if let Some(result) = protocol.last_encoding_result() {
            result.map_err(|_| AppError::unsupported(ENCODE_FAILURE_MESSAGE))?;
        }
        Ok(())
    }
}

impl ImagePresenter for RatatuiImagePresenter {
    fn initialize_terminal(&mut self) -> AppResult<()> {
        if self.terminal_initialized {
            return Ok(());
        }

        // Terminals that do not answer the graphics query keep halfblocks.
        if let Ok(picker) = Picker::from_query_stdio() {
            self.protocol_label = protocol_type_label(picker.protocol_type());
            self.picker = picker;
            self.protocol = None;
        }
        tracing::debug!(protocol = self.protocol_label, "terminal graphics initialized");

        self.terminal_initialized = true;
        Ok(())
    }

    fn status_label(&self) -> String {
        format!("ratatui-image/{}", self.protocol_label)
    }

    fn prepare(&mut self, image: RgbaImage) -> AppResult<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AppError::invalid_argument("preview image must not be empty"));
        }
        self.protocol = Some(
            self.picker
                .new_resize_protocol(DynamicImage::ImageRgba8(image)),
        );
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect) -> AppResult<Option<Rect>> {
        if area.width == 0 || area.height == 0 {
            return Ok(None);
        }
        let Some(protocol) = self.protocol.as_mut() else {
            return Ok(None);
        };

        let target_size = protocol.size_for(Resize::Fit(Some(RESIZE_FILTER)), area);
        let render_area = center_rect_within(area, target_size.width, target_size.height);
        Self::draw_protocol(frame, render_area, protocol)?;
        Ok(Some(render_area))
    }
}

fn protocol_type_label(protocol: ProtocolType) -> &'static str {
    match protocol {
        ProtocolType::Halfblocks => "halfblocks",
        ProtocolType::Sixel => "sixel",
        ProtocolType::Kitty => "kitty",
        ProtocolType::Iterm2 => "iterm2",
    }
}

pub(crate) fn center_rect_within(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.max(1).min(area.width);
    let height = height.max(1).min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}
