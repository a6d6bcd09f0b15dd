use ratatui::Frame;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{StatusLevel, StatusState};
use crate::session::SessionStage;

use super::layout::UiLayout;

pub const HELP_TEXT: &str =
    "arrows/hjkl move (shift x10) | click place | c center | +/- width | PgUp/PgDn page | Enter export | s save | q quit";

/// Everything the status bar shows, gathered by the app before drawing.
#[derive(Debug, Clone)]
pub struct StatusView<'a> {
    pub file_name: &'a str,
    pub page: usize,
    pub page_count: usize,
    pub width_pt: u32,
    pub position: Option<(f64, f64)>,
    pub stage: SessionStage,
    pub status: &'a StatusState,
}

pub fn stage_label(stage: SessionStage) -> &'static str {
    match stage {
        SessionStage::Idle => "IDLE",
        SessionStage::PdfLoaded => "PDF",
        SessionStage::SignatureReady => "SIGNATURE",
        SessionStage::PositionChosen => "PLACED",
        SessionStage::Exported => "EXPORTED",
    }
}

pub fn status_text(view: &StatusView<'_>) -> String {
    let page_total = view.page_count.max(1);
    let page_now = view.page.saturating_add(1).min(page_total);
    let position = match view.position {
        Some((x, y)) => format!("{x:.0}%,{y:.0}%"),
        None => "unplaced".to_string(),
    };
    format!(
        "{} | page {}/{} | width {}pt | {} | {}",
        view.file_name,
        page_now,
        page_total,
        view.width_pt,
        position,
        stage_label(view.stage)
    )
}

pub fn draw_chrome(frame: &mut Frame<'_>, layout: UiLayout, view: &StatusView<'_>) {
    let mut spans = vec![Span::raw(status_text(view))];
    if !view.status.message.is_empty() {
        let color = match view.status.level {
            StatusLevel::Info => Color::Green,
            StatusLevel::Warning => Color::Yellow,
            StatusLevel::Error => Color::Red,
        };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            view.status.message.as_str(),
            Style::default().fg(color),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), layout.status);

    let help = Paragraph::new(HELP_TEXT).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, layout.help);
}
