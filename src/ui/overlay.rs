use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::layout::centered_rect;

/// Boxed message shown when there is no preview to draw.
pub fn draw_notice_overlay(frame: &mut Frame<'_>, area: Rect, title: &str, message: &str) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let popup_width = area.width.min(48);
    let popup_height = area.height.min(5);
    let popup = centered_rect(area, popup_width, popup_height);

    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let message = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White));
    frame.render_widget(message, inner);
}

pub fn draw_name_prompt(frame: &mut Frame<'_>, area: Rect, input: &str, cursor: usize) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let popup_width = area.width.min(48);
    let popup_height = area.height.min(3);
    let popup = centered_rect(area, popup_width, popup_height);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Save signature as (Enter to save, Esc to cancel) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    // Software caret, the terminal cursor stays hidden.
    let line = build_input_line(input, cursor, inner.width as usize);
    frame.render_widget(Paragraph::new(line), inner);
}

fn build_input_line(input: &str, cursor: usize, width: usize) -> Line<'static> {
    let prefix_spans = vec![
        Span::raw(" ".to_string()),
        Span::styled("> ".to_string(), Style::default().fg(Color::White)),
    ];
    let prefix_width = 3;
    let max_text_width = width.saturating_sub(prefix_width);

    let chars: Vec<char> = input.chars().collect();
    let char_count = chars.len();
    let cursor = cursor.min(char_count);

    let start = if max_text_width == 0 {
        char_count
    } else if cursor >= max_text_width {
        cursor
            .saturating_sub(max_text_width.saturating_sub(1))
            .min(char_count)
    } else {
        0
    };

    let text_width = max_text_width.max(1);
    let end = (start + text_width).min(char_count);
    let mut visible: Vec<char> = chars[start..end].to_vec();
    if visible.len() < text_width {
        visible.extend(std::iter::repeat_n(' ', text_width - visible.len()));
    }

    let caret_idx = cursor
        .saturating_sub(start)
        .min(text_width.saturating_sub(1));

    let mut spans = prefix_spans;
    for (idx, ch) in visible.into_iter().enumerate() {
        if idx == caret_idx {
            spans.push(Span::styled(
                ch.to_string(),
                Style::default().add_modifier(Modifier::REVERSED),
            ));
        } else {
            spans.push(Span::raw(ch.to_string()));
        }
    }
    Line::from(spans)
}
