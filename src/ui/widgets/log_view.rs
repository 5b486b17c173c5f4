// src/ui/widgets/log_view.rs

use crate::app::App;
use crate::core::models::LogLevel;
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Renders the diagnostic log strip: the tail of the audit's log, newest
/// at the bottom, with level-colored tags and gray timestamps.
pub fn render_log_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title("Audit Log (F3 to hide)")
        .borders(Borders::ALL);
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let visible = inner_area.height as usize;
    let skip = app.log.len().saturating_sub(visible);

    let log_lines: Vec<Line> = app
        .log
        .iter()
        .skip(skip)
        .map(|event| {
            let level_style = match event.level {
                LogLevel::Ok => Style::default().fg(Color::Green),
                LogLevel::Info => Style::default().fg(Color::Cyan),
                LogLevel::Warn => Style::default().fg(Color::Yellow),
                LogLevel::Error => Style::default().fg(Color::Red),
            };
            Line::from(vec![
                Span::styled(
                    event.timestamp.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{:<5} ", event.level.to_string()), level_style),
                Span::raw(event.message.clone()),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(log_lines), inner_area);
}
