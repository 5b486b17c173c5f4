// src/ui/widgets/input.rs
use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Renders the input box. The title doubles as a status line showing the
/// resolution mode, fast-mode state, and per-lookup timeout.
pub fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        "Target Domain [resolver: {} | fast: {} | timeout: {}ms]",
        app.config.mode.label(),
        if app.config.fast_mode { "on" } else { "off" },
        app.config.timeout_ms,
    );
    let input_block = Block::default().borders(Borders::ALL).title(title);
    let input_paragraph = Paragraph::new(app.input.as_str())
        .block(input_block)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(input_paragraph, area);

    // Show the cursor only while the user can type.
    if let AppState::Idle = app.state {
        frame.set_cursor_position((area.x + app.input.chars().count() as u16 + 1, area.y + 1));
    }
}
