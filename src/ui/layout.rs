// src/ui/layout.rs

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// The named areas of the screen. Calculated once per frame so widgets
/// never have to re-derive their own dimensions.
pub struct AppLayout {
    pub input: Rect,
    pub records: Rect,
    pub channels: Rect,
    pub analysis: Rect,
    pub summary: Rect,
    pub log_panel: Rect,
    pub footer: Rect,
}

/// Divide the frame: input on top, footer at the bottom, an optional log
/// strip above the footer, and the content area split into a records
/// column, the analysis report, and a summary/side-channel column.
pub fn create_layout(frame_size: Rect, show_logs: bool) -> AppLayout {
    let main_constraints = if show_logs {
        vec![
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(8),
            Constraint::Length(1),
        ]
    } else {
        vec![
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ]
    };
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(main_constraints)
        .split(frame_size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(32),
            Constraint::Percentage(40),
            Constraint::Percentage(28),
        ])
        .split(main_chunks[1]);

    let records_column = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(content_chunks[0]);

    AppLayout {
        input: main_chunks[0],
        records: records_column[0],
        channels: records_column[1],
        analysis: content_chunks[1],
        summary: content_chunks[2],
        log_panel: if show_logs { main_chunks[2] } else { Rect::default() },
        footer: if show_logs { main_chunks[3] } else { main_chunks[2] },
    }
}
