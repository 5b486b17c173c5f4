// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
};

/// Renders the summary widget: overall score, gauge, and the per-category
/// pass/fail checks. Content appears only once the audit has finished.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Score & rating
            Constraint::Length(1), // Gauge
            Constraint::Length(2), // Spacer
            Constraint::Length(3), // Checks
            Constraint::Length(2), // Spacer
            Constraint::Min(0),    // Issue counts
        ])
        .split(area);

    if !matches!(app.state, AppState::Finished) {
        return;
    }

    let (rating_text, rating_style) = match app.summary.score {
        90..=100 => ("Excellent", Style::default().fg(Color::Green)),
        75..=89 => ("Good", Style::default().fg(Color::Cyan)),
        50..=74 => ("Needs Improvement", Style::default().fg(Color::Yellow)),
        _ => ("Poor", Style::default().fg(Color::Red)),
    };
    let score_line =
        Line::from(format!("{}/100 ({})", app.summary.score, rating_text)).style(rating_style);
    let score_text = Text::from(vec![Line::from("Overall Score".bold()), score_line]);
    frame.render_widget(
        Paragraph::new(score_text).alignment(Alignment::Center),
        summary_chunks[0],
    );

    let score_gauge = Gauge::default()
        .percent(app.summary.score as u16)
        .label("")
        .style(Style::default().fg(if app.summary.score >= 80 {
            Color::Green
        } else if app.summary.score >= 50 {
            Color::Yellow
        } else {
            Color::Red
        }));
    frame.render_widget(score_gauge, summary_chunks[1]);

    let checks_block = Block::default().title("SECURITY CHECKS".bold());
    let mut checks_lines = Vec::new();
    let checks_to_render = [
        ("DNS Integrity", app.summary.dns_check_passed),
        ("Email Authentication", app.summary.mail_check_passed),
    ];
    for (name, passed) in checks_to_render {
        let (icon, style) = if passed {
            ("✓", Style::default().fg(Color::Green))
        } else {
            ("✗", Style::default().fg(Color::Red))
        };
        checks_lines.push(Line::from(vec![
            Span::styled(format!("{icon} "), style),
            Span::raw(name),
        ]));
    }
    frame.render_widget(
        Paragraph::new(checks_lines).block(checks_block),
        summary_chunks[3],
    );

    let issues_block = Block::default().title("ISSUES FOUND".bold());
    let details_text = Text::from(vec![
        Line::from(vec![
            Span::raw("Critical: "),
            Span::styled(
                app.summary.critical_issues.to_string(),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(vec![
            Span::raw("Warnings: "),
            Span::styled(
                app.summary.warning_issues.to_string(),
                Style::default().fg(Color::Yellow),
            ),
        ]),
    ]);
    frame.render_widget(
        Paragraph::new(details_text).block(issues_block),
        summary_chunks[5],
    );
}
