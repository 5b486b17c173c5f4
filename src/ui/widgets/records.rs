// src/ui/widgets/records.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use crate::core::models::RecordType;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use strum::IntoEnumIterator;

/// Renders the DNS snapshot panel: one line per record type, filled in as
/// soon as the fan-out settles, plus the derived SPF/DMARC/DNSSEC rows.
pub fn render_records(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("DNS Records");

    let Some(snapshot) = &app.snapshot else {
        let content = match app.state {
            AppState::Idle => Paragraph::new("Records will appear here...")
                .alignment(Alignment::Center),
            AppState::Auditing => {
                let spinner_char = SPINNER_CHARS[app.spinner_frame];
                Paragraph::new(Line::from(vec![
                    Span::styled(
                        format!("{spinner_char} "),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw("Resolving..."),
                ]))
                .alignment(Alignment::Center)
            }
            AppState::Finished => Paragraph::new("No snapshot."),
        };
        frame.render_widget(content.block(block), area);
        return;
    };

    let label_style = Style::default().fg(Color::DarkGray);
    let mut lines: Vec<Line> = Vec::new();

    for rtype in RecordType::iter() {
        let value: Line = match snapshot.records.get(&rtype) {
            Some(answers) if !answers.is_empty() => {
                let joined = answers
                    .iter()
                    .map(|a| a.data.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Line::from(Span::raw(joined))
            }
            Some(_) => Line::from(Span::styled("-", label_style)),
            None => Line::from(Span::styled("lookup failed", Style::default().fg(Color::Red))),
        };
        let mut spans = vec![Span::styled(format!("{rtype:<5} "), label_style)];
        spans.extend(value.spans);
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(derived_line("SPF", &snapshot.spf, |spf| {
        let mut text = spf.record.clone();
        if spf.permissive_all {
            text.push_str("  (+all!)");
        }
        text
    }));
    lines.push(derived_line("DMARC", &snapshot.dmarc, |dmarc| {
        format!("p={}, pct={}", dmarc.policy, dmarc.pct)
    }));
    lines.push(match snapshot.dnssec {
        Some(true) => Line::from(vec![
            Span::styled("DNSSEC ", label_style),
            Span::styled("signed", Style::default().fg(Color::Green)),
        ]),
        Some(false) => Line::from(vec![
            Span::styled("DNSSEC ", label_style),
            Span::styled("not detected", Style::default().fg(Color::Yellow)),
        ]),
        None => Line::from(vec![
            Span::styled("DNSSEC ", label_style),
            Span::styled("unknown", label_style),
        ]),
    });

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(paragraph, area);
}

fn derived_line<T>(
    name: &str,
    check: &Result<Option<T>, String>,
    describe: impl Fn(&T) -> String,
) -> Line<'static> {
    let label_style = Style::default().fg(Color::DarkGray);
    let value = match check {
        Ok(Some(v)) => Span::styled(describe(v), Style::default().fg(Color::Green)),
        Ok(None) => Span::styled("absent".to_string(), Style::default().fg(Color::Yellow)),
        Err(e) => Span::styled(format!("check failed: {e}"), Style::default().fg(Color::Red)),
    };
    Line::from(vec![
        Span::styled(format!("{name:<6} "), label_style),
        value,
    ])
}
