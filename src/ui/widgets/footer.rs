// src/ui/widgets/footer.rs

use crate::app::{App, AppState};
use crate::core::models::AuditPhase;
use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

fn key(label: &str) -> Span<'_> {
    Span::styled(label, Style::new().bold().fg(Color::Yellow))
}

/// Renders the footer bar listing the actions available in the current state.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let spans = match app.state {
        AppState::Idle => Line::from(vec![
            key("Enter"),
            Span::raw(" audit, "),
            key("Tab"),
            Span::raw(" resolver mode, "),
            key("F2"),
            Span::raw(" fast mode, "),
            key("F3"),
            Span::raw(" logs, "),
            key("Q"),
            Span::raw(" quit"),
        ]),
        AppState::Auditing => {
            let phase = match app.phase {
                AuditPhase::NotStarted | AuditPhase::DnsInFlight => "resolving records",
                AuditPhase::DnsSettled | AuditPhase::SideChannelsInFlight => {
                    "waiting on side channels"
                }
                AuditPhase::Complete => "finishing",
            };
            Line::from(vec![
                Span::raw(format!("Auditing ({phase})... ")),
                key("Q"),
                Span::raw(" to quit."),
            ])
        }
        AppState::Finished => Line::from(vec![
            key("[N]"),
            Span::raw("ew audit, "),
            key("↑ ↓"),
            Span::raw(" findings, "),
            key("F3"),
            Span::raw(" logs, "),
            key("[Q]"),
            Span::raw("uit"),
        ]),
    };

    let footer = Paragraph::new(spans).alignment(Alignment::Center);
    frame.render_widget(footer, area);
}
