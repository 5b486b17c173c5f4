// src/ui/widgets/channels.rs

use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Renders the side-channel panel. Each row fills in independently as its
/// lookup settles; anything still unresolved when the audit completes is
/// shown as unavailable with a link for checking by hand.
pub fn render_channels(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Side Channels");

    let domain = app
        .snapshot
        .as_ref()
        .map(|s| s.domain.clone())
        .unwrap_or_default();
    let finished = matches!(app.state, AppState::Finished);
    let sc = &app.side_channels;

    let label_style = Style::default().fg(Color::DarkGray);
    let value_style = Style::default().fg(Color::White);
    let pending_style = Style::default().fg(Color::DarkGray);
    let mut lines: Vec<Line> = Vec::new();

    let mut row = |label: &str, value: Option<String>, manual: Option<String>| {
        let value_span = match value {
            Some(v) => Span::styled(v, value_style),
            None if finished => Span::styled(
                match manual {
                    Some(url) => format!("unavailable, check {url}"),
                    None => "unavailable".to_string(),
                },
                pending_style,
            ),
            None => Span::styled("...".to_string(), pending_style),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{label:<12} "), label_style),
            value_span,
        ]));
    };

    row(
        "RDAP",
        sc.rdap.as_ref().map(|r| {
            let registrar = r.registrar.as_deref().unwrap_or("registrar unknown");
            match &r.expires {
                Some(exp) => format!("{registrar}, expires {exp}"),
                None => registrar.to_string(),
            }
        }),
        Some(format!("https://lookup.icann.org/en/lookup?name={domain}")),
    );
    row(
        "HSTS",
        sc.hsts_preload.as_ref().map(|p| p.status.clone()),
        Some(format!("https://hstspreload.org/?domain={domain}")),
    );
    row(
        "Observatory",
        sc.observatory.as_ref().map(|o| match (&o.grade, o.score) {
            (Some(grade), Some(score)) => format!("{grade} ({score})"),
            (Some(grade), None) => grade.clone(),
            _ => "scanned".to_string(),
        }),
        sc.observatory.as_ref().map(|o| o.details_url.clone()).or(Some(format!(
            "https://observatory.mozilla.org/analyze/{domain}"
        ))),
    );
    row(
        "MTA-STS",
        sc.mta_sts.as_ref().map(|m| {
            match (&m.dns, &m.policy) {
                (Some(_), Some(_)) => "record + policy".to_string(),
                (Some(_), None) => "record only".to_string(),
                (None, Some(_)) => "policy only".to_string(),
                (None, None) => "not deployed".to_string(),
            }
        }),
        None,
    );
    row("TLS-RPT", sc.tls_rpt.clone(), None);
    row(
        "security.txt",
        sc.security_txt.as_ref().map(|s| format!("found on {}", s.host)),
        Some(format!("https://{domain}/.well-known/security.txt")),
    );
    row(
        "IP / ASN",
        sc.ip_info.as_ref().map(|i| {
            format!(
                "{} {} ({})",
                i.ip,
                i.asn.as_deref().unwrap_or("AS?"),
                i.org.as_deref().or(i.isp.as_deref()).unwrap_or("unknown")
            )
        }),
        None,
    );

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(paragraph, area);
}
