// src/ui/widgets/analysis_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use crate::core::knowledge_base;
use crate::core::models::Severity;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

pub fn render_analysis_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Analysis Report (Navigate with ↑ ↓)");

    // Findings stream in before the audit completes, so render the list as
    // soon as there is one; only show placeholders while it is still empty.
    if app.findings.is_empty() {
        let content = match app.state {
            AppState::Idle => {
                Paragraph::new("Audit results will appear here...").alignment(Alignment::Center)
            }
            AppState::Auditing => {
                let spinner_char = SPINNER_CHARS[app.spinner_frame];
                Paragraph::new(Line::from(vec![
                    Span::styled(
                        format!("{spinner_char} "),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw("Auditing... Please wait."),
                ]))
                .alignment(Alignment::Center)
            }
            AppState::Finished => Paragraph::new(Text::from(vec![
                Line::from(""),
                Line::from("✓ NO ISSUES FOUND".bold().fg(Color::Green)),
                Line::from(""),
                Line::from("Every check this audit runs came back clean."),
            ]))
            .alignment(Alignment::Center),
        };
        frame.render_widget(content.block(main_block), area);
        return;
    }

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Min(0)])
        .split(inner_area);

    let items: Vec<ListItem> = app
        .findings
        .iter()
        .map(|f| {
            let Some(detail) = knowledge_base::get_finding_detail(&f.code) else {
                return ListItem::new(Line::from(f.code.clone()));
            };

            let category_prefix = match detail.category {
                knowledge_base::FindingCategory::Dns => "[DNS] ",
                knowledge_base::FindingCategory::Mail => "[MAIL] ",
            };
            let title_style = match detail.severity {
                Severity::Critical => Style::default().fg(Color::Red),
                Severity::Warning => Style::default().fg(Color::Yellow),
                Severity::Info => Style::default().fg(Color::Cyan),
            };

            ListItem::new(Line::from(vec![
                Span::styled(category_prefix, Style::default().fg(Color::DarkGray)),
                Span::styled(detail.title, title_style),
            ]))
        })
        .collect();

    let findings_list = List::new(items)
        .block(Block::default())
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut list_state = ListState::default().with_selected(Some(app.selected_finding));
    frame.render_stateful_widget(findings_list, chunks[0], &mut list_state);

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    let detail = app
        .findings
        .get(app.selected_finding)
        .and_then(|f| knowledge_base::get_finding_detail(&f.code));
    match detail {
        Some(detail) => {
            let text = vec![
                Line::from(""),
                Line::from("WHAT IT IS:".yellow().bold()),
                Line::from(detail.description),
                Line::from(""),
                Line::from("HOW TO FIX:".yellow().bold()),
                Line::from(detail.remediation),
                Line::from(""),
                Line::from(vec![
                    Span::styled("READ MORE: ", Style::new().yellow().bold()),
                    Span::styled(detail.reference, Style::default().fg(Color::Cyan)),
                ]),
            ];
            let p = Paragraph::new(text).wrap(Wrap { trim: true }).block(detail_block);
            frame.render_widget(p, chunks[1]);
        }
        None => {
            let p = Paragraph::new("Select an item above to see details.")
                .alignment(Alignment::Center)
                .block(detail_block);
            frame.render_widget(p, chunks[1]);
        }
    }
}
