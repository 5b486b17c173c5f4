// src/main.rs

use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::mpsc;

mod app;
mod core;
mod logging;
mod ui;

use app::{App, AppState};
use crate::core::models::{AuditUpdate, LogEvent, LogLevel, Reporter};
use crate::core::providers::ProviderRegistry;

struct AuditHandles {
    registry: Arc<ProviderRegistry>,
    client: reqwest::Client,
    tx: mpsc::UnboundedSender<AuditUpdate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut app = App::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = reqwest::Client::builder()
        .user_agent(concat!("PalisadeRS/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let handles = AuditHandles {
        registry: Arc::new(ProviderRegistry::standard(client.clone())),
        client,
        tx,
    };

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(&mut app, &handles)?;
        } else {
            app.on_tick();
        }

        while let Ok(update) = rx.try_recv() {
            app.apply_update(update);
        }
    }

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    Ok(())
}

fn handle_events(app: &mut App, handles: &AuditHandles) -> Result<()> {
    if let Event::Key(key) = event::read()?
        && key.kind == KeyEventKind::Press
    {
        // Keys that work in every state.
        match key.code {
            KeyCode::F(3) => {
                app.show_logs = !app.show_logs;
                return Ok(());
            }
            _ => {}
        }
        match app.state {
            AppState::Idle => handle_idle_input(app, key.code, handles),
            AppState::Finished => handle_finished_input(app, key.code),
            AppState::Auditing => {
                if key.code == KeyCode::Char('q') {
                    app.quit();
                }
            }
        }
    }
    Ok(())
}

fn handle_idle_input(app: &mut App, key_code: KeyCode, handles: &AuditHandles) {
    match key_code {
        // 'q' quits only while the input line is empty, so domains
        // like qq.com stay typeable.
        KeyCode::Char('q') if app.input.is_empty() => app.quit(),
        KeyCode::Tab => app.config.mode = app.config.mode.cycle(),
        KeyCode::F(2) => app.config.fast_mode = !app.config.fast_mode,
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => start_audit(app, handles),
        _ => {}
    }
}

fn start_audit(app: &mut App, handles: &AuditHandles) {
    let domain = match crate::core::audit::normalize_domain(&app.input) {
        Ok(domain) => domain,
        Err(e) => {
            app.log.push(LogEvent {
                level: LogLevel::Error,
                message: e.to_string(),
                timestamp: chrono::Local::now(),
            });
            return;
        }
    };

    app.generation += 1;
    app.state = AppState::Auditing;
    let reporter = Reporter::new(handles.tx.clone(), app.generation);
    let registry = Arc::clone(&handles.registry);
    let client = handles.client.clone();
    let config = app.config;

    tokio::spawn(async move {
        crate::core::audit::run_audit(registry, client, config, domain, reporter).await;
    });
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('n') => app.reset(),
        KeyCode::Up => app.select_previous_finding(),
        KeyCode::Down => app.select_next_finding(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_handles() -> AuditHandles {
        let (tx, _rx) = mpsc::unbounded_channel();
        let client = reqwest::Client::new();
        AuditHandles {
            registry: Arc::new(ProviderRegistry::standard(client.clone())),
            client,
            tx,
        }
    }

    #[test]
    fn typing_q_into_a_domain_does_not_quit() {
        let mut app = App::new();
        let handles = test_handles();

        for c in "qq.com".chars() {
            handle_idle_input(&mut app, KeyCode::Char(c), &handles);
        }

        assert!(!app.should_quit);
        assert_eq!(app.input, "qq.com");
    }

    #[test]
    fn q_on_an_empty_input_line_still_quits() {
        let mut app = App::new();
        let handles = test_handles();

        handle_idle_input(&mut app, KeyCode::Char('q'), &handles);

        assert!(app.should_quit);
        assert!(app.input.is_empty());
    }
}
