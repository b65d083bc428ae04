//! revnav: terminal navigator for change view URLs of a code review client.
//!
//! Decodes a change URL into a view state, lets the user walk that state from the
//! keyboard, and shows the encoded URL together with every publication of the
//! change view model. Visited locations are kept in a SQLite history so the last
//! one can be reopened. The TUI draws on stderr; on exit the current URL is printed
//! to stdout, so `revnav` composes with shell pipelines.
//!
//! # Startup sequence
//!
//! 1. Parse the CLI, load config, install logging. All of this happens before
//!    the terminal is touched, so errors still print normally.
//! 2. Open the history database and resolve the session.
//! 3. Register the shutdown signals, then `tui::enter()`.
//! 4. Spawn the event task and subscribe the model to the event channel.
//!
//! `tui::leave()` runs after the event loop exits by any route other than a panic;
//! the panic hook installed by `tui::enter()` covers that one.

mod app;
mod config;
mod event;
mod history;
mod logging;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;

use clap::Parser;
use revnav_core::{ChangeViewModel, db};

use crate::app::{AppState, ViewCommand};
use crate::config::Config;
use crate::event::AppEvent;
use crate::history::HistoryWriter;
use crate::ui::keybindings::{self, KeyAction};

#[derive(Debug, Parser)]
#[command(name = "revnav", version, about = "Navigate change view URLs in the terminal")]
struct Cli {
    /// Change URL to open. Defaults to the last visited location.
    url: Option<String>,

    /// Config file. Defaults to `$XDG_CONFIG_HOME/revnav/config.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path prefix of the review server; overrides `base_url` from the config.
    #[arg(long, value_name = "PREFIX")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = match Config::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    let _log_guard = logging::init(&config.log)?;
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "using default configuration");
        eprintln!("revnav: {e}");
    }
    let theme = theme::Theme::from_name(&config.theme);

    if let Some(parent) = config.history_db.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let history_path = config.history_db.to_string_lossy().into_owned();
    let conn = db::open_db(&history_path).await.map_err(std::io::Error::other)?;
    let session = db::detect_or_create_session(&conn, &config.base_url)
        .await
        .map_err(std::io::Error::other)?;
    tracing::info!(session = %session.id, base_url = %config.base_url, "session ready");

    let initial_url = match cli.url {
        Some(url) => Some(url),
        None => db::last_visit(&conn, &session.id)
            .await
            .map_err(std::io::Error::other)?
            .map(|visit| visit.url),
    };

    let shutdown = tui::ShutdownFlag::register()?;
    let mut terminal = tui::enter()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let tx = handler.tx;
    let mut rx = handler.rx;

    let mut model = ChangeViewModel::new(config.base_url.clone());
    let emission_tx = tx.clone();
    model.subscribe(move |state| {
        let _ = emission_tx.send(AppEvent::ViewState(state.cloned()));
    });
    let mut state = AppState::new(config.base_url.clone());
    let history = HistoryWriter::spawn(
        conn.clone(),
        session.id.clone(),
        config.base_url.clone(),
        tx.clone(),
    );

    if let Some(url) = initial_url {
        let _ = tx.send(AppEvent::Navigate(url));
    }

    let mut deferred_pending = false;

    'event_loop: loop {
        tokio::select! {
            // Heartbeat so a shutdown signal is noticed even when no other event arrives.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if shutdown.is_set() {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        terminal.draw(|frame| ui::render(frame, &mut state, &model, &theme))?;
                    }
                    Some(AppEvent::Key(key)) => match keybindings::handle_key(key, &mut state) {
                        KeyAction::Continue => {}
                        KeyAction::Command(command) => run_command(&mut model, &mut state, command),
                        KeyAction::Quit => break 'event_loop,
                    },
                    Some(AppEvent::Mouse(mouse)) => keybindings::handle_mouse(mouse, &mut state),
                    // The next Render picks up the new size from `frame.area()`.
                    Some(AppEvent::Resize(_, _)) => {}
                    Some(AppEvent::Tick) => state.tick(),
                    Some(AppEvent::ViewState(published)) => {
                        if let Some(snapshot) = &published {
                            history.record(snapshot);
                        }
                        state.record_emission(published);
                    }
                    Some(AppEvent::Deferred) => {
                        deferred_pending = false;
                        let published = model.run_deferred();
                        tracing::debug!(published, "ran deferred model work");
                    }
                    Some(AppEvent::Navigate(url)) => {
                        run_command(&mut model, &mut state, ViewCommand::Navigate(url));
                    }
                    Some(AppEvent::Status(text)) => state.set_status(text, true),
                    None => break 'event_loop,
                }

                // Deferred work goes to the back of the queue, behind every emission
                // the model has already sent.
                if model.has_deferred() && !deferred_pending {
                    deferred_pending = tx.send(AppEvent::Deferred).is_ok();
                }

                if shutdown.is_set() {
                    break 'event_loop;
                }
            }
        }
    }

    tui::leave()?;

    let written = history.finish().await;
    tracing::debug!(written, "history flushed");
    if let Err(e) = db::update_session_timestamp(&conn, &session.id).await {
        tracing::warn!(error = %e, "could not update session timestamp");
    }
    if let Some(url) = state.current_url() {
        println!("{url}");
    }
    Ok(())
}

/// Applies `command` to the model, reporting failures on the status bar.
fn run_command(model: &mut ChangeViewModel, state: &mut AppState, command: ViewCommand) {
    if let Err(e) = app::apply_command(model, command) {
        tracing::info!(error = %e, "view command rejected");
        state.set_status(e.to_string(), true);
    }
}
