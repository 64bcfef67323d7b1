mod app;
mod config;
mod logging;
mod portal;
mod session;
mod ui;

use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::handler;
use crate::app::state::AppState;
use crate::config::{expand_home, SessionCheckMode};
use crate::portal::captcha::CaptchaStore;
use crate::portal::client::PortalClient;
use crate::portal::manager::PortalManager;
use crate::session::{FileStore, MemoryStore, Session, SessionStore};
use anyhow::{Context, Result};
use crossterm::{
    event::EventStream,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::prelude::*;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    // Install panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    // Load config
    let cfg = config::load_config()?;
    if let Err(e) = logging::init(&cfg.logging) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    let client = PortalClient::new(&cfg.portal).context("Failed to build HTTP client")?;
    tracing::info!(base_url = %cfg.portal.base_url, mode = ?cfg.portal.session_check, "portal configured");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, cfg, client).await;

    // Restore terminal
    restore_terminal()?;

    if let Err(e) = result {
        tracing::error!(error = %e, "exiting on error");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("portaldash exiting");
    Ok(())
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

fn session_store(cfg: &config::AppConfig) -> Box<dyn SessionStore> {
    match cfg.portal.session_check {
        SessionCheckMode::Stored => Box::new(FileStore::new(expand_home(&cfg.session.file))),
        SessionCheckMode::Backend => Box::new(MemoryStore::default()),
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cfg: config::AppConfig,
    client: PortalClient,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let portal = PortalManager::new(
        Arc::new(client),
        CaptchaStore::new(&cfg.captcha),
        event_tx.clone(),
    );
    let session = Session::new(session_store(&cfg));
    let mut state = AppState::new(cfg, session);

    // Spawn terminal input task
    let term_tx = event_tx.clone();
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        loop {
            match reader.next().await {
                Some(Ok(event)) => {
                    if term_tx.send(AppEvent::Terminal(event)).is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "terminal input failed");
                    break;
                }
                None => break,
            }
        }
    });

    // Spawn tick task (20 FPS = 50ms)
    let tick_tx = event_tx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_millis(50));
        loop {
            interval.tick().await;
            if tick_tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });
    drop(event_tx);

    let actions = handler::initialize(&mut state);
    dispatch(&portal, &mut state, actions);

    // Initial render
    terminal.draw(|f| ui::render(f, &state))?;
    state.dirty = false;

    // Main event loop
    while !state.should_quit {
        let Some(event) = event_rx.recv().await else {
            break;
        };

        let actions = handler::handle_event(&mut state, event);
        dispatch(&portal, &mut state, actions);

        // Conditional render (only if dirty)
        if state.dirty && !state.should_quit {
            terminal.draw(|f| ui::render(f, &state))?;
            state.dirty = false;
        }
    }

    Ok(())
}

fn dispatch(portal: &PortalManager, state: &mut AppState, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::CheckSession { session } => portal.check_session(session),
            Action::StartLogin => portal.start_login(),
            Action::SubmitLogin(payload) => portal.submit_login(payload),
            Action::FetchSection { section, session } => portal.fetch_section(section, session),
            Action::Logout { session } => portal.logout(session),
            Action::OpenCaptcha { path } => {
                if let Err(e) = portal.open_captcha(&path) {
                    tracing::warn!(error = %e, path = %path.display(), "failed to open captcha");
                    state.error(format!("Could not open CAPTCHA: {}", e));
                }
            }
            Action::Quit => state.should_quit = true,
        }
    }
}
