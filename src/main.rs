//! kadmin-consumer: drive kadmin consumer sessions from the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────────┐ SessionEvent ┌──────────┐  draw()  ┌──────────┐
//! │ session tasks │ ───────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (tokio)       │  (channel)   │ (state)  │          │ (render) │
//! └───────────────┘              └──────────┘          └──────────┘
//!         ▲                        ▲      │ Command
//!         │ spawn                  │      ▼
//! ┌───────────────┐         ┌──────────┐ dispatch()
//! │  controller   │ ◄────── │ input.rs │
//! └───────────────┘         └──────────┘
//! ```
//!
//! * **`api/`**: the `ConsumerApi` trait, the reqwest implementation and
//!   the wire types.
//! * **`session/`**: config validation, the refresh timer and the session
//!   state machine.
//! * **`catalog`**: background loads of topics and deserializers.
//! * **`form`**: the editable configuration form.
//! * **`app`**: owns all UI state and implements `SessionUi`.
//! * **`ui`**: pure rendering of `App` state.
//! * **`input`**: maps key events to `App` mutations and commands.
//! * **`main`**: wires everything together. Parses args, sets up logging and
//!   the terminal, and runs the event loop.

mod api;
mod app;
mod catalog;
mod config;
mod error;
mod form;
mod input;
mod logging;
mod session;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use api::{ConsumerApi, HttpApi};
use app::App;
use catalog::CatalogLoader;
use config::{BrowseArgs, Cli, Command};
use input::Command as UiCommand;
use logging::LogTarget;
use session::SessionController;

/// Input poll interval; also bounds how late a session event is drawn.
const TICK_RATE: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Raw mode and the alternate screen for as long as the value lives.
///
/// Dropping it (normally or while unwinding) restores the terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints the panic.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.action();

    let target = match (&command, &cli.log_file) {
        (Command::Browse(_), Some(path)) => LogTarget::File(path.clone()),
        (Command::Browse(_), None) => LogTarget::default_file(),
        _ => LogTarget::Stderr,
    };
    logging::init(&target)?;

    let http = HttpApi::new(&cli.api_url, cli.timeout())?;
    let base = http.base().clone();
    let api: Arc<dyn ConsumerApi> = Arc::new(http);
    info!(api = %base, "starting");

    match command {
        Command::Browse(args) => browse(api, base, args).await,
        Command::Topics { source_url } => {
            for topic in api.list_topics(source_url.as_deref()).await? {
                println!("{topic}");
            }
            Ok(())
        }
        Command::Deserializers => {
            for d in api.list_deserializers().await? {
                println!("{:<24} {}", d.id, d.name);
            }
            Ok(())
        }
        Command::Consumers => {
            for c in api.list_consumers().await? {
                println!(
                    "{:<40} {:<24} {:<16} total={:<6} queue={:<3} last used {}",
                    c.consumer_group_id,
                    c.topic,
                    c.deserializer_id,
                    c.total,
                    c.queue_size,
                    format_millis(c.last_used_time),
                );
            }
            Ok(())
        }
    }
}

fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".into())
}

async fn browse(api: Arc<dyn ConsumerApi>, base: reqwest::Url, args: BrowseArgs) -> Result<()> {
    install_panic_hook();

    let (mut controller, mut session_rx) = SessionController::new(Arc::clone(&api));
    let (catalog, mut catalog_rx) = CatalogLoader::new(api);
    let mut app = App::new(args.form_values(), base);

    app.dispatch(UiCommand::ReloadCatalog, &mut controller, &catalog);
    if args.autostart() {
        app.dispatch(UiCommand::Submit, &mut controller, &catalog);
    }

    let mut guard = TerminalGuard::new()?;

    // Each tick:
    //   1. Feed finished session work and catalog loads into the app.
    //   2. Render.
    //   3. Wait up to TICK_RATE for a key; spawned tasks keep running on the
    //      runtime's worker threads meanwhile.
    let result: Result<()> = loop {
        while let Ok(event) = session_rx.try_recv() {
            controller.handle_event(event, &mut app);
        }
        while let Ok(msg) = catalog_rx.try_recv() {
            app.apply_catalog(msg);
        }

        if let Err(e) = guard.terminal.draw(|f| ui::draw(&mut app, f)) {
            break Err(e.into());
        }

        match tokio::task::block_in_place(|| event::poll(TICK_RATE)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(command) = input::handle_key_event(&mut app, key) {
                        app.dispatch(command, &mut controller, &catalog);
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        if app.quit {
            break Ok(());
        }
    };

    drop(guard);
    controller.shutdown(&mut session_rx).await;
    info!("exiting");
    result
}
