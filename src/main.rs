mod app;
mod cli;
mod finder;
mod model;
mod msg;
mod store;

use std::io;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use app::{App, SAVED_BANNER};
use cli::{Cli, Commands};
use finder::Finder;
use model::config::AppConfig;
use model::spinner::SPINNER_INTERVAL;
use model::state::NoteState;
use msg::{Cmd, Msg};
use store::NoteStore;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit.
    let _guard = init_logging()?;
    tracing::info!(command = ?cli.command, "yawn starting");

    let config = match cli.command {
        Commands::Version => {
            println!("{}", cli::version());
            return Ok(());
        }
        Commands::New | Commands::Find => AppConfig::load(cli.config.as_deref())?,
    };
    let store = NoteStore::new(config.note_location());

    let app = if cli.command == Commands::Find {
        open_with_finder(&Finder::new(store.dir(), &config.finder), &store)?
    } else {
        println!("Adding a new note");
        App::new()
    };

    let state = run_session(app, store)?;
    if state == NoteState::SaveSuccess {
        println!("{SAVED_BANNER}");
    }

    Ok(())
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // Initialize logging to file (never stdout)
    let log_dir = directories::ProjectDirs::from("", "", "yawn")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "yawn.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("yawn=info"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .init();

    Ok(guard)
}

/// Let the user pick a note and load it. Any failure here happens before
/// a session exists.
fn open_with_finder(finder: &Finder, store: &NoteStore) -> Result<App> {
    ensure!(
        finder.dir().is_dir(),
        "notes directory {} does not exist yet, create a note first",
        finder.dir().display()
    );
    let path = finder.select_note().context("error searching note")?;
    let record = store.load(&path).context("error reading note")?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(App::from_record(&record, file_name))
}

fn run_session(app: App, store: NoteStore) -> Result<NoteState> {
    chain_panic_hook(|| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    });

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, app, store);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Run `restore` before the current panic hook, so a panic message lands
/// on a usable terminal.
fn chain_panic_hook(restore: impl Fn() + Send + Sync + 'static) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    store: NoteStore,
) -> Result<NoteState> {
    let (tx, rx) = mpsc::channel::<Msg>();

    // Input thread — reads terminal events and forwards as Msg
    let tx_input = tx.clone();
    thread::spawn(move || {
        loop {
            if let Ok(event) = event::read() {
                let msg = match event {
                    Event::Key(k) if k.kind != KeyEventKind::Release => Msg::Key(k),
                    Event::Resize(w, h) => Msg::Resize(w, h),
                    _ => continue,
                };
                if tx_input.send(msg).is_err() {
                    break;
                }
            }
        }
    });

    // Tick thread — drives the progress spinner
    let tx_tick = tx.clone();
    thread::spawn(move || {
        loop {
            thread::sleep(SPINNER_INTERVAL);
            if tx_tick.send(Msg::Tick).is_err() {
                break;
            }
        }
    });

    terminal.draw(|f| app.view(f))?;

    // ── Main event loop ──
    loop {
        // Batch-drain all pending messages
        let mut batch = vec![rx.recv()?];
        while let Ok(msg) = rx.try_recv() {
            batch.push(msg);
        }

        for msg in msg::prioritize(batch) {
            for cmd in app.update(msg) {
                spawn_cmd(cmd, &store, tx.clone());
            }
            if app.state.is_terminal() {
                break;
            }
        }

        terminal.draw(|f| app.view(f))?;

        if app.state.is_terminal() {
            tracing::info!(state = app.state.label(), "session finished");
            return Ok(app.state);
        }
    }
}

/// Run a command on a worker thread; its completion comes back as a Msg.
fn spawn_cmd(cmd: Cmd, store: &NoteStore, tx: mpsc::Sender<Msg>) {
    let store = store.clone();
    thread::spawn(move || {
        let msg = cmd.run(&store);
        if tx.send(msg).is_err() {
            tracing::warn!("event loop gone before command completed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn panic_hook_runs_terminal_restore() {
        let restored = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&restored);
        chain_panic_hook(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let result = thread::spawn(|| panic!("boom")).join();
        // Back to the default hook for the rest of the test binary.
        let _ = std::panic::take_hook();

        assert!(result.is_err());
        assert!(restored.load(Ordering::SeqCst) >= 1);
    }
}
