mod canvas;
mod config;
mod data;
mod error;
mod host;
mod interaction;
mod layer;
mod palette;
mod popup;
mod state;
mod style;
mod ui;

use std::{
    env,
    fs::File,
    io::{self, IsTerminal},
    sync::Mutex,
    time::Duration,
};

use anyhow::{Context, Result};
use config::{AtlasConfig, Invocation, USAGE};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = match AtlasConfig::from_args(&args)? {
        Invocation::Run(config) => config,
        Invocation::Help => {
            println!("{USAGE}");
            return Ok(());
        }
    };
    init_logging(&config)?;

    if !interactive_terminal() {
        warn!("no interactive terminal, map not started");
        eprintln!("egypt-atlas needs an interactive terminal");
        return Ok(());
    }

    let mut state = AppState::new(config);
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut state);

    state.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    result
}

fn run<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    state: &mut AppState,
) -> Result<()> {
    loop {
        state.tick();
        terminal.draw(|f| ui::draw(f, state))?;
        state.after_draw();

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) => {
                    if state.handle_input(code) {
                        return Ok(());
                    }
                }
                Event::Mouse(m) => state.handle_mouse(m.kind, m.column, m.row),
                _ => {}
            }
        }
    }
}

/// Interactive rendering needs a real terminal that can do cursor addressing.
fn interactive_terminal() -> bool {
    io::stdout().is_terminal() && env::var("TERM").map_or(true, |t| t != "dumb")
}

/// Logs go to a file; the terminal belongs to the map.
fn init_logging(config: &AtlasConfig) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("cannot create log file {}", config.log_file.display()))?;
    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    info!(dataset = %config.dataset.display(), zoom = config.zoom, "egypt-atlas starting");
    Ok(())
}
