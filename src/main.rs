//! weatherdash - current weather, hourly and daily forecasts in the terminal
//!
//! A terminal UI that queries a weather backend for a city and shows the
//! current conditions, a map, the hourly outlook and a 30-day forecast over a
//! background that follows the weather.

use std::io;
use std::panic;
use std::process;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};

use weatherdash::app::App;
use weatherdash::cli::{Cli, CliError, StartupConfig};
use weatherdash::config::Config;
use weatherdash::data::BackendClient;
use weatherdash::{logging, ui};

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Merges the config file and CLI arguments
fn startup_config(cli: &Cli) -> Result<StartupConfig, CliError> {
    let config = Config::load(cli.config.as_deref())?;
    StartupConfig::from_cli(cli, config)
}

/// Draws, handles input and applies fetch outcomes until the user quits
fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.dispatch_pending();
        app.poll_outcomes();

        terminal.draw(|f| ui::render(f, app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        app.on_tick();

        if app.should_quit {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let startup = match startup_config(&cli) {
        Ok(startup) => startup,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };

    logging::init_or_warn(startup.log_file.as_deref());

    let client = match startup.request_timeout {
        Some(timeout) => BackendClient::with_timeout(startup.backend_url.clone(), timeout)?,
        None => BackendClient::new(startup.backend_url.clone()),
    };
    tracing::info!(
        backend = client.base_url(),
        city = %startup.city,
        effects = startup.effects,
        "starting weatherdash"
    );

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(client, &startup);

    // Load the startup city right away
    app.submit_query();

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    tracing::info!("exiting");
    result
}
