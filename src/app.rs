//! Application state management for weatherdash
//!
//! This module contains the main application state: keyboard handling, the
//! city query being edited, forecast selection and scrolling. Network calls
//! are started as background tasks and their outcomes come back through a
//! channel that the event loop drains on every frame.

use chrono::{Local, Timelike, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::cli::StartupConfig;
use crate::controller::{run_city, run_day, CityTicket, Dashboard, DayTicket, FetchOutcome};
use crate::data::BackendClient;
use crate::theme::Theme;

/// Upper bound for the scroll offset; the renderer clamps to the content
const MAX_SCROLL: u16 = 200;

/// Whether keys edit the city query or drive the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// A started fetch waiting to be spawned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    City(CityTicket),
    Day(DayTicket),
}

/// Main application struct managing state and data
pub struct App {
    /// Weather state rendered by the view
    pub dashboard: Dashboard,
    /// City query shown in the search bar
    pub query: String,
    /// Current input mode
    pub input_mode: InputMode,
    /// Index of the highlighted forecast day
    pub selected_day: usize,
    /// Scroll offset of the dashboard body
    pub scroll_offset: u16,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Whether weather particles are drawn
    pub effects_enabled: bool,
    /// Animation frame counter
    pub tick: u64,
    client: BackendClient,
    pending: Vec<Request>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl App {
    /// Creates a new App talking to `client`, with the query preset to the
    /// startup city.
    pub fn new(client: BackendClient, startup: &StartupConfig) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            dashboard: Dashboard::new(),
            query: startup.city.clone(),
            input_mode: InputMode::Normal,
            selected_day: 0,
            scroll_offset: 0,
            show_help: false,
            should_quit: false,
            effects_enabled: startup.effects,
            tick: 0,
            client,
            pending: Vec::new(),
            outcome_tx,
            outcome_rx,
        }
    }

    /// Number of started fetches not yet handed to the runtime
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Starts a city fetch for the current query.
    ///
    /// A blank query only sets the validation error.
    pub fn submit_query(&mut self) {
        if let Ok(ticket) = self.dashboard.begin_fetch_weather(&self.query) {
            self.query = ticket.city.clone();
            self.selected_day = 0;
            self.scroll_offset = 0;
            self.pending.push(Request::City(ticket));
        }
    }

    /// Re-fetches the city currently on screen, or the query if nothing
    /// has loaded yet.
    pub fn refresh(&mut self) {
        if let Some(city) = self.dashboard.active_city() {
            self.query = city.to_string();
        }
        self.submit_query();
    }

    /// Starts the hourly fetch for the highlighted forecast day.
    pub fn load_selected_day(&mut self) {
        let Some(city) = self.dashboard.active_city().map(str::to_string) else {
            return;
        };
        let Some(date) = self
            .dashboard
            .forecast()
            .get(self.selected_day)
            .map(|day| day.date.clone())
        else {
            return;
        };

        if let Ok(ticket) = self.dashboard.begin_fetch_hourly_for_day(&city, &date) {
            self.pending.push(Request::Day(ticket));
        }
    }

    /// Spawns every started fetch on the tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn dispatch_pending(&mut self) {
        for request in self.pending.drain(..) {
            let client = self.client.clone();
            let tx = self.outcome_tx.clone();
            tokio::spawn(async move {
                let outcome = match request {
                    Request::City(ticket) => run_city(&client, ticket).await,
                    Request::Day(ticket) => run_day(&client, ticket).await,
                };
                // Receiver only goes away on shutdown
                let _ = tx.send(outcome);
            });
        }
    }

    /// Applies every outcome that has arrived. Returns how many were drained.
    pub fn poll_outcomes(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.dashboard.apply(outcome, Utc::now());
            drained += 1;
        }
        if drained > 0 {
            self.clamp_selection();
        }
        drained
    }

    /// Advances the animation by one frame
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Hour on this machine, used for the theme before any city has loaded
    pub fn fallback_hour(&self) -> u8 {
        Local::now().hour() as u8
    }

    /// Theme for the current weather
    pub fn theme(&self) -> Theme {
        self.dashboard.theme(self.fallback_hour())
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// Normal mode:
    /// - `/` or `e`: Edit the city query
    /// - `Enter`: Load hourly forecast for the highlighted day
    /// - `Left`/`h`, `Right`/`l`: Move the forecast selection
    /// - `Up`/`k`, `Down`/`j`: Scroll
    /// - `g`/`G`: Scroll to top / bottom
    /// - `r`: Re-fetch the current city
    /// - `c`: Close the selected-day panel
    /// - `?`: Toggle help
    /// - `q` or `Esc`: Quit
    ///
    /// Editing mode:
    /// - characters edit the query, `Backspace` deletes
    /// - `Enter` submits, `Esc` stops editing
    ///
    /// `Ctrl-C` quits from anywhere.
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.modifiers.contains(KeyModifiers::CONTROL)
            && key_event.code == KeyCode::Char('c')
        {
            self.should_quit = true;
            return;
        }

        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        match self.input_mode {
            InputMode::Editing => match key_event.code {
                KeyCode::Enter => {
                    self.input_mode = InputMode::Normal;
                    self.submit_query();
                }
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                }
                KeyCode::Backspace => {
                    self.query.pop();
                }
                KeyCode::Char(c) => {
                    self.query.push(c);
                }
                _ => {}
            },
            InputMode::Normal => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Char('/') | KeyCode::Char('e') => {
                    self.input_mode = InputMode::Editing;
                }
                KeyCode::Enter => {
                    self.load_selected_day();
                }
                KeyCode::Left | KeyCode::Char('h') => {
                    self.move_selection_left();
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    self.move_selection_right();
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.scroll_up();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.scroll_down();
                }
                KeyCode::Char('g') => {
                    self.scroll_offset = 0;
                }
                KeyCode::Char('G') => {
                    self.scroll_offset = MAX_SCROLL;
                }
                KeyCode::Char('r') => {
                    self.refresh();
                }
                KeyCode::Char('c') => {
                    self.dashboard.close_selected_day();
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
        }
    }

    /// Moves the forecast selection left, wrapping to the last day
    fn move_selection_left(&mut self) {
        let count = self.dashboard.forecast().len();
        if count == 0 {
            return;
        }
        self.selected_day = if self.selected_day == 0 {
            count - 1
        } else {
            self.selected_day - 1
        };
    }

    /// Moves the forecast selection right, wrapping to the first day
    fn move_selection_right(&mut self) {
        let count = self.dashboard.forecast().len();
        if count == 0 {
            return;
        }
        self.selected_day = (self.selected_day + 1) % count;
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.scroll_offset < MAX_SCROLL {
            self.scroll_offset += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.dashboard.forecast().len();
        if self.selected_day >= count {
            self.selected_day = count.saturating_sub(1);
        }
    }
}
