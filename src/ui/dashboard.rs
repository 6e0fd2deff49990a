//! Dashboard screen UI
//!
//! Renders the header, search bar, error banner and the scrollable body:
//! current conditions, map, hourly strip, forecast grid and the hourly
//! breakdown of the selected day.

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::data::{ForecastDay, HourlyEntry, WeatherSnapshot};
use crate::theme::{Condition, Theme, WeatherIcon};
use crate::ui::effects::Veil;
use crate::ui::map::{tile_url, LocationMap, TILE_ZOOM};
use crate::ui::widgets::TemperatureSparkline;

/// Braille spinner frames
const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Width of one hourly column
const HOUR_COLUMN: usize = 9;
/// Minimum width of one forecast cell
const FORECAST_CELL: usize = 16;
/// Forecast cells per row on wide terminals
const FORECAST_MAX_COLUMNS: usize = 5;
/// Canvas rows of the map section
const MAP_CANVAS_ROWS: u16 = 10;
/// Most text rows the error banner grows to
const ERROR_MAX_ROWS: u16 = 4;

/// Text colors readable on the current background
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: &Theme) -> Self {
        // Snow and daylight skies are bright enough to need dark text
        let light = match theme.condition {
            Condition::Snow => true,
            Condition::ClearSky | Condition::Clouds | Condition::Unknown => theme.is_day,
            _ => false,
        };
        if light {
            Palette {
                primary: Color::Black,
                secondary: Color::Rgb(55, 65, 81),
                accent: Color::Rgb(30, 64, 175),
                error: Color::Rgb(153, 27, 27),
            }
        } else {
            Palette {
                primary: Color::White,
                secondary: Color::Rgb(209, 213, 219),
                accent: Color::Cyan,
                error: Color::LightRed,
            }
        }
    }

    fn veil(&self) -> Veil {
        if self.primary == Color::Black {
            Veil::new((255, 255, 255), 0.35)
        } else {
            Veil::new((0, 0, 0), 0.35)
        }
    }
}

/// One block of the scrollable body
enum Section {
    Text(Vec<Line<'static>>),
    /// Title line, canvas rows, then the coordinate/tile line and a gap
    Map {
        title: Line<'static>,
        footer: Line<'static>,
        lat: f64,
        lon: f64,
    },
}

impl Section {
    fn height(&self) -> u16 {
        match self {
            Section::Text(lines) => lines.len() as u16,
            Section::Map { .. } => MAP_CANVAS_ROWS + 3,
        }
    }
}

/// Renders the dashboard screen
pub fn render(frame: &mut Frame, app: &mut App, theme: &Theme) {
    let area = frame.area();
    let palette = Palette::for_theme(theme);

    let error_height = match app.dashboard.error() {
        Some(error) => {
            wrapped_rows(error, area.width.saturating_sub(2)).min(ERROR_MAX_ROWS) + 2
        }
        None => 0,
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),            // Header
            Constraint::Length(3),            // Search bar
            Constraint::Length(error_height), // Error banner
            Constraint::Min(0),               // Body (scrollable)
            Constraint::Length(1),            // Key hints
        ])
        .split(area);

    render_header(frame, chunks[0], &palette);
    render_search_bar(frame, chunks[1], app, &palette);
    if let Some(error) = app.dashboard.error() {
        render_error_banner(frame, chunks[2], error, &palette);
    }
    render_body(frame, chunks[3], app, &palette);
    render_key_hints(frame, chunks[4], app.input_mode, &palette);
}

fn render_header(frame: &mut Frame, area: Rect, palette: &Palette) {
    let title = Paragraph::new(Line::from(Span::styled(
        "Weather Prediction",
        Style::default()
            .fg(palette.primary)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, area);
}

fn render_search_bar(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let editing = app.input_mode == InputMode::Editing;
    let border = if editing { Color::Yellow } else { palette.accent };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            " City ",
            Style::default().fg(palette.primary).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(palette.veil(), area);
    frame.render_widget(block, area);

    let mut spans = vec![Span::styled(
        app.query.clone(),
        Style::default().fg(palette.primary),
    )];
    if editing {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    } else if app.query.is_empty() {
        spans.push(Span::styled(
            "Enter city name",
            Style::default().fg(palette.secondary),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);

    if app.dashboard.is_loading() && inner.width > 16 {
        let frame_index = (app.tick as usize) % SPINNER.len();
        let spinner = Paragraph::new(Line::from(vec![
            Span::styled(SPINNER[frame_index], Style::default().fg(Color::Yellow)),
            Span::styled(" Loading...", Style::default().fg(palette.secondary)),
        ]))
        .alignment(Alignment::Right);
        frame.render_widget(spinner, inner);
    }
}

fn render_error_banner(frame: &mut Frame, area: Rect, error: &str, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.error));
    let banner = Paragraph::new(Line::from(Span::styled(
        error.to_string(),
        Style::default().fg(palette.error).add_modifier(Modifier::BOLD),
    )))
    .block(block)
    .wrap(Wrap { trim: true });
    frame.render_widget(palette.veil(), area);
    frame.render_widget(banner, area);
}

/// Rows `text` takes when word-wrapped to `width` columns
fn wrapped_rows(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let mut rows = 1;
    let mut used = 0;
    for word in text.split_whitespace() {
        let len = word.chars().count();
        let needed = if used == 0 { len } else { used + 1 + len };
        if needed <= width {
            used = needed;
            continue;
        }
        if used > 0 {
            rows += 1;
        }
        // Words longer than a row are broken across rows
        rows += (len.saturating_sub(1) / width) as u16;
        used = (len - 1) % width + 1;
    }
    rows
}

fn render_key_hints(frame: &mut Frame, area: Rect, mode: InputMode, palette: &Palette) {
    let hints = match mode {
        InputMode::Editing => "Enter: search  Esc: cancel",
        InputMode::Normal => {
            "/: search  ←→: day  Enter: hourly  ↑↓: scroll  r: refresh  c: close day  ?: help  q: quit"
        }
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hints, Style::default().fg(palette.secondary))),
        area,
    );
}

fn render_body(frame: &mut Frame, area: Rect, app: &mut App, palette: &Palette) {
    let title = app
        .dashboard
        .snapshot()
        .map(|s| format!(" {} ", s.city))
        .unwrap_or_else(|| " Dashboard ".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.secondary))
        .title(Span::styled(
            title,
            Style::default().fg(palette.primary).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(palette.veil(), area);
    frame.render_widget(block, area);

    // One column of padding on each side
    let content_area = Rect {
        x: inner.x + 1,
        width: inner.width.saturating_sub(2),
        ..inner
    };
    if content_area.width == 0 || content_area.height == 0 {
        return;
    }

    let sections = build_sections(app, content_area.width as usize, palette);
    let content_height: u16 = sections.iter().map(Section::height).sum();

    // Clamp scroll offset to valid range
    let max_scroll = content_height.saturating_sub(content_area.height);
    if app.scroll_offset > max_scroll {
        app.scroll_offset = max_scroll;
    }
    let scroll_offset = app.scroll_offset;

    render_scrollable_content(frame, content_area, &sections, scroll_offset, palette);

    if scroll_offset > 0 {
        render_scroll_indicator_top(frame, content_area, palette);
    }
    if scroll_offset < max_scroll {
        render_scroll_indicator_bottom(frame, content_area, palette);
    }
}

/// Renders each section that intersects the visible window
fn render_scrollable_content(
    frame: &mut Frame,
    area: Rect,
    sections: &[Section],
    scroll_offset: u16,
    palette: &Palette,
) {
    let visible_start = scroll_offset;
    let visible_end = scroll_offset + area.height;

    let mut section_start = 0u16;
    for section in sections {
        let height = section.height();
        if let Some(visible_rect) =
            calculate_visible_rect(section_start, height, visible_start, visible_end, area)
        {
            let section_offset = scroll_offset.saturating_sub(section_start);
            match section {
                Section::Text(lines) => {
                    let paragraph = Paragraph::new(lines.clone()).scroll((section_offset, 0));
                    frame.render_widget(paragraph, visible_rect);
                }
                Section::Map {
                    title,
                    footer,
                    lat,
                    lon,
                } => {
                    render_map_section(
                        frame,
                        visible_rect,
                        section_offset,
                        title,
                        footer,
                        (*lat, *lon),
                        palette,
                    );
                }
            }
        }
        section_start += height;
    }
}

fn render_map_section(
    frame: &mut Frame,
    area: Rect,
    section_offset: u16,
    title: &Line<'static>,
    footer: &Line<'static>,
    (lat, lon): (f64, f64),
    palette: &Palette,
) {
    let mut lines = vec![title.clone()];
    lines.extend((0..MAP_CANVAS_ROWS).map(|_| Line::default()));
    lines.push(footer.clone());
    lines.push(Line::default());
    frame.render_widget(Paragraph::new(lines).scroll((section_offset, 0)), area);

    // Canvas occupies section rows 1..=MAP_CANVAS_ROWS
    let canvas_first = 1u16;
    let canvas_last = MAP_CANVAS_ROWS;
    let first_visible = section_offset.max(canvas_first);
    let last_visible = (section_offset + area.height).saturating_sub(1).min(canvas_last);
    if first_visible > last_visible {
        return;
    }
    let canvas_area = Rect {
        x: area.x,
        y: area.y + (first_visible - section_offset),
        width: area.width.min(60),
        height: last_visible - first_visible + 1,
    };
    frame.render_widget(
        LocationMap::new(lat, lon).outline(palette.accent),
        canvas_area,
    );
}

/// Calculates the visible rectangle for a section given scroll offset
fn calculate_visible_rect(
    section_start: u16,
    section_height: u16,
    visible_start: u16,
    visible_end: u16,
    area: Rect,
) -> Option<Rect> {
    let section_end = section_start + section_height;

    if section_end <= visible_start || section_start >= visible_end {
        return None;
    }

    let visible_section_start = section_start.max(visible_start);
    let visible_section_end = section_end.min(visible_end);
    let visible_height = visible_section_end.saturating_sub(visible_section_start);
    if visible_height == 0 {
        return None;
    }

    let y_in_area = section_start.saturating_sub(visible_start);
    Some(Rect {
        x: area.x,
        y: area.y + y_in_area,
        width: area.width,
        height: visible_height,
    })
}

fn render_scroll_indicator_top(frame: &mut Frame, area: Rect, palette: &Palette) {
    if area.width < 10 {
        return;
    }
    let indicator_area = Rect {
        x: area.x + area.width.saturating_sub(8),
        y: area.y,
        width: 8,
        height: 1,
    };
    let indicator = Span::styled("\u{25B2} more", Style::default().fg(palette.secondary));
    frame.render_widget(Paragraph::new(Line::from(indicator)), indicator_area);
}

fn render_scroll_indicator_bottom(frame: &mut Frame, area: Rect, palette: &Palette) {
    if area.width < 10 || area.height == 0 {
        return;
    }
    let indicator_area = Rect {
        x: area.x + area.width.saturating_sub(8),
        y: area.y + area.height.saturating_sub(1),
        width: 8,
        height: 1,
    };
    let indicator = Span::styled("\u{25BC} more", Style::default().fg(palette.secondary));
    frame.render_widget(Paragraph::new(Line::from(indicator)), indicator_area);
}

fn build_sections(app: &App, width: usize, palette: &Palette) -> Vec<Section> {
    let dashboard = &app.dashboard;
    let mut sections = vec![Section::Text(build_current_lines(
        dashboard.snapshot(),
        dashboard.local_clock(Utc::now()),
        palette,
    ))];

    let map_title = section_title("Map Location", palette);
    match dashboard.snapshot() {
        Some(snapshot) => sections.push(Section::Map {
            title: map_title,
            footer: Line::from(vec![
                Span::styled(
                    format!("Lat {:.2}, Lon {:.2}  ", snapshot.lat, snapshot.lon),
                    Style::default().fg(palette.primary),
                ),
                Span::styled(
                    tile_url(snapshot.lat, snapshot.lon, TILE_ZOOM),
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ]),
            lat: snapshot.lat,
            lon: snapshot.lon,
        }),
        None => sections.push(Section::Text(vec![
            map_title,
            placeholder("Loading map...", palette),
            Line::default(),
        ])),
    }

    let mut hourly = vec![section_title(
        "Hourly Weather (Past 12 Hours + Next 12 Hours)",
        palette,
    )];
    if dashboard.hourly().is_empty() {
        hourly.push(placeholder("Loading hourly weather...", palette));
        hourly.push(Line::default());
    } else {
        hourly.extend(build_hourly_strip(
            dashboard.hourly(),
            width,
            true,
            dashboard.local_hour(),
            palette,
        ));
    }
    sections.push(Section::Text(hourly));

    let mut forecast = vec![section_title("30-Day Forecast", palette)];
    if dashboard.forecast().is_empty() {
        forecast.push(placeholder("Loading forecast...", palette));
        forecast.push(Line::default());
    } else {
        forecast.extend(build_forecast_grid(
            dashboard.forecast(),
            app.selected_day,
            width,
            palette,
        ));
    }
    sections.push(Section::Text(forecast));

    if let Some(date) = dashboard.selected_date() {
        let mut day = vec![section_title(&format!("Hourly Forecast for {date}"), palette)];
        if dashboard.selected_day_hourly().is_empty() {
            day.push(placeholder("No hourly data for this day", palette));
            day.push(Line::default());
        } else {
            day.extend(build_hourly_strip(
                dashboard.selected_day_hourly(),
                width,
                false,
                None,
                palette,
            ));
        }
        sections.push(Section::Text(day));
    }

    sections
}

fn section_title(title: &str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

fn placeholder(text: &'static str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(palette.secondary)))
}

/// Builds the lines for the current conditions section
fn build_current_lines(
    snapshot: Option<&WeatherSnapshot>,
    local_clock: Option<(u8, u8)>,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let mut lines = vec![section_title("Current Weather", palette)];
    let primary = Style::default().fg(palette.primary);
    let secondary = Style::default().fg(palette.secondary);

    match snapshot {
        Some(s) => {
            let icon = WeatherIcon::for_description(&s.description);
            lines.push(Line::from(Span::styled(
                s.city.clone(),
                primary.add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(vec![
                Span::raw(format!("{}  ", icon.glyph())),
                Span::styled(
                    format!("{:.1}°C", s.temperature),
                    primary.add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", s.description), primary),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Humidity: ", secondary),
                Span::styled(format!("{}%", s.humidity), primary),
                Span::raw("   "),
                Span::styled("Wind Speed: ", secondary),
                Span::styled(format!("{} m/s", s.wind_speed), primary),
            ]));
            if let Some((hour, minute)) = local_clock {
                lines.push(Line::from(vec![
                    Span::styled("Local time: ", secondary),
                    Span::styled(format!("{hour:02}:{minute:02}"), primary),
                ]));
            }
            lines.push(Line::from(Span::styled(icon.url(), secondary)));
        }
        None => lines.push(placeholder("Loading weather data...", palette)),
    }

    lines.push(Line::default());
    lines
}

/// Pads or truncates `text` to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{truncated:<width$}")
}

/// Builds rows of hourly columns, wrapping to the available width
///
/// The first entry at `current_hour` is marked in the sparkline.
fn build_hourly_strip(
    entries: &[HourlyEntry],
    width: usize,
    show_dates: bool,
    current_hour: Option<u8>,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let per_row = (width / HOUR_COLUMN).max(1);
    let primary = Style::default().fg(palette.primary);
    let secondary = Style::default().fg(palette.secondary);
    let current =
        current_hour.and_then(|hour| entries.iter().position(|e| e.hour() == Some(hour)));
    let mut lines = Vec::new();

    for (row, chunk) in entries.chunks(per_row).enumerate() {
        if show_dates {
            lines.push(Line::from(
                chunk
                    .iter()
                    .map(|e| {
                        let date = e.date_label();
                        Span::styled(fit(date.get(5..).unwrap_or(date), HOUR_COLUMN), secondary)
                    })
                    .collect::<Vec<_>>(),
            ));
        }
        lines.push(Line::from(
            chunk
                .iter()
                .map(|e| {
                    Span::styled(
                        fit(e.clock_label(), HOUR_COLUMN),
                        primary.add_modifier(Modifier::BOLD),
                    )
                })
                .collect::<Vec<_>>(),
        ));
        lines.push(Line::from(
            chunk
                .iter()
                .flat_map(|e| {
                    [
                        Span::raw(WeatherIcon::from_code(&e.icon).glyph()),
                        Span::styled(
                            fit(&format!(" {:.0}°C", e.temperature), HOUR_COLUMN - 1),
                            primary,
                        ),
                    ]
                })
                .collect::<Vec<_>>(),
        ));
        lines.push(Line::from(
            chunk
                .iter()
                .map(|e| Span::styled(fit(&e.description, HOUR_COLUMN - 1) + " ", secondary))
                .collect::<Vec<_>>(),
        ));
        let temps: Vec<f64> = chunk.iter().map(|e| e.temperature).collect();
        let mut sparkline = TemperatureSparkline::new(&temps)
            .cell_width(HOUR_COLUMN)
            .style(Style::default().fg(palette.accent));
        if let Some(index) = current.and_then(|i| i.checked_sub(row * per_row)) {
            if index < chunk.len() {
                sparkline = sparkline.marker(index);
            }
        }
        lines.push(sparkline.to_line());
        lines.push(Line::default());
    }

    lines
}

/// Builds the forecast grid with the selected day highlighted
fn build_forecast_grid(
    days: &[ForecastDay],
    selected: usize,
    width: usize,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let columns = (width / FORECAST_CELL).clamp(1, FORECAST_MAX_COLUMNS);
    let cell = (width / columns).max(FORECAST_CELL);
    let mut lines = Vec::new();

    for (row, chunk) in days.chunks(columns).enumerate() {
        let mut dates = Vec::new();
        let mut temps = Vec::new();
        let mut descriptions = Vec::new();

        for (col, day) in chunk.iter().enumerate() {
            let is_selected = row * columns + col == selected;
            let (marker, style) = if is_selected {
                (
                    "▶ ",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                )
            } else {
                ("  ", Style::default().fg(palette.primary))
            };
            let icon = WeatherIcon::for_description(&day.description);

            dates.push(Span::styled(
                fit(&format!("{marker}{}", day.date), cell - 1),
                style.add_modifier(Modifier::BOLD),
            ));
            dates.push(Span::raw(" "));
            temps.push(Span::raw(format!("  {}", icon.glyph())));
            temps.push(Span::styled(
                fit(&format!(" {:.1}°C", day.temperature), cell - 3),
                Style::default().fg(palette.primary),
            ));
            descriptions.push(Span::styled(
                fit(&format!("  {}", day.description), cell),
                Style::default().fg(palette.secondary),
            ));
        }

        lines.push(Line::from(dates));
        lines.push(Line::from(temps));
        lines.push(Line::from(descriptions));
        lines.push(Line::default());
    }

    lines
}
