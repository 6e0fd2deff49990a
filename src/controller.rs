//! Dashboard state and fetch orchestration
//!
//! `Dashboard` owns every piece of weather state the view renders. It is only
//! mutated through `fetch_weather` / `fetch_hourly_for_day`, each of which is
//! split into a synchronous `begin_*` step (validation, clearing, ticket issue),
//! the network call, and an `apply_*` step that stores the outcome.
//!
//! Every request carries a token. Outcomes whose token is no longer the latest
//! issued on their channel are dropped, so the last request *issued* wins
//! regardless of the order responses arrive in.

use chrono::{DateTime, Utc};

use crate::data::backend::{EMPTY_CITY_MESSAGE, EMPTY_DATE_MESSAGE};
use crate::data::{
    dedup_forecast, BackendClient, CityReport, FetchError, ForecastDay, HourlyEntry,
    RequestScope, WeatherSnapshot, HOURLY_WINDOW,
};
use crate::theme::Theme;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Loading and error flags shown by the view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct UiState {
    loading: bool,
    error: Option<String>,
}

/// A city fetch that has been started and awaits its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityTicket {
    pub token: u64,
    pub city: String,
}

/// A selected-day fetch that has been started and awaits its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTicket {
    pub token: u64,
    pub city: String,
    pub date: String,
}

/// Result of a network call, tagged with the ticket token that issued it
#[derive(Debug)]
pub enum FetchOutcome {
    City {
        token: u64,
        city: String,
        result: Result<CityReport, FetchError>,
    },
    Day {
        token: u64,
        date: String,
        result: Result<Vec<HourlyEntry>, FetchError>,
    },
}

/// Whether an outcome was stored or dropped as stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Stored,
    Stale,
}

/// Destination city's wall-clock `(hour, minute)` for a UTC instant and offset in seconds.
pub fn local_clock(now: DateTime<Utc>, offset_seconds: i32) -> (u8, u8) {
    let local_seconds = (now.timestamp() + i64::from(offset_seconds)).rem_euclid(SECONDS_PER_DAY);
    (
        (local_seconds / SECONDS_PER_HOUR) as u8,
        (local_seconds % SECONDS_PER_HOUR / SECONDS_PER_MINUTE) as u8,
    )
}

/// Destination city's wall-clock hour for a UTC instant and offset in seconds.
pub fn local_hour(now: DateTime<Utc>, offset_seconds: i32) -> u8 {
    local_clock(now, offset_seconds).0
}

/// Weather state for the dashboard
#[derive(Debug, Default)]
pub struct Dashboard {
    snapshot: Option<WeatherSnapshot>,
    forecast: Vec<ForecastDay>,
    hourly: Vec<HourlyEntry>,
    selected_day_hourly: Vec<HourlyEntry>,
    local_hour: Option<u8>,
    ui: UiState,
    /// Query of the last successful city fetch
    active_city: Option<String>,
    /// Date the selected-day panel belongs to
    selected_date: Option<String>,
    city_seq: u64,
    day_seq: u64,
    pending_city: Option<u64>,
    pending_day: Option<u64>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn forecast(&self) -> &[ForecastDay] {
        &self.forecast
    }

    pub fn hourly(&self) -> &[HourlyEntry] {
        &self.hourly
    }

    pub fn selected_day_hourly(&self) -> &[HourlyEntry] {
        &self.selected_day_hourly
    }

    pub fn selected_date(&self) -> Option<&str> {
        self.selected_date.as_deref()
    }

    pub fn local_hour(&self) -> Option<u8> {
        self.local_hour
    }

    /// Live wall-clock time in the fetched city
    pub fn local_clock(&self, now: DateTime<Utc>) -> Option<(u8, u8)> {
        self.snapshot
            .as_ref()
            .map(|snapshot| local_clock(now, snapshot.timezone))
    }

    pub fn is_loading(&self) -> bool {
        self.ui.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.ui.error.as_deref()
    }

    /// City query the current forecast belongs to
    pub fn active_city(&self) -> Option<&str> {
        self.active_city.as_deref()
    }

    /// Theme for the current snapshot, falling back to `fallback_hour` before
    /// any snapshot has been fetched.
    pub fn theme(&self, fallback_hour: u8) -> Theme {
        let description = self
            .snapshot
            .as_ref()
            .map(|s| s.description.as_str())
            .unwrap_or_default();
        Theme::derive(description, self.local_hour, fallback_hour)
    }

    /// Starts a city fetch: validates the query, clears all weather state and
    /// issues a ticket for the network call.
    ///
    /// Any in-flight city or day fetch becomes stale.
    pub fn begin_fetch_weather(&mut self, city: &str) -> Result<CityTicket, FetchError> {
        let city = city.trim();
        if city.is_empty() {
            tracing::info!("rejected empty city query");
            self.ui.error = Some(EMPTY_CITY_MESSAGE.to_string());
            return Err(FetchError::Validation(EMPTY_CITY_MESSAGE));
        }

        self.city_seq += 1;
        self.day_seq += 1;
        self.pending_city = Some(self.city_seq);
        self.pending_day = None;

        self.ui.error = None;
        self.snapshot = None;
        self.forecast.clear();
        self.hourly.clear();
        self.selected_day_hourly.clear();
        self.selected_date = None;
        self.local_hour = None;
        self.active_city = None;
        self.refresh_loading();

        tracing::info!(city, token = self.city_seq, "fetching weather");
        Ok(CityTicket {
            token: self.city_seq,
            city: city.to_string(),
        })
    }

    /// Stores a city outcome if its token is still current.
    pub fn apply_city(
        &mut self,
        token: u64,
        city: String,
        result: Result<CityReport, FetchError>,
        now: DateTime<Utc>,
    ) -> Applied {
        if self.pending_city != Some(token) {
            tracing::debug!(token, latest = self.city_seq, "dropping stale city outcome");
            return Applied::Stale;
        }
        self.pending_city = None;

        match result {
            Ok(report) => {
                let CityReport {
                    snapshot,
                    mut forecast,
                    mut hourly,
                } = report;

                let duplicates = dedup_forecast(&mut forecast);
                if duplicates > 0 {
                    tracing::warn!(duplicates, "forecast contained repeated dates");
                }
                hourly.truncate(HOURLY_WINDOW);

                self.local_hour = Some(local_hour(now, snapshot.timezone));
                tracing::info!(
                    city = %snapshot.city,
                    local_hour = ?self.local_hour,
                    forecast_days = forecast.len(),
                    hourly_entries = hourly.len(),
                    "weather loaded"
                );

                self.snapshot = Some(snapshot);
                self.forecast = forecast;
                self.hourly = hourly;
                self.active_city = Some(city);
            }
            Err(err) => {
                tracing::warn!(error = %err, "weather fetch failed");
                self.ui.error = Some(err.user_message(RequestScope::City));
            }
        }

        self.refresh_loading();
        Applied::Stored
    }

    /// Starts a selected-day fetch for a date from the forecast.
    ///
    /// Clears the error and the previous selected-day entries. A newer day
    /// fetch makes this one stale; the main hourly strip is left untouched.
    pub fn begin_fetch_hourly_for_day(
        &mut self,
        city: &str,
        date: &str,
    ) -> Result<DayTicket, FetchError> {
        let city = city.trim();
        if city.is_empty() {
            self.ui.error = Some(EMPTY_CITY_MESSAGE.to_string());
            return Err(FetchError::Validation(EMPTY_CITY_MESSAGE));
        }
        if date.trim().is_empty() {
            self.ui.error = Some(EMPTY_DATE_MESSAGE.to_string());
            return Err(FetchError::Validation(EMPTY_DATE_MESSAGE));
        }

        self.day_seq += 1;
        self.pending_day = Some(self.day_seq);

        self.ui.error = None;
        self.selected_day_hourly.clear();
        self.selected_date = None;
        self.refresh_loading();

        tracing::info!(city, date, token = self.day_seq, "fetching hourly forecast for day");
        Ok(DayTicket {
            token: self.day_seq,
            city: city.to_string(),
            date: date.to_string(),
        })
    }

    /// Stores a selected-day outcome if its token is still current.
    pub fn apply_day(
        &mut self,
        token: u64,
        date: String,
        result: Result<Vec<HourlyEntry>, FetchError>,
    ) -> Applied {
        if self.pending_day != Some(token) {
            tracing::debug!(token, latest = self.day_seq, "dropping stale day outcome");
            return Applied::Stale;
        }
        self.pending_day = None;

        match result {
            Ok(entries) => {
                tracing::info!(%date, entries = entries.len(), "day forecast loaded");
                self.selected_day_hourly = entries;
                self.selected_date = Some(date);
            }
            Err(err) => {
                tracing::warn!(error = %err, "day forecast fetch failed");
                self.ui.error = Some(err.user_message(RequestScope::Day));
            }
        }

        self.refresh_loading();
        Applied::Stored
    }

    /// Routes an outcome delivered from a background task.
    pub fn apply(&mut self, outcome: FetchOutcome, now: DateTime<Utc>) -> Applied {
        match outcome {
            FetchOutcome::City {
                token,
                city,
                result,
            } => self.apply_city(token, city, result, now),
            FetchOutcome::Day {
                token,
                date,
                result,
            } => self.apply_day(token, date, result),
        }
    }

    /// Hides the selected-day panel without touching anything else.
    pub fn close_selected_day(&mut self) {
        self.selected_day_hourly.clear();
        self.selected_date = None;
    }

    /// Begins, performs and applies a city fetch in sequence.
    pub async fn fetch_weather(
        &mut self,
        client: &BackendClient,
        city: &str,
    ) -> Result<(), FetchError> {
        let ticket = self.begin_fetch_weather(city)?;
        let outcome = run_city(client, ticket).await;
        self.apply(outcome, Utc::now());
        Ok(())
    }

    /// Begins, performs and applies a selected-day fetch in sequence.
    pub async fn fetch_hourly_for_day(
        &mut self,
        client: &BackendClient,
        city: &str,
        date: &str,
    ) -> Result<(), FetchError> {
        let ticket = self.begin_fetch_hourly_for_day(city, date)?;
        let outcome = run_day(client, ticket).await;
        self.apply(outcome, Utc::now());
        Ok(())
    }

    fn refresh_loading(&mut self) {
        self.ui.loading = self.pending_city.is_some() || self.pending_day.is_some();
    }
}

/// Performs the network side of a city ticket.
pub async fn run_city(client: &BackendClient, ticket: CityTicket) -> FetchOutcome {
    let result = client.fetch_city(&ticket.city).await;
    FetchOutcome::City {
        token: ticket.token,
        city: ticket.city,
        result,
    }
}

/// Performs the network side of a day ticket.
pub async fn run_day(client: &BackendClient, ticket: DayTicket) -> FetchOutcome {
    let result = client.fetch_hourly_for_date(&ticket.city, &ticket.date).await;
    FetchOutcome::Day {
        token: ticket.token,
        date: ticket.date,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    fn snapshot(timezone: i32, description: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            city: "Bengaluru".to_string(),
            temperature: 24.3,
            description: description.to_string(),
            humidity: 61.0,
            wind_speed: 3.6,
            lat: 12.97,
            lon: 77.6,
            timezone,
        }
    }

    fn hourly(count: usize) -> Vec<HourlyEntry> {
        (0..count)
            .map(|i| HourlyEntry {
                time: format!("2024-05-{:02} {:02}:00", 1 + i / 24, i % 24),
                temperature: 20.0 + i as f64 * 0.1,
                description: "few clouds".to_string(),
                icon: "02d".to_string(),
            })
            .collect()
    }

    fn report(timezone: i32, hourly_count: usize) -> CityReport {
        CityReport {
            snapshot: snapshot(timezone, "clear sky"),
            forecast: vec![ForecastDay {
                date: "2024-05-01".to_string(),
                temperature: 31.0,
                description: "clear sky".to_string(),
            }],
            hourly: hourly(hourly_count),
        }
    }

    #[test]
    fn test_local_hour_utc() {
        assert_eq!(local_hour(utc(14, 30), 0), 14);
    }

    #[test]
    fn test_local_hour_wraps_backwards() {
        assert_eq!(local_hour(utc(2, 0), -28800), 18);
    }

    #[test]
    fn test_local_hour_wraps_forwards_and_half_hours() {
        // UTC+5:30 at 20:45 UTC is 02:15 the next day
        assert_eq!(local_hour(utc(20, 45), 19800), 2);
        assert_eq!(local_hour(utc(23, 59), 60), 0);
    }

    #[test]
    fn test_local_clock_keeps_minutes() {
        assert_eq!(local_clock(utc(14, 37), 0), (14, 37));
        // UTC+5:30 at 20:45 UTC is 02:15 the next day
        assert_eq!(local_clock(utc(20, 45), 19800), (2, 15));
        assert_eq!(local_clock(utc(2, 5), -28800), (18, 5));
    }

    #[test]
    fn test_dashboard_local_clock_follows_snapshot_offset() {
        let mut dashboard = Dashboard::new();
        assert_eq!(dashboard.local_clock(utc(9, 10)), None);

        let ticket = dashboard.begin_fetch_weather("Bangalore").unwrap();
        dashboard.apply_city(ticket.token, ticket.city, Ok(report(19800, 1)), utc(9, 0));

        assert_eq!(dashboard.local_clock(utc(9, 10)), Some((14, 40)));
    }

    #[test]
    fn test_empty_city_is_rejected_without_state_change() {
        let mut dashboard = Dashboard::new();

        let err = dashboard.begin_fetch_weather("   ").unwrap_err();

        assert!(matches!(err, FetchError::Validation(_)));
        assert_eq!(dashboard.error(), Some("Please enter a city name"));
        assert!(!dashboard.is_loading());
    }

    #[test]
    fn test_begin_fetch_clears_state_and_sets_loading() {
        let mut dashboard = Dashboard::new();
        let ticket = dashboard.begin_fetch_weather("Bangalore").unwrap();
        dashboard.apply_city(ticket.token, ticket.city, Ok(report(19800, 24)), utc(6, 0));
        assert!(dashboard.snapshot().is_some());

        let ticket = dashboard.begin_fetch_weather("  Pune ").unwrap();

        assert_eq!(ticket.city, "Pune");
        assert!(dashboard.is_loading());
        assert!(dashboard.snapshot().is_none());
        assert!(dashboard.forecast().is_empty());
        assert!(dashboard.hourly().is_empty());
        assert!(dashboard.local_hour().is_none());
        assert!(dashboard.error().is_none());
    }

    #[test]
    fn test_apply_success_stores_and_truncates() {
        let mut dashboard = Dashboard::new();
        let ticket = dashboard.begin_fetch_weather("Bangalore").unwrap();

        let applied =
            dashboard.apply_city(ticket.token, ticket.city, Ok(report(19800, 40)), utc(6, 0));

        assert_eq!(applied, Applied::Stored);
        assert!(!dashboard.is_loading());
        assert!(dashboard.error().is_none());
        assert_eq!(dashboard.hourly().len(), 24);
        assert_eq!(dashboard.hourly()[0].time, "2024-05-01 00:00");
        assert_eq!(dashboard.hourly()[23].time, "2024-05-01 23:00");
        // 06:00 UTC + 5:30 = 11:30
        assert_eq!(dashboard.local_hour(), Some(11));
        assert_eq!(dashboard.active_city(), Some("Bangalore"));
    }

    #[test]
    fn test_apply_failure_sets_error_and_clears_loading() {
        let mut dashboard = Dashboard::new();
        let ticket = dashboard.begin_fetch_weather("Atlantis").unwrap();

        dashboard.apply_city(
            ticket.token,
            ticket.city,
            Err(FetchError::Backend {
                status: 404,
                message: "City not found".to_string(),
                details: None,
            }),
            utc(6, 0),
        );

        assert!(!dashboard.is_loading());
        assert_eq!(dashboard.error(), Some("Error: City not found"));
        assert!(dashboard.snapshot().is_none());
        assert!(dashboard.active_city().is_none());
    }

    #[test]
    fn test_stale_city_outcome_is_dropped() {
        let mut dashboard = Dashboard::new();
        let first = dashboard.begin_fetch_weather("Bangalore").unwrap();
        let second = dashboard.begin_fetch_weather("Pune").unwrap();

        // The newer request resolves first
        let mut pune = report(19800, 24);
        pune.snapshot.city = "Pune".to_string();
        assert_eq!(
            dashboard.apply_city(second.token, second.city, Ok(pune), utc(6, 0)),
            Applied::Stored
        );

        // The older one arrives late and must not overwrite
        assert_eq!(
            dashboard.apply_city(first.token, first.city, Ok(report(0, 24)), utc(6, 0)),
            Applied::Stale
        );
        assert_eq!(dashboard.snapshot().map(|s| s.city.as_str()), Some("Pune"));
        assert_eq!(dashboard.active_city(), Some("Pune"));
    }

    #[test]
    fn test_loading_stays_true_until_latest_city_request_completes() {
        let mut dashboard = Dashboard::new();
        let first = dashboard.begin_fetch_weather("Bangalore").unwrap();
        let second = dashboard.begin_fetch_weather("Pune").unwrap();

        dashboard.apply_city(first.token, first.city, Ok(report(0, 1)), utc(6, 0));
        assert!(dashboard.is_loading());

        dashboard.apply_city(second.token, second.city, Ok(report(0, 1)), utc(6, 0));
        assert!(!dashboard.is_loading());
    }

    #[test]
    fn test_day_fetch_replaces_only_selected_day() {
        let mut dashboard = Dashboard::new();
        let ticket = dashboard.begin_fetch_weather("Bangalore").unwrap();
        dashboard.apply_city(ticket.token, ticket.city, Ok(report(19800, 24)), utc(6, 0));
        let hourly_before = dashboard.hourly().to_vec();

        let day = dashboard
            .begin_fetch_hourly_for_day("Bangalore", "2024-05-01")
            .unwrap();
        assert!(dashboard.is_loading());
        dashboard.apply_day(day.token, day.date, Ok(hourly(8)));

        assert!(!dashboard.is_loading());
        assert_eq!(dashboard.selected_day_hourly().len(), 8);
        assert_eq!(dashboard.selected_date(), Some("2024-05-01"));
        assert_eq!(dashboard.hourly(), hourly_before.as_slice());
        assert!(dashboard.snapshot().is_some());
    }

    #[test]
    fn test_day_fetch_error_uses_hourly_wording() {
        let mut dashboard = Dashboard::new();
        let day = dashboard
            .begin_fetch_hourly_for_day("Bangalore", "2024-05-01")
            .unwrap();

        dashboard.apply_day(
            day.token,
            day.date,
            Err(FetchError::Connectivity {
                base_url: "http://localhost:5000".to_string(),
                reason: "refused".to_string(),
            }),
        );

        assert_eq!(
            dashboard.error(),
            Some("Failed to connect to the backend server for hourly forecast.")
        );
        assert!(dashboard.selected_day_hourly().is_empty());
    }

    #[test]
    fn test_day_fetch_requires_date() {
        let mut dashboard = Dashboard::new();
        let err = dashboard.begin_fetch_hourly_for_day("Bangalore", "").unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));
        assert_eq!(dashboard.error(), Some("Please select a forecast day"));
    }

    #[test]
    fn test_city_fetch_invalidates_in_flight_day_fetch() {
        let mut dashboard = Dashboard::new();
        let day = dashboard
            .begin_fetch_hourly_for_day("Bangalore", "2024-05-01")
            .unwrap();
        let city = dashboard.begin_fetch_weather("Pune").unwrap();

        assert_eq!(
            dashboard.apply_day(day.token, day.date, Ok(hourly(8))),
            Applied::Stale
        );
        assert!(dashboard.selected_day_hourly().is_empty());
        assert!(dashboard.is_loading());

        dashboard.apply_city(city.token, city.city, Ok(report(0, 24)), utc(6, 0));
        assert!(!dashboard.is_loading());
    }

    #[test]
    fn test_newer_day_fetch_makes_older_one_stale() {
        let mut dashboard = Dashboard::new();
        let first = dashboard
            .begin_fetch_hourly_for_day("Bangalore", "2024-05-01")
            .unwrap();
        let second = dashboard
            .begin_fetch_hourly_for_day("Bangalore", "2024-05-02")
            .unwrap();

        assert_eq!(
            dashboard.apply_day(first.token, first.date, Ok(hourly(8))),
            Applied::Stale
        );
        assert_eq!(dashboard.selected_date(), None);
        assert!(dashboard.selected_day_hourly().is_empty());
        assert!(dashboard.is_loading());

        assert_eq!(
            dashboard.apply_day(second.token, second.date, Ok(hourly(5))),
            Applied::Stored
        );
        assert_eq!(dashboard.selected_date(), Some("2024-05-02"));
        assert_eq!(dashboard.selected_day_hourly().len(), 5);
        assert!(!dashboard.is_loading());
    }

    #[test]
    fn test_day_fetch_does_not_invalidate_city_fetch() {
        let mut dashboard = Dashboard::new();
        let city = dashboard.begin_fetch_weather("Pune").unwrap();
        let day = dashboard
            .begin_fetch_hourly_for_day("Pune", "2024-05-01")
            .unwrap();

        assert_eq!(
            dashboard.apply_city(city.token, city.city, Ok(report(0, 24)), utc(6, 0)),
            Applied::Stored
        );
        assert_eq!(dashboard.forecast().len(), 1);
        assert!(dashboard.is_loading(), "day fetch still in flight");

        assert_eq!(
            dashboard.apply_day(day.token, day.date, Ok(hourly(4))),
            Applied::Stored
        );
        assert!(!dashboard.is_loading());
    }

    #[test]
    fn test_theme_uses_local_hour_of_snapshot() {
        let mut dashboard = Dashboard::new();
        let ticket = dashboard.begin_fetch_weather("Bangalore").unwrap();
        // 02:00 UTC at UTC-8 is 18:00 local: night, so clear sky is not sunny
        dashboard.apply_city(ticket.token, ticket.city, Ok(report(-28800, 1)), utc(2, 0));

        let theme = dashboard.theme(12);
        assert_eq!(theme.background, crate::theme::Background::NightSky);
    }

    #[test]
    fn test_theme_falls_back_before_first_fetch() {
        let dashboard = Dashboard::new();
        assert_eq!(
            dashboard.theme(12).background,
            crate::theme::Background::DaySky
        );
    }

    #[test]
    fn test_close_selected_day() {
        let mut dashboard = Dashboard::new();
        let day = dashboard
            .begin_fetch_hourly_for_day("Bangalore", "2024-05-02")
            .unwrap();
        dashboard.apply_day(day.token, day.date, Ok(hourly(3)));

        dashboard.close_selected_day();

        assert!(dashboard.selected_day_hourly().is_empty());
        assert!(dashboard.selected_date().is_none());
    }
}
