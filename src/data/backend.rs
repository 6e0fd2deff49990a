//! Weather backend REST client
//!
//! This module talks to the weather backend's four read-only endpoints and
//! classifies every failure into the dashboard's error taxonomy.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::{ApiErrorBody, ForecastDay, HourlyEntry, WeatherSnapshot};

/// Backend address used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Message shown when the city query is blank
pub const EMPTY_CITY_MESSAGE: &str = "Please enter a city name";

/// Message shown when a day fetch is attempted without a date
pub const EMPTY_DATE_MESSAGE: &str = "Please select a forecast day";

/// Which operation a failure belongs to; selects the wording of the user message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    /// Current weather, forecast and hourly window for a city
    City,
    /// Hourly forecast for one selected day
    Day,
}

/// Errors that can occur when fetching from the backend
#[derive(Debug, Error)]
pub enum FetchError {
    /// Input rejected before any request was made
    #[error("{0}")]
    Validation(&'static str),

    /// The backend answered with a failure status
    #[error("backend returned {status}: {message}")]
    Backend {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// The request went out but no usable response came back
    #[error("no response from {base_url}: {reason}")]
    Connectivity { base_url: String, reason: String },

    /// Anything else, such as a malformed success body
    #[error("{0}")]
    Unexpected(String),
}

impl FetchError {
    /// Returns the single human-readable line shown in the error banner.
    pub fn user_message(&self, scope: RequestScope) -> String {
        match (self, scope) {
            (FetchError::Validation(message), _) => (*message).to_string(),
            (
                FetchError::Backend {
                    message, details, ..
                },
                _,
            ) => {
                let prefix = match scope {
                    RequestScope::City => "Error",
                    RequestScope::Day => "Error fetching hourly forecast",
                };
                match details.as_deref().filter(|d| !d.is_empty()) {
                    Some(details) => format!("{}: {} - {}", prefix, message, details),
                    None => format!("{}: {}", prefix, message),
                }
            }
            (FetchError::Connectivity { base_url, .. }, RequestScope::City) => format!(
                "Failed to connect to the backend server. Please ensure the backend is running at {}.",
                base_url
            ),
            (FetchError::Connectivity { .. }, RequestScope::Day) => {
                "Failed to connect to the backend server for hourly forecast.".to_string()
            }
            (FetchError::Unexpected(message), _) => {
                format!("An unexpected error occurred: {}", message)
            }
        }
    }

    /// Builds the error for a failure status from its (possibly empty) body.
    fn from_failure(status: StatusCode, body: &str, base_url: &str) -> Self {
        if body.trim().is_empty() {
            return FetchError::Connectivity {
                base_url: base_url.to_string(),
                reason: format!("empty {} response", status),
            };
        }

        let payload: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
        FetchError::Backend {
            status: status.as_u16(),
            message: payload
                .error
                .unwrap_or_else(|| "Unknown error occurred".to_string()),
            details: payload.details,
        }
    }

    /// Classifies a transport error raised before a response was read.
    fn from_transport(err: reqwest::Error, base_url: &str) -> Self {
        if err.is_builder() {
            FetchError::Unexpected(err.to_string())
        } else {
            FetchError::Connectivity {
                base_url: base_url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Everything `fetch_city` returns for one query
#[derive(Debug, Clone)]
pub struct CityReport {
    pub snapshot: WeatherSnapshot,
    pub forecast: Vec<ForecastDay>,
    pub hourly: Vec<HourlyEntry>,
}

/// Client for the weather backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl Default for BackendClient {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}

impl BackendClient {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// The backend base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch current conditions (`GET /weather`)
    pub async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, FetchError> {
        self.get_json("weather", &[("city", city)]).await
    }

    /// Fetch the daily forecast (`GET /forecast`)
    pub async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastDay>, FetchError> {
        self.get_json("forecast", &[("city", city)]).await
    }

    /// Fetch the hourly window around now (`GET /hourly`)
    pub async fn fetch_hourly(&self, city: &str) -> Result<Vec<HourlyEntry>, FetchError> {
        self.get_json("hourly", &[("city", city)]).await
    }

    /// Fetch the hourly forecast for one day (`GET /hourly_forecast`)
    pub async fn fetch_hourly_for_date(
        &self,
        city: &str,
        date: &str,
    ) -> Result<Vec<HourlyEntry>, FetchError> {
        self.get_json("hourly_forecast", &[("city", city), ("date", date)])
            .await
    }

    /// Fetch current conditions, forecast and hourly window concurrently.
    ///
    /// Fails with the first error any of the three requests produces.
    pub async fn fetch_city(&self, city: &str) -> Result<CityReport, FetchError> {
        let (snapshot, forecast, hourly) = futures::try_join!(
            self.fetch_current(city),
            self.fetch_forecast(city),
            self.fetch_hourly(city),
        )?;

        Ok(CityReport {
            snapshot,
            forecast,
            hourly,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, ?query, "backend request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(e, &self.base_url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_transport(e, &self.base_url))?;

        if !status.is_success() {
            tracing::warn!(%url, %status, "backend returned failure status");
            return Err(FetchError::from_failure(status, &body, &self.base_url));
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Unexpected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn snapshot_json() -> serde_json::Value {
        serde_json::json!({
            "city": "Bengaluru",
            "temperature": 24.3,
            "description": "scattered clouds",
            "humidity": 61,
            "wind_speed": 3.6,
            "lat": 12.9762,
            "lon": 77.6033,
            "timezone": 19800
        })
    }

    #[test]
    fn test_backend_message_with_details() {
        let err = FetchError::Backend {
            status: 404,
            message: "City not found".to_string(),
            details: Some("Failed to fetch coordinates: city not found".to_string()),
        };
        assert_eq!(
            err.user_message(RequestScope::City),
            "Error: City not found - Failed to fetch coordinates: city not found"
        );
        assert_eq!(
            err.user_message(RequestScope::Day),
            "Error fetching hourly forecast: City not found - Failed to fetch coordinates: city not found"
        );
    }

    #[test]
    fn test_backend_message_without_details() {
        let err = FetchError::Backend {
            status: 400,
            message: "City parameter is required".to_string(),
            details: None,
        };
        assert_eq!(
            err.user_message(RequestScope::City),
            "Error: City parameter is required"
        );
    }

    #[test]
    fn test_connectivity_message_names_backend() {
        let err = FetchError::Connectivity {
            base_url: "http://localhost:5000".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.user_message(RequestScope::City),
            "Failed to connect to the backend server. Please ensure the backend is running at http://localhost:5000."
        );
        assert_eq!(
            err.user_message(RequestScope::Day),
            "Failed to connect to the backend server for hourly forecast."
        );
    }

    #[test]
    fn test_unexpected_and_validation_messages() {
        let err = FetchError::Unexpected("expected value at line 1 column 1".to_string());
        assert_eq!(
            err.user_message(RequestScope::City),
            "An unexpected error occurred: expected value at line 1 column 1"
        );
        let err = FetchError::Validation(EMPTY_CITY_MESSAGE);
        assert_eq!(err.user_message(RequestScope::City), "Please enter a city name");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = BackendClient::new("http://example.test:5000/");
        assert_eq!(client.base_url(), "http://example.test:5000");
    }

    #[test]
    fn test_default_client_points_at_localhost() {
        assert_eq!(BackendClient::default().base_url(), DEFAULT_BACKEND_URL);
    }

    #[tokio::test]
    async fn test_fetch_current_parses_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("city", "Bangalore"))
            .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let snapshot = client.fetch_current("Bangalore").await.expect("snapshot");

        assert_eq!(snapshot.city, "Bengaluru");
        assert_eq!(snapshot.timezone, 19800);
    }

    #[tokio::test]
    async fn test_city_with_spaces_is_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("city", "New York"))
            .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        assert!(client.fetch_current("New York").await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_hourly_for_date_sends_both_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hourly_forecast"))
            .and(query_param("city", "Pune"))
            .and(query_param("date", "2024-05-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"time": "2024-05-01 02:30", "temperature": 22.4, "description": "clear sky", "icon": "01n"},
                {"time": "2024-05-01 05:30", "temperature": 21.9, "description": "clear sky", "icon": "01n"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let entries = client
            .fetch_hourly_for_date("Pune", "2024-05-01")
            .await
            .expect("entries");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].clock_label(), "05:30");
    }

    #[tokio::test]
    async fn test_structured_error_body_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "Failed to fetch weather data",
                "details": "city not found"
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let err = client.fetch_current("Atlantis").await.unwrap_err();

        match &err {
            FetchError::Backend {
                status,
                message,
                details,
            } => {
                assert_eq!(*status, 404);
                assert_eq!(message, "Failed to fetch weather data");
                assert_eq!(details.as_deref(), Some("city not found"));
            }
            other => panic!("Expected Backend error, got {:?}", other),
        }
        assert_eq!(
            err.user_message(RequestScope::City),
            "Error: Failed to fetch weather data - city not found"
        );
    }

    #[tokio::test]
    async fn test_error_body_without_error_field_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let err = client.fetch_forecast("Pune").await.unwrap_err();

        assert_eq!(
            err.user_message(RequestScope::City),
            "Error: Unknown error occurred"
        );
    }

    #[tokio::test]
    async fn test_failure_without_body_is_connectivity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hourly"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let err = client.fetch_hourly("Pune").await.unwrap_err();

        assert!(matches!(err, FetchError::Connectivity { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_connectivity() {
        // Bind then drop a listener so the port is known to be closed
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = BackendClient::new(format!("http://127.0.0.1:{}", port));
        let err = client.fetch_current("Pune").await.unwrap_err();

        assert!(matches!(err, FetchError::Connectivity { .. }));
        assert!(err
            .user_message(RequestScope::City)
            .starts_with("Failed to connect to the backend server"));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let err = client.fetch_current("Pune").await.unwrap_err();

        assert!(matches!(err, FetchError::Unexpected(_)));
        assert!(err
            .user_message(RequestScope::City)
            .starts_with("An unexpected error occurred: "));
    }

    #[tokio::test]
    async fn test_fetch_city_fails_if_any_request_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_json()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/hourly"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "City not found"})),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let err = client.fetch_city("Bangalore").await.unwrap_err();

        assert_eq!(err.user_message(RequestScope::City), "Error: City not found");
    }
}
