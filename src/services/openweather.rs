//! OpenWeatherMap current-weather client.
//!
//! Fetches current conditions from the OpenWeatherMap API.
//! See: https://openweathermap.org/current

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::models::WeatherDocument;
use crate::errors::AppError;
use crate::services::ingest::WeatherSource;

const OPENWEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Timeout for a single OpenWeatherMap request.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for the OpenWeatherMap current-weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: OPENWEATHER_API_URL.to_string(),
        }
    }

    /// Fetch the current observation for a coordinate, metric units.
    ///
    /// Returns the raw JSON body. The caller extracts a `WeatherDocument`
    /// from it via [`extract_document`].
    pub async fn fetch_current(&self, lat: f64, lon: f64) -> Result<serde_json::Value, AppError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalService(format!("OpenWeatherMap request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "OpenWeatherMap returned HTTP {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalService(format!("OpenWeatherMap JSON parse error: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current_observation(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<serde_json::Value, AppError> {
        self.fetch_current(latitude, longitude).await
    }
}

// --- OpenWeatherMap JSON response types ---

#[derive(Debug, Deserialize)]
struct Observation {
    weather: Vec<ObservationCondition>,
    main: ObservationMain,
    clouds: ObservationClouds,
    wind: ObservationWind,
    sys: ObservationSys,
    snow: Option<ObservationPrecipitation>,
    rain: Option<ObservationPrecipitation>,
    visibility: Option<i32>,
    /// Shift in seconds from UTC at the observed location.
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ObservationCondition {
    icon: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ObservationMain {
    temp: f64,
    feels_like: f64,
    humidity: i32,
    pressure: i32,
}

#[derive(Debug, Deserialize)]
struct ObservationClouds {
    all: i32,
}

#[derive(Debug, Deserialize)]
struct ObservationWind {
    speed: f64,
    deg: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ObservationSys {
    sunrise: i64,
    sunset: i64,
}

/// Accumulated precipitation block (`snow` / `rain`). The `1h` key may be
/// missing even when the block itself is present.
#[derive(Debug, Deserialize)]
struct ObservationPrecipitation {
    #[serde(rename = "1h")]
    last_hour_mm: Option<f64>,
}

/// Build the persisted document for a city from a raw observation.
///
/// This is a pure function (no I/O). Required fields missing from the
/// response surface as [`AppError::Observation`]; optional fields map to
/// `None` when the source did not report them, keeping "not reported"
/// distinct from a reported zero.
pub fn extract_document(
    city_id: &str,
    captured_at: DateTime<Utc>,
    raw: &serde_json::Value,
) -> Result<WeatherDocument, AppError> {
    let observation: Observation = serde_json::from_value(raw.clone()).map_err(|e| {
        AppError::Observation(format!("OpenWeatherMap response structure error: {}", e))
    })?;

    let condition = observation.weather.first().ok_or_else(|| {
        AppError::Observation("OpenWeatherMap response contained no weather conditions".to_string())
    })?;

    Ok(WeatherDocument {
        captured_at,
        city_id: city_id.to_string(),
        sunrise_at: epoch_to_utc(observation.sys.sunrise, "sys.sunrise")?,
        sunset_at: epoch_to_utc(observation.sys.sunset, "sys.sunset")?,
        weather_icon: condition.icon.clone(),
        weather_description: condition.description.clone(),
        snow_1h_mm: observation.snow.as_ref().and_then(|p| p.last_hour_mm),
        rain_1h_mm: observation.rain.as_ref().and_then(|p| p.last_hour_mm),
        visibility_m: observation.visibility,
        temperature_c: observation.main.temp,
        feels_like_c: observation.main.feels_like,
        cloud_cover_pct: observation.clouds.all,
        humidity_pct: observation.main.humidity,
        pressure_hpa: observation.main.pressure,
        wind_direction_deg: observation.wind.deg,
        wind_speed_ms: observation.wind.speed,
        utc_offset_secs: observation.timezone,
    })
}

/// Convert an epoch-seconds value (UTC-denominated) to a `DateTime<Utc>`.
fn epoch_to_utc(secs: i64, field: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Observation(format!("'{}' is out of range: {}", field, secs)))
}
