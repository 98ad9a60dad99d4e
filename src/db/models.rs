use chrono::{DateTime, Utc};

/// A normalized weather record, persisted once per city per run.
///
/// `Option` fields distinguish "not reported by the source" (`None`) from a
/// reported zero. Rows are never mutated or deleted by this system.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherDocument {
    /// Wall-clock UTC time of the transformation, not of the observation.
    pub captured_at: DateTime<Utc>,
    pub city_id: String,
    pub sunrise_at: DateTime<Utc>,
    pub sunset_at: DateTime<Utc>,
    pub weather_icon: String,
    pub weather_description: String,
    pub snow_1h_mm: Option<f64>,
    pub rain_1h_mm: Option<f64>,
    pub visibility_m: Option<i32>,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub cloud_cover_pct: i32,
    pub humidity_pct: i32,
    pub pressure_hpa: i32,
    pub wind_direction_deg: Option<i32>,
    pub wind_speed_ms: f64,
    pub utc_offset_secs: Option<i32>,
}
