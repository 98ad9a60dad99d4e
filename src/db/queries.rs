use sqlx::PgPool;

use super::models::WeatherDocument;

/// Insert one weather document.
///
/// Every call is a plain insert; no dedup key exists, so repeated runs for
/// the same city append separate rows.
pub async fn insert_document(pool: &PgPool, doc: &WeatherDocument) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO weather_documents (
            captured_at, city_id, sunrise_at, sunset_at,
            weather_icon, weather_description,
            snow_1h_mm, rain_1h_mm, visibility_m,
            temperature_c, feels_like_c, cloud_cover_pct, humidity_pct, pressure_hpa,
            wind_direction_deg, wind_speed_ms, utc_offset_secs
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
    )
    .bind(doc.captured_at)
    .bind(&doc.city_id)
    .bind(doc.sunrise_at)
    .bind(doc.sunset_at)
    .bind(&doc.weather_icon)
    .bind(&doc.weather_description)
    .bind(doc.snow_1h_mm)
    .bind(doc.rain_1h_mm)
    .bind(doc.visibility_m)
    .bind(doc.temperature_c)
    .bind(doc.feels_like_c)
    .bind(doc.cloud_cover_pct)
    .bind(doc.humidity_pct)
    .bind(doc.pressure_hpa)
    .bind(doc.wind_direction_deg)
    .bind(doc.wind_speed_ms)
    .bind(doc.utc_offset_secs)
    .execute(pool)
    .await?;

    Ok(())
}
