//! Sequential ingestion loop over the city catalog.
//!
//! For each city in catalog order: fetch the current observation, extract a
//! document, insert it. A failure in any of the three steps is logged with
//! the city identifier and the loop advances to the next city; nothing is
//! retried and the run never aborts over a single city. A fixed pause after
//! every city keeps request pacing within the upstream API's rate limit.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use crate::db::models::WeatherDocument;
use crate::errors::AppError;
use crate::services::catalog::CityRecord;
use crate::services::openweather::extract_document;

/// Pause after each city, success or failure.
pub const INTER_CITY_DELAY: Duration = Duration::from_millis(1200);

/// Source of raw weather observations for a coordinate.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_observation(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<serde_json::Value, AppError>;
}

/// Destination for normalized weather documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_document(&self, document: &WeatherDocument) -> Result<(), AppError>;
}

/// Counters for a completed run over the catalog.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub saved: usize,
    pub failed: usize,
}

/// Process every city in catalog order.
///
/// Per-city failures are absorbed; the function returns once the catalog is
/// exhausted, regardless of how many cities failed.
pub async fn run_catalog<S, D>(
    source: &S,
    store: &D,
    catalog: &[CityRecord],
    pacing: Duration,
) -> RunOutcome
where
    S: WeatherSource,
    D: DocumentStore,
{
    let mut outcome = RunOutcome::default();

    for city in catalog {
        tracing::info!("Fetching weather for {}", city.city_id);

        match ingest_city(source, store, city).await {
            Ok(()) => outcome.saved += 1,
            Err(e) => {
                outcome.failed += 1;
                tracing::error!("Error fetching/saving weather for {}: {}", city.city_id, e);
            }
        }

        tokio::time::sleep(pacing).await;
    }

    outcome
}

/// Fetch, extract, and persist one city's observation.
async fn ingest_city<S, D>(source: &S, store: &D, city: &CityRecord) -> Result<(), AppError>
where
    S: WeatherSource,
    D: DocumentStore,
{
    let raw = source
        .current_observation(city.latitude, city.longitude)
        .await?;
    let document = extract_document(&city.city_id, Utc::now(), &raw)?;
    store.insert_document(&document).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn city(id: &str, lat: f64, lon: f64) -> CityRecord {
        CityRecord {
            city_id: id.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    fn observation_body() -> serde_json::Value {
        serde_json::json!({
            "weather": [{ "icon": "01d", "description": "clear sky" }],
            "main": { "temp": 5.3, "feels_like": 3.9, "humidity": 80, "pressure": 1012 },
            "wind": { "speed": 3.1 },
            "clouds": { "all": 40 },
            "sys": { "sunrise": 1700000000, "sunset": 1700030000 }
        })
    }

    enum FakeReply {
        Body(serde_json::Value),
        ConnectionError,
    }

    /// Replays a scripted queue of replies and records the requested coordinates.
    #[derive(Default)]
    struct FakeSource {
        replies: Mutex<VecDeque<FakeReply>>,
        requests: Mutex<Vec<(f64, f64)>>,
    }

    impl FakeSource {
        fn with_replies(replies: Vec<FakeReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn current_observation(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<serde_json::Value, AppError> {
            self.requests.lock().unwrap().push((latitude, longitude));
            match self.replies.lock().unwrap().pop_front() {
                Some(FakeReply::Body(body)) => Ok(body),
                Some(FakeReply::ConnectionError) => Err(AppError::ExternalService(
                    "connection refused".to_string(),
                )),
                None => panic!("fetch called more times than scripted"),
            }
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        documents: Mutex<Vec<WeatherDocument>>,
        reject_city: Option<String>,
    }

    impl RecordingStore {
        fn stored_city_ids(&self) -> Vec<String> {
            self.documents
                .lock()
                .unwrap()
                .iter()
                .map(|d| d.city_id.clone())
                .collect()
        }
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn insert_document(&self, document: &WeatherDocument) -> Result<(), AppError> {
            if self.reject_city.as_deref() == Some(document.city_id.as_str()) {
                return Err(AppError::Database(sqlx::Error::PoolClosed));
            }
            self.documents.lock().unwrap().push(document.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_every_city_is_processed_in_catalog_order() {
        let catalog = vec![
            city("berlin", 52.52, 13.405),
            city("hamburg", 53.5511, 9.9937),
            city("muenchen", 48.1351, 11.582),
        ];
        let source = FakeSource::with_replies(vec![
            FakeReply::Body(observation_body()),
            FakeReply::Body(observation_body()),
            FakeReply::Body(observation_body()),
        ]);
        let store = RecordingStore::default();

        let outcome = run_catalog(&source, &store, &catalog, Duration::ZERO).await;

        assert_eq!(outcome, RunOutcome { saved: 3, failed: 0 });
        assert_eq!(store.stored_city_ids(), vec!["berlin", "hamburg", "muenchen"]);
        assert_eq!(
            *source.requests.lock().unwrap(),
            vec![(52.52, 13.405), (53.5511, 9.9937), (48.1351, 11.582)]
        );
    }

    #[tokio::test]
    async fn test_fetch_error_skips_only_that_city() {
        let catalog = vec![city("berlin", 52.52, 13.405), city("hamburg", 53.5511, 9.9937)];
        let source = FakeSource::with_replies(vec![
            FakeReply::ConnectionError,
            FakeReply::Body(observation_body()),
        ]);
        let store = RecordingStore::default();

        let outcome = run_catalog(&source, &store, &catalog, Duration::ZERO).await;

        assert_eq!(outcome, RunOutcome { saved: 1, failed: 1 });
        assert_eq!(store.stored_city_ids(), vec!["hamburg"]);
    }

    #[tokio::test]
    async fn test_malformed_observation_skips_only_that_city() {
        let mut broken = observation_body();
        broken["main"] = serde_json::json!({ "feels_like": 3.9, "humidity": 80, "pressure": 1012 });

        let catalog = vec![
            city("berlin", 52.52, 13.405),
            city("hamburg", 53.5511, 9.9937),
            city("muenchen", 48.1351, 11.582),
        ];
        let source = FakeSource::with_replies(vec![
            FakeReply::Body(observation_body()),
            FakeReply::Body(broken),
            FakeReply::Body(observation_body()),
        ]);
        let store = RecordingStore::default();

        let outcome = run_catalog(&source, &store, &catalog, Duration::ZERO).await;

        assert_eq!(outcome, RunOutcome { saved: 2, failed: 1 });
        assert_eq!(store.stored_city_ids(), vec!["berlin", "muenchen"]);
    }

    #[tokio::test]
    async fn test_store_failure_counts_against_that_city_only() {
        let catalog = vec![city("berlin", 52.52, 13.405), city("hamburg", 53.5511, 9.9937)];
        let source = FakeSource::with_replies(vec![
            FakeReply::Body(observation_body()),
            FakeReply::Body(observation_body()),
        ]);
        let store = RecordingStore {
            reject_city: Some("berlin".to_string()),
            ..Default::default()
        };

        let outcome = run_catalog(&source, &store, &catalog, Duration::ZERO).await;

        assert_eq!(outcome, RunOutcome { saved: 1, failed: 1 });
        assert_eq!(store.stored_city_ids(), vec!["hamburg"]);
    }

    #[tokio::test]
    async fn test_repeated_runs_append_duplicate_documents() {
        let catalog = vec![city("berlin", 52.52, 13.405)];
        let source = FakeSource::with_replies(vec![
            FakeReply::Body(observation_body()),
            FakeReply::Body(observation_body()),
        ]);
        let store = RecordingStore::default();

        run_catalog(&source, &store, &catalog, Duration::ZERO).await;
        run_catalog(&source, &store, &catalog, Duration::ZERO).await;

        // No dedup key exists: the second run appends a second row.
        assert_eq!(store.stored_city_ids(), vec!["berlin", "berlin"]);
    }

    #[tokio::test]
    async fn test_empty_catalog_is_a_no_op() {
        let source = FakeSource::default();
        let store = RecordingStore::default();

        let outcome = run_catalog(&source, &store, &[], Duration::ZERO).await;

        assert_eq!(outcome, RunOutcome::default());
        assert!(store.stored_city_ids().is_empty());
    }
}
