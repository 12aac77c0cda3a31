//! HTTP polling of the headband bridge API.
//!
//! The bridge serves `GET /api/data`. While streaming it returns a JSON
//! array of `{alpha, beta, theta, timestamp}` objects; otherwise it returns
//! `{"error": ..., "status": {"connected", "calibrating", "streaming"}}`.

use crate::acquisition::types::RawSample;
use crate::acquisition::{AcquisitionError, AcquisitionSource, FetchOutcome};
use serde::Deserialize;
use std::time::Duration;

/// Bridge connection settings.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Full URL of the data endpoint
    pub url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpSourceConfig {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:5000/api/data", Duration::from_secs(10))
    }
}

/// Device status block the bridge attaches to error responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub calibrating: bool,
    #[serde(default)]
    pub streaming: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: String,
    #[serde(default)]
    status: Option<DeviceStatus>,
}

/// Map a bridge response body to a fetch outcome.
pub fn decode_payload(body: &str) -> Result<FetchOutcome, AcquisitionError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| AcquisitionError::Decode(e.to_string()))?;

    match value {
        serde_json::Value::Array(items) if items.is_empty() => {
            Ok(FetchOutcome::NotReady("no samples yet".to_string()))
        }
        serde_json::Value::Array(items) => {
            let samples = items
                .into_iter()
                .map(|item| {
                    serde_json::from_value::<RawSample>(item).map_err(|e| {
                        AcquisitionError::Decode(format!(
                            "sample missing alpha/beta/theta/timestamp: {e}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FetchOutcome::Batch(samples))
        }
        serde_json::Value::Object(_) => {
            let payload: ErrorPayload = serde_json::from_value(value)
                .map_err(|e| AcquisitionError::Decode(e.to_string()))?;
            let status = payload.status.unwrap_or_default();

            if !status.connected {
                Err(AcquisitionError::Device(format!(
                    "{} (device not connected)",
                    payload.error
                )))
            } else if status.calibrating {
                Ok(FetchOutcome::NotReady("device is calibrating".to_string()))
            } else if !status.streaming {
                Ok(FetchOutcome::NotReady("device not streaming yet".to_string()))
            } else {
                Err(AcquisitionError::Device(payload.error))
            }
        }
        other => Err(AcquisitionError::Decode(format!(
            "unexpected payload type: {other}"
        ))),
    }
}

/// Async client for the bridge.
pub struct HttpClient {
    config: HttpSourceConfig,
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: HttpSourceConfig) -> Result<Self, AcquisitionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AcquisitionError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Fetch and decode one batch.
    pub async fn fetch(&self) -> Result<FetchOutcome, AcquisitionError> {
        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| AcquisitionError::Network(e.to_string()))?;

        // The bridge reports device errors in the body, sometimes with a non-2xx status.
        let body = response
            .text()
            .await
            .map_err(|e| AcquisitionError::Network(e.to_string()))?;

        decode_payload(&body)
    }
}

/// Blocking bridge poller for the synchronous session loop.
pub struct HttpSource {
    inner: HttpClient,
    runtime: tokio::runtime::Runtime,
}

impl HttpSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, AcquisitionError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AcquisitionError::Runtime(format!("failed to create runtime: {e}")))?;

        Ok(Self {
            inner: HttpClient::new(config)?,
            runtime,
        })
    }

    pub fn url(&self) -> &str {
        &self.inner.config.url
    }
}

impl AcquisitionSource for HttpSource {
    fn fetch_batch(&mut self) -> Result<FetchOutcome, AcquisitionError> {
        self.runtime.block_on(self.inner.fetch())
    }

    fn describe(&self) -> String {
        format!("headband bridge at {}", self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_batch() {
        let body = r#"[
            {"alpha": 0.38, "beta": 0.33, "theta": 0.29, "timestamp": "2025-05-31T11:03:37.450414"},
            {"alpha": 0.39, "beta": 0.32, "theta": 0.30, "timestamp": "2025-05-31T11:03:37.509961"}
        ]"#;
        match decode_payload(body).unwrap() {
            FetchOutcome::Batch(samples) => {
                assert_eq!(samples.len(), 2);
                assert_eq!(samples[1].theta, 0.30);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_field_is_error() {
        let body = r#"[{"alpha": 0.38, "beta": 0.33, "timestamp": "2025-05-31T11:03:37"}]"#;
        assert!(matches!(
            decode_payload(body),
            Err(AcquisitionError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_calibrating_is_not_ready() {
        let body = r#"{"error": "No data yet", "status": {"connected": true, "calibrating": true, "streaming": false}}"#;
        assert!(matches!(
            decode_payload(body).unwrap(),
            FetchOutcome::NotReady(_)
        ));
    }

    #[test]
    fn test_decode_disconnected_is_device_error() {
        let body = r#"{"error": "No data yet", "status": {"connected": false}}"#;
        assert!(matches!(
            decode_payload(body),
            Err(AcquisitionError::Device(_))
        ));
    }

    #[test]
    fn test_decode_empty_array_is_not_ready() {
        assert!(matches!(
            decode_payload("[]").unwrap(),
            FetchOutcome::NotReady(_)
        ));
    }

    #[test]
    fn test_default_config_url() {
        let config = HttpSourceConfig::default();
        assert_eq!(config.url, "http://127.0.0.1:5000/api/data");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
