use std::time::Duration;

use roomsense_common::{PullRecord, PushPayload, Sample, TelemetryConfig, TelemetryError};

/// HTTP adapter for the Ambient-style telemetry channel. Every request runs
/// under the configured timeout; a timeout surfaces as the same error class
/// as a connection failure.
#[derive(Clone)]
pub struct AmbientClient {
    http: reqwest::Client,
    config: TelemetryConfig,
}

impl AmbientClient {
    pub fn new(config: TelemetryConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn data_url(&self) -> String {
        format!(
            "{}/api/v2/channels/{}/data",
            self.config.base_url, self.config.channel_id
        )
    }

    pub async fn push(&self, sample: &Sample) -> Result<(), TelemetryError> {
        let payload = PushPayload::new(&self.config.write_key, sample);
        let response = self
            .http
            .post(self.data_url())
            .json(&payload)
            .send()
            .await
            .map_err(|err| TelemetryError::Push(err.to_string()))?;

        if !response.status().is_success() {
            return Err(TelemetryError::Push(format!(
                "unexpected status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Most recent record on the channel, if any.
    pub async fn pull_latest(&self) -> Result<Option<Sample>, TelemetryError> {
        let url = format!("{}?limit=1&readKey={}", self.data_url(), self.config.read_key);
        let records = self.fetch(&url).await?;
        Ok(records.into_iter().next().map(PullRecord::into_sample))
    }

    /// All records created at or after `start`, sorted ascending by
    /// timestamp. An empty response is an `EmptyWindow` error so the caller
    /// skips the evaluation cycle wholesale.
    pub async fn pull_window(&self, start: i64) -> Result<Vec<Sample>, TelemetryError> {
        let url = format!(
            "{}?start={}&readKey={}",
            self.data_url(),
            start,
            self.config.read_key
        );
        let records = self.fetch(&url).await?;
        if records.is_empty() {
            return Err(TelemetryError::EmptyWindow);
        }
        Ok(into_sorted_samples(records))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<PullRecord>, TelemetryError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| TelemetryError::Pull(err.to_string()))?;

        if !response.status().is_success() {
            return Err(TelemetryError::Pull(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        response
            .json::<Vec<PullRecord>>()
            .await
            .map_err(|err| TelemetryError::Pull(err.to_string()))
    }
}

fn into_sorted_samples(records: Vec<PullRecord>) -> Vec<Sample> {
    let mut samples: Vec<Sample> = records.into_iter().map(PullRecord::into_sample).collect();
    samples.sort_by_key(|sample| sample.timestamp);
    samples
}
