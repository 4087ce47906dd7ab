//! Wire schemas for the telemetry channel API.

use serde::{Deserialize, Serialize};

use crate::sample::{MotionVec, Sample};

/// Body POSTed to the channel data endpoint: motion axes on d1..d3,
/// temperature on d4.
#[derive(Debug, Clone, Serialize)]
pub struct PushPayload {
    #[serde(rename = "writeKey")]
    pub write_key: String,
    pub d1: f64,
    pub d2: f64,
    pub d3: f64,
    pub d4: f64,
}

impl PushPayload {
    pub fn new(write_key: &str, sample: &Sample) -> Self {
        Self {
            write_key: write_key.to_string(),
            d1: sample.motion.x,
            d2: sample.motion.y,
            d3: sample.motion.z,
            d4: sample.temperature,
        }
    }
}

/// One record returned by a channel data read. d-fields the writer never set
/// come back absent and read as 0; `created_at` is the store's epoch-seconds
/// server timestamp and is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRecord {
    #[serde(default)]
    pub d1: f64,
    #[serde(default)]
    pub d2: f64,
    #[serde(default)]
    pub d3: f64,
    #[serde(default)]
    pub d4: f64,
    pub created_at: i64,
}

impl PullRecord {
    pub fn into_sample(self) -> Sample {
        Sample::new(
            MotionVec::new(self.d1, self.d2, self.d3),
            self.d4,
            self.created_at,
        )
    }
}
