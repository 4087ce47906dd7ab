pub mod config;
pub mod detector;
pub mod error;
pub mod presence;
pub mod sample;
pub mod telemetry;
pub mod topics;
pub mod types;

pub use config::{MonitorConfig, NetworkConfig, RuntimeConfig, TelemetryConfig, ThermalConfig};
pub use detector::{WindowOutcome, WindowState};
pub use error::{SensorError, TelemetryError};
pub use presence::PresenceEngine;
pub use sample::{MotionVec, Sample};
pub use telemetry::{PullRecord, PushPayload};
pub use topics::*;
pub use types::{
    DetectionMode, DisplayFrame, MonitorStatus, Occupancy, PresenceEvent, Regime,
};
