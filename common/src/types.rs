use serde::{Deserialize, Serialize};

/// Which detector regime the deployment runs. A configuration parameter, not
/// a structural difference: the demo regime compares against the single most
/// recent remote record on a fast cadence, the production regime evaluates a
/// bucketed 30-minute window on a slow cadence with debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Regime {
    Demo,
    Prod,
}

impl Regime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Demo => "DEMO",
            Self::Prod => "PROD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectionMode {
    Manual,
    Auto,
}

impl DetectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Auto => "AUTO",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Manual => Self::Auto,
            Self::Auto => Self::Manual,
        }
    }
}

/// The inferred presence verdict for the room. `Occupied` always means
/// someone is present, in both regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Occupancy {
    Occupied,
    Vacant,
}

impl Occupancy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Occupied => "IN",
            Self::Vacant => "OUT",
        }
    }

    pub fn is_occupied(self) -> bool {
        self == Self::Occupied
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Occupied => Self::Vacant,
            Self::Vacant => Self::Occupied,
        }
    }
}

/// State transitions worth an alert in the operational log. Emitted by the
/// engine, logged by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    ManualPresence(Occupancy),
    AutoPresence(Occupancy),
    ModeChanged(DetectionMode),
    LedToggled(bool),
}

/// Full snapshot served at /api/status and published retained over MQTT.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub regime: &'static str,
    #[serde(rename = "detectionMode")]
    pub detection_mode: &'static str,
    #[serde(rename = "presenceManual")]
    pub presence_manual: &'static str,
    #[serde(rename = "presenceAuto")]
    pub presence_auto: &'static str,
    #[serde(rename = "activePresence")]
    pub active_presence: &'static str,
    pub temperature: Option<f64>,
    #[serde(rename = "acOn")]
    pub ac_on: bool,
    #[serde(rename = "ledOn")]
    pub led_on: bool,
    pub comfort: bool,
    pub prompt: String,
    #[serde(rename = "noChangeCycles")]
    pub no_change_cycles: u8,
    #[serde(rename = "sampleEpoch")]
    pub sample_epoch: Option<i64>,
}

/// The seven text lines a display collaborator renders. Fields hold their
/// last computed value between evaluation cycles; temperature-derived lines
/// read "Unknown" until the first sample arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayFrame {
    pub presence: String,
    pub mode: String,
    pub temperature: String,
    pub ac: String,
    pub led: String,
    pub comfort: String,
    pub prompt: String,
}
