use crate::config::{MonitorConfig, ThermalConfig};
use crate::detector::{self, WindowState};
use crate::sample::Sample;
use crate::types::{
    DetectionMode, DisplayFrame, MonitorStatus, Occupancy, PresenceEvent, Regime,
};

const PROMPT_AC_AND_LED: &str = "Turn off Air Conditioner and LEDs!";
const PROMPT_AC: &str = "Turn off Air Conditioner!";
const PROMPT_LED: &str = "Turn off LEDs!";

/// The mode coordinator. Owns every piece of mutable presence state
/// (detection mode, both occupancy values, the LED flag, the debounce window
/// state, the remote-check cadence) and derives the display outputs.
/// Detector calls go through `apply_*` so the detectors themselves stay pure.
#[derive(Debug, Clone)]
pub struct PresenceEngine {
    pub config: MonitorConfig,
    thermal: ThermalConfig,

    detection_mode: DetectionMode,
    presence_manual: Occupancy,
    presence_auto: Occupancy,
    led_on: bool,

    current: Option<Sample>,
    window_state: WindowState,
    last_remote_check: Option<i64>,
}

impl PresenceEngine {
    pub fn new(config: MonitorConfig, thermal: ThermalConfig) -> Self {
        Self {
            config,
            thermal,
            detection_mode: DetectionMode::Manual,
            presence_manual: Occupancy::Vacant,
            presence_auto: Occupancy::Vacant,
            led_on: false,
            current: None,
            window_state: WindowState::default(),
            last_remote_check: None,
        }
    }

    pub fn regime(&self) -> Regime {
        self.config.regime
    }

    pub fn detection_mode(&self) -> DetectionMode {
        self.detection_mode
    }

    pub fn presence_manual(&self) -> Occupancy {
        self.presence_manual
    }

    pub fn presence_auto(&self) -> Occupancy {
        self.presence_auto
    }

    pub fn led_on(&self) -> bool {
        self.led_on
    }

    pub fn current_sample(&self) -> Option<&Sample> {
        self.current.as_ref()
    }

    pub fn window_state(&self) -> WindowState {
        self.window_state
    }

    /// Store the freshly acquired local sample. Called every poll tick.
    pub fn update_sample(&mut self, sample: Sample) {
        self.current = Some(sample);
    }

    pub fn toggle_presence(&mut self) -> PresenceEvent {
        self.presence_manual = self.presence_manual.toggled();
        PresenceEvent::ManualPresence(self.presence_manual)
    }

    pub fn toggle_led(&mut self) -> PresenceEvent {
        self.led_on = !self.led_on;
        PresenceEvent::LedToggled(self.led_on)
    }

    /// Switching modes never touches either occupancy value; both persist
    /// and the inactive one simply stops being displayed.
    pub fn toggle_mode(&mut self) -> PresenceEvent {
        self.detection_mode = self.detection_mode.toggled();
        PresenceEvent::ModeChanged(self.detection_mode)
    }

    /// True once the regime's remote-check interval has elapsed since the
    /// last consumed check (immediately, before the first one).
    pub fn remote_check_due(&self, now: i64) -> bool {
        let interval = self.config.check_interval_secs();
        self.last_remote_check
            .map_or(true, |last| now - last >= interval)
    }

    /// Consume the due interval. Called before the remote fetch, so a failed
    /// cycle waits out a full interval instead of retrying every tick.
    pub fn begin_remote_check(&mut self, now: i64) {
        self.last_remote_check = Some(now);
    }

    /// Fold a demo-regime pull result in. `None` remote (empty pull) leaves
    /// the auto occupancy untouched.
    pub fn apply_demo_verdict(&mut self, remote: Option<&Sample>) -> Option<PresenceEvent> {
        let local = self.current.as_ref()?;
        let verdict = detector::demo_verdict(local, remote, self.config.motion_delta_threshold)?;
        self.set_presence_auto(verdict)
    }

    /// Fold a production-regime window evaluation in. The window must be
    /// sorted ascending by timestamp.
    pub fn apply_window_verdict(&mut self, window: &[Sample], now: i64) -> Option<PresenceEvent> {
        let local = self.current.as_ref()?;
        let outcome =
            detector::window_verdict(local, window, now, self.window_state, &self.config);
        self.window_state = outcome.state;
        let verdict = outcome.occupancy?;
        self.set_presence_auto(verdict)
    }

    fn set_presence_auto(&mut self, verdict: Occupancy) -> Option<PresenceEvent> {
        if self.presence_auto == verdict {
            return None;
        }
        self.presence_auto = verdict;
        Some(PresenceEvent::AutoPresence(verdict))
    }

    pub fn temperature(&self) -> Option<f64> {
        self.current.as_ref().map(|sample| sample.temperature)
    }

    pub fn ac_on(&self) -> bool {
        self.temperature()
            .is_some_and(|t| t > self.thermal.threshold_temp)
    }

    pub fn comfort(&self) -> bool {
        self.temperature()
            .is_some_and(|t| self.thermal.comfort_min <= t && t <= self.thermal.comfort_max)
    }

    /// The occupancy value the active detection mode vouches for. The other
    /// value keeps its state but has no effect on display or prompts.
    pub fn active_occupancy(&self) -> Occupancy {
        match self.detection_mode {
            DetectionMode::Manual => self.presence_manual,
            DetectionMode::Auto => self.presence_auto,
        }
    }

    /// Reminder shown while the room is unoccupied but consumers are on.
    pub fn prompt(&self) -> &'static str {
        if self.active_occupancy().is_occupied() {
            return "";
        }
        match (self.ac_on(), self.led_on) {
            (true, true) => PROMPT_AC_AND_LED,
            (true, false) => PROMPT_AC,
            (false, true) => PROMPT_LED,
            (false, false) => "",
        }
    }

    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            regime: self.config.regime.as_str(),
            detection_mode: self.detection_mode.as_str(),
            presence_manual: self.presence_manual.as_str(),
            presence_auto: self.presence_auto.as_str(),
            active_presence: self.active_occupancy().as_str(),
            temperature: self.temperature(),
            ac_on: self.ac_on(),
            led_on: self.led_on,
            comfort: self.comfort(),
            prompt: self.prompt().to_string(),
            no_change_cycles: self.window_state.no_change_cycles,
            sample_epoch: self.current.as_ref().map(|sample| sample.timestamp),
        }
    }

    pub fn display_frame(&self) -> DisplayFrame {
        let presence = match self.detection_mode {
            DetectionMode::Manual => {
                format!("Presence(Toggle): {}", self.presence_manual.as_str())
            }
            DetectionMode::Auto => format!("Presence(Auto): {}", self.presence_auto.as_str()),
        };

        let (temperature, ac, comfort) = match self.temperature() {
            Some(t) => (
                format!("Temp: {t:.1}[°C]"),
                format!("AC: {}", if self.ac_on() { "ON" } else { "OFF" }),
                format!("Comfort: {}", if self.comfort() { "Yes" } else { "No" }),
            ),
            None => (
                "Temp: Unknown".to_string(),
                "AC: Unknown".to_string(),
                "Comfort: Unknown".to_string(),
            ),
        };

        DisplayFrame {
            presence,
            mode: format!("Mode: {}", self.detection_mode.as_str()),
            temperature,
            ac,
            led: format!("LED: {}", if self.led_on { "ON" } else { "OFF" }),
            comfort,
            prompt: self.prompt().to_string(),
        }
    }
}
