use serde::{Deserialize, Serialize};

use crate::types::Regime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub regime: Regime,
    pub tick_interval_ms: u64,
    pub demo_check_interval_secs: i64,
    pub prod_check_interval_secs: i64,
    pub motion_delta_threshold: f64,
    pub window_span_secs: i64,
    pub bucket_span_secs: i64,
    pub vacancy_cycles: u8,
    pub state_publish_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            regime: Regime::Demo,
            tick_interval_ms: 500,
            demo_check_interval_secs: 5,
            prod_check_interval_secs: 300,
            motion_delta_threshold: 0.05,
            window_span_secs: 1_800,
            bucket_span_secs: 300,
            vacancy_cycles: 6,
            state_publish_interval_ms: 10_000,
        }
    }
}

impl MonitorConfig {
    /// Remote-check cadence for the configured regime.
    pub fn check_interval_secs(&self) -> i64 {
        match self.regime {
            Regime::Demo => self.demo_check_interval_secs,
            Regime::Prod => self.prod_check_interval_secs,
        }
    }

    pub fn sanitize(&mut self) {
        if self.tick_interval_ms < 100 {
            self.tick_interval_ms = 100;
        }
        self.demo_check_interval_secs = self.demo_check_interval_secs.max(1);
        self.prod_check_interval_secs = self.prod_check_interval_secs.max(1);
        if !self.motion_delta_threshold.is_finite() || self.motion_delta_threshold <= 0.0 {
            self.motion_delta_threshold = 0.05;
        }
        if self.bucket_span_secs < 1 {
            self.bucket_span_secs = 300;
        }
        if self.window_span_secs < self.bucket_span_secs {
            self.window_span_secs = self.bucket_span_secs * 6;
        }
        if self.vacancy_cycles == 0 {
            self.vacancy_cycles = 6;
        }
        if self.state_publish_interval_ms < 1_000 {
            self.state_publish_interval_ms = 1_000;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalConfig {
    pub threshold_temp: f64,
    pub comfort_min: f64,
    pub comfort_max: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            threshold_temp: 25.0,
            comfort_min: 20.0,
            comfort_max: 26.0,
        }
    }
}

impl ThermalConfig {
    pub fn sanitize(&mut self) {
        if !self.threshold_temp.is_finite() {
            self.threshold_temp = 25.0;
        }
        if !self.comfort_min.is_finite() || !self.comfort_max.is_finite() {
            self.comfort_min = 20.0;
            self.comfort_max = 26.0;
        }
        if self.comfort_min > self.comfort_max {
            std::mem::swap(&mut self.comfort_min, &mut self.comfort_max);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub base_url: String,
    pub channel_id: String,
    pub write_key: String,
    pub read_key: String,
    pub request_timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://ambidata.io".to_string(),
            channel_id: String::new(),
            write_key: String::new(),
            read_key: String::new(),
            request_timeout_secs: 10,
        }
    }
}

impl TelemetryConfig {
    pub fn sanitize(&mut self) {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = 10;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "192.168.1.100".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub thermal: ThermalConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.monitor.sanitize();
        self.thermal.sanitize();
        self.telemetry.sanitize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn check_interval_follows_regime() {
        let mut config = MonitorConfig::default();
        assert_eq!(config.check_interval_secs(), 5);

        config.regime = Regime::Prod;
        assert_eq!(config.check_interval_secs(), 300);
    }

    #[test]
    fn sanitize_restores_unusable_detector_values() {
        let mut config = MonitorConfig {
            tick_interval_ms: 0,
            motion_delta_threshold: f64::NAN,
            bucket_span_secs: 0,
            window_span_secs: 10,
            vacancy_cycles: 0,
            ..MonitorConfig::default()
        };

        config.sanitize();

        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.motion_delta_threshold, 0.05);
        assert_eq!(config.bucket_span_secs, 300);
        assert_eq!(config.window_span_secs, 1_800);
        assert_eq!(config.vacancy_cycles, 6);
    }

    #[test]
    fn sanitize_orders_comfort_range() {
        let mut thermal = ThermalConfig {
            threshold_temp: 25.0,
            comfort_min: 26.0,
            comfort_max: 20.0,
        };

        thermal.sanitize();

        assert_eq!(thermal.comfort_min, 20.0);
        assert_eq!(thermal.comfort_max, 26.0);
    }

    #[test]
    fn sanitize_trims_trailing_base_url_slash() {
        let mut telemetry = TelemetryConfig {
            base_url: "http://ambidata.io/".to_string(),
            ..TelemetryConfig::default()
        };

        telemetry.sanitize();

        assert_eq!(telemetry.base_url, "http://ambidata.io");
    }

    #[test]
    fn runtime_config_round_trips_through_json() {
        let config = RuntimeConfig::default();
        let raw = serde_json::to_string(&config).unwrap();
        let parsed: RuntimeConfig = serde_json::from_str(&raw).unwrap();

        assert_eq!(parsed.monitor.vacancy_cycles, config.monitor.vacancy_cycles);
        assert_eq!(parsed.thermal.threshold_temp, config.thermal.threshold_temp);
        assert_eq!(parsed.network.mqtt_port, config.network.mqtt_port);
    }
}
