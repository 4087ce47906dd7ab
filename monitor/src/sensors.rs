use roomsense_common::{MotionVec, Sample, SensorError};

/// Local sensor access. Both reads may fail transiently; the poll loop logs
/// and carries on with its previous sample.
pub trait SensorHub {
    fn read_motion(&mut self) -> Result<(f64, f64, f64), SensorError>;
    fn read_temperature(&mut self) -> Result<f64, SensorError>;

    fn acquire(&mut self, timestamp: i64) -> Result<Sample, SensorError> {
        let (x, y, z) = self.read_motion()?;
        let temperature = self.read_temperature()?;
        Ok(Sample::new(MotionVec::new(x, y, z), temperature, timestamp))
    }
}

/// Deterministic stand-in for the accelerometer + environment unit.
pub struct SimulatedSensors {
    tick: u64,
}

impl SimulatedSensors {
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

impl SensorHub for SimulatedSensors {
    fn read_motion(&mut self) -> Result<(f64, f64, f64), SensorError> {
        self.tick = self.tick.saturating_add(1);

        // Hardware integration point:
        // replace these simulated readings with real IMU + ENV drivers on
        // device targets.
        let x = 1.00 + ((self.tick % 8) as f64) * 0.002;
        let y = -0.02 + ((self.tick % 5) as f64) * 0.001;
        let z = 0.98;
        Ok((x, y, z))
    }

    fn read_temperature(&mut self) -> Result<f64, SensorError> {
        Ok(23.0 + ((self.tick % 6) as f64) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_builds_a_timestamped_sample() {
        let mut sensors = SimulatedSensors::new();

        let sample = sensors.acquire(1_700_000_000).unwrap();

        assert_eq!(sample.timestamp, 1_700_000_000);
        assert!(sample.temperature >= 23.0);
        assert!(sample.motion.x >= 1.0);
    }

    #[test]
    fn simulated_readings_vary_between_ticks() {
        let mut sensors = SimulatedSensors::new();

        let first = sensors.acquire(1).unwrap();
        let second = sensors.acquire(2).unwrap();

        assert_ne!(first.motion, second.motion);
    }
}
