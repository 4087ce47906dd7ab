//! Occupancy detectors.
//!
//! Both detectors are pure functions: state goes in as arguments and comes
//! back in the return value, so evaluation cycles can be replayed in tests
//! without a live telemetry store.

use crate::config::MonitorConfig;
use crate::sample::Sample;
use crate::types::Occupancy;

/// Debounce state carried across production-regime evaluation cycles.
///
/// `previous_diff` is the comparison baseline for the next bucket diff; it
/// stays `None` until the first bucket has been scanned, so a first
/// evaluation can never report a change.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowState {
    pub no_change_cycles: u8,
    pub previous_diff: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowOutcome {
    /// `None` means this cycle produced no verdict; the caller keeps the
    /// previous occupancy value.
    pub occupancy: Option<Occupancy>,
    pub state: WindowState,
}

/// Demo-regime detector: one-shot comparison against the most recent remote
/// sample. No hysteresis. `None` when there is no remote sample; absence is
/// never evidence of vacancy.
pub fn demo_verdict(local: &Sample, remote: Option<&Sample>, threshold: f64) -> Option<Occupancy> {
    let remote = remote?;
    let diff = remote.motion.delta(&local.motion);
    Some(if diff >= threshold {
        Occupancy::Occupied
    } else {
        Occupancy::Vacant
    })
}

/// Production-regime detector: bucket the remote window, diff each bucket
/// representative against the current local sample, and compare consecutive
/// diffs. A jump of at least `motion_delta_threshold` between consecutive
/// diffs is a change: occupancy flips to occupied and the debounce counter
/// resets. Only `vacancy_cycles` consecutive change-free evaluations flip the
/// room to vacant.
pub fn window_verdict(
    local: &Sample,
    window: &[Sample],
    now: i64,
    state: WindowState,
    config: &MonitorConfig,
) -> WindowOutcome {
    let mut previous_diff = state.previous_diff;
    let mut change_detected = false;

    for representative in bucket_representatives(window, now, config).into_iter().flatten() {
        let diff = representative.motion.delta(&local.motion);
        if let Some(previous) = previous_diff {
            if (diff - previous).abs() >= config.motion_delta_threshold {
                // Baseline freezes at the value it had before this bucket.
                change_detected = true;
                break;
            }
        }
        previous_diff = Some(diff);
    }

    if change_detected {
        return WindowOutcome {
            occupancy: Some(Occupancy::Occupied),
            state: WindowState {
                no_change_cycles: 0,
                previous_diff,
            },
        };
    }

    let cycles = state
        .no_change_cycles
        .saturating_add(1)
        .min(config.vacancy_cycles);
    let occupancy = (cycles >= config.vacancy_cycles).then_some(Occupancy::Vacant);

    WindowOutcome {
        occupancy,
        state: WindowState {
            no_change_cycles: cycles,
            previous_diff,
        },
    }
}

/// Chronologically last sample of each bucket, in bucket order.
///
/// Buckets are contiguous half-open `[start, start + bucket_span)` intervals
/// covering `[now - window_span, now)`: a timestamp exactly on a bucket
/// boundary belongs to the later bucket, and each sample lands in at most one
/// bucket. Samples outside the window are ignored. Input must be sorted
/// ascending by timestamp.
fn bucket_representatives<'a>(
    window: &'a [Sample],
    now: i64,
    config: &MonitorConfig,
) -> Vec<Option<&'a Sample>> {
    let window_start = now - config.window_span_secs;
    let bucket_count = (config.window_span_secs / config.bucket_span_secs).max(1) as usize;
    let mut representatives: Vec<Option<&Sample>> = vec![None; bucket_count];

    for sample in window {
        if sample.timestamp < window_start || sample.timestamp >= now {
            continue;
        }
        let index = ((sample.timestamp - window_start) / config.bucket_span_secs) as usize;
        if index < bucket_count {
            representatives[index] = Some(sample);
        }
    }

    representatives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::MotionVec;
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_700_000_000;

    fn sample(x: f64, timestamp: i64) -> Sample {
        Sample::new(MotionVec::new(x, 0.0, 0.0), 22.0, timestamp)
    }

    fn local() -> Sample {
        sample(1.0, NOW)
    }

    fn config() -> MonitorConfig {
        MonitorConfig::default()
    }

    #[test]
    fn demo_flips_occupied_exactly_at_threshold() {
        let still = sample(0.0, NOW);
        let verdict = demo_verdict(&still, Some(&sample(0.05, NOW - 5)), 0.05);
        assert_eq!(verdict, Some(Occupancy::Occupied));
    }

    #[test]
    fn demo_stays_vacant_below_threshold() {
        let verdict = demo_verdict(&local(), Some(&sample(1.049, NOW - 5)), 0.05);
        assert_eq!(verdict, Some(Occupancy::Vacant));
    }

    #[test]
    fn demo_equal_samples_never_read_occupied() {
        let verdict = demo_verdict(&local(), Some(&local()), 0.05);
        assert_eq!(verdict, Some(Occupancy::Vacant));
    }

    #[test]
    fn demo_absent_remote_gives_no_verdict() {
        assert_eq!(demo_verdict(&local(), None, 0.05), None);
    }

    #[test]
    fn demo_sums_all_three_axes() {
        let remote = Sample::new(MotionVec::new(1.02, 0.02, -0.02), 22.0, NOW - 5);
        // Per-axis deltas are each below threshold; the sum is not.
        let verdict = demo_verdict(&local(), Some(&remote), 0.05);
        assert_eq!(verdict, Some(Occupancy::Occupied));
    }

    #[test]
    fn bucket_assignment_follows_half_open_intervals() {
        let window = vec![
            sample(0.1, NOW - 1_800), // exact window start: bucket 0
            sample(0.2, NOW - 1_500), // boundary of buckets 0/1: bucket 1
            sample(0.3, NOW - 1),     // last second of the window: bucket 5
        ];

        let representatives = bucket_representatives(&window, NOW, &config());

        assert_eq!(representatives[0], Some(&window[0]));
        assert_eq!(representatives[1], Some(&window[1]));
        assert_eq!(representatives[5], Some(&window[2]));
        assert_eq!(representatives[2], None);
    }

    #[test]
    fn bucket_ignores_samples_outside_the_window() {
        let window = vec![
            sample(0.1, NOW - 1_801), // before the window
            sample(0.2, NOW),         // `now` itself is excluded
            sample(0.3, NOW + 60),
        ];

        let representatives = bucket_representatives(&window, NOW, &config());

        assert!(representatives.iter().all(Option::is_none));
    }

    #[test]
    fn bucket_representative_is_the_last_sample() {
        let window = vec![
            sample(0.1, NOW - 1_700),
            sample(0.2, NOW - 1_650),
            sample(0.3, NOW - 1_550),
        ];

        let representatives = bucket_representatives(&window, NOW, &config());

        assert_eq!(representatives[0], Some(&window[2]));
    }

    #[test]
    fn first_evaluation_never_detects_change() {
        // Wildly different bucket diffs, but no baseline yet: the first
        // bucket seeds it and every later comparison is consecutive.
        let window = vec![sample(5.0, NOW - 1_700)];

        let outcome = window_verdict(&local(), &window, NOW, WindowState::default(), &config());

        assert_eq!(outcome.occupancy, None);
        assert_eq!(outcome.state.no_change_cycles, 1);
        assert_eq!(outcome.state.previous_diff, Some(4.0));
    }

    #[test]
    fn jump_between_consecutive_diffs_is_a_change() {
        let window = vec![
            sample(1.2, NOW - 1_700), // diff 0.2, seeds baseline
            sample(1.3, NOW - 1_400), // diff 0.3, jump 0.1 >= 0.05
        ];
        let state = WindowState {
            no_change_cycles: 4,
            previous_diff: None,
        };

        let outcome = window_verdict(&local(), &window, NOW, state, &config());

        assert_eq!(outcome.occupancy, Some(Occupancy::Occupied));
        assert_eq!(outcome.state.no_change_cycles, 0);
    }

    #[test]
    fn baseline_freezes_at_the_detecting_bucket() {
        let window = vec![
            sample(1.2, NOW - 1_700), // diff 0.2
            sample(1.4, NOW - 1_400), // diff 0.4: change, scan stops
            sample(2.0, NOW - 1_100), // never scanned
        ];
        let state = WindowState {
            no_change_cycles: 2,
            previous_diff: Some(0.21),
        };

        let outcome = window_verdict(&local(), &window, NOW, state, &config());

        assert_eq!(outcome.occupancy, Some(Occupancy::Occupied));
        // Baseline advanced through the quiet first bucket only.
        assert!((outcome.state.previous_diff.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn quiet_scan_advances_baseline_to_last_bucket() {
        let window = vec![
            sample(1.20, NOW - 1_700),
            sample(1.21, NOW - 1_400),
            sample(1.22, NOW - 200),
        ];
        let state = WindowState {
            no_change_cycles: 0,
            previous_diff: Some(0.19),
        };

        let outcome = window_verdict(&local(), &window, NOW, state, &config());

        assert_eq!(outcome.occupancy, None);
        assert_eq!(outcome.state.no_change_cycles, 1);
        assert!((outcome.state.previous_diff.unwrap() - 0.22).abs() < 1e-12);
    }

    #[test]
    fn vacancy_requires_six_consecutive_quiet_cycles() {
        let window = vec![sample(1.2, NOW - 1_700)];
        let mut state = WindowState::default();

        for cycle in 1..=5 {
            let outcome = window_verdict(&local(), &window, NOW, state, &config());
            assert_eq!(outcome.occupancy, None, "cycle {cycle}");
            state = outcome.state;
        }

        let outcome = window_verdict(&local(), &window, NOW, state, &config());
        assert_eq!(outcome.occupancy, Some(Occupancy::Vacant));
        assert_eq!(outcome.state.no_change_cycles, 6);
    }

    #[test]
    fn change_before_the_sixth_cycle_resets_the_count() {
        let quiet = vec![sample(1.2, NOW - 1_700)];
        let mut state = WindowState::default();
        for _ in 0..5 {
            state = window_verdict(&local(), &quiet, NOW, state, &config()).state;
        }
        assert_eq!(state.no_change_cycles, 5);

        let noisy = vec![
            sample(1.2, NOW - 1_700),
            sample(1.5, NOW - 1_400),
        ];
        let outcome = window_verdict(&local(), &noisy, NOW, state, &config());

        assert_eq!(outcome.occupancy, Some(Occupancy::Occupied));
        assert_eq!(outcome.state.no_change_cycles, 0);
    }

    #[test]
    fn counter_stays_clamped_once_vacant() {
        let window = vec![sample(1.2, NOW - 1_700)];
        let mut state = WindowState::default();

        for _ in 0..10 {
            state = window_verdict(&local(), &window, NOW, state, &config()).state;
        }

        assert_eq!(state.no_change_cycles, 6);
    }

    #[test]
    fn all_buckets_empty_counts_as_a_quiet_cycle() {
        let window = vec![sample(1.2, NOW - 2_000)];
        let state = WindowState {
            no_change_cycles: 5,
            previous_diff: Some(0.2),
        };

        let outcome = window_verdict(&local(), &window, NOW, state, &config());

        assert_eq!(outcome.occupancy, Some(Occupancy::Vacant));
        assert_eq!(outcome.state.previous_diff, Some(0.2));
    }
}
