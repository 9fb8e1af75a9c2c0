//! Linear range mapping used to turn the speed control into a playback interval.

/// Raw speed control bounds (inlet `speed` range)
pub const SPEED_LOW: i64 = 0;
pub const SPEED_HIGH: i64 = 1000;

/// Interval bounds in ms. Inverted on purpose: the fastest speed maps to the shortest interval.
pub const INTERVAL_LOW_MS: i64 = 30_000;
pub const INTERVAL_HIGH_MS: i64 = 0;

/// Fade duration added on top of every mapped interval
pub const TXT_FADE_MS: i64 = 1000;

/// Map `value` from `[source_min, source_max]` into `[target_min, target_max]`.
///
/// The value is clamped into the source range first (upper bound, then lower),
/// the result is rounded half away from zero. Zero operands are ordinary values.
/// An empty source range maps everything to `target_min`.
pub fn map_val(value: i64, source_min: i64, source_max: i64, target_min: i64, target_max: i64) -> i64 {
    let mut value = value;
    if value > source_max {
        value = source_max;
    }
    if value < source_min {
        value = source_min;
    }

    let source_delta = (source_max - source_min) as f64;
    if source_delta == 0.0 {
        return target_min;
    }
    let target_delta = (target_max - target_min) as f64;
    let mapped = (value - source_min) as f64 * (target_delta / source_delta);

    (target_min as f64 + mapped).round() as i64
}

/// Playback interval (ms) for a raw speed control value.
pub fn speed_to_interval_ms(speed: i64) -> u64 {
    let mapped = map_val(speed, SPEED_LOW, SPEED_HIGH, INTERVAL_LOW_MS, INTERVAL_HIGH_MS);
    (TXT_FADE_MS + mapped).max(0) as u64
}
