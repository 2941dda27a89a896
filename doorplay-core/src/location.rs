/// Fully retreated raw location.
pub const MIN_LOCATION: f64 = -1.1;
/// Fully approached raw location.
pub const MAX_LOCATION: f64 = 1.85;

/// Units moved by one forward/backward press.
pub const STEP_UNITS: f64 = 10.0;

/// Clamps a raw location into `[MIN_LOCATION, MAX_LOCATION]`.
pub fn clamp_location(location: f64) -> f64 {
    if location.is_nan() {
        return 0.0;
    }
    location.clamp(MIN_LOCATION, MAX_LOCATION)
}

/// Rescales a raw location to a distance in `[0, 100]` with the origin at 50.
///
/// Approach and retreat are scaled against their own bound, so the range is
/// asymmetric in raw units but symmetric once normalized.
pub fn normalize_location(location: f64) -> u8 {
    let location = clamp_location(location);
    let percent = if location > 0.0 {
        location * 100.0 / MAX_LOCATION
    } else {
        location * 100.0 / -MIN_LOCATION
    };

    (percent / 2.0 + 50.0).round().clamp(0.0, 100.0) as u8
}

/// Moves `location` by `units / 100` and returns the normalized distance.
pub fn step_location(location: f64, units: f64) -> u8 {
    normalize_location(location + units / 100.0)
}

/// Moves `location` by `units / 100` and returns the clamped raw location.
pub fn advance_location(location: f64, units: f64) -> f64 {
    clamp_location(location + units / 100.0)
}
