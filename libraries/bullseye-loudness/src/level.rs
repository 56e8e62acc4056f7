//! Level conversions and sample sanitization shared by the meter stages

use crate::{DENORM_THRESHOLD, MAX_DISPLAY_DB, MIN_DISPLAY_DB};

/// Replace NaN, infinities and denormal-range values with zero
#[inline]
pub(crate) fn sanitize(value: f64) -> f64 {
    if !value.is_finite() || value.abs() < DENORM_THRESHOLD {
        0.0
    } else {
        value
    }
}

/// Clamp a level to the display range
#[inline]
pub(crate) fn clamp_display(db: f64) -> f64 {
    db.clamp(MIN_DISPLAY_DB, MAX_DISPLAY_DB)
}

/// Convert a linear magnitude to dB, clamped to the display range
///
/// Magnitudes at or below the denormal threshold, and non-finite input,
/// map to [`MIN_DISPLAY_DB`].
pub fn linear_to_db(linear: f64) -> f64 {
    if !linear.is_finite() || linear <= DENORM_THRESHOLD {
        return MIN_DISPLAY_DB;
    }
    clamp_display(20.0 * linear.log10())
}

/// Project a level in dB onto 0.0-1.0, where 0.0 is the display floor and 1.0 is 0 dB
pub fn normalize_db(db: f64) -> f32 {
    if db.is_nan() || db <= MIN_DISPLAY_DB {
        return 0.0;
    }
    ((db - MIN_DISPLAY_DB) / -MIN_DISPLAY_DB).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 0.0);
        assert_eq!(sanitize(f64::NEG_INFINITY), 0.0);
        assert_eq!(sanitize(1e-20), 0.0);
        assert_eq!(sanitize(-0.25), -0.25);
    }

    #[test]
    fn test_linear_to_db() {
        assert!((linear_to_db(1.0) - 0.0).abs() < 1e-12);
        assert!((linear_to_db(0.5) - (-6.0206)).abs() < 0.001);
        assert_eq!(linear_to_db(0.0), MIN_DISPLAY_DB);
        assert_eq!(linear_to_db(f64::NAN), MIN_DISPLAY_DB);
        // 1e3 linear is +60 dB, beyond the display ceiling
        assert_eq!(linear_to_db(1e3), MAX_DISPLAY_DB);
    }

    #[test]
    fn test_normalize_db() {
        assert_eq!(normalize_db(MIN_DISPLAY_DB), 0.0);
        assert_eq!(normalize_db(-500.0), 0.0);
        assert!((normalize_db(0.0) - 1.0).abs() < 1e-6);
        assert!((normalize_db(-60.0) - 0.5).abs() < 1e-6);
        // Above 0 dB saturates
        assert_eq!(normalize_db(12.0), 1.0);
    }
}
