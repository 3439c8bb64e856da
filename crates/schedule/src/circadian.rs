//! Time-of-day multipliers for hormone and salvage-enzyme overlays.
//!
//! These are assignment curves, not ODE terms: each tick the driver sets the
//! affected level from its baseline times the multiplier, so the overlay
//! never accumulates across ticks.

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Cortisol multiplier over the day: sharp morning peak, long decline into
/// an afternoon nadir, a small evening bump, low overnight.
pub fn cortisol_multiplier(hour: f64) -> f64 {
    let h = hour.rem_euclid(24.0);
    if h < 2.0 {
        0.6
    } else if h < 6.0 {
        0.4
    } else if h < 8.0 {
        lerp(1.3, 1.5, (h - 6.0) / 2.0)
    } else if h < 14.0 {
        lerp(1.4, 0.6, (h - 8.0) / 6.0)
    } else if h < 17.0 {
        lerp(0.7, 0.55, (h - 14.0) / 3.0)
    } else if h < 20.0 {
        lerp(0.7, 0.85, (h - 17.0) / 3.0)
    } else {
        0.6
    }
}

/// Melatonin is high outside 07:00-22:00, suppressed during the day.
pub fn melatonin_multiplier(hour: f64) -> f64 {
    let h = hour.rem_euclid(24.0);
    if h < 7.0 || h > 22.0 {
        2.0
    } else {
        0.1
    }
}

/// NAMPT (NAD+ salvage) runs faster at night.
pub fn nampt_multiplier(hour: f64) -> f64 {
    let h = hour.rem_euclid(24.0);
    if h < 6.0 || h > 20.0 {
        1.3
    } else {
        0.8
    }
}

/// Adenosine sleep pressure: builds 8% per hour awake, saturating at 2x.
pub fn sleep_pressure(hours_since_wake: f64) -> f64 {
    (1.0 + hours_since_wake.max(0.0) * 0.08).min(2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cortisol_peaks_in_the_morning() {
        let peak = cortisol_multiplier(7.5);
        assert!(peak > 1.3 && peak <= 1.5);
        // morning peak dominates every other phase
        for h in [0.0, 4.0, 11.0, 15.0, 18.0, 21.0] {
            assert!(cortisol_multiplier(h) < peak);
        }
    }

    #[test]
    fn cortisol_envelopes_match_phases() {
        assert_relative_eq!(cortisol_multiplier(21.0), 0.6);
        assert_relative_eq!(cortisol_multiplier(1.0), 0.6);
        assert_relative_eq!(cortisol_multiplier(4.0), 0.4);
        let nadir = cortisol_multiplier(16.0);
        assert!(nadir > 0.5 && nadir < 0.7);
    }

    #[test]
    fn cortisol_wraps_past_midnight() {
        assert_relative_eq!(cortisol_multiplier(25.0), cortisol_multiplier(1.0));
        assert_relative_eq!(cortisol_multiplier(-2.0), cortisol_multiplier(22.0));
    }

    #[test]
    fn melatonin_is_nocturnal() {
        assert_relative_eq!(melatonin_multiplier(23.0), 2.0);
        assert_relative_eq!(melatonin_multiplier(3.0), 2.0);
        assert_relative_eq!(melatonin_multiplier(12.0), 0.1);
    }

    #[test]
    fn nampt_salvage_rises_at_night() {
        assert_relative_eq!(nampt_multiplier(22.0), 1.3);
        assert_relative_eq!(nampt_multiplier(12.0), 0.8);
    }

    #[test]
    fn sleep_pressure_saturates() {
        assert_relative_eq!(sleep_pressure(0.0), 1.0);
        assert_relative_eq!(sleep_pressure(5.0), 1.4);
        assert_relative_eq!(sleep_pressure(20.0), 2.0);
        assert_relative_eq!(sleep_pressure(-1.0), 1.0);
    }
}
