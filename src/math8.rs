use embassy_time::Duration;

/// Scale an 8-bit value by a factor (0-255 = 0.0-1.0)
///
/// Uses integer math for efficiency on embedded systems.
#[inline]
#[allow(clippy::cast_lossless, clippy::cast_possible_truncation)]
pub const fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (1 + scale as u16)) >> 8) as u8
}

/// Linear interpolation between two 8-bit values by `num / den`
///
/// `num` is clamped to `den`. A zero denominator returns `to`.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
pub const fn lerp8(from: u8, to: u8, num: u64, den: u64) -> u8 {
    if den == 0 || num >= den {
        return to;
    }
    if to >= from {
        from + (((to - from) as u64 * num) / den) as u8
    } else {
        from - (((from - to) as u64 * num) / den) as u8
    }
}

/// Linear interpolation between two frequencies by `num / den`
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
pub const fn lerp16(from: u16, to: u16, num: u64, den: u64) -> u16 {
    if den == 0 || num >= den {
        return to;
    }
    if to >= from {
        from + (((to - from) as u64 * num) / den) as u16
    } else {
        from - (((from - to) as u64 * num) / den) as u16
    }
}

/// Triangle wave between `min` and `max` with the given period
///
/// Rises during the first half of the period and falls during the second.
#[allow(clippy::cast_possible_truncation)]
pub const fn triangle8(elapsed: Duration, period: Duration, min: u8, max: u8) -> u8 {
    let period_ms = period.as_millis();
    if period_ms < 2 {
        return max;
    }
    let half = period_ms / 2;
    let t = elapsed.as_millis() % period_ms;
    if t < half {
        lerp8(min, max, t, half)
    } else {
        lerp8(max, min, t - half, period_ms - half)
    }
}
