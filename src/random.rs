//! Small deterministic pseudo-random source
//!
//! SplitMix64 stepping, enough for flicker dwell times, tone hops and
//! the digits shown by the display programs. Seeded once at boot.

/// SplitMix64 generator
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next raw 32-bit value
    #[allow(clippy::cast_possible_truncation)]
    pub const fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        (z ^ (z >> 31)) as u32
    }

    /// Value in `[min, max)`. Returns `min` when the range is empty.
    pub const fn range(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + self.next_u32() % (max - min)
    }

    /// Random ASCII decimal digit
    #[allow(clippy::cast_possible_truncation)]
    pub const fn digit(&mut self) -> u8 {
        b'0' + self.range(0, 10) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn test_range_stays_in_bounds() {
        let mut rng = Rng::new(7);
        for _ in 0..1000 {
            let v = rng.range(40, 255);
            assert!((40..255).contains(&v));
        }
        assert_eq!(rng.range(9, 9), 9);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }
}
