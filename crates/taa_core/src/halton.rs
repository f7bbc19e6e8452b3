//! Halton jitter sequence.
//!
//! Offsets are raw Halton values in [0,1) per axis (radix 2 for x, radix 3 for
//! y), expressed in pixels. Index 0 yields (0,0), so the first frame after a
//! reset renders un-jittered.

use glam::Vec2;

/// Number of distinct jitter samples before the sequence repeats.
pub const DEFAULT_PERIOD: u32 = 16;

/// Radical inverse of `index` in `radix`. Returns 0.0 for index 0 or radix < 2.
pub fn halton(index: u32, radix: u32) -> f32 {
    if radix < 2 {
        return 0.0;
    }
    let r = radix as f32;
    let mut i = index;
    let mut fraction = 1.0 / r;
    let mut result = 0.0f32;
    while i > 0 {
        result += (i % radix) as f32 * fraction;
        i /= radix;
        fraction /= r;
    }
    result
}

/// Per-frame jitter generator; owns the sample counter.
#[derive(Debug, Clone)]
pub struct HaltonJitter {
    sample_index: u32,
    period: u32,
}

impl Default for HaltonJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl HaltonJitter {
    pub fn new() -> Self {
        Self::with_period(DEFAULT_PERIOD)
    }

    /// A period of 0 is treated as 1 (always index 0, no jitter).
    pub fn with_period(period: u32) -> Self {
        Self {
            sample_index: 0,
            period: period.max(1),
        }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Index the next call to `next_offset` will sample.
    pub fn sample_index(&self) -> u32 {
        self.sample_index
    }

    pub fn peek(&self) -> Vec2 {
        Vec2::new(halton(self.sample_index, 2), halton(self.sample_index, 3))
    }

    /// Offset for the current index, then advance (wrapping at the period).
    pub fn next_offset(&mut self) -> Vec2 {
        let offset = self.peek();
        self.sample_index += 1;
        if self.sample_index >= self.period {
            self.sample_index = 0;
        }
        offset
    }

    pub fn reset(&mut self) {
        self.sample_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn halton_known_values() {
        assert_eq!(halton(0, 2), 0.0);
        assert_abs_diff_eq!(halton(1, 2), 0.5);
        assert_abs_diff_eq!(halton(2, 2), 0.25);
        assert_abs_diff_eq!(halton(3, 2), 0.75);
        assert_abs_diff_eq!(halton(1, 3), 1.0 / 3.0);
        assert_abs_diff_eq!(halton(2, 3), 2.0 / 3.0);
        assert_abs_diff_eq!(halton(3, 3), 1.0 / 9.0, epsilon = 1e-7);
    }

    #[test]
    fn halton_stays_in_unit_interval() {
        for radix in [2u32, 3] {
            for i in 0..1000 {
                let v = halton(i, radix);
                assert!((0.0..1.0).contains(&v), "halton({i},{radix}) = {v}");
            }
        }
    }

    #[test]
    fn degenerate_radix_is_zero() {
        assert_eq!(halton(7, 0), 0.0);
        assert_eq!(halton(7, 1), 0.0);
    }

    #[test]
    fn counter_wraps_at_period() {
        let mut j = HaltonJitter::new();
        let first: Vec<Vec2> = (0..16).map(|_| j.next_offset()).collect();
        assert_eq!(j.sample_index(), 0);
        let second: Vec<Vec2> = (0..16).map(|_| j.next_offset()).collect();
        assert_eq!(first, second);
        assert_eq!(first[0], Vec2::ZERO);
        assert_ne!(first[1], Vec2::ZERO);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut j = HaltonJitter::new();
        j.next_offset();
        let p = j.peek();
        assert_eq!(j.sample_index(), 1);
        assert_eq!(j.next_offset(), p);
    }

    #[test]
    fn zero_period_clamps_to_one() {
        let mut j = HaltonJitter::with_period(0);
        assert_eq!(j.period(), 1);
        for _ in 0..4 {
            assert_eq!(j.next_offset(), Vec2::ZERO);
        }
    }
}
