use std::fmt;
use std::ops::{Add, AddAssign};

/// A 32-bit sequence number as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wrap32 {
    raw: u32,
}

impl Wrap32 {
    const WRAP_SIZE: u64 = 1 << 32;
    const LOW_MASK: u64 = Self::WRAP_SIZE - 1;

    pub fn new(raw: u32) -> Self {
        Wrap32 { raw }
    }

    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// Wrap an absolute `seq_no` given the `zero_point` (initial seq_no)
    pub fn wrap(n: u64, zero_point: Wrap32) -> Self {
        Wrap32::new((n as u32).wrapping_add(zero_point.raw))
    }

    /// Unwrap to the absolute `seq_no` closest to `checkpoint`.
    ///
    /// On an exact half-wrap tie the smaller candidate wins.
    pub fn unwrap(&self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        let offset = self.raw.wrapping_sub(zero_point.raw) as u64;
        let same_wrap = (checkpoint & !Self::LOW_MASK) | offset;

        // Candidates in ascending order, so `<` keeps the lower one on ties
        let candidates = [
            same_wrap.checked_sub(Self::WRAP_SIZE),
            Some(same_wrap),
            same_wrap.checked_add(Self::WRAP_SIZE),
        ];

        let mut best = same_wrap;
        for candidate in candidates.into_iter().flatten() {
            if candidate.abs_diff(checkpoint) < best.abs_diff(checkpoint) {
                best = candidate;
            } else if candidate.abs_diff(checkpoint) == best.abs_diff(checkpoint) {
                best = best.min(candidate);
            }
        }
        best
    }
}

impl Add for Wrap32 {
    type Output = Wrap32;

    fn add(self, other: Wrap32) -> Wrap32 {
        Wrap32::new(self.raw.wrapping_add(other.raw))
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, n: u32) -> Wrap32 {
        Wrap32::new(self.raw.wrapping_add(n))
    }
}

impl AddAssign<u32> for Wrap32 {
    fn add_assign(&mut self, n: u32) {
        self.raw = self.raw.wrapping_add(n);
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

// -- Unit tests --
