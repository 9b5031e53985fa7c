//! Seeded mulberry32 stream.
//!
//! Every random decision in a run draws from one [`Mulberry32`] in a fixed
//! order, so the generator's output sequence is part of the reproducibility
//! contract for `(plan, scenario, seed)` triples.

use rand::rand_core::{RngCore, SeedableRng, impls};

/// 32-bit mulberry32 generator.
///
/// Implements [`RngCore`] so it can stand in anywhere a `rand` generator is
/// expected, but the engine itself only calls [`Mulberry32::next_unit`].
///
/// # Examples
///
/// ```
/// use gridcase_sim::sim::rng::Mulberry32;
///
/// let mut a = Mulberry32::new(42);
/// let mut b = Mulberry32::new(42);
/// assert_eq!(a.next_unit(), b.next_unit());
/// ```
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn advance(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let a = self.state;
        let mut t = (a ^ (a >> 15)).wrapping_mul(1 | a);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        t ^ (t >> 14)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        f64::from(self.advance()) / 4_294_967_296.0
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        impls::fill_bytes_via_next(self, dst);
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    /// Folds the high half into the low half, so seeds below `2^32` map to
    /// the same stream as [`Mulberry32::new`].
    fn seed_from_u64(state: u64) -> Self {
        Self::new((state ^ (state >> 32)) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_sequence() {
        let mut rng = Mulberry32::new(42);
        assert_eq!(rng.next_u32(), 2_581_720_956);
        assert_eq!(rng.next_u32(), 1_925_393_290);
        assert_eq!(rng.next_u32(), 3_661_312_704);

        let mut zero = Mulberry32::new(0);
        assert_eq!(zero.next_u32(), 1_144_304_738);
        assert_eq!(zero.next_u32(), 1_416_247);
    }

    #[test]
    fn unit_draws_stay_in_half_open_range() {
        let mut rng = Mulberry32::new(7);
        for _ in 0..10_000 {
            let x = rng.next_unit();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn unit_draw_is_u32_over_two_pow_32() {
        let mut a = Mulberry32::new(42);
        let mut b = Mulberry32::new(42);
        assert_eq!(a.next_unit(), f64::from(b.next_u32()) / 4_294_967_296.0);
    }

    #[test]
    fn from_seed_is_little_endian_u32() {
        let mut a = Mulberry32::from_seed(42_u32.to_le_bytes());
        let mut b = Mulberry32::new(42);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn seed_from_u64_keeps_high_bits() {
        let mut small = Mulberry32::seed_from_u64(42);
        let mut direct = Mulberry32::new(42);
        assert_eq!(small.next_u32(), direct.next_u32());

        let mut zero = Mulberry32::seed_from_u64(0);
        let mut high = Mulberry32::seed_from_u64(1 << 32);
        assert_ne!(zero.next_u32(), high.next_u32());
    }
}
