use rand::SeedableRng;
use rand_core::{impls, RngCore};

/// Vigna's SplitMix64. One word of state, full 64-bit output, and a seeded
/// instance reproduces the same stream on every platform, which is what
/// makes training runs repeatable.
#[derive(Clone, Copy, Debug)]
pub struct SplitMix64 {
    state: u64,
}

impl RngCore for SplitMix64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SplitMix64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        SplitMix64 {
            state: u64::from_le_bytes(seed),
        }
    }

    fn seed_from_u64(state: u64) -> Self {
        SplitMix64 { state }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn seeded_streams_are_reproducible() {
        let mut a = SplitMix64::seed_from_u64(1234);
        let mut b = SplitMix64::seed_from_u64(1234);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }

        let mut c = SplitMix64::seed_from_u64(4321);
        assert_ne!(
            SplitMix64::seed_from_u64(1234).next_u64(),
            c.next_u64()
        );
    }

    #[test]
    fn known_answer_from_seed_zero() {
        // Reference values for the zero seed.
        let mut rng = SplitMix64::seed_from_u64(0);
        assert_eq!(rng.next_u64(), 0xE220A8397B1DCDAF);
        assert_eq!(rng.next_u64(), 0x6E789E6AA1B965F4);
        assert_eq!(rng.next_u64(), 0x06C45D188009454F);
    }

    #[test]
    fn ranges_are_deterministic_per_seed() {
        let mut a = SplitMix64::seed_from_u64(9);
        let mut b = SplitMix64::seed_from_u64(9);
        for _ in 0..32 {
            assert_eq!(a.gen_range(-10.0f32..10.0), b.gen_range(-10.0f32..10.0));
        }
    }
}
