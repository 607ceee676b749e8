// Seedable random source for song generation.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// Every random decision the composer makes (key choice, tempo offset,
// section lengths, bridge insertion, chord colour, melody notes, bridge
// instrument shuffles) draws from a `SongRng` that the caller constructs and
// passes in by `&mut`. There is no thread-local or global generator anywhere
// in the workspace, so a seed fully determines a song.
//
// On top of the raw generator this crate offers the handful of sampling
// helpers the composer needs: bounded integers without modulo bias,
// Bernoulli trials, uniform picks from a slice and an in-place shuffle.
//
// **Determinism.** Integer paths (`next_u64`, `range_*`, `pick`, `shuffle`)
// are bit-for-bit identical across platforms. `next_f64` and `chance` only
// use an exact integer-to-float conversion of 53 bits and one multiply.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ generator, the only source of randomness for composition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SongRng {
    s: [u64; 4],
}

impl SongRng {
    /// Create a generator from a `u64` seed.
    ///
    /// The seed is expanded into the 256-bit state with SplitMix64. Equal
    /// seeds give equal sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Create a generator seeded from operating-system entropy.
    ///
    /// Returns the seed alongside the generator so callers can log it and
    /// reproduce the run later with [`SongRng::new`].
    pub fn from_entropy() -> Result<(Self, u64), getrandom::Error> {
        let mut buf = [0u8; 8];
        getrandom::getrandom(&mut buf)?;
        let seed = u64::from_le_bytes(buf);
        Ok((Self::new(seed), seed))
    }

    /// Next raw `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform `f64` in [0, 1), built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)`.
    ///
    /// Rejection sampling keeps the distribution unbiased.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `u32` in `[low, high)`. Panics if `low >= high`.
    pub fn range_u32(&mut self, low: u32, high: u32) -> u32 {
        self.range_u64(u64::from(low), u64::from(high)) as u32
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Uniform `u32` in `[low, high]`. Panics if `low > high`.
    pub fn range_u32_inclusive(&mut self, low: u32, high: u32) -> u32 {
        assert!(low <= high, "range_u32_inclusive: low must be <= high");
        self.range_u64(u64::from(low), u64::from(high) + 1) as u32
    }

    /// `true` with probability `p`.
    ///
    /// `p <= 0.0` never fires and `p >= 1.0` always fires.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Fair coin.
    pub fn coin_flip(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }

    /// Uniformly chosen element, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        Some(&items[self.range_usize(0, items.len())])
    }

    /// Shuffle a slice in place (Fisher-Yates, back to front).
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range_usize(0, i + 1);
            items.swap(i, j);
        }
    }
}

/// SplitMix64 step, used only to expand a seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SongRng::new(7);
        let mut b = SongRng::new(7);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SongRng::new(7);
        let mut b = SongRng::new(8);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_stays_in_unit_interval() {
        let mut rng = SongRng::new(2024);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn range_u32_respects_half_open_bounds() {
        let mut rng = SongRng::new(31);
        let mut saw_low = false;
        let mut saw_top = false;
        for _ in 0..10_000 {
            let v = rng.range_u32(100, 130);
            assert!((100..130).contains(&v), "range_u32 out of range: {v}");
            saw_low |= v == 100;
            saw_top |= v == 129;
        }
        assert!(saw_low && saw_top, "both ends of the range should be reachable");
    }

    #[test]
    fn range_u32_inclusive_reaches_upper_bound() {
        let mut rng = SongRng::new(5);
        let mut saw_max = false;
        for _ in 0..10_000 {
            let v = rng.range_u32_inclusive(4, 8);
            assert!((4..=8).contains(&v), "inclusive range out of bounds: {v}");
            saw_max |= v == 8;
        }
        assert!(saw_max);
    }

    #[test]
    fn chance_extremes_are_exact() {
        let mut rng = SongRng::new(1);
        for _ in 0..200 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
        }
    }

    #[test]
    fn chance_tracks_probability() {
        let mut rng = SongRng::new(42);
        let n = 20_000;
        let hits = (0..n).filter(|_| rng.chance(0.3)).count();
        let pct = hits as f64 / n as f64;
        assert!((0.27..0.33).contains(&pct), "chance(0.3) fired {:.1}%", pct * 100.0);
    }

    #[test]
    fn coin_flip_is_roughly_fair() {
        let mut rng = SongRng::new(99);
        let n = 10_000;
        let heads = (0..n).filter(|_| rng.coin_flip()).count();
        let pct = heads as f64 / n as f64;
        assert!((0.45..0.55).contains(&pct), "coin_flip gave {:.1}% heads", pct * 100.0);
    }

    #[test]
    fn pick_handles_empty_and_single() {
        let mut rng = SongRng::new(3);
        let empty: [u8; 0] = [];
        assert_eq!(rng.pick(&empty), None);
        assert_eq!(rng.pick(&["only"]), Some(&"only"));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = SongRng::new(11);
        let mut items: Vec<u32> = (0..32).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
        assert_ne!(items, sorted, "32 elements should not shuffle to identity");
    }

    #[test]
    fn saved_state_resumes_the_stream() {
        let mut rng = SongRng::new(42);
        for _ in 0..50 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SongRng = serde_json::from_str(&json).unwrap();
        for _ in 0..50 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
