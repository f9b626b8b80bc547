use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const MIN_WEIGHT: u32 = 1;
pub const MAX_WEIGHT: u32 = 10;

/// Source of link costs. Called once per link, with the two endpoint strings.
pub trait LinkWeigher {
    fn weigh(&mut self, a: &str, b: &str) -> u32;
}

impl<F> LinkWeigher for F
where
    F: FnMut(&str, &str) -> u32,
{
    fn weigh(&mut self, a: &str, b: &str) -> u32 {
        self(a, b)
    }
}

/// Uniform weights in `MIN_WEIGHT..=MAX_WEIGHT`.
pub struct RandomWeights {
    rng: StdRng,
}

impl RandomWeights {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomWeights {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkWeigher for RandomWeights {
    fn weigh(&mut self, _a: &str, _b: &str) -> u32 {
        self.rng.gen_range(MIN_WEIGHT..=MAX_WEIGHT)
    }
}

/// Same weight for every link.
#[derive(Debug, Clone, Copy)]
pub struct FixedWeight(pub u32);

impl LinkWeigher for FixedWeight {
    fn weigh(&mut self, _a: &str, _b: &str) -> u32 {
        self.0
    }
}
