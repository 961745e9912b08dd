//! Injectable randomness for every probability gate and bank draw.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of randomness. `roll` drives Bernoulli gates (`roll() < p`),
/// `pick_index` drives uniform bank draws.
pub trait RandomSource: Send {
    /// Uniform draw in `[0, 1)`
    fn roll(&mut self) -> f64;

    /// Uniform index in `0..len`. Callers never pass `len == 0`.
    fn pick_index(&mut self, len: usize) -> usize;

    fn chance(&mut self, probability: f64) -> bool {
        self.roll() < probability
    }
}

/// Default source backed by `StdRng`
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededDice {
    fn roll(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Replays scripted outcomes, for deterministic replays and tests.
///
/// Once the roll script runs out every roll is `0.999`, so no gate fires.
/// Once the pick script runs out every pick is `0`.
#[derive(Debug, Default, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<f64>,
    picks: VecDeque<usize>,
}

impl ScriptedDice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rolls(mut self, rolls: &[f64]) -> Self {
        self.rolls.extend(rolls.iter().copied());
        self
    }

    pub fn with_picks(mut self, picks: &[usize]) -> Self {
        self.picks.extend(picks.iter().copied());
        self
    }
}

impl RandomSource for ScriptedDice {
    fn roll(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(0.999)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len.max(1)
    }
}

/// Uniformly pick an entry from a bank; `None` for an empty bank.
pub fn pick<'a, T>(dice: &mut dyn RandomSource, bank: &'a [T]) -> Option<&'a T> {
    if bank.is_empty() {
        return None;
    }
    bank.get(dice.pick_index(bank.len()))
}
