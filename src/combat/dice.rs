//! Random rolls used by combat.
//!
//! Combat never touches an RNG directly. Every roll goes through [`Dice`], so
//! the game can use a thread or seeded RNG while tests force exact outcomes.

use rand::Rng;

/// Source of the two kinds of roll combat needs.
pub trait Dice {
    /// Returns true with the given probability (expected in `[0, 1]`).
    fn roll_chance(&mut self, probability: f64) -> bool;

    /// Uniform multiplier in `[min, max)`.
    fn roll_range(&mut self, min: f64, max: f64) -> f64;
}

/// Adapts any [`rand::Rng`] into [`Dice`].
#[derive(Debug, Clone)]
pub struct RngDice<R> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Dice for RngDice<R> {
    fn roll_chance(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    fn roll_range(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}

/// Deterministic dice: every chance roll answers `chance`, every range roll
/// answers `multiplier`.
#[derive(Debug, Clone, Copy)]
pub struct FixedDice {
    pub chance: bool,
    pub multiplier: f64,
}

impl FixedDice {
    /// Never dodges, never triggers specials, attacks hit for exactly their base power.
    pub fn steady() -> Self {
        Self {
            chance: false,
            multiplier: 1.0,
        }
    }

    /// Every chance roll succeeds.
    pub fn lucky() -> Self {
        Self {
            chance: true,
            multiplier: 1.0,
        }
    }
}

impl Dice for FixedDice {
    fn roll_chance(&mut self, _probability: f64) -> bool {
        self.chance
    }

    fn roll_range(&mut self, _min: f64, _max: f64) -> f64 {
        self.multiplier
    }
}
