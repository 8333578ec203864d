//! Combatants and the turn-based battle state machine.

pub mod dice;
pub mod logic;
pub mod types;

pub use dice::{Dice, FixedDice, RngDice};
pub use logic::*;
pub use types::*;
