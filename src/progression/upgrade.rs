use serde::Serialize;

use crate::combat::types::Hero;
use crate::core::constants::*;

/// Post-victory stat upgrade. Each also pays a flat coin bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Upgrade {
    Strength,
    Magic,
    Speed,
    Health,
}

impl Upgrade {
    pub const ALL: [Upgrade; 4] = [
        Upgrade::Strength,
        Upgrade::Magic,
        Upgrade::Speed,
        Upgrade::Health,
    ];

    /// Stat name written to the `stat_upgraded` telemetry column.
    pub fn stat_name(self) -> &'static str {
        match self {
            Upgrade::Strength => "Strength",
            Upgrade::Magic => "Magic",
            Upgrade::Speed => "Speed",
            Upgrade::Health => "Health",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Upgrade::Strength => "Strength +1",
            Upgrade::Magic => "Magic +1",
            Upgrade::Speed => "Speed +0.1",
            Upgrade::Health => "Health +50",
        }
    }

    pub fn from_key(key: char) -> Option<Self> {
        match key {
            '1' => Some(Upgrade::Strength),
            '2' => Some(Upgrade::Magic),
            '3' => Some(Upgrade::Speed),
            '4' => Some(Upgrade::Health),
            _ => None,
        }
    }

    /// Applies the upgrade and its coin bonus. Returns the stat's new value
    /// (max HP for Health).
    pub fn apply(self, hero: &mut Hero) -> f64 {
        let new_value = match self {
            Upgrade::Strength => {
                hero.strength_level += UPGRADE_STRENGTH_AMOUNT;
                hero.strength_level as f64
            }
            Upgrade::Magic => {
                hero.magic_level += UPGRADE_MAGIC_AMOUNT;
                hero.magic_level as f64
            }
            Upgrade::Speed => {
                // Rounded to hundredths so repeated +0.1 steps stay exact.
                hero.speed = ((hero.speed + UPGRADE_SPEED_AMOUNT) * 100.0).round() / 100.0;
                hero.speed
            }
            Upgrade::Health => {
                hero.max_hp += UPGRADE_HEALTH_AMOUNT;
                hero.hp += UPGRADE_HEALTH_AMOUNT;
                hero.max_hp as f64
            }
        };
        hero.coins += UPGRADE_COIN_BONUS;
        new_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_and_magic() {
        let mut hero = Hero::new();
        assert_eq!(Upgrade::Strength.apply(&mut hero), 4.0);
        assert_eq!(Upgrade::Magic.apply(&mut hero), 4.0);
        assert_eq!(hero.strength_level, 4);
        assert_eq!(hero.magic_level, 4);
        assert_eq!(hero.coins, 20);
    }

    #[test]
    fn test_speed_steps_stay_exact_and_uncapped() {
        let mut hero = Hero::new();
        for _ in 0..12 {
            Upgrade::Speed.apply(&mut hero);
        }
        assert_eq!(hero.speed, 1.3);
        assert_eq!(hero.dodge_chance(), 1.0);
    }

    #[test]
    fn test_health_raises_both_hp_values() {
        let mut hero = Hero::new();
        hero.hp = 40;
        assert_eq!(Upgrade::Health.apply(&mut hero), 150.0);
        assert_eq!(hero.max_hp, 150);
        assert_eq!(hero.hp, 90);
        assert_eq!(hero.coins, 10);
    }

    #[test]
    fn test_keys() {
        let keys: Vec<Option<Upgrade>> = ['1', '2', '3', '4', '5']
            .iter()
            .map(|&k| Upgrade::from_key(k))
            .collect();
        assert_eq!(
            keys,
            vec![
                Some(Upgrade::Strength),
                Some(Upgrade::Magic),
                Some(Upgrade::Speed),
                Some(Upgrade::Health),
                None
            ]
        );
    }
}
