use serde::{Deserialize, Serialize};

use super::dice::Dice;
use crate::core::constants::*;

/// The player's character. Survives across battles; only a restart resets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub hp: i32,
    pub max_hp: i32,
    pub magic_level: u32,
    pub strength_level: u32,
    /// Dodge probability. Upgrades add to it without a cap, rolls clamp it.
    pub speed: f64,
    pub coins: u32,
    /// Floor the hero is currently on, for telemetry context.
    pub current_level: u32,
}

impl Default for Hero {
    fn default() -> Self {
        Self::new()
    }
}

impl Hero {
    pub fn new() -> Self {
        Self {
            hp: HERO_BASE_HP,
            max_hp: HERO_BASE_HP,
            magic_level: HERO_BASE_MAGIC_LEVEL,
            strength_level: HERO_BASE_STRENGTH_LEVEL,
            speed: HERO_BASE_SPEED,
            coins: HERO_BASE_COINS,
            current_level: STARTING_FLOOR,
        }
    }

    pub fn attack_magic(&self) -> i32 {
        self.magic_level as i32 * DAMAGE_PER_LEVEL
    }

    pub fn attack_strength(&self) -> i32 {
        self.strength_level as i32 * DAMAGE_PER_LEVEL
    }

    /// Damage the hero takes from `incoming` while defending. Never negative.
    pub fn defend(&self, incoming: i32) -> i32 {
        (incoming - self.strength_level as i32 * DEFENSE_PER_STRENGTH_LEVEL).max(0)
    }

    /// Heals by the magic amount, capped at max HP. Returns the HP actually gained.
    pub fn heal(&mut self) -> i32 {
        let before = self.hp;
        self.hp = self
            .max_hp
            .min(self.hp + self.magic_level as i32 * HEAL_PER_MAGIC_LEVEL);
        self.hp - before
    }

    /// Restores up to `amount` HP without exceeding max HP. Returns the HP gained.
    pub fn restore_hp(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = self.max_hp.min(self.hp + amount);
        self.hp - before
    }

    pub fn dodge_chance(&self) -> f64 {
        self.speed.clamp(0.0, 1.0)
    }

    pub fn dodge(&self, dice: &mut impl Dice) -> bool {
        dice.roll_chance(self.dodge_chance())
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp -= amount;
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Normal,
    Boss,
}

/// An opponent for one floor. Its level never changes; a new floor means a new enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    level: u32,
    kind: EnemyKind,
    pub hp: i32,
    pub max_hp: i32,
    pub attack_power: i32,
}

fn milestone_bonus(level: u32, bonus: i32) -> i32 {
    if level % ENEMY_MILESTONE_INTERVAL == 0 {
        bonus
    } else {
        0
    }
}

/// Base HP for a normal enemy of `level` (1-based).
pub fn enemy_base_hp(level: u32) -> i32 {
    let steps = level.saturating_sub(1) as i32;
    ENEMY_BASE_HP + steps * ENEMY_HP_PER_LEVEL + milestone_bonus(level, ENEMY_MILESTONE_HP_BONUS)
}

/// Base attack power for a normal enemy of `level` (1-based).
pub fn enemy_base_attack(level: u32) -> i32 {
    let steps = level.saturating_sub(1) as i32;
    ENEMY_BASE_ATTACK
        + steps * ENEMY_ATTACK_PER_LEVEL
        + milestone_bonus(level, ENEMY_MILESTONE_ATTACK_BONUS)
}

impl Enemy {
    pub fn new(level: u32) -> Self {
        let level = level.max(1);
        let max_hp = enemy_base_hp(level);
        Self {
            level,
            kind: EnemyKind::Normal,
            hp: max_hp,
            max_hp,
            attack_power: enemy_base_attack(level),
        }
    }

    pub fn boss(level: u32) -> Self {
        let level = level.max(1);
        let max_hp = enemy_base_hp(level) * BOSS_HP_MULTIPLIER;
        Self {
            level,
            kind: EnemyKind::Boss,
            hp: max_hp,
            max_hp,
            attack_power: (enemy_base_attack(level) as f64 * BOSS_ATTACK_MULTIPLIER) as i32,
        }
    }

    pub fn of_kind(level: u32, kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Normal => Self::new(level),
            EnemyKind::Boss => Self::boss(level),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub fn is_boss(&self) -> bool {
        self.kind == EnemyKind::Boss
    }

    /// Regular hit: 80-120% of attack power, truncated.
    pub fn attack(&self, dice: &mut impl Dice) -> i32 {
        let variance = dice.roll_range(ENEMY_ATTACK_VARIANCE_MIN, ENEMY_ATTACK_VARIANCE_MAX);
        (self.attack_power as f64 * variance).max(0.0) as i32
    }

    /// Heavy hit: 150-250% of attack power. Only bosses have one.
    pub fn special_attack(&self, dice: &mut impl Dice) -> Option<i32> {
        match self.kind {
            EnemyKind::Normal => None,
            EnemyKind::Boss => {
                let variance =
                    dice.roll_range(BOSS_SPECIAL_VARIANCE_MIN, BOSS_SPECIAL_VARIANCE_MAX);
                Some((self.attack_power as f64 * variance).max(0.0) as i32)
            }
        }
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp -= amount;
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }

    pub fn label(&self) -> String {
        match self.kind {
            EnemyKind::Normal => format!("Lvl {} Enemy", self.level),
            EnemyKind::Boss => format!("BOSS Lvl {}", self.level),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackKind {
    Magic,
    Strength,
}

impl AttackKind {
    /// Value written to the `attack_type` telemetry column.
    pub fn label(self) -> &'static str {
        match self {
            AttackKind::Magic => "Magic",
            AttackKind::Strength => "Strength",
        }
    }
}

/// One hero decision per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeroAction {
    MagicAttack,
    StrengthAttack,
    Defend,
    Heal,
}

impl HeroAction {
    pub const ALL: [HeroAction; 4] = [
        HeroAction::MagicAttack,
        HeroAction::StrengthAttack,
        HeroAction::Defend,
        HeroAction::Heal,
    ];

    /// Skill name, as recorded in the `skill_name` telemetry column.
    pub fn skill_name(self) -> &'static str {
        match self {
            HeroAction::MagicAttack => "Magic Attack",
            HeroAction::StrengthAttack => "Strength Attack",
            HeroAction::Defend => "Defend",
            HeroAction::Heal => "Heal",
        }
    }

    pub fn attack_kind(self) -> Option<AttackKind> {
        match self {
            HeroAction::MagicAttack => Some(AttackKind::Magic),
            HeroAction::StrengthAttack => Some(AttackKind::Strength),
            HeroAction::Defend | HeroAction::Heal => None,
        }
    }

    /// Maps a menu key (1-4 or the action's initial) to an action.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            '1' | 'm' => Some(HeroAction::MagicAttack),
            '2' | 's' => Some(HeroAction::StrengthAttack),
            '3' | 'd' => Some(HeroAction::Defend),
            '4' | 'h' => Some(HeroAction::Heal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::dice::FixedDice;

    #[test]
    fn test_hero_defaults() {
        let hero = Hero::new();
        assert_eq!(hero.hp, 100);
        assert_eq!(hero.max_hp, 100);
        assert_eq!(hero.magic_level, 3);
        assert_eq!(hero.strength_level, 3);
        assert_eq!(hero.coins, 0);
        assert!((hero.speed - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hero_attacks_scale_with_levels() {
        let mut hero = Hero::new();
        assert_eq!(hero.attack_magic(), 30);
        assert_eq!(hero.attack_strength(), 30);
        hero.magic_level = 5;
        hero.strength_level = 7;
        assert_eq!(hero.attack_magic(), 50);
        assert_eq!(hero.attack_strength(), 70);
    }

    #[test]
    fn test_defend_reduces_and_floors_at_zero() {
        let hero = Hero::new();
        assert_eq!(hero.defend(20), 14);
        assert_eq!(hero.defend(6), 0);
        assert_eq!(hero.defend(3), 0);
    }

    #[test]
    fn test_heal_near_full_reports_actual_amount() {
        let mut hero = Hero::new();
        hero.hp = 95;
        assert_eq!(hero.heal(), 5);
        assert_eq!(hero.hp, 100);
        assert_eq!(hero.heal(), 0);
    }

    #[test]
    fn test_heal_from_low_hp() {
        let mut hero = Hero::new();
        hero.hp = 40;
        assert_eq!(hero.heal(), 30);
        assert_eq!(hero.hp, 70);
    }

    #[test]
    fn test_dodge_chance_is_clamped() {
        let mut hero = Hero::new();
        hero.speed = 1.7;
        assert_eq!(hero.dodge_chance(), 1.0);
        hero.speed = -0.2;
        assert_eq!(hero.dodge_chance(), 0.0);
    }

    #[test]
    fn test_enemy_scaling_level_one() {
        let enemy = Enemy::new(1);
        assert_eq!(enemy.hp, 80);
        assert_eq!(enemy.max_hp, 80);
        assert_eq!(enemy.attack_power, 15);
        assert!(!enemy.is_boss());
    }

    #[test]
    fn test_enemy_milestone_applies_at_level_five_not_six() {
        let five = Enemy::new(5);
        assert_eq!(five.hp, 210);
        assert_eq!(five.attack_power, 62);

        let six = Enemy::new(6);
        assert_eq!(six.hp, 80 + 5 * 20);
        assert_eq!(six.attack_power, 15 + 5 * 8);
    }

    #[test]
    fn test_enemy_level_zero_is_treated_as_one() {
        assert_eq!(Enemy::new(0), Enemy::new(1));
    }

    #[test]
    fn test_boss_scaling_level_one() {
        let boss = Enemy::boss(1);
        assert_eq!(boss.hp, 160);
        assert_eq!(boss.attack_power, 22);
        assert!(boss.is_boss());
    }

    #[test]
    fn test_enemy_attack_uses_variance() {
        let enemy = Enemy::new(1);
        let mut dice = FixedDice::steady();
        assert_eq!(enemy.attack(&mut dice), 15);

        dice.multiplier = 1.2;
        assert_eq!(enemy.attack(&mut dice), 18);

        dice.multiplier = 0.8;
        assert_eq!(enemy.attack(&mut dice), 12);
    }

    #[test]
    fn test_special_attack_only_for_bosses() {
        let mut dice = FixedDice {
            chance: false,
            multiplier: 2.0,
        };
        assert_eq!(Enemy::new(3).special_attack(&mut dice), None);
        assert_eq!(Enemy::boss(1).special_attack(&mut dice), Some(44));
    }

    #[test]
    fn test_enemy_hp_can_go_negative() {
        let mut enemy = Enemy::new(1);
        enemy.take_damage(90);
        assert_eq!(enemy.hp, -10);
        assert!(enemy.is_defeated());
    }

    #[test]
    fn test_action_keys() {
        assert_eq!(HeroAction::from_key('1'), Some(HeroAction::MagicAttack));
        assert_eq!(HeroAction::from_key('S'), Some(HeroAction::StrengthAttack));
        assert_eq!(HeroAction::from_key('d'), Some(HeroAction::Defend));
        assert_eq!(HeroAction::from_key('4'), Some(HeroAction::Heal));
        assert_eq!(HeroAction::from_key('x'), None);
    }
}
