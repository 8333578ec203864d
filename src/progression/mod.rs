//! The run controller: floors, battles, rewards, upgrades and game over.
//!
//! A [`Run`] owns the hero and moves through [`RunPhase`]s:
//!
//! ```text
//! Exploring --start_battle--> InBattle --victory--> ChoosingUpgrade --choose_upgrade--> Exploring (next floor)
//!                                       \--defeat--> GameOver --restart--> Exploring (floor 1)
//! ```
//!
//! Shopping is only possible while exploring.

pub mod upgrade;

pub use upgrade::Upgrade;

use serde::Serialize;
use tracing::info;

use crate::combat::dice::Dice;
use crate::combat::logic::{Battle, TurnOutcome, TurnResult};
use crate::combat::types::{Enemy, EnemyKind, Hero, HeroAction};
use crate::core::constants::{STARTING_FLOOR, VICTORY_COIN_REWARD};
use crate::error::RunError;
use crate::shop::{self, ShopItem};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Shown when a run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub floors_reached: u32,
    pub enemies_defeated: u32,
}

#[derive(Debug, Clone)]
pub enum RunPhase {
    Exploring,
    InBattle(Battle),
    ChoosingUpgrade,
    GameOver(RunSummary),
}

impl RunPhase {
    pub fn name(&self) -> &'static str {
        match self {
            RunPhase::Exploring => "exploring",
            RunPhase::InBattle(_) => "in battle",
            RunPhase::ChoosingUpgrade => "choosing an upgrade",
            RunPhase::GameOver(_) => "the run is over",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Run {
    hero: Hero,
    floor: u32,
    enemies_defeated: u32,
    next_enemy: Enemy,
    phase: RunPhase,
    boss_every: Option<u32>,
}

impl Default for Run {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Run {
    /// Starts a fresh run on floor 1. `boss_every = Some(n)` makes every n-th
    /// floor a boss floor.
    pub fn new(boss_every: Option<u32>) -> Self {
        let boss_every = boss_every.filter(|&n| n > 0);
        Self {
            hero: Hero::new(),
            floor: STARTING_FLOOR,
            enemies_defeated: 0,
            next_enemy: enemy_for_floor(STARTING_FLOOR, boss_every),
            phase: RunPhase::Exploring,
            boss_every,
        }
    }

    pub fn hero(&self) -> &Hero {
        &self.hero
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn enemies_defeated(&self) -> u32 {
        self.enemies_defeated
    }

    /// The enemy waiting on the current floor.
    pub fn next_enemy(&self) -> &Enemy {
        &self.next_enemy
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    pub fn battle(&self) -> Option<&Battle> {
        match &self.phase {
            RunPhase::InBattle(battle) => Some(battle),
            _ => None,
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            floors_reached: self.floor,
            enemies_defeated: self.enemies_defeated,
        }
    }

    fn wrong_phase(&self, action: &'static str) -> RunError {
        RunError::WrongPhase {
            action,
            phase: self.phase.name(),
        }
    }

    pub fn start_battle(&mut self) -> Result<&Battle, RunError> {
        if !matches!(self.phase, RunPhase::Exploring) {
            return Err(self.wrong_phase("start a battle"));
        }

        self.hero.current_level = self.floor;
        self.phase = RunPhase::InBattle(Battle::new(self.next_enemy.clone(), self.floor));
        self.battle().ok_or_else(|| self.wrong_phase("start a battle"))
    }

    /// Plays one turn of the current battle and handles its outcome.
    pub fn submit_action<D: Dice>(
        &mut self,
        action: HeroAction,
        dice: &mut D,
        sink: &mut dyn TelemetrySink,
    ) -> Result<TurnOutcome, RunError> {
        let outcome = match &mut self.phase {
            RunPhase::InBattle(battle) => battle.submit_action(&mut self.hero, action, dice, sink)?,
            _ => return Err(self.wrong_phase("act")),
        };

        match outcome.result {
            TurnResult::Continue => {}
            TurnResult::Victory => {
                self.hero.coins += VICTORY_COIN_REWARD;
                self.enemies_defeated += 1;
                self.phase = RunPhase::ChoosingUpgrade;
                info!(floor = self.floor, coins = self.hero.coins, "floor cleared");
            }
            TurnResult::Defeat => {
                let summary = self.summary();
                self.phase = RunPhase::GameOver(summary);
                info!(
                    floors_reached = summary.floors_reached,
                    enemies_defeated = summary.enemies_defeated,
                    "run ended"
                );
            }
        }

        Ok(outcome)
    }

    /// Applies the chosen upgrade, records it, and moves to the next floor
    /// with a fresh enemy. Returns the upgraded stat's new value.
    pub fn choose_upgrade(
        &mut self,
        upgrade: Upgrade,
        sink: &mut dyn TelemetrySink,
    ) -> Result<f64, RunError> {
        if !matches!(self.phase, RunPhase::ChoosingUpgrade) {
            return Err(self.wrong_phase("upgrade"));
        }

        // Commit only once the row is on disk.
        let mut hero = self.hero.clone();
        let new_value = upgrade.apply(&mut hero);
        sink.record(
            self.floor,
            TelemetryEvent::upgrade(upgrade.stat_name(), new_value),
        )?;
        self.hero = hero;
        info!(stat = upgrade.stat_name(), new_value, "upgrade chosen");

        self.advance_floor();
        Ok(new_value)
    }

    fn advance_floor(&mut self) {
        self.floor += 1;
        self.hero.current_level = self.floor;
        self.next_enemy = enemy_for_floor(self.floor, self.boss_every);
        self.phase = RunPhase::Exploring;
        info!(
            floor = self.floor,
            enemy = %self.next_enemy.label(),
            hp = self.next_enemy.hp,
            attack = self.next_enemy.attack_power,
            "advanced to next floor"
        );
    }

    /// Buys the shop item in `slot` and records the purchase.
    pub fn buy(
        &mut self,
        slot: usize,
        sink: &mut dyn TelemetrySink,
    ) -> Result<&'static ShopItem, RunError> {
        if !matches!(self.phase, RunPhase::Exploring) {
            return Err(self.wrong_phase("shop"));
        }

        let mut hero = self.hero.clone();
        let item = shop::buy(&mut hero, slot)?;
        sink.record(self.floor, TelemetryEvent::item(item.name, item.cost))?;
        self.hero = hero;
        info!(item = item.name, cost = item.cost, coins = self.hero.coins, "item purchased");
        Ok(item)
    }

    /// Resets hero and floor after a game over.
    pub fn restart(&mut self) -> Result<(), RunError> {
        if !matches!(self.phase, RunPhase::GameOver(_)) {
            return Err(self.wrong_phase("restart"));
        }

        *self = Run::new(self.boss_every);
        info!("run restarted");
        Ok(())
    }
}

/// The enemy guarding `floor`. Boss floors only exist when `boss_every` is set.
pub fn enemy_for_floor(floor: u32, boss_every: Option<u32>) -> Enemy {
    let kind = match boss_every {
        Some(n) if n > 0 && floor % n == 0 => EnemyKind::Boss,
        _ => EnemyKind::Normal,
    };
    Enemy::of_kind(floor, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::dice::FixedDice;
    use crate::error::{BattleError, ShopError};
    use crate::telemetry::{Category, FailingSink, MemorySink};

    fn win_battle(run: &mut Run, sink: &mut MemorySink) {
        let mut dice = FixedDice::lucky();
        run.start_battle().unwrap();
        loop {
            let outcome = run
                .submit_action(HeroAction::MagicAttack, &mut dice, sink)
                .unwrap();
            if outcome.is_over() {
                assert_eq!(outcome.result, TurnResult::Victory);
                break;
            }
        }
    }

    #[test]
    fn test_new_run() {
        let run = Run::default();
        assert_eq!(run.floor(), 1);
        assert_eq!(run.enemies_defeated(), 0);
        assert_eq!(run.next_enemy(), &Enemy::new(1));
        assert!(matches!(run.phase(), RunPhase::Exploring));
        assert!(run.battle().is_none());
    }

    #[test]
    fn test_victory_grants_reward_and_waits_for_upgrade() {
        let mut run = Run::default();
        let mut sink = MemorySink::default();

        win_battle(&mut run, &mut sink);

        assert_eq!(run.hero().coins, 20);
        assert_eq!(run.enemies_defeated(), 1);
        assert!(matches!(run.phase(), RunPhase::ChoosingUpgrade));
        assert!(run.start_battle().is_err());
    }

    #[test]
    fn test_upgrade_advances_floor_with_fresh_enemy() {
        let mut run = Run::default();
        let mut sink = MemorySink::default();
        win_battle(&mut run, &mut sink);

        let value = run.choose_upgrade(Upgrade::Magic, &mut sink).unwrap();

        assert_eq!(value, 4.0);
        assert_eq!(run.hero().coins, 30);
        assert_eq!(run.floor(), 2);
        assert_eq!(run.next_enemy(), &Enemy::new(2));
        assert_eq!(run.hero().current_level, 2);
        assert!(matches!(run.phase(), RunPhase::Exploring));

        let upgrade = sink.events_in(Category::Upgrades).next().unwrap();
        assert_eq!(upgrade.floor, 1);
        assert_eq!(upgrade.event, TelemetryEvent::upgrade("Magic", 4.0));
    }

    #[test]
    fn test_hero_damage_carries_between_battles() {
        let mut run = Run::default();
        let mut sink = MemorySink::default();
        let mut dice = FixedDice::steady();
        run.start_battle().unwrap();
        while !run
            .submit_action(HeroAction::MagicAttack, &mut dice, &mut sink)
            .unwrap()
            .is_over()
        {}
        run.choose_upgrade(Upgrade::Strength, &mut sink).unwrap();

        // Two counterattacks of 15 landed on floor 1.
        assert_eq!(run.hero().hp, 70);
        run.start_battle().unwrap();
        assert_eq!(run.hero().hp, 70);
    }

    #[test]
    fn test_defeat_ends_run_and_restart_resets() {
        let mut run = Run::default();
        let mut sink = MemorySink::default();
        // A 10x counterattack (150) is more than the hero's 100 HP.
        let mut brutal = FixedDice {
            chance: false,
            multiplier: 10.0,
        };
        run.start_battle().unwrap();

        let outcome = run
            .submit_action(HeroAction::MagicAttack, &mut brutal, &mut sink)
            .unwrap();
        assert_eq!(outcome.result, TurnResult::Defeat);

        match run.phase() {
            RunPhase::GameOver(summary) => {
                assert_eq!(summary.floors_reached, 1);
                assert_eq!(summary.enemies_defeated, 0);
            }
            other => panic!("expected game over, got {}", other.name()),
        }

        run.restart().unwrap();
        assert_eq!(run.floor(), 1);
        assert_eq!(run.hero(), &Hero::new());
        assert!(matches!(run.phase(), RunPhase::Exploring));
    }

    #[test]
    fn test_restart_only_after_game_over() {
        let mut run = Run::default();
        assert!(matches!(
            run.restart(),
            Err(RunError::WrongPhase { action: "restart", .. })
        ));
    }

    #[test]
    fn test_act_outside_battle_is_rejected() {
        let mut run = Run::default();
        let mut sink = MemorySink::default();
        let result = run.submit_action(HeroAction::Heal, &mut FixedDice::steady(), &mut sink);
        assert!(matches!(result, Err(RunError::WrongPhase { .. })));
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_finished_battle_error_passes_through() {
        let err = RunError::from(BattleError::Finished);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_telemetry_failure_in_battle_is_fatal() {
        let mut run = Run::default();
        let mut sink = FailingSink::after(0);
        let mut dice = FixedDice::steady();
        run.start_battle().unwrap();

        let err = run
            .submit_action(HeroAction::MagicAttack, &mut dice, &mut sink)
            .unwrap_err();
        assert!(err.is_fatal());

        let again = run
            .submit_action(HeroAction::Heal, &mut dice, &mut sink)
            .unwrap_err();
        assert!(again.is_fatal());
        assert!(sink.records().is_empty());
        assert_eq!(run.enemies_defeated(), 0);
    }

    #[test]
    fn test_telemetry_failure_on_upgrade_keeps_hero() {
        let mut run = Run::default();
        let mut memory = MemorySink::default();
        win_battle(&mut run, &mut memory);
        let before = run.hero().clone();

        let err = run
            .choose_upgrade(Upgrade::Magic, &mut FailingSink::after(0))
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(run.hero(), &before);
        assert_eq!(run.floor(), 1);
        assert!(matches!(run.phase(), RunPhase::ChoosingUpgrade));
    }

    #[test]
    fn test_telemetry_failure_on_purchase_keeps_coins() {
        let mut run = Run::default();
        let mut memory = MemorySink::default();
        win_battle(&mut run, &mut memory);
        run.choose_upgrade(Upgrade::Speed, &mut memory).unwrap();
        let before = run.hero().clone();

        let err = run.buy(0, &mut FailingSink::after(0)).unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(run.hero(), &before);
    }

    #[test]
    fn test_shop_purchase_records_item() {
        let mut run = Run::default();
        let mut sink = MemorySink::default();
        win_battle(&mut run, &mut sink);
        run.choose_upgrade(Upgrade::Speed, &mut sink).unwrap();

        let item = run.buy(0, &mut sink).unwrap();

        assert_eq!(item.name, "Potion (+25 HP)");
        assert_eq!(run.hero().coins, 25);
        let row = sink.events_in(Category::Items).next().unwrap();
        assert_eq!(row.floor, 2);
        assert_eq!(row.event, TelemetryEvent::item("Potion (+25 HP)", 5));
    }

    #[test]
    fn test_shop_rejects_when_broke_without_row() {
        let mut run = Run::default();
        let mut sink = MemorySink::default();

        let err = run.buy(1, &mut sink).unwrap_err();

        assert!(matches!(
            err,
            RunError::Shop(ShopError::NotEnoughCoins { cost: 10, coins: 0, .. })
        ));
        assert_eq!(sink.count(Category::Items), 0);
    }

    #[test]
    fn test_shop_closed_during_battle() {
        let mut run = Run::default();
        let mut sink = MemorySink::default();
        run.start_battle().unwrap();
        assert!(matches!(
            run.buy(0, &mut sink),
            Err(RunError::WrongPhase { action: "shop", .. })
        ));
    }

    #[test]
    fn test_boss_floors() {
        assert!(!enemy_for_floor(3, None).is_boss());
        assert!(enemy_for_floor(3, Some(3)).is_boss());
        assert!(!enemy_for_floor(4, Some(3)).is_boss());
        assert!(!enemy_for_floor(3, Some(0)).is_boss());

        let run = Run::new(Some(1));
        assert!(run.next_enemy().is_boss());
    }
}
