//! One encounter between the hero and an enemy, resolved a turn at a time.
//!
//! The caller picks a [`HeroAction`] and calls [`Battle::submit_action`]. The
//! action, any enemy response and the win/loss check are resolved before it
//! returns, and every telemetry row for the turn has been written. The
//! returned [`TurnOutcome`] lists what happened so the UI can animate it.

use tracing::{debug, error, info};

use super::dice::Dice;
use super::types::{AttackKind, Enemy, Hero, HeroAction};
use crate::core::constants::BOSS_SPECIAL_CHANCE;
use crate::error::BattleError;
use crate::telemetry::{TelemetryEvent, TelemetrySink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    AwaitingAction,
    ResolvingAction,
    CheckingOutcome,
    HeroVictory,
    HeroDefeat,
    /// A telemetry write failed mid-turn; the battle cannot go on.
    Aborted,
}

impl BattlePhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BattlePhase::HeroVictory | BattlePhase::HeroDefeat | BattlePhase::Aborted
        )
    }
}

/// Something that happened during a turn, in resolution order.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    HeroAttacked {
        kind: AttackKind,
        damage: i32,
        enemy_hp: i32,
    },
    HeroDefended {
        incoming: i32,
        taken: i32,
        hero_hp: i32,
    },
    HeroHealed {
        amount: i32,
        hero_hp: i32,
    },
    /// The hero slipped the enemy's attack.
    HeroDodged,
    EnemyAttacked {
        damage: i32,
        special: bool,
        hero_hp: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnResult {
    Continue,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub action: HeroAction,
    pub events: Vec<TurnEvent>,
    pub result: TurnResult,
}

impl TurnOutcome {
    pub fn is_over(&self) -> bool {
        self.result != TurnResult::Continue
    }

    /// Damage the enemy dealt to the hero this turn, summed.
    pub fn damage_taken(&self) -> i32 {
        self.events
            .iter()
            .map(|event| match event {
                TurnEvent::EnemyAttacked { damage, .. } => *damage,
                TurnEvent::HeroDefended { taken, .. } => *taken,
                _ => 0,
            })
            .sum()
    }
}

/// A single encounter. Owns its enemy; the hero is lent to each turn so
/// damage and healing carry over to later battles.
#[derive(Debug, Clone)]
pub struct Battle {
    enemy: Enemy,
    floor: u32,
    phase: BattlePhase,
    turns: u32,
}

impl Battle {
    pub fn new(enemy: Enemy, floor: u32) -> Self {
        info!(floor, enemy = %enemy.label(), hp = enemy.hp, attack = enemy.attack_power, "battle started");
        Self {
            enemy,
            floor,
            phase: BattlePhase::AwaitingAction,
            turns: 0,
        }
    }

    pub fn enemy(&self) -> &Enemy {
        &self.enemy
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Resolves one hero action plus the enemy's response.
    ///
    /// Returns [`BattleError::Finished`] without touching any state if the
    /// battle has already ended. A failed telemetry write aborts the battle;
    /// every later call returns [`BattleError::Aborted`].
    pub fn submit_action<D: Dice>(
        &mut self,
        hero: &mut Hero,
        action: HeroAction,
        dice: &mut D,
        sink: &mut dyn TelemetrySink,
    ) -> Result<TurnOutcome, BattleError> {
        match self.phase {
            BattlePhase::AwaitingAction => {}
            BattlePhase::Aborted => return Err(BattleError::Aborted),
            _ => return Err(BattleError::Finished),
        }

        self.play_turn(hero, action, dice, sink).map_err(|err| {
            self.phase = BattlePhase::Aborted;
            error!(floor = self.floor, turn = self.turns, error = %err, "battle aborted");
            err
        })
    }

    fn play_turn<D: Dice>(
        &mut self,
        hero: &mut Hero,
        action: HeroAction,
        dice: &mut D,
        sink: &mut dyn TelemetrySink,
    ) -> Result<TurnOutcome, BattleError> {
        self.turns += 1;
        hero.current_level = self.floor;
        let mut events = Vec::new();

        self.phase = BattlePhase::ResolvingAction;
        let enemy_acted = self.resolve_action(hero, action, dice, sink, &mut events)?;

        self.phase = BattlePhase::CheckingOutcome;
        // Defend and Heal already spent the enemy's turn.
        if !enemy_acted && !self.enemy.is_defeated() && !hero.is_defeated() {
            self.enemy_strike(hero, dice, &mut events);
        }

        let result = self.check_outcome(hero, sink)?;
        debug!(
            turn = self.turns,
            action = action.skill_name(),
            hero_hp = hero.hp,
            enemy_hp = self.enemy.hp,
            ?result,
            "turn resolved"
        );

        Ok(TurnOutcome {
            action,
            events,
            result,
        })
    }

    /// Applies the hero's action. Returns true when the enemy's turn was
    /// resolved as part of it.
    fn resolve_action<D: Dice>(
        &mut self,
        hero: &mut Hero,
        action: HeroAction,
        dice: &mut D,
        sink: &mut dyn TelemetrySink,
        events: &mut Vec<TurnEvent>,
    ) -> Result<bool, BattleError> {
        match action {
            HeroAction::MagicAttack | HeroAction::StrengthAttack => {
                let (kind, damage) = if action == HeroAction::MagicAttack {
                    (AttackKind::Magic, hero.attack_magic())
                } else {
                    (AttackKind::Strength, hero.attack_strength())
                };
                self.enemy.take_damage(damage);
                events.push(TurnEvent::HeroAttacked {
                    kind,
                    damage,
                    enemy_hp: self.enemy.hp,
                });

                sink.record(self.floor, TelemetryEvent::skill(action, damage))?;
                sink.record(self.floor, TelemetryEvent::damage(kind, damage))?;
                Ok(false)
            }
            HeroAction::Defend => {
                let incoming = self.enemy.attack(dice);
                let taken = hero.defend(incoming);
                hero.take_damage(taken);
                events.push(TurnEvent::HeroDefended {
                    incoming,
                    taken,
                    hero_hp: hero.hp,
                });

                sink.record(self.floor, TelemetryEvent::skill(action, taken))?;
                Ok(true)
            }
            HeroAction::Heal => {
                let amount = hero.heal();
                events.push(TurnEvent::HeroHealed {
                    amount,
                    hero_hp: hero.hp,
                });
                sink.record(self.floor, TelemetryEvent::skill(action, amount))?;

                // The enemy's hit after a heal is not a damage-stream event;
                // that stream only tracks damage the hero deals.
                self.enemy_strike(hero, dice, events);
                Ok(true)
            }
        }
    }

    /// One enemy attack against the hero, unless the hero dodges.
    fn enemy_strike<D: Dice>(&self, hero: &mut Hero, dice: &mut D, events: &mut Vec<TurnEvent>) {
        if hero.dodge(dice) {
            events.push(TurnEvent::HeroDodged);
            return;
        }

        let (damage, special) = self.roll_enemy_attack(dice);
        hero.take_damage(damage);
        events.push(TurnEvent::EnemyAttacked {
            damage,
            special,
            hero_hp: hero.hp,
        });
    }

    fn roll_enemy_attack<D: Dice>(&self, dice: &mut D) -> (i32, bool) {
        if self.enemy.is_boss() && dice.roll_chance(BOSS_SPECIAL_CHANCE) {
            if let Some(damage) = self.enemy.special_attack(dice) {
                return (damage, true);
            }
        }
        (self.enemy.attack(dice), false)
    }

    /// Hero defeat is checked before enemy defeat, so a double knock-out is a loss.
    fn check_outcome(
        &mut self,
        hero: &Hero,
        sink: &mut dyn TelemetrySink,
    ) -> Result<TurnResult, BattleError> {
        if hero.is_defeated() {
            sink.record(self.floor, TelemetryEvent::health(0, hero.max_hp))?;
            self.phase = BattlePhase::HeroDefeat;
            info!(floor = self.floor, turns = self.turns, "hero defeated");
            return Ok(TurnResult::Defeat);
        }

        if self.enemy.is_defeated() {
            sink.record(self.floor, TelemetryEvent::health(hero.hp, hero.max_hp))?;
            self.phase = BattlePhase::HeroVictory;
            info!(floor = self.floor, turns = self.turns, hero_hp = hero.hp, "enemy defeated");
            return Ok(TurnResult::Victory);
        }

        self.phase = BattlePhase::AwaitingAction;
        Ok(TurnResult::Continue)
    }
}
