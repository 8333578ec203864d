//! Screen state and key handling for the terminal game.
//!
//! Turn results are revealed one line at a time by [`GameApp::tick`]; the
//! game logic itself never sleeps.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{info, warn};

use spire::combat::{Dice, HeroAction, TurnEvent, TurnOutcome, TurnResult};
use spire::core::constants::{TURN_MESSAGE_LIMIT, VICTORY_COIN_REWARD};
use spire::error::RunError;
use spire::progression::{Run, Upgrade};
use spire::telemetry::TelemetrySink;

const REVEAL_INTERVAL: Duration = Duration::from_millis(350);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Lobby,
    Battle,
    Shop,
    Upgrade,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct GameApp<D: Dice> {
    pub run: Run,
    pub screen: Screen,
    /// Battle messages already shown, oldest first.
    pub log: VecDeque<String>,
    /// One-line feedback under the current screen.
    pub status: Option<String>,
    pending: VecDeque<String>,
    screen_after_reveal: Option<Screen>,
    last_reveal: Instant,
    dice: D,
    sink: Box<dyn TelemetrySink>,
}

impl<D: Dice> GameApp<D> {
    pub fn new(run: Run, dice: D, sink: Box<dyn TelemetrySink>) -> Self {
        Self {
            run,
            screen: Screen::Lobby,
            log: VecDeque::new(),
            status: None,
            pending: VecDeque::new(),
            screen_after_reveal: None,
            last_reveal: Instant::now(),
            dice,
            sink,
        }
    }

    pub fn session_id(&self) -> &str {
        self.sink.session_id()
    }

    /// True while turn messages are still being revealed.
    pub fn is_animating(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Reveals the next pending message once the interval has passed, then
    /// moves on to the screen the last turn led to.
    pub fn tick(&mut self, now: Instant) {
        if let Some(line) = self.pending.front() {
            if now.duration_since(self.last_reveal) < REVEAL_INTERVAL {
                return;
            }
            let line = line.clone();
            self.pending.pop_front();
            self.push_log(line);
            self.last_reveal = now;
        }
        if self.pending.is_empty() {
            if let Some(screen) = self.screen_after_reveal.take() {
                self.screen = screen;
            }
        }
    }

    /// Shows every pending message at once.
    pub fn skip_reveal(&mut self) {
        while let Some(line) = self.pending.pop_front() {
            self.push_log(line);
        }
        if let Some(screen) = self.screen_after_reveal.take() {
            self.screen = screen;
        }
    }

    fn push_log(&mut self, line: String) {
        self.log.push_back(line);
        while self.log.len() > TURN_MESSAGE_LIMIT {
            self.log.pop_front();
        }
    }

    /// Handles one key press. Only telemetry failures come back as errors;
    /// everything else is reported through `status`.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<Flow, RunError> {
        if matches!(code, KeyCode::Char('q') | KeyCode::Char('Q')) {
            info!(floor = self.run.floor(), "player quit");
            return Ok(Flow::Quit);
        }

        if self.is_animating() {
            if matches!(code, KeyCode::Enter | KeyCode::Char(' ')) {
                self.skip_reveal();
            }
            return Ok(Flow::Continue);
        }

        let result = match self.screen {
            Screen::Lobby => self.lobby_key(code),
            Screen::Battle => self.battle_key(code),
            Screen::Shop => self.shop_key(code),
            Screen::Upgrade => self.upgrade_key(code),
            Screen::GameOver => self.game_over_key(code),
        };

        match result {
            Ok(()) => Ok(Flow::Continue),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(%err, "action rejected");
                self.status = Some(err.to_string());
                Ok(Flow::Continue)
            }
        }
    }

    fn lobby_key(&mut self, code: KeyCode) -> Result<(), RunError> {
        match code {
            KeyCode::Char('f') | KeyCode::Char('F') | KeyCode::Enter => {
                let label = self.run.start_battle()?.enemy().label();
                self.log.clear();
                self.push_log(format!("A {} blocks the way!", label));
                self.status = None;
                self.screen = Screen::Battle;
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.status = None;
                self.screen = Screen::Shop;
            }
            _ => {}
        }
        Ok(())
    }

    fn battle_key(&mut self, code: KeyCode) -> Result<(), RunError> {
        let KeyCode::Char(c) = code else {
            return Ok(());
        };
        // Unknown keys are not actions: no state change, no telemetry.
        let Some(action) = HeroAction::from_key(c.to_ascii_lowercase()) else {
            return Ok(());
        };

        let enemy = self
            .run
            .battle()
            .map(|battle| battle.enemy().label())
            .unwrap_or_else(|| "enemy".to_string());
        let outcome = self
            .run
            .submit_action(action, &mut self.dice, self.sink.as_mut())?;
        self.queue_outcome(&outcome, &enemy);
        Ok(())
    }

    fn queue_outcome(&mut self, outcome: &TurnOutcome, enemy: &str) {
        self.pending
            .extend(outcome.events.iter().map(|event| describe(event, enemy)));

        match outcome.result {
            TurnResult::Continue => {}
            TurnResult::Victory => {
                self.pending.push_back(format!(
                    "Victory! +{} coins. Choose an upgrade.",
                    VICTORY_COIN_REWARD
                ));
                self.screen_after_reveal = Some(Screen::Upgrade);
            }
            TurnResult::Defeat => {
                self.pending.push_back("You have fallen...".to_string());
                self.screen_after_reveal = Some(Screen::GameOver);
            }
        }
        // First line shows on the next tick.
        let now = Instant::now();
        self.last_reveal = now.checked_sub(REVEAL_INTERVAL).unwrap_or(now);
    }

    fn shop_key(&mut self, code: KeyCode) -> Result<(), RunError> {
        match code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('B') => {
                self.status = None;
                self.screen = Screen::Lobby;
            }
            KeyCode::Char(c @ '1'..='9') => {
                let slot = (c as usize) - ('1' as usize);
                let item = self.run.buy(slot, self.sink.as_mut())?;
                self.status = Some(format!("Bought {} for {} coins", item.name, item.cost));
            }
            _ => {}
        }
        Ok(())
    }

    fn upgrade_key(&mut self, code: KeyCode) -> Result<(), RunError> {
        let KeyCode::Char(c) = code else {
            return Ok(());
        };
        let Some(upgrade) = Upgrade::from_key(c) else {
            return Ok(());
        };

        let value = self.run.choose_upgrade(upgrade, self.sink.as_mut())?;
        self.status = Some(format!(
            "{} is now {}. Onward to floor {}.",
            upgrade.stat_name(),
            value,
            self.run.floor()
        ));
        self.screen = Screen::Lobby;
        Ok(())
    }

    fn game_over_key(&mut self, code: KeyCode) -> Result<(), RunError> {
        if matches!(code, KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter) {
            self.run.restart()?;
            self.log.clear();
            self.status = Some("A new climb begins.".to_string());
            self.screen = Screen::Lobby;
        }
        Ok(())
    }
}

/// Battle log line for one turn event.
pub fn describe(event: &TurnEvent, enemy: &str) -> String {
    match event {
        TurnEvent::HeroAttacked { kind, damage, enemy_hp } => format!(
            "{} attack hits the {} for {} ({} HP left)",
            kind.label(),
            enemy,
            damage,
            (*enemy_hp).max(0)
        ),
        TurnEvent::HeroDefended { incoming, taken, .. } => format!(
            "You brace: the {} hits for {}, you take {}",
            enemy, incoming, taken
        ),
        TurnEvent::HeroHealed { amount, hero_hp } => {
            format!("You heal {} HP (now {})", amount, hero_hp)
        }
        TurnEvent::HeroDodged => format!("You dodge the {}'s attack!", enemy),
        TurnEvent::EnemyAttacked { damage, special, .. } => {
            if *special {
                format!("The {} unleashes a special attack for {}!", enemy, damage)
            } else {
                format!("The {} hits you for {}", enemy, damage)
            }
        }
    }
}
