use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::hp_gauge;
use crate::app::GameApp;
use spire::combat::{Dice, HeroAction};
use spire::core::constants::{DEFENSE_PER_STRENGTH_LEVEL, HEAL_PER_MAGIC_LEVEL};

/// Draws both HP bars, the battle log and the action menu.
pub fn draw_battle<D: Dice>(frame: &mut Frame, area: Rect, app: &GameApp<D>) {
    let arena = Block::default().borders(Borders::ALL).title("Battle");
    let inner = arena.inner(area);
    frame.render_widget(arena, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Hero HP
            Constraint::Length(3), // Enemy HP
            Constraint::Min(4),    // Log
            Constraint::Length(6), // Actions
        ])
        .split(inner);

    let hero = app.run.hero();
    frame.render_widget(hp_gauge("Hero", hero.hp, hero.max_hp), chunks[0]);

    // After the final blow the battle is gone; keep the bar empty.
    match app.run.battle() {
        Some(battle) => {
            let enemy = battle.enemy();
            let title = enemy.label();
            frame.render_widget(hp_gauge(&title, enemy.hp, enemy.max_hp), chunks[1]);
        }
        None => frame.render_widget(hp_gauge("Enemy", 0, 1), chunks[1]),
    }

    draw_log(frame, chunks[2], app);
    draw_actions(frame, chunks[3], app);
}

fn draw_log<D: Dice>(frame: &mut Frame, area: Rect, app: &GameApp<D>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Log ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = inner.height as usize;
    let skip = app.log.len().saturating_sub(visible);
    let lines: Vec<Line> = app
        .log
        .iter()
        .skip(skip)
        .map(|entry| Line::from(Span::raw(entry.as_str())))
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_actions<D: Dice>(frame: &mut Frame, area: Rect, app: &GameApp<D>) {
    let hero = app.run.hero();
    let style = if app.is_animating() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };

    let lines: Vec<Line> = HeroAction::ALL
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let detail = match action {
                HeroAction::MagicAttack => format!("{} dmg", hero.attack_magic()),
                HeroAction::StrengthAttack => format!("{} dmg", hero.attack_strength()),
                HeroAction::Defend => format!(
                    "blocks {}",
                    hero.strength_level as i32 * DEFENSE_PER_STRENGTH_LEVEL
                ),
                HeroAction::Heal => format!("+{} HP", hero.magic_level as i32 * HEAL_PER_MAGIC_LEVEL),
            };
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", i + 1),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{:<16}", action.skill_name()), style),
                Span::styled(detail, Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let menu = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Actions"))
        .alignment(Alignment::Left);
    frame.render_widget(menu, area);
}
