mod battle_scene;
mod game_over_scene;
mod lobby_scene;
mod shop_scene;
mod upgrade_scene;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::app::{GameApp, Screen};
use spire::combat::Dice;

/// Draws the whole game screen: header, current scene, footer.
pub fn draw_game<D: Dice>(frame: &mut Frame, app: &GameApp<D>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Scene
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], app);

    match app.screen {
        Screen::Lobby => lobby_scene::draw_lobby(frame, chunks[1], &app.run),
        Screen::Battle => battle_scene::draw_battle(frame, chunks[1], app),
        Screen::Shop => shop_scene::draw_shop(frame, chunks[1], app.run.hero()),
        Screen::Upgrade => upgrade_scene::draw_upgrades(frame, chunks[1], app.run.hero()),
        Screen::GameOver => game_over_scene::draw_game_over(frame, chunks[1], &app.run.summary()),
    }

    draw_footer(frame, chunks[2], app);
}

fn draw_header<D: Dice>(frame: &mut Frame, area: Rect, app: &GameApp<D>) {
    let hero = app.run.hero();
    let line = Line::from(vec![
        Span::styled(
            format!("Floor {}", app.run.floor()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(
            format!("HP {}/{}", hero.hp.max(0), hero.max_hp),
            Style::default().fg(hp_color(hero.hp, hero.max_hp)),
        ),
        Span::raw(" | "),
        Span::styled(
            format!("Coins {}", hero.coins),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(" | "),
        Span::styled(
            format!("Session {}", app.session_id()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title("Spire"))
        .alignment(Alignment::Center);
    frame.render_widget(header, area);
}

fn draw_footer<D: Dice>(frame: &mut Frame, area: Rect, app: &GameApp<D>) {
    let keys = match app.screen {
        Screen::Lobby => "[F] Fight  [S] Shop  [Q] Quit",
        Screen::Battle if app.is_animating() => "[Enter] Skip",
        Screen::Battle => "[1] Magic  [2] Strength  [3] Defend  [4] Heal  [Q] Quit",
        Screen::Shop => "[1-3] Buy  [B/Esc] Back  [Q] Quit",
        Screen::Upgrade => "[1-4] Choose upgrade  [Q] Quit",
        Screen::GameOver => "[N] New Game  [Q] Quit",
    };

    let mut spans = vec![Span::styled(keys, Style::default().fg(Color::White))];
    if let Some(status) = &app.status {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let footer = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    frame.render_widget(footer, area);
}

/// Green above two thirds, yellow above one third, red below.
pub(crate) fn hp_color(hp: i32, max_hp: i32) -> Color {
    let ratio = hp_ratio(hp, max_hp);
    if ratio > 0.66 {
        Color::Green
    } else if ratio > 0.33 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub(crate) fn hp_ratio(hp: i32, max_hp: i32) -> f64 {
    if max_hp <= 0 {
        0.0
    } else {
        (hp.max(0) as f64 / max_hp as f64).clamp(0.0, 1.0)
    }
}

/// HP gauge used for both combatants.
pub(crate) fn hp_gauge<'a>(title: &'a str, hp: i32, max_hp: i32) -> Gauge<'a> {
    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(
            Style::default()
                .fg(hp_color(hp, max_hp))
                .add_modifier(Modifier::BOLD),
        )
        .label(format!("{}/{}", hp.max(0), max_hp))
        .ratio(hp_ratio(hp, max_hp))
}

/// A centered sub-rectangle, `percent_x` by `height`.
pub(crate) fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
