use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use spire::combat::Hero;
use spire::progression::Run;

/// Between battles: hero stats on the left, the next enemy on the right.
pub fn draw_lobby(frame: &mut Frame, area: Rect, run: &Run) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_hero_stats(frame, chunks[0], run.hero());
    draw_enemy_preview(frame, chunks[1], run);
}

fn stat_line(name: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", name), Style::default().fg(Color::Gray)),
        Span::styled(
            value,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

fn draw_hero_stats(frame: &mut Frame, area: Rect, hero: &Hero) {
    let lines = vec![
        Line::from(""),
        stat_line("HP", format!("{}/{}", hero.hp.max(0), hero.max_hp)),
        stat_line("Magic", hero.magic_level.to_string()),
        stat_line("Strength", hero.strength_level.to_string()),
        stat_line("Speed", format!("{:.2}", hero.speed)),
        stat_line("Coins", hero.coins.to_string()),
    ];

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Hero"));
    frame.render_widget(panel, area);
}

fn draw_enemy_preview(frame: &mut Frame, area: Rect, run: &Run) {
    let enemy = run.next_enemy();
    let title_style = if enemy.is_boss() {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", enemy.label()), title_style)),
        Line::from(""),
        stat_line("Enemy HP", enemy.max_hp.to_string()),
        stat_line("Attack", enemy.attack_power.to_string()),
    ];
    if enemy.is_boss() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Bosses sometimes unleash a special attack.",
            Style::default().fg(Color::Magenta),
        )));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Floor {}", run.floor())),
    );
    frame.render_widget(panel, area);
}
