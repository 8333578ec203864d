use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::centered_rect;
use spire::combat::Hero;
use spire::core::constants::UPGRADE_COIN_BONUS;
use spire::progression::Upgrade;

pub fn draw_upgrades(frame: &mut Frame, area: Rect, hero: &Hero) {
    let mut lines = vec![
        Line::from(Span::styled(
            "  Victory! Pick one upgrade:",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, upgrade) in Upgrade::ALL.iter().enumerate() {
        let current = match upgrade {
            Upgrade::Strength => hero.strength_level.to_string(),
            Upgrade::Magic => hero.magic_level.to_string(),
            Upgrade::Speed => format!("{:.2}", hero.speed),
            Upgrade::Health => hero.max_hp.to_string(),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("  [{}] ", i + 1),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{:<14}", upgrade.description())),
            Span::styled(format!("(now {})", current), Style::default().fg(Color::DarkGray)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("  Every upgrade also pays {} coins.", UPGRADE_COIN_BONUS),
        Style::default().fg(Color::Yellow),
    )));

    let height = lines.len() as u16 + 2;
    let panel =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Upgrade"));
    frame.render_widget(panel, centered_rect(60, height, area));
}
