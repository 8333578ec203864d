use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::centered_rect;
use spire::combat::Hero;
use spire::shop::SHOP_ITEMS;

/// The price list. Items the hero cannot afford are greyed out.
pub fn draw_shop(frame: &mut Frame, area: Rect, hero: &Hero) {
    let mut lines = vec![Line::from("")];
    for (i, item) in SHOP_ITEMS.iter().enumerate() {
        let style = if item.affordable(hero) {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("  [{}] ", i + 1),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{:<30}", item.name), style),
            Span::styled(format!("{:>3} coins", item.cost), Style::default().fg(Color::Yellow)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("  You have {} coins", hero.coins),
        Style::default().fg(Color::Cyan),
    )));

    let height = lines.len() as u16 + 2;
    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Shop"));
    frame.render_widget(panel, centered_rect(70, height, area));
}
