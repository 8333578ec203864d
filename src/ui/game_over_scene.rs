use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::centered_rect;
use spire::progression::RunSummary;

pub fn draw_game_over(frame: &mut Frame, area: Rect, summary: &RunSummary) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "GAME OVER",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Floors reached:   {}", summary.floors_reached)),
        Line::from(format!("Enemies defeated: {}", summary.enemies_defeated)),
        Line::from(""),
    ];

    let panel = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
    frame.render_widget(panel, centered_rect(50, 8, area));
}
