//! spire-dashboard: charts the telemetry recorded by the game.

mod charts;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame, Terminal,
};
use tracing::{info, warn};

use spire::analytics::{AnalyticsReport, SessionFilter, TelemetryData};
use spire::config::{DashboardArgs, DashboardConfig, DashboardOutput};
use spire::core::constants::UI_POLL_MS;
use spire::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Damage,
    Health,
    Items,
    Skills,
    Upgrades,
    Correlation,
}

impl Tab {
    const ALL: [Tab; 6] = [
        Tab::Damage,
        Tab::Health,
        Tab::Items,
        Tab::Skills,
        Tab::Upgrades,
        Tab::Correlation,
    ];

    fn title(self) -> &'static str {
        match self {
            Tab::Damage => "Damage",
            Tab::Health => "Health",
            Tab::Items => "Items",
            Tab::Skills => "Skills",
            Tab::Upgrades => "Upgrades",
            Tab::Correlation => "Correlation",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|&t| t == self).unwrap_or(0)
    }

    fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn previous(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

struct Dashboard {
    config: DashboardConfig,
    data: TelemetryData,
    /// "All Sessions" followed by every recorded session id.
    choices: Vec<SessionFilter>,
    selected: usize,
    tab: Tab,
    report: AnalyticsReport,
    status: Option<String>,
}

impl Dashboard {
    fn new(config: DashboardConfig, data: TelemetryData) -> Self {
        let requested = SessionFilter::from_option(config.session.clone());
        let report = AnalyticsReport::build(&data, &SessionFilter::All);
        let mut dashboard = Self {
            config,
            data,
            choices: Vec::new(),
            selected: 0,
            tab: Tab::Damage,
            report,
            status: None,
        };
        dashboard.refresh_choices(&requested);
        if dashboard.filter() != requested {
            warn!(session = requested.label(), "requested session has no telemetry");
            dashboard.status = Some(format!(
                "No telemetry for session {}; showing all sessions",
                requested.label()
            ));
        }
        dashboard.rebuild();
        dashboard
    }

    fn filter(&self) -> SessionFilter {
        self.choices
            .get(self.selected)
            .cloned()
            .unwrap_or_default()
    }

    fn refresh_choices(&mut self, keep: &SessionFilter) {
        self.choices = std::iter::once(SessionFilter::All)
            .chain(self.data.sessions().into_iter().map(SessionFilter::Only))
            .collect();
        self.selected = self.choices.iter().position(|c| c == keep).unwrap_or(0);
    }

    fn rebuild(&mut self) {
        self.report = AnalyticsReport::build(&self.data, &self.filter());
    }

    fn cycle_session(&mut self, forward: bool) {
        let len = self.choices.len().max(1);
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
        self.rebuild();
        self.status = None;
    }

    fn reload(&mut self) -> anyhow::Result<()> {
        let keep = self.filter();
        self.data = TelemetryData::load(&self.config.data_dir)?;
        self.refresh_choices(&keep);
        self.rebuild();
        self.status = Some("Reloaded telemetry".to_string());
        Ok(())
    }

    fn export(&mut self) {
        self.status = Some(
            match export_report(&self.report, &self.filter(), &self.config.export_dir) {
                Ok(path) => format!("Exported to {}", path.display()),
                Err(err) => {
                    warn!(error = %err, "export failed");
                    format!("Export failed: {:#}", err)
                }
            },
        );
    }
}

/// Writes the text and JSON forms of `report`. Returns the text file path.
fn export_report(
    report: &AnalyticsReport,
    filter: &SessionFilter,
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

    let stem = format!("report_{}", filter.file_stem());
    let text_path = dir.join(format!("{}.txt", stem));
    let json_path = dir.join(format!("{}.json", stem));
    fs::write(&text_path, report.to_text())
        .with_context(|| format!("cannot write {}", text_path.display()))?;
    fs::write(&json_path, report.to_json()?)
        .with_context(|| format!("cannot write {}", json_path.display()))?;

    info!(path = %text_path.display(), "report exported");
    Ok(text_path)
}

fn main() -> anyhow::Result<()> {
    let config = DashboardConfig::from(DashboardArgs::parse());

    if config.output != DashboardOutput::Interactive {
        logging::init_stderr("warn")?;
    }

    let data = TelemetryData::load(&config.data_dir).with_context(|| {
        format!(
            "no telemetry found; play a game first or pass --data-dir (looked in {})",
            config.data_dir.display()
        )
    })?;

    match config.output {
        DashboardOutput::Text => {
            let report = AnalyticsReport::build(&data, &SessionFilter::from_option(config.session));
            print!("{}", report.to_text());
            Ok(())
        }
        DashboardOutput::Json => {
            let report = AnalyticsReport::build(&data, &SessionFilter::from_option(config.session));
            println!("{}", report.to_json()?);
            Ok(())
        }
        DashboardOutput::Interactive => {
            logging::init_file(&config.data_dir.join("spire-dashboard.log"), "info")?;
            run_interactive(Dashboard::new(config, data))
        }
    }
}

fn run_interactive(mut dashboard: Dashboard) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = (|| -> anyhow::Result<()> {
        loop {
            terminal.draw(|frame| draw(frame, &dashboard))?;

            if !event::poll(Duration::from_millis(UI_POLL_MS))? {
                continue;
            }
            let Event::Key(key_event) = event::read()? else {
                continue;
            };
            if key_event.kind != KeyEventKind::Press {
                continue;
            }
            match key_event.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                KeyCode::Right | KeyCode::Tab => dashboard.tab = dashboard.tab.next(),
                KeyCode::Left | KeyCode::BackTab => dashboard.tab = dashboard.tab.previous(),
                KeyCode::Down | KeyCode::Char(']') => dashboard.cycle_session(true),
                KeyCode::Up | KeyCode::Char('[') => dashboard.cycle_session(false),
                KeyCode::Char('e') | KeyCode::Char('E') => dashboard.export(),
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    if let Err(err) = dashboard.reload() {
                        dashboard.status = Some(format!("Reload failed: {}", err));
                    }
                }
                _ => {}
            }
        }
    })();

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn draw(frame: &mut Frame, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Length(3), // Session selector
            Constraint::Min(8),    // Chart
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()).collect::<Vec<_>>())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Spire Telemetry"),
        )
        .select(dashboard.tab.index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, chunks[0]);

    draw_session_selector(frame, chunks[1], dashboard);
    draw_tab(frame, chunks[2], dashboard);

    let mut footer = vec![Span::raw(
        "[←/→] Tab  [↑/↓] Session  [E] Export  [R] Reload  [Q] Quit",
    )];
    if let Some(status) = &dashboard.status {
        footer.push(Span::raw("  "));
        footer.push(Span::styled(status.as_str(), Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(footer)).block(Block::default().borders(Borders::ALL)),
        chunks[3],
    );
}

fn draw_session_selector(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let filter = dashboard.filter();
    let line = Line::from(vec![
        Span::raw("Filter by Session: "),
        Span::styled(
            filter.label().to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  ({}/{})", dashboard.selected + 1, dashboard.choices.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_tab(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let report = &dashboard.report;
    match dashboard.tab {
        Tab::Damage => charts::draw_section(
            frame,
            area,
            "Damage",
            &report.damage,
            |rows| rows.is_empty(),
            |f, a, rows| charts::draw_damage(f, a, rows),
        ),
        Tab::Health => charts::draw_section(
            frame,
            area,
            "Health",
            &report.health,
            |rows| rows.is_empty(),
            |f, a, rows| charts::draw_health(f, a, rows),
        ),
        Tab::Items => charts::draw_section(
            frame,
            area,
            "Items",
            &report.items,
            |rows| rows.is_empty(),
            |f, a, rows| charts::draw_items(f, a, rows),
        ),
        Tab::Skills => charts::draw_section(
            frame,
            area,
            "Skills",
            &report.skills,
            |rows| rows.is_empty(),
            |f, a, rows| charts::draw_skills(f, a, rows),
        ),
        Tab::Upgrades => charts::draw_section(
            frame,
            area,
            "Upgrades",
            &report.upgrades,
            |rows| rows.is_empty(),
            |f, a, rows| charts::draw_upgrades(f, a, rows),
        ),
        Tab::Correlation => charts::draw_section(
            frame,
            area,
            "Correlation",
            &report.correlation,
            |c| c.points.is_empty(),
            charts::draw_correlation,
        ),
    }
}
