mod app;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use app::{Flow, GameApp};
use spire::build_info;
use spire::combat::RngDice;
use spire::config::{GameArgs, GameConfig};
use spire::core::constants::UI_POLL_MS;
use spire::error::RunError;
use spire::logging;
use spire::progression::Run;
use spire::telemetry::{CsvTelemetrySink, SessionClock};

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

fn main() -> anyhow::Result<()> {
    let args = GameArgs::parse();
    if args.version {
        println!("spire {}", build_info::version_line());
        return Ok(());
    }
    let config = GameConfig::from(args);

    logging::init_file(&config.log_path(), &config.log_level)
        .with_context(|| format!("cannot open log file {}", config.log_path().display()))?;

    let clock = SessionClock::start();
    info!(
        session = clock.session_id(),
        data_dir = %config.data_dir.display(),
        seed = ?config.seed,
        boss_every = ?config.boss_every,
        "session started"
    );
    let sink = CsvTelemetrySink::open(&config.data_dir, clock)
        .context("cannot prepare telemetry files")?;

    let rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut app = GameApp::new(
        Run::new(config.boss_every),
        RngDice::new(rng),
        Box::new(sink),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match result {
        Ok(()) => {
            let summary = app.run.summary();
            info!(
                floors_reached = summary.floors_reached,
                enemies_defeated = summary.enemies_defeated,
                "session ended"
            );
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "session aborted");
            Err(err)
        }
    }
}

fn run_loop(terminal: &mut Tui, app: &mut GameApp<RngDice<ChaCha8Rng>>) -> anyhow::Result<()> {
    loop {
        app.tick(Instant::now());
        terminal.draw(|frame| ui::draw_game(frame, &*app))?;

        if !event::poll(Duration::from_millis(UI_POLL_MS))? {
            continue;
        }
        if let Event::Key(key_event) = event::read()? {
            if key_event.kind != KeyEventKind::Press {
                continue;
            }
            match app.handle_key(key_event.code) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => return Ok(()),
                Err(err) => return Err(fatal(err)),
            }
        }
    }
}

/// Telemetry that cannot be written ends the session.
fn fatal(err: RunError) -> anyhow::Error {
    anyhow::Error::new(err).context("telemetry could not be recorded; the session cannot continue")
}
