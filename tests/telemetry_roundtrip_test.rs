//! Integration test: telemetry written by a real run reads back identically
//!
//! Plays seeded runs into both the CSV sink and an in-memory sink, then checks
//! that aggregating the files on disk gives the same numbers as aggregating the
//! events directly.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use spire::analytics::{AnalyticsReport, SessionFilter, TelemetryData};
use spire::combat::{HeroAction, RngDice};
use spire::error::TelemetryError;
use spire::progression::{Run, RunPhase, Upgrade};
use spire::telemetry::{
    Category, CsvTelemetrySink, MemorySink, SessionClock, TelemetryEvent, TelemetrySink,
};

/// Sends every event to both sinks.
struct TeeSink {
    csv: CsvTelemetrySink,
    memory: MemorySink,
}

impl TelemetrySink for TeeSink {
    fn record(&mut self, floor: u32, event: TelemetryEvent) -> Result<(), TelemetryError> {
        self.csv.record(floor, event.clone())?;
        self.memory.record(floor, event)
    }

    fn session_id(&self) -> &str {
        self.csv.session_id()
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("spire_it_{}_{}_{}", name, std::process::id(), nanos))
}

fn tee(dir: &Path, session: &str) -> TeeSink {
    TeeSink {
        csv: CsvTelemetrySink::open(dir, SessionClock::with_id(session)).unwrap(),
        memory: MemorySink::new(SessionClock::with_id(session)),
    }
}

/// Plays until defeat or `max_floor`, healing when low, buying potions when rich.
fn play_run(seed: u64, max_floor: u32, sink: &mut dyn TelemetrySink) -> Run {
    let mut run = Run::new(Some(4));
    let mut dice = RngDice::new(ChaCha8Rng::seed_from_u64(seed));
    let mut upgrades = Upgrade::ALL.iter().cycle();

    for _ in 0..500 {
        let phase = run.phase().clone();
        match phase {
            RunPhase::Exploring => {
                if run.floor() > max_floor {
                    break;
                }
                if run.hero().coins >= 25 && run.hero().hp < run.hero().max_hp {
                    run.buy(0, sink).unwrap();
                }
                run.start_battle().unwrap();
            }
            RunPhase::InBattle(_) => {
                let hero = run.hero();
                let action = if hero.hp * 3 < hero.max_hp {
                    HeroAction::Heal
                } else if hero.strength_level > hero.magic_level {
                    HeroAction::StrengthAttack
                } else {
                    HeroAction::MagicAttack
                };
                run.submit_action(action, &mut dice, sink).unwrap();
            }
            RunPhase::ChoosingUpgrade => {
                let upgrade = *upgrades.next().unwrap();
                run.choose_upgrade(upgrade, sink).unwrap();
            }
            RunPhase::GameOver(_) => break,
        }
    }
    run
}

#[test]
fn test_disk_aggregates_match_memory() {
    let dir = temp_dir("roundtrip");
    let mut sink = tee(&dir, "20240101_100000");

    let run = play_run(7, 10, &mut sink);
    assert!(run.enemies_defeated() >= 1);

    let from_disk = TelemetryData::load(&dir).unwrap();
    assert!(from_disk.problems().is_empty());
    let in_memory = TelemetryData::from_records(sink.memory.records());

    let disk_report = AnalyticsReport::build(&from_disk, &SessionFilter::All);
    let memory_report = AnalyticsReport::build(&in_memory, &SessionFilter::All);
    assert_eq!(disk_report, memory_report);

    // Row counts survive the trip too.
    for (category, rows) in [
        (Category::Damage, from_disk.damage.as_ref().map(Vec::len)),
        (Category::Skills, from_disk.skills.as_ref().map(Vec::len)),
        (Category::Health, from_disk.health.as_ref().map(Vec::len)),
        (Category::Upgrades, from_disk.upgrades.as_ref().map(Vec::len)),
        (Category::Items, from_disk.items.as_ref().map(Vec::len)),
    ] {
        assert_eq!(rows.ok(), Some(sink.memory.count(category)), "{:?}", category);
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_per_floor_means_match_direct_computation() {
    let dir = temp_dir("means");
    let mut sink = tee(&dir, "20240101_110000");
    play_run(11, 6, &mut sink);

    let report = AnalyticsReport::build(&TelemetryData::load(&dir).unwrap(), &SessionFilter::All);
    let damage = report.damage.unwrap();

    for floor_damage in &damage {
        let values: Vec<f64> = sink
            .memory
            .events_in(Category::Damage)
            .filter(|r| r.floor == floor_damage.floor)
            .filter_map(|r| match &r.event {
                TelemetryEvent::DamageDealt { damage, .. } => Some(*damage as f64),
                _ => None,
            })
            .collect();
        let expected = values.iter().sum::<f64>() / values.len() as f64;
        assert_eq!(floor_damage.mean_damage, expected);
    }

    let health = report.health.unwrap();
    for floor_health in &health {
        let remaining: Vec<f64> = sink
            .memory
            .events_in(Category::Health)
            .filter(|r| r.floor == floor_health.floor)
            .filter_map(|r| match &r.event {
                TelemetryEvent::HealthSnapshot { remaining, .. } => Some(*remaining as f64),
                _ => None,
            })
            .collect();
        let max = remaining.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(floor_health.max_remaining, max);
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_sessions_share_files_and_filter_apart() {
    let dir = temp_dir("sessions");
    let mut first = tee(&dir, "20240101_120000");
    play_run(1, 3, &mut first);
    let mut second = tee(&dir, "20240101_130000");
    play_run(2, 3, &mut second);

    let data = TelemetryData::load(&dir).unwrap();
    assert_eq!(
        data.sessions(),
        vec!["20240101_120000".to_string(), "20240101_130000".to_string()]
    );

    let filtered = AnalyticsReport::build(&data, &SessionFilter::Only("20240101_130000".into()));
    let only_second = AnalyticsReport::build(
        &TelemetryData::from_records(second.memory.records()),
        &SessionFilter::All,
    );
    assert_eq!(filtered.damage, only_second.damage);
    assert_eq!(filtered.upgrades, only_second.upgrades);
    assert_eq!(filtered.correlation, only_second.correlation);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_stream_only_breaks_its_tab() {
    let dir = temp_dir("missing");
    let mut sink = tee(&dir, "20240101_140000");
    play_run(3, 2, &mut sink);
    fs::remove_file(dir.join("items.csv")).unwrap();

    let data = TelemetryData::load(&dir).unwrap();
    let report = AnalyticsReport::build(&data, &SessionFilter::All);

    assert!(report.items.is_err());
    assert!(report.damage.is_ok());
    assert_eq!(data.problems().len(), 1);

    fs::remove_dir_all(&dir).ok();
}
