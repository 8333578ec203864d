//! Where telemetry goes: append-only CSV files for real runs, memory for tests.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use super::events::{Category, TelemetryEvent, TelemetryRecord};
use super::session::SessionClock;
use crate::error::TelemetryError;

/// Receives every telemetry event the game emits.
///
/// `record` must either persist the event or return an error; callers treat
/// an error as fatal to the run.
pub trait TelemetrySink {
    fn record(&mut self, floor: u32, event: TelemetryEvent) -> Result<(), TelemetryError>;

    fn session_id(&self) -> &str;
}

/// Writes each category to `<dir>/<category>.csv`, one row per event.
#[derive(Debug)]
pub struct CsvTelemetrySink {
    dir: PathBuf,
    clock: SessionClock,
}

impl CsvTelemetrySink {
    /// Creates the directory and any missing stream files (header only).
    pub fn open(dir: impl Into<PathBuf>, clock: SessionClock) -> Result<Self, TelemetryError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| TelemetryError::Io {
            path: dir.clone(),
            source,
        })?;

        let sink = Self { dir, clock };
        for category in Category::ALL {
            let path = sink.path_for(category);
            if !path.exists() {
                write_header(&path, category)?;
            }
        }

        debug!(dir = %sink.dir.display(), session = sink.clock.session_id(), "telemetry sink opened");
        Ok(sink)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, category: Category) -> PathBuf {
        self.dir.join(category.file_name())
    }
}

fn write_header(path: &Path, category: Category) -> Result<(), TelemetryError> {
    fs::write(path, format!("{}\n", category.header_line())).map_err(|source| {
        TelemetryError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    file.flush()
}

impl TelemetrySink for CsvTelemetrySink {
    fn record(&mut self, floor: u32, event: TelemetryEvent) -> Result<(), TelemetryError> {
        let category = event.category();
        let path = self.path_for(category);

        // A stream file removed mid-run gets its header back before the row.
        if !path.exists() {
            write_header(&path, category)?;
        }

        let record = self.clock.stamp(floor, event);
        append_line(&path, &record.to_csv_row()).map_err(|source| {
            error!(path = %path.display(), %source, "telemetry write failed");
            TelemetryError::Io {
                path: path.clone(),
                source,
            }
        })?;

        debug!(category = category.label(), floor, "telemetry recorded");
        Ok(())
    }

    fn session_id(&self) -> &str {
        self.clock.session_id()
    }
}

/// Keeps every record in memory, in emission order.
#[derive(Debug, Clone)]
pub struct MemorySink {
    clock: SessionClock,
    records: Vec<TelemetryRecord>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(SessionClock::with_id("memory"))
    }
}

impl MemorySink {
    pub fn new(clock: SessionClock) -> Self {
        Self {
            clock,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TelemetryRecord> {
        self.records
    }

    pub fn events_in(&self, category: Category) -> impl Iterator<Item = &TelemetryRecord> {
        self.records
            .iter()
            .filter(move |record| record.category() == category)
    }

    pub fn count(&self, category: Category) -> usize {
        self.events_in(category).count()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl TelemetrySink for MemorySink {
    fn record(&mut self, floor: u32, event: TelemetryEvent) -> Result<(), TelemetryError> {
        self.records.push(self.clock.stamp(floor, event));
        Ok(())
    }

    fn session_id(&self) -> &str {
        self.clock.session_id()
    }
}

/// Accepts a fixed number of writes, then fails every later one the way a
/// full disk would. Accepted records are kept in memory.
#[derive(Debug, Clone)]
pub struct FailingSink {
    accepted: MemorySink,
    remaining: usize,
}

impl FailingSink {
    pub fn after(writes: usize) -> Self {
        Self {
            accepted: MemorySink::default(),
            remaining: writes,
        }
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        self.accepted.records()
    }
}

impl TelemetrySink for FailingSink {
    fn record(&mut self, floor: u32, event: TelemetryEvent) -> Result<(), TelemetryError> {
        if self.remaining == 0 {
            return Err(TelemetryError::Io {
                path: PathBuf::from("failing-sink"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"),
            });
        }
        self.remaining -= 1;
        self.accepted.record(floor, event)
    }

    fn session_id(&self) -> &str {
        self.accepted.session_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::types::{AttackKind, HeroAction};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("spire_sink_{}_{}_{}", name, std::process::id(), nanos))
    }

    #[test]
    fn test_open_creates_all_headers() {
        let dir = temp_dir("headers");
        let sink = CsvTelemetrySink::open(&dir, SessionClock::with_id("s1")).unwrap();

        for category in Category::ALL {
            let contents = fs::read_to_string(sink.path_for(category)).unwrap();
            assert_eq!(contents, format!("{}\n", category.header_line()));
        }

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_record_appends_rows_in_order() {
        let dir = temp_dir("append");
        let mut sink = CsvTelemetrySink::open(&dir, SessionClock::with_id("s1")).unwrap();

        sink.record(1, TelemetryEvent::damage(AttackKind::Magic, 30))
            .unwrap();
        sink.record(2, TelemetryEvent::damage(AttackKind::Strength, 40))
            .unwrap();

        let contents = fs::read_to_string(sink.path_for(Category::Damage)).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("s1,"));
        assert!(lines[1].ends_with(",1,30,Magic"));
        assert!(lines[2].ends_with(",2,40,Strength"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reopen_does_not_truncate() {
        let dir = temp_dir("reopen");
        {
            let mut sink = CsvTelemetrySink::open(&dir, SessionClock::with_id("s1")).unwrap();
            sink.record(1, TelemetryEvent::skill(HeroAction::Heal, 10))
                .unwrap();
        }
        let mut sink = CsvTelemetrySink::open(&dir, SessionClock::with_id("s2")).unwrap();
        sink.record(1, TelemetryEvent::skill(HeroAction::Defend, 4))
            .unwrap();

        let contents = fs::read_to_string(sink.path_for(Category::Skills)).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("s1,"));
        assert!(lines[2].starts_with("s2,"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_deleted_stream_gets_header_again() {
        let dir = temp_dir("deleted");
        let mut sink = CsvTelemetrySink::open(&dir, SessionClock::with_id("s1")).unwrap();
        fs::remove_file(sink.path_for(Category::Health)).unwrap();

        sink.record(3, TelemetryEvent::health(20, 100)).unwrap();

        let contents = fs::read_to_string(sink.path_for(Category::Health)).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], Category::Health.header_line());
        assert!(lines[1].ends_with(",3,20,100"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = temp_dir("failure");
        let mut sink = CsvTelemetrySink::open(&dir, SessionClock::with_id("s1")).unwrap();
        // Replace the stream file with a directory so the append cannot open it.
        let path = sink.path_for(Category::Items);
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let result = sink.record(1, TelemetryEvent::item("Potion (+25 HP)", 5));
        assert!(matches!(result, Err(TelemetryError::Io { .. })));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failing_sink_stops_after_budget() {
        let mut sink = FailingSink::after(1);
        sink.record(1, TelemetryEvent::health(50, 100)).unwrap();
        assert!(sink.record(1, TelemetryEvent::health(40, 100)).is_err());
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn test_memory_sink_keeps_order_and_filters() {
        let mut sink = MemorySink::default();
        sink.record(1, TelemetryEvent::skill(HeroAction::MagicAttack, 30))
            .unwrap();
        sink.record(1, TelemetryEvent::damage(AttackKind::Magic, 30))
            .unwrap();
        sink.record(1, TelemetryEvent::health(70, 100)).unwrap();

        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.count(Category::Skills), 1);
        assert_eq!(sink.count(Category::Damage), 1);
        assert_eq!(sink.count(Category::Items), 0);
        assert_eq!(sink.records()[2].category(), Category::Health);
        assert_eq!(sink.session_id(), "memory");
    }
}
