//! Reads the five telemetry streams back into typed rows.
//!
//! Streams load independently: a missing or malformed file only poisons its
//! own slot in [`TelemetryData`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AnalyticsError;
use crate::telemetry::events::{split_records, split_row};
use crate::telemetry::{Category, TelemetryEvent, TelemetryRecord};

/// `(session_id, timestamp, floor)` shared by every row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowKey {
    pub session_id: String,
    pub timestamp: String,
    pub floor: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillRow {
    pub key: RowKey,
    pub skill_name: String,
    pub effect: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeRow {
    pub key: RowKey,
    pub stat: String,
    pub new_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageRow {
    pub key: RowKey,
    pub damage: f64,
    pub attack_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRow {
    pub key: RowKey,
    pub remaining: f64,
    pub max_health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRow {
    pub key: RowKey,
    pub item_name: String,
    pub cost: f64,
}

/// A row type backed by one CSV stream.
pub trait StreamRow: Sized {
    const CATEGORY: Category;

    /// Builds the row from its key and the two category columns.
    fn from_fields(key: RowKey, first: &str, second: &str) -> Result<Self, String>;

    fn key(&self) -> &RowKey;
}

fn parse_number(column: &str, value: &str) -> Result<f64, String> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("{} is not a number: {:?}", column, value))
}

impl StreamRow for SkillRow {
    const CATEGORY: Category = Category::Skills;

    fn from_fields(key: RowKey, first: &str, second: &str) -> Result<Self, String> {
        Ok(Self {
            key,
            skill_name: first.to_string(),
            effect: parse_number("effect", second)?,
        })
    }

    fn key(&self) -> &RowKey {
        &self.key
    }
}

impl StreamRow for UpgradeRow {
    const CATEGORY: Category = Category::Upgrades;

    fn from_fields(key: RowKey, first: &str, second: &str) -> Result<Self, String> {
        Ok(Self {
            key,
            stat: first.to_string(),
            new_value: parse_number("new_value", second)?,
        })
    }

    fn key(&self) -> &RowKey {
        &self.key
    }
}

impl StreamRow for DamageRow {
    const CATEGORY: Category = Category::Damage;

    fn from_fields(key: RowKey, first: &str, second: &str) -> Result<Self, String> {
        Ok(Self {
            key,
            damage: parse_number("damage_dealt", first)?,
            attack_type: second.to_string(),
        })
    }

    fn key(&self) -> &RowKey {
        &self.key
    }
}

impl StreamRow for HealthRow {
    const CATEGORY: Category = Category::Health;

    fn from_fields(key: RowKey, first: &str, second: &str) -> Result<Self, String> {
        Ok(Self {
            key,
            remaining: parse_number("health_remaining", first)?,
            max_health: parse_number("max_health", second)?,
        })
    }

    fn key(&self) -> &RowKey {
        &self.key
    }
}

impl StreamRow for ItemRow {
    const CATEGORY: Category = Category::Items;

    fn from_fields(key: RowKey, first: &str, second: &str) -> Result<Self, String> {
        Ok(Self {
            key,
            item_name: first.to_string(),
            cost: parse_number("cost", second)?,
        })
    }

    fn key(&self) -> &RowKey {
        &self.key
    }
}

pub type StreamResult<T> = Result<Vec<T>, AnalyticsError>;

/// Everything the dashboard reads, one slot per stream.
#[derive(Debug)]
pub struct TelemetryData {
    pub skills: StreamResult<SkillRow>,
    pub upgrades: StreamResult<UpgradeRow>,
    pub damage: StreamResult<DamageRow>,
    pub health: StreamResult<HealthRow>,
    pub items: StreamResult<ItemRow>,
}

impl TelemetryData {
    /// Loads all five streams from `dir`. Only a missing directory fails the
    /// whole load.
    pub fn load(dir: &Path) -> Result<Self, AnalyticsError> {
        if !dir.is_dir() {
            return Err(AnalyticsError::MissingDataDir(dir.to_path_buf()));
        }

        let data = Self {
            skills: load_stream(dir),
            upgrades: load_stream(dir),
            damage: load_stream(dir),
            health: load_stream(dir),
            items: load_stream(dir),
        };

        for (category, problem) in data.problems() {
            warn!(stream = category.label(), %problem, "telemetry stream unavailable");
        }
        Ok(data)
    }

    /// Builds the same view straight from in-memory records, as if they had
    /// been written and read back.
    pub fn from_records(records: &[TelemetryRecord]) -> Self {
        let mut skills = Vec::new();
        let mut upgrades = Vec::new();
        let mut damage = Vec::new();
        let mut health = Vec::new();
        let mut items = Vec::new();

        for record in records {
            let key = RowKey {
                session_id: record.session_id.clone(),
                timestamp: record.timestamp.clone(),
                floor: record.floor,
            };
            match &record.event {
                TelemetryEvent::SkillUsed { skill_name, effect } => skills.push(SkillRow {
                    key,
                    skill_name: skill_name.clone(),
                    effect: *effect as f64,
                }),
                TelemetryEvent::StatUpgraded { stat, new_value } => upgrades.push(UpgradeRow {
                    key,
                    stat: stat.clone(),
                    new_value: *new_value,
                }),
                TelemetryEvent::DamageDealt {
                    damage: amount,
                    attack_type,
                } => damage.push(DamageRow {
                    key,
                    damage: *amount as f64,
                    attack_type: attack_type.clone(),
                }),
                TelemetryEvent::HealthSnapshot {
                    remaining,
                    max_health,
                } => health.push(HealthRow {
                    key,
                    remaining: *remaining as f64,
                    max_health: *max_health as f64,
                }),
                TelemetryEvent::ItemPurchased { item_name, cost } => items.push(ItemRow {
                    key,
                    item_name: item_name.clone(),
                    cost: *cost as f64,
                }),
            }
        }

        Self {
            skills: Ok(skills),
            upgrades: Ok(upgrades),
            damage: Ok(damage),
            health: Ok(health),
            items: Ok(items),
        }
    }

    /// Streams that failed to load, with their errors.
    pub fn problems(&self) -> Vec<(Category, &AnalyticsError)> {
        [
            (Category::Skills, self.skills.as_ref().err()),
            (Category::Upgrades, self.upgrades.as_ref().err()),
            (Category::Damage, self.damage.as_ref().err()),
            (Category::Health, self.health.as_ref().err()),
            (Category::Items, self.items.as_ref().err()),
        ]
        .into_iter()
        .filter_map(|(category, err)| err.map(|err| (category, err)))
        .collect()
    }

    /// Every session id seen in any loaded stream, sorted.
    pub fn sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        ids.extend(session_ids(&self.skills));
        ids.extend(session_ids(&self.upgrades));
        ids.extend(session_ids(&self.damage));
        ids.extend(session_ids(&self.health));
        ids.extend(session_ids(&self.items));
        ids.sort();
        ids.dedup();
        ids
    }
}

fn session_ids<T: StreamRow>(stream: &StreamResult<T>) -> Vec<String> {
    match stream {
        Ok(rows) => rows.iter().map(|row| row.key().session_id.clone()).collect(),
        Err(_) => Vec::new(),
    }
}

pub fn stream_path(dir: &Path, category: Category) -> PathBuf {
    dir.join(category.file_name())
}

/// Reads one stream from `dir`.
pub fn load_stream<T: StreamRow>(dir: &Path) -> StreamResult<T> {
    let path = stream_path(dir, T::CATEGORY);
    if !path.exists() {
        return Err(AnalyticsError::MissingStream(path));
    }
    let contents = fs::read_to_string(&path).map_err(|source| AnalyticsError::Io {
        path: path.clone(),
        source,
    })?;

    let rows = parse_stream::<T>(&path, &contents)?;
    debug!(stream = T::CATEGORY.label(), rows = rows.len(), "telemetry stream loaded");
    Ok(rows)
}

/// Parses stream contents. A header row is optional; when present its first
/// five columns must match the documented names. Extra trailing columns are
/// ignored.
pub fn parse_stream<T: StreamRow>(path: &Path, contents: &str) -> StreamResult<T> {
    let expected = T::CATEGORY.columns();
    let mut rows = Vec::new();
    let mut seen_first = false;

    for (line_no, line) in split_records(contents) {
        if line.trim().is_empty() {
            continue;
        }

        let malformed = |reason: String| AnalyticsError::Malformed {
            path: path.to_path_buf(),
            line: line_no,
            reason,
        };
        let fields = split_row(&line).map_err(malformed)?;

        if !seen_first {
            seen_first = true;
            if fields.first().map(String::as_str) == Some(expected[0]) {
                let matches = fields.len() >= expected.len()
                    && fields.iter().zip(expected.iter()).all(|(f, e)| f == e);
                if !matches {
                    return Err(AnalyticsError::BadHeader {
                        path: path.to_path_buf(),
                        found: line.clone(),
                    });
                }
                continue;
            }
        }

        if fields.len() < expected.len() {
            return Err(malformed(format!(
                "expected {} columns, found {}",
                expected.len(),
                fields.len()
            )));
        }

        let floor = fields[2]
            .trim()
            .parse::<u32>()
            .map_err(|_| malformed(format!("floor is not a whole number: {:?}", fields[2])))?;
        let key = RowKey {
            session_id: fields[0].clone(),
            timestamp: fields[1].clone(),
            floor,
        };
        rows.push(T::from_fields(key, &fields[3], &fields[4]).map_err(malformed)?);
    }

    Ok(rows)
}
