//! Telemetry event types and the column contract of the five CSV streams.

use serde::Serialize;

use crate::combat::types::{AttackKind, HeroAction};

/// Columns every stream starts with.
pub const KEY_COLUMNS: [&str; 3] = ["session_id", "timestamp", "floor"];

/// One telemetry stream. Each category is persisted to its own file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Skills,
    Upgrades,
    Damage,
    Health,
    Items,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Skills,
        Category::Upgrades,
        Category::Damage,
        Category::Health,
        Category::Items,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Category::Skills => "skills.csv",
            Category::Upgrades => "upgrades.csv",
            Category::Damage => "damage.csv",
            Category::Health => "health.csv",
            Category::Items => "items.csv",
        }
    }

    /// The two category-specific columns following the key columns.
    pub fn value_columns(self) -> [&'static str; 2] {
        match self {
            Category::Skills => ["skill_name", "effect"],
            Category::Upgrades => ["stat_upgraded", "new_value"],
            Category::Damage => ["damage_dealt", "attack_type"],
            Category::Health => ["health_remaining", "max_health"],
            Category::Items => ["item_name", "cost"],
        }
    }

    /// Full header, in file order.
    pub fn columns(self) -> [&'static str; 5] {
        let [a, b] = self.value_columns();
        [KEY_COLUMNS[0], KEY_COLUMNS[1], KEY_COLUMNS[2], a, b]
    }

    pub fn header_line(self) -> String {
        self.columns().join(",")
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Skills => "Skills",
            Category::Upgrades => "Upgrades",
            Category::Damage => "Damage",
            Category::Health => "Health",
            Category::Items => "Items",
        }
    }
}

/// A single thing worth recording, without its session/time/floor key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TelemetryEvent {
    SkillUsed { skill_name: String, effect: i32 },
    StatUpgraded { stat: String, new_value: f64 },
    DamageDealt { damage: i32, attack_type: String },
    HealthSnapshot { remaining: i32, max_health: i32 },
    ItemPurchased { item_name: String, cost: u32 },
}

impl TelemetryEvent {
    pub fn skill(action: HeroAction, effect: i32) -> Self {
        TelemetryEvent::SkillUsed {
            skill_name: action.skill_name().to_string(),
            effect,
        }
    }

    pub fn damage(kind: AttackKind, damage: i32) -> Self {
        TelemetryEvent::DamageDealt {
            damage,
            attack_type: kind.label().to_string(),
        }
    }

    pub fn health(remaining: i32, max_health: i32) -> Self {
        TelemetryEvent::HealthSnapshot {
            remaining,
            max_health,
        }
    }

    pub fn upgrade(stat: &str, new_value: f64) -> Self {
        TelemetryEvent::StatUpgraded {
            stat: stat.to_string(),
            new_value,
        }
    }

    pub fn item(item_name: &str, cost: u32) -> Self {
        TelemetryEvent::ItemPurchased {
            item_name: item_name.to_string(),
            cost,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            TelemetryEvent::SkillUsed { .. } => Category::Skills,
            TelemetryEvent::StatUpgraded { .. } => Category::Upgrades,
            TelemetryEvent::DamageDealt { .. } => Category::Damage,
            TelemetryEvent::HealthSnapshot { .. } => Category::Health,
            TelemetryEvent::ItemPurchased { .. } => Category::Items,
        }
    }

    /// Category-specific column values, already formatted for CSV.
    pub fn value_fields(&self) -> [String; 2] {
        match self {
            TelemetryEvent::SkillUsed { skill_name, effect } => {
                [skill_name.clone(), effect.to_string()]
            }
            TelemetryEvent::StatUpgraded { stat, new_value } => {
                [stat.clone(), format_number(*new_value)]
            }
            TelemetryEvent::DamageDealt {
                damage,
                attack_type,
            } => [damage.to_string(), attack_type.clone()],
            TelemetryEvent::HealthSnapshot {
                remaining,
                max_health,
            } => [remaining.to_string(), max_health.to_string()],
            TelemetryEvent::ItemPurchased { item_name, cost } => {
                [item_name.clone(), cost.to_string()]
            }
        }
    }
}

/// An event keyed by session, wall-clock second and floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub session_id: String,
    pub timestamp: String,
    pub floor: u32,
    pub event: TelemetryEvent,
}

impl TelemetryRecord {
    pub fn category(&self) -> Category {
        self.event.category()
    }

    pub fn to_csv_row(&self) -> String {
        let [a, b] = self.event.value_fields();
        [
            escape_field(&self.session_id),
            escape_field(&self.timestamp),
            self.floor.to_string(),
            escape_field(&a),
            escape_field(&b),
        ]
        .join(",")
    }
}

/// Shortest decimal form: `30`, `0.2`, `2.5`.
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Quotes a field when it contains a separator, quote or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Splits file contents into records, keeping line breaks inside quoted
/// fields. Each record comes with the line number it starts on.
pub fn split_records(contents: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut record = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut start = 1;

    for c in contents.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                record.push(c);
            }
            '\n' if !in_quotes => {
                if record.ends_with('\r') {
                    record.pop();
                }
                records.push((start, std::mem::take(&mut record)));
                line += 1;
                start = line;
            }
            '\n' => {
                record.push(c);
                line += 1;
            }
            _ => record.push(c),
        }
    }

    if !record.is_empty() {
        records.push((start, record));
    }
    records
}

/// Splits one CSV record into fields, honouring double-quoted fields.
pub fn split_row(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if field.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field);
    Ok(fields)
}
