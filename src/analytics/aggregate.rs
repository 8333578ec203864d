//! Per-floor aggregates over loaded telemetry, and the report built from them.

use std::collections::BTreeMap;

use serde::Serialize;

use super::loader::{
    DamageRow, HealthRow, ItemRow, SkillRow, StreamResult, StreamRow, TelemetryData, UpgradeRow,
};
use crate::core::constants::TELEMETRY_SCHEMA_VERSION;

/// Which sessions an aggregate covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionFilter {
    #[default]
    All,
    Only(String),
}

impl SessionFilter {
    pub fn from_option(session: Option<String>) -> Self {
        match session {
            Some(id) => SessionFilter::Only(id),
            None => SessionFilter::All,
        }
    }

    pub fn matches(&self, session_id: &str) -> bool {
        match self {
            SessionFilter::All => true,
            SessionFilter::Only(id) => id == session_id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SessionFilter::All => "All Sessions",
            SessionFilter::Only(id) => id,
        }
    }

    /// Suffix for exported report files. Anything but ASCII letters, digits,
    /// `_` and `-` becomes `_`, so the name cannot leave the export directory.
    pub fn file_stem(&self) -> String {
        match self {
            SessionFilter::All => "all".to_string(),
            SessionFilter::Only(id) => id
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect(),
        }
    }
}

pub fn filter_rows<'a, T: StreamRow>(rows: &'a [T], filter: &SessionFilter) -> Vec<&'a T> {
    rows.iter()
        .filter(|row| filter.matches(&row.key().session_id))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorDamage {
    pub floor: u32,
    pub mean_damage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorHealth {
    pub floor: u32,
    pub mean_remaining: f64,
    pub max_remaining: f64,
    /// Max health of the first snapshot on the floor.
    pub max_health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCount {
    pub item_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillProgress {
    pub floor: u32,
    pub skill_name: String,
    pub mean_effect: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeProgress {
    pub floor: u32,
    pub stat: String,
    pub max_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPoint {
    pub floor: u32,
    pub upgrade_value: f64,
    pub mean_damage: f64,
}

/// Least-squares line of damage over upgrade value, plus Pearson's r.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub points: Vec<CorrelationPoint>,
    /// Needs at least two points with spread on both axes.
    pub fit: Option<LinearFit>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub fn damage_by_floor(rows: &[&DamageRow]) -> Vec<FloorDamage> {
    let mut by_floor: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for row in rows {
        by_floor.entry(row.key.floor).or_default().push(row.damage);
    }
    by_floor
        .into_iter()
        .map(|(floor, values)| FloorDamage {
            floor,
            mean_damage: mean(&values),
        })
        .collect()
}

pub fn health_by_floor(rows: &[&HealthRow]) -> Vec<FloorHealth> {
    let mut by_floor: BTreeMap<u32, (Vec<f64>, f64)> = BTreeMap::new();
    for row in rows {
        by_floor
            .entry(row.key.floor)
            .or_insert_with(|| (Vec::new(), row.max_health))
            .0
            .push(row.remaining);
    }
    by_floor
        .into_iter()
        .map(|(floor, (values, max_health))| FloorHealth {
            floor,
            mean_remaining: mean(&values),
            max_remaining: max_of(&values),
            max_health,
        })
        .collect()
}

/// Purchase counts, most bought first; ties by name.
pub fn item_frequency(rows: &[&ItemRow]) -> Vec<ItemCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(row.item_name.as_str()).or_default() += 1;
    }
    let mut items: Vec<ItemCount> = counts
        .into_iter()
        .map(|(name, count)| ItemCount {
            item_name: name.to_string(),
            count,
        })
        .collect();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.item_name.cmp(&b.item_name)));
    items
}

pub fn skills_by_floor(rows: &[&SkillRow]) -> Vec<SkillProgress> {
    let mut groups: BTreeMap<(u32, &str), Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.key.floor, row.skill_name.as_str()))
            .or_default()
            .push(row.effect);
    }
    groups
        .into_iter()
        .map(|((floor, skill), values)| SkillProgress {
            floor,
            skill_name: skill.to_string(),
            mean_effect: mean(&values),
        })
        .collect()
}

pub fn upgrades_by_floor(rows: &[&UpgradeRow]) -> Vec<UpgradeProgress> {
    let mut groups: BTreeMap<(u32, &str), Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.key.floor, row.stat.as_str()))
            .or_default()
            .push(row.new_value);
    }
    groups
        .into_iter()
        .map(|((floor, stat), values)| UpgradeProgress {
            floor,
            stat: stat.to_string(),
            max_value: max_of(&values),
        })
        .collect()
}

/// Joins per-floor mean damage with the per-floor highest upgrade value.
/// Floors missing from either side are dropped.
pub fn damage_upgrade_correlation(damage: &[&DamageRow], upgrades: &[&UpgradeRow]) -> Correlation {
    let mut upgrade_max: BTreeMap<u32, f64> = BTreeMap::new();
    for row in upgrades {
        let entry = upgrade_max.entry(row.key.floor).or_insert(f64::NEG_INFINITY);
        *entry = entry.max(row.new_value);
    }

    let points: Vec<CorrelationPoint> = damage_by_floor(damage)
        .into_iter()
        .filter_map(|d| {
            upgrade_max.get(&d.floor).map(|&upgrade_value| CorrelationPoint {
                floor: d.floor,
                upgrade_value,
                mean_damage: d.mean_damage,
            })
        })
        .collect();

    let fit = linear_fit(&points);
    Correlation { points, fit }
}

fn linear_fit(points: &[CorrelationPoint]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }
    let xs: Vec<f64> = points.iter().map(|p| p.upgrade_value).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.mean_damage).collect();
    let (mx, my) = (mean(&xs), mean(&ys));

    let mut sxy: f64 = 0.0;
    let mut sxx: f64 = 0.0;
    let mut syy: f64 = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
        syy += (y - my) * (y - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: my - slope * mx,
        r: sxy / (sxx.sqrt() * syy.sqrt()),
    })
}

/// One aggregate section. Holds the load error when its stream is unusable.
pub type Section<T> = Result<T, String>;

fn section<T: StreamRow, A>(
    stream: &StreamResult<T>,
    filter: &SessionFilter,
    aggregate: impl FnOnce(&[&T]) -> A,
) -> Section<A> {
    match stream {
        Ok(rows) => Ok(aggregate(&filter_rows(rows, filter))),
        Err(err) => Err(err.to_string()),
    }
}

/// Everything the dashboard shows for one session filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub schema_version: u32,
    pub session: String,
    pub sessions: Vec<String>,
    pub damage: Section<Vec<FloorDamage>>,
    pub health: Section<Vec<FloorHealth>>,
    pub items: Section<Vec<ItemCount>>,
    pub skills: Section<Vec<SkillProgress>>,
    pub upgrades: Section<Vec<UpgradeProgress>>,
    pub correlation: Section<Correlation>,
}

impl AnalyticsReport {
    pub fn build(data: &TelemetryData, filter: &SessionFilter) -> Self {
        let correlation = match (&data.damage, &data.upgrades) {
            (Ok(damage), Ok(upgrades)) => Ok(damage_upgrade_correlation(
                &filter_rows(damage, filter),
                &filter_rows(upgrades, filter),
            )),
            (Err(err), _) | (_, Err(err)) => Err(err.to_string()),
        };

        Self {
            schema_version: TELEMETRY_SCHEMA_VERSION,
            session: filter.label().to_string(),
            sessions: data.sessions(),
            damage: section(&data.damage, filter, damage_by_floor),
            health: section(&data.health, filter, health_by_floor),
            items: section(&data.items, filter, item_frequency),
            skills: section(&data.skills, filter, skills_by_floor),
            upgrades: section(&data.upgrades, filter, upgrades_by_floor),
            correlation,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        let mut report = String::new();

        report.push_str("═══════════════════════════════════════════════════════════════\n");
        report.push_str("                    SPIRE TELEMETRY REPORT\n");
        report.push_str("═══════════════════════════════════════════════════════════════\n\n");
        report.push_str(&format!("Session: {}\n", self.session));
        report.push_str(&format!("Sessions on disk: {}\n\n", self.sessions.len()));

        report.push_str("── DAMAGE BY FLOOR ──────────────────────────────────────────────\n");
        push_section(&mut report, &self.damage, |report, rows| {
            for row in rows {
                report.push_str(&format!(
                    "  Floor {:3}: avg {:>7.1}\n",
                    row.floor, row.mean_damage
                ));
            }
        });

        report.push_str("── HEALTH BY FLOOR ──────────────────────────────────────────────\n");
        push_section(&mut report, &self.health, |report, rows| {
            for row in rows {
                report.push_str(&format!(
                    "  Floor {:3}: avg {:>6.1}  max {:>6.1}  of {:>5.0}\n",
                    row.floor, row.mean_remaining, row.max_remaining, row.max_health
                ));
            }
        });

        report.push_str("── ITEMS ────────────────────────────────────────────────────────\n");
        push_section(&mut report, &self.items, |report, rows| {
            for row in rows {
                report.push_str(&format!("  {:<30} {:>4}\n", row.item_name, row.count));
            }
        });

        report.push_str("── SKILLS BY FLOOR ──────────────────────────────────────────────\n");
        push_section(&mut report, &self.skills, |report, rows| {
            for row in rows {
                report.push_str(&format!(
                    "  Floor {:3}: {:<16} {:>7.1}\n",
                    row.floor, row.skill_name, row.mean_effect
                ));
            }
        });

        report.push_str("── UPGRADES BY FLOOR ────────────────────────────────────────────\n");
        push_section(&mut report, &self.upgrades, |report, rows| {
            for row in rows {
                report.push_str(&format!(
                    "  Floor {:3}: {:<10} {:>7.2}\n",
                    row.floor, row.stat, row.max_value
                ));
            }
        });

        report.push_str("── DAMAGE VS UPGRADE ────────────────────────────────────────────\n");
        match &self.correlation {
            Ok(correlation) => {
                for point in &correlation.points {
                    report.push_str(&format!(
                        "  Floor {:3}: upgrade {:>7.2}  damage {:>7.1}\n",
                        point.floor, point.upgrade_value, point.mean_damage
                    ));
                }
                match &correlation.fit {
                    Some(fit) => report.push_str(&format!(
                        "  Correlation: {:.2}  (damage = {:.2} x upgrade + {:.2})\n\n",
                        fit.r, fit.slope, fit.intercept
                    )),
                    None => report.push_str("  Not enough data for a trend line\n\n"),
                }
            }
            Err(err) => report.push_str(&format!("  unavailable: {}\n\n", err)),
        }

        report
    }
}

fn push_section<T>(
    report: &mut String,
    section: &Section<Vec<T>>,
    body: impl FnOnce(&mut String, &[T]),
) {
    match section {
        Ok(rows) if rows.is_empty() => report.push_str("  (no data)\n"),
        Ok(rows) => body(report, rows),
        Err(err) => report.push_str(&format!("  unavailable: {}\n", err)),
    }
    report.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::loader::RowKey;
    use crate::error::AnalyticsError;
    use std::path::PathBuf;

    fn key(session: &str, floor: u32) -> RowKey {
        RowKey {
            session_id: session.to_string(),
            timestamp: "2024-01-01 10:00:00".to_string(),
            floor,
        }
    }

    fn damage(session: &str, floor: u32, amount: f64) -> DamageRow {
        DamageRow {
            key: key(session, floor),
            damage: amount,
            attack_type: "Magic".to_string(),
        }
    }

    fn upgrade(session: &str, floor: u32, stat: &str, value: f64) -> UpgradeRow {
        UpgradeRow {
            key: key(session, floor),
            stat: stat.to_string(),
            new_value: value,
        }
    }

    fn item(name: &str) -> ItemRow {
        ItemRow {
            key: key("s1", 1),
            item_name: name.to_string(),
            cost: 5.0,
        }
    }

    #[test]
    fn test_damage_mean_per_floor() {
        let rows = [damage("s1", 1, 30.0), damage("s1", 1, 40.0), damage("s1", 2, 50.0)];
        let refs: Vec<&DamageRow> = rows.iter().collect();
        assert_eq!(
            damage_by_floor(&refs),
            vec![
                FloorDamage { floor: 1, mean_damage: 35.0 },
                FloorDamage { floor: 2, mean_damage: 50.0 },
            ]
        );
    }

    #[test]
    fn test_health_mean_max_and_first_max_health() {
        let rows = [
            HealthRow { key: key("s1", 1), remaining: 40.0, max_health: 100.0 },
            HealthRow { key: key("s1", 1), remaining: 80.0, max_health: 150.0 },
        ];
        let refs: Vec<&HealthRow> = rows.iter().collect();
        let floors = health_by_floor(&refs);
        assert_eq!(floors.len(), 1);
        assert_eq!(floors[0].mean_remaining, 60.0);
        assert_eq!(floors[0].max_remaining, 80.0);
        assert_eq!(floors[0].max_health, 100.0);
    }

    #[test]
    fn test_item_frequency_sorted_by_count() {
        let rows = [item("Potion (+25 HP)"), item("Wand Upgrade (+10 Magic ATK)"), item("Potion (+25 HP)")];
        let refs: Vec<&ItemRow> = rows.iter().collect();
        let counts = item_frequency(&refs);
        assert_eq!(counts[0].item_name, "Potion (+25 HP)");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].count, 1);
    }

    #[test]
    fn test_upgrades_take_max_per_floor_and_stat() {
        let rows = [
            upgrade("s1", 1, "Magic", 4.0),
            upgrade("s2", 1, "Magic", 6.0),
            upgrade("s1", 1, "Speed", 0.2),
        ];
        let refs: Vec<&UpgradeRow> = rows.iter().collect();
        let progress = upgrades_by_floor(&refs);
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].stat, "Magic");
        assert_eq!(progress[0].max_value, 6.0);
    }

    #[test]
    fn test_session_filter() {
        let rows = [damage("s1", 1, 30.0), damage("s2", 1, 90.0)];
        let only = filter_rows(&rows[..], &SessionFilter::Only("s2".into()));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].damage, 90.0);
        assert_eq!(filter_rows(&rows[..], &SessionFilter::All).len(), 2);
        assert_eq!(SessionFilter::All.file_stem(), "all");
    }

    #[test]
    fn test_file_stem_stays_a_plain_name() {
        let stem = |id: &str| SessionFilter::Only(id.to_string()).file_stem();
        assert_eq!(stem("20240101_100000"), "20240101_100000");
        assert_eq!(stem("../x"), "___x");
        assert_eq!(stem("a/b\\c"), "a_b_c");
        assert!(!stem("/etc/passwd").contains('/'));
    }

    #[test]
    fn test_correlation_perfect_line() {
        let d = [damage("s1", 1, 30.0), damage("s1", 2, 40.0), damage("s1", 3, 50.0)];
        let u = [
            upgrade("s1", 1, "Magic", 4.0),
            upgrade("s1", 2, "Magic", 5.0),
            upgrade("s1", 3, "Magic", 6.0),
        ];
        let corr = damage_upgrade_correlation(
            &d.iter().collect::<Vec<_>>(),
            &u.iter().collect::<Vec<_>>(),
        );
        assert_eq!(corr.points.len(), 3);
        let fit = corr.fit.unwrap();
        assert!((fit.slope - 10.0).abs() < 1e-9);
        assert!((fit.intercept + 10.0).abs() < 1e-9);
        assert!((fit.r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_needs_spread() {
        let d = [damage("s1", 1, 30.0), damage("s1", 2, 40.0)];
        let u = [upgrade("s1", 1, "Magic", 4.0), upgrade("s1", 2, "Strength", 4.0)];
        let corr = damage_upgrade_correlation(
            &d.iter().collect::<Vec<_>>(),
            &u.iter().collect::<Vec<_>>(),
        );
        assert_eq!(corr.points.len(), 2);
        assert!(corr.fit.is_none());
    }

    #[test]
    fn test_correlation_drops_unmatched_floors() {
        let d = [damage("s1", 1, 30.0), damage("s1", 2, 40.0)];
        let u = [upgrade("s1", 2, "Magic", 4.0)];
        let corr = damage_upgrade_correlation(
            &d.iter().collect::<Vec<_>>(),
            &u.iter().collect::<Vec<_>>(),
        );
        assert_eq!(corr.points.len(), 1);
        assert_eq!(corr.points[0].floor, 2);
        assert!(corr.fit.is_none());
    }

    #[test]
    fn test_broken_stream_only_affects_its_sections() {
        let data = TelemetryData {
            skills: Ok(Vec::new()),
            upgrades: Ok(Vec::new()),
            damage: Err(AnalyticsError::MissingStream(PathBuf::from("damage.csv"))),
            health: Ok(Vec::new()),
            items: Ok(vec![item("Potion (+25 HP)")]),
        };
        let report = AnalyticsReport::build(&data, &SessionFilter::All);

        assert!(report.damage.is_err());
        assert!(report.correlation.is_err());
        assert_eq!(report.items.as_ref().map(Vec::len), Ok(1));

        let text = report.to_text();
        assert!(text.contains("unavailable: telemetry file damage.csv not found"));
        assert!(text.contains("Potion (+25 HP)"));
        assert!(report.to_json().unwrap().contains("\"schema_version\": 1"));
    }
}
