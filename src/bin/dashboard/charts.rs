//! One chart per dashboard tab.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

use spire::analytics::aggregate::{
    Correlation, FloorDamage, FloorHealth, ItemCount, Section, SkillProgress, UpgradeProgress,
};

const SERIES_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::Red,
    Color::Blue,
];

/// Draws `section` with `chart`, or its load error / an empty notice instead.
pub fn draw_section<T>(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    section: &Section<T>,
    is_empty: impl Fn(&T) -> bool,
    chart: impl FnOnce(&mut Frame, Rect, &T),
) {
    match section {
        Ok(data) if is_empty(data) => draw_notice(frame, area, title, "No data yet.", Color::Gray),
        Ok(data) => chart(frame, area, data),
        Err(err) => draw_notice(frame, area, title, err, Color::Red),
    }
}

fn draw_notice(frame: &mut Frame, area: Rect, title: &str, text: &str, color: Color) {
    let notice = Paragraph::new(Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(color),
    )))
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(notice, area);
}

fn bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if (hi - lo).abs() < f64::EPSILON {
        return [lo - 1.0, hi + 1.0];
    }
    [lo, hi]
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    vec![
        Span::raw(format!("{:.0}", bounds[0])),
        Span::raw(format!("{:.1}", mid)),
        Span::raw(format!("{:.0}", bounds[1])),
    ]
}

fn floor_bounds(floors: impl Iterator<Item = u32>) -> [f64; 2] {
    bounds(floors.map(f64::from))
}

/// Mean damage per floor as bars.
pub fn draw_damage(frame: &mut Frame, area: Rect, rows: &[FloorDamage]) {
    let labels: Vec<String> = rows.iter().map(|r| r.floor.to_string()).collect();
    let bars: Vec<(&str, u64)> = labels
        .iter()
        .zip(rows.iter())
        .map(|(label, row)| (label.as_str(), row.mean_damage.max(0.0).round() as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Average Damage by Floor"),
        )
        .data(bars.as_slice())
        .bar_width(5)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Blue))
        .value_style(Style::default().fg(Color::White).bg(Color::Blue));
    frame.render_widget(chart, area);
}

/// Mean remaining health against max health, per floor.
pub fn draw_health(frame: &mut Frame, area: Rect, rows: &[FloorHealth]) {
    let mean: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (f64::from(r.floor), r.mean_remaining))
        .collect();
    let max: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (f64::from(r.floor), r.max_health))
        .collect();

    let x = floor_bounds(rows.iter().map(|r| r.floor));
    let y = bounds(
        rows.iter()
            .flat_map(|r| [r.mean_remaining, r.max_health, 0.0]),
    );

    let datasets = vec![
        Dataset::default()
            .name("Health")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&mean),
        Dataset::default()
            .name("Max Health")
            .marker(Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&max),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Health by Floor"))
        .x_axis(Axis::default().title("Floor").bounds(x).labels(axis_labels(x)))
        .y_axis(Axis::default().title("Health").bounds(y).labels(axis_labels(y)));
    frame.render_widget(chart, area);
}

/// Purchase counts as text bars, most bought first.
pub fn draw_items(frame: &mut Frame, area: Rect, rows: &[ItemCount]) {
    let top = rows.iter().map(|r| r.count).max().unwrap_or(1).max(1);
    let width = area.width.saturating_sub(44).max(1) as usize;

    let lines: Vec<Line> = rows
        .iter()
        .map(|row| {
            let bar = "█".repeat((row.count * width / top).max(1));
            Line::from(vec![
                Span::raw(format!(" {:<30} ", row.item_name)),
                Span::styled(bar, Style::default().fg(Color::Magenta)),
                Span::styled(
                    format!(" {}", row.count),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ])
        })
        .collect();

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Item Distribution"),
    );
    frame.render_widget(panel, area);
}

/// One line per named series over floors.
fn draw_series(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    y_title: &str,
    series: Vec<(String, Vec<(f64, f64)>)>,
) {
    let x = bounds(series.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.0)));
    let y = bounds(
        series
            .iter()
            .flat_map(|(_, pts)| pts.iter().map(|p| p.1))
            .chain(std::iter::once(0.0)),
    );

    let datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(i, (name, points))| {
            Dataset::default()
                .name(name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .x_axis(Axis::default().title("Floor").bounds(x).labels(axis_labels(x)))
        .y_axis(Axis::default().title(y_title.to_string()).bounds(y).labels(axis_labels(y)));
    frame.render_widget(chart, area);
}

/// Groups `(floor, name, value)` rows into one series per name, in first-seen order.
pub fn group_series<'a>(
    rows: impl Iterator<Item = (u32, &'a str, f64)>,
) -> Vec<(String, Vec<(f64, f64)>)> {
    let mut series: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    for (floor, name, value) in rows {
        let point = (f64::from(floor), value);
        match series.iter_mut().find(|(n, _)| n == name) {
            Some((_, points)) => points.push(point),
            None => series.push((name.to_string(), vec![point])),
        }
    }
    for (_, points) in series.iter_mut() {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    series
}

pub fn draw_skills(frame: &mut Frame, area: Rect, rows: &[SkillProgress]) {
    let series = group_series(
        rows.iter()
            .map(|r| (r.floor, r.skill_name.as_str(), r.mean_effect)),
    );
    draw_series(frame, area, "Skill Progression by Floor", "Effect", series);
}

pub fn draw_upgrades(frame: &mut Frame, area: Rect, rows: &[UpgradeProgress]) {
    let series = group_series(rows.iter().map(|r| (r.floor, r.stat.as_str(), r.max_value)));
    draw_series(frame, area, "Upgrades by Floor", "Value", series);
}

/// Scatter of upgrade value against mean damage, with the fitted trend line.
pub fn draw_correlation(frame: &mut Frame, area: Rect, correlation: &Correlation) {
    let points: Vec<(f64, f64)> = correlation
        .points
        .iter()
        .map(|p| (p.upgrade_value, p.mean_damage))
        .collect();
    let x = bounds(points.iter().map(|p| p.0));
    let y = bounds(points.iter().map(|p| p.1));

    let trend: Vec<(f64, f64)> = match &correlation.fit {
        Some(fit) => vec![
            (x[0], fit.slope * x[0] + fit.intercept),
            (x[1], fit.slope * x[1] + fit.intercept),
        ],
        None => Vec::new(),
    };
    let title = match &correlation.fit {
        Some(fit) => format!("Damage vs Upgrade (correlation {:.2})", fit.r),
        None => "Damage vs Upgrade".to_string(),
    };

    let mut datasets = vec![Dataset::default()
        .name("Floors")
        .marker(Marker::Dot)
        .graph_type(GraphType::Scatter)
        .style(Style::default().fg(Color::Red))
        .data(&points)];
    if !trend.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Trend")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::White))
                .data(&trend),
        );
    }

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .title("Upgrade Value")
                .bounds(x)
                .labels(axis_labels(x)),
        )
        .y_axis(
            Axis::default()
                .title("Average Damage")
                .bounds(y)
                .labels(axis_labels(y)),
        );
    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_widen_single_value() {
        assert_eq!(bounds([3.0].into_iter()), [2.0, 4.0]);
        assert_eq!(bounds(std::iter::empty()), [0.0, 1.0]);
        assert_eq!(bounds([1.0, 5.0, 2.0].into_iter()), [1.0, 5.0]);
    }

    #[test]
    fn test_group_series_keeps_first_seen_order() {
        let rows = vec![
            (2, "Magic Attack", 40.0),
            (1, "Heal", 10.0),
            (1, "Magic Attack", 30.0),
        ];
        let series = group_series(rows.into_iter());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, "Magic Attack");
        assert_eq!(series[0].1, vec![(1.0, 30.0), (2.0, 40.0)]);
        assert_eq!(series[1].0, "Heal");
    }
}
