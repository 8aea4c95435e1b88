//! SVG summary charts drawn from the normalized tables.
//!
//! Each chart is built in two steps: a builder reads one or two tables into a
//! [`Chart`] (returning `None` when its source tables are absent or empty),
//! then [`ChartRenderer`] lays it out as an SVG document.

use anyhow::{Context, Result};
use extractor::{Table, TableSet, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use svg::node::element::{Group, Line, Polyline, Rectangle, Text};
use svg::Document;
use tracing::{debug, info};

const BILLION: f64 = 1e9;
const MILLION: f64 = 1e6;
const TOP_CLAIMS: usize = 15;

/// Fill colour per PAMF discipline group.
fn group_color(group: &str) -> &'static str {
    match group {
        "COVID" => "#E53935",
        "LOGISTIC" => "#1E88E5",
        "PMT" => "#43A047",
        "SMT" => "#FB8C00",
        _ => "#757575",
    }
}

/// Stacked column: one value per legend entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub segments: Vec<f64>,
    /// Printed above the column.
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalBar {
    pub label: String,
    pub value: f64,
    pub color: String,
}

/// Values aligned with the chart's x labels; gaps are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Columns {
        legend: Vec<(String, String)>,
        columns: Vec<Column>,
    },
    Bars(Vec<HorizontalBar>),
    Lines {
        x_labels: Vec<String>,
        series: Vec<Series>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub unit: String,
    pub kind: ChartKind,
}

/// SVG chart layout configuration
#[derive(Clone, Debug)]
pub struct ChartRenderer {
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    /// Space for the title above the plot area
    pub title_height: u32,
    /// Space left of the plot for value ticks
    pub axis_width: u32,
    /// Space left of horizontal bars for their labels
    pub label_width: u32,
    /// Space below the plot for category labels and the legend
    pub footer_height: u32,
    pub background_color: String,
    pub grid_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size: u32,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            padding: 20,
            title_height: 40,
            axis_width: 60,
            label_width: 260,
            footer_height: 60,
            background_color: "#ffffff".into(),
            grid_color: "#ecf0f1".into(),
            text_color: "#2c3e50".into(),
            font_family: "system-ui, -apple-system, sans-serif".into(),
            font_size: 12,
        }
    }
}

struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self, chart: &Chart) -> Document {
        let mut document = Document::new()
            .set("width", self.width)
            .set("height", self.height)
            .set("viewBox", (0, 0, self.width, self.height))
            .set("xmlns", "http://www.w3.org/2000/svg");

        document = document.add(
            Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", self.background_color.as_str()),
        );
        document = document.add(
            self.text(chart.title.as_str(), self.padding as f64, (self.padding + 18) as f64)
                .set("font-size", self.font_size + 4)
                .set("font-weight", "bold"),
        );

        let body = match &chart.kind {
            ChartKind::Columns { legend, columns } => self.render_columns(&chart.unit, legend, columns),
            ChartKind::Bars(bars) => self.render_bars(&chart.unit, bars),
            ChartKind::Lines { x_labels, series } => self.render_lines(&chart.unit, x_labels, series),
        };
        document.add(body)
    }

    fn text(&self, content: &str, x: f64, y: f64) -> Text {
        Text::new(content)
            .set("x", x)
            .set("y", y)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("fill", self.text_color.as_str())
    }

    fn plot_area(&self, left_margin: u32) -> PlotArea {
        let left = (self.padding + left_margin) as f64;
        let top = (self.padding + self.title_height) as f64;
        PlotArea {
            left,
            top,
            width: (self.width as f64 - left - self.padding as f64).max(1.0),
            height: (self.height as f64 - top - (self.padding + self.footer_height) as f64).max(1.0),
        }
    }

    /// Horizontal grid lines with value labels from `low` to `high`.
    fn value_grid(&self, area: &PlotArea, low: f64, high: f64, unit: &str) -> Group {
        let mut group = Group::new().set("class", "grid");
        for step in 0..=4 {
            let fraction = step as f64 / 4.0;
            let y = area.bottom() - fraction * area.height;
            group = group.add(
                Line::new()
                    .set("x1", area.left)
                    .set("y1", y)
                    .set("x2", area.left + area.width)
                    .set("y2", y)
                    .set("stroke", self.grid_color.as_str())
                    .set("stroke-width", 1),
            );
            group = group.add(
                self.text(&format_tick(low + fraction * (high - low)), area.left - 6.0, y + 4.0)
                    .set("text-anchor", "end"),
            );
        }
        group.add(
            self.text(unit, self.padding as f64, area.top - 8.0)
                .set("font-style", "italic"),
        )
    }

    fn render_columns(&self, unit: &str, legend: &[(String, String)], columns: &[Column]) -> Group {
        let area = self.plot_area(self.axis_width);
        let high = columns
            .iter()
            .map(|c| c.segments.iter().map(|v| v.max(0.0)).sum::<f64>())
            .fold(0.0, f64::max);
        let high = if high > 0.0 { high * 1.15 } else { 1.0 };
        let scale = area.height / high;

        let mut group = Group::new().set("class", "columns");
        group = group.add(self.value_grid(&area, 0.0, high, unit));

        let slot = area.width / columns.len().max(1) as f64;
        for (index, column) in columns.iter().enumerate() {
            let x = area.left + slot * index as f64 + slot * 0.2;
            let mut y = area.bottom();
            for (segment, value) in column.segments.iter().enumerate() {
                let height = value.max(0.0) * scale;
                y -= height;
                let color = legend
                    .get(segment)
                    .map(|(_, color)| color.as_str())
                    .unwrap_or("#757575");
                group = group.add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", y)
                        .set("width", slot * 0.6)
                        .set("height", height)
                        .set("fill", color),
                );
            }
            let center = x + slot * 0.3;
            if let Some(annotation) = &column.annotation {
                group = group.add(
                    self.text(annotation, center, y - 6.0)
                        .set("text-anchor", "middle")
                        .set("font-weight", "bold"),
                );
            }
            group = group.add(
                self.text(&column.label, center, area.bottom() + 18.0)
                    .set("text-anchor", "middle"),
            );
        }

        let legend_y = area.bottom() + 42.0;
        for (index, (name, color)) in legend.iter().enumerate() {
            let x = area.left + index as f64 * 160.0;
            group = group.add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", legend_y - 10.0)
                    .set("width", 12)
                    .set("height", 12)
                    .set("fill", color.as_str()),
            );
            group = group.add(self.text(name, x + 18.0, legend_y));
        }
        group
    }

    fn render_bars(&self, unit: &str, bars: &[HorizontalBar]) -> Group {
        let area = self.plot_area(self.label_width);
        let high = bars.iter().map(|b| b.value.abs()).fold(0.0, f64::max);
        let high = if high > 0.0 { high * 1.15 } else { 1.0 };
        let scale = area.width / high;
        let slot = area.height / bars.len().max(1) as f64;

        let mut group = Group::new().set("class", "bars");
        group = group.add(
            self.text(unit, area.left, area.bottom() + 24.0)
                .set("font-style", "italic"),
        );
        for (index, bar) in bars.iter().enumerate() {
            let y = area.top + slot * index as f64;
            let width = bar.value.abs() * scale;
            group = group.add(
                Rectangle::new()
                    .set("x", area.left)
                    .set("y", y + slot * 0.15)
                    .set("width", width)
                    .set("height", slot * 0.7)
                    .set("fill", bar.color.as_str()),
            );
            group = group.add(
                self.text(&truncate(&bar.label, 40), area.left - 8.0, y + slot / 2.0 + 4.0)
                    .set("text-anchor", "end"),
            );
            group = group.add(self.text(
                &format_tick(bar.value),
                area.left + width + 6.0,
                y + slot / 2.0 + 4.0,
            ));
        }
        group
    }

    fn render_lines(&self, unit: &str, x_labels: &[String], series: &[Series]) -> Group {
        let area = self.plot_area(self.axis_width);
        let values = || series.iter().flat_map(|s| s.values.iter().flatten().copied());
        let low = values().fold(0.0, f64::min);
        let high = values().fold(0.0, f64::max);
        let high = if high > low { high + (high - low) * 0.1 } else { low + 1.0 };
        let y_of = |value: f64| area.bottom() - (value - low) / (high - low) * area.height;

        let step = area.width / x_labels.len().max(1) as f64;
        let x_of = |index: usize| area.left + step * (index as f64 + 0.5);

        let mut group = Group::new().set("class", "lines");
        group = group.add(self.value_grid(&area, low, high, unit));

        // Roughly a dozen labels whatever the span.
        let every = (x_labels.len() / 12).max(1);
        for (index, label) in x_labels.iter().enumerate().step_by(every) {
            group = group.add(
                self.text(label, x_of(index), area.bottom() + 18.0)
                    .set("text-anchor", "middle")
                    .set("font-size", self.font_size.saturating_sub(2)),
            );
        }

        for (index, line) in series.iter().enumerate() {
            let points = line
                .values
                .iter()
                .enumerate()
                .filter_map(|(i, &v)| v.map(|v| format!("{:.1},{:.1}", x_of(i), y_of(v))))
                .collect::<Vec<_>>()
                .join(" ");
            group = group.add(
                Polyline::new()
                    .set("points", points)
                    .set("fill", "none")
                    .set("stroke", line.color.as_str())
                    .set("stroke-width", 2),
            );

            let x = area.left + index as f64 * 200.0;
            let legend_y = area.bottom() + 42.0;
            group = group.add(
                Line::new()
                    .set("x1", x)
                    .set("y1", legend_y - 4.0)
                    .set("x2", x + 14.0)
                    .set("y2", legend_y - 4.0)
                    .set("stroke", line.color.as_str())
                    .set("stroke-width", 3),
            );
            group = group.add(self.text(&line.name, x + 20.0, legend_y));
        }
        group
    }
}

fn format_tick(value: f64) -> String {
    if value.abs() >= 100.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

// ----------------------------------------------------------------------------
// Table access
// ----------------------------------------------------------------------------

fn number(table: &Table, row: &[Value], column: &str) -> Option<f64> {
    table
        .column_index(column)
        .and_then(|i| row.get(i))
        .and_then(Value::as_f64)
}

fn text<'a>(table: &Table, row: &'a [Value], column: &str) -> Option<&'a str> {
    table
        .column_index(column)
        .and_then(|i| row.get(i))
        .and_then(Value::as_text)
}

fn month(table: &Table, row: &[Value]) -> Option<(i64, i64)> {
    let field = |column| {
        table
            .column_index(column)
            .and_then(|i| row.get(i))
            .and_then(Value::as_int)
    };
    Some((field("year")?, field("month")?))
}

fn source<'a>(tables: &'a TableSet, name: &str) -> Option<&'a Table> {
    tables.get(name).filter(|t| !t.is_empty())
}

/// Month axis over every key of `series`, each series aligned to it.
fn monthly_lines(series: Vec<(String, &str, BTreeMap<(i64, i64), f64>)>) -> (Vec<String>, Vec<Series>) {
    let keys: Vec<(i64, i64)> = series
        .iter()
        .flat_map(|(_, _, values)| values.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let x_labels = keys.iter().map(|(y, m)| format!("{}-{:02}", y, m)).collect();
    let series = series
        .into_iter()
        .map(|(name, color, values)| Series {
            name,
            color: color.to_string(),
            values: keys.iter().map(|key| values.get(key).copied()).collect(),
        })
        .collect();
    (x_labels, series)
}

// ----------------------------------------------------------------------------
// Charts
// ----------------------------------------------------------------------------

/// Contract composition per amendment, annotated with the total value.
pub fn contract_evolution(tables: &TableSet) -> Option<Chart> {
    let table = source(tables, "tb_m_amendment")?;
    let categories = [
        ("Lump Sum", "lump_sum_value", "#1565C0"),
        ("Reimbursable", "reimbursable_value", "#43A047"),
        ("Provisional", "provisional_sum_value", "#EF6C00"),
    ];

    let columns = table
        .rows
        .iter()
        .map(|row| Column {
            label: text(table, row, "amendment_code").unwrap_or("").to_string(),
            segments: categories
                .iter()
                .map(|(_, column, _)| number(table, row, column).unwrap_or(0.0) / BILLION)
                .collect(),
            annotation: number(table, row, "total_contract_value")
                .map(|total| format!("${:.2}B", total / BILLION)),
        })
        .collect();

    Some(Chart {
        title: "TEP Contract Value Evolution".to_string(),
        unit: "Billion USD".to_string(),
        kind: ChartKind::Columns {
            legend: categories
                .iter()
                .map(|(name, _, color)| (name.to_string(), color.to_string()))
                .collect(),
            columns,
        },
    })
}

/// Level-0 claim amounts summed per discipline group, largest first.
pub fn cost_breakdown(tables: &TableSet) -> Option<Chart> {
    let table = source(tables, "tb_t_pamf_claim")?;
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in &table.rows {
        if number(table, row, "level") != Some(0.0) {
            continue;
        }
        let group = text(table, row, "pamf_group").unwrap_or("OTHER");
        *totals.entry(group).or_default() += number(table, row, "claim_amount_usd").unwrap_or(0.0);
    }
    if totals.is_empty() {
        return None;
    }

    let mut bars: Vec<HorizontalBar> = totals
        .into_iter()
        .map(|(group, total)| HorizontalBar {
            label: group.to_string(),
            value: total / MILLION,
            color: group_color(group).to_string(),
        })
        .collect();
    bars.sort_by(|a, b| b.value.total_cmp(&a.value));

    Some(Chart {
        title: "PAMF Claims by Discipline Group".to_string(),
        unit: "Million USD".to_string(),
        kind: ChartKind::Bars(bars),
    })
}

/// FGRS monthly spend and the LOGI running total.
pub fn monthly_costs(tables: &TableSet) -> Option<Chart> {
    let table = source(tables, "tb_t_monthly_cost")?;
    let mut fgrs = BTreeMap::new();
    let mut logi = BTreeMap::new();
    for row in &table.rows {
        let Some(key) = month(table, row) else {
            continue;
        };
        match text(table, row, "cost_type") {
            Some("FGRS_RCE") => {
                if let Some(v) = number(table, row, "monthly_amount_musd") {
                    fgrs.insert(key, v);
                }
            }
            Some("LOGI_RCE") => {
                let value = number(table, row, "cumulative_amount_musd")
                    .or_else(|| number(table, row, "monthly_amount_musd"));
                if let Some(v) = value {
                    logi.insert(key, v);
                }
            }
            _ => {}
        }
    }

    let (x_labels, series) = monthly_lines(vec![
        ("FGRS RCE monthly".to_string(), "#1976D2", fgrs),
        ("LOGI RCE cumulative".to_string(), "#388E3C", logi),
    ]);
    Some(Chart {
        title: "FGRS and LOGI RCE Cost".to_string(),
        unit: "MUSD".to_string(),
        kind: ChartKind::Lines { x_labels, series },
    })
}

pub fn pob_timeline(tables: &TableSet) -> Option<Chart> {
    let table = source(tables, "tb_t_monthly_pob")?;
    let mut pob = BTreeMap::new();
    let mut isolation = BTreeMap::new();
    for row in &table.rows {
        let Some(key) = month(table, row) else {
            continue;
        };
        if let Some(v) = number(table, row, "pob_count") {
            pob.insert(key, v);
        }
        if let Some(v) = number(table, row, "isolation_count") {
            isolation.insert(key, v);
        }
    }

    let (x_labels, series) = monthly_lines(vec![
        ("POB".to_string(), "#1976D2", pob),
        ("Isolation facility".to_string(), "#E53935", isolation),
    ]);
    Some(Chart {
        title: "Monthly Personnel on Board".to_string(),
        unit: "Personnel".to_string(),
        kind: ChartKind::Lines { x_labels, series },
    })
}

/// Plan and actual cumulative progress per subcontractor, in percent.
pub fn subcontractor_progress(tables: &TableSet) -> Option<Chart> {
    const PALETTE: [&str; 3] = ["#1565C0", "#C62828", "#2E7D32"];
    let table = source(tables, "tb_t_project_progress")?;

    let mut names: Vec<&str> = Vec::new();
    let mut curves: BTreeMap<(&str, &str), BTreeMap<(i64, i64), f64>> = BTreeMap::new();
    for row in &table.rows {
        let (Some(name), Some(key)) = (text(table, row, "subcontractor"), month(table, row)) else {
            continue;
        };
        if !names.contains(&name) {
            names.push(name);
        }
        for (kind, column) in [("plan", "plan_progress_pct"), ("actual", "overall_progress_pct")] {
            if let Some(v) = number(table, row, column) {
                curves.entry((name, kind)).or_default().insert(key, v * 100.0);
            }
        }
    }

    let mut lines = Vec::new();
    for (index, name) in names.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        for kind in ["plan", "actual"] {
            if let Some(values) = curves.remove(&(*name, kind)) {
                lines.push((format!("{} {}", name, kind), color, values));
            }
        }
    }
    if lines.is_empty() {
        return None;
    }

    let (x_labels, series) = monthly_lines(lines);
    Some(Chart {
        title: "Subcontractor Progress S-Curves (Plan vs Actual)".to_string(),
        unit: "Progress (%)".to_string(),
        kind: ChartKind::Lines { x_labels, series },
    })
}

/// Largest claims at the deepest level present.
pub fn pamf_analysis(tables: &TableSet) -> Option<Chart> {
    let table = source(tables, "tb_t_pamf_claim")?;
    let deepest = table.column("level").filter_map(Value::as_int).max()?;

    let mut bars: Vec<HorizontalBar> = table
        .rows
        .iter()
        .filter(|row| number(table, row, "level") == Some(deepest as f64))
        .filter_map(|row| {
            let amount = number(table, row, "claim_amount_usd")?;
            let group = text(table, row, "pamf_group").unwrap_or("OTHER");
            Some(HorizontalBar {
                label: text(table, row, "label").unwrap_or("").to_string(),
                value: amount / MILLION,
                color: group_color(group).to_string(),
            })
        })
        .collect();
    bars.sort_by(|a, b| b.value.total_cmp(&a.value));
    bars.truncate(TOP_CLAIMS);
    if bars.is_empty() {
        return None;
    }

    Some(Chart {
        title: format!("Top {} PAMF Claim Categories", TOP_CLAIMS),
        unit: "Million USD".to_string(),
        kind: ChartKind::Bars(bars),
    })
}

type ChartBuilder = fn(&TableSet) -> Option<Chart>;

pub const CHARTS: [(&str, ChartBuilder); 6] = [
    ("viz_01_contract_evolution.svg", contract_evolution),
    ("viz_02_cost_breakdown.svg", cost_breakdown),
    ("viz_03_monthly_costs.svg", monthly_costs),
    ("viz_04_pob_timeline.svg", pob_timeline),
    ("viz_05_subcontractor_progress.svg", subcontractor_progress),
    ("viz_06_pamf_analysis.svg", pamf_analysis),
];

/// Render every chart whose data is present into `dir`.
pub fn render_all(tables: &TableSet, dir: &Path, renderer: &ChartRenderer) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (file_name, build) in CHARTS {
        let Some(chart) = build(tables) else {
            info!(chart = file_name, "skipped chart, no data");
            continue;
        };
        let path = dir.join(file_name);
        svg::save(&path, &renderer.render(&chart))
            .with_context(|| format!("Failed to write chart {}", path.display()))?;
        debug!(path = %path.display(), title = %chart.title, "wrote chart");
        written.push(path);
    }
    Ok(written)
}
