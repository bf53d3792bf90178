use std::fmt::Display;

use chrono::TimeZone;
use colored::Colorize;
use serde::Serialize;

use crate::dashboard::{ChartConfig, ChartKind, ChartRenderer, DashboardMetrics};
use crate::paginator::PageWindow;
use crate::record::time::format_display;
use crate::record::Record;
use crate::view::ViewState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "table" | "text" | "txt" => Some(Self::Table),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn format_kv_line(label: &str, value: &str) -> String {
    format!(":: {:<10}: {}", label, value)
}

pub fn notice_ok(message: &str) {
    println!("{} {}", "::".bold().green(), message.bold().white());
}

pub fn notice_warn(message: &str) {
    eprintln!("{} {}", "[WRN]".bold().yellow(), message);
}

pub fn notice_error(message: &str) {
    eprintln!("{} {}", "[ERR]".bold().red(), message);
}

fn clip(value: &str, width: usize) -> String {
    let count = value.chars().count();
    if count <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(value: &str, width: usize) -> String {
    let clipped = clip(value, width);
    let fill = width.saturating_sub(clipped.chars().count());
    format!("{clipped}{}", " ".repeat(fill))
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

const COLUMNS: [(&str, usize); 6] = [
    ("NAME", 22),
    ("IDENTITY", 12),
    ("REASON", 24),
    ("ENTRY", 18),
    ("EXIT", 18),
    ("STATUS", 10),
];

/// The current page as a fixed-width table, followed by the page status line.
pub fn render_table<Tz>(window: &PageWindow<&Record>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    let header: Vec<String> = COLUMNS.iter().map(|(h, w)| pad(h, *w)).collect();
    out.push_str(&header.join(" ").bold().white().to_string());
    out.push('\n');

    if window.items.is_empty() {
        out.push_str(&"No records found".dimmed().to_string());
        out.push('\n');
    }

    for r in window.items.iter() {
        let status = if r.completed {
            pad("completed", COLUMNS[5].1).green().to_string()
        } else {
            pad("incomplete", COLUMNS[5].1).yellow().to_string()
        };
        let cells = [
            pad(or_dash(&r.name), COLUMNS[0].1),
            pad(or_dash(&r.identity_code), COLUMNS[1].1),
            pad(or_dash(&r.reason), COLUMNS[2].1),
            pad(&format_display(r.entry_time.as_deref(), tz), COLUMNS[3].1),
            pad(&format_display(r.exit_time.as_deref(), tz), COLUMNS[4].1),
            status,
        ];
        out.push_str(&cells.join(" "));
        out.push('\n');
        out.push_str(&format!("  {}\n", r.id_or_url.dimmed()));
    }

    out.push('\n');
    out.push_str(&page_status(window));
    out.push('\n');
    out
}

pub fn page_status<T>(window: &PageWindow<T>) -> String {
    let mut line = format!(
        "Showing {}-{} of {} :: page {}/{}",
        window.start_index_1_based,
        window.end_index_inclusive,
        window.total_count,
        window.effective_page,
        window.max_page
    );
    if window.has_previous() {
        line.push_str(" :: --page ");
        line.push_str(&(window.effective_page - 1).to_string());
        line.push_str(" for previous");
    }
    if window.has_next() {
        line.push_str(" :: --page ");
        line.push_str(&(window.effective_page + 1).to_string());
        line.push_str(" for next");
    }
    line
}

#[derive(Serialize)]
struct JsonView<'a> {
    view: &'a ViewState,
    #[serde(flatten)]
    window: &'a PageWindow<&'a Record>,
}

pub fn render_json(state: &ViewState, window: &PageWindow<&Record>) -> Vec<u8> {
    serde_json::to_vec_pretty(&JsonView {
        view: state,
        window,
    })
    .unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_metrics(metrics: &DashboardMetrics) -> String {
    [
        format_kv_line("Total", &metrics.total_visits.to_string()),
        format_kv_line("Today", &metrics.visits_today.to_string()),
        format_kv_line("Active", &metrics.active_visits.to_string()),
    ]
    .join("\n")
}

/// Draws charts as text into an in-memory buffer.
#[derive(Debug)]
pub struct TerminalCharts {
    width: usize,
    buffer: String,
}

impl TerminalCharts {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(10),
            buffer: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.buffer
    }

    fn bar(&mut self, chart: &ChartConfig) {
        let values = chart.series.first().map(|s| s.data.as_slice()).unwrap_or(&[]);
        let max = values.iter().copied().max().unwrap_or(0).max(1);
        let label_width = chart.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        for (label, value) in chart.labels.iter().zip(values) {
            let len = (*value as usize * self.width) / max as usize;
            self.buffer.push_str(&format!(
                "  {} {} {}\n",
                pad(label, label_width),
                "█".repeat(len).blue(),
                value
            ));
        }
    }

    fn donut(&mut self, chart: &ChartConfig) {
        let values = chart.series.first().map(|s| s.data.as_slice()).unwrap_or(&[]);
        let total: u64 = values.iter().sum();
        let label_width = chart.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        for (label, value) in chart.labels.iter().zip(values) {
            let share = if total == 0 {
                0.0
            } else {
                *value as f64 * 100.0 / total as f64
            };
            self.buffer.push_str(&format!(
                "  {} {} ({:.1}%)\n",
                pad(label, label_width),
                value,
                share
            ));
        }
    }
}

impl ChartRenderer for TerminalCharts {
    fn render(&mut self, chart: &ChartConfig) {
        self.buffer.push_str(&format!("{}\n", chart.title.bold().white()));
        match chart.kind {
            ChartKind::Bar => self.bar(chart),
            ChartKind::Donut => self.donut(chart),
        }
        self.buffer.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::dashboard::{status_chart, visits_per_day_chart, DayCount, StatusCounts};
    use crate::paginator::{window_of, PageSize};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("table"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::parse("xml"), None);
    }

    #[test]
    fn clip_marks_truncation() {
        assert_eq!(clip("abcdef", 4), "abc…");
        assert_eq!(pad("ab", 4), "ab  ");
    }

    #[test]
    fn table_shows_dash_for_missing_times_and_status_line() {
        plain();
        let records = vec![Record {
            id_or_url: "https://api.test/api/registros/1/".to_string(),
            name: "Ana".to_string(),
            identity_code: "12345678-5".to_string(),
            reason: "Visita".to_string(),
            entry_time: Some("2024-05-01T13:05:00Z".to_string()),
            exit_time: None,
            completed: false,
        }];
        let refs: Vec<&Record> = records.iter().collect();
        let window = window_of(&refs, PageSize::default(), 1);
        let table = render_table(&window, &Utc);
        assert!(table.contains("13:05 - 01/05/2024"));
        assert!(table.contains("incomplete"));
        assert!(table.contains("Showing 1-1 of 1 :: page 1/1"));
    }

    #[test]
    fn empty_table_says_so() {
        plain();
        let window = window_of::<&Record>(&[], PageSize::default(), 1);
        let table = render_table(&window, &Utc);
        assert!(table.contains("No records found"));
        assert!(table.contains("Showing 0-0 of 0"));
    }

    #[test]
    fn json_view_includes_window_numbers() {
        let records = vec![Record::default(); 3];
        let refs: Vec<&Record> = records.iter().collect();
        let window = window_of(&refs, PageSize::new(5).unwrap(), 1);
        let value: serde_json::Value =
            serde_json::from_slice(&render_json(&ViewState::default(), &window)).unwrap();
        assert_eq!(value["total_count"], serde_json::json!(3));
        assert_eq!(value["items"].as_array().unwrap().len(), 3);
        assert_eq!(value["view"]["sort"]["field"], serde_json::json!("entry_time"));
    }

    #[test]
    fn terminal_charts_draw_both_kinds() {
        plain();
        let metrics = DashboardMetrics {
            per_day: Some(vec![
                DayCount { day: "2024-05-01".to_string(), total: 2 },
                DayCount { day: "2024-05-02".to_string(), total: 4 },
            ]),
            statuses: Some(StatusCounts { completed: 3, incomplete: 1 }),
            ..DashboardMetrics::default()
        };
        let mut charts = TerminalCharts::new(10);
        if let Some(chart) = visits_per_day_chart(&metrics) {
            charts.render(&chart);
        }
        charts.render(&status_chart(&metrics));
        let out = charts.finish();
        assert!(out.contains(&format!("01/05 {} 2", "█".repeat(5))));
        assert!(out.contains(&format!("02/05 {} 4", "█".repeat(10))));
        assert!(out.contains("Completed  3 (75.0%)"));
    }
}
