use ratatui::{
    layout::Constraint,
    style::{Color, Modifier, Style},
    widgets::{Cell, Row},
};

use keytrial::format::{percent, two_decimals};
use keytrial::history::{AttemptRecord, LevelSummary};

pub const RECORD_WIDTHS: [Constraint; 5] = [
    Constraint::Length(4),
    Constraint::Length(14),
    Constraint::Length(10),
    Constraint::Length(10),
    Constraint::Length(10),
];

pub const SUMMARY_WIDTHS: [Constraint; 6] = [
    Constraint::Length(14),
    Constraint::Length(10),
    Constraint::Length(10),
    Constraint::Length(10),
    Constraint::Length(8),
    Constraint::Length(10),
];

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub fn record_header() -> Row<'static> {
    Row::new(vec!["#", "Level", "Time (s)", "WPM", "Accuracy"]).style(header_style())
}

pub fn summary_header() -> Row<'static> {
    Row::new(vec![
        "Level", "Attempts", "Best WPM", "Avg WPM", "SD", "Best Time",
    ])
    .style(header_style())
}

/// Pure presenter for one history row; `number` is 1-based
pub fn present_record(number: usize, record: &AttemptRecord) -> Row<'static> {
    Row::new(vec![
        Cell::from(number.to_string()).style(Style::default().add_modifier(Modifier::DIM)),
        Cell::from(record.level.to_string()),
        Cell::from(two_decimals(record.time)),
        Cell::from(two_decimals(record.wpm)).style(Style::default().fg(Color::Cyan)),
        Cell::from(percent(record.accuracy)),
    ])
}

pub fn present_summary(summary: &LevelSummary) -> Row<'static> {
    Row::new(vec![
        Cell::from(summary.level.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(summary.attempts.to_string()),
        Cell::from(two_decimals(summary.best_wpm)).style(Style::default().fg(Color::Green)),
        Cell::from(two_decimals(summary.average_wpm)),
        Cell::from(two_decimals(summary.wpm_std_dev)),
        Cell::from(two_decimals(summary.best_time)),
    ])
}

/// Index of the first record to show so that the newest `visible` rows fit
pub fn first_visible(total: usize, visible: usize) -> usize {
    total.saturating_sub(visible)
}
