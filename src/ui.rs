pub mod history;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use keytrial::history::summarize;
use keytrial::session::{Finish, Status};
use keytrial::Level;

use crate::{App, HistoryView};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Byte length of the longest prefix of `input` that agrees with `passage`
fn matched_prefix_len(passage: &str, input: &str) -> usize {
    passage
        .char_indices()
        .zip(input.chars())
        .take_while(|((_, expected), typed)| expected == typed)
        .last()
        .map(|((idx, expected), _)| idx + expected.len_utf8())
        .unwrap_or(0)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.tester.session();
        let controls = session.controls();

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let underlined_dim_bold_style = Style::default()
            .patch(dim_bold_style)
            .add_modifier(Modifier::UNDERLINED);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let passage = session.passage().unwrap_or("");
        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let passage_lines =
            ((passage.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),             // level selector
                Constraint::Length(1),             // padding
                Constraint::Length(passage_lines), // passage
                Constraint::Length(3),             // input
                Constraint::Length(1),             // timer
                Constraint::Length(1),             // result
                Constraint::Length(1),             // notice
                Constraint::Min(3),                // history
                Constraint::Length(1),             // legend
            ])
            .split(area);

        // level selector
        let mut level_spans = vec![Span::styled("Level: ", bold_style)];
        for level in Level::ALL {
            let label = format!(" {level} ");
            let style = if session.selected_level == Some(level) {
                Style::default()
                    .fg(Color::Black)
                    .bg(if controls.level_locked {
                        Color::DarkGray
                    } else {
                        Color::Cyan
                    })
                    .add_modifier(Modifier::BOLD)
            } else {
                dim_bold_style
            };
            level_spans.push(Span::styled(label, style));
        }
        if controls.level_locked {
            level_spans.push(Span::styled("  (locked)", italic_style));
        }
        Paragraph::new(Line::from(level_spans)).render(chunks[0], buf);

        // passage, colored by how far the input agrees with it
        let passage_widget = if passage.is_empty() {
            Paragraph::new(Span::styled(
                "Select a level with (tab) or (1)/(2)/(3)",
                Style::default().fg(Color::Yellow).patch(italic_style),
            ))
        } else {
            let matched = matched_prefix_len(passage, &session.input);
            let mut spans = vec![Span::styled(passage[..matched].to_string(), green_bold_style)];
            let rest = &passage[matched..];
            let mut rest_chars = rest.chars();
            match (session.status.clone(), rest_chars.next()) {
                (Status::Running, Some(next)) => {
                    spans.push(Span::styled(next.to_string(), underlined_dim_bold_style));
                    spans.push(Span::styled(rest_chars.as_str().to_string(), dim_bold_style));
                }
                (Status::Finished(Finish::Diverged), Some(next)) => {
                    spans.push(Span::styled(next.to_string(), red_bold_style));
                    spans.push(Span::styled(rest_chars.as_str().to_string(), dim_bold_style));
                }
                _ => spans.push(Span::styled(rest.to_string(), dim_bold_style)),
            }
            Paragraph::new(Line::from(spans))
        };
        passage_widget
            .alignment(if passage_lines == 1 {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        // input field
        let (input_title, input_style) = if controls.input_enabled {
            ("Input", Style::default())
        } else {
            ("Input (disabled)", Style::default().fg(Color::DarkGray))
        };
        let mut input_text = session.input.clone();
        if controls.input_enabled {
            input_text.push('▏');
        }
        Paragraph::new(input_text)
            .style(input_style)
            .block(Block::default().borders(Borders::ALL).title(input_title))
            .render(chunks[3], buf);

        Paragraph::new(Span::styled(self.tester.timer_text(), dim_bold_style))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);

        if let Some(result) = session.result_message() {
            let style = if session.is_mismatched() {
                red_bold_style
            } else {
                green_bold_style
            };
            Paragraph::new(Span::styled(result, style))
                .alignment(Alignment::Center)
                .render(chunks[5], buf);
        }

        if let Some(notice) = session.notice {
            Paragraph::new(Span::styled(
                notice.to_string(),
                Style::default().fg(Color::Yellow).patch(italic_style),
            ))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);
        }

        render_history(self, chunks[7], buf);

        let legend = if controls.input_enabled {
            "(enter) submit / (tab) level / (esc)ape"
        } else if controls.restart_visible {
            "(s)tart / (r)estart / (tab) level / (h)istory view / (c)lear history / (esc)ape"
        } else {
            "(s)tart / (tab) level / (h)istory view / (c)lear history / (esc)ape"
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(chunks[8], buf);
    }
}

fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let records = app.tester.records();
    // borders and header
    let visible = area.height.saturating_sub(3) as usize;

    let table = match app.history_view {
        HistoryView::Records => {
            let first = history::first_visible(records.len(), visible);
            let rows = records
                .iter()
                .enumerate()
                .skip(first)
                .map(|(idx, r)| history::present_record(idx + 1, r))
                .collect::<Vec<Row>>();
            Table::new(rows, history::RECORD_WIDTHS)
                .header(history::record_header())
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("History ({} attempts)", records.len())),
                )
        }
        HistoryView::Summary => {
            let rows = summarize(records)
                .iter()
                .map(history::present_summary)
                .collect::<Vec<Row>>();
            Table::new(rows, history::SUMMARY_WIDTHS)
                .header(history::summary_header())
                .block(Block::default().borders(Borders::ALL).title("Best by level"))
        }
    };

    table.render(area, buf);
}
