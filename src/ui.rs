//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is three rows: the configuration form, the scrollable message
//!   list and a one-line status bar.
//! * The form is exactly one line per [`Field`] plus borders; adding a field
//!   needs no layout change.
//! * Colours and styles are defined inline.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::api::MessageRecord;
use crate::app::{App, Focus};
use crate::form::Field;

const LABEL_WIDTH: usize = 16;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [form_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(Field::ALL.len() as u16 + 2),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_form(app, frame, form_area);
    draw_messages(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

fn draw_form(app: &App, frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = Field::ALL
        .iter()
        .map(|&field| {
            let focused = app.focus == Focus::Field(field);
            let value_style = match (focused, app.form.is_editable(field)) {
                (true, _) => Style::default().fg(Color::Black).bg(Color::Cyan),
                (false, true) => Style::default().fg(Color::White),
                (false, false) => Style::default().fg(Color::DarkGray),
            };
            let mut value = app.form.display(field);
            if focused && matches!(field, Field::Deserializer | Field::RefreshRate) {
                value = format!("◂ {value} ▸");
            }
            Line::from(vec![
                Span::styled(
                    format!("{:>width$}: ", field.label(), width = LABEL_WIDTH),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(value, value_style),
            ])
        })
        .collect();

    let title = if app.form.enabled { " Consumer " } else { " Consumer (running) " };
    let form = Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(form, area);
}

fn message_item(record: &MessageRecord) -> ListItem<'static> {
    let time = record
        .written_at()
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "no time".into());
    let partition = record
        .partition
        .map_or_else(|| "-".to_string(), |p| p.to_string());

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{time:<19}"), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            format!("p{partition}@{}", record.offset),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            record.key.clone().unwrap_or_else(|| "(no key)".into()),
            Style::default().fg(Color::Green),
        ),
    ])];

    let headers = record.headers_text();
    lines.extend(
        headers
            .lines()
            .map(|h| Line::styled(format!("  {h}"), Style::default().fg(Color::Magenta))),
    );
    lines.extend(
        record
            .message_text()
            .lines()
            .map(|l| Line::styled(format!("  {l}"), Style::default().fg(Color::White))),
    );

    ListItem::new(lines)
}

/// Render the scrollable message list, newest first.
fn draw_messages(app: &mut App, frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = app.messages.iter().map(message_item).collect();

    let title = match &app.active_topic {
        Some(topic) => format!(" Messages - {topic} ({}) ", app.total),
        None => " Messages ".to_string(),
    };
    let border_style = if app.focus == Focus::Messages {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let mut block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    if let Some(link) = &app.permalink {
        block = block.title_bottom(format!(" {link} "));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(app.status.clone(), Style::default().fg(Color::Yellow)),
    ];
    if let Some(updated) = app.updated {
        spans.push(Span::styled(
            format!("  updated {}", updated.format("%H:%M:%S")),
            Style::default().fg(Color::Green),
        ));
    }
    if let Some(id) = &app.session_id {
        spans.push(Span::styled(format!("  [{id}]"), Style::default().fg(Color::Cyan)));
    }
    spans.push(Span::raw(
        "  Enter: start/refresh  ^T: truncate  ^D: dispose  ^L: topics  Tab: focus  Esc: quit",
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
