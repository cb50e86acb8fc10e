use crate::app::App;
use crate::stats::pretty_print_stat;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Row, Table},
    Frame,
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.state;
    let visible = app.layout.table_body().height as usize;

    let selected = state.selection.country_code();

    let header = Row::new(vec!["#", "Country", "Cases"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = state
        .table_data
        .iter()
        .enumerate()
        .skip(app.table_offset)
        .take(visible)
        .map(|(i, region)| {
            let style = if selected.is_some() && region.code() == selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if i % 2 == 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            };
            Row::new(vec![
                format!("{}", i + 1),
                region.name().to_string(),
                pretty_print_stat(Some(region.cases)),
            ])
            .style(style)
        })
        .collect();

    let position = if state.table_data.is_empty() {
        String::new()
    } else {
        format!(
            " {}-{}/{} ",
            app.table_offset + 1,
            (app.table_offset + visible).min(state.table_data.len()),
            state.table_data.len()
        )
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(13),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " Live Cases By Country ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .title_bottom(Span::styled(position, Style::default().fg(Color::DarkGray))),
    );

    frame.render_widget(table, area);
}
