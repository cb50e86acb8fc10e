mod chart;
mod map_view;
mod panels;
pub mod picker;
mod table;

use crate::app::App;
use crate::map::Lod;
use crate::metric::Metric;
use crate::state::{FetchStatus, Slot};
use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Screen regions. Computed once per resize so input handling and drawing
/// agree on where everything is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardLayout {
    pub header: Rect,
    /// Statistic panels in `Metric::ALL` order
    pub panels: [Rect; 3],
    pub map: Rect,
    pub table: Rect,
    pub chart: Rect,
    pub status: Rect,
}

/// What lies under a terminal cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Panel(Metric),
    Map,
    Table,
    Chart,
    Elsewhere,
}

impl DashboardLayout {
    pub fn compute(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(5), // Statistic panels
                Constraint::Min(6),    // Map | table + chart
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        let panel_row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(rows[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rows[2]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(body[1]);

        Self {
            header: rows[0],
            panels: [panel_row[0], panel_row[1], panel_row[2]],
            map: body[0],
            table: right[0],
            chart: right[1],
            status: rows[3],
        }
    }

    /// Map drawing area inside its border
    pub fn map_inner(&self) -> Rect {
        self.map.inner(Margin::new(1, 1))
    }

    /// Table body: inside the border, below the header row
    pub fn table_body(&self) -> Rect {
        let inner = self.table.inner(Margin::new(1, 1));
        Rect {
            y: inner.y.saturating_add(1),
            height: inner.height.saturating_sub(1),
            ..inner
        }
    }

    pub fn zone_at(&self, col: u16, row: u16) -> Zone {
        let hit = |r: &Rect| r.contains((col, row).into());
        if let Some(i) = self.panels.iter().position(|r| hit(r)) {
            return Zone::Panel(Metric::ALL[i]);
        }
        if hit(&self.map) {
            Zone::Map
        } else if hit(&self.table) {
            Zone::Table
        } else if hit(&self.chart) {
            Zone::Chart
        } else {
            Zone::Elsewhere
        }
    }
}

/// Render the dashboard
pub fn render(frame: &mut Frame, app: &App) {
    let layout = &app.layout;

    render_header(frame, app, layout.header);
    for (metric, area) in Metric::ALL.into_iter().zip(layout.panels) {
        panels::render(frame, app, metric, area);
    }
    map_view::render(frame, app, layout.map);
    table::render(frame, app, layout.table);
    chart::render(frame, app, layout.chart);
    render_status_bar(frame, app, layout.status);

    if app.picker.open {
        picker::render(frame, app, frame.area());
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let region = app
        .state
        .country_info
        .as_ref()
        .map(|snap| snap.name().to_string())
        .unwrap_or_else(|| "Worldwide".to_string());

    let mut spans = vec![
        Span::styled(
            " Coronavirus Tracker ",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(region, Style::default().fg(Color::White)),
    ];
    if let Some(pending) = &app.state.pending {
        spans.push(Span::styled(
            format!(" → {pending}…"),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(
        "  [/] change region",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn slot_name(slot: Slot) -> &'static str {
    match slot {
        Slot::Countries => "countries",
        Slot::Snapshot => "stats",
        Slot::History => "history",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.state;
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(
            format!("{:.1}x", app.viewport.zoom),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(" (", dim),
        Span::styled(
            Lod::from_zoom(app.viewport.zoom).label(),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(") ", dim),
    ];

    if let Some((slot, msg)) = state.error() {
        spans.push(Span::styled(
            format!("{} failed: {msg} ", slot_name(slot)),
            Style::default().fg(Color::Red),
        ));
    } else if state.is_loading() {
        spans.push(Span::styled("loading… ", Style::default().fg(Color::Yellow)));
    } else if matches!(state.countries_status, FetchStatus::Idle) && state.countries.is_empty() {
        spans.push(Span::styled("no data ", dim));
    }

    if let Some(updated) = state.last_updated {
        spans.push(Span::styled("| updated ", dim));
        spans.push(Span::styled(
            updated.format("%Y-%m-%d %H:%M UTC").to_string(),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::styled(
        "| 1-3:metric R:refresh hjkl:pan +/-:zoom b/L:layers q:quit",
        dim,
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
