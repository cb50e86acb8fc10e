use crate::app::App;
use crate::history::{to_plot, y_bounds, ChartPoint};
use crate::state::FetchStatus;
use crate::stats::compact_stat;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

/// First, middle and last dates
fn x_labels(points: &[ChartPoint]) -> Vec<String> {
    match points {
        [] => Vec::new(),
        [only] => vec![only.date.format("%m/%d").to_string()],
        _ => [0, points.len() / 2, points.len() - 1]
            .into_iter()
            .map(|i| points[i].date.format("%m/%d").to_string())
            .collect(),
    }
}

fn y_labels(bounds: [f64; 2]) -> Vec<String> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .into_iter()
        .map(compact_stat)
        .collect()
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.state;
    let metric = state.history_metric;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" Worldwide new {} ", metric.key()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    if state.history.is_empty() {
        let text = match &state.history_status {
            FetchStatus::Loading => "Loading…".to_string(),
            FetchStatus::Failed(msg) => format!("History unavailable ({msg})"),
            FetchStatus::Idle => "No data".to_string(),
        };
        let placeholder = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let data = to_plot(&state.history);
    let bounds = y_bounds(&state.history);
    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(metric.color()))
        .data(&data);

    let dim = Style::default().fg(Color::DarkGray);
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(dim)
                .bounds([0.0, (data.len().saturating_sub(1)) as f64])
                .labels(x_labels(&state.history)),
        )
        .y_axis(
            Axis::default()
                .style(dim)
                .bounds(bounds)
                .labels(y_labels(bounds)),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(day: u32, value: i64) -> ChartPoint {
        ChartPoint {
            date: NaiveDate::from_ymd_opt(2021, 3, day).unwrap(),
            value,
        }
    }

    #[test]
    fn test_x_labels() {
        assert!(x_labels(&[]).is_empty());
        assert_eq!(x_labels(&[point(1, 5)]), vec!["03/01"]);

        let points: Vec<_> = (1..=9).map(|d| point(d, 10)).collect();
        assert_eq!(x_labels(&points), vec!["03/01", "03/05", "03/09"]);
    }

    #[test]
    fn test_y_labels() {
        assert_eq!(y_labels([0.0, 2_000_000.0]), vec!["0", "1.0M", "2.0M"]);
    }
}
