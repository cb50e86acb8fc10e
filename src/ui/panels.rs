use crate::api::Snapshot;
use crate::app::App;
use crate::metric::Metric;
use crate::stats::{pretty_print_delta, pretty_print_stat};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

/// "+today" and "total Total" strings for one metric
fn panel_text(snapshot: Option<&Snapshot>, metric: Metric) -> (String, String) {
    let today = snapshot.and_then(|s| metric.today(s));
    let total = snapshot.map(|s| metric.total(s));
    (
        pretty_print_delta(today),
        format!("{} Total", pretty_print_stat(total)),
    )
}

/// One statistic panel. Activation is handled by the app; this only draws.
pub fn render(frame: &mut Frame, app: &App, metric: Metric, area: Rect) {
    let active = app.state.metric == metric;
    let accent = if metric.is_red() {
        Color::Red
    } else {
        Color::Green
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if active {
            BorderType::Thick
        } else {
            BorderType::Plain
        })
        .border_style(Style::default().fg(if active { accent } else { Color::DarkGray }))
        .title(Span::styled(
            format!(" {} ", metric.title()),
            Style::default().fg(Color::Gray),
        ));

    let (today, total) = panel_text(app.state.country_info.as_ref(), metric);
    let lines = vec![
        Line::from(Span::styled(
            today,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(total, Style::default().fg(Color::Gray))),
    ];

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_text() {
        let snap = Snapshot {
            cases: 1_234_567,
            today_cases: Some(4_321),
            recovered: 1_000_000,
            today_recovered: None,
            deaths: 0,
            ..Snapshot::default()
        };

        assert_eq!(
            panel_text(Some(&snap), Metric::Cases),
            ("+4,321".to_string(), "1,234,567 Total".to_string())
        );
        assert_eq!(
            panel_text(Some(&snap), Metric::Recovered),
            ("+0".to_string(), "1,000,000 Total".to_string())
        );
        assert_eq!(panel_text(Some(&snap), Metric::Deaths).1, "0 Total");
    }

    #[test]
    fn test_panel_text_after_downward_revision() {
        let snap = Snapshot {
            recovered: 500,
            today_recovered: Some(-3),
            ..Snapshot::default()
        };
        assert_eq!(
            panel_text(Some(&snap), Metric::Recovered),
            ("-3".to_string(), "500 Total".to_string())
        );
    }

    #[test]
    fn test_panel_text_before_first_fetch() {
        assert_eq!(
            panel_text(None, Metric::Cases),
            ("+0".to_string(), "0 Total".to_string())
        );
    }
}
