//! Trend chart data: cumulative timeline to daily new values.

use chrono::NaiveDate;

use crate::api::{ordered_series, Timeline};
use crate::metric::Metric;

/// One day of the trend chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    /// New count since the previous day. Negative when upstream revised
    /// the cumulative total downward.
    pub value: i64,
}

/// Daily new values for `metric`: the difference between consecutive
/// cumulative days. The first day has no predecessor and is dropped.
pub fn build_chart_data(timeline: &Timeline, metric: Metric) -> Vec<ChartPoint> {
    let series = ordered_series(metric.series(timeline));

    let mut points = Vec::with_capacity(series.len().saturating_sub(1));
    let mut last: Option<u64> = None;
    for (date, cumulative) in series {
        if let Some(prev) = last {
            points.push(ChartPoint {
                date,
                value: cumulative as i64 - prev as i64,
            });
        }
        last = Some(cumulative);
    }
    points
}

/// (x, y) pairs for the chart widget, x being the day index
pub fn to_plot(points: &[ChartPoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value as f64))
        .collect()
}

/// Y-axis bounds: always include zero, pad the top a little
pub fn y_bounds(points: &[ChartPoint]) -> [f64; 2] {
    let min = points.iter().map(|p| p.value).min().unwrap_or(0).min(0) as f64;
    let max = points.iter().map(|p| p.value).max().unwrap_or(0).max(0) as f64;
    let top = if max > 0.0 { max * 1.05 } else { 1.0 };
    [min, top]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(entries: &[(&str, u64)]) -> Timeline {
        Timeline {
            cases: entries.iter().map(|(d, v)| (d.to_string(), *v)).collect(),
            ..Timeline::default()
        }
    }

    #[test]
    fn test_daily_differences() {
        let t = timeline(&[("3/1/23", 100), ("3/2/23", 130), ("3/3/23", 135)]);
        let points = build_chart_data(&t, Metric::Cases);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 30);
        assert_eq!(points[1].value, 5);
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2023, 3, 3).unwrap());
    }

    #[test]
    fn test_differences_follow_calendar_order() {
        // Lexicographic order would put 3/10 before 3/9
        let t = timeline(&[("3/10/23", 50), ("3/9/23", 20), ("3/8/23", 10)]);
        let values: Vec<i64> = build_chart_data(&t, Metric::Cases)
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![10, 30]);
    }

    #[test]
    fn test_downward_revision_is_negative() {
        let t = timeline(&[("1/1/22", 500), ("1/2/22", 480)]);
        let points = build_chart_data(&t, Metric::Cases);
        assert_eq!(points[0].value, -20);
        assert_eq!(y_bounds(&points)[0], -20.0);
    }

    #[test]
    fn test_other_metric_series() {
        let t = Timeline {
            deaths: [("1/1/22".to_string(), 1), ("1/2/22".to_string(), 4)]
                .into_iter()
                .collect(),
            ..Timeline::default()
        };
        assert!(build_chart_data(&t, Metric::Cases).is_empty());
        assert_eq!(build_chart_data(&t, Metric::Deaths)[0].value, 3);
    }

    #[test]
    fn test_bounds_empty() {
        assert_eq!(y_bounds(&[]), [0.0, 1.0]);
        assert!(to_plot(&[]).is_empty());
    }
}
