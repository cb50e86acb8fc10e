use crate::api::Snapshot;
use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::map::MapLayers;
use crate::stats::pretty_print_stat;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let metric = app.state.metric;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" World Map · {} ", metric.title()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &app.viewport,
        &app.markers,
        app.state.selection.country_code(),
    );

    frame.render_widget(
        MapWidget {
            layers,
            marker_color: metric.color(),
            cursor_pos: app.mouse_cell(inner),
        },
        inner,
    );

    if let Some(region) = app.popup_region() {
        render_popup(frame, app, region, inner);
    }
}

/// Braille layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    marker_color: Color,
    cursor_pos: Option<(u16, u16)>,
}

fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
    for (cx, cy, ch) in canvas.iter_cells() {
        if cx >= area.width as usize || cy >= area.height as usize {
            continue;
        }
        buf[(area.x + cx as u16, area.y + cy as u16)]
            .set_char(ch)
            .set_fg(color);
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        render_layer(&self.layers.coastlines, Color::Cyan, area, buf);
        render_layer(&self.layers.borders, Color::DarkGray, area, buf);
        render_layer(&self.layers.markers, self.marker_color, area, buf);
        render_layer(&self.layers.highlight, Color::White, area, buf);

        let label_style = Style::default().fg(Color::White);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = (area.width - lx) as usize;
            for (i, ch) in text.chars().take(max_len.min(20)).enumerate() {
                buf[(area.x + lx + i as u16, area.y + ly)]
                    .set_char(ch)
                    .set_style(label_style);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)]
                .set_char('╋')
                .set_fg(Color::Red);
        }
    }
}

fn popup_lines(region: &Snapshot) -> Vec<Line<'static>> {
    let row = |label: &'static str, value: u64, color: Color| {
        Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Gray)),
            Span::styled(pretty_print_stat(Some(value)), Style::default().fg(color)),
        ])
    };
    vec![
        Line::from(Span::styled(
            region.name().to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        row("Cases: ", region.cases, Color::Red),
        row("Recovered: ", region.recovered, Color::Green),
        row("Deaths: ", region.deaths, Color::Red),
    ]
}

/// Place a `width` x `height` box just right of a projected Braille pixel,
/// clamped inside `map`. Markers far off screen pin it to the nearest edge.
fn popup_rect(pixel: Option<(i32, i32)>, map: Rect, width: u16, height: u16) -> Rect {
    let cell = |p: i32, per_cell: i32| u16::try_from((p / per_cell).max(0)).unwrap_or(u16::MAX);
    let (col, row) = pixel
        .map(|(px, py)| (cell(px, 2).saturating_add(2), cell(py, 4)))
        .unwrap_or((0, 0));
    Rect::new(
        map.x + col.min(map.width.saturating_sub(width)),
        map.y + row.min(map.height.saturating_sub(height)),
        width,
        height,
    )
}

/// Info box next to the clicked marker, kept inside the map
fn render_popup(frame: &mut Frame, app: &App, region: &Snapshot, map: Rect) {
    let lines = popup_lines(region);
    let content_width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
    let width = (content_width + 4).min(map.width);
    let height = (lines.len() as u16 + 2).min(map.height);
    if width < 4 || height < 3 {
        return;
    }

    let pixel = region
        .coords()
        .map(|(lat, lon)| app.viewport.project(lon, lat));
    let popup = popup_rect(pixel, map, width, height);

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        ),
        popup,
    );
}
