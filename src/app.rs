//! Terminal-side application state: the dashboard state plus everything
//! that only matters for drawing and input (viewport, markers, picker,
//! popup, drag tracking).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::api::Snapshot;
use crate::map::{MapRenderer, Marker, SpatialGrid, Viewport};
use crate::metric::Metric;
use crate::state::{self, Command, DashboardState, Message, Selection};
use crate::ui::picker::Picker;
use crate::ui::{DashboardLayout, Zone};

/// Marker index cell size in degrees
const MARKER_GRID_DEGREES: f64 = 5.0;
/// How far from a marker center a click still counts, in Braille pixels
const CLICK_TOLERANCE_PX: f64 = 6.0;
const KM_PER_DEGREE: f64 = 111.0;

pub struct App {
    pub state: DashboardState,
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub markers: Vec<Marker>,
    marker_index: SpatialGrid<usize>,
    /// Last `MapFocus::revision` applied to the viewport
    applied_focus: u64,
    pub layout: DashboardLayout,
    /// First table row on screen
    pub table_offset: usize,
    pub picker: Picker,
    /// Code of the region whose info popup is open
    pub popup: Option<String>,
    /// Last mouse position for drag tracking
    last_mouse: Option<(u16, u16)>,
    dragged: bool,
    /// Current mouse position for the cursor marker
    mouse_pos: Option<(u16, u16)>,
    pub should_quit: bool,
}

impl App {
    pub fn new(state: DashboardState, map_renderer: MapRenderer, area: Rect) -> Self {
        let focus = state.map_focus;
        let mut app = Self {
            viewport: Viewport::new(focus.lon, focus.lat, Viewport::zoom_for_level(focus.level), 0, 0),
            applied_focus: focus.revision,
            state,
            map_renderer,
            markers: Vec::new(),
            marker_index: SpatialGrid::new(MARKER_GRID_DEGREES),
            layout: DashboardLayout::default(),
            table_offset: 0,
            picker: Picker::default(),
            popup: None,
            last_mouse: None,
            dragged: false,
            mouse_pos: None,
            should_quit: false,
        };
        app.resize(area);
        app
    }

    /// Recompute the layout and the map canvas size
    pub fn resize(&mut self, area: Rect) {
        self.layout = DashboardLayout::compute(area);
        let map = self.layout.map_inner();
        // Braille gives 2x4 resolution per character
        self.viewport.width = map.width as usize * 2;
        self.viewport.height = map.height as usize * 4;
        self.clamp_table_offset();
    }

    /// Apply a message to the dashboard state and keep the view in step
    pub fn handle_message(&mut self, msg: Message) -> Vec<Command> {
        let markers_stale = matches!(msg, Message::CountriesLoaded { .. } | Message::SelectMetric(_));
        let commands = state::update(&mut self.state, msg);

        if markers_stale {
            self.rebuild_markers();
            self.clamp_table_offset();
        }
        self.sync_focus();
        commands
    }

    fn rebuild_markers(&mut self) {
        self.markers = Marker::from_regions(&self.state.map_countries, self.state.metric);
        self.marker_index.clear();
        for (i, marker) in self.markers.iter().enumerate() {
            self.marker_index.insert(marker.lon, marker.lat, i);
        }
        if let Some(code) = &self.popup {
            if !self.markers.iter().any(|m| &m.code == code) {
                self.popup = None;
            }
        }
    }

    /// Move the map when the coordinator asked for a new focus; the user
    /// keeps control of panning and zooming in between.
    fn sync_focus(&mut self) {
        let focus = self.state.map_focus;
        if focus.revision != self.applied_focus {
            self.viewport.focus(focus.lat, focus.lon, focus.level);
            self.applied_focus = focus.revision;
        }
    }

    fn select(&mut self, selection: Selection) -> Vec<Command> {
        self.picker.close();
        self.popup = None;
        self.handle_message(Message::SelectRegion(selection))
    }

    fn select_metric(&mut self, metric: Metric) -> Vec<Command> {
        self.handle_message(Message::SelectMetric(metric))
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return Vec::new();
        }
        if self.picker.open {
            return self.handle_picker_key(key.code);
        }
        if self.popup.is_some() && key.code == KeyCode::Esc {
            self.popup = None;
            return Vec::new();
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),

            // Metric panels
            KeyCode::Char('1') | KeyCode::Char('c') => return self.select_metric(Metric::Cases),
            KeyCode::Char('2') | KeyCode::Char('r') => return self.select_metric(Metric::Recovered),
            KeyCode::Char('3') | KeyCode::Char('d') => return self.select_metric(Metric::Deaths),

            KeyCode::Char('R') | KeyCode::F(5) => return self.handle_message(Message::Refresh),
            KeyCode::Char('/') | KeyCode::Enter => self.picker.open(),
            KeyCode::Char('w') => return self.select(Selection::Worldwide),

            // Pan with hjkl or arrow keys
            KeyCode::Left | KeyCode::Char('h') => self.viewport.pan(-10, 0),
            KeyCode::Right | KeyCode::Char('l') => self.viewport.pan(10, 0),
            KeyCode::Up | KeyCode::Char('k') => self.viewport.pan(0, -8),
            KeyCode::Down | KeyCode::Char('j') => self.viewport.pan(0, 8),

            // Zoom
            KeyCode::Char('+') | KeyCode::Char('=') => self.viewport.zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') => self.viewport.zoom_out(),
            KeyCode::Char('0') => {
                let focus = self.state.map_focus;
                self.viewport.focus(focus.lat, focus.lon, focus.level);
            }

            // Layer toggles
            KeyCode::Char('b') | KeyCode::Char('B') => self.map_renderer.toggle_borders(),
            KeyCode::Char('L') => self.map_renderer.toggle_labels(),

            // Table
            KeyCode::PageDown | KeyCode::Char('J') => self.scroll_table(self.table_page() as i32),
            KeyCode::PageUp | KeyCode::Char('K') => self.scroll_table(-(self.table_page() as i32)),
            KeyCode::Home => self.table_offset = 0,

            _ => {}
        }
        Vec::new()
    }

    fn handle_picker_key(&mut self, code: KeyCode) -> Vec<Command> {
        let len = self.picker.matches(&self.state.countries).len();
        match code {
            KeyCode::Esc => self.picker.close(),
            KeyCode::Enter => {
                if let Some(selection) = self.picker.chosen(&self.state.countries) {
                    return self.select(selection);
                }
            }
            KeyCode::Up => self.picker.move_cursor(-1, len),
            KeyCode::Down => self.picker.move_cursor(1, len),
            KeyCode::PageUp => self.picker.move_cursor(-10, len),
            KeyCode::PageDown => self.picker.move_cursor(10, len),
            KeyCode::Backspace => self.picker.pop(),
            KeyCode::Char(c) => self.picker.push(c),
            _ => {}
        }
        Vec::new()
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, screen: Rect) -> Vec<Command> {
        let (col, row) = (mouse.column, mouse.row);
        self.mouse_pos = Some((col, row));

        if self.picker.open {
            if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                match self.picker.entry_at(screen, col, row, &self.state.countries) {
                    Some(selection) => return self.select(selection),
                    None => self.picker.close(),
                }
            }
            return Vec::new();
        }

        let zone = self.layout.zone_at(col, row);
        match mouse.kind {
            MouseEventKind::ScrollUp if zone == Zone::Map => {
                let (px, py) = self.map_pixel(col, row);
                self.viewport.zoom_at(px, py, true);
            }
            MouseEventKind::ScrollDown if zone == Zone::Map => {
                let (px, py) = self.map_pixel(col, row);
                self.viewport.zoom_at(px, py, false);
            }
            MouseEventKind::ScrollUp if zone == Zone::Table => self.scroll_table(-3),
            MouseEventKind::ScrollDown if zone == Zone::Table => self.scroll_table(3),
            // Horizontal scroll for panning (trackpad two-finger swipe)
            MouseEventKind::ScrollLeft => self.viewport.pan(-15, 0),
            MouseEventKind::ScrollRight => self.viewport.pan(15, 0),

            MouseEventKind::Down(MouseButton::Left) => match zone {
                Zone::Panel(metric) => return self.select_metric(metric),
                Zone::Table => {
                    if let Some(code) = self.table_code_at(row) {
                        return self.select(Selection::Country(code));
                    }
                }
                Zone::Map => {
                    self.last_mouse = Some((col, row));
                    self.dragged = false;
                }
                Zone::Chart | Zone::Elsewhere => {}
            },
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((last_col, last_row)) = self.last_mouse {
                    let dx = last_col as i32 - col as i32;
                    let dy = last_row as i32 - row as i32;
                    if dx != 0 || dy != 0 {
                        self.viewport.pan(dx * 2, dy * 4);
                        self.dragged = true;
                    }
                    self.last_mouse = Some((col, row));
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                // A press and release without movement is a click
                if self.last_mouse.take().is_some() && !self.dragged && zone == Zone::Map {
                    self.popup = self.marker_at(col, row);
                }
                self.dragged = false;
            }
            _ => {}
        }
        Vec::new()
    }

    /// Terminal cell to Braille pixel inside the map
    fn map_pixel(&self, col: u16, row: u16) -> (i32, i32) {
        let map = self.layout.map_inner();
        (
            (col as i32 - map.x as i32) * 2 + 1,
            (row as i32 - map.y as i32) * 4 + 2,
        )
    }

    /// Code of the marker nearest to a cell, within click distance
    pub fn marker_at(&self, col: u16, row: u16) -> Option<String> {
        let (px, py) = self.map_pixel(col, row);
        let (lon, lat) = self.viewport.unproject(px, py);
        let radius_km = self.viewport.degrees_per_pixel() * CLICK_TOLERANCE_PX * KM_PER_DEGREE;
        self.marker_index
            .nearest(lon, lat, radius_km)
            .and_then(|&i| self.markers.get(i))
            .map(|m| m.code.clone())
    }

    /// Mouse position relative to `area`, if inside it
    pub fn mouse_cell(&self, area: Rect) -> Option<(u16, u16)> {
        let (col, row) = self.mouse_pos?;
        area.contains((col, row).into())
            .then(|| (col - area.x, row - area.y))
    }

    pub fn popup_region(&self) -> Option<&Snapshot> {
        let code = self.popup.as_deref()?;
        self.state
            .map_countries
            .iter()
            .find(|r| r.code() == Some(code))
    }

    fn table_page(&self) -> usize {
        (self.layout.table_body().height as usize).max(1)
    }

    fn clamp_table_offset(&mut self) {
        let max = self
            .state
            .table_data
            .len()
            .saturating_sub(self.layout.table_body().height as usize);
        self.table_offset = self.table_offset.min(max);
    }

    pub fn scroll_table(&mut self, delta: i32) {
        self.table_offset = (self.table_offset as i64 + delta as i64).max(0) as usize;
        self.clamp_table_offset();
    }

    fn table_code_at(&self, row: u16) -> Option<String> {
        let body = self.layout.table_body();
        if row < body.y || row >= body.bottom() {
            return None;
        }
        let index = self.table_offset + (row - body.y) as usize;
        self.state
            .table_data
            .get(index)
            .and_then(|r| r.code())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CountryInfo;
    use crate::state::{Origin, RequestToken};
    use crossterm::event::KeyEventState;

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        width: 120,
        height: 40,
    };

    fn region(name: &str, code: &str, cases: u64, lat: f64, long: f64) -> Snapshot {
        Snapshot {
            country: Some(name.to_string()),
            country_info: Some(CountryInfo {
                iso2: Some(code.to_string()),
                lat,
                long,
                ..CountryInfo::default()
            }),
            cases,
            recovered: cases / 2,
            deaths: cases / 50,
            ..Snapshot::default()
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn countries_token(commands: &[Command]) -> RequestToken {
        commands
            .iter()
            .find_map(|c| match c {
                Command::FetchCountries { token } => Some(*token),
                _ => None,
            })
            .unwrap()
    }

    fn snapshot_token(commands: &[Command]) -> RequestToken {
        commands
            .iter()
            .find_map(|c| match c {
                Command::FetchSnapshot { token, .. } => Some(*token),
                _ => None,
            })
            .unwrap()
    }

    /// App after mount with three countries loaded
    fn loaded_app() -> App {
        let mut app = App::new(DashboardState::new(Metric::Cases, 30), MapRenderer::new(), SCREEN);
        let commands = app.handle_message(Message::Mounted);
        let token = countries_token(&commands);
        app.handle_message(Message::CountriesLoaded {
            token,
            result: Ok(vec![
                region("France", "FR", 5_000, 46.0, 2.0),
                region("Brazil", "BR", 20_000, -10.0, -55.0),
                region("Japan", "JP", 1_000, 36.0, 138.0),
            ]),
        });
        app
    }

    #[test]
    fn test_viewport_sized_from_layout() {
        let app = App::new(DashboardState::default(), MapRenderer::new(), SCREEN);
        let map = app.layout.map_inner();
        assert_eq!(app.viewport.width, map.width as usize * 2);
        assert_eq!(app.viewport.height, map.height as usize * 4);
        assert_eq!(app.viewport.zoom, Viewport::zoom_for_level(3));
    }

    #[test]
    fn test_country_list_builds_markers() {
        let app = loaded_app();
        assert_eq!(app.markers.len(), 3);
        assert_eq!(app.state.table_data[0].name(), "Brazil");
        assert_eq!(app.state.countries.len(), 3);
    }

    #[test]
    fn test_metric_keys() {
        let mut app = loaded_app();
        let commands = app.handle_key(key(KeyCode::Char('2')));
        assert_eq!(app.state.metric, Metric::Recovered);
        assert!(matches!(
            commands.as_slice(),
            [Command::FetchHistory {
                metric: Metric::Recovered,
                ..
            }]
        ));
        assert_eq!(app.markers[0].value, 2_500);

        assert!(app.handle_key(key(KeyCode::Char('r'))).is_empty());
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.state.metric, Metric::Deaths);
    }

    #[test]
    fn test_panel_click_selects_metric() {
        let mut app = loaded_app();
        let panel = app.layout.panels[2];
        let commands = app.handle_mouse(
            click(MouseEventKind::Down(MouseButton::Left), panel.x + 2, panel.y + 2),
            SCREEN,
        );
        assert_eq!(app.state.metric, Metric::Deaths);
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_table_click_selects_region() {
        let mut app = loaded_app();
        let body = app.layout.table_body();
        let commands = app.handle_mouse(
            click(MouseEventKind::Down(MouseButton::Left), body.x + 3, body.y + 1),
            SCREEN,
        );
        match commands.as_slice() {
            [Command::FetchSnapshot {
                selection, origin, ..
            }] => {
                assert_eq!(selection, &Selection::Country("FR".to_string()));
                assert_eq!(*origin, Origin::Selection);
            }
            other => panic!("unexpected commands {other:?}"),
        }
        assert_eq!(app.state.pending, Some(Selection::Country("FR".to_string())));

        // Below the last row
        let commands = app.handle_mouse(
            click(MouseEventKind::Down(MouseButton::Left), body.x + 3, body.y + 5),
            SCREEN,
        );
        assert!(commands.is_empty());
    }

    #[test]
    fn test_selection_moves_map_once() {
        let mut app = loaded_app();
        let commands = app.handle_key(key(KeyCode::Char('/')));
        assert!(commands.is_empty());
        assert!(app.picker.open);

        for c in "japan".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let commands = app.handle_key(key(KeyCode::Enter));
        assert!(!app.picker.open);
        let token = snapshot_token(&commands);

        app.handle_message(Message::SnapshotLoaded {
            token,
            selection: Selection::Country("JP".to_string()),
            origin: Origin::Selection,
            result: Ok(region("Japan", "JP", 1_000, 36.0, 138.0)),
        });
        assert!((app.viewport.center_lat - 36.0).abs() < 1e-6);
        assert!((app.viewport.center_lon - 138.0).abs() < 1e-6);
        assert_eq!(app.viewport.zoom, Viewport::zoom_for_level(4));

        // User pans away; unrelated messages leave the view alone
        app.handle_key(key(KeyCode::Char('h')));
        let moved = app.viewport.center_lon;
        app.handle_key(key(KeyCode::Char('3')));
        assert_eq!(app.viewport.center_lon, moved);
    }

    #[test]
    fn test_picker_escape_and_quit() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.picker.query, "q");

        app.handle_key(key(KeyCode::Esc));
        assert!(!app.picker.open);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_marker_click_opens_popup() {
        let mut app = loaded_app();
        let map = app.layout.map_inner();
        let (px, py) = app.viewport.project(-55.0, -10.0);
        let (col, row) = (map.x + (px / 2) as u16, map.y + (py / 4) as u16);

        app.handle_mouse(click(MouseEventKind::Down(MouseButton::Left), col, row), SCREEN);
        app.handle_mouse(click(MouseEventKind::Up(MouseButton::Left), col, row), SCREEN);
        assert_eq!(app.popup.as_deref(), Some("BR"));
        assert_eq!(app.popup_region().map(|r| r.name()), Some("Brazil"));

        app.handle_key(key(KeyCode::Esc));
        assert!(app.popup.is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_drag_pans_without_popup() {
        let mut app = loaded_app();
        let map = app.layout.map_inner();
        let (col, row) = (map.x + 10, map.y + 5);
        let before = app.viewport.center_lon;

        app.handle_mouse(click(MouseEventKind::Down(MouseButton::Left), col, row), SCREEN);
        app.handle_mouse(click(MouseEventKind::Drag(MouseButton::Left), col + 5, row), SCREEN);
        app.handle_mouse(click(MouseEventKind::Up(MouseButton::Left), col + 5, row), SCREEN);

        assert!(app.viewport.center_lon < before);
        assert!(app.popup.is_none());
    }

    #[test]
    fn test_table_scroll_clamps() {
        let mut app = loaded_app();
        app.scroll_table(50);
        assert_eq!(app.table_offset, 0);

        let token = countries_token(&app.handle_message(Message::Refresh));
        let many: Vec<Snapshot> = (0..200)
            .map(|i| region(&format!("C{i}"), &format!("{i:02}"), i, 0.0, 0.0))
            .collect();
        app.handle_message(Message::CountriesLoaded {
            token,
            result: Ok(many),
        });
        app.scroll_table(1_000);
        let visible = app.layout.table_body().height as usize;
        assert_eq!(app.table_offset, 200 - visible);
        app.scroll_table(-1_000);
        assert_eq!(app.table_offset, 0);
    }

    #[test]
    fn test_worldwide_key_requests_aggregate() {
        let mut app = loaded_app();
        let commands = app.handle_key(key(KeyCode::Char('w')));
        assert!(matches!(
            commands.as_slice(),
            [Command::FetchSnapshot {
                selection: Selection::Worldwide,
                ..
            }]
        ));
    }
}
