//! Region picker overlay: "Worldwide" plus every country, filtered as you type.

use crate::app::App;
use crate::state::{PicklistEntry, Selection};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

/// Picker input state. Entries come from the dashboard state on demand so
/// a country list that lands while the picker is open shows up immediately.
#[derive(Debug, Default)]
pub struct Picker {
    pub open: bool,
    pub query: String,
    pub cursor: usize,
}

impl Picker {
    pub fn open(&mut self) {
        self.open = true;
        self.query.clear();
        self.cursor = 0;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn push(&mut self, c: char) {
        self.query.push(c);
        self.cursor = 0;
    }

    pub fn pop(&mut self) {
        self.query.pop();
        self.cursor = 0;
    }

    /// Entries matching the query: case-insensitive substring of the name,
    /// or a prefix of the code
    pub fn matches<'a>(&self, countries: &'a [PicklistEntry]) -> Vec<(&'a str, Selection)> {
        let query = self.query.trim().to_lowercase();
        let hit = |name: &str, code: &str| {
            query.is_empty()
                || name.to_lowercase().contains(&query)
                || code.to_lowercase().starts_with(&query)
        };

        let worldwide: Option<(&'a str, Selection)> =
            hit("Worldwide", "worldwide").then_some(("Worldwide", Selection::Worldwide));
        worldwide
            .into_iter()
            .chain(
                countries
                    .iter()
                    .filter(|e| hit(&e.name, &e.value))
                    .map(|e| (e.name.as_str(), Selection::Country(e.value.clone()))),
            )
            .collect()
    }

    pub fn move_cursor(&mut self, delta: i32, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as i64 + delta as i64;
        self.cursor = next.clamp(0, len as i64 - 1) as usize;
    }

    pub fn chosen(&self, countries: &[PicklistEntry]) -> Option<Selection> {
        self.matches(countries)
            .into_iter()
            .nth(self.cursor)
            .map(|(_, selection)| selection)
    }

    /// First visible row so the cursor stays on screen
    fn scroll(&self, rows: usize) -> usize {
        if rows == 0 {
            0
        } else {
            self.cursor.saturating_sub(rows - 1)
        }
    }

    /// Entry under a clicked cell, if any
    pub fn entry_at(
        &self,
        screen: Rect,
        col: u16,
        row: u16,
        countries: &[PicklistEntry],
    ) -> Option<Selection> {
        let list = list_area(screen);
        if !list.contains((col, row).into()) {
            return None;
        }
        let index = self.scroll(list.height as usize) + (row - list.y) as usize;
        self.matches(countries)
            .into_iter()
            .nth(index)
            .map(|(_, selection)| selection)
    }
}

/// Overlay rectangle, centered
pub fn area(screen: Rect) -> Rect {
    let width = 44.min(screen.width);
    let height = 20.min(screen.height);
    Rect {
        x: screen.x + (screen.width - width) / 2,
        y: screen.y + (screen.height - height) / 2,
        width,
        height,
    }
}

fn sections(screen: Rect) -> [Rect; 2] {
    let inner = Block::default().borders(Borders::ALL).inner(area(screen));
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    [parts[0], parts[1]]
}

fn list_area(screen: Rect) -> Rect {
    sections(screen)[1]
}

pub fn render(frame: &mut Frame, app: &App, screen: Rect) {
    let picker = &app.picker;
    let popup = area(screen);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Select region ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(
            " ↑↓ move  Enter select  Esc close ",
            Style::default().fg(Color::DarkGray),
        ));
    frame.render_widget(block, popup);

    let [input, list] = sections(screen);
    let prompt = Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Yellow)),
        Span::raw(picker.query.as_str()),
        Span::styled("▏", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(prompt), input);

    let matches = picker.matches(&app.state.countries);
    if matches.is_empty() {
        let empty = if app.state.countries.is_empty() {
            "Country list not loaded"
        } else {
            "No match"
        };
        frame.render_widget(
            Paragraph::new(empty).style(Style::default().fg(Color::DarkGray)),
            list,
        );
        return;
    }

    let active = &app.state.selection;
    let start = picker.scroll(list.height as usize);
    let items: Vec<ListItem> = matches
        .iter()
        .enumerate()
        .skip(start)
        .take(list.height as usize)
        .map(|(i, (name, selection))| {
            let marker = if selection == active { "● " } else { "  " };
            let style = if i == picker.cursor {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(format!("{marker}{name}")).style(style)
        })
        .collect();

    frame.render_widget(List::new(items), list);
}
