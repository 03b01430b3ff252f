//! Record list for the selected entity

use super::components::render_confirm_delete;
use crate::app::App;
use crate::hosts::record_label;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let kind = app.state.entity;
    let block = Block::default()
        .title(format!(" {} ({}) ", kind.label(), app.state.records.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.state.records.is_empty() {
        let hint = Style::default().fg(Color::DarkGray);
        let mut spans = vec![Span::styled("Aucun enregistrement.", hint)];
        if kind.can_create() {
            spans.push(Span::styled(" ", hint));
            spans.push(Span::styled("n", Style::default().fg(Color::Cyan)));
            spans.push(Span::styled(" pour en créer un.", hint));
        }
        let empty = Paragraph::new(Line::from(spans)).block(block);
        frame.render_widget(empty, area);
    } else {
        let items: Vec<ListItem> = app
            .state
            .records
            .iter()
            .map(|record| ListItem::new(record_label(kind, record)))
            .collect();
        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );
        // Selection drives the list offset so the highlighted row stays visible
        let mut list_state = ListState::default().with_selected(Some(app.state.selected_index));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    if let Some(id) = &app.state.confirm_delete {
        let label = app
            .state
            .records
            .iter()
            .find(|record| &record.id == id)
            .map(|record| record_label(kind, record))
            .unwrap_or_else(|| id.clone());
        render_confirm_delete(frame, &label);
    }
}
