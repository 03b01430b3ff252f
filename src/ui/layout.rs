//! Layout components (sidebar, status bar)

use super::components::{render_sidebar_button, BUTTON_HEIGHT};
use crate::app::App;
use crate::platform::{
    DESCRIBE_SHORTCUT, NEXT_STEP_SHORTCUT, PREV_STEP_SHORTCUT, SAVE_SHORTCUT,
};
use crate::state::{EntityKind, View};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Split the screen into sidebar and main content, keeping the last row for
/// the status bar
pub fn create_layout(area: Rect) -> (Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(24), // Sidebar
            Constraint::Min(0),     // Main content
        ])
        .split(rows[0]);

    (columns[0], columns[1])
}

/// Draw one button per entity
pub fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let mut constraints = vec![Constraint::Length(1)];
    constraints.extend(EntityKind::ALL.iter().map(|_| Constraint::Length(BUTTON_HEIGHT)));
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (idx, kind) in EntityKind::ALL.iter().enumerate() {
        let key = char::from(b'1' + idx as u8);
        render_sidebar_button(
            frame,
            chunks[idx + 1],
            key,
            kind.label(),
            *kind == app.state.entity,
        );
    }
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let status_area = Rect {
        x: 0,
        y: area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    let mut spans = vec![if app.state.api_reachable {
        Span::styled(" ● ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" ○ ", Style::default().fg(Color::Red))
    }];

    spans.push(Span::styled(
        view_hints(app.state.current_view),
        Style::default().fg(Color::Gray),
    ));

    if let Some(msg) = &app.state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg, Style::default().fg(Color::Green)));
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, status_area);
}

/// Keyboard hints for the current view
fn view_hints(view: View) -> String {
    match view {
        View::Records => [
            "Tab/1-6:entité",
            "j/k:nav",
            "n:nouveau",
            "Enter:modifier",
            "d:supprimer",
            "r:recharger",
            "q:quitter",
        ]
        .join("  "),
        View::Wizard => [
            "Tab:champ".to_string(),
            "←→:choix".to_string(),
            format!("{NEXT_STEP_SHORTCUT}/{PREV_STEP_SHORTCUT}:étape"),
            "Del:retirer".to_string(),
            format!("{DESCRIBE_SHORTCUT}:décrire"),
            format!("{SAVE_SHORTCUT}:enregistrer"),
            "Esc:fermer".to_string(),
        ]
        .join("  "),
    }
}
