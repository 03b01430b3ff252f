//! Multi-step wizard screen

mod field_renderer;

use crate::app::App;
use crate::state::WizardView;
use field_renderer::{draw_field, field_height, summary_lines, FieldView};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn draw_wizard(frame: &mut Frame, area: Rect, app: &App) {
    let Some(view) = &app.state.wizard else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Title and progress
            Constraint::Min(0),    // Fields
            Constraint::Length(3), // Message
        ])
        .split(area);

    draw_header(frame, chunks[0], view);
    draw_fields(frame, chunks[1], view);
    draw_message(frame, chunks[2], view);
}

fn draw_header(frame: &mut Frame, area: Rect, view: &WizardView) {
    let controller = &view.controller;
    let schema = controller.store().schema();
    let verb = if controller.is_edit() {
        "Modifier"
    } else {
        "Nouveau"
    };

    let mut progress = Vec::new();
    for (index, step) in schema.steps().iter().enumerate() {
        let number = index + 1;
        let style = if number == controller.step() {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if number < controller.step() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if index > 0 {
            progress.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
        }
        progress.push(Span::styled(format!("{number}. {}", step.title), style));
    }

    let lines = vec![
        Line::from(Span::styled(
            format!(
                "Étape {}/{}",
                controller.step(),
                controller.step_count()
            ),
            Style::default().fg(Color::Gray),
        )),
        Line::from(progress),
    ];
    let block = Block::default()
        .title(format!(" {verb} · {} ", schema.title))
        .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        area,
    );
}

fn draw_fields(frame: &mut Frame, area: Rect, view: &WizardView) {
    let store = view.controller.store();
    let draft = store.snapshot();
    let fields = view.visible_fields();

    if fields.is_empty() {
        let block = Block::default()
            .title(" Récapitulatif ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let summary = Paragraph::new(summary_lines(store.schema().fields(), draft))
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(summary, area);
        return;
    }

    let required: Vec<&str> = store
        .schema()
        .step(view.controller.step())
        .map(|step| step.required_fields.iter().map(|r| r.field).collect())
        .unwrap_or_default();

    let heights: Vec<u16> = fields.iter().map(|spec| field_height(spec, draft)).collect();
    let first = first_visible(&heights, view.active_field, area.height);

    let mut y = area.y;
    for (index, spec) in fields.iter().enumerate().skip(first) {
        let height = heights[index];
        if y + height > area.y + area.height {
            break;
        }
        let active = index == view.active_field;
        let field = FieldView {
            spec,
            draft,
            context: store.context(),
            required: required.contains(&spec.name),
            active,
            entry_cursor: view.entry_cursor,
            input: if active { view.input.as_str() } else { "" },
        };
        draw_field(
            frame,
            Rect {
                x: area.x,
                y,
                width: area.width,
                height,
            },
            &field,
        );
        y += height;
    }
}

/// First field to draw so the active one fits on screen
fn first_visible(heights: &[u16], active: usize, available: u16) -> usize {
    let mut first = 0;
    while first < active {
        let used: u16 = heights[first..=active].iter().sum();
        if used <= available {
            break;
        }
        first += 1;
    }
    first
}

fn draw_message(frame: &mut Frame, area: Rect, view: &WizardView) {
    let line = if view.is_submitting() {
        Line::from(Span::styled(
            "Enregistrement en cours…",
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(message) = view.message() {
        Line::from(Span::styled(message, Style::default().fg(Color::Red)))
    } else {
        Line::from("")
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(line).block(block), area);
}
