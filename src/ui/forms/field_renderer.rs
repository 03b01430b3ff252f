//! Field rendering utilities for wizards

use crate::state::{AttachmentEntry, Draft, FieldKind, FieldSpec, FieldValue, FormContext};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use serde_json::Value;

const CURSOR: &str = "▌";

/// Everything needed to draw one field
pub struct FieldView<'a> {
    pub spec: &'a FieldSpec,
    pub draft: &'a Draft,
    pub context: &'a FormContext,
    pub required: bool,
    pub active: bool,
    pub entry_cursor: usize,
    /// Pending path or list entry of the active field
    pub input: &'a str,
}

/// Rows the field needs, borders included
pub fn field_height(spec: &FieldSpec, draft: &Draft) -> u16 {
    let entries = match spec.kind {
        FieldKind::Multiline => return 5,
        FieldKind::List { .. } => draft
            .scalar(spec.name)
            .and_then(FieldValue::as_list)
            .map_or(0, <[Value]>::len),
        FieldKind::SingleFile | FieldKind::MultiFile { .. } => {
            draft.slot(spec.name).map_or(0, |slot| slot.len())
        }
        _ => return 3,
    };
    // entries + input line + borders, capped
    (entries as u16 + 3).clamp(4, 9)
}

pub fn draw_field(frame: &mut Frame, area: Rect, field: &FieldView) {
    let accent = if field.active {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let marker = if field.required { " *" } else { "" };
    let block = Block::default()
        .title(format!(" {}{marker} ", field.spec.label))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent));

    let lines = match &field.spec.kind {
        FieldKind::Select(_) | FieldKind::Relation => choice_lines(field),
        FieldKind::List { keys, .. } => list_lines(field, keys),
        FieldKind::SingleFile | FieldKind::MultiFile { .. } => attachment_lines(field),
        _ => text_lines(field),
    };

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn text_lines<'a>(field: &FieldView<'a>) -> Vec<Line<'a>> {
    let value = field.draft.text(field.spec.name);
    if value.is_empty() && !field.active {
        return vec![Line::from(Span::styled(
            "(vide)",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let style = if field.active {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut lines: Vec<Line> = value
        .split('\n')
        .map(|l| Line::from(Span::styled(l.to_string(), style)))
        .collect();
    if field.active {
        if let Some(last) = lines.last_mut() {
            last.spans
                .push(Span::styled(CURSOR, Style::default().fg(Color::Cyan)));
        }
    }
    lines
}

fn choice_lines<'a>(field: &FieldView<'a>) -> Vec<Line<'a>> {
    let value = field.draft.text(field.spec.name);
    let mut shown = if value.is_empty() {
        "(aucun)".to_string()
    } else {
        value.to_string()
    };
    if matches!(field.spec.kind, FieldKind::Relation) {
        if let Some(parcel) = field.context.parcel(value) {
            shown = format!("{shown} · {}, {}", parcel.ville, parcel.adresse);
        }
    }
    let arrows = Style::default().fg(if field.active {
        Color::Cyan
    } else {
        Color::DarkGray
    });
    vec![Line::from(vec![
        Span::styled("◀ ", arrows),
        Span::raw(shown),
        Span::styled(" ▶", arrows),
    ])]
}

fn entry_style(field: &FieldView, index: usize) -> Style {
    if field.active && index == field.entry_cursor {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn input_line<'a>(field: &FieldView<'a>, placeholder: &'a str) -> Line<'a> {
    if !field.active {
        return Line::from("");
    }
    if field.input.is_empty() {
        return Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::styled(placeholder, Style::default().fg(Color::DarkGray)),
        ]);
    }
    Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::raw(field.input),
        Span::styled(CURSOR, Style::default().fg(Color::Cyan)),
    ])
}

fn list_lines<'a>(field: &FieldView<'a>, keys: &[&str]) -> Vec<Line<'a>> {
    let items = field
        .draft
        .scalar(field.spec.name)
        .and_then(FieldValue::as_list)
        .unwrap_or_default();
    let mut lines: Vec<Line> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let parts: Vec<&str> = keys
                .iter()
                .filter_map(|key| item.get(*key).and_then(Value::as_str))
                .filter(|v| !v.is_empty())
                .collect();
            Line::from(Span::styled(
                format!("• {}", parts.join(" · ")),
                entry_style(field, index),
            ))
        })
        .collect();
    lines.push(input_line(field, "valeur | valeur | ... puis Entrée"));
    lines
}

fn attachment_lines<'a>(field: &FieldView<'a>) -> Vec<Line<'a>> {
    let Some(slot) = field.draft.slot(field.spec.name) else {
        return Vec::new();
    };
    let mut lines: Vec<Line> = slot
        .combined()
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let tag = match entry {
                AttachmentEntry::Existing(_) => "[serveur]",
                AttachmentEntry::Staged(_) => "[nouveau]",
            };
            let mut text = format!("{tag} {}", entry.display_name());
            if !entry.description().is_empty() {
                text.push_str(&format!(" · {}", entry.description()));
            }
            Line::from(Span::styled(text, entry_style(field, index)))
        })
        .collect();
    lines.push(input_line(field, "chemin du fichier puis Entrée"));
    lines
}

/// Read-only recap of a draft, shown on steps without fields
pub fn summary_lines<'a>(fields: &'a [FieldSpec], draft: &'a Draft) -> Vec<Line<'a>> {
    let label_style = Style::default().fg(Color::Cyan);
    fields
        .iter()
        .filter(|spec| spec.is_visible(draft) && !draft.is_field_empty(spec.name))
        .map(|spec| {
            let value = match &spec.kind {
                FieldKind::List { .. } => {
                    let count = draft
                        .scalar(spec.name)
                        .and_then(FieldValue::as_list)
                        .map_or(0, <[Value]>::len);
                    format!("{count} entrée(s)")
                }
                kind if kind.is_attachment() => {
                    let count = draft.slot(spec.name).map_or(0, |slot| slot.len());
                    format!("{count} fichier(s)")
                }
                _ => draft.text(spec.name).replace('\n', " "),
            };
            Line::from(vec![
                Span::styled(format!("{} : ", spec.label), label_style),
                Span::raw(value),
            ])
        })
        .collect()
}
