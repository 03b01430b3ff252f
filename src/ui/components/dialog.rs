//! Centered modal dialogs

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Horizontal padding inside the border, both sides together
const PADDING: u16 = 4;

/// What a dialog shows
pub struct DialogConfig<'a> {
    pub title: &'a str,
    /// Colour of the title and border
    pub accent: Color,
    /// Body text; `\n` starts a new paragraph
    pub message: &'a str,
    /// Key hints shown at the bottom
    pub hint: Vec<Span<'a>>,
    pub max_width: u16,
}

/// Render a centered dialog over whatever is on screen
pub fn render_dialog(frame: &mut Frame, config: DialogConfig) {
    let area = frame.area();
    let inner_width = config.max_width.saturating_sub(PADDING + 2).max(10) as usize;
    let lines = wrap_text(config.message, inner_width);

    let widest = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(config.title.chars().count()))
        .max()
        .unwrap_or(0) as u16;
    let width = (widest + PADDING + 2).min(config.max_width).min(area.width);
    let hint_rows = if config.hint.is_empty() { 0 } else { 2 };
    let height = (lines.len() as u16 + hint_rows + 4).min(area.height);

    let dialog_area = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, dialog_area);

    let mut content = vec![
        Line::from(Span::styled(
            config.title,
            Style::default()
                .fg(config.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    content.extend(lines.into_iter().map(Line::from));
    if !config.hint.is_empty() {
        content.push(Line::from(""));
        content.push(Line::from(config.hint));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(config.accent))
        .style(Style::default().bg(Color::Black));
    frame.render_widget(
        Paragraph::new(content)
            .block(block)
            .style(Style::default().bg(Color::Black).fg(Color::White)),
        dialog_area,
    );
}

/// Ask before deleting `label`; `y`/`o` confirms, any other key cancels
pub fn render_confirm_delete(frame: &mut Frame, label: &str) {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let message = format!("Supprimer définitivement « {label} » ?");
    render_dialog(
        frame,
        DialogConfig {
            title: "Confirmer la suppression",
            accent: Color::Red,
            message: &message,
            hint: vec![
                Span::styled("y", key_style),
                Span::raw(" supprimer  "),
                Span::styled("autre touche", key_style),
                Span::raw(" annuler"),
            ],
            max_width: 60,
        },
    );
}

/// Greedy word wrap on character counts
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let width = current.chars().count() + word.chars().count() + 1;
            if width > max_width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }

    lines
}
