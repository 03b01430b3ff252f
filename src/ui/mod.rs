//! UI module for rendering the TUI

mod components;
mod forms;
mod layout;
mod records;

use crate::app::App;
use crate::state::View;
use ratatui::Frame;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let (sidebar_area, main_area) = layout::create_layout(frame.area());

    layout::draw_sidebar(frame, sidebar_area, app);

    match app.state.current_view {
        View::Records => records::draw(frame, main_area, app),
        View::Wizard => forms::draw_wizard(frame, main_area, app),
    }

    layout::draw_status_bar(frame, app);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockRegistryApi;
    use crate::hosts::schema_for;
    use crate::state::{EntityKind, FormContext, Record, WizardController};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;
    use std::sync::Arc;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_records_screen_lists_labels() {
        let mut app = App::new(Arc::new(MockRegistryApi::new()));
        app.state.set_records(vec![Record::from_value(
            json!({"_id": "p1", "ville": "Dakar", "adresse": "Rue 10"}),
        )
        .unwrap()]);
        let screen = render(&app);
        assert!(screen.contains("Parcelles (1)"));
        assert!(screen.contains("Dakar"));
    }

    #[test]
    fn test_empty_requests_offer_no_creation() {
        let mut app = App::new(Arc::new(MockRegistryApi::new()));
        app.state.entity = EntityKind::Request;
        let screen = render(&app);
        assert!(screen.contains("Demandes (0)"));
        assert!(screen.contains("Aucun enregistrement."));
        assert!(!screen.contains("pour en créer un"));
    }

    #[test]
    fn test_every_wizard_step_renders() {
        for kind in EntityKind::ALL {
            let mut app = App::new(Arc::new(MockRegistryApi::new()));
            app.state.open_wizard(WizardController::create(
                schema_for(kind),
                FormContext::current(),
            ));
            let screen = render(&app);
            assert!(screen.contains("Étape 1/"), "{kind}");
        }
    }
}
