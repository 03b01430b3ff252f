//! Application state definitions

use super::forms::{
    DraftError, EntityKind, FieldKind, FieldSpec, FieldValue, LocalFile, ParcelSummary, Record,
    ValidationResult, WizardController, WizardPhase,
};
use serde_json::{Map, Value};
use std::path::Path;

/// Current view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Records,
    Wizard,
}

/// Main application state
#[derive(Default)]
pub struct AppState {
    // Navigation
    pub current_view: View,
    pub entity: EntityKind,

    // Data
    pub records: Vec<Record>,
    pub parcels: Vec<ParcelSummary>,

    // Selection
    pub selected_index: usize,

    // UI state
    pub api_reachable: bool,
    pub status_message: Option<String>,
    /// Id of the record waiting for a delete confirmation
    pub confirm_delete: Option<String>,

    pub wizard: Option<WizardView>,
}

impl AppState {
    /// Move selection down
    pub fn move_selection_down(&mut self, max: usize) {
        if max > 0 && self.selected_index < max - 1 {
            self.selected_index += 1;
        }
    }

    /// Move selection up
    pub fn move_selection_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    /// Reset selection
    pub fn reset_selection(&mut self) {
        self.selected_index = 0;
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.records.get(self.selected_index)
    }

    /// Switch the records screen to another entity
    pub fn select_entity(&mut self, kind: EntityKind) {
        if self.entity != kind {
            self.entity = kind;
            self.records.clear();
            self.confirm_delete = None;
            self.reset_selection();
        }
    }

    /// Replace the record list, keeping the selection in range
    pub fn set_records(&mut self, records: Vec<Record>) {
        self.records = records;
        if self.selected_index >= self.records.len() {
            self.selected_index = self.records.len().saturating_sub(1);
        }
    }

    pub fn open_wizard(&mut self, controller: WizardController) {
        self.wizard = Some(WizardView::new(controller));
        self.current_view = View::Wizard;
    }

    /// Close the wizard, abandoning its session
    pub fn close_wizard(&mut self) {
        if let Some(mut view) = self.wizard.take() {
            view.controller.close();
        }
        self.current_view = View::Records;
    }
}

/// Per-wizard UI state on top of the controller
pub struct WizardView {
    pub controller: WizardController,
    /// Index into the visible fields of the current step
    pub active_field: usize,
    /// Selected entry of a file or list field
    pub entry_cursor: usize,
    /// Pending path, list entry or description
    pub input: String,
    /// Local input error, cleared on the next keystroke
    pub notice: Option<String>,
}

impl WizardView {
    pub fn new(controller: WizardController) -> Self {
        Self {
            controller,
            active_field: 0,
            entry_cursor: 0,
            input: String::new(),
            notice: None,
        }
    }

    /// Fields of the current step that the draft currently shows
    pub fn visible_fields(&self) -> Vec<&FieldSpec> {
        let store = self.controller.store();
        let schema = store.schema();
        let Some(step) = schema.step(self.controller.step()) else {
            return Vec::new();
        };
        step.fields
            .iter()
            .filter_map(|name| schema.field(name))
            .filter(|spec| spec.is_visible(store.snapshot()))
            .collect()
    }

    pub fn active_spec(&self) -> Option<&FieldSpec> {
        self.visible_fields().get(self.active_field).copied()
    }

    /// Notice or controller message, whichever is newer
    pub fn message(&self) -> Option<&str> {
        self.notice.as_deref().or_else(|| self.controller.message())
    }

    pub fn is_submitting(&self) -> bool {
        self.controller.phase() == WizardPhase::Submitting
    }

    fn reset_focus(&mut self) {
        self.active_field = 0;
        self.entry_cursor = 0;
        self.input.clear();
        self.notice = None;
    }

    fn clamp_focus(&mut self) {
        let count = self.visible_fields().len();
        if self.active_field >= count {
            self.active_field = count.saturating_sub(1);
        }
    }

    pub fn next_field(&mut self) {
        let count = self.visible_fields().len();
        if count > 0 {
            self.active_field = (self.active_field + 1) % count;
        }
        self.entry_cursor = 0;
        self.input.clear();
    }

    pub fn prev_field(&mut self) {
        let count = self.visible_fields().len();
        if count == 0 {
            return;
        }
        if self.active_field == 0 {
            self.active_field = count - 1;
        } else {
            self.active_field -= 1;
        }
        self.entry_cursor = 0;
        self.input.clear();
    }

    pub fn next_step(&mut self) -> ValidationResult {
        self.notice = None;
        let result = self.controller.next();
        if result.ok {
            self.reset_focus();
        }
        result
    }

    pub fn prev_step(&mut self) {
        let before = self.controller.step();
        self.controller.prev();
        if self.controller.step() != before {
            self.reset_focus();
        }
    }

    /// Number of entries shown for the active file or list field
    pub fn entry_count(&self) -> usize {
        let Some(spec) = self.active_spec() else {
            return 0;
        };
        let draft = self.controller.store().snapshot();
        match spec.kind {
            FieldKind::List { .. } => draft
                .scalar(spec.name)
                .and_then(FieldValue::as_list)
                .map_or(0, <[Value]>::len),
            FieldKind::SingleFile | FieldKind::MultiFile { .. } => {
                draft.slot(spec.name).map_or(0, |slot| slot.len())
            }
            _ => 0,
        }
    }

    pub fn move_entry_up(&mut self) {
        self.entry_cursor = self.entry_cursor.saturating_sub(1);
    }

    pub fn move_entry_down(&mut self) {
        let count = self.entry_count();
        if count > 0 && self.entry_cursor < count - 1 {
            self.entry_cursor += 1;
        }
    }

    fn report(&mut self, result: Result<(), DraftError>) {
        if let Err(err) = result {
            tracing::debug!("Draft rejected input: {err}");
            self.notice = Some(err.to_string());
        }
    }

    fn set_text(&mut self, name: &'static str, text: String) {
        let result = match self.controller.edit_draft() {
            Some(store) => store.set_field(name, FieldValue::Text(text)),
            None => return,
        };
        self.report(result);
        self.clamp_focus();
    }

    /// Type a character into the active field
    pub fn input_char(&mut self, c: char) {
        self.notice = None;
        let Some(spec) = self.active_spec().cloned() else {
            return;
        };
        match spec.kind {
            FieldKind::Text | FieldKind::Multiline => {
                let mut text = self.controller.store().snapshot().text(spec.name).to_string();
                text.push(c);
                self.set_text(spec.name, text);
            }
            FieldKind::Number if c.is_ascii_digit() || c == '.' => {
                let mut text = self.controller.store().snapshot().text(spec.name).to_string();
                text.push(c);
                self.set_text(spec.name, text);
            }
            FieldKind::Date if c.is_ascii_digit() || c == '-' => {
                let mut text = self.controller.store().snapshot().text(spec.name).to_string();
                text.push(c);
                self.set_text(spec.name, text);
            }
            FieldKind::List { .. } | FieldKind::SingleFile | FieldKind::MultiFile { .. } => {
                self.input.push(c);
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        self.notice = None;
        let Some(spec) = self.active_spec().cloned() else {
            return;
        };
        match spec.kind {
            FieldKind::Text | FieldKind::Multiline | FieldKind::Number | FieldKind::Date => {
                let mut text = self.controller.store().snapshot().text(spec.name).to_string();
                if text.pop().is_some() {
                    self.set_text(spec.name, text);
                }
            }
            FieldKind::List { .. } | FieldKind::SingleFile | FieldKind::MultiFile { .. } => {
                self.input.pop();
            }
            _ => {}
        }
    }

    /// Enter: newline in long text, otherwise commit the pending input
    pub fn enter(&mut self) {
        self.notice = None;
        let Some(spec) = self.active_spec().cloned() else {
            return;
        };
        match spec.kind {
            FieldKind::Multiline => self.input_char('\n'),
            FieldKind::SingleFile | FieldKind::MultiFile { .. } => self.stage_input(&spec),
            FieldKind::List { keys, .. } => self.push_input(&spec, keys),
            _ => {}
        }
    }

    fn stage_input(&mut self, spec: &FieldSpec) {
        let path = self.input.trim().to_string();
        if path.is_empty() {
            return;
        }
        if !Path::new(&path).is_file() {
            self.notice = Some(format!("Fichier introuvable : {path}"));
            return;
        }
        let result = match self.controller.edit_draft() {
            Some(store) => store.stage_file(spec.name, LocalFile::new(path)),
            None => return,
        };
        if result.is_ok() {
            self.input.clear();
            self.entry_cursor = self.entry_count().saturating_sub(1);
        }
        self.report(result);
    }

    /// List entries are typed as `value | value | ...` in key order
    fn push_input(&mut self, spec: &FieldSpec, keys: &[&str]) {
        if self.input.trim().is_empty() {
            return;
        }
        let item: Map<String, Value> = keys
            .iter()
            .zip(self.input.split('|'))
            .map(|(key, value)| (key.to_string(), Value::String(value.trim().to_string())))
            .collect();
        let result = match self.controller.edit_draft() {
            Some(store) => store.push_list_item(spec.name, item),
            None => return,
        };
        if result.is_ok() {
            self.input.clear();
            self.entry_cursor = self.entry_count().saturating_sub(1);
        }
        self.report(result);
    }

    /// Cycle the value of a select or relation field
    pub fn cycle_option(&mut self, forward: bool) {
        self.notice = None;
        let Some(spec) = self.active_spec().cloned() else {
            return;
        };
        let store = self.controller.store();
        let options: Vec<String> = match spec.kind {
            FieldKind::Select(options) => options.iter().map(|o| o.to_string()).collect(),
            FieldKind::Relation => std::iter::once(String::new())
                .chain(store.context().parcels.iter().map(|p| p.id.clone()))
                .collect(),
            _ => return,
        };
        if options.is_empty() {
            return;
        }
        let current = store.snapshot().text(spec.name);
        let next = match options.iter().position(|o| o == current) {
            Some(i) if forward => (i + 1) % options.len(),
            Some(i) => (i + options.len() - 1) % options.len(),
            None => 0,
        };
        let value = options[next].clone();
        self.set_text(spec.name, value);
    }

    /// Remove the selected entry of a file or list field
    pub fn remove_entry(&mut self) {
        self.notice = None;
        let Some(spec) = self.active_spec().cloned() else {
            return;
        };
        let index = self.entry_cursor;
        let result = match (self.controller.edit_draft(), &spec.kind) {
            (Some(store), FieldKind::List { .. }) => {
                store.remove_list_item(spec.name, index).map(|_| ())
            }
            (Some(store), kind) if kind.is_attachment() => {
                store.remove_attachment(spec.name, index).map(|_| ())
            }
            _ => return,
        };
        self.report(result);
        let count = self.entry_count();
        if self.entry_cursor >= count {
            self.entry_cursor = count.saturating_sub(1);
        }
    }

    /// Use the pending input as the description of the selected staged file
    pub fn describe_entry(&mut self) {
        self.notice = None;
        let Some(spec) = self.active_spec().cloned() else {
            return;
        };
        if !matches!(spec.kind, FieldKind::MultiFile { descriptions: Some(_) }) {
            return;
        }
        let index = self.entry_cursor;
        let stored = self
            .controller
            .store()
            .snapshot()
            .slot(spec.name)
            .and_then(|slot| slot.combined().get(index).map(|entry| !entry.is_staged()));
        if stored == Some(true) {
            self.notice = Some("Seuls les nouveaux fichiers peuvent être décrits".to_string());
            return;
        }
        let description = self.input.trim().to_string();
        let result = match self.controller.edit_draft() {
            Some(store) => store.describe_attachment(spec.name, index, description),
            None => return,
        };
        if result.is_ok() {
            self.input.clear();
        }
        self.report(result);
    }
}
