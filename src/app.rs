//! Application state and core logic

use crate::api::{ApiError, RegistryApi};
use crate::hosts::{saved_message, schema_for};
use crate::platform;
use crate::state::{
    AppState, EntityKind, FormContext, ParcelSummary, SubmitOutcome, View, WizardController,
    WizardError,
};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Server answer for one wizard session
#[derive(Debug)]
pub struct SubmitCompletion {
    pub session: Uuid,
    pub result: Result<(), ApiError>,
}

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    /// Registry API the console talks to
    api: Arc<dyn RegistryApi>,
    /// Whether the app should quit
    quit: bool,
    completions_tx: UnboundedSender<SubmitCompletion>,
    completions_rx: UnboundedReceiver<SubmitCompletion>,
}

impl App {
    pub fn new(api: Arc<dyn RegistryApi>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::default(),
            api,
            quit: false,
            completions_tx,
            completions_rx,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Reload the records of the current entity
    pub async fn refresh(&mut self) {
        if let Err(err) = self.load_records().await {
            self.state.status_message =
                Some(format!("Chargement impossible : {}", err.user_message()));
        }
    }

    async fn load_records(&mut self) -> Result<(), ApiError> {
        let kind = self.state.entity;
        match self.api.list(kind).await {
            Ok(records) => {
                tracing::debug!("Loaded {} {kind}", records.len());
                self.state.api_reachable = true;
                self.state.set_records(records);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Failed to list {kind}: {err}");
                self.state.api_reachable = !matches!(err, ApiError::Transport(_));
                Err(err)
            }
        }
    }

    /// Reload the parcel catalogue used by relation fields
    async fn load_parcels(&mut self) {
        match self.api.list(EntityKind::Parcel).await {
            Ok(records) => {
                self.state.parcels = records
                    .iter()
                    .filter_map(|record| ParcelSummary::from_record(&record.fields))
                    .collect();
            }
            Err(err) => {
                tracing::warn!("Failed to load parcel catalogue: {err}");
            }
        }
    }

    async fn form_context(&mut self, kind: EntityKind) -> FormContext {
        if matches!(kind, EntityKind::Title | EntityKind::Transaction) {
            self.load_parcels().await;
        }
        FormContext::current().with_parcels(self.state.parcels.clone())
    }

    /// Handle a key press
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Clear any status messages on key press
        self.state.status_message = None;

        match self.state.current_view {
            View::Records => self.handle_records_key(key).await?,
            View::Wizard => self.handle_wizard_key(key),
        }
        Ok(())
    }

    async fn handle_records_key(&mut self, key: KeyEvent) -> Result<()> {
        // Delete confirmation is modal
        if let Some(id) = self.state.confirm_delete.take() {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('o')) {
                self.delete_record(&id).await;
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Tab => self.switch_entity(self.state.entity.next()).await,
            KeyCode::BackTab => self.switch_entity(self.state.entity.prev()).await,
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                self.switch_entity(EntityKind::ALL[index]).await;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.move_selection_down(self.state.records.len());
            }
            KeyCode::Up | KeyCode::Char('k') => self.state.move_selection_up(),
            KeyCode::Char('r') => self.refresh().await,
            KeyCode::Char('n') => self.open_create().await,
            KeyCode::Enter | KeyCode::Char('e') => self.open_edit().await,
            KeyCode::Char('d') if !self.state.entity.can_delete() => {
                self.state.status_message =
                    Some("Les demandes ne se suppriment pas depuis la console".to_string());
            }
            KeyCode::Char('d') => {
                self.state.confirm_delete = self.state.selected_record().map(|r| r.id.clone());
            }
            _ => {}
        }
        Ok(())
    }

    async fn switch_entity(&mut self, kind: EntityKind) {
        self.state.select_entity(kind);
        self.refresh().await;
    }

    async fn open_create(&mut self) {
        let kind = self.state.entity;
        if !kind.can_create() {
            self.state.status_message =
                Some("Les demandes sont déposées par les citoyens".to_string());
            return;
        }
        let context = self.form_context(kind).await;
        tracing::debug!("Opening create wizard for {kind}");
        self.state
            .open_wizard(WizardController::create(schema_for(kind), context));
    }

    async fn open_edit(&mut self) {
        let kind = self.state.entity;
        let Some(id) = self.state.selected_record().map(|r| r.id.clone()) else {
            return;
        };
        let record = match self.api.fetch(kind, &id).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!("Failed to fetch {kind}/{id}: {err}");
                self.state.status_message =
                    Some(format!("Chargement impossible : {}", err.user_message()));
                return;
            }
        };
        let context = self.form_context(kind).await;
        tracing::debug!("Opening edit wizard for {kind}/{id}");
        self.state
            .open_wizard(WizardController::edit(schema_for(kind), context, record));
    }

    async fn delete_record(&mut self, id: &str) {
        let kind = self.state.entity;
        match self.api.delete(kind, id).await {
            Ok(()) => {
                tracing::info!("Deleted {kind}/{id}");
                self.refresh().await;
                self.state.status_message = Some("Enregistrement supprimé".to_string());
            }
            Err(err) => {
                tracing::warn!("Failed to delete {kind}/{id}: {err}");
                self.state.status_message =
                    Some(format!("Suppression impossible : {}", err.user_message()));
            }
        }
    }

    fn handle_wizard_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.state.close_wizard();
            return;
        }
        if platform::is_shortcut(&key, 's') {
            self.submit_wizard();
            return;
        }
        let Some(view) = self.state.wizard.as_mut() else {
            self.state.current_view = View::Records;
            return;
        };

        if platform::is_shortcut(&key, 'n') {
            view.next_step();
            return;
        }
        if platform::is_shortcut(&key, 'p') {
            view.prev_step();
            return;
        }
        if platform::is_shortcut(&key, 'd') {
            view.describe_entry();
            return;
        }

        match key.code {
            KeyCode::Tab => view.next_field(),
            KeyCode::BackTab => view.prev_field(),
            KeyCode::PageDown => {
                view.next_step();
            }
            KeyCode::PageUp => view.prev_step(),
            KeyCode::Left => view.cycle_option(false),
            KeyCode::Right => view.cycle_option(true),
            KeyCode::Up => view.move_entry_up(),
            KeyCode::Down => view.move_entry_down(),
            KeyCode::Delete => view.remove_entry(),
            KeyCode::Enter => view.enter(),
            KeyCode::Backspace => view.backspace(),
            KeyCode::Char(c) => view.input_char(c),
            _ => {}
        }
    }

    /// Freeze the wizard and send its submission in the background
    fn submit_wizard(&mut self) {
        let Some(view) = self.state.wizard.as_mut() else {
            return;
        };
        view.notice = None;
        let submission = match view.controller.begin_submit() {
            Ok(submission) => submission,
            Err(WizardError::Invalid(_) | WizardError::AlreadySubmitting) => return,
            Err(WizardError::NotAtLastStep { last, .. }) => {
                view.notice = Some(format!("Enregistrement possible à l'étape {last}"));
                return;
            }
            Err(err) => {
                tracing::warn!("Submit refused: {err}");
                view.notice = Some(err.to_string());
                return;
            }
        };

        let api = Arc::clone(&self.api);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = api.submit(&submission).await;
            let completion = SubmitCompletion {
                session: submission.session,
                result,
            };
            if tx.send(completion).is_err() {
                tracing::debug!("Console closed before submit {} finished", submission.session);
            }
        });
    }

    /// Apply any submit answers that arrived since the last call
    pub async fn poll_completions(&mut self) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.handle_completion(completion).await;
        }
    }

    async fn handle_completion(&mut self, completion: SubmitCompletion) {
        let Some(view) = self.state.wizard.as_mut() else {
            tracing::debug!("Dropping submit answer {}: no wizard open", completion.session);
            return;
        };
        let kind = view.controller.store().schema().kind;
        let created = !view.controller.is_edit();

        match view
            .controller
            .finish_submit(completion.session, completion.result)
        {
            Some(SubmitOutcome::Done) => {
                let saved = saved_message(kind, created);
                self.state.status_message = Some(saved.to_string());
                if let Err(err) = self.load_records().await {
                    self.state.status_message = Some(format!(
                        "{saved} (liste non rechargée : {})",
                        err.user_message()
                    ));
                }
                self.state.close_wizard();
            }
            Some(SubmitOutcome::Retry { .. }) => {
                // Controller is back on the last step with the server's message
                view.active_field = 0;
                view.entry_cursor = 0;
            }
            None => {}
        }
    }
}
