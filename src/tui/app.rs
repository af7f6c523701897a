use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::warn;

use crate::auth::Token;
use crate::config::{ConfigStore, Configuration, ThemeMode};
use crate::error::Result;
use crate::gitlab::types::MergeRequest;
use crate::gitlab::ClientHandle;
use crate::query::{QueryService, QueryState};

use super::state::{ExpansionState, SetupForm};
use super::views::{self, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Configuration form; forced while no configuration exists
    Setup,
    Dashboard,
}

/// Top-level application state, mutated only on the UI thread in response
/// to key events and fetch completions.
pub struct App {
    pub store: ConfigStore,
    pub handle: ClientHandle,
    pub query: QueryService,
    pub screen: Screen,
    pub form: SetupForm,
    pub expansion: ExpansionState,
    pub cursor: usize,
    pub should_quit: bool,
}

impl App {
    /// Build the app from a loaded config store.
    ///
    /// With a complete configuration the client initializes immediately and
    /// the dashboard opens; otherwise the setup form is shown and no query
    /// runs until the user saves.
    pub fn new(store: ConfigStore) -> Result<Self> {
        let mut handle = ClientHandle::default();
        let mut query = QueryService::new();

        let (screen, form) = match store.configuration() {
            Some(configuration) => {
                handle.initialize(&store.settings.base_url, configuration.token.clone())?;
                query.set_project_path(Some(configuration.project_path.clone()));
                (
                    Screen::Dashboard,
                    SetupForm::prefilled(configuration.token.as_str(), &configuration.project_path),
                )
            }
            None => (Screen::Setup, SetupForm::default()),
        };

        Ok(Self {
            store,
            handle,
            query,
            screen,
            form,
            expansion: ExpansionState::default(),
            cursor: 0,
            should_quit: false,
        })
    }

    pub fn theme(&self) -> ThemeMode {
        self.store.settings.theme
    }

    /// One event-loop tick: drain fetch completions and start a fetch when
    /// the current result is missing or stale.
    pub fn tick(&mut self) {
        self.query.poll();
        self.query.ensure_fresh(&self.handle);
        self.clamp_cursor();
    }

    pub fn merge_requests(&self) -> &[MergeRequest] {
        match self.query.state() {
            QueryState::Ready { merge_requests, .. } => merge_requests,
            _ => &[],
        }
    }

    pub fn rows(&self) -> Vec<Row> {
        views::build_rows(self.merge_requests(), &self.expansion)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Setup => self.handle_setup_key(key),
            Screen::Dashboard => self.handle_dashboard_key(key),
        }
    }

    fn handle_setup_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                // Without a saved configuration there is nothing to go
                // back to.
                if self.store.configuration().is_some() {
                    self.screen = Screen::Dashboard;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.form.focus_next();
            }
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Enter => self.save_configuration(),
            KeyCode::Char(c) => self.form.insert(c),
            _ => {}
        }
    }

    /// Persist the form, rebuild the client with the new token and point
    /// the query service at the (possibly new) project path.
    fn save_configuration(&mut self) {
        if !self.form.is_complete() {
            return;
        }

        let configuration = Configuration {
            token: Token::from(self.form.token.trim()),
            project_path: self.form.project_path.trim().to_string(),
        };

        // Failure to persist is not fatal; the session keeps the values.
        if let Err(e) = self.store.save_configuration(configuration.clone()) {
            warn!("Failed to persist configuration: {e:#}");
        }

        match self
            .handle
            .initialize(&self.store.settings.base_url, configuration.token)
        {
            Ok(()) => {
                self.expansion.clear();
                self.cursor = 0;
                self.query
                    .set_project_path(Some(configuration.project_path));
                self.query.refresh(&self.handle);
                self.screen = Screen::Dashboard;
            }
            Err(e) => warn!("Failed to initialize GitLab client: {e}"),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => {
                self.query.refresh(&self.handle);
            }
            KeyCode::Char('t') => {
                let next = self.theme().next();
                if let Err(e) = self.store.set_theme(next) {
                    warn!("Failed to persist theme: {e:#}");
                }
            }
            KeyCode::Char('s') => {
                self.form = SetupForm::prefilled(
                    self.store
                        .settings
                        .token
                        .as_ref()
                        .map(Token::as_str)
                        .unwrap_or_default(),
                    self.store.settings.project_path.as_deref().unwrap_or_default(),
                );
                self.screen = Screen::Setup;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.rows().len();
                if len > 0 && self.cursor < len - 1 {
                    self.cursor += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_at_cursor(),
            _ => {}
        }
    }

    fn toggle_at_cursor(&mut self) {
        let rows = self.rows();
        let Some(row) = rows.get(self.cursor) else {
            return;
        };

        match *row {
            Row::MergeRequest { mr_index, .. } => {
                let Some(id) = self.merge_requests().get(mr_index).map(|mr| mr.id.clone())
                else {
                    return;
                };
                self.expansion.toggle_merge_request(&id);
            }
            Row::Stage {
                mr_index,
                stage_index,
                ..
            } => {
                let Some((id, name)) = self.merge_requests().get(mr_index).and_then(|mr| {
                    let stage = mr.latest_pipeline()?.stages.get(stage_index)?;
                    Some((mr.id.clone(), stage.name.clone()))
                }) else {
                    return;
                };
                self.expansion.toggle_stage(&id, &name);
            }
            Row::Detail { .. } | Row::JobGrid { .. } => {}
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }
}
