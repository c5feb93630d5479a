use std::time::Duration;

use chrono::{DateTime, Local};
use ratatui::widgets::ListState;
use reqwest::Url;

use crate::api::{MessagePage, MessageRecord};
use crate::catalog::{CatalogLoader, CatalogMsg};
use crate::error::{BackendError, SessionError, ValidationError};
use crate::form::{refresh_label, Field, Form};
use crate::input::Command;
use crate::session::{FormValues, SessionConfig, SessionController, SessionState, SessionUi};

/// Rows moved by PageUp / PageDown.
const PAGE_STEP: usize = 10;

/// Which pane receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field(Field),
    Messages,
}

pub struct App {
    pub form: Form,
    pub focus: Focus,
    /// Current page, newest first.
    pub messages: Vec<MessageRecord>,
    /// Messages the consumer has seen in total.
    pub total: u64,
    pub session_id: Option<String>,
    /// Topic of the running session.
    pub active_topic: Option<String>,
    pub permalink: Option<String>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status or error message.
    pub status: String,
    /// When the last page arrived.
    pub updated: Option<DateTime<Local>>,
    api_base: Url,
}

impl App {
    pub fn new(form: FormValues, api_base: Url) -> Self {
        Self {
            form: Form::from_values(form),
            focus: Focus::Field(Field::Topic),
            messages: Vec::new(),
            total: 0,
            session_id: None,
            active_topic: None,
            permalink: None,
            list_state: ListState::default(),
            quit: false,
            status: "Pick a topic and press Enter".into(),
            updated: None,
            api_base,
        }
    }

    /// Replace the shown messages with `page`.
    pub fn show_page(&mut self, page: MessagePage) {
        self.total = page.total_elements;
        self.messages = page.content;
        self.messages.reverse();

        match self.list_state.selected() {
            _ if self.messages.is_empty() => self.list_state.select(None),
            Some(i) if i >= self.messages.len() => self.list_state.select(Some(self.messages.len() - 1)),
            _ => {}
        }
    }

    fn clear_messages(&mut self) {
        self.messages.clear();
        self.total = 0;
        self.list_state.select(None);
    }

    // -- commands ------------------------------------------------------------

    /// Run a user command against the session and catalog.
    pub fn dispatch(&mut self, command: Command, session: &mut SessionController, catalog: &CatalogLoader) {
        let result = match command {
            Command::Submit if session.state() == SessionState::Idle => session.start(self),
            Command::Submit | Command::Refresh => session.refresh(true, self),
            Command::Truncate => session.truncate(self),
            Command::Dispose => session.dispose(self),
            Command::ReloadCatalog => {
                catalog.load_topics(self.form.source_url_value());
                catalog.load_deserializers();
                self.status = "Loading topics…".into();
                Ok(())
            }
            Command::SetRefreshInterval(ms) => {
                session.set_refresh_interval(Duration::from_millis(ms));
                self.status = format!("Refresh {}", refresh_label(ms));
                Ok(())
            }
        };

        match result {
            // already reported through `on_validation_error`
            Err(SessionError::Validation(_)) | Ok(()) => {}
            Err(e) => self.status = e.to_string(),
        }
    }

    pub fn apply_catalog(&mut self, msg: CatalogMsg) {
        match msg {
            CatalogMsg::Topics(Ok(topics)) => {
                self.status = format!("{} topics", topics.len());
                self.form.set_topics(topics);
            }
            CatalogMsg::Deserializers(Ok(list)) => self.form.set_deserializers(list),
            CatalogMsg::Topics(Err(e)) => self.status = format!("Loading topics failed: {e}"),
            CatalogMsg::Deserializers(Err(e)) => {
                self.status = format!("Loading deserializers failed: {e}")
            }
        }
    }

    // -- focus ---------------------------------------------------------------

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::Field(field) => match Field::ALL.iter().position(|f| *f == field) {
                Some(i) if i + 1 < Field::ALL.len() => Focus::Field(Field::ALL[i + 1]),
                _ => Focus::Messages,
            },
            Focus::Messages => Focus::Field(Field::ALL[0]),
        };
    }

    pub fn focus_previous(&mut self) {
        self.focus = match self.focus {
            Focus::Field(field) => match Field::ALL.iter().position(|f| *f == field) {
                Some(i) if i > 0 => Focus::Field(Field::ALL[i - 1]),
                _ => Focus::Messages,
            },
            Focus::Messages => Focus::Field(Field::ALL[Field::ALL.len() - 1]),
        };
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        self.select_by(1);
    }

    pub fn select_previous(&mut self) {
        self.select_by(-1);
    }

    pub fn page_down(&mut self) {
        self.select_by(PAGE_STEP as isize);
    }

    pub fn page_up(&mut self) {
        self.select_by(-(PAGE_STEP as isize));
    }

    fn select_by(&mut self, delta: isize) {
        if self.messages.is_empty() {
            return;
        }
        let last = self.messages.len() as isize - 1;
        // Nothing selected behaves as if just above the first row.
        let current = self.list_state.selected().map_or(-1, |i| i as isize);
        self.list_state.select(Some((current + delta).clamp(0, last) as usize));
    }

    pub fn select_first(&mut self) {
        if !self.messages.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.messages.is_empty() {
            self.list_state.select(Some(self.messages.len() - 1));
        }
    }
}

impl SessionUi for App {
    fn form_values(&self) -> FormValues {
        self.form.values()
    }

    fn on_config_built(&mut self, config: &SessionConfig) {
        self.form.enabled = false;
        self.clear_messages();
        self.active_topic = Some(config.topic.clone());
        self.permalink = Some(config.permalink(&self.api_base).to_string());
        self.status = format!("Consuming {}…", config.topic);
        if matches!(self.focus, Focus::Field(f) if !self.form.is_editable(f)) {
            self.focus = Focus::Messages;
        }
    }

    fn on_page_received(&mut self, session_id: &str, page: MessagePage) {
        let shown = page.content.len();
        let total = page.total_elements;
        self.session_id = Some(session_id.to_string());
        self.show_page(page);
        self.updated = Some(Local::now());
        self.status = format!("Showing {shown} of {total} messages");
    }

    fn on_disposed(&mut self) {
        self.clear_messages();
        self.session_id = None;
        self.active_topic = None;
        self.permalink = None;
        self.updated = None;
        self.form.enabled = true;
        self.status = "Consumer disposed".into();
    }

    fn on_validation_error(&mut self, error: ValidationError) {
        self.status = format!("Cannot start consumer: {error}");
        self.focus = Focus::Field(match error {
            ValidationError::MissingTopic => Field::Topic,
            ValidationError::MissingDeserializer => Field::Deserializer,
        });
    }

    fn on_backend_error(&mut self, error: &BackendError) {
        self.status = format!("Error: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DeserializerInfo;
    use crate::session::build_config;

    fn make_record(offset: i64) -> MessageRecord {
        MessageRecord {
            key: Some(format!("k{offset}")),
            write_time: 1_700_000_000_000 + offset,
            offset,
            topic: "orders".into(),
            partition: Some(0),
            message: serde_json::json!({"offset": offset}),
            headers: vec![],
        }
    }

    fn sample_page() -> MessagePage {
        MessagePage {
            content: vec![make_record(1), make_record(2), make_record(3)],
            total_elements: 10,
        }
    }

    fn new_app() -> App {
        App::new(
            FormValues {
                topic: "orders".into(),
                deserializer_id: "string".into(),
                ..FormValues::default()
            },
            Url::parse("http://localhost:8080").unwrap(),
        )
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_starts_empty() {
        let app = new_app();
        assert!(app.messages.is_empty());
        assert!(!app.quit);
        assert!(app.form.enabled);
        assert!(app.list_state.selected().is_none());
        assert_eq!(app.focus, Focus::Field(Field::Topic));
    }

    // -- pages ---------------------------------------------------------------

    #[test]
    fn show_page_puts_newest_first() {
        let mut app = new_app();
        app.show_page(sample_page());

        assert_eq!(app.total, 10);
        assert_eq!(app.messages.len(), 3);
        assert_eq!(app.messages[0].offset, 3, "newest first");
        assert_eq!(app.messages[2].offset, 1, "oldest last");
    }

    #[test]
    fn show_page_replaces_previous_page() {
        let mut app = new_app();
        app.show_page(sample_page());
        app.show_page(MessagePage {
            content: vec![make_record(4)],
            total_elements: 11,
        });
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.total, 11);
    }

    #[test]
    fn shrinking_page_clamps_selection() {
        let mut app = new_app();
        app.show_page(sample_page());
        app.select_last();

        app.show_page(MessagePage {
            content: vec![make_record(9)],
            total_elements: 1,
        });
        assert_eq!(app.list_state.selected(), Some(0));

        app.show_page(MessagePage::default());
        assert!(app.list_state.selected().is_none());
    }

    // -- session callbacks ---------------------------------------------------

    #[test]
    fn config_built_locks_form_and_sets_permalink() {
        let mut app = new_app();
        let config = build_config(&app.form_values()).unwrap();

        app.on_config_built(&config);

        assert!(!app.form.enabled);
        assert_eq!(app.active_topic.as_deref(), Some("orders"));
        assert_eq!(
            app.permalink.as_deref(),
            Some("http://localhost:8080/consumer/topic/orders/string")
        );
        assert_eq!(app.focus, Focus::Messages, "locked topic field loses focus");
    }

    #[test]
    fn page_received_records_session_and_time() {
        let mut app = new_app();
        app.on_page_received("c1", sample_page());

        assert_eq!(app.session_id.as_deref(), Some("c1"));
        assert!(app.updated.is_some());
        assert_eq!(app.status, "Showing 3 of 10 messages");
    }

    #[test]
    fn disposed_clears_and_unlocks() {
        let mut app = new_app();
        let config = build_config(&app.form_values()).unwrap();
        app.on_config_built(&config);
        app.on_page_received("c1", sample_page());

        app.on_disposed();

        assert!(app.messages.is_empty());
        assert_eq!(app.total, 0);
        assert!(app.session_id.is_none());
        assert!(app.permalink.is_none());
        assert!(app.form.enabled);
    }

    #[test]
    fn validation_error_focuses_offending_field() {
        let mut app = new_app();
        app.focus = Focus::Messages;

        app.on_validation_error(ValidationError::MissingDeserializer);
        assert_eq!(app.focus, Focus::Field(Field::Deserializer));
        assert!(app.status.contains("deserializer"));

        app.on_validation_error(ValidationError::MissingTopic);
        assert_eq!(app.focus, Focus::Field(Field::Topic));
    }

    #[test]
    fn backend_error_shows_in_status() {
        let mut app = new_app();
        app.on_backend_error(&BackendError::HttpStatus(502));
        assert_eq!(app.status, "Error: backend returned HTTP 502");
    }

    // -- catalog -------------------------------------------------------------

    #[test]
    fn catalog_messages_fill_pickers() {
        let mut app = new_app();
        app.apply_catalog(CatalogMsg::Topics(Ok(vec!["orders".into(), "payments".into()])));
        app.apply_catalog(CatalogMsg::Deserializers(Ok(vec![DeserializerInfo {
            id: "string".into(),
            name: "String".into(),
        }])));

        assert_eq!(app.form.topics.len(), 2);
        assert_eq!(app.form.values().deserializer_id, "string");

        app.apply_catalog(CatalogMsg::Topics(Err(BackendError::HttpStatus(500))));
        assert!(app.status.starts_with("Loading topics failed"));
        assert_eq!(app.form.topics.len(), 2, "failed reload keeps old list");
    }

    // -- focus ---------------------------------------------------------------

    #[test]
    fn focus_cycles_through_fields_and_messages() {
        let mut app = new_app();
        app.focus = Focus::Field(Field::RefreshRate);
        app.focus_next();
        assert_eq!(app.focus, Focus::Messages);
        app.focus_next();
        assert_eq!(app.focus, Focus::Field(Field::SourceUrl));
        app.focus_previous();
        assert_eq!(app.focus, Focus::Messages);
        app.focus_previous();
        assert_eq!(app.focus, Focus::Field(Field::RefreshRate));
    }

    // -- navigation ----------------------------------------------------------

    #[test]
    fn select_next_on_empty_is_noop() {
        let mut app = new_app();
        app.select_next();
        app.page_down();
        app.select_last();
        assert!(app.list_state.selected().is_none());
    }

    #[test]
    fn select_next_starts_at_zero_then_advances() {
        let mut app = new_app();
        app.show_page(sample_page());

        app.select_next();
        assert_eq!(app.list_state.selected(), Some(0));
        app.select_next();
        assert_eq!(app.list_state.selected(), Some(1));
    }

    #[test]
    fn paging_clamps_to_bounds() {
        let mut app = new_app();
        app.show_page(sample_page());

        app.select_first();
        app.page_down();
        assert_eq!(app.list_state.selected(), Some(2));
        app.page_up();
        assert_eq!(app.list_state.selected(), Some(0));
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));
    }
}
