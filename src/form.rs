//! The session configuration form.
//!
//! Holds what the user typed or picked and turns it into [`FormValues`] for
//! the session core.  Everything except the refresh rate locks while a
//! session is running.

use crate::api::DeserializerInfo;
use crate::session::FormValues;

/// Refresh rates offered by the picker, in milliseconds.  Zero is "off".
pub const REFRESH_PRESETS_MS: [u64; 7] = [0, 1_000, 2_000, 5_000, 10_000, 30_000, 60_000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SourceUrl,
    SchemaUrl,
    Topic,
    KeyFilter,
    MessageFilter,
    Deserializer,
    RefreshRate,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::SourceUrl,
        Field::SchemaUrl,
        Field::Topic,
        Field::KeyFilter,
        Field::MessageFilter,
        Field::Deserializer,
        Field::RefreshRate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::SourceUrl => "Kafka host",
            Field::SchemaUrl => "Schema registry",
            Field::Topic => "Topic",
            Field::KeyFilter => "Key filter",
            Field::MessageFilter => "Message filter",
            Field::Deserializer => "Deserializer",
            Field::RefreshRate => "Refresh rate",
        }
    }

    fn is_text(self) -> bool {
        !matches!(self, Field::Deserializer | Field::RefreshRate)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Form {
    pub source_url: String,
    pub schema_url: String,
    pub topic: String,
    pub key_filter: String,
    pub message_filter: String,
    /// Deserializers to pick from; `deserializer` indexes into it.
    pub deserializers: Vec<DeserializerInfo>,
    pub deserializer: Option<usize>,
    /// Known topics for the topic picker.
    pub topics: Vec<String>,
    topic_cursor: Option<usize>,
    pub refresh_ms: u64,
    pub queue_size: Option<u32>,
    /// False while a session is running.
    pub enabled: bool,
}

impl Form {
    /// A form pre-filled from command-line values.
    pub fn from_values(values: FormValues) -> Self {
        // A deserializer given up front is offered on its own until the
        // backend's list arrives.
        let (deserializers, deserializer) = if values.deserializer_id.is_empty() {
            (Vec::new(), None)
        } else {
            let info = DeserializerInfo {
                name: values.deserializer_id.clone(),
                id: values.deserializer_id,
            };
            (vec![info], Some(0))
        };

        Self {
            source_url: values.source_url,
            schema_url: values.schema_url,
            topic: values.topic,
            key_filter: values.key_filter,
            message_filter: values.message_filter,
            deserializers,
            deserializer,
            topics: Vec::new(),
            topic_cursor: None,
            refresh_ms: values.refresh_interval_ms,
            queue_size: values.queue_size,
            enabled: true,
        }
    }

    pub fn values(&self) -> FormValues {
        FormValues {
            source_url: self.source_url.clone(),
            schema_url: self.schema_url.clone(),
            topic: self.topic.clone(),
            key_filter: self.key_filter.clone(),
            message_filter: self.message_filter.clone(),
            deserializer_id: self
                .selected_deserializer()
                .map(|d| d.id.clone())
                .unwrap_or_default(),
            refresh_interval_ms: self.refresh_ms,
            queue_size: self.queue_size,
        }
    }

    /// The source URL to list topics for, if one was entered.
    pub fn source_url_value(&self) -> Option<String> {
        let url = self.source_url.trim();
        (!url.is_empty()).then(|| url.to_string())
    }

    pub fn selected_deserializer(&self) -> Option<&DeserializerInfo> {
        self.deserializer.and_then(|i| self.deserializers.get(i))
    }

    /// Whether `field` accepts input right now.
    pub fn is_editable(&self, field: Field) -> bool {
        self.enabled || field == Field::RefreshRate
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::SourceUrl => Some(&mut self.source_url),
            Field::SchemaUrl => Some(&mut self.schema_url),
            Field::Topic => Some(&mut self.topic),
            Field::KeyFilter => Some(&mut self.key_filter),
            Field::MessageFilter => Some(&mut self.message_filter),
            Field::Deserializer | Field::RefreshRate => None,
        }
    }

    // -- editing -------------------------------------------------------------

    pub fn insert_char(&mut self, field: Field, c: char) {
        if !self.is_editable(field) || !field.is_text() {
            return;
        }
        if let Some(text) = self.text_mut(field) {
            text.push(c);
        }
    }

    pub fn backspace(&mut self, field: Field) {
        if !self.is_editable(field) {
            return;
        }
        if let Some(text) = self.text_mut(field) {
            text.pop();
        }
    }

    /// Step through the known topics, copying the choice into the topic field.
    pub fn cycle_topic(&mut self, delta: isize) {
        if !self.enabled || self.topics.is_empty() {
            return;
        }
        let next = step(self.topic_cursor, delta, self.topics.len());
        self.topic_cursor = Some(next);
        self.topic = self.topics[next].clone();
    }

    pub fn cycle_deserializer(&mut self, delta: isize) {
        if !self.enabled || self.deserializers.is_empty() {
            return;
        }
        self.deserializer = Some(step(self.deserializer, delta, self.deserializers.len()));
    }

    /// Move to the neighbouring refresh preset.
    ///
    /// Returns the new interval if it changed.  Custom values from the command
    /// line step to the nearest preset in the requested direction.
    pub fn cycle_refresh(&mut self, delta: isize) -> Option<u64> {
        let next = if delta > 0 {
            REFRESH_PRESETS_MS.iter().copied().find(|&ms| ms > self.refresh_ms)
        } else {
            REFRESH_PRESETS_MS.iter().rev().copied().find(|&ms| ms < self.refresh_ms)
        }?;
        self.refresh_ms = next;
        Some(next)
    }

    // -- catalog -------------------------------------------------------------

    pub fn set_topics(&mut self, topics: Vec<String>) {
        self.topic_cursor = topics.iter().position(|t| *t == self.topic);
        self.topics = topics;
    }

    /// Replace the deserializer list, keeping the current choice if the
    /// backend knows it.
    pub fn set_deserializers(&mut self, list: Vec<DeserializerInfo>) {
        let current = self.selected_deserializer().map(|d| d.id.clone());
        self.deserializer = match current {
            Some(id) => list.iter().position(|d| d.id == id).or((!list.is_empty()).then_some(0)),
            None => (!list.is_empty()).then_some(0),
        };
        self.deserializers = list;
    }

    // -- display -------------------------------------------------------------

    /// What the form shows for `field`.
    pub fn display(&self, field: Field) -> String {
        match field {
            Field::SourceUrl => self.source_url.clone(),
            Field::SchemaUrl => self.schema_url.clone(),
            Field::Topic => self.topic.clone(),
            Field::KeyFilter => self.key_filter.clone(),
            Field::MessageFilter => self.message_filter.clone(),
            Field::Deserializer => match self.selected_deserializer() {
                Some(d) if d.name != d.id => format!("{} ({})", d.name, d.id),
                Some(d) => d.name.clone(),
                None => "(none loaded)".to_string(),
            },
            Field::RefreshRate => refresh_label(self.refresh_ms),
        }
    }
}

pub fn refresh_label(ms: u64) -> String {
    match ms {
        0 => "off".to_string(),
        ms if ms % 1_000 == 0 => format!("every {}s", ms / 1_000),
        ms => format!("every {ms} ms"),
    }
}

fn step(current: Option<usize>, delta: isize, len: usize) -> usize {
    match current {
        None if delta < 0 => len - 1,
        None => 0,
        Some(i) => (i as isize + delta).rem_euclid(len as isize) as usize,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
