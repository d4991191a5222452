//! Message sink for validation failures.
//!
//! The validator records one [`Message`] per failing check. Messages keep
//! the order in which they were added and carry the field name and a tag so
//! that a page can show the failures next to the right inputs. Storage is
//! per request: each session owns its own [`MessageStorage`].

use serde::{Deserialize, Serialize};

/// Tag attached to messages produced by form validation.
pub const MESSAGE_TAG: &str = "formmap";

/// The severity level of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    /// Informational message.
    Info = 20,
    /// Success notification.
    Success = 25,
    /// Warning that requires attention.
    Warning = 30,
    /// A failed check.
    Error = 40,
}

impl MessageLevel {
    /// Returns the lowercase label for this level.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single recorded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The severity level of this message.
    pub level: MessageLevel,
    /// The composite key of the field the message is about, if any.
    pub name: Option<String>,
    /// The message text.
    pub text: String,
    /// The tag grouping related messages (e.g. [`MESSAGE_TAG`]).
    pub tag: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(
        level: MessageLevel,
        name: Option<String>,
        text: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            level,
            name,
            text: text.into(),
            tag: tag.into(),
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Ordered, append-only storage for messages.
///
/// # Examples
///
/// ```
/// use formmap_core::messages::{MessageStorage, MESSAGE_TAG};
///
/// let mut storage = MessageStorage::new();
/// storage.add_error("login_id", "「ID」 is required.", MESSAGE_TAG);
/// assert_eq!(storage.len(), 1);
/// assert_eq!(storage.errors().count(), 1);
///
/// let drained = storage.get_messages();
/// assert_eq!(drained[0].name.as_deref(), Some("login_id"));
/// assert!(storage.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageStorage {
    messages: Vec<Message>,
}

impl MessageStorage {
    /// Creates a new empty message storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn add(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends an error-level message about a field.
    pub fn add_error(&mut self, name: &str, text: &str, tag: &str) {
        self.add(Message::new(
            MessageLevel::Error,
            Some(name.to_string()),
            text,
            tag,
        ));
    }

    /// Drains and returns all stored messages.
    pub fn get_messages(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    /// Returns the stored messages without consuming them.
    pub fn peek_messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the error-level messages, in insertion order.
    pub fn errors(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| m.level == MessageLevel::Error)
    }

    /// Returns the messages carrying the given tag, in insertion order.
    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages.iter().filter(move |m| m.tag == tag)
    }

    /// Returns the messages recorded for the given field.
    pub fn for_field<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages
            .iter()
            .filter(move |m| m.name.as_deref() == Some(name))
    }

    /// Returns the number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no messages are stored.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Clears all stored messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_label() {
        assert_eq!(MessageLevel::Info.label(), "info");
        assert_eq!(MessageLevel::Error.to_string(), "error");
        assert!(MessageLevel::Error > MessageLevel::Warning);
    }

    #[test]
    fn test_order_preserved() {
        let mut storage = MessageStorage::new();
        storage.add_error("a", "first", MESSAGE_TAG);
        storage.add(Message::new(MessageLevel::Info, None, "note", "other"));
        storage.add_error("b", "second", MESSAGE_TAG);

        let texts: Vec<&str> = storage
            .peek_messages()
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(texts, vec!["first", "note", "second"]);
        assert_eq!(storage.errors().count(), 2);
    }

    #[test]
    fn test_with_tag_and_for_field() {
        let mut storage = MessageStorage::new();
        storage.add_error("a", "x", MESSAGE_TAG);
        storage.add_error("a", "y", "custom");
        storage.add_error("b", "z", MESSAGE_TAG);

        assert_eq!(storage.with_tag(MESSAGE_TAG).count(), 2);
        assert_eq!(storage.for_field("a").count(), 2);
        assert_eq!(storage.for_field("c").count(), 0);
    }

    #[test]
    fn test_drain_and_clear() {
        let mut storage = MessageStorage::new();
        storage.add_error("a", "x", MESSAGE_TAG);
        assert_eq!(storage.get_messages().len(), 1);
        assert!(storage.is_empty());

        storage.add_error("a", "x", MESSAGE_TAG);
        storage.clear();
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn test_message_serializes_level_lowercase() {
        let msg = Message::new(MessageLevel::Error, Some("a".into()), "bad", MESSAGE_TAG);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["tag"], "formmap");
    }
}
