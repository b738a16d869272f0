//! Attribute-keyed error collector

use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Ordered mapping from attribute name to error messages
///
/// Attributes keep the order in which their first message was added.
/// Empty messages are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors {
    entries: Vec<(String, Vec<String>)>,
}

impl Errors {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append a message for an attribute
    pub fn add(&mut self, attribute: &str, message: impl Into<String>) {
        let message = message.into();
        if message.trim().is_empty() {
            return;
        }

        match self.entries.iter_mut().find(|(name, _)| name == attribute) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((attribute.to_string(), vec![message])),
        }
    }

    /// Messages recorded for an attribute (empty when none)
    pub fn get(&self, attribute: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, messages)| messages.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of messages across all attributes
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, messages)| messages.len()).sum()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// "attribute message" strings in insertion order
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(name, messages)| {
                messages.iter().map(move |message| format!("{} {}", name, message))
            })
            .collect()
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        for (name, messages) in self.iter() {
            map.insert(
                name.to_string(),
                JsonValue::Array(messages.iter().cloned().map(JsonValue::String).collect()),
            );
        }
        JsonValue::Object(map)
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_messages().join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_grouped_by_attribute_in_insertion_order() {
        let mut errors = Errors::new();
        errors.add("name", "is required");
        errors.add("age", "must be an Integer");
        errors.add("name", "must not be blank");

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.attributes().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(errors.get("name"), ["is required", "must not be blank"]);
        assert!(errors.get("missing").is_empty());
    }

    #[test]
    fn test_blank_messages_are_dropped() {
        let mut errors = Errors::new();
        errors.add("name", "");
        errors.add("name", "   ");
        assert!(errors.is_empty());
        assert!(!errors.contains("name"));
    }

    #[test]
    fn test_clear_and_json_view() {
        let mut errors = Errors::new();
        errors.add("name", "is required");
        assert_eq!(errors.to_json(), serde_json::json!({ "name": ["is required"] }));
        assert_eq!(errors.to_string(), "name is required");

        errors.clear();
        assert!(errors.is_empty());
        assert_eq!(errors.to_json(), serde_json::json!({}));
    }
}
