//! Snippet payload produced by one sweep

use std::collections::BTreeMap;

use serde::Serialize;

/// Snippet id to freshly rendered fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, String>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: String, fragment: String) {
        log::debug!("payload snippet '{}' ({} bytes)", id, fragment.len());
        self.0.insert(id, fragment);
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_plain_map() {
        let mut payload = Payload::new();
        payload.insert("snip-content".to_string(), "<p>hi</p>".to_string());
        let toml = toml::to_string(&payload).unwrap();
        assert_eq!(toml, "snip-content = \"<p>hi</p>\"\n");
    }

    #[test]
    fn test_later_insert_replaces() {
        let mut payload = Payload::new();
        payload.insert("a".to_string(), "1".to_string());
        payload.insert("a".to_string(), "2".to_string());
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.get("a"), Some("2"));
    }
}
