//! Common types and utilities for the AccelByte API

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Percent-encodes one path segment
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// A list of strings that remembers whether it was given at all
///
/// The services omit or null out lists they have no entries for. Requests
/// always carry an explicit (possibly empty) array so that clearing a list is
/// distinguishable from leaving it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListField {
    #[default]
    Unspecified,
    Empty,
    Populated(Vec<String>),
}

impl ListField {
    pub fn from_items(items: Vec<String>) -> Self {
        if items.is_empty() {
            ListField::Empty
        } else {
            ListField::Populated(items)
        }
    }

    pub fn is_specified(&self) -> bool {
        !matches!(self, ListField::Unspecified)
    }

    /// Entries in order; unspecified reads as empty
    pub fn items(&self) -> &[String] {
        match self {
            ListField::Populated(items) => items,
            ListField::Unspecified | ListField::Empty => &[],
        }
    }

    pub fn into_items(self) -> Vec<String> {
        match self {
            ListField::Populated(items) => items,
            ListField::Unspecified | ListField::Empty => Vec::new(),
        }
    }
}

impl From<Vec<String>> for ListField {
    fn from(items: Vec<String>) -> Self {
        Self::from_items(items)
    }
}

impl Serialize for ListField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.items().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ListField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Vec<String>>::deserialize(deserializer)? {
            None => ListField::Unspecified,
            Some(items) => ListField::from_items(items),
        })
    }
}
