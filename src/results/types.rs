//! Result type definitions

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field value
///
/// Only the `Size` column is ever coerced to an integer; everything else
/// stays as the text es printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(u64),
    Text(String),
}

impl FieldValue {
    /// Text content, if this is a text field
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }

    /// Integer content, if this field was coerced
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        Self::Integer(n)
    }
}

/// One matched file or folder: column name to value, in header order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRecord {
    fields: Vec<(String, FieldValue)>,
}

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Columns keep insertion order.
    pub fn insert(&mut self, column: impl Into<String>, value: FieldValue) {
        self.fields.push((column.into(), value));
    }

    /// Look up a column by name
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in header order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Values in header order
    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'a> FromIterator<(&'a str, FieldValue)> for ResultRecord {
    fn from_iter<I: IntoIterator<Item = (&'a str, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

/// Ordered records, in the order es returned them
pub type ResultSet = Vec<ResultRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_in_header_order() {
        let record: ResultRecord = [
            ("Name", FieldValue::from("b.txt")),
            ("Size", FieldValue::from(12)),
            ("Attributes", FieldValue::from("A")),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Name":"b.txt","Size":12,"Attributes":"A"}"#);
    }

    #[test]
    fn test_record_lookup() {
        let mut record = ResultRecord::new();
        record.insert("Filename", FieldValue::from("C:\\a.txt"));
        record.insert("Size", FieldValue::from(1024));

        assert_eq!(record.get("Size").and_then(FieldValue::as_u64), Some(1024));
        assert_eq!(
            record.get("Filename").and_then(FieldValue::as_str),
            Some("C:\\a.txt")
        );
        assert!(record.get("Path").is_none());
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["Filename", "Size"]);
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::from(7).to_string(), "7");
        assert_eq!(FieldValue::from("abc").to_string(), "abc");
    }
}
