use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

/// One item flowing from a record source to a record sink.
///
/// The chunk engine treats it as opaque; only sinks look at the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Name of the record definition the item was classified as.
    pub record_type: String,
    /// 1-based ordinal of the physical record in its stream.
    pub position: u64,
    pub fields: Vec<FieldValue>,
}

impl Record {
    pub fn new(record_type: impl Into<String>, position: u64, fields: Vec<FieldValue>) -> Self {
        Self {
            record_type: record_type.into(),
            position,
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn size_bytes(&self) -> usize {
        self.fields.iter().map(|f| f.value.size_bytes()).sum()
    }
}
