use crate::file::delimited::error::SourceError;
use chrono::NaiveDate;
use model::core::{data_type::DataType, value::Value};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Mapping document describing one or more named record streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingFile {
    pub streams: Vec<StreamMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMapping {
    pub name: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// The first physical line is a header and is never counted as a record.
    #[serde(default)]
    pub header: bool,
    #[serde(default)]
    pub trim: bool,
    pub records: Vec<RecordMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMapping {
    pub name: String,
    #[serde(default)]
    pub identifier: Option<RecordIdentifier>,
    pub fields: Vec<FieldMapping>,
}

/// Classifies a record by the literal value of one of its columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordIdentifier {
    #[serde(default)]
    pub column: usize,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    pub name: String,
    #[serde(rename = "type", default = "default_type")]
    pub data_type: DataType,
    /// chrono format string for `date` fields.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub required: bool,
}

fn default_format() -> String {
    "delimited".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_type() -> DataType {
    DataType::String
}

impl MappingFile {
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| SourceError::InvalidMapping {
            location: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn stream(&self, name: &str) -> Option<&StreamMapping> {
        self.streams.iter().find(|s| s.name == name)
    }
}

impl StreamMapping {
    /// Checks the parts of the stream definition the reader depends on.
    pub fn validate(&self) -> Result<u8, SourceError> {
        if !matches!(self.format.to_ascii_lowercase().as_str(), "delimited" | "csv") {
            return Err(SourceError::Configuration(format!(
                "stream '{}' uses unsupported format '{}'",
                self.name, self.format
            )));
        }
        let delimiter = match self.delimiter.as_bytes() {
            [b] => *b,
            _ => {
                return Err(SourceError::Configuration(format!(
                    "stream '{}' delimiter must be a single byte, got '{}'",
                    self.name, self.delimiter
                )));
            }
        };
        if self.records.is_empty() {
            return Err(SourceError::Configuration(format!(
                "stream '{}' defines no records",
                self.name
            )));
        }
        Ok(delimiter)
    }

    /// Picks the record definition for a row: an identifier match wins,
    /// otherwise the first definition without an identifier.
    pub fn classify(&self, columns: &[String]) -> Option<&RecordMapping> {
        self.records
            .iter()
            .find(|r| {
                r.identifier
                    .as_ref()
                    .is_some_and(|id| columns.get(id.column) == Some(&id.value))
            })
            .or_else(|| self.records.iter().find(|r| r.identifier.is_none()))
    }
}

impl FieldMapping {
    /// Converts a raw cell into a typed value.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        if raw.is_empty() {
            return if self.required {
                Err(format!("field '{}' is required", self.name))
            } else {
                Ok(Value::Null)
            };
        }

        match self.data_type {
            DataType::String => Ok(Value::String(raw.to_string())),
            DataType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| format!("field '{}': '{raw}' is not an integer: {e}", self.name)),
            DataType::Decimal => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("field '{}': '{raw}' is not a decimal: {e}", self.name)),
            DataType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "y" => Ok(Value::Boolean(true)),
                "false" | "0" | "no" | "n" => Ok(Value::Boolean(false)),
                _ => Err(format!("field '{}': '{raw}' is not a boolean", self.name)),
            },
            DataType::Date => {
                let fmt = self.format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
                NaiveDate::parse_from_str(raw.trim(), fmt)
                    .map(Value::Date)
                    .map_err(|e| format!("field '{}': '{raw}' does not match '{fmt}': {e}", self.name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING: &str = r#"{
        "streams": [{
            "name": "reportStream",
            "header": true,
            "records": [
                { "name": "trailer", "identifier": { "value": "T" },
                  "fields": [ { "name": "tag" }, { "name": "count", "type": "integer" } ] },
                { "name": "report",
                  "fields": [
                    { "name": "date", "type": "date", "format": "%m/%d/%Y", "required": true },
                    { "name": "impressions", "type": "integer" },
                    { "name": "earning", "type": "decimal" }
                  ] }
            ]
        }]
    }"#;

    fn stream() -> StreamMapping {
        let mapping: MappingFile = serde_json::from_str(MAPPING).unwrap();
        mapping.stream("reportStream").unwrap().clone()
    }

    #[test]
    fn defaults_apply() {
        let stream = stream();
        assert_eq!(stream.validate().unwrap(), b',');
        assert!(stream.header);
        assert_eq!(stream.records[0].fields[0].data_type, DataType::String);
    }

    #[test]
    fn classifies_by_identifier_then_fallback() {
        let stream = stream();
        let trailer = vec!["T".to_string(), "3".to_string()];
        let row = vec!["01/02/2024".to_string(), "10".to_string(), "1.5".to_string()];

        assert_eq!(stream.classify(&trailer).unwrap().name, "trailer");
        assert_eq!(stream.classify(&row).unwrap().name, "report");
    }

    #[test]
    fn no_fallback_means_unidentified() {
        let mut stream = stream();
        stream.records.retain(|r| r.identifier.is_some());
        assert!(stream.classify(&["X".to_string()]).is_none());
    }

    #[test]
    fn parses_typed_fields() {
        let stream = stream();
        let fields = &stream.records[1].fields;

        assert_eq!(
            fields[0].parse("01/02/2024").unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
        assert_eq!(fields[1].parse("42").unwrap(), Value::Int(42));
        assert_eq!(fields[2].parse("").unwrap(), Value::Null);
        assert!(fields[0].parse("").is_err());
        assert!(fields[1].parse("many").is_err());
    }

    #[test]
    fn rejects_multi_byte_delimiter() {
        let mut stream = stream();
        stream.delimiter = "||".to_string();
        assert!(matches!(
            stream.validate(),
            Err(SourceError::Configuration(_))
        ));
    }
}
