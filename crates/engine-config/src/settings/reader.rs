use crate::{error::ConfigError, substitution::PropertyResolver};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReaderSettings {
    /// Delimited text file described by a mapping document.
    Delimited {
        file: String,
        stream: String,
        mapping: String,
        #[serde(default)]
        encoding: Option<String>,
    },
}

impl ReaderSettings {
    pub fn resolve(&self, resolver: &PropertyResolver<'_>) -> Result<Self, ConfigError> {
        match self {
            ReaderSettings::Delimited {
                file,
                stream,
                mapping,
                encoding,
            } => Ok(ReaderSettings::Delimited {
                file: resolver.resolve(file)?,
                stream: resolver.resolve(stream)?,
                mapping: resolver.resolve(mapping)?,
                encoding: resolver.resolve_opt(encoding)?,
            }),
        }
    }
}
