use connectors::{
    file::delimited::{
        error::SourceError,
        source::{DelimitedFileSource, DelimitedSourceSettings},
    },
    source::RecordSource,
};
use model::{execution::checkpoint::StepCheckpoint, records::record::Record};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
}

impl Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Delimited => write!(f, "delimited"),
        }
    }
}

/// The record sources a step can read from.
pub enum Source {
    Delimited(DelimitedFileSource),
}

impl Source {
    pub fn delimited(settings: DelimitedSourceSettings) -> Self {
        Source::Delimited(DelimitedFileSource::new(settings))
    }

    pub fn format(&self) -> SourceFormat {
        match self {
            Source::Delimited(_) => SourceFormat::Delimited,
        }
    }
}

impl RecordSource for Source {
    fn open(&mut self, resume: Option<StepCheckpoint>) -> Result<(), SourceError> {
        match self {
            Source::Delimited(src) => src.open(resume),
        }
    }

    fn read_next(&mut self) -> Result<Option<Record>, SourceError> {
        match self {
            Source::Delimited(src) => src.read_next(),
        }
    }

    fn checkpoint(&self) -> StepCheckpoint {
        match self {
            Source::Delimited(src) => src.checkpoint(),
        }
    }

    fn close(&mut self) -> Result<(), SourceError> {
        match self {
            Source::Delimited(src) => src.close(),
        }
    }
}
