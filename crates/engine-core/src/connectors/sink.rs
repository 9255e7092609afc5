use async_trait::async_trait;
use connectors::sink::{RecordSink, error::SinkError, log::LogSink, table::TableSink};
use model::records::record::Record;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Table,
    Log,
}

impl Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkKind::Table => write!(f, "table"),
            SinkKind::Log => write!(f, "log"),
        }
    }
}

/// The record sinks a step can write to.
pub enum Sink {
    Table(TableSink),
    Log(LogSink),
}

impl Sink {
    pub fn kind(&self) -> SinkKind {
        match self {
            Sink::Table(_) => SinkKind::Table,
            Sink::Log(_) => SinkKind::Log,
        }
    }
}

#[async_trait]
impl RecordSink for Sink {
    async fn write_chunk(&mut self, records: &[Record]) -> Result<(), SinkError> {
        match self {
            Sink::Table(sink) => sink.write_chunk(records).await,
            Sink::Log(sink) => sink.write_chunk(records).await,
        }
    }

    fn close(&mut self) -> Result<(), SinkError> {
        match self {
            Sink::Table(sink) => sink.close(),
            Sink::Log(sink) => sink.close(),
        }
    }
}
