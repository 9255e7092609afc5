use crate::{
    file::delimited::{
        encoding::Encoding,
        error::SourceError,
        mapping::{MappingFile, StreamMapping},
    },
    resource,
    source::RecordSource,
};
use model::{
    core::value::FieldValue, execution::checkpoint::StepCheckpoint, records::record::Record,
};
use std::{fs::File, path::PathBuf};
use tracing::{debug, info};

/// Settings for [`DelimitedFileSource`]. Every location may be a direct path
/// or a path relative to one of `resource_roots`.
#[derive(Debug, Clone, Default)]
pub struct DelimitedSourceSettings {
    pub file_path: Option<String>,
    pub stream_name: Option<String>,
    pub mapping_file: Option<String>,
    pub encoding: Option<String>,
    pub resource_roots: Vec<PathBuf>,
}

/// Reads typed records from a delimited text file described by a mapping file.
pub struct DelimitedFileSource {
    settings: DelimitedSourceSettings,
    reader: Option<csv::Reader<File>>,
    stream: Option<StreamMapping>,
    encoding: Encoding,
    buffer: csv::ByteRecord,
    /// Physical records consumed, including the resume offset.
    consumed: u64,
}

impl DelimitedFileSource {
    pub fn new(settings: DelimitedSourceSettings) -> Self {
        Self {
            settings,
            reader: None,
            stream: None,
            encoding: Encoding::default(),
            buffer: csv::ByteRecord::new(),
            consumed: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn required<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str, SourceError> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(SourceError::Configuration(format!("{what} cannot be empty"))),
        }
    }

    fn locate(&self, location: &str, kind: &'static str) -> Result<PathBuf, SourceError> {
        resource::resolve(location, &self.settings.resource_roots).ok_or_else(|| {
            SourceError::ResourceNotFound {
                kind,
                location: location.to_string(),
            }
        })
    }

    /// Pulls the next physical record into `self.buffer`. Returns false at end of stream.
    fn advance(&mut self) -> Result<bool, SourceError> {
        let reader = self.reader.as_mut().ok_or(SourceError::NotOpen)?;
        Ok(reader.read_byte_record(&mut self.buffer)?)
    }

    fn decode_columns(&self, position: u64) -> Result<Vec<String>, SourceError> {
        self.buffer
            .iter()
            .map(|cell| self.encoding.decode(cell))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| SourceError::MalformedRecord { position, reason })
    }

    fn to_record(&self, position: u64) -> Result<Record, SourceError> {
        let stream = self.stream.as_ref().ok_or(SourceError::NotOpen)?;
        let columns = self.decode_columns(position)?;

        let mapping = stream
            .classify(&columns)
            .ok_or_else(|| SourceError::UnidentifiedRecord {
                position,
                reason: format!(
                    "no record definition in stream '{}' matches {:?}",
                    stream.name,
                    columns.first()
                ),
            })?;

        if columns.len() != mapping.fields.len() {
            return Err(SourceError::MalformedRecord {
                position,
                reason: format!(
                    "record '{}' expects {} fields, found {}",
                    mapping.name,
                    mapping.fields.len(),
                    columns.len()
                ),
            });
        }

        let fields = mapping
            .fields
            .iter()
            .zip(columns.iter())
            .map(|(field, raw)| {
                field
                    .parse(raw)
                    .map(|value| FieldValue::new(field.name.clone(), value))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| SourceError::MalformedRecord { position, reason })?;

        Ok(Record::new(mapping.name.clone(), position, fields))
    }
}

impl RecordSource for DelimitedFileSource {
    fn open(&mut self, resume: Option<StepCheckpoint>) -> Result<(), SourceError> {
        self.close()?;

        // Configuration is validated before touching the filesystem.
        let file_path = Self::required(&self.settings.file_path, "File path")?.to_string();
        let stream_name = Self::required(&self.settings.stream_name, "Stream name")?.to_string();
        let mapping_path = Self::required(&self.settings.mapping_file, "Mapping file")?.to_string();
        let encoding = match self.settings.encoding.as_deref() {
            Some(name) => name.parse::<Encoding>().map_err(SourceError::Configuration)?,
            None => Encoding::default(),
        };

        let data_file = self.locate(&file_path, "file")?;
        let mapping_file = self.locate(&mapping_path, "mapping file")?;

        let mapping = MappingFile::load(&mapping_file)?;
        let stream = mapping.stream(&stream_name).cloned().ok_or_else(|| {
            SourceError::Configuration(format!(
                "stream '{stream_name}' is not defined in {}",
                mapping_file.display()
            ))
        })?;
        let delimiter = stream.validate()?;

        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(if stream.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .from_reader(File::open(&data_file)?);

        let header = stream.header;
        self.reader = Some(reader);
        self.stream = Some(stream);
        self.encoding = encoding;
        self.consumed = 0;

        if header {
            self.advance()?;
        }

        if let Some(resume) = resume {
            let requested = resume.items();
            while self.consumed < requested {
                if !self.advance()? {
                    let skipped = self.consumed;
                    self.close()?;
                    return Err(SourceError::CheckpointMismatch { requested, skipped });
                }
                self.consumed += 1;
            }
            debug!(skipped = requested, "Skipped records to resume position");
        }

        info!(
            file = %data_file.display(),
            stream = %stream_name,
            resume = self.consumed,
            "Opened delimited source"
        );
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<Record>, SourceError> {
        if !self.advance()? {
            return Ok(None);
        }
        // The physical record is consumed even when it fails to map.
        self.consumed += 1;
        self.to_record(self.consumed).map(Some)
    }

    fn checkpoint(&self) -> StepCheckpoint {
        StepCheckpoint::new(self.consumed)
    }

    fn close(&mut self) -> Result<(), SourceError> {
        if self.reader.take().is_some() {
            debug!(consumed = self.consumed, "Closed delimited source");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::Value;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const MAPPING: &str = r#"{
        "streams": [{
            "name": "reportStream",
            "header": true,
            "records": [{
                "name": "report",
                "fields": [
                    { "name": "date", "type": "date" },
                    { "name": "clicks", "type": "integer" }
                ]
            }]
        }]
    }"#;

    fn fixture(rows: &[&str]) -> (TempDir, DelimitedSourceSettings) {
        let dir = tempdir().unwrap();
        let mut body = String::from("date,clicks\n");
        for row in rows {
            body.push_str(row);
            body.push('\n');
        }
        fs::write(dir.path().join("report.csv"), body).unwrap();
        fs::write(dir.path().join("mapping.json"), MAPPING).unwrap();

        let settings = DelimitedSourceSettings {
            file_path: Some("report.csv".into()),
            stream_name: Some("reportStream".into()),
            mapping_file: Some("mapping.json".into()),
            encoding: None,
            resource_roots: vec![dir.path().to_path_buf()],
        };
        (dir, settings)
    }

    fn clicks(record: &Record) -> i64 {
        match record.get_value("clicks") {
            Value::Int(v) => v,
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn reads_all_records_then_end() {
        let (_dir, settings) = fixture(&["2024-01-01,1", "2024-01-02,2"]);
        let mut source = DelimitedFileSource::new(settings);
        source.open(None).unwrap();

        let first = source.read_next().unwrap().unwrap();
        assert_eq!(first.position, 1);
        assert_eq!(clicks(&first), 1);
        assert_eq!(source.checkpoint().items(), 1);

        assert_eq!(clicks(&source.read_next().unwrap().unwrap()), 2);
        assert!(source.read_next().unwrap().is_none());
        assert_eq!(source.checkpoint().items(), 2);
    }

    #[test]
    fn missing_settings_fail_before_io() {
        let (_dir, mut settings) = fixture(&[]);
        settings.stream_name = None;
        let err = DelimitedFileSource::new(settings).open(None).unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));

        let mut settings = fixture(&[]).1;
        settings.file_path = Some("  ".into());
        let err = DelimitedFileSource::new(settings).open(None).unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));
    }

    #[test]
    fn unresolvable_locations_are_not_found() {
        let (_dir, mut settings) = fixture(&[]);
        settings.file_path = Some("absent.csv".into());
        let err = DelimitedFileSource::new(settings).open(None).unwrap_err();
        assert!(matches!(err, SourceError::ResourceNotFound { kind: "file", .. }));

        let (_dir, mut settings) = fixture(&[]);
        settings.mapping_file = Some("absent.json".into());
        let err = DelimitedFileSource::new(settings).open(None).unwrap_err();
        assert!(matches!(
            err,
            SourceError::ResourceNotFound {
                kind: "mapping file",
                ..
            }
        ));
    }

    #[test]
    fn resume_returns_the_next_record_first() {
        let (_dir, settings) = fixture(&["2024-01-01,1", "2024-01-02,2", "2024-01-03,3"]);
        let mut source = DelimitedFileSource::new(settings);
        source.open(Some(StepCheckpoint::new(2))).unwrap();

        assert_eq!(source.checkpoint().items(), 2);
        let next = source.read_next().unwrap().unwrap();
        assert_eq!(next.position, 3);
        assert_eq!(clicks(&next), 3);
    }

    #[test]
    fn resume_at_exact_end_is_allowed() {
        let (_dir, settings) = fixture(&["2024-01-01,1", "2024-01-02,2"]);
        let mut source = DelimitedFileSource::new(settings);
        source.open(Some(StepCheckpoint::new(2))).unwrap();
        assert!(source.read_next().unwrap().is_none());
    }

    #[test]
    fn resume_beyond_end_is_a_mismatch() {
        let (_dir, settings) = fixture(&["2024-01-01,1", "2024-01-02,2"]);
        let mut source = DelimitedFileSource::new(settings);
        let err = source.open(Some(StepCheckpoint::new(3))).unwrap_err();
        assert!(matches!(
            err,
            SourceError::CheckpointMismatch {
                requested: 3,
                skipped: 2
            }
        ));
        assert!(!source.is_open());
    }

    #[test]
    fn malformed_record_keeps_position_consistent() {
        let (_dir, settings) = fixture(&["2024-01-01,1", "not-a-date,2", "2024-01-03,3"]);
        let mut source = DelimitedFileSource::new(settings);
        source.open(None).unwrap();

        source.read_next().unwrap();
        let err = source.read_next().unwrap_err();
        assert!(matches!(err, SourceError::MalformedRecord { position: 2, .. }));
        assert!(err.is_record_level());

        let next = source.read_next().unwrap().unwrap();
        assert_eq!(next.position, 3);
        assert_eq!(source.checkpoint().items(), 3);
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let (_dir, settings) = fixture(&["2024-01-01,1,extra"]);
        let mut source = DelimitedFileSource::new(settings);
        source.open(None).unwrap();
        assert!(matches!(
            source.read_next(),
            Err(SourceError::MalformedRecord { position: 1, .. })
        ));
    }

    #[test]
    fn close_is_idempotent_and_safe_without_open() {
        let (_dir, settings) = fixture(&["2024-01-01,1"]);
        let mut source = DelimitedFileSource::new(settings);
        source.close().unwrap();

        source.open(None).unwrap();
        source.close().unwrap();
        source.close().unwrap();
        assert!(matches!(source.read_next(), Err(SourceError::NotOpen)));
    }
}
