use engine_config::settings::JobDefinition;
use serde_json::{Value as JsonValue, json};
use std::{fs, path::Path};

pub const NUMBERS_TABLE: &str = "NUMBERS";
pub const AUDIT_TABLE: &str = "AUDIT";

/// Mapping with a single integer column, used by every numbers job.
pub const NUMBERS_MAPPING: &str = r#"{
    "streams": [{
        "name": "numbers",
        "records": [{
            "name": "number",
            "fields": [{ "name": "value", "type": "integer" }]
        }]
    }]
}"#;

pub fn write_mapping(dir: &Path) {
    fs::write(dir.join("mapping.json"), NUMBERS_MAPPING).expect("write mapping");
}

/// Writes `1..=count` one per line.
pub fn write_numbers(dir: &Path, name: &str, count: u64) {
    write_lines(dir, name, (1..=count).map(|n| n.to_string()));
}

pub fn write_lines<I, S>(dir: &Path, name: &str, lines: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut body = String::new();
    for line in lines {
        body.push_str(line.as_ref());
        body.push('\n');
    }
    fs::write(dir.join(name), body).expect("write data file");
}

/// A step reading `file` into `table` with the numbers mapping.
pub fn numbers_step(name: &str, file: &str, table: &str, chunk_size: usize) -> JsonValue {
    json!({
        "name": name,
        "chunk_size": chunk_size,
        "reader": {
            "type": "delimited",
            "file": file,
            "stream": "numbers",
            "mapping": "mapping.json"
        },
        "writer": { "type": "table", "table": table, "columns": ["value"] }
    })
}

/// Sets a one-off write failure on a step's table writer.
pub fn fail_after(mut step: JsonValue, writes: u64) -> JsonValue {
    step["writer"]["fail_after_writes"] = json!(writes);
    step
}

pub fn job(name: &str, steps: Vec<JsonValue>) -> JsonValue {
    json!({
        "name": name,
        "required_parameters": [],
        "steps": steps
    })
}

pub fn definition(raw: JsonValue) -> JobDefinition {
    JobDefinition::from_json("test", &raw.to_string()).expect("valid job definition")
}
