use crate::error::CliError;
use model::execution::parameters::{JobParameters, ParameterPair};
use std::{fs, path::Path};

/// Builds job parameters from an optional KEY=VALUE file and command-line
/// pairs. Command-line pairs win.
pub fn collect(file: Option<&Path>, pairs: &[ParameterPair]) -> Result<JobParameters, CliError> {
    let mut params = match file {
        Some(path) => load_file(path)?,
        None => JobParameters::new(),
    };
    for ParameterPair(key, value) in pairs {
        params.insert(key.clone(), value.clone());
    }
    Ok(params)
}

fn load_file(path: &Path) -> Result<JobParameters, CliError> {
    let content = fs::read_to_string(path).map_err(|e| {
        CliError::Parameters(format!(
            "Failed to read parameter file {}: {e}",
            path.display()
        ))
    })?;
    parse_content(&content)
}

fn parse_content(content: &str) -> Result<JobParameters, CliError> {
    let mut params = JobParameters::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let ParameterPair(key, value) = line.parse::<ParameterPair>().map_err(|e| {
            CliError::Parameters(format!("line {}: {e}", line_num + 1))
        })?;
        params.insert(key, unquote(value.trim()));
    }
    Ok(params)
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}
