use crate::error::ConfigError;
use model::execution::{parameters::JobParameters, partition::PartitionProperties};

/// Resolves `${name}` references against partition properties, then job parameters.
pub struct PropertyResolver<'a> {
    partition: &'a PartitionProperties,
    parameters: &'a JobParameters,
}

impl<'a> PropertyResolver<'a> {
    pub fn new(partition: &'a PartitionProperties, parameters: &'a JobParameters) -> Self {
        Self {
            partition,
            parameters,
        }
    }

    fn lookup(&self, name: &str) -> Option<&'a str> {
        self.partition
            .get(name)
            .map(String::as_str)
            .or_else(|| self.parameters.get(name))
    }

    /// Replaces every `${name}` in `input`. `$$` escapes a literal `$`.
    pub fn resolve(&self, input: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(idx) = rest.find('$') {
            out.push_str(&rest[..idx]);
            let tail = &rest[idx + 1..];

            if let Some(after) = tail.strip_prefix('$') {
                out.push('$');
                rest = after;
            } else if let Some(body) = tail.strip_prefix('{') {
                let end = body
                    .find('}')
                    .ok_or_else(|| ConfigError::UnterminatedPlaceholder(input.to_string()))?;
                let name = body[..end].trim();
                let value =
                    self.lookup(name)
                        .ok_or_else(|| ConfigError::UnresolvedPlaceholder {
                            placeholder: name.to_string(),
                            input: input.to_string(),
                        })?;
                out.push_str(value);
                rest = &body[end + 1..];
            } else {
                out.push('$');
                rest = tail;
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    pub fn resolve_opt(&self, input: &Option<String>) -> Result<Option<String>, ConfigError> {
        input.as_deref().map(|s| self.resolve(s)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> JobParameters {
        JobParameters::new()
            .with("date", "2024-01-01")
            .with("region", "eu")
    }

    #[test]
    fn partition_properties_win_over_parameters() {
        let mut partition = PartitionProperties::new();
        partition.insert("region".into(), "us".into());
        let params = params();
        let resolver = PropertyResolver::new(&partition, &params);

        assert_eq!(
            resolver.resolve("data/${region}/${date}.csv").unwrap(),
            "data/us/2024-01-01.csv"
        );
    }

    #[test]
    fn plain_text_and_escapes_pass_through() {
        let partition = PartitionProperties::new();
        let params = params();
        let resolver = PropertyResolver::new(&partition, &params);

        assert_eq!(resolver.resolve("report.csv").unwrap(), "report.csv");
        assert_eq!(resolver.resolve("cost$$5").unwrap(), "cost$5");
        assert_eq!(resolver.resolve("a$b").unwrap(), "a$b");
    }

    #[test]
    fn unknown_or_unterminated_references_fail() {
        let partition = PartitionProperties::new();
        let params = params();
        let resolver = PropertyResolver::new(&partition, &params);

        assert!(matches!(
            resolver.resolve("${missing}.csv"),
            Err(ConfigError::UnresolvedPlaceholder { placeholder, .. }) if placeholder == "missing"
        ));
        assert!(matches!(
            resolver.resolve("${date"),
            Err(ConfigError::UnterminatedPlaceholder(_))
        ));
    }
}
