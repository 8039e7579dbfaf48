use crate::error::Result;
use crate::utils::constants::{
    CONFIG_ENV_PREFIX, DEFAULT_BUFFER_SIZE, DEFAULT_DELIMITER, DEFAULT_TERMINATOR,
    MAX_FIELD_LENGTH,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::{Validate, ValidationError};

/// Settings shared by the concurrent orchestrator and the sequential fast path.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_record_layout"))]
pub struct ProcessorConfig {
    /// Number of chunk sources (one file cursor each)
    #[validate(range(min = 1, max = 1024))]
    pub workers: usize,

    #[validate(custom(function = "validate_single_byte"))]
    pub delimiter: char,

    #[validate(custom(function = "validate_single_byte"))]
    pub terminator: char,

    /// Longer fields are truncated to this many bytes
    #[validate(range(min = 1))]
    pub max_field_len: usize,

    /// Keep every observed value instead of running min/max/sum/count
    pub retain_series: bool,

    /// Read buffer for the sequential reader
    #[validate(range(min = 1))]
    pub buffer_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            delimiter: DEFAULT_DELIMITER as char,
            terminator: DEFAULT_TERMINATOR as char,
            max_field_len: MAX_FIELD_LENGTH,
            retain_series: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ProcessorConfig {
    /// Layer defaults, an optional config file and `BRC_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("workers", defaults.workers as u64)?
            .set_default("delimiter", defaults.delimiter.to_string())?
            .set_default("terminator", defaults.terminator.to_string())?
            .set_default("max_field_len", defaults.max_field_len as u64)?
            .set_default("retain_series", defaults.retain_series)?
            .set_default("buffer_size", defaults.buffer_size as u64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_retain_series(mut self, retain_series: bool) -> Self {
        self.retain_series = retain_series;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_max_field_len(mut self, max_field_len: usize) -> Self {
        self.max_field_len = max_field_len;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    // Both are validated as ASCII, so the narrowing cast is lossless.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn terminator_byte(&self) -> u8 {
        self.terminator as u8
    }
}

fn validate_single_byte(value: &char) -> std::result::Result<(), ValidationError> {
    if value.is_ascii() {
        Ok(())
    } else {
        Err(ValidationError::new("single_byte"))
    }
}

fn validate_record_layout(config: &ProcessorConfig) -> std::result::Result<(), ValidationError> {
    if config.delimiter == config.terminator {
        return Err(ValidationError::new("delimiter_equals_terminator"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_default_config_is_valid() {
        let config = ProcessorConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.delimiter_byte(), b';');
        assert_eq!(config.terminator_byte(), b'\n');
        assert_eq!(config.max_field_len, 100);
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let config = ProcessorConfig::default().with_workers(0);
        assert!(config.validate().is_err());

        let config = ProcessorConfig::default().with_delimiter('\n');
        assert!(config.validate().is_err());

        let config = ProcessorConfig::default().with_delimiter('§');
        assert!(config.validate().is_err());

        let config = ProcessorConfig::default().with_max_field_len(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "workers = 3")?;
        writeln!(file, "delimiter = \",\"")?;
        writeln!(file, "retain_series = true")?;

        let config = ProcessorConfig::load(Some(file.path()))?;

        assert_eq!(config.workers, 3);
        assert_eq!(config.delimiter_byte(), b',');
        assert!(config.retain_series);
        assert_eq!(config.max_field_len, 100);

        Ok(())
    }
}
