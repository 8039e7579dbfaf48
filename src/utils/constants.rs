/// Record layout
pub const DEFAULT_DELIMITER: u8 = b';';
pub const DEFAULT_TERMINATOR: u8 = b'\n';
pub const MAX_FIELD_LENGTH: usize = 100;

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const MAX_STORED_DIAGNOSTICS: usize = 1000;

/// Environment prefix for configuration overrides (BRC_WORKERS, ...)
pub const CONFIG_ENV_PREFIX: &str = "BRC";

/// Report output
pub const REPORT_FILE_PREFIX: &str = "brc-report";
pub const FORMAT_TEXT: &str = "text";
pub const FORMAT_JSON: &str = "json";
pub const FORMAT_CSV: &str = "csv";
