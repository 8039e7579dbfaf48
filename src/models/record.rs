use crate::error::RecordError;

/// One `station;value` pair borrowed from an input line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record<'a> {
    pub station: &'a [u8],
    pub value: f32,
}

impl<'a> Record<'a> {
    /// Split a line (terminator already stripped) into station and value.
    ///
    /// Exactly two fields are required. The station is truncated to
    /// `max_field_len` bytes.
    pub fn parse(
        line: &'a [u8],
        delimiter: u8,
        max_field_len: usize,
    ) -> std::result::Result<Self, RecordError> {
        let mut fields = line.split(|&b| b == delimiter);

        let (station, value) = match (fields.next(), fields.next()) {
            (Some(station), Some(value)) => (station, value),
            _ => return Err(RecordError::FieldCount { found: 1 }),
        };

        let extra = fields.count();
        if extra > 0 {
            return Err(RecordError::FieldCount { found: 2 + extra });
        }

        Ok(Self {
            station: truncate_field(station, max_field_len),
            value: parse_measurement(value)?,
        })
    }
}

/// Cut a field to at most `max_field_len` bytes without splitting a UTF-8
/// character, so names that agree up to the limit share one key.
pub fn truncate_field(field: &[u8], max_field_len: usize) -> &[u8] {
    if field.len() <= max_field_len {
        return field;
    }

    // At most three continuation bytes follow a lead byte
    let mut end = max_field_len;
    while end > 0 && max_field_len - end < 3 && is_continuation(field[end]) {
        end -= 1;
    }
    if is_continuation(field[end]) {
        end = max_field_len;
    }

    &field[..end]
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Parse a measurement field as single precision.
pub fn parse_measurement(bytes: &[u8]) -> std::result::Result<f32, RecordError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|text| text.parse::<f32>().ok())
        .ok_or_else(|| RecordError::InvalidMeasurement {
            text: String::from_utf8_lossy(bytes).into_owned(),
        })
}
