use crate::models::truncate_field;
use crate::utils::ProcessorConfig;

/// Splits raw bytes into fields on a delimiter or record terminator.
///
/// Tokens borrow the caller's buffer; nothing is copied or allocated.
#[derive(Debug, Clone, Copy)]
pub struct FieldTokenizer {
    delimiter: u8,
    terminator: u8,
    max_field_len: usize,
}

/// One field and how far the caller should advance past it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field<'a> {
    pub bytes: &'a [u8],
    pub consumed: usize,
    /// Ended by the terminator (or end of file) rather than the delimiter
    pub ends_record: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    Field(Field<'a>),
    /// No delimiter or terminator before the end of a non-final buffer
    NeedMoreData,
    /// Final buffer exhausted
    Finished,
}

impl FieldTokenizer {
    pub fn new(delimiter: u8, terminator: u8, max_field_len: usize) -> Self {
        Self {
            delimiter,
            terminator,
            max_field_len,
        }
    }

    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self::new(
            config.delimiter_byte(),
            config.terminator_byte(),
            config.max_field_len,
        )
    }

    /// Scan the next token from the start of `data`.
    ///
    /// When `at_eof` is set, trailing bytes without a delimiter or terminator
    /// still form a final field.
    pub fn next_token<'a>(&self, data: &'a [u8], at_eof: bool) -> Token<'a> {
        let boundary = data
            .iter()
            .position(|&b| b == self.delimiter || b == self.terminator);

        match boundary {
            Some(pos) => Token::Field(Field {
                bytes: truncate_field(&data[..pos], self.max_field_len),
                consumed: pos + 1,
                ends_record: data[pos] == self.terminator,
            }),
            None if !at_eof => Token::NeedMoreData,
            None if data.is_empty() => Token::Finished,
            None => Token::Field(Field {
                bytes: truncate_field(data, self.max_field_len),
                consumed: data.len(),
                ends_record: true,
            }),
        }
    }

    /// Lazy field sequence over a complete buffer.
    pub fn fields<'a>(&self, data: &'a [u8]) -> Fields<'a> {
        Fields {
            tokenizer: *self,
            remaining: data,
        }
    }
}

impl Default for FieldTokenizer {
    fn default() -> Self {
        Self::from_config(&ProcessorConfig::default())
    }
}

pub struct Fields<'a> {
    tokenizer: FieldTokenizer,
    remaining: &'a [u8],
}

impl<'a> Iterator for Fields<'a> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.tokenizer.next_token(self.remaining, true) {
            Token::Field(field) => {
                self.remaining = &self.remaining[field.consumed..];
                Some(field)
            }
            Token::NeedMoreData | Token::Finished => None,
        }
    }
}
