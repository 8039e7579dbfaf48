pub mod chunk_source;
pub mod sequential_reader;
pub mod tokenizer;

pub use chunk_source::{ChunkLine, ChunkSource};
pub use sequential_reader::SequentialReader;
pub use tokenizer::{Field, FieldTokenizer, Fields, Token};
