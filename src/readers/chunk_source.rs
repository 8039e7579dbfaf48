use crate::error::{ProcessingError, Result};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::Mutex;

/// Independent reader over the input file with its own cursor.
pub struct ChunkSource {
    worker: usize,
    terminator: u8,
    reader: Mutex<BufReader<File>>,
}

/// A line without its terminator, plus the bytes it occupied in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkLine {
    pub bytes: Vec<u8>,
    pub consumed: u64,
}

impl ChunkSource {
    pub async fn open(path: &Path, worker: usize, terminator: u8) -> Result<Self> {
        let file = File::open(path)
            .await
            .map_err(|source| ProcessingError::InputUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            worker,
            terminator,
            reader: Mutex::new(BufReader::new(file)),
        })
    }

    /// Move the cursor to `offset`. Offsets past the end of the file are
    /// accepted; the next read then reports no data.
    pub async fn set_position(&self, offset: u64) -> Result<()> {
        let mut reader = self.reader.lock().await;
        // Seeking a BufReader discards its buffer, so the next read starts
        // exactly at `offset`.
        reader
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(|source| ProcessingError::Seek {
                worker: self.worker,
                offset,
                source,
            })?;
        Ok(())
    }

    /// Read up to and past the next terminator. `None` at end of file.
    pub async fn read_line(&self) -> Result<Option<ChunkLine>> {
        let mut reader = self.reader.lock().await;
        let mut bytes = Vec::new();

        let consumed = reader.read_until(self.terminator, &mut bytes).await?;
        if consumed == 0 {
            return Ok(None);
        }

        if bytes.last() == Some(&self.terminator) {
            bytes.pop();
        }

        Ok(Some(ChunkLine {
            bytes,
            consumed: consumed as u64,
        }))
    }

    /// Release the file handle.
    pub fn close(self) {
        tracing::trace!(worker = self.worker, "Closed chunk source");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn example_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Tokyo;10\nTokyo;20\nParis;5\n").unwrap();
        file
    }

    #[tokio::test]
    async fn test_read_first_line() -> Result<()> {
        let file = example_file();
        let source = ChunkSource::open(file.path(), 0, b'\n').await?;

        let line = source.read_line().await?.expect("first line");
        assert_eq!(line.bytes, b"Tokyo;10");
        assert_eq!(line.consumed, 9);

        source.close();
        Ok(())
    }

    #[tokio::test]
    async fn test_set_position_to_second_line() -> Result<()> {
        let file = example_file();
        let source = ChunkSource::open(file.path(), 0, b'\n').await?;

        source.set_position(9).await?;
        let line = source.read_line().await?.expect("second line");
        assert_eq!(line.bytes, b"Tokyo;20");

        // Repositioning after a read must not reuse buffered bytes
        source.set_position(0).await?;
        let line = source.read_line().await?.expect("first line again");
        assert_eq!(line.bytes, b"Tokyo;10");

        Ok(())
    }

    #[tokio::test]
    async fn test_position_beyond_end_reports_no_data() -> Result<()> {
        let file = example_file();
        let source = ChunkSource::open(file.path(), 0, b'\n').await?;

        source.set_position(1000).await?;
        assert!(source.read_line().await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_last_line_without_terminator() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "Oslo;-3\nLima;19")?;

        let source = ChunkSource::open(file.path(), 0, b'\n').await?;
        source.set_position(8).await?;

        let line = source.read_line().await?.expect("final line");
        assert_eq!(line.bytes, b"Lima;19");
        assert_eq!(line.consumed, 7);
        assert!(source.read_line().await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_unrepresentable_offset_is_a_seek_error() -> Result<()> {
        let file = example_file();
        let source = ChunkSource::open(file.path(), 2, b'\n').await?;

        let result = source.set_position(u64::MAX).await;
        assert!(matches!(
            result,
            Err(ProcessingError::Seek {
                worker: 2,
                offset: u64::MAX,
                ..
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let missing = Path::new("/nonexistent/measurements.txt");
        let result = ChunkSource::open(missing, 3, b'\n').await;

        assert!(matches!(result, Err(ProcessingError::InputUnavailable { .. })));
    }
}
