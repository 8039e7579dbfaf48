use crate::error::{ProcessingError, RecordError, Result};
use crate::models::{
    group_by_name, parse_measurement, Accumulator, RunningStats, StationSummary,
};
use crate::readers::tokenizer::{FieldTokenizer, Token};
use crate::utils::ProcessorConfig;
use memmap2::Mmap;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Single-threaded aggregation over trusted input.
///
/// Any malformed record aborts the scan with [`ProcessingError::MalformedRecord`].
pub struct SequentialReader {
    tokenizer: FieldTokenizer,
    buffer_size: usize,
    use_mmap: bool,
}

impl SequentialReader {
    pub fn new(config: &ProcessorConfig) -> Self {
        Self {
            tokenizer: FieldTokenizer::from_config(config),
            buffer_size: config.buffer_size,
            use_mmap: false,
        }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn aggregate(&self, path: &Path) -> Result<BTreeMap<String, StationSummary>> {
        let started = Instant::now();
        let file = File::open(path).map_err(|source| ProcessingError::InputUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut stations = HashMap::new();
        if self.use_mmap {
            self.aggregate_mmap(&file, &mut stations)?;
        } else {
            self.aggregate_buffered(file, &mut stations)?;
        }

        let summaries: BTreeMap<String, StationSummary> = group_by_name(stations)
            .into_iter()
            .filter_map(|(station, stats)| stats.summarize().map(|summary| (station, summary)))
            .collect();

        info!(
            stations = summaries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            mmap = self.use_mmap,
            "Sequential scan complete"
        );

        Ok(summaries)
    }

    fn aggregate_mmap(
        &self,
        file: &File,
        stations: &mut HashMap<Vec<u8>, RunningStats>,
    ) -> Result<()> {
        let mmap = unsafe { Mmap::map(file)? };
        debug!(bytes = mmap.len(), "Mapped input file");

        self.scan_records(&mmap, true, 0, stations)?;
        Ok(())
    }

    fn aggregate_buffered(
        &self,
        mut file: File,
        stations: &mut HashMap<Vec<u8>, RunningStats>,
    ) -> Result<()> {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut filled = 0;
        let mut base_offset = 0u64;

        loop {
            // A single record larger than the buffer
            if filled == buffer.len() {
                buffer.resize(buffer.len() * 2, 0);
            }

            let read = file.read(&mut buffer[filled..])?;
            let at_eof = read == 0;
            filled += read;

            let consumed = self.scan_records(&buffer[..filled], at_eof, base_offset, stations)?;
            if at_eof {
                return Ok(());
            }

            // Carry the partial record over to the next refill
            buffer.copy_within(consumed..filled, 0);
            filled -= consumed;
            base_offset += consumed as u64;
        }
    }

    /// Aggregate every complete record in `data` and return the number of
    /// bytes they occupy. A partial trailing record is left for the next call.
    fn scan_records(
        &self,
        data: &[u8],
        at_eof: bool,
        base_offset: u64,
        stations: &mut HashMap<Vec<u8>, RunningStats>,
    ) -> Result<usize> {
        let mut pos = 0;

        loop {
            let record_start = pos;
            let malformed = |reason| ProcessingError::MalformedRecord {
                offset: base_offset + record_start as u64,
                reason,
            };

            let name = match self.tokenizer.next_token(&data[pos..], at_eof) {
                Token::Field(field) => field,
                Token::NeedMoreData | Token::Finished => return Ok(record_start),
            };
            if name.ends_record {
                return Err(malformed(RecordError::FieldCount { found: 1 }));
            }
            pos += name.consumed;

            let value = match self.tokenizer.next_token(&data[pos..], at_eof) {
                Token::Field(field) => field,
                Token::NeedMoreData => return Ok(record_start),
                Token::Finished => return Err(malformed(RecordError::MissingMeasurement)),
            };
            if !value.ends_record {
                return Err(malformed(RecordError::FieldCount { found: 3 }));
            }
            pos += value.consumed;

            let measurement = parse_measurement(value.bytes).map_err(malformed)?;

            match stations.get_mut(name.bytes) {
                Some(stats) => stats.record(measurement),
                None => {
                    let mut stats = RunningStats::default();
                    stats.record(measurement);
                    stations.insert(name.bytes.to_vec(), stats);
                }
            }
        }
    }
}

impl Default for SequentialReader {
    fn default() -> Self {
        Self::new(&ProcessorConfig::default())
    }
}
