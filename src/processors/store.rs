use crate::error::{ProcessingError, Result};
use crate::models::{group_by_name, Accumulator, RunningStats, StationSummary};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Station map shared by every parse task, guarded by a single lock.
pub struct AggregationStore<A = RunningStats> {
    stations: Mutex<HashMap<Vec<u8>, A>>,
}

impl<A: Accumulator> AggregationStore<A> {
    pub fn new() -> Self {
        Self {
            stations: Mutex::new(HashMap::new()),
        }
    }

    /// Record one value. The lock is held for this insert only and the key
    /// is copied only the first time it is seen.
    pub fn insert(&self, station: &[u8], value: f32) -> Result<()> {
        let mut stations = self
            .stations
            .lock()
            .map_err(|_| ProcessingError::StorePoisoned)?;

        match stations.get_mut(station) {
            Some(accumulator) => accumulator.record(value),
            None => {
                let mut accumulator = A::default();
                accumulator.record(value);
                stations.insert(station.to_vec(), accumulator);
            }
        }

        Ok(())
    }

    /// Reduce every station to min/mean/max.
    ///
    /// Consumes the store, so it can only run once and only after every
    /// writer handle has been dropped. Keys that decode to the same name are
    /// merged before reduction.
    pub fn snapshot(self) -> Result<BTreeMap<String, StationSummary>> {
        let stations = self
            .stations
            .into_inner()
            .map_err(|_| ProcessingError::StorePoisoned)?;

        Ok(group_by_name(stations)
            .into_par_iter()
            .filter_map(|(station, accumulator)| {
                accumulator.summarize().map(|summary| (station, summary))
            })
            .collect())
    }
}

impl<A: Accumulator> Default for AggregationStore<A> {
    fn default() -> Self {
        Self::new()
    }
}
