pub mod record;
pub mod statistics;

pub use record::{parse_measurement, truncate_field, Record};
pub use statistics::{
    group_by_name, Accumulator, MeasurementSeries, RunningStats, StationSummary,
};
