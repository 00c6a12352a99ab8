pub mod fetch;
pub mod memory;
pub mod statistic;
pub mod synthetic;

pub use fetch::{BoundedFetch, FetchRequest, FetchStatus};
pub use memory::MemorySource;
pub use statistic::StatisticKind;
pub use synthetic::{SyntheticSource, Waveform};

use smallvec::SmallVec;

/// Per-sensor values of one sample row, in sensor order.
pub type Values = SmallVec<[f64; 8]>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid time window [{start}, {end}]")]
    InvalidWindow { start: f64, end: f64 },
    #[error("Fetch job panicked")]
    Panicked,
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub name: String,
    pub unit: String,
    /// Seconds between two native samples.
    pub sampling_interval: f64,
}

impl Sensor {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, sampling_interval: f64) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            sampling_interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub values: Values,
}

impl Sample {
    pub fn new(time: f64, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            time,
            values: values.into_iter().collect(),
        }
    }

    pub fn value(&self, sensor: usize) -> Option<f64> {
        self.values.get(sensor).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventLevel {
    Verbose,
    Debug,
    Warning,
    Error,
    Unknown,
}

impl EventLevel {
    pub fn tag(self) -> &'static str {
        match self {
            EventLevel::Verbose => "VERBOS",
            EventLevel::Debug => "DEBUG",
            EventLevel::Warning => "WARNING",
            EventLevel::Error => "ERROR",
            EventLevel::Unknown => "UKN",
        }
    }
}

impl std::fmt::Display for EventLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Where an event was raised: the whole measurement, or one sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventOrigin {
    Global,
    Sensor(usize),
}

impl EventOrigin {
    /// Negative raw origins denote global events.
    pub fn from_raw(raw: i64) -> Self {
        usize::try_from(raw).map_or(EventOrigin::Global, EventOrigin::Sensor)
    }

    pub fn sensor(self) -> Option<usize> {
        match self {
            EventOrigin::Global => None,
            EventOrigin::Sensor(index) => Some(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub time: f64,
    pub origin: EventOrigin,
    pub level: EventLevel,
    pub message: String,
}

/// A synchronous provider of measurement data.
///
/// Calls may block for an arbitrary time; callers that must stay responsive
/// go through [`BoundedFetch`].
pub trait DataSource: Send + Sync {
    fn name(&self) -> String;

    fn sensors(&self) -> Vec<Sensor>;

    /// Samples covering `[start, end]`, thinned to roughly `resolution`
    /// points per second. A resolution of zero returns every native sample.
    fn samples(&self, start: f64, end: f64, resolution: u32) -> Result<Vec<Sample>, SourceError>;

    /// The sample at or right before `time`, `None` before the first one.
    fn sample(&self, time: f64, resolution: u32) -> Result<Option<Sample>, SourceError> {
        Ok(self.samples(time, time, resolution)?.into_iter().next())
    }

    fn events(&self, start: f64, end: f64) -> Result<Vec<EventRecord>, SourceError>;

    /// One entry per sensor, `None` when the statistic is undefined.
    fn statistic(&self, kind: StatisticKind) -> Vec<Option<f64>>;
}

pub(crate) fn check_window(start: f64, end: f64) -> Result<(), SourceError> {
    if start.is_nan() || end.is_nan() || start > end {
        return Err(SourceError::InvalidWindow { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_origin_is_global() {
        assert_eq!(EventOrigin::from_raw(-1), EventOrigin::Global);
        assert_eq!(EventOrigin::from_raw(2), EventOrigin::Sensor(2));
        assert_eq!(EventOrigin::from_raw(2).sensor(), Some(2));
    }

    #[test]
    fn window_must_be_ordered() {
        assert!(check_window(0.0, 1.0).is_ok());
        assert!(check_window(1.0, 1.0).is_ok());
        assert_eq!(
            check_window(2.0, 1.0),
            Err(SourceError::InvalidWindow {
                start: 2.0,
                end: 1.0
            })
        );
        assert!(check_window(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn short_rows_have_no_value() {
        let sample = Sample::new(0.0, [1.0, 2.0]);
        assert_eq!(sample.value(1), Some(2.0));
        assert_eq!(sample.value(2), None);
    }
}
