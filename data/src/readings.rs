use crate::probe::{self, Probe, ProbeId};
use crate::project::{Measurement, MeasurementId, Project};
use crate::util::{format_number, format_time};

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Value { value: f64, unit: String },
    Unavailable,
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Value { value, unit } => write!(f, "{}", format_number(*value, unit)),
            Reading::Unavailable => write!(f, "---"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeColumn {
    pub id: ProbeId,
    pub label: String,
    pub time: f64,
    pub time_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRow {
    pub measurement: MeasurementId,
    pub sensor: usize,
    pub label: String,
    pub readings: Vec<Reading>,
}

/// Probe × sensor table, probes as columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadingTable {
    pub columns: Vec<ProbeColumn>,
    pub rows: Vec<ReadingRow>,
}

type Key = (ProbeId, MeasurementId, usize);

/// Sensor values under each probe, cached until the resolution or the
/// project changes.
#[derive(Debug, Default)]
pub struct ProbeReadings {
    resolution: u32,
    cache: FxHashMap<Key, Reading>,
}

impl ProbeReadings {
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution,
            cache: FxHashMap::default(),
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: u32) {
        self.resolution = resolution;
        self.cache.clear();
    }

    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn reading(&mut self, measurement: &Measurement, sensor: usize, probe: &Probe) -> Reading {
        let key = (probe.id(), measurement.id(), sensor);
        if let Some(reading) = self.cache.get(&key) {
            return reading.clone();
        }

        let reading = read(measurement, sensor, probe.time(), self.resolution);
        self.cache.insert(key, reading.clone());
        reading
    }

    pub fn table(&mut self, project: &Project) -> ReadingTable {
        let columns = project
            .probes
            .iter()
            .enumerate()
            .map(|(index, p)| ProbeColumn {
                id: p.id(),
                label: probe::label(index),
                time: p.time(),
                time_text: format_time(p.time()),
            })
            .collect();

        let mut rows = Vec::new();
        for measurement in project.measurements() {
            for sensor in 0..measurement.sensors.len() {
                let readings = project
                    .probes
                    .iter()
                    .map(|p| self.reading(measurement, sensor, p))
                    .collect();

                rows.push(ReadingRow {
                    measurement: measurement.id(),
                    sensor,
                    label: measurement.sensor_label(sensor).unwrap_or_default(),
                    readings,
                });
            }
        }

        ReadingTable { columns, rows }
    }
}

fn read(measurement: &Measurement, sensor: usize, time: f64, resolution: u32) -> Reading {
    let Some(settings) = measurement.sensors.get(sensor) else {
        return Reading::Unavailable;
    };

    match measurement
        .source()
        .sample(time + settings.offset_x, resolution)
    {
        Ok(Some(sample)) if sample.values.len() == measurement.sensors.len() => Reading::Value {
            value: sample.values[sensor] + settings.offset_y,
            unit: settings.unit.clone(),
        },
        Ok(Some(sample)) => {
            log::trace!(
                "Sample at {} has {} values, expected {}",
                sample.time,
                sample.values.len(),
                measurement.sensors.len()
            );
            Reading::Unavailable
        }
        Ok(None) => Reading::Unavailable,
        Err(err) => {
            log::warn!("Reading '{}' failed: {err}", measurement.name);
            Reading::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use source::{DataSource, MemorySource, Sample, Sensor, SourceError, StatisticKind};

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts reads so cache hits can be observed.
    struct Counting {
        inner: MemorySource,
        reads: Arc<AtomicUsize>,
    }

    impl DataSource for Counting {
        fn name(&self) -> String {
            self.inner.name()
        }

        fn sensors(&self) -> Vec<Sensor> {
            self.inner.sensors()
        }

        fn samples(&self, start: f64, end: f64, resolution: u32) -> Result<Vec<Sample>, SourceError> {
            self.inner.samples(start, end, resolution)
        }

        fn sample(&self, time: f64, resolution: u32) -> Result<Option<Sample>, SourceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.sample(time, resolution)
        }

        fn events(&self, start: f64, end: f64) -> Result<Vec<source::EventRecord>, SourceError> {
            self.inner.events(start, end)
        }

        fn statistic(&self, kind: StatisticKind) -> Vec<Option<f64>> {
            self.inner.statistic(kind)
        }
    }

    fn project() -> (Project, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        let inner = MemorySource::new(
            "rig",
            vec![Sensor::new("u", "V", 1.0), Sensor::new("i", "A", 1.0)],
        )
        .with_samples([
            Sample::new(0.0, [1.0, 10.0]),
            Sample::new(1.0, [2.0]),
            Sample::new(2.0, [3.0, 30.0]),
        ]);

        let mut project = Project::default();
        project.add_measurement(Arc::new(Counting {
            inner,
            reads: Arc::clone(&reads),
        }));
        (project, reads)
    }

    #[test]
    fn values_include_offsets() {
        let (mut project, _) = project();
        let id = project.measurements()[0].id();
        project.update_sensor(id, 0, |s| {
            s.offset_x = 2.0;
            s.offset_y = 0.5;
        });
        project.add_probe(0.0);

        let table = ProbeReadings::new(10).table(&project);

        assert_eq!(table.columns[0].label, "Probe 0");
        assert_eq!(table.rows[0].label, "rig - u");
        assert_eq!(
            table.rows[0].readings[0],
            Reading::Value {
                value: 3.5,
                unit: "V".to_string()
            }
        );
        assert_eq!(table.rows[1].readings[0].to_string(), "10A");
    }

    #[test]
    fn short_sample_reads_as_dashes() {
        let (mut project, _) = project();
        project.add_probe(1.5);

        let table = ProbeReadings::new(10).table(&project);

        assert_eq!(table.rows[0].readings[0], Reading::Unavailable);
        assert_eq!(table.rows[0].readings[0].to_string(), "---");
    }

    #[test]
    fn cache_cleared_on_resolution_change() {
        let (mut project, reads) = project();
        project.add_probe(0.0);
        let mut readings = ProbeReadings::new(10);

        readings.table(&project);
        readings.table(&project);
        assert_eq!(reads.load(Ordering::SeqCst), 2);

        readings.set_resolution(20);
        readings.table(&project);
        assert_eq!(reads.load(Ordering::SeqCst), 4);

        readings.invalidate();
        readings.table(&project);
        assert_eq!(reads.load(Ordering::SeqCst), 6);
    }
}
