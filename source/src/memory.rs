use crate::statistic::{self, StatisticKind};
use crate::{DataSource, EventRecord, Sample, Sensor, SourceError, check_window};

/// A source backed by samples held in memory, sorted by time.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    sensors: Vec<Sensor>,
    samples: Vec<Sample>,
    events: Vec<EventRecord>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, sensors: Vec<Sensor>) -> Self {
        Self {
            name: name.into(),
            sensors,
            samples: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn with_samples(mut self, samples: impl IntoIterator<Item = Sample>) -> Self {
        self.samples.extend(samples);
        self.samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        self
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = EventRecord>) -> Self {
        self.events.extend(events);
        self.events.sort_by(|a, b| a.time.total_cmp(&b.time));
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl DataSource for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn sensors(&self) -> Vec<Sensor> {
        self.sensors.clone()
    }

    fn samples(&self, start: f64, end: f64, resolution: u32) -> Result<Vec<Sample>, SourceError> {
        check_window(start, end)?;

        // one neighbour on each side so traces reach the window edges
        let lo = self
            .samples
            .partition_point(|s| s.time < start)
            .saturating_sub(1);
        let hi = (self.samples.partition_point(|s| s.time <= end) + 1).min(self.samples.len());

        if lo >= hi {
            return Ok(Vec::new());
        }

        Ok(thin(&self.samples[lo..hi], end - start, resolution))
    }

    fn sample(&self, time: f64, _resolution: u32) -> Result<Option<Sample>, SourceError> {
        if time.is_nan() {
            return Err(SourceError::InvalidWindow {
                start: time,
                end: time,
            });
        }

        let idx = self.samples.partition_point(|s| s.time <= time);
        if idx == 0 {
            return Ok(None);
        }
        Ok(self.samples.get(idx - 1).cloned())
    }

    fn events(&self, start: f64, end: f64) -> Result<Vec<EventRecord>, SourceError> {
        check_window(start, end)?;

        Ok(self
            .events
            .iter()
            .filter(|e| e.time >= start && e.time <= end)
            .cloned()
            .collect())
    }

    fn statistic(&self, kind: StatisticKind) -> Vec<Option<f64>> {
        statistic::compute(kind, &self.samples, self.sensors.len())
    }
}

/// Keeps every n-th row so that about `span * resolution` rows remain.
/// The last row is always kept.
pub(crate) fn thin(rows: &[Sample], span: f64, resolution: u32) -> Vec<Sample> {
    if resolution == 0 || rows.len() <= 2 {
        return rows.to_vec();
    }

    let budget = (span * f64::from(resolution)).ceil().max(2.0);
    if (rows.len() as f64) <= budget {
        return rows.to_vec();
    }

    let stride = (rows.len() as f64 / budget).ceil() as usize;
    let mut out: Vec<Sample> = rows.iter().step_by(stride.max(1)).cloned().collect();

    let last = &rows[rows.len() - 1];
    if out.last().map(|s| s.time) != Some(last.time) {
        out.push(last.clone());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventLevel, EventOrigin};

    fn ramp(count: usize) -> MemorySource {
        MemorySource::new("ramp", vec![Sensor::new("u", "V", 0.1)])
            .with_samples((0..count).map(|i| Sample::new(i as f64 * 0.1, [i as f64])))
    }

    #[test]
    fn window_includes_neighbours() {
        let source = ramp(100);
        let rows = source.samples(1.0, 2.0, 0).unwrap();

        assert!(rows.first().unwrap().time < 1.0);
        assert!(rows.last().unwrap().time > 2.0);
        assert_eq!(rows.len(), 13);
    }

    #[test]
    fn resolution_thins_rows() {
        let source = ramp(1000);
        let rows = source.samples(0.0, 100.0, 2).unwrap();

        assert!(rows.len() <= 201);
        assert_eq!(rows.last().unwrap().time, source.samples[999].time);
    }

    #[test]
    fn single_sample_is_at_or_before() {
        let source = ramp(10);

        let sample = source.sample(0.25, 0).unwrap().unwrap();
        assert_eq!(sample.values[0], 2.0);

        assert!(source.sample(-5.0, 0).unwrap().is_none());
        let first = source.sample(0.0, 0).unwrap();
        assert_eq!(first.map(|s| s.time), Some(0.0));

        assert!(MemorySource::default().sample(1.0, 0).unwrap().is_none());
    }

    #[test]
    fn reversed_window_is_rejected() {
        assert!(matches!(
            ramp(10).samples(3.0, 1.0, 0),
            Err(SourceError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn events_are_filtered_by_window() {
        let event = |time: f64| EventRecord {
            time,
            origin: EventOrigin::Global,
            level: EventLevel::Warning,
            message: format!("at {time}"),
        };
        let source = ramp(10).with_events([event(5.0), event(1.0), event(9.0)]);

        let events = source.events(0.0, 6.0).unwrap();
        let times: Vec<f64> = events.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![1.0, 5.0]);
    }
}
