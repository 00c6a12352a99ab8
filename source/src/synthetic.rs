use crate::memory::thin;
use crate::statistic::{self, StatisticKind};
use crate::{
    DataSource, EventLevel, EventOrigin, EventRecord, Sample, Sensor, SourceError, check_window,
};

use std::f64::consts::TAU;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine { amplitude: f64, period: f64 },
    Square { amplitude: f64, period: f64 },
    Sawtooth { amplitude: f64, period: f64 },
    Constant(f64),
}

impl Waveform {
    pub fn at(self, time: f64) -> f64 {
        match self {
            Waveform::Sine { amplitude, period } => amplitude * (TAU * time / period).sin(),
            Waveform::Square { amplitude, period } => {
                if (time / period).rem_euclid(1.0) < 0.5 {
                    amplitude
                } else {
                    -amplitude
                }
            }
            Waveform::Sawtooth { amplitude, period } => {
                amplitude * (2.0 * (time / period).rem_euclid(1.0) - 1.0)
            }
            Waveform::Constant(value) => value,
        }
    }
}

#[derive(Debug, Clone)]
struct Channel {
    sensor: Sensor,
    waveform: Waveform,
}

/// Generates sampled waveforms on demand over `[0, duration]`.
///
/// Useful as a demo measurement and for exercising slow sources through
/// [`SyntheticSource::with_latency`].
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    name: String,
    duration: f64,
    interval: f64,
    channels: Vec<Channel>,
    event_every: Option<f64>,
    latency: Duration,
}

impl SyntheticSource {
    pub fn new(name: impl Into<String>, duration: f64, interval: f64) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
            interval: if interval > 0.0 { interval } else { 0.01 },
            channels: Vec::new(),
            event_every: None,
            latency: Duration::ZERO,
        }
    }

    pub fn channel(mut self, name: impl Into<String>, unit: impl Into<String>, waveform: Waveform) -> Self {
        self.channels.push(Channel {
            sensor: Sensor::new(name, unit, self.interval),
            waveform,
        });
        self
    }

    /// Emits an event every `period` seconds, cycling through the channels
    /// with one global event per round.
    pub fn events_every(mut self, period: f64) -> Self {
        self.event_every = (period > 0.0).then_some(period);
        self
    }

    /// Every read blocks for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn row(&self, index: u64) -> Sample {
        let time = index as f64 * self.interval;
        Sample::new(time, self.channels.iter().map(|c| c.waveform.at(time)))
    }

    fn last_index(&self) -> u64 {
        (self.duration / self.interval).floor() as u64
    }

    fn stall(&self) {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
    }
}

impl DataSource for SyntheticSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn sensors(&self) -> Vec<Sensor> {
        self.channels.iter().map(|c| c.sensor.clone()).collect()
    }

    fn samples(&self, start: f64, end: f64, resolution: u32) -> Result<Vec<Sample>, SourceError> {
        check_window(start, end)?;
        self.stall();

        if end < 0.0 || start > self.duration {
            return Ok(Vec::new());
        }

        let first = (start.max(0.0) / self.interval).floor() as u64;
        let last = ((end.min(self.duration) / self.interval).ceil() as u64).min(self.last_index());

        let rows: Vec<Sample> = (first..=last).map(|i| self.row(i)).collect();
        Ok(thin(&rows, end - start, resolution))
    }

    fn sample(&self, time: f64, _resolution: u32) -> Result<Option<Sample>, SourceError> {
        check_window(time, time)?;
        self.stall();

        if time < 0.0 {
            return Ok(None);
        }

        let index = ((time / self.interval).floor() as u64).min(self.last_index());
        Ok(Some(self.row(index)))
    }

    fn events(&self, start: f64, end: f64) -> Result<Vec<EventRecord>, SourceError> {
        check_window(start, end)?;

        let Some(period) = self.event_every else {
            return Ok(Vec::new());
        };

        let from = (start.max(0.0) / period).ceil().max(1.0) as u64;
        let to = (end.min(self.duration) / period).floor();
        if to < from as f64 {
            return Ok(Vec::new());
        }

        let round = self.channels.len() as u64 + 1;
        Ok((from..=to as u64)
            .map(|k| {
                let time = k as f64 * period;
                let slot = k % round;
                match usize::try_from(slot).ok().and_then(|s| self.channels.get(s)) {
                    Some(channel) => EventRecord {
                        time,
                        origin: EventOrigin::Sensor(slot as usize),
                        level: EventLevel::Warning,
                        message: format!("{} crossed threshold", channel.sensor.name),
                    },
                    None => EventRecord {
                        time,
                        origin: EventOrigin::Global,
                        level: EventLevel::Debug,
                        message: "marker".to_string(),
                    },
                }
            })
            .collect())
    }

    fn statistic(&self, kind: StatisticKind) -> Vec<Option<f64>> {
        let rows: Vec<Sample> = (0..=self.last_index()).map(|i| self.row(i)).collect();
        statistic::compute(kind, &rows, self.channels.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SyntheticSource {
        SyntheticSource::new("demo", 10.0, 0.5)
            .channel("sine", "V", Waveform::Sine { amplitude: 2.0, period: 4.0 })
            .channel("dc", "A", Waveform::Constant(1.5))
            .events_every(2.0)
    }

    #[test]
    fn samples_are_clipped_to_duration() {
        let rows = source().samples(-3.0, 100.0, 0).unwrap();

        assert_eq!(rows.first().unwrap().time, 0.0);
        assert_eq!(rows.last().unwrap().time, 10.0);
        assert_eq!(rows.len(), 21);
        assert!(rows.iter().all(|r| r.values.len() == 2));
    }

    #[test]
    fn window_before_origin_is_empty() {
        assert!(source().samples(-5.0, -1.0, 0).unwrap().is_empty());
        assert!(source().sample(-1.0, 0).unwrap().is_none());
    }

    #[test]
    fn waveforms() {
        let square = Waveform::Square { amplitude: 1.0, period: 2.0 };
        assert_eq!(square.at(0.5), 1.0);
        assert_eq!(square.at(1.5), -1.0);

        let saw = Waveform::Sawtooth { amplitude: 1.0, period: 4.0 };
        assert_eq!(saw.at(2.0), 0.0);

        assert_eq!(source().sample(1.2, 0).unwrap().unwrap().values[1], 1.5);
    }

    #[test]
    fn events_cycle_through_channels() {
        let events = source().events(0.0, 10.0).unwrap();
        let times: Vec<f64> = events.iter().map(|e| e.time).collect();

        assert_eq!(times, vec![2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(events[0].origin, EventOrigin::Sensor(1));
        assert_eq!(events[1].origin, EventOrigin::Global);
        assert_eq!(events[2].origin, EventOrigin::Sensor(0));
    }

    #[test]
    fn constant_channel_statistics() {
        let stats = source().statistic(StatisticKind::Average);
        assert_eq!(stats[1], Some(1.5));
    }
}
