//! Built-in measurements so the viewer has something to show without
//! any acquisition hardware attached.

use source::{
    DataSource, EventLevel, EventOrigin, EventRecord, MemorySource, Sample, Sensor,
    SyntheticSource, Waveform,
};

use std::sync::Arc;
use std::time::Duration;

pub const BENCH: &str = "Bench supply";
pub const DRIVE: &str = "Motor drive";
pub const LOGGER: &str = "Data logger";

pub const ALL: [&str; 3] = [BENCH, DRIVE, LOGGER];

/// Looks a source up by the name a saved session refers to it with.
pub fn resolve(name: &str) -> Option<Arc<dyn DataSource>> {
    let source: Arc<dyn DataSource> = match name {
        BENCH => Arc::new(
            SyntheticSource::new(BENCH, 600.0, 0.01)
                .channel(
                    "output",
                    "V",
                    Waveform::Sine {
                        amplitude: 12.0,
                        period: 5.0,
                    },
                )
                .channel(
                    "load",
                    "A",
                    Waveform::Square {
                        amplitude: 2.0,
                        period: 3.0,
                    },
                )
                .events_every(7.5),
        ),
        // Slow on purpose: the chart keeps drawing stale data until it lands.
        DRIVE => Arc::new(
            SyntheticSource::new(DRIVE, 300.0, 0.005)
                .channel(
                    "speed",
                    "rpm",
                    Waveform::Sawtooth {
                        amplitude: 3000.0,
                        period: 20.0,
                    },
                )
                .channel("winding", "°C", Waveform::Constant(42.5))
                .events_every(12.0)
                .with_latency(Duration::from_millis(25)),
        ),
        LOGGER => Arc::new(logger()),
        _ => return None,
    };

    Some(source)
}

/// A recorded log with gaps: every tenth row misses its humidity column.
fn logger() -> MemorySource {
    let sensors = vec![
        Sensor::new("temperature", "°C", 1.0),
        Sensor::new("humidity", "%", 1.0),
    ];

    let rows = (0..3600).map(|i| {
        let t = f64::from(i);
        let temperature = 21.0 + 3.0 * (t / 900.0).sin();
        if i % 10 == 9 {
            Sample::new(t, [temperature])
        } else {
            Sample::new(t, [temperature, 55.0 + 10.0 * (t / 600.0).cos()])
        }
    });

    let events = [
        EventRecord {
            time: 120.0,
            origin: EventOrigin::Global,
            level: EventLevel::Debug,
            message: "logging started".to_string(),
        },
        EventRecord {
            time: 1800.0,
            origin: EventOrigin::Sensor(1),
            level: EventLevel::Warning,
            message: "humidity probe reconnected".to_string(),
        },
        EventRecord {
            time: 3300.0,
            origin: EventOrigin::Sensor(0),
            level: EventLevel::Error,
            message: "temperature above limit".to_string(),
        },
    ];

    MemorySource::new(LOGGER, sensors)
        .with_samples(rows)
        .with_events(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_source_resolves_under_its_name() {
        for name in ALL {
            let source = resolve(name).expect(name);
            assert_eq!(source.name(), name);
            assert_eq!(source.sensors().len(), 2);
        }
        assert!(resolve("scope").is_none());
    }

    #[test]
    fn logger_has_short_rows() {
        let source = resolve(LOGGER).expect("logger");
        let row = source.sample(9.0, 0).expect("read").expect("row");
        assert_eq!(row.values.len(), 1);
    }
}
