use crate::project::{MeasurementId, Project};
use crate::util::{format_number, format_time};

use source::{EventOrigin, EventRecord, StatisticKind};

#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub measurement: MeasurementId,
    pub time: f64,
    pub time_text: String,
    pub text: String,
}

/// Every event of every measurement, sorted by time.
pub fn event_rows(project: &Project) -> Vec<EventRow> {
    let mut rows = Vec::new();

    for measurement in project.measurements() {
        let events = match measurement.source().events(f64::NEG_INFINITY, f64::INFINITY) {
            Ok(events) => events,
            Err(err) => {
                log::warn!("Events of '{}' unavailable: {err}", measurement.name);
                continue;
            }
        };

        rows.extend(events.iter().map(|event| EventRow {
            measurement: measurement.id(),
            time: event.time,
            time_text: format_time(event.time),
            text: describe(&measurement.name, &channel(project, measurement.id(), event), event),
        }));
    }

    rows.sort_by(|a, b| a.time.total_cmp(&b.time));
    rows
}

fn channel(project: &Project, id: MeasurementId, event: &EventRecord) -> String {
    let sensor = match event.origin {
        EventOrigin::Global => None,
        EventOrigin::Sensor(index) => project
            .measurement(id)
            .and_then(|(_, m)| m.sensors.get(index)),
    };

    sensor.map_or_else(|| "[GLOBAL]".to_string(), |s| s.name.clone())
}

/// `[LEVEL] measurement channel: message`
pub fn describe(measurement: &str, channel: &str, event: &EventRecord) -> String {
    format!(
        "[{}] {measurement} {channel}: {}",
        event.level.tag(),
        event.message
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticRow {
    pub label: String,
    /// In the order of [`StatisticKind::ALL`]; empty when undefined.
    pub values: Vec<String>,
}

pub fn statistic_rows(project: &Project) -> Vec<StatisticRow> {
    let mut rows = Vec::new();

    for measurement in project.measurements() {
        let per_kind: Vec<Vec<Option<f64>>> = StatisticKind::ALL
            .iter()
            .map(|kind| measurement.source().statistic(*kind))
            .collect();

        for (index, settings) in measurement.sensors.iter().enumerate() {
            let values = per_kind
                .iter()
                .map(|stats| {
                    stats
                        .get(index)
                        .copied()
                        .flatten()
                        .map(|v| format_number(v, &settings.unit))
                        .unwrap_or_default()
                })
                .collect();

            rows.push(StatisticRow {
                label: measurement.sensor_label(index).unwrap_or_default(),
                values,
            });
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    use source::{EventLevel, MemorySource, Sample, Sensor};

    use std::sync::Arc;

    fn project() -> Project {
        let event = |time, origin, level| EventRecord {
            time,
            origin,
            level,
            message: "limit".to_string(),
        };
        let first = MemorySource::new("a", vec![Sensor::new("u", "V", 1.0)])
            .with_samples([Sample::new(0.0, [2.0]), Sample::new(1.0, [4.0])])
            .with_events([
                event(3.0, EventOrigin::Sensor(0), EventLevel::Warning),
                event(1.0, EventOrigin::Global, EventLevel::Verbose),
            ]);
        let second = MemorySource::new("b", vec![Sensor::new("i", "A", 1.0)])
            .with_events([event(2.0, EventOrigin::Sensor(4), EventLevel::Unknown)]);

        let mut project = Project::default();
        project.add_measurement(Arc::new(first));
        project.add_measurement(Arc::new(second));
        project
    }

    #[test]
    fn events_merged_and_sorted() {
        let rows = event_rows(&project());
        let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "[VERBOS] a [GLOBAL]: limit",
                "[UKN] b [GLOBAL]: limit",
                "[WARNING] a u: limit",
            ]
        );
    }

    #[test]
    fn statistics_per_sensor() {
        let rows = statistic_rows(&project());

        assert_eq!(rows[0].label, "a - u");
        assert_eq!(rows[0].values, vec!["2V", "4V", "3V", "3V", "1V"]);
        assert!(rows[1].values.iter().all(String::is_empty));
    }
}
