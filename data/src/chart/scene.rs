//! What the chart draws, in logical units.
//!
//! The widget maps every coordinate through
//! [`ViewportState::to_screen`](crate::viewport::ViewportState::to_screen)
//! and rasterizes; nothing here knows about pixels or the renderer.

use super::Chart;
use crate::config::{ColorRole, Config};
use crate::probe;
use crate::project::{LineType, Project};
use crate::util::{format_number, format_time};
use crate::viewport::{Coord, HIT_RADIUS, ViewportState, Window};

use iced_core::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub from: Coord,
    pub to: Coord,
}

impl Line {
    fn vertical(x: f64, bounds: &Window) -> Self {
        Self {
            from: Coord::new(x, bounds.lower),
            to: Coord::new(x, bounds.upper),
        }
    }

    fn horizontal(y: f64, bounds: &Window) -> Self {
        Self {
            from: Coord::new(bounds.left, y),
            to: Coord::new(bounds.right, y),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub at: Coord,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeMark {
    pub line: Line,
    pub label: Label,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventMark {
    pub line: Line,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub color: Color,
    pub line_type: LineType,
    pub points: Vec<Coord>,
}

/// A sample point under the mouse.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub at: Coord,
    pub color: Color,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub window: Window,
    pub background: Color,
    pub grid_color: Color,
    pub text_color: Color,
    pub probe_color: Color,
    pub zero_color: Color,
    pub grid: Vec<Line>,
    pub zero_line: Option<Line>,
    pub value_labels: Vec<Label>,
    pub time_labels: Vec<Label>,
    pub events: Vec<EventMark>,
    pub traces: Vec<Trace>,
    pub probes: Vec<ProbeMark>,
    pub markers: Vec<Marker>,
}

pub(super) fn build(chart: &Chart, project: &Project, config: &Config) -> Scene {
    let viewport = chart.viewport();
    let size = chart.size();
    let window = viewport.window(size);
    let bounds = viewport.bounds(size);

    let mut scene = Scene {
        window,
        background: config.color(ColorRole::Background),
        grid_color: config.color(ColorRole::Grid),
        text_color: config.color(ColorRole::Text),
        probe_color: config.color(ColorRole::Probe),
        zero_color: config.color(ColorRole::ZeroLine),
        grid: Vec::new(),
        zero_line: None,
        value_labels: Vec::new(),
        time_labels: Vec::new(),
        events: Vec::new(),
        traces: Vec::new(),
        probes: Vec::new(),
        markers: Vec::new(),
    };

    grid(&mut scene, viewport, &window, &bounds, config.text_size);
    measurements(&mut scene, chart, project, config, &bounds);

    for (index, probe) in project.probes.iter().enumerate() {
        let x = viewport.time_to_x(probe.time());
        scene.probes.push(ProbeMark {
            line: Line::vertical(x, &bounds),
            label: Label {
                at: Coord::new(x + 5.0, window.upper - 1.8 * viewport.grid_square().y),
                text: probe::label(index),
            },
        });
    }

    scene
}

fn grid(scene: &mut Scene, viewport: &ViewportState, window: &Window, bounds: &Window, text_size: f32) {
    let square = viewport.grid_square();
    let text_size = f64::from(text_size);

    let mut i = (bounds.upper / square.y).ceil() as i64 + 1;
    while i as f64 * square.y > bounds.lower {
        let y = i as f64 * square.y;
        scene.grid.push(Line::horizontal(y, bounds));

        if i % 2 != 0 {
            scene.value_labels.push(Label {
                at: Coord::new(window.left + 4.0, y),
                text: format_number(i as f64 * viewport.value_per_square(), ""),
            });
        }
        i -= 1;
    }

    let mut i = (bounds.right / square.x).ceil() as i64 + 1;
    while i as f64 * square.x > bounds.left {
        let x = i as f64 * square.x;
        scene.grid.push(Line::vertical(x, bounds));

        if i % 4 == 0 {
            scene.time_labels.push(Label {
                at: Coord::new(x + 2.0, window.lower + text_size),
                text: format_time(viewport.x_to_time(x)),
            });
        }
        i -= 1;
    }

    if bounds.lower < 0.0 && bounds.upper > 0.0 {
        scene.zero_line = Some(Line::horizontal(0.0, bounds));
    }
}

fn measurements(scene: &mut Scene, chart: &Chart, project: &Project, config: &Config, bounds: &Window) {
    let viewport = chart.viewport();
    let mouse = chart
        .input()
        .last_position()
        .map(|offset| viewport.mouse_position(chart.size(), offset));
    let event_color = config.color(ColorRole::Event);

    for measurement in project.measurements() {
        if !measurement.any_visible() {
            continue;
        }
        let id = measurement.id();

        for event in chart.events(id) {
            let sensor = event
                .origin
                .sensor()
                .and_then(|index| measurement.sensors.get(index));

            let (offset, color) = sensor.map_or((0.0, event_color), |s| (s.offset_x, s.color));
            let x = viewport.time_to_x(event.time + offset);
            scene.events.push(EventMark {
                line: Line::vertical(x, bounds),
                color,
            });
        }

        let samples = chart.samples(id);

        for (index, settings) in measurement.sensors.iter().enumerate() {
            if !settings.visible {
                continue;
            }

            let mut points = Vec::with_capacity(samples.len());
            let mut marker = None;

            // rows without a value for this sensor are skipped
            for sample in samples {
                let Some(value) = sample.value(index) else {
                    continue;
                };
                let time = sample.time + settings.offset_x;
                let value = value + settings.offset_y;
                let point = Coord::new(viewport.time_to_x(time), viewport.value_to_y(value));

                // the last point under the cursor wins
                if let Some(mouse) = mouse
                    && (point.x - mouse.x).abs() < HIT_RADIUS
                    && (point.y - mouse.y).abs() < HIT_RADIUS
                {
                    marker = Some(Marker {
                        at: point,
                        color: settings.color,
                        text: format!(
                            "Time: {} Value: {}",
                            format_time(time),
                            format_number(value, &settings.unit)
                        ),
                    });
                }

                points.push(point);
            }

            scene.markers.extend(marker);
            scene.traces.push(Trace {
                color: settings.color,
                line_type: settings.line_type,
                points,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, MouseButton};
    use crate::viewport::Dimensions;

    use source::{EventLevel, EventOrigin, EventRecord, MemorySource, Sample, Sensor};

    use std::sync::Arc;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap()
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.fetch.samples_timeout_ms = 2_000;
        config.fetch.events_timeout_ms = 2_000;
        config
    }

    fn source() -> MemorySource {
        let event = |time, origin| EventRecord {
            time,
            origin,
            level: EventLevel::Error,
            message: "trip".to_string(),
        };

        MemorySource::new(
            "bench",
            vec![Sensor::new("u", "V", 0.5), Sensor::new("i", "A", 0.5)],
        )
        .with_samples([
            Sample::new(0.0, [0.0, 1.0]),
            Sample::new(0.5, [1.0]),
            Sample::new(1.0, [2.0, 3.0]),
        ])
        .with_events([
            event(0.5, EventOrigin::Global),
            event(1.0, EventOrigin::Sensor(1)),
            event(1.5, EventOrigin::Sensor(7)),
        ])
    }

    #[test]
    fn grid_covers_bounds() {
        let rt = runtime();
        let config = config();
        let mut chart = Chart::new(rt.handle().clone(), &config);
        chart.resize(Dimensions::new(640.0, 480.0));

        let scene = chart.scene(&Project::default(), &config);

        // upper bound 304 -> i from 6 down to -4 horizontally
        let horizontal = scene.grid.iter().filter(|l| l.from.y == l.to.y).count();
        assert_eq!(horizontal, 11);
        assert_eq!(scene.zero_line, Some(Line::horizontal(0.0, &chart.viewport().bounds(chart.size()))));
        assert!(scene.value_labels.iter().any(|l| l.text == "3"));
        assert!(scene.time_labels.iter().any(|l| l.text == "2s"));
        assert!(scene.time_labels.iter().any(|l| l.text == "-2s"));
    }

    #[test]
    fn traces_skip_short_rows_and_events_take_sensor_offsets() {
        let rt = runtime();
        let config = config();
        let mut chart = Chart::new(rt.handle().clone(), &config);
        chart.resize(Dimensions::new(640.0, 480.0));

        let mut project = Project::default();
        project.add_measurement(Arc::new(source()));
        let id = project.measurements()[0].id();
        project.update_sensor(id, 1, |s| s.offset_x = 0.5);
        chart.refresh(&project);

        let scene = chart.scene(&project, &config);

        assert_eq!(scene.traces.len(), 2);
        assert_eq!(scene.traces[0].points.len(), 3);
        assert_eq!(scene.traces[1].points.len(), 2);
        assert_eq!(scene.traces[1].points[0], Coord::new(64.0, 64.0));

        let xs: Vec<f64> = scene.events.iter().map(|e| e.line.from.x).collect();
        assert_eq!(xs, vec![64.0, 192.0, 192.0]);
        assert_eq!(scene.events[0].color, config.color(ColorRole::Event));
        assert_eq!(scene.events[2].color, config.color(ColorRole::Event));
        assert_eq!(scene.events[1].color, project.measurements()[0].sensors[1].color);
    }

    #[test]
    fn hover_marker_near_point() {
        let rt = runtime();
        let config = config();
        let mut chart = Chart::new(rt.handle().clone(), &config);
        chart.resize(Dimensions::new(640.0, 480.0));

        let mut project = Project::default();
        project.add_measurement(Arc::new(source()));
        chart.refresh(&project);

        // point (128, 128) of sensor 0 sits at offset (448, 112)
        chart.handle(
            InputEvent::ButtonPressed {
                button: MouseButton::Right,
                position: Coord::new(449.0, 113.0),
            },
            &mut project,
        );
        let scene = chart.scene(&project, &config);

        assert_eq!(scene.markers.len(), 1);
        assert_eq!(scene.markers[0].at, Coord::new(128.0, 128.0));
        assert_eq!(scene.markers[0].text, "Time: 1s Value: 2V");
    }

    #[test]
    fn hover_marker_reads_shifted_point() {
        let rt = runtime();
        let config = config();
        let mut chart = Chart::new(rt.handle().clone(), &config);
        chart.resize(Dimensions::new(640.0, 480.0));

        let mut project = Project::default();
        project.add_measurement(Arc::new(source()));
        let id = project.measurements()[0].id();
        project.update_sensor(id, 0, |s| {
            s.offset_x = 0.5;
            s.offset_y = 1.0;
        });
        project.update_sensor(id, 1, |s| s.visible = false);
        chart.refresh(&project);

        // sample (1s, 2V) is drawn at (1.5s, 3V) = (192, 192), offset (512, 48)
        chart.handle(
            InputEvent::ButtonPressed {
                button: MouseButton::Right,
                position: Coord::new(512.0, 48.0),
            },
            &mut project,
        );
        let scene = chart.scene(&project, &config);

        assert_eq!(scene.markers.len(), 1);
        assert_eq!(scene.markers[0].at, Coord::new(192.0, 192.0));
        assert_eq!(scene.markers[0].text, "Time: 1.5s Value: 3V");
    }

    #[test]
    fn hover_marker_takes_last_point_in_reach() {
        let rt = runtime();
        let config = config();
        let mut chart = Chart::new(rt.handle().clone(), &config);
        chart.resize(Dimensions::new(640.0, 480.0));

        let dense = MemorySource::new("dense", vec![Sensor::new("u", "V", 0.01)])
            .with_samples([Sample::new(1.0, [2.0]), Sample::new(1.01, [2.0])]);
        let mut project = Project::default();
        project.add_measurement(Arc::new(dense));
        chart.refresh(&project);

        // both points lie within reach of (128, 128)
        chart.handle(
            InputEvent::ButtonPressed {
                button: MouseButton::Right,
                position: Coord::new(448.0, 112.0),
            },
            &mut project,
        );
        let scene = chart.scene(&project, &config);

        assert_eq!(scene.markers.len(), 1);
        assert!(scene.markers[0].at.x > 128.0);
        assert_eq!(scene.markers[0].text, "Time: 1.01s Value: 2V");
    }

    #[test]
    fn probes_are_numbered() {
        let rt = runtime();
        let config = config();
        let mut chart = Chart::new(rt.handle().clone(), &config);
        chart.resize(Dimensions::new(640.0, 480.0));

        let mut project = Project::default();
        project.add_probe(1.0);
        project.add_probe(-1.0);
        let scene = chart.scene(&project, &config);

        let labels: Vec<&str> = scene.probes.iter().map(|p| p.label.text.as_str()).collect();
        assert_eq!(labels, vec!["Probe 0", "Probe 1"]);
        assert_eq!(scene.probes[0].line.from.x, 128.0);
    }
}
