use tracescope_data::input::MouseButton;
use tracescope_data::{
    Chart, Config, Coord, Dimensions, InputEvent, Key, Notification, ProbeEvent, ProbeReadings,
    Project, ProjectEvent,
};

use source::{DataSource, SyntheticSource, Waveform};

use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()
        .expect("test runtime")
}

fn setup(rt: &tokio::runtime::Runtime) -> (Chart, Project, Config) {
    let mut config = Config::default();
    config.fetch.samples_timeout_ms = 2_000;
    config.fetch.events_timeout_ms = 2_000;

    let mut chart = Chart::new(rt.handle().clone(), &config);
    chart.resize(Dimensions::new(640.0, 480.0));

    let mut project = Project::default();
    project.add_measurement(bench());

    (chart, project, config)
}

fn bench() -> Arc<dyn DataSource> {
    Arc::new(
        SyntheticSource::new("bench", 120.0, 0.01)
            .channel("ramp", "V", Waveform::Sawtooth { amplitude: 5.0, period: 10.0 })
            .channel("dc", "A", Waveform::Constant(0.25)),
    )
}

/// Zooming in time while a probe is placed at the center keeps the probe
/// under the center and voids readings taken at the old resolution.
#[test]
fn time_zoom_keeps_probe_centered() {
    let rt = runtime();
    let (mut chart, mut project, config) = setup(&rt);
    let mut readings = ProbeReadings::new(chart.draw_resolution());

    chart.go_to(30.0);
    let out = chart.handle(InputEvent::KeyPressed(Key::Enter), &mut project);
    assert!(matches!(out[..], [Notification::Probe(ProbeEvent::Added { index: 0, .. })]));

    chart.handle(InputEvent::KeyReleased(Key::Enter), &mut project);
    chart.handle(InputEvent::KeyPressed(Key::Control), &mut project);
    chart.handle(InputEvent::KeyPressed(Key::Tab), &mut project);
    let out = chart.handle(InputEvent::Wheel { delta: -1.0 }, &mut project);

    let Some(Notification::ResolutionChanged(resolution)) = out.first().copied() else {
        panic!("time zoom must report a resolution, got {out:?}");
    };
    assert_eq!(resolution, 512);
    readings.set_resolution(resolution);

    assert_eq!(chart.center_time(), 30.0);
    let scene = chart.scene(&project, &config);
    let probe_x = scene.probes[0].line.from.x;
    assert_eq!(probe_x, chart.viewport().center().x);

    let table = readings.table(&project);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1].readings[0].to_string(), "250mA");
}

/// Dragging a probe out of view to the left stops it at time zero.
#[test]
fn probe_drag_stops_at_origin() {
    let rt = runtime();
    let (mut chart, mut project, _) = setup(&rt);

    let event = project.add_probe(0.5);
    assert!(matches!(event, ProjectEvent::Probe(ProbeEvent::Added { .. })));
    chart.refresh(&project);

    let at = chart.viewport().time_to_x(0.5) - chart.viewport().window(chart.size()).left;
    chart.handle(
        InputEvent::ButtonPressed {
            button: MouseButton::Left,
            position: Coord::new(at, 200.0),
        },
        &mut project,
    );
    chart.handle(
        InputEvent::CursorMoved {
            position: Coord::new(at - 500.0, 200.0),
        },
        &mut project,
    );
    chart.handle(
        InputEvent::ButtonReleased {
            button: MouseButton::Left,
        },
        &mut project,
    );

    assert_eq!(project.probes.get(0).map(|p| p.time()), Some(0.0));
}

/// A saved session comes back with its settings and probes.
#[test]
fn session_round_trip_through_disk() {
    let rt = runtime();
    let (_, mut project, _) = setup(&rt);
    let id = project.measurements()[0].id();
    project.update_sensor(id, 0, |s| s.comment = "scope ch1".to_string());
    project.add_probe(12.0);

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("session.json");
    project.save(&path).expect("save");

    let (loaded, skipped) = Project::load(&path, |name| (name == "bench").then(bench)).expect("load");

    assert!(skipped.is_empty());
    assert_eq!(loaded.file.as_deref(), Some(path.as_path()));
    assert_eq!(loaded.probes.len(), 1);
    assert_eq!(loaded.measurements()[0].name, "bench");
    assert_eq!(loaded.measurements()[0].sensors[0].comment, "scope ch1");
}
