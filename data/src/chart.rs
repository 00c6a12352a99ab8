pub mod scene;

pub use scene::Scene;

use crate::config::{Config, FetchConfig};
use crate::input::{CursorShape, InputEvent, InputState, MouseMode, Notification};
use crate::project::{Measurement, MeasurementEvent, MeasurementId, Project, ProjectEvent};
use crate::viewport::{Dimensions, ViewportState};

use rustc_hash::FxHashMap;
use source::{BoundedFetch, EventRecord, FetchRequest, FetchStatus, Sample};
use tokio::runtime::Handle;

struct MeasurementCache {
    samples: BoundedFetch<Vec<Sample>>,
    events: BoundedFetch<Vec<EventRecord>>,
}

impl MeasurementCache {
    fn new(runtime: &Handle, fetch: &FetchConfig) -> Self {
        Self {
            samples: BoundedFetch::new(runtime.clone(), fetch.samples_timeout()),
            events: BoundedFetch::new(runtime.clone(), fetch.events_timeout()),
        }
    }

    fn needs_redraw(&self) -> bool {
        self.samples.needs_redraw() || self.events.needs_redraw()
    }
}

/// The interactive chart: viewport, input handling and the per-measurement
/// data caches drawn from.
pub struct Chart {
    viewport: ViewportState,
    input: InputState,
    size: Dimensions,
    runtime: Handle,
    fetch: FetchConfig,
    caches: FxHashMap<MeasurementId, MeasurementCache>,
    needs_redraw: bool,
}

impl Chart {
    pub fn new(runtime: Handle, config: &Config) -> Self {
        Self {
            viewport: ViewportState::from_config(&config.viewport),
            input: InputState::default(),
            size: Dimensions::default(),
            runtime,
            fetch: config.fetch,
            caches: FxHashMap::default(),
            needs_redraw: false,
        }
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn size(&self) -> Dimensions {
        self.size
    }

    /// Returns `true` when the size actually changed.
    pub fn resize(&mut self, size: Dimensions) -> bool {
        if self.size == size {
            return false;
        }
        self.size = size;
        true
    }

    pub fn cursor(&self) -> CursorShape {
        self.input.cursor()
    }

    pub fn mouse_mode(&self) -> MouseMode {
        self.input.mode()
    }

    pub fn draw_resolution(&self) -> u32 {
        self.viewport.draw_resolution()
    }

    pub fn center_time(&self) -> f64 {
        self.viewport.center_time()
    }

    pub fn go_to(&mut self, time: f64) {
        self.viewport.go_to(time);
    }

    /// Adds a probe at the time under the horizontal center.
    pub fn add_probe(&self, project: &mut Project) -> ProjectEvent {
        project.add_probe(self.center_time())
    }

    pub fn handle(&mut self, event: InputEvent, project: &mut Project) -> Vec<Notification> {
        self.input
            .handle(event, &mut self.viewport, self.size, &mut project.probes)
    }

    pub fn release_input(&mut self) -> Vec<Notification> {
        self.input.reset()
    }

    pub fn on_project_event(&mut self, event: &ProjectEvent) {
        match event {
            ProjectEvent::Measurement(MeasurementEvent::Removed { id, .. }) => {
                self.caches.remove(id);
            }
            ProjectEvent::Cleared => self.caches.clear(),
            _ => {}
        }
    }

    /// Whether some cache is older than the current view.
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Sample window `[begin, end]` a measurement needs for the current view,
    /// `None` when nothing of it can be visible.
    pub fn fetch_window(&self, measurement: &Measurement) -> Option<FetchRequest> {
        if !measurement.any_visible() {
            return None;
        }

        let (min_offset, max_offset) = measurement.offset_range();
        let begin = self.viewport.left_bound_time(self.size) + min_offset;
        let end = self.viewport.right_bound_time(self.size) + max_offset;

        if end < 0.0 {
            return None;
        }

        Some(FetchRequest::with_slack(begin, end, self.draw_resolution()))
    }

    /// Brings the caches up to date with the view, waiting a bounded time
    /// on each source.
    pub fn refresh(&mut self, project: &Project) {
        let mut stale = false;

        for measurement in project.measurements() {
            let Some(request) = self.fetch_window(measurement) else {
                continue;
            };

            let cache = self
                .caches
                .entry(measurement.id())
                .or_insert_with(|| MeasurementCache::new(&self.runtime, &self.fetch));

            let source = measurement.source().clone();
            let status = cache.samples.fetch(request, move |r| {
                source.samples(r.start, r.end, r.resolution)
            });
            if status == FetchStatus::Stale {
                log::trace!("'{}' samples late, drawing cached data", measurement.name);
            }

            let source = measurement.source().clone();
            let events = FetchRequest {
                resolution: 0,
                ..request
            };
            cache
                .events
                .fetch(events, move |r| source.events(r.start, r.end));

            stale |= cache.needs_redraw();
        }

        self.needs_redraw = stale;
    }

    pub fn samples(&self, id: MeasurementId) -> &[Sample] {
        self.caches
            .get(&id)
            .map(|cache| cache.samples.cache().as_slice())
            .unwrap_or_default()
    }

    pub fn events(&self, id: MeasurementId) -> &[EventRecord] {
        self.caches
            .get(&id)
            .map(|cache| cache.events.cache().as_slice())
            .unwrap_or_default()
    }

    pub fn scene(&self, project: &Project, config: &Config) -> Scene {
        scene::build(self, project, config)
    }
}

impl std::fmt::Debug for Chart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chart")
            .field("viewport", &self.viewport)
            .field("size", &self.size)
            .field("caches", &self.caches.len())
            .field("needs_redraw", &self.needs_redraw)
            .finish()
    }
}
