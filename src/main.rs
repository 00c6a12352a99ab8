mod demo;
mod logger;
mod screen;
mod widget;

use data::readings::ReadingTable;
use data::tables::{self, EventRow, StatisticRow};
use data::{
    Chart, Config, LineType, MeasurementId, Notification, ProbeId, ProbeReadings, Project,
    ProjectEvent, SensorField,
};
use screen::{SessionError, Tab};
use widget::chart::{TraceChart, TraceChartEvent};

use iced::widget::{button, column, container, row, space, text};
use iced::{Alignment, Element, Length, Subscription, Task, Theme, padding};
use rustc_hash::FxHashMap;

use std::sync::Arc;

fn main() -> iced::Result {
    if let Err(err) = logger::setup(cfg!(debug_assertions)) {
        eprintln!("Failed to set up logging: {err}");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("tracescope-fetch")
        .worker_threads(2)
        .enable_time()
        .build()
        .map(Arc::new)
        .map_err(iced::Error::ExecutorCreationFailed)?;

    log::info!("Starting tracescope");

    iced::application(
        move || Tracescope::boot(Arc::clone(&runtime)),
        Tracescope::update,
        Tracescope::view,
    )
    .title(Tracescope::title)
    .subscription(Tracescope::subscription)
    .theme(Tracescope::theme)
    .run()
}

#[derive(Debug, Clone)]
pub enum Message {
    Chart(TraceChartEvent),
    Retry,
    SelectTab(Tab),
    AddProbe,
    RemoveProbe(usize),
    GoTo(f64),
    ProbeTimeInput(ProbeId, String),
    ProbeTimeSubmit(ProbeId),
    AddSource(&'static str),
    RemoveMeasurement(MeasurementId),
    ToggleMeasurement(MeasurementId),
    ToggleSensor(MeasurementId, usize),
    SetLineType(MeasurementId, usize, LineType),
    SensorInput(MeasurementId, usize, SensorField, String),
    SensorSubmit(MeasurementId, usize, SensorField),
    SaveSession,
    LoadSession,
    ClearProject,
}

impl From<TraceChartEvent> for Message {
    fn from(event: TraceChartEvent) -> Self {
        Message::Chart(event)
    }
}

struct Tracescope {
    // Fetch jobs run here; held so it outlives every pending job.
    _runtime: Arc<tokio::runtime::Runtime>,
    config: Config,
    project: Project,
    chart: Chart,
    readings: ProbeReadings,
    reading_table: ReadingTable,
    event_rows: Vec<EventRow>,
    statistic_rows: Vec<StatisticRow>,
    probe_edits: FxHashMap<ProbeId, String>,
    sensor_edits: FxHashMap<(MeasurementId, usize, SensorField), String>,
    tab: Tab,
    status: Option<String>,
    version: u64,
}

impl Tracescope {
    fn boot(runtime: Arc<tokio::runtime::Runtime>) -> (Self, Task<Message>) {
        let config = Config::load_or_default();
        let chart = Chart::new(runtime.handle().clone(), &config);

        let mut app = Self {
            readings: ProbeReadings::new(chart.draw_resolution()),
            _runtime: runtime,
            config,
            project: Project::default(),
            chart,
            reading_table: ReadingTable::default(),
            event_rows: Vec::new(),
            statistic_rows: Vec::new(),
            probe_edits: FxHashMap::default(),
            sensor_edits: FxHashMap::default(),
            tab: Tab::default(),
            status: None,
            version: 0,
        };

        match app.load_session() {
            Ok(()) => {}
            Err(SessionError::NotFound) => {
                log::info!("No saved session, opening the demo measurements");
                for name in demo::ALL {
                    app.add_source(name);
                }
            }
            Err(err) => {
                log::warn!("{err}");
                app.status = Some(err.to_string());
            }
        }

        (app, Task::none())
    }

    fn title(&self) -> String {
        match self.project.file.as_ref().and_then(|p| p.file_name()) {
            Some(name) => format!("tracescope - {}", name.to_string_lossy()),
            None => "tracescope".to_string(),
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Chart(TraceChartEvent::Input(event)) => {
                let notifications = self.chart.handle(event, &mut self.project);
                self.apply(notifications);
            }
            Message::Chart(TraceChartEvent::Resized(size)) => {
                if self.chart.resize(size) {
                    self.refresh_chart();
                }
            }
            Message::Chart(TraceChartEvent::FocusLost) => {
                let notifications = self.chart.release_input();
                self.apply(notifications);
            }
            Message::Retry => self.refresh_chart(),
            Message::SelectTab(tab) => self.tab = tab,
            Message::AddProbe => {
                let event = self.chart.add_probe(&mut self.project);
                self.on_project_event(event);
            }
            Message::RemoveProbe(index) => {
                if let Some(event) = self.project.remove_probe(index) {
                    self.on_project_event(event);
                }
            }
            Message::GoTo(time) => {
                self.chart.go_to(time);
                self.refresh_chart();
            }
            Message::ProbeTimeInput(id, value) => {
                self.probe_edits.insert(id, value);
            }
            Message::ProbeTimeSubmit(id) => {
                let Some(value) = self.probe_edits.remove(&id) else {
                    return Task::none();
                };

                match value.trim().parse::<f64>() {
                    Ok(time) if time.is_finite() => {
                        if let Some(event) = self.project.set_probe_time(id, time) {
                            self.on_project_event(event);
                        }
                    }
                    _ => self.status = Some(format!("'{value}' is not a time in seconds")),
                }
            }
            Message::AddSource(name) => self.add_source(name),
            Message::RemoveMeasurement(id) => {
                if let Some(event) = self.project.remove_measurement_id(id) {
                    self.sensor_edits.retain(|(m, _, _), _| *m != id);
                    self.on_project_event(event);
                }
            }
            Message::ToggleMeasurement(id) => {
                if let Some(event) = self.project.toggle_measurement(id) {
                    self.on_project_event(event);
                }
            }
            Message::ToggleSensor(id, sensor) => {
                if let Some(event) = self.project.toggle_sensor(id, sensor) {
                    self.on_project_event(event);
                }
            }
            Message::SetLineType(id, sensor, line_type) => {
                if let Some(event) = self
                    .project
                    .update_sensor(id, sensor, |s| s.line_type = line_type)
                {
                    self.on_project_event(event);
                }
            }
            Message::SensorInput(id, sensor, field, value) => {
                self.sensor_edits.insert((id, sensor, field), value);
            }
            Message::SensorSubmit(id, sensor, field) => {
                let Some(value) = self.sensor_edits.remove(&(id, sensor, field)) else {
                    return Task::none();
                };

                match self.project.set_sensor_field(id, sensor, field, &value) {
                    Ok(Some(event)) => self.on_project_event(event),
                    Ok(None) => {}
                    Err(err) => self.status = Some(err.to_string()),
                }
            }
            Message::SaveSession => {
                self.status = Some(match self.save_session() {
                    Ok(()) => "Session saved".to_string(),
                    Err(err) => {
                        log::error!("{err}");
                        err.to_string()
                    }
                });
            }
            Message::LoadSession => {
                if let Err(err) = self.load_session() {
                    log::warn!("{err}");
                    self.status = Some(err.to_string());
                }
            }
            Message::ClearProject => {
                let event = self.project.clear();
                self.probe_edits.clear();
                self.sensor_edits.clear();
                self.on_project_event(event);
            }
        }

        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let chart: Element<'_, Message> =
            TraceChart::new(&self.chart, &self.project, &self.config)
                .version(self.version)
                .into();

        let side = screen::side_panel(
            self.tab,
            screen::Panel {
                project: &self.project,
                readings: &self.reading_table,
                events: &self.event_rows,
                statistics: &self.statistic_rows,
                probe_edits: &self.probe_edits,
                sensor_edits: &self.sensor_edits,
            },
        );

        let body = row![
            container(chart)
                .width(Length::FillPortion(3))
                .height(Length::Fill),
            container(side)
                .width(Length::FillPortion(2))
                .height(Length::Fill)
                .padding(padding::left(4)),
        ];

        column![self.toolbar(), body]
            .spacing(4)
            .padding(4)
            .into()
    }

    fn toolbar(&self) -> Element<'_, Message> {
        let viewport = self.chart.viewport();
        let info = text(format!(
            "zoom {}x  resolution {}  center {}",
            viewport.zoom(),
            self.chart.draw_resolution(),
            data::util::format_time(self.chart.center_time()),
        ))
        .size(12);

        let status = text(self.status.clone().unwrap_or_default()).size(12);

        row![
            button(text("Add probe").size(12)).on_press(Message::AddProbe),
            button(text("Save").size(12)).on_press(Message::SaveSession),
            button(text("Load").size(12)).on_press(Message::LoadSession),
            button(text("Clear").size(12)).on_press(Message::ClearProject),
            status,
            space::horizontal(),
            info,
        ]
        .spacing(4)
        .align_y(Alignment::Center)
        .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        // Poll for late fetch results only while something is still stale.
        if self.chart.needs_redraw() {
            iced::time::every(self.config.fetch.retry()).map(|_| Message::Retry)
        } else {
            Subscription::none()
        }
    }

    fn apply(&mut self, notifications: Vec<Notification>) {
        let mut moved = false;

        for notification in notifications {
            match notification {
                Notification::ResolutionChanged(resolution) => {
                    log::debug!("Draw resolution now {resolution}");
                    self.readings.set_resolution(resolution);
                    self.rebuild_readings();
                    moved = true;
                }
                Notification::Probe(event) => self.on_project_event(event.into()),
                Notification::ViewMoved => moved = true,
                Notification::CursorChanged(_) => {}
            }
        }

        if moved {
            self.refresh_chart();
        }
        self.version += 1;
    }

    fn on_project_event(&mut self, event: ProjectEvent) {
        log::debug!("{event:?}");

        self.chart.on_project_event(&event);
        self.readings.invalidate();
        self.rebuild_readings();

        if matches!(event, ProjectEvent::Measurement(_) | ProjectEvent::Cleared) {
            self.event_rows = tables::event_rows(&self.project);
            self.statistic_rows = tables::statistic_rows(&self.project);
            self.refresh_chart();
        }
        self.version += 1;
    }

    fn rebuild_readings(&mut self) {
        self.reading_table = self.readings.table(&self.project);
        self.probe_edits
            .retain(|id, _| self.project.probes.index_of(*id).is_some());
    }

    fn refresh_chart(&mut self) {
        self.chart.refresh(&self.project);
        self.version += 1;
    }

    fn add_source(&mut self, name: &str) {
        match demo::resolve(name) {
            Some(source) => {
                let event = self.project.add_measurement(source);
                self.on_project_event(event);
            }
            None => log::warn!("No source named '{name}'"),
        }
    }

    fn save_session(&mut self) -> Result<(), SessionError> {
        let path = data::session_path().ok_or(SessionError::NoDataDir)?;
        self.project
            .save(&path)
            .map_err(|err| SessionError::Save(err.to_string()))?;

        log::info!("Session saved to {}", path.display());
        Ok(())
    }

    fn load_session(&mut self) -> Result<(), SessionError> {
        let path = data::session_path().ok_or(SessionError::NoDataDir)?;
        if !path.exists() {
            return Err(SessionError::NotFound);
        }

        let (project, skipped) = Project::load(&path, demo::resolve)
            .map_err(|err| SessionError::Load(err.to_string()))?;

        let event = self.project.clear();
        self.chart.on_project_event(&event);
        self.project = project;
        self.probe_edits.clear();
        self.sensor_edits.clear();
        self.on_project_event(ProjectEvent::Cleared);

        self.status = Some(if skipped.is_empty() {
            format!("Loaded {}", path.display())
        } else {
            format!(
                "Loaded {} ({} measurement(s) skipped)",
                path.display(),
                skipped.len()
            )
        });
        Ok(())
    }
}
