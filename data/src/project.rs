use crate::config::{color, sensor_color};
use crate::probe::{ProbeEvent, ProbeId, Probes};

use iced_core::Color;
use serde::{Deserialize, Serialize};
use source::DataSource;
use uuid::Uuid;

use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Project I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid project file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No source named '{0}'")]
    MissingSource(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasurementId(Uuid);

impl MeasurementId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineType {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineType {
    pub const ALL: [LineType; 3] = [LineType::Solid, LineType::Dashed, LineType::Dotted];
}

impl std::fmt::Display for LineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LineType::Solid => "Solid",
            LineType::Dashed => "Dashed",
            LineType::Dotted => "Dotted",
        };
        write!(f, "{name}")
    }
}

/// How one sensor of a measurement is shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSettings {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    #[serde(default = "visible")]
    pub visible: bool,
    #[serde(with = "color::hex")]
    pub color: Color,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub line_type: LineType,
}

fn visible() -> bool {
    true
}

/// The sensor settings that are edited as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorField {
    OffsetX,
    OffsetY,
    Color,
    Comment,
}

impl std::fmt::Display for SensorField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SensorField::OffsetX => "time offset",
            SensorField::OffsetY => "value offset",
            SensorField::Color => "color",
            SensorField::Comment => "comment",
        };
        write!(f, "{name}")
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("'{value}' is not a valid {field}")]
pub struct SettingError {
    pub field: SensorField,
    pub value: String,
}

impl SensorSettings {
    pub fn field(&self, field: SensorField) -> String {
        match field {
            SensorField::OffsetX => self.offset_x.to_string(),
            SensorField::OffsetY => self.offset_y.to_string(),
            SensorField::Color => color::color_to_hex(self.color),
            SensorField::Comment => self.comment.clone(),
        }
    }

    /// Parses `text` into `field`. Leaves the settings untouched on error.
    pub fn set_field(&mut self, field: SensorField, text: &str) -> Result<(), SettingError> {
        let invalid = || SettingError {
            field,
            value: text.to_string(),
        };

        match field {
            SensorField::OffsetX | SensorField::OffsetY => {
                let value = text
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(invalid)?;

                if field == SensorField::OffsetX {
                    self.offset_x = value;
                } else {
                    self.offset_y = value;
                }
            }
            SensorField::Color => {
                self.color = color::hex_to_color(text.trim()).ok_or_else(invalid)?;
            }
            SensorField::Comment => self.comment = text.to_string(),
        }

        Ok(())
    }
}

pub struct Measurement {
    id: MeasurementId,
    pub name: String,
    source: Arc<dyn DataSource>,
    pub sensors: Vec<SensorSettings>,
}

impl Measurement {
    /// Sensor colors continue from `first_color` so traces of different
    /// measurements stay apart.
    pub fn new(source: Arc<dyn DataSource>, first_color: usize) -> Self {
        let sensors = source
            .sensors()
            .into_iter()
            .enumerate()
            .map(|(i, sensor)| SensorSettings {
                name: sensor.name,
                unit: sensor.unit,
                offset_x: 0.0,
                offset_y: 0.0,
                visible: true,
                color: sensor_color(first_color + i),
                comment: String::new(),
                line_type: LineType::Solid,
            })
            .collect();

        Self {
            id: MeasurementId::new(),
            name: source.name(),
            source,
            sensors,
        }
    }

    pub fn id(&self) -> MeasurementId {
        self.id
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    pub fn any_visible(&self) -> bool {
        self.sensors.iter().any(|s| s.visible)
    }

    /// Smallest and largest horizontal offset over all sensors.
    pub fn offset_range(&self) -> (f64, f64) {
        let mut offsets = self.sensors.iter().map(|s| s.offset_x);
        let Some(first) = offsets.next() else {
            return (0.0, 0.0);
        };

        offsets.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)))
    }

    /// Display label of a sensor row, `measurement - sensor`.
    pub fn sensor_label(&self, sensor: usize) -> Option<String> {
        self.sensors
            .get(sensor)
            .map(|s| format!("{} - {}", self.name, s.name))
    }
}

impl std::fmt::Debug for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Measurement")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("sensors", &self.sensors.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementEvent {
    Added { id: MeasurementId, index: usize },
    Updated { id: MeasurementId, index: usize },
    Removed { id: MeasurementId, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectEvent {
    Measurement(MeasurementEvent),
    Probe(ProbeEvent),
    Cleared,
}

impl From<ProbeEvent> for ProjectEvent {
    fn from(event: ProbeEvent) -> Self {
        ProjectEvent::Probe(event)
    }
}

impl From<MeasurementEvent> for ProjectEvent {
    fn from(event: MeasurementEvent) -> Self {
        ProjectEvent::Measurement(event)
    }
}

#[derive(Debug, Default)]
pub struct Project {
    pub file: Option<PathBuf>,
    measurements: Vec<Measurement>,
    pub probes: Probes,
}

impl Project {
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn measurement(&self, id: MeasurementId) -> Option<(usize, &Measurement)> {
        self.measurements
            .iter()
            .enumerate()
            .find(|(_, m)| m.id == id)
    }

    fn index_of(&self, id: MeasurementId) -> Option<usize> {
        self.measurements.iter().position(|m| m.id == id)
    }

    pub fn add_measurement(&mut self, source: Arc<dyn DataSource>) -> ProjectEvent {
        let first_color = self.measurements.iter().map(|m| m.sensors.len()).sum();
        self.push_measurement(Measurement::new(source, first_color))
    }

    fn push_measurement(&mut self, measurement: Measurement) -> ProjectEvent {
        let id = measurement.id;
        log::info!("Adding measurement '{}'", measurement.name);
        self.measurements.push(measurement);

        MeasurementEvent::Added {
            id,
            index: self.measurements.len() - 1,
        }
        .into()
    }

    pub fn remove_measurement(&mut self, index: usize) -> Option<ProjectEvent> {
        if index >= self.measurements.len() {
            return None;
        }
        let measurement = self.measurements.remove(index);

        Some(
            MeasurementEvent::Removed {
                id: measurement.id,
                index,
            }
            .into(),
        )
    }

    pub fn remove_measurement_id(&mut self, id: MeasurementId) -> Option<ProjectEvent> {
        self.index_of(id)
            .and_then(|index| self.remove_measurement(index))
    }

    pub fn rename_measurement(&mut self, id: MeasurementId, name: String) -> Option<ProjectEvent> {
        let index = self.index_of(id)?;
        self.measurements[index].name = name;

        Some(MeasurementEvent::Updated { id, index }.into())
    }

    /// Edits one sensor's settings in place.
    pub fn update_sensor(
        &mut self,
        id: MeasurementId,
        sensor: usize,
        edit: impl FnOnce(&mut SensorSettings),
    ) -> Option<ProjectEvent> {
        let index = self.index_of(id)?;
        let settings = self.measurements[index].sensors.get_mut(sensor)?;
        edit(settings);

        Some(MeasurementEvent::Updated { id, index }.into())
    }

    /// Applies a text edit to one sensor. `Ok(None)` when the sensor is gone.
    pub fn set_sensor_field(
        &mut self,
        id: MeasurementId,
        sensor: usize,
        field: SensorField,
        text: &str,
    ) -> Result<Option<ProjectEvent>, SettingError> {
        let Some(index) = self.index_of(id) else {
            return Ok(None);
        };
        let Some(settings) = self.measurements[index].sensors.get_mut(sensor) else {
            return Ok(None);
        };
        settings.set_field(field, text)?;

        Ok(Some(MeasurementEvent::Updated { id, index }.into()))
    }

    pub fn toggle_sensor(&mut self, id: MeasurementId, sensor: usize) -> Option<ProjectEvent> {
        self.update_sensor(id, sensor, |s| s.visible = !s.visible)
    }

    /// Shows every sensor when any is hidden, hides them all otherwise.
    pub fn toggle_measurement(&mut self, id: MeasurementId) -> Option<ProjectEvent> {
        let index = self.index_of(id)?;
        let sensors = &mut self.measurements[index].sensors;

        let show = sensors.iter().any(|s| !s.visible);
        for settings in sensors.iter_mut() {
            settings.visible = show;
        }

        Some(MeasurementEvent::Updated { id, index }.into())
    }

    pub fn add_probe(&mut self, time: f64) -> ProjectEvent {
        self.probes.push(time).into()
    }

    pub fn remove_probe(&mut self, index: usize) -> Option<ProjectEvent> {
        self.probes.remove(index).map(ProjectEvent::from)
    }

    pub fn set_probe_time(&mut self, id: ProbeId, time: f64) -> Option<ProjectEvent> {
        self.probes.set_time(id, time).map(ProjectEvent::from)
    }

    pub fn clear(&mut self) -> ProjectEvent {
        self.measurements.clear();
        self.probes.clear();
        self.file = None;
        ProjectEvent::Cleared
    }

    pub fn to_document(&self) -> ProjectDocument {
        ProjectDocument {
            measurements: self
                .measurements
                .iter()
                .map(|m| MeasurementDocument {
                    source: m.source.name(),
                    name: m.name.clone(),
                    sensors: m.sensors.clone(),
                })
                .collect(),
            probes: self.probes.iter().map(|p| p.time()).collect(),
        }
    }

    pub fn save(&mut self, path: &Path) -> Result<(), ProjectError> {
        let json = serde_json::to_string_pretty(&self.to_document())?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;

        self.file = Some(path.to_path_buf());
        Ok(())
    }

    /// Reads a project, re-attaching each measurement to the source
    /// `resolve` returns for its stored source name.
    ///
    /// Measurements whose source cannot be resolved are skipped and listed
    /// in the returned errors.
    pub fn load<F>(path: &Path, resolve: F) -> Result<(Self, Vec<ProjectError>), ProjectError>
    where
        F: Fn(&str) -> Option<Arc<dyn DataSource>>,
    {
        let text = std::fs::read_to_string(path)?;
        let document: ProjectDocument = serde_json::from_str(&text)?;

        let (mut project, skipped) = Self::from_document(document, resolve);
        project.file = Some(path.to_path_buf());
        Ok((project, skipped))
    }

    pub fn from_document<F>(document: ProjectDocument, resolve: F) -> (Self, Vec<ProjectError>)
    where
        F: Fn(&str) -> Option<Arc<dyn DataSource>>,
    {
        let mut project = Project::default();
        let mut skipped = Vec::new();

        for stored in document.measurements {
            let Some(source) = resolve(&stored.source) else {
                log::warn!("Skipping '{}': source '{}' not found", stored.name, stored.source);
                skipped.push(ProjectError::MissingSource(stored.source));
                continue;
            };

            let mut measurement = Measurement::new(source, 0);
            measurement.name = stored.name;
            for (settings, saved) in measurement.sensors.iter_mut().zip(stored.sensors) {
                *settings = saved;
            }
            project.push_measurement(measurement);
        }

        for time in document.probes {
            project.probes.push(time);
        }

        (project, skipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementDocument {
    pub source: String,
    pub name: String,
    pub sensors: Vec<SensorSettings>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDocument {
    pub measurements: Vec<MeasurementDocument>,
    pub probes: Vec<f64>,
}
