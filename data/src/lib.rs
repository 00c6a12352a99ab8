pub mod chart;
pub mod config;
pub mod input;
pub mod probe;
pub mod project;
pub mod readings;
pub mod tables;
pub mod util;
pub mod viewport;

pub use chart::{Chart, Scene};
pub use config::{ColorRole, Config};
pub use input::{CursorShape, InputEvent, Key, MouseButton, Notification};
pub use probe::{Probe, ProbeEvent, ProbeId, Probes};
pub use project::{
    LineType, Measurement, MeasurementEvent, MeasurementId, Project, ProjectError, ProjectEvent,
    SensorField, SensorSettings, SettingError,
};
pub use readings::{ProbeReadings, ReadingTable};
pub use viewport::{Coord, Dimensions, ViewportState, ZoomMode};

use std::path::PathBuf;

/// Where the last session's project is kept between runs.
pub fn session_path() -> Option<PathBuf> {
    config::data_dir().map(|dir| dir.join("session.json"))
}

/// Where the application log is written.
pub fn log_path() -> Option<PathBuf> {
    config::data_dir().map(|dir| dir.join("tracescope.log"))
}
