pub mod tables;

use crate::Message;

use data::readings::ReadingTable;
use data::tables::{EventRow, StatisticRow};
use data::{MeasurementId, ProbeId, Project, SensorField};

use iced::Element;
use iced::widget::{button, column, row, text};
use rustc_hash::FxHashMap;

#[derive(thiserror::Error, Debug, Clone)]
pub enum SessionError {
    #[error("No data directory available")]
    NoDataDir,
    #[error("No saved session")]
    NotFound,
    #[error("Saving session failed: {0}")]
    Save(String),
    #[error("Loading session failed: {0}")]
    Load(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Probes,
    Events,
    Statistics,
    Measurements,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Probes, Tab::Events, Tab::Statistics, Tab::Measurements];
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tab::Probes => "Probes",
            Tab::Events => "Events",
            Tab::Statistics => "Statistics",
            Tab::Measurements => "Measurements",
        };
        write!(f, "{name}")
    }
}

/// Everything the side tables read from.
pub struct Panel<'a> {
    pub project: &'a Project,
    pub readings: &'a ReadingTable,
    pub events: &'a [EventRow],
    pub statistics: &'a [StatisticRow],
    pub probe_edits: &'a FxHashMap<ProbeId, String>,
    pub sensor_edits: &'a FxHashMap<(MeasurementId, usize, SensorField), String>,
}

pub fn side_panel<'a>(active: Tab, panel: Panel<'a>) -> Element<'a, Message> {
    let tabs = Tab::ALL.iter().fold(row![].spacing(2), |tabs, &tab| {
        let style = if tab == active {
            button::primary
        } else {
            button::secondary
        };

        tabs.push(
            button(text(tab.to_string()).size(12))
                .on_press(Message::SelectTab(tab))
                .style(style),
        )
    });

    let content = match active {
        Tab::Probes => tables::probes(panel.readings, panel.probe_edits),
        Tab::Events => tables::events(panel.events),
        Tab::Statistics => tables::statistics(panel.statistics),
        Tab::Measurements => tables::measurements(panel.project, panel.sensor_edits),
    };

    column![tabs, content].spacing(4).into()
}
