use crate::Message;

use data::readings::ReadingTable;
use data::tables::{EventRow, StatisticRow};
use data::{LineType, MeasurementId, ProbeId, Project, SensorField, SensorSettings};
use source::StatisticKind;

use iced::widget::{
    Column, Row, button, checkbox, column, container, pick_list, row, scrollable, text, text_input,
};
use iced::{Alignment, Element, Length, padding};
use rustc_hash::FxHashMap;

const TEXT_SIZE: f32 = 12.0;
const LABEL_WIDTH: f32 = 150.0;
const CELL_WIDTH: f32 = 96.0;

fn cell<'a>(content: impl ToString) -> Element<'a, Message> {
    container(text(content.to_string()).size(TEXT_SIZE))
        .width(Length::Fixed(CELL_WIDTH))
        .into()
}

fn label<'a>(content: impl ToString) -> Element<'a, Message> {
    container(text(content.to_string()).size(TEXT_SIZE))
        .width(Length::Fixed(LABEL_WIDTH))
        .into()
}

fn empty<'a>(message: &'a str) -> Element<'a, Message> {
    container(text(message).size(TEXT_SIZE))
        .padding(8)
        .into()
}

/// Probes as columns, one row per sensor. Clicking a header recenters the
/// chart on that probe; its time is edited in the row below.
pub fn probes<'a>(
    table: &'a ReadingTable,
    edits: &'a FxHashMap<ProbeId, String>,
) -> Element<'a, Message> {
    if table.columns.is_empty() {
        return empty("No probes. Press Enter over the chart or use Add probe.");
    }

    let mut header = Row::new().push(label("")).spacing(2);
    let mut times = Row::new().push(label("Time [s]")).spacing(2);

    for (index, probe) in table.columns.iter().enumerate() {
        let id = probe.id;

        header = header.push(
            row![
                button(text(&probe.label).size(TEXT_SIZE))
                    .on_press(Message::GoTo(probe.time))
                    .style(button::text)
                    .width(Length::Fill),
                button(text("x").size(TEXT_SIZE))
                    .on_press(Message::RemoveProbe(index))
                    .style(button::danger),
            ]
            .width(Length::Fixed(CELL_WIDTH))
            .align_y(Alignment::Center),
        );

        let value = edits
            .get(&id)
            .cloned()
            .unwrap_or_else(|| probe.time.to_string());

        times = times.push(
            text_input(&probe.time_text, &value)
                .on_input(move |value| Message::ProbeTimeInput(id, value))
                .on_submit(Message::ProbeTimeSubmit(id))
                .size(TEXT_SIZE)
                .width(Length::Fixed(CELL_WIDTH)),
        );
    }

    let rows = table.rows.iter().fold(Column::new().spacing(2), |rows, reading_row| {
        let cells = reading_row
            .readings
            .iter()
            .fold(Row::new().push(label(&reading_row.label)).spacing(2), |cells, reading| {
                cells.push(cell(reading))
            });
        rows.push(cells)
    });

    scrollable(column![header, times, rows].spacing(4))
        .direction(scrollable::Direction::Both {
            vertical: scrollable::Scrollbar::default(),
            horizontal: scrollable::Scrollbar::default(),
        })
        .into()
}

pub fn events(rows: &[EventRow]) -> Element<'_, Message> {
    if rows.is_empty() {
        return empty("No events recorded.");
    }

    let list = rows.iter().fold(Column::new().spacing(1), |list, event| {
        list.push(
            button(
                row![cell(&event.time_text), text(&event.text).size(TEXT_SIZE)].spacing(4),
            )
            .on_press(Message::GoTo(event.time))
            .style(button::text)
            .width(Length::Fill),
        )
    });

    scrollable(list).into()
}

pub fn statistics(rows: &[StatisticRow]) -> Element<'_, Message> {
    if rows.is_empty() {
        return empty("No measurements loaded.");
    }

    let header = StatisticKind::ALL
        .iter()
        .fold(Row::new().push(label("")).spacing(2), |header, kind| {
            header.push(cell(kind.label()))
        });

    let body = rows.iter().fold(Column::new().spacing(2), |body, statistic| {
        let cells = statistic
            .values
            .iter()
            .fold(Row::new().push(label(&statistic.label)).spacing(2), |cells, value| {
                cells.push(cell(value))
            });
        body.push(cells)
    });

    scrollable(column![header, body].spacing(4))
        .direction(scrollable::Direction::Both {
            vertical: scrollable::Scrollbar::default(),
            horizontal: scrollable::Scrollbar::default(),
        })
        .into()
}

/// Measurement tree: visibility toggles, trace style and offsets.
pub fn measurements<'a>(
    project: &'a Project,
    edits: &'a FxHashMap<(MeasurementId, usize, SensorField), String>,
) -> Element<'a, Message> {
    let add = pick_list(crate::demo::ALL, None::<&'static str>, Message::AddSource)
        .placeholder("Add measurement")
        .text_size(TEXT_SIZE);

    let mut list = Column::new().spacing(6).push(add);

    for measurement in project.measurements() {
        let id = measurement.id();

        let title = row![
            checkbox(measurement.any_visible())
                .label(measurement.name.clone())
                .text_size(TEXT_SIZE)
                .on_toggle(move |_| Message::ToggleMeasurement(id)),
            button(text("Remove").size(TEXT_SIZE))
                .on_press(Message::RemoveMeasurement(id))
                .style(button::danger),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let sensors = measurement
            .sensors
            .iter()
            .enumerate()
            .fold(Column::new().spacing(2), |sensors, (index, settings)| {
                sensors.push(sensor_row(id, index, settings, edits))
            });

        list = list.push(column![title, container(sensors).padding(padding::left(16))]);
    }

    scrollable(list).into()
}

fn sensor_row<'a>(
    id: MeasurementId,
    sensor: usize,
    settings: &'a SensorSettings,
    edits: &'a FxHashMap<(MeasurementId, usize, SensorField), String>,
) -> Element<'a, Message> {
    let input = |field: SensorField, width: f32| {
        let value = edits
            .get(&(id, sensor, field))
            .cloned()
            .unwrap_or_else(|| settings.field(field));

        text_input(&field.to_string(), &value)
            .on_input(move |value| Message::SensorInput(id, sensor, field, value))
            .on_submit(Message::SensorSubmit(id, sensor, field))
            .size(TEXT_SIZE)
            .width(Length::Fixed(width))
    };

    let color = settings.color;
    let swatch = container(text(""))
        .width(Length::Fixed(12.0))
        .height(Length::Fixed(12.0))
        .style(move |_| container::Style {
            background: Some(color.into()),
            ..container::Style::default()
        });

    row![
        checkbox(settings.visible)
            .label(format!("{} [{}]", settings.name, settings.unit))
            .text_size(TEXT_SIZE)
            .on_toggle(move |_| Message::ToggleSensor(id, sensor))
            .width(Length::Fixed(LABEL_WIDTH)),
        swatch,
        pick_list(LineType::ALL, Some(settings.line_type), move |line_type| {
            Message::SetLineType(id, sensor, line_type)
        })
        .text_size(TEXT_SIZE),
        input(SensorField::OffsetX, 64.0),
        input(SensorField::OffsetY, 64.0),
        input(SensorField::Color, 80.0),
        input(SensorField::Comment, 120.0),
    ]
    .spacing(4)
    .align_y(Alignment::Center)
    .into()
}
