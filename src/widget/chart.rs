use data::chart::scene::{Line, Scene};
use data::input::{CursorShape, InputEvent, Key, MouseButton};
use data::{Chart, Config, Coord, Dimensions, LineType, Project};

use iced::advanced::widget::tree::{self, Tree};
use iced::advanced::{self, Clipboard, Layout, Shell, Widget, layout, renderer};
use iced::keyboard::{self, key};
use iced::widget::canvas;
use iced::{Element, Event, Length, Point, Rectangle, Renderer, Size, Theme, Vector, mouse, window};

const TEXT_SIZE: f32 = 12.0;
const TRACE_WIDTH: f32 = 1.5;
const MARKER_RADIUS: f32 = 3.0;

const DASHED: &[f32] = &[6.0, 4.0];
const DOTTED: &[f32] = &[1.5, 3.0];

#[derive(Debug, Clone, PartialEq)]
pub enum TraceChartEvent {
    Input(InputEvent),
    Resized(Dimensions),
    FocusLost,
}

struct State {
    plot_cache: canvas::Cache,
    overlay_cache: canvas::Cache,
    last_cache_rev: u64,
    last_size: Option<Size>,
    last_hover: Option<Coord>,
    focused: bool,
    dragging: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            plot_cache: canvas::Cache::new(),
            overlay_cache: canvas::Cache::new(),
            last_cache_rev: 0,
            last_size: None,
            last_hover: None,
            focused: false,
            dragging: false,
        }
    }
}

impl State {
    fn clear_all_caches(&mut self) {
        self.plot_cache.clear();
        self.overlay_cache.clear();
    }
}

/// Draws a [`Chart`] and turns mouse and keyboard input over it into
/// [`TraceChartEvent`]s.
pub struct TraceChart<'a> {
    chart: &'a Chart,
    project: &'a Project,
    config: &'a Config,
    version: u64,
}

impl<'a> TraceChart<'a> {
    pub fn new(chart: &'a Chart, project: &'a Project, config: &'a Config) -> Self {
        Self {
            chart,
            project,
            config,
            version: 0,
        }
    }

    pub fn version(mut self, rev: u64) -> Self {
        self.version = rev;
        self
    }

    /// Screen pixels to the logical pixels the input handling works in.
    fn logical(&self, p: Point) -> Coord {
        let zoom = self.chart.viewport().zoom().max(1) as f32;
        Coord::new(f64::from(p.x / zoom), f64::from(p.y / zoom))
    }

    fn to_screen(&self, c: Coord) -> Point {
        let (x, y) = self.chart.viewport().to_screen(self.chart.size(), c);
        Point::new(x as f32, y as f32)
    }

    fn stroke_line(&self, frame: &mut canvas::Frame, line: &Line, stroke: canvas::Stroke<'_>) {
        let path = canvas::Path::line(self.to_screen(line.from), self.to_screen(line.to));
        frame.stroke(&path, stroke);
    }

    fn label(&self, frame: &mut canvas::Frame, at: Coord, content: String, color: iced::Color) {
        frame.fill_text(canvas::Text {
            content,
            position: self.to_screen(at),
            color,
            size: TEXT_SIZE.into(),
            align_x: iced::Alignment::Start.into(),
            align_y: iced::Alignment::End.into(),
            ..Default::default()
        });
    }

    fn fill_plot(&self, frame: &mut canvas::Frame, scene: &Scene) {
        frame.fill_rectangle(Point::ORIGIN, frame.size(), scene.background);

        let grid = canvas::Stroke::default()
            .with_color(scene.grid_color)
            .with_width(1.0);
        for line in &scene.grid {
            self.stroke_line(frame, line, grid);
        }

        if let Some(zero) = &scene.zero_line {
            let stroke = canvas::Stroke::default()
                .with_color(scene.zero_color)
                .with_width(1.0);
            self.stroke_line(frame, zero, stroke);
        }

        for label in &scene.value_labels {
            self.label(frame, label.at, label.text.clone(), scene.text_color);
        }
        for label in &scene.time_labels {
            self.label(frame, label.at, label.text.clone(), scene.text_color);
        }

        for event in &scene.events {
            let stroke = canvas::Stroke::default()
                .with_color(event.color)
                .with_width(1.0);
            self.stroke_line(frame, &event.line, stroke);
        }

        for trace in &scene.traces {
            let mut points = trace.points.iter().map(|p| self.to_screen(*p));
            let Some(first) = points.next() else {
                continue;
            };

            let path = canvas::Path::new(|b| {
                b.move_to(first);
                for point in points {
                    b.line_to(point);
                }
            });

            let mut stroke = canvas::Stroke::default()
                .with_color(trace.color)
                .with_width(TRACE_WIDTH);
            stroke.line_dash = match trace.line_type {
                LineType::Solid => canvas::LineDash::default(),
                LineType::Dashed => canvas::LineDash {
                    segments: DASHED,
                    offset: 0,
                },
                LineType::Dotted => canvas::LineDash {
                    segments: DOTTED,
                    offset: 0,
                },
            };
            frame.stroke(&path, stroke);
        }

        let probe = canvas::Stroke::default()
            .with_color(scene.probe_color)
            .with_width(1.0);
        for mark in &scene.probes {
            self.stroke_line(frame, &mark.line, probe);
            self.label(frame, mark.label.at, mark.label.text.clone(), scene.probe_color);
        }
    }

    fn fill_overlay(&self, frame: &mut canvas::Frame, scene: &Scene) {
        for marker in &scene.markers {
            let at = self.to_screen(marker.at);
            frame.fill(&canvas::Path::circle(at, MARKER_RADIUS), marker.color);
            frame.fill_text(canvas::Text {
                content: marker.text.clone(),
                position: at + Vector::new(6.0, -6.0),
                color: scene.text_color,
                size: TEXT_SIZE.into(),
                align_x: iced::Alignment::Start.into(),
                align_y: iced::Alignment::End.into(),
                ..Default::default()
            });
        }
    }
}

impl<'a, M> Widget<M, Theme, Renderer> for TraceChart<'a>
where
    M: Clone + 'static + From<TraceChartEvent>,
{
    fn tag(&self) -> tree::Tag {
        tree::Tag::of::<State>()
    }

    fn state(&self) -> tree::State {
        tree::State::new(State::default())
    }

    fn size(&self) -> Size<Length> {
        Size {
            width: Length::Fill,
            height: Length::Fill,
        }
    }

    fn layout(
        &mut self,
        _tree: &mut Tree,
        _renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        layout::atomic(limits, Length::Fill, Length::Fill)
    }

    fn update(
        &mut self,
        tree: &mut Tree,
        event: &Event,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn Clipboard,
        shell: &mut Shell<'_, M>,
        _viewport: &Rectangle,
    ) {
        if shell.is_event_captured() {
            return;
        }

        let state = tree.state.downcast_mut::<State>();
        let bounds = layout.bounds();

        match event {
            Event::Mouse(mouse_event) => {
                let inside = cursor.position_in(bounds);

                match mouse_event {
                    mouse::Event::WheelScrolled { delta } => {
                        if inside.is_none() {
                            return;
                        }
                        let y = match delta {
                            mouse::ScrollDelta::Lines { y, .. }
                            | mouse::ScrollDelta::Pixels { y, .. } => *y,
                        };
                        shell.publish(M::from(TraceChartEvent::Input(InputEvent::Wheel {
                            delta: f64::from(y),
                        })));
                    }
                    mouse::Event::ButtonPressed(button) => {
                        let Some(position) = inside else {
                            state.focused = false;
                            return;
                        };
                        state.focused = true;
                        state.dragging |= *button == mouse::Button::Left;

                        shell.publish(M::from(TraceChartEvent::Input(
                            InputEvent::ButtonPressed {
                                button: map_button(*button),
                                position: self.logical(position),
                            },
                        )));
                    }
                    mouse::Event::ButtonReleased(button) => {
                        if inside.is_none() && !state.dragging {
                            return;
                        }
                        if *button == mouse::Button::Left {
                            state.dragging = false;
                        }

                        shell.publish(M::from(TraceChartEvent::Input(
                            InputEvent::ButtonReleased {
                                button: map_button(*button),
                            },
                        )));
                    }
                    mouse::Event::CursorMoved { position } => {
                        if inside.is_none() && !state.dragging {
                            return;
                        }
                        let local = Point::new(position.x - bounds.x, position.y - bounds.y);

                        shell.publish(M::from(TraceChartEvent::Input(InputEvent::CursorMoved {
                            position: self.logical(local),
                        })));
                    }
                    _ => {}
                }
            }
            Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) => {
                if !state.focused {
                    return;
                }
                if let Some(key) = map_key(key) {
                    shell.publish(M::from(TraceChartEvent::Input(InputEvent::KeyPressed(key))));
                }
            }
            Event::Keyboard(keyboard::Event::KeyReleased { key, .. }) => {
                // releases always go through so no key stays held
                if let Some(key) = map_key(key) {
                    shell.publish(M::from(TraceChartEvent::Input(InputEvent::KeyReleased(
                        key,
                    ))));
                }
            }
            Event::Window(window::Event::Unfocused) => {
                state.focused = false;
                state.dragging = false;
                shell.publish(M::from(TraceChartEvent::FocusLost));
            }
            Event::Window(window::Event::RedrawRequested(_)) => {
                if state.last_cache_rev != self.version {
                    state.clear_all_caches();
                    state.last_cache_rev = self.version;
                }

                let hover = self.chart.input().last_position();
                if state.last_hover != hover {
                    state.overlay_cache.clear();
                    state.last_hover = hover;
                }

                let size = bounds.size();
                if state.last_size != Some(size) {
                    state.last_size = Some(size);
                    state.clear_all_caches();
                    shell.publish(M::from(TraceChartEvent::Resized(Dimensions::new(
                        f64::from(size.width),
                        f64::from(size.height),
                    ))));
                }
            }
            _ => {}
        }
    }

    fn draw(
        &self,
        tree: &Tree,
        renderer: &mut Renderer,
        _theme: &Theme,
        _style: &renderer::Style,
        layout: Layout<'_>,
        _cursor: mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        use advanced::Renderer as _;

        let state = tree.state.downcast_ref::<State>();
        let bounds = layout.bounds();
        let scene = self.chart.scene(self.project, self.config);

        renderer.with_layer(bounds, |r| {
            r.with_translation(Vector::new(bounds.x, bounds.y), |r| {
                let plot_geom = state.plot_cache.draw(r, bounds.size(), |frame| {
                    self.fill_plot(frame, &scene);
                });
                let overlay_geom = state.overlay_cache.draw(r, bounds.size(), |frame| {
                    self.fill_overlay(frame, &scene);
                });

                use iced::advanced::graphics::geometry::Renderer as _;
                r.draw_geometry(plot_geom);
                r.draw_geometry(overlay_geom);
            });
        });
    }

    fn mouse_interaction(
        &self,
        tree: &Tree,
        layout: Layout<'_>,
        cursor: advanced::mouse::Cursor,
        _viewport: &Rectangle,
        _renderer: &Renderer,
    ) -> advanced::mouse::Interaction {
        let state = tree.state.downcast_ref::<State>();
        if !cursor.is_over(layout.bounds()) && !state.dragging {
            return advanced::mouse::Interaction::default();
        }

        match self.chart.cursor() {
            CursorShape::Arrow => advanced::mouse::Interaction::default(),
            CursorShape::ResizeHorizontal => advanced::mouse::Interaction::ResizingHorizontally,
            CursorShape::Grab => advanced::mouse::Interaction::Grabbing,
        }
    }
}

impl<'a, M> From<TraceChart<'a>> for Element<'a, M, Theme, Renderer>
where
    M: Clone + 'a + 'static + From<TraceChartEvent>,
{
    fn from(chart: TraceChart<'a>) -> Self {
        Element::new(chart)
    }
}

fn map_button(button: mouse::Button) -> MouseButton {
    match button {
        mouse::Button::Left => MouseButton::Left,
        mouse::Button::Right => MouseButton::Right,
        mouse::Button::Middle => MouseButton::Middle,
        _ => MouseButton::Other,
    }
}

fn map_key(key: &keyboard::Key) -> Option<Key> {
    let keyboard::Key::Named(named) = key else {
        return None;
    };

    match named {
        key::Named::Shift => Some(Key::Shift),
        key::Named::Control => Some(Key::Control),
        key::Named::Tab => Some(Key::Tab),
        key::Named::Enter => Some(Key::Enter),
        key::Named::ArrowLeft => Some(Key::Left),
        key::Named::ArrowRight => Some(Key::Right),
        key::Named::ArrowUp => Some(Key::Up),
        key::Named::ArrowDown => Some(Key::Down),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_and_arrow_keys_map() {
        let named = |n| keyboard::Key::Named(n);

        assert_eq!(map_key(&named(key::Named::Shift)), Some(Key::Shift));
        assert_eq!(map_key(&named(key::Named::ArrowDown)), Some(Key::Down));
        assert_eq!(map_key(&named(key::Named::Escape)), None);
        assert_eq!(map_key(&keyboard::Key::Character("a".into())), None);
    }

    #[test]
    fn extra_buttons_are_other() {
        assert_eq!(map_button(mouse::Button::Back), MouseButton::Other);
        assert_eq!(map_button(mouse::Button::Left), MouseButton::Left);
    }
}
