//! Keyboard and mouse handling for the chart.
//!
//! Positions are logical pixels relative to the widget's top-left corner,
//! screen y pointing down. The widget divides screen pixels by the pixel
//! zoom before handing them over.

use crate::probe::{ProbeEvent, ProbeId, Probes};
use crate::viewport::{Coord, Dimensions, ScrollDirection, ViewportState, ZoomMode};

use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Shift,
    Control,
    Tab,
    Enter,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed(Key),
    KeyReleased(Key),
    Wheel { delta: f64 },
    ButtonPressed { button: MouseButton, position: Coord },
    ButtonReleased { button: MouseButton },
    CursorMoved { position: Coord },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    #[default]
    Idle,
    DraggingProbe(ProbeId),
    DraggingViewport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Arrow,
    ResizeHorizontal,
    Grab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The draw resolution changed; readings taken at the old one are void.
    ResolutionChanged(u32),
    Probe(ProbeEvent),
    CursorChanged(CursorShape),
    /// The visible window moved; cached samples may no longer cover it.
    ViewMoved,
}

#[derive(Debug, Default)]
pub struct InputState {
    keys: FxHashSet<Key>,
    pressed_at: FxHashMap<MouseButton, Coord>,
    last_position: Option<Coord>,
    mode: MouseMode,
    cursor: CursorShape,
}

impl InputState {
    pub fn mode(&self) -> MouseMode {
        self.mode
    }

    pub fn cursor(&self) -> CursorShape {
        self.cursor
    }

    /// Last known mouse position over the chart.
    pub fn last_position(&self) -> Option<Coord> {
        self.last_position
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn zoom_mode(&self) -> ZoomMode {
        ZoomMode::from_modifiers(
            self.is_held(Key::Shift),
            self.is_held(Key::Control),
            self.is_held(Key::Tab),
        )
    }

    /// Forgets held keys and any drag, e.g. when the window loses focus.
    pub fn reset(&mut self) -> Vec<Notification> {
        self.keys.clear();
        self.pressed_at.clear();
        self.mode = MouseMode::Idle;
        self.set_cursor(CursorShape::Arrow).into_iter().collect()
    }

    pub fn handle(
        &mut self,
        event: InputEvent,
        viewport: &mut ViewportState,
        size: Dimensions,
        probes: &mut Probes,
    ) -> Vec<Notification> {
        let mut out = Vec::new();

        match event {
            InputEvent::KeyPressed(key) => {
                if key == Key::Enter && !self.is_held(Key::Enter) {
                    out.push(Notification::Probe(probes.push(viewport.center_time())));
                }
                self.keys.insert(key);

                if self.pan_with_arrows(viewport) {
                    out.push(Notification::ViewMoved);
                }
            }
            InputEvent::KeyReleased(key) => {
                self.keys.remove(&key);
            }
            InputEvent::Wheel { delta } => {
                let Some(direction) = ScrollDirection::from_delta(delta) else {
                    return out;
                };
                let mode = self.zoom_mode();

                if let Some(resolution) = viewport.scroll(mode, direction) {
                    out.push(Notification::ResolutionChanged(resolution));
                    out.push(Notification::ViewMoved);
                } else if mode == ZoomMode::Pan {
                    out.push(Notification::ViewMoved);
                }
            }
            InputEvent::ButtonPressed { button, position } => {
                self.pressed_at.insert(button, position);
                self.last_position = Some(position);

                if button == MouseButton::Left {
                    let (mode, cursor) = match probes.hit_test(viewport, size, position.x) {
                        Some(id) => (MouseMode::DraggingProbe(id), CursorShape::ResizeHorizontal),
                        None => (MouseMode::DraggingViewport, CursorShape::Grab),
                    };
                    self.mode = mode;
                    out.extend(self.set_cursor(cursor));
                }
            }
            InputEvent::ButtonReleased { button } => {
                self.pressed_at.remove(&button);
                self.mode = MouseMode::Idle;

                if button == MouseButton::Left {
                    out.extend(self.set_cursor(CursorShape::Arrow));
                }
            }
            InputEvent::CursorMoved { position } => {
                self.last_position = Some(position);
                self.drag(position, viewport, size, probes, &mut out);
            }
        }

        out
    }

    fn drag(
        &mut self,
        position: Coord,
        viewport: &mut ViewportState,
        size: Dimensions,
        probes: &mut Probes,
        out: &mut Vec<Notification>,
    ) {
        match self.mode {
            MouseMode::DraggingProbe(id) => {
                let x = viewport.window(size).left + position.x;
                let time = viewport.x_to_time(x).max(0.0);

                match probes.set_time(id, time) {
                    Some(event) => out.push(Notification::Probe(event)),
                    None => {
                        log::debug!("Dragged probe is gone, ending drag");
                        self.mode = MouseMode::Idle;
                    }
                }
            }
            MouseMode::DraggingViewport => {
                let from = self
                    .pressed_at
                    .insert(MouseButton::Left, position)
                    .unwrap_or(position);

                viewport.drag_by(position.x - from.x, position.y - from.y);
                out.push(Notification::ViewMoved);
            }
            MouseMode::Idle => {
                let cursor = if probes.hit_test(viewport, size, position.x).is_some() {
                    CursorShape::ResizeHorizontal
                } else {
                    CursorShape::Arrow
                };
                out.extend(self.set_cursor(cursor));
            }
        }
    }

    fn pan_with_arrows(&self, viewport: &mut ViewportState) -> bool {
        let mut moved = false;

        if self.is_held(Key::Left) {
            viewport.pan_left();
            moved = true;
        }
        if self.is_held(Key::Right) {
            viewport.pan_right();
            moved = true;
        }
        if self.is_held(Key::Up) {
            viewport.pan_up();
            moved = true;
        }
        if self.is_held(Key::Down) {
            viewport.pan_down();
            moved = true;
        }

        moved
    }

    fn set_cursor(&mut self, cursor: CursorShape) -> Option<Notification> {
        if self.cursor == cursor {
            return None;
        }
        self.cursor = cursor;
        Some(Notification::CursorChanged(cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Probe;

    const SIZE: Dimensions = Dimensions::new(640.0, 480.0);

    struct Rig {
        input: InputState,
        viewport: ViewportState,
        probes: Probes,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                input: InputState::default(),
                viewport: ViewportState::default(),
                probes: Probes::default(),
            }
        }

        fn send(&mut self, event: InputEvent) -> Vec<Notification> {
            self.input
                .handle(event, &mut self.viewport, SIZE, &mut self.probes)
        }

        fn press(&mut self, x: f64, y: f64) -> Vec<Notification> {
            self.send(InputEvent::ButtonPressed {
                button: MouseButton::Left,
                position: Coord::new(x, y),
            })
        }

        fn move_to(&mut self, x: f64, y: f64) -> Vec<Notification> {
            self.send(InputEvent::CursorMoved {
                position: Coord::new(x, y),
            })
        }
    }

    #[test]
    fn held_enter_adds_one_probe() {
        let mut rig = Rig::new();

        for _ in 0..3 {
            rig.send(InputEvent::KeyPressed(Key::Enter));
        }
        assert_eq!(rig.probes.len(), 1);

        rig.send(InputEvent::KeyReleased(Key::Enter));
        rig.send(InputEvent::KeyPressed(Key::Enter));
        assert_eq!(rig.probes.len(), 2);
    }

    #[test]
    fn enter_places_probe_at_center() {
        let mut rig = Rig::new();
        rig.viewport.go_to(4.0);

        let out = rig.send(InputEvent::KeyPressed(Key::Enter));

        assert!(matches!(
            out[..],
            [Notification::Probe(ProbeEvent::Added { index: 0, .. })]
        ));
        assert_eq!(rig.probes.get(0).map(Probe::time), Some(4.0));
    }

    #[test]
    fn arrows_pan_together() {
        let mut rig = Rig::new();

        rig.send(InputEvent::KeyPressed(Key::Right));
        assert_eq!(rig.viewport.center(), Coord::new(32.0, 0.0));

        let out = rig.send(InputEvent::KeyPressed(Key::Up));
        assert_eq!(out, vec![Notification::ViewMoved]);
        assert_eq!(rig.viewport.center(), Coord::new(64.0, 32.0));

        rig.send(InputEvent::KeyReleased(Key::Right));
        rig.send(InputEvent::KeyReleased(Key::Up));
        assert!(rig.send(InputEvent::KeyPressed(Key::Shift)).is_empty());
    }

    #[test]
    fn wheel_mode_comes_from_modifiers() {
        let mut rig = Rig::new();

        rig.send(InputEvent::KeyPressed(Key::Shift));
        let out = rig.send(InputEvent::Wheel { delta: 1.0 });
        assert_eq!(
            out,
            vec![Notification::ResolutionChanged(256), Notification::ViewMoved]
        );
        assert_eq!(rig.viewport.zoom(), 2);

        rig.send(InputEvent::KeyReleased(Key::Shift));
        rig.send(InputEvent::Wheel { delta: -1.0 });
        assert_eq!(rig.viewport.zoom(), 2);
        assert_eq!(rig.viewport.center().x, -32.0);
        assert!(rig.send(InputEvent::Wheel { delta: 0.0 }).is_empty());
    }

    #[test]
    fn dragging_probe_clamps_at_origin() {
        let mut rig = Rig::new();
        rig.probes.push(1.0);
        let at = rig.viewport.time_to_x(1.0) - rig.viewport.window(SIZE).left;

        let out = rig.press(at, 100.0);
        assert_eq!(out, vec![Notification::CursorChanged(CursorShape::ResizeHorizontal)]);
        assert!(matches!(rig.input.mode(), MouseMode::DraggingProbe(_)));

        rig.move_to(at + 64.0, 100.0);
        assert_eq!(rig.probes.get(0).map(Probe::time), Some(1.5));

        let out = rig.move_to(0.0, 100.0);
        assert_eq!(rig.probes.get(0).map(Probe::time), Some(0.0));
        assert!(matches!(
            out[..],
            [Notification::Probe(ProbeEvent::Updated { index: 0, .. })]
        ));

        let out = rig.send(InputEvent::ButtonReleased {
            button: MouseButton::Left,
        });
        assert_eq!(out, vec![Notification::CursorChanged(CursorShape::Arrow)]);
        assert_eq!(rig.input.mode(), MouseMode::Idle);
    }

    #[test]
    fn dragging_empty_space_moves_view() {
        let mut rig = Rig::new();

        rig.press(100.0, 100.0);
        assert_eq!(rig.input.mode(), MouseMode::DraggingViewport);
        assert_eq!(rig.input.cursor(), CursorShape::Grab);

        rig.move_to(110.0, 95.0);
        assert_eq!(rig.viewport.center(), Coord::new(-10.0, -5.0));

        rig.move_to(120.0, 95.0);
        assert_eq!(rig.viewport.center(), Coord::new(-20.0, -5.0));
    }

    #[test]
    fn hover_reports_cursor_changes_once() {
        let mut rig = Rig::new();
        rig.probes.push(0.0);
        let at = rig.viewport.time_to_x(0.0) - rig.viewport.window(SIZE).left;

        assert_eq!(
            rig.move_to(at + 1.0, 50.0),
            vec![Notification::CursorChanged(CursorShape::ResizeHorizontal)]
        );
        assert!(rig.move_to(at - 1.0, 60.0).is_empty());
        assert_eq!(
            rig.move_to(at + 40.0, 60.0),
            vec![Notification::CursorChanged(CursorShape::Arrow)]
        );
    }

    #[test]
    fn removed_probe_ends_drag() {
        let mut rig = Rig::new();
        rig.probes.push(0.0);
        let at = rig.viewport.time_to_x(0.0) - rig.viewport.window(SIZE).left;
        rig.press(at, 10.0);

        rig.probes.remove(0);
        assert!(rig.move_to(at + 10.0, 10.0).is_empty());
        assert_eq!(rig.input.mode(), MouseMode::Idle);
    }
}
