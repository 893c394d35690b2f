use std::collections::HashSet;

use glam::Vec2;

use super::frame::InputFrame;
use super::types::{ButtonState, InputEvent, Key, Modifiers, MouseButton};

/// Current input state for the window.
///
/// Holds what is down right now and where the pointer is. Per-frame
/// transitions are written into an [`InputFrame`].
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,

    /// Pointer position in physical pixels; `None` while outside the window.
    pub pointer: Option<Vec2>,

    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies `ev` to the held state and records transitions into `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = m,

            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // Releases never arrive after focus loss.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(p) => self.pointer = Some(p),
            InputEvent::PointerLeft => self.pointer = None,

            InputEvent::Key { key, state, .. } => match state {
                ButtonState::Pressed => {
                    if self.keys_down.insert(key) {
                        frame.keys_pressed.insert(key);
                    }
                }
                ButtonState::Released => {
                    if self.keys_down.remove(&key) {
                        frame.keys_released.insert(key);
                    }
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                ButtonState::Pressed => {
                    if self.buttons_down.insert(button) {
                        frame.buttons_pressed.insert(button);
                    }
                }
                ButtonState::Released => {
                    if self.buttons_down.remove(&button) {
                        frame.buttons_released.insert(button);
                    }
                }
            },

            InputEvent::Wheel(delta) => frame.wheel += delta,
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// `1.0` if any of `pos` is held, `-1.0` if any of `neg` is, `0.0` for both or neither.
    pub fn axis(&self, neg: &[Key], pos: &[Key]) -> f32 {
        let n = neg.iter().any(|k| self.key_down(*k));
        let p = pos.iter().any(|k| self.key_down(*k));
        match (n, p) {
            (false, true) => 1.0,
            (true, false) => -1.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: Key, state: ButtonState) -> InputEvent {
        InputEvent::Key { key: k, state, repeat: false }
    }

    #[test]
    fn press_is_recorded_once_while_held() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();

        s.apply_event(&mut f, key(Key::W, ButtonState::Pressed));
        f.clear();
        // OS repeat delivers another press
        s.apply_event(&mut f, InputEvent::Key { key: Key::W, state: ButtonState::Pressed, repeat: true });

        assert!(s.key_down(Key::W));
        assert!(!f.key_pressed(Key::W));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, key(Key::A, ButtonState::Released));
        assert!(f.keys_released.is_empty());
    }

    #[test]
    fn focus_loss_clears_held_input() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, key(Key::D, ButtonState::Pressed));
        s.apply_event(
            &mut f,
            InputEvent::PointerButton { button: MouseButton::Left, state: ButtonState::Pressed },
        );
        assert!(s.button_down(MouseButton::Left));
        s.apply_event(&mut f, InputEvent::Focused(false));

        assert!(!s.key_down(Key::D));
        assert!(!s.button_down(MouseButton::Left));
        assert!(s.keys_down.is_empty());
        assert!(s.buttons_down.is_empty());
    }

    #[test]
    fn wheel_accumulates_until_cleared() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, InputEvent::Wheel(Vec2::new(0.0, 1.0)));
        s.apply_event(&mut f, InputEvent::Wheel(Vec2::new(0.0, 2.0)));
        assert_eq!(f.wheel, Vec2::new(0.0, 3.0));
        f.clear();
        assert_eq!(f.wheel, Vec2::ZERO);
    }

    #[test]
    fn pointer_tracks_enter_and_leave() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, InputEvent::PointerMoved(Vec2::new(4.0, 5.0)));
        assert_eq!(s.pointer, Some(Vec2::new(4.0, 5.0)));
        s.apply_event(&mut f, InputEvent::PointerLeft);
        assert_eq!(s.pointer, None);
    }

    #[test]
    fn axis_cancels_opposing_keys() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        assert_eq!(s.axis(&[Key::A], &[Key::D]), 0.0);

        s.apply_event(&mut f, key(Key::D, ButtonState::Pressed));
        assert_eq!(s.axis(&[Key::A, Key::ArrowLeft], &[Key::D, Key::ArrowRight]), 1.0);

        s.apply_event(&mut f, key(Key::ArrowLeft, ButtonState::Pressed));
        assert_eq!(s.axis(&[Key::A, Key::ArrowLeft], &[Key::D, Key::ArrowRight]), 0.0);
    }
}
