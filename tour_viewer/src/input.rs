//! Keyboard and pointer routing for the windowed viewer. Key handling is kept
//! free of window state so the bindings can be tested directly.

use winit::keyboard::{Key, NamedKey};

/// Cursor travel (in pixels) below which a press/release pair counts as a click.
pub const CLICK_SLOP_PX: f32 = 4.0;

/// Wheel pixel deltas per zoom step on touchpads.
pub const PIXELS_PER_ZOOM_STEP: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Exit,
    ToggleAutoRotate,
    NextScene,
    PreviousScene,
    /// Digits 1-9 jump to scene n-1.
    JumpToScene(usize),
    /// F1-F12 toggle the n-th path layer.
    ToggleLayer(usize),
}

pub fn key_action(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(named) => named_key_action(*named),
        Key::Character(text) => {
            let mut chars = text.chars();
            let digit = chars.next()?.to_digit(10)?;
            if chars.next().is_some() || digit == 0 {
                return None;
            }
            Some(KeyAction::JumpToScene(digit as usize - 1))
        }
        _ => None,
    }
}

fn named_key_action(key: NamedKey) -> Option<KeyAction> {
    let action = match key {
        NamedKey::Escape => KeyAction::Exit,
        NamedKey::Space => KeyAction::ToggleAutoRotate,
        NamedKey::ArrowRight => KeyAction::NextScene,
        NamedKey::ArrowLeft => KeyAction::PreviousScene,
        NamedKey::F1 => KeyAction::ToggleLayer(0),
        NamedKey::F2 => KeyAction::ToggleLayer(1),
        NamedKey::F3 => KeyAction::ToggleLayer(2),
        NamedKey::F4 => KeyAction::ToggleLayer(3),
        NamedKey::F5 => KeyAction::ToggleLayer(4),
        NamedKey::F6 => KeyAction::ToggleLayer(5),
        NamedKey::F7 => KeyAction::ToggleLayer(6),
        NamedKey::F8 => KeyAction::ToggleLayer(7),
        NamedKey::F9 => KeyAction::ToggleLayer(8),
        NamedKey::F10 => KeyAction::ToggleLayer(9),
        NamedKey::F11 => KeyAction::ToggleLayer(10),
        NamedKey::F12 => KeyAction::ToggleLayer(11),
        _ => return None,
    };
    Some(action)
}

/// Tracks the press position so drags and clicks can be told apart on release.
#[derive(Debug, Default)]
pub struct PointerState {
    cursor: Option<(f32, f32)>,
    press_origin: Option<(f32, f32)>,
}

impl PointerState {
    pub fn moved_to(&mut self, x: f32, y: f32) {
        self.cursor = Some((x, y));
    }

    pub fn left(&mut self) {
        self.cursor = None;
    }

    pub fn is_pressed(&self) -> bool {
        self.press_origin.is_some()
    }

    /// Returns the press position if the cursor is inside the window.
    pub fn press(&mut self) -> Option<(f32, f32)> {
        self.press_origin = self.cursor;
        self.press_origin
    }

    /// Returns the click position if the pointer barely moved since the press.
    pub fn release(&mut self) -> Option<(f32, f32)> {
        let origin = self.press_origin.take()?;
        let (x, y) = self.cursor?;
        let dx = x - origin.0;
        let dy = y - origin.1;
        (dx * dx + dy * dy <= CLICK_SLOP_PX * CLICK_SLOP_PX).then_some((x, y))
    }
}
