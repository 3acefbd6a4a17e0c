//! Keyboard mapping
//!
//! Space jumps, ArrowDown ducks while held.

/// A player command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Jump,
    Duck,
    ReleaseDuck,
}

/// Control for a `keydown` event's `code`, if any
pub fn control_for_key_down(code: &str) -> Option<Control> {
    match code {
        "Space" => Some(Control::Jump),
        "ArrowDown" => Some(Control::Duck),
        _ => None,
    }
}

/// Control for a `keyup` event's `code`, if any
pub fn control_for_key_up(code: &str) -> Option<Control> {
    match code {
        "ArrowDown" => Some(Control::ReleaseDuck),
        _ => None,
    }
}
