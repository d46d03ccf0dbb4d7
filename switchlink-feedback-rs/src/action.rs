//! Visual surfaces driven by callbacks.
//!
//! Callbacks never talk to LEDs or displays directly. They write into a
//! [`SwitchAction`] (one footswitch with its LEDs and an optional display
//! label) and a [`FeedbackLabel`]. The rendering side reads the resulting
//! state and redraws when the `changed` flag is set.

use embedded_graphics::pixelcolor::Rgb888;
use switchlink::client::TextValue;
use switchlink::color::{DEFAULT_LABEL_COLOR, WHITE};
use switchlink::ColorValue;

/// A text label on the display.
pub trait FeedbackLabel {
    fn set_text(&mut self, text: &str);
    fn set_back_color(&mut self, color: &ColorValue);
    /// `None` restores the default text color.
    fn set_text_color(&mut self, color: Option<Rgb888>);
}

/// A footswitch as seen by a callback.
pub trait SwitchAction {
    /// Current (possibly user-toggled) state.
    fn state(&self) -> bool;
    /// State reported back from the device.
    fn feedback_state(&mut self, state: bool);
    fn set_switch_color(&mut self, color: &ColorValue);
    fn set_switch_brightness(&mut self, brightness: f32);
    fn label(&mut self) -> Option<&mut dyn FeedbackLabel>;
}

// ── Display label ────────────────────────────────────────────────────

/// Label state plus a change flag for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayLabel {
    pub text: TextValue,
    pub back_color: ColorValue,
    pub text_color: Option<Rgb888>,
    /// Set on every effective change, cleared by [`take_changed()`](Self::take_changed).
    pub changed: bool,
}

impl Default for DisplayLabel {
    fn default() -> Self {
        Self {
            text: TextValue::new(),
            back_color: ColorValue::Single(DEFAULT_LABEL_COLOR),
            text_color: None,
            changed: false,
        }
    }
}

impl DisplayLabel {
    pub fn new(text: &str) -> Self {
        let mut label = Self::default();
        label.set_text(text);
        label.changed = false;
        label
    }

    /// Read and clear the change flag.
    pub fn take_changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl FeedbackLabel for DisplayLabel {
    fn set_text(&mut self, text: &str) {
        if self.text.as_str() == text {
            return;
        }
        self.text.clear();
        for c in text.chars() {
            if self.text.push(c).is_err() {
                break;
            }
        }
        self.changed = true;
    }

    fn set_back_color(&mut self, color: &ColorValue) {
        if &self.back_color == color {
            return;
        }
        self.back_color = color.clone();
        self.changed = true;
    }

    fn set_text_color(&mut self, color: Option<Rgb888>) {
        if self.text_color == color {
            return;
        }
        self.text_color = color;
        self.changed = true;
    }
}

// ── Switch ───────────────────────────────────────────────────────────

/// LED state of one footswitch plus its optional label.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchFeedback {
    pub state: bool,
    pub color: ColorValue,
    pub brightness: f32,
    pub label: Option<DisplayLabel>,
    /// Set when the LED state changed, cleared by [`take_changed()`](Self::take_changed).
    pub changed: bool,
}

impl Default for SwitchFeedback {
    fn default() -> Self {
        Self {
            state: false,
            color: ColorValue::Single(WHITE),
            brightness: 0.0,
            label: None,
            changed: false,
        }
    }
}

impl SwitchFeedback {
    pub fn with_label(label: DisplayLabel) -> Self {
        Self {
            label: Some(label),
            ..Self::default()
        }
    }

    /// Flip the state on a user press. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.state = !self.state;
        self.changed = true;
        self.state
    }

    /// Read and clear the LED change flag.
    pub fn take_changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }
}

impl SwitchAction for SwitchFeedback {
    fn state(&self) -> bool {
        self.state
    }

    fn feedback_state(&mut self, state: bool) {
        if self.state != state {
            self.state = state;
            self.changed = true;
        }
    }

    fn set_switch_color(&mut self, color: &ColorValue) {
        if &self.color != color {
            self.color = color.clone();
            self.changed = true;
        }
    }

    fn set_switch_brightness(&mut self, brightness: f32) {
        if self.brightness != brightness {
            self.brightness = brightness;
            self.changed = true;
        }
    }

    fn label(&mut self) -> Option<&mut dyn FeedbackLabel> {
        self.label.as_mut().map(|l| l as &mut dyn FeedbackLabel)
    }
}
