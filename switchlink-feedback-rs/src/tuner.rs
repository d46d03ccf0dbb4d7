//! Tuner display: note name plus a deviance marker.

use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use switchlink::color::{GREEN, RED};
use switchlink::{ClientListener, ListenerId, ParameterClient, ParameterMapping, ParameterUpdate};

use crate::action::{DisplayLabel, FeedbackLabel};
use crate::error::CallbackError;

pub const TUNER_NOTE_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Largest deviance value.
pub const MAX_DEVIANCE: i32 = 16383;
/// Deviance of a perfectly tuned note.
pub const DEVIANCE_CENTER: i32 = 8191;
/// Notes closer than this to the center count as in tune.
pub const DEVIANCE_IN_TUNE: i32 = 300;

/// Text shown by the tuner after a reset.
pub const TUNER_TEXT: &str = "Tuner";

/// Name of a tuner note value.
pub fn note_name(note: i32) -> &'static str {
    TUNER_NOTE_NAMES[note.rem_euclid(12) as usize]
}

/// Green when in tune, red otherwise.
pub fn deviance_color(deviance: i32) -> Rgb888 {
    if (deviance - DEVIANCE_CENTER).abs() >= DEVIANCE_IN_TUNE {
        RED
    } else {
        GREEN
    }
}

// ── Deviance marker ──────────────────────────────────────────────────

/// Marker moving horizontally across `bounds` with the deviance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevianceMarker {
    bounds: Rectangle,
    marker_width: u32,
    x: i32,
    color: Rgb888,
    /// Set when position or color changed.
    pub changed: bool,
}

impl DevianceMarker {
    /// Starts centered and green.
    pub fn new(bounds: Rectangle, marker_width: u32) -> Self {
        let mut marker = Self {
            bounds,
            marker_width,
            x: 0,
            color: GREEN,
            changed: false,
        };
        marker.x = marker.position(DEVIANCE_CENTER);
        marker
    }

    fn position(&self, deviance: i32) -> i32 {
        let travel = self.bounds.size.width.saturating_sub(self.marker_width) as i64;
        let deviance = deviance.clamp(0, MAX_DEVIANCE) as i64;
        self.bounds.top_left.x + (travel * deviance / MAX_DEVIANCE as i64) as i32
    }

    /// Move to `deviance` (`0..=MAX_DEVIANCE`).
    pub fn set(&mut self, deviance: i32) {
        let x = self.position(deviance);
        let color = deviance_color(deviance);
        if x != self.x || color != self.color {
            self.x = x;
            self.color = color;
            self.changed = true;
        }
    }

    pub fn color(&self) -> Rgb888 {
        self.color
    }

    /// Area to fill with [`color()`](Self::color).
    pub fn marker(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x, self.bounds.top_left.y),
            Size::new(self.marker_width, self.bounds.size.height),
        )
    }

    pub fn take_changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }
}

// ── Tuner display ────────────────────────────────────────────────────

/// Shows the note name and colors it by deviance.
///
/// Both mappings are pushed by the device while the tuner is active, so
/// they are only registered, never polled.
#[derive(Debug)]
pub struct TunerDisplay {
    id: ListenerId,
    mapping_note: ParameterMapping,
    mapping_deviance: Option<ParameterMapping>,
    label: DisplayLabel,
    deviance: Option<DevianceMarker>,
    last_note: Option<i32>,
    last_deviance: Option<i32>,
}

impl TunerDisplay {
    pub fn new(id: ListenerId, mapping_note: ParameterMapping) -> Self {
        Self {
            id,
            mapping_note,
            mapping_deviance: None,
            label: DisplayLabel::new(TUNER_TEXT),
            deviance: None,
            last_note: None,
            last_deviance: None,
        }
    }

    pub fn with_deviance(mut self, mapping: ParameterMapping, marker: DevianceMarker) -> Self {
        self.mapping_deviance = Some(mapping);
        self.deviance = Some(marker);
        self
    }

    pub fn label(&self) -> &DisplayLabel {
        &self.label
    }

    pub fn label_mut(&mut self) -> &mut DisplayLabel {
        &mut self.label
    }

    pub fn deviance(&self) -> Option<&DevianceMarker> {
        self.deviance.as_ref()
    }

    pub fn deviance_mut(&mut self) -> Option<&mut DevianceMarker> {
        self.deviance.as_mut()
    }

    pub fn init(&self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        client.register(&self.mapping_note, self.id, now)?;
        if let Some(deviance) = &self.mapping_deviance {
            client.register(deviance, self.id, now)?;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.last_note = None;
        self.last_deviance = None;
        self.label.set_text(TUNER_TEXT);
        self.label.set_text_color(None);
    }
}

impl ClientListener for TunerDisplay {
    fn parameter_changed(&mut self, update: &ParameterUpdate) {
        let Some(value) = update.value.as_ref().and_then(|v| v.as_number()) else {
            return;
        };

        if update.concerns(&self.mapping_note) && self.last_note != Some(value) {
            self.last_note = Some(value);
            self.label.set_text(note_name(value));
        }

        let is_deviance = self
            .mapping_deviance
            .as_ref()
            .is_some_and(|m| update.concerns(m));
        if is_deviance && self.last_deviance != Some(value) {
            self.last_deviance = Some(value);
            if let Some(marker) = self.deviance.as_mut() {
                marker.set(value);
            }
            self.label.set_text_color(Some(deviance_color(value)));
        }
    }

    fn request_terminated(&mut self, _update: &ParameterUpdate) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::tests::{changed, mapping, t, MockClient};

    fn tuner() -> TunerDisplay {
        TunerDisplay::new(ListenerId(2), mapping("note", 1)).with_deviance(
            mapping("dev", 2),
            DevianceMarker::new(Rectangle::new(Point::new(0, 40), Size::new(105, 20)), 5),
        )
    }

    #[test]
    fn note_names_wrap() {
        assert_eq!(note_name(0), "C");
        assert_eq!(note_name(13), "Db");
        assert_eq!(note_name(69), "A");
        assert_eq!(note_name(-1), "B");
    }

    #[test]
    fn deviance_color_threshold() {
        assert_eq!(deviance_color(8191), GREEN);
        assert_eq!(deviance_color(8191 + 299), GREEN);
        assert_eq!(deviance_color(8191 + 300), RED);
        assert_eq!(deviance_color(8191 - 300), RED);
    }

    #[test]
    fn marker_position() {
        let mut m = DevianceMarker::new(Rectangle::new(Point::new(10, 0), Size::new(105, 8)), 5);
        m.set(0);
        assert_eq!(m.marker().top_left, Point::new(10, 0));
        m.set(MAX_DEVIANCE);
        assert_eq!(m.marker().top_left, Point::new(110, 0));
        assert_eq!(m.marker().size, Size::new(5, 8));
        assert!(m.take_changed());
    }

    #[test]
    fn only_registers() {
        let tuner = tuner();
        let mut client = MockClient::default();
        tuner.init(&mut client, t(0)).unwrap();
        assert_eq!(client.registered.len(), 2);
        assert!(client.requested.is_empty());
    }

    #[test]
    fn note_and_deviance_updates() {
        let mut tuner = tuner();
        assert_eq!(tuner.label().text(), "Tuner");

        tuner.parameter_changed(&changed(&mapping("note", 1), Some(64)));
        assert_eq!(tuner.label().text(), "E");

        tuner.parameter_changed(&changed(&mapping("dev", 2), Some(9000)));
        assert_eq!(tuner.label().text_color, Some(RED));
        assert_eq!(tuner.deviance().unwrap().color(), RED);

        tuner.parameter_changed(&changed(&mapping("dev", 2), Some(8200)));
        assert_eq!(tuner.label().text_color, Some(GREEN));
    }

    #[test]
    fn reset_restores_title() {
        let mut tuner = tuner();
        tuner.parameter_changed(&changed(&mapping("note", 1), Some(64)));
        tuner.parameter_changed(&changed(&mapping("dev", 2), Some(0)));
        tuner.reset();
        assert_eq!(tuner.label().text(), "Tuner");
        assert_eq!(tuner.label().text_color, None);

        // Same note again after the reset is shown.
        tuner.parameter_changed(&changed(&mapping("note", 1), Some(64)));
        assert_eq!(tuner.label().text(), "E");
    }

    #[test]
    fn termination_keeps_the_display() {
        let mut tuner = tuner();
        tuner.parameter_changed(&changed(&mapping("note", 1), Some(64)));
        tuner.request_terminated(&changed(&mapping("note", 1), None));
        assert_eq!(tuner.label().text(), "E");
    }
}
