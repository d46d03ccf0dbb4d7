//! Display label showing a parameter value as text.

use embassy_time::Instant;
use switchlink::{
    ClientListener, ListenerId, ParameterClient, ParameterMapping, ParameterUpdate, ParameterValue,
};

use crate::action::{DisplayLabel, FeedbackLabel};
use crate::error::CallbackError;

/// Shows the value of a mapping (rig name, amp name, ...).
///
/// With a `depends` mapping only the dependency is polled. Whenever its
/// value changes the main mapping is requested once on the next
/// [`update()`](Self::update), e.g. the rig name only after the rig date
/// changed.
#[derive(Debug)]
pub struct ParameterDisplayLabel {
    id: ListenerId,
    mapping: ParameterMapping,
    depends: Option<ParameterMapping>,
    label: DisplayLabel,
    text_offline: &'static str,
    text_reset: &'static str,
    last_value: Option<ParameterValue>,
    depends_last_value: Option<ParameterValue>,
    request_main: bool,
}

impl ParameterDisplayLabel {
    pub fn new(id: ListenerId, mapping: ParameterMapping) -> Self {
        Self {
            id,
            mapping,
            depends: None,
            label: DisplayLabel::default(),
            text_offline: "",
            text_reset: "",
            last_value: None,
            depends_last_value: None,
            request_main: false,
        }
    }

    pub fn with_depends(mut self, depends: ParameterMapping) -> Self {
        self.depends = Some(depends);
        self
    }

    /// Text shown initially and while the device does not answer.
    pub fn with_text_offline(mut self, text: &'static str) -> Self {
        self.text_offline = text;
        self.label.set_text(text);
        self
    }

    /// Text shown after [`reset()`](Self::reset).
    pub fn with_text_reset(mut self, text: &'static str) -> Self {
        self.text_reset = text;
        self
    }

    pub fn label(&self) -> &DisplayLabel {
        &self.label
    }

    pub fn label_mut(&mut self) -> &mut DisplayLabel {
        &mut self.label
    }

    pub fn init(&self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        client.register(&self.mapping, self.id, now)?;
        if let Some(depends) = &self.depends {
            client.register(depends, self.id, now)?;
        }
        Ok(())
    }

    pub fn update(&mut self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        match &self.depends {
            None => client.request(&self.mapping, self.id, now)?,
            Some(depends) => {
                if core::mem::take(&mut self.request_main) {
                    client.request(&self.mapping, self.id, now)?;
                }
                client.request(depends, self.id, now)?;
            }
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.last_value = None;
        self.depends_last_value = None;
        self.label.set_text(self.text_reset);
    }
}

impl ClientListener for ParameterDisplayLabel {
    fn parameter_changed(&mut self, update: &ParameterUpdate) {
        if update.concerns(&self.mapping) && update.value != self.last_value {
            self.last_value = update.value.clone();
            match &update.value {
                Some(value) => self.label.set_text(&value.to_text()),
                None => self.label.set_text(self.text_offline),
            }
        }

        let depends_changed = self
            .depends
            .as_ref()
            .is_some_and(|d| update.concerns(d) && update.value != self.depends_last_value);
        if depends_changed {
            #[cfg(feature = "defmt")]
            defmt::debug!("ParameterDisplayLabel: {} changed, requesting {}", update.name, self.mapping.name);

            self.depends_last_value = update.value.clone();
            self.request_main = true;
        }
    }

    fn request_terminated(&mut self, _update: &ParameterUpdate) {
        self.label.set_text(self.text_offline);
        self.last_value = None;
        self.depends_last_value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::tests::{mapping, t, MockClient};

    fn text_update(mapping: &ParameterMapping, text: &str) -> ParameterUpdate {
        ParameterUpdate {
            key: mapping.key().unwrap(),
            name: mapping.name,
            value: Some(ParameterValue::text(text)),
        }
    }

    fn terminated(mapping: &ParameterMapping) -> ParameterUpdate {
        ParameterUpdate {
            key: mapping.key().unwrap(),
            name: mapping.name,
            value: None,
        }
    }

    #[test]
    fn shows_offline_text_initially_and_on_termination() {
        let rig = mapping("rig", 1);
        let mut l = ParameterDisplayLabel::new(ListenerId(0), rig.clone()).with_text_offline("Offline");
        assert_eq!(l.label().text(), "Offline");

        l.parameter_changed(&text_update(&rig, "Clean"));
        assert_eq!(l.label().text(), "Clean");

        l.request_terminated(&terminated(&rig));
        assert_eq!(l.label().text(), "Offline");

        // The same value shows up again after coming back.
        l.parameter_changed(&text_update(&rig, "Clean"));
        assert_eq!(l.label().text(), "Clean");
    }

    #[test]
    fn unchanged_value_does_not_touch_the_label() {
        let rig = mapping("rig", 1);
        let mut l = ParameterDisplayLabel::new(ListenerId(0), rig.clone());
        l.parameter_changed(&text_update(&rig, "Lead"));
        assert!(l.label_mut().take_changed());
        l.parameter_changed(&text_update(&rig, "Lead"));
        assert!(!l.label_mut().take_changed());
    }

    #[test]
    fn numbers_are_rendered() {
        let vol = mapping("vol", 3);
        let mut l = ParameterDisplayLabel::new(ListenerId(0), vol.clone());
        l.parameter_changed(&ParameterUpdate {
            key: vol.key().unwrap(),
            name: "vol",
            value: Some(ParameterValue::Number(8000)),
        });
        assert_eq!(l.label().text(), "8000");
    }

    #[test]
    fn reset_text() {
        let rig = mapping("rig", 1);
        let mut l = ParameterDisplayLabel::new(ListenerId(0), rig.clone()).with_text_reset("...");
        l.parameter_changed(&text_update(&rig, "Lead"));
        l.reset();
        assert_eq!(l.label().text(), "...");
        // Values are shown again after a reset even if unchanged.
        l.parameter_changed(&text_update(&rig, "Lead"));
        assert_eq!(l.label().text(), "Lead");
    }

    #[test]
    fn polls_the_main_mapping_without_depends() {
        let mut l = ParameterDisplayLabel::new(ListenerId(5), mapping("rig", 1));
        let mut client = MockClient::default();
        l.init(&mut client, t(0)).unwrap();
        l.update(&mut client, t(0)).unwrap();
        assert_eq!(client.registered, vec![("rig", ListenerId(5))]);
        assert_eq!(client.requested, vec![("rig", ListenerId(5))]);
    }

    #[test]
    fn depends_triggers_one_main_request() {
        let rig = mapping("rig", 1);
        let date = mapping("date", 2);
        let mut l = ParameterDisplayLabel::new(ListenerId(0), rig).with_depends(date.clone());
        let mut client = MockClient::default();

        l.init(&mut client, t(0)).unwrap();
        assert_eq!(client.registered.len(), 2);

        l.update(&mut client, t(0)).unwrap();
        assert_eq!(client.requested, vec![("date", ListenerId(0))]);

        l.parameter_changed(&text_update(&date, "2024-01-01"));
        l.update(&mut client, t(200)).unwrap();
        assert_eq!(&client.requested[1..], &[("rig", ListenerId(0)), ("date", ListenerId(0))]);

        // Same date again: no further main request.
        l.parameter_changed(&text_update(&date, "2024-01-01"));
        l.update(&mut client, t(400)).unwrap();
        assert_eq!(&client.requested[3..], &[("date", ListenerId(0))]);
    }
}
