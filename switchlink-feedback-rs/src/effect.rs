//! Effect slot on/off switch, colored by the type of the loaded effect.

use embassy_time::Instant;
use switchlink::{
    ClientListener, ColorValue, ListenerId, ParameterClient, ParameterMapping, ParameterUpdate,
    ParameterValue,
};

use crate::action::SwitchAction;
use crate::binary::{BinaryCallbackConfig, BinaryParameterCallback};
use crate::error::CallbackError;

/// Category of an empty effect slot.
pub const CATEGORY_NONE: u8 = 0;

/// Device specific grouping of effect types.
pub trait EffectCategories {
    /// Category of a raw effect type value.
    fn category(&self, effect_type: i32) -> u8;
    fn color(&self, category: u8) -> ColorValue;
    fn name(&self, category: u8) -> &'static str;
}

/// On/off switch for an effect slot.
///
/// Tracks the slot's state mapping like a [`BinaryParameterCallback`] and
/// additionally the effect type mapping. Color and label text follow the
/// effect category and are only touched when the category changes. An
/// empty slot ([`CATEGORY_NONE`]) is always shown disabled.
#[derive(Debug)]
pub struct EffectEnableCallback<C, U = ()> {
    binary: BinaryParameterCallback<U>,
    categories: C,
    current_category: Option<u8>,
}

impl<C: EffectCategories, U: ClientListener> EffectEnableCallback<C, U> {
    pub fn new(
        id: ListenerId,
        mapping_state: ParameterMapping,
        mapping_type: ParameterMapping,
        categories: C,
    ) -> Self {
        let mut binary = BinaryParameterCallback::new(id, mapping_state, BinaryCallbackConfig::default());
        // Second mapping, still below the capacity.
        let _ = binary.base_mut().register_mapping(mapping_type);

        Self {
            binary,
            categories,
            current_category: None,
        }
    }

    pub fn with_upstream(mut self, upstream: U) -> Self {
        self.binary = self.binary.with_upstream(upstream);
        self
    }

    pub fn binary(&self) -> &BinaryParameterCallback<U> {
        &self.binary
    }

    pub fn mapping_state(&self) -> &ParameterMapping {
        self.binary.mapping()
    }

    pub fn mapping_type(&self) -> &ParameterMapping {
        // Registered in `new()`.
        &self.binary.base().mappings()[1]
    }

    /// Category derived from the current effect type value.
    pub fn category(&self) -> u8 {
        self.mapping_type()
            .value
            .as_ref()
            .and_then(ParameterValue::as_number)
            .map_or(CATEGORY_NONE, |t| self.categories.category(t))
    }

    pub fn reset(&mut self) {
        self.binary.reset();
        self.current_category = None;
    }

    pub fn init(&self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        self.binary.init(client, now)
    }

    pub fn update(&self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        self.binary.update(client, now)
    }

    pub fn state_changed_by_user(
        &mut self,
        action: &dyn SwitchAction,
        client: &mut dyn ParameterClient,
        now: Instant,
    ) -> Result<(), CallbackError> {
        self.binary.state_changed_by_user(action, client, now)
    }

    pub fn update_displays(&mut self, action: &mut dyn SwitchAction) {
        let category = self.category();

        let empty = category == CATEGORY_NONE;
        self.binary.set_forced_disabled(empty);
        if empty {
            action.feedback_state(false);
        }

        if self.current_category != Some(category) {
            self.current_category = Some(category);

            #[cfg(feature = "defmt")]
            defmt::debug!("EffectEnableCallback: category {}", category);

            if let Some(label) = action.label() {
                label.set_text(self.categories.name(category));
            }
            self.binary.set_color(self.categories.color(category));
        }

        self.binary.update_displays(action);
    }
}

impl<C, U: ClientListener> ClientListener for EffectEnableCallback<C, U> {
    fn parameter_changed(&mut self, update: &ParameterUpdate) {
        self.binary.parameter_changed(update);
    }

    fn request_terminated(&mut self, update: &ParameterUpdate) {
        self.binary.request_terminated(update);
    }
}
