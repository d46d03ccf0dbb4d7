//! Two-state callback: maps a numeric parameter onto an on/off switch.
//!
//! Incoming values are compared against a reference value to derive the
//! switch state. The state drives the LED (color and brightness) and the
//! optional label (dimmed back color and text). Visual outputs are only
//! touched when the derived color or state actually changed.

use embassy_time::Instant;
use heapless::Vec;
use switchlink::client::MAX_MESSAGES_PER_MAPPING;
use switchlink::color::DEFAULT_SWITCH_COLOR;
use switchlink::{
    ClientListener, ColorValue, ListenerId, ParameterClient, ParameterMapping, ParameterUpdate,
    ParameterValue,
};

use crate::action::SwitchAction;
use crate::callback::Callback;
use crate::error::CallbackError;

/// LED brightness while enabled.
pub const DEFAULT_LED_BRIGHTNESS_ON: f32 = 0.3;
/// LED brightness while disabled.
pub const DEFAULT_LED_BRIGHTNESS_OFF: f32 = 0.02;
/// Label dim factor while enabled.
pub const DEFAULT_SLOT_DIM_FACTOR_ON: f32 = 1.0;
/// Label dim factor while disabled.
pub const DEFAULT_SLOT_DIM_FACTOR_OFF: f32 = 0.2;

// ── Comparison ───────────────────────────────────────────────────────

/// How an incoming value is compared against the reference value.
///
/// The numeric codes are the ones used in configuration data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum ComparisonMode {
    Equal = 0,
    Greater = 10,
    #[default]
    GreaterEqual = 20,
    Less = 30,
    LessEqual = 40,
    /// Values never change the state (write-only parameters).
    NoStateChange = 999,
}

impl ComparisonMode {
    /// State for `value`. `current` is kept for [`NoStateChange`](Self::NoStateChange).
    pub fn evaluate(self, value: i32, reference: i32, current: bool) -> bool {
        match self {
            ComparisonMode::Equal => value == reference,
            ComparisonMode::Greater => value > reference,
            ComparisonMode::GreaterEqual => value >= reference,
            ComparisonMode::Less => value < reference,
            ComparisonMode::LessEqual => value <= reference,
            ComparisonMode::NoStateChange => current,
        }
    }
}

impl TryFrom<u16> for ComparisonMode {
    type Error = CallbackError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ComparisonMode::Equal),
            10 => Ok(ComparisonMode::Greater),
            20 => Ok(ComparisonMode::GreaterEqual),
            30 => Ok(ComparisonMode::Less),
            40 => Ok(ComparisonMode::LessEqual),
            999 => Ok(ComparisonMode::NoStateChange),
            other => {
                #[cfg(feature = "defmt")]
                defmt::error!("ComparisonMode: invalid code {}", other);
                Err(CallbackError::InvalidComparisonMode(other))
            }
        }
    }
}

// ── Value slots ──────────────────────────────────────────────────────

/// One value to send on a user toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueSlot {
    Fixed(i32),
    /// Learned from values observed while the switch is disabled.
    /// `None` until the first one arrives.
    Auto(Option<i32>),
}

impl ValueSlot {
    pub const AUTO: ValueSlot = ValueSlot::Auto(None);

    pub fn resolved(&self) -> Option<i32> {
        match *self {
            ValueSlot::Fixed(v) => Some(v),
            ValueSlot::Auto(v) => v,
        }
    }

    fn learn(&mut self, value: i32) {
        if let ValueSlot::Auto(slot) = self {
            *slot = Some(value);
        }
    }
}

/// A single value, or one value per message of a list set template.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotValues {
    Single(ValueSlot),
    List(Vec<ValueSlot, MAX_MESSAGES_PER_MAPPING>),
}

impl SlotValues {
    pub fn fixed(value: i32) -> Self {
        SlotValues::Single(ValueSlot::Fixed(value))
    }

    pub fn auto() -> Self {
        SlotValues::Single(ValueSlot::AUTO)
    }

    /// List of slots. Entries beyond the template capacity are dropped.
    pub fn list(slots: &[ValueSlot]) -> Self {
        SlotValues::List(slots.iter().copied().take(MAX_MESSAGES_PER_MAPPING).collect())
    }

    fn first(&self) -> Option<ValueSlot> {
        match self {
            SlotValues::Single(slot) => Some(*slot),
            SlotValues::List(slots) => slots.first().copied(),
        }
    }

    fn learn(&mut self, value: i32) {
        match self {
            SlotValues::Single(slot) => slot.learn(value),
            SlotValues::List(slots) => slots.iter_mut().for_each(|s| s.learn(value)),
        }
    }
}

// ── Configuration ────────────────────────────────────────────────────

/// Derives the color from the switch state and the current value.
pub type ColorCallback = fn(state: bool, value: Option<&ParameterValue>) -> ColorValue;

/// Options of a [`BinaryParameterCallback`].
///
/// ```ignore
/// let config = BinaryCallbackConfig {
///     color: ColorValue::Single(RED),
///     text: Some("Boost"),
///     ..BinaryCallbackConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct BinaryCallbackConfig {
    pub color: ColorValue,
    /// Overrides `color` if set.
    pub color_callback: Option<ColorCallback>,
    pub text: Option<&'static str>,
    /// Label text while disabled, `text` if unset.
    pub text_disabled: Option<&'static str>,
    pub value_enable: SlotValues,
    pub value_disable: SlotValues,
    /// Compared against incoming values. Defaults to the first enable value.
    pub reference_value: Option<i32>,
    pub comparison_mode: ComparisonMode,
    pub display_dim_factor_on: f32,
    pub display_dim_factor_off: f32,
    pub led_brightness_on: f32,
    pub led_brightness_off: f32,
}

impl Default for BinaryCallbackConfig {
    fn default() -> Self {
        Self {
            color: ColorValue::Single(DEFAULT_SWITCH_COLOR),
            color_callback: None,
            text: None,
            text_disabled: None,
            value_enable: SlotValues::fixed(1),
            value_disable: SlotValues::fixed(0),
            reference_value: None,
            comparison_mode: ComparisonMode::GreaterEqual,
            display_dim_factor_on: DEFAULT_SLOT_DIM_FACTOR_ON,
            display_dim_factor_off: DEFAULT_SLOT_DIM_FACTOR_OFF,
            led_brightness_on: DEFAULT_LED_BRIGHTNESS_ON,
            led_brightness_off: DEFAULT_LED_BRIGHTNESS_OFF,
        }
    }
}

// ── Callback ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct BinaryParameterCallback<U = ()> {
    base: Callback<U>,
    mapping_disable: Option<ParameterMapping>,
    config: BinaryCallbackConfig,
    reference_value: i32,
    forced_disabled: bool,

    // Last rendered inputs. `None` forces the next render.
    current_value: Option<Option<ParameterValue>>,
    current_color: Option<ColorValue>,
    current_state: Option<bool>,
}

impl<U: ClientListener> BinaryParameterCallback<U> {
    pub fn new(id: ListenerId, mapping: ParameterMapping, config: BinaryCallbackConfig) -> Self {
        let mut base = Callback::new(id);
        // The first mapping always fits.
        let _ = base.register_mapping(mapping);

        let reference_value = config
            .reference_value
            .or_else(|| config.value_enable.first().and_then(|s| s.resolved()))
            .unwrap_or(0);

        Self {
            base,
            mapping_disable: None,
            config,
            reference_value,
            forced_disabled: false,
            current_value: None,
            current_color: None,
            current_state: None,
        }
    }

    /// Send disable values through `mapping` instead of the main mapping.
    pub fn with_disable_mapping(mut self, mapping: ParameterMapping) -> Self {
        self.mapping_disable = Some(mapping);
        self
    }

    pub fn with_upstream(mut self, upstream: U) -> Self {
        self.base = self.base.with_upstream(upstream);
        self
    }

    pub fn base(&self) -> &Callback<U> {
        &self.base
    }

    pub(crate) fn base_mut(&mut self) -> &mut Callback<U> {
        &mut self.base
    }

    /// The main mapping.
    pub fn mapping(&self) -> &ParameterMapping {
        // Registered in `new()`.
        &self.base.mappings()[0]
    }

    pub fn config(&self) -> &BinaryCallbackConfig {
        &self.config
    }

    pub fn reference_value(&self) -> i32 {
        self.reference_value
    }

    /// Current disable values, including learned ones.
    pub fn value_disable(&self) -> &SlotValues {
        &self.config.value_disable
    }

    /// Replace the configured color. Takes effect on the next render.
    pub fn set_color(&mut self, color: ColorValue) {
        self.config.color = color;
    }

    /// Forget all rendered state so the next [`update_displays()`](Self::update_displays)
    /// re-evaluates and redraws.
    pub fn reset(&mut self) {
        self.current_value = None;
        self.current_color = None;
        self.current_state = None;
    }

    /// Force the state to disabled regardless of the value.
    pub(crate) fn set_forced_disabled(&mut self, forced: bool) {
        if self.forced_disabled != forced {
            self.forced_disabled = forced;
            self.current_value = None;
        }
    }

    pub fn init(&self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        self.base.init(client, now)
    }

    pub fn update(&self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        self.base.update(client, now)
    }

    /// Send the enable or disable value after the user toggled the switch,
    /// then request the value again.
    ///
    /// Unresolved auto slots are never sent: a single unresolved value
    /// sends nothing, a list sends only its resolved entries.
    pub fn state_changed_by_user(
        &mut self,
        action: &dyn SwitchAction,
        client: &mut dyn ParameterClient,
        now: Instant,
    ) -> Result<(), CallbackError> {
        let (mapping, values) = if action.state() {
            (self.mapping(), &self.config.value_enable)
        } else {
            (
                self.mapping_disable.as_ref().unwrap_or(self.mapping()),
                &self.config.value_disable,
            )
        };

        match values {
            SlotValues::Single(slot) => match slot.resolved() {
                Some(v) => client.set(&mut mapping.clone(), &ParameterValue::Number(v))?,
                None => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("BinaryParameterCallback: {} value unresolved, not sent", mapping.name);
                }
            },
            SlotValues::List(slots) => {
                let resolved: Vec<i32, MAX_MESSAGES_PER_MAPPING> =
                    slots.iter().filter_map(ValueSlot::resolved).collect();
                if resolved.len() == slots.len() {
                    client.set(&mut mapping.clone(), &ParameterValue::Numbers(resolved))?;
                } else if !resolved.is_empty() {
                    let mut subset = mapping
                        .set_subset(|i| slots.get(i).and_then(ValueSlot::resolved).is_some());
                    client.set(&mut subset, &ParameterValue::Numbers(resolved))?;
                }
            }
        }

        self.update(client, now)
    }

    /// Re-evaluate the state if the value changed, then redraw if the
    /// color or state changed.
    pub fn update_displays(&mut self, action: &mut dyn SwitchAction) {
        let value = self.mapping().value.clone();

        if self.current_value.as_ref() != Some(&value) {
            self.evaluate_value(action, value.as_ref());
            self.current_value = Some(value.clone());
        }

        let state = action.state();
        let color = match self.config.color_callback {
            Some(callback) => callback(state, value.as_ref()),
            None => self.config.color.clone(),
        };

        if self.current_color.as_ref() == Some(&color) && self.current_state == Some(state) {
            return;
        }

        self.set_switch_color(action, &color);
        self.set_label_color(action, &color);
        self.update_label_text(action);

        self.current_color = Some(color);
        self.current_state = Some(state);
    }

    fn evaluate_value(&mut self, action: &mut dyn SwitchAction, value: Option<&ParameterValue>) {
        let number = value.and_then(ParameterValue::as_number);
        let state = match number {
            _ if self.forced_disabled => false,
            Some(v) => self
                .config
                .comparison_mode
                .evaluate(v, self.reference_value, action.state()),
            None => false,
        };

        action.feedback_state(state);

        // Remember values seen while disabled for the next disable toggle.
        if let (false, Some(v)) = (state, number) {
            self.config.value_disable.learn(v);
        }
    }

    /// Enabled and actually backed by device feedback.
    fn shows_on(&self, action: &dyn SwitchAction) -> bool {
        action.state() && self.mapping().can_receive()
    }

    fn set_switch_color(&self, action: &mut dyn SwitchAction, color: &ColorValue) {
        let brightness = if self.shows_on(action) {
            self.config.led_brightness_on
        } else {
            self.config.led_brightness_off
        };
        action.set_switch_color(color);
        action.set_switch_brightness(brightness);
    }

    fn set_label_color(&self, action: &mut dyn SwitchAction, color: &ColorValue) {
        let factor = if self.shows_on(action) {
            self.config.display_dim_factor_on
        } else {
            self.config.display_dim_factor_off
        };
        if let Some(label) = action.label() {
            label.set_back_color(&color.dim(factor));
        }
    }

    fn update_label_text(&self, action: &mut dyn SwitchAction) {
        let Some(text) = self.config.text else {
            return;
        };
        let enabled_text = action.state() || !self.mapping().can_receive();
        let text = if enabled_text {
            text
        } else {
            self.config.text_disabled.unwrap_or(text)
        };
        if let Some(label) = action.label() {
            label.set_text(text);
        }
    }
}

impl<U: ClientListener> ClientListener for BinaryParameterCallback<U> {
    fn parameter_changed(&mut self, update: &ParameterUpdate) {
        self.base.parameter_changed(update);
    }

    fn request_terminated(&mut self, update: &ParameterUpdate) {
        self.base.request_terminated(update);
    }
}
