//! Value-driven switch and display feedback for footswitch controllers.
//!
//! Callbacks subscribe to parameter mappings through a
//! [`ParameterClient`](switchlink::ParameterClient), poll them
//! periodically and turn the received values into visual state: LED color
//! and brightness of a footswitch, text and colors of a display label.
//!
//! # Quick Start
//!
//! ```ignore
//! use switchlink::kemper::{EffectSlot, KemperValueProvider, PRODUCT_TYPE_PLAYER};
//! use switchlink::{Client, ClientConfig, ListenerId};
//! use switchlink_feedback::kemper::effect_enable;
//! use switchlink_feedback::{Controller, ControllerConfig, SwitchFeedback};
//!
//! let client = Client::new(midi_out, KemperValueProvider, ClientConfig::default(), now);
//! let mut controller = Controller::new(client, ControllerConfig::default(), now);
//! // `MyScene` implements `Scene` and `Listeners` for its elements.
//! let mut scene = MyScene {
//!     delay: effect_enable(ListenerId(0), EffectSlot::Delay, PRODUCT_TYPE_PLAYER),
//!     switch: SwitchFeedback::default(),
//! };
//! controller.init(&mut scene, now)?;
//! loop {
//!     controller.tick(&mut scene, &mut midi_in, Instant::now())?;
//! }
//! ```
//!
//! # Rendering
//!
//! Callbacks never draw. They write into [`SwitchAction`] and
//! [`FeedbackLabel`] sinks; the concrete [`SwitchFeedback`] and
//! [`DisplayLabel`] keep the values plus a `changed` flag the rendering
//! side polls and clears.
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`](https://docs.rs/defmt).
//! - **`task`**: the async [`sync_task`](sync_task::sync_task) loop and an
//!   Embassy channel based MIDI input.

#![cfg_attr(not(test), no_std)]

pub mod action;
pub mod binary;
pub mod callback;
pub mod controller;
pub mod effect;
pub mod error;
pub mod kemper;
pub mod parameter_label;
pub mod status;
#[cfg(feature = "task")]
pub mod sync_task;
pub mod tuner;

// ── Re-exports for convenience ───────────────────────────────────────

pub use action::{DisplayLabel, FeedbackLabel, SwitchAction, SwitchFeedback};
pub use binary::{
    BinaryCallbackConfig, BinaryParameterCallback, ColorCallback, ComparisonMode, SlotValues,
    ValueSlot,
};
pub use callback::{Callback, MAX_CALLBACK_MAPPINGS};
pub use controller::{Controller, ControllerConfig, Scene};
pub use effect::{EffectCategories, EffectEnableCallback, CATEGORY_NONE};
pub use error::CallbackError;
pub use kemper::KemperEffectCategories;
pub use parameter_label::ParameterDisplayLabel;
pub use status::ProtocolStateIndicator;
#[cfg(feature = "task")]
pub use sync_task::{sync_task, ChannelMidiInput};
pub use tuner::{DevianceMarker, TunerDisplay};
