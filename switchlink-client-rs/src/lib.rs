//! MIDI parameter synchronisation for footswitch controllers.
//!
//! This crate keeps a footswitch controller in sync with a MIDI-controlled
//! device (typically a guitar amp modeller). It owns the request/response
//! bookkeeping between the two: which parameters have been asked for, who
//! is waiting for the answer, and when an unanswered request has to be
//! given up.
//!
//! # Architecture
//!
//! ```text
//!   callbacks / UI elements            (switchlink-feedback)
//!        │ request / set      ▲ parameter_changed / request_terminated
//!        ▼                    │
//!   BidirectionalClient ──► Client ──► ClientRequest (one per mapping)
//!        │                    │
//!        ▼                    ▼
//!   BidirectionalProtocol   ValueProvider        MidiOutput / MidiInput
//! ```
//!
//! - [`client::Client`] tracks in-flight requests, at most one per
//!   distinct [`ParameterMapping`](client::ParameterMapping), and expires
//!   the ones the device never answers.
//! - [`client::BidirectionalClient`] adds parameters the device pushes on
//!   its own, plus offline detection through a protocol strategy.
//! - [`period::PeriodCounter`] is the elapsed-time gate used for polling
//!   and timeouts.
//!
//! The core never reads a clock. Every time-dependent call takes the
//! current [`Instant`](embassy_time::Instant), so the whole engine is
//! driven by the caller's tick loop.
//!
//! # `no_std` Compatibility
//!
//! No heap allocation. All collections are fixed-capacity `heapless`
//! containers; see the capacity constants in [`client`]. The optional
//! `defmt` feature enables structured logging for embedded targets.

#![cfg_attr(not(test), no_std)]

pub mod client;
pub mod color;
pub mod kemper;
pub mod period;

pub use client::{
    BidirectionalClient, BidirectionalProtocol, Client, ClientConfig, ClientError,
    ClientListener, ListenerId, Listeners, MappingKey, MappingType, MidiInput, MidiMessage,
    MidiOutput, ParameterClient, ParameterMapping, ParameterUpdate, ParameterValue,
    ProtocolEvent, ValueProvider,
};
pub use color::ColorValue;
pub use period::PeriodCounter;
