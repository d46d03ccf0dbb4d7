use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb888;

use super::error::ClientError;
use super::listener::{ListenerId, Listeners};
use super::mapping::ParameterMapping;
use super::message::{MidiMessage, MidiOutput};
use super::request::RequestLifetime;
use super::tracker::Client;
use super::value::ParameterValue;
use super::{ParameterClient, ValueProvider};

/// Connection state changes reported by a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolEvent {
    Connected,
    ConnectionLost,
}

/// Device-specific strategy for parameters the device pushes on its own.
pub trait BidirectionalProtocol {
    /// Called once when the client is created.
    fn init(&mut self, _midi: &mut dyn MidiOutput, _now: Instant) {}

    /// Returns `true` if the device pushes changes of `mapping` unsolicited.
    fn is_bidirectional(&self, mapping: &ParameterMapping) -> bool;

    /// Returns `true` if a local set of `mapping` should notify listeners
    /// right away instead of waiting for the device's echo.
    fn feedback_value(&self, mapping: &ParameterMapping) -> bool;

    /// Periodic hook for handshake and keep-alive handling.
    fn update(&mut self, midi: &mut dyn MidiOutput, now: Instant) -> Option<ProtocolEvent>;

    /// Inspect every incoming message (handshake traffic included).
    fn receive(&mut self, message: &MidiMessage, now: Instant) -> Option<ProtocolEvent>;

    /// Connection status color.
    fn color(&self) -> Rgb888;
}

/// Request tracker for devices that push parameter changes.
///
/// Bidirectional mappings get requests that never expire; they are only
/// cleared when the protocol reports a lost connection. Everything else
/// is handled exactly like [`Client`].
pub struct BidirectionalClient<M, P, B> {
    client: Client<M, P>,
    protocol: B,
}

impl<M: MidiOutput, P: ValueProvider, B: BidirectionalProtocol> BidirectionalClient<M, P, B> {
    pub fn new(mut client: Client<M, P>, mut protocol: B, now: Instant) -> Self {
        protocol.init(client.midi_mut(), now);
        Self { client, protocol }
    }

    pub fn client(&self) -> &Client<M, P> {
        &self.client
    }

    pub fn protocol(&self) -> &B {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut B {
        &mut self.protocol
    }

    /// Terminate every bidirectional request. Listeners get
    /// `request_terminated` and the next `request()` starts over.
    pub fn notify_connection_lost(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::info!("BidirectionalClient: connection lost");

        let protocol = &self.protocol;
        self.client
            .terminate_where(|mapping| protocol.is_bidirectional(mapping));
    }

    fn lifetime_for(&self, mapping: &ParameterMapping) -> RequestLifetime {
        if self.protocol.is_bidirectional(mapping) {
            RequestLifetime::Unlimited
        } else {
            RequestLifetime::Bounded
        }
    }

    fn handle_event(&mut self, event: Option<ProtocolEvent>) {
        match event {
            Some(ProtocolEvent::ConnectionLost) => self.notify_connection_lost(),
            Some(ProtocolEvent::Connected) => {
                #[cfg(feature = "defmt")]
                defmt::info!("BidirectionalClient: connected");
            }
            None => {}
        }
    }
}

impl<M: MidiOutput, P: ValueProvider, B: BidirectionalProtocol> ParameterClient
    for BidirectionalClient<M, P, B>
{
    /// Pre-registers bidirectional mappings so pushed values are caught
    /// before anyone requests them. Nothing is sent.
    fn register(
        &mut self,
        mapping: &ParameterMapping,
        listener: ListenerId,
        now: Instant,
    ) -> Result<(), ClientError> {
        if !self.protocol.is_bidirectional(mapping) {
            return Ok(());
        }
        let lifetime = self.lifetime_for(mapping);
        self.client
            .register_mapping(&mapping.set_and_receive_only(), listener, false, lifetime, now)
    }

    fn request(
        &mut self,
        mapping: &ParameterMapping,
        listener: ListenerId,
        now: Instant,
    ) -> Result<(), ClientError> {
        let lifetime = self.lifetime_for(mapping);
        if lifetime == RequestLifetime::Unlimited {
            self.client.register_mapping(
                &mapping.set_and_receive_only(),
                listener,
                true,
                lifetime,
                now,
            )?;
        }
        self.client
            .register_mapping(mapping, listener, true, lifetime, now)
    }

    fn set(
        &mut self,
        mapping: &mut ParameterMapping,
        value: &ParameterValue,
    ) -> Result<(), ClientError> {
        self.client.set(mapping, value)?;
        if self.protocol.feedback_value(mapping) {
            self.client.feedback(mapping, value)?;
        }
        Ok(())
    }

    fn receive(&mut self, message: Option<&MidiMessage>, now: Instant) {
        self.client.receive(message, now);
        if let Some(message) = message {
            let event = self.protocol.receive(message, now);
            self.handle_event(event);
        }
    }

    fn update(&mut self, now: Instant) {
        let event = self.protocol.update(self.client.midi_mut(), now);
        self.handle_event(event);
    }

    fn dispatch(&mut self, listeners: &mut dyn Listeners) {
        self.client.dispatch(listeners);
    }

    fn status_color(&self) -> Option<Rgb888> {
        Some(self.protocol.color())
    }
}
