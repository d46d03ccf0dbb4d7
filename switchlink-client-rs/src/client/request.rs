use embassy_time::{Duration, Instant};
use heapless::Vec;

use super::error::ClientError;
use super::listener::{EventKind, ListenerId, Outbox, ParameterUpdate};
use super::mapping::{MappingKey, ParameterMapping};
use super::message::{MidiMessage, MidiOutput};
use super::value::ParameterValue;
use super::{ValueProvider, MAX_LISTENERS_PER_REQUEST};
use crate::period::PeriodCounter;

/// Lifetime policy for a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestLifetime {
    /// Expires after the client's configured maximum lifetime.
    Bounded,
    /// Never expires. Used for parameters the device pushes on its own.
    Unlimited,
}

/// One outstanding request/response cycle for a mapping.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    mapping: ParameterMapping,
    key: MappingKey,
    lifetime: Option<PeriodCounter>,
    /// `None` once the request is finished.
    listeners: Option<Vec<ListenerId, MAX_LISTENERS_PER_REQUEST>>,
}

impl ClientRequest {
    /// Create a request for `mapping`.
    ///
    /// The request template (if any) and the response template must both
    /// consist of SysEx messages, and the response template must not be
    /// empty. A zero `max_lifetime` means the request
    /// never expires.
    pub fn new(
        mapping: &ParameterMapping,
        max_lifetime: Option<Duration>,
        now: Instant,
    ) -> Result<Self, ClientError> {
        if let Some(request) = &mapping.request {
            if !request.iter().all(MidiMessage::is_sysex) {
                return Err(ClientError::RequestNotSysex);
            }
        }
        let response = mapping
            .response
            .as_ref()
            .filter(|response| !response.is_empty())
            .ok_or(ClientError::NoResponseTemplate)?;
        if !response.iter().all(MidiMessage::is_sysex) {
            return Err(ClientError::ResponseNotSysex);
        }
        let key = mapping.key().ok_or(ClientError::NoResponseTemplate)?;

        let lifetime = max_lifetime
            .filter(|d| d.as_ticks() > 0)
            .map(|d| PeriodCounter::new(d, now));

        Ok(Self {
            mapping: ParameterMapping {
                value: None,
                ..mapping.clone()
            },
            key,
            lifetime,
            listeners: Some(Vec::new()),
        })
    }

    pub fn mapping(&self) -> &ParameterMapping {
        &self.mapping
    }

    pub fn key(&self) -> MappingKey {
        self.key
    }

    pub fn has_lifetime(&self) -> bool {
        self.lifetime.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.listeners.is_none()
    }

    /// Attached listeners in registration order, `None` if finished.
    pub fn listeners(&self) -> Option<&[ListenerId]> {
        self.listeners.as_deref()
    }

    /// Attach a listener. Attaching the same listener twice is a no-op.
    pub fn add_listener(&mut self, listener: ListenerId) -> Result<(), ClientError> {
        let Some(listeners) = self.listeners.as_mut() else {
            return Ok(());
        };
        if listeners.contains(&listener) {
            return Ok(());
        }
        listeners
            .push(listener)
            .map_err(|_| ClientError::TooManyListeners)
    }

    /// Send the request message(s), if the mapping has any.
    pub fn send(&self, midi: &mut dyn MidiOutput) {
        if let Some(request) = &self.mapping.request {
            for message in request {
                midi.send(message);
            }
        }
    }

    /// Offer `message` to this request.
    ///
    /// Returns `true` if it was parsed as the answer. Requests with a
    /// lifetime finish after the first answer, unlimited ones keep their
    /// listeners for the next push.
    pub(crate) fn parse<P: ValueProvider + ?Sized>(
        &mut self,
        message: &MidiMessage,
        provider: &mut P,
        outbox: &mut Outbox,
    ) -> bool {
        if self.is_finished() || !message.is_sysex() {
            return false;
        }
        if !provider.parse(&mut self.mapping, message) {
            return false;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Client: {} received {}", self.mapping.name, self.mapping.value);

        // A full outbox drops the batch (logged there); the answer still counts.
        let _ = self.notify(EventKind::Changed, outbox);
        if self.lifetime.is_some() {
            self.listeners = None;
        }
        true
    }

    /// Write `value` as if the device had echoed it and notify listeners.
    pub(crate) fn feedback(
        &mut self,
        value: &ParameterValue,
        outbox: &mut Outbox,
    ) -> Result<(), ClientError> {
        self.mapping.value = Some(value.clone());
        self.notify(EventKind::Changed, outbox)
    }

    /// Returns `true` if the lifetime has run out at `now`.
    pub(crate) fn expired(&mut self, now: Instant) -> bool {
        self.lifetime
            .as_mut()
            .is_some_and(|lifetime| lifetime.exceeded(now))
    }

    /// Notify listeners of termination and finish. No-op if already finished.
    pub(crate) fn terminate(&mut self, outbox: &mut Outbox) {
        if self.is_finished() {
            return;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Client: request for {} terminated", self.mapping.name);

        let _ = self.notify(EventKind::Terminated, outbox);
        self.listeners = None;
    }

    fn notify(&self, kind: EventKind, outbox: &mut Outbox) -> Result<(), ClientError> {
        match &self.listeners {
            Some(listeners) => {
                let update = ParameterUpdate::of(self.key, &self.mapping);
                outbox.push_all(listeners, kind, &update)
            }
            None => Ok(()),
        }
    }
}
