use embassy_time::{Duration, Instant};
use heapless::{FnvIndexMap, Vec};

use super::error::ClientError;
use super::listener::{ListenerId, Listeners, Outbox};
use super::mapping::{MappingKey, ParameterMapping};
use super::message::{MidiMessage, MidiOutput};
use super::request::{ClientRequest, RequestLifetime};
use super::value::ParameterValue;
use super::{ParameterClient, ValueProvider, MAX_REQUESTS};
use crate::period::PeriodCounter;

/// Configuration for the request tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClientConfig {
    /// How long a request waits for its answer before listeners are told
    /// it was terminated. Expired requests are swept every half of this.
    /// Zero means requests never expire.
    pub max_request_lifetime: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_request_lifetime: Duration::from_millis(2000),
        }
    }
}

/// Request tracker.
///
/// Owns all pending requests, at most one per distinct mapping. Incoming
/// messages are offered to every pending request; the value provider
/// decides which one they answer.
pub struct Client<M, P> {
    midi: M,
    value_provider: P,
    config: ClientConfig,
    requests: FnvIndexMap<MappingKey, ClientRequest, MAX_REQUESTS>,
    cleanup_period: PeriodCounter,
    outbox: Outbox,
}

impl<M: MidiOutput, P: ValueProvider> Client<M, P> {
    pub fn new(midi: M, value_provider: P, config: ClientConfig, now: Instant) -> Self {
        Self {
            midi,
            value_provider,
            cleanup_period: PeriodCounter::new(config.max_request_lifetime / 2, now),
            config,
            requests: FnvIndexMap::new(),
            outbox: Outbox::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn midi(&self) -> &M {
        &self.midi
    }

    pub fn midi_mut(&mut self) -> &mut M {
        &mut self.midi
    }

    pub fn value_provider(&self) -> &P {
        &self.value_provider
    }

    /// Pending requests. Order is unspecified.
    pub fn requests(&self) -> impl Iterator<Item = &ClientRequest> {
        self.requests.values()
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Number of notifications waiting for [`dispatch()`](ParameterClient::dispatch).
    pub fn pending_notifications(&self) -> usize {
        self.outbox.len()
    }

    /// Find the pending request for `mapping`.
    ///
    /// Only mappings whose response is SysEx are tracked for reuse; for
    /// all others this returns `Ok(None)`.
    pub fn matching_request(
        &self,
        mapping: &ParameterMapping,
    ) -> Result<Option<&ClientRequest>, ClientError> {
        let Some(key) = self.lookup_key(mapping)? else {
            return Ok(None);
        };
        Ok(self.requests.get(&key))
    }

    /// Key of the pending request for `mapping`, if there is one.
    ///
    /// A request stored under the same key but for a different mapping
    /// is a hash collision.
    fn lookup_key(&self, mapping: &ParameterMapping) -> Result<Option<MappingKey>, ClientError> {
        if !mapping.response_is_sysex() {
            return Ok(None);
        }
        let Some(key) = mapping.key() else {
            return Ok(None);
        };
        match self.requests.get(&key) {
            None => Ok(None),
            Some(request) if request.mapping() == mapping => Ok(Some(key)),
            Some(_) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Client: key collision for {}", mapping.name);
                Err(ClientError::KeyCollision)
            }
        }
    }

    /// Attach `listener` to the pending request for `mapping`, or create
    /// (and optionally send) a new one.
    pub fn register_mapping(
        &mut self,
        mapping: &ParameterMapping,
        listener: ListenerId,
        send: bool,
        lifetime: RequestLifetime,
        now: Instant,
    ) -> Result<(), ClientError> {
        if let Some(key) = self.lookup_key(mapping)? {
            if let Some(request) = self.requests.get_mut(&key) {
                request.add_listener(listener)?;

                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "Client: {} already requested, listener {} attached",
                    mapping.name,
                    listener
                );
                return Ok(());
            }
        }

        if self.requests.len() >= MAX_REQUESTS {
            #[cfg(feature = "defmt")]
            defmt::warn!("Client: request table full, dropping {}", mapping.name);
            return Err(ClientError::RequestTableFull);
        }

        let max_lifetime = match lifetime {
            RequestLifetime::Bounded => Some(self.config.max_request_lifetime),
            RequestLifetime::Unlimited => None,
        };
        let mut request = ClientRequest::new(mapping, max_lifetime, now)?;
        request.add_listener(listener)?;

        let key = request.key();
        if send {
            request.send(&mut self.midi);
        }
        self.requests
            .insert(key, request)
            .map_err(|_| ClientError::RequestTableFull)?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Client: new request for {}, {} pending",
            mapping.name,
            self.requests.len()
        );

        Ok(())
    }

    /// Simulate the device echoing `value` for `mapping`.
    ///
    /// Fails with [`ClientError::OutboxFull`] if earlier notifications
    /// were never dispatched; the value is written either way.
    pub fn feedback(
        &mut self,
        mapping: &ParameterMapping,
        value: &ParameterValue,
    ) -> Result<(), ClientError> {
        let key = self
            .lookup_key(mapping)?
            .ok_or(ClientError::NoRequestForFeedback)?;
        let request = self
            .requests
            .get_mut(&key)
            .ok_or(ClientError::NoRequestForFeedback)?;
        request.feedback(value, &mut self.outbox)
    }

    /// Terminate all pending requests whose mapping passes `filter`.
    pub fn terminate_where(&mut self, mut filter: impl FnMut(&ParameterMapping) -> bool) {
        for request in self.requests.values_mut() {
            if filter(request.mapping()) {
                request.terminate(&mut self.outbox);
            }
        }
        self.cleanup_requests();
    }

    fn cleanup_hanging_requests(&mut self, now: Instant) {
        let mut terminated = false;
        for request in self.requests.values_mut() {
            if request.expired(now) {
                request.terminate(&mut self.outbox);
                terminated = true;
            }
        }
        if terminated {
            self.cleanup_requests();
        }
    }

    /// Remove finished requests from the table.
    fn cleanup_requests(&mut self) {
        let finished: Vec<MappingKey, MAX_REQUESTS> = self
            .requests
            .iter()
            .filter(|(_, request)| request.is_finished())
            .map(|(key, _)| *key)
            .collect();
        for key in &finished {
            self.requests.remove(key);
        }
    }
}

impl<M: MidiOutput, P: ValueProvider> ParameterClient for Client<M, P> {
    /// Plain clients have nothing to pre-register.
    fn register(
        &mut self,
        _mapping: &ParameterMapping,
        _listener: ListenerId,
        _now: Instant,
    ) -> Result<(), ClientError> {
        Ok(())
    }

    fn request(
        &mut self,
        mapping: &ParameterMapping,
        listener: ListenerId,
        now: Instant,
    ) -> Result<(), ClientError> {
        self.register_mapping(mapping, listener, true, RequestLifetime::Bounded, now)
    }

    fn set(
        &mut self,
        mapping: &mut ParameterMapping,
        value: &ParameterValue,
    ) -> Result<(), ClientError> {
        if !mapping.can_set() {
            #[cfg(feature = "defmt")]
            defmt::error!("Client: {} has no set message", mapping.name);
            return Err(ClientError::NoSetMessage);
        }

        self.value_provider.set_value(mapping, value);
        if let Some(set) = &mapping.set {
            for message in set {
                self.midi.send(message);
            }
        }
        Ok(())
    }

    fn receive(&mut self, message: Option<&MidiMessage>, now: Instant) {
        if self.cleanup_period.exceeded(now) {
            self.cleanup_hanging_requests(now);
        }

        let Some(message) = message else {
            return;
        };

        let mut finished = false;
        for request in self.requests.values_mut() {
            request.parse(message, &mut self.value_provider, &mut self.outbox);
            finished |= request.is_finished();
        }
        if finished {
            self.cleanup_requests();
        }
    }

    fn dispatch(&mut self, listeners: &mut dyn Listeners) {
        self.outbox.dispatch(listeners);
    }
}
