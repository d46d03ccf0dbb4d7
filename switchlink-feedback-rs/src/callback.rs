//! Base callback: a set of mappings kept in sync with the client.

use embassy_time::Instant;
use heapless::Vec;
use switchlink::{ClientListener, ListenerId, ParameterClient, ParameterMapping, ParameterUpdate};

use crate::error::CallbackError;

/// Maximum number of mappings one callback can track.
pub const MAX_CALLBACK_MAPPINGS: usize = 4;

/// Tracks a fixed set of mappings on behalf of a switch or display element.
///
/// Values arriving from the client are copied into every local mapping
/// equal to the updated one, then forwarded to the optional upstream
/// listener.
#[derive(Debug)]
pub struct Callback<U = ()> {
    id: ListenerId,
    mappings: Vec<ParameterMapping, MAX_CALLBACK_MAPPINGS>,
    upstream: Option<U>,
}

impl<U: ClientListener> Callback<U> {
    pub fn new(id: ListenerId) -> Self {
        Self {
            id,
            mappings: Vec::new(),
            upstream: None,
        }
    }

    /// Forward notifications to `upstream` after the local values are updated.
    pub fn with_upstream(mut self, upstream: U) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Add a mapping. Returns its index.
    pub fn register_mapping(&mut self, mapping: ParameterMapping) -> Result<usize, CallbackError> {
        self.mappings
            .push(mapping)
            .map_err(|_| CallbackError::TooManyMappings)?;
        Ok(self.mappings.len() - 1)
    }

    pub fn mappings(&self) -> &[ParameterMapping] {
        &self.mappings
    }

    pub fn mapping(&self, index: usize) -> Option<&ParameterMapping> {
        self.mappings.get(index)
    }

    pub fn upstream(&self) -> Option<&U> {
        self.upstream.as_ref()
    }

    pub fn upstream_mut(&mut self) -> Option<&mut U> {
        self.upstream.as_mut()
    }

    /// Register all mappings with the client.
    pub fn init(&self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        for mapping in &self.mappings {
            client.register(mapping, self.id, now)?;
        }
        Ok(())
    }

    /// Request all mappings.
    pub fn update(&self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        for mapping in &self.mappings {
            client.request(mapping, self.id, now)?;
        }
        Ok(())
    }
}

impl<U: ClientListener> ClientListener for Callback<U> {
    fn parameter_changed(&mut self, update: &ParameterUpdate) {
        for mapping in self.mappings.iter_mut().filter(|m| update.concerns(m)) {
            mapping.value = update.value.clone();
        }
        if let Some(upstream) = self.upstream.as_mut() {
            upstream.parameter_changed(update);
        }
    }

    fn request_terminated(&mut self, update: &ParameterUpdate) {
        for mapping in self.mappings.iter_mut().filter(|m| update.concerns(m)) {
            mapping.value = None;
        }
        if let Some(upstream) = self.upstream.as_mut() {
            upstream.request_terminated(update);
        }
    }
}
