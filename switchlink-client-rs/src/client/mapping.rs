use core::hash::{Hash, Hasher as _};

use hash32::{FnvHasher, Hasher as _};

use super::message::{single, MessageList, MidiMessage};
use super::value::ParameterValue;

/// Kind of parameter a mapping describes, used by value providers to pick
/// the right decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MappingType {
    #[default]
    Numeric,
    Text,
}

/// Content-based identity of a mapping.
///
/// Hash of the identity template: the response template if present, else
/// the set template, else the request template. Two mappings that compare
/// equal always have the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MappingKey(pub u32);

const TAG_RESPONSE: u8 = b'R';
const TAG_SET: u8 = b'S';
const TAG_REQUEST: u8 = b'Q';

/// Wire description of one device parameter plus its last known value.
///
/// - `set`: message(s) that change the value, stamped by the value
///   provider before sending.
/// - `request`: message(s) that ask the device for the value.
/// - `response`: template(s) used to recognise and decode the answer.
///
/// Mappings are built once from configuration data. Only `value` changes
/// at runtime.
#[derive(Debug, Clone, Default)]
pub struct ParameterMapping {
    /// Name for log output only, never used as a key.
    pub name: &'static str,
    pub set: Option<MessageList>,
    pub request: Option<MessageList>,
    pub response: Option<MessageList>,
    pub mapping_type: MappingType,
    /// Last value decoded from a response, `None` until one arrived.
    pub value: Option<ParameterValue>,
}

impl ParameterMapping {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn with_set(mut self, message: MidiMessage) -> Self {
        self.set = Some(single(message));
        self
    }

    pub fn with_set_list(mut self, messages: MessageList) -> Self {
        self.set = Some(messages);
        self
    }

    pub fn with_request(mut self, message: MidiMessage) -> Self {
        self.request = Some(single(message));
        self
    }

    pub fn with_response(mut self, message: MidiMessage) -> Self {
        self.response = Some(single(message));
        self
    }

    pub fn with_response_list(mut self, messages: MessageList) -> Self {
        self.response = Some(messages);
        self
    }

    pub fn with_type(mut self, mapping_type: MappingType) -> Self {
        self.mapping_type = mapping_type;
        self
    }

    pub fn can_set(&self) -> bool {
        self.set.is_some()
    }

    pub fn can_request(&self) -> bool {
        self.request.is_some()
    }

    pub fn can_receive(&self) -> bool {
        self.response.is_some()
    }

    /// Copy without request/response and value, for fire-and-forget sends.
    pub fn set_only(&self) -> Self {
        Self {
            name: self.name,
            set: self.set.clone(),
            mapping_type: self.mapping_type,
            ..Self::default()
        }
    }

    /// Copy without request and value. Used for pushed parameters that
    /// must never be polled.
    pub fn set_and_receive_only(&self) -> Self {
        Self {
            name: self.name,
            set: self.set.clone(),
            response: self.response.clone(),
            mapping_type: self.mapping_type,
            ..Self::default()
        }
    }

    /// Copy keeping only the set messages whose index passes `keep`.
    pub fn set_subset(&self, keep: impl Fn(usize) -> bool) -> Self {
        let set = self.set.as_ref().map(|messages| {
            messages
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, m)| m.clone())
                .collect()
        });
        Self {
            set,
            value: None,
            ..self.clone()
        }
    }

    /// Content-based key, `None` if the mapping has no templates at all.
    pub fn key(&self) -> Option<MappingKey> {
        let (tag, template) = if let Some(response) = &self.response {
            (TAG_RESPONSE, response)
        } else if let Some(set) = &self.set {
            (TAG_SET, set)
        } else if let Some(request) = &self.request {
            (TAG_REQUEST, request)
        } else {
            return None;
        };

        let mut hasher = FnvHasher::default();
        hasher.write_u8(tag);
        template.hash(&mut hasher);
        Some(MappingKey(hasher.finish32()))
    }

    /// Returns `true` if `key` identifies this mapping.
    pub fn has_key(&self, key: MappingKey) -> bool {
        self.key() == Some(key)
    }

    /// Returns `true` if every response template is a SysEx message.
    pub(crate) fn response_is_sysex(&self) -> bool {
        self.response
            .as_ref()
            .is_some_and(|r| !r.is_empty() && r.iter().all(MidiMessage::is_sysex))
    }
}

/// Mappings are equal if their response templates match (when both have
/// one), else their set templates, else their request templates. A
/// mapping without templates equals nothing, not even itself.
impl PartialEq for ParameterMapping {
    fn eq(&self, other: &Self) -> bool {
        if let Some(response) = &self.response {
            return other.response.as_ref() == Some(response);
        }
        if let Some(set) = &self.set {
            return other.set.as_ref() == Some(set);
        }
        if let Some(request) = &self.request {
            return other.request.as_ref() == Some(request);
        }
        false
    }
}
