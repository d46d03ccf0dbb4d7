use crate::client::{MappingType, MidiMessage, ParameterMapping, ParameterValue, ValueProvider};

/// Largest value a 14-bit NRPN parameter can carry.
pub const MAX_NRPN_VALUE: i32 = 0x3FFF;

/// Value provider for Kemper NRPN parameters.
///
/// Numeric answers match their template in length and every byte but the
/// trailing 14-bit value. String answers match on the template's address
/// prefix and carry ASCII text up to a terminating zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct KemperValueProvider;

impl KemperValueProvider {
    pub fn new() -> Self {
        Self
    }
}

fn parse_numeric(template: &[u8], data: &[u8]) -> Option<i32> {
    if template.len() < 2 || data.len() != template.len() {
        return None;
    }
    let split = template.len() - 2;
    if data[..split] != template[..split] {
        return None;
    }
    Some(((data[split] as i32 & 0x7F) << 7) | (data[split + 1] as i32 & 0x7F))
}

fn parse_text(template: &[u8], data: &[u8]) -> Option<ParameterValue> {
    let text = data.strip_prefix(template)?;
    let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
    let ascii = &text[..end];
    if !ascii.is_ascii() {
        return None;
    }
    // ASCII is valid UTF-8.
    core::str::from_utf8(ascii).ok().map(ParameterValue::text)
}

fn encode_14bit(value: i32) -> [u8; 2] {
    let v = value.clamp(0, MAX_NRPN_VALUE);
    [((v >> 7) & 0x7F) as u8, (v & 0x7F) as u8]
}

fn encode_7bit(value: i32) -> u8 {
    value.clamp(0, 0x7F) as u8
}

impl ValueProvider for KemperValueProvider {
    fn parse(&mut self, mapping: &mut ParameterMapping, message: &MidiMessage) -> bool {
        let Some(data) = message.sysex_data() else {
            return false;
        };
        let Some(templates) = mapping.response.as_ref() else {
            return false;
        };

        let parsed = templates
            .iter()
            .filter_map(MidiMessage::sysex_data)
            .find_map(|template| match mapping.mapping_type {
                MappingType::Numeric => parse_numeric(template, data).map(ParameterValue::Number),
                MappingType::Text => parse_text(template, data),
            });

        match parsed {
            Some(value) => {
                mapping.value = Some(value);
                true
            }
            None => false,
        }
    }

    fn set_value(&mut self, mapping: &mut ParameterMapping, value: &ParameterValue) {
        let Some(set) = mapping.set.as_mut() else {
            return;
        };
        for (index, message) in set.iter_mut().enumerate() {
            let Some(n) = value.number_at(index) else {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "KemperValueProvider: no numeric value for message {} of {}",
                    index,
                    mapping.name
                );
                continue;
            };
            match message {
                MidiMessage::ControlChange { value, .. } => *value = encode_7bit(n),
                MidiMessage::ProgramChange { program, .. } => *program = encode_7bit(n),
                MidiMessage::SystemExclusive(data) => {
                    let len = data.len();
                    if len >= 2 {
                        data[len - 2..].copy_from_slice(&encode_14bit(n));
                    }
                }
            }
        }
    }
}
