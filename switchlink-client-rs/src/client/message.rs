use heapless::Vec;

use super::{MAX_MESSAGES_PER_MAPPING, MAX_SYSEX_LEN};

/// Start of a System Exclusive message on the wire.
pub const SYSEX_START: u8 = 0xF0;
/// End of a System Exclusive message on the wire.
pub const SYSEX_END: u8 = 0xF7;

/// SysEx payload between the `F0`/`F7` framing bytes (manufacturer id first).
pub type SysexData = Vec<u8, MAX_SYSEX_LEN>;

/// Wire bytes of one rendered message (payload plus framing).
pub type WireBytes = Vec<u8, { MAX_SYSEX_LEN + 2 }>;

/// Ordered list of messages. Single-message templates are lists of one.
pub type MessageList = Vec<MidiMessage, MAX_MESSAGES_PER_MAPPING>;

/// The MIDI messages the controller exchanges with the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MidiMessage {
    ControlChange { channel: u8, control: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    SystemExclusive(SysexData),
}

impl MidiMessage {
    /// Build a SysEx message from its payload (without `F0`/`F7`).
    ///
    /// Returns `None` if the payload exceeds [`MAX_SYSEX_LEN`].
    pub fn sysex(payload: &[u8]) -> Option<Self> {
        SysexData::from_slice(payload)
            .ok()
            .map(MidiMessage::SystemExclusive)
    }

    pub fn is_sysex(&self) -> bool {
        matches!(self, MidiMessage::SystemExclusive(_))
    }

    /// SysEx payload, or `None` for channel messages.
    pub fn sysex_data(&self) -> Option<&[u8]> {
        match self {
            MidiMessage::SystemExclusive(data) => Some(data),
            _ => None,
        }
    }

    /// Render the message as wire bytes.
    pub fn to_bytes(&self) -> WireBytes {
        let mut out = WireBytes::new();
        // Capacity covers the largest message, pushes cannot fail.
        match self {
            MidiMessage::ControlChange {
                channel,
                control,
                value,
            } => {
                let _ = out.extend_from_slice(&[0xB0 | (channel & 0x0F), control & 0x7F, value & 0x7F]);
            }
            MidiMessage::ProgramChange { channel, program } => {
                let _ = out.extend_from_slice(&[0xC0 | (channel & 0x0F), program & 0x7F]);
            }
            MidiMessage::SystemExclusive(data) => {
                let _ = out.push(SYSEX_START);
                let _ = out.extend_from_slice(data);
                let _ = out.push(SYSEX_END);
            }
        }
        out
    }

    /// Parse one complete message from wire bytes.
    ///
    /// Only the message kinds the controller uses are recognised; anything
    /// else (including truncated input) yields `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, rest) = bytes.split_first()?;
        match status & 0xF0 {
            0xB0 if rest.len() >= 2 => Some(MidiMessage::ControlChange {
                channel: status & 0x0F,
                control: rest[0],
                value: rest[1],
            }),
            0xC0 if !rest.is_empty() => Some(MidiMessage::ProgramChange {
                channel: status & 0x0F,
                program: rest[0],
            }),
            0xF0 if status == SYSEX_START => {
                let end = rest.iter().position(|&b| b == SYSEX_END)?;
                MidiMessage::sysex(&rest[..end])
            }
            _ => None,
        }
    }
}

/// Build a [`MessageList`] holding a single message.
pub fn single(message: MidiMessage) -> MessageList {
    let mut list = MessageList::new();
    // An empty list always has room for one message.
    let _ = list.push(message);
    list
}

/// Sink for outgoing messages. No acknowledgement is expected.
pub trait MidiOutput {
    fn send(&mut self, message: &MidiMessage);
}

/// Non-blocking source of incoming messages.
pub trait MidiInput {
    /// Return the next pending message, or `None` right away if there is none.
    fn receive(&mut self) -> Option<MidiMessage>;
}

impl<T: MidiOutput + ?Sized> MidiOutput for &mut T {
    fn send(&mut self, message: &MidiMessage) {
        (**self).send(message)
    }
}
