//! Kemper Profiler/Player support.
//!
//! Parameters are addressed by NRPN page and address and exchanged as
//! SysEx messages:
//!
//! ```text
//! request numeric   F0 00 20 33 <prod> 7F 41 00 <page> <addr> F7
//! request string    F0 00 20 33 <prod> 7F 43 00 <page> <addr> F7
//! set numeric       F0 00 20 33 <prod> 7F 01 00 <page> <addr> <msb> <lsb> F7
//! answer numeric    F0 00 20 33 00 00 01 00 <page> <addr> <msb> <lsb> F7
//! answer string     F0 00 20 33 00 00 03 00 <page> <addr> <ascii..> 00 F7
//! ```
//!
//! Effect slots are switched with plain control changes, which the device
//! does not echo.

mod protocol;
mod value_provider;

pub use protocol::{KemperBidirectionalProtocol, KemperProtocolConfig, KemperProtocolState};
pub use value_provider::KemperValueProvider;

use crate::client::{MappingType, MidiMessage, ParameterMapping, SysexData};

/// Kemper manufacturer id.
pub const MANUFACTURER_ID: [u8; 3] = [0x00, 0x20, 0x33];

/// Product type of the Profiler Player.
pub const PRODUCT_TYPE_PLAYER: u8 = 0x02;

/// Device id addressing any device.
pub const DEVICE_ID_OMNI: u8 = 0x7F;

pub const FUNCTION_SINGLE_PARAMETER: u8 = 0x01;
pub const FUNCTION_STRING_PARAMETER: u8 = 0x03;
pub const FUNCTION_REQUEST_SINGLE_PARAMETER: u8 = 0x41;
pub const FUNCTION_REQUEST_STRING_PARAMETER: u8 = 0x43;
pub const FUNCTION_BIDIRECTIONAL: u8 = 0x7E;

/// NRPN parameter address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NrpnAddress {
    pub page: u8,
    pub address: u8,
}

impl NrpnAddress {
    pub const fn new(page: u8, address: u8) -> Self {
        Self { page, address }
    }

    /// Address of a parameter mapping, read from its response template.
    pub fn of(mapping: &ParameterMapping) -> Option<Self> {
        let response = mapping.response.as_ref()?.first()?;
        let data = response.sysex_data()?;
        if data.len() < 9 || data[..3] != MANUFACTURER_ID {
            return None;
        }
        Some(Self::new(data[7], data[8]))
    }
}

pub const RIG_NAME: NrpnAddress = NrpnAddress::new(0x00, 0x01);
pub const RIG_DATE: NrpnAddress = NrpnAddress::new(0x00, 0x03);
pub const AMP_NAME: NrpnAddress = NrpnAddress::new(0x00, 0x10);
pub const MORPH_STATE: NrpnAddress = NrpnAddress::new(0x00, 0x0B);
pub const TUNER_MODE: NrpnAddress = NrpnAddress::new(0x7F, 0x7E);
pub const TUNER_NOTE: NrpnAddress = NrpnAddress::new(0x7D, 0x54);
pub const TUNER_DEVIANCE: NrpnAddress = NrpnAddress::new(0x7C, 0x0F);

/// Parameter address of the effect type within a slot page.
pub const EFFECT_TYPE_ADDRESS: u8 = 0x00;
/// Parameter address of the effect on/off state within a slot page.
pub const EFFECT_STATE_ADDRESS: u8 = 0x03;

/// Effect slots of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EffectSlot {
    A,
    B,
    Delay,
    Reverb,
}

impl EffectSlot {
    pub const ALL: [EffectSlot; 4] = [
        EffectSlot::A,
        EffectSlot::B,
        EffectSlot::Delay,
        EffectSlot::Reverb,
    ];

    /// NRPN page holding the slot's parameters.
    pub const fn page(self) -> u8 {
        match self {
            EffectSlot::A => 0x32,
            EffectSlot::B => 0x33,
            EffectSlot::Delay => 0x3C,
            EffectSlot::Reverb => 0x3D,
        }
    }

    /// Control change switching the slot on or off. Delay and reverb
    /// use the spillover variants.
    pub const fn enable_control(self) -> u8 {
        match self {
            EffectSlot::A => 17,
            EffectSlot::B => 18,
            EffectSlot::Delay => 27,
            EffectSlot::Reverb => 28,
        }
    }

    pub const fn state_address(self) -> NrpnAddress {
        NrpnAddress::new(self.page(), EFFECT_STATE_ADDRESS)
    }

    pub const fn type_address(self) -> NrpnAddress {
        NrpnAddress::new(self.page(), EFFECT_TYPE_ADDRESS)
    }
}

/// Parameters the device pushes once bidirectional mode is active.
pub const DEFAULT_BIDIRECTIONAL: &[NrpnAddress] = &[
    RIG_NAME,
    AMP_NAME,
    MORPH_STATE,
    TUNER_MODE,
    TUNER_NOTE,
    TUNER_DEVIANCE,
    EffectSlot::A.state_address(),
    EffectSlot::B.state_address(),
    EffectSlot::Delay.state_address(),
    EffectSlot::Reverb.state_address(),
    EffectSlot::A.type_address(),
    EffectSlot::B.type_address(),
    EffectSlot::Delay.type_address(),
    EffectSlot::Reverb.type_address(),
];

/// Parameters whose local sets are not echoed by the device.
pub const DEFAULT_FEEDBACK: &[NrpnAddress] = &[
    EffectSlot::A.state_address(),
    EffectSlot::B.state_address(),
    EffectSlot::Delay.state_address(),
    EffectSlot::Reverb.state_address(),
];

// ── Message builders ─────────────────────────────────────────────────

fn sysex(parts: &[&[u8]]) -> MidiMessage {
    let mut data = SysexData::new();
    for part in parts {
        // All builders stay far below the payload capacity.
        let _ = data.extend_from_slice(part);
    }
    MidiMessage::SystemExclusive(data)
}

fn host_message(product_type: u8, function: u8, rest: &[u8]) -> MidiMessage {
    sysex(&[
        &MANUFACTURER_ID,
        &[product_type, DEVICE_ID_OMNI, function, 0x00],
        rest,
    ])
}

fn device_message(function: u8, rest: &[u8]) -> MidiMessage {
    sysex(&[&MANUFACTURER_ID, &[0x00, 0x00, function, 0x00], rest])
}

/// Mapping for a 14-bit numeric parameter (set, request and response).
pub fn nrpn_numeric(name: &'static str, addr: NrpnAddress, product_type: u8) -> ParameterMapping {
    let a = [addr.page, addr.address];
    ParameterMapping::new(name)
        .with_set(host_message(
            product_type,
            FUNCTION_SINGLE_PARAMETER,
            &[addr.page, addr.address, 0, 0],
        ))
        .with_request(host_message(
            product_type,
            FUNCTION_REQUEST_SINGLE_PARAMETER,
            &a,
        ))
        .with_response(device_message(
            FUNCTION_SINGLE_PARAMETER,
            &[addr.page, addr.address, 0, 0],
        ))
}

/// Mapping for a string parameter (request and response only).
pub fn nrpn_string(name: &'static str, addr: NrpnAddress, product_type: u8) -> ParameterMapping {
    let a = [addr.page, addr.address];
    ParameterMapping::new(name)
        .with_request(host_message(
            product_type,
            FUNCTION_REQUEST_STRING_PARAMETER,
            &a,
        ))
        .with_response(device_message(FUNCTION_STRING_PARAMETER, &a))
        .with_type(MappingType::Text)
}

/// Set-only mapping for a control change.
pub fn control_change(name: &'static str, channel: u8, control: u8) -> ParameterMapping {
    ParameterMapping::new(name).with_set(MidiMessage::ControlChange {
        channel,
        control,
        value: 0,
    })
}

/// Effect on/off: switched by control change, read back by NRPN.
pub fn effect_state(slot: EffectSlot, product_type: u8) -> ParameterMapping {
    let numeric = nrpn_numeric("Effect State", slot.state_address(), product_type);
    ParameterMapping {
        set: control_change("Effect State", 0, slot.enable_control()).set,
        ..numeric
    }
}

/// Effect type of a slot (read only).
pub fn effect_type(slot: EffectSlot, product_type: u8) -> ParameterMapping {
    ParameterMapping {
        set: None,
        ..nrpn_numeric("Effect Type", slot.type_address(), product_type)
    }
}

pub fn rig_name(product_type: u8) -> ParameterMapping {
    nrpn_string("Rig Name", RIG_NAME, product_type)
}

pub fn amp_name(product_type: u8) -> ParameterMapping {
    nrpn_string("Amp Name", AMP_NAME, product_type)
}

pub fn tuner_note(product_type: u8) -> ParameterMapping {
    ParameterMapping {
        set: None,
        ..nrpn_numeric("Tuner Note", TUNER_NOTE, product_type)
    }
}

pub fn tuner_deviance(product_type: u8) -> ParameterMapping {
    ParameterMapping {
        set: None,
        ..nrpn_numeric("Tuner Deviance", TUNER_DEVIANCE, product_type)
    }
}
