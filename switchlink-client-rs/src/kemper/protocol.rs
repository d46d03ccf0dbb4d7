use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::Rgb888;

use super::{NrpnAddress, DEVICE_ID_OMNI, FUNCTION_BIDIRECTIONAL, MANUFACTURER_ID, PRODUCT_TYPE_PLAYER};
use crate::client::{
    BidirectionalProtocol, MidiMessage, MidiOutput, ParameterMapping, ProtocolEvent, SysexData,
};
use crate::color::{GREEN, RED};
use crate::period::PeriodCounter;

const BEACON: u8 = 0x40;
const KEEP_ALIVE: u8 = 0x7F;

/// Beacon flag asking the device to send the whole parameter set.
const FLAG_INIT: u8 = 0x01;

/// Bidirectional protocol settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KemperProtocolConfig {
    pub product_type: u8,
    /// Parameter set the device should push.
    pub parameter_set: u8,
    /// Time lease code sent with each beacon. The device keeps pushing
    /// for `time_lease * 2` seconds after the last beacon.
    pub time_lease: u8,
    /// Interval between beacons.
    pub beacon_period: Duration,
    /// The device counts as offline after this long without a keep-alive.
    pub sense_timeout: Duration,
}

impl Default for KemperProtocolConfig {
    fn default() -> Self {
        Self {
            product_type: PRODUCT_TYPE_PLAYER,
            parameter_set: 0x01,
            time_lease: 5,
            beacon_period: Duration::from_millis(5000),
            sense_timeout: Duration::from_millis(1500),
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KemperProtocolState {
    Offline,
    Connected,
}

/// Beacon / keep-alive handshake for the device's bidirectional mode.
///
/// Beacons are sent every `beacon_period`: with the init flag while
/// offline, plain renewals while connected. The device answers with
/// keep-alive messages; missing keep-alives for `sense_timeout` drop the
/// connection.
#[derive(Debug, Clone)]
pub struct KemperBidirectionalProtocol {
    config: KemperProtocolConfig,
    state: KemperProtocolState,
    bidirectional: &'static [NrpnAddress],
    feedback: &'static [NrpnAddress],
    beacon_period: PeriodCounter,
    last_keep_alive: Option<Instant>,
}

impl KemperBidirectionalProtocol {
    /// `bidirectional` lists the parameters the device pushes, `feedback`
    /// the ones whose local sets are not echoed.
    pub fn new(
        config: KemperProtocolConfig,
        bidirectional: &'static [NrpnAddress],
        feedback: &'static [NrpnAddress],
    ) -> Self {
        Self {
            config,
            state: KemperProtocolState::Offline,
            bidirectional,
            feedback,
            beacon_period: PeriodCounter::elapsed_at(config.beacon_period, Instant::MIN),
            last_keep_alive: None,
        }
    }

    pub fn state(&self) -> KemperProtocolState {
        self.state
    }

    pub fn config(&self) -> &KemperProtocolConfig {
        &self.config
    }

    /// Beacon message, with the init flag if `init` is set.
    pub fn beacon(&self, init: bool) -> MidiMessage {
        let flags = if init { FLAG_INIT } else { 0 };
        let mut data = SysexData::new();
        // Fixed size, far below the payload capacity.
        let _ = data.extend_from_slice(&MANUFACTURER_ID);
        let _ = data.extend_from_slice(&[
            self.config.product_type,
            DEVICE_ID_OMNI,
            FUNCTION_BIDIRECTIONAL,
            0x00,
            BEACON,
            self.config.parameter_set,
            flags,
            self.config.time_lease,
        ]);
        MidiMessage::SystemExclusive(data)
    }

    fn is_keep_alive(message: &MidiMessage) -> bool {
        let Some(data) = message.sysex_data() else {
            return false;
        };
        data.len() >= 8
            && data[..3] == MANUFACTURER_ID
            && data[4..8] == [DEVICE_ID_OMNI, FUNCTION_BIDIRECTIONAL, 0x00, KEEP_ALIVE]
    }

    fn send_beacon(&mut self, midi: &mut dyn MidiOutput, now: Instant) {
        let init = self.state == KemperProtocolState::Offline;
        midi.send(&self.beacon(init));
        self.beacon_period.reset(now);
    }

    fn listed(list: &[NrpnAddress], mapping: &ParameterMapping) -> bool {
        NrpnAddress::of(mapping).is_some_and(|addr| list.contains(&addr))
    }
}

impl BidirectionalProtocol for KemperBidirectionalProtocol {
    fn init(&mut self, midi: &mut dyn MidiOutput, now: Instant) {
        self.send_beacon(midi, now);
    }

    fn is_bidirectional(&self, mapping: &ParameterMapping) -> bool {
        Self::listed(self.bidirectional, mapping)
    }

    fn feedback_value(&self, mapping: &ParameterMapping) -> bool {
        Self::listed(self.feedback, mapping)
    }

    fn update(&mut self, midi: &mut dyn MidiOutput, now: Instant) -> Option<ProtocolEvent> {
        if self.state == KemperProtocolState::Connected {
            let silent = self
                .last_keep_alive
                .and_then(|last| now.checked_duration_since(last))
                .is_some_and(|d| d >= self.config.sense_timeout);
            if silent {
                #[cfg(feature = "defmt")]
                defmt::info!("KemperBidirectionalProtocol: no keep-alive, offline");

                self.state = KemperProtocolState::Offline;
                self.last_keep_alive = None;
                // Start over with an init beacon right away.
                self.send_beacon(midi, now);
                return Some(ProtocolEvent::ConnectionLost);
            }
        }

        if self.beacon_period.exceeded(now) {
            self.send_beacon(midi, now);
        }
        None
    }

    fn receive(&mut self, message: &MidiMessage, now: Instant) -> Option<ProtocolEvent> {
        if !Self::is_keep_alive(message) {
            return None;
        }
        self.last_keep_alive = Some(now);

        if self.state == KemperProtocolState::Connected {
            return None;
        }

        #[cfg(feature = "defmt")]
        defmt::info!("KemperBidirectionalProtocol: connected");

        self.state = KemperProtocolState::Connected;
        Some(ProtocolEvent::Connected)
    }

    fn color(&self) -> Rgb888 {
        match self.state {
            KemperProtocolState::Offline => RED,
            KemperProtocolState::Connected => GREEN,
        }
    }
}
