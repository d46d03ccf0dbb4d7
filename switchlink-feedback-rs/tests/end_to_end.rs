//! Full ticks through controller, client, callbacks and visual sinks.

use std::collections::VecDeque;

use embassy_time::Instant;
use switchlink::color::{GREEN, RED};
use switchlink::kemper::{
    rig_name, EffectSlot, KemperBidirectionalProtocol, KemperProtocolConfig, KemperProtocolState,
    KemperValueProvider, DEFAULT_BIDIRECTIONAL, DEFAULT_FEEDBACK, PRODUCT_TYPE_PLAYER,
};
use switchlink::{
    BidirectionalClient, Client, ClientConfig, ClientError, ClientListener, ColorValue,
    ListenerId, Listeners, MidiInput, MidiMessage, MidiOutput, ParameterClient, ParameterMapping,
    ParameterValue, ValueProvider,
};
use switchlink_feedback::binary::{DEFAULT_LED_BRIGHTNESS_OFF, DEFAULT_LED_BRIGHTNESS_ON};
use switchlink_feedback::kemper::effect_enable;
use switchlink_feedback::{
    BinaryCallbackConfig, BinaryParameterCallback, CallbackError, ComparisonMode, Controller,
    ControllerConfig, DisplayLabel, EffectEnableCallback, KemperEffectCategories,
    ParameterDisplayLabel, ProtocolStateIndicator, Scene, SwitchFeedback,
};

fn t(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

fn sysex(bytes: &[u8]) -> MidiMessage {
    MidiMessage::sysex(bytes).unwrap()
}

#[derive(Default)]
struct Wire(Vec<MidiMessage>);

impl MidiOutput for Wire {
    fn send(&mut self, message: &MidiMessage) {
        self.0.push(message.clone());
    }
}

#[derive(Default)]
struct Input(VecDeque<MidiMessage>);

impl Input {
    fn push(&mut self, message: MidiMessage) {
        self.0.push_back(message);
    }
}

impl MidiInput for Input {
    fn receive(&mut self) -> Option<MidiMessage> {
        self.0.pop_front()
    }
}

// ── Polled parameter ─────────────────────────────────────────────────

/// Answers `[addr, value]` for templates `[addr, _]`.
struct AddressProvider;

impl ValueProvider for AddressProvider {
    fn parse(&mut self, mapping: &mut ParameterMapping, message: &MidiMessage) -> bool {
        let Some(data) = message.sysex_data() else {
            return false;
        };
        let Some(template) = mapping
            .response
            .as_ref()
            .and_then(|r| r.first())
            .and_then(MidiMessage::sysex_data)
        else {
            return false;
        };
        if data.len() != 2 || data[0] != template[0] {
            return false;
        }
        mapping.value = Some(ParameterValue::Number(data[1] as i32));
        true
    }

    fn set_value(&mut self, _mapping: &mut ParameterMapping, _value: &ParameterValue) {}
}

const REQ: [u8; 2] = [0x40, 0x07];
const RESP_TEMPLATE: [u8; 2] = [0x07, 0x00];

struct PolledScene {
    callback: BinaryParameterCallback,
    switch: SwitchFeedback,
}

impl Listeners for PolledScene {
    fn listener(&mut self, id: ListenerId) -> Option<&mut dyn ClientListener> {
        match id.0 {
            0 => Some(&mut self.callback),
            _ => None,
        }
    }
}

impl Scene for PolledScene {
    fn update(&mut self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        self.callback.update(client, now)
    }

    fn update_displays(&mut self, _client: &dyn ParameterClient) {
        self.callback.update_displays(&mut self.switch);
    }
}

#[test]
fn polled_value_turns_the_switch_on() {
    let mapping = ParameterMapping::new("M")
        .with_request(sysex(&REQ))
        .with_response(sysex(&RESP_TEMPLATE));
    let mut scene = PolledScene {
        callback: BinaryParameterCallback::new(
            ListenerId(0),
            mapping,
            BinaryCallbackConfig {
                color: ColorValue::Single(RED),
                reference_value: Some(5),
                comparison_mode: ComparisonMode::GreaterEqual,
                ..BinaryCallbackConfig::default()
            },
        ),
        switch: SwitchFeedback::default(),
    };
    let client = Client::new(Wire::default(), AddressProvider, ClientConfig::default(), t(0));
    let mut controller = Controller::new(client, ControllerConfig::default(), t(0));
    let mut input = Input::default();
    controller.init(&mut scene, t(0)).unwrap();

    // Tick 1: the update gate elapses and the request goes out.
    controller.tick(&mut scene, &mut input, t(0)).unwrap();
    assert_eq!(controller.client().midi().0, vec![sysex(&REQ)]);
    assert_eq!(controller.client().request_count(), 1);
    scene.switch.take_changed();

    // Tick 2: the answer arrives.
    input.push(sysex(&[0x07, 9]));
    controller.tick(&mut scene, &mut input, t(50)).unwrap();
    assert_eq!(scene.callback.mapping().value, Some(ParameterValue::Number(9)));
    assert!(scene.switch.state);
    assert_eq!(scene.switch.color, ColorValue::Single(RED));
    assert_eq!(scene.switch.brightness, DEFAULT_LED_BRIGHTNESS_ON);
    assert!(scene.switch.take_changed());
    // Answered requests with a lifetime are done.
    assert_eq!(controller.client().request_count(), 0);

    // Tick 3: nothing new, nothing touched.
    controller.tick(&mut scene, &mut input, t(100)).unwrap();
    assert!(!scene.switch.take_changed());
    assert_eq!(controller.client().midi().0.len(), 1);
}

#[test]
fn unanswered_request_is_terminated_and_polled_again() {
    let mapping = ParameterMapping::new("M")
        .with_request(sysex(&REQ))
        .with_response(sysex(&RESP_TEMPLATE));
    let mut scene = PolledScene {
        callback: BinaryParameterCallback::new(ListenerId(0), mapping, BinaryCallbackConfig::default()),
        switch: SwitchFeedback::default(),
    };
    let client = Client::new(Wire::default(), AddressProvider, ClientConfig::default(), t(0));
    let mut controller = Controller::new(client, ControllerConfig::default(), t(0));
    let mut input = Input::default();

    controller.tick(&mut scene, &mut input, t(0)).unwrap();
    input.push(sysex(&[0x07, 1]));
    controller.tick(&mut scene, &mut input, t(10)).unwrap();
    assert!(scene.switch.state);

    // Polls while a request is pending do not go out twice.
    controller.tick(&mut scene, &mut input, t(200)).unwrap();
    controller.tick(&mut scene, &mut input, t(400)).unwrap();
    assert_eq!(controller.client().midi().0.len(), 2);

    // No answer: the request from 200 outlives its 2000 ms and is swept
    // at 3000, where the next poll goes out.
    for ms in (600..=2800).step_by(200) {
        controller.tick(&mut scene, &mut input, t(ms)).unwrap();
    }
    assert!(scene.switch.state);
    controller.tick(&mut scene, &mut input, t(3000)).unwrap();
    assert!(!scene.switch.state);
    assert_eq!(scene.callback.mapping().value, None);
    assert_eq!(scene.switch.brightness, DEFAULT_LED_BRIGHTNESS_OFF);
    assert_eq!(controller.client().midi().0.len(), 3);
}

// ── Kemper bidirectional ─────────────────────────────────────────────

type KemperClient = BidirectionalClient<Wire, KemperValueProvider, KemperBidirectionalProtocol>;

struct KemperScene {
    effect: EffectEnableCallback<KemperEffectCategories>,
    switch: SwitchFeedback,
    rig: ParameterDisplayLabel,
    status: ProtocolStateIndicator,
}

impl Listeners for KemperScene {
    fn listener(&mut self, id: ListenerId) -> Option<&mut dyn ClientListener> {
        match id.0 {
            0 => Some(&mut self.effect),
            1 => Some(&mut self.rig),
            _ => None,
        }
    }
}

impl Scene for KemperScene {
    fn init(&mut self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        self.effect.init(client, now)?;
        self.rig.init(client, now)
    }

    fn update(&mut self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError> {
        self.effect.update(client, now)?;
        self.rig.update(client, now)
    }

    fn update_displays(&mut self, client: &dyn ParameterClient) {
        self.effect.update_displays(&mut self.switch);
        self.status.update(client);
    }
}

fn keep_alive() -> MidiMessage {
    sysex(&[0x00, 0x20, 0x33, 0x02, 0x7F, 0x7E, 0x00, 0x7F, 0x00])
}

fn init_beacon() -> MidiMessage {
    sysex(&[0x00, 0x20, 0x33, 0x02, 0x7F, 0x7E, 0x00, 0x40, 0x01, 0x01, 0x05])
}

fn answer(page: u8, address: u8, value: u8) -> MidiMessage {
    sysex(&[0x00, 0x20, 0x33, 0x00, 0x00, 0x01, 0x00, page, address, 0x00, value])
}

fn rig_answer(name: &str) -> MidiMessage {
    let mut bytes = vec![0x00, 0x20, 0x33, 0x00, 0x00, 0x03, 0x00, 0x00, 0x01];
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);
    sysex(&bytes)
}

fn kemper_setup() -> (Controller<KemperClient>, KemperScene) {
    let client = BidirectionalClient::new(
        Client::new(Wire::default(), KemperValueProvider, ClientConfig::default(), t(0)),
        KemperBidirectionalProtocol::new(
            KemperProtocolConfig::default(),
            DEFAULT_BIDIRECTIONAL,
            DEFAULT_FEEDBACK,
        ),
        t(0),
    );
    let controller = Controller::new(client, ControllerConfig::default(), t(0));
    let scene = KemperScene {
        effect: effect_enable(ListenerId(0), EffectSlot::A, PRODUCT_TYPE_PLAYER),
        switch: SwitchFeedback::with_label(DisplayLabel::default()),
        rig: ParameterDisplayLabel::new(ListenerId(1), rig_name(PRODUCT_TYPE_PLAYER))
            .with_text_offline("Offline"),
        status: ProtocolStateIndicator::new(),
    };
    (controller, scene)
}

#[test]
fn pushed_values_toggle_and_connection_loss() {
    let (mut controller, mut scene) = kemper_setup();
    let mut input = Input::default();
    controller.init(&mut scene, t(0)).unwrap();

    // Pushed parameters are never polled, only the beacon goes out.
    controller.tick(&mut scene, &mut input, t(0)).unwrap();
    assert_eq!(controller.client().client().midi().0, vec![init_beacon()]);
    assert_eq!(scene.rig.label().text(), "Offline");
    assert_eq!(scene.status.color(), Some(RED));

    // Device comes up and pushes its state.
    input.push(keep_alive());
    input.push(answer(0x32, 0x00, 20));
    input.push(answer(0x32, 0x03, 1));
    input.push(rig_answer("Crunch"));
    controller.tick(&mut scene, &mut input, t(10)).unwrap();

    assert_eq!(controller.client().protocol().state(), KemperProtocolState::Connected);
    assert_eq!(scene.status.color(), Some(GREEN));
    assert!(scene.switch.state);
    assert_eq!(scene.switch.color, ColorValue::Single(RED));
    assert_eq!(scene.switch.label.as_ref().unwrap().text(), "Distortion");
    assert_eq!(scene.rig.label().text(), "Crunch");
    // Pushed requests stay registered.
    assert_eq!(controller.client().client().request_count(), 3);

    // The user switches the effect off. The device does not echo this,
    // the local feedback takes its place.
    scene.switch.toggle();
    scene
        .effect
        .state_changed_by_user(&scene.switch, controller.client_mut(), t(20))
        .unwrap();
    assert_eq!(
        controller.client().client().midi().0.last(),
        Some(&MidiMessage::ControlChange {
            channel: 0,
            control: 17,
            value: 0
        })
    );
    controller.tick(&mut scene, &mut input, t(30)).unwrap();
    assert_eq!(
        scene.effect.mapping_state().value,
        Some(ParameterValue::Number(0))
    );
    assert!(!scene.switch.state);
    assert_eq!(scene.switch.brightness, DEFAULT_LED_BRIGHTNESS_OFF);

    // Long after the last keep-alive: the protocol gives up, pushed
    // requests are terminated and everything shows offline.
    controller.tick(&mut scene, &mut input, t(1600)).unwrap();
    assert_eq!(controller.client().protocol().state(), KemperProtocolState::Offline);
    assert_eq!(controller.client().client().midi().0.last(), Some(&init_beacon()));
    assert_eq!(scene.rig.label().text(), "Offline");
    assert_eq!(scene.effect.mapping_type().value, None);
    assert_eq!(scene.switch.label.as_ref().unwrap().text(), "-");
    assert!(!scene.switch.state);
    assert_eq!(scene.status.color(), Some(RED));
}

#[test]
fn set_without_matching_request_reports_an_error() {
    let (mut controller, mut scene) = kemper_setup();
    // Scene never initialised, so no request exists for the feedback.
    let result = scene
        .effect
        .state_changed_by_user(&scene.switch, controller.client_mut(), t(0));
    assert_eq!(
        result,
        Err(CallbackError::Client(ClientError::NoRequestForFeedback))
    );
}
