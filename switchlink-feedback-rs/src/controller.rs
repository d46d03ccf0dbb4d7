//! Tick orchestration: MIDI input, periodic updates and display refresh.

use embassy_time::{Duration, Instant};
use switchlink::{Listeners, MidiInput, ParameterClient, PeriodCounter};

use crate::error::CallbackError;

/// Controller timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Interval of the periodic callback updates (polling). Default: 200 ms.
    pub update_interval: Duration,
    /// Maximum number of MIDI messages handled in one tick. Default: 10.
    pub max_consecutive_midi_messages: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(200),
            max_consecutive_midi_messages: 10,
        }
    }
}

/// Everything the controller drives: callbacks and display elements.
///
/// The scene resolves listener ids for notification dispatch and fans the
/// periodic calls out to its elements.
pub trait Scene: Listeners {
    /// Called once before the first tick (register mappings).
    fn init(&mut self, _client: &mut dyn ParameterClient, _now: Instant) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Called once per update interval (request mappings).
    fn update(&mut self, client: &mut dyn ParameterClient, now: Instant) -> Result<(), CallbackError>;

    /// Called every tick after notifications were dispatched.
    fn update_displays(&mut self, client: &dyn ParameterClient);
}

/// Drives a [`ParameterClient`] and a [`Scene`] from a tick loop.
///
/// # One tick
///
/// 1. Dispatch feedback left over from sets since the last tick.
/// 2. Read up to `max_consecutive_midi_messages` messages and hand each to
///    the client, dispatching after each one. The client always gets at
///    least one call, with `None` when nothing arrived, so request
///    timeouts are swept.
/// 3. If the update interval elapsed: client update and scene update,
///    each followed by a dispatch.
/// 4. Refresh displays, even if the scene update failed.
#[derive(Debug)]
pub struct Controller<C> {
    client: C,
    config: ControllerConfig,
    update_period: PeriodCounter,
}

impl<C: ParameterClient> Controller<C> {
    /// The first tick always runs the periodic update.
    pub fn new(client: C, config: ControllerConfig, now: Instant) -> Self {
        Self {
            client,
            config,
            update_period: PeriodCounter::elapsed_at(config.update_interval, now),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn init<S: Scene>(&mut self, scene: &mut S, now: Instant) -> Result<(), CallbackError> {
        scene.init(&mut self.client, now)
    }

    /// Run one pass of the main loop. A scene update error is returned
    /// after the displays were refreshed.
    pub fn tick<S: Scene>(
        &mut self,
        scene: &mut S,
        input: &mut dyn MidiInput,
        now: Instant,
    ) -> Result<(), CallbackError> {
        // Feedback from sets since the last tick.
        self.client.dispatch(scene);

        for _ in 0..self.config.max_consecutive_midi_messages.max(1) {
            let message = input.receive();
            self.client.receive(message.as_ref(), now);
            self.client.dispatch(scene);
            if message.is_none() {
                break;
            }
        }

        let mut result = Ok(());
        if self.update_period.exceeded(now) {
            self.client.update(now);
            self.client.dispatch(scene);
            result = scene.update(&mut self.client, now);
            self.client.dispatch(scene);
        }

        scene.update_displays(&self.client);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::tests::{sysex, t, MockClient};
    use switchlink::{ClientListener, ListenerId, MidiMessage};

    struct Queue(std::collections::VecDeque<MidiMessage>);

    impl MidiInput for Queue {
        fn receive(&mut self) -> Option<MidiMessage> {
            self.0.pop_front()
        }
    }

    fn queue(n: u8) -> Queue {
        Queue((0..n).map(|i| sysex(&[i])).collect())
    }

    #[derive(Default)]
    struct Counting {
        inits: usize,
        updates: usize,
        renders: usize,
    }

    impl Listeners for Counting {
        fn listener(&mut self, _id: ListenerId) -> Option<&mut dyn ClientListener> {
            None
        }
    }

    impl Scene for Counting {
        fn init(&mut self, _client: &mut dyn ParameterClient, _now: Instant) -> Result<(), CallbackError> {
            self.inits += 1;
            Ok(())
        }
        fn update(&mut self, _client: &mut dyn ParameterClient, _now: Instant) -> Result<(), CallbackError> {
            self.updates += 1;
            Ok(())
        }
        fn update_displays(&mut self, _client: &dyn ParameterClient) {
            self.renders += 1;
        }
    }

    fn controller() -> Controller<MockClient> {
        Controller::new(MockClient::default(), ControllerConfig::default(), t(1000))
    }

    #[test]
    fn update_runs_on_interval() {
        let mut c = controller();
        let mut scene = Counting::default();
        let mut input = queue(0);

        c.init(&mut scene, t(1000)).unwrap();
        assert_eq!(scene.inits, 1);

        c.tick(&mut scene, &mut input, t(1000)).unwrap();
        c.tick(&mut scene, &mut input, t(1100)).unwrap();
        c.tick(&mut scene, &mut input, t(1199)).unwrap();
        assert_eq!(scene.updates, 1);
        c.tick(&mut scene, &mut input, t(1200)).unwrap();
        assert_eq!(scene.updates, 2);
        assert_eq!(c.client().update_calls, 2);

        // Displays refresh every tick.
        assert_eq!(scene.renders, 4);
    }

    #[test]
    fn idle_tick_still_feeds_the_client() {
        let mut c = controller();
        let mut scene = Counting::default();
        c.tick(&mut scene, &mut queue(0), t(1000)).unwrap();
        assert_eq!(c.client().receive_calls, 1);
        assert!(c.client().received.is_empty());
    }

    #[test]
    fn input_is_drained_up_to_the_limit() {
        let mut c = controller();
        let mut scene = Counting::default();
        let mut input = queue(15);

        c.tick(&mut scene, &mut input, t(1000)).unwrap();
        assert_eq!(c.client().received.len(), 10);
        assert_eq!(input.0.len(), 5);

        c.tick(&mut scene, &mut input, t(1010)).unwrap();
        assert_eq!(c.client().received.len(), 15);
        // The trailing `None` was fed as well.
        assert_eq!(c.client().receive_calls, 16);
    }

    #[test]
    fn scene_errors_are_returned() {
        struct Failing;
        impl Listeners for Failing {
            fn listener(&mut self, _id: ListenerId) -> Option<&mut dyn ClientListener> {
                None
            }
        }
        impl Scene for Failing {
            fn update(&mut self, _: &mut dyn ParameterClient, _: Instant) -> Result<(), CallbackError> {
                Err(CallbackError::TooManyMappings)
            }
            fn update_displays(&mut self, _: &dyn ParameterClient) {}
        }

        let mut c = controller();
        assert_eq!(
            c.tick(&mut Failing, &mut queue(0), t(1000)),
            Err(CallbackError::TooManyMappings)
        );
    }

    #[test]
    fn scene_error_still_dispatches_and_renders() {
        struct Failing {
            renders: usize,
        }
        impl Listeners for Failing {
            fn listener(&mut self, _id: ListenerId) -> Option<&mut dyn ClientListener> {
                None
            }
        }
        impl Scene for Failing {
            fn update(&mut self, _: &mut dyn ParameterClient, _: Instant) -> Result<(), CallbackError> {
                Err(CallbackError::TooManyMappings)
            }
            fn update_displays(&mut self, _: &dyn ParameterClient) {
                self.renders += 1;
            }
        }

        let mut c = controller();
        let mut scene = Failing { renders: 0 };
        let dispatched = c.client().dispatch_calls;
        assert!(c.tick(&mut scene, &mut queue(0), t(1000)).is_err());
        assert_eq!(scene.renders, 1);
        // Start, one empty receive, after update, after the scene update.
        assert_eq!(c.client().dispatch_calls - dispatched, 4);
    }

    #[test]
    fn every_receive_is_followed_by_a_dispatch() {
        let mut c = controller();
        let mut scene = Counting::default();
        c.tick(&mut scene, &mut queue(3), t(1000)).unwrap();
        assert_eq!(c.client().receive_calls, 4);
        // Before the loop, per receive, after the client and scene updates.
        assert_eq!(c.client().dispatch_calls, 1 + 4 + 2);

        // Without an update due, only the input side dispatches.
        c.tick(&mut scene, &mut queue(1), t(1010)).unwrap();
        assert_eq!(c.client().dispatch_calls, 7 + 1 + 2);
    }
}
