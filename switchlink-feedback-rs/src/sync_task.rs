//! Async tick loop for Embassy firmware.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Instant, Ticker};
use switchlink::{MidiInput, MidiMessage, ParameterClient};

use crate::controller::{Controller, Scene};

/// [`MidiInput`] reading from an Embassy channel without blocking.
///
/// The MIDI receive task pushes parsed messages into the channel, the
/// sync task drains them once per tick.
pub struct ChannelMidiInput<'a, M: RawMutex, const N: usize> {
    receiver: Receiver<'a, M, MidiMessage, N>,
}

impl<'a, M: RawMutex, const N: usize> ChannelMidiInput<'a, M, N> {
    pub fn new(receiver: Receiver<'a, M, MidiMessage, N>) -> Self {
        Self { receiver }
    }
}

impl<M: RawMutex, const N: usize> MidiInput for ChannelMidiInput<'_, M, N> {
    fn receive(&mut self) -> Option<MidiMessage> {
        self.receiver.try_receive().ok()
    }
}

/// Periodic sync loop.
///
/// This is a regular `async fn`, not an Embassy `#[task]`. Wrap it in a
/// concrete task since tasks cannot be generic:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn midi_sync_task(
///     controller: Controller<MyClient>,
///     scene: MyScene,
///     input: ChannelMidiInput<'static, CriticalSectionRawMutex, 16>,
/// ) {
///     sync_task(controller, scene, input, Duration::from_millis(10)).await;
/// }
/// ```
///
/// # Errors
///
/// * Scene init failure: logs the error and **returns** (task exits).
/// * Tick failure: logs the error and continues with the next tick.
pub async fn sync_task<C, S, I>(
    mut controller: Controller<C>,
    mut scene: S,
    mut input: I,
    tick_period: Duration,
) where
    C: ParameterClient,
    S: Scene,
    I: MidiInput,
{
    if let Err(_e) = controller.init(&mut scene, Instant::now()) {
        #[cfg(feature = "defmt")]
        defmt::error!("sync_task: scene init failed: {}", _e);
        return;
    }

    #[cfg(feature = "defmt")]
    defmt::info!("sync_task: running every {} ms", tick_period.as_millis());

    let mut ticker = Ticker::every(tick_period);
    loop {
        ticker.next().await;

        if let Err(_e) = controller.tick(&mut scene, &mut input, Instant::now()) {
            #[cfg(feature = "defmt")]
            defmt::error!("sync_task: tick failed: {}", _e);
        }
    }
}
