//! Connection status dot for bidirectional clients.

use embedded_graphics::pixelcolor::Rgb888;
use switchlink::ParameterClient;

/// Mirrors the client's status color. Stays `None` for clients without
/// a connection status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolStateIndicator {
    color: Option<Rgb888>,
    /// Set when the color changed.
    pub changed: bool,
}

impl ProtocolStateIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> Option<Rgb888> {
        self.color
    }

    pub fn update(&mut self, client: &dyn ParameterClient) {
        let Some(color) = client.status_color() else {
            return;
        };
        if self.color != Some(color) {
            self.color = Some(color);
            self.changed = true;
        }
    }

    pub fn take_changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }
}
