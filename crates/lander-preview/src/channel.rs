//! Editor side of the preview protocol.

use lander_config::ConfigSnapshot;

use crate::frame::{DeviceMode, FrameState, ReloadDecision};
use crate::message::PreviewMessage;
use crate::transport::Transport;

/// Pushes snapshots from the editor to the rendering context.
///
/// The editor is the only initiator: the rendering context cannot ask for a
/// resend, so the channel sends on every mutation and again whenever the
/// rendering context reports it has loaded.
#[derive(Debug)]
pub struct PreviewChannel<T: Transport> {
    transport: T,
    frame: FrameState,
}

impl<T: Transport> PreviewChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            frame: FrameState::default(),
        }
    }

    pub fn with_device(transport: T, device: DeviceMode) -> Self {
        Self {
            transport,
            frame: FrameState::new(device),
        }
    }

    /// Send `config` to the rendering context.
    ///
    /// Fire-and-forget: failures are logged and otherwise ignored.
    pub fn broadcast(&self, config: &ConfigSnapshot) {
        let data = match PreviewMessage::config_update(config).encode() {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Could not encode preview update: {}", e);
                return;
            }
        };

        if let Err(e) = self.transport.post(data) {
            tracing::debug!("Preview update not delivered: {}", e);
        }
    }

    /// The rendering context finished loading; resend what it may have missed.
    pub fn on_ready(&mut self, config: &ConfigSnapshot) {
        self.frame.mark_loaded();
        self.broadcast(config);
    }

    pub fn mount(&mut self) {
        self.frame.mount();
    }

    /// Switch the simulated device, reporting whether the frame must reload.
    pub fn set_device(&mut self, device: DeviceMode) -> ReloadDecision {
        let decision = self.frame.set_device(device);
        if let ReloadDecision::Reload { generation } = decision {
            tracing::info!("Reloading preview for {} (generation {})", device, generation);
        }
        decision
    }

    /// URL the rendering frame should currently load.
    pub fn frame_url(&self, base: &str) -> String {
        self.frame.url(base)
    }

    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::in_process;
    use pretty_assertions::assert_eq;

    #[test]
    fn broadcast_sends_config_update() {
        let (transport, mut inbox) = in_process("http://editor.test");
        let channel = PreviewChannel::new(transport);

        channel.broadcast(&ConfigSnapshot::default());

        let delivery = inbox.try_recv().unwrap();
        let message = PreviewMessage::decode(&delivery.data).unwrap();
        assert_eq!(message, PreviewMessage::config_update(&ConfigSnapshot::default()));
    }

    #[test]
    fn ready_signal_resends_current_snapshot() {
        let (transport, mut inbox) = in_process("http://editor.test");
        let mut channel = PreviewChannel::new(transport);
        let config = ConfigSnapshot::default();

        channel.broadcast(&config);
        inbox.drain();

        channel.on_ready(&config);

        assert_eq!(inbox.drain().len(), 1);
        assert!(channel.frame().is_loaded());
    }

    #[test]
    fn broadcasting_never_reloads() {
        let (transport, _inbox) = in_process("http://editor.test");
        let mut channel = PreviewChannel::new(transport);
        channel.mount();

        for _ in 0..3 {
            channel.broadcast(&ConfigSnapshot::default());
        }

        assert_eq!(channel.frame().generation(), 0);
        assert_eq!(
            channel.set_device(DeviceMode::Mobile),
            ReloadDecision::Reload { generation: 1 }
        );
    }

    #[test]
    fn lost_rendering_context_does_not_fail_broadcast() {
        let (transport, inbox) = in_process("http://editor.test");
        drop(inbox);

        PreviewChannel::new(transport).broadcast(&ConfigSnapshot::default());
    }
}
