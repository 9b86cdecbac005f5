use chirplink_core::InboundMessage;
use chirplink_protocol::RadioSettings;

/// Application-facing notification surface of one station.
///
/// Injected at construction; every slot has a no-op default so callers
/// implement only the indications they care about.
pub trait LinkCallbacks {
    /// A frame left the station. `acknowledged` reports whether the peer
    /// confirmed receipt; broadcast sends always report `true`.
    fn tx_indication(&mut self, payload: &[u8], dest: u8, acknowledged: bool) {
        let _ = (payload, dest, acknowledged);
    }

    /// A frame arrived, before any dispatch by message type.
    fn rx_indication(&mut self, message: &InboundMessage) {
        let _ = message;
    }

    /// The station's radio settings changed, by a local setter, a
    /// negotiated link change, or a rollback.
    fn link_change_indication(&mut self, settings: RadioSettings) {
        let _ = settings;
    }
}

/// Callbacks implementation that ignores every indication.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCallbacks;

impl LinkCallbacks for NullCallbacks {}
