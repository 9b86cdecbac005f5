//! Radio transport abstraction for pluggable hardware.

use std::time::Duration;

/// A datagram delivered by the reliable transport.
///
/// Transient: the station overwrites its receive slot on every poll, so
/// callers that need the payload beyond the indication must copy it.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Address of the sending station.
    pub source: u8,
    /// Address this datagram was sent to (may be the broadcast address).
    pub dest: u8,
    /// Transport-assigned message id, used for duplicate suppression.
    pub id: u8,
    /// Transport flags (retry bit etc.), opaque to the link layer.
    pub flags: u8,
    /// Frame bytes: type tag followed by the type-specific payload.
    pub payload: Vec<u8>,
}

/// Low-level radio + reliable-datagram abstraction.
///
/// This trait covers the two external collaborators of the link layer: the
/// physical radio driver (modulation setters, carrier sense, SNR) and the
/// acknowledged-datagram service layered on it (send-with-retry-and-ack,
/// receive-with-timeout, duplicate suppression). Implementations may be
/// real hardware or an in-memory medium; the station never touches radio
/// state except through this trait.
pub trait RadioTransport {
    /// Brings up the radio and the datagram service. Returns `false` on a
    /// hard failure; there is no recovery path once this fails.
    fn init(&mut self) -> bool;

    /// Pushes a spreading factor (chips-per-symbol exponent, 7..=12).
    fn set_spreading_factor(&mut self, chips: u8);

    /// Pushes a signal bandwidth in Hz.
    fn set_signal_bandwidth(&mut self, hz: u32);

    /// Tunes the synthesizer to a center frequency in MHz. Returns `false`
    /// if the radio cannot synthesize it.
    fn set_frequency(&mut self, mhz: f32) -> bool;

    /// Pushes a transmit power in dBm, optionally through the boost pin.
    fn set_tx_power(&mut self, dbm: i8, boost: bool);

    /// Blocks until clear-channel assessment reports an idle medium.
    fn wait_clear_channel(&mut self);

    /// Signal-to-noise ratio of the last received transmission, in dB.
    fn last_snr(&self) -> i16;

    /// Sends a frame and waits for the peer's acknowledgement, retrying
    /// within the transport's retry budget. Returns `true` once the peer
    /// confirms receipt. Sends to the broadcast address are never waited
    /// on and report `true` as soon as the frame is on the air.
    fn send_to_wait(&mut self, payload: &[u8], dest: u8) -> bool;

    /// Polls for an inbound frame, waiting at most `timeout`. Duplicates
    /// already acknowledged by the transport are suppressed internally.
    fn receive_timeout(&mut self, timeout: Duration) -> Option<InboundMessage>;
}
