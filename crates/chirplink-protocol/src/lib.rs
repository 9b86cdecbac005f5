#![warn(missing_docs)]

//! chirplink-protocol: the pieces the link state machine is built from.
//!
//! - `settings`: radio parameter registry (spreading factor, bandwidth,
//!   frequency channel, tx power) with validated tables
//! - `wire`: the one-byte-tag message envelope
//! - `error_rate`: bounded-memory packet error estimator
//! - `timer`: poll-driven countdown timers
//! - `framer`: serial byte stream to outbound frame bridge

/// Bounded-memory moving average of acknowledgement failures.
pub mod error_rate;
/// Serial input framing and the debug command mini-protocol.
pub mod framer;
/// Radio parameter registry: tables, validation, circular advance.
pub mod settings;
/// Poll-driven countdown timers.
pub mod timer;
/// Wire envelope encode/decode.
pub mod wire;

pub use error_rate::PacketErrorEstimator;
pub use framer::{LocalCommand, MessageFramer, SerialEvent};
pub use settings::{
    FrequencyChannel, RadioSettings, SignalBandwidth, SpreadingFactor, TxPower,
};
pub use timer::PollTimer;
pub use wire::{Frame, MessageType};
