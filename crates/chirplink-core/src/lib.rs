#![warn(missing_docs)]

//! chirplink-core: foundational types and utilities.
//!
//! This crate provides the minimal set of core utilities shared across all
//! layers of the link:
//! - Configuration types
//! - Error handling
//! - Protocol constants
//! - The radio transport abstraction
//!
//! Protocol-specific logic lives in specialized crates:
//! - `chirplink-protocol`: wire envelope, parameter registry, error
//!   estimator, poll timers, serial framer
//! - `chirplink-station`: the link state machine driving one station

/// Protocol constants shared across layers.
pub mod constants {
    /// Maximum total frame length the radio transport accepts, in bytes.
    /// The message type tag occupies the first byte of every frame.
    pub const MAX_FRAME_LEN: usize = 128;
    /// Destination address that reaches every listening station.
    ///
    /// Broadcast sends are never acknowledged, so they are excluded from
    /// packet error accounting.
    pub const BROADCAST_ADDRESS: u8 = 255;
    /// Number of samples over which the packet error moving average
    /// stabilizes; after this many the newest sample weighs `1/WINDOW`.
    pub const PACKET_ERROR_WINDOW: u32 = 100;
    /// Byte length of a link-change request or response frame
    /// (tag + spreading factor + bandwidth + channel + tx power).
    pub const LINK_CHANGE_FRAME_LEN: usize = 5;
    /// Byte length of a heartbeat request or response frame
    /// (tag + sender address).
    pub const HEARTBEAT_FRAME_LEN: usize = 2;
}

/// Configuration options for a station.
pub mod config;
/// Error types and results.
pub mod error;
/// Radio transport abstraction for pluggable hardware.
pub mod transport;

pub use config::Config;
pub use error::{ErrorKind, Result};
pub use transport::{InboundMessage, RadioTransport};
