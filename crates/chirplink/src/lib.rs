#![warn(missing_docs)]

//! chirplink: a point-to-point LoRa link layer with in-band link
//! adaptation.
//!
//! Two stations share a half-duplex radio link and renegotiate its
//! physical parameters (spreading factor, bandwidth, frequency channel,
//! transmit power) over the link itself. A failed negotiation rolls both
//! ends back to the last known-good settings, so the link never strands.
//!
//! This facade re-exports the workspace crates:
//! - [`chirplink_core`]: configuration, errors, the transport trait
//! - [`chirplink_protocol`]: parameter registry, wire envelope, error
//!   estimator, timers, serial framer
//! - [`chirplink_station`]: the [`Station`](chirplink_station::Station)
//!   state machine and an in-memory medium
//!
//! ```no_run
//! use std::time::Instant;
//! use chirplink::prelude::*;
//!
//! let (radio, _peer) = MemoryRadio::pair(1, 2);
//! let now = Instant::now();
//! let mut station = Station::new(radio, 1, Config::default(), Box::new(NullCallbacks), now);
//! station.setup()?;
//! station.start_heartbeats(now);
//! # Ok::<(), chirplink::ErrorKind>(())
//! ```

pub use chirplink_core::{Config, ErrorKind, InboundMessage, RadioTransport, Result};
pub use chirplink_protocol::{
    Frame, FrequencyChannel, LocalCommand, MessageFramer, MessageType, PacketErrorEstimator,
    PollTimer, RadioSettings, SerialEvent, SignalBandwidth, SpreadingFactor, TxPower,
};
pub use chirplink_station::{LinkCallbacks, LinkState, MemoryRadio, NullCallbacks, Station};

/// Common imports for building on the link layer.
pub mod prelude {
    pub use chirplink_core::{Config, ErrorKind, InboundMessage, RadioTransport, Result};
    pub use chirplink_protocol::{
        FrequencyChannel, RadioSettings, SignalBandwidth, SpreadingFactor, TxPower,
    };
    pub use chirplink_station::{LinkCallbacks, LinkState, MemoryRadio, NullCallbacks, Station};
}
