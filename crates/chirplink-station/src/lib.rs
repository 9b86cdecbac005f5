#![warn(missing_docs)]

//! chirplink-station: the link state machine driving one station.
//!
//! A [`Station`] owns a [`RadioTransport`](chirplink_core::RadioTransport)
//! implementation plus all adaptation state and exposes the poll-driven
//! service loop: `service_rx`, `service_tx`, `service_timers`, and
//! `feed_serial`. The [`memory`] module provides a paired in-memory medium
//! so two stations can negotiate against each other without hardware.

/// Application notification surface.
pub mod callbacks;
/// In-memory paired radio medium.
pub mod memory;
/// The link state machine.
pub mod station;

pub use callbacks::{LinkCallbacks, NullCallbacks};
pub use memory::MemoryRadio;
pub use station::{LinkState, Station};
