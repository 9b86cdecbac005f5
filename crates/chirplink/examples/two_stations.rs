//! Two stations on an in-memory medium negotiating a faster link.
//!
//! Run with `cargo run --example two_stations`.

use std::time::{Duration, Instant};

use chirplink::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let (radio_a, radio_b) = MemoryRadio::pair(1, 2);
    let now = Instant::now();
    let mut alpha = Station::new(radio_a, 1, Config::default(), Box::new(NullCallbacks), now);
    let mut bravo = Station::new(radio_b, 2, Config::default(), Box::new(NullCallbacks), now);
    alpha.setup()?;
    bravo.setup()?;

    // Move the link to SF9 / 500 kHz / channel 3 / 10 dBm.
    let target = RadioSettings::from_indices(2, 2, 3, 10)?;
    alpha.request_link_change(2, target, now)?;
    bravo.service_rx(now)?;

    let after_delay = now + Duration::from_millis(101);
    bravo.service_timers(after_delay)?;
    alpha.service_rx(after_delay)?;
    println!(
        "negotiated: alpha {:?} ({:?}), bravo {:?} ({:?})",
        alpha.settings(),
        alpha.link_state(),
        bravo.settings(),
        bravo.link_state()
    );

    // Traffic in both directions until each end trusts the new link.
    while alpha.link_state() != LinkState::Idle || bravo.link_state() != LinkState::Idle {
        alpha.set_message(b"ping");
        alpha.service_tx(2);
        bravo.service_rx(after_delay)?;
        bravo.set_message(b"pong");
        bravo.service_tx(1);
        alpha.service_rx(after_delay)?;
    }
    println!(
        "trusted: error fraction alpha={:.3} bravo={:.3}, last ack SNR {} dB",
        alpha.error_fraction(),
        bravo.error_fraction(),
        alpha.last_ack_snr()
    );
    Ok(())
}
