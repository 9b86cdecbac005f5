//! Two stations negotiating over the in-memory medium.

use std::{
    cell::RefCell,
    rc::Rc,
    time::{Duration, Instant},
};

use chirplink_core::{Config, InboundMessage};
use chirplink_protocol::{RadioSettings, SpreadingFactor};
use chirplink_station::{LinkCallbacks, LinkState, MemoryRadio, NullCallbacks, Station};

fn faster_link() -> RadioSettings {
    // SF9 / 500 kHz / channel 3 / 10 dBm
    RadioSettings::from_indices(2, 2, 3, 10).unwrap()
}

fn station_pair(now: Instant) -> (Station<MemoryRadio>, Station<MemoryRadio>) {
    let (radio_a, radio_b) = MemoryRadio::pair(1, 2);
    let mut a = Station::new(radio_a, 1, Config::default(), Box::new(NullCallbacks), now);
    let mut b = Station::new(radio_b, 2, Config::default(), Box::new(NullCallbacks), now);
    a.setup().unwrap();
    b.setup().unwrap();
    (a, b)
}

#[test]
fn full_negotiation_reaches_a_trusted_link() {
    let now = Instant::now();
    let (mut a, mut b) = station_pair(now);

    assert!(a.request_link_change(2, faster_link(), now).unwrap());
    assert_eq!(a.link_state(), LinkState::AwaitingResponse);

    // Responder picks the request up on the old settings and applies.
    b.service_rx(now).unwrap();
    assert_eq!(b.settings(), faster_link());
    assert_eq!(b.link_state(), LinkState::Provisional);

    // Deferred response goes out on the new settings and is acknowledged.
    let after_delay = now + Duration::from_millis(101);
    b.service_timers(after_delay).unwrap();
    a.service_rx(after_delay).unwrap();
    assert_eq!(a.link_state(), LinkState::Provisional);
    assert_eq!(a.settings(), b.settings());

    // Enough acknowledged traffic in both directions proves the link.
    let trusted_after = Config::default().successful_packets_before_trusted;
    for _ in 0..trusted_after {
        a.set_message(b"ping");
        assert!(a.service_tx(2));
        b.set_message(b"pong");
        assert!(b.service_tx(1));
    }
    assert_eq!(a.link_state(), LinkState::Idle);
    assert_eq!(b.link_state(), LinkState::Idle);

    // No timer ever rolls the trusted settings back.
    let far = now + Duration::from_secs(3600);
    a.service_timers(far).unwrap();
    b.service_timers(far).unwrap();
    assert_eq!(a.settings(), faster_link());
    assert_eq!(b.settings(), faster_link());
}

#[test]
fn initiator_reverts_when_the_responder_never_answers() {
    let now = Instant::now();
    let (mut a, _b) = station_pair(now);

    assert!(a.request_link_change(2, faster_link(), now).unwrap());
    assert_eq!(a.settings(), faster_link());

    a.service_timers(now + Duration::from_millis(3001)).unwrap();
    assert_eq!(a.settings(), RadioSettings::default());
    assert_eq!(a.link_state(), LinkState::Idle);
}

#[test]
fn responder_reverts_when_its_response_goes_unheard() {
    let now = Instant::now();
    let (mut a, mut b) = station_pair(now);

    assert!(a.request_link_change(2, faster_link(), now).unwrap());
    b.service_rx(now).unwrap();
    assert_eq!(b.settings(), faster_link());

    // The initiator wanders off to different parameters before the
    // deferred response fires, so the response cannot be acknowledged.
    a.set_spreading_factor(SpreadingFactor::Sf12);

    b.service_timers(now + Duration::from_millis(101)).unwrap();
    assert_eq!(b.settings(), RadioSettings::default());
    assert_eq!(b.link_state(), LinkState::Idle);
}

#[test]
fn heartbeat_exchange_updates_liveness_on_both_ends() {
    let now = Instant::now();
    let (mut a, mut b) = station_pair(now);

    a.start_heartbeats(now);
    let beat = now + Duration::from_secs(10) + Duration::from_millis(1);
    a.service_timers(beat).unwrap();

    b.service_rx(beat).unwrap();
    assert_eq!(b.last_heard(), Some(beat));

    let reply = beat + Duration::from_millis(101);
    b.service_timers(reply).unwrap();
    a.service_rx(reply).unwrap();
    assert_eq!(a.last_heard(), Some(reply));

    a.stop_heartbeats();
    assert!(!a.heartbeats_running());
}

#[test]
fn data_frames_pass_through_to_the_application() {
    struct Recorder {
        inbound: Rc<RefCell<Vec<InboundMessage>>>,
    }

    impl LinkCallbacks for Recorder {
        fn rx_indication(&mut self, message: &InboundMessage) {
            self.inbound.borrow_mut().push(message.clone());
        }
    }

    let now = Instant::now();
    let (radio_a, radio_b) = MemoryRadio::pair(1, 2);
    let inbound = Rc::new(RefCell::new(Vec::new()));
    let mut a = Station::new(radio_a, 1, Config::default(), Box::new(NullCallbacks), now);
    let mut b = Station::new(
        radio_b,
        2,
        Config::default(),
        Box::new(Recorder {
            inbound: Rc::clone(&inbound),
        }),
        now,
    );
    a.setup().unwrap();
    b.setup().unwrap();

    assert!(a.feed_serial(b"hello\n").unwrap());
    assert!(a.service_tx(2));
    b.service_rx(now).unwrap();

    let received = inbound.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].source, 1);
    assert_eq!(received[0].payload, vec![1, b'h', b'e', b'l', b'l', b'o']);
}
