//! In-memory paired radio medium for tests and demos.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use chirplink_core::{constants::BROADCAST_ADDRESS, InboundMessage, RadioTransport};
use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Physical parameters one radio is tuned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Tuning {
    chips: u8,
    bandwidth_hz: u32,
    deci_mhz: u16,
    dbm: i8,
}

struct AirFrame {
    source: u8,
    dest: u8,
    id: u8,
    payload: Vec<u8>,
    tuning: Tuning,
}

/// One end of a two-station in-memory medium.
///
/// Frames carry the sender's tuning; delivery and acknowledgement require
/// the receiver to be tuned to the same parameters, which is what makes
/// link-change rollback scenarios reproducible without hardware. Optional
/// seeded random loss models a marginal link. `receive_timeout` returns
/// immediately, there is nothing to wait for in memory.
pub struct MemoryRadio {
    address: u8,
    slot: usize,
    tunings: Arc<Mutex<[Tuning; 2]>>,
    tx: Sender<AirFrame>,
    rx: Receiver<AirFrame>,
    loss: f64,
    rng: StdRng,
    next_id: u8,
    snr: i16,
}

impl MemoryRadio {
    /// Creates a lossless pair of radios sharing one medium.
    pub fn pair(address_a: u8, address_b: u8) -> (Self, Self) {
        Self::pair_lossy(address_a, address_b, 0.0, 0)
    }

    /// Creates a pair where each send is lost with probability `loss`,
    /// deterministically from `seed`.
    pub fn pair_lossy(address_a: u8, address_b: u8, loss: f64, seed: u64) -> (Self, Self) {
        let tunings = Arc::new(Mutex::new([Tuning::default(); 2]));
        let (a_to_b_tx, a_to_b_rx) = unbounded();
        let (b_to_a_tx, b_to_a_rx) = unbounded();
        let a = MemoryRadio {
            address: address_a,
            slot: 0,
            tunings: Arc::clone(&tunings),
            tx: a_to_b_tx,
            rx: b_to_a_rx,
            loss,
            rng: StdRng::seed_from_u64(seed),
            next_id: 0,
            snr: 5,
        };
        let b = MemoryRadio {
            address: address_b,
            slot: 1,
            tunings,
            tx: b_to_a_tx,
            rx: a_to_b_rx,
            loss,
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            next_id: 0,
            snr: 5,
        };
        (a, b)
    }

    /// Overrides the SNR this radio reports for received transmissions.
    pub fn set_snr(&mut self, snr: i16) {
        self.snr = snr;
    }

    fn lock(&self) -> MutexGuard<'_, [Tuning; 2]> {
        self.tunings.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn my_tuning(&self) -> Tuning {
        self.lock()[self.slot]
    }

    fn peer_tuning(&self) -> Tuning {
        self.lock()[1 - self.slot]
    }
}

impl RadioTransport for MemoryRadio {
    fn init(&mut self) -> bool {
        true
    }

    fn set_spreading_factor(&mut self, chips: u8) {
        self.lock()[self.slot].chips = chips;
    }

    fn set_signal_bandwidth(&mut self, hz: u32) {
        self.lock()[self.slot].bandwidth_hz = hz;
    }

    fn set_frequency(&mut self, mhz: f32) -> bool {
        self.lock()[self.slot].deci_mhz = (mhz * 10.0).round() as u16;
        true
    }

    fn set_tx_power(&mut self, dbm: i8, _boost: bool) {
        self.lock()[self.slot].dbm = dbm;
    }

    fn wait_clear_channel(&mut self) {}

    fn last_snr(&self) -> i16 {
        self.snr
    }

    fn send_to_wait(&mut self, payload: &[u8], dest: u8) -> bool {
        let tuning = self.my_tuning();
        let lost = self.loss > 0.0 && self.rng.random_bool(self.loss);
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        if !lost {
            let _ = self.tx.send(AirFrame {
                source: self.address,
                dest,
                id,
                payload: payload.to_vec(),
                tuning,
            });
        }
        if dest == BROADCAST_ADDRESS {
            return true;
        }
        !lost && self.peer_tuning() == tuning
    }

    fn receive_timeout(&mut self, _timeout: Duration) -> Option<InboundMessage> {
        let tuning = self.my_tuning();
        while let Ok(frame) = self.rx.try_recv() {
            // A frame on different parameters never reaches this radio.
            if frame.tuning != tuning {
                continue;
            }
            if frame.dest != self.address && frame.dest != BROADCAST_ADDRESS {
                continue;
            }
            return Some(InboundMessage {
                source: frame.source,
                dest: frame.dest,
                id: frame.id,
                flags: 0,
                payload: frame.payload,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuned(radio: &mut MemoryRadio) {
        radio.set_spreading_factor(7);
        radio.set_signal_bandwidth(500_000);
        assert!(radio.set_frequency(903.0));
        radio.set_tx_power(2, true);
    }

    #[test]
    fn matched_tunings_deliver_and_ack() {
        let (mut a, mut b) = MemoryRadio::pair(1, 2);
        tuned(&mut a);
        tuned(&mut b);

        assert!(a.send_to_wait(&[1, b'x'], 2));
        let message = b.receive_timeout(Duration::ZERO).unwrap();
        assert_eq!(message.source, 1);
        assert_eq!(message.payload, vec![1, b'x']);
    }

    #[test]
    fn mismatched_tunings_neither_deliver_nor_ack() {
        let (mut a, mut b) = MemoryRadio::pair(1, 2);
        tuned(&mut a);
        tuned(&mut b);
        b.set_spreading_factor(9);

        assert!(!a.send_to_wait(&[1, b'x'], 2));
        assert!(b.receive_timeout(Duration::ZERO).is_none());
    }

    #[test]
    fn broadcast_reports_acked_regardless_of_peer() {
        let (mut a, mut b) = MemoryRadio::pair(1, 2);
        tuned(&mut a);
        tuned(&mut b);
        b.set_spreading_factor(9);

        assert!(a.send_to_wait(&[7, 1], BROADCAST_ADDRESS));
        assert!(b.receive_timeout(Duration::ZERO).is_none());
    }

    #[test]
    fn seeded_loss_eventually_drops_a_send() {
        let (mut a, mut b) = MemoryRadio::pair_lossy(1, 2, 0.5, 42);
        tuned(&mut a);
        tuned(&mut b);

        let dropped = (0..64).any(|_| !a.send_to_wait(&[1, b'x'], 2));
        assert!(dropped);
    }
}
