use std::time::Instant;

use chirplink_core::{
    constants::BROADCAST_ADDRESS,
    error::{ErrorKind, Result},
    Config, RadioTransport,
};
use chirplink_protocol::{
    framer::{LocalCommand, MessageFramer, SerialEvent},
    settings::{FrequencyChannel, RadioSettings, SignalBandwidth, SpreadingFactor, TxPower},
    timer::PollTimer,
    wire::{render_payload, Frame},
    PacketErrorEstimator,
};
use tracing::{debug, info, warn};

use crate::callbacks::LinkCallbacks;

/// Where one station stands in link adaptation, derived from the
/// outstanding negotiation rather than stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No link change outstanding.
    Idle,
    /// Initiator sent a request and is waiting for the response.
    AwaitingResponse,
    /// New settings are in effect but not yet proven by traffic.
    Provisional,
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy)]
struct Negotiation {
    peer: u8,
    role: Role,
    provisional: bool,
}

/// A reply deferred by `reply_delay`, so it does not collide with the
/// requester's own receive turnaround.
#[derive(Debug, Clone, Copy)]
enum PendingReply {
    LinkChange { dest: u8 },
    Heartbeat { dest: u8 },
}

/// One end of the point-to-point link.
///
/// Owns the radio transport and every piece of adaptation state: current
/// and previous settings (one level of rollback history), the packet error
/// estimator, the negotiation timers, the serial framer, and at most one
/// outstanding link-change negotiation. All methods are poll-driven; time
/// is passed in explicitly and nothing here reads the wall clock.
pub struct Station<T: RadioTransport> {
    address: u8,
    config: Config,
    transport: T,
    callbacks: Box<dyn LinkCallbacks>,
    framer: MessageFramer,
    current: RadioSettings,
    previous: RadioSettings,
    error_stats: PacketErrorEstimator,
    link_timer: PollTimer,
    heartbeat_timer: PollTimer,
    reply_timer: PollTimer,
    pending_reply: Option<PendingReply>,
    negotiation: Option<Negotiation>,
    error_free_run: u32,
    last_ack_snr: i16,
    last_heard: Option<Instant>,
}

impl<T: RadioTransport> Station<T> {
    /// Creates a station around a transport. `setup` must run before any
    /// service call.
    pub fn new(
        transport: T,
        address: u8,
        config: Config,
        callbacks: Box<dyn LinkCallbacks>,
        now: Instant,
    ) -> Self {
        let link_timer = PollTimer::new(config.link_change_timeout, now);
        let heartbeat_timer = PollTimer::repeating(config.heartbeat_interval, now);
        let reply_timer = PollTimer::new(config.reply_delay, now);
        let error_stats = PacketErrorEstimator::new(config.error_window);
        Self {
            address,
            config,
            transport,
            callbacks,
            framer: MessageFramer::new(),
            current: RadioSettings::default(),
            previous: RadioSettings::default(),
            error_stats,
            link_timer,
            heartbeat_timer,
            reply_timer,
            pending_reply: None,
            negotiation: None,
            error_free_run: 0,
            last_ack_snr: 0,
            last_heard: None,
        }
    }

    /// Brings up the transport and applies the power-on settings.
    pub fn setup(&mut self) -> Result<()> {
        if !self.transport.init() {
            return Err(ErrorKind::RadioInit);
        }
        self.apply_settings(RadioSettings::default())?;
        info!(address = self.address, "station up");
        Ok(())
    }

    // ===== Setters =====

    /// Selects a spreading factor.
    pub fn set_spreading_factor(&mut self, spreading_factor: SpreadingFactor) {
        self.transport.set_spreading_factor(spreading_factor.chips());
        let settings = RadioSettings {
            spreading_factor,
            ..self.current
        };
        self.commit_settings(settings);
    }

    /// Selects a signal bandwidth.
    pub fn set_bandwidth(&mut self, bandwidth: SignalBandwidth) {
        self.transport.set_signal_bandwidth(bandwidth.hz());
        let settings = RadioSettings {
            bandwidth,
            ..self.current
        };
        self.commit_settings(settings);
    }

    /// Tunes to a frequency channel. If the synthesizer refuses the
    /// center frequency the settings stay unchanged.
    pub fn set_frequency_channel(&mut self, channel: FrequencyChannel) -> Result<()> {
        if !self.transport.set_frequency(channel.mhz()) {
            return Err(ErrorKind::FrequencyRejected(channel.deci_mhz()));
        }
        let settings = RadioSettings {
            channel,
            ..self.current
        };
        self.commit_settings(settings);
        Ok(())
    }

    /// Selects a transmit power.
    pub fn set_tx_power(&mut self, tx_power: TxPower) {
        self.transport.set_tx_power(tx_power.dbm(), true);
        let settings = RadioSettings {
            tx_power,
            ..self.current
        };
        self.commit_settings(settings);
    }

    /// Pushes a whole settings tuple to the radio and commits it. The
    /// frequency goes first so a synthesizer rejection leaves both the
    /// radio and the stored settings untouched.
    pub fn apply_settings(&mut self, settings: RadioSettings) -> Result<()> {
        if !self.transport.set_frequency(settings.channel.mhz()) {
            return Err(ErrorKind::FrequencyRejected(settings.channel.deci_mhz()));
        }
        self.transport
            .set_spreading_factor(settings.spreading_factor.chips());
        self.transport.set_signal_bandwidth(settings.bandwidth.hz());
        self.transport.set_tx_power(settings.tx_power.dbm(), true);
        self.commit_settings(settings);
        Ok(())
    }

    /// Rolls back to the previous settings snapshot. Does not re-stash,
    /// so exactly one level of history exists: reverting twice lands on
    /// the same settings.
    fn revert_settings(&mut self) -> Result<()> {
        let snapshot = self.previous;
        if !self.transport.set_frequency(snapshot.channel.mhz()) {
            return Err(ErrorKind::FrequencyRejected(snapshot.channel.deci_mhz()));
        }
        self.transport
            .set_spreading_factor(snapshot.spreading_factor.chips());
        self.transport.set_signal_bandwidth(snapshot.bandwidth.hz());
        self.transport.set_tx_power(snapshot.tx_power.dbm(), true);
        self.error_stats.reset();
        self.current = snapshot;
        self.callbacks.link_change_indication(snapshot);
        info!(settings = ?snapshot, "reverted to previous radio settings");
        Ok(())
    }

    fn commit_settings(&mut self, settings: RadioSettings) {
        // Error history under the old parameters says nothing about the new.
        self.error_stats.reset();
        self.previous = self.current;
        self.current = settings;
        self.callbacks.link_change_indication(settings);
        debug!(settings = ?settings, "radio settings committed");
    }

    // ===== Link change negotiation =====

    /// Asks the peer at `dest` to move the link to `settings`. At most one
    /// negotiation may be outstanding. Returns whether the request was
    /// acknowledged; an unacknowledged request changes nothing locally.
    pub fn request_link_change(
        &mut self,
        dest: u8,
        settings: RadioSettings,
        now: Instant,
    ) -> Result<bool> {
        if self.negotiation.is_some() {
            return Err(ErrorKind::NegotiationInFlight);
        }
        let frame = Frame::LinkChangeRequest(settings).encode();
        let acked = self.acknowledged_send(&frame, dest);
        if !acked {
            warn!(dest, "link change request not acknowledged");
            return Ok(false);
        }
        self.apply_settings(settings)?;
        self.error_free_run = 0;
        self.negotiation = Some(Negotiation {
            peer: dest,
            role: Role::Initiator,
            provisional: false,
        });
        self.link_timer.set_timeout(self.config.link_change_timeout);
        self.link_timer.reset(now);
        self.link_timer.start();
        info!(dest, settings = ?settings, "link change requested");
        Ok(true)
    }

    /// Responder side: apply the requested settings immediately, then
    /// answer after `reply_delay` on the new link.
    fn handle_link_change_request(
        &mut self,
        from: u8,
        settings: RadioSettings,
        now: Instant,
    ) -> Result<()> {
        info!(from, settings = ?settings, "link change request received");
        self.apply_settings(settings)?;
        self.error_free_run = 0;
        self.negotiation = Some(Negotiation {
            peer: from,
            role: Role::Responder,
            provisional: true,
        });
        self.pending_reply = Some(PendingReply::LinkChange { dest: from });
        self.reply_timer.reset(now);
        self.reply_timer.start();
        Ok(())
    }

    /// Initiator side: the peer answered on the new link, so the change
    /// took. The pending timer stays armed but stretched to the trust
    /// window as a safety net until enough traffic proves the link.
    fn handle_link_change_response(&mut self, from: u8, settings: RadioSettings, now: Instant) {
        match self.negotiation {
            Some(negotiation) if matches!(negotiation.role, Role::Initiator) => {
                if settings != self.current {
                    warn!(
                        from,
                        theirs = ?settings,
                        ours = ?self.current,
                        "peer confirmed different settings than requested"
                    );
                }
                self.link_timer.set_timeout(self.config.trust_window());
                self.link_timer.reset(now);
                self.negotiation = Some(Negotiation {
                    provisional: true,
                    ..negotiation
                });
                info!(from, "link change confirmed, link provisional");
            }
            _ => debug!(from, "stale link change response ignored"),
        }
    }

    // ===== Heartbeats =====

    /// Starts broadcasting periodic heartbeat requests.
    pub fn start_heartbeats(&mut self, now: Instant) {
        self.heartbeat_timer.reset(now);
        self.heartbeat_timer.start();
    }

    /// Stops the heartbeat schedule.
    pub fn stop_heartbeats(&mut self) {
        self.heartbeat_timer.pause();
    }

    /// Whether the heartbeat schedule is armed.
    pub fn heartbeats_running(&self) -> bool {
        self.heartbeat_timer.is_running()
    }

    fn send_heartbeat(&mut self) {
        let frame = Frame::HeartbeatRequest {
            sender: self.address,
        }
        .encode();
        // Broadcast: never acknowledged, never counted as an error.
        self.acknowledged_send(&frame, BROADCAST_ADDRESS);
        debug!(address = self.address, "heartbeat broadcast");
    }

    fn handle_heartbeat_request(&mut self, from: u8, now: Instant) {
        debug!(from, "heartbeat request");
        if self.pending_reply.is_none() {
            self.pending_reply = Some(PendingReply::Heartbeat { dest: from });
            self.reply_timer.reset(now);
            self.reply_timer.start();
        } else {
            debug!(from, "reply slot busy, heartbeat request dropped");
        }
    }

    // ===== Service loop =====

    /// Sends the framer's completed buffer to `dest`, if any. Returns
    /// whether the frame was acknowledged; an empty buffer is a no-op.
    pub fn service_tx(&mut self, dest: u8) -> bool {
        if self.framer.pending_len() == 0 {
            return false;
        }
        let frame = self.framer.take_frame();
        let acked = self.acknowledged_send(&frame, dest);
        self.callbacks.tx_indication(&frame[1..], dest, acked);
        acked
    }

    /// Runs the timers, then polls the transport once and dispatches any
    /// inbound frame by its type tag.
    pub fn service_rx(&mut self, now: Instant) -> Result<()> {
        self.service_timers(now)?;
        let Some(message) = self.transport.receive_timeout(self.config.receive_wait) else {
            return Ok(());
        };
        self.last_heard = Some(now);
        self.callbacks.rx_indication(&message);
        let tag = message.payload.first().copied().unwrap_or_default();
        let Some(frame) = Frame::decode(&message.payload)? else {
            debug!(tag, from = message.source, "unknown message type ignored");
            return Ok(());
        };
        match frame {
            Frame::Data(payload) => {
                info!(
                    from = message.source,
                    payload = %render_payload(tag, &payload),
                    "data received"
                );
            }
            Frame::DataResponse(_) => {}
            Frame::LinkChangeRequest(settings) => {
                self.handle_link_change_request(message.source, settings, now)?;
            }
            Frame::LinkChangeResponse(settings) => {
                self.handle_link_change_response(message.source, settings, now);
            }
            Frame::HeartbeatRequest { .. } => self.handle_heartbeat_request(message.source, now),
            Frame::HeartbeatResponse { .. } => debug!(from = message.source, "heartbeat response"),
            Frame::Unhandled(message_type) => {
                debug!(?message_type, from = message.source, "no handler for message type");
            }
        }
        Ok(())
    }

    /// Advances every timer and fires whatever came due: negotiation
    /// rollback, deferred replies, heartbeat sends.
    pub fn service_timers(&mut self, now: Instant) -> Result<()> {
        self.link_timer.update(now);
        if self.link_timer.is_done() {
            self.link_timer.clear_done();
            warn!("link change window expired");
            self.negotiation = None;
            self.error_free_run = 0;
            self.revert_settings()?;
        }
        self.reply_timer.update(now);
        if self.reply_timer.is_done() {
            self.reply_timer.clear_done();
            self.flush_pending_reply(now)?;
        }
        self.heartbeat_timer.update(now);
        if self.heartbeat_timer.is_done() {
            self.heartbeat_timer.clear_done();
            self.send_heartbeat();
        }
        Ok(())
    }

    fn flush_pending_reply(&mut self, now: Instant) -> Result<()> {
        match self.pending_reply.take() {
            None => Ok(()),
            Some(PendingReply::LinkChange { dest }) => {
                let frame = Frame::LinkChangeResponse(self.current).encode();
                let acked = self.acknowledged_send(&frame, dest);
                if acked {
                    // The send itself may already have proven the link.
                    if self.negotiation.is_some() {
                        self.link_timer.set_timeout(self.config.trust_window());
                        self.link_timer.reset(now);
                        self.link_timer.start();
                    }
                } else {
                    warn!(dest, "link change response not acknowledged");
                    self.negotiation = None;
                    self.revert_settings()?;
                }
                Ok(())
            }
            Some(PendingReply::Heartbeat { dest }) => {
                let frame = Frame::HeartbeatResponse {
                    sender: self.address,
                }
                .encode();
                let acked = self.acknowledged_send(&frame, dest);
                debug!(dest, acked, "heartbeat response sent");
                Ok(())
            }
        }
    }

    // ===== Serial input =====

    /// Feeds serial bytes through the framer. Local commands are applied
    /// to the setters immediately; their errors surface here with the
    /// settings unchanged. Returns whether a data frame became ready.
    pub fn feed_serial(&mut self, bytes: &[u8]) -> Result<bool> {
        let mut frame_ready = false;
        for &byte in bytes {
            match self.framer.feed(byte)? {
                SerialEvent::Pending => {}
                SerialEvent::FrameReady => frame_ready = true,
                SerialEvent::Command(command) => self.apply_command(command)?,
            }
        }
        Ok(frame_ready)
    }

    /// Replaces the outbound buffer with `payload`, bypassing the serial
    /// accumulation path.
    pub fn set_message(&mut self, payload: &[u8]) {
        self.framer.set_message(payload);
    }

    fn apply_command(&mut self, command: LocalCommand) -> Result<()> {
        match command {
            LocalCommand::SetSpreadingFactor(index) => {
                self.set_spreading_factor(SpreadingFactor::try_from(index)?);
                Ok(())
            }
            LocalCommand::SetBandwidth(index) => {
                self.set_bandwidth(SignalBandwidth::try_from(index)?);
                Ok(())
            }
            LocalCommand::SetFrequencyChannel(index) => {
                self.set_frequency_channel(FrequencyChannel::try_from(index)?)
            }
            LocalCommand::SetTxPower(dbm) => {
                self.set_tx_power(TxPower::new(dbm)?);
                Ok(())
            }
        }
    }

    // ===== Internals =====

    /// Clear-channel wait, acknowledged send, SNR capture, and error
    /// accounting for non-broadcast destinations.
    fn acknowledged_send(&mut self, frame: &[u8], dest: u8) -> bool {
        self.transport.wait_clear_channel();
        let acked = self.transport.send_to_wait(frame, dest);
        if acked {
            self.last_ack_snr = self.transport.last_snr();
        }
        if dest != BROADCAST_ADDRESS {
            self.record_exchange(acked);
        }
        acked
    }

    /// Trust accounting: enough consecutive acknowledged exchanges on a
    /// provisional link disarm the safety timer.
    fn record_exchange(&mut self, success: bool) {
        self.error_stats.record_outcome(success);
        if success {
            self.error_free_run += 1;
        } else {
            self.error_free_run = 0;
        }
        if self.error_free_run >= self.config.successful_packets_before_trusted {
            if let Some(negotiation) = self.negotiation {
                if negotiation.provisional {
                    self.link_timer.pause();
                    self.negotiation = None;
                    info!(peer = negotiation.peer, "link trusted");
                }
            }
        }
    }

    // ===== Getters =====

    /// Station address on the shared medium.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Current spreading factor.
    pub fn spreading_factor(&self) -> SpreadingFactor {
        self.current.spreading_factor
    }

    /// Current signal bandwidth.
    pub fn bandwidth(&self) -> SignalBandwidth {
        self.current.bandwidth
    }

    /// Current frequency channel.
    pub fn frequency_channel(&self) -> FrequencyChannel {
        self.current.channel
    }

    /// Current transmit power.
    pub fn tx_power(&self) -> TxPower {
        self.current.tx_power
    }

    /// The full settings tuple currently in effect.
    pub fn settings(&self) -> RadioSettings {
        self.current
    }

    /// Moving-average packet error fraction under the current settings.
    pub fn error_fraction(&self) -> f32 {
        self.error_stats.error_fraction()
    }

    /// SNR reported with the most recent acknowledgement, in dB.
    pub fn last_ack_snr(&self) -> i16 {
        self.last_ack_snr
    }

    /// When this station last heard anything from the medium.
    pub fn last_heard(&self) -> Option<Instant> {
        self.last_heard
    }

    /// Link adaptation state, derived from the outstanding negotiation.
    pub fn link_state(&self) -> LinkState {
        match self.negotiation {
            None => LinkState::Idle,
            Some(negotiation) if negotiation.provisional => LinkState::Provisional,
            Some(_) => LinkState::AwaitingResponse,
        }
    }
}
