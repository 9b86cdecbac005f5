use std::{default::Default, time::Duration};

#[derive(Clone, Debug)]
/// Configuration options to tune link timing and adaptation behavior.
pub struct Config {
    /// How long the initiator waits for a link-change response before
    /// reverting to the previous radio settings.
    pub link_change_timeout: Duration,
    /// Interval between heartbeat requests while heartbeats are running.
    pub heartbeat_interval: Duration,
    /// Delay before answering a heartbeat or link-change request, so the
    /// reply does not collide with the requester's own receive window.
    pub reply_delay: Duration,
    /// Upper bound on a single blocking receive poll.
    pub receive_wait: Duration,
    /// Number of consecutive acknowledged exchanges after which a freshly
    /// negotiated link is considered durable and its safety timer disarmed.
    pub successful_packets_before_trusted: u32,
    /// Window size of the packet error moving average.
    pub error_window: u32,
}

impl Config {
    /// Returns the trust window armed on a provisional link: long enough
    /// for `successful_packets_before_trusted` heartbeat rounds plus one
    /// ordinary link-change timeout.
    pub fn trust_window(&self) -> Duration {
        self.heartbeat_interval * self.successful_packets_before_trusted
            + self.link_change_timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            link_change_timeout: Duration::from_millis(3000),
            heartbeat_interval: Duration::from_secs(10),
            reply_delay: Duration::from_millis(100),
            receive_wait: Duration::from_millis(200),
            successful_packets_before_trusted: 5,
            error_window: crate::constants::PACKET_ERROR_WINDOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_window_covers_heartbeat_rounds_and_timeout() {
        let config = Config::default();
        assert_eq!(
            config.trust_window(),
            config.heartbeat_interval * 5 + Duration::from_millis(3000)
        );
    }
}
