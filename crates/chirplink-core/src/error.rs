use thiserror::Error;

/// Convenience alias for results produced by the link layer.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Errors that can occur within the link layer.
///
/// Invalid configuration inputs are always rejected with the settings left
/// unchanged; nothing in the link layer silently substitutes a default.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ErrorKind {
    /// A spreading factor index outside the SF7..SF12 table.
    #[error("invalid spreading factor index ({0})")]
    InvalidSpreadingFactor(u8),

    /// A signal bandwidth index outside the bandwidth table.
    #[error("invalid signal bandwidth index ({0})")]
    InvalidBandwidth(u8),

    /// A frequency channel index outside the 16-entry channel table.
    #[error("invalid frequency channel index ({0})")]
    InvalidFrequencyChannel(u8),

    /// A transmit power outside the [2, 20] dBm range.
    #[error("invalid tx power setting ({0} dBm)")]
    InvalidTxPower(i8),

    /// The radio refused to synthesize the requested center frequency.
    #[error("radio rejected frequency {0} deci-MHz")]
    FrequencyRejected(u16),

    /// A second link-change request while one is still outstanding.
    #[error("a link change negotiation is already in flight")]
    NegotiationInFlight,

    /// The radio hardware could not be brought up; there is no recovery.
    #[error("radio initialization failed")]
    RadioInit,

    /// An inbound frame was shorter than its message type requires.
    #[error("received frame too short for its message type (tag {0})")]
    TruncatedFrame(u8),

    /// An inbound frame carried no bytes at all.
    #[error("received frame was empty")]
    EmptyFrame,

    /// A serial command that does not follow `<opcode><1-2 digits>`.
    #[error("unparseable serial command")]
    InvalidCommand,
}
