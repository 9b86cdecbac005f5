use std::fmt::Write as _;

use chirplink_core::{
    constants::{HEARTBEAT_FRAME_LEN, LINK_CHANGE_FRAME_LEN, MAX_FRAME_LEN},
    error::ErrorKind,
};

use crate::settings::RadioSettings;

/// One-byte message type tag, the first byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Placeholder tag; never transmitted deliberately.
    Undefined = 0,
    /// Application data delivery.
    DataRequest = 1,
    /// Reply to a data request. Placeholder in the baseline protocol.
    DataResponse = 2,
    /// Request that both stations adopt new radio settings.
    LinkChangeRequest = 3,
    /// Settings actually in effect on the responder, sent on the new link.
    LinkChangeResponse = 4,
    /// Over-the-air wake. Recognized but not handled.
    WakeRequest = 5,
    /// Over-the-air sleep. Recognized but not handled.
    SleepRequest = 6,
    /// Periodic liveness probe.
    HeartbeatRequest = 7,
    /// Answer to a liveness probe.
    HeartbeatResponse = 8,
}

impl MessageType {
    /// Maps a wire tag back to a message type. Unknown tags yield `None`
    /// and are ignored by the dispatcher.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(MessageType::Undefined),
            1 => Some(MessageType::DataRequest),
            2 => Some(MessageType::DataResponse),
            3 => Some(MessageType::LinkChangeRequest),
            4 => Some(MessageType::LinkChangeResponse),
            5 => Some(MessageType::WakeRequest),
            6 => Some(MessageType::SleepRequest),
            7 => Some(MessageType::HeartbeatRequest),
            8 => Some(MessageType::HeartbeatResponse),
            _ => None,
        }
    }

    /// Returns the wire tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Whether this type's payload is human-readable text. Drives the
    /// ASCII-vs-hex choice when rendering frames for diagnostics.
    pub fn renders_as_text(self) -> bool {
        matches!(self, MessageType::DataRequest | MessageType::DataResponse)
    }
}

/// A decoded wire frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Application payload bytes (without the leading tag).
    Data(Vec<u8>),
    /// Reply to a data request; carries no semantics in the baseline.
    DataResponse(Vec<u8>),
    /// Requested radio settings.
    LinkChangeRequest(RadioSettings),
    /// Settings actually in effect on the responder.
    LinkChangeResponse(RadioSettings),
    /// Liveness probe from `sender`.
    HeartbeatRequest {
        /// Address of the probing station.
        sender: u8,
    },
    /// Liveness answer from `sender`.
    HeartbeatResponse {
        /// Address of the answering station.
        sender: u8,
    },
    /// Recognized tag with no handler (undefined, wake, sleep).
    Unhandled(MessageType),
}

impl Frame {
    /// Encodes the frame into tag + payload bytes, bounded by the
    /// transport's maximum frame length.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::Data(payload) => {
                let mut buf = Vec::with_capacity(payload.len() + 1);
                buf.push(MessageType::DataRequest.tag());
                buf.extend_from_slice(&payload[..payload.len().min(MAX_FRAME_LEN - 1)]);
                buf
            }
            Frame::DataResponse(payload) => {
                let mut buf = Vec::with_capacity(payload.len() + 1);
                buf.push(MessageType::DataResponse.tag());
                buf.extend_from_slice(&payload[..payload.len().min(MAX_FRAME_LEN - 1)]);
                buf
            }
            Frame::LinkChangeRequest(settings) => {
                encode_settings(MessageType::LinkChangeRequest, settings)
            }
            Frame::LinkChangeResponse(settings) => {
                encode_settings(MessageType::LinkChangeResponse, settings)
            }
            Frame::HeartbeatRequest { sender } => {
                vec![MessageType::HeartbeatRequest.tag(), *sender]
            }
            Frame::HeartbeatResponse { sender } => {
                vec![MessageType::HeartbeatResponse.tag(), *sender]
            }
            Frame::Unhandled(message_type) => vec![message_type.tag()],
        }
    }

    /// Decodes a raw frame. Returns `None` for unknown tags (the
    /// dispatcher ignores them); typed errors for recognized-but-malformed
    /// frames.
    pub fn decode(raw: &[u8]) -> Result<Option<Self>, ErrorKind> {
        let (&tag, payload) = raw.split_first().ok_or(ErrorKind::EmptyFrame)?;
        let Some(message_type) = MessageType::from_tag(tag) else {
            return Ok(None);
        };
        let frame = match message_type {
            MessageType::DataRequest => Frame::Data(payload.to_vec()),
            MessageType::DataResponse => Frame::DataResponse(payload.to_vec()),
            MessageType::LinkChangeRequest => {
                Frame::LinkChangeRequest(decode_settings(tag, payload)?)
            }
            MessageType::LinkChangeResponse => {
                Frame::LinkChangeResponse(decode_settings(tag, payload)?)
            }
            MessageType::HeartbeatRequest => Frame::HeartbeatRequest {
                sender: heartbeat_sender(tag, payload)?,
            },
            MessageType::HeartbeatResponse => Frame::HeartbeatResponse {
                sender: heartbeat_sender(tag, payload)?,
            },
            MessageType::Undefined | MessageType::WakeRequest | MessageType::SleepRequest => {
                Frame::Unhandled(message_type)
            }
        };
        Ok(Some(frame))
    }
}

fn encode_settings(message_type: MessageType, settings: &RadioSettings) -> Vec<u8> {
    vec![
        message_type.tag(),
        settings.spreading_factor.index(),
        settings.bandwidth.index(),
        settings.channel.index(),
        settings.tx_power.dbm() as u8,
    ]
}

fn decode_settings(tag: u8, payload: &[u8]) -> Result<RadioSettings, ErrorKind> {
    if payload.len() < LINK_CHANGE_FRAME_LEN - 1 {
        return Err(ErrorKind::TruncatedFrame(tag));
    }
    RadioSettings::from_indices(payload[0], payload[1], payload[2], payload[3] as i8)
}

fn heartbeat_sender(tag: u8, payload: &[u8]) -> Result<u8, ErrorKind> {
    if payload.len() < HEARTBEAT_FRAME_LEN - 1 {
        return Err(ErrorKind::TruncatedFrame(tag));
    }
    Ok(payload[0])
}

/// Renders a frame payload for diagnostics: ASCII for data frames, hex
/// for everything else.
pub fn render_payload(tag: u8, payload: &[u8]) -> String {
    let as_text = MessageType::from_tag(tag).is_some_and(MessageType::renders_as_text);
    if as_text {
        payload.iter().map(|&b| char::from(b)).collect()
    } else {
        let mut out = String::with_capacity(2 + payload.len() * 2);
        out.push_str("0x");
        for byte in payload {
            let _ = write!(out, "{byte:02X}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_settings() -> RadioSettings {
        RadioSettings::from_indices(2, 2, 3, 10).unwrap()
    }

    #[test]
    fn link_change_request_is_five_bytes() {
        let encoded = Frame::LinkChangeRequest(sample_settings()).encode();
        assert_eq!(encoded, vec![3, 2, 2, 3, 10]);
        assert_eq!(encoded.len(), LINK_CHANGE_FRAME_LEN);
    }

    #[test]
    fn link_change_round_trip() {
        let frame = Frame::LinkChangeResponse(sample_settings());
        let decoded = Frame::decode(&frame.encode()).unwrap().unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn heartbeat_frames_carry_the_sender() {
        let encoded = Frame::HeartbeatRequest { sender: 7 }.encode();
        assert_eq!(encoded, vec![7, 7]);
        match Frame::decode(&encoded).unwrap().unwrap() {
            Frame::HeartbeatRequest { sender } => assert_eq!(sender, 7),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn data_frame_keeps_payload_after_tag() {
        let decoded = Frame::decode(&[1, b'h', b'i']).unwrap().unwrap();
        assert_eq!(decoded, Frame::Data(b"hi".to_vec()));
    }

    #[test]
    fn unknown_tags_are_ignored_not_errors() {
        assert_eq!(Frame::decode(&[42, 1, 2]).unwrap(), None);
    }

    #[test]
    fn truncated_link_change_is_rejected() {
        assert_eq!(
            Frame::decode(&[3, 2, 2]),
            Err(ErrorKind::TruncatedFrame(3))
        );
    }

    #[test]
    fn out_of_table_settings_are_rejected_at_decode() {
        assert_eq!(
            Frame::decode(&[3, 9, 2, 3, 10]),
            Err(ErrorKind::InvalidSpreadingFactor(9))
        );
    }

    #[test]
    fn empty_frame_is_an_error() {
        assert_eq!(Frame::decode(&[]), Err(ErrorKind::EmptyFrame));
    }

    #[test]
    fn wake_and_sleep_decode_as_unhandled() {
        assert_eq!(
            Frame::decode(&[5]).unwrap(),
            Some(Frame::Unhandled(MessageType::WakeRequest))
        );
        assert_eq!(
            Frame::decode(&[6]).unwrap(),
            Some(Frame::Unhandled(MessageType::SleepRequest))
        );
    }

    #[test]
    fn render_payload_picks_ascii_or_hex_by_tag() {
        assert_eq!(render_payload(1, b"abc"), "abc");
        assert_eq!(render_payload(3, &[2, 2, 3, 10]), "0x0202030A");
        assert_eq!(render_payload(7, &[15]), "0x0F");
    }
}
