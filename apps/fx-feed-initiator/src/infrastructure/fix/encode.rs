//! FIX Message Values and Framing
//!
//! An order-preserving message value, constructors for the message kinds
//! this client emits, byte encoding with body length and checksum, and
//! extraction of complete inbound frames from a read buffer.
//!
//! Fields are an ordered list of `(tag, value)` pairs rather than a map
//! because market data requests legitimately repeat tags: one
//! `Symbol`/`MDEntrySize` pair per size band inside the `NoRelatedSym`
//! group.

use chrono::{DateTime, Utc};
use memchr::memchr;
use thiserror::Error;

use crate::domain::subscription::SubscriptionRequest;

use super::{msg_type, tag};

/// Field delimiter (SOH).
pub const DELIMITER: u8 = b'\x01';

const MIN_FRAME_SIZE: usize = 10; // "8=FIX" + "10=xxx|"
const MAX_FRAME_SIZE: usize = 8192;
const CHECKSUM_LEN: usize = 7; // "10=xxx|"
const CHECKSUM_TAG: &[u8] = b"10=";
const START_PATTERN: &[u8] = b"8=FIX";
const START_CHAR: u8 = b'8';

// =============================================================================
// Message Value
// =============================================================================

/// Failures parsing an inbound frame into a message value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The frame is not valid UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,
    /// A field is not `tag=value` with a numeric tag.
    #[error("malformed field: {0}")]
    MalformedField(String),
    /// The frame carries no MsgType.
    #[error("frame has no MsgType")]
    MissingMsgType,
}

/// A FIX message as an ordered field list, without session header fields.
///
/// The message type is held apart from the body; BeginString, BodyLength,
/// sequence number, comp ids, SendingTime, and CheckSum are stamped by
/// [`to_bytes`](Self::to_bytes) at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixMessage {
    msg_type: String,
    fields: Vec<(u32, String)>,
}

impl FixMessage {
    /// Create an empty message of the given type.
    #[must_use]
    pub fn new(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            fields: Vec::new(),
        }
    }

    /// The message type.
    #[must_use]
    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    /// Append a field. Repeated tags are kept in order.
    pub fn add_field(&mut self, field_tag: u32, value: impl Into<String>) -> &mut Self {
        self.fields.push((field_tag, value.into()));
        self
    }

    /// The first value of a tag, if present.
    #[must_use]
    pub fn get_field(&self, field_tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| *t == field_tag)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a tag, in order.
    pub fn field_values(&self, field_tag: u32) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(move |(t, _)| *t == field_tag)
            .map(|(_, v)| v.as_str())
    }

    /// All body fields, in order.
    #[must_use]
    pub fn fields(&self) -> &[(u32, String)] {
        &self.fields
    }

    /// Encode the message with a full session header and trailer.
    #[must_use]
    pub fn to_bytes(
        &self,
        begin_string: &str,
        seq_num: u64,
        sender_comp_id: &str,
        target_comp_id: &str,
        sending_time: &DateTime<Utc>,
    ) -> Vec<u8> {
        let mut body = Vec::new();
        push_field(&mut body, tag::MSG_TYPE, &self.msg_type);
        push_field(&mut body, tag::SENDER_COMP_ID, sender_comp_id);
        push_field(&mut body, tag::TARGET_COMP_ID, target_comp_id);
        push_field(&mut body, tag::MSG_SEQ_NUM, &seq_num.to_string());
        push_field(
            &mut body,
            tag::SENDING_TIME,
            &sending_time.format("%Y%m%d-%H:%M:%S%.6f").to_string(),
        );
        for (field_tag, value) in &self.fields {
            push_field(&mut body, *field_tag, value);
        }

        let mut buffer = Vec::with_capacity(body.len() + 32);
        push_field(&mut buffer, tag::BEGIN_STRING, begin_string);
        push_field(&mut buffer, tag::BODY_LENGTH, &body.len().to_string());
        buffer.extend_from_slice(&body);

        let checksum: u32 = buffer.iter().map(|&b| u32::from(b)).sum::<u32>() % 256;
        buffer.extend_from_slice(format!("{}={checksum:03}", tag::CHECKSUM).as_bytes());
        buffer.push(DELIMITER);

        buffer
    }

    /// Parse an inbound frame.
    ///
    /// BeginString, BodyLength, and CheckSum are dropped; the framing
    /// layer has already validated the frame shape.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on non-UTF-8 content, malformed fields, or
    /// a missing MsgType.
    pub fn parse(frame: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(frame).map_err(|_| ParseError::InvalidUtf8)?;

        let mut msg_type = None;
        let mut fields = Vec::new();

        for field in text.split(char::from(DELIMITER)).filter(|f| !f.is_empty()) {
            let (raw_tag, value) = field
                .split_once('=')
                .ok_or_else(|| ParseError::MalformedField(field.to_string()))?;
            let field_tag: u32 = raw_tag
                .parse()
                .map_err(|_| ParseError::MalformedField(field.to_string()))?;

            match field_tag {
                tag::BEGIN_STRING | tag::BODY_LENGTH | tag::CHECKSUM => {}
                tag::MSG_TYPE => msg_type = Some(value.to_string()),
                _ => fields.push((field_tag, value.to_string())),
            }
        }

        Ok(Self {
            msg_type: msg_type.ok_or(ParseError::MissingMsgType)?,
            fields,
        })
    }
}

fn push_field(buf: &mut Vec<u8>, field_tag: u32, value: &str) {
    buf.extend_from_slice(format!("{field_tag}={value}").as_bytes());
    buf.push(DELIMITER);
}

// =============================================================================
// Message Constructors
// =============================================================================

/// Build a market data request from a subscription request value.
///
/// Emits one `Symbol`/`MDEntrySize` pair per size band under
/// `NoRelatedSym`, the instrument repeated in every entry.
#[must_use]
pub fn market_data_request(request: &SubscriptionRequest) -> FixMessage {
    let mut msg = FixMessage::new(msg_type::MARKET_DATA_REQUEST);
    msg.add_field(tag::MD_REQ_ID, &request.request_id)
        .add_field(tag::SUBSCRIPTION_REQUEST_TYPE, request.mode.wire_code())
        .add_field(tag::SETTL_TYPE, request.settlement.wire_code())
        .add_field(tag::PARTY_ID, &request.party_id)
        .add_field(tag::ACCOUNT, "");
    if let Some(index) = request.dedup_index {
        msg.add_field(tag::APPL_SEQ_NUM, index.to_string());
    }
    msg.add_field(tag::NO_RELATED_SYM, request.size_bands.len().to_string());
    for (instrument, band) in request.entries() {
        msg.add_field(tag::SYMBOL, instrument.as_str())
            .add_field(tag::MD_ENTRY_SIZE, band.to_string());
    }
    msg
}

/// Build a logon message.
#[must_use]
pub fn logon(heartbeat_secs: u64, username: &str, password: &str) -> FixMessage {
    let mut msg = FixMessage::new(msg_type::LOGON);
    msg.add_field(tag::ENCRYPT_METHOD, "0")
        .add_field(tag::HEART_BT_INT, heartbeat_secs.to_string())
        .add_field(tag::RESET_SEQ_NUM_FLAG, "Y");
    if !username.is_empty() {
        msg.add_field(tag::USERNAME, username);
    }
    if !password.is_empty() {
        msg.add_field(tag::PASSWORD, password);
    }
    msg
}

/// Build a logout message with an optional reason.
#[must_use]
pub fn logout(reason: Option<&str>) -> FixMessage {
    let mut msg = FixMessage::new(msg_type::LOGOUT);
    if let Some(reason) = reason {
        msg.add_field(tag::TEXT, reason);
    }
    msg
}

/// Build a heartbeat, echoing a test request id when answering one.
#[must_use]
pub fn heartbeat(test_req_id: Option<&str>) -> FixMessage {
    let mut msg = FixMessage::new(msg_type::HEARTBEAT);
    if let Some(id) = test_req_id {
        msg.add_field(tag::TEST_REQ_ID, id);
    }
    msg
}

// =============================================================================
// Inbound Framing
// =============================================================================

/// Extract complete frames from a read buffer.
///
/// A frame starts at `8=FIX` and ends with `10=xxx` plus the delimiter.
/// Complete frames are removed from the buffer and returned in order;
/// garbage before a frame start is discarded, and an incomplete tail is
/// left for the next read. Oversized candidates are skipped to bound the
/// buffer.
#[must_use]
pub fn extract_frames(buf: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut processed_to = 0;

    while processed_to < buf.len() {
        if buf.len() - processed_to < MIN_FRAME_SIZE {
            break;
        }

        let Some(idx) = memchr(START_CHAR, &buf[processed_to..]).map(|i| processed_to + i) else {
            // No candidate start in the remainder; drop it.
            buf.clear();
            return frames;
        };

        if idx + START_PATTERN.len() <= buf.len()
            && &buf[idx..idx + START_PATTERN.len()] == START_PATTERN
        {
            if let Some(end_pos) = find_frame_end(&buf[idx..]) {
                let frame_end = idx + end_pos;
                if frame_end - idx > MAX_FRAME_SIZE {
                    processed_to = idx + 1;
                    continue;
                }
                frames.push(buf[idx..frame_end].to_vec());
                processed_to = frame_end;
            } else {
                // Incomplete frame; wait for more data.
                break;
            }
        } else {
            processed_to = idx + 1;
        }
    }

    if processed_to > 0 {
        buf.drain(0..processed_to);
    }

    frames
}

/// Locate the end of a frame: `10=xxx` followed by the delimiter.
fn find_frame_end(buf: &[u8]) -> Option<usize> {
    let mut idx = 0;
    while idx + CHECKSUM_LEN <= buf.len() {
        if buf[idx..].starts_with(CHECKSUM_TAG)
            && buf[idx + 3].is_ascii_digit()
            && buf[idx + 4].is_ascii_digit()
            && buf[idx + 5].is_ascii_digit()
            && buf[idx + 6] == DELIMITER
        {
            return Some(idx + CHECKSUM_LEN);
        }
        idx += 1;
    }
    None
}

// =============================================================================
// Tests
// =============================================================================
