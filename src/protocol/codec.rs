// ABOUTME: JSON codec for protocol messages
// ABOUTME: Decoding rejects partial or incoherent clock updates instead of defaulting

use crate::error::Error;
use crate::protocol::messages::{ClockSyncMessage, Message};

/// Serialize a message to its JSON text frame
pub fn encode(message: &Message) -> Result<String, Error> {
    serde_json::to_string(message).map_err(|e| Error::Protocol(e.to_string()))
}

/// Parse a JSON text frame
///
/// Missing fields, negative or fractional `remaining_ns`, and unknown message
/// types are reported as [`Error::MalformedMessage`]. A sync message with both
/// sides running is reported as [`Error::InvariantViolation`].
pub fn decode(text: &str) -> Result<Message, Error> {
    let message: Message =
        serde_json::from_str(text).map_err(|e| Error::MalformedMessage(e.to_string()))?;

    if let Message::Sync(sync) = &message {
        validate(sync)?;
    }

    Ok(message)
}

/// Parse a frame that must be a clock snapshot
pub fn decode_sync(text: &str) -> Result<ClockSyncMessage, Error> {
    match decode(text)? {
        Message::Sync(sync) => Ok(sync),
        other => Err(Error::MalformedMessage(format!(
            "expected clock/sync, got {}",
            kind(&other)
        ))),
    }
}

/// Check turn exclusivity on a decoded snapshot
pub fn validate(sync: &ClockSyncMessage) -> Result<(), Error> {
    if sync.first.running && sync.second.running {
        return Err(Error::InvariantViolation(format!(
            "both sides running in snapshot seq {}",
            sync.seq
        )));
    }
    Ok(())
}

fn kind(message: &Message) -> &'static str {
    match message {
        Message::Sync(_) => "clock/sync",
        Message::Expired(_) => "clock/expired",
        Message::Press(_) => "clock/press",
        Message::Pause(_) => "clock/pause",
        Message::Resume(_) => "clock/resume",
    }
}
