//! Wire codec for the discussion socket.
//!
//! Outbound commands and inbound frames are small tagged JSON objects,
//! discriminated by a `type` field. Decoding is deliberately permissive: any
//! payload that is not a recognized control frame degrades to a message frame
//! with best-effort field extraction, so a malformed payload can never fail
//! the connection.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::time::parse_rfc3339;
use crate::types::{AgentRef, DiscussionStatus, Message, MessageKind, RoomSnapshot};

/// Default display name for messages that carry no sender field
pub const SYSTEM_SENDER: &str = "System";

/// Fixed guidance text attached to every `continue` command
pub const CONTINUE_GUIDANCE: &str =
    "Building on the discussion so far, please continue the exchange in more depth";

/// Outbound control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { seed: Option<String> },
    Continue,
    Stop,
}

/// Encode a command into its wire envelope. Pure and total.
pub fn encode_command(command: &Command) -> Value {
    match command {
        Command::Start { seed: None } => json!({ "type": "start" }),
        Command::Start { seed: Some(seed) } => json!({ "type": "start", "message": seed }),
        Command::Continue => json!({ "type": "continue", "message": CONTINUE_GUIDANCE }),
        Command::Stop => json!({ "type": "stop" }),
    }
}

/// One decoded inbound payload
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// The server replaced the discussion status
    StatusUpdate { status: DiscussionStatus },
    /// Full room snapshot, embedded as a `chat_room` object on the wire
    RoomInfo(RoomSnapshot),
    /// Anything else: a chat, user, or system message
    Message(Message),
}

/// Decode one inbound frame. Total: frames that do not match one of the two
/// control shapes fall back to the message variant, with `now` as the default
/// timestamp.
pub fn decode_frame(value: &Value, now: DateTime<Utc>) -> InboundFrame {
    let frame_type = value.get("type").and_then(Value::as_str);

    if frame_type == Some("status_update")
        && let Some(status) = value.get("status").and_then(Value::as_str)
    {
        return InboundFrame::StatusUpdate {
            status: DiscussionStatus::from_wire(status),
        };
    }

    if frame_type == Some("room_info")
        && let Some(room) = value.get("chat_room")
    {
        return InboundFrame::RoomInfo(decode_room_snapshot(room));
    }

    InboundFrame::Message(decode_message(value, now))
}

/// Decode a raw socket payload. Payloads that are not JSON at all degrade to
/// a system message carrying the raw text.
pub fn decode_text(text: &str, now: DateTime<Utc>) -> InboundFrame {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => decode_frame(&value, now),
        Err(_) => InboundFrame::Message(Message {
            kind: MessageKind::System,
            sender: SYSTEM_SENDER.to_string(),
            content: text.to_string(),
            timestamp: now,
        }),
    }
}

fn decode_room_snapshot(room: &Value) -> RoomSnapshot {
    RoomSnapshot {
        topic: room
            .get("topic")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        status: room
            .get("status")
            .and_then(Value::as_str)
            .map(DiscussionStatus::from_wire)
            .unwrap_or(DiscussionStatus::Pending),
        participants: decode_participants(room.get("agents")),
    }
}

/// Best-effort message extraction: sender from `sender` or `agent_name`,
/// content from `content` or `message`, RFC 3339 timestamp with `now` as the
/// default. Shared by the socket codec and the directory DTO conversion.
pub fn decode_message(value: &Value, now: DateTime<Utc>) -> Message {
    let sender = value
        .get("sender")
        .and_then(Value::as_str)
        .or_else(|| value.get("agent_name").and_then(Value::as_str))
        .unwrap_or(SYSTEM_SENDER)
        .to_string();
    let content = value
        .get("content")
        .and_then(Value::as_str)
        .or_else(|| value.get("message").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();
    let timestamp = value
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_rfc3339)
        .unwrap_or(now);
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .map(MessageKind::from_wire)
        .unwrap_or(MessageKind::System);

    Message {
        kind,
        sender,
        content,
        timestamp,
    }
}

/// Decode one participant entry: either an embedded agent object or a bare
/// id string.
pub fn decode_participant(value: &Value) -> AgentRef {
    match value {
        Value::String(id) => AgentRef {
            id: id.clone(),
            name: None,
            role: None,
        },
        _ => AgentRef {
            id: value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            name: value.get("name").and_then(Value::as_str).map(str::to_string),
            role: value.get("role").and_then(Value::as_str).map(str::to_string),
        },
    }
}

/// Decode a participant list, tolerating a missing or non-array value
pub fn decode_participants(value: Option<&Value>) -> Vec<AgentRef> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(decode_participant).collect())
        .unwrap_or_default()
}
