//! Domain types for chatrooms, participants, and messages.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Server-authoritative discussion lifecycle status.
///
/// The client never computes status transitions locally; it always adopts the
/// latest value delivered by the server, whether from an HTTP activation
/// response or a socket frame. Unrecognized values are carried in `Other` and
/// rendered as-is, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DiscussionStatus {
    Pending,
    Running,
    Stopped,
    Completed,
    Other(String),
}

impl DiscussionStatus {
    /// Map a wire string onto the status enum
    pub fn from_wire(value: &str) -> Self {
        match value {
            "pending" => DiscussionStatus::Pending,
            "running" => DiscussionStatus::Running,
            "stopped" => DiscussionStatus::Stopped,
            "completed" => DiscussionStatus::Completed,
            other => DiscussionStatus::Other(other.to_string()),
        }
    }

    /// The wire representation of this status
    pub fn as_wire(&self) -> &str {
        match self {
            DiscussionStatus::Pending => "pending",
            DiscussionStatus::Running => "running",
            DiscussionStatus::Stopped => "stopped",
            DiscussionStatus::Completed => "completed",
            DiscussionStatus::Other(value) => value,
        }
    }
}

impl From<String> for DiscussionStatus {
    fn from(value: String) -> Self {
        DiscussionStatus::from_wire(&value)
    }
}

impl std::fmt::Display for DiscussionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Kind of one discussion message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Agent,
    User,
    System,
}

impl MessageKind {
    /// Map a wire `type` string onto the message kind. Anything that is not
    /// an agent or user message counts as a system message.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "agent" => MessageKind::Agent,
            "user" => MessageKind::User,
            _ => MessageKind::System,
        }
    }
}

/// One entry of the discussion log. Locally synthesized system messages use
/// the same representation as server-delivered ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Reference to a participating agent. Participant lists on the wire carry
/// either embedded agent objects or bare id strings, so name and role may be
/// absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRef {
    pub id: String,
    pub name: Option<String>,
    pub role: Option<String>,
}

impl AgentRef {
    /// Display label for the participant list: "name (role)", falling back
    /// to the bare id when the record is not embedded.
    pub fn display_label(&self) -> String {
        match (&self.name, &self.role) {
            (Some(name), Some(role)) => format!("{} ({})", name, role),
            (Some(name), None) => name.clone(),
            _ => self.id.clone(),
        }
    }
}

/// The room snapshot embedded in a `room_info` frame
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub topic: String,
    pub status: DiscussionStatus,
    pub participants: Vec<AgentRef>,
}

/// The Directory Service's view of one chatroom, used to seed a session when
/// a view opens
#[derive(Debug, Clone)]
pub struct ChatroomRecord {
    pub id: String,
    pub topic: String,
    pub status: DiscussionStatus,
    pub participants: Vec<AgentRef>,
    pub messages: Vec<Message>,
}

/// One row of the chatroom listing
#[derive(Debug, Clone)]
pub struct ChatroomSummary {
    pub id: String,
    pub topic: String,
    pub status: DiscussionStatus,
    pub agent_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_wire_known_values() {
        // テスト項目: 既知のステータス文字列が対応する列挙値に変換される
        // given (前提条件):
        let values = ["pending", "running", "stopped", "completed"];

        // when (操作):
        let statuses: Vec<DiscussionStatus> =
            values.iter().map(|v| DiscussionStatus::from_wire(v)).collect();

        // then (期待する結果):
        assert_eq!(
            statuses,
            vec![
                DiscussionStatus::Pending,
                DiscussionStatus::Running,
                DiscussionStatus::Stopped,
                DiscussionStatus::Completed,
            ]
        );
    }

    #[test]
    fn test_status_from_wire_unknown_value_is_preserved() {
        // テスト項目: 未知のステータス文字列は Other としてそのまま保持される
        // given (前提条件):
        let value = "paused";

        // when (操作):
        let status = DiscussionStatus::from_wire(value);

        // then (期待する結果):
        assert_eq!(status, DiscussionStatus::Other("paused".to_string()));
        assert_eq!(status.to_string(), "paused");
    }

    #[test]
    fn test_status_display_round_trips_wire_value() {
        // テスト項目: Display 出力がワイヤ表現と一致する
        // given (前提条件):
        let status = DiscussionStatus::Running;

        // when (操作):
        let rendered = status.to_string();

        // then (期待する結果):
        assert_eq!(rendered, "running");
    }

    #[test]
    fn test_message_kind_from_wire_defaults_to_system() {
        // テスト項目: agent/user 以外のメッセージ種別は system になる
        // given (前提条件):
        let values = ["agent", "user", "system", "bogus", ""];

        // when (操作):
        let kinds: Vec<MessageKind> = values.iter().map(|v| MessageKind::from_wire(v)).collect();

        // then (期待する結果):
        assert_eq!(
            kinds,
            vec![
                MessageKind::Agent,
                MessageKind::User,
                MessageKind::System,
                MessageKind::System,
                MessageKind::System,
            ]
        );
    }

    #[test]
    fn test_agent_display_label_with_embedded_record() {
        // テスト項目: 名前とロールが埋め込まれた参加者は "name (role)" で表示される
        // given (前提条件):
        let agent = AgentRef {
            id: "a-1".to_string(),
            name: Some("Socrates".to_string()),
            role: Some("Philosopher".to_string()),
        };

        // when (操作):
        let label = agent.display_label();

        // then (期待する結果):
        assert_eq!(label, "Socrates (Philosopher)");
    }

    #[test]
    fn test_agent_display_label_falls_back_to_id() {
        // テスト項目: 名前のない参加者参照は id にフォールバックする
        // given (前提条件):
        let agent = AgentRef {
            id: "a-2".to_string(),
            name: None,
            role: Some("unused".to_string()),
        };

        // when (操作):
        let label = agent.display_label();

        // then (期待する結果):
        assert_eq!(label, "a-2");
    }
}
