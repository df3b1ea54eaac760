//! Rendering projection for the CLI view.
//!
//! Resolves display sender/content/time uniformly for server-delivered and
//! locally synthesized messages; the permissive fallback chain has already
//! been applied at decode time.

use crate::policy::Controls;
use crate::session::Severity;
use crate::time::format_local_time;
use crate::types::{AgentRef, DiscussionStatus, Message, MessageKind};

/// Fallback label for chatrooms without a topic
pub const NO_TOPIC_FALLBACK: &str = "(no topic)";

/// Message formatter for the terminal view
pub struct MessageFormatter;

impl MessageFormatter {
    /// Resolve the display topic, falling back for empty or blank values
    pub fn display_topic(topic: &str) -> &str {
        let trimmed = topic.trim();
        if trimmed.is_empty() { NO_TOPIC_FALLBACK } else { trimmed }
    }

    /// Format the chatroom header shown when a view opens
    pub fn format_room_header(
        topic: &str,
        status: &DiscussionStatus,
        participants: &[AgentRef],
    ) -> String {
        let mut output = String::new();
        output.push_str("\n============================================================\n");
        output.push_str(&format!("Topic: {}\n", Self::display_topic(topic)));
        output.push_str(&format!("Status: {}\n", status));
        output.push_str("Participants:\n");
        if participants.is_empty() {
            output.push_str("(no participants)\n");
        } else {
            for participant in participants {
                output.push_str(&format!("- {}\n", participant.display_label()));
            }
        }
        output.push_str("============================================================\n");
        output
    }

    /// Format one log message
    pub fn format_message(message: &Message) -> String {
        let marker = match message.kind {
            MessageKind::Agent => "@",
            MessageKind::User => ">",
            MessageKind::System => "*",
        };
        format!(
            "\n{}{} [{}]\n{}\n",
            marker,
            message.sender,
            format_local_time(message.timestamp),
            message.content
        )
    }

    /// Format a status change together with the commands it enables
    pub fn format_status_change(status: &DiscussionStatus, controls: &Controls) -> String {
        let mut available = Vec::new();
        if controls.start_enabled {
            available.push("start");
        }
        if controls.continue_enabled {
            available.push("continue");
        }
        if controls.stop_enabled {
            available.push("stop");
        }
        format!("\n[status: {}] commands: {}\n", status, available.join(", "))
    }

    /// Format a transient notice
    pub fn format_notice(severity: Severity, text: &str) -> String {
        let prefix = match severity {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Warning => "warn",
            Severity::Error => "error",
        };
        format!("\n[{}] {}\n", prefix, text)
    }
}
