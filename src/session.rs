//! Realtime discussion session management.
//!
//! `SessionManager` owns at most one active chatroom session, its socket,
//! and the directory client used for activation calls. All inbound frame
//! handling and command issuance run sequentially through it, so ordering
//! within one session is exactly socket-delivery order and no locking is
//! needed.
//!
//! Status reconciliation is last-write-wins: the client never computes a
//! status locally from transitions, it adopts whatever value the server
//! delivered most recently. There is no version or sequence number on the
//! wire, so a stale `status_update` delivered after a newer `room_info` will
//! regress the displayed status.

use crate::connection::{ConnectionManager, SocketEvent};
use crate::directory::Directory;
use crate::error::ClientError;
use crate::log::MessageLog;
use crate::policy::{Controls, controls_for};
use crate::protocol::{Command, InboundFrame, SYSTEM_SENDER};
use crate::time::Clock;
use crate::types::{AgentRef, ChatroomRecord, DiscussionStatus, Message, MessageKind};

/// Synthetic system message appended once per transition into `completed`
const COMPLETED_TEXT: &str =
    "Discussion concluded: this round has come to a close. Thanks to every participant for their contributions.";

/// Synthetic system message appended by the stop intent
const STOPPED_TEXT: &str = "Discussion ended: this discussion has been closed.";

/// Synthetic system message appended by the continue intent
const CONTINUE_TEXT: &str =
    "Continuing the discussion: participants will build on the exchange so far.";

/// Severity of a transient user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Notification to the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The status changed; carries the recomputed control policy
    StatusChanged {
        status: DiscussionStatus,
        controls: Controls,
    },
    /// One message was appended to the log
    MessageAppended(Message),
    /// The active session was closed or replaced
    SessionClosed,
    /// Transient toast-style notice
    Notice { severity: Severity, text: String },
}

/// One open chatroom view: topic, participants, adopted status, and the
/// ordered message log. Created when the view opens, destroyed only by view
/// teardown or replacement; no status value is terminal for the session
/// itself.
pub struct DiscussionSession {
    pub chatroom_id: String,
    pub topic: String,
    pub status: DiscussionStatus,
    pub participants: Vec<AgentRef>,
    pub log: MessageLog,
}

impl DiscussionSession {
    fn from_record(record: ChatroomRecord) -> Self {
        let mut log = MessageLog::new();
        for message in record.messages {
            log.append(message);
        }
        Self {
            chatroom_id: record.id,
            topic: record.topic,
            status: record.status,
            participants: record.participants,
            log,
        }
    }
}

/// Owns the active session and the single live connection of this client
pub struct SessionManager<D: Directory> {
    directory: D,
    connection: ConnectionManager,
    session: Option<DiscussionSession>,
    clock: Box<dyn Clock>,
}

impl<D: Directory> SessionManager<D> {
    pub fn new(directory: D, clock: Box<dyn Clock>) -> Self {
        Self {
            directory,
            connection: ConnectionManager::new(),
            session: None,
            clock,
        }
    }

    pub fn with_system_clock(directory: D) -> Self {
        Self::new(directory, Box::new(crate::time::SystemClock))
    }

    pub fn session(&self) -> Option<&DiscussionSession> {
        self.session.as_ref()
    }

    /// Open a chatroom view. Any previously open session and its connection
    /// are replaced; the new session is seeded from the directory record and
    /// bound to a fresh socket.
    pub async fn open_chatroom(&mut self, chatroom_id: &str) -> Result<Vec<UiEvent>, ClientError> {
        let record = self.directory.fetch_chatroom(chatroom_id).await?;

        let mut events = Vec::new();
        if self.session.take().is_some() {
            self.connection.close();
            events.push(UiEvent::SessionClosed);
        }

        let session = DiscussionSession::from_record(record);
        events.push(UiEvent::StatusChanged {
            status: session.status.clone(),
            controls: controls_for(&session.status),
        });
        for message in session.log.iter() {
            events.push(UiEvent::MessageAppended(message.clone()));
        }

        let ws_url = self.directory.ws_url(chatroom_id);
        self.connection.open(&ws_url);
        self.session = Some(session);
        Ok(events)
    }

    /// Await the next socket event, if a connection exists
    pub async fn next_socket_event(&mut self) -> Option<SocketEvent> {
        self.connection.next_event().await
    }

    /// Apply one socket event to the active session
    pub fn handle_socket_event(&mut self, event: SocketEvent) -> Vec<UiEvent> {
        match event {
            SocketEvent::Opened => {
                tracing::info!("discussion socket is open");
                Vec::new()
            }
            SocketEvent::Frame(frame) => self.apply_frame(frame),
            SocketEvent::Closed => vec![notice(
                Severity::Warning,
                "Connection closed. Reopen the chatroom to reconnect.",
            )],
            SocketEvent::Error(message) => {
                tracing::warn!("socket error: {}", message);
                vec![notice(
                    Severity::Error,
                    format!("Connection error: {}", message),
                )]
            }
        }
    }

    /// Start the discussion: HTTP activation first, then the socket command.
    /// On HTTP failure the status is left unchanged and an error notice is
    /// surfaced; there is no optimistic transition.
    pub async fn start(&mut self, seed: Option<String>) -> Result<Vec<UiEvent>, ClientError> {
        let chatroom_id = self.active_id()?;
        match self.directory.start_discussion(&chatroom_id).await {
            Ok(response) => {
                let mut events = self.adopt_response_status(response.status);
                match self.connection.send(&Command::Start { seed }) {
                    Ok(()) => events.push(notice(Severity::Success, "Discussion started.")),
                    Err(ClientError::ConnectionNotReady) => {
                        tracing::debug!("socket not open; start command not sent");
                    }
                    Err(e) => events.push(notice(
                        Severity::Error,
                        format!("Failed to send start command: {}", e),
                    )),
                }
                Ok(events)
            }
            Err(e) => {
                tracing::warn!("start activation failed: {}", e);
                Ok(vec![notice(
                    Severity::Error,
                    format!("Failed to start the discussion: {}", e),
                )])
            }
        }
    }

    /// Continue the discussion: the same two-phase pattern as `start`,
    /// reusing the activation endpoint, followed by the socket `continue`
    /// command with its fixed guidance text.
    pub async fn continue_discussion(&mut self) -> Result<Vec<UiEvent>, ClientError> {
        let chatroom_id = self.active_id()?;
        match self.directory.start_discussion(&chatroom_id).await {
            Ok(response) => {
                let mut events = self.adopt_response_status(response.status);
                match self.connection.send(&Command::Continue) {
                    Ok(()) => {
                        events.extend(self.append_system_message(CONTINUE_TEXT));
                        events.push(notice(Severity::Success, "Discussion continuing."));
                    }
                    Err(ClientError::ConnectionNotReady) => {
                        tracing::debug!("socket not open; continue command not sent");
                    }
                    Err(e) => events.push(notice(
                        Severity::Error,
                        format!("Failed to send continue command: {}", e),
                    )),
                }
                Ok(events)
            }
            Err(e) => {
                tracing::warn!("continue activation failed: {}", e);
                Ok(vec![notice(
                    Severity::Error,
                    format!("Failed to continue the discussion: {}", e),
                )])
            }
        }
    }

    /// End the discussion. When the HTTP stop call fails, fall back to a
    /// direct socket `stop`: force the local status to `stopped` and still
    /// append the synthetic end message. Only when the socket is also
    /// unavailable does the user see a hard failure; no error propagates
    /// from the fallback path.
    pub async fn stop(&mut self) -> Result<Vec<UiEvent>, ClientError> {
        let chatroom_id = self.active_id()?;
        match self.directory.stop_discussion(&chatroom_id).await {
            Ok(response) => {
                let mut events = self.adopt_response_status(response.status);
                if let Err(e) = self.connection.send(&Command::Stop)
                    && !matches!(e, ClientError::ConnectionNotReady)
                {
                    tracing::warn!("failed to send stop command: {}", e);
                }
                events.extend(self.append_system_message(STOPPED_TEXT));
                events.push(notice(Severity::Success, "Discussion ended."));
                Ok(events)
            }
            Err(e) => {
                tracing::warn!("stop activation failed, falling back to the socket: {}", e);
                match self.connection.send(&Command::Stop) {
                    Ok(()) => {
                        let mut events = self.adopt_status(DiscussionStatus::Stopped);
                        events.extend(self.append_system_message(STOPPED_TEXT));
                        events.push(notice(Severity::Success, "Discussion ended."));
                        Ok(events)
                    }
                    Err(_) => Ok(vec![notice(
                        Severity::Error,
                        format!("Failed to end the discussion: {}", e),
                    )]),
                }
            }
        }
    }

    /// Tear down the active session and its connection
    pub fn close(&mut self) -> Vec<UiEvent> {
        self.connection.close();
        if self.session.take().is_some() {
            vec![UiEvent::SessionClosed]
        } else {
            Vec::new()
        }
    }

    fn apply_frame(&mut self, frame: InboundFrame) -> Vec<UiEvent> {
        if self.session.is_none() {
            return Vec::new();
        }
        match frame {
            InboundFrame::StatusUpdate { status } => self.adopt_status(status),
            InboundFrame::RoomInfo(snapshot) => {
                if let Some(session) = self.session.as_mut() {
                    session.topic = snapshot.topic;
                    session.participants = snapshot.participants;
                }
                self.adopt_status(snapshot.status)
            }
            InboundFrame::Message(message) => {
                if let Some(session) = self.session.as_mut() {
                    session.log.append(message.clone());
                }
                vec![UiEvent::MessageAppended(message)]
            }
        }
    }

    /// Adopt a server-delivered status value. Emits nothing when the value
    /// is unchanged; a transition into `completed` additionally appends the
    /// synthetic conclusion message, exactly once per transition.
    fn adopt_status(&mut self, status: DiscussionStatus) -> Vec<UiEvent> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.status == status {
            return Vec::new();
        }

        session.status = status.clone();
        let mut events = vec![UiEvent::StatusChanged {
            controls: controls_for(&status),
            status: status.clone(),
        }];

        if status == DiscussionStatus::Completed {
            let message = system_message(COMPLETED_TEXT, self.clock.now());
            session.log.append(message.clone());
            events.push(UiEvent::MessageAppended(message));
            events.push(notice(Severity::Success, "The discussion has concluded."));
        }
        events
    }

    fn adopt_response_status(&mut self, status: Option<DiscussionStatus>) -> Vec<UiEvent> {
        match status {
            Some(status) => self.adopt_status(status),
            None => Vec::new(),
        }
    }

    fn append_system_message(&mut self, text: &str) -> Vec<UiEvent> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let message = system_message(text, self.clock.now());
        session.log.append(message.clone());
        vec![UiEvent::MessageAppended(message)]
    }

    fn active_id(&self) -> Result<String, ClientError> {
        self.session
            .as_ref()
            .map(|session| session.chatroom_id.clone())
            .ok_or(ClientError::NoActiveSession)
    }

    #[cfg(test)]
    pub(crate) fn connection_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connection
    }
}

fn system_message(text: &str, timestamp: chrono::DateTime<chrono::Utc>) -> Message {
    Message {
        kind: MessageKind::System,
        sender: SYSTEM_SENDER.to_string(),
        content: text.to_string(),
        timestamp,
    }
}

fn notice(severity: Severity, text: impl Into<String>) -> UiEvent {
    UiEvent::Notice {
        severity,
        text: text.into(),
    }
}
