//! Discussion socket lifecycle management.
//!
//! At most one live connection exists per client process. Opening a
//! connection for any chatroom unconditionally closes the prior one first,
//! so stale frames from an abandoned chatroom can never reach a new session.
//! There is no reconnection logic anywhere: reopening is always an explicit
//! caller action.

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};

use crate::error::ClientError;
use crate::protocol::{Command, InboundFrame, decode_text, encode_command};

/// Lifecycle state of one socket handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// One inbound event from the socket I/O task. Events are consumed by a
/// single reader loop per session, so handling order is exactly
/// socket-delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Opened,
    Frame(InboundFrame),
    Closed,
    Error(String),
}

/// Wraps one live socket: the outbound command channel, the inbound event
/// channel, and the I/O task driving both.
struct ConnectionHandle {
    state: ConnectionState,
    outbound: mpsc::UnboundedSender<String>,
    events: mpsc::UnboundedReceiver<SocketEvent>,
    io_task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    fn close(&mut self) {
        self.state = ConnectionState::Closed;
        if let Some(task) = self.io_task.take() {
            task.abort();
        }
    }
}

/// Owns the single live connection of this client process
#[derive(Default)]
pub struct ConnectionManager {
    active: Option<ConnectionHandle>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a socket to `ws_url`, closing any prior connection first. The
    /// handle stays in `Connecting` state until the `Opened` event is
    /// consumed.
    pub fn open(&mut self, ws_url: &str) {
        self.close();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let io_task = tokio::spawn(run_socket(ws_url.to_string(), outbound_rx, event_tx));

        tracing::info!("opening discussion socket: {}", ws_url);
        self.active = Some(ConnectionHandle {
            state: ConnectionState::Connecting,
            outbound: outbound_tx,
            events: event_rx,
            io_task: Some(io_task),
        });
    }

    /// Encode and transmit a command. Fails immediately unless the handle is
    /// open; commands are never queued for later delivery.
    pub fn send(&self, command: &Command) -> Result<(), ClientError> {
        let handle = self
            .active
            .as_ref()
            .filter(|handle| handle.state == ConnectionState::Open)
            .ok_or(ClientError::ConnectionNotReady)?;
        let payload = encode_command(command).to_string();
        handle
            .outbound
            .send(payload)
            .map_err(|_| ClientError::ConnectionError("socket task has ended".to_string()))
    }

    /// Await the next socket event. Consuming `Opened`, `Closed`, or `Error`
    /// updates the handle state. Returns `None` when no connection exists or
    /// the I/O task has ended.
    pub async fn next_event(&mut self) -> Option<SocketEvent> {
        let handle = self.active.as_mut()?;
        let event = handle.events.recv().await?;
        match event {
            SocketEvent::Opened => handle.state = ConnectionState::Open,
            SocketEvent::Closed | SocketEvent::Error(_) => handle.state = ConnectionState::Closed,
            SocketEvent::Frame(_) => {}
        }
        Some(event)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state(), Some(ConnectionState::Open))
    }

    pub fn state(&self) -> Option<ConnectionState> {
        self.active.as_ref().map(|handle| handle.state)
    }

    /// Close the active connection, if any. Explicit and immediate.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.active.take() {
            tracing::info!("closing discussion socket");
            handle.close();
        }
    }

    /// Replace the active connection with an in-memory handle, returning the
    /// outbound sink and an event injector. Test seam only.
    #[cfg(test)]
    pub(crate) fn open_in_memory(
        &mut self,
    ) -> (
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedSender<SocketEvent>,
    ) {
        self.close();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.active = Some(ConnectionHandle {
            state: ConnectionState::Connecting,
            outbound: outbound_tx,
            events: event_rx,
            io_task: None,
        });
        (outbound_rx, event_tx)
    }
}

/// Socket I/O task: bridges the tungstenite stream onto the event channel
/// and drains the outbound channel into the sink.
async fn run_socket(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<SocketEvent>,
) {
    let (ws_stream, _response) = match connect_async(&url).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("failed to open discussion socket: {}", e);
            let _ = events.send(SocketEvent::Error(e.to_string()));
            let _ = events.send(SocketEvent::Closed);
            return;
        }
    };

    let _ = events.send(SocketEvent::Opened);
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            inbound = read.next() => match inbound {
                Some(Ok(WsMessage::Text(text))) => {
                    let frame = decode_text(&text, Utc::now());
                    if events.send(SocketEvent::Frame(frame)).is_err() {
                        break;
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    tracing::info!("server closed the discussion socket");
                    let _ = events.send(SocketEvent::Closed);
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!("socket read error: {}", e);
                    let _ = events.send(SocketEvent::Error(e.to_string()));
                    let _ = events.send(SocketEvent::Closed);
                    break;
                }
                Some(Ok(_)) => {}
            },
            command = outbound.recv() => match command {
                Some(payload) => {
                    if let Err(e) = write.send(WsMessage::Text(payload.into())).await {
                        tracing::warn!("socket write error: {}", e);
                        let _ = events.send(SocketEvent::Error(e.to_string()));
                        let _ = events.send(SocketEvent::Closed);
                        break;
                    }
                }
                None => {
                    let _ = write.send(WsMessage::Close(None)).await;
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiscussionStatus;

    #[tokio::test]
    async fn test_send_fails_before_the_socket_is_open() {
        // テスト項目: Open 状態になる前のコマンド送信は ConnectionNotReady で失敗する
        // given (前提条件):
        let mut manager = ConnectionManager::new();
        let (_outbound_rx, _event_tx) = manager.open_in_memory();

        // when (操作):
        let result = manager.send(&Command::Stop);

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::ConnectionNotReady)));
    }

    #[tokio::test]
    async fn test_send_without_any_connection_fails() {
        // テスト項目: 接続が存在しない場合のコマンド送信は失敗する
        // given (前提条件):
        let manager = ConnectionManager::new();

        // when (操作):
        let result = manager.send(&Command::Stop);

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::ConnectionNotReady)));
    }

    #[tokio::test]
    async fn test_opened_event_enables_sending() {
        // テスト項目: Opened イベントを消費するとコマンド送信が可能になる
        // given (前提条件):
        let mut manager = ConnectionManager::new();
        let (mut outbound_rx, event_tx) = manager.open_in_memory();
        event_tx.send(SocketEvent::Opened).unwrap();

        // when (操作):
        let event = manager.next_event().await;
        let result = manager.send(&Command::Stop);

        // then (期待する結果):
        assert_eq!(event, Some(SocketEvent::Opened));
        assert!(manager.is_open());
        assert!(result.is_ok());
        assert_eq!(outbound_rx.try_recv().unwrap(), r#"{"type":"stop"}"#);
    }

    #[tokio::test]
    async fn test_closed_event_disables_sending() {
        // テスト項目: Closed イベントを消費すると以後の送信が失敗する
        // given (前提条件):
        let mut manager = ConnectionManager::new();
        let (_outbound_rx, event_tx) = manager.open_in_memory();
        event_tx.send(SocketEvent::Opened).unwrap();
        event_tx.send(SocketEvent::Closed).unwrap();

        // when (操作):
        manager.next_event().await;
        manager.next_event().await;
        let result = manager.send(&Command::Continue);

        // then (期待する結果):
        assert_eq!(manager.state(), Some(ConnectionState::Closed));
        assert!(matches!(result, Err(ClientError::ConnectionNotReady)));
    }

    #[tokio::test]
    async fn test_opening_a_second_connection_closes_the_first() {
        // テスト項目: 2 本目の接続を開くと 1 本目が先に閉じられる
        // given (前提条件):
        let mut manager = ConnectionManager::new();
        let (mut first_outbound_rx, first_event_tx) = manager.open_in_memory();
        first_event_tx.send(SocketEvent::Opened).unwrap();
        manager.next_event().await;

        // when (操作):
        let (_second_outbound_rx, second_event_tx) = manager.open_in_memory();

        // then (期待する結果):
        // 1 本目の送信チャネルは閉じられ、イベント注入も届かなくなる
        assert!(first_outbound_rx.recv().await.is_none());
        assert!(
            first_event_tx
                .send(SocketEvent::Frame(InboundFrame::StatusUpdate {
                    status: DiscussionStatus::Running
                }))
                .is_err()
        );
        assert_eq!(manager.state(), Some(ConnectionState::Connecting));
        drop(second_event_tx);
    }

    #[tokio::test]
    async fn test_frame_events_pass_through_in_order() {
        // テスト項目: フレームイベントが配信順のまま取り出される
        // given (前提条件):
        let mut manager = ConnectionManager::new();
        let (_outbound_rx, event_tx) = manager.open_in_memory();
        event_tx.send(SocketEvent::Opened).unwrap();
        for status in [DiscussionStatus::Running, DiscussionStatus::Completed] {
            event_tx
                .send(SocketEvent::Frame(InboundFrame::StatusUpdate { status }))
                .unwrap();
        }

        // when (操作):
        manager.next_event().await;
        let first = manager.next_event().await;
        let second = manager.next_event().await;

        // then (期待する結果):
        assert_eq!(
            first,
            Some(SocketEvent::Frame(InboundFrame::StatusUpdate {
                status: DiscussionStatus::Running
            }))
        );
        assert_eq!(
            second,
            Some(SocketEvent::Frame(InboundFrame::StatusUpdate {
                status: DiscussionStatus::Completed
            }))
        );
    }
}
