//! HTTP client for the Directory Service.
//!
//! The Directory Service owns agent and chatroom records. The discussion
//! core consumes its chatroom views plus the two activation endpoints
//! (`POST /api/chatrooms/{id}/start` and `POST /api/chatrooms/{id}/stop`).

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ClientError;
use crate::protocol::{decode_message, decode_participants};
use crate::types::{ChatroomRecord, ChatroomSummary, DiscussionStatus};

/// Response body of the start/stop activation endpoints.
///
/// The status field is optional on the wire: the start endpoint may answer
/// with an acknowledgement only. The session adopts the status when present.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivationResponse {
    #[serde(default)]
    pub status: Option<DiscussionStatus>,
}

/// Directory Service operations the discussion core depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Directory: Send + Sync {
    /// List all chatrooms
    async fn list_chatrooms(&self) -> Result<Vec<ChatroomSummary>, ClientError>;

    /// Fetch one chatroom with its participants and message history
    async fn fetch_chatroom(&self, chatroom_id: &str) -> Result<ChatroomRecord, ClientError>;

    /// Create a chatroom. Empty topics and empty agent selections are
    /// rejected client-side before any network call.
    async fn create_chatroom(
        &self,
        topic: &str,
        agent_ids: &[String],
    ) -> Result<ChatroomSummary, ClientError>;

    /// Activate the discussion (also used by the continue intent)
    async fn start_discussion(&self, chatroom_id: &str) -> Result<ActivationResponse, ClientError>;

    /// Request that the discussion stop
    async fn stop_discussion(&self, chatroom_id: &str) -> Result<ActivationResponse, ClientError>;

    /// Discussion socket URL for one chatroom
    fn ws_url(&self, chatroom_id: &str) -> String;
}

/// Map an HTTP base URL onto the discussion socket URL for one chatroom. The
/// socket scheme follows the hosting scheme: https hosts get wss.
pub fn ws_url_for(base_url: &str, chatroom_id: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        format!("ws://{}", base)
    };
    format!("{}/api/ws/{}", ws_base, chatroom_id)
}

/// Permissive view of one chatroom record as the service serializes it
#[derive(Debug, Deserialize)]
struct ChatroomDto {
    #[serde(default)]
    id: String,
    #[serde(default)]
    topic: String,
    status: Option<String>,
    agents: Option<Value>,
    messages: Option<Vec<Value>>,
}

impl ChatroomDto {
    fn status(&self) -> DiscussionStatus {
        self.status
            .as_deref()
            .map(DiscussionStatus::from_wire)
            .unwrap_or(DiscussionStatus::Pending)
    }

    fn into_record(self) -> ChatroomRecord {
        let now = Utc::now();
        let status = self.status();
        ChatroomRecord {
            id: self.id,
            topic: self.topic,
            status,
            participants: decode_participants(self.agents.as_ref()),
            messages: self
                .messages
                .unwrap_or_default()
                .iter()
                .map(|value| decode_message(value, now))
                .collect(),
        }
    }

    fn into_summary(self) -> ChatroomSummary {
        let status = self.status();
        ChatroomSummary {
            agent_count: decode_participants(self.agents.as_ref()).len(),
            id: self.id,
            topic: self.topic,
            status,
        }
    }
}

/// reqwest-backed implementation against the real service
pub struct DirectoryClient {
    base_url: String,
    http: reqwest::Client,
}

impl DirectoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }
}

#[async_trait]
impl Directory for DirectoryClient {
    async fn list_chatrooms(&self) -> Result<Vec<ChatroomSummary>, ClientError> {
        let dtos: Vec<ChatroomDto> = self
            .http
            .get(self.api_url("chatrooms"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(dtos.into_iter().map(ChatroomDto::into_summary).collect())
    }

    async fn fetch_chatroom(&self, chatroom_id: &str) -> Result<ChatroomRecord, ClientError> {
        let dto: ChatroomDto = self
            .http
            .get(self.api_url(&format!("chatrooms/{}", chatroom_id)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let mut record = dto.into_record();
        if record.id.is_empty() {
            record.id = chatroom_id.to_string();
        }
        Ok(record)
    }

    async fn create_chatroom(
        &self,
        topic: &str,
        agent_ids: &[String],
    ) -> Result<ChatroomSummary, ClientError> {
        if topic.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "discussion topic must not be empty".to_string(),
            ));
        }
        if agent_ids.is_empty() {
            return Err(ClientError::InvalidInput(
                "select at least one agent".to_string(),
            ));
        }

        let dto: ChatroomDto = self
            .http
            .post(self.api_url("chatrooms"))
            .json(&json!({ "topic": topic.trim(), "agents": agent_ids }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(dto.into_summary())
    }

    async fn start_discussion(&self, chatroom_id: &str) -> Result<ActivationResponse, ClientError> {
        let response: ActivationResponse = self
            .http
            .post(self.api_url(&format!("chatrooms/{}/start", chatroom_id)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    async fn stop_discussion(&self, chatroom_id: &str) -> Result<ActivationResponse, ClientError> {
        let response: ActivationResponse = self
            .http
            .post(self.api_url(&format!("chatrooms/{}/stop", chatroom_id)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    fn ws_url(&self, chatroom_id: &str) -> String {
        ws_url_for(&self.base_url, chatroom_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageKind;

    #[test]
    fn test_ws_url_for_http_host() {
        // テスト項目: http ホストには ws スキームのソケット URL が組み立てられる
        // given (前提条件):
        let base_url = "http://127.0.0.1:8080";

        // when (操作):
        let url = ws_url_for(base_url, "room-1");

        // then (期待する結果):
        assert_eq!(url, "ws://127.0.0.1:8080/api/ws/room-1");
    }

    #[test]
    fn test_ws_url_for_https_host_uses_secure_scheme() {
        // テスト項目: https ホストには wss スキームが選択される
        // given (前提条件):
        let base_url = "https://roundtable.example.com/";

        // when (操作):
        let url = ws_url_for(base_url, "room-2");

        // then (期待する結果):
        assert_eq!(url, "wss://roundtable.example.com/api/ws/room-2");
    }

    #[test]
    fn test_chatroom_dto_conversion_is_permissive() {
        // テスト項目: 欠けたフィールドを持つ DTO もデフォルト値で変換される
        // given (前提条件):
        let dto: ChatroomDto = serde_json::from_value(json!({
            "id": "room-3",
            "agents": ["a-1", { "id": "a-2", "name": "Laozi", "role": "Sage" }],
            "messages": [
                { "type": "agent", "agent_name": "Laozi", "message": "The way" }
            ]
        }))
        .unwrap();

        // when (操作):
        let record = dto.into_record();

        // then (期待する結果):
        assert_eq!(record.topic, "");
        assert_eq!(record.status, DiscussionStatus::Pending);
        assert_eq!(record.participants.len(), 2);
        assert_eq!(record.participants[1].name.as_deref(), Some("Laozi"));
        assert_eq!(record.messages.len(), 1);
        assert_eq!(record.messages[0].kind, MessageKind::Agent);
        assert_eq!(record.messages[0].content, "The way");
    }

    #[tokio::test]
    async fn test_create_chatroom_rejects_empty_topic_before_any_call() {
        // テスト項目: 空のトピックはネットワーク呼び出し前に拒否される
        // given (前提条件):
        let client = DirectoryClient::new("http://127.0.0.1:1");

        // when (操作):
        let result = client.create_chatroom("   ", &["a-1".to_string()]).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_chatroom_rejects_empty_agent_selection() {
        // テスト項目: 参加エージェントが空の作成要求は拒否される
        // given (前提条件):
        let client = DirectoryClient::new("http://127.0.0.1:1");

        // when (操作):
        let result = client.create_chatroom("The nature of time", &[]).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::InvalidInput(_))));
    }

    #[test]
    fn test_activation_response_without_status() {
        // テスト項目: status を持たない起動応答も受理される
        // given (前提条件):
        let body = json!({ "message": "discussion started" });

        // when (操作):
        let response: ActivationResponse = serde_json::from_value(body).unwrap();

        // then (期待する結果):
        assert!(response.status.is_none());
    }

    #[test]
    fn test_activation_response_with_status() {
        // テスト項目: status 付きの応答からステータスが取り出される
        // given (前提条件):
        let body = json!({ "status": "running", "id": "room-1" });

        // when (操作):
        let response: ActivationResponse = serde_json::from_value(body).unwrap();

        // then (期待する結果):
        assert_eq!(response.status, Some(DiscussionStatus::Running));
    }
}
