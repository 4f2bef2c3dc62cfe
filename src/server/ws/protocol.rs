use serde::Deserialize;

use crate::llm::ChatMessage;

pub const WS_MESSAGE_TYPE: &str = "message";

/// `{"type": "message", "message": "...", "history": [{"role", "content"}]}`
#[derive(Debug, Deserialize, Default)]
pub struct WsIncomingMessage {
    #[serde(rename = "type")]
    pub msg_type: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}
