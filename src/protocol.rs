use serde::{Deserialize, Serialize};

/// One inbound frame on the `/text2text` socket. The `type` tag is kept as a
/// plain field so that an unknown or missing tag surfaces as a per-message
/// error instead of closing the connection.
#[derive(Debug, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub question: Option<String>,
    pub api_key: Option<String>,
}

/// One outbound frame. Exactly one `start`/`end` pair (or a terminal `error`)
/// is emitted per processed question, with any number of `stream` fragments
/// in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolEvent {
    Debug { detail: String },
    Error { detail: String },
    Stream { output: String },
    Start,
    End {
        output: String,
        generated_cypher: String,
    },
}
