use crate::components::summarize::SummarizeResults;
use crate::components::text2cypher::{Text2Cypher, Translation};
use crate::config::Config;
use crate::fewshot::ExamplePair;
use crate::graph::GraphStore;
use crate::limit::{HARD_LIMIT_CONTEXT_RECORDS, limit_rows};
use crate::llm::CompletionFactory;
use crate::protocol::{ClientMessage, ProtocolEvent};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    System,
}

/// One exchange unit in a conversation. User turns are appended the moment a
/// question arrives; system turns only after its answer fully streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Translating,
    Summarizing,
}

/// The client went away while we were producing events. Not an error; the
/// caller tears the session down.
#[derive(Debug)]
pub struct SinkClosed;

/// One live conversation. Owns the ordered history and drives the
/// translate-limit-summarize pipeline for each inbound frame, strictly one
/// frame at a time. A failed turn leaves history consistent (the user turn
/// stays, no system turn is added) and never closes the session.
pub struct Session {
    id: Uuid,
    config: Arc<Config>,
    store: Arc<dyn GraphStore>,
    completions: CompletionFactory,
    examples: &'static [ExamplePair],
    history: Vec<Turn>,
    events: mpsc::Sender<ProtocolEvent>,
    state: State,
}

impl Session {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn GraphStore>,
        completions: CompletionFactory,
        examples: &'static [ExamplePair],
        events: mpsc::Sender<ProtocolEvent>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            store,
            completions,
            examples,
            history: Vec::new(),
            events,
            state: State::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Announce readiness once the connection is accepted.
    pub async fn open(&self) -> Result<(), SinkClosed> {
        tracing::info!(session = %self.id, "session open");
        self.emit(ProtocolEvent::Debug {
            detail: "connected".to_string(),
        })
        .await
    }

    /// Process one inbound frame to completion. Malformed frames produce an
    /// `error` event and leave the session open.
    pub async fn handle_frame(&mut self, raw: &str) -> Result<(), SinkClosed> {
        let message: ClientMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(err) => {
                return self.error(format!("invalid message: {}", err)).await;
            }
        };

        match message.kind.as_deref() {
            Some("question") => self.handle_question(message).await,
            Some(other) => self.error(format!("unknown message type: {}", other)).await,
            None => self.error("missing type".to_string()).await,
        }
    }

    async fn handle_question(&mut self, message: ClientMessage) -> Result<(), SinkClosed> {
        let question = match message.question {
            Some(question) => question,
            None => return self.error("missing question".to_string()).await,
        };

        // History records what was asked regardless of how the turn ends.
        self.history.push(Turn::user(question.clone()));

        let endpoint = match self.config.resolve_endpoint(message.api_key.as_deref()) {
            Ok(endpoint) => endpoint,
            Err(err) => return self.error(err.to_string()).await,
        };
        let llm = (self.completions)(&endpoint);
        self.emit(ProtocolEvent::Debug {
            detail: format!("received question: {}", question),
        })
        .await?;

        self.set_state(State::Translating);
        let translator = Text2Cypher::new(llm.clone(), self.store.clone(), self.examples);
        let translation = match translator.run(&question, &self.history).await {
            Ok(translation) => translation,
            Err(err) => return self.error(err.to_string()).await,
        };

        let (generated_cypher, rows) = match translation {
            Translation::Translated {
                generated_cypher,
                rows,
            } => (generated_cypher, rows),
            Translation::Failed(failure) => {
                tracing::debug!(session = %self.id, ?failure, "translation failed");
                return self
                    .error("Could not generate Cypher statement".to_string())
                    .await;
            }
        };

        self.emit(ProtocolEvent::Start).await?;
        self.set_state(State::Summarizing);

        let rows = limit_rows(rows, HARD_LIMIT_CONTEXT_RECORDS);
        let summarizer = SummarizeResults::new(llm);
        let mut stream = match summarizer.stream(&question, &rows).await {
            Ok(stream) => stream,
            Err(err) => return self.error(err.to_string()).await,
        };

        let mut answer = String::new();
        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(fragment) => {
                    self.emit(ProtocolEvent::Stream {
                        output: fragment.clone(),
                    })
                    .await?;
                    answer.push_str(&fragment);
                }
                Err(err) => {
                    // Already-forwarded fragments stand; no answer is
                    // committed to history.
                    return self.error(err.to_string()).await;
                }
            }
        }

        self.history.push(Turn::system(answer.clone()));
        self.emit(ProtocolEvent::End {
            output: answer,
            generated_cypher,
        })
        .await?;
        self.set_state(State::Idle);
        self.emit(ProtocolEvent::Debug {
            detail: "output done".to_string(),
        })
        .await
    }

    fn set_state(&mut self, state: State) {
        tracing::trace!(session = %self.id, from = ?self.state, to = ?state, "state change");
        self.state = state;
    }

    async fn error(&mut self, detail: String) -> Result<(), SinkClosed> {
        tracing::debug!(session = %self.id, %detail, "turn error");
        self.set_state(State::Idle);
        self.emit(ProtocolEvent::Error { detail }).await
    }

    async fn emit(&self, event: ProtocolEvent) -> Result<(), SinkClosed> {
        self.events.send(event).await.map_err(|_| SinkClosed)
    }
}
