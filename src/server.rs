use crate::components::disambiguate::DataDisambiguation;
use crate::components::extract::DataExtractor;
use crate::components::proposals::QuestionProposalGenerator;
use crate::config::Config;
use crate::graph::{GraphStore, Neo4jHttpStore, Row};
use crate::llm::{CompletionFactory, ollama_factory};
use crate::session::Session;
use axum::Json;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::mpsc;

struct ServerState {
    config: Arc<Config>,
    store: Arc<dyn GraphStore>,
    completions: CompletionFactory,
}

type ApiError = (StatusCode, String);

pub async fn run(config: Config) -> anyhow::Result<()> {
    let http = reqwest::Client::new();
    let config = Arc::new(config);
    let store: Arc<dyn GraphStore> = Arc::new(Neo4jHttpStore::new(
        http.clone(),
        config.neo4j_url.clone(),
        config.neo4j_user.clone(),
        config.neo4j_pass.clone(),
        config.neo4j_database.clone(),
    ));

    let state = Arc::new(ServerState {
        config: config.clone(),
        store,
        completions: ollama_factory(http),
    });

    let app = axum::Router::new()
        .route("/text2text", get(text2text))
        .route("/data2cypher", post(data2cypher))
        .route("/questionProposalsForCurrentDb", post(question_proposals))
        .route("/companyReport/list", post(company_list))
        .route("/hasapikey", get(has_api_key))
        .route("/health", get(health))
        .route("/ready", get(health))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "graphtalk listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn text2text(
    State(state): State<Arc<ServerState>>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(state, socket))
}

/// One task per connection. Outbound events flow through a per-session
/// channel drained by a forward task; frames are handled strictly one at a
/// time, so no two questions of the same session are ever in flight.
async fn handle_socket(state: Arc<ServerState>, socket: WebSocket) {
    let (mut sink, mut frames) = socket.split();
    let (events_tx, mut events_rx) = mpsc::channel(64);

    let forward = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(_) => continue,
            };
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    let mut session = Session::new(
        state.config.clone(),
        state.store.clone(),
        state.completions.clone(),
        crate::fewshot::examples(),
        events_tx,
    );
    let session_id = session.id();

    if session.open().await.is_ok() {
        while let Some(frame) = frames.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if session.handle_frame(&text).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }

    // Dropping the session drops the event sender, which ends the forward
    // task. Disconnects are a normal transition, not an error.
    drop(session);
    let _ = forward.await;
    tracing::info!(session = %session_id, "session closed");
}

#[derive(Deserialize)]
struct ImportPayload {
    input: String,
    neo4j_schema: Option<String>,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct QuestionProposalPayload {
    api_key: Option<String>,
}

async fn data2cypher(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ImportPayload>,
) -> Result<Json<Value>, ApiError> {
    let llm = resolve_llm(&state, payload.api_key.as_deref())?;

    let extractor = DataExtractor::new(llm.clone());
    let extracted = match &payload.neo4j_schema {
        Some(schema) => extractor.run_with_schema(schema, &payload.input).await,
        None => extractor.run(&payload.input).await,
    }
    .map_err(internal)?;

    let disambiguated = DataDisambiguation::new(llm)
        .run(&extracted)
        .await
        .map_err(internal)?;

    Ok(Json(json!({"data": disambiguated})))
}

async fn question_proposals(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<QuestionProposalPayload>,
) -> Result<Json<Value>, ApiError> {
    let llm = resolve_llm(&state, payload.api_key.as_deref())?;

    let generator = QuestionProposalGenerator::new(llm, state.store.clone());
    let questions = generator.run().await.map_err(internal)?;
    Ok(Json(json!({"output": questions})))
}

async fn company_list(State(state): State<Arc<ServerState>>) -> Result<Json<Value>, ApiError> {
    let rows = state
        .store
        .run("MATCH (n:Organization) WITH n WHERE rand() < 0.01 RETURN n.name LIMIT 5")
        .await
        .map_err(internal)?;
    Ok(Json(json!({"output": names_from(&rows)})))
}

async fn has_api_key(State(state): State<Arc<ServerState>>) -> Json<Value> {
    Json(json!({"output": state.config.has_endpoint()}))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

fn resolve_llm(
    state: &ServerState,
    api_key: Option<&str>,
) -> Result<Arc<dyn crate::llm::CompletionService>, ApiError> {
    let endpoint = state
        .config
        .resolve_endpoint(api_key)
        .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))?;
    Ok((state.completions)(&endpoint))
}

fn internal(err: impl std::fmt::Display) -> ApiError {
    tracing::error!(error = %err, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn names_from(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get("n.name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}
