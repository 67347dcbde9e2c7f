use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{Value, json};

/// One result record: column name to value, in query order per record.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("graph request failed: {0}")]
    Transport(String),
    #[error("query failed: {code}: {message}")]
    Query { code: String, message: String },
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        GraphError::Transport(err.to_string())
    }
}

/// Statement execution against the graph store. The driver proper lives
/// outside this crate; this is its seam.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn run(&self, statement: &str) -> Result<Vec<Row>, GraphError>;
}

/// Thin adapter over the Neo4j HTTP transaction endpoint
/// (`POST {url}/db/{database}/tx/commit`).
pub struct Neo4jHttpStore {
    http: HttpClient,
    url: String,
    user: String,
    pass: String,
    database: String,
}

impl Neo4jHttpStore {
    pub fn new(
        http: HttpClient,
        url: String,
        user: String,
        pass: String,
        database: String,
    ) -> Self {
        Self {
            http,
            url,
            user,
            pass,
            database,
        }
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/db/{}/tx/commit",
            self.url.trim_end_matches('/'),
            self.database
        )
    }
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    async fn run(&self, statement: &str) -> Result<Vec<Row>, GraphError> {
        let body = json!({"statements": [{"statement": statement}]});
        let response = self
            .http
            .post(self.commit_url())
            .basic_auth(&self.user, Some(&self.pass))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Transport(format!("{}: {}", status, body)));
        }

        let payload: Value = response.json().await?;
        decode_commit_response(&payload)
    }
}

/// Flatten the transaction-endpoint response into named rows. Server-side
/// query errors arrive in-band in the `errors` array.
fn decode_commit_response(payload: &Value) -> Result<Vec<Row>, GraphError> {
    if let Some(err) = payload["errors"].as_array().and_then(|errs| errs.first()) {
        return Err(GraphError::Query {
            code: err["code"].as_str().unwrap_or("Unknown").to_string(),
            message: err["message"].as_str().unwrap_or_default().to_string(),
        });
    }

    let result = match payload["results"].as_array().and_then(|r| r.first()) {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };
    let columns: Vec<&str> = result["columns"]
        .as_array()
        .ok_or_else(|| GraphError::Decode("missing columns".to_string()))?
        .iter()
        .filter_map(Value::as_str)
        .collect();

    let mut rows = Vec::new();
    for record in result["data"].as_array().unwrap_or(&Vec::new()) {
        let values = record["row"]
            .as_array()
            .ok_or_else(|| GraphError::Decode("missing row".to_string()))?;
        let mut row = Row::new();
        for (column, value) in columns.iter().zip(values) {
            row.insert((*column).to_string(), value.clone());
        }
        rows.push(row);
    }
    Ok(rows)
}
