use clap::Parser;

/// Process-wide configuration, resolved once at startup and read-only after.
#[derive(Debug, Clone, Parser)]
#[command(name = "graphtalk", about = "Chat with a graph database")]
pub struct Config {
    /// Graph database bolt/http endpoint.
    #[arg(long, env = "NEO4J_URL", default_value = "http://demo.neo4jlabs.com:7474")]
    pub neo4j_url: String,

    #[arg(long, env = "NEO4J_USER", default_value = "companies")]
    pub neo4j_user: String,

    #[arg(long, env = "NEO4J_PASS", default_value = "companies")]
    pub neo4j_pass: String,

    #[arg(long, env = "NEO4J_DATABASE", default_value = "companies")]
    pub neo4j_database: String,

    /// Completion service endpoint. Clients may override it per request with
    /// an `api_key` field; if neither is present the request is rejected.
    #[arg(long, env = "OLLAMA_API_ENDPOINT")]
    pub completion_endpoint: Option<String>,

    #[arg(long, env = "PORT", default_value_t = 7860)]
    pub port: u16,
}

#[derive(Debug, thiserror::Error)]
#[error(
    "no completion endpoint configured; set OLLAMA_API_ENDPOINT or send api_key with the request"
)]
pub struct ConfigError;

impl Config {
    /// Resolve the completion endpoint for one request: the process-wide
    /// value wins, a per-request override fills in when it is absent.
    pub fn resolve_endpoint(&self, api_key: Option<&str>) -> Result<String, ConfigError> {
        self.completion_endpoint
            .as_deref()
            .or(api_key)
            .map(str::to_string)
            .ok_or(ConfigError)
    }

    pub fn has_endpoint(&self) -> bool {
        self.completion_endpoint.is_some()
    }
}
